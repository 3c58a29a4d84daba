//! Database operations for suspects.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::entity::suspect::{self, ActiveModel as SuspectActiveModel, Entity as SuspectEntity};
use crate::error::{AppError, AppResult};
use crate::models::{Ethnicity, Gender, NewSuspect, OfficerId, Suspect};

use super::DbPool;

impl DbPool {
    pub async fn insert_suspect(&self, new: NewSuspect) -> AppResult<Suspect> {
        let model = SuspectActiveModel {
            id: Set(Uuid::new_v4()),
            report_id: Set(new.report_id),
            created_by: Set(new.created_by.as_str().to_string()),
            name: Set(new.name),
            age: Set(new.age),
            gender: Set(new.gender.as_str().to_string()),
            ethnicity: Set(new.ethnicity.as_str().to_string()),
            description: Set(new.description),
            created_at: Set(Utc::now()),
        };

        let result = model
            .insert(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to insert suspect: {}", e)))?;

        model_to_suspect(result)
    }

    /// Suspects attached to a report, oldest first.
    pub async fn list_suspects(&self, report_id: Uuid) -> AppResult<Vec<Suspect>> {
        let result = SuspectEntity::find()
            .filter(suspect::Column::ReportId.eq(report_id))
            .order_by_asc(suspect::Column::CreatedAt)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list suspects: {}", e)))?;

        result.into_iter().map(model_to_suspect).collect()
    }
}

fn model_to_suspect(m: suspect::Model) -> AppResult<Suspect> {
    let gender = Gender::parse(&m.gender).ok_or_else(|| {
        AppError::Database(format!("Unknown gender '{}' on suspect {}", m.gender, m.id))
    })?;
    let ethnicity = Ethnicity::parse(&m.ethnicity).ok_or_else(|| {
        AppError::Database(format!(
            "Unknown ethnicity '{}' on suspect {}",
            m.ethnicity, m.id
        ))
    })?;

    Ok(Suspect {
        id: m.id,
        report_id: m.report_id,
        created_by: OfficerId::new(m.created_by),
        name: m.name,
        age: m.age,
        gender,
        ethnicity,
        description: m.description,
        created_at: m.created_at,
    })
}
