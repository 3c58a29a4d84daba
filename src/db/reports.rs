//! Database operations for incident reports.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::entity::report::{self, ActiveModel as ReportActiveModel, Entity as ReportEntity};
use crate::error::{AppError, AppResult};
use crate::models::{NewReport, OfficerId, Report, ReportStatus};

use super::DbPool;

impl DbPool {
    /// Insert a new report in `pending` status.
    pub async fn insert_report(&self, new: NewReport) -> AppResult<Report> {
        let model = ReportActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(new.title),
            description: Set(new.description),
            created_by: Set(new.created_by.as_str().to_string()),
            status: Set(ReportStatus::Pending.as_str().to_string()),
            location: Set(new.location),
            incident_date: Set(new.incident_date),
            created_at: Set(Utc::now()),
        };

        let result = model
            .insert(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to insert report: {}", e)))?;

        model_to_report(result)
    }

    pub async fn get_report(&self, id: Uuid) -> AppResult<Option<Report>> {
        let result = ReportEntity::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get report: {}", e)))?;

        result.map(model_to_report).transpose()
    }

    /// Reports created by `officer` with `status`, newest first.
    pub async fn list_reports(
        &self,
        officer: &OfficerId,
        status: ReportStatus,
    ) -> AppResult<Vec<Report>> {
        let result = ReportEntity::find()
            .filter(report::Column::CreatedBy.eq(officer.as_str()))
            .filter(report::Column::Status.eq(status.as_str()))
            .order_by_desc(report::Column::CreatedAt)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list reports: {}", e)))?;

        result.into_iter().map(model_to_report).collect()
    }

    pub async fn update_report_status(&self, id: Uuid, status: ReportStatus) -> AppResult<Report> {
        let model = ReportEntity::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get report: {}", e)))?
            .ok_or_else(|| AppError::NotFound(format!("Report {}", id)))?;

        let mut active: ReportActiveModel = model.into();
        active.status = Set(status.as_str().to_string());
        let updated = active
            .update(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to update report status: {}", e)))?;

        model_to_report(updated)
    }
}

fn model_to_report(m: report::Model) -> AppResult<Report> {
    let status = ReportStatus::parse(&m.status).ok_or_else(|| {
        AppError::Database(format!("Unknown status '{}' on report {}", m.status, m.id))
    })?;

    Ok(Report {
        id: m.id,
        title: m.title,
        description: m.description,
        created_by: OfficerId::new(m.created_by),
        status,
        location: m.location,
        incident_date: m.incident_date,
        created_at: m.created_at,
    })
}
