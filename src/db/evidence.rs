//! Database operations for evidence rows.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::entity::evidence::{self, ActiveModel as EvidenceActiveModel, Entity as EvidenceEntity};
use crate::error::{AppError, AppResult};
use crate::models::{Evidence, EvidenceType, NewEvidence, OfficerId};

use super::DbPool;

impl DbPool {
    /// Insert evidence rows in one transaction, returning them in input order.
    pub async fn insert_evidence_batch(&self, entries: Vec<NewEvidence>) -> AppResult<Vec<Evidence>> {
        if entries.is_empty() {
            return Ok(Vec::new());
        }

        let txn = self
            .connection()
            .begin()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        let mut inserted = Vec::with_capacity(entries.len());
        for entry in entries {
            let model = EvidenceActiveModel {
                id: Set(Uuid::new_v4()),
                suspect_id: Set(entry.suspect_id),
                case_id: Set(entry.case_id),
                added_by: Set(entry.added_by.as_str().to_string()),
                evidence_type: Set(entry.evidence_type.as_str().to_string()),
                file_url: Set(entry.file_url),
                created_at: Set(Utc::now()),
            };

            let result = model
                .insert(&txn)
                .await
                .map_err(|e| AppError::Database(format!("Failed to insert evidence: {}", e)))?;
            inserted.push(model_to_evidence(result)?);
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(format!("Failed to commit evidence: {}", e)))?;

        Ok(inserted)
    }

    /// Evidence recorded for a report, oldest first.
    pub async fn list_evidence(&self, case_id: Uuid) -> AppResult<Vec<Evidence>> {
        let result = EvidenceEntity::find()
            .filter(evidence::Column::CaseId.eq(case_id))
            .order_by_asc(evidence::Column::CreatedAt)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list evidence: {}", e)))?;

        result.into_iter().map(model_to_evidence).collect()
    }
}

fn model_to_evidence(m: evidence::Model) -> AppResult<Evidence> {
    let evidence_type = EvidenceType::parse(&m.evidence_type).ok_or_else(|| {
        AppError::Database(format!(
            "Unknown evidence type '{}' on evidence {}",
            m.evidence_type, m.id
        ))
    })?;

    Ok(Evidence {
        id: m.id,
        suspect_id: m.suspect_id,
        case_id: m.case_id,
        added_by: OfficerId::new(m.added_by),
        evidence_type,
        file_url: m.file_url,
        created_at: m.created_at,
    })
}
