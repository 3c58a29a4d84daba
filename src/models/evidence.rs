//! Evidence domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::OfficerId;

/// Kind of stored media.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum EvidenceType {
    Image,
    Audio,
}

impl EvidenceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Audio => "audio",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "image" => Some(Self::Image),
            "audio" => Some(Self::Audio),
            _ => None,
        }
    }
}

impl std::fmt::Display for EvidenceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored media file attached to a suspect and its report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Evidence {
    pub id: Uuid,
    pub suspect_id: Uuid,
    /// Report the evidence belongs to.
    pub case_id: Uuid,
    pub added_by: OfficerId,
    #[serde(rename = "type")]
    pub evidence_type: EvidenceType,
    pub file_url: String,
    pub created_at: DateTime<Utc>,
}

/// Evidence row to insert. `file_url` must point at an already uploaded object.
#[derive(Debug, Clone)]
pub struct NewEvidence {
    pub suspect_id: Uuid,
    pub case_id: Uuid,
    pub added_by: OfficerId,
    pub evidence_type: EvidenceType,
    pub file_url: String,
}
