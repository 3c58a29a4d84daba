//! Report domain models and DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{Evidence, OfficerId, Suspect};

/// Report status enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Pending,
    Completed,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Incident report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Report {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub created_by: OfficerId,
    pub status: ReportStatus,
    /// `Lat: x, Lon: y`, or empty when no location was tagged.
    pub location: String,
    pub incident_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Report row to insert. New reports always start out pending.
#[derive(Debug, Clone)]
pub struct NewReport {
    pub title: String,
    pub description: String,
    pub created_by: OfficerId,
    pub location: String,
    pub incident_date: DateTime<Utc>,
}

/// Query parameters for listing an officer's reports.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ListReportsQuery {
    /// Filter by status (default: pending).
    #[serde(default)]
    pub status: Option<ReportStatus>,
}

/// Report list response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReportListResponse {
    pub status: ReportStatus,
    pub reports: Vec<Report>,
}

/// Report with everything attached to it.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReportDetailResponse {
    pub report: Report,
    pub suspects: Vec<Suspect>,
    pub evidence: Vec<Evidence>,
}
