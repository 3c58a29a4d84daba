//! Dashboard statistics models.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::Report;

/// Number of reports in one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MonthlyCount {
    /// Month label formatted `YYYY-MM`.
    pub month: String,
    pub count: i64,
}

/// Pre-aggregated report activity for one officer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ReportActivity {
    /// Completed reports grouped by incident month, ascending.
    pub completed_by_incident_month: Vec<MonthlyCount>,
    /// All reports grouped by creation month, ascending.
    pub reported_by_month: Vec<MonthlyCount>,
}

/// Dashboard response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DashboardResponse {
    pub pending_reports: Vec<Report>,
    pub activity: ReportActivity,
}
