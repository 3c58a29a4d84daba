//! Pre-aggregated dashboard statistics.

use sea_orm::{FromQueryResult, Statement};

use crate::error::{AppError, AppResult};
use crate::models::{MonthlyCount, OfficerId, ReportActivity};

use super::DbPool;

#[derive(Debug, FromQueryResult)]
struct MonthRow {
    month: String,
    count: i64,
}

const COMPLETED_BY_INCIDENT_MONTH: &str = r#"
    SELECT
        to_char(date_trunc('month', incident_date), 'YYYY-MM') AS month,
        COUNT(*)::bigint AS count
    FROM reports
    WHERE created_by = $1 AND status = 'completed'
    GROUP BY 1
    ORDER BY 1
"#;

const REPORTED_BY_MONTH: &str = r#"
    SELECT
        to_char(date_trunc('month', created_at), 'YYYY-MM') AS month,
        COUNT(*)::bigint AS count
    FROM reports
    WHERE created_by = $1
    GROUP BY 1
    ORDER BY 1
"#;

impl DbPool {
    /// Monthly report counts for one officer, ascending by month.
    pub async fn report_activity(&self, officer: &OfficerId) -> AppResult<ReportActivity> {
        Ok(ReportActivity {
            completed_by_incident_month: self
                .monthly_counts(COMPLETED_BY_INCIDENT_MONTH, officer)
                .await?,
            reported_by_month: self.monthly_counts(REPORTED_BY_MONTH, officer).await?,
        })
    }

    async fn monthly_counts(&self, sql: &str, officer: &OfficerId) -> AppResult<Vec<MonthlyCount>> {
        let rows = MonthRow::find_by_statement(Statement::from_sql_and_values(
            sea_orm::DatabaseBackend::Postgres,
            sql,
            [officer.as_str().into()],
        ))
        .all(self.connection())
        .await
        .map_err(|e| AppError::Database(format!("Failed to aggregate reports: {}", e)))?;

        Ok(rows
            .into_iter()
            .map(|row| MonthlyCount {
                month: row.month,
                count: row.count,
            })
            .collect())
    }
}
