//! Database module: connection management and table-scoped queries.

pub mod dashboard;
pub mod evidence;
pub mod officers;
pub mod reports;
pub mod suspects;

use std::time::Duration;

use async_trait::async_trait;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::{
    Evidence, NewEvidence, NewOfficer, NewReport, NewSuspect, Officer, OfficerId, Report,
    ReportActivity, ReportStatus, Suspect,
};
use crate::workflow::DataService;

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct DbPool {
    conn: DatabaseConnection,
}

impl DbPool {
    /// Create a new database pool from configuration.
    pub async fn new(config: &Config) -> AppResult<Self> {
        let mut options = ConnectOptions::new(config.database.url.clone());
        options
            .max_connections(config.database.max_connections)
            .min_connections(config.database.min_connections)
            .connect_timeout(Duration::from_secs(10))
            .sqlx_logging(false);

        let conn = Database::connect(options)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to database: {}", e)))?;

        Ok(Self { conn })
    }

    /// Get the underlying connection for executing queries.
    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }
}

#[async_trait]
impl DataService for DbPool {
    async fn ping(&self) -> AppResult<()> {
        self.conn
            .ping()
            .await
            .map_err(|e| AppError::Database(format!("Database ping failed: {}", e)))
    }

    async fn find_officer_id_by_email(&self, email: &str) -> AppResult<Option<OfficerId>> {
        self.find_officer_id_by_email(email).await
    }

    async fn get_officer(&self, id: &OfficerId) -> AppResult<Option<Officer>> {
        self.get_officer(id).await
    }

    async fn insert_officer(&self, officer: NewOfficer) -> AppResult<Officer> {
        self.insert_officer(officer).await
    }

    async fn update_officer_contact(&self, id: &OfficerId, contact: &str) -> AppResult<Officer> {
        self.update_officer_contact(id, contact).await
    }

    async fn update_officer_picture(&self, id: &OfficerId, url: &str) -> AppResult<Officer> {
        self.update_officer_picture(id, url).await
    }

    async fn insert_report(&self, report: NewReport) -> AppResult<Report> {
        self.insert_report(report).await
    }

    async fn get_report(&self, id: Uuid) -> AppResult<Option<Report>> {
        self.get_report(id).await
    }

    async fn list_reports(
        &self,
        officer: &OfficerId,
        status: ReportStatus,
    ) -> AppResult<Vec<Report>> {
        self.list_reports(officer, status).await
    }

    async fn update_report_status(&self, id: Uuid, status: ReportStatus) -> AppResult<Report> {
        self.update_report_status(id, status).await
    }

    async fn insert_suspect(&self, suspect: NewSuspect) -> AppResult<Suspect> {
        self.insert_suspect(suspect).await
    }

    async fn list_suspects(&self, report_id: Uuid) -> AppResult<Vec<Suspect>> {
        self.list_suspects(report_id).await
    }

    async fn insert_evidence(&self, entries: Vec<NewEvidence>) -> AppResult<Vec<Evidence>> {
        self.insert_evidence_batch(entries).await
    }

    async fn list_evidence(&self, case_id: Uuid) -> AppResult<Vec<Evidence>> {
        self.list_evidence(case_id).await
    }

    async fn report_activity(&self, officer: &OfficerId) -> AppResult<ReportActivity> {
        self.report_activity(officer).await
    }
}
