//! Ports the report workflow drives.
//!
//! The workflow never talks to a database, bucket, device or local store
//! directly. Adapters implement these traits: SeaORM (`db`), S3
//! (`services::storage`), the file-backed key-value store
//! (`services::kv_store`) and, for hosted runs, uploads from the mobile
//! client standing in for camera and microphone.

use async_trait::async_trait;
use tokio::sync::watch;
use uuid::Uuid;

use super::media::{Coordinates, MediaFile};
use crate::error::AppResult;
use crate::models::{
    Evidence, NewEvidence, NewOfficer, NewReport, NewSuspect, Officer, OfficerId, Report,
    ReportActivity, ReportStatus, Session, Suspect,
};

/// Relational data service (tables `officers`, `reports`, `suspects`, `evidence`).
#[async_trait]
pub trait DataService: Send + Sync {
    /// Check connectivity.
    async fn ping(&self) -> AppResult<()>;

    /// Id of the officer whose email equals `email`.
    async fn find_officer_id_by_email(&self, email: &str) -> AppResult<Option<OfficerId>>;
    async fn get_officer(&self, id: &OfficerId) -> AppResult<Option<Officer>>;
    async fn insert_officer(&self, officer: NewOfficer) -> AppResult<Officer>;
    async fn update_officer_contact(&self, id: &OfficerId, contact: &str) -> AppResult<Officer>;
    async fn update_officer_picture(&self, id: &OfficerId, url: &str) -> AppResult<Officer>;

    /// Insert a report in `pending` status.
    async fn insert_report(&self, report: NewReport) -> AppResult<Report>;
    async fn get_report(&self, id: Uuid) -> AppResult<Option<Report>>;
    /// Reports created by `officer` with `status`, newest first.
    async fn list_reports(&self, officer: &OfficerId, status: ReportStatus)
    -> AppResult<Vec<Report>>;
    async fn update_report_status(&self, id: Uuid, status: ReportStatus) -> AppResult<Report>;

    async fn insert_suspect(&self, suspect: NewSuspect) -> AppResult<Suspect>;
    async fn list_suspects(&self, report_id: Uuid) -> AppResult<Vec<Suspect>>;

    /// Insert a batch of evidence rows as one unit, returning them in input order.
    async fn insert_evidence(&self, entries: Vec<NewEvidence>) -> AppResult<Vec<Evidence>>;
    async fn list_evidence(&self, case_id: Uuid) -> AppResult<Vec<Evidence>>;

    /// Pre-aggregated monthly report counts for the dashboard.
    async fn report_activity(&self, officer: &OfficerId) -> AppResult<ReportActivity>;
}

/// Object storage.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `data` under `key` and return the stored path.
    async fn upload(&self, key: &str, data: Vec<u8>, content_type: &str) -> AppResult<String>;

    /// Public URL of a stored path.
    fn public_url(&self, path: &str) -> String;
}

/// Local key-value persistence.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> AppResult<Option<String>>;
    async fn set(&self, key: &str, value: String) -> AppResult<()>;
    async fn remove(&self, key: &str) -> AppResult<()>;
}

/// Auth/session provider.
pub trait SessionProvider: Send + Sync {
    fn current_session(&self) -> Option<Session>;

    /// Receiver notified whenever the session changes.
    fn subscribe(&self) -> watch::Receiver<Option<Session>>;
}

/// Where a picked image comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickSource {
    Camera,
    Gallery,
}

/// Device capability guarded by a runtime permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Camera,
    MediaLibrary,
    Microphone,
    Location,
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Camera => "Camera",
            Self::MediaLibrary => "Media library",
            Self::Microphone => "Microphone",
            Self::Location => "Location",
        };
        f.write_str(name)
    }
}

/// Device capability failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeviceError {
    #[error("{0} permission was denied")]
    PermissionDenied(Capability),

    #[error("{0}")]
    Unavailable(String),
}

/// Camera and gallery picker.
#[async_trait]
pub trait MediaPicker: Send + Sync {
    /// Pick one image; `None` when the user cancelled.
    async fn pick_image(&self, source: PickSource) -> Result<Option<MediaFile>, DeviceError>;
}

/// Microphone recorder.
#[async_trait]
pub trait Microphone: Send + Sync {
    async fn start(&self) -> Result<(), DeviceError>;

    /// Stop the running recording, release the device and return the clip.
    async fn stop_and_unload(&self) -> Result<MediaFile, DeviceError>;
}

/// Geolocation.
#[async_trait]
pub trait Geolocator: Send + Sync {
    async fn current_position(&self) -> Result<Coordinates, DeviceError>;
}
