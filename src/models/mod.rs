//! Domain models for Precinct Desk.

pub mod dashboard;
pub mod evidence;
pub mod officer;
pub mod report;
pub mod session;
pub mod suspect;

// Re-export commonly used types
pub use dashboard::{DashboardResponse, MonthlyCount, ReportActivity};
pub use evidence::{Evidence, EvidenceType, NewEvidence};
pub use officer::{
    CompleteProfileRequest, NewOfficer, Officer, OfficerId, UpdateContactRequest,
};
pub use report::{
    ListReportsQuery, NewReport, Report, ReportDetailResponse, ReportListResponse, ReportStatus,
};
pub use session::{Session, SessionClaims};
pub use suspect::{Ethnicity, Gender, NewSuspect, Suspect};
