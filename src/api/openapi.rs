//! OpenAPI documentation configuration.

use utoipa::OpenApi;

use crate::{api, error, models, workflow};

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Precinct Desk",
        version = "0.1.0",
        description = "Report desk server hosting the guided incident report workflow, report review, dashboard and officer profiles"
    ),
    servers(
        (url = "/", description = "Local server")
    ),
    paths(
        // Health endpoints
        api::health::health,
        api::health::ready,
        // Workflow endpoints
        api::workflows::start_workflow,
        api::workflows::get_workflow,
        api::workflows::leave_workflow,
        api::workflows::edit_incident,
        api::workflows::submit_incident,
        api::workflows::submit_suspect,
        api::workflows::add_photos,
        api::workflows::remove_photo,
        api::workflows::attach_audio,
        api::workflows::discard_audio,
        api::workflows::submit_evidence,
        api::workflows::get_summary,
        // Report review
        api::reports::list_reports,
        api::reports::get_report,
        api::reports::complete_report,
        // Dashboard
        api::dashboard::get_dashboard,
        // Officers
        api::officers::complete_profile,
        api::officers::get_profile,
        api::officers::update_contact,
        api::officers::replace_picture,
    ),
    components(
        schemas(
            // Common
            error::ErrorResponse,
            // Health
            api::health::HealthResponse,
            api::health::ReadyResponse,
            // Workflow
            api::workflows::IncidentEdit,
            workflow::WorkflowSnapshot,
            workflow::IncidentForm,
            workflow::SuspectInput,
            workflow::RecorderStatus,
            workflow::Coordinates,
            workflow::Alert,
            workflow::SummaryState,
            workflow::Summary,
            workflow::EvidenceView,
            // Reports
            models::ReportStatus,
            models::Report,
            models::ReportListResponse,
            models::ReportDetailResponse,
            models::Suspect,
            models::Gender,
            models::Ethnicity,
            models::Evidence,
            models::EvidenceType,
            // Dashboard
            models::DashboardResponse,
            models::ReportActivity,
            models::MonthlyCount,
            // Officers
            models::Officer,
            models::OfficerId,
            models::UpdateContactRequest,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Workflows", description = "Guided incident report workflow"),
        (name = "Reports", description = "Report review"),
        (name = "Dashboard", description = "Report statistics"),
        (name = "Officers", description = "Officer profile")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Add bearer token security scheme.
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
