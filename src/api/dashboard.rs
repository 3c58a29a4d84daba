//! Dashboard statistics endpoint.

use actix_web::{HttpResponse, web};

use super::require_officer;
use crate::auth::AuthSession;
use crate::error::{AppResult, ErrorResponse};
use crate::models::{DashboardResponse, ReportStatus};
use crate::workflow::DataService;

/// Pending reports and monthly activity of the signed-in officer.
#[utoipa::path(
    get,
    path = "/api/v1/dashboard",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Dashboard statistics", body = DashboardResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn get_dashboard(
    auth: AuthSession,
    data: web::Data<dyn DataService>,
) -> AppResult<HttpResponse> {
    let officer = require_officer(&data, &auth.0).await?;
    let pending_reports = data.list_reports(&officer, ReportStatus::Pending).await?;
    let activity = data.report_activity(&officer).await?;

    Ok(HttpResponse::Ok().json(DashboardResponse {
        pending_reports,
        activity,
    }))
}

/// Configure dashboard routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/dashboard").route(web::get().to(get_dashboard)));
}
