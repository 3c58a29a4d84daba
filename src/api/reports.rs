//! Report review endpoints.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use super::require_officer;
use crate::auth::AuthSession;
use crate::error::{AppError, AppResult, ErrorResponse};
use crate::models::{
    ListReportsQuery, OfficerId, Report, ReportDetailResponse, ReportListResponse, ReportStatus,
};
use crate::workflow::DataService;

/// Report `id` if it exists and was created by `officer`. Other officers'
/// reports look the same as missing ones.
async fn owned_report(data: &dyn DataService, id: Uuid, officer: &OfficerId) -> AppResult<Report> {
    data.get_report(id)
        .await?
        .filter(|report| &report.created_by == officer)
        .ok_or_else(|| AppError::NotFound(format!("Report {}", id)))
}

/// List the signed-in officer's reports, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/reports",
    tag = "Reports",
    params(("status" = Option<ReportStatus>, Query, description = "Status filter (default: pending)")),
    responses(
        (status = 200, description = "Reports", body = ReportListResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn list_reports(
    auth: AuthSession,
    data: web::Data<dyn DataService>,
    query: web::Query<ListReportsQuery>,
) -> AppResult<HttpResponse> {
    let officer = require_officer(&data, &auth.0).await?;
    let status = query.status.unwrap_or(ReportStatus::Pending);
    let reports = data.list_reports(&officer, status).await?;

    Ok(HttpResponse::Ok().json(ReportListResponse { status, reports }))
}

/// A report with its suspects and evidence.
#[utoipa::path(
    get,
    path = "/api/v1/reports/{id}",
    tag = "Reports",
    params(("id" = Uuid, Path, description = "Report UUID")),
    responses(
        (status = 200, description = "Report detail", body = ReportDetailResponse),
        (status = 404, description = "Report not found", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn get_report(
    auth: AuthSession,
    data: web::Data<dyn DataService>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let officer = require_officer(&data, &auth.0).await?;
    let report = owned_report(data.get_ref(), path.into_inner(), &officer).await?;
    let suspects = data.list_suspects(report.id).await?;
    let evidence = data.list_evidence(report.id).await?;

    Ok(HttpResponse::Ok().json(ReportDetailResponse {
        report,
        suspects,
        evidence,
    }))
}

/// Mark a report completed. Completing it twice is not an error.
#[utoipa::path(
    post,
    path = "/api/v1/reports/{id}/complete",
    tag = "Reports",
    params(("id" = Uuid, Path, description = "Report UUID")),
    responses(
        (status = 200, description = "Report completed", body = Report),
        (status = 404, description = "Report not found", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn complete_report(
    auth: AuthSession,
    data: web::Data<dyn DataService>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let officer = require_officer(&data, &auth.0).await?;
    let report = owned_report(data.get_ref(), path.into_inner(), &officer).await?;

    if report.status == ReportStatus::Completed {
        return Ok(HttpResponse::Ok().json(report));
    }

    let report = data
        .update_report_status(report.id, ReportStatus::Completed)
        .await?;
    tracing::info!(report_id = %report.id, officer = %officer, "Report completed");
    Ok(HttpResponse::Ok().json(report))
}

/// Configure report routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/reports").route(web::get().to(list_reports)))
        .service(web::resource("/reports/{id}").route(web::get().to(get_report)))
        .service(web::resource("/reports/{id}/complete").route(web::post().to(complete_report)));
}
