//! Hosted report workflow endpoints.
//!
//! Each run is driven by the officer's client one request at a time. The
//! client captures photos and audio itself and uploads them as multipart
//! files; the server holds the run between requests.

use actix_multipart::Multipart;
use actix_web::{HttpResponse, web};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::multipart::{MediaKind, UploadForm, UploadLimit, require_kind};
use crate::auth::AuthSession;
use crate::error::{AppError, AppResult, ErrorResponse};
use crate::services::WorkflowRegistry;
use crate::workflow::{Coordinates, LeaveDecision, ReportDraft, SuspectInput};

/// Step-1 field changes. Absent fields are left as they are.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct IncidentEdit {
    pub title: Option<String>,
    pub description: Option<String>,
    pub incident_date: Option<DateTime<Utc>>,
    /// Current position reported by the device.
    pub coordinates: Option<Coordinates>,
}

impl From<IncidentEdit> for ReportDraft {
    fn from(edit: IncidentEdit) -> Self {
        Self {
            title: edit.title,
            description: edit.description,
            location: edit.coordinates.map(|c| c.to_location()),
            incident_date: edit.incident_date,
        }
    }
}

/// Query for leaving a run.
#[derive(Debug, Deserialize, IntoParams)]
pub struct LeaveQuery {
    /// Leave even while a recording is running.
    #[serde(default)]
    pub confirmed: bool,
}

/// Start a workflow run, restoring the officer's draft.
#[utoipa::path(
    post,
    path = "/api/v1/workflows",
    tag = "Workflows",
    responses(
        (status = 201, description = "Run started", body = crate::workflow::WorkflowSnapshot),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn start_workflow(
    auth: AuthSession,
    registry: web::Data<WorkflowRegistry>,
) -> AppResult<HttpResponse> {
    let run = registry.start(auth.0).await?;
    let workflow = run.workflow.lock().await;
    Ok(HttpResponse::Created().json(workflow.snapshot(run.id)))
}

/// Current state of a run.
#[utoipa::path(
    get,
    path = "/api/v1/workflows/{id}",
    tag = "Workflows",
    params(("id" = Uuid, Path, description = "Run id")),
    responses(
        (status = 200, description = "Run state", body = crate::workflow::WorkflowSnapshot),
        (status = 404, description = "Run not found", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn get_workflow(
    auth: AuthSession,
    registry: web::Data<WorkflowRegistry>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let run = registry.get(path.into_inner(), &auth.0).await?;
    let workflow = run.workflow.lock().await;
    Ok(HttpResponse::Ok().json(workflow.snapshot(run.id)))
}

/// Leave a run. While audio is recording this needs `confirmed=true`.
#[utoipa::path(
    delete,
    path = "/api/v1/workflows/{id}",
    tag = "Workflows",
    params(("id" = Uuid, Path, description = "Run id"), LeaveQuery),
    responses(
        (status = 204, description = "Run closed"),
        (status = 404, description = "Run not found", body = ErrorResponse),
        (status = 409, description = "Recording in progress", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn leave_workflow(
    auth: AuthSession,
    registry: web::Data<WorkflowRegistry>,
    path: web::Path<Uuid>,
    query: web::Query<LeaveQuery>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let run = registry.get(id, &auth.0).await?;

    let decision = run.workflow.lock().await.leave(query.confirmed).await;
    if let LeaveDecision::ConfirmRequired(alert) = decision {
        return Ok(HttpResponse::Conflict().json(ErrorResponse {
            error: "CONFIRMATION_REQUIRED".to_string(),
            message: alert.message,
        }));
    }

    registry.remove(id, &auth.0).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Edit step-1 fields. Every change is written through to the draft.
#[utoipa::path(
    patch,
    path = "/api/v1/workflows/{id}/incident",
    tag = "Workflows",
    params(("id" = Uuid, Path, description = "Run id")),
    request_body = IncidentEdit,
    responses(
        (status = 200, description = "Fields updated", body = crate::workflow::WorkflowSnapshot),
        (status = 409, description = "Run is past step 1", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn edit_incident(
    auth: AuthSession,
    registry: web::Data<WorkflowRegistry>,
    path: web::Path<Uuid>,
    body: web::Json<IncidentEdit>,
) -> AppResult<HttpResponse> {
    let run = registry.get(path.into_inner(), &auth.0).await?;
    let mut workflow = run.workflow.lock().await;
    workflow
        .incident_mut()?
        .edit(ReportDraft::from(body.into_inner()))
        .await;
    Ok(HttpResponse::Ok().json(workflow.snapshot(run.id)))
}

/// Step 1: create the report.
#[utoipa::path(
    post,
    path = "/api/v1/workflows/{id}/incident/submit",
    tag = "Workflows",
    params(("id" = Uuid, Path, description = "Run id")),
    responses(
        (status = 201, description = "Report created", body = crate::workflow::WorkflowSnapshot),
        (status = 400, description = "Invalid fields", body = ErrorResponse),
        (status = 401, description = "No officer profile", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn submit_incident(
    auth: AuthSession,
    registry: web::Data<WorkflowRegistry>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let run = registry.get(path.into_inner(), &auth.0).await?;
    let mut workflow = run.workflow.lock().await;
    let report_id = workflow.submit_incident().await?.id;
    tracing::info!(run_id = %run.id, %report_id, "Report created");
    Ok(HttpResponse::Created().json(workflow.snapshot(run.id)))
}

/// Step 2: suspect fields plus the `photo` file.
#[utoipa::path(
    post,
    path = "/api/v1/workflows/{id}/suspect",
    tag = "Workflows",
    params(("id" = Uuid, Path, description = "Run id")),
    request_body(content_type = "multipart/form-data", description = "name, age, gender, ethnicity, description and photo"),
    responses(
        (status = 201, description = "Suspect added", body = crate::workflow::WorkflowSnapshot),
        (status = 400, description = "Invalid fields", body = ErrorResponse),
        (status = 502, description = "Photo upload failed", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn submit_suspect(
    auth: AuthSession,
    registry: web::Data<WorkflowRegistry>,
    limit: web::Data<UploadLimit>,
    path: web::Path<Uuid>,
    mut payload: Multipart,
) -> AppResult<HttpResponse> {
    let mut form = UploadForm::read(&mut payload, limit.0).await?;
    let input = SuspectInput {
        name: form.text_or_empty("name"),
        age: form.text_or_empty("age"),
        gender: form.text_or_empty("gender"),
        ethnicity: form.text_or_empty("ethnicity"),
        description: form.text_or_empty("description"),
    };
    let photo = form.take_file("photo");
    if let Some(photo) = &photo {
        require_kind(photo, MediaKind::Image, "Suspect photo")?;
    }

    let run = registry.get(path.into_inner(), &auth.0).await?;
    let mut workflow = run.workflow.lock().await;
    let step = workflow.suspect_mut()?;
    step.set_input(input);
    if let Some(photo) = photo {
        step.attach_photo(photo);
    }

    let suspect_id = workflow.submit_suspect().await?.id;
    tracing::info!(run_id = %run.id, %suspect_id, "Suspect added");
    Ok(HttpResponse::Created().json(workflow.snapshot(run.id)))
}

/// Add one or more `photo` files to the pending evidence.
#[utoipa::path(
    post,
    path = "/api/v1/workflows/{id}/evidence/photos",
    tag = "Workflows",
    params(("id" = Uuid, Path, description = "Run id")),
    request_body(content_type = "multipart/form-data", description = "One or more photo files"),
    responses(
        (status = 200, description = "Photos added", body = crate::workflow::WorkflowSnapshot),
        (status = 400, description = "Not an image or photo limit reached", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn add_photos(
    auth: AuthSession,
    registry: web::Data<WorkflowRegistry>,
    limit: web::Data<UploadLimit>,
    path: web::Path<Uuid>,
    mut payload: Multipart,
) -> AppResult<HttpResponse> {
    let photos = UploadForm::read(&mut payload, limit.0)
        .await?
        .take_files("photo");
    if photos.is_empty() {
        return Err(AppError::InvalidInput("No photo files in request".to_string()));
    }
    for photo in &photos {
        require_kind(photo, MediaKind::Image, "Photo")?;
    }

    let run = registry.get(path.into_inner(), &auth.0).await?;
    let mut workflow = run.workflow.lock().await;
    let step = workflow.evidence_mut()?;
    for photo in photos {
        step.add_photo(photo)?;
    }
    Ok(HttpResponse::Ok().json(workflow.snapshot(run.id)))
}

/// Remove a pending photo by position.
#[utoipa::path(
    delete,
    path = "/api/v1/workflows/{id}/evidence/photos/{index}",
    tag = "Workflows",
    params(
        ("id" = Uuid, Path, description = "Run id"),
        ("index" = usize, Path, description = "Position in the pending list")
    ),
    responses(
        (status = 200, description = "Photo removed", body = crate::workflow::WorkflowSnapshot),
        (status = 404, description = "No photo at index", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn remove_photo(
    auth: AuthSession,
    registry: web::Data<WorkflowRegistry>,
    path: web::Path<(Uuid, usize)>,
) -> AppResult<HttpResponse> {
    let (id, index) = path.into_inner();
    let run = registry.get(id, &auth.0).await?;
    let mut workflow = run.workflow.lock().await;
    workflow
        .evidence_mut()?
        .remove_photo(index)
        .ok_or_else(|| AppError::NotFound(format!("Photo {}", index)))?;
    Ok(HttpResponse::Ok().json(workflow.snapshot(run.id)))
}

/// Attach the `audio` clip recorded on the device.
#[utoipa::path(
    put,
    path = "/api/v1/workflows/{id}/evidence/audio",
    tag = "Workflows",
    params(("id" = Uuid, Path, description = "Run id")),
    request_body(content_type = "multipart/form-data", description = "One audio file"),
    responses(
        (status = 200, description = "Clip attached", body = crate::workflow::WorkflowSnapshot),
        (status = 400, description = "Missing or non-audio file", body = ErrorResponse),
        (status = 409, description = "A clip is already held", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn attach_audio(
    auth: AuthSession,
    registry: web::Data<WorkflowRegistry>,
    limit: web::Data<UploadLimit>,
    path: web::Path<Uuid>,
    mut payload: Multipart,
) -> AppResult<HttpResponse> {
    let clip = UploadForm::read(&mut payload, limit.0)
        .await?
        .take_file("audio")
        .ok_or_else(|| AppError::InvalidInput("No audio file in request".to_string()))?;
    require_kind(&clip, MediaKind::Audio, "Audio")?;

    let run = registry.get(path.into_inner(), &auth.0).await?;
    let mut workflow = run.workflow.lock().await;
    workflow.evidence_mut()?.recorder_mut().attach(clip)?;
    Ok(HttpResponse::Ok().json(workflow.snapshot(run.id)))
}

/// Discard the held clip.
#[utoipa::path(
    delete,
    path = "/api/v1/workflows/{id}/evidence/audio",
    tag = "Workflows",
    params(("id" = Uuid, Path, description = "Run id")),
    responses(
        (status = 200, description = "Clip discarded", body = crate::workflow::WorkflowSnapshot),
    ),
    security(("bearer" = []))
)]
pub async fn discard_audio(
    auth: AuthSession,
    registry: web::Data<WorkflowRegistry>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let run = registry.get(path.into_inner(), &auth.0).await?;
    let mut workflow = run.workflow.lock().await;
    workflow.evidence_mut()?.recorder_mut().discard()?;
    Ok(HttpResponse::Ok().json(workflow.snapshot(run.id)))
}

/// Step 3: upload and register the pending evidence.
///
/// A partial failure answers 409; the rows already written stay and a
/// retry only sends the failed items.
#[utoipa::path(
    post,
    path = "/api/v1/workflows/{id}/evidence/submit",
    tag = "Workflows",
    params(("id" = Uuid, Path, description = "Run id")),
    responses(
        (status = 201, description = "Evidence stored", body = crate::workflow::WorkflowSnapshot),
        (status = 400, description = "Nothing to submit", body = ErrorResponse),
        (status = 409, description = "Some items failed or recording in progress", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn submit_evidence(
    auth: AuthSession,
    registry: web::Data<WorkflowRegistry>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let run = registry.get(path.into_inner(), &auth.0).await?;
    let mut workflow = run.workflow.lock().await;
    let count = workflow.submit_evidence().await?.len();
    tracing::info!(run_id = %run.id, evidence = count, "Evidence stored");
    Ok(HttpResponse::Created().json(workflow.snapshot(run.id)))
}

/// Step 4: the report summary. Each call reloads it.
#[utoipa::path(
    get,
    path = "/api/v1/workflows/{id}/summary",
    tag = "Workflows",
    params(("id" = Uuid, Path, description = "Run id")),
    responses(
        (status = 200, description = "Summary state", body = crate::workflow::SummaryState),
        (status = 409, description = "Run has not reached the summary", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn get_summary(
    auth: AuthSession,
    registry: web::Data<WorkflowRegistry>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let run = registry.get(path.into_inner(), &auth.0).await?;
    let mut workflow = run.workflow.lock().await;
    let state = workflow.load_summary().await?;
    Ok(HttpResponse::Ok().json(state))
}

/// Configure workflow routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/workflows").route(web::post().to(start_workflow)))
        .service(
            web::resource("/workflows/{id}")
                .route(web::get().to(get_workflow))
                .route(web::delete().to(leave_workflow)),
        )
        .service(web::resource("/workflows/{id}/incident").route(web::patch().to(edit_incident)))
        .service(
            web::resource("/workflows/{id}/incident/submit").route(web::post().to(submit_incident)),
        )
        .service(web::resource("/workflows/{id}/suspect").route(web::post().to(submit_suspect)))
        .service(
            web::resource("/workflows/{id}/evidence/photos").route(web::post().to(add_photos)),
        )
        .service(
            web::resource("/workflows/{id}/evidence/photos/{index}")
                .route(web::delete().to(remove_photo)),
        )
        .service(
            web::resource("/workflows/{id}/evidence/audio")
                .route(web::put().to(attach_audio))
                .route(web::delete().to(discard_audio)),
        )
        .service(
            web::resource("/workflows/{id}/evidence/submit").route(web::post().to(submit_evidence)),
        )
        .service(web::resource("/workflows/{id}/summary").route(web::get().to(get_summary)));
}
