//! Officer profile endpoints.

use actix_multipart::Multipart;
use actix_web::{HttpResponse, web};
use chrono::Utc;

use super::multipart::{MediaKind, UploadForm, UploadLimit, require_kind};
use super::require_officer;
use crate::auth::AuthSession;
use crate::error::{AppError, AppResult, ErrorResponse};
use crate::models::officer::validate_contact;
use crate::models::{CompleteProfileRequest, NewOfficer, Officer, OfficerId, UpdateContactRequest};
use crate::workflow::{DataService, MediaFile, ObjectStore};

const PROFILE_PICTURE_PREFIX: &str = "profile-images/officers";

/// Upload a profile picture and return its public URL.
async fn upload_picture(
    objects: &dyn ObjectStore,
    officer: &OfficerId,
    picture: MediaFile,
) -> AppResult<String> {
    require_kind(&picture, MediaKind::Image, "Profile picture")?;

    let key = format!(
        "{}/{}_{}.{}",
        PROFILE_PICTURE_PREFIX,
        officer,
        Utc::now().timestamp_millis(),
        picture.extension()
    );
    let path = objects
        .upload(&key, picture.bytes, &picture.content_type)
        .await?;
    Ok(objects.public_url(&path))
}

fn profile_request(form: &UploadForm) -> AppResult<CompleteProfileRequest> {
    let badge_number = form
        .text("badge_number")
        .unwrap_or_default()
        .trim()
        .parse::<i32>()
        .map_err(|_| AppError::InvalidInput("Badge number must be a number".to_string()))?;

    Ok(CompleteProfileRequest {
        name: form.text_or_empty("name"),
        badge_number,
        rank: form.text_or_empty("rank"),
        contact: form.text_or_empty("contact"),
    })
}

/// Complete the officer profile after signup.
///
/// Id and email come from the session. An optional `picture` file is
/// uploaded before the row is written.
#[utoipa::path(
    post,
    path = "/api/v1/officers",
    tag = "Officers",
    request_body(content_type = "multipart/form-data", description = "name, badge_number, rank, contact and optional picture"),
    responses(
        (status = 201, description = "Profile created", body = Officer),
        (status = 400, description = "Invalid fields", body = ErrorResponse),
        (status = 409, description = "Profile already exists", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn complete_profile(
    auth: AuthSession,
    data: web::Data<dyn DataService>,
    objects: web::Data<dyn ObjectStore>,
    limit: web::Data<UploadLimit>,
    mut payload: Multipart,
) -> AppResult<HttpResponse> {
    let session = auth.0;
    let email = session
        .authenticated_email()
        .ok_or_else(|| AppError::Unauthorized("Session has no email".to_string()))?
        .to_string();

    let mut form = UploadForm::read(&mut payload, limit.0).await?;
    let request = profile_request(&form)?;
    request.validate().map_err(AppError::InvalidInput)?;

    let id = OfficerId::new(session.user_id.clone());
    if data.get_officer(&id).await?.is_some()
        || data.find_officer_id_by_email(&email).await?.is_some()
    {
        return Err(AppError::Conflict("Officer profile already exists".to_string()));
    }

    let profile_picture = match form.take_file("picture") {
        Some(picture) => Some(upload_picture(objects.get_ref(), &id, picture).await?),
        None => None,
    };

    let officer = data
        .insert_officer(NewOfficer {
            id,
            name: request.name.trim().to_string(),
            badge_number: request.badge_number,
            rank: request.rank.trim().to_string(),
            email,
            contact: request.contact,
            profile_picture,
        })
        .await?;

    tracing::info!(officer = %officer.id, "Officer profile completed");
    Ok(HttpResponse::Created().json(officer))
}

/// The signed-in officer's profile.
#[utoipa::path(
    get,
    path = "/api/v1/officers/me",
    tag = "Officers",
    responses(
        (status = 200, description = "Profile", body = Officer),
        (status = 401, description = "No officer profile", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn get_profile(
    auth: AuthSession,
    data: web::Data<dyn DataService>,
) -> AppResult<HttpResponse> {
    let id = require_officer(&data, &auth.0).await?;
    let officer = data
        .get_officer(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Officer {}", id)))?;
    Ok(HttpResponse::Ok().json(officer))
}

/// Change the contact number.
#[utoipa::path(
    patch,
    path = "/api/v1/officers/me/contact",
    tag = "Officers",
    request_body = UpdateContactRequest,
    responses(
        (status = 200, description = "Contact updated", body = Officer),
        (status = 400, description = "Not 10 digits", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn update_contact(
    auth: AuthSession,
    data: web::Data<dyn DataService>,
    body: web::Json<UpdateContactRequest>,
) -> AppResult<HttpResponse> {
    validate_contact(&body.contact).map_err(AppError::InvalidInput)?;
    let id = require_officer(&data, &auth.0).await?;
    let officer = data.update_officer_contact(&id, &body.contact).await?;
    Ok(HttpResponse::Ok().json(officer))
}

/// Replace the profile picture with the uploaded `picture` file.
#[utoipa::path(
    put,
    path = "/api/v1/officers/me/picture",
    tag = "Officers",
    request_body(content_type = "multipart/form-data", description = "One picture file"),
    responses(
        (status = 200, description = "Picture replaced", body = Officer),
        (status = 400, description = "Missing or invalid picture", body = ErrorResponse),
        (status = 502, description = "Upload failed", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn replace_picture(
    auth: AuthSession,
    data: web::Data<dyn DataService>,
    objects: web::Data<dyn ObjectStore>,
    limit: web::Data<UploadLimit>,
    mut payload: Multipart,
) -> AppResult<HttpResponse> {
    let picture = UploadForm::read(&mut payload, limit.0)
        .await?
        .take_file("picture")
        .ok_or_else(|| AppError::InvalidInput("No picture file in request".to_string()))?;

    let id = require_officer(&data, &auth.0).await?;
    let url = upload_picture(objects.get_ref(), &id, picture).await?;
    let officer = data.update_officer_picture(&id, &url).await?;
    Ok(HttpResponse::Ok().json(officer))
}

/// Configure officer routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/officers").route(web::post().to(complete_profile)))
        .service(web::resource("/officers/me").route(web::get().to(get_profile)))
        .service(web::resource("/officers/me/contact").route(web::patch().to(update_contact)))
        .service(web::resource("/officers/me/picture").route(web::put().to(replace_picture)));
}
