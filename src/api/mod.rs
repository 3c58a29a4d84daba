//! API endpoint modules.

pub mod dashboard;
pub mod health;
pub mod multipart;
pub mod officers;
pub mod openapi;
pub mod reports;
pub mod workflows;

use actix_web::web;

pub use health::configure_health_routes;
pub use multipart::UploadLimit;
pub use openapi::ApiDoc;

use crate::error::{AppError, AppResult};
use crate::models::{OfficerId, Session};
use crate::workflow::{DataService, IdentityResolver};

/// Configure every `/api/v1` route.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.configure(configure_health_routes)
        .configure(workflows::configure_routes)
        .configure(reports::configure_routes)
        .configure(dashboard::configure_routes)
        .configure(officers::configure_routes);
}

/// Officer id of the signed-in session, or 401 when it has no officer profile.
pub(crate) async fn require_officer(
    data: &web::Data<dyn DataService>,
    session: &Session,
) -> AppResult<OfficerId> {
    IdentityResolver::new(data.clone().into_inner())
        .resolve_session(Some(session))
        .await
        .ok_or_else(|| {
            AppError::Unauthorized("No officer profile for this session".to_string())
        })
}
