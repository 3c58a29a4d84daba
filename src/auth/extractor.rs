//! Actix-web extractor for bearer access tokens.

use actix_web::dev::Payload;
use actix_web::http::StatusCode;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{FromRequest, HttpRequest, HttpResponse, ResponseError, web};
use std::future::{Ready, ready};

use super::SessionVerifier;
use crate::error::ErrorResponse;
use crate::models::Session;

/// Authentication error for extractors.
#[derive(Debug)]
pub struct AuthError {
    message: String,
}

impl AuthError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl ResponseError for AuthError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(StatusCode::UNAUTHORIZED).json(ErrorResponse {
            error: "UNAUTHORIZED".to_string(),
            message: self.message.clone(),
        })
    }
}

/// Extractor that requires a valid `Authorization: Bearer <token>` header.
///
/// ```ignore
/// async fn handler(auth: AuthSession) -> impl Responder {
///     // auth.0 is the verified session
/// }
/// ```
pub struct AuthSession(pub Session);

impl AuthSession {
    pub fn session(&self) -> &Session {
        &self.0
    }
}

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

impl FromRequest for AuthSession {
    type Error = AuthError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let verifier = match req.app_data::<web::Data<SessionVerifier>>() {
            Some(verifier) => verifier,
            None => return ready(Err(AuthError::new("Internal configuration error"))),
        };

        let token = match bearer_token(req) {
            Some(token) => token,
            None => {
                return ready(Err(AuthError::new(
                    "Missing access token. Provide Authorization: Bearer header.",
                )));
            }
        };

        match verifier.verify(token) {
            Ok(session) => ready(Ok(AuthSession(session))),
            Err(e) => {
                tracing::debug!("Rejected access token: {}", e);
                ready(Err(AuthError::new("Invalid or expired access token")))
            }
        }
    }
}
