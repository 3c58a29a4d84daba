//! Shared helpers for HTTP integration tests.

use std::sync::Arc;

use actix_web::{App, dev::ServiceResponse, test, web};
use serde_json::Value;

use precinct_desk_lib::api::{self, UploadLimit};
use precinct_desk_lib::middleware::RequestLogger;
use precinct_desk_lib::services::WorkflowRegistry;
use precinct_desk_lib::test_support::{TestHarness, session_verifier};
use precinct_desk_lib::workflow::{Collaborators, DataService, Devices, ObjectStore};

pub use precinct_desk_lib::test_support::bearer;

/// Multipart boundary used by [`multipart`].
const BOUNDARY: &str = "precinct-test-boundary";

/// Jane, registered as officer O1 by every harness.
pub fn jane() -> String {
    bearer("u1", "jane@x.com")
}

/// Create the API app over `harness`, wired like the server binary.
pub async fn create_test_app(
    harness: &TestHarness,
) -> impl actix_web::dev::Service<
    actix_http::Request,
    Response = ServiceResponse,
    Error = actix_web::Error,
> {
    let data: Arc<dyn DataService> = harness.data.clone();
    let objects: Arc<dyn ObjectStore> = harness.objects.clone();
    let registry = WorkflowRegistry::new(Collaborators {
        devices: Devices::unavailable(),
        ..harness.collaborators()
    });

    test::init_service(
        App::new()
            .wrap(RequestLogger)
            .app_data(web::Data::from(data))
            .app_data(web::Data::from(objects))
            .app_data(web::Data::new(registry))
            .app_data(web::Data::new(session_verifier()))
            .app_data(web::Data::new(UploadLimit(1024 * 1024)))
            .service(web::scope("/api/v1").configure(api::configure_routes)),
    )
    .await
}

/// One part of a multipart body.
pub enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        name: &'a str,
        filename: &'a str,
        content_type: &'a str,
        bytes: &'a [u8],
    },
}

/// `(content type header, body)` for a multipart/form-data request.
pub fn multipart(parts: &[Part<'_>]) -> (String, Vec<u8>) {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name)
                        .as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File {
                name,
                filename,
                content_type,
                bytes,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                        name, filename, content_type
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    (format!("multipart/form-data; boundary={}", BOUNDARY), body)
}

/// A JPEG file part named `name`.
pub fn photo<'a>(name: &'a str, filename: &'a str) -> Part<'a> {
    Part::File {
        name,
        filename,
        content_type: "image/jpeg",
        bytes: &[0xFF, 0xD8, 0xFF, 0xE0],
    }
}

/// Send `req` and return `(status, JSON body)`. Empty bodies become `Null`.
pub async fn send<S>(app: &S, req: actix_http::Request) -> (u16, Value)
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = ServiceResponse,
            Error = actix_web::Error,
        >,
{
    let resp = test::call_service(app, req).await;
    let status = resp.status().as_u16();
    let bytes = test::read_body(resp).await;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

/// Multipart request with a bearer token.
pub fn multipart_request(
    method: actix_web::http::Method,
    uri: &str,
    token: &str,
    parts: &[Part<'_>],
) -> actix_http::Request {
    let (content_type, body) = multipart(parts);
    test::TestRequest::default()
        .method(method)
        .uri(uri)
        .insert_header(("Authorization", token.to_string()))
        .insert_header(("Content-Type", content_type))
        .set_payload(body)
        .to_request()
}
