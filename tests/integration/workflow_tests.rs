//! Hosted workflow runs driven over HTTP.

use actix_web::http::Method;
use actix_web::test;
use precinct_desk_lib::test_support::{TestHarness, officer};
use serde_json::json;

use super::helpers::*;

async fn start_run<S>(app: &S, token: &str) -> String
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
        >,
{
    let req = test::TestRequest::post()
        .uri("/api/v1/workflows")
        .insert_header(("Authorization", token.to_string()))
        .to_request();
    let (status, body) = send(app, req).await;
    assert_eq!(status, 201);
    body["id"].as_str().unwrap().to_string()
}

fn suspect_parts() -> Vec<Part<'static>> {
    vec![
        Part::Text("name", "Suspect A"),
        Part::Text("age", "30"),
        Part::Text("gender", "Male"),
        Part::Text("ethnicity", "White"),
        Part::Text("description", "Tall, dark jacket"),
        photo("photo", "suspect.jpg"),
    ]
}

#[actix_rt::test]
async fn test_full_report_run() {
    let harness = TestHarness::new();
    let app = create_test_app(&harness).await;
    let token = jane();

    let id = start_run(&app, &token).await;
    let base = format!("/api/v1/workflows/{}", id);

    // Step 1
    let req = test::TestRequest::patch()
        .uri(&format!("{}/incident", base))
        .insert_header(("Authorization", token.clone()))
        .set_json(json!({
            "title": "Theft",
            "description": "Wallet stolen from car",
            "coordinates": { "latitude": 51.5, "longitude": -0.12 }
        }))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, 200);
    assert_eq!(body["stage"], "incident");
    assert_eq!(body["incident"]["location"], "Lat: 51.5, Lon: -0.12");

    let req = test::TestRequest::post()
        .uri(&format!("{}/incident/submit", base))
        .insert_header(("Authorization", token.clone()))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, 201);
    assert_eq!(body["stage"], "suspect");
    assert_eq!(body["report"]["status"], "pending");
    assert_eq!(body["report"]["created_by"], "O1");
    assert!(harness.kv_is_empty().await);

    // Step 2
    let req = multipart_request(
        Method::POST,
        &format!("{}/suspect", base),
        &token,
        &suspect_parts(),
    );
    let (status, body) = send(&app, req).await;
    assert_eq!(status, 201);
    assert_eq!(body["stage"], "evidence");
    assert_eq!(body["suspect"]["name"], "Suspect A");

    // Step 3
    let req = multipart_request(
        Method::POST,
        &format!("{}/evidence/photos", base),
        &token,
        &[photo("photo", "scene-1.jpg"), photo("photo", "scene-2.jpg")],
    );
    let (status, body) = send(&app, req).await;
    assert_eq!(status, 200);
    assert_eq!(body["pending_photos"].as_array().unwrap().len(), 2);

    let req = multipart_request(
        Method::PUT,
        &format!("{}/evidence/audio", base),
        &token,
        &[Part::File {
            name: "audio",
            filename: "statement.mp3",
            content_type: "audio/mpeg",
            bytes: b"ID3",
        }],
    );
    let (status, _) = send(&app, req).await;
    assert_eq!(status, 200);

    let req = test::TestRequest::post()
        .uri(&format!("{}/evidence/submit", base))
        .insert_header(("Authorization", token.clone()))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, 201);
    assert_eq!(body["stage"], "summary");
    assert_eq!(body["evidence"].as_array().unwrap().len(), 4);
    assert_eq!(harness.data.evidence().len(), 4);

    // Step 4
    let req = test::TestRequest::get()
        .uri(&format!("{}/summary", base))
        .insert_header(("Authorization", token.clone()))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, 200);
    assert_eq!(body["state"], "ready");
    assert_eq!(body["report_title"], "Theft");
    assert_eq!(body["suspect_name"], "Suspect A");

    // Leave
    let req = test::TestRequest::delete()
        .uri(&base)
        .insert_header(("Authorization", token.clone()))
        .to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, 204);

    let req = test::TestRequest::get()
        .uri(&base)
        .insert_header(("Authorization", token))
        .to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, 404);
}

#[actix_rt::test]
async fn test_runs_are_invisible_to_other_officers() {
    let harness = TestHarness::new();
    harness.data.add_officer(officer("O2", "bob@x.com"));
    let app = create_test_app(&harness).await;

    let id = start_run(&app, &jane()).await;

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/workflows/{}", id))
        .insert_header(("Authorization", bearer("u2", "bob@x.com")))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, 404);
    assert_eq!(body["error"], "NOT_FOUND");
}

#[actix_rt::test]
async fn test_steps_cannot_be_skipped() {
    let harness = TestHarness::new();
    let app = create_test_app(&harness).await;
    let id = start_run(&app, &jane()).await;

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/workflows/{}/evidence/submit", id))
        .insert_header(("Authorization", jane()))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, 409);
    assert_eq!(body["error"], "CONFLICT");

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/workflows/{}/summary", id))
        .insert_header(("Authorization", jane()))
        .to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, 409);
}

#[actix_rt::test]
async fn test_invalid_incident_is_not_submitted() {
    let harness = TestHarness::new();
    let app = create_test_app(&harness).await;
    let id = start_run(&app, &jane()).await;

    let req = test::TestRequest::patch()
        .uri(&format!("/api/v1/workflows/{}/incident", id))
        .insert_header(("Authorization", jane()))
        .set_json(json!({ "title": "Theft", "description": "short" }))
        .to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, 200);

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/workflows/{}/incident/submit", id))
        .insert_header(("Authorization", jane()))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "INVALID_INPUT");
    assert!(harness.data.reports().is_empty());
}

#[actix_rt::test]
async fn test_draft_is_restored_by_next_run() {
    let harness = TestHarness::new();
    let app = create_test_app(&harness).await;
    let first = start_run(&app, &jane()).await;

    let req = test::TestRequest::patch()
        .uri(&format!("/api/v1/workflows/{}/incident", first))
        .insert_header(("Authorization", jane()))
        .set_json(json!({ "title": "Burglary" }))
        .to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, 200);

    let req = test::TestRequest::post()
        .uri("/api/v1/workflows")
        .insert_header(("Authorization", jane()))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, 201);
    assert_eq!(body["incident"]["title"], "Burglary");
}

/// Start a run and submit steps 1 and 2. Returns the run's base path.
async fn run_at_evidence<S>(app: &S, token: &str) -> String
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
        >,
{
    let id = start_run(app, token).await;
    let base = format!("/api/v1/workflows/{}", id);

    let req = test::TestRequest::patch()
        .uri(&format!("{}/incident", base))
        .insert_header(("Authorization", token.to_string()))
        .set_json(json!({ "title": "Theft", "description": "Wallet stolen from car" }))
        .to_request();
    let (status, _) = send(app, req).await;
    assert_eq!(status, 200);

    let req = test::TestRequest::post()
        .uri(&format!("{}/incident/submit", base))
        .insert_header(("Authorization", token.to_string()))
        .to_request();
    let (status, _) = send(app, req).await;
    assert_eq!(status, 201);

    let req = multipart_request(Method::POST, &format!("{}/suspect", base), token, &suspect_parts());
    let (status, body) = send(app, req).await;
    assert_eq!(status, 201);
    assert_eq!(body["stage"], "evidence");

    base
}

#[actix_rt::test]
async fn test_removing_missing_photo_is_not_found() {
    let harness = TestHarness::new();
    let app = create_test_app(&harness).await;
    let token = jane();
    let base = run_at_evidence(&app, &token).await;

    let req = test::TestRequest::delete()
        .uri(&format!("{}/evidence/photos/3", base))
        .insert_header(("Authorization", token.clone()))
        .to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, 404);

    let req = test::TestRequest::post()
        .uri(&format!("{}/evidence/submit", base))
        .insert_header(("Authorization", token))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, 400);
    assert_eq!(
        body["message"],
        "Invalid input: Please add at least one image or audio recording."
    );
}

#[actix_rt::test]
async fn test_evidence_files_must_match_their_type() {
    let harness = TestHarness::new();
    let app = create_test_app(&harness).await;
    let token = jane();
    let base = run_at_evidence(&app, &token).await;

    let notes = Part::File {
        name: "photo",
        filename: "notes.txt",
        content_type: "text/plain",
        bytes: b"not a picture",
    };
    let req = multipart_request(
        Method::POST,
        &format!("{}/evidence/photos", base),
        &token,
        &[photo("photo", "scene.jpg"), notes],
    );
    let (status, body) = send(&app, req).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "INVALID_INPUT");
    assert_eq!(
        body["message"],
        "Invalid input: Photo must be an image (got text/plain)"
    );

    let req = multipart_request(
        Method::PUT,
        &format!("{}/evidence/audio", base),
        &token,
        &[Part::File {
            name: "audio",
            filename: "scene.jpg",
            content_type: "image/jpeg",
            bytes: &[0xFF, 0xD8],
        }],
    );
    let (status, _) = send(&app, req).await;
    assert_eq!(status, 400);

    let req = test::TestRequest::get()
        .uri(&base)
        .insert_header(("Authorization", token.clone()))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, 200);
    assert!(body.get("pending_photos").is_none());
    assert_eq!(body["recorder"], "idle");

    let req = test::TestRequest::post()
        .uri(&format!("{}/evidence/submit", base))
        .insert_header(("Authorization", token))
        .to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, 400);
    assert_eq!(harness.data.evidence().len(), 1);
}

#[actix_rt::test]
async fn test_suspect_photo_must_be_an_image() {
    let harness = TestHarness::new();
    let app = create_test_app(&harness).await;
    let token = jane();
    let id = start_run(&app, &token).await;
    let base = format!("/api/v1/workflows/{}", id);

    let req = test::TestRequest::patch()
        .uri(&format!("{}/incident", base))
        .insert_header(("Authorization", token.clone()))
        .set_json(json!({ "title": "Theft", "description": "Wallet stolen from car" }))
        .to_request();
    send(&app, req).await;
    let req = test::TestRequest::post()
        .uri(&format!("{}/incident/submit", base))
        .insert_header(("Authorization", token.clone()))
        .to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, 201);

    let mut parts = suspect_parts();
    parts.pop();
    parts.push(Part::File {
        name: "photo",
        filename: "suspect.pdf",
        content_type: "application/pdf",
        bytes: b"%PDF",
    });
    let req = multipart_request(Method::POST, &format!("{}/suspect", base), &token, &parts);
    let (status, _) = send(&app, req).await;
    assert_eq!(status, 400);
    assert!(harness.data.suspects().is_empty());
    assert!(harness.objects.keys().is_empty());
}
