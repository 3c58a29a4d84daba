//! Bearer token checks on protected endpoints.

use actix_web::test;
use precinct_desk_lib::auth::SessionVerifier;
use precinct_desk_lib::config::SessionSettings;
use precinct_desk_lib::test_support::TestHarness;
use secrecy::SecretString;

use super::helpers::*;

#[actix_rt::test]
async fn test_missing_token_is_rejected() {
    let harness = TestHarness::new();
    let app = create_test_app(&harness).await;

    let req = test::TestRequest::post().uri("/api/v1/workflows").to_request();
    let (status, body) = send(&app, req).await;

    assert_eq!(status, 401);
    assert_eq!(body["error"], "UNAUTHORIZED");
}

#[actix_rt::test]
async fn test_token_signed_with_other_secret_is_rejected() {
    let harness = TestHarness::new();
    let app = create_test_app(&harness).await;

    let foreign = SessionVerifier::new(&SessionSettings {
        secret: SecretString::from("someone-else".to_string()),
        audience: "authenticated".to_string(),
    })
    .issue("u1", Some("jane@x.com"), 3600)
    .unwrap();

    let req = test::TestRequest::get()
        .uri("/api/v1/dashboard")
        .insert_header(("Authorization", format!("Bearer {}", foreign)))
        .to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, 401);
}

#[actix_rt::test]
async fn test_session_without_officer_profile_cannot_list_reports() {
    let harness = TestHarness::new();
    let app = create_test_app(&harness).await;

    let req = test::TestRequest::get()
        .uri("/api/v1/reports")
        .insert_header(("Authorization", bearer("u7", "nobody@x.com")))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, 401);
    assert_eq!(body["error"], "UNAUTHORIZED");
}
