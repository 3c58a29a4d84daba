//! Health and readiness endpoints.

use actix_web::test;
use precinct_desk_lib::test_support::TestHarness;

use super::helpers::*;

#[actix_rt::test]
async fn test_health_needs_no_token() {
    let harness = TestHarness::new();
    let app = create_test_app(&harness).await;

    let (status, body) = send(&app, test::TestRequest::get().uri("/api/v1/health").to_request()).await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "healthy");
}

#[actix_rt::test]
async fn test_ready_reports_database_state() {
    let harness = TestHarness::new();
    let app = create_test_app(&harness).await;

    let (status, body) = send(&app, test::TestRequest::get().uri("/api/v1/ready").to_request()).await;
    assert_eq!(status, 200);
    assert_eq!(body["database"], "connected");

    harness.data.fail_next("ping");
    let (status, body) = send(&app, test::TestRequest::get().uri("/api/v1/ready").to_request()).await;
    assert_eq!(status, 503);
    assert_eq!(body["error"], "NOT_READY");
}
