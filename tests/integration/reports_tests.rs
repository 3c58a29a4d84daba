//! Report review and dashboard endpoints.

use actix_web::test;
use precinct_desk_lib::models::EvidenceType;
use precinct_desk_lib::test_support::{TestHarness, officer};

use super::helpers::*;

#[actix_rt::test]
async fn test_pending_report_can_be_completed_twice() {
    let harness = TestHarness::new();
    let app = create_test_app(&harness).await;
    let report = harness.seed_report("O1", "Theft");

    let req = test::TestRequest::get()
        .uri("/api/v1/reports")
        .insert_header(("Authorization", jane()))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "pending");
    assert_eq!(body["reports"].as_array().unwrap().len(), 1);

    for _ in 0..2 {
        let req = test::TestRequest::post()
            .uri(&format!("/api/v1/reports/{}/complete", report.id))
            .insert_header(("Authorization", jane()))
            .to_request();
        let (status, body) = send(&app, req).await;
        assert_eq!(status, 200);
        assert_eq!(body["status"], "completed");
    }

    let req = test::TestRequest::get()
        .uri("/api/v1/reports?status=completed")
        .insert_header(("Authorization", jane()))
        .to_request();
    let (_, body) = send(&app, req).await;
    assert_eq!(body["reports"][0]["id"], report.id.to_string());

    let req = test::TestRequest::get()
        .uri("/api/v1/reports")
        .insert_header(("Authorization", jane()))
        .to_request();
    let (_, body) = send(&app, req).await;
    assert!(body["reports"].as_array().unwrap().is_empty());
}

#[actix_rt::test]
async fn test_other_officers_report_is_not_found() {
    let harness = TestHarness::new();
    harness.data.add_officer(officer("O2", "bob@x.com"));
    let app = create_test_app(&harness).await;
    let report = harness.seed_report("O1", "Theft");

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/reports/{}/complete", report.id))
        .insert_header(("Authorization", bearer("u2", "bob@x.com")))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, 404);
    assert_eq!(body["error"], "NOT_FOUND");
    assert_eq!(harness.data.reports()[0].status.to_string(), "pending");

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/reports/{}", report.id))
        .insert_header(("Authorization", bearer("u2", "bob@x.com")))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, 404);
    assert_eq!(body["error"], "NOT_FOUND");
}

#[actix_rt::test]
async fn test_report_detail_lists_suspects_and_evidence() {
    let harness = TestHarness::new();
    let app = create_test_app(&harness).await;
    let (suspect, _) = harness.seed_suspect("O1");
    harness.seed_evidence(&suspect, EvidenceType::Audio);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/reports/{}", suspect.report_id))
        .insert_header(("Authorization", jane()))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, 200);
    assert_eq!(body["suspects"][0]["name"], "Suspect A");
    assert_eq!(body["evidence"].as_array().unwrap().len(), 2);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/reports/{}", uuid::Uuid::new_v4()))
        .insert_header(("Authorization", jane()))
        .to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, 404);
}

#[actix_rt::test]
async fn test_dashboard_shows_pending_reports_and_activity() {
    let harness = TestHarness::new();
    let app = create_test_app(&harness).await;
    harness.seed_report("O1", "Theft");
    harness.seed_report("O1", "Burglary");

    let req = test::TestRequest::get()
        .uri("/api/v1/dashboard")
        .insert_header(("Authorization", jane()))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, 200);
    assert_eq!(body["pending_reports"].as_array().unwrap().len(), 2);
    assert_eq!(body["pending_reports"][0]["title"], "Burglary");
    assert_eq!(body["activity"]["reported_by_month"][0]["count"], 2);
    assert!(
        body["activity"]["completed_by_incident_month"]
            .as_array()
            .unwrap()
            .is_empty()
    );
}
