//! Officer profile endpoints.

use actix_web::http::Method;
use actix_web::test;
use precinct_desk_lib::test_support::TestHarness;
use serde_json::json;

use super::helpers::*;

fn profile_parts(badge: &'static str) -> Vec<Part<'static>> {
    vec![
        Part::Text("name", "Eve Stone"),
        Part::Text("badge_number", badge),
        Part::Text("rank", "Constable"),
        Part::Text("contact", "0987654321"),
        photo("picture", "me.jpg"),
    ]
}

#[actix_rt::test]
async fn test_profile_completion_and_updates() {
    let harness = TestHarness::new();
    let app = create_test_app(&harness).await;
    let eve = bearer("u9", "eve@x.com");

    let req = multipart_request(Method::POST, "/api/v1/officers", &eve, &profile_parts("5150"));
    let (status, body) = send(&app, req).await;
    assert_eq!(status, 201);
    assert_eq!(body["id"], "u9");
    assert_eq!(body["email"], "eve@x.com");
    assert!(
        body["profile_picture"]
            .as_str()
            .unwrap()
            .starts_with("https://storage.test/profile-images/officers/u9_")
    );

    let req = multipart_request(Method::POST, "/api/v1/officers", &eve, &profile_parts("5151"));
    let (status, body) = send(&app, req).await;
    assert_eq!(status, 409);
    assert_eq!(body["error"], "CONFLICT");

    let req = test::TestRequest::get()
        .uri("/api/v1/officers/me")
        .insert_header(("Authorization", eve.clone()))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, 200);
    assert_eq!(body["badge_number"], 5150);

    let req = test::TestRequest::patch()
        .uri("/api/v1/officers/me/contact")
        .insert_header(("Authorization", eve.clone()))
        .set_json(json!({ "contact": "12345" }))
        .to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, 400);

    let req = test::TestRequest::patch()
        .uri("/api/v1/officers/me/contact")
        .insert_header(("Authorization", eve.clone()))
        .set_json(json!({ "contact": "1112223333" }))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, 200);
    assert_eq!(body["contact"], "1112223333");

    let req = multipart_request(
        Method::PUT,
        "/api/v1/officers/me/picture",
        &eve,
        &[photo("picture", "new.jpg")],
    );
    let (status, _) = send(&app, req).await;
    assert_eq!(status, 200);
    assert_eq!(harness.objects.keys().len(), 2);
}

#[actix_rt::test]
async fn test_invalid_badge_is_rejected() {
    let harness = TestHarness::new();
    let app = create_test_app(&harness).await;

    let req = multipart_request(
        Method::POST,
        "/api/v1/officers",
        &bearer("u9", "eve@x.com"),
        &profile_parts("badge"),
    );
    let (status, body) = send(&app, req).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "INVALID_INPUT");
    assert!(harness.objects.keys().is_empty());
}

#[actix_rt::test]
async fn test_non_image_picture_is_rejected() {
    let harness = TestHarness::new();
    let app = create_test_app(&harness).await;

    let req = multipart_request(
        Method::PUT,
        "/api/v1/officers/me/picture",
        &jane(),
        &[Part::File {
            name: "picture",
            filename: "notes.txt",
            content_type: "text/plain",
            bytes: b"hello",
        }],
    );
    let (status, _) = send(&app, req).await;
    assert_eq!(status, 400);
}
