mod common;

use std::fs::File;

use actix_web::http::header::ContentType;
use actix_web::test::{call_service, TestRequest};
use serde_json::Value as JsnVal;

use common::itest_setup_app_server;

const CASE_FILE_BOOKING_OK: &str = "./tests/integration/examples/booking_req_hotel.json";
const CASE_FILE_BOOKING_BAD_KIND: &str = "./tests/integration/examples/booking_req_bad_kind.json";

fn itest_load_case_file(path: &str) -> JsnVal {
    let rdr = File::open(path).unwrap();
    serde_json::from_reader::<File, JsnVal>(rdr).unwrap()
}

#[actix_web::test]
async fn webhook_missing_signature_header() {
    let mock_app = itest_setup_app_server().await;
    let req = TestRequest::post()
        .uri("/v1.2.0/webhook/stripe")
        .append_header(ContentType::json())
        .set_payload("{}")
        .to_request();
    let resp = call_service(&mock_app, req).await;
    assert_eq!(resp.status().as_u16(), 400);
}

#[actix_web::test]
async fn webhook_malformed_signature_header() {
    let mock_app = itest_setup_app_server().await;
    let req = TestRequest::post()
        .uri("/v1.2.0/webhook/stripe")
        .append_header(ContentType::json())
        .append_header(("stripe-signature", "not-a-signature-scheme"))
        .set_payload(r#"{"type":"payment_intent.succeeded"}"#)
        .to_request();
    let resp = call_service(&mock_app, req).await;
    assert_eq!(resp.status().as_u16(), 400);
}

#[actix_web::test]
async fn booking_create_requires_identity() {
    let mock_app = itest_setup_app_server().await;
    let req_body = itest_load_case_file(CASE_FILE_BOOKING_OK);
    // the gateway identity headers are absent
    let req = TestRequest::post()
        .uri("/v1.2.0/booking")
        .append_header(ContentType::json())
        .set_json(req_body)
        .to_request();
    let resp = call_service(&mock_app, req).await;
    assert_eq!(resp.status().as_u16(), 401);
}

#[actix_web::test]
async fn booking_create_reject_unknown_kind() {
    let mock_app = itest_setup_app_server().await;
    let req_body = itest_load_case_file(CASE_FILE_BOOKING_BAD_KIND);
    let req = TestRequest::post()
        .uri("/v1.2.0/booking")
        .append_header(ContentType::json())
        .append_header(("x-actor-profile", "1905"))
        .append_header(("x-actor-role", "user"))
        .set_json(req_body)
        .to_request();
    let resp = call_service(&mock_app, req).await;
    assert_eq!(resp.status().as_u16(), 400);
}

#[actix_web::test]
async fn booking_status_requires_identity() {
    let mock_app = itest_setup_app_server().await;
    let req = TestRequest::get()
        .uri("/v1.2.0/booking/1b0ca5a0aa11/status")
        .to_request();
    let resp = call_service(&mock_app, req).await;
    assert_eq!(resp.status().as_u16(), 401);
}

#[actix_web::test]
async fn payout_run_forbidden_for_user() {
    let mock_app = itest_setup_app_server().await;
    let req = TestRequest::post()
        .uri("/v1.2.0/payout")
        .append_header(ContentType::json())
        .append_header(("x-actor-profile", "920"))
        .append_header(("x-actor-role", "user"))
        .set_json(serde_json::json!({"owner_id": 920}))
        .to_request();
    let resp = call_service(&mock_app, req).await;
    assert_eq!(resp.status().as_u16(), 403);
}

#[actix_web::test]
async fn report_commissions_owner_mismatch() {
    let mock_app = itest_setup_app_server().await;
    let uri = "/v1.2.0/report/commissions?owner_id=921\
        &start_after=2026-07-01T00%3A00%3A00Z&end_before=2026-08-01T00%3A00%3A00Z";
    let req = TestRequest::get()
        .uri(uri)
        .append_header(("x-actor-profile", "920"))
        .append_header(("x-actor-role", "user"))
        .to_request();
    let resp = call_service(&mock_app, req).await;
    assert_eq!(resp.status().as_u16(), 403);
}

#[actix_web::test]
async fn route_version_not_found() {
    let mock_app = itest_setup_app_server().await;
    let req = TestRequest::get()
        .uri("/v0.9.0/booking/1b0ca5a0aa11/status")
        .to_request();
    let resp = call_service(&mock_app, req).await;
    assert_eq!(resp.status().as_u16(), 404);
}
