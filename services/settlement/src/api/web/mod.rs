mod booking;
pub mod dto;
mod payment;
mod payout;
mod reporting;
mod webhook;

use actix_http::Method;
use actix_web::body::BoxBody;
use actix_web::error::ResponseError;
use actix_web::http::header::ContentType;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, Route};
use std::collections::HashMap;

use booking::{cancel_booking, create_booking, read_booking_status};
use payment::create_payment_intent;
use payout::run_payout;
use reporting::{report_commissions, report_payouts};
use webhook::payment_gateway_webhook;

pub struct AppRouteTable {
    pub version: String,
    pub entries: HashMap<String, Route>,
} // note, figure out how do multiple versions of API endpoints co-exist

impl AppRouteTable {
    pub fn get(ver_req: &str) -> Self {
        let (version, entries) = match ver_req {
            "1.2.0" => (format!("v{ver_req}"), Self::v1_2_0_entries()),
            _others => (String::new(), HashMap::new()),
        };
        Self { version, entries }
    }
    fn v1_2_0_entries() -> HashMap<String, Route> {
        let data = [
            (
                "create_booking".to_string(),
                Route::new().method(Method::POST).to(create_booking),
            ),
            (
                "cancel_booking".to_string(),
                Route::new().method(Method::PATCH).to(cancel_booking),
            ),
            (
                "read_booking_status".to_string(),
                Route::new().method(Method::GET).to(read_booking_status),
            ),
            (
                "create_payment_intent".to_string(),
                Route::new().method(Method::POST).to(create_payment_intent),
            ),
            (
                "payment_gateway_webhook".to_string(),
                Route::new().method(Method::POST).to(payment_gateway_webhook),
            ),
            (
                "run_payout".to_string(),
                Route::new().method(Method::POST).to(run_payout),
            ),
            (
                "report_commissions".to_string(),
                Route::new().method(Method::GET).to(report_commissions),
            ),
            (
                "report_payouts".to_string(),
                Route::new().method(Method::GET).to(report_payouts),
            ),
        ];
        HashMap::from(data)
    }
} // end of impl AppRouteTable

#[derive(Debug)]
struct RepoInitFailure;

impl std::fmt::Display for RepoInitFailure {
    fn fmt(&self, _f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Ok(())
    }
}
impl ResponseError for RepoInitFailure {
    fn status_code(&self) -> StatusCode {
        StatusCode::SERVICE_UNAVAILABLE
    }
    fn error_response(&self) -> HttpResponse<BoxBody> {
        HttpResponse::ServiceUnavailable()
            .append_header(ContentType::plaintext())
            .body("")
    }
}
