use actix_web::http::header::ContentType;
use actix_web::web::{Bytes, Data as AppData};
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use tripmarket_common::logging::{app_log_event, AppLogLevel};

use super::booking::try_creating_booking_repo;
use crate::usecase::{PaymentSettleUcError, PaymentSettleUseCase};
use crate::AppSharedState;

const HEADER_NAME_GATEWAY_SIGNATURE: &str = "stripe-signature";

// response codes signal the gateway whether to redeliver, 5xx means try
// again later, 2xx acknowledges the event even if it was dropped
pub(super) async fn payment_gateway_webhook(
    req: HttpRequest,
    raw_payload: Bytes,
    shr_state: AppData<AppSharedState>,
) -> ActixResult<HttpResponse> {
    let logctx = shr_state.log_context();
    let sig_header = req
        .headers()
        .get(HEADER_NAME_GATEWAY_SIGNATURE)
        .and_then(|v| v.to_str().ok());
    let sig_header = match sig_header {
        Some(v) => v,
        None => {
            app_log_event!(logctx, AppLogLevel::WARNING, "missing-signature-header");
            let resp = HttpResponse::BadRequest()
                .append_header(ContentType::json())
                .body("{}");
            return Ok(resp);
        }
    };

    let repo = try_creating_booking_repo(shr_state.datastore(), logctx.clone()).await?;
    let uc = PaymentSettleUseCase {
        repo,
        processors: shr_state.processor_context(),
        logctx: logctx.clone(),
    };
    let mut status = match uc.execute(raw_payload.as_ref(), sig_header).await {
        Ok(()) => HttpResponse::Ok(),
        Err(uce) => match uce {
            PaymentSettleUcError::InvalidSignature(d) => {
                app_log_event!(logctx, AppLogLevel::WARNING, "invalid-signature, {d}");
                HttpResponse::BadRequest()
            }
            PaymentSettleUcError::MalformedPayload(d) => {
                app_log_event!(logctx, AppLogLevel::WARNING, "malformed-payload, {d}");
                HttpResponse::BadRequest()
            }
            PaymentSettleUcError::EventUnsupported(t) => {
                app_log_event!(logctx, AppLogLevel::INFO, "event-unsupported, {t}");
                HttpResponse::Ok()
            }
            PaymentSettleUcError::BookingNotFound(_intent) => {
                // already logged in the use case, redelivery cannot fix it
                HttpResponse::Ok()
            }
            PaymentSettleUcError::CorruptedBooking(d) => {
                app_log_event!(logctx, AppLogLevel::ERROR, "corrupted-booking, {d}");
                HttpResponse::Ok()
            }
            PaymentSettleUcError::ReconciliationFailed(e) => {
                app_log_event!(logctx, AppLogLevel::ERROR, "{:?}", e);
                HttpResponse::ServiceUnavailable()
            }
            PaymentSettleUcError::ExternalProcessorError(e) => {
                app_log_event!(logctx, AppLogLevel::ERROR, "{:?}", e);
                HttpResponse::InternalServerError()
            }
        },
    };
    let resp = status.append_header(ContentType::json()).body("{}");
    Ok(resp)
} // end of fn payment_gateway_webhook
