use actix_web::http::header::ContentType;
use actix_web::web::{Data as AppData, Path as ExtPath};
use actix_web::{HttpResponse, Result as ActixResult};

use tripmarket_common::logging::{app_log_event, AppLogLevel};

use super::booking::try_creating_booking_repo;
use crate::identity::AppActorIdentity;
use crate::usecase::{PaymentIntentUcError, PaymentIntentUseCase};
use crate::AppSharedState;

pub(super) async fn create_payment_intent(
    path_segms: ExtPath<(String,)>,
    identity: AppActorIdentity,
    shr_state: AppData<AppSharedState>,
) -> ActixResult<HttpResponse> {
    let booking_id = path_segms.into_inner().0;
    let logctx = shr_state.log_context();
    app_log_event!(
        logctx,
        AppLogLevel::DEBUG,
        "booking:{booking_id}, usr:{}",
        identity.profile
    );

    let repo = try_creating_booking_repo(shr_state.datastore(), logctx.clone()).await?;
    let uc = PaymentIntentUseCase {
        repo,
        processors: shr_state.processor_context(),
        bksync_lockset: shr_state.booking_lockset(),
    };
    let resp = match uc.execute(identity.profile, booking_id).await {
        Ok(v) => {
            let body_serial = serde_json::to_vec(&v).unwrap();
            HttpResponse::Ok()
                .append_header(ContentType::json())
                .body(body_serial)
        }
        Err(uce) => match uce {
            PaymentIntentUcError::BookingNotFound => HttpResponse::NotFound().finish(),
            PaymentIntentUcError::OwnerMismatch => {
                app_log_event!(logctx, AppLogLevel::INFO, "{}", identity.profile);
                HttpResponse::Forbidden().finish()
            }
            PaymentIntentUcError::AlreadyFinalized(s) => {
                app_log_event!(logctx, AppLogLevel::INFO, "already-finalized:{:?}", s);
                HttpResponse::Conflict().finish()
            }
            PaymentIntentUcError::CreateIntentConflict => {
                HttpResponse::TooManyRequests().finish()
            }
            PaymentIntentUcError::IntentConflict(d) => {
                app_log_event!(logctx, AppLogLevel::WARNING, "intent-conflict, {d}");
                HttpResponse::Conflict().finish()
            }
            PaymentIntentUcError::GatewayUnavailable(e) => {
                app_log_event!(logctx, AppLogLevel::ERROR, "{:?}", e);
                HttpResponse::ServiceUnavailable().finish()
            }
            PaymentIntentUcError::LockCacheError => {
                app_log_event!(logctx, AppLogLevel::ERROR, "lock-cache-error");
                HttpResponse::InternalServerError().finish()
            }
            PaymentIntentUcError::ExternalProcessorError(e) => {
                app_log_event!(logctx, AppLogLevel::ERROR, "{:?}", e);
                HttpResponse::InternalServerError().finish()
            }
            PaymentIntentUcError::DataStoreError(e) => {
                app_log_event!(logctx, AppLogLevel::ERROR, "{:?}", e);
                HttpResponse::InternalServerError().finish()
            }
        },
    }; // end of use-case execution
    Ok(resp)
} // end of fn create_payment_intent
