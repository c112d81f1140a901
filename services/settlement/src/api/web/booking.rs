use std::boxed::Box;
use std::sync::Arc;

use actix_web::error::Error as ActixError;
use actix_web::http::header::ContentType;
use actix_web::web::{Data as AppData, Json as ExtJson, Path as ExtPath};
use actix_web::{HttpResponse, Result as ActixResult};

use tripmarket_common::logging::{app_log_event, AppLogContext, AppLogLevel};

use super::dto::{BookingItemErrorReason, BookingReqDto, BookingRespErrorDto};
use super::RepoInitFailure;
use crate::adapter::datastore::AppDataStoreContext;
use crate::adapter::repository::{app_repo_booking, AbstractBookingRepo};
use crate::identity::AppActorIdentity;
use crate::usecase::{
    BookingCancelUcError, BookingCancelUseCase, BookingCreateUcError, BookingCreateUseCase,
    BookingStatusReadUcError, BookingStatusReadUseCase,
};
use crate::AppSharedState;

pub(super) async fn try_creating_booking_repo(
    dstore: Arc<AppDataStoreContext>,
    logctx: Arc<AppLogContext>,
) -> ActixResult<Box<dyn AbstractBookingRepo>> {
    app_repo_booking(dstore).await.map_err(|e_repo| {
        app_log_event!(logctx, AppLogLevel::ERROR, "repo-init-error {:?}", e_repo);
        ActixError::from(RepoInitFailure)
    })
}

fn item_error_response(reason: BookingItemErrorReason) -> Vec<u8> {
    let detail = BookingRespErrorDto {
        item: Some(reason),
        period: None,
        amount: None,
    };
    serde_json::to_vec(&detail).unwrap()
}

pub(super) async fn create_booking(
    req_body: ExtJson<BookingReqDto>,
    identity: AppActorIdentity,
    shr_state: AppData<AppSharedState>,
) -> ActixResult<HttpResponse> {
    let logctx = shr_state.log_context();
    app_log_event!(logctx, AppLogLevel::DEBUG, "usr:{}", identity.profile);

    let repo = try_creating_booking_repo(shr_state.datastore(), logctx.clone()).await?;
    let uc = BookingCreateUseCase {
        repo,
        rpc_ctx: shr_state.rpc_context(),
    };
    let req_body = req_body.into_inner();
    let resp = match uc.execute(identity.profile, req_body).await {
        Ok(v) => {
            let body_serial = serde_json::to_vec(&v).unwrap();
            HttpResponse::Created()
                .append_header(ContentType::json())
                .body(body_serial)
        }
        Err(uce) => match uce {
            BookingCreateUcError::ClientBadRequest(e) => {
                let body = serde_json::to_vec(&e).unwrap();
                HttpResponse::BadRequest()
                    .append_header(ContentType::json())
                    .body(body)
            }
            BookingCreateUcError::ItemNotFound => HttpResponse::NotFound()
                .append_header(ContentType::json())
                .body(item_error_response(BookingItemErrorReason::NotFound)),
            BookingCreateUcError::ItemUnavailable => HttpResponse::Conflict()
                .append_header(ContentType::json())
                .body(item_error_response(BookingItemErrorReason::Unavailable)),
            BookingCreateUcError::LoadItemInternalError(_) => {
                app_log_event!(logctx, AppLogLevel::ERROR, "item-rpc-failure");
                HttpResponse::ServiceUnavailable().finish()
            }
            BookingCreateUcError::ItemReplicaMismatch => {
                app_log_event!(logctx, AppLogLevel::ERROR, "item-replica-mismatch");
                HttpResponse::InternalServerError().finish()
            }
            BookingCreateUcError::ItemReplicaCorruption(d) => {
                app_log_event!(logctx, AppLogLevel::ERROR, "item-replica-corruption, {d}");
                HttpResponse::InternalServerError().finish()
            }
            BookingCreateUcError::DataStoreError(e) => {
                app_log_event!(logctx, AppLogLevel::ERROR, "{:?}", e);
                HttpResponse::InternalServerError().finish()
            }
        }, // analyze error type, give different error response
    }; // end of use-case execution
    Ok(resp)
} // end of fn create_booking

pub(super) async fn cancel_booking(
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
    let uc = BookingCancelUseCase { repo };
    let resp = match uc.execute(identity, booking_id).await {
        Ok(v) => {
            let body_serial = serde_json::to_vec(&v).unwrap();
            HttpResponse::Ok()
                .append_header(ContentType::json())
                .body(body_serial)
        }
        Err(uce) => match uce {
            BookingCancelUcError::BookingNotFound => HttpResponse::NotFound().finish(),
            BookingCancelUcError::PermissionDenied(usr_id) => {
                app_log_event!(logctx, AppLogLevel::INFO, "{usr_id}");
                HttpResponse::Forbidden().finish()
            }
            BookingCancelUcError::NotCancellable(s) => {
                app_log_event!(logctx, AppLogLevel::INFO, "not-cancellable:{:?}", s);
                HttpResponse::Conflict().finish()
            }
            BookingCancelUcError::CancelConflict => {
                app_log_event!(logctx, AppLogLevel::WARNING, "cancel-conflict");
                HttpResponse::Conflict().finish()
            }
            BookingCancelUcError::DataStoreError(e) => {
                app_log_event!(logctx, AppLogLevel::ERROR, "{:?}", e);
                HttpResponse::InternalServerError().finish()
            }
        },
    };
    Ok(resp)
} // end of fn cancel_booking

pub(super) async fn read_booking_status(
    path_segms: ExtPath<(String,)>,
    shr_state: AppData<AppSharedState>,
) -> ActixResult<HttpResponse> {
    let booking_id = path_segms.into_inner().0;
    let logctx = shr_state.log_context();

    let repo = try_creating_booking_repo(shr_state.datastore(), logctx.clone()).await?;
    let uc = BookingStatusReadUseCase { repo };
    let resp = match uc.execute(booking_id).await {
        Ok(v) => {
            let body_serial = serde_json::to_vec(&v).unwrap();
            HttpResponse::Ok()
                .append_header(ContentType::json())
                .body(body_serial)
        }
        Err(uce) => match uce {
            BookingStatusReadUcError::BookingNotFound => HttpResponse::NotFound().finish(),
            BookingStatusReadUcError::DataStoreError(e) => {
                app_log_event!(logctx, AppLogLevel::ERROR, "{:?}", e);
                HttpResponse::InternalServerError().finish()
            }
        },
    };
    Ok(resp)
} // end of fn read_booking_status
