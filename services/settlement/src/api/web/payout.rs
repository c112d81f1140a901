use std::boxed::Box;
use std::sync::Arc;

use actix_web::error::Error as ActixError;
use actix_web::http::header::ContentType;
use actix_web::web::{Data as AppData, Json as ExtJson};
use actix_web::{HttpResponse, Result as ActixResult};

use tripmarket_common::logging::{app_log_event, AppLogContext, AppLogLevel};

use super::dto::PayoutReqDto;
use super::RepoInitFailure;
use crate::adapter::datastore::AppDataStoreContext;
use crate::adapter::repository::{
    app_repo_payee, app_repo_payout, AbstractPayeeRepo, AbstractPayoutRepo,
};
use crate::identity::AppActorIdentity;
use crate::usecase::{PayoutRunUcError, PayoutRunUseCase};
use crate::AppSharedState;

async fn try_creating_payout_repo(
    dstore: Arc<AppDataStoreContext>,
    logctx: Arc<AppLogContext>,
) -> ActixResult<Box<dyn AbstractPayoutRepo>> {
    app_repo_payout(dstore).await.map_err(|e_repo| {
        app_log_event!(logctx, AppLogLevel::ERROR, "repo-init-error {:?}", e_repo);
        ActixError::from(RepoInitFailure)
    })
}

async fn try_creating_payee_repo(
    dstore: Arc<AppDataStoreContext>,
    logctx: Arc<AppLogContext>,
) -> ActixResult<Box<dyn AbstractPayeeRepo>> {
    app_repo_payee(dstore).await.map_err(|e_repo| {
        app_log_event!(logctx, AppLogLevel::ERROR, "repo-init-error {:?}", e_repo);
        ActixError::from(RepoInitFailure)
    })
}

pub(super) async fn run_payout(
    ExtJson(req_body): ExtJson<PayoutReqDto>,
    identity: AppActorIdentity,
    shr_state: AppData<AppSharedState>,
) -> ActixResult<HttpResponse> {
    let owner_id = req_body.owner_id;
    let logctx = shr_state.log_context();
    app_log_event!(logctx, AppLogLevel::DEBUG, "owner:{owner_id}");

    let dstore = shr_state.datastore();
    let repo_po = try_creating_payout_repo(dstore.clone(), logctx.clone()).await?;
    let repo_pe = try_creating_payee_repo(dstore, logctx.clone()).await?;
    let uc = PayoutRunUseCase {
        identity,
        processors: shr_state.processor_context(),
        repo_po,
        repo_pe,
        logctx: logctx.clone(),
    };
    let resp = match uc.execute(owner_id).await {
        Ok(v) => {
            let body_serial = serde_json::to_vec(&v).unwrap();
            HttpResponse::Ok()
                .append_header(ContentType::json())
                .body(body_serial)
        }
        Err(uce) => match uce {
            PayoutRunUcError::PermissionDenied(usr_id) => {
                app_log_event!(logctx, AppLogLevel::INFO, "{usr_id}");
                HttpResponse::Forbidden().finish()
            }
            PayoutRunUcError::NothingToPayout(o) => {
                app_log_event!(logctx, AppLogLevel::DEBUG, "nothing-to-payout, owner:{o}");
                HttpResponse::NoContent().finish()
            }
            PayoutRunUcError::PayeeNotReady(o) => {
                app_log_event!(logctx, AppLogLevel::INFO, "payee-not-ready, owner:{o}");
                HttpResponse::Conflict().finish()
            }
            PayoutRunUcError::PayoutLockRace => {
                app_log_event!(logctx, AppLogLevel::WARNING, "payout-lock-race");
                HttpResponse::TooManyRequests().finish()
            }
            PayoutRunUcError::CorruptedCommission(e) => {
                app_log_event!(logctx, AppLogLevel::ERROR, "{:?}", e);
                HttpResponse::InternalServerError().finish()
            }
            PayoutRunUcError::DataStoreError(e) => {
                app_log_event!(logctx, AppLogLevel::ERROR, "{:?}", e);
                HttpResponse::InternalServerError().finish()
            }
        },
    }; // end of use-case execution
    Ok(resp)
} // end of fn run_payout
