use std::boxed::Box;
use std::sync::Arc;

use actix_web::error::Error as ActixError;
use actix_web::http::header::{ContentType, CONTENT_TYPE};
use actix_web::http::StatusCode;
use actix_web::web::{Data as AppData, Query as ExtQuery};
use actix_web::{HttpResponse, HttpResponseBuilder, Result as ActixResult};

use serde::Serialize;
use tripmarket_common::logging::{app_log_event, AppLogContext, AppLogLevel};

use super::dto::ReportQueryDto;
use super::RepoInitFailure;
use crate::adapter::datastore::AppDataStoreContext;
use crate::adapter::repository::{app_repo_reporting, AbstractReportingRepo};
use crate::identity::AppActorIdentity;
use crate::usecase::{SettlementReportUcError, SettlementReportUseCase};
use crate::AppSharedState;

async fn try_creating_reporting_repo(
    dstore: Arc<AppDataStoreContext>,
    logctx: Arc<AppLogContext>,
) -> ActixResult<Box<dyn AbstractReportingRepo>> {
    app_repo_reporting(dstore).await.map_err(|e_repo| {
        app_log_event!(logctx, AppLogLevel::ERROR, "repo-init-error {:?}", e_repo);
        ActixError::from(RepoInitFailure)
    })
}

fn report_result_to_httpresp<D: Serialize>(
    logctx: Arc<AppLogContext>,
    result: Result<D, SettlementReportUcError>,
) -> HttpResponse {
    let (http_status, body_raw) = match result {
        Ok(v) => {
            let body_raw = serde_json::to_vec(&v).unwrap();
            (StatusCode::OK, body_raw)
        }
        Err(SettlementReportUcError::PermissionDenied(usr_id)) => {
            app_log_event!(logctx, AppLogLevel::INFO, "{usr_id}");
            (StatusCode::FORBIDDEN, b"{}".to_vec())
        }
        Err(SettlementReportUcError::DataStore(e)) => {
            app_log_event!(logctx, AppLogLevel::ERROR, "{:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, b"{}".to_vec())
        }
    };
    let mut r = HttpResponseBuilder::new(http_status);
    let header = (CONTENT_TYPE, ContentType::json());
    r.append_header(header);
    r.body(body_raw)
}

pub(super) async fn report_commissions(
    query_m: ExtQuery<ReportQueryDto>,
    identity: AppActorIdentity,
    shr_state: AppData<AppSharedState>,
) -> ActixResult<HttpResponse> {
    let logctx = shr_state.log_context();
    app_log_event!(logctx, AppLogLevel::DEBUG, "{:?}", &query_m);

    let repo_rpt = try_creating_reporting_repo(shr_state.datastore(), logctx.clone()).await?;
    let uc = SettlementReportUseCase::new(identity, repo_rpt);
    let (owner_q, t_range) = query_m.into_inner().into_parts();
    let result = uc.commissions(owner_q, t_range).await;
    Ok(report_result_to_httpresp(logctx, result))
} // end of fn report_commissions

pub(super) async fn report_payouts(
    query_m: ExtQuery<ReportQueryDto>,
    identity: AppActorIdentity,
    shr_state: AppData<AppSharedState>,
) -> ActixResult<HttpResponse> {
    let logctx = shr_state.log_context();
    app_log_event!(logctx, AppLogLevel::DEBUG, "{:?}", &query_m);

    let repo_rpt = try_creating_reporting_repo(shr_state.datastore(), logctx.clone()).await?;
    let uc = SettlementReportUseCase::new(identity, repo_rpt);
    let (owner_q, t_range) = query_m.into_inner().into_parts();
    let result = uc.payouts(owner_q, t_range).await;
    Ok(report_result_to_httpresp(logctx, result))
} // end of fn report_payouts
