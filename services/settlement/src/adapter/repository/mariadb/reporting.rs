use std::result::Result;
use std::sync::Arc;

use async_trait::async_trait;
use mysql_async::prelude::{Query, WithParams};
use mysql_async::{Conn, Params, Value as MySqlVal};
use rust_decimal::Decimal;

use tripmarket_common::adapter::repository::RecordIdBytes;
use tripmarket_common::api::dto::CurrencyDto;
use tripmarket_common::error::AppErrorCode;
use tripmarket_common::logging::{app_log_event, AppLogLevel};

use crate::adapter::datastore::{AppDStoreMariaDB, AppDataStoreContext};
use crate::api::web::dto::ReportTimeRangeDto;
use crate::hard_limit;
use crate::model::{CommissionModel, PayoutModel, PayoutStatus};

use super::super::{AbstractReportingRepo, AppRepoError, AppRepoErrorDetail, AppRepoErrorFnLabel};
use super::payout::CommissionRowType;
use super::{inner_into_parts, raw_column_to_datetime, DATETIME_FMT_P0F};

struct FetchCommissionReportArgs(String, Params);
struct FetchPayoutReportArgs(String, Params);

#[rustfmt::skip]
type CommissionReportRowType = (
    Vec<u8>,          // `id`
    Vec<u8>,          // `booking_id`
    u32,              // `owner_id`
    Decimal, Decimal, // `amount` , `rate`
    String, String,   // `currency` , `status`
    Option<Vec<u8>>,  // `payout_id`
    Option<String>,   // `transfer_ref`
    Option<MySqlVal>, // `processed_time`
    MySqlVal,         // `create_time`
);

#[rustfmt::skip]
type PayoutReportRowType = (
    Vec<u8>,          // `id`
    u32,              // `owner_id`
    Decimal,          // `amount`
    String, String,   // `currency` , `status`
    Option<String>,   // `transfer_ref`
    Option<MySqlVal>, // `processed_time`
    Option<String>,   // `failure_reason`
    MySqlVal,         // `create_time`
);

fn time_range_params(t_range: &ReportTimeRangeDto) -> Vec<MySqlVal> {
    vec![
        t_range
            .start_after
            .format(DATETIME_FMT_P0F)
            .to_string()
            .into(),
        t_range
            .end_before
            .format(DATETIME_FMT_P0F)
            .to_string()
            .into(),
    ]
}

impl<'a> From<(Option<u32>, &'a ReportTimeRangeDto)> for FetchCommissionReportArgs {
    fn from(value: (Option<u32>, &'a ReportTimeRangeDto)) -> Self {
        let (maybe_owner, t_range) = value;
        let mut stmt = "SELECT `id`,`booking_id`,`owner_id`,`amount`,`rate`,`currency`,\
                        `status`,`payout_id`,`transfer_ref`,`processed_time`,`create_time` \
                        FROM `commission` WHERE `create_time` >= ? AND `create_time` <= ?"
            .to_string();
        let mut args = time_range_params(t_range);
        if let Some(owner_id) = maybe_owner {
            stmt += " AND `owner_id`=?";
            args.push(owner_id.into());
        }
        stmt += format!(" LIMIT {}", hard_limit::MAX_NUM_REPORT_ROWS).as_str();
        Self(stmt, Params::Positional(args))
    }
}

impl<'a> From<(Option<u32>, &'a ReportTimeRangeDto)> for FetchPayoutReportArgs {
    fn from(value: (Option<u32>, &'a ReportTimeRangeDto)) -> Self {
        let (maybe_owner, t_range) = value;
        let mut stmt = "SELECT `id`,`owner_id`,`amount`,`currency`,`status`,`transfer_ref`,\
                        `processed_time`,`failure_reason`,`create_time` FROM `payout_meta` \
                        WHERE `create_time` >= ? AND `create_time` <= ?"
            .to_string();
        let mut args = time_range_params(t_range);
        if let Some(owner_id) = maybe_owner {
            stmt += " AND `owner_id`=?";
            args.push(owner_id.into());
        }
        stmt += format!(" LIMIT {}", hard_limit::MAX_NUM_REPORT_ROWS).as_str();
        Self(stmt, Params::Positional(args))
    }
}

inner_into_parts!(FetchCommissionReportArgs);
inner_into_parts!(FetchPayoutReportArgs);

#[rustfmt::skip]
fn commission_from_report_row(
    row: CommissionReportRowType,
) -> Result<CommissionModel, (AppErrorCode, AppRepoErrorDetail)> {
    let (
        id_raw, booking_id_raw, owner_id, amount, rate, currency_raw, status_raw,
        payout_id_raw, transfer_ref, processed_raw, created_raw,
    ) = row;
    let narrowed: CommissionRowType = (
        id_raw, booking_id_raw, amount, rate, currency_raw, status_raw,
        payout_id_raw, transfer_ref, processed_raw, created_raw,
    );
    CommissionModel::try_from((owner_id, narrowed))
}

impl TryFrom<PayoutReportRowType> for PayoutModel {
    type Error = (AppErrorCode, AppRepoErrorDetail);

    #[rustfmt::skip]
    fn try_from(value: PayoutReportRowType) -> Result<Self, Self::Error> {
        let (
            id_raw, owner_id, amount, currency_raw, status_raw, transfer_ref,
            processed_raw, failure_reason, created_raw,
        ) = value;
        let id = RecordIdBytes::to_app_id(id_raw)
            .map_err(|(code, msg)| (code, AppRepoErrorDetail::DataRowParse(msg)))?;
        let currency = CurrencyDto::from(&currency_raw);
        let status = PayoutStatus::try_from(status_raw.as_str())
            .map_err(|(code, msg)| (code, AppRepoErrorDetail::DataRowParse(msg)))?;
        let processed_time = processed_raw
            .map(|raw| raw_column_to_datetime(raw, 0))
            .transpose()?;
        let create_time = raw_column_to_datetime(created_raw, 0)?;
        // member commission rows are not loaded for report listing
        let args = (
            id, owner_id, amount, currency, status, transfer_ref,
            processed_time, failure_reason, create_time, Vec::new(),
        );
        Ok(PayoutModel::from_parts(args))
    } // end of fn try-from
} // end of impl PayoutModel

pub(crate) struct MariadbReportingRepo {
    _dstore: Arc<AppDStoreMariaDB>,
}

impl MariadbReportingRepo {
    pub(crate) async fn new(ds: Arc<AppDataStoreContext>) -> Result<Self, AppRepoError> {
        ds.mariadb(None)
            .map(|found| Self { _dstore: found })
            .ok_or(AppRepoError {
                fn_label: AppRepoErrorFnLabel::InitReportingRepo,
                code: AppErrorCode::MissingDataStore,
                detail: AppRepoErrorDetail::Unknown,
            })
    }

    fn _map_log_err(
        &self,
        fn_label: AppRepoErrorFnLabel,
        code: AppErrorCode,
        detail: AppRepoErrorDetail,
    ) -> AppRepoError {
        let e = AppRepoError {
            fn_label,
            code,
            detail,
        };
        let logctx = self._dstore.log_context();
        app_log_event!(logctx, AppLogLevel::ERROR, "{:?}", e);
        e
    }
} // end of impl MariadbReportingRepo

#[async_trait]
impl AbstractReportingRepo for MariadbReportingRepo {
    async fn list_commissions(
        &self,
        owner_id: Option<u32>,
        t_range: &ReportTimeRangeDto,
    ) -> Result<Vec<CommissionModel>, AppRepoError> {
        let (stmt, params) = FetchCommissionReportArgs::from((owner_id, t_range)).into_parts();
        let mut conn = self._dstore.acquire().await.map_err(|e| {
            self._map_log_err(
                AppRepoErrorFnLabel::ReportCommissions,
                AppErrorCode::DatabaseServerBusy,
                AppRepoErrorDetail::DataStore(e),
            )
        })?;
        let exec = &mut conn;
        let raw = stmt
            .with(params)
            .fetch::<CommissionReportRowType, &mut Conn>(exec)
            .await
            .map_err(|e| {
                self._map_log_err(
                    AppRepoErrorFnLabel::ReportCommissions,
                    AppErrorCode::RemoteDbServerFailure,
                    AppRepoErrorDetail::DatabaseQuery(e.to_string()),
                )
            })?;
        let mut errors = Vec::new();
        let commissions = raw
            .into_iter()
            .filter_map(|row| {
                commission_from_report_row(row)
                    .map_err(|e| errors.push(e))
                    .ok()
            })
            .collect::<Vec<_>>();
        if errors.is_empty() {
            Ok(commissions)
        } else {
            let (code, detail) = errors.remove(0);
            Err(self._map_log_err(AppRepoErrorFnLabel::ReportCommissions, code, detail))
        }
    } // end of fn list_commissions

    async fn list_payouts(
        &self,
        owner_id: Option<u32>,
        t_range: &ReportTimeRangeDto,
    ) -> Result<Vec<PayoutModel>, AppRepoError> {
        let (stmt, params) = FetchPayoutReportArgs::from((owner_id, t_range)).into_parts();
        let mut conn = self._dstore.acquire().await.map_err(|e| {
            self._map_log_err(
                AppRepoErrorFnLabel::ReportPayouts,
                AppErrorCode::DatabaseServerBusy,
                AppRepoErrorDetail::DataStore(e),
            )
        })?;
        let exec = &mut conn;
        let raw = stmt
            .with(params)
            .fetch::<PayoutReportRowType, &mut Conn>(exec)
            .await
            .map_err(|e| {
                self._map_log_err(
                    AppRepoErrorFnLabel::ReportPayouts,
                    AppErrorCode::RemoteDbServerFailure,
                    AppRepoErrorDetail::DatabaseQuery(e.to_string()),
                )
            })?;
        let mut errors = Vec::new();
        let payouts = raw
            .into_iter()
            .filter_map(|row| PayoutModel::try_from(row).map_err(|e| errors.push(e)).ok())
            .collect::<Vec<_>>();
        if errors.is_empty() {
            Ok(payouts)
        } else {
            let (code, detail) = errors.remove(0);
            Err(self._map_log_err(AppRepoErrorFnLabel::ReportPayouts, code, detail))
        }
    } // end of fn list_payouts
} // end of impl AbstractReportingRepo
