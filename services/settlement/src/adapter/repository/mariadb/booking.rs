use std::result::Result;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use mysql_async::prelude::{Query, Queryable, WithParams};
use mysql_async::{Conn, IsolationLevel, Params, TxOpts};
use rust_decimal::Decimal;

use tripmarket_common::adapter::repository::RecordIdBytes;
use tripmarket_common::api::dto::CurrencyDto;
use tripmarket_common::constant::BookableKind;
use tripmarket_common::error::AppErrorCode;
use tripmarket_common::logging::{app_log_event, AppLogLevel};

use crate::adapter::datastore::{AppDStoreMariaDB, AppDataStoreContext};
use crate::model::{
    BookableItemRef, BookingModel, BookingPeriodModel, BookingStatus, CommissionModel,
    PaymentState,
};

use super::super::{AbstractBookingRepo, AppRepoError, AppRepoErrorDetail, AppRepoErrorFnLabel};
use super::payout::InsertCommissionArgs;
use super::{
    inner_into_parts, raw_column_to_date, raw_column_to_datetime, DATETIME_FMT_P0F, DATE_FMT,
};

struct InsertBookingArgs(String, Params);
struct FetchBookingArgs(String, Params);
struct FetchStatusArgs(String, Params);
struct CheckOverlapArgs(String, Params);
struct MarkCancelledArgs(String, Params);
struct StoreIntentRefArgs(String, Params);
struct ConfirmPaidArgs(String, Params);
struct CancelFailedArgs(String, Params);

// 13 columns exceed the arity-12 limit of tuple `FromRow` impls,
// `frunk` heterogeneous list is the supported fallback
#[rustfmt::skip]
type BookingRowType = frunk::HList![
    u32,                        // `payer_id`
    u8,                         // `item_kind`
    u64,                        // `item_id`
    Option<u32>,                // `owner_id`
    mysql_async::Value,         // `period_start`
    mysql_async::Value,         // `period_end`
    Decimal,                    // `amount`
    String,                     // `currency`
    String,                     // `status`
    String,                     // `payment_state`
    Option<String>,             // `intent_ref`
    Option<mysql_async::Value>, // `confirmed_time`
    mysql_async::Value,         // `create_time`
];

type BookingStatusRowType = (String, String);

impl<'a> TryFrom<&'a BookingModel> for InsertBookingArgs {
    type Error = (AppErrorCode, AppRepoErrorDetail);

    #[rustfmt::skip]
    fn try_from(value: &'a BookingModel) -> Result<Self, Self::Error> {
        let id_b = RecordIdBytes::try_from(value.id())
            .map_err(|(code, msg)| (code, AppRepoErrorDetail::RecordIDparse(msg)))?;
        let stmt = "INSERT INTO `booking_meta`(`id`,`payer_id`,`item_kind`,`item_id`,\
                    `owner_id`,`period_start`,`period_end`,`amount`,`currency`,`status`,\
                    `payment_state`,`intent_ref`,`confirmed_time`,`create_time`) VALUES \
                    (?,?,?,?,?,?,?,?,?,?,?,?,?,?)";
        let item = value.item();
        let period = value.period();
        let kind_num = u8::from(item.kind.clone());
        let args = vec![
            id_b.as_column().into(), value.payer_id().into(),
            kind_num.into(), item.item_id.into(), value.owner_id().into(),
            period.start.format(DATE_FMT).to_string().into(),
            period.end.format(DATE_FMT).to_string().into(),
            value.amount().into(), value.currency().to_string().into(),
            value.status().label().into(), value.payment_state().label().into(),
            value.intent_ref().into(),
            value.confirmed_time().map(|t| t.format(DATETIME_FMT_P0F).to_string()).into(),
            value.create_time().format(DATETIME_FMT_P0F).to_string().into(),
        ];
        Ok(Self(stmt.to_string(), Params::Positional(args)))
    }
} // end of impl InsertBookingArgs

impl From<RecordIdBytes> for FetchBookingArgs {
    fn from(value: RecordIdBytes) -> Self {
        let stmt = "SELECT `payer_id`,`item_kind`,`item_id`,`owner_id`,`period_start`,\
                    `period_end`,`amount`,`currency`,`status`,`payment_state`,`intent_ref`,\
                    `confirmed_time`,`create_time` FROM `booking_meta` WHERE `id`=?";
        let args = vec![value.as_column().into()];
        Self(stmt.to_string(), Params::Positional(args))
    }
}

impl From<RecordIdBytes> for FetchStatusArgs {
    fn from(value: RecordIdBytes) -> Self {
        let stmt = "SELECT `status`,`payment_state` FROM `booking_meta` WHERE `id`=?";
        let args = vec![value.as_column().into()];
        Self(stmt.to_string(), Params::Positional(args))
    }
}

impl<'a> From<(&'a BookableItemRef, &'a BookingPeriodModel)> for CheckOverlapArgs {
    fn from(value: (&'a BookableItemRef, &'a BookingPeriodModel)) -> Self {
        let (item, period) = value;
        // rows overlap the given period when `start < new-end` and
        // `end > new-start`, back-to-back stays are not a conflict
        let stmt = "SELECT COUNT(`id`) FROM `booking_meta` WHERE `item_kind`=? AND \
                    `item_id`=? AND `status` IN ('PENDING','CONFIRMED') AND \
                    `period_start` < ? AND `period_end` > ?";
        let kind_num = u8::from(item.kind.clone());
        let args = vec![
            kind_num.into(),
            item.item_id.into(),
            period.end.format(DATE_FMT).to_string().into(),
            period.start.format(DATE_FMT).to_string().into(),
        ];
        Self(stmt.to_string(), Params::Positional(args))
    }
}

impl From<RecordIdBytes> for MarkCancelledArgs {
    fn from(value: RecordIdBytes) -> Self {
        let stmt = "UPDATE `booking_meta` SET `status`='CANCELLED' WHERE `id`=? AND \
                    `status` IN ('PENDING','CONFIRMED')";
        let args = vec![value.as_column().into()];
        Self(stmt.to_string(), Params::Positional(args))
    }
}

impl<'a> From<(RecordIdBytes, &'a str)> for StoreIntentRefArgs {
    fn from(value: (RecordIdBytes, &'a str)) -> Self {
        let (id_b, intent_ref) = value;
        let stmt = "UPDATE `booking_meta` SET `intent_ref`=? WHERE `id`=? AND \
                    `intent_ref` IS NULL";
        let args = vec![intent_ref.into(), id_b.as_column().into()];
        Self(stmt.to_string(), Params::Positional(args))
    }
}

impl From<(RecordIdBytes, DateTime<Utc>)> for ConfirmPaidArgs {
    fn from(value: (RecordIdBytes, DateTime<Utc>)) -> Self {
        let (id_b, t_confirmed) = value;
        let stmt = "UPDATE `booking_meta` SET `status`='CONFIRMED',`payment_state`='PAID',\
                    `confirmed_time`=? WHERE `id`=? AND `status`='PENDING' AND \
                    `payment_state`='PENDING'";
        let args = vec![
            t_confirmed.format(DATETIME_FMT_P0F).to_string().into(),
            id_b.as_column().into(),
        ];
        Self(stmt.to_string(), Params::Positional(args))
    }
}

impl From<RecordIdBytes> for CancelFailedArgs {
    fn from(value: RecordIdBytes) -> Self {
        let stmt = "UPDATE `booking_meta` SET `status`='CANCELLED',`payment_state`='FAILED' \
                    WHERE `id`=? AND `payment_state`='PENDING'";
        let args = vec![value.as_column().into()];
        Self(stmt.to_string(), Params::Positional(args))
    }
}

inner_into_parts!(InsertBookingArgs);
inner_into_parts!(FetchBookingArgs);
inner_into_parts!(FetchStatusArgs);
inner_into_parts!(CheckOverlapArgs);
inner_into_parts!(MarkCancelledArgs);
inner_into_parts!(StoreIntentRefArgs);
inner_into_parts!(ConfirmPaidArgs);
inner_into_parts!(CancelFailedArgs);

impl TryFrom<(String, BookingRowType)> for BookingModel {
    type Error = (AppErrorCode, AppRepoErrorDetail);

    #[rustfmt::skip]
    fn try_from(value: (String, BookingRowType)) -> Result<Self, Self::Error> {
        let (
            id,
            frunk::hlist_pat![
                payer_id, kind_num, item_id, owner_id, start_raw, end_raw, amount,
                currency_raw, status_raw, paystate_raw, intent_ref, confirmed_raw,
                created_raw,
            ],
        ) = value;
        let item = BookableItemRef {
            kind: BookableKind::from(kind_num),
            item_id,
        };
        let period = BookingPeriodModel {
            start: raw_column_to_date(start_raw)?,
            end: raw_column_to_date(end_raw)?,
        };
        let currency = CurrencyDto::from(&currency_raw);
        let status = BookingStatus::try_from(status_raw.as_str())
            .map_err(|(code, msg)| (code, AppRepoErrorDetail::DataRowParse(msg)))?;
        let payment_state = PaymentState::try_from(paystate_raw.as_str())
            .map_err(|(code, msg)| (code, AppRepoErrorDetail::DataRowParse(msg)))?;
        let confirmed_time = confirmed_raw
            .map(|raw| raw_column_to_datetime(raw, 0))
            .transpose()?;
        let create_time = raw_column_to_datetime(created_raw, 0)?;
        let args = (
            id, payer_id, item, owner_id, period, amount, currency, status,
            payment_state, intent_ref, confirmed_time, create_time,
        );
        Ok(BookingModel::from_parts(args))
    } // end of fn try-from
} // end of impl BookingModel

pub(crate) struct MariadbBookingRepo {
    _dstore: Arc<AppDStoreMariaDB>,
}

impl MariadbBookingRepo {
    pub(crate) async fn new(ds: Arc<AppDataStoreContext>) -> Result<Self, AppRepoError> {
        ds.mariadb(None)
            .map(|found| Self { _dstore: found })
            .ok_or(AppRepoError {
                fn_label: AppRepoErrorFnLabel::InitBookingRepo,
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

    fn _parse_id(
        &self,
        fn_label: AppRepoErrorFnLabel,
        booking_id: &str,
    ) -> Result<RecordIdBytes, AppRepoError> {
        RecordIdBytes::try_from(booking_id).map_err(|(code, msg)| {
            self._map_log_err(fn_label, code, AppRepoErrorDetail::RecordIDparse(msg))
        })
    }

    async fn _acquire_conn(&self, fn_label: AppRepoErrorFnLabel) -> Result<Conn, AppRepoError> {
        self._dstore.acquire().await.map_err(|e| {
            self._map_log_err(
                fn_label,
                AppErrorCode::DatabaseServerBusy,
                AppRepoErrorDetail::DataStore(e),
            )
        })
    }

    // runs one conditional update, reports whether exactly one row changed
    async fn _exec_cond_update(
        &self,
        fn_label: AppRepoErrorFnLabel,
        stmt: String,
        params: Params,
    ) -> Result<bool, AppRepoError> {
        let mut conn = self._acquire_conn(fn_label).await?;
        let result = conn.exec_iter(stmt, params).await.map_err(|e| {
            self._map_log_err(
                fn_label,
                AppErrorCode::RemoteDbServerFailure,
                AppRepoErrorDetail::DatabaseExec(e.to_string()),
            )
        })?;
        Ok(result.affected_rows() == 1u64)
    }
} // end of impl MariadbBookingRepo

#[async_trait]
impl AbstractBookingRepo for MariadbBookingRepo {
    async fn create(&self, booking: &BookingModel) -> Result<(), AppRepoError> {
        let (stmt, params) = InsertBookingArgs::try_from(booking)
            .map_err(|(code, detail)| {
                self._map_log_err(AppRepoErrorFnLabel::CreateBooking, code, detail)
            })?
            .into_parts();
        let mut conn = self._acquire_conn(AppRepoErrorFnLabel::CreateBooking).await?;
        let result = conn.exec_iter(stmt, params).await.map_err(|e| {
            self._map_log_err(
                AppRepoErrorFnLabel::CreateBooking,
                AppErrorCode::RemoteDbServerFailure,
                AppRepoErrorDetail::DatabaseExec(e.to_string()),
            )
        })?;
        if result.affected_rows() == 1u64 {
            Ok(())
        } else {
            let msg = format!("num-rows-affected: {}", result.affected_rows());
            Err(self._map_log_err(
                AppRepoErrorFnLabel::CreateBooking,
                AppErrorCode::RemoteDbServerFailure,
                AppRepoErrorDetail::DatabaseExec(msg),
            ))
        }
    } // end of fn create

    async fn fetch(&self, booking_id: &str) -> Result<Option<BookingModel>, AppRepoError> {
        let id_b = self._parse_id(AppRepoErrorFnLabel::FetchBooking, booking_id)?;
        let (stmt, params) = FetchBookingArgs::from(id_b).into_parts();
        let mut conn = self._acquire_conn(AppRepoErrorFnLabel::FetchBooking).await?;
        let exec = &mut conn;
        let raw = stmt
            .with(params)
            .first::<BookingRowType, &mut Conn>(exec)
            .await
            .map_err(|e| {
                self._map_log_err(
                    AppRepoErrorFnLabel::FetchBooking,
                    AppErrorCode::RemoteDbServerFailure,
                    AppRepoErrorDetail::DatabaseQuery(e.to_string()),
                )
            })?;
        if let Some(row) = raw {
            let obj = BookingModel::try_from((booking_id.to_string(), row)).map_err(
                |(code, detail)| {
                    self._map_log_err(AppRepoErrorFnLabel::FetchBooking, code, detail)
                },
            )?;
            Ok(Some(obj))
        } else {
            Ok(None)
        }
    } // end of fn fetch

    async fn fetch_status(
        &self,
        booking_id: &str,
    ) -> Result<Option<(BookingStatus, PaymentState)>, AppRepoError> {
        let id_b = self._parse_id(AppRepoErrorFnLabel::FetchBookingStatus, booking_id)?;
        let (stmt, params) = FetchStatusArgs::from(id_b).into_parts();
        let mut conn = self
            ._acquire_conn(AppRepoErrorFnLabel::FetchBookingStatus)
            .await?;
        let exec = &mut conn;
        let raw = stmt
            .with(params)
            .first::<BookingStatusRowType, &mut Conn>(exec)
            .await
            .map_err(|e| {
                self._map_log_err(
                    AppRepoErrorFnLabel::FetchBookingStatus,
                    AppErrorCode::RemoteDbServerFailure,
                    AppRepoErrorDetail::DatabaseQuery(e.to_string()),
                )
            })?;
        raw.map(|(status_raw, paystate_raw)| {
            let status = BookingStatus::try_from(status_raw.as_str()).map_err(|(code, msg)| {
                self._map_log_err(
                    AppRepoErrorFnLabel::FetchBookingStatus,
                    code,
                    AppRepoErrorDetail::DataRowParse(msg),
                )
            })?;
            let paystate = PaymentState::try_from(paystate_raw.as_str()).map_err(|(code, msg)| {
                self._map_log_err(
                    AppRepoErrorFnLabel::FetchBookingStatus,
                    code,
                    AppRepoErrorDetail::DataRowParse(msg),
                )
            })?;
            Ok((status, paystate))
        })
        .transpose()
    } // end of fn fetch_status

    async fn has_date_overlap(
        &self,
        item: &BookableItemRef,
        period: &BookingPeriodModel,
    ) -> Result<bool, AppRepoError> {
        let (stmt, params) = CheckOverlapArgs::from((item, period)).into_parts();
        let mut conn = self
            ._acquire_conn(AppRepoErrorFnLabel::CheckDateOverlap)
            .await?;
        let exec = &mut conn;
        let raw = stmt
            .with(params)
            .first::<(u64,), &mut Conn>(exec)
            .await
            .map_err(|e| {
                self._map_log_err(
                    AppRepoErrorFnLabel::CheckDateOverlap,
                    AppErrorCode::RemoteDbServerFailure,
                    AppRepoErrorDetail::DatabaseQuery(e.to_string()),
                )
            })?;
        Ok(raw.map(|(cnt,)| cnt > 0).unwrap_or(false))
    }

    async fn mark_cancelled(&self, booking_id: &str) -> Result<bool, AppRepoError> {
        let id_b = self._parse_id(AppRepoErrorFnLabel::MarkBookingCancelled, booking_id)?;
        let (stmt, params) = MarkCancelledArgs::from(id_b).into_parts();
        self._exec_cond_update(AppRepoErrorFnLabel::MarkBookingCancelled, stmt, params)
            .await
    }

    async fn store_intent_ref(
        &self,
        booking_id: &str,
        intent_ref: &str,
    ) -> Result<bool, AppRepoError> {
        let id_b = self._parse_id(AppRepoErrorFnLabel::StoreIntentRef, booking_id)?;
        let (stmt, params) = StoreIntentRefArgs::from((id_b, intent_ref)).into_parts();
        self._exec_cond_update(AppRepoErrorFnLabel::StoreIntentRef, stmt, params)
            .await
    }

    async fn confirm_paid(
        &self,
        booking_id: &str,
        t_confirmed: DateTime<Utc>,
        commission: Option<CommissionModel>,
    ) -> Result<bool, AppRepoError> {
        let id_b = self._parse_id(AppRepoErrorFnLabel::ConfirmBookingPaid, booking_id)?;
        let commission_arg = commission
            .map(InsertCommissionArgs::try_from)
            .transpose()
            .map_err(|(code, detail)| {
                self._map_log_err(AppRepoErrorFnLabel::ConfirmBookingPaid, code, detail)
            })?;
        let t_confirmed = t_confirmed.trunc_subsecs(0);
        let (stmt, params) = ConfirmPaidArgs::from((id_b, t_confirmed)).into_parts();
        let mut conn = self
            ._acquire_conn(AppRepoErrorFnLabel::ConfirmBookingPaid)
            .await?;
        let mut options = TxOpts::default();
        options.with_isolation_level(IsolationLevel::RepeatableRead);
        let mut tx = conn.start_transaction(options).await.map_err(|e| {
            self._map_log_err(
                AppRepoErrorFnLabel::ConfirmBookingPaid,
                AppErrorCode::RemoteDbServerFailure,
                AppRepoErrorDetail::DatabaseTxStart(e.to_string()),
            )
        })?;
        let resultset = tx.exec_iter(stmt, params).await.map_err(|e| {
            self._map_log_err(
                AppRepoErrorFnLabel::ConfirmBookingPaid,
                AppErrorCode::RemoteDbServerFailure,
                AppRepoErrorDetail::DatabaseExec(e.to_string()),
            )
        })?;
        let applied = resultset.affected_rows() == 1u64;
        if applied {
            if let Some(arg) = commission_arg {
                // dropping the transaction on error rolls the status
                // update back together with the partial insert
                let (stmt, params) = arg.into_parts();
                let resultset = tx.exec_iter(stmt, params).await.map_err(|e| {
                    self._map_log_err(
                        AppRepoErrorFnLabel::ConfirmBookingPaid,
                        AppErrorCode::RemoteDbServerFailure,
                        AppRepoErrorDetail::DatabaseExec(e.to_string()),
                    )
                })?;
                if resultset.affected_rows() != 1u64 {
                    let msg = format!("num-rows-affected: {}", resultset.affected_rows());
                    return Err(self._map_log_err(
                        AppRepoErrorFnLabel::ConfirmBookingPaid,
                        AppErrorCode::RemoteDbServerFailure,
                        AppRepoErrorDetail::DatabaseExec(msg),
                    ));
                }
            }
        }
        tx.commit().await.map_err(|e| {
            self._map_log_err(
                AppRepoErrorFnLabel::ConfirmBookingPaid,
                AppErrorCode::RemoteDbServerFailure,
                AppRepoErrorDetail::DatabaseTxCommit(e.to_string()),
            )
        })?;
        Ok(applied)
    } // end of fn confirm_paid

    async fn cancel_failed(&self, booking_id: &str) -> Result<bool, AppRepoError> {
        let id_b = self._parse_id(AppRepoErrorFnLabel::CancelBookingFailed, booking_id)?;
        let (stmt, params) = CancelFailedArgs::from(id_b).into_parts();
        self._exec_cond_update(AppRepoErrorFnLabel::CancelBookingFailed, stmt, params)
            .await
    }
} // end of impl AbstractBookingRepo
