use std::result::Result;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mysql_async::prelude::{Query, Queryable, WithParams};
use mysql_async::{Conn, IsolationLevel, Params, TxOpts};
use rust_decimal::Decimal;

use tripmarket_common::adapter::repository::RecordIdBytes;
use tripmarket_common::api::dto::CurrencyDto;
use tripmarket_common::error::AppErrorCode;
use tripmarket_common::logging::{app_log_event, AppLogLevel};

use crate::adapter::datastore::{AppDStoreMariaDB, AppDataStoreContext};
use crate::model::{CommissionModel, CommissionStatus, PayoutModel};

use super::super::{AbstractPayoutRepo, AppRepoError, AppRepoErrorDetail, AppRepoErrorFnLabel};
use super::{inner_into_parts, raw_column_to_datetime, DATETIME_FMT_P0F};

pub(super) struct InsertCommissionArgs(String, Params);
struct FetchPendingCommissionArgs(String, Params);
struct FetchOwnersArgs(String, Params);
struct InsertPayoutMetaArgs(String, Params);
struct AssignMembersArgs(String, Params, usize);
struct CompletePayoutMetaArgs(String, Params);
struct SettleMembersArgs(String, Params);
struct FailPayoutMetaArgs(String, Params);
struct ReleaseMembersArgs(String, Params);

#[rustfmt::skip]
pub(super) type CommissionRowType = (
    Vec<u8>,                    // `id`
    Vec<u8>,                    // `booking_id`
    Decimal,                    // `amount`
    Decimal,                    // `rate`
    String,                     // `currency`
    String,                     // `status`
    Option<Vec<u8>>,            // `payout_id`
    Option<String>,             // `transfer_ref`
    Option<mysql_async::Value>, // `processed_time`
    mysql_async::Value,         // `create_time`
);

impl TryFrom<CommissionModel> for InsertCommissionArgs {
    type Error = (AppErrorCode, AppRepoErrorDetail);

    #[rustfmt::skip]
    fn try_from(value: CommissionModel) -> Result<Self, Self::Error> {
        let (
            id, booking_id, owner_id, amount, rate, currency, status,
            payout_id, transfer_ref, processed_time, create_time,
        ) = value.into_parts();
        let map_id_err =
            |(code, msg): (AppErrorCode, String)| (code, AppRepoErrorDetail::RecordIDparse(msg));
        let id_b = RecordIdBytes::try_from(id.as_str()).map_err(map_id_err)?;
        let booking_id_b = RecordIdBytes::try_from(booking_id.as_str()).map_err(map_id_err)?;
        let payout_id_col = payout_id
            .as_deref()
            .map(|v| RecordIdBytes::try_from(v).map(|b| b.as_column()))
            .transpose()
            .map_err(map_id_err)?;
        let stmt = "INSERT INTO `commission`(`id`,`booking_id`,`owner_id`,`amount`,`rate`,\
                    `currency`,`status`,`payout_id`,`transfer_ref`,`processed_time`,\
                    `create_time`) VALUES (?,?,?,?,?,?,?,?,?,?,?)";
        let args = vec![
            id_b.as_column().into(), booking_id_b.as_column().into(), owner_id.into(),
            amount.into(), rate.into(), currency.to_string().into(), status.label().into(),
            payout_id_col.into(), transfer_ref.into(),
            processed_time.map(|t| t.format(DATETIME_FMT_P0F).to_string()).into(),
            create_time.format(DATETIME_FMT_P0F).to_string().into(),
        ];
        Ok(Self(stmt.to_string(), Params::Positional(args)))
    } // end of fn try-from
} // end of impl InsertCommissionArgs

impl From<u32> for FetchPendingCommissionArgs {
    fn from(value: u32) -> Self {
        let stmt = "SELECT `id`,`booking_id`,`amount`,`rate`,`currency`,`status`,\
                    `payout_id`,`transfer_ref`,`processed_time`,`create_time` FROM \
                    `commission` WHERE `owner_id`=? AND `status`='PENDING' AND \
                    `payout_id` IS NULL";
        Self(stmt.to_string(), Params::Positional(vec![value.into()]))
    }
}

impl Default for FetchOwnersArgs {
    fn default() -> Self {
        let stmt = "SELECT DISTINCT `owner_id` FROM `commission` WHERE `status`='PENDING' \
                    AND `payout_id` IS NULL";
        Self(stmt.to_string(), Params::Empty)
    }
}

impl<'a> TryFrom<&'a PayoutModel> for InsertPayoutMetaArgs {
    type Error = (AppErrorCode, AppRepoErrorDetail);

    #[rustfmt::skip]
    fn try_from(value: &'a PayoutModel) -> Result<Self, Self::Error> {
        let id_b = RecordIdBytes::try_from(value.id())
            .map_err(|(code, msg)| (code, AppRepoErrorDetail::RecordIDparse(msg)))?;
        let stmt = "INSERT INTO `payout_meta`(`id`,`owner_id`,`amount`,`currency`,\
                    `status`,`transfer_ref`,`processed_time`,`failure_reason`,\
                    `create_time`) VALUES (?,?,?,?,?,?,?,?,?)";
        let args = vec![
            id_b.as_column().into(), value.owner_id().into(), value.amount().into(),
            value.currency().to_string().into(), value.status().label().into(),
            value.transfer_ref().into(),
            value.processed_time().map(|t| t.format(DATETIME_FMT_P0F).to_string()).into(),
            value.failure_reason().into(),
            value.create_time().format(DATETIME_FMT_P0F).to_string().into(),
        ];
        Ok(Self(stmt.to_string(), Params::Positional(args)))
    }
} // end of impl InsertPayoutMetaArgs

impl AssignMembersArgs {
    fn sql_prep_stmt(num_batch: usize) -> String {
        assert_ne!(num_batch, 0);
        let placeholders = (0..num_batch).map(|_| "?").collect::<Vec<_>>().join(",");
        format!(
            "UPDATE `commission` SET `payout_id`=? WHERE `status`='PENDING' AND \
             `payout_id` IS NULL AND `id` IN ({placeholders})"
        )
    }
    fn into_parts(self) -> (String, Params, usize) {
        (self.0, self.1, self.2)
    }
}
impl<'a> TryFrom<&'a PayoutModel> for AssignMembersArgs {
    type Error = (AppErrorCode, AppRepoErrorDetail);

    fn try_from(value: &'a PayoutModel) -> Result<Self, Self::Error> {
        let map_id_err =
            |(code, msg): (AppErrorCode, String)| (code, AppRepoErrorDetail::RecordIDparse(msg));
        let num_members = value.members().len();
        let stmt = Self::sql_prep_stmt(num_members);
        let payout_id_b = RecordIdBytes::try_from(value.id()).map_err(map_id_err)?;
        let mut args = vec![payout_id_b.as_column().into()];
        for m in value.members() {
            let m_id_b = RecordIdBytes::try_from(m.id()).map_err(map_id_err)?;
            args.push(m_id_b.as_column().into());
        }
        Ok(Self(stmt, Params::Positional(args), num_members))
    }
} // end of impl AssignMembersArgs

type PayoutSettleCvtArgs<'a> = (&'a str, &'a str, DateTime<Utc>);

impl<'a> TryFrom<PayoutSettleCvtArgs<'a>> for CompletePayoutMetaArgs {
    type Error = (AppErrorCode, AppRepoErrorDetail);

    fn try_from(value: PayoutSettleCvtArgs<'a>) -> Result<Self, Self::Error> {
        let (payout_id, transfer_ref, t_processed) = value;
        let id_b = RecordIdBytes::try_from(payout_id)
            .map_err(|(code, msg)| (code, AppRepoErrorDetail::RecordIDparse(msg)))?;
        let stmt = "UPDATE `payout_meta` SET `status`='SUCCEEDED',`transfer_ref`=?,\
                    `processed_time`=? WHERE `id`=? AND `status`='PROCESSING'";
        let args = vec![
            transfer_ref.into(),
            t_processed.format(DATETIME_FMT_P0F).to_string().into(),
            id_b.as_column().into(),
        ];
        Ok(Self(stmt.to_string(), Params::Positional(args)))
    }
}

impl<'a> TryFrom<PayoutSettleCvtArgs<'a>> for SettleMembersArgs {
    type Error = (AppErrorCode, AppRepoErrorDetail);

    fn try_from(value: PayoutSettleCvtArgs<'a>) -> Result<Self, Self::Error> {
        let (payout_id, transfer_ref, t_processed) = value;
        let id_b = RecordIdBytes::try_from(payout_id)
            .map_err(|(code, msg)| (code, AppRepoErrorDetail::RecordIDparse(msg)))?;
        let stmt = "UPDATE `commission` SET `status`='PROCESSED',`transfer_ref`=?,\
                    `processed_time`=? WHERE `payout_id`=? AND `status`='PENDING'";
        let args = vec![
            transfer_ref.into(),
            t_processed.format(DATETIME_FMT_P0F).to_string().into(),
            id_b.as_column().into(),
        ];
        Ok(Self(stmt.to_string(), Params::Positional(args)))
    }
}

impl<'a> TryFrom<(&'a str, &'a str)> for FailPayoutMetaArgs {
    type Error = (AppErrorCode, AppRepoErrorDetail);

    fn try_from(value: (&'a str, &'a str)) -> Result<Self, Self::Error> {
        let (payout_id, reason) = value;
        let id_b = RecordIdBytes::try_from(payout_id)
            .map_err(|(code, msg)| (code, AppRepoErrorDetail::RecordIDparse(msg)))?;
        let stmt = "UPDATE `payout_meta` SET `status`='FAILED',`failure_reason`=? \
                    WHERE `id`=? AND `status`='PROCESSING'";
        let args = vec![reason.into(), id_b.as_column().into()];
        Ok(Self(stmt.to_string(), Params::Positional(args)))
    }
}

impl<'a> TryFrom<&'a str> for ReleaseMembersArgs {
    type Error = (AppErrorCode, AppRepoErrorDetail);

    fn try_from(value: &'a str) -> Result<Self, Self::Error> {
        let id_b = RecordIdBytes::try_from(value)
            .map_err(|(code, msg)| (code, AppRepoErrorDetail::RecordIDparse(msg)))?;
        let stmt = "UPDATE `commission` SET `payout_id`=NULL WHERE `payout_id`=? AND \
                    `status`='PENDING'";
        let args = vec![id_b.as_column().into()];
        Ok(Self(stmt.to_string(), Params::Positional(args)))
    }
}

inner_into_parts!(InsertCommissionArgs);
inner_into_parts!(FetchPendingCommissionArgs);
inner_into_parts!(FetchOwnersArgs);
inner_into_parts!(InsertPayoutMetaArgs);
inner_into_parts!(CompletePayoutMetaArgs);
inner_into_parts!(SettleMembersArgs);
inner_into_parts!(FailPayoutMetaArgs);
inner_into_parts!(ReleaseMembersArgs);

impl TryFrom<(u32, CommissionRowType)> for CommissionModel {
    type Error = (AppErrorCode, AppRepoErrorDetail);

    #[rustfmt::skip]
    fn try_from(value: (u32, CommissionRowType)) -> Result<Self, Self::Error> {
        let (
            owner_id,
            (
                id_raw, booking_id_raw, amount, rate, currency_raw, status_raw,
                payout_id_raw, transfer_ref, processed_raw, created_raw,
            ),
        ) = value;
        let map_id_err =
            |(code, msg): (AppErrorCode, String)| (code, AppRepoErrorDetail::DataRowParse(msg));
        let id = RecordIdBytes::to_app_id(id_raw).map_err(map_id_err)?;
        let booking_id = RecordIdBytes::to_app_id(booking_id_raw).map_err(map_id_err)?;
        let payout_id = payout_id_raw
            .map(RecordIdBytes::to_app_id)
            .transpose()
            .map_err(map_id_err)?;
        let currency = CurrencyDto::from(&currency_raw);
        let status = CommissionStatus::try_from(status_raw.as_str())
            .map_err(|(code, msg)| (code, AppRepoErrorDetail::DataRowParse(msg)))?;
        let processed_time = processed_raw
            .map(|raw| raw_column_to_datetime(raw, 0))
            .transpose()?;
        let create_time = raw_column_to_datetime(created_raw, 0)?;
        let args = (
            id, booking_id, owner_id, amount, rate, currency, status,
            payout_id, transfer_ref, processed_time, create_time,
        );
        Ok(CommissionModel::from_parts(args))
    } // end of fn try-from
} // end of impl CommissionModel

pub(crate) struct MariadbPayoutRepo {
    _dstore: Arc<AppDStoreMariaDB>,
}

impl MariadbPayoutRepo {
    pub(crate) async fn new(ds: Arc<AppDataStoreContext>) -> Result<Self, AppRepoError> {
        ds.mariadb(None)
            .map(|found| Self { _dstore: found })
            .ok_or(AppRepoError {
                fn_label: AppRepoErrorFnLabel::InitPayoutRepo,
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

    async fn _acquire_conn(&self, fn_label: AppRepoErrorFnLabel) -> Result<Conn, AppRepoError> {
        self._dstore.acquire().await.map_err(|e| {
            self._map_log_err(
                fn_label,
                AppErrorCode::DatabaseServerBusy,
                AppRepoErrorDetail::DataStore(e),
            )
        })
    }
} // end of impl MariadbPayoutRepo

#[async_trait]
impl AbstractPayoutRepo for MariadbPayoutRepo {
    async fn fetch_pending_commissions(
        &self,
        owner_id: u32,
    ) -> Result<Vec<CommissionModel>, AppRepoError> {
        let (stmt, params) = FetchPendingCommissionArgs::from(owner_id).into_parts();
        let mut conn = self
            ._acquire_conn(AppRepoErrorFnLabel::FetchPendingCommissions)
            .await?;
        let exec = &mut conn;
        let raw = stmt
            .with(params)
            .fetch::<CommissionRowType, &mut Conn>(exec)
            .await
            .map_err(|e| {
                self._map_log_err(
                    AppRepoErrorFnLabel::FetchPendingCommissions,
                    AppErrorCode::RemoteDbServerFailure,
                    AppRepoErrorDetail::DatabaseQuery(e.to_string()),
                )
            })?;
        let mut errors = Vec::new();
        let commissions = raw
            .into_iter()
            .filter_map(|row| {
                CommissionModel::try_from((owner_id, row))
                    .map_err(|e| errors.push(e))
                    .ok()
            })
            .collect::<Vec<_>>();
        if errors.is_empty() {
            Ok(commissions)
        } else {
            let (code, detail) = errors.remove(0);
            Err(self._map_log_err(AppRepoErrorFnLabel::FetchPendingCommissions, code, detail))
        }
    } // end of fn fetch_pending_commissions

    async fn fetch_owners_with_pending(&self) -> Result<Vec<u32>, AppRepoError> {
        let (stmt, params) = FetchOwnersArgs::default().into_parts();
        let mut conn = self
            ._acquire_conn(AppRepoErrorFnLabel::FetchOwnersWithPending)
            .await?;
        let exec = &mut conn;
        let raw = stmt
            .with(params)
            .fetch::<(u32,), &mut Conn>(exec)
            .await
            .map_err(|e| {
                self._map_log_err(
                    AppRepoErrorFnLabel::FetchOwnersWithPending,
                    AppErrorCode::RemoteDbServerFailure,
                    AppRepoErrorDetail::DatabaseQuery(e.to_string()),
                )
            })?;
        Ok(raw.into_iter().map(|(owner_id,)| owner_id).collect())
    }

    async fn create_payout(&self, payout: &PayoutModel) -> Result<(), AppRepoError> {
        let (meta_stmt, meta_params) = InsertPayoutMetaArgs::try_from(payout)
            .map_err(|(code, detail)| {
                self._map_log_err(AppRepoErrorFnLabel::CreatePayout, code, detail)
            })?
            .into_parts();
        let (mb_stmt, mb_params, num_members) = AssignMembersArgs::try_from(payout)
            .map_err(|(code, detail)| {
                self._map_log_err(AppRepoErrorFnLabel::CreatePayout, code, detail)
            })?
            .into_parts();
        let mut conn = self._acquire_conn(AppRepoErrorFnLabel::CreatePayout).await?;
        let mut options = TxOpts::default();
        options.with_isolation_level(IsolationLevel::RepeatableRead);
        let mut tx = conn.start_transaction(options).await.map_err(|e| {
            self._map_log_err(
                AppRepoErrorFnLabel::CreatePayout,
                AppErrorCode::RemoteDbServerFailure,
                AppRepoErrorDetail::DatabaseTxStart(e.to_string()),
            )
        })?;
        let resultset = tx.exec_iter(meta_stmt, meta_params).await.map_err(|e| {
            self._map_log_err(
                AppRepoErrorFnLabel::CreatePayout,
                AppErrorCode::RemoteDbServerFailure,
                AppRepoErrorDetail::DatabaseExec(e.to_string()),
            )
        })?;
        if resultset.affected_rows() != 1u64 {
            let msg = format!("num-rows-affected: {}", resultset.affected_rows());
            return Err(self._map_log_err(
                AppRepoErrorFnLabel::CreatePayout,
                AppErrorCode::RemoteDbServerFailure,
                AppRepoErrorDetail::DatabaseExec(msg),
            ));
        }
        let resultset = tx.exec_iter(mb_stmt, mb_params).await.map_err(|e| {
            self._map_log_err(
                AppRepoErrorFnLabel::CreatePayout,
                AppErrorCode::RemoteDbServerFailure,
                AppRepoErrorDetail::DatabaseExec(e.to_string()),
            )
        })?;
        // a member grabbed by a concurrent run leaves fewer rows updated
        // than expected, dropping the transaction reverts everything
        if resultset.affected_rows() != num_members as u64 {
            let msg = format!(
                "member-select, expect: {num_members}, actual: {}",
                resultset.affected_rows()
            );
            return Err(self._map_log_err(
                AppRepoErrorFnLabel::CreatePayout,
                AppErrorCode::AcquireLockFailure,
                AppRepoErrorDetail::DatabaseExec(msg),
            ));
        }
        tx.commit().await.map_err(|e| {
            self._map_log_err(
                AppRepoErrorFnLabel::CreatePayout,
                AppErrorCode::RemoteDbServerFailure,
                AppRepoErrorDetail::DatabaseTxCommit(e.to_string()),
            )
        })
    } // end of fn create_payout

    async fn complete_payout(&self, payout: &PayoutModel) -> Result<(), AppRepoError> {
        let transfer_ref = payout.transfer_ref().ok_or_else(|| {
            self._map_log_err(
                AppRepoErrorFnLabel::CompletePayout,
                AppErrorCode::InvalidInput,
                AppRepoErrorDetail::ConstructModelFailure("missing-transfer-ref".to_string()),
            )
        })?;
        let t_processed = payout.processed_time().ok_or_else(|| {
            self._map_log_err(
                AppRepoErrorFnLabel::CompletePayout,
                AppErrorCode::InvalidInput,
                AppRepoErrorDetail::ConstructModelFailure("missing-processed-time".to_string()),
            )
        })?;
        let cvt_args = (payout.id(), transfer_ref, t_processed);
        let meta_arg = CompletePayoutMetaArgs::try_from(cvt_args).map_err(|(code, detail)| {
            self._map_log_err(AppRepoErrorFnLabel::CompletePayout, code, detail)
        })?;
        let mb_arg = SettleMembersArgs::try_from(cvt_args).map_err(|(code, detail)| {
            self._map_log_err(AppRepoErrorFnLabel::CompletePayout, code, detail)
        })?;
        self._settle_transaction(
            AppRepoErrorFnLabel::CompletePayout,
            meta_arg.into_parts(),
            mb_arg.into_parts(),
        )
        .await
    } // end of fn complete_payout

    async fn fail_payout(&self, payout: &PayoutModel) -> Result<(), AppRepoError> {
        let reason = payout.failure_reason().ok_or_else(|| {
            self._map_log_err(
                AppRepoErrorFnLabel::FailPayout,
                AppErrorCode::InvalidInput,
                AppRepoErrorDetail::ConstructModelFailure("missing-failure-reason".to_string()),
            )
        })?;
        let meta_arg =
            FailPayoutMetaArgs::try_from((payout.id(), reason)).map_err(|(code, detail)| {
                self._map_log_err(AppRepoErrorFnLabel::FailPayout, code, detail)
            })?;
        let mb_arg = ReleaseMembersArgs::try_from(payout.id()).map_err(|(code, detail)| {
            self._map_log_err(AppRepoErrorFnLabel::FailPayout, code, detail)
        })?;
        self._settle_transaction(
            AppRepoErrorFnLabel::FailPayout,
            meta_arg.into_parts(),
            mb_arg.into_parts(),
        )
        .await
    } // end of fn fail_payout
} // end of impl AbstractPayoutRepo

impl MariadbPayoutRepo {
    // final state write for one payout, the meta row update has to hit
    // exactly one row while the member update may touch any number
    async fn _settle_transaction(
        &self,
        fn_label: AppRepoErrorFnLabel,
        meta_arg: (String, Params),
        mb_arg: (String, Params),
    ) -> Result<(), AppRepoError> {
        let mut conn = self._acquire_conn(fn_label).await?;
        let mut options = TxOpts::default();
        options.with_isolation_level(IsolationLevel::RepeatableRead);
        let mut tx = conn.start_transaction(options).await.map_err(|e| {
            self._map_log_err(
                fn_label,
                AppErrorCode::RemoteDbServerFailure,
                AppRepoErrorDetail::DatabaseTxStart(e.to_string()),
            )
        })?;
        let resultset = tx.exec_iter(meta_arg.0, meta_arg.1).await.map_err(|e| {
            self._map_log_err(
                fn_label,
                AppErrorCode::RemoteDbServerFailure,
                AppRepoErrorDetail::DatabaseExec(e.to_string()),
            )
        })?;
        if resultset.affected_rows() != 1u64 {
            let msg = format!("num-rows-affected: {}", resultset.affected_rows());
            return Err(self._map_log_err(
                fn_label,
                AppErrorCode::RemoteDbServerFailure,
                AppRepoErrorDetail::DatabaseExec(msg),
            ));
        }
        tx.exec_iter(mb_arg.0, mb_arg.1).await.map_err(|e| {
            self._map_log_err(
                fn_label,
                AppErrorCode::RemoteDbServerFailure,
                AppRepoErrorDetail::DatabaseExec(e.to_string()),
            )
        })?;
        tx.commit().await.map_err(|e| {
            self._map_log_err(
                fn_label,
                AppErrorCode::RemoteDbServerFailure,
                AppRepoErrorDetail::DatabaseTxCommit(e.to_string()),
            )
        })
    } // end of fn _settle_transaction
} // end of impl MariadbPayoutRepo
