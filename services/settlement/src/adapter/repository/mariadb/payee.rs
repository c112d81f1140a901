use std::result::Result;
use std::sync::Arc;

use async_trait::async_trait;
use mysql_async::prelude::{Query, Queryable, WithParams};
use mysql_async::{Conn, Params};

use tripmarket_common::error::AppErrorCode;
use tripmarket_common::logging::{app_log_event, AppLogLevel};

use crate::adapter::datastore::{AppDStoreMariaDB, AppDataStoreContext};
use crate::model::{Payee3partyModel, Payee3partyStripeModel, PayeeProfileModel};

use super::super::{AbstractPayeeRepo, AppRepoError, AppRepoErrorDetail, AppRepoErrorFnLabel};
use super::{inner_into_parts, raw_column_to_datetime, DATETIME_FMT_P0F};

struct InsertUpdatePayeeArgs(String, Params);
struct FetchPayeeArgs(String, Params);

type PayeeRowType = (
    String,             // `method`
    Vec<u8>,            // `detail`, serialised json
    mysql_async::Value, // `last_update`
);

impl<'a> TryFrom<&'a PayeeProfileModel> for InsertUpdatePayeeArgs {
    type Error = (AppErrorCode, AppRepoErrorDetail);

    fn try_from(value: &'a PayeeProfileModel) -> Result<Self, Self::Error> {
        let (method, detail) = match &value.threeparty {
            Payee3partyModel::Stripe(s) => {
                let label = "Stripe".to_string();
                let serial = serde_json::to_string(s).map_err(|e| {
                    (
                        AppErrorCode::DataCorruption,
                        AppRepoErrorDetail::PayDetail(label.clone(), e.to_string()),
                    )
                })?;
                (label, serial)
            }
            Payee3partyModel::Unknown => {
                return Err((
                    AppErrorCode::InvalidInput,
                    AppRepoErrorDetail::PayMethodUnsupport("unknown".to_string()),
                ))
            }
        };
        let stmt = "INSERT INTO `payee_profile`(`owner_id`,`method`,`detail`,`last_update`) \
                    VALUES (?,?,?,?) ON DUPLICATE KEY UPDATE `method`=VALUE(`method`),\
                    `detail`=VALUE(`detail`),`last_update`=VALUE(`last_update`)";
        let args = vec![
            value.owner_id.into(),
            method.into(),
            detail.into(),
            value.last_update.format(DATETIME_FMT_P0F).to_string().into(),
        ];
        Ok(Self(stmt.to_string(), Params::Positional(args)))
    }
} // end of impl InsertUpdatePayeeArgs

impl From<u32> for FetchPayeeArgs {
    fn from(value: u32) -> Self {
        let stmt = "SELECT `method`,`detail`,`last_update` FROM `payee_profile` WHERE \
                    `owner_id`=?";
        Self(stmt.to_string(), Params::Positional(vec![value.into()]))
    }
}

inner_into_parts!(InsertUpdatePayeeArgs);
inner_into_parts!(FetchPayeeArgs);

impl TryFrom<(u32, PayeeRowType)> for PayeeProfileModel {
    type Error = (AppErrorCode, AppRepoErrorDetail);

    fn try_from(value: (u32, PayeeRowType)) -> Result<Self, Self::Error> {
        let (owner_id, (method_raw, detail_raw, updated_raw)) = value;
        let threeparty = match method_raw.as_str() {
            "Stripe" => {
                let s = serde_json::from_slice::<Payee3partyStripeModel>(&detail_raw).map_err(
                    |e| {
                        (
                            AppErrorCode::DataCorruption,
                            AppRepoErrorDetail::DataRowParse(e.to_string()),
                        )
                    },
                )?;
                Payee3partyModel::Stripe(s)
            }
            _others => Payee3partyModel::Unknown,
        };
        let last_update = raw_column_to_datetime(updated_raw, 0)?;
        Ok(Self {
            owner_id,
            last_update,
            threeparty,
        })
    }
} // end of impl PayeeProfileModel

pub(crate) struct MariadbPayeeRepo {
    _dstore: Arc<AppDStoreMariaDB>,
}

impl MariadbPayeeRepo {
    pub(crate) async fn new(ds: Arc<AppDataStoreContext>) -> Result<Self, AppRepoError> {
        ds.mariadb(None)
            .map(|found| Self { _dstore: found })
            .ok_or(AppRepoError {
                fn_label: AppRepoErrorFnLabel::InitPayeeRepo,
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
} // end of impl MariadbPayeeRepo

#[async_trait]
impl AbstractPayeeRepo for MariadbPayeeRepo {
    async fn create_or_update(&self, payee: &PayeeProfileModel) -> Result<(), AppRepoError> {
        let (stmt, params) = InsertUpdatePayeeArgs::try_from(payee)
            .map_err(|(code, detail)| {
                self._map_log_err(AppRepoErrorFnLabel::SavePayee, code, detail)
            })?
            .into_parts();
        let mut conn = self._dstore.acquire().await.map_err(|e| {
            self._map_log_err(
                AppRepoErrorFnLabel::SavePayee,
                AppErrorCode::DatabaseServerBusy,
                AppRepoErrorDetail::DataStore(e),
            )
        })?;
        let resultset = conn.exec_iter(stmt, params).await.map_err(|e| {
            self._map_log_err(
                AppRepoErrorFnLabel::SavePayee,
                AppErrorCode::RemoteDbServerFailure,
                AppRepoErrorDetail::DatabaseExec(e.to_string()),
            )
        })?;
        // upsert touches one row on insert, two on update
        let cond = [1u64, 2].contains(&resultset.affected_rows());
        if cond {
            Ok(())
        } else {
            let msg = format!("num-rows-affected: {}", resultset.affected_rows());
            Err(self._map_log_err(
                AppRepoErrorFnLabel::SavePayee,
                AppErrorCode::RemoteDbServerFailure,
                AppRepoErrorDetail::DatabaseExec(msg),
            ))
        }
    } // end of fn create_or_update

    async fn fetch(&self, owner_id: u32) -> Result<Option<PayeeProfileModel>, AppRepoError> {
        let (stmt, params) = FetchPayeeArgs::from(owner_id).into_parts();
        let mut conn = self._dstore.acquire().await.map_err(|e| {
            self._map_log_err(
                AppRepoErrorFnLabel::FetchPayee,
                AppErrorCode::DatabaseServerBusy,
                AppRepoErrorDetail::DataStore(e),
            )
        })?;
        let exec = &mut conn;
        let raw = stmt
            .with(params)
            .first::<PayeeRowType, &mut Conn>(exec)
            .await
            .map_err(|e| {
                self._map_log_err(
                    AppRepoErrorFnLabel::FetchPayee,
                    AppErrorCode::RemoteDbServerFailure,
                    AppRepoErrorDetail::DatabaseQuery(e.to_string()),
                )
            })?;
        if let Some(row) = raw {
            let obj = PayeeProfileModel::try_from((owner_id, row)).map_err(|(code, detail)| {
                self._map_log_err(AppRepoErrorFnLabel::FetchPayee, code, detail)
            })?;
            Ok(Some(obj))
        } else {
            Ok(None)
        }
    } // end of fn fetch
} // end of impl AbstractPayeeRepo
