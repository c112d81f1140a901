use std::boxed::Box;
use std::sync::Arc;

use chrono::Local;

use tripmarket_common::error::AppErrorCode;
use tripmarket_common::logging::{app_log_event, AppLogContext, AppLogLevel};

use crate::adapter::processor::AbstractPaymentProcessor;
use crate::adapter::repository::{
    AbstractPayeeRepo, AbstractPayoutRepo, AppRepoError,
};
use crate::api::web::dto::PayoutRespDto;
use crate::identity::AppActorIdentity;
use crate::model::{PayeeProfileModel, PayoutModel, PayoutModelError};
use crate::{app_meta, generate_custom_uid};

pub enum PayoutRunUcError {
    PermissionDenied(u32),
    NothingToPayout(u32),
    PayeeNotReady(u32),
    CorruptedCommission(PayoutModelError),
    // a concurrent run grabbed at least one member commission, nothing
    // of this run was persisted
    PayoutLockRace,
    DataStoreError(AppRepoError),
}

impl From<AppRepoError> for PayoutRunUcError {
    fn from(value: AppRepoError) -> Self {
        Self::DataStoreError(value)
    }
}

pub struct PayoutRunUseCase {
    pub identity: AppActorIdentity,
    pub processors: Arc<Box<dyn AbstractPaymentProcessor>>,
    pub repo_po: Box<dyn AbstractPayoutRepo>,
    pub repo_pe: Box<dyn AbstractPayeeRepo>,
    pub logctx: Arc<AppLogContext>,
}

impl PayoutRunUseCase {
    pub async fn execute(&self, owner_id: u32) -> Result<PayoutRespDto, PayoutRunUcError> {
        if !self.identity.is_admin() {
            return Err(PayoutRunUcError::PermissionDenied(self.identity.profile));
        }
        let commissions = self.repo_po.fetch_pending_commissions(owner_id).await?;
        if commissions.is_empty() {
            return Err(PayoutRunUcError::NothingToPayout(owner_id));
        }
        let payee_m = self._load_ready_payee(owner_id).await?;
        let t_now = Local::now().to_utc();
        let poid = generate_custom_uid(app_meta::MACHINE_CODE)
            .simple()
            .to_string();
        let mut payout_m = PayoutModel::try_from((owner_id, commissions, poid, t_now))
            .map_err(PayoutRunUcError::CorruptedCommission)?;
        self.repo_po.create_payout(&payout_m).await.map_err(|e| {
            if matches!(e.code, AppErrorCode::AcquireLockFailure) {
                PayoutRunUcError::PayoutLockRace
            } else {
                PayoutRunUcError::DataStoreError(e)
            }
        })?;
        let transfer_result = self
            .processors
            .transfer(
                &payee_m,
                payout_m.amount(),
                payout_m.currency(),
                payout_m.id(),
            )
            .await;
        match transfer_result {
            Ok(r) => {
                payout_m.complete(r.transfer_ref.as_str(), Local::now().to_utc());
                self.repo_po.complete_payout(&payout_m).await?;
            }
            Err(e) => {
                let logctx_p = &self.logctx;
                app_log_event!(
                    logctx_p,
                    AppLogLevel::WARNING,
                    "transfer-failure, owner:{owner_id}, payout:{}, {:?}",
                    payout_m.id(),
                    e
                );
                let reason = format!("{:?}:{:?}", e.fn_label, e.reason);
                payout_m.fail(reason.as_str());
                self.repo_po.fail_payout(&payout_m).await?;
            }
        }
        // a failed transfer is still a completed run, the response body
        // carries the reason and the released members stay pending
        Ok(PayoutRespDto::from(&payout_m))
    } // end of fn execute

    async fn _load_ready_payee(&self, owner_id: u32) -> Result<PayeeProfileModel, PayoutRunUcError> {
        let saved = self
            .repo_pe
            .fetch(owner_id)
            .await?
            .ok_or(PayoutRunUcError::PayeeNotReady(owner_id))?;
        let payee_m = if saved.stale(Local::now().to_utc()) {
            self._refresh_payee(owner_id, saved).await?
        } else {
            saved
        };
        if payee_m.can_receive_transfer() {
            Ok(payee_m)
        } else {
            Err(PayoutRunUcError::PayeeNotReady(owner_id))
        }
    }

    async fn _refresh_payee(
        &self,
        owner_id: u32,
        saved: PayeeProfileModel,
    ) -> Result<PayeeProfileModel, PayoutRunUcError> {
        match self.processors.refresh_payee_account(saved).await {
            Ok(refreshed) => {
                self.repo_pe.create_or_update(&refreshed).await?;
                Ok(refreshed)
            }
            Err(e) => {
                let logctx_p = &self.logctx;
                app_log_event!(
                    logctx_p,
                    AppLogLevel::WARNING,
                    "payee-refresh-failure, owner:{owner_id}, {:?}",
                    e
                );
                // the stale copy on record still drives the readiness check
                self.repo_pe
                    .fetch(owner_id)
                    .await?
                    .ok_or(PayoutRunUcError::PayeeNotReady(owner_id))
            }
        }
    }
} // end of impl PayoutRunUseCase
