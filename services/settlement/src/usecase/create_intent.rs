use std::boxed::Box;
use std::sync::Arc;

use crate::adapter::cache::{AbstractBookingSyncLockCache, BookingSyncLockError};
use crate::adapter::processor::{
    AbstractPaymentProcessor, AppProcessorError, AppProcessorErrorReason, AppProcessorIntentResult,
};
use crate::adapter::repository::{AbstractBookingRepo, AppRepoError};
use crate::api::web::dto::PaymentIntentRespDto;
use crate::model::{BookingModel, PaymentState};

pub enum PaymentIntentUcError {
    BookingNotFound,
    OwnerMismatch,                 // only the payer may start the payment, 403
    AlreadyFinalized(PaymentState),
    LockCacheError,
    CreateIntentConflict, // another request holds the lock, client retries, 429
    IntentConflict(String),
    GatewayUnavailable(AppProcessorError),
    ExternalProcessorError(AppProcessorError),
    DataStoreError(AppRepoError),
}

impl From<BookingSyncLockError> for PaymentIntentUcError {
    fn from(_value: BookingSyncLockError) -> Self {
        Self::LockCacheError
    }
}
impl From<AppRepoError> for PaymentIntentUcError {
    fn from(value: AppRepoError) -> Self {
        Self::DataStoreError(value)
    }
}
impl From<AppProcessorError> for PaymentIntentUcError {
    fn from(value: AppProcessorError) -> Self {
        if matches!(&value.reason, AppProcessorErrorReason::LowLvlNet(_)) {
            Self::GatewayUnavailable(value)
        } else if let AppProcessorErrorReason::IntentConflict(detail) = value.reason {
            Self::IntentConflict(detail)
        } else {
            Self::ExternalProcessorError(value)
        }
    }
}

pub struct PaymentIntentUseCase {
    pub processors: Arc<Box<dyn AbstractPaymentProcessor>>,
    pub bksync_lockset: Arc<Box<dyn AbstractBookingSyncLockCache>>,
    pub repo: Box<dyn AbstractBookingRepo>,
}

impl PaymentIntentUseCase {
    pub async fn execute(
        &self,
        usr_id: u32,
        booking_id: String,
    ) -> Result<PaymentIntentRespDto, PaymentIntentUcError> {
        let booking_m = self
            .repo
            .fetch(booking_id.as_str())
            .await?
            .ok_or(PaymentIntentUcError::BookingNotFound)?;
        if !booking_m.payer_match(usr_id) {
            return Err(PaymentIntentUcError::OwnerMismatch);
        }
        if booking_m.settled() {
            return Err(PaymentIntentUcError::AlreadyFinalized(
                booking_m.payment_state(),
            ));
        }
        let result = if let Some(known_ref) = booking_m.intent_ref() {
            self._retrieve_known_intent(&booking_m, known_ref).await?
        } else {
            self._create_intent_locked(usr_id, &booking_m).await?
        };
        Ok(PaymentIntentRespDto::from(result))
    } // end of fn execute

    async fn _retrieve_known_intent(
        &self,
        booking_m: &BookingModel,
        known_ref: &str,
    ) -> Result<AppProcessorIntentResult, PaymentIntentUcError> {
        let result = self.processors.retrieve_intent(known_ref).await?;
        let matched = result
            .booking_ref
            .as_ref()
            .map(|r| r.booking_id.as_str() == booking_m.id())
            .unwrap_or(false);
        if matched {
            Ok(result)
        } else {
            Err(PaymentIntentUcError::IntentConflict(result.intent_ref))
        }
    }

    async fn _create_intent_locked(
        &self,
        usr_id: u32,
        booking_m: &BookingModel,
    ) -> Result<AppProcessorIntentResult, PaymentIntentUcError> {
        let success = self.bksync_lockset.acquire(usr_id, booking_m.id()).await?;
        if success {
            let out = self._create_intent(booking_m).await;
            self.bksync_lockset.release(usr_id, booking_m.id()).await?;
            out
        } else {
            Err(PaymentIntentUcError::CreateIntentConflict)
        }
    }

    async fn _create_intent(
        &self,
        booking_m: &BookingModel,
    ) -> Result<AppProcessorIntentResult, PaymentIntentUcError> {
        let result = self.processors.create_or_retrieve_intent(booking_m).await?;
        let applied = self
            .repo
            .store_intent_ref(booking_m.id(), result.intent_ref.as_str())
            .await?;
        if applied {
            Ok(result)
        } else {
            // a concurrent request persisted its reference first, the
            // stored one wins so every caller keeps seeing one intent
            let winner = self
                .repo
                .fetch(booking_m.id())
                .await?
                .and_then(|m| m.intent_ref().map(|r| r.to_string()))
                .ok_or(PaymentIntentUcError::CreateIntentConflict)?;
            let result = self.processors.retrieve_intent(winner.as_str()).await?;
            Ok(result)
        }
    }
} // end of impl PaymentIntentUseCase
