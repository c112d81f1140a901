use std::boxed::Box;
use std::sync::Arc;

use chrono::Local;

use tripmarket_common::logging::{app_log_event, AppLogContext, AppLogLevel};

use crate::adapter::processor::{
    AbstractPaymentProcessor, AppProcessorError, AppProcessorErrorReason, PaymentEventKind,
    PaymentEventModel,
};
use crate::adapter::repository::{AbstractBookingRepo, AppRepoError};
use crate::model::{BookingModel, BookingStatus, CommissionModel, PaymentState};
use crate::{app_meta, generate_custom_uid};

pub enum PaymentSettleUcError {
    // the raw payload must never reach any state transition when its
    // signature cannot be verified
    InvalidSignature(String),
    MalformedPayload(String),
    EventUnsupported(String),
    // events which cannot be attributed to a saved booking are logged
    // then acknowledged, the gateway must not keep resending them
    BookingNotFound(String),
    CorruptedBooking(String),
    ReconciliationFailed(AppRepoError),
    ExternalProcessorError(AppProcessorError),
}

impl From<AppProcessorError> for PaymentSettleUcError {
    fn from(value: AppProcessorError) -> Self {
        let fn_label = value.fn_label;
        match value.reason {
            AppProcessorErrorReason::InvalidSignature(d) => Self::InvalidSignature(d),
            AppProcessorErrorReason::CorruptedTimeStamp(label, given) => {
                Self::InvalidSignature(format!("{label}:{given}"))
            }
            AppProcessorErrorReason::MalformedPayload(d) => Self::MalformedPayload(d),
            AppProcessorErrorReason::EventTypeUnsupported(t) => Self::EventUnsupported(t),
            reason => Self::ExternalProcessorError(AppProcessorError { reason, fn_label }),
        }
    }
}

pub struct PaymentSettleUseCase {
    pub processors: Arc<Box<dyn AbstractPaymentProcessor>>,
    pub repo: Box<dyn AbstractBookingRepo>,
    pub logctx: Arc<AppLogContext>,
}

impl PaymentSettleUseCase {
    pub async fn execute(
        &self,
        raw_payload: &[u8],
        sig_header: &str,
    ) -> Result<(), PaymentSettleUcError> {
        let event = self.processors.parse_webhook(raw_payload, sig_header)?;
        let booking_m = self._load_settled_booking(&event).await?;
        match event.kind {
            PaymentEventKind::Succeeded => self._apply_succeeded(&booking_m).await,
            PaymentEventKind::Failed => self._apply_failed(&booking_m).await,
        }
    } // end of fn execute

    async fn _load_settled_booking(
        &self,
        event: &PaymentEventModel,
    ) -> Result<BookingModel, PaymentSettleUcError> {
        let logctx_p = &self.logctx;
        let bkref = event.booking_ref.as_ref().ok_or_else(|| {
            app_log_event!(
                logctx_p,
                AppLogLevel::WARNING,
                "missing-booking-metadata, intent:{}",
                event.intent_ref
            );
            PaymentSettleUcError::BookingNotFound(event.intent_ref.clone())
        })?;
        let booking_m = self
            .repo
            .fetch(bkref.booking_id.as_str())
            .await
            .map_err(PaymentSettleUcError::ReconciliationFailed)?
            .ok_or_else(|| {
                app_log_event!(
                    logctx_p,
                    AppLogLevel::WARNING,
                    "unknown-booking:{}, intent:{}",
                    bkref.booking_id,
                    event.intent_ref
                );
                PaymentSettleUcError::BookingNotFound(event.intent_ref.clone())
            })?;
        // an intent reference saved for the booking has to match the one
        // carried by the event, a booking whose reference is still unsaved
        // accepts the event, the metadata already proves the linkage
        if let Some(known_ref) = booking_m.intent_ref() {
            if known_ref != event.intent_ref.as_str() {
                app_log_event!(
                    logctx_p,
                    AppLogLevel::WARNING,
                    "intent-mismatch, booking:{}, known:{}, event:{}",
                    booking_m.id(),
                    known_ref,
                    event.intent_ref
                );
                return Err(PaymentSettleUcError::BookingNotFound(
                    event.intent_ref.clone(),
                ));
            }
        }
        Ok(booking_m)
    } // end of fn _load_settled_booking

    async fn _apply_succeeded(&self, booking_m: &BookingModel) -> Result<(), PaymentSettleUcError> {
        let logctx_p = &self.logctx;
        if matches!(booking_m.payment_state(), PaymentState::Paid) {
            app_log_event!(
                logctx_p,
                AppLogLevel::DEBUG,
                "duplicate-succeeded-event, booking:{}",
                booking_m.id()
            );
            return Ok(());
        }
        let t_now = Local::now().to_utc();
        // commission is recorded in the same transaction as the state
        // flip, a vertical without an assigned owner earns the platform
        // nothing for this booking
        let commission_m = if booking_m.owner_id().is_some() {
            let cid = generate_custom_uid(app_meta::MACHINE_CODE)
                .simple()
                .to_string();
            let c = CommissionModel::try_from((booking_m, cid, t_now))
                .map_err(|e| PaymentSettleUcError::CorruptedBooking(format!("{:?}", e)))?;
            Some(c)
        } else {
            None
        };
        let applied = self
            .repo
            .confirm_paid(booking_m.id(), t_now, commission_m)
            .await
            .map_err(PaymentSettleUcError::ReconciliationFailed)?;
        if !applied {
            app_log_event!(
                logctx_p,
                AppLogLevel::WARNING,
                "confirm-skipped, booking:{}, status:{:?}",
                booking_m.id(),
                booking_m.status()
            );
        }
        Ok(())
    } // end of fn _apply_succeeded

    async fn _apply_failed(&self, booking_m: &BookingModel) -> Result<(), PaymentSettleUcError> {
        let logctx_p = &self.logctx;
        if matches!(booking_m.status(), BookingStatus::Cancelled) {
            app_log_event!(
                logctx_p,
                AppLogLevel::DEBUG,
                "duplicate-failed-event, booking:{}",
                booking_m.id()
            );
            return Ok(());
        }
        let applied = self
            .repo
            .cancel_failed(booking_m.id())
            .await
            .map_err(PaymentSettleUcError::ReconciliationFailed)?;
        if !applied {
            app_log_event!(
                logctx_p,
                AppLogLevel::WARNING,
                "cancel-skipped, booking:{}, status:{:?}",
                booking_m.id(),
                booking_m.status()
            );
        }
        Ok(())
    }
} // end of impl PaymentSettleUseCase
