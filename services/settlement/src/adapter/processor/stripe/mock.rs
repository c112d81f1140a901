use std::boxed::Box;
use std::result::Result;

use async_trait::async_trait;
use chrono::Local;
use rust_decimal::Decimal;

use tripmarket_common::api::dto::CurrencyDto;
use tripmarket_common::constant::BookableKind;

use crate::model::{
    BookingModel, BookingRefModel, Payee3partyStripeModel, StripeAccountCapabilityModel,
    StripeAccountCapableState,
};

use super::super::{
    AppProcessorErrorReason, AppProcessorIntentResult, AppProcessorTransferResult,
    PaymentEventKind, PaymentEventModel,
};
use super::resources::{EventEnvelope, PaymentIntent};
use super::{AbstStripeContext, EVENT_TYPE_INTENT_FAILED, EVENT_TYPE_INTENT_SUCCEEDED};

// TODO, conditional compilation for test
pub(crate) struct MockProcessorStripeCtx;

impl MockProcessorStripeCtx {
    pub(crate) fn build() -> Box<dyn AbstStripeContext> {
        Box::new(Self)
    }
}

#[async_trait]
impl AbstStripeContext for MockProcessorStripeCtx {
    async fn create_or_retrieve_intent(
        &self,
        booking_m: &BookingModel,
    ) -> Result<AppProcessorIntentResult, AppProcessorErrorReason> {
        let booking_ref = BookingRefModel {
            kind: booking_m.item().kind.clone(),
            booking_id: booking_m.id().to_string(),
        };
        let result = AppProcessorIntentResult {
            intent_ref: format!("pi_mock{}", booking_m.id()),
            client_token: Some("mock-client-session-seq".to_string()),
            amount: booking_m.amount(),
            currency: booking_m.currency(),
            booking_ref: Some(booking_ref),
            create_time: booking_m.create_time(),
        };
        Ok(result)
    }

    async fn retrieve_intent(
        &self,
        intent_ref: &str,
    ) -> Result<AppProcessorIntentResult, AppProcessorErrorReason> {
        let booking_id = intent_ref.strip_prefix("pi_mock").unwrap_or("").to_string();
        let booking_ref = BookingRefModel {
            kind: BookableKind::Unknown(0),
            booking_id,
        };
        let result = AppProcessorIntentResult {
            intent_ref: intent_ref.to_string(),
            client_token: Some("mock-client-session-seq".to_string()),
            amount: Decimal::ZERO,
            currency: CurrencyDto::Unknown,
            booking_ref: Some(booking_ref),
            create_time: Local::now().to_utc(),
        };
        Ok(result)
    }

    async fn transfer(
        &self,
        _acct: &Payee3partyStripeModel,
        _amount: Decimal,
        _currency: CurrencyDto,
        payout_id: &str,
    ) -> Result<AppProcessorTransferResult, AppProcessorErrorReason> {
        Ok(AppProcessorTransferResult {
            transfer_ref: format!("tr_mock{payout_id}"),
            create_time: Local::now().to_utc(),
        })
    }

    fn parse_webhook(
        &self,
        raw_payload: &[u8],
        _sig_header: &str,
    ) -> Result<PaymentEventModel, AppProcessorErrorReason> {
        let envelope = serde_json::from_slice::<EventEnvelope>(raw_payload)
            .map_err(|e| AppProcessorErrorReason::MalformedPayload(e.to_string()))?;
        let kind = match envelope.evt_type.as_str() {
            EVENT_TYPE_INTENT_SUCCEEDED => PaymentEventKind::Succeeded,
            EVENT_TYPE_INTENT_FAILED => PaymentEventKind::Failed,
            _others => {
                return Err(AppProcessorErrorReason::EventTypeUnsupported(
                    envelope.evt_type,
                ))
            }
        };
        let intent = serde_json::from_value::<PaymentIntent>(envelope.data.object)
            .map_err(|e| AppProcessorErrorReason::MalformedPayload(e.to_string()))?;
        let booking_ref = super::booking_ref_from_metadata(&intent.metadata);
        Ok(PaymentEventModel {
            kind,
            intent_ref: intent.id,
            booking_ref,
        })
    }

    async fn refresh_payee_account(
        &self,
        acct: &Payee3partyStripeModel,
    ) -> Result<Payee3partyStripeModel, AppProcessorErrorReason> {
        let t_now = Local::now().to_utc();
        let capabilities = StripeAccountCapabilityModel {
            transfers: StripeAccountCapableState::active,
        };
        let refreshed = Payee3partyStripeModel {
            id: acct.id.clone(),
            country: acct.country.clone(),
            email: acct.email.clone(),
            capabilities,
            tos_accepted: Some(t_now),
            charges_enabled: true,
            payouts_enabled: true,
            details_submitted: true,
            created: acct.created,
        };
        Ok(refreshed)
    }
} // end of impl MockProcessorStripeCtx
