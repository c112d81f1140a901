mod client;
mod mock;
mod resources;

use std::boxed::Box;
use std::collections::HashMap;
use std::result::Result;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderName, HeaderValue};
use hyper::Method;
use regex::Regex;
use rust_decimal::Decimal;
use serde::Deserialize;
use sha2::Sha256;
use tokio_native_tls::{native_tls, TlsConnector as TlsConnectorWrapper};

use tripmarket_common::api::dto::CurrencyDto;
use tripmarket_common::confidentiality::AbstractConfidentiality;
use tripmarket_common::constant::BookableKind;
use tripmarket_common::logging::AppLogContext;
use tripmarket_common::util::hex_to_octet;

use self::client::AppStripeClient;
pub(super) use self::mock::MockProcessorStripeCtx;
use self::resources::{
    AutoPaymentMethods, ConnectAccount, CreatePaymentIntent, CreateTransfer, EventEnvelope,
    IntentMetadata, PaymentIntent, TransferCreated,
};
use super::{
    AppProcessorErrorReason, AppProcessorIntentResult, AppProcessorTransferResult, BaseClientError,
    PaymentEventKind, PaymentEventModel,
};
use crate::hard_limit;
use crate::model::{BookingModel, BookingRefModel, Payee3partyStripeModel};

const HEADER_NAME_IDEMPOTENCY: &str = "Idempotency-Key";
const EVENT_TYPE_INTENT_SUCCEEDED: &str = "payment_intent.succeeded";
const EVENT_TYPE_INTENT_FAILED: &str = "payment_intent.payment_failed";
const METADATA_KEY_BOOKING_KIND: &str = "booking_kind";
const METADATA_KEY_BOOKING_ID: &str = "booking_id";
const SIGNATURE_HEADER_PATTERN: &str = r"^t=(\d{1,12}),v1=([0-9a-f]{64})$";

#[async_trait]
pub(super) trait AbstStripeContext: Send + Sync {
    async fn create_or_retrieve_intent(
        &self,
        booking_m: &BookingModel,
    ) -> Result<AppProcessorIntentResult, AppProcessorErrorReason>;

    async fn retrieve_intent(
        &self,
        intent_ref: &str,
    ) -> Result<AppProcessorIntentResult, AppProcessorErrorReason>;

    async fn transfer(
        &self,
        acct: &Payee3partyStripeModel,
        amount: Decimal,
        currency: CurrencyDto,
        payout_id: &str,
    ) -> Result<AppProcessorTransferResult, AppProcessorErrorReason>;

    fn parse_webhook(
        &self,
        raw_payload: &[u8],
        sig_header: &str,
    ) -> Result<PaymentEventModel, AppProcessorErrorReason>;

    async fn refresh_payee_account(
        &self,
        acct: &Payee3partyStripeModel,
    ) -> Result<Payee3partyStripeModel, AppProcessorErrorReason>;
} // end of trait AbstStripeContext

#[derive(Deserialize)]
struct StripeCredential {
    api_key: String,
    webhook_secret: String,
}

pub(super) struct AppProcessorStripeCtx {
    host: String,
    port: u16,
    secure_connector: TlsConnectorWrapper,
    api_key: String,
    webhook_secret: String,
    logctx: Arc<AppLogContext>,
}

fn amount_to_smallest_unit(
    amount: Decimal,
    currency: &CurrencyDto,
) -> Result<i64, AppProcessorErrorReason> {
    let mut rescaled = amount;
    rescaled.rescale(currency.amount_fraction_scale());
    i64::try_from(rescaled.mantissa())
        .map_err(|_e| AppProcessorErrorReason::InvalidAmount(amount.to_string()))
}

fn amount_from_smallest_unit(smallest: i64, currency: &CurrencyDto) -> Decimal {
    Decimal::new(smallest, currency.amount_fraction_scale())
}

fn datetime_from_epoch(label: &str, epoch: i64) -> Result<DateTime<Utc>, AppProcessorErrorReason> {
    DateTime::from_timestamp(epoch, 0).ok_or(AppProcessorErrorReason::CorruptedTimeStamp(
        label.to_string(),
        epoch,
    ))
}

fn booking_ref_from_metadata(metadata: &HashMap<String, String>) -> Option<BookingRefModel> {
    let kind = metadata
        .get(METADATA_KEY_BOOKING_KIND)
        .and_then(|v| BookableKind::from_str(v.as_str()).ok())?;
    let booking_id = metadata.get(METADATA_KEY_BOOKING_ID)?.clone();
    Some(BookingRefModel { kind, booking_id })
}

fn intent_to_result(
    intent: PaymentIntent,
) -> Result<AppProcessorIntentResult, AppProcessorErrorReason> {
    let currency = CurrencyDto::from(&intent.currency.to_uppercase());
    let amount = amount_from_smallest_unit(intent.amount, &currency);
    let create_time = datetime_from_epoch("intent-create-time", intent.created)?;
    let booking_ref = booking_ref_from_metadata(&intent.metadata);
    Ok(AppProcessorIntentResult {
        intent_ref: intent.id,
        client_token: intent.client_secret,
        amount,
        currency,
        booking_ref,
        create_time,
    })
}

impl AppProcessorStripeCtx {
    pub(super) fn try_build(
        host: &str,
        port: u16,
        confidential_path: &str,
        cfdntl: Arc<Box<dyn AbstractConfidentiality>>,
        logctx: Arc<AppLogContext>,
    ) -> Result<Box<dyn AbstStripeContext>, AppProcessorErrorReason> {
        let serial = cfdntl
            .try_get_payload(confidential_path)
            .map_err(|_e| AppProcessorErrorReason::MissingCredential)?;
        let credential = serde_json::from_str::<StripeCredential>(serial.as_str())
            .map_err(|_e| AppProcessorErrorReason::CredentialCorrupted)?;
        let secure_connector = {
            let mut builder = native_tls::TlsConnector::builder();
            builder.min_protocol_version(Some(native_tls::Protocol::Tlsv12));
            let c = builder
                .build()
                .map_err(|e| BaseClientError { reason: e.into() })?;
            c.into()
        };
        let obj = Self {
            host: host.to_string(),
            port,
            secure_connector,
            api_key: credential.api_key,
            webhook_secret: credential.webhook_secret,
            logctx,
        };
        Ok(Box::new(obj))
    } // end of fn try-build

    async fn _new_client(
        &self,
    ) -> Result<AppStripeClient<Full<Bytes>>, AppProcessorErrorReason> {
        AppStripeClient::<Full<Bytes>>::try_build(
            self.logctx.clone(),
            &self.secure_connector,
            self.host.clone(),
            self.port,
            self.api_key.clone(),
        )
        .await
        .map_err(AppProcessorErrorReason::from)
    }

    fn verify_signature(
        &self,
        raw_payload: &[u8],
        sig_header: &str,
        t_now: i64,
    ) -> Result<(), AppProcessorErrorReason> {
        let pattern = Regex::new(SIGNATURE_HEADER_PATTERN)
            .map_err(|e| AppProcessorErrorReason::InvalidSignature(e.to_string()))?;
        let capture = pattern.captures(sig_header).ok_or(
            AppProcessorErrorReason::InvalidSignature("malformed-header".to_string()),
        )?;
        let (ts_serial, digest_serial) = (capture[1].to_string(), capture[2].to_string());
        let ts = ts_serial.parse::<i64>().map_err(|_e| {
            AppProcessorErrorReason::InvalidSignature("timestamp-parse".to_string())
        })?;
        if (t_now - ts).abs() > hard_limit::SECONDS_WEBHOOK_TOLERANCE {
            let detail = "timestamp-out-of-tolerance".to_string();
            return Err(AppProcessorErrorReason::InvalidSignature(detail));
        }
        let expect = hex_to_octet(digest_serial.as_str())
            .map_err(|(_code, detail)| AppProcessorErrorReason::InvalidSignature(detail))?;
        let mut mac = Hmac::<Sha256>::new_from_slice(self.webhook_secret.as_bytes())
            .map_err(|e| AppProcessorErrorReason::InvalidSignature(e.to_string()))?;
        mac.update(ts_serial.as_bytes());
        mac.update(b".");
        mac.update(raw_payload);
        mac.verify_slice(expect.as_slice()).map_err(|_e| {
            AppProcessorErrorReason::InvalidSignature("digest-mismatch".to_string())
        })
    } // end of fn verify-signature

    fn check_intent_matches(
        booking_m: &BookingModel,
        result: &AppProcessorIntentResult,
    ) -> Result<(), AppProcessorErrorReason> {
        let ref_matched = result
            .booking_ref
            .as_ref()
            .map(|r| r.booking_id.as_str() == booking_m.id())
            .unwrap_or(false);
        let numbers_matched =
            result.amount == booking_m.amount() && result.currency == booking_m.currency();
        if ref_matched && numbers_matched {
            Ok(())
        } else {
            Err(AppProcessorErrorReason::IntentConflict(
                result.intent_ref.clone(),
            ))
        }
    }
} // end of impl AppProcessorStripeCtx

#[async_trait]
impl AbstStripeContext for AppProcessorStripeCtx {
    async fn create_or_retrieve_intent(
        &self,
        booking_m: &BookingModel,
    ) -> Result<AppProcessorIntentResult, AppProcessorErrorReason> {
        let amount = amount_to_smallest_unit(booking_m.amount(), &booking_m.currency())?;
        let body_obj = CreatePaymentIntent {
            amount,
            currency: booking_m.currency().to_string().to_lowercase(),
            metadata: IntentMetadata {
                booking_kind: booking_m.item().kind.as_label().to_string(),
                booking_id: booking_m.id().to_string(),
            },
            automatic_payment_methods: AutoPaymentMethods { enabled: true },
        };
        let mut _client = self._new_client().await?;
        let hdrs = vec![(
            // header-name from-static does not allow uppercase word
            HeaderName::from_bytes(HEADER_NAME_IDEMPOTENCY.as_bytes()).unwrap(),
            HeaderValue::from_str(booking_m.id()).unwrap(),
        )];
        let resp = _client
            .execute_form::<PaymentIntent, CreatePaymentIntent>(
                "/payment_intents",
                Method::POST,
                &body_obj,
                hdrs,
            )
            .await
            .map_err(AppProcessorErrorReason::from)?;
        let result = intent_to_result(resp)?;
        Self::check_intent_matches(booking_m, &result)?;
        Ok(result)
    } // end of fn create-or-retrieve-intent

    async fn retrieve_intent(
        &self,
        intent_ref: &str,
    ) -> Result<AppProcessorIntentResult, AppProcessorErrorReason> {
        let mut _client = self._new_client().await?;
        let path = format!("/payment_intents/{intent_ref}");
        let resp = _client
            .execute::<PaymentIntent>(path.as_str(), Method::GET, Vec::new())
            .await
            .map_err(AppProcessorErrorReason::from)?;
        intent_to_result(resp)
    }

    async fn transfer(
        &self,
        acct: &Payee3partyStripeModel,
        amount: Decimal,
        currency: CurrencyDto,
        payout_id: &str,
    ) -> Result<AppProcessorTransferResult, AppProcessorErrorReason> {
        let amount_smallest = amount_to_smallest_unit(amount, &currency)?;
        let body_obj = CreateTransfer {
            amount: amount_smallest,
            currency: currency.to_string().to_lowercase(),
            destination: acct.id.clone(),
            transfer_group: payout_id.to_string(),
        };
        let mut _client = self._new_client().await?;
        let hdrs = vec![(
            HeaderName::from_bytes(HEADER_NAME_IDEMPOTENCY.as_bytes()).unwrap(),
            HeaderValue::from_str(payout_id).unwrap(),
        )];
        let resp = _client
            .execute_form::<TransferCreated, CreateTransfer>(
                "/transfers",
                Method::POST,
                &body_obj,
                hdrs,
            )
            .await
            .map_err(AppProcessorErrorReason::from)?;
        let create_time = datetime_from_epoch("transfer-create-time", resp.created)?;
        Ok(AppProcessorTransferResult {
            transfer_ref: resp.id,
            create_time,
        })
    } // end of fn transfer

    fn parse_webhook(
        &self,
        raw_payload: &[u8],
        sig_header: &str,
    ) -> Result<PaymentEventModel, AppProcessorErrorReason> {
        self.verify_signature(raw_payload, sig_header, Utc::now().timestamp())?;
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
        let booking_ref = booking_ref_from_metadata(&intent.metadata);
        Ok(PaymentEventModel {
            kind,
            intent_ref: intent.id,
            booking_ref,
        })
    } // end of fn parse-webhook

    async fn refresh_payee_account(
        &self,
        acct: &Payee3partyStripeModel,
    ) -> Result<Payee3partyStripeModel, AppProcessorErrorReason> {
        let mut _client = self._new_client().await?;
        let path = format!("/accounts/{}", acct.id.as_str());
        let resp = _client
            .execute::<ConnectAccount>(path.as_str(), Method::GET, Vec::new())
            .await
            .map_err(AppProcessorErrorReason::from)?;
        Payee3partyStripeModel::try_from(resp)
    }
} // end of impl AppProcessorStripeCtx
