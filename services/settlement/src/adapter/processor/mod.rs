mod base_client;
mod stripe;

use std::boxed::Box;
use std::marker::{Send, Sync};
use std::result::Result;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use tripmarket_common::api::dto::CurrencyDto;
use tripmarket_common::confidentiality::AbstractConfidentiality;
use tripmarket_common::config::App3rdPartyCfg;
use tripmarket_common::logging::AppLogContext;

pub use self::base_client::{BaseClientError, BaseClientErrorReason};
use self::stripe::{AbstStripeContext, AppProcessorStripeCtx, MockProcessorStripeCtx};
use crate::model::{BookingModel, BookingRefModel, Payee3partyModel, PayeeProfileModel};

#[async_trait]
pub trait AbstractPaymentProcessor: Send + Sync {
    async fn create_or_retrieve_intent(
        &self,
        booking_m: &BookingModel,
    ) -> Result<AppProcessorIntentResult, AppProcessorError>;

    async fn retrieve_intent(
        &self,
        intent_ref: &str,
    ) -> Result<AppProcessorIntentResult, AppProcessorError>;

    async fn transfer(
        &self,
        payee_m: &PayeeProfileModel,
        amount: Decimal,
        currency: CurrencyDto,
        payout_id: &str,
    ) -> Result<AppProcessorTransferResult, AppProcessorError>;

    fn parse_webhook(
        &self,
        raw_payload: &[u8],
        sig_header: &str,
    ) -> Result<PaymentEventModel, AppProcessorError>;

    async fn refresh_payee_account(
        &self,
        payee_m: PayeeProfileModel,
    ) -> Result<PayeeProfileModel, AppProcessorError>;
} // end of trait AbstractPaymentProcessor

struct AppProcessorContext {
    _stripe: Box<dyn AbstStripeContext>,
    _logctx: Arc<AppLogContext>,
}

#[derive(Debug)]
pub enum AppProcessorErrorReason {
    InvalidConfig,
    MissingCredential,
    CredentialCorrupted,
    LowLvlNet(BaseClientError),
    InvalidMethod(String),
    InvalidAmount(String),
    InvalidSignature(String),
    EventTypeUnsupported(String),
    MalformedPayload(String),
    IntentConflict(String),
    CorruptedTimeStamp(String, i64), // label and given incorrect timestamp
}

#[derive(Debug)]
pub enum AppProcessorFnLabel {
    TryBuild,
    CreateIntent,
    RetrieveIntent,
    Transfer,
    ParseWebhook,
    RefreshPayeeAccount,
}

#[derive(Debug)]
pub struct AppProcessorError {
    pub reason: AppProcessorErrorReason,
    pub fn_label: AppProcessorFnLabel,
}

pub struct AppProcessorIntentResult {
    pub intent_ref: String,
    // one-time token the frontend hands over to the gateway SDK
    pub client_token: Option<String>,
    pub amount: Decimal,
    pub currency: CurrencyDto,
    pub booking_ref: Option<BookingRefModel>,
    pub create_time: DateTime<Utc>,
}

pub struct AppProcessorTransferResult {
    pub transfer_ref: String,
    pub create_time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PaymentEventKind {
    Succeeded,
    Failed,
}

#[derive(Debug)]
pub struct PaymentEventModel {
    pub kind: PaymentEventKind,
    pub intent_ref: String,
    pub booking_ref: Option<BookingRefModel>,
}

impl From<BaseClientError> for AppProcessorErrorReason {
    fn from(value: BaseClientError) -> Self {
        Self::LowLvlNet(value)
    }
}

impl AppProcessorContext {
    fn new(
        cfgs3pt: Vec<Arc<App3rdPartyCfg>>,
        cfdntl: Arc<Box<dyn AbstractConfidentiality>>,
        _logctx: Arc<AppLogContext>,
    ) -> Result<Self, AppProcessorError> {
        let mut errors = Vec::new();
        let mut result_stripe = None;
        cfgs3pt
            .into_iter()
            .map(|c| match c.as_ref() {
                App3rdPartyCfg::dev {
                    name,
                    host,
                    port,
                    confidentiality_path,
                } => {
                    if result_stripe.is_none() && name.as_str().to_lowercase() == "stripe" {
                        result_stripe = AppProcessorStripeCtx::try_build(
                            host.as_str(),
                            *port,
                            confidentiality_path.as_str(),
                            cfdntl.clone(),
                            _logctx.clone(),
                        )
                        .map_err(|e| errors.push(e))
                        .ok();
                    }
                }
                App3rdPartyCfg::test { name, data_src: _ } => {
                    if result_stripe.is_none() && name.as_str().to_lowercase() == "stripe" {
                        result_stripe = Some(MockProcessorStripeCtx::build());
                    }
                }
            })
            .count();
        if errors.is_empty() {
            if let Some(_stripe) = result_stripe {
                Ok(Self { _logctx, _stripe })
            } else {
                Err(AppProcessorError {
                    reason: AppProcessorErrorReason::InvalidConfig,
                    fn_label: AppProcessorFnLabel::TryBuild,
                })
            }
        } else {
            Err(AppProcessorError {
                reason: errors.remove(0),
                fn_label: AppProcessorFnLabel::TryBuild,
            })
        }
    } // end of fn new
} // end of impl AppProcessorContext

#[async_trait]
impl AbstractPaymentProcessor for AppProcessorContext {
    async fn create_or_retrieve_intent(
        &self,
        booking_m: &BookingModel,
    ) -> Result<AppProcessorIntentResult, AppProcessorError> {
        self._stripe
            .create_or_retrieve_intent(booking_m)
            .await
            .map_err(|reason| AppProcessorError {
                reason,
                fn_label: AppProcessorFnLabel::CreateIntent,
            })
    }

    async fn retrieve_intent(
        &self,
        intent_ref: &str,
    ) -> Result<AppProcessorIntentResult, AppProcessorError> {
        self._stripe
            .retrieve_intent(intent_ref)
            .await
            .map_err(|reason| AppProcessorError {
                reason,
                fn_label: AppProcessorFnLabel::RetrieveIntent,
            })
    }

    async fn transfer(
        &self,
        payee_m: &PayeeProfileModel,
        amount: Decimal,
        currency: CurrencyDto,
        payout_id: &str,
    ) -> Result<AppProcessorTransferResult, AppProcessorError> {
        let result = match payee_m.stripe_account() {
            Some(acct) => self._stripe.transfer(acct, amount, currency, payout_id).await,
            None => Err(AppProcessorErrorReason::InvalidMethod(
                "unknown".to_string(),
            )),
        };
        result.map_err(|reason| AppProcessorError {
            reason,
            fn_label: AppProcessorFnLabel::Transfer,
        })
    }

    fn parse_webhook(
        &self,
        raw_payload: &[u8],
        sig_header: &str,
    ) -> Result<PaymentEventModel, AppProcessorError> {
        self._stripe
            .parse_webhook(raw_payload, sig_header)
            .map_err(|reason| AppProcessorError {
                reason,
                fn_label: AppProcessorFnLabel::ParseWebhook,
            })
    }

    async fn refresh_payee_account(
        &self,
        payee_m: PayeeProfileModel,
    ) -> Result<PayeeProfileModel, AppProcessorError> {
        let result = match payee_m.stripe_account() {
            Some(acct) => {
                self._stripe
                    .refresh_payee_account(acct)
                    .await
                    .map(|refreshed| PayeeProfileModel {
                        owner_id: payee_m.owner_id(),
                        last_update: Utc::now(),
                        threeparty: Payee3partyModel::Stripe(refreshed),
                    })
            }
            None => Err(AppProcessorErrorReason::InvalidMethod(
                "unknown".to_string(),
            )),
        };
        result.map_err(|reason| AppProcessorError {
            reason,
            fn_label: AppProcessorFnLabel::RefreshPayeeAccount,
        })
    }
} // end of impl AppProcessorContext

pub(crate) fn app_processor_context(
    cfg_3pt: &Option<Vec<Arc<App3rdPartyCfg>>>,
    cfdntl: Arc<Box<dyn AbstractConfidentiality>>,
    logctx: Arc<AppLogContext>,
) -> Result<Box<dyn AbstractPaymentProcessor>, AppProcessorError> {
    let _cfg_3pt = cfg_3pt.as_ref().cloned().ok_or(AppProcessorError {
        reason: AppProcessorErrorReason::InvalidConfig,
        fn_label: AppProcessorFnLabel::TryBuild,
    })?;
    let proc = AppProcessorContext::new(_cfg_3pt, cfdntl, logctx)?;
    Ok(Box::new(proc))
}
