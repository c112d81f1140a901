use std::collections::HashMap;

use chrono::DateTime;
use serde::{Deserialize, Serialize};

use tripmarket_common::api::dto::CountryCode;

use super::super::AppProcessorErrorReason;
use crate::model::{
    Payee3partyStripeModel, StripeAccountCapabilityModel, StripeAccountCapableState,
};

#[derive(Serialize)]
pub(super) struct IntentMetadata {
    pub booking_kind: String,
    pub booking_id: String,
}

#[derive(Serialize)]
pub(super) struct AutoPaymentMethods {
    pub enabled: bool,
}

#[derive(Serialize)]
pub(super) struct CreatePaymentIntent {
    pub amount: i64, // in the smallest indivisible unit of the given currency
    pub currency: String,
    pub metadata: IntentMetadata,
    pub automatic_payment_methods: AutoPaymentMethods,
}

#[derive(Deserialize)]
pub(super) struct PaymentIntent {
    pub id: String,
    pub client_secret: Option<String>,
    pub amount: i64,
    pub currency: String,
    pub created: i64,
    pub metadata: HashMap<String, String>,
}

#[derive(Serialize)]
pub(super) struct CreateTransfer {
    pub amount: i64,
    pub currency: String,
    pub destination: String, // identifier of the payee connected account
    pub transfer_group: String,
}

#[derive(Deserialize)]
pub(super) struct TransferCreated {
    pub id: String,
    pub created: i64,
}

#[derive(Deserialize)]
pub(super) struct AccountToSacceptance {
    pub date: Option<i64>,
}

#[derive(Deserialize)]
pub(super) struct ConnectAccount {
    pub id: String,
    pub country: String,
    pub email: Option<String>,
    // absent until the capability has been requested for the account
    pub capabilities: Option<StripeAccountCapabilityModel>,
    pub tos_acceptance: Option<AccountToSacceptance>,
    pub charges_enabled: bool,
    pub payouts_enabled: bool,
    pub details_submitted: bool,
    pub created: i64,
}

#[derive(Deserialize)]
pub(super) struct EventData {
    pub object: serde_json::Value,
}

#[derive(Deserialize)]
pub(super) struct EventEnvelope {
    #[serde(rename = "type")]
    pub evt_type: String,
    pub data: EventData,
}

impl TryFrom<ConnectAccount> for Payee3partyStripeModel {
    type Error = AppProcessorErrorReason;
    fn try_from(value: ConnectAccount) -> Result<Self, Self::Error> {
        let created = DateTime::from_timestamp(value.created, 0).ok_or(
            AppProcessorErrorReason::CorruptedTimeStamp(
                "account-create-time".to_string(),
                value.created,
            ),
        )?;
        let tos_accepted = match value.tos_acceptance.and_then(|t| t.date) {
            Some(d) => {
                let parsed = DateTime::from_timestamp(d, 0).ok_or(
                    AppProcessorErrorReason::CorruptedTimeStamp("account-tos-date".to_string(), d),
                )?;
                Some(parsed)
            }
            None => None,
        };
        let capabilities = value.capabilities.unwrap_or(StripeAccountCapabilityModel {
            transfers: StripeAccountCapableState::inactive,
        });
        Ok(Self {
            id: value.id,
            country: CountryCode::from(value.country),
            email: value.email,
            capabilities,
            tos_accepted,
            charges_enabled: value.charges_enabled,
            payouts_enabled: value.payouts_enabled,
            details_submitted: value.details_submitted,
            created,
        })
    }
} // end of impl ConnectAccount
