use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tripmarket_common::api::dto::CountryCode;

#[allow(non_camel_case_types)]
#[derive(Serialize, Deserialize)]
pub enum StripeAccountCapableState {
    active,
    inactive,
    pending,
}

#[derive(Serialize, Deserialize)]
pub struct StripeAccountCapabilityModel {
    pub transfers: StripeAccountCapableState,
}

#[derive(Serialize, Deserialize)]
pub struct Payee3partyStripeModel {
    // map to connected account in Stripe platform
    pub id: String,
    pub country: CountryCode,
    pub email: Option<String>,
    pub capabilities: StripeAccountCapabilityModel,
    pub tos_accepted: Option<DateTime<Utc>>,
    pub charges_enabled: bool,
    pub payouts_enabled: bool,
    pub details_submitted: bool,
    pub created: DateTime<Utc>,
}

impl Payee3partyStripeModel {
    pub(super) fn can_receive_transfer(&self) -> bool {
        let tx_active = matches!(
            self.capabilities.transfers,
            StripeAccountCapableState::active
        );
        self.payouts_enabled && self.tos_accepted.is_some() && tx_active
    }
}
