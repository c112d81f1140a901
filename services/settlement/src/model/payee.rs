use chrono::{DateTime, Utc};

use super::external_processor::Payee3partyStripeModel;
use crate::hard_limit;

pub enum Payee3partyModel {
    Stripe(Payee3partyStripeModel),
    Unknown,
}

// owner account state mirrored from the payment gateway, refreshed
// lazily whenever a payout run finds it older than the stale window
pub struct PayeeProfileModel {
    pub(crate) owner_id: u32,
    pub(crate) last_update: DateTime<Utc>,
    pub(crate) threeparty: Payee3partyModel,
}

pub type PayeeProfilePartsArgs = (u32, DateTime<Utc>, Payee3partyModel);

impl PayeeProfileModel {
    pub fn into_parts(self) -> PayeeProfilePartsArgs {
        let Self {
            owner_id,
            last_update,
            threeparty,
        } = self;
        (owner_id, last_update, threeparty)
    }
    pub fn from_parts(args: PayeeProfilePartsArgs) -> Self {
        let (owner_id, last_update, threeparty) = args;
        Self {
            owner_id,
            last_update,
            threeparty,
        }
    }

    pub fn owner_id(&self) -> u32 {
        self.owner_id
    }
    pub fn last_update(&self) -> DateTime<Utc> {
        self.last_update
    }
    pub fn can_receive_transfer(&self) -> bool {
        match &self.threeparty {
            Payee3partyModel::Stripe(s) => s.can_receive_transfer(),
            Payee3partyModel::Unknown => false,
        }
    }
    pub fn stale(&self, t_now: DateTime<Utc>) -> bool {
        (t_now - self.last_update).num_seconds() > hard_limit::SECONDS_PAYEE_STATE_STALE
    }
    pub(crate) fn stripe_account(&self) -> Option<&Payee3partyStripeModel> {
        match &self.threeparty {
            Payee3partyModel::Stripe(s) => Some(s),
            Payee3partyModel::Unknown => None,
        }
    }
}
