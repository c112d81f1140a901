use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use tripmarket_common::api::dto::CurrencyDto;
use tripmarket_common::error::AppErrorCode;

use super::{CommissionModel, CommissionStatus};

#[derive(Debug)]
pub enum PayoutModelError {
    NoCommission,
    CurrencyMix(CurrencyDto, CurrencyDto),
    MemberNotPending(String),
    MemberAlreadyAssigned(String),
    OwnerInconsistent(u32, u32),
    AmountOverflow,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PayoutStatus {
    Processing,
    Succeeded,
    Failed,
}

impl PayoutStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Processing => "PROCESSING",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
        }
    }
}
impl<'a> TryFrom<&'a str> for PayoutStatus {
    type Error = (AppErrorCode, String);
    fn try_from(value: &'a str) -> Result<Self, Self::Error> {
        match value {
            "PROCESSING" => Ok(Self::Processing),
            "SUCCEEDED" => Ok(Self::Succeeded),
            "FAILED" => Ok(Self::Failed),
            _others => Err((
                AppErrorCode::DataCorruption,
                format!("payout-status: {value}"),
            )),
        }
    }
}

// aggregates pending commissions of one owner into a single transfer,
// all members have to share one currency
pub struct PayoutModel {
    id: String,
    owner_id: u32,
    amount: Decimal,
    currency: CurrencyDto,
    status: PayoutStatus,
    transfer_ref: Option<String>,
    processed_time: Option<DateTime<Utc>>,
    failure_reason: Option<String>,
    create_time: DateTime<Utc>,
    members: Vec<CommissionModel>,
}

#[rustfmt::skip]
pub type PayoutPartsArgs = (
    String, u32, Decimal, CurrencyDto, PayoutStatus, Option<String>,
    Option<DateTime<Utc>>, Option<String>, DateTime<Utc>, Vec<CommissionModel>,
);

impl TryFrom<(u32, Vec<CommissionModel>, String, DateTime<Utc>)> for PayoutModel {
    type Error = PayoutModelError;

    fn try_from(
        value: (u32, Vec<CommissionModel>, String, DateTime<Utc>),
    ) -> Result<Self, Self::Error> {
        let (owner_id, mut members, id, t_now) = value;
        let first = members.first().ok_or(PayoutModelError::NoCommission)?;
        let currency = first.currency();
        let mut amount = Decimal::ZERO;
        for m in members.iter() {
            if m.owner_id() != owner_id {
                return Err(PayoutModelError::OwnerInconsistent(owner_id, m.owner_id()));
            }
            if !matches!(m.status(), CommissionStatus::Pending) {
                return Err(PayoutModelError::MemberNotPending(m.id().to_string()));
            }
            if m.payout_id().is_some() {
                return Err(PayoutModelError::MemberAlreadyAssigned(m.id().to_string()));
            }
            let c = m.currency();
            if c != currency {
                return Err(PayoutModelError::CurrencyMix(currency, c));
            }
            amount = amount
                .checked_add(m.amount())
                .ok_or(PayoutModelError::AmountOverflow)?;
        }
        members
            .iter_mut()
            .for_each(|m| m.assign_payout(id.as_str()));
        Ok(Self {
            id,
            owner_id,
            amount,
            currency,
            status: PayoutStatus::Processing,
            transfer_ref: None,
            processed_time: None,
            failure_reason: None,
            create_time: t_now,
            members,
        })
    } // end of fn try-from
} // end of impl TryFrom for PayoutModel

impl PayoutModel {
    pub fn id(&self) -> &str {
        self.id.as_str()
    }
    pub fn owner_id(&self) -> u32 {
        self.owner_id
    }
    pub fn amount(&self) -> Decimal {
        self.amount
    }
    pub fn currency(&self) -> CurrencyDto {
        self.currency.clone()
    }
    pub fn status(&self) -> PayoutStatus {
        self.status.clone()
    }
    pub fn transfer_ref(&self) -> Option<&str> {
        self.transfer_ref.as_deref()
    }
    pub fn processed_time(&self) -> Option<DateTime<Utc>> {
        self.processed_time
    }
    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }
    pub fn create_time(&self) -> DateTime<Utc> {
        self.create_time
    }
    pub fn members(&self) -> &[CommissionModel] {
        self.members.as_slice()
    }
    pub fn member_ids(&self) -> Vec<String> {
        self.members.iter().map(|m| m.id().to_string()).collect()
    }

    // all members record the same transfer reference and processed time
    // as the payout they belong to
    pub(crate) fn complete(&mut self, transfer_ref: &str, t_now: DateTime<Utc>) {
        self.status = PayoutStatus::Succeeded;
        self.transfer_ref = Some(transfer_ref.to_string());
        self.processed_time = Some(t_now);
        self.members
            .iter_mut()
            .for_each(|m| m.settle(transfer_ref, t_now));
    }
    // members return to the pending pool, a later payout run picks them
    // up again
    pub(crate) fn fail(&mut self, reason: &str) {
        self.status = PayoutStatus::Failed;
        self.failure_reason = Some(reason.to_string());
        self.members.iter_mut().for_each(|m| m.release_payout());
    }

    #[rustfmt::skip]
    pub fn into_parts(self) -> PayoutPartsArgs {
        let Self {
            id, owner_id, amount, currency, status, transfer_ref,
            processed_time, failure_reason, create_time, members,
        } = self;
        (
            id, owner_id, amount, currency, status, transfer_ref,
            processed_time, failure_reason, create_time, members,
        )
    }
    #[rustfmt::skip]
    pub fn from_parts(args: PayoutPartsArgs) -> Self {
        let (
            id, owner_id, amount, currency, status, transfer_ref,
            processed_time, failure_reason, create_time, members,
        ) = args;
        Self {
            id, owner_id, amount, currency, status, transfer_ref,
            processed_time, failure_reason, create_time, members,
        }
    }
} // end of impl PayoutModel
