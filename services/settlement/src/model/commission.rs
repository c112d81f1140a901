use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

use tripmarket_common::api::dto::CurrencyDto;
use tripmarket_common::error::AppErrorCode;

use super::BookingModel;
use crate::hard_limit;

#[derive(Debug)]
pub enum CommissionModelError {
    OwnerMissing(String),
    AmountNotPositive(Decimal),
    RateOutOfRange(Decimal),
    AmountOverflow(Decimal, Decimal),
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommissionStatus {
    Pending,
    Processed,
    // written only by manual reconciliation, the settlement flow itself
    // never marks a commission failed, a failed transfer releases the
    // members back to pending instead
    Failed,
}

impl CommissionStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Processed => "PROCESSED",
            Self::Failed => "FAILED",
        }
    }
}
impl<'a> TryFrom<&'a str> for CommissionStatus {
    type Error = (AppErrorCode, String);
    fn try_from(value: &'a str) -> Result<Self, Self::Error> {
        match value {
            "PENDING" => Ok(Self::Pending),
            "PROCESSED" => Ok(Self::Processed),
            "FAILED" => Ok(Self::Failed),
            _others => Err((
                AppErrorCode::DataCorruption,
                format!("commission-status: {value}"),
            )),
        }
    }
}

// one commission row per paid booking, the table keeps a unique key on
// `booking_id` so replayed gateway events cannot insert a second row
pub struct CommissionModel {
    id: String,
    booking_id: String,
    owner_id: u32,
    amount: Decimal,
    rate: Decimal,
    currency: CurrencyDto,
    status: CommissionStatus,
    payout_id: Option<String>,
    transfer_ref: Option<String>,
    processed_time: Option<DateTime<Utc>>,
    create_time: DateTime<Utc>,
}

#[rustfmt::skip]
pub type CommissionPartsArgs = (
    String, String, u32, Decimal, Decimal, CurrencyDto, CommissionStatus,
    Option<String>, Option<String>, Option<DateTime<Utc>>, DateTime<Utc>,
);

impl TryFrom<(&BookingModel, String, DateTime<Utc>)> for CommissionModel {
    type Error = CommissionModelError;

    fn try_from(value: (&BookingModel, String, DateTime<Utc>)) -> Result<Self, Self::Error> {
        let (booking, id, t_now) = value;
        let owner_id = booking
            .owner_id()
            .ok_or_else(|| CommissionModelError::OwnerMissing(booking.id().to_string()))?;
        let rate = Self::platform_rate();
        let currency = booking.currency();
        let amount = Self::estimate(booking.amount(), rate, &currency)?;
        Ok(Self {
            id,
            booking_id: booking.id().to_string(),
            owner_id,
            amount,
            rate,
            currency,
            status: CommissionStatus::Pending,
            payout_id: None,
            transfer_ref: None,
            processed_time: None,
            create_time: t_now,
        })
    }
} // end of impl TryFrom for CommissionModel

impl CommissionModel {
    pub fn platform_rate() -> Decimal {
        Decimal::new(hard_limit::COMMISSION_RATE_BASIS_POINTS, 4)
    }

    /// amount owed to the platform for one paid booking, rounded
    /// half-away-from-zero to the fraction scale of the currency
    pub fn estimate(
        amount: Decimal,
        rate: Decimal,
        currency: &CurrencyDto,
    ) -> Result<Decimal, CommissionModelError> {
        if amount <= Decimal::ZERO {
            return Err(CommissionModelError::AmountNotPositive(amount));
        }
        if rate <= Decimal::ZERO || rate >= Decimal::ONE {
            return Err(CommissionModelError::RateOutOfRange(rate));
        }
        let product = amount
            .checked_mul(rate)
            .ok_or(CommissionModelError::AmountOverflow(amount, rate))?;
        let scale = currency.amount_fraction_scale();
        Ok(product.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero))
    }

    pub fn id(&self) -> &str {
        self.id.as_str()
    }
    pub fn booking_id(&self) -> &str {
        self.booking_id.as_str()
    }
    pub fn owner_id(&self) -> u32 {
        self.owner_id
    }
    pub fn amount(&self) -> Decimal {
        self.amount
    }
    pub fn rate(&self) -> Decimal {
        self.rate
    }
    pub fn currency(&self) -> CurrencyDto {
        self.currency.clone()
    }
    pub fn status(&self) -> CommissionStatus {
        self.status.clone()
    }
    pub fn payout_id(&self) -> Option<&str> {
        self.payout_id.as_deref()
    }
    pub fn transfer_ref(&self) -> Option<&str> {
        self.transfer_ref.as_deref()
    }
    pub fn processed_time(&self) -> Option<DateTime<Utc>> {
        self.processed_time
    }
    pub fn create_time(&self) -> DateTime<Utc> {
        self.create_time
    }

    pub(crate) fn assign_payout(&mut self, payout_id: &str) {
        self.payout_id = Some(payout_id.to_string());
    }
    pub(crate) fn settle(&mut self, transfer_ref: &str, t_now: DateTime<Utc>) {
        self.status = CommissionStatus::Processed;
        self.transfer_ref = Some(transfer_ref.to_string());
        self.processed_time = Some(t_now);
    }
    pub(crate) fn release_payout(&mut self) {
        self.payout_id = None;
    }

    #[rustfmt::skip]
    pub fn into_parts(self) -> CommissionPartsArgs {
        let Self {
            id, booking_id, owner_id, amount, rate, currency, status,
            payout_id, transfer_ref, processed_time, create_time,
        } = self;
        (
            id, booking_id, owner_id, amount, rate, currency, status,
            payout_id, transfer_ref, processed_time, create_time,
        )
    }
    #[rustfmt::skip]
    pub fn from_parts(args: CommissionPartsArgs) -> Self {
        let (
            id, booking_id, owner_id, amount, rate, currency, status,
            payout_id, transfer_ref, processed_time, create_time,
        ) = args;
        Self {
            id, booking_id, owner_id, amount, rate, currency, status,
            payout_id, transfer_ref, processed_time, create_time,
        }
    }
} // end of impl CommissionModel
