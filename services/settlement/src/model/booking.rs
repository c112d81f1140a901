use std::result::Result;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

use tripmarket_common::api::dto::CurrencyDto;
use tripmarket_common::constant::BookableKind;
use tripmarket_common::error::AppErrorCode;

use super::BookableItemSnapshot;
use crate::api::web::dto::BookingReqDto;
use crate::hard_limit;

#[derive(Debug)]
pub enum BookingModelError {
    PeriodInverted(NaiveDate, NaiveDate),
    PeriodBeginsPast(NaiveDate, NaiveDate),
    PeriodTooLong(i64, i64),
    CurrencyNotSupport(CurrencyDto),
    AmountParse(String),
    AmountNotPositive(Decimal),
    AmountPrecision(u32, u32),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BookableItemRef {
    pub kind: BookableKind,
    pub item_id: u64,
}

// identifies the booking which a payment gateway event settles, both
// fields are restored from metadata attached to the payment intent
#[derive(Debug, Clone)]
pub struct BookingRefModel {
    pub kind: BookableKind,
    pub booking_id: String,
}

#[derive(Clone)]
pub struct BookingPeriodModel {
    pub start: NaiveDate,
    pub end: NaiveDate,
} // the period is half-open, check-out day never blocks the next customer

impl TryFrom<(NaiveDate, NaiveDate, NaiveDate)> for BookingPeriodModel {
    type Error = BookingModelError;
    fn try_from(value: (NaiveDate, NaiveDate, NaiveDate)) -> Result<Self, Self::Error> {
        let (start, end, today) = value;
        let span = (end - start).num_days();
        if start >= end {
            Err(BookingModelError::PeriodInverted(start, end))
        } else if start < today {
            Err(BookingModelError::PeriodBeginsPast(start, today))
        } else if span > hard_limit::MAX_BOOKING_SPAN_DAYS {
            Err(BookingModelError::PeriodTooLong(
                span,
                hard_limit::MAX_BOOKING_SPAN_DAYS,
            ))
        } else {
            Ok(Self { start, end })
        }
    }
}

impl BookingPeriodModel {
    pub fn num_nights(&self) -> i64 {
        (self.end - self.start).num_days()
    }
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PaymentState {
    Pending,
    Paid,
    Failed,
}

impl BookingStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::Cancelled => "CANCELLED",
            Self::Completed => "COMPLETED",
        }
    }
}
impl<'a> TryFrom<&'a str> for BookingStatus {
    type Error = (AppErrorCode, String);
    fn try_from(value: &'a str) -> Result<Self, Self::Error> {
        match value {
            "PENDING" => Ok(Self::Pending),
            "CONFIRMED" => Ok(Self::Confirmed),
            "CANCELLED" => Ok(Self::Cancelled),
            "COMPLETED" => Ok(Self::Completed),
            _others => Err((
                AppErrorCode::DataCorruption,
                format!("booking-status: {value}"),
            )),
        }
    }
}

impl PaymentState {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Paid => "PAID",
            Self::Failed => "FAILED",
        }
    }
}
impl<'a> TryFrom<&'a str> for PaymentState {
    type Error = (AppErrorCode, String);
    fn try_from(value: &'a str) -> Result<Self, Self::Error> {
        match value {
            "PENDING" => Ok(Self::Pending),
            "PAID" => Ok(Self::Paid),
            "FAILED" => Ok(Self::Failed),
            _others => Err((
                AppErrorCode::DataCorruption,
                format!("payment-state: {value}"),
            )),
        }
    }
}

pub struct BookingModel {
    id: String,
    payer_id: u32,
    item: BookableItemRef,
    // owner is snapshotted at booking time, a vertical which has not
    // assigned one yet leaves this column null
    owner_id: Option<u32>,
    period: BookingPeriodModel,
    amount: Decimal,
    currency: CurrencyDto,
    status: BookingStatus,
    payment_state: PaymentState,
    intent_ref: Option<String>,
    confirmed_time: Option<DateTime<Utc>>,
    create_time: DateTime<Utc>,
}

#[rustfmt::skip]
pub type BookingPartsArgs = (
    String, u32, BookableItemRef, Option<u32>, BookingPeriodModel,
    Decimal, CurrencyDto, BookingStatus, PaymentState,
    Option<String>, Option<DateTime<Utc>>, DateTime<Utc>,
);

type BookingCvtArgs = (
    u32,
    BookingReqDto,
    BookableItemSnapshot,
    String,
    DateTime<Utc>,
);

impl TryFrom<BookingCvtArgs> for BookingModel {
    type Error = BookingModelError;
    fn try_from(value: BookingCvtArgs) -> Result<Self, Self::Error> {
        let (payer_id, req, item_snap, id, t_now) = value;
        let period =
            BookingPeriodModel::try_from((req.date_start, req.date_end, t_now.date_naive()))?;
        if matches!(req.currency, CurrencyDto::Unknown) {
            return Err(BookingModelError::CurrencyNotSupport(req.currency));
        }
        let amount = Decimal::from_str(req.amount.as_str())
            .map_err(|_e| BookingModelError::AmountParse(req.amount.clone()))?;
        if amount <= Decimal::ZERO {
            return Err(BookingModelError::AmountNotPositive(amount));
        }
        let scale_limit = req.currency.amount_fraction_scale();
        if amount.scale() > scale_limit {
            return Err(BookingModelError::AmountPrecision(amount.scale(), scale_limit));
        }
        let item = BookableItemRef {
            kind: req.kind,
            item_id: req.item_id,
        };
        Ok(Self {
            id,
            payer_id,
            item,
            owner_id: item_snap.owner_id,
            period,
            amount,
            currency: req.currency,
            status: BookingStatus::Pending,
            payment_state: PaymentState::Pending,
            intent_ref: None,
            confirmed_time: None,
            create_time: t_now,
        })
    } // end of fn try-from
} // end of impl TryFrom for BookingModel

impl BookingModel {
    pub fn id(&self) -> &str {
        self.id.as_str()
    }
    pub fn payer_id(&self) -> u32 {
        self.payer_id
    }
    pub fn item(&self) -> &BookableItemRef {
        &self.item
    }
    pub fn owner_id(&self) -> Option<u32> {
        self.owner_id
    }
    pub fn period(&self) -> &BookingPeriodModel {
        &self.period
    }
    pub fn amount(&self) -> Decimal {
        self.amount
    }
    pub fn currency(&self) -> CurrencyDto {
        self.currency.clone()
    }
    pub fn status(&self) -> BookingStatus {
        self.status.clone()
    }
    pub fn payment_state(&self) -> PaymentState {
        self.payment_state.clone()
    }
    pub fn intent_ref(&self) -> Option<&str> {
        self.intent_ref.as_deref()
    }
    pub fn confirmed_time(&self) -> Option<DateTime<Utc>> {
        self.confirmed_time
    }
    pub fn create_time(&self) -> DateTime<Utc> {
        self.create_time
    }

    pub fn payer_match(&self, usr_id: u32) -> bool {
        self.payer_id == usr_id
    }
    // only these 2 states accept cancellation, all others are final
    pub fn cancellable(&self) -> bool {
        matches!(
            self.status,
            BookingStatus::Pending | BookingStatus::Confirmed
        )
    }
    pub fn settled(&self) -> bool {
        !matches!(self.payment_state, PaymentState::Pending)
    }

    #[rustfmt::skip]
    pub fn into_parts(self) -> BookingPartsArgs {
        let Self {
            id, payer_id, item, owner_id, period, amount, currency,
            status, payment_state, intent_ref, confirmed_time, create_time,
        } = self;
        (
            id, payer_id, item, owner_id, period, amount, currency,
            status, payment_state, intent_ref, confirmed_time, create_time,
        )
    }
    #[rustfmt::skip]
    pub fn from_parts(args: BookingPartsArgs) -> Self {
        let (
            id, payer_id, item, owner_id, period, amount, currency,
            status, payment_state, intent_ref, confirmed_time, create_time,
        ) = args;
        Self {
            id, payer_id, item, owner_id, period, amount, currency,
            status, payment_state, intent_ref, confirmed_time, create_time,
        }
    }
} // end of impl BookingModel
