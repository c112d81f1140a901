use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use tripmarket_common::api::dto::{
    jsn_serialize_bookable_kind, jsn_validate_bookable_kind, CurrencyDto,
};
use tripmarket_common::constant::BookableKind;

use crate::adapter::processor::AppProcessorIntentResult;
use crate::model::{
    BookingModel, BookingModelError, BookingStatus, CommissionModel, PaymentState, PayoutModel,
};

#[derive(Deserialize)]
pub struct BookingReqDto {
    #[serde(deserialize_with = "jsn_validate_bookable_kind")]
    pub kind: BookableKind,
    pub item_id: u64,
    pub date_start: NaiveDate,
    pub date_end: NaiveDate,
    // monetary values travel as strings, JSON floats would lose the
    // exact fraction digits on some amounts
    pub amount: String,
    pub currency: CurrencyDto,
}

#[derive(Deserialize)]
pub struct PayoutReqDto {
    pub owner_id: u32,
}

#[derive(Deserialize, Debug)]
pub struct ReportTimeRangeDto {
    pub start_after: DateTime<Utc>,
    pub end_before: DateTime<Utc>,
}

#[derive(Deserialize, Debug)]
pub struct ReportQueryDto {
    pub owner_id: Option<u32>,
    pub start_after: DateTime<Utc>,
    pub end_before: DateTime<Utc>,
}

impl ReportQueryDto {
    pub fn into_parts(self) -> (Option<u32>, ReportTimeRangeDto) {
        let Self {
            owner_id,
            start_after,
            end_before,
        } = self;
        let t_range = ReportTimeRangeDto {
            start_after,
            end_before,
        };
        (owner_id, t_range)
    }
}

#[derive(Serialize)]
pub struct BookingRespDto {
    pub booking_id: String,
    #[serde(serialize_with = "jsn_serialize_bookable_kind")]
    pub kind: BookableKind,
    pub item_id: u64,
    pub date_start: NaiveDate,
    pub date_end: NaiveDate,
    pub amount: String,
    pub currency: CurrencyDto,
    pub status: String,
    pub payment_state: String,
    pub create_time: DateTime<Utc>,
}

impl From<&BookingModel> for BookingRespDto {
    fn from(value: &BookingModel) -> Self {
        Self {
            booking_id: value.id().to_string(),
            kind: value.item().kind.clone(),
            item_id: value.item().item_id,
            date_start: value.period().start,
            date_end: value.period().end,
            amount: value.amount().to_string(),
            currency: value.currency(),
            status: value.status().label().to_string(),
            payment_state: value.payment_state().label().to_string(),
            create_time: value.create_time(),
        }
    }
}

#[derive(Serialize)]
pub struct BookingStatusRespDto {
    pub status: String,
    pub payment_state: String,
}

impl From<(BookingStatus, PaymentState)> for BookingStatusRespDto {
    fn from(value: (BookingStatus, PaymentState)) -> Self {
        Self {
            status: value.0.label().to_string(),
            payment_state: value.1.label().to_string(),
        }
    }
}

#[derive(Serialize)]
pub struct PaymentIntentRespDto {
    pub intent_ref: String,
    // handed over to the gateway SDK at frontend, never saved anywhere
    pub client_token: Option<String>,
    pub amount: String,
    pub currency: CurrencyDto,
    pub create_time: DateTime<Utc>,
}

impl From<AppProcessorIntentResult> for PaymentIntentRespDto {
    fn from(value: AppProcessorIntentResult) -> Self {
        Self {
            intent_ref: value.intent_ref,
            client_token: value.client_token,
            amount: value.amount.to_string(),
            currency: value.currency,
            create_time: value.create_time,
        }
    }
}

#[derive(Serialize)]
pub struct PayoutRespDto {
    pub payout_id: String,
    pub owner_id: u32,
    pub amount: String,
    pub currency: CurrencyDto,
    pub status: String,
    pub num_commissions: usize,
    pub transfer_ref: Option<String>,
    pub failure_reason: Option<String>,
    pub processed_time: Option<DateTime<Utc>>,
}

impl From<&PayoutModel> for PayoutRespDto {
    fn from(value: &PayoutModel) -> Self {
        Self {
            payout_id: value.id().to_string(),
            owner_id: value.owner_id(),
            amount: value.amount().to_string(),
            currency: value.currency(),
            status: value.status().label().to_string(),
            num_commissions: value.members().len(),
            transfer_ref: value.transfer_ref().map(|r| r.to_string()),
            failure_reason: value.failure_reason().map(|r| r.to_string()),
            processed_time: value.processed_time(),
        }
    }
}

#[derive(Serialize)]
pub struct CommissionReportRowDto {
    pub commission_id: String,
    pub booking_id: String,
    pub owner_id: u32,
    pub amount: String,
    pub rate: String,
    pub currency: CurrencyDto,
    pub status: String,
    pub payout_id: Option<String>,
    pub transfer_ref: Option<String>,
    pub processed_time: Option<DateTime<Utc>>,
    pub create_time: DateTime<Utc>,
}

impl From<&CommissionModel> for CommissionReportRowDto {
    fn from(value: &CommissionModel) -> Self {
        Self {
            commission_id: value.id().to_string(),
            booking_id: value.booking_id().to_string(),
            owner_id: value.owner_id(),
            amount: value.amount().to_string(),
            rate: value.rate().to_string(),
            currency: value.currency(),
            status: value.status().label().to_string(),
            payout_id: value.payout_id().map(|p| p.to_string()),
            transfer_ref: value.transfer_ref().map(|r| r.to_string()),
            processed_time: value.processed_time(),
            create_time: value.create_time(),
        }
    }
}

#[derive(Serialize)]
pub struct CommissionReportRespDto {
    pub rows: Vec<CommissionReportRowDto>,
}

impl From<Vec<CommissionModel>> for CommissionReportRespDto {
    fn from(value: Vec<CommissionModel>) -> Self {
        let rows = value.iter().map(CommissionReportRowDto::from).collect();
        Self { rows }
    }
}

#[derive(Serialize)]
pub struct PayoutReportRespDto {
    pub rows: Vec<PayoutRespDto>,
}

impl From<Vec<PayoutModel>> for PayoutReportRespDto {
    fn from(value: Vec<PayoutModel>) -> Self {
        let rows = value.iter().map(PayoutRespDto::from).collect();
        Self { rows }
    }
}

#[derive(Serialize)]
pub enum BookingItemErrorReason {
    NotFound,
    Unavailable,
}

#[derive(Serialize)]
pub enum BookingPeriodErrorDto {
    Inverted {
        date_start: NaiveDate,
        date_end: NaiveDate,
    },
    BeginsInPast {
        date_start: NaiveDate,
        today: NaiveDate,
    },
    TooLong {
        num_days: i64,
        limit: i64,
    },
}

#[derive(Serialize)]
pub enum BookingAmountErrorReason {
    Parse,
    NotPositive,
    PrecisionExceeded,
    CurrencyNotSupport,
}

#[derive(Serialize)]
pub struct BookingAmountErrorDto {
    pub reason: BookingAmountErrorReason,
    pub given: String,
}

#[derive(Serialize)]
pub struct BookingRespErrorDto {
    pub item: Option<BookingItemErrorReason>,
    pub period: Option<BookingPeriodErrorDto>,
    pub amount: Option<BookingAmountErrorDto>,
}

impl From<BookingModelError> for BookingRespErrorDto {
    fn from(value: BookingModelError) -> Self {
        let mut out = Self {
            item: None,
            period: None,
            amount: None,
        };
        match value {
            BookingModelError::PeriodInverted(date_start, date_end) => {
                out.period = Some(BookingPeriodErrorDto::Inverted {
                    date_start,
                    date_end,
                });
            }
            BookingModelError::PeriodBeginsPast(date_start, today) => {
                out.period = Some(BookingPeriodErrorDto::BeginsInPast { date_start, today });
            }
            BookingModelError::PeriodTooLong(num_days, limit) => {
                out.period = Some(BookingPeriodErrorDto::TooLong { num_days, limit });
            }
            BookingModelError::CurrencyNotSupport(c) => {
                out.amount = Some(BookingAmountErrorDto {
                    reason: BookingAmountErrorReason::CurrencyNotSupport,
                    given: c.to_string(),
                });
            }
            BookingModelError::AmountParse(raw) => {
                out.amount = Some(BookingAmountErrorDto {
                    reason: BookingAmountErrorReason::Parse,
                    given: raw,
                });
            }
            BookingModelError::AmountNotPositive(v) => {
                out.amount = Some(BookingAmountErrorDto {
                    reason: BookingAmountErrorReason::NotPositive,
                    given: v.to_string(),
                });
            }
            BookingModelError::AmountPrecision(scale, limit) => {
                out.amount = Some(BookingAmountErrorDto {
                    reason: BookingAmountErrorReason::PrecisionExceeded,
                    given: format!("scale:{scale}, limit:{limit}"),
                });
            }
        }
        out
    } // end of fn from
} // end of impl From for BookingRespErrorDto
