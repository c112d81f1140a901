use chrono::{Duration, Local, NaiveDate};
use rust_decimal::Decimal;

use tripmarket_common::api::dto::CurrencyDto;
use tripmarket_common::constant::BookableKind;

use settlement::api::web::dto::BookingReqDto;
use settlement::hard_limit;
use settlement::model::{
    BookableItemSnapshot, BookingModel, BookingModelError, BookingPeriodModel, BookingStatus,
    PaymentState,
};

use super::ut_default_booking;

fn ut_period(start: (i32, u32, u32), end: (i32, u32, u32)) -> BookingPeriodModel {
    BookingPeriodModel {
        start: NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap(),
        end: NaiveDate::from_ymd_opt(end.0, end.1, end.2).unwrap(),
    }
}

fn ut_booking_req(
    date_offsets: (i64, i64),
    amount: &str,
    currency: CurrencyDto,
) -> BookingReqDto {
    let today = Local::now().to_utc().date_naive();
    BookingReqDto {
        kind: BookableKind::Hotel,
        item_id: 881007u64,
        date_start: today + Duration::days(date_offsets.0),
        date_end: today + Duration::days(date_offsets.1),
        amount: amount.to_string(),
        currency,
    }
}

fn ut_item_snapshot(owner_id: Option<u32>) -> BookableItemSnapshot {
    BookableItemSnapshot {
        kind: BookableKind::Hotel,
        item_id: 881007u64,
        owner_id,
        active: true,
        price_hint: Some(Decimal::new(12000, 2)),
    }
}

#[test]
fn period_create_ok() {
    let today = NaiveDate::from_ymd_opt(2025, 7, 14).unwrap();
    let start = NaiveDate::from_ymd_opt(2025, 7, 18).unwrap();
    let end = NaiveDate::from_ymd_opt(2025, 7, 21).unwrap();
    let result = BookingPeriodModel::try_from((start, end, today));
    assert!(result.is_ok());
    if let Ok(v) = result {
        assert_eq!(v.num_nights(), 3i64);
    }
    // check-in on the current day is still acceptable
    let result = BookingPeriodModel::try_from((today, end, today));
    assert!(result.is_ok());
}

#[test]
fn period_create_inverted() {
    let today = NaiveDate::from_ymd_opt(2025, 7, 14).unwrap();
    let start = NaiveDate::from_ymd_opt(2025, 7, 21).unwrap();
    let end = NaiveDate::from_ymd_opt(2025, 7, 18).unwrap();
    let result = BookingPeriodModel::try_from((start, end, today));
    assert!(result.is_err());
    if let Err(e) = result {
        let cond = matches!(e, BookingModelError::PeriodInverted(_s, _e));
        assert!(cond);
    }
    // a zero-night stay is meaningless to every vertical
    let result = BookingPeriodModel::try_from((start, start, today));
    assert!(result.is_err());
    if let Err(e) = result {
        let cond = matches!(e, BookingModelError::PeriodInverted(_s, _e));
        assert!(cond);
    }
}

#[test]
fn period_create_begins_past() {
    let today = Local::now().to_utc().date_naive();
    let start = today - Duration::days(1);
    let end = today + Duration::days(1);
    let result = BookingPeriodModel::try_from((start, end, today));
    assert!(result.is_err());
    if let Err(e) = result {
        if let BookingModelError::PeriodBeginsPast(given, reported_today) = e {
            assert_eq!(given, start);
            assert_eq!(reported_today, today);
        } else {
            assert!(false);
        }
    }
}

#[test]
fn period_create_exceeds_span_limit() {
    let today = Local::now().to_utc().date_naive();
    let start = today + Duration::days(2);
    let end = start + Duration::days(hard_limit::MAX_BOOKING_SPAN_DAYS + 1);
    let result = BookingPeriodModel::try_from((start, end, today));
    assert!(result.is_err());
    if let Err(e) = result {
        if let BookingModelError::PeriodTooLong(num_days, limit) = e {
            assert_eq!(num_days, hard_limit::MAX_BOOKING_SPAN_DAYS + 1);
            assert_eq!(limit, hard_limit::MAX_BOOKING_SPAN_DAYS);
        } else {
            assert!(false);
        }
    }
    // right on the limit is still acceptable
    let end = start + Duration::days(hard_limit::MAX_BOOKING_SPAN_DAYS);
    let result = BookingPeriodModel::try_from((start, end, today));
    assert!(result.is_ok());
}

#[rustfmt::skip]
#[test]
fn period_overlap_half_open() {
    let saved = ut_period((2025, 7, 10), (2025, 7, 13));
    // back-to-back stays share the turnover day without conflict
    let touching_after = ut_period((2025, 7, 13), (2025, 7, 16));
    assert!(!saved.overlaps(&touching_after));
    assert!(!touching_after.overlaps(&saved));
    let touching_before = ut_period((2025, 7, 7), (2025, 7, 10));
    assert!(!saved.overlaps(&touching_before));
    let crossing = ut_period((2025, 7, 12), (2025, 7, 14));
    assert!(saved.overlaps(&crossing));
    assert!(crossing.overlaps(&saved));
    let contained = ut_period((2025, 7, 11), (2025, 7, 12));
    assert!(saved.overlaps(&contained));
    let identical = ut_period((2025, 7, 10), (2025, 7, 13));
    assert!(saved.overlaps(&identical));
}

#[test]
fn convert_from_request_ok() {
    let mock_payer_id = 1411u32;
    let req = ut_booking_req((4, 7), "480.50", CurrencyDto::USD);
    let snapshot = ut_item_snapshot(Some(920));
    let t_now = Local::now().to_utc();
    let arg = (
        mock_payer_id,
        req,
        snapshot,
        "ut-booking-a0b1".to_string(),
        t_now,
    );
    let result = BookingModel::try_from(arg);
    assert!(result.is_ok());
    if let Ok(v) = result {
        assert_eq!(v.id(), "ut-booking-a0b1");
        assert_eq!(v.payer_id(), mock_payer_id);
        assert_eq!(v.owner_id(), Some(920));
        assert_eq!(v.amount().to_string().as_str(), "480.50");
        assert_eq!(v.currency(), CurrencyDto::USD);
        assert_eq!(v.status(), BookingStatus::Pending);
        assert_eq!(v.payment_state(), PaymentState::Pending);
        assert!(v.intent_ref().is_none());
        assert!(v.confirmed_time().is_none());
        assert_eq!(v.period().num_nights(), 3i64);
    }
} // end of fn convert_from_request_ok

#[rustfmt::skip]
#[test]
fn convert_from_request_amount_error() {
    let mock_payer_id = 1411u32;
    let t_now = Local::now().to_utc();
    let cases: [(&str, CurrencyDto); 4] = [
        ("48o.5", CurrencyDto::USD),
        ("0.00", CurrencyDto::USD),
        ("-102.44", CurrencyDto::USD),
        ("10.005", CurrencyDto::USD),
    ];
    let mut results = cases.into_iter().map(|(amount, currency)| {
        let req = ut_booking_req((4, 7), amount, currency);
        let snapshot = ut_item_snapshot(Some(920));
        let arg = (mock_payer_id, req, snapshot, "ut-bk-amt".to_string(), t_now);
        BookingModel::try_from(arg)
    });
    let cond = matches!(results.next().unwrap(), Err(BookingModelError::AmountParse(_)));
    assert!(cond);
    let cond = matches!(results.next().unwrap(), Err(BookingModelError::AmountNotPositive(_)));
    assert!(cond);
    let cond = matches!(results.next().unwrap(), Err(BookingModelError::AmountNotPositive(_)));
    assert!(cond);
    let cond = matches!(results.next().unwrap(), Err(BookingModelError::AmountPrecision(3, 2)));
    assert!(cond);
} // end of fn convert_from_request_amount_error

#[test]
fn convert_from_request_currency_unknown() {
    let mock_payer_id = 1411u32;
    let req = ut_booking_req((4, 7), "480.50", CurrencyDto::Unknown);
    let snapshot = ut_item_snapshot(Some(920));
    let t_now = Local::now().to_utc();
    let arg = (mock_payer_id, req, snapshot, "ut-bk-cur".to_string(), t_now);
    let result = BookingModel::try_from(arg);
    assert!(result.is_err());
    if let Err(e) = result {
        let cond = matches!(e, BookingModelError::CurrencyNotSupport(CurrencyDto::Unknown));
        assert!(cond);
    }
}

#[test]
fn convert_from_request_period_error() {
    let mock_payer_id = 1411u32;
    let t_now = Local::now().to_utc();
    // the stay would have started yesterday
    let req = ut_booking_req((-1, 1), "480.50", CurrencyDto::USD);
    let snapshot = ut_item_snapshot(Some(920));
    let arg = (mock_payer_id, req, snapshot, "ut-bk-pd0".to_string(), t_now);
    let result = BookingModel::try_from(arg);
    assert!(result.is_err());
    if let Err(e) = result {
        let cond = matches!(e, BookingModelError::PeriodBeginsPast(_s, _t));
        assert!(cond);
    }
    let req = ut_booking_req((7, 4), "480.50", CurrencyDto::USD);
    let snapshot = ut_item_snapshot(Some(920));
    let arg = (mock_payer_id, req, snapshot, "ut-bk-pd1".to_string(), t_now);
    let result = BookingModel::try_from(arg);
    assert!(result.is_err());
    if let Err(e) = result {
        let cond = matches!(e, BookingModelError::PeriodInverted(_s, _e));
        assert!(cond);
    }
} // end of fn convert_from_request_period_error

#[rustfmt::skip]
#[test]
fn lifecycle_state_check() {
    let c = |status: BookingStatus, paystate: PaymentState| {
        ut_default_booking("ut-bk-lc", 1411, Some(920), (48050i64, 2u32), status, paystate)
    };
    assert!(c(BookingStatus::Pending, PaymentState::Pending).cancellable());
    assert!(c(BookingStatus::Confirmed, PaymentState::Paid).cancellable());
    assert!(!c(BookingStatus::Cancelled, PaymentState::Failed).cancellable());
    assert!(!c(BookingStatus::Completed, PaymentState::Paid).cancellable());
    assert!(!c(BookingStatus::Pending, PaymentState::Pending).settled());
    assert!(c(BookingStatus::Confirmed, PaymentState::Paid).settled());
    assert!(c(BookingStatus::Cancelled, PaymentState::Failed).settled());
}

#[test]
fn status_label_roundtrip() {
    let statuses = [
        BookingStatus::Pending,
        BookingStatus::Confirmed,
        BookingStatus::Cancelled,
        BookingStatus::Completed,
    ];
    statuses.into_iter().for_each(|s| {
        let readback = BookingStatus::try_from(s.label()).unwrap();
        assert_eq!(readback, s);
    });
    let result = BookingStatus::try_from("REFUNDED");
    assert!(result.is_err());
    let paystates = [PaymentState::Pending, PaymentState::Paid, PaymentState::Failed];
    paystates.into_iter().for_each(|p| {
        let readback = PaymentState::try_from(p.label()).unwrap();
        assert_eq!(readback, p);
    });
}
