use chrono::{Duration, Local, NaiveDate};
use rust_decimal::Decimal;

use tripmarket_common::api::dto::CurrencyDto;
use tripmarket_common::constant::BookableKind;

use settlement::api::web::dto::{
    BookingReqDto, BookingRespErrorDto, PayoutRespDto, ReportQueryDto,
};
use settlement::model::BookingModelError;

#[test]
fn booking_req_deserialize_ok() {
    let raw = br#"{"kind":2, "item_id":881007, "date_start":"2026-10-05",
        "date_end":"2026-10-08", "amount":"448.50", "currency":"TWD"}"#;
    let result = serde_json::from_slice::<BookingReqDto>(raw);
    assert!(result.is_ok());
    if let Ok(req) = result {
        assert!(matches!(req.kind, BookableKind::Hotel));
        assert_eq!(req.item_id, 881007u64);
        let expect_start = NaiveDate::from_ymd_opt(2026, 10, 5).unwrap();
        let expect_end = NaiveDate::from_ymd_opt(2026, 10, 8).unwrap();
        assert_eq!(req.date_start, expect_start);
        assert_eq!(req.date_end, expect_end);
        assert_eq!(req.amount.as_str(), "448.50");
        assert_eq!(req.currency, CurrencyDto::TWD);
    }
}

#[test]
fn booking_req_reject_unknown_kind() {
    // the numeric code 9 maps to no bookable vertical
    let raw = br#"{"kind":9, "item_id":881007, "date_start":"2026-10-05",
        "date_end":"2026-10-08", "amount":"448.50", "currency":"TWD"}"#;
    let result = serde_json::from_slice::<BookingReqDto>(raw);
    assert!(result.is_err());
    if let Err(e) = result {
        let detail = e.to_string();
        assert!(detail.contains("invalid value"));
    }
}

#[test]
fn booking_resp_error_amount_parse() {
    let model_error = BookingModelError::AmountParse("4a8.5".to_string());
    let dto = BookingRespErrorDto::from(model_error);
    assert!(dto.item.is_none());
    assert!(dto.period.is_none());
    let serial = serde_json::to_string(&dto).unwrap();
    assert!(serial.contains(r#""reason":"Parse""#));
    assert!(serial.contains(r#""given":"4a8.5""#));
}

#[test]
fn booking_resp_error_period_inverted() {
    let date_start = NaiveDate::from_ymd_opt(2026, 10, 8).unwrap();
    let date_end = NaiveDate::from_ymd_opt(2026, 10, 5).unwrap();
    let model_error = BookingModelError::PeriodInverted(date_start, date_end);
    let dto = BookingRespErrorDto::from(model_error);
    assert!(dto.amount.is_none());
    let serial = serde_json::to_string(&dto).unwrap();
    assert!(serial.contains("Inverted"));
    assert!(serial.contains("2026-10-08"));
    assert!(serial.contains("2026-10-05"));
}

#[test]
fn booking_resp_error_amount_not_positive() {
    let model_error = BookingModelError::AmountNotPositive(Decimal::new(-250, 2));
    let dto = BookingRespErrorDto::from(model_error);
    let serial = serde_json::to_string(&dto).unwrap();
    assert!(serial.contains(r#""reason":"NotPositive""#));
    assert!(serial.contains("-2.50"));
}

#[test]
fn payout_resp_serialize_ok() {
    let t_now = Local::now().to_utc();
    let dto = PayoutRespDto {
        payout_id: "ut-po-dto-0".to_string(),
        owner_id: 920u32,
        amount: "75.50".to_string(),
        currency: CurrencyDto::USD,
        status: "SUCCEEDED".to_string(),
        num_commissions: 3usize,
        transfer_ref: Some("tr_ut_dto".to_string()),
        failure_reason: None,
        processed_time: Some(t_now),
    };
    let serial = serde_json::to_string(&dto).unwrap();
    assert!(serial.contains(r#""payout_id":"ut-po-dto-0""#));
    assert!(serial.contains(r#""currency":"USD""#));
    assert!(serial.contains(r#""num_commissions":3"#));
    assert!(serial.contains(r#""failure_reason":null"#));
}

#[test]
fn report_query_split_time_range() {
    let t_now = Local::now().to_utc();
    let query_m = ReportQueryDto {
        owner_id: Some(920u32),
        start_after: t_now - Duration::days(7),
        end_before: t_now,
    };
    let (owner_q, t_range) = query_m.into_parts();
    assert_eq!(owner_q, Some(920u32));
    assert!(t_range.start_after < t_range.end_before);
    assert_eq!(t_range.end_before, t_now);
}
