use std::boxed::Box;
use std::sync::{Arc, Mutex};

use tripmarket_common::constant::BookableKind;
use tripmarket_common::error::AppErrorCode;

use settlement::adapter::processor::{
    AppProcessorError, AppProcessorErrorReason, AppProcessorFnLabel, PaymentEventKind,
    PaymentEventModel,
};
use settlement::adapter::repository::{AppRepoError, AppRepoErrorDetail, AppRepoErrorFnLabel};
use settlement::model::{
    BookingModel, BookingRefModel, BookingStatus, CommissionModel, CommissionStatus, PaymentState,
};
use settlement::usecase::{PaymentSettleUcError, PaymentSettleUseCase};

use crate::model::ut_default_booking;
use crate::ut_setup_sharestate;

use super::{MockBookingRepo, MockPaymentProcessor};

fn ut_payment_event(
    kind: PaymentEventKind,
    intent_ref: &str,
    booking_id: Option<&str>,
) -> PaymentEventModel {
    PaymentEventModel {
        kind,
        intent_ref: intent_ref.to_string(),
        booking_ref: booking_id.map(|b| BookingRefModel {
            kind: BookableKind::Hotel,
            booking_id: b.to_string(),
        }),
    }
}

#[rustfmt::skip]
fn ut_settled_booking(
    bkid: &str,
    owner_id: Option<u32>,
    status: BookingStatus,
    paystate: PaymentState,
    intent_ref: Option<&str>,
) -> BookingModel {
    let b = ut_default_booking(bkid, 1411, owner_id, (40000i64, 2u32), status, paystate);
    let (
        id, payer, item, owner, period, amount, currency,
        st, ps, _intent, confirmed, created,
    ) = b.into_parts();
    BookingModel::from_parts((
        id, payer, item, owner, period, amount, currency, st, ps,
        intent_ref.map(|r| r.to_string()), confirmed, created,
    ))
}

#[rustfmt::skip]
fn ut_repo_for_settle(
    fetch: Option<Result<Option<BookingModel>, AppRepoError>>,
    confirm: Option<Result<bool, AppRepoError>>,
    cancel: Option<Result<bool, AppRepoError>>,
    confirm_cp: Arc<Mutex<Option<Option<CommissionModel>>>>,
) -> MockBookingRepo {
    MockBookingRepo {
        _create_result: Mutex::new(None),
        _fetch_result: Mutex::new(fetch),
        _fetch_again_result: Mutex::new(None),
        _fetch_status_result: Mutex::new(None),
        _overlap_result: Mutex::new(None),
        _mark_cancelled_result: Mutex::new(None),
        _store_intent_result: Mutex::new(None),
        _confirm_paid_result: Mutex::new(confirm),
        _confirm_paid_commission_cp: confirm_cp,
        _cancel_failed_result: Mutex::new(cancel),
    }
}

fn ut_processor_with_event(
    parsed: Result<PaymentEventModel, AppProcessorError>,
) -> MockPaymentProcessor {
    MockPaymentProcessor {
        _create_intent_result: Mutex::new(None),
        _retrieve_intent_result: Mutex::new(None),
        _transfer_result: Mutex::new(None),
        _parse_webhook_result: Mutex::new(Some(parsed)),
        _refresh_payee_result: Mutex::new(None),
    }
}

#[actix_web::test]
async fn succeeded_records_commission() {
    let mock_event = ut_payment_event(PaymentEventKind::Succeeded, "pi_ut_9", Some("ut-bk-stl-0"));
    let booking_m = ut_settled_booking(
        "ut-bk-stl-0",
        Some(920),
        BookingStatus::Pending,
        PaymentState::Pending,
        Some("pi_ut_9"),
    );
    let confirm_cp = Arc::new(Mutex::new(None));
    let mock_repo = ut_repo_for_settle(
        Some(Ok(Some(booking_m))),
        Some(Ok(true)),
        None,
        confirm_cp.clone(),
    );
    let uc = PaymentSettleUseCase {
        processors: Arc::new(Box::new(ut_processor_with_event(Ok(mock_event)))),
        repo: Box::new(mock_repo),
        logctx: ut_setup_sharestate().log_context(),
    };
    let result = uc.execute(b"ut-raw-payload", "t=0,v1=00").await;
    assert!(result.is_ok());
    let captured = confirm_cp.lock().unwrap().take();
    if let Some(Some(commission_m)) = captured {
        assert_eq!(commission_m.booking_id(), "ut-bk-stl-0");
        assert_eq!(commission_m.owner_id(), 920);
        assert_eq!(commission_m.amount().to_string().as_str(), "40.00");
        assert_eq!(commission_m.status(), CommissionStatus::Pending);
        assert!(commission_m.payout_id().is_none());
    } else {
        assert!(false);
    }
} // end of fn succeeded_records_commission

#[actix_web::test]
async fn succeeded_without_assigned_owner() {
    let mock_event = ut_payment_event(PaymentEventKind::Succeeded, "pi_ut_10", Some("ut-bk-stl-1"));
    // the intent reference is not saved yet, metadata alone settles it
    let booking_m = ut_settled_booking(
        "ut-bk-stl-1",
        None,
        BookingStatus::Pending,
        PaymentState::Pending,
        None,
    );
    let confirm_cp = Arc::new(Mutex::new(None));
    let mock_repo = ut_repo_for_settle(
        Some(Ok(Some(booking_m))),
        Some(Ok(true)),
        None,
        confirm_cp.clone(),
    );
    let uc = PaymentSettleUseCase {
        processors: Arc::new(Box::new(ut_processor_with_event(Ok(mock_event)))),
        repo: Box::new(mock_repo),
        logctx: ut_setup_sharestate().log_context(),
    };
    let result = uc.execute(b"ut-raw-payload", "t=0,v1=00").await;
    assert!(result.is_ok());
    let captured = confirm_cp.lock().unwrap().take();
    if let Some(commission_arg) = captured {
        assert!(commission_arg.is_none());
    } else {
        assert!(false);
    }
}

#[actix_web::test]
async fn duplicate_succeeded_event_noop() {
    let mock_event = ut_payment_event(PaymentEventKind::Succeeded, "pi_ut_11", Some("ut-bk-stl-2"));
    let booking_m = ut_settled_booking(
        "ut-bk-stl-2",
        Some(920),
        BookingStatus::Confirmed,
        PaymentState::Paid,
        Some("pi_ut_11"),
    );
    let confirm_cp = Arc::new(Mutex::new(None));
    let mock_repo = ut_repo_for_settle(Some(Ok(Some(booking_m))), None, None, confirm_cp.clone());
    let uc = PaymentSettleUseCase {
        processors: Arc::new(Box::new(ut_processor_with_event(Ok(mock_event)))),
        repo: Box::new(mock_repo),
        logctx: ut_setup_sharestate().log_context(),
    };
    let result = uc.execute(b"ut-raw-payload", "t=0,v1=00").await;
    assert!(result.is_ok());
    // the booking is already paid, nothing may reach the data store, a
    // second commission row would double-charge the owner
    let captured = confirm_cp.lock().unwrap().take();
    assert!(captured.is_none());
}

#[actix_web::test]
async fn failed_event_cancels_booking() {
    let mock_event = ut_payment_event(PaymentEventKind::Failed, "pi_ut_12", Some("ut-bk-stl-3"));
    let booking_m = ut_settled_booking(
        "ut-bk-stl-3",
        Some(920),
        BookingStatus::Pending,
        PaymentState::Pending,
        Some("pi_ut_12"),
    );
    let confirm_cp = Arc::new(Mutex::new(None));
    let mock_repo = ut_repo_for_settle(
        Some(Ok(Some(booking_m))),
        None,
        Some(Ok(true)),
        confirm_cp.clone(),
    );
    let uc = PaymentSettleUseCase {
        processors: Arc::new(Box::new(ut_processor_with_event(Ok(mock_event)))),
        repo: Box::new(mock_repo),
        logctx: ut_setup_sharestate().log_context(),
    };
    let result = uc.execute(b"ut-raw-payload", "t=0,v1=00").await;
    assert!(result.is_ok());
    let captured = confirm_cp.lock().unwrap().take();
    assert!(captured.is_none());
}

#[actix_web::test]
async fn duplicate_failed_event_noop() {
    let mock_event = ut_payment_event(PaymentEventKind::Failed, "pi_ut_13", Some("ut-bk-stl-4"));
    let booking_m = ut_settled_booking(
        "ut-bk-stl-4",
        Some(920),
        BookingStatus::Cancelled,
        PaymentState::Failed,
        Some("pi_ut_13"),
    );
    let confirm_cp = Arc::new(Mutex::new(None));
    let mock_repo = ut_repo_for_settle(Some(Ok(Some(booking_m))), None, None, confirm_cp.clone());
    let uc = PaymentSettleUseCase {
        processors: Arc::new(Box::new(ut_processor_with_event(Ok(mock_event)))),
        repo: Box::new(mock_repo),
        logctx: ut_setup_sharestate().log_context(),
    };
    let result = uc.execute(b"ut-raw-payload", "t=0,v1=00").await;
    assert!(result.is_ok());
}

#[actix_web::test]
async fn event_missing_booking_metadata() {
    let mock_event = ut_payment_event(PaymentEventKind::Succeeded, "pi_ut_14", None);
    let confirm_cp = Arc::new(Mutex::new(None));
    let mock_repo = ut_repo_for_settle(None, None, None, confirm_cp.clone());
    let uc = PaymentSettleUseCase {
        processors: Arc::new(Box::new(ut_processor_with_event(Ok(mock_event)))),
        repo: Box::new(mock_repo),
        logctx: ut_setup_sharestate().log_context(),
    };
    let result = uc.execute(b"ut-raw-payload", "t=0,v1=00").await;
    assert!(result.is_err());
    if let Err(e) = result {
        if let PaymentSettleUcError::BookingNotFound(intent_ref) = e {
            assert_eq!(intent_ref.as_str(), "pi_ut_14");
        } else {
            assert!(false);
        }
    }
}

#[actix_web::test]
async fn event_unknown_booking() {
    let mock_event = ut_payment_event(PaymentEventKind::Succeeded, "pi_ut_15", Some("ut-bk-ghost"));
    let confirm_cp = Arc::new(Mutex::new(None));
    let mock_repo = ut_repo_for_settle(Some(Ok(None)), None, None, confirm_cp.clone());
    let uc = PaymentSettleUseCase {
        processors: Arc::new(Box::new(ut_processor_with_event(Ok(mock_event)))),
        repo: Box::new(mock_repo),
        logctx: ut_setup_sharestate().log_context(),
    };
    let result = uc.execute(b"ut-raw-payload", "t=0,v1=00").await;
    assert!(result.is_err());
    if let Err(e) = result {
        let cond = matches!(e, PaymentSettleUcError::BookingNotFound(_));
        assert!(cond);
    }
}

#[actix_web::test]
async fn event_intent_mismatch() {
    let mock_event = ut_payment_event(PaymentEventKind::Succeeded, "pi_ut_16", Some("ut-bk-stl-5"));
    let booking_m = ut_settled_booking(
        "ut-bk-stl-5",
        Some(920),
        BookingStatus::Pending,
        PaymentState::Pending,
        Some("pi_ut_another"),
    );
    let confirm_cp = Arc::new(Mutex::new(None));
    let mock_repo = ut_repo_for_settle(Some(Ok(Some(booking_m))), None, None, confirm_cp.clone());
    let uc = PaymentSettleUseCase {
        processors: Arc::new(Box::new(ut_processor_with_event(Ok(mock_event)))),
        repo: Box::new(mock_repo),
        logctx: ut_setup_sharestate().log_context(),
    };
    let result = uc.execute(b"ut-raw-payload", "t=0,v1=00").await;
    assert!(result.is_err());
    if let Err(e) = result {
        let cond = matches!(e, PaymentSettleUcError::BookingNotFound(_));
        assert!(cond);
    }
}

#[actix_web::test]
async fn signature_rejected_before_any_lookup() {
    let proc_expect_error = AppProcessorError {
        reason: AppProcessorErrorReason::InvalidSignature("digest-mismatch".to_string()),
        fn_label: AppProcessorFnLabel::ParseWebhook,
    };
    let confirm_cp = Arc::new(Mutex::new(None));
    // every repository slot stays empty, any database access would
    // panic this test right away
    let mock_repo = ut_repo_for_settle(None, None, None, confirm_cp.clone());
    let uc = PaymentSettleUseCase {
        processors: Arc::new(Box::new(ut_processor_with_event(Err(proc_expect_error)))),
        repo: Box::new(mock_repo),
        logctx: ut_setup_sharestate().log_context(),
    };
    let result = uc.execute(b"ut-raw-payload", "t=0,v1=deadbeef").await;
    assert!(result.is_err());
    if let Err(e) = result {
        if let PaymentSettleUcError::InvalidSignature(detail) = e {
            assert_eq!(detail.as_str(), "digest-mismatch");
        } else {
            assert!(false);
        }
    }
} // end of fn signature_rejected_before_any_lookup

#[actix_web::test]
async fn event_type_unsupported() {
    let proc_expect_error = AppProcessorError {
        reason: AppProcessorErrorReason::EventTypeUnsupported("charge.refunded".to_string()),
        fn_label: AppProcessorFnLabel::ParseWebhook,
    };
    let confirm_cp = Arc::new(Mutex::new(None));
    let mock_repo = ut_repo_for_settle(None, None, None, confirm_cp.clone());
    let uc = PaymentSettleUseCase {
        processors: Arc::new(Box::new(ut_processor_with_event(Err(proc_expect_error)))),
        repo: Box::new(mock_repo),
        logctx: ut_setup_sharestate().log_context(),
    };
    let result = uc.execute(b"ut-raw-payload", "t=0,v1=00").await;
    assert!(result.is_err());
    if let Err(e) = result {
        if let PaymentSettleUcError::EventUnsupported(evt_type) = e {
            assert_eq!(evt_type.as_str(), "charge.refunded");
        } else {
            assert!(false);
        }
    }
}

#[actix_web::test]
async fn reconciliation_failure() {
    let mock_event = ut_payment_event(PaymentEventKind::Succeeded, "pi_ut_17", Some("ut-bk-stl-6"));
    let booking_m = ut_settled_booking(
        "ut-bk-stl-6",
        Some(920),
        BookingStatus::Pending,
        PaymentState::Pending,
        Some("pi_ut_17"),
    );
    let repo_expect_error = AppRepoError {
        fn_label: AppRepoErrorFnLabel::ConfirmBookingPaid,
        code: AppErrorCode::RemoteDbServerFailure,
        detail: AppRepoErrorDetail::DatabaseTxCommit("unit-test".to_string()),
    };
    let confirm_cp = Arc::new(Mutex::new(None));
    let mock_repo = ut_repo_for_settle(
        Some(Ok(Some(booking_m))),
        Some(Err(repo_expect_error)),
        None,
        confirm_cp.clone(),
    );
    let uc = PaymentSettleUseCase {
        processors: Arc::new(Box::new(ut_processor_with_event(Ok(mock_event)))),
        repo: Box::new(mock_repo),
        logctx: ut_setup_sharestate().log_context(),
    };
    let result = uc.execute(b"ut-raw-payload", "t=0,v1=00").await;
    assert!(result.is_err());
    if let Err(e) = result {
        if let PaymentSettleUcError::ReconciliationFailed(actual_error) = e {
            let cond = matches!(actual_error.fn_label, AppRepoErrorFnLabel::ConfirmBookingPaid);
            assert!(cond);
        } else {
            assert!(false);
        }
    }
} // end of fn reconciliation_failure
