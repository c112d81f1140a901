use std::boxed::Box;
use std::sync::{Arc, Mutex};

use tripmarket_common::error::AppErrorCode;

use settlement::adapter::repository::{AppRepoError, AppRepoErrorDetail, AppRepoErrorFnLabel};
use settlement::identity::{AppActorIdentity, AppActorRole};
use settlement::model::{BookingModel, BookingStatus, PaymentState};
use settlement::usecase::{BookingCancelUcError, BookingCancelUseCase};

use crate::model::ut_default_booking;

use super::MockBookingRepo;

#[rustfmt::skip]
fn ut_repo_for_cancel(
    fetch: Option<Result<Option<BookingModel>, AppRepoError>>,
    mark: Option<Result<bool, AppRepoError>>,
) -> MockBookingRepo {
    MockBookingRepo {
        _create_result: Mutex::new(None),
        _fetch_result: Mutex::new(fetch),
        _fetch_again_result: Mutex::new(None),
        _fetch_status_result: Mutex::new(None),
        _overlap_result: Mutex::new(None),
        _mark_cancelled_result: Mutex::new(mark),
        _store_intent_result: Mutex::new(None),
        _confirm_paid_result: Mutex::new(None),
        _confirm_paid_commission_cp: Arc::new(Mutex::new(None)),
        _cancel_failed_result: Mutex::new(None),
    }
}

#[actix_web::test]
async fn ok_by_payer() {
    let mock_payer_id = 1411u32;
    let booking_m = ut_default_booking(
        "ut-bk-cancel-0",
        mock_payer_id,
        Some(920),
        (48050i64, 2u32),
        BookingStatus::Pending,
        PaymentState::Pending,
    );
    let mock_repo = ut_repo_for_cancel(Some(Ok(Some(booking_m))), Some(Ok(true)));
    let identity = AppActorIdentity {
        profile: mock_payer_id,
        role: AppActorRole::User,
    };
    let uc = BookingCancelUseCase {
        repo: Box::new(mock_repo),
    };
    let result = uc.execute(identity, "ut-bk-cancel-0".to_string()).await;
    assert!(result.is_ok());
    if let Ok(resp) = result {
        assert_eq!(resp.status.as_str(), "CANCELLED");
        assert_eq!(resp.payment_state.as_str(), "PENDING");
    }
}

#[actix_web::test]
async fn ok_by_admin_retains_paystate() {
    let booking_m = ut_default_booking(
        "ut-bk-cancel-1",
        1411,
        Some(920),
        (48050i64, 2u32),
        BookingStatus::Confirmed,
        PaymentState::Paid,
    );
    let mock_repo = ut_repo_for_cancel(Some(Ok(Some(booking_m))), Some(Ok(true)));
    let identity = AppActorIdentity {
        profile: 88,
        role: AppActorRole::Admin,
    };
    let uc = BookingCancelUseCase {
        repo: Box::new(mock_repo),
    };
    let result = uc.execute(identity, "ut-bk-cancel-1".to_string()).await;
    assert!(result.is_ok());
    if let Ok(resp) = result {
        assert_eq!(resp.status.as_str(), "CANCELLED");
        // the refund is settled out-of-band, the reached payment state
        // stays on record
        assert_eq!(resp.payment_state.as_str(), "PAID");
    }
}

#[actix_web::test]
async fn permission_denied() {
    let booking_m = ut_default_booking(
        "ut-bk-cancel-2",
        1411,
        Some(920),
        (48050i64, 2u32),
        BookingStatus::Pending,
        PaymentState::Pending,
    );
    let mock_repo = ut_repo_for_cancel(Some(Ok(Some(booking_m))), None);
    let identity = AppActorIdentity {
        profile: 9999,
        role: AppActorRole::User,
    };
    let uc = BookingCancelUseCase {
        repo: Box::new(mock_repo),
    };
    let result = uc.execute(identity, "ut-bk-cancel-2".to_string()).await;
    assert!(result.is_err());
    if let Err(e) = result {
        if let BookingCancelUcError::PermissionDenied(actor) = e {
            assert_eq!(actor, 9999);
        } else {
            assert!(false);
        }
    }
}

#[actix_web::test]
async fn not_cancellable() {
    let booking_m = ut_default_booking(
        "ut-bk-cancel-3",
        1411,
        Some(920),
        (48050i64, 2u32),
        BookingStatus::Cancelled,
        PaymentState::Failed,
    );
    let mock_repo = ut_repo_for_cancel(Some(Ok(Some(booking_m))), None);
    let identity = AppActorIdentity {
        profile: 1411,
        role: AppActorRole::User,
    };
    let uc = BookingCancelUseCase {
        repo: Box::new(mock_repo),
    };
    let result = uc.execute(identity, "ut-bk-cancel-3".to_string()).await;
    assert!(result.is_err());
    if let Err(e) = result {
        if let BookingCancelUcError::NotCancellable(status) = e {
            assert_eq!(status, BookingStatus::Cancelled);
        } else {
            assert!(false);
        }
    }
}

#[actix_web::test]
async fn conditional_update_conflict() {
    let booking_m = ut_default_booking(
        "ut-bk-cancel-4",
        1411,
        Some(920),
        (48050i64, 2u32),
        BookingStatus::Pending,
        PaymentState::Pending,
    );
    let mock_repo = ut_repo_for_cancel(Some(Ok(Some(booking_m))), Some(Ok(false)));
    let identity = AppActorIdentity {
        profile: 1411,
        role: AppActorRole::User,
    };
    let uc = BookingCancelUseCase {
        repo: Box::new(mock_repo),
    };
    let result = uc.execute(identity, "ut-bk-cancel-4".to_string()).await;
    assert!(result.is_err());
    if let Err(e) = result {
        let cond = matches!(e, BookingCancelUcError::CancelConflict);
        assert!(cond);
    }
}

#[actix_web::test]
async fn booking_not_found() {
    let mock_repo = ut_repo_for_cancel(Some(Ok(None)), None);
    let identity = AppActorIdentity {
        profile: 1411,
        role: AppActorRole::User,
    };
    let uc = BookingCancelUseCase {
        repo: Box::new(mock_repo),
    };
    let result = uc.execute(identity, "ut-bk-unsaved".to_string()).await;
    assert!(result.is_err());
    if let Err(e) = result {
        let cond = matches!(e, BookingCancelUcError::BookingNotFound);
        assert!(cond);
    }
}

#[actix_web::test]
async fn load_booking_failure() {
    let repo_expect_error = AppRepoError {
        fn_label: AppRepoErrorFnLabel::FetchBooking,
        code: AppErrorCode::RemoteDbServerFailure,
        detail: AppRepoErrorDetail::DatabaseQuery("unit-test".to_string()),
    };
    let mock_repo = ut_repo_for_cancel(Some(Err(repo_expect_error)), None);
    let identity = AppActorIdentity {
        profile: 1411,
        role: AppActorRole::User,
    };
    let uc = BookingCancelUseCase {
        repo: Box::new(mock_repo),
    };
    let result = uc.execute(identity, "ut-bk-cancel-5".to_string()).await;
    assert!(result.is_err());
    if let Err(e) = result {
        if let BookingCancelUcError::DataStoreError(actual_error) = e {
            let cond = matches!(actual_error.fn_label, AppRepoErrorFnLabel::FetchBooking);
            assert!(cond);
        } else {
            assert!(false);
        }
    }
}
