use std::boxed::Box;
use std::sync::{Arc, Mutex};

use chrono::{Duration, Local};
use rust_decimal::Decimal;

use tripmarket_common::api::dto::CurrencyDto;

use settlement::adapter::repository::AppRepoError;
use settlement::api::web::dto::ReportTimeRangeDto;
use settlement::identity::{AppActorIdentity, AppActorRole};
use settlement::model::{CommissionModel, CommissionStatus, PayoutModel, PayoutStatus};
use settlement::usecase::{SettlementReportUcError, SettlementReportUseCase};

use crate::model::ut_saved_commission;

use super::MockReportingRepo;

fn ut_time_range() -> ReportTimeRangeDto {
    let t_now = Local::now().to_utc();
    ReportTimeRangeDto {
        start_after: t_now - Duration::days(30),
        end_before: t_now,
    }
}

fn ut_processed_commissions(owner_id: u32, payout_id: &str) -> Vec<CommissionModel> {
    [
        ("ut-cms-rpt-0", "ut-bk-rpt-0", (1200i64, 2u32)),
        ("ut-cms-rpt-1", "ut-bk-rpt-1", (880i64, 2u32)),
    ]
    .into_iter()
    .map(|(id, bkid, amount)| {
        ut_saved_commission(
            id,
            bkid,
            owner_id,
            amount,
            CurrencyDto::TWD,
            CommissionStatus::Processed,
            Some(payout_id),
        )
    })
    .collect()
}

#[rustfmt::skip]
fn ut_saved_payout(owner_id: u32, payout_id: &str) -> PayoutModel {
    let t_now = Local::now().to_utc();
    let members = ut_processed_commissions(owner_id, payout_id);
    PayoutModel::from_parts((
        payout_id.to_string(), owner_id, Decimal::new(2080, 2), CurrencyDto::TWD,
        PayoutStatus::Succeeded, Some("tr_ut_rpt".to_string()), Some(t_now),
        None, t_now - Duration::days(1), members,
    ))
}

#[rustfmt::skip]
fn ut_repo_reporting(
    commissions: Option<Result<Vec<CommissionModel>, AppRepoError>>,
    payouts: Option<Result<Vec<PayoutModel>, AppRepoError>>,
    owner_cp: Arc<Mutex<Option<Option<u32>>>>,
) -> MockReportingRepo {
    MockReportingRepo {
        _list_commissions_result: Mutex::new(commissions),
        _list_payouts_result: Mutex::new(payouts),
        _owner_arg_cp: owner_cp,
    }
}

#[actix_web::test]
async fn admin_reads_all_owners() {
    let owner_cp = Arc::new(Mutex::new(None));
    let rows = ut_processed_commissions(920, "ut-po-rpt-0");
    let mock_repo = ut_repo_reporting(Some(Ok(rows)), None, owner_cp.clone());
    let identity = AppActorIdentity {
        profile: 74,
        role: AppActorRole::Admin,
    };
    let uc = SettlementReportUseCase::new(identity, Box::new(mock_repo));
    let result = uc.commissions(None, ut_time_range()).await;
    assert!(result.is_ok());
    if let Ok(resp) = result {
        assert_eq!(resp.rows.len(), 2);
        assert_eq!(resp.rows[0].owner_id, 920u32);
        assert_eq!(resp.rows[0].status.as_str(), "PROCESSED");
        assert_eq!(resp.rows[0].amount.as_str(), "12.00");
    }
    let captured = owner_cp.lock().unwrap().take();
    // no owner filter at all, the admin sees every owner at once
    assert_eq!(captured, Some(None));
}

#[actix_web::test]
async fn admin_reads_single_owner() {
    let owner_cp = Arc::new(Mutex::new(None));
    let rows = vec![ut_saved_payout(920, "ut-po-rpt-1")];
    let mock_repo = ut_repo_reporting(None, Some(Ok(rows)), owner_cp.clone());
    let identity = AppActorIdentity {
        profile: 74,
        role: AppActorRole::Admin,
    };
    let uc = SettlementReportUseCase::new(identity, Box::new(mock_repo));
    let result = uc.payouts(Some(920), ut_time_range()).await;
    assert!(result.is_ok());
    if let Ok(resp) = result {
        assert_eq!(resp.rows.len(), 1);
        assert_eq!(resp.rows[0].amount.as_str(), "20.80");
        assert_eq!(resp.rows[0].status.as_str(), "SUCCEEDED");
        assert_eq!(resp.rows[0].num_commissions, 2usize);
    }
    let captured = owner_cp.lock().unwrap().take();
    assert_eq!(captured, Some(Some(920u32)));
}

#[actix_web::test]
async fn user_forced_to_own_rows() {
    let owner_cp = Arc::new(Mutex::new(None));
    let mock_repo = ut_repo_reporting(Some(Ok(Vec::new())), None, owner_cp.clone());
    let identity = AppActorIdentity {
        profile: 920,
        role: AppActorRole::User,
    };
    let uc = SettlementReportUseCase::new(identity, Box::new(mock_repo));
    let result = uc.commissions(None, ut_time_range()).await;
    assert!(result.is_ok());
    let captured = owner_cp.lock().unwrap().take();
    assert_eq!(captured, Some(Some(920u32)));
}

#[actix_web::test]
async fn user_owner_query_matching_profile() {
    let owner_cp = Arc::new(Mutex::new(None));
    let rows = vec![ut_saved_payout(920, "ut-po-rpt-2")];
    let mock_repo = ut_repo_reporting(None, Some(Ok(rows)), owner_cp.clone());
    let identity = AppActorIdentity {
        profile: 920,
        role: AppActorRole::User,
    };
    let uc = SettlementReportUseCase::new(identity, Box::new(mock_repo));
    let result = uc.payouts(Some(920), ut_time_range()).await;
    assert!(result.is_ok());
    let captured = owner_cp.lock().unwrap().take();
    assert_eq!(captured, Some(Some(920u32)));
}

#[actix_web::test]
async fn user_reads_other_owner_denied() {
    let owner_cp = Arc::new(Mutex::new(None));
    let mock_repo = ut_repo_reporting(None, None, owner_cp.clone());
    let identity = AppActorIdentity {
        profile: 920,
        role: AppActorRole::User,
    };
    let uc = SettlementReportUseCase::new(identity, Box::new(mock_repo));
    let result = uc.commissions(Some(921), ut_time_range()).await;
    assert!(matches!(
        result,
        Err(SettlementReportUcError::PermissionDenied(920u32))
    ));
    // denied before the repository is ever touched
    assert!(owner_cp.lock().unwrap().take().is_none());
}
