use std::collections::HashMap;
use std::env;
use std::result::Result;

use tokio::runtime::Builder;

use tripmarket_common::config::{AppCfgHardLimit, AppCfgInitArgs, AppConfig};
use tripmarket_common::confidentiality;
use tripmarket_common::constant::env_vars::EXPECTED_LABELS;
use tripmarket_common::logging::{app_log_event, AppLogLevel};

use settlement::adapter::repository::{app_repo_payee, app_repo_payout};
use settlement::identity::{AppActorIdentity, AppActorRole};
use settlement::usecase::{PayoutRunUcError, PayoutRunUseCase};
use settlement::{hard_limit, AppSharedState};

// scheduled counterpart of the payout endpoint, walks every owner that
// currently has pending commissions and runs the same use case with a
// built-in admin identity
async fn start_payout_round(shr_state: AppSharedState) -> Result<(), ()> {
    let logctx = shr_state.log_context();
    let repo_po = app_repo_payout(shr_state.datastore()).await.map_err(|e| {
        app_log_event!(logctx, AppLogLevel::ERROR, "{:?}", e);
    })?;
    let owner_ids = repo_po.fetch_owners_with_pending().await.map_err(|e| {
        app_log_event!(logctx, AppLogLevel::ERROR, "{:?}", e);
    })?;
    if owner_ids.is_empty() {
        app_log_event!(logctx, AppLogLevel::INFO, "no-pending-commission");
        return Ok(());
    }
    let repo_pe = app_repo_payee(shr_state.datastore()).await.map_err(|e| {
        app_log_event!(logctx, AppLogLevel::ERROR, "{:?}", e);
    })?;
    let identity = AppActorIdentity {
        profile: 0,
        role: AppActorRole::Admin,
    };
    let uc = PayoutRunUseCase {
        identity,
        processors: shr_state.processor_context(),
        repo_po,
        repo_pe,
        logctx: logctx.clone(),
    };
    let num_total = owner_ids.len();
    let mut num_done = 0usize;
    for owner_id in owner_ids {
        match uc.execute(owner_id).await {
            Ok(v) => {
                num_done += 1;
                app_log_event!(
                    logctx,
                    AppLogLevel::INFO,
                    "owner:{owner_id}, payout:{}, status:{}",
                    v.payout_id,
                    v.status
                );
            }
            Err(PayoutRunUcError::NothingToPayout(o)) => {
                // another run may have drained the owner in between
                app_log_event!(logctx, AppLogLevel::DEBUG, "nothing-to-payout, owner:{o}");
            }
            Err(PayoutRunUcError::PayeeNotReady(o)) => {
                app_log_event!(logctx, AppLogLevel::INFO, "payee-not-ready, owner:{o}");
            }
            Err(PayoutRunUcError::PayoutLockRace) => {
                app_log_event!(logctx, AppLogLevel::WARNING, "lock-race, owner:{owner_id}");
            }
            Err(PayoutRunUcError::PermissionDenied(o)) => {
                app_log_event!(logctx, AppLogLevel::ERROR, "permission-denied, owner:{o}");
            }
            Err(PayoutRunUcError::CorruptedCommission(e)) => {
                app_log_event!(
                    logctx,
                    AppLogLevel::ERROR,
                    "owner:{owner_id}, corrupted-commission, {:?}",
                    e
                );
            }
            Err(PayoutRunUcError::DataStoreError(e)) => {
                app_log_event!(logctx, AppLogLevel::ERROR, "owner:{owner_id}, {:?}", e);
            }
        }
    } // end of loop
    app_log_event!(
        logctx,
        AppLogLevel::INFO,
        "payout-round-complete, {num_done}/{num_total}"
    );
    Ok(())
} // end of fn start_payout_round

fn init_config() -> Result<AppConfig, ()> {
    let iter = env::vars().filter(|(k, _v)| EXPECTED_LABELS.contains(&k.as_str()));
    let env_var_map = HashMap::from_iter(iter);
    let limit = AppCfgHardLimit {
        nitems_per_inmem_table: 0,
        num_db_conns: 10,
        seconds_db_idle: hard_limit::MAX_SECONDS_DB_IDLE,
    };
    let args = AppCfgInitArgs { env_var_map, limit };
    AppConfig::new(args).map_err(|e| {
        println!(
            "[ERROR] config failure, code:{:?}, detail:{:?}",
            e.code, e.detail
        );
    })
}

fn main() -> Result<(), ()> {
    let cfg = init_config()?;
    let cfdntl = confidentiality::build_context(&cfg).map_err(|e| {
        println!("[ERROR] confidentiality init failure, {:?}", e);
    })?;
    let shr_state = AppSharedState::new(cfg, cfdntl).map_err(|e| {
        println!("[ERROR] shared state init failure, {:?}", e);
    })?;
    let cfg = shr_state.config();
    let logctx = shr_state.log_context();
    let stack_nbytes = (cfg.api_server.stack_sz_kb as usize) << 10;
    let runtime = Builder::new_current_thread()
        .worker_threads(1)
        .thread_stack_size(stack_nbytes)
        .thread_name("payout-cron")
        .enable_time()
        .enable_io()
        .build()
        .map_err(|e| {
            app_log_event!(logctx, AppLogLevel::ERROR, "{:?}", e);
        })?;
    runtime.block_on(async move { start_payout_round(shr_state).await })
} // end of fn main
