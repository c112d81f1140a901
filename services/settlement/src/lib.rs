pub mod adapter;
pub mod api;
pub mod identity;
pub mod model;
pub mod network;
pub mod usecase;

use std::result::Result;
use std::sync::Arc;

use uuid::{Builder, NoContext, Timestamp, Uuid};

use tripmarket_common::config::AppConfig;
use tripmarket_common::confidentiality::AbstractConfidentiality;
use tripmarket_common::logging::AppLogContext;

use crate::adapter::cache::{app_cache_booking_sync_lock, AbstractBookingSyncLockCache};
use crate::adapter::datastore::{AppDStoreError, AppDataStoreContext};
use crate::adapter::processor::{
    app_processor_context, AbstractPaymentProcessor, AppProcessorError,
};
use crate::adapter::rpc;

pub mod app_meta {
    pub const LABAL: &'static str = "settlement";
    pub const MACHINE_CODE: u8 = 1;
}

pub mod hard_limit {
    pub const MAX_DB_CONNECTIONS: u32 = 1800u32;
    pub const MAX_SECONDS_DB_IDLE: u16 = 360u16;
    pub const RPC_WAIT_FOR_REPLY: u16 = 11u16;
    // commission rate charged on every paid booking, in basis points
    pub const COMMISSION_RATE_BASIS_POINTS: i64 = 1000;
    // reject webhook payloads whose signed timestamp drifts beyond this window
    pub const SECONDS_WEBHOOK_TOLERANCE: i64 = 300;
    // payee records older than this are refreshed from the payment processor
    // before running a payout
    pub const SECONDS_PAYEE_STATE_STALE: i64 = 86400;
    // longest span a single booking may cover, no vertical rents one
    // item out for entire seasons through this service
    pub const MAX_BOOKING_SPAN_DAYS: i64 = 60;
    pub const MAX_NUM_REPORT_ROWS: u32 = 500;
}

pub(crate) fn generate_custom_uid(machine_code: u8) -> Uuid {
    // UUIDv7 is for single-node application. This app needs to consider
    // scalability of multi-node environment, UUIDv8 can be utilized cuz it
    // allows custom ID layout, so few bits of the ID can be assigned to
    // represent each machine/node ID,  rest of that should be timestamp with
    // random byte sequence
    let ts_ctx = NoContext;
    let (secs, nano) = Timestamp::now(ts_ctx).to_unix();
    let millis = (secs * 1000).saturating_add((nano as u64) / 1_000_000);
    let mut node_id = rand::random::<[u8; 10]>();
    node_id[0] = machine_code;
    let builder = Builder::from_unix_timestamp_millis(millis, &node_id);
    builder.into_uuid()
}

pub struct AppSharedState {
    _config: Arc<AppConfig>,
    _log_ctx: Arc<AppLogContext>,
    _dstore: Arc<AppDataStoreContext>,
    _processors: Arc<Box<dyn AbstractPaymentProcessor>>,
    _rpc_ctx: Arc<Box<dyn rpc::AbstractRpcContext>>,
    _bksync_lockset: Arc<Box<dyn AbstractBookingSyncLockCache>>,
}

#[derive(Debug)]
pub enum ShrStateInitProgress {
    DataStore,
    RpcContext,
    ExternalProcessor,
}

// TODO,
// - error code with  tripmarket_common::error::AppErrorCode;
#[derive(Debug)]
pub struct ShrStateInitError {
    pub progress: ShrStateInitProgress,
}
impl From<AppDStoreError> for ShrStateInitError {
    fn from(_value: AppDStoreError) -> Self {
        Self {
            progress: ShrStateInitProgress::DataStore,
        }
    }
}
impl From<rpc::AppRpcCtxError> for ShrStateInitError {
    fn from(_value: rpc::AppRpcCtxError) -> Self {
        Self {
            progress: ShrStateInitProgress::RpcContext,
        }
    }
}
impl From<AppProcessorError> for ShrStateInitError {
    fn from(_value: AppProcessorError) -> Self {
        Self {
            progress: ShrStateInitProgress::ExternalProcessor,
        }
    }
}

impl AppSharedState {
    pub fn new(
        cfg: AppConfig,
        cfdntl: Box<dyn AbstractConfidentiality>,
    ) -> Result<Self, ShrStateInitError> {
        let cfdntl = Arc::new(cfdntl);
        let logctx = {
            let lc = AppLogContext::new(&cfg.basepath, &cfg.api_server.logging);
            Arc::new(lc)
        };
        let _rpc_ctx = {
            let r = rpc::build_context(&cfg, cfdntl.clone(), logctx.clone())?;
            Arc::new(r)
        };
        let _dstore = {
            let d = AppDataStoreContext::new(
                &cfg.api_server.data_store,
                cfdntl.clone(),
                logctx.clone(),
            )?;
            Arc::new(d)
        };
        let _processors = {
            let proc = app_processor_context(&cfg.api_server.third_parties, cfdntl, logctx.clone())?;
            Arc::new(proc)
        };
        let _bksync_lockset = {
            let bls = app_cache_booking_sync_lock();
            Arc::new(bls)
        };
        Ok(Self {
            _config: Arc::new(cfg),
            _log_ctx: logctx,
            _bksync_lockset,
            _dstore,
            _rpc_ctx,
            _processors,
        })
    }

    pub fn datastore(&self) -> Arc<AppDataStoreContext> {
        self._dstore.clone()
    }
    pub fn processor_context(&self) -> Arc<Box<dyn AbstractPaymentProcessor>> {
        self._processors.clone()
    }
    pub fn rpc_context(&self) -> Arc<Box<dyn rpc::AbstractRpcContext>> {
        self._rpc_ctx.clone()
    }
    pub fn booking_lockset(&self) -> Arc<Box<dyn AbstractBookingSyncLockCache>> {
        self._bksync_lockset.clone()
    }
    pub fn log_context(&self) -> Arc<AppLogContext> {
        self._log_ctx.clone()
    }
    pub fn config(&self) -> Arc<AppConfig> {
        self._config.clone()
    }
} // end of impl AppSharedState

impl Clone for AppSharedState {
    fn clone(&self) -> Self {
        Self {
            _config: self._config.clone(),
            _log_ctx: self._log_ctx.clone(),
            _dstore: self._dstore.clone(),
            _rpc_ctx: self._rpc_ctx.clone(),
            _processors: self._processors.clone(),
            _bksync_lockset: self._bksync_lockset.clone(),
        }
    }
}
