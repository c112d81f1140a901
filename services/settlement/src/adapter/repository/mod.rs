mod mariadb;

use std::boxed::Box;
use std::result::Result;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use tripmarket_common::error::AppErrorCode;

use crate::model::{
    BookableItemRef, BookingModel, BookingPeriodModel, BookingStatus, CommissionModel,
    PayeeProfileModel, PaymentState, PayoutModel,
};

use self::mariadb::{
    MariadbBookingRepo, MariadbPayeeRepo, MariadbPayoutRepo, MariadbReportingRepo,
};
use super::datastore::{AppDStoreError, AppDataStoreContext};
use crate::api::web::dto::ReportTimeRangeDto;

#[derive(Debug, Clone, Copy)]
pub enum AppRepoErrorFnLabel {
    InitBookingRepo,
    CreateBooking,
    FetchBooking,
    FetchBookingStatus,
    CheckDateOverlap,
    MarkBookingCancelled,
    StoreIntentRef,
    ConfirmBookingPaid,
    CancelBookingFailed,
    InitPayoutRepo,
    FetchPendingCommissions,
    FetchOwnersWithPending,
    CreatePayout,
    CompletePayout,
    FailPayout,
    InitPayeeRepo,
    SavePayee,
    FetchPayee,
    InitReportingRepo,
    ReportCommissions,
    ReportPayouts,
}

#[derive(Debug)]
pub enum AppRepoErrorDetail {
    DataStore(AppDStoreError),
    DatabaseTxStart(String),
    DatabaseTxCommit(String),
    DatabaseExec(String),
    DatabaseQuery(String),
    DataRowParse(String),
    RecordIDparse(String),
    ConstructModelFailure(String),
    PayDetail(String, String),
    PayMethodUnsupport(String),
    Unknown,
}

#[derive(Debug)]
pub struct AppRepoError {
    pub fn_label: AppRepoErrorFnLabel,
    pub code: AppErrorCode,
    pub detail: AppRepoErrorDetail,
}

#[async_trait]
pub trait AbstractBookingRepo: Sync + Send {
    async fn create(&self, booking: &BookingModel) -> Result<(), AppRepoError>;

    async fn fetch(&self, booking_id: &str) -> Result<Option<BookingModel>, AppRepoError>;

    // status columns only, for cheap polling endpoints
    async fn fetch_status(
        &self,
        booking_id: &str,
    ) -> Result<Option<(BookingStatus, PaymentState)>, AppRepoError>;

    async fn has_date_overlap(
        &self,
        item: &BookableItemRef,
        period: &BookingPeriodModel,
    ) -> Result<bool, AppRepoError>;

    // conditional update, `false` means no row was in a cancellable state
    async fn mark_cancelled(&self, booking_id: &str) -> Result<bool, AppRepoError>;

    // first writer wins, `false` means another intent reference was
    // already persisted for the booking
    async fn store_intent_ref(&self, booking_id: &str, intent_ref: &str)
        -> Result<bool, AppRepoError>;

    // flips the booking to confirmed / paid and inserts the commission
    // row in one transaction, `false` means the booking was not in the
    // expected pending state so nothing was written
    async fn confirm_paid(
        &self,
        booking_id: &str,
        t_confirmed: DateTime<Utc>,
        commission: Option<CommissionModel>,
    ) -> Result<bool, AppRepoError>;

    async fn cancel_failed(&self, booking_id: &str) -> Result<bool, AppRepoError>;
}

#[async_trait]
pub trait AbstractPayoutRepo: Sync + Send {
    async fn fetch_pending_commissions(
        &self,
        owner_id: u32,
    ) -> Result<Vec<CommissionModel>, AppRepoError>;

    async fn fetch_owners_with_pending(&self) -> Result<Vec<u32>, AppRepoError>;

    // persists the payout row and tags every member commission in one
    // transaction, a member grabbed by a concurrent run aborts the whole
    // transaction
    async fn create_payout(&self, payout: &PayoutModel) -> Result<(), AppRepoError>;

    async fn complete_payout(&self, payout: &PayoutModel) -> Result<(), AppRepoError>;

    async fn fail_payout(&self, payout: &PayoutModel) -> Result<(), AppRepoError>;
}

#[async_trait]
pub trait AbstractPayeeRepo: Sync + Send {
    async fn create_or_update(&self, payee: &PayeeProfileModel) -> Result<(), AppRepoError>;

    async fn fetch(&self, owner_id: u32) -> Result<Option<PayeeProfileModel>, AppRepoError>;
}

#[async_trait]
pub trait AbstractReportingRepo: Sync + Send {
    async fn list_commissions(
        &self,
        owner_id: Option<u32>,
        t_range: &ReportTimeRangeDto,
    ) -> Result<Vec<CommissionModel>, AppRepoError>;

    async fn list_payouts(
        &self,
        owner_id: Option<u32>,
        t_range: &ReportTimeRangeDto,
    ) -> Result<Vec<PayoutModel>, AppRepoError>;
}

pub async fn app_repo_booking(
    dstore: Arc<AppDataStoreContext>,
) -> Result<Box<dyn AbstractBookingRepo>, AppRepoError> {
    let repo = MariadbBookingRepo::new(dstore).await?;
    Ok(Box::new(repo))
}

pub async fn app_repo_payout(
    dstore: Arc<AppDataStoreContext>,
) -> Result<Box<dyn AbstractPayoutRepo>, AppRepoError> {
    let repo = MariadbPayoutRepo::new(dstore).await?;
    Ok(Box::new(repo))
}

pub async fn app_repo_payee(
    dstore: Arc<AppDataStoreContext>,
) -> Result<Box<dyn AbstractPayeeRepo>, AppRepoError> {
    let repo = MariadbPayeeRepo::new(dstore).await?;
    Ok(Box::new(repo))
}

pub async fn app_repo_reporting(
    dstore: Arc<AppDataStoreContext>,
) -> Result<Box<dyn AbstractReportingRepo>, AppRepoError> {
    let repo = MariadbReportingRepo::new(dstore).await?;
    Ok(Box::new(repo))
}
