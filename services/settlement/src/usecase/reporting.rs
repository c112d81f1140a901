use std::boxed::Box;
use std::result::Result;

use crate::adapter::repository::{AbstractReportingRepo, AppRepoError};
use crate::api::web::dto::{CommissionReportRespDto, PayoutReportRespDto, ReportTimeRangeDto};
use crate::identity::AppActorIdentity;

#[derive(Debug)]
pub enum SettlementReportUcError {
    PermissionDenied(u32),
    DataStore(AppRepoError),
}

pub struct SettlementReportUseCase {
    identity: AppActorIdentity,
    repo_rpt: Box<dyn AbstractReportingRepo>,
}

impl SettlementReportUseCase {
    pub fn new(identity: AppActorIdentity, repo_rpt: Box<dyn AbstractReportingRepo>) -> Self {
        Self { identity, repo_rpt }
    }

    // an admin reads the books of any owner, or all of them at once,
    // everyone else only ever sees their own rows
    fn resolve_owner(&self, owner_q: Option<u32>) -> Result<Option<u32>, SettlementReportUcError> {
        if self.identity.is_admin() {
            Ok(owner_q)
        } else {
            let profile = self.identity.profile;
            match owner_q {
                None => Ok(Some(profile)),
                Some(o) if o == profile => Ok(Some(profile)),
                Some(_other) => Err(SettlementReportUcError::PermissionDenied(profile)),
            }
        }
    }

    pub async fn commissions(
        self,
        owner_q: Option<u32>,
        t_range: ReportTimeRangeDto,
    ) -> Result<CommissionReportRespDto, SettlementReportUcError> {
        let owner = self.resolve_owner(owner_q)?;
        let saved = self
            .repo_rpt
            .list_commissions(owner, &t_range)
            .await
            .map_err(SettlementReportUcError::DataStore)?;
        Ok(CommissionReportRespDto::from(saved))
    }

    pub async fn payouts(
        self,
        owner_q: Option<u32>,
        t_range: ReportTimeRangeDto,
    ) -> Result<PayoutReportRespDto, SettlementReportUcError> {
        let owner = self.resolve_owner(owner_q)?;
        let saved = self
            .repo_rpt
            .list_payouts(owner, &t_range)
            .await
            .map_err(SettlementReportUcError::DataStore)?;
        Ok(PayoutReportRespDto::from(saved))
    }
} // end of impl SettlementReportUseCase
