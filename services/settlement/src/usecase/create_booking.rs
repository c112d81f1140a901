use std::boxed::Box;
use std::sync::Arc;

use chrono::Local;

use tripmarket_common::api::rpc::dto::{BookableItemReplicaDto, BookableItemReplicaReqDto};

use crate::adapter::repository::{AbstractBookingRepo, AppRepoError};
use crate::adapter::rpc::{AbstractRpcContext, AppRpcClientRequest, AppRpcCtxError};
use crate::api::web::dto::{BookingReqDto, BookingRespDto, BookingRespErrorDto};
use crate::model::{
    BookableItemError, BookableItemRef, BookableItemSnapshot, BookingModel, BookingModelError,
};
use crate::{app_meta, generate_custom_uid};

pub enum BookingCreateUcError {
    ItemNotFound,                         // client error, e.g. status code 404
    ItemUnavailable,                      // dates taken by another booking, 409
    ClientBadRequest(BookingRespErrorDto), // status code 400
    ItemReplicaMismatch,
    ItemReplicaCorruption(String),
    LoadItemInternalError(AppRpcCtxError),
    DataStoreError(AppRepoError),
}

impl From<AppRpcCtxError> for BookingCreateUcError {
    fn from(value: AppRpcCtxError) -> Self {
        Self::LoadItemInternalError(value)
    }
}
impl From<AppRepoError> for BookingCreateUcError {
    fn from(value: AppRepoError) -> Self {
        Self::DataStoreError(value)
    }
}
impl From<serde_json::Error> for BookingCreateUcError {
    fn from(value: serde_json::Error) -> Self {
        Self::ItemReplicaCorruption(value.to_string())
    }
}
impl From<BookableItemError> for BookingCreateUcError {
    fn from(value: BookableItemError) -> Self {
        match value {
            BookableItemError::InActive => Self::ItemNotFound,
            BookableItemError::IdentityMismatch => Self::ItemReplicaMismatch,
            BookableItemError::CorruptedPrice(d) => Self::ItemReplicaCorruption(d),
        }
    }
}
impl From<BookingModelError> for BookingCreateUcError {
    fn from(value: BookingModelError) -> Self {
        Self::ClientBadRequest(BookingRespErrorDto::from(value))
    }
}

pub struct BookingCreateUseCase {
    pub rpc_ctx: Arc<Box<dyn AbstractRpcContext>>,
    pub repo: Box<dyn AbstractBookingRepo>,
}

impl BookingCreateUseCase {
    pub async fn execute(
        &self,
        usr_id: u32,
        req_body: BookingReqDto,
    ) -> Result<BookingRespDto, BookingCreateUcError> {
        let item = BookableItemRef {
            kind: req_body.kind.clone(),
            item_id: req_body.item_id,
        };
        let replica_d = self._rpc_load_item_replica(&item, usr_id).await?;
        let item_snap = BookableItemSnapshot::try_from((&item, replica_d))?;
        let t_now = Local::now().to_utc();
        let bkid = generate_custom_uid(app_meta::MACHINE_CODE)
            .simple()
            .to_string();
        let booking_m = BookingModel::try_from((usr_id, req_body, item_snap, bkid, t_now))?;
        let occupied = self
            .repo
            .has_date_overlap(booking_m.item(), booking_m.period())
            .await?;
        if occupied {
            return Err(BookingCreateUcError::ItemUnavailable);
        }
        self.repo.create(&booking_m).await?;
        Ok(BookingRespDto::from(&booking_m))
    } // end of fn execute

    async fn _rpc_load_item_replica(
        &self,
        item: &BookableItemRef,
        usr_id: u32,
    ) -> Result<BookableItemReplicaDto, BookingCreateUcError> {
        let client = self.rpc_ctx.acquire().await?;
        let payld = BookableItemReplicaReqDto {
            kind: item.kind.clone(),
            item_id: item.item_id,
        };
        let props = AppRpcClientRequest {
            usr_id,
            time: Local::now().to_utc(),
            message: serde_json::to_vec(&payld).unwrap(),
            route: "rpc.bookable.item_replica_settlement".to_string(),
        };
        let mut event = client.send_request(props).await?;
        let reply = event.receive_response().await?;
        // the vertical service replies `null` when no item carries the
        // requested identifier, or when it was removed from sale
        let result = serde_json::from_slice::<Option<BookableItemReplicaDto>>(&reply.message)?;
        result.ok_or(BookingCreateUcError::ItemNotFound)
    }
} // end of impl BookingCreateUseCase
