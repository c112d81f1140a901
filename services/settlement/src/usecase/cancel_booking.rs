use std::boxed::Box;
use std::result::Result;

use crate::adapter::repository::{AbstractBookingRepo, AppRepoError};
use crate::api::web::dto::BookingStatusRespDto;
use crate::identity::AppActorIdentity;
use crate::model::BookingStatus;

pub enum BookingCancelUcError {
    BookingNotFound,
    PermissionDenied(u32),
    NotCancellable(BookingStatus),
    // the precheck saw a cancellable row but the conditional update hit
    // nothing, a settlement event raced in between
    CancelConflict,
    DataStoreError(AppRepoError),
}

pub struct BookingCancelUseCase {
    pub repo: Box<dyn AbstractBookingRepo>,
}

impl BookingCancelUseCase {
    pub async fn execute(
        self,
        identity: AppActorIdentity,
        booking_id: String,
    ) -> Result<BookingStatusRespDto, BookingCancelUcError> {
        let booking_m = self
            .repo
            .fetch(booking_id.as_str())
            .await
            .map_err(BookingCancelUcError::DataStoreError)?
            .ok_or(BookingCancelUcError::BookingNotFound)?;
        let permitted = booking_m.payer_match(identity.profile) || identity.is_admin();
        if !permitted {
            return Err(BookingCancelUcError::PermissionDenied(identity.profile));
        }
        if !booking_m.cancellable() {
            return Err(BookingCancelUcError::NotCancellable(booking_m.status()));
        }
        let applied = self
            .repo
            .mark_cancelled(booking_id.as_str())
            .await
            .map_err(BookingCancelUcError::DataStoreError)?;
        if applied {
            // refunds are settled out-of-band, the payment state the
            // booking reached stays on record
            let paystate = booking_m.payment_state();
            Ok(BookingStatusRespDto::from((
                BookingStatus::Cancelled,
                paystate,
            )))
        } else {
            Err(BookingCancelUcError::CancelConflict)
        }
    } // end of fn execute
} // end of impl BookingCancelUseCase
