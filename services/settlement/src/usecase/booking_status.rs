use std::boxed::Box;
use std::result::Result;

use crate::adapter::repository::{AbstractBookingRepo, AppRepoError};
use crate::api::web::dto::BookingStatusRespDto;

pub enum BookingStatusReadUcError {
    BookingNotFound,
    DataStoreError(AppRepoError),
}

// polled by frontends while the customer completes the payment, only
// the 2 status columns leave the database
pub struct BookingStatusReadUseCase {
    pub repo: Box<dyn AbstractBookingRepo>,
}

impl BookingStatusReadUseCase {
    pub async fn execute(
        self,
        booking_id: String,
    ) -> Result<BookingStatusRespDto, BookingStatusReadUcError> {
        let result = self
            .repo
            .fetch_status(booking_id.as_str())
            .await
            .map_err(BookingStatusReadUcError::DataStoreError)?;
        let (status, paystate) = result.ok_or(BookingStatusReadUcError::BookingNotFound)?;
        Ok(BookingStatusRespDto::from((status, paystate)))
    }
} // end of impl BookingStatusReadUseCase
