mod booking_status;
mod cancel_booking;
mod create_booking;
mod create_intent;
mod reporting;
mod run_payout;
mod settle_payment;

pub use booking_status::{BookingStatusReadUcError, BookingStatusReadUseCase};
pub use cancel_booking::{BookingCancelUcError, BookingCancelUseCase};
pub use create_booking::{BookingCreateUcError, BookingCreateUseCase};
pub use create_intent::{PaymentIntentUcError, PaymentIntentUseCase};
pub use reporting::{SettlementReportUcError, SettlementReportUseCase};
pub use run_payout::{PayoutRunUcError, PayoutRunUseCase};
pub use settle_payment::{PaymentSettleUcError, PaymentSettleUseCase};
