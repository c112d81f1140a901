mod booking;
mod commission;
mod external_processor;
mod item_replica;
mod payee;
mod payout;

pub use booking::{
    BookableItemRef, BookingModel, BookingModelError, BookingPeriodModel, BookingRefModel,
    BookingStatus, PaymentState,
};
pub use commission::{CommissionModel, CommissionModelError, CommissionStatus};
pub use external_processor::{
    Payee3partyStripeModel, StripeAccountCapabilityModel, StripeAccountCapableState,
};
pub use item_replica::{BookableItemError, BookableItemSnapshot};
pub use payee::{Payee3partyModel, PayeeProfileModel};
pub use payout::{PayoutModel, PayoutModelError, PayoutStatus};
