mod booking;
mod payee;

use chrono::{DateTime, Duration, Local, Utc};
use rust_decimal::Decimal;

use tripmarket_common::api::dto::{CountryCode, CurrencyDto};
use tripmarket_common::constant::BookableKind;

use settlement::model::{
    BookableItemRef, BookingModel, BookingPeriodModel, BookingStatus, CommissionModel,
    CommissionStatus, Payee3partyModel, Payee3partyStripeModel, PayeeProfileModel, PaymentState,
    StripeAccountCapabilityModel, StripeAccountCapableState,
};

#[rustfmt::skip]
pub(crate) fn ut_default_booking(
    booking_id: &str,
    payer_id: u32,
    owner_id: Option<u32>,
    amount: (i64, u32),
    status: BookingStatus,
    paystate: PaymentState,
) -> BookingModel {
    let t_now = Local::now().to_utc();
    let period = BookingPeriodModel {
        start: t_now.date_naive() + Duration::days(4),
        end: t_now.date_naive() + Duration::days(7),
    };
    let item = BookableItemRef { kind: BookableKind::Hotel, item_id: 881007u64 };
    BookingModel::from_parts((
        booking_id.to_string(), payer_id, item, owner_id, period,
        Decimal::new(amount.0, amount.1), CurrencyDto::USD, status, paystate,
        None, None, t_now,
    ))
}

#[rustfmt::skip]
pub(crate) fn ut_saved_commission(
    id: &str,
    booking_id: &str,
    owner_id: u32,
    amount: (i64, u32),
    currency: CurrencyDto,
    status: CommissionStatus,
    payout_id: Option<&str>,
) -> CommissionModel {
    let t_now = Local::now().to_utc();
    CommissionModel::from_parts((
        id.to_string(), booking_id.to_string(), owner_id,
        Decimal::new(amount.0, amount.1), CommissionModel::platform_rate(),
        currency, status, payout_id.map(|p| p.to_string()), None, None, t_now,
    ))
}

pub(crate) fn ut_default_payee_3party_stripe(
    owner_id: u32,
    last_update: DateTime<Utc>,
) -> Payee3partyStripeModel {
    Payee3partyStripeModel {
        id: format!("acct_ut{owner_id}"),
        country: CountryCode::TW,
        email: Some("owner-desk@travelhost.tw".to_string()),
        capabilities: StripeAccountCapabilityModel {
            transfers: StripeAccountCapableState::active,
        },
        tos_accepted: Some(last_update - Duration::days(30)),
        charges_enabled: true,
        payouts_enabled: true,
        details_submitted: true,
        created: last_update - Duration::days(90),
    }
}

pub(crate) fn ut_payee_profile_stripe(
    owner_id: u32,
    last_update: DateTime<Utc>,
) -> PayeeProfileModel {
    let acct = ut_default_payee_3party_stripe(owner_id, last_update);
    PayeeProfileModel::from_parts((owner_id, last_update, Payee3partyModel::Stripe(acct)))
}
