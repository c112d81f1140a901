use chrono::{Duration, Local};

use settlement::model::{Payee3partyModel, PayeeProfileModel, StripeAccountCapableState};

use super::{ut_default_payee_3party_stripe, ut_payee_profile_stripe};

#[test]
fn receive_transfer_fully_enabled() {
    let t_now = Local::now().to_utc();
    let payee_m = ut_payee_profile_stripe(920, t_now);
    assert_eq!(payee_m.owner_id(), 920);
    assert!(payee_m.can_receive_transfer());
}

#[test]
fn receive_transfer_disabled_cases() {
    let t_now = Local::now().to_utc();
    let mut s = ut_default_payee_3party_stripe(921, t_now);
    s.payouts_enabled = false;
    let payee_m = PayeeProfileModel::from_parts((921, t_now, Payee3partyModel::Stripe(s)));
    assert!(!payee_m.can_receive_transfer());

    let mut s = ut_default_payee_3party_stripe(922, t_now);
    s.tos_accepted = None;
    let payee_m = PayeeProfileModel::from_parts((922, t_now, Payee3partyModel::Stripe(s)));
    assert!(!payee_m.can_receive_transfer());

    let mut s = ut_default_payee_3party_stripe(923, t_now);
    s.capabilities.transfers = StripeAccountCapableState::inactive;
    let payee_m = PayeeProfileModel::from_parts((923, t_now, Payee3partyModel::Stripe(s)));
    assert!(!payee_m.can_receive_transfer());

    let payee_m = PayeeProfileModel::from_parts((924, t_now, Payee3partyModel::Unknown));
    assert!(!payee_m.can_receive_transfer());
} // end of fn receive_transfer_disabled_cases

#[test]
fn stale_check() {
    let t_now = Local::now().to_utc();
    let payee_m = ut_payee_profile_stripe(925, t_now - Duration::days(2));
    assert!(payee_m.stale(t_now));
    let payee_m = ut_payee_profile_stripe(925, t_now - Duration::hours(1));
    assert!(!payee_m.stale(t_now));
}
