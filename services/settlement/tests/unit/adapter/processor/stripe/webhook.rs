use chrono::Utc;
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;

use tripmarket_common::constant::BookableKind;

use settlement::adapter::processor::{
    AppProcessorErrorReason, AppProcessorFnLabel, PaymentEventKind,
};

use crate::ut_setup_sharestate;

// keep in sync with the signing key recorded in `secrets_demo.json`
const UT_SIGNING_KEY: &str = "whsec_ut-settle-s1gn1ng-key";

fn ut_sign_payload(raw_payload: &[u8], ts: i64) -> String {
    let ts_serial = ts.to_string();
    let mut mac = Hmac::<Sha256>::new_from_slice(UT_SIGNING_KEY.as_bytes()).unwrap();
    mac.update(ts_serial.as_bytes());
    mac.update(b".");
    mac.update(raw_payload);
    let digest = mac.finalize().into_bytes();
    let digest_serial = digest
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<String>();
    format!("t={ts_serial},v1={digest_serial}")
}

fn ut_intent_event_payload(evt_type: &str, intent_ref: &str, booking_id: Option<&str>) -> Vec<u8> {
    let metadata = match booking_id {
        Some(bkid) => json!({"booking_kind": "hotel", "booking_id": bkid}),
        None => json!({}),
    };
    let body = json!({
        "type": evt_type,
        "data": {
            "object": {
                "id": intent_ref,
                "client_secret": null,
                "amount": 44850i64,
                "currency": "twd",
                "created": Utc::now().timestamp(),
                "metadata": metadata,
            }
        }
    });
    serde_json::to_vec(&body).unwrap()
}

#[test]
fn parse_succeeded_event_ok() {
    let proc_ctx = ut_setup_sharestate().processor_context();
    let raw_payload =
        ut_intent_event_payload("payment_intent.succeeded", "pi_ut_wh_1", Some("ut-bk-wh-1"));
    let sig_header = ut_sign_payload(raw_payload.as_slice(), Utc::now().timestamp());
    let result = proc_ctx.parse_webhook(raw_payload.as_slice(), sig_header.as_str());
    assert!(result.is_ok());
    if let Ok(evt) = result {
        assert_eq!(evt.kind, PaymentEventKind::Succeeded);
        assert_eq!(evt.intent_ref.as_str(), "pi_ut_wh_1");
        if let Some(bref) = evt.booking_ref {
            assert!(matches!(bref.kind, BookableKind::Hotel));
            assert_eq!(bref.booking_id.as_str(), "ut-bk-wh-1");
        } else {
            assert!(false);
        }
    }
}

#[test]
fn parse_failed_event_without_metadata() {
    let proc_ctx = ut_setup_sharestate().processor_context();
    let raw_payload = ut_intent_event_payload("payment_intent.payment_failed", "pi_ut_wh_2", None);
    let sig_header = ut_sign_payload(raw_payload.as_slice(), Utc::now().timestamp());
    let result = proc_ctx.parse_webhook(raw_payload.as_slice(), sig_header.as_str());
    assert!(result.is_ok());
    if let Ok(evt) = result {
        assert_eq!(evt.kind, PaymentEventKind::Failed);
        assert_eq!(evt.intent_ref.as_str(), "pi_ut_wh_2");
        assert!(evt.booking_ref.is_none());
    }
}

#[test]
fn reject_malformed_sig_header() {
    let proc_ctx = ut_setup_sharestate().processor_context();
    let raw_payload =
        ut_intent_event_payload("payment_intent.succeeded", "pi_ut_wh_3", Some("ut-bk-wh-3"));
    let result = proc_ctx.parse_webhook(raw_payload.as_slice(), "sig=no-such-scheme");
    assert!(result.is_err());
    if let Err(e) = result {
        assert!(matches!(e.fn_label, AppProcessorFnLabel::ParseWebhook));
        let cond = matches!(
            e.reason,
            AppProcessorErrorReason::InvalidSignature(d) if d.as_str() == "malformed-header"
        );
        assert!(cond);
    }
}

#[test]
fn reject_digest_mismatch() {
    let proc_ctx = ut_setup_sharestate().processor_context();
    let raw_payload =
        ut_intent_event_payload("payment_intent.succeeded", "pi_ut_wh_4", Some("ut-bk-wh-4"));
    let sig_header = ut_sign_payload(raw_payload.as_slice(), Utc::now().timestamp());
    // the digest was computed over a different byte sequence
    let tampered =
        ut_intent_event_payload("payment_intent.succeeded", "pi_ut_wh_999", Some("ut-bk-wh-4"));
    let result = proc_ctx.parse_webhook(tampered.as_slice(), sig_header.as_str());
    assert!(result.is_err());
    if let Err(e) = result {
        let cond = matches!(
            e.reason,
            AppProcessorErrorReason::InvalidSignature(d) if d.as_str() == "digest-mismatch"
        );
        assert!(cond);
    }
}

#[test]
fn reject_stale_timestamp() {
    let proc_ctx = ut_setup_sharestate().processor_context();
    let raw_payload =
        ut_intent_event_payload("payment_intent.succeeded", "pi_ut_wh_5", Some("ut-bk-wh-5"));
    let stale_ts = Utc::now().timestamp() - 3600;
    let sig_header = ut_sign_payload(raw_payload.as_slice(), stale_ts);
    let result = proc_ctx.parse_webhook(raw_payload.as_slice(), sig_header.as_str());
    assert!(result.is_err());
    if let Err(e) = result {
        let cond = matches!(
            e.reason,
            AppProcessorErrorReason::InvalidSignature(d) if d.as_str() == "timestamp-out-of-tolerance"
        );
        assert!(cond);
    }
}

#[test]
fn reject_unsupported_event_type() {
    let proc_ctx = ut_setup_sharestate().processor_context();
    let raw_payload = ut_intent_event_payload("charge.refunded", "pi_ut_wh_6", None);
    let sig_header = ut_sign_payload(raw_payload.as_slice(), Utc::now().timestamp());
    let result = proc_ctx.parse_webhook(raw_payload.as_slice(), sig_header.as_str());
    assert!(result.is_err());
    if let Err(e) = result {
        let cond = matches!(
            e.reason,
            AppProcessorErrorReason::EventTypeUnsupported(t) if t.as_str() == "charge.refunded"
        );
        assert!(cond);
    }
}

#[test]
fn reject_malformed_payload() {
    let proc_ctx = ut_setup_sharestate().processor_context();
    let raw_payload = br#"{"type":"payment_intent.succeeded", "data":"not-an-object"}"#;
    let sig_header = ut_sign_payload(raw_payload, Utc::now().timestamp());
    let result = proc_ctx.parse_webhook(raw_payload, sig_header.as_str());
    assert!(result.is_err());
    if let Err(e) = result {
        let cond = matches!(e.reason, AppProcessorErrorReason::MalformedPayload(_d));
        assert!(cond);
    }
}
