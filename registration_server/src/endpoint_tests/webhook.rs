use actix_web::{http::StatusCode, web, web::ServiceConfig};
use cpg_common::Secret;
use razorpay_tools::data_objects::WEBHOOK_SIGNATURE_HEADER;
use registration_engine::{
    db_types::{OrderId, PaymentStatus},
    test_utils::{MemoryCandidateStore, RecordingChannel},
    traits::CandidateStore,
    NotificationDispatcher,
    PaymentReconciler,
};
use serde_json::json;

use super::{
    helpers::{catalog, post_request, seed_candidate},
    mocks::MockGateway,
};
use crate::{
    middleware::HmacMiddlewareFactory,
    signature::SignatureVerifier,
    webhook_routes::PaymentWebhookRoute,
};

const WEBHOOK_SECRET: &str = "whsec_endpoint_test";

fn sign(body: &str) -> String {
    SignatureVerifier::new(Secret::new(WEBHOOK_SECRET.to_string())).sign(body.as_bytes()).unwrap()
}

/// A webhook app over the shared store and channel. The gateway mock carries no expectations: the webhook path
/// must never call the gateway, and an unexpected call panics the test.
fn configure(
    db: MemoryCandidateStore,
    channel: RecordingChannel,
) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        let gateway = MockGateway::new();
        let reconciler = PaymentReconciler::new(db, gateway, NotificationDispatcher::new(channel, catalog()));
        let verifier = SignatureVerifier::new(Secret::new(WEBHOOK_SECRET.to_string()));
        cfg.app_data(web::Data::new(reconciler)).service(
            web::scope("/webhook")
                .wrap(HmacMiddlewareFactory::new(WEBHOOK_SIGNATURE_HEADER, verifier, true))
                .service(PaymentWebhookRoute::<MemoryCandidateStore, MockGateway, RecordingChannel>::new()),
        );
    }
}

fn capture_body(order: &str, payment: &str) -> String {
    json!({
        "event": "payment.captured",
        "payload": { "payment": { "entity": {
            "id": payment,
            "order_id": order,
            "amount": 50000,
            "currency": "INR",
            "status": "captured",
            "method": "upi",
            "email": "asha@example.com",
            "contact": "+919876543210",
            "error_reason": null,
            "error_description": null,
            "created_at": 1567674599
        }}}
    })
    .to_string()
}

#[actix_web::test]
async fn signed_capture_webhook_transitions_and_notifies_once() {
    let _ = env_logger::try_init().ok();
    let db = MemoryCandidateStore::new();
    let channel = RecordingChannel::new();
    seed_candidate(&db, "ord_1", "9876543210").await;

    let body = capture_body("ord_1", "pay_1");
    let signature = sign(&body);
    let (status, response) = post_request(
        "/webhook/payment",
        body.clone(),
        &[(WEBHOOK_SIGNATURE_HEADER, signature.clone())],
        configure(db.clone(), channel.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(response.contains("\"success\":true"));

    let candidate = db.fetch_candidate_by_order_id(&OrderId("ord_1".into())).await.unwrap().unwrap();
    assert_eq!(candidate.payment_status, PaymentStatus::Paid);
    assert!(candidate.gateway_payload.is_some(), "the raw entity is stored for audit");
    assert_eq!(channel.count().await, 1);

    // A duplicate delivery of the same event still reports success to the gateway, but changes nothing.
    let (status, response) = post_request(
        "/webhook/payment",
        body,
        &[(WEBHOOK_SIGNATURE_HEADER, signature)],
        configure(db.clone(), channel.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(response.contains("already processed"));
    assert_eq!(channel.count().await, 1, "no second notification for a replay");
}

#[actix_web::test]
async fn tampered_webhooks_are_rejected_before_any_store_write() {
    let _ = env_logger::try_init().ok();
    let db = MemoryCandidateStore::new();
    let channel = RecordingChannel::new();
    seed_candidate(&db, "ord_1", "9876543210").await;

    let body = capture_body("ord_1", "pay_1");
    let forged = sign("some other body entirely");
    let (status, _) = post_request(
        "/webhook/payment",
        body,
        &[(WEBHOOK_SIGNATURE_HEADER, forged)],
        configure(db.clone(), channel.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let candidate = db.fetch_candidate_by_order_id(&OrderId("ord_1".into())).await.unwrap().unwrap();
    assert_eq!(candidate.payment_status, PaymentStatus::Pending, "a rejected delivery must not touch the record");
    assert_eq!(channel.count().await, 0);
}

#[actix_web::test]
async fn unsigned_webhooks_are_rejected() {
    let _ = env_logger::try_init().ok();
    let db = MemoryCandidateStore::new();
    let channel = RecordingChannel::new();
    seed_candidate(&db, "ord_1", "9876543210").await;

    let (status, _) =
        post_request("/webhook/payment", capture_body("ord_1", "pay_1"), &[], configure(db.clone(), channel.clone()))
            .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(channel.count().await, 0);
}

#[actix_web::test]
async fn unknown_events_are_acknowledged() {
    let _ = env_logger::try_init().ok();
    let db = MemoryCandidateStore::new();
    let channel = RecordingChannel::new();

    let body = json!({ "event": "invoice.paid", "payload": {} }).to_string();
    let signature = sign(&body);
    let (status, response) = post_request(
        "/webhook/payment",
        body,
        &[(WEBHOOK_SIGNATURE_HEADER, signature)],
        configure(db, channel),
    )
    .await;
    // Acknowledged, not rejected, so the gateway does not keep retrying an event we will never handle.
    assert_eq!(status, StatusCode::OK);
    assert!(response.contains("\"success\":true"));
}

#[actix_web::test]
async fn failure_events_never_downgrade_a_paid_record() {
    let _ = env_logger::try_init().ok();
    let db = MemoryCandidateStore::new();
    let channel = RecordingChannel::new();
    seed_candidate(&db, "ord_1", "9876543210").await;

    let capture = capture_body("ord_1", "pay_1");
    let capture_sig = sign(&capture);
    post_request(
        "/webhook/payment",
        capture,
        &[(WEBHOOK_SIGNATURE_HEADER, capture_sig)],
        configure(db.clone(), channel.clone()),
    )
    .await;

    let failure = json!({
        "event": "payment.failed",
        "payload": { "payment": { "entity": {
            "id": "pay_2",
            "order_id": "ord_1",
            "amount": 50000,
            "currency": "INR",
            "status": "failed",
            "method": null,
            "email": null,
            "contact": null,
            "error_reason": "payment_declined",
            "error_description": "Declined by issuer",
            "created_at": 1567674800
        }}}
    })
    .to_string();
    let failure_sig = sign(&failure);
    let (status, _) = post_request(
        "/webhook/payment",
        failure,
        &[(WEBHOOK_SIGNATURE_HEADER, failure_sig)],
        configure(db.clone(), channel.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let candidate = db.fetch_candidate_by_order_id(&OrderId("ord_1".into())).await.unwrap().unwrap();
    assert_eq!(candidate.payment_status, PaymentStatus::Paid);
    assert!(candidate.payment_failure_reason.is_none());
}

#[actix_web::test]
async fn capture_for_an_unknown_order_is_a_404() {
    let _ = env_logger::try_init().ok();
    let db = MemoryCandidateStore::new();
    let channel = RecordingChannel::new();

    let body = capture_body("ord_ghost", "pay_1");
    let signature = sign(&body);
    let (status, _) = post_request(
        "/webhook/payment",
        body,
        &[(WEBHOOK_SIGNATURE_HEADER, signature)],
        configure(db, channel),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
