use actix_web::{http::StatusCode, web, web::ServiceConfig};
use cpg_common::Secret;
use registration_engine::{
    db_types::{OrderId, PaymentStatus, SignalOrigin},
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
    routes::VerifyPaymentRoute,
    signature::{CallbackVerifier, SignatureVerifier},
};

const KEY_SECRET: &str = "key_secret_endpoint_test";

fn sign_callback(order_id: &str, payment_id: &str) -> String {
    SignatureVerifier::new(Secret::new(KEY_SECRET.to_string()))
        .sign(format!("{order_id}|{payment_id}").as_bytes())
        .unwrap()
}

fn configure(
    db: MemoryCandidateStore,
    channel: RecordingChannel,
) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        let gateway = MockGateway::new();
        let reconciler = PaymentReconciler::new(db, gateway, NotificationDispatcher::new(channel, catalog()));
        cfg.app_data(web::Data::new(reconciler))
            .app_data(web::Data::new(CallbackVerifier::new(Secret::new(KEY_SECRET.to_string()))))
            .service(
                web::scope("/register")
                    .service(VerifyPaymentRoute::<MemoryCandidateStore, MockGateway, RecordingChannel>::new()),
            );
    }
}

fn callback_body(order_id: &str, payment_id: &str, signature: &str) -> String {
    json!({
        "razorpay_order_id": order_id,
        "razorpay_payment_id": payment_id,
        "razorpay_signature": signature,
    })
    .to_string()
}

#[actix_web::test]
async fn a_valid_callback_captures_and_notifies() {
    let _ = env_logger::try_init().ok();
    let db = MemoryCandidateStore::new();
    let channel = RecordingChannel::new();
    seed_candidate(&db, "ord_1", "9876543210").await;

    let signature = sign_callback("ord_1", "pay_1");
    let (status, response) = post_request(
        "/register/verify",
        callback_body("ord_1", "pay_1", &signature),
        &[],
        configure(db.clone(), channel.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(response.contains("\"message\":\"success\""));

    let candidate = db.fetch_candidate_by_order_id(&OrderId("ord_1".into())).await.unwrap().unwrap();
    assert_eq!(candidate.payment_status, PaymentStatus::Paid);
    assert_eq!(candidate.payment_updated_by, Some(SignalOrigin::ClientCallback));
    assert_eq!(channel.count().await, 1);
}

#[actix_web::test]
async fn a_replayed_callback_returns_the_existing_record() {
    let _ = env_logger::try_init().ok();
    let db = MemoryCandidateStore::new();
    let channel = RecordingChannel::new();
    seed_candidate(&db, "ord_1", "9876543210").await;

    let signature = sign_callback("ord_1", "pay_1");
    let body = callback_body("ord_1", "pay_1", &signature);
    post_request("/register/verify", body.clone(), &[], configure(db.clone(), channel.clone())).await;
    let (status, response) =
        post_request("/register/verify", body, &[], configure(db.clone(), channel.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert!(response.contains("Already Registered"));
    assert_eq!(channel.count().await, 1, "a replay must not re-notify");
}

#[actix_web::test]
async fn a_mismatched_signature_leaves_the_record_untouched() {
    let _ = env_logger::try_init().ok();
    let db = MemoryCandidateStore::new();
    let channel = RecordingChannel::new();
    seed_candidate(&db, "ord_1", "9876543210").await;

    // Signed over the wrong payment id: authentic-looking, but not for this message.
    let signature = sign_callback("ord_1", "pay_other");
    let (status, response) = post_request(
        "/register/verify",
        callback_body("ord_1", "pay_1", &signature),
        &[],
        configure(db.clone(), channel.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(response.contains("Signature verification failed"));

    let candidate = db.fetch_candidate_by_order_id(&OrderId("ord_1".into())).await.unwrap().unwrap();
    assert_eq!(candidate.payment_status, PaymentStatus::Pending, "no store write on a signature failure");
    assert!(candidate.payment_id.is_none());
    assert_eq!(channel.count().await, 0);
}
