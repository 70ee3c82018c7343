use actix_web::{http::StatusCode, web, web::ServiceConfig};
use registration_engine::{
    db_types::{OrderId, PaymentId, SignalOrigin},
    test_utils::{MemoryCandidateStore, RecordingChannel},
    traits::{CandidateStore, PaymentCapture},
    AttendanceApi,
    NotificationDispatcher,
};
use serde_json::json;

use super::helpers::{catalog, post_request, seed_candidate};
use crate::routes::{AttendanceScanRoute, CheckInRoute};

fn configure(
    db: MemoryCandidateStore,
    channel: RecordingChannel,
) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        let api = AttendanceApi::new(db, NotificationDispatcher::new(channel, catalog()));
        cfg.app_data(web::Data::new(api)).service(
            web::scope("/attendance")
                .service(CheckInRoute::<MemoryCandidateStore, RecordingChannel>::new())
                .service(AttendanceScanRoute::<MemoryCandidateStore, RecordingChannel>::new()),
        );
    }
}

async fn seed_paid(db: &MemoryCandidateStore, order: &str, phone: &str) {
    seed_candidate(db, order, phone).await;
    db.mark_paid_unless_paid(
        &OrderId(order.to_string()),
        PaymentCapture::new(PaymentId(format!("pay_{order}")), SignalOrigin::Webhook),
    )
    .await
    .unwrap()
    .expect("seeded candidate should transition");
}

#[actix_web::test]
async fn check_in_marks_once_and_reports_replays() {
    let _ = env_logger::try_init().ok();
    let db = MemoryCandidateStore::new();
    let channel = RecordingChannel::new();
    seed_paid(&db, "ord_1", "9876543210").await;

    let body = json!({ "whatsappNumber": "9876543210" }).to_string();
    let (status, response) =
        post_request("/attendance/check-in", body.clone(), &[], configure(db.clone(), channel.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert!(response.contains("\"status\":\"marked\""));
    assert!(response.contains("attendanceToken"));
    assert_eq!(channel.count().await, 1);

    let (status, response) =
        post_request("/attendance/check-in", body, &[], configure(db.clone(), channel.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert!(response.contains("\"status\":\"already-marked\""));
    assert_eq!(channel.count().await, 1, "a replayed check-in must not re-notify");
}

#[actix_web::test]
async fn check_in_validates_the_number_shape() {
    let _ = env_logger::try_init().ok();
    let db = MemoryCandidateStore::new();
    let channel = RecordingChannel::new();

    let body = json!({ "whatsappNumber": "+91-98765" }).to_string();
    let (status, _) = post_request("/attendance/check-in", body, &[], configure(db, channel)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn check_in_distinguishes_unknown_from_unpaid() {
    let _ = env_logger::try_init().ok();
    let db = MemoryCandidateStore::new();
    let channel = RecordingChannel::new();
    seed_candidate(&db, "ord_unpaid", "9876543211").await;

    let unknown = json!({ "whatsappNumber": "9876543210" }).to_string();
    let (status, _) = post_request("/attendance/check-in", unknown, &[], configure(db.clone(), channel.clone())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let unpaid = json!({ "whatsappNumber": "9876543211" }).to_string();
    let (status, _) = post_request("/attendance/check-in", unpaid, &[], configure(db, channel)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn staff_scan_round_trip() {
    let _ = env_logger::try_init().ok();
    let db = MemoryCandidateStore::new();
    let channel = RecordingChannel::new();
    seed_paid(&db, "ord_1", "9876543210").await;

    let check_in = json!({ "whatsappNumber": "9876543210" }).to_string();
    let (_, response) =
        post_request("/attendance/check-in", check_in, &[], configure(db.clone(), channel.clone())).await;
    let parsed: serde_json::Value = serde_json::from_str(&response).unwrap();
    let token = parsed["attendanceToken"].as_str().unwrap().to_string();

    let scan = json!({ "token": token }).to_string();
    let (status, response) =
        post_request("/attendance/scan", scan.clone(), &[], configure(db.clone(), channel.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert!(response.contains("\"status\":\"success\""));

    let (status, response) = post_request("/attendance/scan", scan, &[], configure(db.clone(), channel)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(response.contains("already-marked"));
}

#[actix_web::test]
async fn staff_scan_rejects_unknown_tokens() {
    let _ = env_logger::try_init().ok();
    let db = MemoryCandidateStore::new();
    let channel = RecordingChannel::new();

    let scan = json!({ "token": "deadbeefdeadbeefdeadbeefdeadbeef" }).to_string();
    let (status, _) = post_request("/attendance/scan", scan, &[], configure(db, channel)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
