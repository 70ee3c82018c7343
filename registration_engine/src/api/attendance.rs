use log::{debug, info};
use serde::Serialize;

use crate::{
    api::errors::AttendanceError,
    db_types::{AttendanceToken, Candidate},
    dispatch::{NotificationDispatcher, NotifyOutcome},
    helpers::normalize_phone,
    traits::{CandidateStore, NotificationChannel, StoreError},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CheckInStatus {
    Marked,
    AlreadyMarked,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckIn {
    pub status: CheckInStatus,
    pub token: AttendanceToken,
    pub candidate: Candidate,
    pub notification: Option<NotifyOutcome>,
}

#[derive(Debug, Clone, Serialize)]
pub enum ScanResult {
    Verified(Candidate),
    AlreadyVerified(Candidate),
}

/// The two-stage attendance tracker: self check-in by phone number, then staff verification by attendance token.
/// Both stages are idempotent: re-marking returns an already-marked result without touching dates or
/// re-notifying.
pub struct AttendanceApi<B, N> {
    db: B,
    dispatcher: NotificationDispatcher<N>,
}

impl<B, N> AttendanceApi<B, N>
where
    B: CandidateStore,
    N: NotificationChannel,
{
    pub fn new(db: B, dispatcher: NotificationDispatcher<N>) -> Self {
        Self { db, dispatcher }
    }

    /// Self check-in. The candidate is looked up by normalized phone number, selecting the most recently created
    /// `Paid` registration for that number. Check-in requires a completed payment; lazily generates the
    /// attendance token the staff scan will later present.
    pub async fn check_in(&self, raw_phone: &str) -> Result<CheckIn, AttendanceError> {
        let phone = normalize_phone(raw_phone)?;
        debug!("🎫️ Check-in request for {phone}");
        let candidate = match self.db.fetch_latest_paid_candidate_by_phone(&phone).await? {
            Some(c) => c,
            None => {
                // Distinguish "never registered" from "registered but unpaid" for the front desk.
                return Err(match self.db.fetch_latest_candidate_by_phone(&phone).await? {
                    Some(latest) => AttendanceError::PaymentIncomplete(latest.payment_status),
                    None => AttendanceError::NotRegistered,
                });
            },
        };
        let candidate = self.db.ensure_attendance_token(candidate.id).await?;
        let token = candidate
            .attendance_token
            .clone()
            .ok_or_else(|| StoreError::DatabaseError("attendance token missing after ensure".to_string()))?;
        match self.db.mark_attendance_if_unmarked(candidate.id).await? {
            Some(marked) => {
                info!("🎫️ Attendance marked for candidate #{} ({})", marked.id, marked.name);
                let notification = self.dispatcher.notify_attendance(&marked).await;
                Ok(CheckIn { status: CheckInStatus::Marked, token, candidate: marked, notification: Some(notification) })
            },
            None => {
                debug!("🎫️ Candidate #{} was already checked in", candidate.id);
                Ok(CheckIn { status: CheckInStatus::AlreadyMarked, token, candidate, notification: None })
            },
        }
    }

    /// Staff verification. Keyed by the attendance token (a capability, not guessable from public data) and
    /// only valid once the candidate has self-checked-in.
    pub async fn verify_scan(&self, token: &AttendanceToken) -> Result<ScanResult, AttendanceError> {
        let candidate = self.db.fetch_candidate_by_token(token).await?.ok_or(AttendanceError::UnknownToken)?;
        if !candidate.attendance {
            return Err(AttendanceError::NotCheckedIn);
        }
        match self.db.mark_admin_attendance_if_unmarked(candidate.id).await? {
            Some(verified) => {
                info!("🎫️ Staff verification recorded for candidate #{} ({})", verified.id, verified.name);
                Ok(ScanResult::Verified(verified))
            },
            None => Ok(ScanResult::AlreadyVerified(candidate)),
        }
    }
}

#[cfg(test)]
mod test {
    use chrono::Utc;
    use cpg_common::Paise;

    use super::*;
    use crate::{
        db_types::{CandidateCategory, NewCandidate, OrderId, PaymentId, SignalOrigin},
        dispatch::TemplateCatalog,
        test_utils::{prepare_env, MemoryCandidateStore, RecordingChannel},
        traits::PaymentCapture,
    };

    fn catalog() -> TemplateCatalog {
        TemplateCatalog {
            student_registration: "tpl-student".to_string(),
            working_registration: "tpl-working".to_string(),
            attendance_confirmed: "tpl-attendance".to_string(),
            accepted: "tpl-accepted".to_string(),
            rejected: "tpl-rejected".to_string(),
        }
    }

    async fn fixture() -> (AttendanceApi<MemoryCandidateStore, RecordingChannel>, MemoryCandidateStore, RecordingChannel) {
        prepare_env();
        let db = MemoryCandidateStore::new();
        let channel = RecordingChannel::new();
        let api = AttendanceApi::new(db.clone(), NotificationDispatcher::new(channel.clone(), catalog()));
        (api, db, channel)
    }

    async fn register(db: &MemoryCandidateStore, order: &str, phone: &str) -> Candidate {
        db.insert_candidate(NewCandidate {
            name: "Asha".to_string(),
            email: "asha@example.com".to_string(),
            phone: normalize_phone(phone).unwrap(),
            category: CandidateCategory::Student,
            college: None,
            company: None,
            order_id: OrderId(order.to_string()),
            receipt: format!("receipt_{order}"),
            amount: Paise::from(50_000),
            created_at: Utc::now(),
        })
        .await
        .unwrap()
    }

    async fn mark_paid(db: &MemoryCandidateStore, order: &str, payment: &str) {
        db.mark_paid_unless_paid(
            &OrderId(order.to_string()),
            PaymentCapture::new(PaymentId(payment.to_string()), SignalOrigin::Webhook),
        )
        .await
        .unwrap()
        .expect("candidate should transition");
    }

    #[tokio::test]
    async fn check_in_is_idempotent() {
        let (api, db, channel) = fixture().await;
        register(&db, "ord_1", "9876543210").await;
        mark_paid(&db, "ord_1", "pay_1").await;

        let first = api.check_in("9876543210").await.unwrap();
        assert_eq!(first.status, CheckInStatus::Marked);
        assert!(first.candidate.attendance);
        let marked_at = first.candidate.attendance_date;
        assert!(marked_at.is_some());
        assert_eq!(channel.count().await, 1);

        let second = api.check_in("9876543210").await.unwrap();
        assert_eq!(second.status, CheckInStatus::AlreadyMarked);
        assert_eq!(second.candidate.attendance_date, marked_at, "the attendance date must not change");
        assert_eq!(second.token, first.token, "the token is stable for the record's lifetime");
        assert_eq!(channel.count().await, 1, "re-marking must not re-notify");
    }

    #[tokio::test]
    async fn check_in_requires_a_paid_registration() {
        let (api, db, channel) = fixture().await;
        register(&db, "ord_1", "9876543210").await;

        let err = api.check_in("9876543210").await.expect_err("unpaid candidates cannot check in");
        assert!(matches!(err, AttendanceError::PaymentIncomplete(crate::db_types::PaymentStatus::Pending)));
        assert_eq!(channel.count().await, 0);
    }

    #[tokio::test]
    async fn check_in_rejects_unknown_numbers() {
        let (api, _db, _channel) = fixture().await;
        let err = api.check_in("9876543210").await.expect_err("unregistered numbers are a 404");
        assert!(matches!(err, AttendanceError::NotRegistered));
    }

    #[tokio::test]
    async fn check_in_rejects_malformed_numbers() {
        let (api, _db, _channel) = fixture().await;
        let err = api.check_in("+91 98765").await.expect_err("malformed numbers are a validation failure");
        assert!(matches!(err, AttendanceError::InvalidPhone(_)));
    }

    #[tokio::test]
    async fn check_in_selects_the_latest_paid_registration() {
        let (api, db, _channel) = fixture().await;
        register(&db, "ord_old", "9876543210").await;
        mark_paid(&db, "ord_old", "pay_old").await;
        // A later registration that was never paid must not shadow the paid one...
        register(&db, "ord_new_unpaid", "9876543210").await;
        // ...and a later paid registration must win over the earlier paid one.
        register(&db, "ord_new_paid", "9876543210").await;
        mark_paid(&db, "ord_new_paid", "pay_new").await;

        let checked_in = api.check_in("9876543210").await.unwrap();
        assert_eq!(checked_in.candidate.order_id, OrderId("ord_new_paid".into()));
    }

    #[tokio::test]
    async fn staff_scan_requires_prior_check_in() {
        let (api, db, _channel) = fixture().await;
        let candidate = register(&db, "ord_1", "9876543210").await;
        mark_paid(&db, "ord_1", "pay_1").await;
        let with_token = db.ensure_attendance_token(candidate.id).await.unwrap();
        let token = with_token.attendance_token.unwrap();

        let err = api.verify_scan(&token).await.expect_err("scan before check-in must fail");
        assert!(matches!(err, AttendanceError::NotCheckedIn));
    }

    #[tokio::test]
    async fn staff_scan_is_idempotent() {
        let (api, db, _channel) = fixture().await;
        register(&db, "ord_1", "9876543210").await;
        mark_paid(&db, "ord_1", "pay_1").await;
        let token = api.check_in("9876543210").await.unwrap().token;

        let first = api.verify_scan(&token).await.unwrap();
        let verified_at = match first {
            ScanResult::Verified(c) => {
                assert!(c.admin_attendance);
                c.admin_attendance_date
            },
            ScanResult::AlreadyVerified(_) => panic!("first scan must verify"),
        };

        let second = api.verify_scan(&token).await.unwrap();
        match second {
            ScanResult::AlreadyVerified(c) => assert_eq!(c.admin_attendance_date, verified_at),
            ScanResult::Verified(_) => panic!("second scan must be a no-op"),
        }
    }

    #[tokio::test]
    async fn staff_scan_rejects_unknown_tokens() {
        let (api, _db, _channel) = fixture().await;
        let err = api
            .verify_scan(&AttendanceToken("deadbeefdeadbeefdeadbeefdeadbeef".to_string()))
            .await
            .expect_err("an unknown token is not a credential");
        assert!(matches!(err, AttendanceError::UnknownToken));
    }
}
