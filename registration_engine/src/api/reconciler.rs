use std::time::Duration;

use chrono::Utc;
use log::{debug, info, warn};
use serde_json::Value;

use crate::{
    api::{
        errors::ReconcileError,
        objects::{CaptureOutcome, FailureOutcome, RefundOutcome, SweepOutcome, SweepRecord, SweepSummary},
    },
    db_types::{Candidate, OrderId, PaymentId, PaymentStatus, SignalOrigin},
    dispatch::{NotificationDispatcher, NotifyOutcome},
    traits::{
        CandidateStore,
        GatewayClientError,
        GatewayPayment,
        GatewayPaymentStatus,
        NotificationChannel,
        PaymentCapture,
        PaymentFailure,
        PaymentGatewayClient,
        RefundUpdate,
    },
};

/// Retry policy for the sweep's last-resort resolution step: when an order reports itself fully paid but no
/// captured payment is visible yet, wait this long and list the payments once more. Gateway reads can lag their
/// writes by a moment. A zero delay disables the retry.
#[derive(Debug, Clone, Copy)]
pub struct SweepRetry {
    pub delay: Duration,
}

impl Default for SweepRetry {
    fn default() -> Self {
        Self { delay: Duration::from_millis(1000) }
    }
}

impl SweepRetry {
    pub fn disabled() -> Self {
        Self { delay: Duration::ZERO }
    }

    pub fn is_enabled(&self) -> bool {
        !self.delay.is_zero()
    }
}

/// The payment state machine.
///
/// Three independent channels observe the same external fact, a payment capture, with different latency and
/// reliability: the gateway webhook (push, may be delayed or dropped), the client verification callback
/// (immediate, but only if the browser survives checkout) and the reconciliation sweep (slow, but exhaustive).
/// All three converge on [`PaymentReconciler::apply_capture`], whose only write is a store-level conditional
/// update. Whatever the arrival order or duplication, the record ends `Paid` if and only if the gateway ever
/// captured a payment for its order, and the paid notification goes out exactly once, sent by the caller that won
/// the conditional write.
pub struct PaymentReconciler<B, G, N> {
    db: B,
    gateway: G,
    dispatcher: NotificationDispatcher<N>,
    retry: SweepRetry,
}

impl<B, G, N> PaymentReconciler<B, G, N>
where
    B: CandidateStore,
    G: PaymentGatewayClient,
    N: NotificationChannel,
{
    pub fn new(db: B, gateway: G, dispatcher: NotificationDispatcher<N>) -> Self {
        Self { db, gateway, dispatcher, retry: SweepRetry::default() }
    }

    pub fn with_sweep_retry(mut self, retry: SweepRetry) -> Self {
        self.retry = retry;
        self
    }

    /// Apply a capture signal for the given order. This is the single conditional transition used by every
    /// signal source; `origin` only tags the audit trail.
    ///
    /// A failed precondition (the record is already `Paid`) is a no-op, not an error: the existing record is
    /// returned and no notification is sent. The notification for a successful transition is best-effort: its
    /// outcome is reported, but the committed `Paid` write stands regardless.
    pub async fn apply_capture(
        &self,
        order_id: &OrderId,
        payment_id: &PaymentId,
        method: Option<String>,
        payload: Option<Value>,
        origin: SignalOrigin,
    ) -> Result<CaptureOutcome, ReconcileError> {
        let capture = PaymentCapture {
            payment_id: payment_id.clone(),
            method,
            payload,
            origin,
            paid_at: Utc::now(),
        };
        match self.db.mark_paid_unless_paid(order_id, capture).await? {
            Some(candidate) => {
                info!(
                    "🔄️💰️ Candidate #{} ({}) marked Paid for order {order_id} via {origin}",
                    candidate.id, candidate.name
                );
                let notification = self.dispatcher.notify_registration(&candidate).await;
                if !notification.succeeded() {
                    warn!(
                        "🔄️💰️ Payment confirmation for candidate #{} committed, but the notification failed. \
                         The state write stands.",
                        candidate.id
                    );
                }
                Ok(CaptureOutcome::Transitioned { candidate, notification })
            },
            None => {
                let existing = self
                    .db
                    .fetch_candidate_by_order_id(order_id)
                    .await?
                    .ok_or_else(|| ReconcileError::OrderNotFound(order_id.clone()))?;
                debug!(
                    "🔄️💰️ Capture replay for order {order_id}; candidate #{} is already {}. No-op.",
                    existing.id, existing.payment_status
                );
                Ok(CaptureOutcome::AlreadyPaid(existing))
            },
        }
    }

    /// The client verification callback. The transport layer has already verified the callback signature;
    /// semantically this is just a capture observed through the browser channel.
    pub async fn process_client_callback(
        &self,
        order_id: &OrderId,
        payment_id: &PaymentId,
    ) -> Result<CaptureOutcome, ReconcileError> {
        self.apply_capture(order_id, payment_id, Some("Online".to_string()), None, SignalOrigin::ClientCallback)
            .await
    }

    /// Apply a failed-payment signal. Only a `Pending` record transitions; a `Paid` record is never downgraded.
    pub async fn apply_failure(
        &self,
        order_id: &OrderId,
        payment_id: &PaymentId,
        reason: Option<String>,
        payload: Option<Value>,
    ) -> Result<FailureOutcome, ReconcileError> {
        let failure = PaymentFailure {
            payment_id: payment_id.clone(),
            reason: reason.unwrap_or_else(|| "Payment cancelled by user".to_string()),
            payload,
        };
        match self.db.mark_failed_if_pending(order_id, failure).await? {
            Some(candidate) => {
                info!("🔄️💰️ Candidate #{} ({}) marked Failed for order {order_id}", candidate.id, candidate.name);
                Ok(FailureOutcome::Transitioned(candidate))
            },
            None => {
                let existing = self
                    .db
                    .fetch_candidate_by_order_id(order_id)
                    .await?
                    .ok_or_else(|| ReconcileError::OrderNotFound(order_id.clone()))?;
                debug!(
                    "🔄️💰️ Ignoring failure signal for order {order_id}; candidate #{} is {}.",
                    existing.id, existing.payment_status
                );
                Ok(FailureOutcome::Ignored(existing))
            },
        }
    }

    /// Apply a refund signal, keyed by payment id. A refund for a payment no candidate holds is acknowledged and
    /// dropped; stale refund webhooks are not an error.
    pub async fn apply_refund(
        &self,
        payment_id: &PaymentId,
        update: RefundUpdate,
    ) -> Result<RefundOutcome, ReconcileError> {
        match self.db.apply_refund(payment_id, update).await? {
            Some(candidate) => {
                info!(
                    "🔄️💰️ Refund facet updated to {} for candidate #{} ({})",
                    candidate.refund_status, candidate.id, candidate.name
                );
                Ok(RefundOutcome::Updated(candidate))
            },
            None => {
                info!("🔄️💰️ No candidate holds payment {payment_id}; refund signal dropped");
                Ok(RefundOutcome::UnknownPayment)
            },
        }
    }

    /// The polling safety net: resolve every `Pending` candidate against gateway truth. Candidates are
    /// processed independently; one failure is recorded and the sweep moves on.
    pub async fn reconcile_pending(&self) -> Result<SweepSummary, ReconcileError> {
        let pending = self.db.fetch_pending_candidates().await?;
        info!("🔄️🧹️ Reconciliation sweep starting over {} pending candidates", pending.len());
        let mut summary = SweepSummary::new(pending.len());
        for candidate in &pending {
            summary.push(self.reconcile_candidate(candidate).await);
        }
        info!(
            "🔄️🧹️ Sweep complete. Checked {}, updated {}.",
            summary.total_checked, summary.total_updated
        );
        Ok(summary)
    }

    /// Replay the sweep resolution for one candidate, regardless of how it was selected.
    pub async fn check_candidate(&self, id: i64) -> Result<SweepRecord, ReconcileError> {
        let candidate = self.db.fetch_candidate_by_id(id).await?.ok_or(ReconcileError::CandidateNotFound(id))?;
        if candidate.payment_status == PaymentStatus::Paid {
            return Ok(SweepRecord {
                candidate_id: candidate.id,
                name: candidate.name,
                outcome: SweepOutcome::AlreadyPaid,
                payment_id: candidate.payment_id,
                error: None,
            });
        }
        Ok(self.reconcile_candidate(&candidate).await)
    }

    async fn reconcile_candidate(&self, candidate: &Candidate) -> SweepRecord {
        match self.resolve_captured_payment(candidate).await {
            Ok(Some(payment)) => {
                let capture = self
                    .apply_capture(
                        &candidate.order_id,
                        &payment.id,
                        payment.method.clone(),
                        payment.raw.clone(),
                        SignalOrigin::Sweep,
                    )
                    .await;
                match capture {
                    Ok(CaptureOutcome::Transitioned { notification, .. }) => {
                        let outcome = match notification {
                            NotifyOutcome::Sent(_) => SweepOutcome::UpdatedAndNotified,
                            NotifyOutcome::Failed(_) => SweepOutcome::UpdatedNotificationFailed,
                        };
                        SweepRecord {
                            candidate_id: candidate.id,
                            name: candidate.name.clone(),
                            outcome,
                            payment_id: Some(payment.id),
                            error: None,
                        }
                    },
                    // A racing webhook or callback already applied this capture.
                    Ok(CaptureOutcome::AlreadyPaid(_)) => SweepRecord {
                        candidate_id: candidate.id,
                        name: candidate.name.clone(),
                        outcome: SweepOutcome::AlreadyPaid,
                        payment_id: Some(payment.id),
                        error: None,
                    },
                    Err(e) => {
                        warn!("🔄️🧹️ Could not apply capture for candidate #{}. {e}", candidate.id);
                        SweepRecord {
                            candidate_id: candidate.id,
                            name: candidate.name.clone(),
                            outcome: SweepOutcome::Error,
                            payment_id: Some(payment.id),
                            error: Some(e.to_string()),
                        }
                    },
                }
            },
            Ok(None) => SweepRecord {
                candidate_id: candidate.id,
                name: candidate.name.clone(),
                outcome: SweepOutcome::StillPending,
                payment_id: candidate.payment_id.clone(),
                error: None,
            },
            Err(e) => {
                warn!("🔄️🧹️ Could not resolve payment state for candidate #{}. {e}", candidate.id);
                SweepRecord {
                    candidate_id: candidate.id,
                    name: candidate.name.clone(),
                    outcome: SweepOutcome::Error,
                    payment_id: candidate.payment_id.clone(),
                    error: Some(e.to_string()),
                }
            },
        }
    }

    /// Resolution order, most to least specific: the known payment id, the order's payment list, then the order
    /// itself with an optional delay-and-retry for gateway write-after-read lag. The first two steps swallow
    /// gateway errors (a later step may still succeed); the last one propagates them.
    async fn resolve_captured_payment(
        &self,
        candidate: &Candidate,
    ) -> Result<Option<GatewayPayment>, GatewayClientError> {
        if let Some(payment_id) = &candidate.payment_id {
            match self.gateway.fetch_payment(payment_id).await {
                Ok(p) if p.status == GatewayPaymentStatus::Captured => return Ok(Some(p)),
                Ok(p) => debug!("🔄️🧹️ Payment {payment_id} for candidate #{} is {:?}", candidate.id, p.status),
                Err(e) => debug!("🔄️🧹️ Could not fetch payment {payment_id} for candidate #{}. {e}", candidate.id),
            }
        }
        match self.gateway.payments_for_order(&candidate.order_id).await {
            Ok(payments) => {
                if let Some(p) = pick_captured(payments) {
                    return Ok(Some(p));
                }
            },
            Err(e) => debug!("🔄️🧹️ Could not list payments for order {}. {e}", candidate.order_id),
        }
        let order = self.gateway.fetch_order(&candidate.order_id).await?;
        if order.is_fully_paid() && self.retry.is_enabled() {
            debug!(
                "🔄️🧹️ Order {} reports itself fully paid but no captured payment is visible; retrying the \
                 listing after {}ms",
                candidate.order_id,
                self.retry.delay.as_millis()
            );
            tokio::time::sleep(self.retry.delay).await;
            let payments = self.gateway.payments_for_order(&candidate.order_id).await?;
            return Ok(pick_captured(payments));
        }
        Ok(None)
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

/// If multiple payment attempts exist on one order, only a captured one settles it.
fn pick_captured(payments: Vec<GatewayPayment>) -> Option<GatewayPayment> {
    payments.into_iter().find(|p| p.status == GatewayPaymentStatus::Captured)
}

#[cfg(test)]
mod test {
    use chrono::Utc;
    use cpg_common::Paise;

    use super::*;
    use crate::{
        db_types::{CandidateCategory, NewCandidate, RefundStatus},
        dispatch::TemplateCatalog,
        helpers::normalize_phone,
        test_utils::{prepare_env, MemoryCandidateStore, RecordingChannel, ScriptedGateway},
        traits::GatewayOrder,
    };

    type TestReconciler = PaymentReconciler<MemoryCandidateStore, ScriptedGateway, RecordingChannel>;

    fn catalog() -> TemplateCatalog {
        TemplateCatalog {
            student_registration: "tpl-student".to_string(),
            working_registration: "tpl-working".to_string(),
            attendance_confirmed: "tpl-attendance".to_string(),
            accepted: "tpl-accepted".to_string(),
            rejected: "tpl-rejected".to_string(),
        }
    }

    struct Fixture {
        reconciler: TestReconciler,
        db: MemoryCandidateStore,
        gateway: ScriptedGateway,
        channel: RecordingChannel,
    }

    async fn fixture() -> Fixture {
        prepare_env();
        let db = MemoryCandidateStore::new();
        let gateway = ScriptedGateway::new();
        let channel = RecordingChannel::new();
        let dispatcher = NotificationDispatcher::new(channel.clone(), catalog());
        let reconciler = PaymentReconciler::new(db.clone(), gateway.clone(), dispatcher)
            .with_sweep_retry(SweepRetry::disabled());
        Fixture { reconciler, db, gateway, channel }
    }

    async fn register(db: &MemoryCandidateStore, order: &str, phone: &str) -> Candidate {
        db.insert_candidate(NewCandidate {
            name: "Asha".to_string(),
            email: "asha@example.com".to_string(),
            phone: normalize_phone(phone).unwrap(),
            category: CandidateCategory::Student,
            college: Some("Gitam".to_string()),
            company: None,
            order_id: OrderId(order.to_string()),
            receipt: format!("receipt_{order}"),
            amount: Paise::from(50_000),
            created_at: Utc::now(),
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn capture_transitions_exactly_once() {
        let f = fixture().await;
        register(&f.db, "ord_1", "9876543210").await;

        let first = f
            .reconciler
            .apply_capture(
                &OrderId("ord_1".into()),
                &PaymentId("pay_1".into()),
                Some("upi".into()),
                None,
                SignalOrigin::Webhook,
            )
            .await
            .unwrap();
        let candidate = match first {
            CaptureOutcome::Transitioned { candidate, notification } => {
                assert!(notification.succeeded());
                candidate
            },
            CaptureOutcome::AlreadyPaid(_) => panic!("first capture must transition"),
        };
        assert_eq!(candidate.payment_status, PaymentStatus::Paid);
        assert_eq!(candidate.payment_id, Some(PaymentId("pay_1".into())));
        assert_eq!(candidate.payment_updated_by, Some(SignalOrigin::Webhook));

        // Duplicate webhook delivery for the same event: no state change, no second notification.
        let replay = f
            .reconciler
            .apply_capture(
                &OrderId("ord_1".into()),
                &PaymentId("pay_1".into()),
                Some("upi".into()),
                None,
                SignalOrigin::Webhook,
            )
            .await
            .unwrap();
        assert!(matches!(replay, CaptureOutcome::AlreadyPaid(_)));
        assert_eq!(f.channel.count().await, 1);

        let sent = f.channel.sent().await;
        assert_eq!(sent[0].template_id.as_deref(), Some("tpl-student"));
        assert_eq!(sent[0].to, "919876543210");
    }

    #[tokio::test]
    async fn failed_signal_never_downgrades_a_paid_record() {
        let f = fixture().await;
        register(&f.db, "ord_1", "9876543210").await;
        f.reconciler.process_client_callback(&OrderId("ord_1".into()), &PaymentId("pay_1".into())).await.unwrap();

        let outcome = f
            .reconciler
            .apply_failure(&OrderId("ord_1".into()), &PaymentId("pay_2".into()), Some("late decline".into()), None)
            .await
            .unwrap();
        let untouched = match outcome {
            FailureOutcome::Ignored(c) => c,
            FailureOutcome::Transitioned(_) => panic!("a paid record must not be downgraded"),
        };
        assert_eq!(untouched.payment_status, PaymentStatus::Paid);
        assert_eq!(untouched.payment_id, Some(PaymentId("pay_1".into())));
        assert!(untouched.payment_failure_reason.is_none());
    }

    #[tokio::test]
    async fn failure_from_pending_records_the_reason() {
        let f = fixture().await;
        register(&f.db, "ord_1", "9876543210").await;

        let outcome = f
            .reconciler
            .apply_failure(&OrderId("ord_1".into()), &PaymentId("pay_1".into()), Some("card declined".into()), None)
            .await
            .unwrap();
        let failed = match outcome {
            FailureOutcome::Transitioned(c) => c,
            FailureOutcome::Ignored(_) => panic!("a pending record must transition to Failed"),
        };
        assert_eq!(failed.payment_status, PaymentStatus::Failed);
        assert_eq!(failed.payment_failure_reason.as_deref(), Some("card declined"));
        // Failure is not a paid transition; nothing is sent.
        assert_eq!(f.channel.count().await, 0);
    }

    #[tokio::test]
    async fn concurrent_signals_converge_to_one_transition() {
        let f = fixture().await;
        register(&f.db, "ord_1", "9876543210").await;

        let order_id = OrderId("ord_1".into());
        let payment_id = PaymentId("pay_1".into());
        let webhook = f.reconciler.apply_capture(
            &order_id,
            &payment_id,
            Some("upi".into()),
            None,
            SignalOrigin::Webhook,
        );
        let callback = f.reconciler.process_client_callback(&order_id, &payment_id);
        let (a, b) = tokio::join!(webhook, callback);

        let transitions = [a.unwrap(), b.unwrap()]
            .iter()
            .filter(|o| matches!(o, CaptureOutcome::Transitioned { .. }))
            .count();
        assert_eq!(transitions, 1, "exactly one signal may win the conditional write");
        assert_eq!(f.channel.count().await, 1, "exactly one notification may be sent");

        let candidate = f.db.fetch_candidate_by_order_id(&order_id).await.unwrap().unwrap();
        assert_eq!(candidate.payment_status, PaymentStatus::Paid);
    }

    #[tokio::test]
    async fn notification_failure_does_not_roll_back_the_write() {
        let f = fixture().await;
        register(&f.db, "ord_1", "9876543210").await;
        f.channel.fail_all().await;

        let outcome = f
            .reconciler
            .apply_capture(&OrderId("ord_1".into()), &PaymentId("pay_1".into()), None, None, SignalOrigin::Webhook)
            .await
            .unwrap();
        match outcome {
            CaptureOutcome::Transitioned { candidate, notification } => {
                assert!(!notification.succeeded());
                assert_eq!(candidate.payment_status, PaymentStatus::Paid);
            },
            CaptureOutcome::AlreadyPaid(_) => panic!("expected a transition"),
        }
        let stored = f.db.fetch_candidate_by_order_id(&OrderId("ord_1".into())).await.unwrap().unwrap();
        assert_eq!(stored.payment_status, PaymentStatus::Paid);
    }

    #[tokio::test]
    async fn sweep_finds_captures_via_the_order_payment_list() {
        let f = fixture().await;
        register(&f.db, "ord_1", "9876543210").await;
        f.gateway
            .stage_payment(ScriptedGateway::captured(&OrderId("ord_1".into()), "pay_1", Paise::from(50_000)))
            .await;

        let summary = f.reconciler.reconcile_pending().await.unwrap();
        assert_eq!(summary.total_checked, 1);
        assert_eq!(summary.total_updated, 1);
        assert_eq!(summary.results[0].outcome, SweepOutcome::UpdatedAndNotified);
        assert_eq!(summary.results[0].payment_id, Some(PaymentId("pay_1".into())));
        assert_eq!(f.channel.count().await, 1);

        let candidate = f.db.fetch_candidate_by_order_id(&OrderId("ord_1".into())).await.unwrap().unwrap();
        assert_eq!(candidate.payment_status, PaymentStatus::Paid);
        assert_eq!(candidate.payment_updated_by, Some(SignalOrigin::Sweep));
    }

    #[tokio::test]
    async fn sweep_isolates_per_candidate_failures() {
        let f = fixture().await;
        // No staged order or payments: resolution for this one errors at the order fetch.
        register(&f.db, "ord_broken", "9876543210").await;
        register(&f.db, "ord_good", "9876543211").await;
        f.gateway
            .stage_payment(ScriptedGateway::captured(&OrderId("ord_good".into()), "pay_good", Paise::from(50_000)))
            .await;

        let summary = f.reconciler.reconcile_pending().await.unwrap();
        assert_eq!(summary.total_checked, 2);
        assert_eq!(summary.total_updated, 1);
        let broken = summary.results.iter().find(|r| r.name == "Asha" && r.outcome == SweepOutcome::Error);
        assert!(broken.is_some(), "the unresolvable candidate must be recorded, not dropped");
        assert!(summary.results.iter().any(|r| r.outcome == SweepOutcome::UpdatedAndNotified));
    }

    #[tokio::test]
    async fn sweep_leaves_unpaid_candidates_pending() {
        let f = fixture().await;
        register(&f.db, "ord_1", "9876543210").await;
        f.gateway
            .stage_order(GatewayOrder {
                id: OrderId("ord_1".into()),
                amount: Paise::from(50_000),
                amount_paid: Paise::from(0),
                status: "created".to_string(),
                receipt: None,
            })
            .await;

        let summary = f.reconciler.reconcile_pending().await.unwrap();
        assert_eq!(summary.total_updated, 0);
        assert_eq!(summary.results[0].outcome, SweepOutcome::StillPending);
        assert_eq!(f.channel.count().await, 0);
    }

    #[tokio::test]
    async fn sweep_retries_the_listing_for_a_fully_paid_order() {
        let f = fixture().await;
        let reconciler = PaymentReconciler::new(
            f.db.clone(),
            f.gateway.clone(),
            NotificationDispatcher::new(f.channel.clone(), catalog()),
        )
        .with_sweep_retry(SweepRetry { delay: Duration::from_millis(600) });
        register(&f.db, "ord_1", "9876543210").await;
        // The order reports itself fully paid, but the payment listing lags behind.
        f.gateway
            .stage_order(GatewayOrder {
                id: OrderId("ord_1".into()),
                amount: Paise::from(50_000),
                amount_paid: Paise::from(50_000),
                status: "paid".to_string(),
                receipt: None,
            })
            .await;
        let gateway = f.gateway.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            gateway
                .stage_payment(ScriptedGateway::captured(&OrderId("ord_1".into()), "pay_late", Paise::from(50_000)))
                .await;
        });

        let summary = reconciler.reconcile_pending().await.unwrap();
        assert_eq!(summary.total_updated, 1);
        assert_eq!(summary.results[0].payment_id, Some(PaymentId("pay_late".into())));
    }

    #[tokio::test]
    async fn refunds_update_the_matching_record_only() {
        let f = fixture().await;
        register(&f.db, "ord_1", "9876543210").await;
        f.reconciler.process_client_callback(&OrderId("ord_1".into()), &PaymentId("pay_1".into())).await.unwrap();

        let outcome = f
            .reconciler
            .apply_refund(&PaymentId("pay_1".into()), RefundUpdate {
                status: RefundStatus::Processed,
                amount: Some(Paise::from(50_000)),
                refund_id: Some("rfnd_1".into()),
            })
            .await
            .unwrap();
        match outcome {
            RefundOutcome::Updated(c) => {
                assert_eq!(c.refund_status, RefundStatus::Processed);
                assert_eq!(c.refund_amount, Some(Paise::from(50_000)));
                assert_eq!(c.refund_id.as_deref(), Some("rfnd_1"));
                assert_eq!(c.payment_status, PaymentStatus::Paid);
            },
            RefundOutcome::UnknownPayment => panic!("refund must match the captured payment"),
        }

        let stale = f
            .reconciler
            .apply_refund(&PaymentId("pay_unknown".into()), RefundUpdate {
                status: RefundStatus::Processed,
                amount: None,
                refund_id: None,
            })
            .await
            .unwrap();
        assert!(matches!(stale, RefundOutcome::UnknownPayment));
    }

    #[tokio::test]
    async fn check_candidate_reports_already_paid_records() {
        let f = fixture().await;
        let candidate = register(&f.db, "ord_1", "9876543210").await;
        f.reconciler.process_client_callback(&OrderId("ord_1".into()), &PaymentId("pay_1".into())).await.unwrap();

        let record = f.reconciler.check_candidate(candidate.id).await.unwrap();
        assert_eq!(record.outcome, SweepOutcome::AlreadyPaid);
        assert_eq!(f.channel.count().await, 1);
    }
}
