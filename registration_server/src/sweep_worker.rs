use std::time::Duration;

use log::{debug, error, info};
use registration_engine::{
    NotificationDispatcher,
    PaymentReconciler,
    SqliteCandidateStore,
    SweepOutcome,
    SweepRetry,
    SweepSummary,
    TemplateCatalog,
};
use tokio::task::JoinHandle;

use crate::integrations::{GupshupChannel, RazorpayGateway};

/// Starts the reconciliation sweep worker. Do not await the returned JoinHandle, as it will run indefinitely.
///
/// The worker is the safety net behind the webhook and callback channels: every `interval` it resolves all
/// Pending candidates against gateway truth. The sweep itself is idempotent, so overlapping signals from the
/// other channels are harmless.
pub fn start_sweep_worker(
    db: SqliteCandidateStore,
    gateway: RazorpayGateway,
    channel: GupshupChannel,
    templates: TemplateCatalog,
    retry: SweepRetry,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        let dispatcher = NotificationDispatcher::new(channel, templates);
        let reconciler = PaymentReconciler::new(db, gateway, dispatcher).with_sweep_retry(retry);
        info!("🕰️ Reconciliation sweep worker started (every {}s)", interval.as_secs());
        loop {
            timer.tick().await;
            info!("🕰️ Running reconciliation sweep");
            match reconciler.reconcile_pending().await {
                Ok(summary) => {
                    info!("🕰️ Sweep checked {} candidates, updated {}", summary.total_checked, summary.total_updated);
                    debug!("🕰️ Updated candidates: {}", updated_list(&summary));
                },
                Err(e) => {
                    error!("🕰️ Error running reconciliation sweep: {e}");
                },
            }
        }
    })
}

fn updated_list(summary: &SweepSummary) -> String {
    summary
        .results
        .iter()
        .filter(|r| {
            matches!(r.outcome, SweepOutcome::UpdatedAndNotified | SweepOutcome::UpdatedNotificationFailed)
        })
        .map(|r| format!("[{}] {}", r.candidate_id, r.name))
        .collect::<Vec<String>>()
        .join(", ")
}
