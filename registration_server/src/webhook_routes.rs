//----------------------------------------------   Webhook  ----------------------------------------------------
//
// The HMAC middleware wrapping this scope has already verified the signature over the raw body; by the time the
// JSON extractor runs, the delivery is authentic. Responses always carry a definitive status so the gateway can
// decide whether to retry: signals that found no candidate are a 404 (legitimate for replayed or stale
// deliveries), unknown event types are acknowledged with success so the gateway does not keep retrying them.
use actix_web::{web, HttpResponse};
use cpg_common::Paise;
use log::{debug, info, trace, warn};
use razorpay_tools::data_objects::{
    EVENT_PAYMENT_CAPTURED,
    EVENT_PAYMENT_FAILED,
    EVENT_REFUND_FAILED,
    EVENT_REFUND_PROCESSED,
};
use razorpay_tools::WebhookEnvelope;
use registration_engine::{
    db_types::{OrderId, PaymentId, RefundStatus, SignalOrigin},
    traits::{CandidateStore, NotificationChannel, PaymentGatewayClient, RefundUpdate},
    CaptureOutcome,
    FailureOutcome,
    PaymentReconciler,
    ReconcileError,
    RefundOutcome,
};
use serde_json::Value;

use crate::{data_objects::JsonResponse, route};

route!(payment_webhook => Post "/payment" impl CandidateStore, PaymentGatewayClient, NotificationChannel);
pub async fn payment_webhook<B, G, N>(
    body: web::Json<Value>,
    api: web::Data<PaymentReconciler<B, G, N>>,
) -> HttpResponse
where
    B: CandidateStore,
    G: PaymentGatewayClient,
    N: NotificationChannel,
{
    trace!("🔔️ Received webhook delivery");
    let value = body.into_inner();
    let envelope = match WebhookEnvelope::from_value(&value) {
        Ok(envelope) => envelope,
        Err(e) => {
            warn!("🔔️ Could not parse webhook envelope. {e}");
            return HttpResponse::BadRequest().json(JsonResponse::failure("Unrecognized webhook envelope."));
        },
    };
    debug!("🔔️ Webhook event: {}", envelope.event);
    match envelope.event.as_str() {
        EVENT_PAYMENT_CAPTURED => {
            let Some(payment) = envelope.payload.payment else {
                return HttpResponse::BadRequest().json(JsonResponse::failure("Capture event without a payment."));
            };
            let payment = payment.entity;
            let raw = WebhookEnvelope::raw_payment_entity(&value);
            let order_id = OrderId(payment.order_id);
            let payment_id = PaymentId(payment.id);
            match api.apply_capture(&order_id, &payment_id, payment.method, raw, SignalOrigin::Webhook).await {
                Ok(CaptureOutcome::Transitioned { candidate, .. }) => {
                    info!("🔔️ Webhook capture processed for candidate #{} ({})", candidate.id, candidate.name);
                    HttpResponse::Ok().json(JsonResponse::success("Payment captured."))
                },
                Ok(CaptureOutcome::AlreadyPaid(candidate)) => {
                    info!("🔔️ Webhook capture replayed for candidate #{}; already processed.", candidate.id);
                    HttpResponse::Ok().json(JsonResponse::success("Payment already processed."))
                },
                Err(ReconcileError::OrderNotFound(order_id)) => {
                    warn!("🔔️ Capture for unknown order {order_id}");
                    HttpResponse::NotFound().json(JsonResponse::failure("Candidate not found."))
                },
                Err(e) => {
                    warn!("🔔️ Could not process capture webhook. {e}");
                    HttpResponse::InternalServerError().json(JsonResponse::failure("Could not process payment."))
                },
            }
        },
        EVENT_PAYMENT_FAILED => {
            let Some(payment) = envelope.payload.payment else {
                return HttpResponse::BadRequest().json(JsonResponse::failure("Failure event without a payment."));
            };
            let payment = payment.entity;
            let raw = WebhookEnvelope::raw_payment_entity(&value);
            let reason = payment.error_reason.or(payment.error_description);
            let order_id = OrderId(payment.order_id);
            let payment_id = PaymentId(payment.id);
            match api.apply_failure(&order_id, &payment_id, reason, raw).await {
                Ok(FailureOutcome::Transitioned(candidate)) => {
                    info!("🔔️ Payment failure recorded for candidate #{}", candidate.id);
                    HttpResponse::Ok().json(JsonResponse::success("Payment failure recorded."))
                },
                Ok(FailureOutcome::Ignored(candidate)) => {
                    info!(
                        "🔔️ Ignoring failure signal for candidate #{}; record is {}.",
                        candidate.id, candidate.payment_status
                    );
                    HttpResponse::Ok().json(JsonResponse::success("Payment already processed."))
                },
                Err(ReconcileError::OrderNotFound(order_id)) => {
                    warn!("🔔️ Failure signal for unknown order {order_id}");
                    HttpResponse::NotFound().json(JsonResponse::failure("Candidate not found."))
                },
                Err(e) => {
                    warn!("🔔️ Could not process failure webhook. {e}");
                    HttpResponse::InternalServerError().json(JsonResponse::failure("Could not process payment."))
                },
            }
        },
        EVENT_REFUND_PROCESSED | EVENT_REFUND_FAILED => {
            let Some(refund) = envelope.payload.refund else {
                return HttpResponse::BadRequest().json(JsonResponse::failure("Refund event without a refund."));
            };
            let refund = refund.entity;
            let status = if envelope.event == EVENT_REFUND_PROCESSED {
                RefundStatus::Processed
            } else {
                RefundStatus::Failed
            };
            let update = RefundUpdate {
                status,
                amount: Some(Paise::from(refund.amount)),
                refund_id: Some(refund.id),
            };
            match api.apply_refund(&PaymentId(refund.payment_id), update).await {
                Ok(RefundOutcome::Updated(candidate)) => {
                    info!("🔔️ Refund {} recorded for candidate #{}", candidate.refund_status, candidate.id);
                    HttpResponse::Ok().json(JsonResponse::success("Refund recorded."))
                },
                Ok(RefundOutcome::UnknownPayment) => {
                    info!("🔔️ Refund signal for a payment no candidate holds; ignored.");
                    HttpResponse::Ok().json(JsonResponse::success("Refund ignored: candidate not found."))
                },
                Err(e) => {
                    warn!("🔔️ Could not process refund webhook. {e}");
                    HttpResponse::InternalServerError().json(JsonResponse::failure("Could not process refund."))
                },
            }
        },
        other => {
            // Unknown events are acknowledged, not rejected, to avoid pointless gateway-side retries.
            info!("🔔️ Ignoring webhook event {other}");
            HttpResponse::Ok().json(JsonResponse::success("Event ignored."))
        },
    }
}
