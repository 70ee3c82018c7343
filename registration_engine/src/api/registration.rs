use chrono::Utc;
use cpg_common::{Paise, INR_CURRENCY_CODE};
use log::info;

use crate::{
    api::errors::RegistrationError,
    db_types::{AdminAction, Candidate, CandidateCategory, NewCandidate, PaymentId, PaymentStatus},
    dispatch::{NotificationDispatcher, NotifyOutcome},
    helpers::{new_receipt, normalize_phone},
    traits::{
        CandidateStore,
        GatewayOrder,
        GatewayRefund,
        NewGatewayOrder,
        NotificationChannel,
        PaymentGatewayClient,
        RefundUpdate,
    },
};
use crate::db_types::RefundStatus;

/// A registration submission as received from the transport layer. The phone number is raw here; it is
/// normalized (and validated) before anything touches the store.
#[derive(Debug, Clone)]
pub struct NewRegistration {
    pub name: String,
    pub email: String,
    pub whatsapp_number: String,
    pub category: CandidateCategory,
    pub college: Option<String>,
    pub company: Option<String>,
    /// Registration fee in minor units, exactly as quoted to the gateway.
    pub amount: Paise,
}

/// Registration intake and operator-facing candidate management.
pub struct RegistrationApi<B, G, N> {
    db: B,
    gateway: G,
    dispatcher: NotificationDispatcher<N>,
}

impl<B, G, N> RegistrationApi<B, G, N>
where
    B: CandidateStore,
    G: PaymentGatewayClient,
    N: NotificationChannel,
{
    pub fn new(db: B, gateway: G, dispatcher: NotificationDispatcher<N>) -> Self {
        Self { db, gateway, dispatcher }
    }

    /// Create a gateway order for the registration fee and insert the Pending candidate bound to it.
    pub async fn register(&self, reg: NewRegistration) -> Result<(Candidate, GatewayOrder), RegistrationError> {
        if reg.name.trim().is_empty() {
            return Err(RegistrationError::Validation("Name is required".to_string()));
        }
        if reg.amount.value() <= 0 {
            return Err(RegistrationError::Validation("Amount must be positive".to_string()));
        }
        let phone = normalize_phone(&reg.whatsapp_number)?;
        let receipt = new_receipt();
        let order = self
            .gateway
            .create_order(NewGatewayOrder {
                amount: reg.amount,
                currency: INR_CURRENCY_CODE.to_string(),
                receipt: receipt.clone(),
            })
            .await?;
        let new_candidate = NewCandidate {
            name: reg.name.trim().to_string(),
            email: reg.email,
            phone,
            category: reg.category,
            college: reg.college,
            company: reg.company,
            order_id: order.id.clone(),
            receipt,
            amount: reg.amount,
            created_at: Utc::now(),
        };
        let candidate = self.db.insert_candidate(new_candidate).await?;
        info!("📋️ Candidate #{} ({}) registered against order {}", candidate.id, candidate.name, order.id);
        Ok((candidate, order))
    }

    pub async fn list(&self, status: Option<PaymentStatus>) -> Result<Vec<Candidate>, RegistrationError> {
        Ok(self.db.fetch_candidates(status).await?)
    }

    pub async fn fetch(&self, id: i64) -> Result<Candidate, RegistrationError> {
        self.db.fetch_candidate_by_id(id).await?.ok_or(RegistrationError::CandidateNotFound(id))
    }

    pub async fn fetch_by_payment_id(&self, payment_id: &PaymentId) -> Result<Option<Candidate>, RegistrationError> {
        Ok(self.db.fetch_candidate_by_payment_id(payment_id).await?)
    }

    /// Record an operator acceptance and notify the candidate. The payment facet is untouched.
    pub async fn accept(&self, id: i64, actor: &str) -> Result<(Candidate, NotifyOutcome), RegistrationError> {
        let candidate = self.db.record_admin_action(id, AdminAction::Accepted, actor).await?;
        info!("📋️ Candidate #{} accepted by {actor}", candidate.id);
        let notification = self.dispatcher.notify_accepted(&candidate).await;
        Ok((candidate, notification))
    }

    /// Record an operator rejection and notify the candidate. The payment facet is untouched.
    pub async fn reject(&self, id: i64, actor: &str) -> Result<(Candidate, NotifyOutcome), RegistrationError> {
        let candidate = self.db.record_admin_action(id, AdminAction::Rejected, actor).await?;
        info!("📋️ Candidate #{} rejected by {actor}", candidate.id);
        let notification = self.dispatcher.notify_rejected(&candidate).await;
        Ok((candidate, notification))
    }

    /// Refund the captured payment in full through the gateway and record the refund facet. Requires a `Paid`
    /// record holding a payment id.
    pub async fn refund(&self, id: i64, actor: &str) -> Result<(Candidate, GatewayRefund), RegistrationError> {
        let candidate = self.db.fetch_candidate_by_id(id).await?.ok_or(RegistrationError::CandidateNotFound(id))?;
        let payment_id = match (&candidate.payment_status, &candidate.payment_id) {
            (PaymentStatus::Paid, Some(pid)) => pid.clone(),
            _ => return Err(RegistrationError::NoRefundablePayment),
        };
        let refund = self.gateway.refund_payment(&payment_id, candidate.amount).await?;
        self.db
            .apply_refund(&payment_id, RefundUpdate {
                status: RefundStatus::Processed,
                amount: Some(refund.amount),
                refund_id: Some(refund.id.clone()),
            })
            .await?;
        let candidate = self.db.record_admin_action(id, AdminAction::Refunded, actor).await?;
        info!("📋️ Refund {} ({}) processed for candidate #{} by {actor}", refund.id, refund.amount, candidate.id);
        Ok((candidate, refund))
    }
}
