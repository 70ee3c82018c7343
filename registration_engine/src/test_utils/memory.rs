use std::{collections::BTreeMap, sync::Arc};

use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    db_types::{
        AdminAction,
        AttendanceToken,
        Candidate,
        NewCandidate,
        OrderId,
        PaymentId,
        PaymentStatus,
        PhoneNumber,
        RefundStatus,
    },
    helpers::attendance_token_for,
    traits::{
        CandidateStore,
        CertificateCounts,
        CertificateRecord,
        PaymentCapture,
        PaymentFailure,
        RefundUpdate,
        StoreError,
    },
};
use crate::db_types::SignalOrigin;

#[derive(Default)]
struct Inner {
    next_id: i64,
    candidates: BTreeMap<i64, Candidate>,
}

/// A thread-safe in-memory candidate store.
///
/// Every conditional update holds the write lock across its check-and-set, so it has the same atomicity
/// guarantee as the SQLite backend's single-statement updates. This is what the signal-race tests rely on.
#[derive(Default, Clone)]
pub struct MemoryCandidateStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryCandidateStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn materialize(id: i64, new: NewCandidate) -> Candidate {
        Candidate {
            id,
            name: new.name,
            email: new.email,
            phone: new.phone,
            category: new.category,
            college: new.college,
            company: new.company,
            order_id: new.order_id,
            receipt: new.receipt,
            amount: new.amount,
            payment_status: PaymentStatus::Pending,
            payment_id: None,
            payment_method: None,
            payment_date: None,
            payment_updated_by: None,
            payment_failure_reason: None,
            gateway_payload: None,
            refund_status: RefundStatus::None,
            refund_amount: None,
            refund_id: None,
            refund_date: None,
            attendance: false,
            attendance_date: None,
            admin_attendance: false,
            admin_attendance_date: None,
            attendance_token: None,
            certificate_sent: false,
            certificate_document_id: None,
            certificate_url: None,
            certificate_public_id: None,
            certificate_asset_id: None,
            certificate_size_bytes: None,
            certificate_message_id: None,
            certificate_message_status: None,
            certificate_sent_date: None,
            certificate_sent_by: None,
            admin_action: AdminAction::None,
            admin_action_date: None,
            admin_action_by: None,
            created_at: new.created_at,
            updated_at: new.created_at,
        }
    }
}

impl CandidateStore for MemoryCandidateStore {
    async fn insert_candidate(&self, candidate: NewCandidate) -> Result<Candidate, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.candidates.values().any(|c| c.order_id == candidate.order_id) {
            return Err(StoreError::CandidateAlreadyExists(candidate.order_id));
        }
        inner.next_id += 1;
        let id = inner.next_id;
        let record = Self::materialize(id, candidate);
        inner.candidates.insert(id, record.clone());
        Ok(record)
    }

    async fn fetch_candidate_by_id(&self, id: i64) -> Result<Option<Candidate>, StoreError> {
        Ok(self.inner.read().await.candidates.get(&id).cloned())
    }

    async fn fetch_candidate_by_order_id(&self, order_id: &OrderId) -> Result<Option<Candidate>, StoreError> {
        Ok(self.inner.read().await.candidates.values().find(|c| &c.order_id == order_id).cloned())
    }

    async fn fetch_candidate_by_payment_id(&self, payment_id: &PaymentId) -> Result<Option<Candidate>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .candidates
            .values()
            .find(|c| c.payment_id.as_ref() == Some(payment_id))
            .cloned())
    }

    async fn fetch_candidate_by_token(&self, token: &AttendanceToken) -> Result<Option<Candidate>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .candidates
            .values()
            .find(|c| c.attendance_token.as_ref() == Some(token))
            .cloned())
    }

    async fn fetch_latest_candidate_by_phone(&self, phone: &PhoneNumber) -> Result<Option<Candidate>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .candidates
            .values()
            .filter(|c| &c.phone == phone)
            .max_by_key(|c| (c.created_at, c.id))
            .cloned())
    }

    async fn fetch_latest_paid_candidate_by_phone(
        &self,
        phone: &PhoneNumber,
    ) -> Result<Option<Candidate>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .candidates
            .values()
            .filter(|c| &c.phone == phone && c.payment_status == PaymentStatus::Paid)
            .max_by_key(|c| (c.created_at, c.id))
            .cloned())
    }

    async fn fetch_candidates(&self, status: Option<PaymentStatus>) -> Result<Vec<Candidate>, StoreError> {
        let inner = self.inner.read().await;
        let mut result: Vec<Candidate> = inner
            .candidates
            .values()
            .filter(|c| status.map(|s| c.payment_status == s).unwrap_or(true))
            .cloned()
            .collect();
        result.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(result)
    }

    async fn fetch_pending_candidates(&self) -> Result<Vec<Candidate>, StoreError> {
        let inner = self.inner.read().await;
        let mut result: Vec<Candidate> =
            inner.candidates.values().filter(|c| c.payment_status == PaymentStatus::Pending).cloned().collect();
        result.sort_by_key(|c| (c.created_at, c.id));
        Ok(result)
    }

    async fn fetch_certificate_candidates(&self, ids: Option<&[i64]>) -> Result<Vec<Candidate>, StoreError> {
        let inner = self.inner.read().await;
        let result = inner
            .candidates
            .values()
            .filter(|c| c.is_eligible_for_certificate())
            .filter(|c| ids.map(|ids| ids.contains(&c.id)).unwrap_or(true))
            .cloned()
            .collect();
        Ok(result)
    }

    async fn count_certificates(&self) -> Result<CertificateCounts, StoreError> {
        let inner = self.inner.read().await;
        let eligible = inner.candidates.values().filter(|c| c.is_eligible_for_certificate()).count() as i64;
        let sent = inner
            .candidates
            .values()
            .filter(|c| c.is_eligible_for_certificate() && c.certificate_sent)
            .count() as i64;
        Ok(CertificateCounts { eligible, sent })
    }

    async fn mark_paid_unless_paid(
        &self,
        order_id: &OrderId,
        capture: PaymentCapture,
    ) -> Result<Option<Candidate>, StoreError> {
        let mut inner = self.inner.write().await;
        let candidate = inner
            .candidates
            .values_mut()
            .find(|c| &c.order_id == order_id && c.payment_status != PaymentStatus::Paid);
        Ok(candidate.map(|c| {
            c.payment_status = PaymentStatus::Paid;
            c.payment_id = Some(capture.payment_id);
            c.payment_method = capture.method;
            c.payment_date = Some(capture.paid_at);
            c.payment_updated_by = Some(capture.origin);
            c.gateway_payload = capture.payload;
            c.updated_at = capture.paid_at;
            c.clone()
        }))
    }

    async fn mark_failed_if_pending(
        &self,
        order_id: &OrderId,
        failure: PaymentFailure,
    ) -> Result<Option<Candidate>, StoreError> {
        let mut inner = self.inner.write().await;
        let candidate = inner
            .candidates
            .values_mut()
            .find(|c| &c.order_id == order_id && c.payment_status == PaymentStatus::Pending);
        Ok(candidate.map(|c| {
            let now = Utc::now();
            c.payment_status = PaymentStatus::Failed;
            c.payment_id = Some(failure.payment_id);
            c.payment_failure_reason = Some(failure.reason);
            c.payment_date = Some(now);
            c.payment_updated_by = Some(SignalOrigin::Webhook);
            c.gateway_payload = failure.payload;
            c.updated_at = now;
            c.clone()
        }))
    }

    async fn apply_refund(
        &self,
        payment_id: &PaymentId,
        refund: RefundUpdate,
    ) -> Result<Option<Candidate>, StoreError> {
        let mut inner = self.inner.write().await;
        let candidate = inner.candidates.values_mut().find(|c| c.payment_id.as_ref() == Some(payment_id));
        Ok(candidate.map(|c| {
            let now = Utc::now();
            c.refund_status = refund.status;
            if let Some(amount) = refund.amount {
                c.refund_amount = Some(amount);
            }
            if let Some(refund_id) = refund.refund_id {
                c.refund_id = Some(refund_id);
            }
            c.refund_date = Some(now);
            c.updated_at = now;
            c.clone()
        }))
    }

    async fn mark_attendance_if_unmarked(&self, id: i64) -> Result<Option<Candidate>, StoreError> {
        let mut inner = self.inner.write().await;
        let candidate = inner.candidates.get_mut(&id).filter(|c| !c.attendance);
        Ok(candidate.map(|c| {
            let now = Utc::now();
            c.attendance = true;
            c.attendance_date = Some(now);
            c.updated_at = now;
            c.clone()
        }))
    }

    async fn mark_admin_attendance_if_unmarked(&self, id: i64) -> Result<Option<Candidate>, StoreError> {
        let mut inner = self.inner.write().await;
        let candidate = inner.candidates.get_mut(&id).filter(|c| !c.admin_attendance);
        Ok(candidate.map(|c| {
            let now = Utc::now();
            c.admin_attendance = true;
            c.admin_attendance_date = Some(now);
            c.updated_at = now;
            c.clone()
        }))
    }

    async fn ensure_attendance_token(&self, id: i64) -> Result<Candidate, StoreError> {
        let mut inner = self.inner.write().await;
        let candidate = inner.candidates.get_mut(&id).ok_or(StoreError::CandidateNotFound(id))?;
        if candidate.attendance_token.is_none() {
            candidate.attendance_token = Some(attendance_token_for(candidate.id, &candidate.phone));
        }
        Ok(candidate.clone())
    }

    async fn record_certificate(&self, id: i64, record: CertificateRecord) -> Result<Candidate, StoreError> {
        let mut inner = self.inner.write().await;
        let candidate = inner.candidates.get_mut(&id).ok_or(StoreError::CandidateNotFound(id))?;
        let now = Utc::now();
        candidate.certificate_sent = true;
        candidate.certificate_document_id = Some(record.document_id);
        candidate.certificate_url = Some(record.url);
        candidate.certificate_public_id = Some(record.public_id);
        candidate.certificate_asset_id = Some(record.asset_id);
        candidate.certificate_size_bytes = Some(record.size_bytes);
        candidate.certificate_message_id = Some(record.message_id);
        candidate.certificate_message_status = Some(record.message_status);
        candidate.certificate_sent_date = Some(now);
        candidate.certificate_sent_by = Some(record.sent_by);
        candidate.updated_at = now;
        Ok(candidate.clone())
    }

    async fn record_admin_action(&self, id: i64, action: AdminAction, actor: &str) -> Result<Candidate, StoreError> {
        let mut inner = self.inner.write().await;
        let candidate = inner.candidates.get_mut(&id).ok_or(StoreError::CandidateNotFound(id))?;
        let now = Utc::now();
        candidate.admin_action = action;
        candidate.admin_action_date = Some(now);
        candidate.admin_action_by = Some(actor.to_string());
        candidate.updated_at = now;
        Ok(candidate.clone())
    }
}
