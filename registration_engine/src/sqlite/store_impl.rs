use log::trace;
use sqlx::SqlitePool;

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
    },
    sqlite::{candidates, db},
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

/// Production candidate store backed by SQLite. Cloning is cheap; the pool is shared.
#[derive(Clone)]
pub struct SqliteCandidateStore {
    url: String,
    pool: SqlitePool,
}

impl std::fmt::Debug for SqliteCandidateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SqliteCandidateStore ({})", self.url)
    }
}

impl SqliteCandidateStore {
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db::db_url();
        Self::new_with_url(&url, max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = db::new_pool(url, max_connections).await?;
        db::create_schema(&pool).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl CandidateStore for SqliteCandidateStore {
    async fn insert_candidate(&self, candidate: NewCandidate) -> Result<Candidate, StoreError> {
        let mut conn = self.pool.acquire().await?;
        candidates::insert_candidate(candidate, &mut conn).await
    }

    async fn fetch_candidate_by_id(&self, id: i64) -> Result<Option<Candidate>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        candidates::fetch_candidate_by_id(id, &mut conn).await
    }

    async fn fetch_candidate_by_order_id(&self, order_id: &OrderId) -> Result<Option<Candidate>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        candidates::fetch_candidate_by_order_id(order_id, &mut conn).await
    }

    async fn fetch_candidate_by_payment_id(&self, payment_id: &PaymentId) -> Result<Option<Candidate>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        candidates::fetch_candidate_by_payment_id(payment_id, &mut conn).await
    }

    async fn fetch_candidate_by_token(&self, token: &AttendanceToken) -> Result<Option<Candidate>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        candidates::fetch_candidate_by_token(token, &mut conn).await
    }

    async fn fetch_latest_candidate_by_phone(&self, phone: &PhoneNumber) -> Result<Option<Candidate>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        candidates::fetch_latest_candidate_by_phone(phone, &mut conn).await
    }

    async fn fetch_latest_paid_candidate_by_phone(
        &self,
        phone: &PhoneNumber,
    ) -> Result<Option<Candidate>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        candidates::fetch_latest_paid_candidate_by_phone(phone, &mut conn).await
    }

    async fn fetch_candidates(&self, status: Option<PaymentStatus>) -> Result<Vec<Candidate>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        candidates::fetch_candidates(status, &mut conn).await
    }

    async fn fetch_pending_candidates(&self) -> Result<Vec<Candidate>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        candidates::fetch_pending_candidates(&mut conn).await
    }

    async fn fetch_certificate_candidates(&self, ids: Option<&[i64]>) -> Result<Vec<Candidate>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        candidates::fetch_certificate_candidates(ids, &mut conn).await
    }

    async fn count_certificates(&self) -> Result<CertificateCounts, StoreError> {
        let mut conn = self.pool.acquire().await?;
        candidates::count_certificates(&mut conn).await
    }

    async fn mark_paid_unless_paid(
        &self,
        order_id: &OrderId,
        capture: PaymentCapture,
    ) -> Result<Option<Candidate>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        candidates::mark_paid_unless_paid(order_id, capture, &mut conn).await
    }

    async fn mark_failed_if_pending(
        &self,
        order_id: &OrderId,
        failure: PaymentFailure,
    ) -> Result<Option<Candidate>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        candidates::mark_failed_if_pending(order_id, failure, &mut conn).await
    }

    async fn apply_refund(
        &self,
        payment_id: &PaymentId,
        refund: RefundUpdate,
    ) -> Result<Option<Candidate>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        candidates::apply_refund(payment_id, refund, &mut conn).await
    }

    async fn mark_attendance_if_unmarked(&self, id: i64) -> Result<Option<Candidate>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        candidates::mark_attendance_if_unmarked(id, &mut conn).await
    }

    async fn mark_admin_attendance_if_unmarked(&self, id: i64) -> Result<Option<Candidate>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        candidates::mark_admin_attendance_if_unmarked(id, &mut conn).await
    }

    async fn ensure_attendance_token(&self, id: i64) -> Result<Candidate, StoreError> {
        let mut conn = self.pool.acquire().await?;
        candidates::ensure_attendance_token(id, &mut conn).await
    }

    async fn record_certificate(&self, id: i64, record: CertificateRecord) -> Result<Candidate, StoreError> {
        let mut conn = self.pool.acquire().await?;
        candidates::record_certificate(id, record, &mut conn).await
    }

    async fn record_admin_action(&self, id: i64, action: AdminAction, actor: &str) -> Result<Candidate, StoreError> {
        let mut conn = self.pool.acquire().await?;
        candidates::record_admin_action(id, action, actor, &mut conn).await
    }
}
