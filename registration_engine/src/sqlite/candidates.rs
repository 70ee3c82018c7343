use chrono::Utc;
use log::debug;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

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
        SignalOrigin,
    },
    helpers::attendance_token_for,
    traits::{CertificateCounts, CertificateRecord, PaymentCapture, PaymentFailure, RefundUpdate, StoreError},
};

pub async fn insert_candidate(
    candidate: NewCandidate,
    conn: &mut SqliteConnection,
) -> Result<Candidate, StoreError> {
    let now = Utc::now();
    let result = sqlx::query_as::<_, Candidate>(
        r#"
            INSERT INTO candidates (
                name, email, phone, category, college, company,
                order_id, receipt, amount, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *;
        "#,
    )
    .bind(candidate.name)
    .bind(candidate.email)
    .bind(candidate.phone)
    .bind(candidate.category)
    .bind(candidate.college)
    .bind(candidate.company)
    .bind(candidate.order_id.clone())
    .bind(candidate.receipt)
    .bind(candidate.amount)
    .bind(candidate.created_at)
    .bind(now)
    .fetch_one(conn)
    .await;
    match result {
        Ok(inserted) => {
            debug!("📝️ Candidate [{}] inserted with id {}", inserted.order_id, inserted.id);
            Ok(inserted)
        },
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            Err(StoreError::CandidateAlreadyExists(candidate.order_id))
        },
        Err(e) => Err(e.into()),
    }
}

pub async fn fetch_candidate_by_id(id: i64, conn: &mut SqliteConnection) -> Result<Option<Candidate>, StoreError> {
    let candidate =
        sqlx::query_as("SELECT * FROM candidates WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(candidate)
}

pub async fn fetch_candidate_by_order_id(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Candidate>, StoreError> {
    let candidate = sqlx::query_as("SELECT * FROM candidates WHERE order_id = $1")
        .bind(order_id.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(candidate)
}

pub async fn fetch_candidate_by_payment_id(
    payment_id: &PaymentId,
    conn: &mut SqliteConnection,
) -> Result<Option<Candidate>, StoreError> {
    let candidate = sqlx::query_as("SELECT * FROM candidates WHERE payment_id = $1")
        .bind(payment_id.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(candidate)
}

pub async fn fetch_candidate_by_token(
    token: &AttendanceToken,
    conn: &mut SqliteConnection,
) -> Result<Option<Candidate>, StoreError> {
    let candidate = sqlx::query_as("SELECT * FROM candidates WHERE attendance_token = $1")
        .bind(token.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(candidate)
}

/// Registrations are ordered by creation time, ties broken by the higher rowid.
pub async fn fetch_latest_candidate_by_phone(
    phone: &PhoneNumber,
    conn: &mut SqliteConnection,
) -> Result<Option<Candidate>, StoreError> {
    let candidate = sqlx::query_as(
        "SELECT * FROM candidates WHERE phone = $1 ORDER BY created_at DESC, id DESC LIMIT 1",
    )
    .bind(phone.as_str())
    .fetch_optional(conn)
    .await?;
    Ok(candidate)
}

pub async fn fetch_latest_paid_candidate_by_phone(
    phone: &PhoneNumber,
    conn: &mut SqliteConnection,
) -> Result<Option<Candidate>, StoreError> {
    let candidate = sqlx::query_as(
        "SELECT * FROM candidates WHERE phone = $1 AND payment_status = 'Paid' ORDER BY created_at DESC, id DESC \
         LIMIT 1",
    )
    .bind(phone.as_str())
    .fetch_optional(conn)
    .await?;
    Ok(candidate)
}

pub async fn fetch_candidates(
    status: Option<PaymentStatus>,
    conn: &mut SqliteConnection,
) -> Result<Vec<Candidate>, StoreError> {
    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM candidates");
    if let Some(status) = status {
        builder.push(" WHERE payment_status = ");
        builder.push_bind(status);
    }
    builder.push(" ORDER BY created_at DESC, id DESC");
    let candidates = builder.build_query_as::<Candidate>().fetch_all(conn).await?;
    Ok(candidates)
}

pub async fn fetch_pending_candidates(conn: &mut SqliteConnection) -> Result<Vec<Candidate>, StoreError> {
    let candidates =
        sqlx::query_as("SELECT * FROM candidates WHERE payment_status = 'Pending' ORDER BY created_at ASC")
            .fetch_all(conn)
            .await?;
    Ok(candidates)
}

pub async fn fetch_certificate_candidates(
    ids: Option<&[i64]>,
    conn: &mut SqliteConnection,
) -> Result<Vec<Candidate>, StoreError> {
    let mut builder: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT * FROM candidates WHERE attendance = 1 AND payment_status = 'Paid'");
    if let Some(ids) = ids {
        builder.push(" AND id IN (");
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");
    }
    builder.push(" ORDER BY attendance_date DESC");
    let candidates = builder.build_query_as::<Candidate>().fetch_all(conn).await?;
    Ok(candidates)
}

pub async fn count_certificates(conn: &mut SqliteConnection) -> Result<CertificateCounts, StoreError> {
    let eligible: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM candidates WHERE attendance = 1 AND payment_status = 'Paid'")
            .fetch_one(&mut *conn)
            .await?;
    let sent: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM candidates WHERE attendance = 1 AND payment_status = 'Paid' AND certificate_sent = 1",
    )
    .fetch_one(conn)
    .await?;
    Ok(CertificateCounts { eligible, sent })
}

/// The capture transition. The `payment_status <> 'Paid'` guard and the field writes execute as one statement,
/// which is what makes a race between two signal channels resolve to a single winner.
pub async fn mark_paid_unless_paid(
    order_id: &OrderId,
    capture: PaymentCapture,
    conn: &mut SqliteConnection,
) -> Result<Option<Candidate>, StoreError> {
    let candidate = sqlx::query_as(
        r#"
            UPDATE candidates SET
                payment_status = 'Paid',
                payment_id = $2,
                payment_method = $3,
                payment_date = $4,
                payment_updated_by = $5,
                gateway_payload = $6,
                updated_at = $4
            WHERE order_id = $1 AND payment_status <> 'Paid'
            RETURNING *;
        "#,
    )
    .bind(order_id.as_str())
    .bind(capture.payment_id)
    .bind(capture.method)
    .bind(capture.paid_at)
    .bind(capture.origin)
    .bind(capture.payload)
    .fetch_optional(conn)
    .await?;
    Ok(candidate)
}

pub async fn mark_failed_if_pending(
    order_id: &OrderId,
    failure: PaymentFailure,
    conn: &mut SqliteConnection,
) -> Result<Option<Candidate>, StoreError> {
    let now = Utc::now();
    let candidate = sqlx::query_as(
        r#"
            UPDATE candidates SET
                payment_status = 'Failed',
                payment_id = $2,
                payment_failure_reason = $3,
                payment_date = $4,
                payment_updated_by = $5,
                gateway_payload = $6,
                updated_at = $4
            WHERE order_id = $1 AND payment_status = 'Pending'
            RETURNING *;
        "#,
    )
    .bind(order_id.as_str())
    .bind(failure.payment_id)
    .bind(failure.reason)
    .bind(now)
    .bind(SignalOrigin::Webhook)
    .bind(failure.payload)
    .fetch_optional(conn)
    .await?;
    Ok(candidate)
}

pub async fn apply_refund(
    payment_id: &PaymentId,
    refund: RefundUpdate,
    conn: &mut SqliteConnection,
) -> Result<Option<Candidate>, StoreError> {
    let now = Utc::now();
    let candidate = sqlx::query_as(
        r#"
            UPDATE candidates SET
                refund_status = $2,
                refund_amount = COALESCE($3, refund_amount),
                refund_id = COALESCE($4, refund_id),
                refund_date = $5,
                updated_at = $5
            WHERE payment_id = $1
            RETURNING *;
        "#,
    )
    .bind(payment_id.as_str())
    .bind(refund.status)
    .bind(refund.amount)
    .bind(refund.refund_id)
    .bind(now)
    .fetch_optional(conn)
    .await?;
    Ok(candidate)
}

pub async fn mark_attendance_if_unmarked(
    id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Candidate>, StoreError> {
    let now = Utc::now();
    let candidate = sqlx::query_as(
        "UPDATE candidates SET attendance = 1, attendance_date = $2, updated_at = $2 WHERE id = $1 AND attendance = \
         0 RETURNING *",
    )
    .bind(id)
    .bind(now)
    .fetch_optional(conn)
    .await?;
    Ok(candidate)
}

pub async fn mark_admin_attendance_if_unmarked(
    id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Candidate>, StoreError> {
    let now = Utc::now();
    let candidate = sqlx::query_as(
        "UPDATE candidates SET admin_attendance = 1, admin_attendance_date = $2, updated_at = $2 WHERE id = $1 AND \
         admin_attendance = 0 RETURNING *",
    )
    .bind(id)
    .bind(now)
    .fetch_optional(conn)
    .await?;
    Ok(candidate)
}

/// The token derivation is deterministic, so even if two check-ins race here they write the same value; the
/// `IS NULL` guard just keeps the write single-shot.
pub async fn ensure_attendance_token(id: i64, conn: &mut SqliteConnection) -> Result<Candidate, StoreError> {
    let candidate = fetch_candidate_by_id(id, conn).await?.ok_or(StoreError::CandidateNotFound(id))?;
    if candidate.attendance_token.is_some() {
        return Ok(candidate);
    }
    let token = attendance_token_for(candidate.id, &candidate.phone);
    let now = Utc::now();
    let updated = sqlx::query_as(
        "UPDATE candidates SET attendance_token = $2, updated_at = $3 WHERE id = $1 AND attendance_token IS NULL \
         RETURNING *",
    )
    .bind(id)
    .bind(token)
    .bind(now)
    .fetch_optional(&mut *conn)
    .await?;
    match updated {
        Some(c) => Ok(c),
        None => fetch_candidate_by_id(id, conn).await?.ok_or(StoreError::CandidateNotFound(id)),
    }
}

pub async fn record_certificate(
    id: i64,
    record: CertificateRecord,
    conn: &mut SqliteConnection,
) -> Result<Candidate, StoreError> {
    let now = Utc::now();
    let candidate = sqlx::query_as(
        r#"
            UPDATE candidates SET
                certificate_sent = 1,
                certificate_document_id = $2,
                certificate_url = $3,
                certificate_public_id = $4,
                certificate_asset_id = $5,
                certificate_size_bytes = $6,
                certificate_message_id = $7,
                certificate_message_status = $8,
                certificate_sent_date = $9,
                certificate_sent_by = $10,
                updated_at = $9
            WHERE id = $1
            RETURNING *;
        "#,
    )
    .bind(id)
    .bind(record.document_id)
    .bind(record.url)
    .bind(record.public_id)
    .bind(record.asset_id)
    .bind(record.size_bytes)
    .bind(record.message_id)
    .bind(record.message_status)
    .bind(now)
    .bind(record.sent_by)
    .fetch_optional(conn)
    .await?;
    candidate.ok_or(StoreError::CandidateNotFound(id))
}

pub async fn record_admin_action(
    id: i64,
    action: AdminAction,
    actor: &str,
    conn: &mut SqliteConnection,
) -> Result<Candidate, StoreError> {
    let now = Utc::now();
    let candidate = sqlx::query_as(
        "UPDATE candidates SET admin_action = $2, admin_action_date = $3, admin_action_by = $4, updated_at = $3 \
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(action)
    .bind(now)
    .bind(actor)
    .fetch_optional(conn)
    .await?;
    candidate.ok_or(StoreError::CandidateNotFound(id))
}
