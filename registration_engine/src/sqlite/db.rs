use std::str::FromStr;

use log::info;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Error as SqlxError,
    SqlitePool,
};

const SQLITE_DB_URL: &str = "sqlite://data/candidates.db";

pub fn db_url() -> String {
    let result = std::env::var("CPG_DATABASE_URL").unwrap_or_else(|_| {
        info!("CPG_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("Using database URL: {result}");
    result
}

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}

/// Idempotent schema setup. The candidate record is a single wide row; every facet of the aggregate lives on it
/// so that the conditional transitions are single-statement updates.
pub async fn create_schema(pool: &SqlitePool) -> Result<(), SqlxError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS candidates (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            email TEXT NOT NULL,
            phone TEXT NOT NULL,
            category TEXT NOT NULL,
            college TEXT,
            company TEXT,
            order_id TEXT NOT NULL UNIQUE,
            receipt TEXT NOT NULL,
            amount INTEGER NOT NULL,
            payment_status TEXT NOT NULL DEFAULT 'Pending',
            payment_id TEXT,
            payment_method TEXT,
            payment_date TIMESTAMP,
            payment_updated_by TEXT,
            payment_failure_reason TEXT,
            gateway_payload TEXT,
            refund_status TEXT NOT NULL DEFAULT 'None',
            refund_amount INTEGER,
            refund_id TEXT,
            refund_date TIMESTAMP,
            attendance BOOLEAN NOT NULL DEFAULT 0,
            attendance_date TIMESTAMP,
            admin_attendance BOOLEAN NOT NULL DEFAULT 0,
            admin_attendance_date TIMESTAMP,
            attendance_token TEXT UNIQUE,
            certificate_sent BOOLEAN NOT NULL DEFAULT 0,
            certificate_document_id TEXT,
            certificate_url TEXT,
            certificate_public_id TEXT,
            certificate_asset_id TEXT,
            certificate_size_bytes INTEGER,
            certificate_message_id TEXT,
            certificate_message_status TEXT,
            certificate_sent_date TIMESTAMP,
            certificate_sent_by TEXT,
            admin_action TEXT NOT NULL DEFAULT 'None',
            admin_action_date TIMESTAMP,
            admin_action_by TEXT,
            created_at TIMESTAMP NOT NULL,
            updated_at TIMESTAMP NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_candidates_phone ON candidates (phone, created_at)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_candidates_payment_status ON candidates (payment_status)")
        .execute(pool)
        .await?;
    Ok(())
}
