//! Candidate Payment Gateway engine
//!
//! This library contains the core logic for registering event candidates, reconciling their payment state against
//! the payment gateway, tracking attendance, and issuing certificates. It is transport- and vendor-agnostic.
//!
//! The library is divided into three main sections:
//! 1. Data types and store access ([`mod@db_types`], [`mod@traits`]). The candidate record is the aggregate root,
//!    and all state transitions go through the [`traits::CandidateStore`] trait, whose conditional-update methods
//!    are the single serialization point for concurrent payment signals. A SQLite backend is provided; an in-memory
//!    backend is available behind the `test_utils` feature.
//! 2. The engine public API ([`mod@api`]). [`PaymentReconciler`] is the payment state machine: webhook events,
//!    client verification callbacks and reconciliation sweeps all converge on a single conditional capture
//!    transition, so duplicated or racing signals are safe no-ops. [`AttendanceApi`] and [`CertificateApi`] drive
//!    the secondary check-in and issuance flows.
//! 3. External collaborator contracts ([`mod@traits`]): the payment gateway client, the notification channel and
//!    the certificate artifact pipeline are defined here and implemented by thin adapters elsewhere.
pub mod db_types;
pub mod dispatch;
pub mod helpers;
pub mod traits;

mod api;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteCandidateStore;

pub use api::{
    attendance::{AttendanceApi, CheckIn, CheckInStatus, ScanResult},
    certificates::{CertificateApi, CertificatePipelineOptions},
    errors::{AttendanceError, CertificateError, ReconcileError, RegistrationError},
    objects::{
        BatchSummary,
        CaptureOutcome,
        CertificateOutcome,
        CertificateStats,
        CertificateStatus,
        EligibilityReport,
        FailureOutcome,
        IssueResult,
        RefundOutcome,
        SupersededCertificate,
        SweepOutcome,
        SweepRecord,
        SweepSummary,
    },
    reconciler::{PaymentReconciler, SweepRetry},
    registration::{NewRegistration, RegistrationApi},
};
pub use dispatch::{NotificationDispatcher, NotifyOutcome, TemplateCatalog};
