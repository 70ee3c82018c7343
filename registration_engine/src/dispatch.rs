//! Template selection and best-effort message dispatch.
//!
//! The dispatcher is the only component that knows which template belongs to which occasion. Callers receive a
//! [`NotifyOutcome`] rather than a `Result`: a failed send is an outcome to record, not an error to propagate,
//! because no state transition may ever be rolled back over a notification failure.
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{Candidate, CandidateCategory},
    traits::{MessageReceipt, NotificationChannel, NotificationError},
};

/// Template ids for every message the system sends. Populated from configuration; the engine never hard-codes
/// vendor template ids.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateCatalog {
    pub student_registration: String,
    pub working_registration: String,
    pub attendance_confirmed: String,
    pub accepted: String,
    pub rejected: String,
}

impl TemplateCatalog {
    fn registration_template(&self, category: CandidateCategory) -> &str {
        match category {
            CandidateCategory::Student => &self.student_registration,
            CandidateCategory::Working => &self.working_registration,
        }
    }
}

/// The recorded result of a best-effort dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum NotifyOutcome {
    Sent(MessageReceipt),
    Failed(String),
}

impl NotifyOutcome {
    pub fn succeeded(&self) -> bool {
        matches!(self, NotifyOutcome::Sent(_))
    }
}

#[derive(Clone)]
pub struct NotificationDispatcher<N> {
    channel: N,
    templates: TemplateCatalog,
}

impl<N> NotificationDispatcher<N>
where N: NotificationChannel
{
    pub fn new(channel: N, templates: TemplateCatalog) -> Self {
        Self { channel, templates }
    }

    /// Payment-confirmed message. Called exactly once per successful capture transition; the caller guarantees
    /// the once-ness, the dispatcher only guarantees it will not blow up.
    pub async fn notify_registration(&self, candidate: &Candidate) -> NotifyOutcome {
        let template = self.templates.registration_template(candidate.category);
        debug!("📨️ Sending registration confirmation to {} using template {template}", candidate.phone);
        self.send(candidate, template).await
    }

    /// Check-in confirmation, sent on first attendance marking only.
    pub async fn notify_attendance(&self, candidate: &Candidate) -> NotifyOutcome {
        debug!("📨️ Sending attendance confirmation to {}", candidate.phone);
        self.send(candidate, &self.templates.attendance_confirmed).await
    }

    pub async fn notify_accepted(&self, candidate: &Candidate) -> NotifyOutcome {
        self.send(candidate, &self.templates.accepted).await
    }

    pub async fn notify_rejected(&self, candidate: &Candidate) -> NotifyOutcome {
        self.send(candidate, &self.templates.rejected).await
    }

    /// Certificate delivery. Unlike the confirmations above this one is part of the issuance pipeline's success
    /// criteria, so the raw result is returned.
    pub async fn send_certificate(
        &self,
        candidate: &Candidate,
        document_url: &str,
        caption: &str,
    ) -> Result<MessageReceipt, NotificationError> {
        self.channel.send_document(&candidate.phone, document_url, caption).await
    }

    async fn send(&self, candidate: &Candidate, template_id: &str) -> NotifyOutcome {
        match self.channel.send_template(&candidate.phone, template_id, &[candidate.name.clone()]).await {
            Ok(receipt) => NotifyOutcome::Sent(receipt),
            Err(e) => {
                warn!("📨️ Could not send message to {} for candidate #{}. {e}", candidate.phone, candidate.id);
                NotifyOutcome::Failed(e.to_string())
            },
        }
    }
}
