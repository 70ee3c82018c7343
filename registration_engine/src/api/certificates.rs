use std::time::Duration;

use log::{info, warn};

use crate::{
    api::{
        errors::CertificateError,
        objects::{BatchSummary, CertificateStats, EligibilityReport, IssueResult, SupersededCertificate},
    },
    db_types::Candidate,
    dispatch::NotificationDispatcher,
    helpers::new_document_id,
    traits::{
        ArtifactStore,
        CandidateStore,
        CertificateRecord,
        CertificateRenderer,
        MessageReceipt,
        NotificationChannel,
        StoredArtifact,
    },
};

#[derive(Debug, Clone, Copy)]
pub struct CertificatePipelineOptions {
    /// Pause between consecutive issuances. The notification channel rate-limits; the batch must not outrun it.
    pub pacing: Duration,
}

impl Default for CertificatePipelineOptions {
    fn default() -> Self {
        Self { pacing: Duration::from_millis(3000) }
    }
}

/// The certificate issuance pipeline: render, upload, deliver, record. Strictly sequential over the selected
/// candidate set, with per-item failure isolation and a structured summary.
pub struct CertificateApi<B, N, R, S> {
    db: B,
    dispatcher: NotificationDispatcher<N>,
    renderer: R,
    artifacts: S,
    options: CertificatePipelineOptions,
}

impl<B, N, R, S> CertificateApi<B, N, R, S>
where
    B: CandidateStore,
    N: NotificationChannel,
    R: CertificateRenderer,
    S: ArtifactStore,
{
    pub fn new(db: B, dispatcher: NotificationDispatcher<N>, renderer: R, artifacts: S) -> Self {
        Self { db, dispatcher, renderer, artifacts, options: CertificatePipelineOptions::default() }
    }

    pub fn with_options(mut self, options: CertificatePipelineOptions) -> Self {
        self.options = options;
        self
    }

    pub async fn eligible(&self) -> Result<EligibilityReport, CertificateError> {
        let candidates = self.db.fetch_certificate_candidates(None).await?;
        let certificates_sent = candidates.iter().filter(|c| c.certificate_sent).count();
        Ok(EligibilityReport {
            total: candidates.len(),
            certificates_sent,
            pending_certificates: candidates.len() - certificates_sent,
            candidates,
        })
    }

    pub async fn statistics(&self) -> Result<CertificateStats, CertificateError> {
        let counts = self.db.count_certificates().await?;
        Ok(CertificateStats {
            total_eligible: counts.eligible,
            total_sent: counts.sent,
            total_pending: counts.eligible - counts.sent,
        })
    }

    /// Issue certificates for the selected candidate set (explicit id list, or all eligible). Candidates that
    /// already hold a certificate are skipped; resend is a distinct, explicit operation. One bad record is
    /// recorded and the batch continues.
    pub async fn issue_batch(&self, ids: Option<Vec<i64>>, issued_by: &str) -> Result<BatchSummary, CertificateError> {
        let candidates = self.db.fetch_certificate_candidates(ids.as_deref()).await?;
        info!("📜️ Certificate batch over {} candidates, initiated by {issued_by}", candidates.len());
        let mut summary = BatchSummary::new(candidates.len());
        let total = candidates.len();
        for (i, candidate) in candidates.iter().enumerate() {
            if candidate.certificate_sent {
                summary.push_already_sent(candidate);
                continue;
            }
            match self.issue_one(candidate, issued_by).await {
                Ok((updated, document_id, artifact, receipt)) => {
                    info!("📜️ Certificate {document_id} sent to {} ({})", updated.name, updated.phone);
                    summary.push_success(&updated, document_id, artifact.url, receipt.message_id);
                },
                Err(e) => {
                    warn!("📜️ Could not issue certificate for candidate #{} ({}). {e}", candidate.id, candidate.name);
                    summary.push_failure(candidate, e.to_string());
                },
            }
            if i + 1 < total {
                tokio::time::sleep(self.options.pacing).await;
            }
        }
        info!(
            "📜️ Certificate batch complete. Success: {}, failed: {}, already sent: {}.",
            summary.succeeded, summary.failed, summary.already_sent
        );
        Ok(summary)
    }

    /// Issue a certificate for one candidate. Eligibility is enforced here; a candidate that already holds a
    /// certificate yields [`IssueResult::AlreadySent`] without side effects.
    pub async fn issue_single(&self, id: i64, issued_by: &str) -> Result<IssueResult, CertificateError> {
        let candidate = self.eligible_candidate(id).await?;
        if candidate.certificate_sent {
            return Ok(IssueResult::AlreadySent(candidate));
        }
        let (updated, document_id, artifact, receipt) = self.issue_one(&candidate, issued_by).await?;
        Ok(IssueResult::Issued { candidate: updated, document_id, artifact, receipt, superseded: None })
    }

    /// Regenerate and re-deliver a certificate, overwriting the stored artifact identifiers. The superseded
    /// document id and URL are reported back as the audit trail.
    pub async fn resend(&self, id: i64, issued_by: &str) -> Result<IssueResult, CertificateError> {
        let candidate = self.eligible_candidate(id).await?;
        let superseded = SupersededCertificate {
            document_id: candidate.certificate_document_id.clone(),
            url: candidate.certificate_url.clone(),
        };
        if let Some(old) = &superseded.document_id {
            info!("📜️ Regenerating certificate for {} (replacing {old})", candidate.name);
        }
        let (updated, document_id, artifact, receipt) = self.issue_one(&candidate, issued_by).await?;
        Ok(IssueResult::Issued { candidate: updated, document_id, artifact, receipt, superseded: Some(superseded) })
    }

    async fn eligible_candidate(&self, id: i64) -> Result<Candidate, CertificateError> {
        let candidate = self.db.fetch_candidate_by_id(id).await?.ok_or(CertificateError::CandidateNotFound(id))?;
        if !candidate.is_eligible_for_certificate() {
            return Err(CertificateError::NotEligible {
                name: candidate.name,
                attendance: candidate.attendance,
                payment_status: candidate.payment_status,
            });
        }
        Ok(candidate)
    }

    async fn issue_one(
        &self,
        candidate: &Candidate,
        issued_by: &str,
    ) -> Result<(Candidate, String, StoredArtifact, MessageReceipt), CertificateError> {
        let document_id = new_document_id(&candidate.name);
        let path = self.renderer.render(&candidate.name, &document_id).await?;
        let artifact = self.artifacts.upload(&path).await?;
        let caption = format!("Congratulations {}! Your participation certificate is ready ({document_id}).", candidate.name);
        let receipt = self.dispatcher.send_certificate(candidate, &artifact.url, &caption).await?;
        let record = CertificateRecord {
            document_id: document_id.clone(),
            url: artifact.url.clone(),
            public_id: artifact.public_id.clone(),
            asset_id: artifact.asset_id.clone(),
            size_bytes: artifact.size_bytes,
            message_id: receipt.message_id.clone(),
            message_status: receipt.status.clone(),
            sent_by: issued_by.to_string(),
        };
        let updated = self.db.record_certificate(candidate.id, record).await?;
        Ok((updated, document_id, artifact, receipt))
    }
}
