use std::{path::PathBuf, sync::Arc};

use chrono::Utc;
use log::debug;
use registration_engine::traits::{ArtifactError, CertificateRenderer};
use tempfile::TempDir;

const TEMPLATE: &str = include_str!("../../assets/certificate_template.html");

/// Renders certificates from the bundled HTML template into a scoped working directory.
///
/// The working directory is created when the renderer is constructed and removed when the last clone is
/// dropped, so rendered files never accumulate across restarts and nothing global leaks.
#[derive(Clone)]
pub struct HtmlCertificateRenderer {
    workdir: Arc<TempDir>,
}

impl HtmlCertificateRenderer {
    pub fn new() -> Result<Self, ArtifactError> {
        let workdir = TempDir::new().map_err(|e| ArtifactError::RenderFailed(e.to_string()))?;
        debug!("Certificate working directory: {}", workdir.path().display());
        Ok(Self { workdir: Arc::new(workdir) })
    }

    pub fn workdir(&self) -> PathBuf {
        self.workdir.path().to_path_buf()
    }
}

impl CertificateRenderer for HtmlCertificateRenderer {
    async fn render(&self, candidate_name: &str, document_id: &str) -> Result<PathBuf, ArtifactError> {
        let issued_on = Utc::now().format("%-d %B %Y").to_string();
        let html = TEMPLATE
            .replace("{{name}}", candidate_name)
            .replace("{{document_id}}", document_id)
            .replace("{{date}}", &issued_on);
        let path = self.workdir.path().join(format!("{document_id}.html"));
        tokio::fs::write(&path, html).await.map_err(|e| ArtifactError::RenderFailed(e.to_string()))?;
        debug!("Rendered certificate {document_id} for {candidate_name}");
        Ok(path)
    }
}
