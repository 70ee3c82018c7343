use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifiers of an uploaded certificate artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredArtifact {
    pub url: String,
    pub public_id: String,
    pub asset_id: String,
    pub size_bytes: i64,
}

/// Produces a certificate document for a candidate. The renderer owns its working directory and is responsible
/// for cleaning it up; the pipeline only sees the produced file path.
#[allow(async_fn_in_trait)]
pub trait CertificateRenderer {
    async fn render(&self, candidate_name: &str, document_id: &str) -> Result<PathBuf, ArtifactError>;
}

/// Persists a rendered certificate to external storage.
#[allow(async_fn_in_trait)]
pub trait ArtifactStore {
    async fn upload(&self, path: &Path) -> Result<StoredArtifact, ArtifactError>;
}

#[derive(Debug, Clone, Error)]
pub enum ArtifactError {
    #[error("Could not render the certificate: {0}")]
    RenderFailed(String),
    #[error("Could not upload the certificate: {0}")]
    UploadFailed(String),
}
