use std::path::{Path, PathBuf};

use crate::traits::{ArtifactError, ArtifactStore, CertificateRenderer, StoredArtifact};

/// A renderer that produces a path without touching the filesystem.
#[derive(Debug, Default, Clone)]
pub struct NullRenderer;

impl CertificateRenderer for NullRenderer {
    async fn render(&self, _candidate_name: &str, document_id: &str) -> Result<PathBuf, ArtifactError> {
        Ok(std::env::temp_dir().join(format!("{document_id}.html")))
    }
}

/// An artifact store that fabricates identifiers from the file name.
#[derive(Debug, Default, Clone)]
pub struct StaticArtifactStore;

impl ArtifactStore for StaticArtifactStore {
    async fn upload(&self, path: &Path) -> Result<StoredArtifact, ArtifactError> {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| ArtifactError::UploadFailed("artifact path has no file name".to_string()))?;
        Ok(StoredArtifact {
            url: format!("https://files.test/certificates/{stem}.pdf"),
            public_id: format!("certificates/{stem}"),
            asset_id: format!("asset_{stem}"),
            size_bytes: 1024,
        })
    }
}
