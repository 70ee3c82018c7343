use std::{path::Path, sync::Arc};

use log::{debug, trace};
use registration_engine::traits::{ArtifactError, ArtifactStore, StoredArtifact};
use reqwest::{multipart, Client};
use serde::Deserialize;

use crate::config::CloudinaryConfig;

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
    asset_id: String,
    bytes: i64,
}

/// Certificate artifact storage on Cloudinary, using unsigned preset uploads.
#[derive(Clone)]
pub struct CloudinaryStore {
    config: CloudinaryConfig,
    client: Arc<Client>,
}

impl CloudinaryStore {
    pub fn new(config: CloudinaryConfig) -> Result<Self, ArtifactError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ArtifactError::UploadFailed(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    fn upload_url(&self) -> String {
        format!("{}/{}/auto/upload", self.config.api_url, self.config.cloud_name)
    }
}

impl ArtifactStore for CloudinaryStore {
    async fn upload(&self, path: &Path) -> Result<StoredArtifact, ArtifactError> {
        let file_name = path
            .file_name()
            .and_then(|s| s.to_str())
            .ok_or_else(|| ArtifactError::UploadFailed("artifact path has no file name".to_string()))?
            .to_string();
        let bytes = tokio::fs::read(path).await.map_err(|e| ArtifactError::UploadFailed(e.to_string()))?;
        debug!("Uploading certificate artifact {file_name} ({} bytes)", bytes.len());
        let part = multipart::Part::bytes(bytes).file_name(file_name);
        let form = multipart::Form::new()
            .text("upload_preset", self.config.upload_preset.clone())
            .text("folder", self.config.folder.clone())
            .part("file", part);
        let response = self
            .client
            .post(self.upload_url())
            .multipart(form)
            .send()
            .await
            .map_err(|e| ArtifactError::UploadFailed(e.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(ArtifactError::UploadFailed(format!("upload rejected ({status}): {message}")));
        }
        let uploaded: UploadResponse =
            response.json().await.map_err(|e| ArtifactError::UploadFailed(e.to_string()))?;
        trace!("Certificate uploaded to {}", uploaded.secure_url);
        Ok(StoredArtifact {
            url: uploaded.secure_url,
            public_id: uploaded.public_id,
            asset_id: uploaded.asset_id,
            size_bytes: uploaded.bytes,
        })
    }
}
