use crate::storage::{generate_object_key, AssetStore, AssetUpload, StorageError, StoredAsset};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

/// Supabase Storage over its REST API, authenticated with the service key.
pub struct SupabaseAssetStore {
    http: Client,
    base_url: String,
    service_key: String,
    bucket: String,
}

impl SupabaseAssetStore {
    pub fn new(base_url: &str, service_key: &str, bucket: &str) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key: service_key.to_string(),
            bucket: bucket.to_string(),
        }
    }

    pub fn public_url(&self, file_path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, self.bucket, file_path
        )
    }

    async fn reject(response: reqwest::Response) -> StorageError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        StorageError::Rejected { status, body }
    }
}

#[async_trait]
impl AssetStore for SupabaseAssetStore {
    async fn store(&self, upload: AssetUpload) -> Result<StoredAsset, StorageError> {
        let (filename, file_path) = generate_object_key(&upload.content_type);
        let url = format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url, self.bucket, file_path
        );

        let response = self
            .http
            .post(url)
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .header("content-type", upload.content_type.as_str())
            .header("cache-control", "max-age=31536000")
            .header("x-upsert", "false")
            .body(upload.bytes)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::reject(response).await);
        }

        Ok(StoredAsset {
            public_url: self.public_url(&file_path),
            filename,
            file_path,
        })
    }

    async fn remove(&self, file_path: &str) -> Result<(), StorageError> {
        let url = format!("{}/storage/v1/object/{}", self.base_url, self.bucket);
        let response = self
            .http
            .delete(url)
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .json(&json!({ "prefixes": [file_path] }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::reject(response).await);
        }
        Ok(())
    }
}
