//! Blob storage behind media records.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

pub mod local;
pub mod supabase;

pub use local::LocalAssetStore;
pub use supabase::SupabaseAssetStore;

/// Prefix every object key lives under.
pub const MEDIA_FOLDER: &str = "media";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Storage service rejected the request with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("Invalid object path: {0}")]
    InvalidPath(String),
}

pub struct AssetUpload {
    pub bytes: Vec<u8>,
    pub original_name: Option<String>,
    pub content_type: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredAsset {
    pub filename: String,
    pub file_path: String,
    pub public_url: String,
}

#[async_trait]
pub trait AssetStore: Send + Sync {
    async fn store(&self, upload: AssetUpload) -> Result<StoredAsset, StorageError>;

    async fn remove(&self, file_path: &str) -> Result<(), StorageError>;
}

/// Maps an accepted MIME type to the extension stored objects get. Types
/// without an entry are stored without extension.
fn mime_to_safe_extension(mime_type: &str) -> Option<&'static str> {
    match mime_type {
        "application/pdf" => Some("pdf"),
        "audio/mpeg" => Some("mp3"),
        "audio/ogg" => Some("ogg"),
        "audio/wav" => Some("wav"),
        "image/gif" => Some("gif"),
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/svg+xml" => Some("svg"),
        "image/webp" => Some("webp"),
        "model/gltf+json" => Some("gltf"),
        "model/gltf-binary" => Some("glb"),
        "text/plain" => Some("txt"),
        "video/mp4" => Some("mp4"),
        "video/quicktime" => Some("mov"),
        "video/webm" => Some("webm"),
        _ => None,
    }
}

/// Fresh object name and key for an upload: `<uuid>.<ext>` under [`MEDIA_FOLDER`].
pub fn generate_object_key(content_type: &str) -> (String, String) {
    let id = Uuid::new_v4();
    let filename = match mime_to_safe_extension(content_type) {
        Some(ext) => format!("{}.{}", id, ext),
        None => id.to_string(),
    };
    let file_path = format!("{}/{}", MEDIA_FOLDER, filename);
    (filename, file_path)
}
