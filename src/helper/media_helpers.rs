use crate::error::{AppError, AppResult};
use crate::helper::visibility_helpers::{self, Access};
use crate::models::db_operations::{accounts_db_operations, media_db_operations};
use crate::models::{AssetType, ContentStatus, Media, MediaDeletion, MediaFilters, MediaPatch, MediaView, Page};
use crate::storage::{AssetStore, AssetUpload};
use crate::DbPool;
use actix_multipart::Multipart;
use actix_web::web::BytesMut;
use chrono::Utc;
use futures_util::StreamExt;
use rusqlite::Connection;
use std::collections::HashSet;
use uuid::Uuid;

/// Upper bound for the non-file parts of an upload form.
const MAX_FORM_FIELD_BYTES: usize = 64 * 1024;

/// Which uploads are accepted at all.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    allowed_mime_types: HashSet<String>,
    max_file_size: u64,
}

impl UploadPolicy {
    pub fn new(allowed_mime_types: Vec<String>, max_file_size: u64) -> Self {
        Self {
            allowed_mime_types: allowed_mime_types.into_iter().collect(),
            max_file_size,
        }
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    pub fn check_mime_type(&self, mime_type: &str) -> AppResult<()> {
        if self.allowed_mime_types.contains(mime_type) {
            Ok(())
        } else {
            Err(AppError::Validation(format!("File type {} not allowed.", mime_type)))
        }
    }

    pub fn check_size(&self, size: u64) -> AppResult<()> {
        if size > self.max_file_size {
            return Err(AppError::Validation(format!(
                "File too large. Max size: {} bytes.",
                self.max_file_size
            )));
        }
        Ok(())
    }
}

pub struct MediaUpload {
    pub bytes: Vec<u8>,
    pub original_name: Option<String>,
    pub content_type: String,
    pub status: ContentStatus,
    pub metadata: Option<serde_json::Value>,
}

fn multipart_error(e: actix_multipart::MultipartError) -> AppError {
    AppError::Validation(format!("Invalid multipart payload: {}", e))
}

async fn read_text_field(field: &mut actix_multipart::Field) -> AppResult<String> {
    let mut data = BytesMut::new();
    while let Some(chunk) = field.next().await {
        data.extend_from_slice(&chunk.map_err(multipart_error)?);
        if data.len() > MAX_FORM_FIELD_BYTES {
            return Err(AppError::Validation(format!(
                "Form field too large. Max size: {} bytes.",
                MAX_FORM_FIELD_BYTES
            )));
        }
    }
    String::from_utf8(data.to_vec())
        .map_err(|_| AppError::Validation("Invalid UTF-8 in form field.".to_string()))
}

/// Reads `file`, `status` and `metadata` from an upload form. The file's type
/// and size are checked while streaming so oversized bodies stop early.
pub async fn read_upload_form(mut payload: Multipart, policy: &UploadPolicy) -> AppResult<MediaUpload> {
    let mut file: Option<(Vec<u8>, Option<String>, String)> = None;
    let mut status = ContentStatus::Draft;
    let mut metadata = None;

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(multipart_error)?;
        let field_name = field.content_disposition().get_name().unwrap_or_default().to_string();

        match field_name.as_str() {
            "file" => {
                let content_type = field
                    .content_type()
                    .map(|mime| mime.essence_str().to_string())
                    .ok_or_else(|| AppError::Validation("Content-Type not available.".to_string()))?;
                policy.check_mime_type(&content_type)?;

                let original_name = field
                    .content_disposition()
                    .get_filename()
                    .map(|name| name.to_string());

                let mut bytes = Vec::new();
                while let Some(chunk) = field.next().await {
                    let data = chunk.map_err(multipart_error)?;
                    bytes.extend_from_slice(&data);
                    if bytes.len() as u64 > policy.max_file_size() {
                        return Err(AppError::Validation(format!(
                            "File too large. Max size: {} bytes.",
                            policy.max_file_size()
                        )));
                    }
                }
                file = Some((bytes, original_name, content_type));
            }
            "status" => {
                let value = read_text_field(&mut field).await?;
                status = value.trim().parse().map_err(AppError::Validation)?;
            }
            "metadata" => {
                let value = read_text_field(&mut field).await?;
                if !value.trim().is_empty() {
                    let parsed: serde_json::Value = serde_json::from_str(&value).map_err(|e| {
                        AppError::Validation(format!("Metadata must be valid JSON: {}", e))
                    })?;
                    if !parsed.is_object() {
                        return Err(AppError::Validation("Metadata must be a JSON object.".to_string()));
                    }
                    metadata = Some(parsed);
                }
            }
            _ => (),
        }
    }

    let (bytes, original_name, content_type) =
        file.ok_or_else(|| AppError::Validation("No file was uploaded.".to_string()))?;

    Ok(MediaUpload {
        bytes,
        original_name,
        content_type,
        status,
        metadata,
    })
}

fn load_media(conn: &Connection, media_id: &str) -> AppResult<Media> {
    media_db_operations::read_media(conn, media_id)?
        .ok_or_else(|| AppError::NotFound("Media not found.".to_string()))
}

fn with_owners(conn: &Connection, media: Vec<Media>) -> AppResult<Vec<MediaView>> {
    let mut owner_ids: Vec<String> = media.iter().map(|m| m.owner_id.clone()).collect();
    owner_ids.sort();
    owner_ids.dedup();
    let owners = accounts_db_operations::read_account_summaries(conn, &owner_ids)?;

    Ok(media
        .into_iter()
        .map(|media| MediaView {
            created_by: owners.get(&media.owner_id).cloned(),
            media,
        })
        .collect())
}

fn with_owner(conn: &Connection, media: Media) -> AppResult<MediaView> {
    with_owners(conn, vec![media])?
        .pop()
        .ok_or_else(|| AppError::Internal("Media vanished while loading its owner.".to_string()))
}

pub async fn upload_media(
    pool: &DbPool,
    assets: &dyn AssetStore,
    policy: &UploadPolicy,
    owner_id: &str,
    upload: MediaUpload,
) -> AppResult<MediaView> {
    policy.check_mime_type(&upload.content_type)?;
    policy.check_size(upload.bytes.len() as u64)?;

    let file_size = upload.bytes.len() as i64;
    let asset_type = AssetType::from_mime(&upload.content_type);
    let mime_type = upload.content_type.clone();
    let original_name = upload.original_name.clone();

    let stored = assets
        .store(AssetUpload {
            bytes: upload.bytes,
            original_name: upload.original_name,
            content_type: upload.content_type,
        })
        .await?;

    let now = Utc::now();
    let media = Media {
        id: Uuid::new_v4().to_string(),
        filename: stored.filename,
        original_name,
        mime_type,
        file_size,
        file_path: stored.file_path,
        public_url: stored.public_url,
        asset_type,
        status: upload.status,
        metadata: upload.metadata,
        created_at: now,
        updated_at: now,
        owner_id: owner_id.to_string(),
    };

    let persisted = pool
        .get()
        .map_err(AppError::from)
        .and_then(|conn| {
            media_db_operations::insert_media(&conn, &media)?;
            with_owner(&conn, media.clone())
        });

    match persisted {
        Ok(view) => {
            log::info!("Media {} ({}) uploaded by {}.", view.media.id, view.media.mime_type, owner_id);
            Ok(view)
        }
        Err(e) => {
            if let Err(cleanup) = assets.remove(&media.file_path).await {
                log::warn!("Failed to remove orphaned blob '{}': {}", media.file_path, cleanup);
            }
            Err(e)
        }
    }
}

pub fn get_media(pool: &DbPool, caller_id: Option<&str>, media_id: &str) -> AppResult<MediaView> {
    let conn = pool.get()?;
    let media = load_media(&conn, media_id)?;
    visibility_helpers::authorize(caller_id, &media.owner_id, media.status, Access::Read)?;
    with_owner(&conn, media)
}

pub fn list_media(
    pool: &DbPool,
    caller_id: Option<&str>,
    filters: &MediaFilters,
    page: Page,
) -> AppResult<Vec<MediaView>> {
    let conn = pool.get()?;
    let scope = visibility_helpers::list_scope(caller_id, filters.status);
    let media = media_db_operations::list_media(&conn, &scope, filters, page)?;
    with_owners(&conn, media)
}

pub fn update_media(pool: &DbPool, owner_id: &str, media_id: &str, patch: MediaPatch) -> AppResult<MediaView> {
    let conn = pool.get()?;
    let mut media = load_media(&conn, media_id)?;
    visibility_helpers::authorize(Some(owner_id), &media.owner_id, media.status, Access::Update)?;

    if let Some(status) = patch.status {
        media.status = status;
    }
    if let Some(metadata) = patch.metadata {
        media.metadata = metadata;
    }
    media.updated_at = Utc::now();

    media_db_operations::update_media(&conn, &media)?;
    with_owner(&conn, media)
}

/// Removes the blob and the record independently; a failed blob delete does
/// not keep the record around.
pub async fn delete_media(
    pool: &DbPool,
    assets: &dyn AssetStore,
    owner_id: &str,
    media_id: &str,
) -> AppResult<MediaDeletion> {
    let media = {
        let conn = pool.get()?;
        load_media(&conn, media_id)?
    };
    visibility_helpers::authorize(Some(owner_id), &media.owner_id, media.status, Access::Delete)?;

    let storage_deleted = match assets.remove(&media.file_path).await {
        Ok(()) => true,
        Err(e) => {
            log::warn!("Failed to delete blob '{}' for media {}: {}", media.file_path, media.id, e);
            false
        }
    };

    let database_deleted = match pool
        .get()
        .map_err(AppError::from)
        .and_then(|conn| Ok(media_db_operations::delete_media(&conn, &media.id)?))
    {
        Ok(rows) => rows > 0,
        Err(e) => {
            log::error!("Failed to delete media record {}: {}", media.id, e);
            false
        }
    };

    Ok(MediaDeletion {
        storage_deleted,
        database_deleted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> UploadPolicy {
        UploadPolicy::new(vec!["image/png".to_string()], 1024)
    }

    #[test]
    fn rejects_unlisted_mime_types() {
        assert!(policy().check_mime_type("image/png").is_ok());
        assert!(matches!(
            policy().check_mime_type("application/x-sh"),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn size_limit_is_inclusive() {
        assert!(policy().check_size(0).is_ok());
        assert!(policy().check_size(1024).is_ok());
        assert!(policy().check_size(1025).is_err());
    }
}
