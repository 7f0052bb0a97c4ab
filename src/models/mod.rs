use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle shared by posts and media.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

impl ContentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentStatus::Draft => "draft",
            ContentStatus::Published => "published",
            ContentStatus::Archived => "archived",
        }
    }

    pub fn is_published(&self) -> bool {
        matches!(self, ContentStatus::Published)
    }
}

impl fmt::Display for ContentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "draft" => Ok(ContentStatus::Draft),
            "published" => Ok(ContentStatus::Published),
            "archived" => Ok(ContentStatus::Archived),
            other => Err(format!(
                "Invalid status '{}'. Expected one of: draft, published, archived.",
                other
            )),
        }
    }
}

impl ToSql for ContentStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for ContentStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: String| FromSqlError::Other(e.into()))
    }
}

/// Coarse classification of an uploaded file, fixed at upload time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetType {
    Image,
    Video,
    Audio,
    #[serde(rename = "model_3d")]
    Model3d,
    Document,
}

impl AssetType {
    pub fn from_mime(mime_type: &str) -> Self {
        if mime_type.starts_with("image/") {
            AssetType::Image
        } else if mime_type.starts_with("video/") {
            AssetType::Video
        } else if mime_type.starts_with("audio/") {
            AssetType::Audio
        } else if matches!(
            mime_type,
            "model/gltf+json" | "model/gltf-binary" | "application/octet-stream"
        ) {
            AssetType::Model3d
        } else {
            AssetType::Document
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetType::Image => "image",
            AssetType::Video => "video",
            AssetType::Audio => "audio",
            AssetType::Model3d => "model_3d",
            AssetType::Document => "document",
        }
    }
}

impl FromStr for AssetType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "image" => Ok(AssetType::Image),
            "video" => Ok(AssetType::Video),
            "audio" => Ok(AssetType::Audio),
            "model_3d" => Ok(AssetType::Model3d),
            "document" => Ok(AssetType::Document),
            other => Err(format!("Invalid asset type '{}'.", other)),
        }
    }
}

impl ToSql for AssetType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for AssetType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: String| FromSqlError::Other(e.into()))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Account {
    pub id: String,
    #[serde(skip_serializing)]
    pub external_id: String,
    pub username: String,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The part of an owner embedded in post and media responses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccountSummary {
    pub id: String,
    pub username: String,
    pub avatar_url: Option<String>,
}

impl From<&Account> for AccountSummary {
    fn from(account: &Account) -> Self {
        AccountSummary {
            id: account.id.clone(),
            username: account.username.clone(),
            avatar_url: account.avatar_url.clone(),
        }
    }
}

/// Profile returned by the identity provider after a code exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalIdentity {
    pub external_id: String,
    pub login_name: String,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Post {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    #[serde(rename = "type")]
    pub post_type: Option<String>,
    pub status: ContentStatus,
    pub content_media_id: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub owner_id: String,
}

#[derive(Debug, Serialize)]
pub struct PostView {
    #[serde(flatten)]
    pub post: Post,
    pub created_by: Option<AccountSummary>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPost {
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(rename = "type")]
    pub post_type: Option<String>,
    #[serde(default)]
    pub status: ContentStatus,
    pub content_media_id: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

/// Partial update. The outer `Option` is presence in the request body; for
/// nullable columns the inner `Option` is the new value, so `null` clears it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostPatch {
    pub title: Option<String>,
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
    #[serde(rename = "type", default, deserialize_with = "present")]
    pub post_type: Option<Option<String>>,
    pub status: Option<ContentStatus>,
    #[serde(default, deserialize_with = "present")]
    pub content_media_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub metadata: Option<Option<serde_json::Value>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Media {
    pub id: String,
    pub filename: String,
    pub original_name: Option<String>,
    pub mime_type: String,
    pub file_size: i64,
    pub file_path: String,
    pub public_url: String,
    pub asset_type: AssetType,
    pub status: ContentStatus,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub owner_id: String,
}

#[derive(Debug, Serialize)]
pub struct MediaView {
    #[serde(flatten)]
    pub media: Media,
    pub created_by: Option<AccountSummary>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaPatch {
    pub status: Option<ContentStatus>,
    #[serde(default, deserialize_with = "present")]
    pub metadata: Option<Option<serde_json::Value>>,
}

/// Result of a media delete; the two halves are attempted independently.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct MediaDeletion {
    pub storage_deleted: bool,
    pub database_deleted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub skip: u32,
    pub limit: u32,
}

impl Default for Page {
    fn default() -> Self {
        Page { skip: 0, limit: 20 }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PostFilters {
    pub status: Option<ContentStatus>,
    pub post_type: Option<String>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct MediaFilters {
    pub status: Option<ContentStatus>,
    pub asset_type: Option<AssetType>,
}

fn present<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

pub mod db_operations;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_type_is_derived_from_mime() {
        assert_eq!(AssetType::from_mime("image/png"), AssetType::Image);
        assert_eq!(AssetType::from_mime("video/webm"), AssetType::Video);
        assert_eq!(AssetType::from_mime("audio/ogg"), AssetType::Audio);
        assert_eq!(AssetType::from_mime("model/gltf-binary"), AssetType::Model3d);
        assert_eq!(AssetType::from_mime("application/octet-stream"), AssetType::Model3d);
        assert_eq!(AssetType::from_mime("application/pdf"), AssetType::Document);
        assert_eq!(AssetType::from_mime("text/plain"), AssetType::Document);
    }

    #[test]
    fn new_records_start_as_drafts() {
        assert_eq!(ContentStatus::default(), ContentStatus::Draft);
        let post: NewPost = serde_json::from_str(r#"{"title": "T", "slug": "t"}"#).unwrap();
        assert_eq!(post.status, ContentStatus::Draft);
    }

    #[test]
    fn status_parses_only_known_values() {
        assert_eq!("published".parse::<ContentStatus>(), Ok(ContentStatus::Published));
        assert!("live".parse::<ContentStatus>().is_err());
    }

    #[test]
    fn patch_distinguishes_absent_from_null() {
        let patch: PostPatch =
            serde_json::from_str(r#"{"description": null, "status": "archived"}"#).unwrap();
        assert_eq!(patch.description, Some(None));
        assert_eq!(patch.post_type, None);
        assert_eq!(patch.content_media_id, None);
        assert_eq!(patch.status, Some(ContentStatus::Archived));

        let patch: PostPatch = serde_json::from_str(r#"{"type": "essay"}"#).unwrap();
        assert_eq!(patch.post_type, Some(Some("essay".to_string())));
    }

    #[test]
    fn post_serializes_type_and_hides_owner() {
        let now = Utc::now();
        let post = Post {
            id: "p1".into(),
            slug: "hello".into(),
            title: "Hello".into(),
            description: None,
            tags: vec!["rust".into()],
            post_type: Some("note".into()),
            status: ContentStatus::Draft,
            content_media_id: None,
            metadata: None,
            published_at: None,
            created_at: now,
            updated_at: now,
            owner_id: "secret-owner".into(),
        };
        let value = serde_json::to_value(&post).unwrap();
        assert_eq!(value["type"], "note");
        assert_eq!(value["status"], "draft");
        assert!(value.get("owner_id").is_none());
    }
}
