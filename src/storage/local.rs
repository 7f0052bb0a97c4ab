use crate::storage::{generate_object_key, AssetStore, AssetUpload, StorageError, StoredAsset, MEDIA_FOLDER};
use actix_web::web;
use async_trait::async_trait;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Files on local disk under `root`, served by the app at `/assets`.
pub struct LocalAssetStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalAssetStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: &str) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, file_path: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(file_path);
        let is_plain = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if !is_plain || !file_path.starts_with(MEDIA_FOLDER) {
            return Err(StorageError::InvalidPath(file_path.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl AssetStore for LocalAssetStore {
    async fn store(&self, upload: AssetUpload) -> Result<StoredAsset, StorageError> {
        let (filename, file_path) = generate_object_key(&upload.content_type);
        let target = self.resolve(&file_path)?;

        web::block(move || -> std::io::Result<()> {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&target, &upload.bytes)
        })
        .await
        .map_err(|e| StorageError::Io(std::io::Error::new(std::io::ErrorKind::Other, e.to_string())))??;

        let public_url = format!("{}/assets/{}", self.public_base_url, file_path);
        Ok(StoredAsset {
            filename,
            file_path,
            public_url,
        })
    }

    async fn remove(&self, file_path: &str) -> Result<(), StorageError> {
        let target = self.resolve(file_path)?;
        web::block(move || fs::remove_file(target))
            .await
            .map_err(|e| StorageError::Io(std::io::Error::new(std::io::ErrorKind::Other, e.to_string())))??;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn stores_and_removes_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalAssetStore::new(dir.path(), "http://localhost:8000/");

        let stored = store
            .store(AssetUpload {
                bytes: b"hello".to_vec(),
                original_name: Some("hello.txt".into()),
                content_type: "text/plain".into(),
            })
            .await
            .unwrap();

        assert!(stored.public_url.starts_with("http://localhost:8000/assets/media/"));
        let on_disk = dir.path().join(&stored.file_path);
        assert_eq!(fs::read(&on_disk).unwrap(), b"hello");

        store.remove(&stored.file_path).await.unwrap();
        assert!(!on_disk.exists());
    }

    #[actix_web::test]
    async fn rejects_paths_outside_media_folder() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalAssetStore::new(dir.path(), "http://localhost");
        let err = store.remove("media/../../etc/passwd").await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidPath(_)));
    }
}
