#![allow(dead_code)]

use actix_web::web;
use async_trait::async_trait;
use content_backend::{
    build_pool,
    error::{AppError, AppResult},
    helper::{
        identity_helpers::{AllowList, IdentityProvider},
        media_helpers::UploadPolicy,
        token_helpers::TokenService,
    },
    models::{db_operations::accounts_db_operations, Account, ExternalIdentity},
    setup::db_setup,
    storage::{generate_object_key, AssetStore, AssetUpload, StorageError, StoredAsset},
    AppState, DbPool,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub const SECRET: &str = "integration-test-secret-0123456789abcdef";
pub const FRONTEND_URL: &str = "http://frontend.test";
pub const BOUNDARY: &str = "----content-backend-test-boundary";
pub const MAX_UPLOAD: u64 = 3 * 1024 * 1024;

/// Hands out a fixed identity per authorization code.
#[derive(Default)]
pub struct FakeIdentityProvider {
    identities: Mutex<HashMap<String, ExternalIdentity>>,
}

impl FakeIdentityProvider {
    pub fn register(&self, code: &str, identity: ExternalIdentity) {
        self.identities
            .lock()
            .unwrap()
            .insert(code.to_string(), identity);
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentityProvider {
    fn authorize_url(&self) -> String {
        "https://github.test/login/oauth/authorize?client_id=test".to_string()
    }

    async fn exchange_code(&self, code: &str) -> AppResult<String> {
        if self.identities.lock().unwrap().contains_key(code) {
            Ok(format!("provider-token-{}", code))
        } else {
            Err(AppError::UpstreamAuth("bad_verification_code".to_string()))
        }
    }

    async fn fetch_identity(&self, access_token: &str) -> AppResult<ExternalIdentity> {
        let code = access_token.trim_start_matches("provider-token-");
        self.identities
            .lock()
            .unwrap()
            .get(code)
            .cloned()
            .ok_or_else(|| AppError::UpstreamAuth("unknown token".to_string()))
    }
}

/// Keeps blobs in memory; `fail_removes` simulates an unreachable object store.
#[derive(Default)]
pub struct MemoryAssetStore {
    pub blobs: Mutex<HashMap<String, Vec<u8>>>,
    pub fail_removes: Mutex<bool>,
}

impl MemoryAssetStore {
    pub fn len(&self) -> usize {
        self.blobs.lock().unwrap().len()
    }

    pub fn contains(&self, file_path: &str) -> bool {
        self.blobs.lock().unwrap().contains_key(file_path)
    }
}

#[async_trait]
impl AssetStore for MemoryAssetStore {
    async fn store(&self, upload: AssetUpload) -> Result<StoredAsset, StorageError> {
        let (filename, file_path) = generate_object_key(&upload.content_type);
        self.blobs
            .lock()
            .unwrap()
            .insert(file_path.clone(), upload.bytes);
        Ok(StoredAsset {
            public_url: format!("http://assets.test/{}", file_path),
            filename,
            file_path,
        })
    }

    async fn remove(&self, file_path: &str) -> Result<(), StorageError> {
        if *self.fail_removes.lock().unwrap() {
            return Err(StorageError::Rejected {
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        self.blobs.lock().unwrap().remove(file_path);
        Ok(())
    }
}

pub struct TestContext {
    pub pool: web::Data<DbPool>,
    pub state: web::Data<AppState>,
    pub identity: Arc<FakeIdentityProvider>,
    pub assets: Arc<MemoryAssetStore>,
    _dir: TempDir,
}

impl TestContext {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let db_file = dir.path().join("content.db");
        let mut conn = rusqlite::Connection::open(&db_file).unwrap();
        db_setup::setup_content_db(&mut conn).unwrap();
        drop(conn);

        let pool = build_pool(&db_file).unwrap();
        let identity = Arc::new(FakeIdentityProvider::default());
        let assets = Arc::new(MemoryAssetStore::default());

        let state = AppState {
            tokens: TokenService::new(SECRET, chrono::Duration::minutes(30)),
            identity: identity.clone(),
            assets: assets.clone(),
            uploads: UploadPolicy::new(
                vec!["image/png".to_string(), "text/plain".to_string()],
                MAX_UPLOAD,
            ),
            allow_list: AllowList::new(vec!["octocat".to_string(), "hubot".to_string()]),
            frontend_url: FRONTEND_URL.to_string(),
        };

        Self {
            pool: web::Data::new(pool),
            state: web::Data::new(state),
            identity,
            assets,
            _dir: dir,
        }
    }

    pub fn account(&self, external_id: &str, login: &str) -> Account {
        let conn = self.pool.get().unwrap();
        accounts_db_operations::upsert_account(&conn, &identity(external_id, login)).unwrap()
    }

    pub fn bearer(&self, account: &Account) -> (String, String) {
        let token = self.state.tokens.issue(&account.id).unwrap();
        ("Authorization".to_string(), format!("Bearer {}", token))
    }

    pub fn account_count(&self) -> i64 {
        let conn = self.pool.get().unwrap();
        conn.query_row("SELECT COUNT(*) FROM accounts", [], |row| row.get(0))
            .unwrap()
    }
}

pub fn identity(external_id: &str, login: &str) -> ExternalIdentity {
    ExternalIdentity {
        external_id: external_id.to_string(),
        login_name: login.to_string(),
        email: Some(format!("{}@example.com", login)),
        avatar_url: Some(format!("https://avatars.test/{}", login)),
    }
}

/// Multipart body with a `file` part and optional `status`/`metadata` parts.
pub fn upload_body(content_type: &str, bytes: &[u8], status: Option<&str>, metadata: Option<&str>) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"upload.bin\"\r\nContent-Type: {}\r\n\r\n",
            BOUNDARY, content_type
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(b"\r\n");

    for (name, value) in [("status", status), ("metadata", metadata)] {
        if let Some(value) = value {
            body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                    BOUNDARY, name, value
                )
                .as_bytes(),
            );
        }
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn multipart_content_type() -> (String, String) {
    (
        "Content-Type".to_string(),
        format!("multipart/form-data; boundary={}", BOUNDARY),
    )
}

/// Builds the real router against a [`TestContext`].
macro_rules! spawn_app {
    ($ctx:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data($ctx.state.clone())
                .app_data($ctx.pool.clone())
                .configure(content_backend::routes::configure),
        )
        .await
    };
}
