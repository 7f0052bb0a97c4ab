use std::path::Path;
use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::helper::identity_helpers::{AllowList, IdentityProvider};
use crate::helper::media_helpers::UploadPolicy;
use crate::helper::token_helpers::TokenService;
use crate::storage::AssetStore;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Shared, read-only collaborators handed to every request.
pub struct AppState {
    pub tokens: TokenService,
    pub identity: Arc<dyn IdentityProvider>,
    pub assets: Arc<dyn AssetStore>,
    pub uploads: UploadPolicy,
    pub allow_list: AllowList,
    pub frontend_url: String,
}

/// Opens a pool on `db_file` with foreign keys enforced on every connection.
pub fn build_pool(db_file: &Path) -> Result<DbPool, r2d2::Error> {
    let manager = SqliteConnectionManager::file(db_file)
        .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"));
    Pool::new(manager)
}

pub mod config;
pub mod error;
pub mod helper;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod setup;
pub mod storage;
