use rusqlite::Connection;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SetupError {
    #[error("Rusqlite error: {0}")]
    Rusqlite(#[from] rusqlite::Error),
}

/// Creates every table and index. Safe to run against an existing database.
pub fn setup_content_db(conn: &mut Connection) -> Result<(), SetupError> {
    let tx = conn.transaction()?;

    log::info!("Creating 'accounts' table...");
    tx.execute(
        "CREATE TABLE IF NOT EXISTS accounts (
            id TEXT PRIMARY KEY,
            external_id TEXT NOT NULL UNIQUE,
            username TEXT NOT NULL,
            email TEXT,
            avatar_url TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    log::info!("Creating 'media' table...");
    tx.execute(
        "CREATE TABLE IF NOT EXISTS media (
            id TEXT PRIMARY KEY,
            filename TEXT NOT NULL,
            original_name TEXT,
            mime_type TEXT NOT NULL,
            file_size INTEGER NOT NULL,
            file_path TEXT NOT NULL,
            public_url TEXT NOT NULL,
            asset_type TEXT NOT NULL CHECK(asset_type IN ('image', 'video', 'audio', 'model_3d', 'document')),
            status TEXT NOT NULL DEFAULT 'draft' CHECK(status IN ('draft', 'published', 'archived')),
            metadata TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            owner_id TEXT NOT NULL,
            FOREIGN KEY (owner_id) REFERENCES accounts(id)
        )",
        [],
    )?;

    log::info!("Creating 'posts' table...");
    tx.execute(
        "CREATE TABLE IF NOT EXISTS posts (
            id TEXT PRIMARY KEY,
            slug TEXT NOT NULL UNIQUE,
            title TEXT NOT NULL,
            description TEXT,
            tags TEXT NOT NULL DEFAULT '[]',
            post_type TEXT,
            status TEXT NOT NULL DEFAULT 'draft' CHECK(status IN ('draft', 'published', 'archived')),
            content_media_id TEXT,
            metadata TEXT,
            published_at TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            owner_id TEXT NOT NULL,
            FOREIGN KEY (owner_id) REFERENCES accounts(id),
            FOREIGN KEY (content_media_id) REFERENCES media(id) ON DELETE SET NULL
        )",
        [],
    )?;

    log::info!("Creating indexes...");
    tx.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_posts_status_published ON posts (status, published_at);
         CREATE INDEX IF NOT EXISTS idx_posts_type ON posts (post_type);
         CREATE INDEX IF NOT EXISTS idx_posts_owner ON posts (owner_id);
         CREATE INDEX IF NOT EXISTS idx_media_type_created ON media (asset_type, created_at);
         CREATE INDEX IF NOT EXISTS idx_media_status ON media (status);
         CREATE INDEX IF NOT EXISTS idx_media_owner ON media (owner_id);",
    )?;

    tx.commit()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setup_is_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();
        setup_content_db(&mut conn).unwrap();
        setup_content_db(&mut conn).unwrap();

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('accounts', 'posts', 'media')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 3);
    }
}
