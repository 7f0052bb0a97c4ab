use crate::helper::visibility_helpers::ListScope;
use crate::models::db_operations::{optional_json_column, DbError};
use crate::models::{Media, MediaFilters, Page};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

const MEDIA_COLUMNS: &str = "id, filename, original_name, mime_type, file_size, file_path, public_url, \
                             asset_type, status, metadata, created_at, updated_at, owner_id";

fn map_media_row(row: &Row) -> rusqlite::Result<Media> {
    Ok(Media {
        id: row.get(0)?,
        filename: row.get(1)?,
        original_name: row.get(2)?,
        mime_type: row.get(3)?,
        file_size: row.get(4)?,
        file_path: row.get(5)?,
        public_url: row.get(6)?,
        asset_type: row.get(7)?,
        status: row.get(8)?,
        metadata: optional_json_column(9, row.get(9)?)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
        owner_id: row.get(12)?,
    })
}

pub fn insert_media(conn: &Connection, media: &Media) -> Result<(), DbError> {
    let metadata_json = media.metadata.as_ref().map(serde_json::to_string).transpose()?;
    conn.execute(
        "INSERT INTO media (id, filename, original_name, mime_type, file_size, file_path, public_url,
                            asset_type, status, metadata, created_at, updated_at, owner_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            media.id,
            media.filename,
            media.original_name,
            media.mime_type,
            media.file_size,
            media.file_path,
            media.public_url,
            media.asset_type,
            media.status,
            metadata_json,
            media.created_at,
            media.updated_at,
            media.owner_id,
        ],
    )?;
    Ok(())
}

pub fn read_media(conn: &Connection, media_id: &str) -> Result<Option<Media>, DbError> {
    let media = conn
        .query_row(
            &format!("SELECT {} FROM media WHERE id = ?1", MEDIA_COLUMNS),
            [media_id],
            map_media_row,
        )
        .optional()?;
    Ok(media)
}

pub fn update_media(conn: &Connection, media: &Media) -> Result<(), DbError> {
    let metadata_json = media.metadata.as_ref().map(serde_json::to_string).transpose()?;
    let updated = conn.execute(
        "UPDATE media SET status = ?1, metadata = ?2, updated_at = ?3 WHERE id = ?4",
        params![media.status, metadata_json, media.updated_at, media.id],
    )?;
    if updated == 0 {
        return Err(DbError::NotFound(format!("Media {}", media.id)));
    }
    Ok(())
}

pub fn delete_media(conn: &Connection, media_id: &str) -> Result<usize, DbError> {
    Ok(conn.execute("DELETE FROM media WHERE id = ?1", [media_id])?)
}

pub fn list_media(
    conn: &Connection,
    scope: &ListScope,
    filters: &MediaFilters,
    page: Page,
) -> Result<Vec<Media>, DbError> {
    let mut clauses: Vec<&str> = Vec::new();
    let mut values: Vec<Value> = Vec::new();

    match scope {
        ListScope::PublishedOnly => clauses.push("status = 'published'"),
        ListScope::WithStatus(status) => {
            clauses.push("status = ?");
            values.push(Value::Text(status.as_str().to_string()));
        }
        ListScope::OwnedOrPublished(owner_id) => {
            clauses.push("(owner_id = ? OR status = 'published')");
            values.push(Value::Text(owner_id.clone()));
        }
    }

    // A `WithStatus` scope already pins the status.
    if let Some(status) = filters.status.filter(|_| !matches!(scope, ListScope::WithStatus(_))) {
        clauses.push("status = ?");
        values.push(Value::Text(status.as_str().to_string()));
    }

    if let Some(asset_type) = filters.asset_type {
        clauses.push("asset_type = ?");
        values.push(Value::Text(asset_type.as_str().to_string()));
    }

    values.push(Value::Integer(i64::from(page.limit)));
    values.push(Value::Integer(i64::from(page.skip)));

    let sql = format!(
        "SELECT {} FROM media WHERE {} ORDER BY created_at DESC, rowid DESC LIMIT ? OFFSET ?",
        MEDIA_COLUMNS,
        clauses.join(" AND ")
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(values.iter()), map_media_row)?;

    let mut media = Vec::new();
    for item in rows {
        media.push(item?);
    }
    Ok(media)
}
