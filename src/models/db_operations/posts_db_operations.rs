use crate::helper::visibility_helpers::ListScope;
use crate::models::db_operations::{is_unique_violation, json_column, optional_json_column, DbError};
use crate::models::{Page, Post, PostFilters};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

const POST_COLUMNS: &str = "id, slug, title, description, tags, post_type, status, content_media_id, \
                            metadata, published_at, created_at, updated_at, owner_id";

fn map_post_row(row: &Row) -> rusqlite::Result<Post> {
    let tags_json: String = row.get(4)?;
    Ok(Post {
        id: row.get(0)?,
        slug: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        tags: json_column(4, &tags_json)?,
        post_type: row.get(5)?,
        status: row.get(6)?,
        content_media_id: row.get(7)?,
        metadata: optional_json_column(8, row.get(8)?)?,
        published_at: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
        owner_id: row.get(12)?,
    })
}

fn map_write_error(err: rusqlite::Error, slug: &str) -> DbError {
    if is_unique_violation(&err) {
        DbError::UniqueViolation(format!("A post with slug '{}' already exists.", slug))
    } else {
        DbError::Rusqlite(err)
    }
}

pub fn slug_exists(conn: &Connection, slug: &str, excluding_id: Option<&str>) -> Result<bool, DbError> {
    let exists = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM posts WHERE slug = ?1 AND id IS NOT ?2)",
        params![slug, excluding_id],
        |row| row.get(0),
    )?;
    Ok(exists)
}

pub fn insert_post(conn: &Connection, post: &Post) -> Result<(), DbError> {
    let tags_json = serde_json::to_string(&post.tags)?;
    let metadata_json = post.metadata.as_ref().map(serde_json::to_string).transpose()?;

    conn.execute(
        "INSERT INTO posts (id, slug, title, description, tags, post_type, status, content_media_id,
                            metadata, published_at, created_at, updated_at, owner_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            post.id,
            post.slug,
            post.title,
            post.description,
            tags_json,
            post.post_type,
            post.status,
            post.content_media_id,
            metadata_json,
            post.published_at,
            post.created_at,
            post.updated_at,
            post.owner_id,
        ],
    )
    .map_err(|e| map_write_error(e, &post.slug))?;
    Ok(())
}

pub fn read_post(conn: &Connection, post_id: &str) -> Result<Option<Post>, DbError> {
    let post = conn
        .query_row(
            &format!("SELECT {} FROM posts WHERE id = ?1", POST_COLUMNS),
            [post_id],
            map_post_row,
        )
        .optional()?;
    Ok(post)
}

/// Writes every mutable column of an already-merged post. Ownership and
/// creation time are never rewritten.
pub fn update_post(conn: &Connection, post: &Post) -> Result<(), DbError> {
    let tags_json = serde_json::to_string(&post.tags)?;
    let metadata_json = post.metadata.as_ref().map(serde_json::to_string).transpose()?;

    let updated = conn
        .execute(
            "UPDATE posts SET slug = ?1, title = ?2, description = ?3, tags = ?4, post_type = ?5,
                              status = ?6, content_media_id = ?7, metadata = ?8, published_at = ?9,
                              updated_at = ?10
             WHERE id = ?11",
            params![
                post.slug,
                post.title,
                post.description,
                tags_json,
                post.post_type,
                post.status,
                post.content_media_id,
                metadata_json,
                post.published_at,
                post.updated_at,
                post.id,
            ],
        )
        .map_err(|e| map_write_error(e, &post.slug))?;

    if updated == 0 {
        return Err(DbError::NotFound(format!("Post {}", post.id)));
    }
    Ok(())
}

pub fn delete_post(conn: &Connection, post_id: &str) -> Result<usize, DbError> {
    Ok(conn.execute("DELETE FROM posts WHERE id = ?1", [post_id])?)
}

/// Newest first. Tag filtering matches posts sharing at least one tag.
pub fn list_posts(
    conn: &Connection,
    scope: &ListScope,
    filters: &PostFilters,
    page: Page,
) -> Result<Vec<Post>, DbError> {
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

    if let Some(post_type) = &filters.post_type {
        clauses.push("post_type = ?");
        values.push(Value::Text(post_type.clone()));
    }

    if !filters.tags.is_empty() {
        clauses.push(
            "EXISTS (SELECT 1 FROM json_each(posts.tags) AS t
                     WHERE t.value IN (SELECT value FROM json_each(?)))",
        );
        values.push(Value::Text(serde_json::to_string(&filters.tags)?));
    }

    values.push(Value::Integer(i64::from(page.limit)));
    values.push(Value::Integer(i64::from(page.skip)));

    let sql = format!(
        "SELECT {} FROM posts WHERE {} ORDER BY created_at DESC, rowid DESC LIMIT ? OFFSET ?",
        POST_COLUMNS,
        clauses.join(" AND ")
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(values.iter()), map_post_row)?;

    let mut posts = Vec::new();
    for post in rows {
        posts.push(post?);
    }
    Ok(posts)
}
