use crate::error::{AppError, AppResult};
use crate::helper::sanitization_helpers::{clean_description, clean_tags, clean_title, validate_slug};
use crate::helper::visibility_helpers::{self, Access};
use crate::models::db_operations::{accounts_db_operations, media_db_operations, posts_db_operations};
use crate::models::{NewPost, Page, Post, PostFilters, PostPatch, PostView};
use crate::DbPool;
use chrono::Utc;
use rusqlite::Connection;
use uuid::Uuid;

fn clean_type(post_type: Option<&str>) -> Option<String> {
    post_type
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

/// A post may only point at media that exists and belongs to the same owner.
fn ensure_content_media(conn: &Connection, media_id: &str, owner_id: &str) -> AppResult<()> {
    let media = media_db_operations::read_media(conn, media_id)?.ok_or_else(|| {
        AppError::Validation(format!("Content media '{}' does not exist.", media_id))
    })?;
    if media.owner_id != owner_id {
        return Err(AppError::Forbidden(
            "Content media must belong to the post owner.".to_string(),
        ));
    }
    Ok(())
}

fn load_post(conn: &Connection, post_id: &str) -> AppResult<Post> {
    posts_db_operations::read_post(conn, post_id)?
        .ok_or_else(|| AppError::NotFound("Post not found.".to_string()))
}

fn with_owners(conn: &Connection, posts: Vec<Post>) -> AppResult<Vec<PostView>> {
    let mut owner_ids: Vec<String> = posts.iter().map(|p| p.owner_id.clone()).collect();
    owner_ids.sort();
    owner_ids.dedup();
    let owners = accounts_db_operations::read_account_summaries(conn, &owner_ids)?;

    Ok(posts
        .into_iter()
        .map(|post| PostView {
            created_by: owners.get(&post.owner_id).cloned(),
            post,
        })
        .collect())
}

fn with_owner(conn: &Connection, post: Post) -> AppResult<PostView> {
    with_owners(conn, vec![post])?
        .pop()
        .ok_or_else(|| AppError::Internal("Post vanished while loading its owner.".to_string()))
}

pub fn create_post(pool: &DbPool, owner_id: &str, input: NewPost) -> AppResult<PostView> {
    let slug = validate_slug(&input.slug)?;
    let title = clean_title(&input.title)?;

    let mut conn = pool.get()?;
    let tx = conn.transaction()?;

    if posts_db_operations::slug_exists(&tx, &slug, None)? {
        return Err(AppError::Conflict(format!(
            "A post with slug '{}' already exists.",
            slug
        )));
    }

    if let Some(media_id) = input.content_media_id.as_deref() {
        ensure_content_media(&tx, media_id, owner_id)?;
    }

    let now = Utc::now();
    let post = Post {
        id: Uuid::new_v4().to_string(),
        slug,
        title,
        description: clean_description(input.description.as_deref()),
        tags: clean_tags(&input.tags),
        post_type: clean_type(input.post_type.as_deref()),
        status: input.status,
        content_media_id: input.content_media_id,
        metadata: input.metadata,
        published_at: input.status.is_published().then_some(now),
        created_at: now,
        updated_at: now,
        owner_id: owner_id.to_string(),
    };

    posts_db_operations::insert_post(&tx, &post)?;
    tx.commit()?;

    log::info!("Post {} ('{}') created by {}.", post.id, post.slug, owner_id);
    with_owner(&conn, post)
}

/// Applies only the fields present in `patch`. `published_at` is stamped the
/// first time the post becomes published and is never changed afterwards.
pub fn update_post(pool: &DbPool, owner_id: &str, post_id: &str, patch: PostPatch) -> AppResult<PostView> {
    let mut conn = pool.get()?;
    let tx = conn.transaction()?;

    let mut post = load_post(&tx, post_id)?;
    visibility_helpers::authorize(Some(owner_id), &post.owner_id, post.status, Access::Update)?;

    let was_published = post.status.is_published();

    if let Some(slug) = patch.slug {
        let slug = validate_slug(&slug)?;
        if slug != post.slug && posts_db_operations::slug_exists(&tx, &slug, Some(&post.id))? {
            return Err(AppError::Conflict(format!(
                "A post with slug '{}' already exists.",
                slug
            )));
        }
        post.slug = slug;
    }
    if let Some(title) = patch.title {
        post.title = clean_title(&title)?;
    }
    if let Some(description) = patch.description {
        post.description = clean_description(description.as_deref());
    }
    if let Some(tags) = patch.tags {
        post.tags = clean_tags(&tags);
    }
    if let Some(post_type) = patch.post_type {
        post.post_type = clean_type(post_type.as_deref());
    }
    if let Some(content_media_id) = patch.content_media_id {
        if let Some(media_id) = content_media_id.as_deref() {
            ensure_content_media(&tx, media_id, &post.owner_id)?;
        }
        post.content_media_id = content_media_id;
    }
    if let Some(metadata) = patch.metadata {
        post.metadata = metadata;
    }
    if let Some(status) = patch.status {
        post.status = status;
    }

    let now = Utc::now();
    if post.status.is_published() && !was_published && post.published_at.is_none() {
        post.published_at = Some(now);
    }
    post.updated_at = now;

    posts_db_operations::update_post(&tx, &post)?;
    tx.commit()?;

    with_owner(&conn, post)
}

pub fn delete_post(pool: &DbPool, owner_id: &str, post_id: &str) -> AppResult<()> {
    let conn = pool.get()?;
    let post = load_post(&conn, post_id)?;
    visibility_helpers::authorize(Some(owner_id), &post.owner_id, post.status, Access::Delete)?;

    posts_db_operations::delete_post(&conn, post_id)?;
    log::info!("Post {} deleted by {}.", post_id, owner_id);
    Ok(())
}

pub fn get_post(pool: &DbPool, caller_id: Option<&str>, post_id: &str) -> AppResult<PostView> {
    let conn = pool.get()?;
    let post = load_post(&conn, post_id)?;
    visibility_helpers::authorize(caller_id, &post.owner_id, post.status, Access::Read)?;
    with_owner(&conn, post)
}

pub fn list_posts(
    pool: &DbPool,
    caller_id: Option<&str>,
    filters: &PostFilters,
    page: Page,
) -> AppResult<Vec<PostView>> {
    let conn = pool.get()?;
    let scope = visibility_helpers::list_scope(caller_id, filters.status);
    let posts = posts_db_operations::list_posts(&conn, &scope, filters, page)?;
    with_owners(&conn, posts)
}
