use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use crate::error::AppResult;
use crate::helper::post_helpers;
use crate::middleware::{AuthenticatedAccount, OptionalAccount};
use crate::models::{ContentStatus, NewPost, PostFilters, PostPatch};
use crate::routes::{deserialize_tags, page_from};
use crate::DbPool;

#[derive(Deserialize)]
pub struct PostListQuery {
    skip: Option<u32>,
    limit: Option<u32>,
    status: Option<ContentStatus>,
    #[serde(rename = "type")]
    post_type: Option<String>,
    #[serde(default, deserialize_with = "deserialize_tags")]
    tags: Vec<String>,
}

pub fn config_api(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/posts")
            .route("", web::get().to(list_posts))
            .route("", web::post().to(create_post))
            .route("/{id}", web::get().to(get_post))
            .route("/{id}", web::put().to(update_post))
            .route("/{id}", web::delete().to(delete_post)),
    );
}

async fn list_posts(
    pool: web::Data<DbPool>,
    caller: OptionalAccount,
    query: web::Query<PostListQuery>,
) -> AppResult<HttpResponse> {
    let query = query.into_inner();
    let page = page_from(query.skip, query.limit)?;
    let filters = PostFilters {
        status: query.status,
        post_type: query.post_type.filter(|t| !t.trim().is_empty()),
        tags: query.tags,
    };

    let posts = post_helpers::list_posts(&pool, caller.id(), &filters, page)?;
    Ok(HttpResponse::Ok().json(posts))
}

async fn create_post(
    pool: web::Data<DbPool>,
    user: AuthenticatedAccount,
    body: web::Json<NewPost>,
) -> AppResult<HttpResponse> {
    let post = post_helpers::create_post(&pool, &user.0.id, body.into_inner())?;
    Ok(HttpResponse::Created().json(post))
}

async fn get_post(
    pool: web::Data<DbPool>,
    caller: OptionalAccount,
    id: web::Path<String>,
) -> AppResult<HttpResponse> {
    let post = post_helpers::get_post(&pool, caller.id(), &id)?;
    Ok(HttpResponse::Ok().json(post))
}

async fn update_post(
    pool: web::Data<DbPool>,
    user: AuthenticatedAccount,
    id: web::Path<String>,
    body: web::Json<PostPatch>,
) -> AppResult<HttpResponse> {
    let post = post_helpers::update_post(&pool, &user.0.id, &id, body.into_inner())?;
    Ok(HttpResponse::Ok().json(post))
}

async fn delete_post(
    pool: web::Data<DbPool>,
    user: AuthenticatedAccount,
    id: web::Path<String>,
) -> AppResult<HttpResponse> {
    post_helpers::delete_post(&pool, &user.0.id, &id)?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Post deleted successfully." })))
}
