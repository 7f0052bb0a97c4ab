use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use crate::error::AppResult;
use crate::helper::media_helpers;
use crate::middleware::{AuthenticatedAccount, OptionalAccount};
use crate::models::{AssetType, ContentStatus, MediaFilters, MediaPatch};
use crate::routes::page_from;
use crate::{AppState, DbPool};

#[derive(Deserialize)]
pub struct MediaListQuery {
    skip: Option<u32>,
    limit: Option<u32>,
    status: Option<ContentStatus>,
    asset_type: Option<AssetType>,
}

pub fn config_api(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/media")
            .route("", web::get().to(list_media))
            .route("", web::post().to(upload_media))
            .route("/{id}", web::get().to(get_media))
            .route("/{id}", web::put().to(update_media))
            .route("/{id}", web::delete().to(delete_media)),
    );
}

async fn list_media(
    pool: web::Data<DbPool>,
    caller: OptionalAccount,
    query: web::Query<MediaListQuery>,
) -> AppResult<HttpResponse> {
    let page = page_from(query.skip, query.limit)?;
    let filters = MediaFilters {
        status: query.status,
        asset_type: query.asset_type,
    };

    let media = media_helpers::list_media(&pool, caller.id(), &filters, page)?;
    Ok(HttpResponse::Ok().json(media))
}

async fn upload_media(
    state: web::Data<AppState>,
    pool: web::Data<DbPool>,
    user: AuthenticatedAccount,
    payload: Multipart,
) -> AppResult<HttpResponse> {
    let upload = media_helpers::read_upload_form(payload, &state.uploads).await?;
    let media = media_helpers::upload_media(
        &pool,
        state.assets.as_ref(),
        &state.uploads,
        &user.0.id,
        upload,
    )
    .await?;
    Ok(HttpResponse::Created().json(media))
}

async fn get_media(
    pool: web::Data<DbPool>,
    caller: OptionalAccount,
    id: web::Path<String>,
) -> AppResult<HttpResponse> {
    let media = media_helpers::get_media(&pool, caller.id(), &id)?;
    Ok(HttpResponse::Ok().json(media))
}

async fn update_media(
    pool: web::Data<DbPool>,
    user: AuthenticatedAccount,
    id: web::Path<String>,
    body: web::Json<MediaPatch>,
) -> AppResult<HttpResponse> {
    let media = media_helpers::update_media(&pool, &user.0.id, &id, body.into_inner())?;
    Ok(HttpResponse::Ok().json(media))
}

async fn delete_media(
    state: web::Data<AppState>,
    pool: web::Data<DbPool>,
    user: AuthenticatedAccount,
    id: web::Path<String>,
) -> AppResult<HttpResponse> {
    let outcome = media_helpers::delete_media(&pool, state.assets.as_ref(), &user.0.id, &id).await?;

    if outcome.database_deleted {
        Ok(HttpResponse::Ok().json(json!({
            "message": "Media deleted successfully.",
            "storage_deleted": outcome.storage_deleted,
            "database_deleted": outcome.database_deleted,
        })))
    } else {
        Ok(HttpResponse::InternalServerError().json(json!({
            "message": "Failed to delete media record.",
            "storage_deleted": outcome.storage_deleted,
            "database_deleted": outcome.database_deleted,
        })))
    }
}
