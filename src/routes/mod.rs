use actix_web::web;
use serde::{Deserialize, Deserializer};

use crate::error::{AppError, AppResult};
use crate::models::Page;

pub mod auth;
pub mod media;
pub mod posts;
pub mod public;

const MAX_PAGE_LIMIT: u32 = 100;

/// Mounts every API route. Extractor failures answer with the same error body
/// as every other failure.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::Validation(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| AppError::Validation(err.to_string()).into()),
    )
    .configure(public::config_api)
    .configure(auth::config_api)
    .configure(posts::config_api)
    .configure(media::config_api);
}

pub(crate) fn page_from(skip: Option<u32>, limit: Option<u32>) -> AppResult<Page> {
    let default = Page::default();
    let limit = limit.unwrap_or(default.limit);
    if !(1..=MAX_PAGE_LIMIT).contains(&limit) {
        return Err(AppError::Validation(format!(
            "'limit' must be between 1 and {}.",
            MAX_PAGE_LIMIT
        )));
    }
    Ok(Page {
        skip: skip.unwrap_or(default.skip),
        limit,
    })
}

/// Accepts `tags=a,b` as well as repeated values.
pub(crate) fn deserialize_tags<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrVec {
        String(String),
        Vec(Vec<String>),
    }

    match StringOrVec::deserialize(deserializer)? {
        StringOrVec::String(s) => Ok(s
            .split(',')
            .map(|tag| tag.trim().to_string())
            .filter(|tag| !tag.is_empty())
            .collect()),
        StringOrVec::Vec(v) => Ok(v),
    }
}
