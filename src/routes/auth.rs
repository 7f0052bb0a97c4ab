use actix_web::{http::header, web, HttpResponse};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::helper::auth_helpers;
use crate::middleware::AuthenticatedAccount;
use crate::{AppState, DbPool};

#[derive(Deserialize)]
pub struct CallbackQuery {
    code: Option<String>,
}

pub fn config_api(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/login", web::get().to(login))
            .route("/callback", web::get().to(callback))
            .route("/me", web::get().to(me)),
    );
}

async fn login(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Found()
        .append_header((header::LOCATION, state.identity.authorize_url()))
        .finish()
}

async fn callback(
    state: web::Data<AppState>,
    pool: web::Data<DbPool>,
    query: web::Query<CallbackQuery>,
) -> AppResult<HttpResponse> {
    let code = query
        .code
        .as_deref()
        .ok_or_else(|| AppError::Validation("Authorization code is required.".to_string()))?;

    let outcome = auth_helpers::complete_login(&state, &pool, code).await?;
    let target = auth_helpers::frontend_callback_url(&state.frontend_url, &outcome)?;

    Ok(HttpResponse::Found()
        .append_header((header::LOCATION, target))
        .finish())
}

async fn me(user: AuthenticatedAccount) -> HttpResponse {
    HttpResponse::Ok().json(user.0)
}
