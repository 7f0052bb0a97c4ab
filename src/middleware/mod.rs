use actix_web::{dev, http::header, web, FromRequest, HttpRequest};
use std::future::{ready, Ready};

use crate::error::{AppError, AppResult};
use crate::helper::account_helpers;
use crate::models::Account;
use crate::{AppState, DbPool};

/// Caller of a route that requires a valid bearer token.
pub struct AuthenticatedAccount(pub Account);

/// Caller of a read route; `None` when no usable token was sent.
pub struct OptionalAccount(pub Option<Account>);

impl OptionalAccount {
    pub fn id(&self) -> Option<&str> {
        self.0.as_ref().map(|account| account.id.as_str())
    }
}

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn resolve_account(req: &HttpRequest, token: &str) -> AppResult<Account> {
    let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or_else(|| AppError::Internal("AppState is not registered.".to_string()))?;
    let pool = req
        .app_data::<web::Data<DbPool>>()
        .ok_or_else(|| AppError::Internal("Database pool is not registered.".to_string()))?;

    let account_id = state.tokens.verify(token)?;
    match account_helpers::find_by_id(pool, &account_id) {
        Err(AppError::NotFound(_)) => Err(AppError::Unauthenticated("User not found.".to_string())),
        other => other,
    }
}

impl FromRequest for AuthenticatedAccount {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut dev::Payload) -> Self::Future {
        let result = match bearer_token(req) {
            Some(token) => resolve_account(req, token).map(AuthenticatedAccount),
            None => Err(AppError::Unauthenticated("Not authenticated.".to_string())),
        };
        ready(result)
    }
}

impl FromRequest for OptionalAccount {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut dev::Payload) -> Self::Future {
        let result = match bearer_token(req) {
            None => Ok(OptionalAccount(None)),
            Some(token) => match resolve_account(req, token) {
                Ok(account) => Ok(OptionalAccount(Some(account))),
                Err(AppError::Unauthenticated(reason)) => {
                    log::debug!("Ignoring unusable bearer token on read route: {}", reason);
                    Ok(OptionalAccount(None))
                }
                Err(e) => Err(e),
            },
        };
        ready(result)
    }
}
