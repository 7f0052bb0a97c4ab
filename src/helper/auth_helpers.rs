use crate::error::{AppError, AppResult};
use crate::helper::account_helpers;
use crate::models::Account;
use crate::{AppState, DbPool};
use url::Url;

pub struct LoginOutcome {
    pub account: Account,
    pub token: String,
}

/// Code exchange, identity lookup, allow-list gate, account upsert, token.
/// The allow-list is checked before anything is written.
pub async fn complete_login(state: &AppState, pool: &DbPool, code: &str) -> AppResult<LoginOutcome> {
    if code.trim().is_empty() {
        return Err(AppError::Validation("Authorization code is required.".to_string()));
    }

    let provider_token = state.identity.exchange_code(code).await?;
    let identity = state.identity.fetch_identity(&provider_token).await?;

    state.allow_list.ensure_permitted(&identity)?;

    let is_new = account_helpers::find_by_external_id(pool, &identity.external_id)?.is_none();
    let account = account_helpers::upsert_from_identity(pool, &identity)?;
    let token = state.tokens.issue(&account.id)?;

    if is_new {
        log::info!("Created account {} for GitHub user '{}'.", account.id, account.username);
    } else {
        log::info!("Account {} ({}) logged in.", account.id, account.username);
    }
    Ok(LoginOutcome { account, token })
}

/// Where the browser lands after a successful login.
pub fn frontend_callback_url(frontend_url: &str, outcome: &LoginOutcome) -> AppResult<String> {
    let base = format!("{}/callback", frontend_url.trim_end_matches('/'));
    let url = Url::parse_with_params(
        &base,
        &[
            ("access_token", outcome.token.as_str()),
            ("user", outcome.account.id.as_str()),
        ],
    )
    .map_err(|e| AppError::Internal(format!("Invalid FRONTEND_URL '{}': {}", frontend_url, e)))?;
    Ok(url.to_string())
}
