use crate::error::{AppError, AppResult};
use crate::models::db_operations::accounts_db_operations;
use crate::models::{Account, ExternalIdentity};
use crate::DbPool;

pub fn find_by_external_id(pool: &DbPool, external_id: &str) -> AppResult<Option<Account>> {
    let conn = pool.get()?;
    Ok(accounts_db_operations::read_account_by_external_id(&conn, external_id)?)
}

/// Atomic per external id; see `accounts_db_operations::upsert_account`.
pub fn upsert_from_identity(pool: &DbPool, identity: &ExternalIdentity) -> AppResult<Account> {
    let conn = pool.get()?;
    Ok(accounts_db_operations::upsert_account(&conn, identity)?)
}

pub fn find_by_id(pool: &DbPool, account_id: &str) -> AppResult<Account> {
    let conn = pool.get()?;
    accounts_db_operations::read_account_by_id(&conn, account_id)?
        .ok_or_else(|| AppError::NotFound("User not found.".to_string()))
}
