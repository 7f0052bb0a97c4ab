use crate::models::db_operations::{placeholders, DbError};
use crate::models::{Account, AccountSummary, ExternalIdentity};
use chrono::Utc;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::collections::HashMap;
use uuid::Uuid;

const ACCOUNT_COLUMNS: &str = "id, external_id, username, email, avatar_url, created_at, updated_at";

fn map_account_row(row: &Row) -> rusqlite::Result<Account> {
    Ok(Account {
        id: row.get(0)?,
        external_id: row.get(1)?,
        username: row.get(2)?,
        email: row.get(3)?,
        avatar_url: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

pub fn read_account_by_id(conn: &Connection, account_id: &str) -> Result<Option<Account>, DbError> {
    let account = conn
        .query_row(
            &format!("SELECT {} FROM accounts WHERE id = ?1", ACCOUNT_COLUMNS),
            [account_id],
            map_account_row,
        )
        .optional()?;
    Ok(account)
}

pub fn read_account_by_external_id(
    conn: &Connection,
    external_id: &str,
) -> Result<Option<Account>, DbError> {
    let account = conn
        .query_row(
            &format!("SELECT {} FROM accounts WHERE external_id = ?1", ACCOUNT_COLUMNS),
            [external_id],
            map_account_row,
        )
        .optional()?;
    Ok(account)
}

/// Creates the account on first login and refreshes the profile afterwards.
/// One statement, so the `external_id` unique index arbitrates concurrent logins.
pub fn upsert_account(conn: &Connection, identity: &ExternalIdentity) -> Result<Account, DbError> {
    let now = Utc::now();
    let account = conn.query_row(
        &format!(
            "INSERT INTO accounts (id, external_id, username, email, avatar_url, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
             ON CONFLICT(external_id) DO UPDATE SET
                 username = excluded.username,
                 email = excluded.email,
                 avatar_url = excluded.avatar_url,
                 updated_at = excluded.updated_at
             RETURNING {}",
            ACCOUNT_COLUMNS
        ),
        params![
            Uuid::new_v4().to_string(),
            identity.external_id,
            identity.login_name,
            identity.email,
            identity.avatar_url,
            now,
        ],
        map_account_row,
    )?;
    Ok(account)
}

pub fn read_all_accounts(conn: &Connection) -> Result<Vec<Account>, DbError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM accounts ORDER BY created_at",
        ACCOUNT_COLUMNS
    ))?;
    let rows = stmt.query_map([], map_account_row)?;

    let mut accounts = Vec::new();
    for account in rows {
        accounts.push(account?);
    }
    Ok(accounts)
}

/// Batch lookup used to attach owners to listed posts and media.
pub fn read_account_summaries(
    conn: &Connection,
    account_ids: &[String],
) -> Result<HashMap<String, AccountSummary>, DbError> {
    let mut summaries = HashMap::new();
    if account_ids.is_empty() {
        return Ok(summaries);
    }

    let mut stmt = conn.prepare(&format!(
        "SELECT id, username, avatar_url FROM accounts WHERE id IN ({})",
        placeholders(account_ids.len())
    ))?;
    let rows = stmt.query_map(params_from_iter(account_ids.iter()), |row| {
        Ok(AccountSummary {
            id: row.get(0)?,
            username: row.get(1)?,
            avatar_url: row.get(2)?,
        })
    })?;

    for summary in rows {
        let summary = summary?;
        summaries.insert(summary.id.clone(), summary);
    }
    Ok(summaries)
}
