//! Who may see or change a post or media record.
//!
//! Everything here is a pure function of the caller, the owner and the
//! status. Callers load those values first and ask before acting.

use crate::error::{AppError, AppResult};
use crate::models::ContentStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Update,
    Delete,
}

impl Access {
    fn is_write(&self) -> bool {
        !matches!(self, Access::Read)
    }
}

/// Single-resource decision. First matching rule wins:
/// anonymous callers read published records only; owners do anything;
/// other accounts read published records and never write.
pub fn authorize(
    caller_id: Option<&str>,
    owner_id: &str,
    status: ContentStatus,
    access: Access,
) -> AppResult<()> {
    match caller_id {
        None if status.is_published() && !access.is_write() => Ok(()),
        None if access.is_write() => Err(AppError::Forbidden(
            "Authentication is required to modify this resource.".to_string(),
        )),
        None => Err(AppError::Forbidden(
            "This resource is not published.".to_string(),
        )),
        Some(caller) if caller == owner_id => Ok(()),
        Some(_) if status.is_published() && !access.is_write() => Ok(()),
        Some(_) if access.is_write() => Err(AppError::Forbidden(
            "Only the owner may modify this resource.".to_string(),
        )),
        Some(_) => Err(AppError::Forbidden(
            "This resource is not published.".to_string(),
        )),
    }
}

/// Row filter a listing runs under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListScope {
    /// `status = 'published'`
    PublishedOnly,
    /// `status = ?`, regardless of owner.
    WithStatus(ContentStatus),
    /// `owner_id = ? OR status = 'published'`
    OwnedOrPublished(String),
}

/// Listing decision. An authenticated caller naming a status gets every row in
/// that status, including other accounts' drafts. This is looser than
/// `authorize` and is kept that way until product decides otherwise.
pub fn list_scope(caller_id: Option<&str>, requested_status: Option<ContentStatus>) -> ListScope {
    match (caller_id, requested_status) {
        (None, _) => ListScope::PublishedOnly,
        (Some(_), Some(status)) => ListScope::WithStatus(status),
        (Some(caller), None) => ListScope::OwnedOrPublished(caller.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ContentStatus::*;

    const OWNER: &str = "owner";
    const OTHER: &str = "other";

    fn allowed(caller: Option<&str>, status: ContentStatus, access: Access) -> bool {
        authorize(caller, OWNER, status, access).is_ok()
    }

    #[test]
    fn anonymous_reads_published_only() {
        assert!(allowed(None, Published, Access::Read));
        assert!(!allowed(None, Draft, Access::Read));
        assert!(!allowed(None, Archived, Access::Read));
    }

    #[test]
    fn anonymous_never_writes() {
        for status in [Draft, Published, Archived] {
            assert!(!allowed(None, status, Access::Update));
            assert!(!allowed(None, status, Access::Delete));
        }
    }

    #[test]
    fn owner_can_do_anything() {
        for status in [Draft, Published, Archived] {
            for access in [Access::Read, Access::Update, Access::Delete] {
                assert!(allowed(Some(OWNER), status, access));
            }
        }
    }

    #[test]
    fn other_account_reads_published_and_never_writes() {
        assert!(allowed(Some(OTHER), Published, Access::Read));
        assert!(!allowed(Some(OTHER), Draft, Access::Read));
        assert!(!allowed(Some(OTHER), Archived, Access::Read));
        for status in [Draft, Published, Archived] {
            assert!(!allowed(Some(OTHER), status, Access::Update));
            assert!(!allowed(Some(OTHER), status, Access::Delete));
        }
    }

    #[test]
    fn denials_are_forbidden() {
        let err = authorize(None, OWNER, Draft, Access::Read).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn listing_scopes() {
        assert_eq!(list_scope(None, None), ListScope::PublishedOnly);
        assert_eq!(list_scope(None, Some(Draft)), ListScope::PublishedOnly);
        assert_eq!(list_scope(Some(OWNER), Some(Draft)), ListScope::WithStatus(Draft));
        assert_eq!(
            list_scope(Some(OWNER), None),
            ListScope::OwnedOrPublished(OWNER.to_string())
        );
    }
}
