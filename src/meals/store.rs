use std::collections::BTreeMap;

use async_trait::async_trait;
use thiserror::Error;
use time::Date;
use uuid::Uuid;

use super::repo_types::{ComplianceFilter, Meal, MealDraft, Page};

/// Failures surfaced by a meal store. Nothing here is retried by callers.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backend could not be reached or timed out.
    #[error("meal store unavailable: {0}")]
    Unavailable(String),
    #[error("meal store query failed: {0}")]
    Query(String),
}

/// SQLSTATE for a statement cancelled by `statement_timeout`.
const QUERY_CANCELED: &str = "57014";

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        let unavailable = match &e {
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Protocol(_)
            | sqlx::Error::WorkerCrashed => true,
            sqlx::Error::Database(db) => db.code().as_deref() == Some(QUERY_CANCELED),
            _ => false,
        };
        if unavailable {
            Self::Unavailable(e.to_string())
        } else {
            Self::Query(e.to_string())
        }
    }
}

/// Per-account meal persistence. Every method is scoped by `owner` and only
/// ever sees that account's rows; soft-deleted rows are invisible to all of
/// them.
#[async_trait]
pub trait MealStore: Send + Sync {
    async fn insert(&self, owner: Uuid, draft: MealDraft) -> Result<Meal, StoreError>;

    /// Returns `None` when no active meal with `id` belongs to `owner`.
    async fn update(&self, owner: Uuid, id: Uuid, draft: MealDraft)
        -> Result<Option<Meal>, StoreError>;

    /// Sets the tombstone. Returns `false` when there was nothing to delete.
    async fn soft_delete(&self, owner: Uuid, id: Uuid) -> Result<bool, StoreError>;

    async fn find_active(&self, owner: Uuid, id: Uuid) -> Result<Option<Meal>, StoreError>;

    /// Newest `occurred_at` first.
    async fn list_active(&self, owner: Uuid, page: Page) -> Result<Vec<Meal>, StoreError>;

    async fn count_active(&self, owner: Uuid, filter: ComplianceFilter)
        -> Result<i64, StoreError>;

    /// Compliant meal counts keyed by calendar day of `occurred_at`.
    async fn group_active_compliant_by_date(
        &self,
        owner: Uuid,
    ) -> Result<BTreeMap<Date, i64>, StoreError>;
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;
    use std::error::Error as StdError;

    use sqlx::error::{DatabaseError, ErrorKind};

    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("{message}")]
    struct PgLike {
        code: &'static str,
        message: &'static str,
    }

    impl DatabaseError for PgLike {
        fn message(&self) -> &str {
            self.message
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed(self.code))
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::Other
        }
    }

    fn db_error(code: &'static str, message: &'static str) -> sqlx::Error {
        sqlx::Error::Database(Box::new(PgLike { code, message }))
    }

    #[test]
    fn statement_timeout_counts_as_unavailable() {
        let err = StoreError::from(db_error(
            "57014",
            "canceling statement due to statement timeout",
        ));
        assert!(matches!(err, StoreError::Unavailable(_)), "{err:?}");
    }

    #[test]
    fn pool_timeout_counts_as_unavailable() {
        assert!(matches!(
            StoreError::from(sqlx::Error::PoolTimedOut),
            StoreError::Unavailable(_)
        ));
    }

    #[test]
    fn other_database_errors_are_query_failures() {
        let err = StoreError::from(db_error("42P01", "relation \"meals\" does not exist"));
        assert!(matches!(err, StoreError::Query(_)), "{err:?}");
        assert!(matches!(
            StoreError::from(sqlx::Error::RowNotFound),
            StoreError::Query(_)
        ));
    }
}
