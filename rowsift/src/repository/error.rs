//! Error types for paged queries
//!
//! A page request fails in exactly two ways: the request itself is malformed
//! ([`PageError::InvalidPageRequest`]), or one of the two delegated calls to the
//! [`QueryExecutor`](super::QueryExecutor) fails ([`PageError::QueryExecution`]).
//! The latter carries a [`QueryExecutionError`] that records which of the two
//! calls went wrong.
//!
//! # Example
//!
//! ```rust
//! use rowsift::repository::{QueryExecutionError, QueryErrorKind, QueryStage};
//!
//! let error = QueryExecutionError::timeout(QueryStage::Count, "statement timeout");
//! assert_eq!(error.stage, QueryStage::Count);
//! assert!(matches!(error.kind, QueryErrorKind::Timeout));
//! assert!(error.is_retriable());
//! ```

use std::fmt;

use thiserror::Error;

/// Which of the two delegated executor calls was running when a failure occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryStage {
    /// The bounded content fetch (`fetch_rows`)
    Fetch,
    /// The total-count query (`count_rows`)
    Count,
}

impl fmt::Display for QueryStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetch => write!(f, "fetch_rows"),
            Self::Count => write!(f, "count_rows"),
        }
    }
}

/// Category of executor failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryErrorKind {
    /// The store could not be reached
    ConnectionFailed,
    /// The query did not complete in time
    Timeout,
    /// The store rejected or failed the query
    DatabaseError,
    /// The query could not be built (e.g. an unsafe field name)
    InvalidQuery,
    /// A row could not be decoded
    Decode,
    /// The count disagrees with rows already fetched
    Inconsistent,
    /// Other unclassified error
    Other,
}

impl fmt::Display for QueryErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectionFailed => write!(f, "connection_failed"),
            Self::Timeout => write!(f, "timeout"),
            Self::DatabaseError => write!(f, "database_error"),
            Self::InvalidQuery => write!(f, "invalid_query"),
            Self::Decode => write!(f, "decode"),
            Self::Inconsistent => write!(f, "inconsistent"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Structured failure of a delegated executor call
///
/// # Example
///
/// ```rust
/// use rowsift::repository::{QueryExecutionError, QueryStage};
///
/// let error = QueryExecutionError::database_error(QueryStage::Fetch, "relation \"member\" does not exist");
/// assert_eq!(
///     error.to_string(),
///     "Query database_error error during fetch_rows: relation \"member\" does not exist"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryExecutionError {
    /// The executor call that failed
    pub stage: QueryStage,
    /// The category of error
    pub kind: QueryErrorKind,
    /// Human-readable error message
    pub message: String,
}

impl QueryExecutionError {
    /// Create a new query execution error
    pub fn new(stage: QueryStage, kind: QueryErrorKind, message: impl Into<String>) -> Self {
        Self {
            stage,
            kind,
            message: message.into(),
        }
    }

    /// Create a connection failed error
    pub fn connection_failed(stage: QueryStage, message: impl Into<String>) -> Self {
        Self::new(stage, QueryErrorKind::ConnectionFailed, message)
    }

    /// Create a timeout error
    pub fn timeout(stage: QueryStage, message: impl Into<String>) -> Self {
        Self::new(stage, QueryErrorKind::Timeout, message)
    }

    /// Create a database error
    pub fn database_error(stage: QueryStage, message: impl Into<String>) -> Self {
        Self::new(stage, QueryErrorKind::DatabaseError, message)
    }

    /// Create an invalid query error
    pub fn invalid_query(stage: QueryStage, message: impl Into<String>) -> Self {
        Self::new(stage, QueryErrorKind::InvalidQuery, message)
    }

    /// Re-tag the error with the stage it actually surfaced in
    ///
    /// Executors that share helpers between both calls build errors without
    /// knowing which call they belong to; the caller fixes the stage up.
    #[must_use]
    pub fn with_stage(mut self, stage: QueryStage) -> Self {
        self.stage = stage;
        self
    }

    /// Check if this error is transient
    ///
    /// Retrying is the caller's decision; the pager itself never retries.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self.kind,
            QueryErrorKind::ConnectionFailed | QueryErrorKind::Timeout
        )
    }
}

impl fmt::Display for QueryExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Query {} error during {}: {}",
            self.kind, self.stage, self.message
        )
    }
}

impl std::error::Error for QueryExecutionError {}

#[cfg(feature = "database")]
impl QueryExecutionError {
    /// Classify a sqlx error raised while running `stage`
    pub fn from_sqlx(stage: QueryStage, err: &sqlx::Error) -> Self {
        use sqlx::Error;

        let kind = match err {
            Error::Io(_) | Error::Tls(_) | Error::PoolClosed | Error::WorkerCrashed => {
                QueryErrorKind::ConnectionFailed
            }
            Error::PoolTimedOut => QueryErrorKind::Timeout,
            Error::ColumnDecode { .. } | Error::ColumnNotFound(_) | Error::Decode(_) => {
                QueryErrorKind::Decode
            }
            Error::Database(_) | Error::RowNotFound => QueryErrorKind::DatabaseError,
            _ => QueryErrorKind::Other,
        };
        Self::new(stage, kind, err.to_string())
    }
}

/// Failure of a page request as a whole
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageError {
    /// The page request was rejected before any executor call
    #[error("Invalid page request: {0}")]
    InvalidPageRequest(String),

    /// One of the delegated executor calls failed
    #[error(transparent)]
    QueryExecution(#[from] QueryExecutionError),
}

impl PageError {
    /// Create an invalid page request error
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidPageRequest(reason.into())
    }

    /// The executor stage that failed, if the failure came from the executor
    pub fn stage(&self) -> Option<QueryStage> {
        match self {
            Self::InvalidPageRequest(_) => None,
            Self::QueryExecution(e) => Some(e.stage),
        }
    }
}

/// Result type for page operations
pub type PageResult<T> = std::result::Result<T, PageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_stage_display() {
        assert_eq!(QueryStage::Fetch.to_string(), "fetch_rows");
        assert_eq!(QueryStage::Count.to_string(), "count_rows");
    }

    #[test]
    fn test_query_error_kind_display() {
        assert_eq!(
            QueryErrorKind::ConnectionFailed.to_string(),
            "connection_failed"
        );
        assert_eq!(QueryErrorKind::Timeout.to_string(), "timeout");
        assert_eq!(QueryErrorKind::DatabaseError.to_string(), "database_error");
        assert_eq!(QueryErrorKind::InvalidQuery.to_string(), "invalid_query");
        assert_eq!(QueryErrorKind::Decode.to_string(), "decode");
        assert_eq!(QueryErrorKind::Inconsistent.to_string(), "inconsistent");
        assert_eq!(QueryErrorKind::Other.to_string(), "other");
    }

    #[test]
    fn test_constructors_set_kind() {
        let err = QueryExecutionError::connection_failed(QueryStage::Fetch, "refused");
        assert_eq!(err.kind, QueryErrorKind::ConnectionFailed);
        assert_eq!(err.stage, QueryStage::Fetch);

        let err = QueryExecutionError::invalid_query(QueryStage::Count, "bad field");
        assert_eq!(err.kind, QueryErrorKind::InvalidQuery);
        assert_eq!(err.message, "bad field");
    }

    #[test]
    fn test_with_stage() {
        let err = QueryExecutionError::timeout(QueryStage::Fetch, "slow").with_stage(QueryStage::Count);
        assert_eq!(err.stage, QueryStage::Count);
        assert_eq!(err.kind, QueryErrorKind::Timeout);
    }

    #[test]
    fn test_is_retriable() {
        assert!(QueryExecutionError::connection_failed(QueryStage::Fetch, "x").is_retriable());
        assert!(QueryExecutionError::timeout(QueryStage::Count, "x").is_retriable());
        assert!(!QueryExecutionError::database_error(QueryStage::Fetch, "x").is_retriable());
        assert!(!QueryExecutionError::invalid_query(QueryStage::Fetch, "x").is_retriable());
    }

    #[test]
    fn test_display() {
        let err = QueryExecutionError::database_error(QueryStage::Count, "syntax error");
        assert_eq!(
            err.to_string(),
            "Query database_error error during count_rows: syntax error"
        );
    }

    #[test]
    fn test_page_error_from_execution_error() {
        let err: PageError = QueryExecutionError::timeout(QueryStage::Count, "slow").into();
        assert_eq!(err.stage(), Some(QueryStage::Count));
        assert!(err.to_string().contains("count_rows"));
    }

    #[test]
    fn test_invalid_page_request_has_no_stage() {
        let err = PageError::invalid("limit must be positive");
        assert_eq!(err.stage(), None);
        assert_eq!(
            err.to_string(),
            "Invalid page request: limit must be positive"
        );
    }

    #[test]
    fn test_error_is_error_trait() {
        let error: Box<dyn std::error::Error> =
            Box::new(QueryExecutionError::timeout(QueryStage::Fetch, "slow"));
        assert!(error.to_string().contains("timeout"));
    }
}
