//! Query execution capability
//!
//! The pager never talks to a store directly. Everything it needs is behind
//! [`QueryExecutor`]: one bounded, ordered fetch and one total count, both
//! driven by the same optional [`Predicate`]. Executors are passed in
//! explicitly, so a database-backed one and an in-memory one are
//! interchangeable.
//!
//! Traits use RPITIT (Return Position Impl Trait In Traits), so implementors
//! can write plain `async fn` without `async_trait`.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use super::error::QueryExecutionError;
use super::pagination::OrderSpec;
use super::predicate::Predicate;

/// Runs filtered, ordered and bounded queries against some store
///
/// `None` as the filter means "no filter": every row is selected.
///
/// # Example
///
/// ```rust
/// use rowsift::repository::{OrderSpec, Predicate, QueryExecutionError, QueryExecutor};
///
/// struct Numbers(Vec<u64>);
///
/// impl QueryExecutor for Numbers {
///     type Row = u64;
///
///     async fn fetch_rows(
///         &self,
///         _filter: Option<&Predicate>,
///         _sort: &[OrderSpec],
///         offset: u64,
///         limit: u64,
///     ) -> Result<Vec<u64>, QueryExecutionError> {
///         Ok(self.0.iter().copied().skip(offset as usize).take(limit as usize).collect())
///     }
///
///     async fn count_rows(&self, _filter: Option<&Predicate>) -> Result<u64, QueryExecutionError> {
///         Ok(self.0.len() as u64)
///     }
/// }
/// ```
pub trait QueryExecutor: Send + Sync {
    /// The row type produced by [`fetch_rows`](Self::fetch_rows)
    type Row: Send;

    /// Fetch at most `limit` rows matching `filter`, ordered by `sort`,
    /// after skipping the first `offset` matches
    fn fetch_rows(
        &self,
        filter: Option<&Predicate>,
        sort: &[OrderSpec],
        offset: u64,
        limit: u64,
    ) -> impl Future<Output = Result<Vec<Self::Row>, QueryExecutionError>> + Send;

    /// Count every row matching `filter`
    fn count_rows(
        &self,
        filter: Option<&Predicate>,
    ) -> impl Future<Output = Result<u64, QueryExecutionError>> + Send;
}

impl<E: QueryExecutor> QueryExecutor for &E {
    type Row = E::Row;

    fn fetch_rows(
        &self,
        filter: Option<&Predicate>,
        sort: &[OrderSpec],
        offset: u64,
        limit: u64,
    ) -> impl Future<Output = Result<Vec<Self::Row>, QueryExecutionError>> + Send {
        (**self).fetch_rows(filter, sort, offset, limit)
    }

    fn count_rows(
        &self,
        filter: Option<&Predicate>,
    ) -> impl Future<Output = Result<u64, QueryExecutionError>> + Send {
        (**self).count_rows(filter)
    }
}

/// Executor wrapper that counts the calls made through it
///
/// Useful to observe whether a page request needed its count query.
///
/// ```rust
/// use rowsift::repository::{fetch_page, Instrumented, MemoryExecutor, PageRequest};
/// use rowsift::member::sample_members;
///
/// # tokio_test_block(async {
/// let exec = Instrumented::new(MemoryExecutor::new(sample_members()));
/// let page = fetch_page(&exec, None, &PageRequest::new(0, 10).unwrap()).await.unwrap();
///
/// assert_eq!(page.total(), 4);
/// assert_eq!(exec.fetch_calls(), 1);
/// assert_eq!(exec.count_calls(), 0);
/// # });
/// # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
/// # }
/// ```
#[derive(Debug, Default)]
pub struct Instrumented<E> {
    inner: E,
    fetches: AtomicU64,
    counts: AtomicU64,
}

impl<E> Instrumented<E> {
    /// Wrap an executor with zeroed counters
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            fetches: AtomicU64::new(0),
            counts: AtomicU64::new(0),
        }
    }

    /// Number of `fetch_rows` calls so far
    pub fn fetch_calls(&self) -> u64 {
        self.fetches.load(Ordering::Relaxed)
    }

    /// Number of `count_rows` calls so far
    pub fn count_calls(&self) -> u64 {
        self.counts.load(Ordering::Relaxed)
    }

    /// Zero both counters
    pub fn reset(&self) {
        self.fetches.store(0, Ordering::Relaxed);
        self.counts.store(0, Ordering::Relaxed);
    }

    /// The wrapped executor
    pub fn inner(&self) -> &E {
        &self.inner
    }

    /// Unwrap, discarding the counters
    pub fn into_inner(self) -> E {
        self.inner
    }
}

impl<E: QueryExecutor> QueryExecutor for Instrumented<E> {
    type Row = E::Row;

    fn fetch_rows(
        &self,
        filter: Option<&Predicate>,
        sort: &[OrderSpec],
        offset: u64,
        limit: u64,
    ) -> impl Future<Output = Result<Vec<Self::Row>, QueryExecutionError>> + Send {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        self.inner.fetch_rows(filter, sort, offset, limit)
    }

    fn count_rows(
        &self,
        filter: Option<&Predicate>,
    ) -> impl Future<Output = Result<u64, QueryExecutionError>> + Send {
        self.counts.fetch_add(1, Ordering::Relaxed);
        self.inner.count_rows(filter)
    }
}
