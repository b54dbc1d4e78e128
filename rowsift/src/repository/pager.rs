//! Count-eliding page fetch
//!
//! A page request always runs the bounded content fetch. The total-count
//! query only runs when the content fills the page exactly, because only then
//! can more rows exist beyond it. A short page proves it is the last one, and
//! its total is `offset + content.len()`.
//!
//! The two calls run one after the other, fetch first, and always receive the
//! same filter. Either failing fails the whole request; there is no partial
//! page and no fallback total.

use tracing::{debug, error};

use super::error::{PageResult, QueryErrorKind, QueryExecutionError, QueryStage};
use super::executor::QueryExecutor;
use super::pagination::{Page, PageRequest};
use super::predicate::Predicate;

/// Total implied by the fetched content alone, if it implies one
///
/// Returns `None` when the content filled the page and a count is needed.
/// Callers pass a validated request's bounds and `fetched <= limit`, so the
/// sum cannot overflow.
#[must_use]
pub(crate) fn total_from_content(offset: u64, limit: u64, fetched: u64) -> Option<u64> {
    (fetched < limit).then(|| offset + fetched)
}

/// Fetch one page of rows, issuing the count query only when needed
///
/// # Errors
///
/// - [`PageError::InvalidPageRequest`](super::PageError::InvalidPageRequest)
///   if `request` breaks its invariants; the executor is not called.
/// - [`PageError::QueryExecution`](super::PageError::QueryExecution) if
///   either delegated call fails. A failed fetch never triggers the count.
///
/// # Example
///
/// ```rust
/// use rowsift::member::{sample_members, MemberSearchCondition};
/// use rowsift::repository::{fetch_page, MemoryExecutor, PageRequest, SearchCondition};
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let exec = MemoryExecutor::new(sample_members());
/// let filter = MemberSearchCondition::new().with_username("member1").compose();
///
/// let page = fetch_page(&exec, filter.as_ref(), &PageRequest::new(0, 10).unwrap())
///     .await
///     .unwrap();
/// assert_eq!(page.total(), 1);
/// # });
/// ```
pub async fn fetch_page<E>(
    executor: &E,
    filter: Option<&Predicate>,
    request: &PageRequest,
) -> PageResult<Page<E::Row>>
where
    E: QueryExecutor,
{
    request.validate()?;
    let (offset, limit) = (request.offset(), request.limit());

    let content = executor
        .fetch_rows(filter, request.sort(), offset, limit)
        .await
        .map_err(|e| {
            let e = e.with_stage(QueryStage::Fetch);
            error!(offset, limit, error = %e, "Page content fetch failed");
            e
        })?;

    let fetched = content.len() as u64;
    if fetched > limit {
        let e = QueryExecutionError::new(
            QueryStage::Fetch,
            QueryErrorKind::Inconsistent,
            format!("executor returned {} rows for a limit of {}", fetched, limit),
        );
        error!(offset, limit, error = %e, "Page content overflowed its limit");
        return Err(e.into());
    }

    let total = match total_from_content(offset, limit, fetched) {
        Some(total) => {
            debug!(offset, limit, fetched, total, "Short page, count query elided");
            total
        }
        None => {
            let total = executor.count_rows(filter).await.map_err(|e| {
                let e = e.with_stage(QueryStage::Count);
                error!(offset, limit, error = %e, "Page count query failed");
                e
            })?;

            let seen = offset + fetched;
            if total < seen {
                let e = QueryExecutionError::new(
                    QueryStage::Count,
                    QueryErrorKind::Inconsistent,
                    format!("count {} is below the {} rows already paged past", total, seen),
                );
                error!(offset, limit, error = %e, "Page count disagrees with content");
                return Err(e.into());
            }

            debug!(offset, limit, fetched, total, "Full page, count query issued");
            total
        }
    };

    Ok(Page::new(content, request, total))
}
