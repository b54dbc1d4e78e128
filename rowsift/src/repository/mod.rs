//! Filter composition and count-eliding pagination
//!
//! This module holds the two halves of a paged search:
//!
//! - **Composition**: [`compose`] and the [`SearchCondition`] trait fold a set
//!   of optional criteria into one [`Predicate`], or `None` for "no filter".
//! - **Paging**: [`fetch_page`] runs the bounded content fetch through a
//!   [`QueryExecutor`] and only issues the total-count query when the page
//!   came back full.
//!
//! Executors are injected, so the same search runs against
//! [`MemoryExecutor`] in tests and against Postgres (`PgExecutor`, feature
//! `database`) in production.
//!
//! # Example
//!
//! ```rust
//! use rowsift::repository::{
//!     compose, fetch_page, goe, text_eq, Instrumented, MemoryExecutor, OrderSpec, PageRequest,
//! };
//! use rowsift::member::sample_members;
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let exec = Instrumented::new(MemoryExecutor::new(sample_members()));
//!
//! let filter = compose([
//!     text_eq("team.name", Some("teamB")),
//!     goe("member.age", Some(20)),
//! ]);
//! let request = PageRequest::first_page(10)
//!     .unwrap()
//!     .with_sort(vec![OrderSpec::desc("member.age")]);
//!
//! let page = fetch_page(&exec, filter.as_ref(), &request).await.unwrap();
//! assert_eq!(page.total(), 2);
//! assert_eq!(exec.count_calls(), 0);
//! # });
//! ```

mod composer;
mod error;
mod executor;
mod memory;
mod pagination;
mod pager;
mod predicate;
#[cfg(feature = "database")]
mod sql;

// Re-export all public types
pub use composer::{compose, goe, has_text, loe, text_eq, value_eq, SearchCondition};
pub use error::{PageError, PageResult, QueryErrorKind, QueryExecutionError, QueryStage};
pub use executor::{Instrumented, QueryExecutor};
pub use memory::{compare_records, MemoryExecutor, Record};
pub use pager::fetch_page;
pub use pagination::{
    parse_sort, NullOrdering, OrderDirection, OrderSpec, Page, PageRequest, PaginationMeta,
    DEFAULT_LIMIT,
};
pub use predicate::{FilterCondition, FilterOperator, FilterValue, Predicate};
#[cfg(feature = "database")]
pub use sql::{validate_field_name, PgExecutor, TableSource};
