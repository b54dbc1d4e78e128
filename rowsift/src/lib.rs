//! # rowsift
//!
//! Optional-criteria filter composition and count-eliding pagination for
//! relational stores.
//!
//! ## Features
//!
//! - **Conditional filters**: turn a bag of optional search criteria into one
//!   predicate, or "no filter" when nothing is set; blank text counts as unset
//! - **Count elision**: fetch a page and only run the total-count query when
//!   the page came back full
//! - **Pluggable executors**: in-memory snapshots for tests and tools,
//!   PostgreSQL through `sqlx` with the `database` feature
//! - **Layered configuration**: defaults, TOML files and `ROWSIFT_` env vars
//!   via Figment
//!
//! ## Example
//!
//! ```rust,no_run
//! use rowsift::prelude::*;
//! use rowsift::member::{default_sort, sample_members, MemberSearchCondition};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     // Load configuration
//!     let config = Config::load()?;
//!
//!     // Initialize tracing
//!     init_tracing(&config)?;
//!
//!     let executor = MemoryExecutor::new(sample_members());
//!     let filter = MemberSearchCondition::new()
//!         .with_team_name("teamA")
//!         .compose();
//!     let request = config
//!         .pagination
//!         .page_request(Some(0), Some(10))?
//!         .with_sort(default_sort());
//!
//!     let page = fetch_page(&executor, filter.as_ref(), &request).await?;
//!     println!("{} of {} members", page.len(), page.total());
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod member;
pub mod observability;
pub mod repository;

#[cfg(feature = "database")]
pub mod database;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{Config, DatabaseConfig, LogFormat, PaginationConfig, ServiceConfig};
    pub use crate::error::{Error, Result};
    pub use crate::observability::init_tracing;

    pub use crate::repository::{
        compose, fetch_page, FilterCondition, FilterOperator, FilterValue, Instrumented,
        MemoryExecutor, NullOrdering, OrderDirection, OrderSpec, Page, PageError, PageRequest,
        PageResult, PaginationMeta, Predicate, QueryExecutionError, QueryExecutor, Record,
        SearchCondition,
    };

    #[cfg(feature = "database")]
    pub use crate::database::create_pool;

    #[cfg(feature = "database")]
    pub use crate::repository::{PgExecutor, TableSource};
}
