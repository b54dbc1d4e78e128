//! PostgreSQL query executor
//!
//! Predicates and orderings are rendered with [`sqlx::QueryBuilder`]. Values
//! are always bound as parameters. Field names cannot be bound, so every name
//! is checked against the row type's field list and with
//! [`paginator_sqlx::validate_field_name`] before it reaches the SQL text.

use std::marker::PhantomData;

use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use tracing::debug;

use super::error::{QueryExecutionError, QueryStage};
use super::executor::QueryExecutor;
use super::memory::Record;
use super::pagination::OrderSpec;
use super::predicate::{FilterCondition, FilterOperator, FilterValue, Predicate};

/// Field names are checked with the same guard paginated queries use
pub use paginator_sqlx::validate_field_name;

/// The statements a [`PgExecutor`] extends with filters, ordering and bounds
///
/// `select` must produce rows decodable as the executor's row type, and
/// `count` a single `BIGINT`. Neither may carry its own `WHERE`, `ORDER BY`,
/// `LIMIT` or `OFFSET`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSource {
    select: String,
    count: String,
}

impl TableSource {
    /// Create a source from its select and count statements
    pub fn new(select: impl Into<String>, count: impl Into<String>) -> Self {
        Self {
            select: select.into(),
            count: count.into(),
        }
    }

    /// The bare select statement
    pub fn select_sql(&self) -> &str {
        &self.select
    }

    /// The bare count statement
    pub fn count_sql(&self) -> &str {
        &self.count
    }

    /// Build the bounded, ordered content query
    pub fn select_query(
        &self,
        fields: &[&str],
        filter: Option<&Predicate>,
        sort: &[OrderSpec],
        offset: u64,
        limit: u64,
    ) -> Result<QueryBuilder<'static, Postgres>, QueryExecutionError> {
        let stage = QueryStage::Fetch;
        let mut builder = QueryBuilder::new(self.select.as_str());
        push_filter(&mut builder, fields, filter, stage)?;

        if !sort.is_empty() {
            builder.push(" ORDER BY ");
            for (i, spec) in sort.iter().enumerate() {
                check_field(fields, &spec.field, stage)?;
                if i > 0 {
                    builder.push(", ");
                }
                builder
                    .push(&spec.field)
                    .push(" ")
                    .push(spec.direction.as_sql())
                    .push(spec.nulls.as_sql());
            }
        }

        builder.push(" LIMIT ");
        builder.push_bind(to_bigint(limit, "limit", stage)?);
        builder.push(" OFFSET ");
        builder.push_bind(to_bigint(offset, "offset", stage)?);
        Ok(builder)
    }

    /// Build the total-count query
    pub fn count_query(
        &self,
        fields: &[&str],
        filter: Option<&Predicate>,
    ) -> Result<QueryBuilder<'static, Postgres>, QueryExecutionError> {
        let mut builder = QueryBuilder::new(self.count.as_str());
        push_filter(&mut builder, fields, filter, QueryStage::Count)?;
        Ok(builder)
    }
}

fn to_bigint(value: u64, what: &str, stage: QueryStage) -> Result<i64, QueryExecutionError> {
    i64::try_from(value).map_err(|_| {
        QueryExecutionError::invalid_query(stage, format!("{} {} exceeds BIGINT", what, value))
    })
}

fn check_field(fields: &[&str], name: &str, stage: QueryStage) -> Result<(), QueryExecutionError> {
    validate_field_name(name).map_err(|_| {
        QueryExecutionError::invalid_query(stage, format!("invalid field name '{}'", name))
    })?;
    if !fields.contains(&name) {
        return Err(QueryExecutionError::invalid_query(
            stage,
            format!("unknown field '{}'", name),
        ));
    }
    Ok(())
}

fn push_filter(
    builder: &mut QueryBuilder<'static, Postgres>,
    fields: &[&str],
    filter: Option<&Predicate>,
    stage: QueryStage,
) -> Result<(), QueryExecutionError> {
    let Some(filter) = filter else {
        return Ok(());
    };

    builder.push(" WHERE ");
    for (i, condition) in filter.conditions().into_iter().enumerate() {
        check_field(fields, &condition.field, stage)?;
        if i > 0 {
            builder.push(" AND ");
        }
        push_condition(builder, condition, stage)?;
    }
    Ok(())
}

fn push_condition(
    builder: &mut QueryBuilder<'static, Postgres>,
    condition: &FilterCondition,
    stage: QueryStage,
) -> Result<(), QueryExecutionError> {
    let op = condition.operator;

    if op == FilterOperator::In {
        return push_in(builder, condition, stage);
    }

    builder.push(&condition.field).push(" ").push(op.as_sql());
    if op.is_unary() {
        return Ok(());
    }

    builder.push(" ");
    match &condition.value {
        FilterValue::String(s) => {
            builder.push_bind(s.clone());
        }
        FilterValue::Integer(n) => {
            builder.push_bind(*n);
        }
        FilterValue::Float(x) => {
            builder.push_bind(*x);
        }
        FilterValue::Boolean(b) => {
            builder.push_bind(*b);
        }
        // comparing with NULL is never true
        FilterValue::Null => {
            builder.push("NULL");
        }
        FilterValue::IntegerList(_) | FilterValue::StringList(_) => {
            return Err(QueryExecutionError::invalid_query(
                stage,
                format!("list value used with '{}' on {}", op, condition.field),
            ));
        }
    }
    Ok(())
}

fn push_in(
    builder: &mut QueryBuilder<'static, Postgres>,
    condition: &FilterCondition,
    stage: QueryStage,
) -> Result<(), QueryExecutionError> {
    match &condition.value {
        FilterValue::IntegerList(items) if items.is_empty() => {
            builder.push("FALSE");
        }
        FilterValue::StringList(items) if items.is_empty() => {
            builder.push("FALSE");
        }
        FilterValue::IntegerList(items) => {
            builder.push(&condition.field).push(" IN (");
            let mut separated = builder.separated(", ");
            for item in items {
                separated.push_bind(*item);
            }
            separated.push_unseparated(")");
        }
        FilterValue::StringList(items) => {
            builder.push(&condition.field).push(" IN (");
            let mut separated = builder.separated(", ");
            for item in items {
                separated.push_bind(item.clone());
            }
            separated.push_unseparated(")");
        }
        other => {
            return Err(QueryExecutionError::invalid_query(
                stage,
                format!("IN on {} needs a list, got {}", condition.field, other),
            ));
        }
    }
    Ok(())
}

/// Executor running against a PostgreSQL pool
///
/// Content and count go to the pool as two separate statements, in that order,
/// possibly on different connections. They do not share a snapshot: a write
/// committed between them can change the count. [`fetch_page`] rejects a
/// count below the rows already paged past with
/// [`QueryErrorKind::Inconsistent`](super::QueryErrorKind::Inconsistent), but
/// a count that grew is returned as is. Callers needing one snapshot should
/// run both statements on a single `REPEATABLE READ` transaction.
///
/// [`fetch_page`]: super::fetch_page
pub struct PgExecutor<R> {
    pool: PgPool,
    source: TableSource,
    _row: PhantomData<fn() -> R>,
}

impl<R> std::fmt::Debug for PgExecutor<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgExecutor")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

impl<R: Record> PgExecutor<R> {
    /// Create an executor over `source` using `pool`
    pub fn new(pool: PgPool, source: TableSource) -> Self {
        Self {
            pool,
            source,
            _row: PhantomData,
        }
    }

    /// The underlying pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// The statements this executor extends
    pub fn source(&self) -> &TableSource {
        &self.source
    }
}

impl<R> QueryExecutor for PgExecutor<R>
where
    R: Record + for<'r> FromRow<'r, PgRow> + Unpin + 'static,
{
    type Row = R;

    async fn fetch_rows(
        &self,
        filter: Option<&Predicate>,
        sort: &[OrderSpec],
        offset: u64,
        limit: u64,
    ) -> Result<Vec<R>, QueryExecutionError> {
        let mut builder = self
            .source
            .select_query(R::FIELDS, filter, sort, offset, limit)?;
        debug!(sql = builder.sql(), "Fetching rows");

        builder
            .build_query_as::<R>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| QueryExecutionError::from_sqlx(QueryStage::Fetch, &e))
    }

    async fn count_rows(&self, filter: Option<&Predicate>) -> Result<u64, QueryExecutionError> {
        let mut builder = self.source.count_query(R::FIELDS, filter)?;
        debug!(sql = builder.sql(), "Counting rows");

        let total: i64 = builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| QueryExecutionError::from_sqlx(QueryStage::Count, &e))?;

        u64::try_from(total).map_err(|_| {
            QueryExecutionError::new(
                QueryStage::Count,
                super::error::QueryErrorKind::Decode,
                format!("negative row count {}", total),
            )
        })
    }
}
