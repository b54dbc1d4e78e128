//! In-memory query executor
//!
//! Evaluates predicates and orderings over a snapshot of rows. Every call
//! sees the same snapshot, so the count always agrees with the content.

use std::cmp::Ordering;
use std::sync::Arc;

use super::error::{QueryExecutionError, QueryStage};
use super::executor::QueryExecutor;
use super::pagination::{NullOrdering, OrderDirection, OrderSpec};
use super::predicate::{FilterValue, Predicate};

/// A row whose fields can be looked up by qualified name
pub trait Record: Clone + Send + Sync {
    /// Every field name [`field`](Self::field) answers for
    const FIELDS: &'static [&'static str];

    /// Value of `name` for this row; `None` or [`FilterValue::Null`] for NULL
    fn field(&self, name: &str) -> Option<FilterValue>;
}

/// Executor over an immutable, shared row snapshot
///
/// Rows are kept in insertion order, which is also the tie-break order when
/// sort keys compare equal.
#[derive(Debug)]
pub struct MemoryExecutor<R> {
    rows: Arc<[R]>,
}

impl<R> Clone for MemoryExecutor<R> {
    fn clone(&self) -> Self {
        Self {
            rows: Arc::clone(&self.rows),
        }
    }
}

impl<R: Record> MemoryExecutor<R> {
    /// Snapshot `rows`
    pub fn new(rows: Vec<R>) -> Self {
        Self { rows: rows.into() }
    }

    /// The full snapshot, unfiltered
    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    fn check_fields<'a>(
        stage: QueryStage,
        fields: impl IntoIterator<Item = &'a str>,
    ) -> Result<(), QueryExecutionError> {
        for field in fields {
            if !R::FIELDS.contains(&field) {
                return Err(QueryExecutionError::invalid_query(
                    stage,
                    format!("unknown field '{}'", field),
                ));
            }
        }
        Ok(())
    }

    fn matching(
        &self,
        stage: QueryStage,
        filter: Option<&Predicate>,
    ) -> Result<Vec<&R>, QueryExecutionError> {
        let Some(filter) = filter else {
            return Ok(self.rows.iter().collect());
        };
        Self::check_fields(stage, filter.conditions().iter().map(|c| c.field.as_str()))?;
        Ok(self
            .rows
            .iter()
            .filter(|row| filter.evaluate(&|name: &str| row.field(name)))
            .collect())
    }
}

/// Order two rows by `sort`, most significant term first
pub fn compare_records<R: Record>(a: &R, b: &R, sort: &[OrderSpec]) -> Ordering {
    sort.iter()
        .map(|spec| compare_values(a.field(&spec.field), b.field(&spec.field), spec))
        .find(|o| o.is_ne())
        .unwrap_or(Ordering::Equal)
}

fn compare_values(a: Option<FilterValue>, b: Option<FilterValue>, spec: &OrderSpec) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());

    let directed = |o: Ordering| match spec.direction {
        OrderDirection::Asc => o,
        OrderDirection::Desc => o.reverse(),
    };
    // Ordering of a NULL against a value
    let null_vs_value = match spec.nulls {
        NullOrdering::NullsFirst => Ordering::Less,
        NullOrdering::NullsLast => Ordering::Greater,
        NullOrdering::Default => directed(Ordering::Greater),
    };

    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => null_vs_value,
        (Some(_), None) => null_vs_value.reverse(),
        (Some(a), Some(b)) => directed(a.compare(&b).unwrap_or(Ordering::Equal)),
    }
}

impl<R: Record> QueryExecutor for MemoryExecutor<R> {
    type Row = R;

    async fn fetch_rows(
        &self,
        filter: Option<&Predicate>,
        sort: &[OrderSpec],
        offset: u64,
        limit: u64,
    ) -> Result<Vec<R>, QueryExecutionError> {
        Self::check_fields(QueryStage::Fetch, sort.iter().map(|s| s.field.as_str()))?;
        let mut rows = self.matching(QueryStage::Fetch, filter)?;
        // stable, so ties keep insertion order
        rows.sort_by(|a, b| compare_records(*a, *b, sort));

        let offset = usize::try_from(offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(rows.into_iter().skip(offset).take(limit).cloned().collect())
    }

    async fn count_rows(&self, filter: Option<&Predicate>) -> Result<u64, QueryExecutionError> {
        Ok(self.matching(QueryStage::Count, filter)?.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{compose, goe, loe, text_eq, FilterCondition};

    #[derive(Debug, Clone, PartialEq)]
    struct City {
        name: &'static str,
        population: Option<i64>,
    }

    impl Record for City {
        const FIELDS: &'static [&'static str] = &["city.name", "city.population"];

        fn field(&self, name: &str) -> Option<FilterValue> {
            match name {
                "city.name" => Some(self.name.into()),
                "city.population" => self.population.map(Into::into),
                _ => None,
            }
        }
    }

    fn cities() -> MemoryExecutor<City> {
        MemoryExecutor::new(vec![
            City { name: "Oslo", population: Some(700) },
            City { name: "Bergen", population: Some(285) },
            City { name: "Ghost", population: None },
            City { name: "Tromso", population: Some(77) },
            City { name: "Alta", population: Some(285) },
        ])
    }

    fn names(rows: &[City]) -> Vec<&'static str> {
        rows.iter().map(|c| c.name).collect()
    }

    #[tokio::test]
    async fn test_no_filter_selects_all_in_insertion_order() {
        let exec = cities();
        let rows = exec.fetch_rows(None, &[], 0, 10).await.unwrap();
        assert_eq!(names(&rows), vec!["Oslo", "Bergen", "Ghost", "Tromso", "Alta"]);
        assert_eq!(exec.count_rows(None).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_filter_applies_to_fetch_and_count() {
        let exec = cities();
        let filter = compose([goe("city.population", Some(100)), loe("city.population", Some(300))]);

        let rows = exec.fetch_rows(filter.as_ref(), &[], 0, 10).await.unwrap();
        assert_eq!(names(&rows), vec!["Bergen", "Alta"]);
        assert_eq!(exec.count_rows(filter.as_ref()).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_null_never_matches_comparison() {
        let exec = cities();
        let filter = compose([loe("city.population", Some(1_000_000))]);
        assert_eq!(exec.count_rows(filter.as_ref()).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_sort_with_stable_ties() {
        let exec = cities();
        let sort = [OrderSpec::desc("city.population").nulls_last()];
        let rows = exec.fetch_rows(None, &sort, 0, 10).await.unwrap();
        // Bergen and Alta tie on 285 and keep insertion order
        assert_eq!(names(&rows), vec!["Oslo", "Bergen", "Alta", "Tromso", "Ghost"]);
    }

    #[tokio::test]
    async fn test_secondary_sort_breaks_ties() {
        let exec = cities();
        let sort = [OrderSpec::desc("city.population"), OrderSpec::asc("city.name")];
        let rows = exec.fetch_rows(None, &sort, 0, 10).await.unwrap();
        // default null ordering puts NULL first when descending
        assert_eq!(names(&rows), vec!["Ghost", "Oslo", "Alta", "Bergen", "Tromso"]);
    }

    #[tokio::test]
    async fn test_nulls_first_ascending() {
        let exec = cities();
        let sort = [OrderSpec::asc("city.population").nulls_first()];
        let rows = exec.fetch_rows(None, &sort, 0, 2).await.unwrap();
        assert_eq!(names(&rows), vec!["Ghost", "Tromso"]);

        let sort = [OrderSpec::asc("city.population")];
        let rows = exec.fetch_rows(None, &sort, 4, 2).await.unwrap();
        assert_eq!(names(&rows), vec!["Ghost"]);
    }

    #[tokio::test]
    async fn test_offset_past_end_is_empty() {
        let rows = cities().fetch_rows(None, &[], 50, 10).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_fields_are_rejected() {
        let exec = cities();

        let sort = [OrderSpec::asc("city.mayor")];
        let err = exec.fetch_rows(None, &sort, 0, 1).await.unwrap_err();
        assert_eq!(err.stage, QueryStage::Fetch);
        assert_eq!(err.kind, crate::repository::QueryErrorKind::InvalidQuery);

        let filter = compose([text_eq("city.mayor", Some("x"))]);
        let err = exec.count_rows(filter.as_ref()).await.unwrap_err();
        assert_eq!(err.stage, QueryStage::Count);
    }

    #[tokio::test]
    async fn test_like_filter() {
        let exec = cities();
        let filter = Predicate::from(FilterCondition::like("city.name", "%o"));
        let rows = exec.fetch_rows(Some(&filter), &[], 0, 10).await.unwrap();
        assert_eq!(names(&rows), vec!["Oslo", "Tromso"]);
    }

    #[test]
    fn test_clone_shares_snapshot() {
        let exec = cities();
        let copy = exec.clone();
        assert!(std::ptr::eq(exec.rows().as_ptr(), copy.rows().as_ptr()));
    }
}
