//! Conditional predicate composition
//!
//! Search screens hand over a bag of optional criteria. Each present criterion
//! becomes one atomic [`Predicate`]; absent ones contribute nothing at all. The
//! present predicates are AND-ed together left to right in the order the
//! criteria are declared, so the same input always yields the same filter.
//!
//! When no criterion is present the result is `None`, meaning "no filter".
//!
//! # Example
//!
//! ```rust
//! use rowsift::repository::{compose, goe, loe, text_eq};
//!
//! let filter = compose([
//!     text_eq("member.username", Some("  ")), // blank text counts as absent
//!     goe("member.age", Some(20)),
//!     loe("member.age", None::<i32>),
//! ]);
//! assert_eq!(filter.unwrap().to_string(), "member.age >= 20");
//!
//! assert!(compose([text_eq("team.name", None), goe("member.age", None::<i32>)]).is_none());
//! ```

use super::predicate::{FilterCondition, FilterValue, Predicate};

/// Fold optional predicates into one conjunction, skipping the absent ones
pub fn compose<I>(criteria: I) -> Option<Predicate>
where
    I: IntoIterator<Item = Option<Predicate>>,
{
    criteria.into_iter().flatten().reduce(Predicate::and)
}

/// Whether a text criterion carries anything other than whitespace
#[must_use]
pub fn has_text(value: Option<&str>) -> bool {
    value.is_some_and(|s| !s.trim().is_empty())
}

/// Equality on a text field; blank or missing text yields no predicate
///
/// The value is compared as given, surrounding whitespace included.
pub fn text_eq(field: &str, value: Option<&str>) -> Option<Predicate> {
    value
        .filter(|s| has_text(Some(*s)))
        .map(|s| FilterCondition::eq(field, s).into())
}

/// Equality on a non-text field
pub fn value_eq<V: Into<FilterValue>>(field: &str, value: Option<V>) -> Option<Predicate> {
    value.map(|v| FilterCondition::eq(field, v).into())
}

/// Lower bound, inclusive (`field >= value`)
pub fn goe<V: Into<FilterValue>>(field: &str, value: Option<V>) -> Option<Predicate> {
    value.map(|v| FilterCondition::gte(field, v).into())
}

/// Upper bound, inclusive (`field <= value`)
pub fn loe<V: Into<FilterValue>>(field: &str, value: Option<V>) -> Option<Predicate> {
    value.map(|v| FilterCondition::lte(field, v).into())
}

/// A set of independently optional search criteria
///
/// Implementors list their criteria in a fixed order; [`compose`](Self::compose)
/// takes care of eliding the absent ones and conjoining the rest.
///
/// # Example
///
/// ```rust
/// use rowsift::repository::{goe, text_eq, Predicate, SearchCondition};
///
/// struct ProductSearch {
///     name: Option<String>,
///     min_price: Option<i64>,
/// }
///
/// impl SearchCondition for ProductSearch {
///     fn criteria(&self) -> Vec<Option<Predicate>> {
///         vec![
///             text_eq("product.name", self.name.as_deref()),
///             goe("product.price", self.min_price),
///         ]
///     }
/// }
///
/// let search = ProductSearch { name: None, min_price: Some(100) };
/// assert_eq!(search.compose().unwrap().to_string(), "product.price >= 100");
/// ```
pub trait SearchCondition {
    /// The optional atomic predicates, in declared order
    fn criteria(&self) -> Vec<Option<Predicate>>;

    /// The combined filter, or `None` when no criterion is present
    fn compose(&self) -> Option<Predicate> {
        compose(self.criteria())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_empty_is_no_filter() {
        assert!(compose(Vec::<Option<Predicate>>::new()).is_none());
        assert!(compose([None, None, None]).is_none());
    }

    #[test]
    fn test_compose_single_criterion_is_atomic() {
        let p = compose([None, goe("member.age", Some(10)), None]).unwrap();
        assert!(matches!(p, Predicate::Condition(_)));
        assert_eq!(p.to_string(), "member.age >= 10");
    }

    #[test]
    fn test_compose_keeps_declared_order() {
        let p = compose([
            text_eq("member.username", Some("member1")),
            None,
            goe("member.age", Some(10)),
            loe("member.age", Some(30)),
        ])
        .unwrap();

        assert_eq!(
            p.to_string(),
            "member.username = 'member1' AND member.age >= 10 AND member.age <= 30"
        );
        // left-associative: ((username AND goe) AND loe)
        match p {
            Predicate::And(left, right) => {
                assert_eq!(right.to_string(), "member.age <= 30");
                assert_eq!(left.len(), 2);
            }
            Predicate::Condition(_) => panic!("expected a conjunction"),
        }
    }

    #[test]
    fn test_has_text() {
        assert!(has_text(Some("a")));
        assert!(has_text(Some(" a ")));
        assert!(!has_text(Some("")));
        assert!(!has_text(Some(" \t\n")));
        assert!(!has_text(None));
    }

    #[test]
    fn test_text_eq_blank_is_absent() {
        assert!(text_eq("team.name", Some("")).is_none());
        assert!(text_eq("team.name", Some("   ")).is_none());
        assert!(text_eq("team.name", None).is_none());
        assert_eq!(
            text_eq("team.name", Some("teamA")).unwrap().to_string(),
            "team.name = 'teamA'"
        );
    }

    #[test]
    fn test_value_eq_and_bounds() {
        assert_eq!(
            value_eq("member.age", Some(10)).unwrap().to_string(),
            "member.age = 10"
        );
        assert!(value_eq("member.age", None::<i64>).is_none());
        assert!(goe("member.age", None::<i32>).is_none());
        assert!(loe("member.age", None::<i32>).is_none());
    }

    struct TwoFields {
        name: Option<String>,
        age: Option<i32>,
    }

    impl SearchCondition for TwoFields {
        fn criteria(&self) -> Vec<Option<Predicate>> {
            vec![
                text_eq("member.username", self.name.as_deref()),
                value_eq("member.age", self.age),
            ]
        }
    }

    #[test]
    fn test_search_condition_default_compose() {
        let both = TwoFields {
            name: Some("member1".to_string()),
            age: Some(10),
        };
        assert_eq!(
            both.compose().unwrap().to_string(),
            "member.username = 'member1' AND member.age = 10"
        );

        let neither = TwoFields {
            name: Some(" ".to_string()),
            age: None,
        };
        assert!(neither.compose().is_none());
    }

    #[test]
    fn test_compose_is_deterministic() {
        let condition = TwoFields {
            name: Some("member2".to_string()),
            age: Some(20),
        };
        assert_eq!(condition.compose(), condition.compose());
    }
}
