//! Filter predicates
//!
//! A [`Predicate`] is either a single [`FilterCondition`] over one entity
//! attribute, or the conjunction of two predicates. There is no
//! "match everything" predicate: the absence of a filter is spelled
//! `Option::<Predicate>::None` and every executor treats it as "select all rows".
//!
//! # Example
//!
//! ```rust
//! use rowsift::repository::{FilterCondition, Predicate};
//!
//! let filter = Predicate::from(FilterCondition::eq("member.username", "member1"))
//!     .and(FilterCondition::gte("member.age", 10).into());
//!
//! assert_eq!(filter.len(), 2);
//! assert_eq!(
//!     filter.to_string(),
//!     "member.username = 'member1' AND member.age >= 10"
//! );
//! ```

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Comparison operators for filter conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOperator {
    /// Equal to (=)
    Equal,
    /// Not equal to (!=)
    NotEqual,
    /// Greater than (>)
    GreaterThan,
    /// Greater than or equal to (>=)
    GreaterThanOrEqual,
    /// Less than (<)
    LessThan,
    /// Less than or equal to (<=)
    LessThanOrEqual,
    /// Pattern matching (LIKE, `%` and `_` wildcards)
    Like,
    /// Value is in a list (IN)
    In,
    /// Value is null (IS NULL)
    IsNull,
    /// Value is not null (IS NOT NULL)
    IsNotNull,
}

impl FilterOperator {
    /// SQL spelling of the operator
    #[must_use]
    pub const fn as_sql(&self) -> &'static str {
        match self {
            Self::Equal => "=",
            Self::NotEqual => "!=",
            Self::GreaterThan => ">",
            Self::GreaterThanOrEqual => ">=",
            Self::LessThan => "<",
            Self::LessThanOrEqual => "<=",
            Self::Like => "LIKE",
            Self::In => "IN",
            Self::IsNull => "IS NULL",
            Self::IsNotNull => "IS NOT NULL",
        }
    }

    /// Whether the operator takes no right-hand operand
    #[must_use]
    pub const fn is_unary(&self) -> bool {
        matches!(self, Self::IsNull | Self::IsNotNull)
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// A value that can appear in a filter condition or in a row
///
/// Serialized untagged, so JSON rows map naturally: `"a"` is a string, `1` an
/// integer, `1.5` a float, `null` is [`FilterValue::Null`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// Null value
    Null,
    /// Boolean value
    Boolean(bool),
    /// 64-bit integer value
    Integer(i64),
    /// 64-bit floating point value
    Float(f64),
    /// String value
    String(String),
    /// List of integer values (for IN operator)
    IntegerList(Vec<i64>),
    /// List of string values (for IN operator)
    StringList(Vec<String>),
}

impl FilterValue {
    /// Whether the value is SQL NULL
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Compare two scalar values the way a SQL engine would
    ///
    /// Integers and floats compare numerically with each other. Returns `None`
    /// when either side is NULL, a list, or the types are incomparable.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Integer(a), Self::Integer(b)) => Some(a.cmp(b)),
            (Self::Float(a), Self::Float(b)) => a.partial_cmp(b),
            (Self::Integer(a), Self::Float(b)) => (*a as f64).partial_cmp(b),
            (Self::Float(a), Self::Integer(b)) => a.partial_cmp(&(*b as f64)),
            (Self::String(a), Self::String(b)) => Some(a.cmp(b)),
            (Self::Boolean(a), Self::Boolean(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Whether `self` appears in a list value
    #[must_use]
    pub fn is_in(&self, list: &Self) -> bool {
        match (self, list) {
            (Self::Integer(v), Self::IntegerList(items)) => items.contains(v),
            (Self::String(v), Self::StringList(items)) => items.contains(v),
            _ => false,
        }
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Integer(n) => write!(f, "{}", n),
            Self::Float(n) => write!(f, "{}", n),
            Self::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Self::IntegerList(items) => {
                let rendered: Vec<String> = items.iter().map(ToString::to_string).collect();
                write!(f, "({})", rendered.join(", "))
            }
            Self::StringList(items) => {
                let rendered: Vec<String> = items
                    .iter()
                    .map(|s| format!("'{}'", s.replace('\'', "''")))
                    .collect();
                write!(f, "({})", rendered.join(", "))
            }
        }
    }
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for FilterValue {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<i32> for FilterValue {
    fn from(n: i32) -> Self {
        Self::Integer(i64::from(n))
    }
}

impl From<f64> for FilterValue {
    fn from(n: f64) -> Self {
        Self::Float(n)
    }
}

impl From<bool> for FilterValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<Vec<String>> for FilterValue {
    fn from(list: Vec<String>) -> Self {
        Self::StringList(list)
    }
}

impl From<Vec<i64>> for FilterValue {
    fn from(list: Vec<i64>) -> Self {
        Self::IntegerList(list)
    }
}

impl<T: Into<FilterValue>> From<Option<T>> for FilterValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// A single atomic condition over one attribute
///
/// Field names are qualified by the entity alias they belong to
/// (`member.age`, `team.name`), which is how executors resolve joined columns.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCondition {
    /// The field name to filter on
    pub field: String,
    /// The comparison operator
    pub operator: FilterOperator,
    /// The value to compare against
    pub value: FilterValue,
}

impl FilterCondition {
    /// Create a new filter condition
    pub fn new(field: impl Into<String>, operator: FilterOperator, value: FilterValue) -> Self {
        Self {
            field: field.into(),
            operator,
            value,
        }
    }

    /// `field = value`
    pub fn eq(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOperator::Equal, value.into())
    }

    /// `field != value`
    pub fn ne(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOperator::NotEqual, value.into())
    }

    /// `field > value`
    pub fn gt(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOperator::GreaterThan, value.into())
    }

    /// `field >= value`
    pub fn gte(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOperator::GreaterThanOrEqual, value.into())
    }

    /// `field < value`
    pub fn lt(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOperator::LessThan, value.into())
    }

    /// `field <= value`
    pub fn lte(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOperator::LessThanOrEqual, value.into())
    }

    /// `field LIKE pattern`
    pub fn like(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::new(field, FilterOperator::Like, FilterValue::String(pattern.into()))
    }

    /// `field IN (values...)` for strings
    pub fn in_strings(field: impl Into<String>, values: Vec<String>) -> Self {
        Self::new(field, FilterOperator::In, FilterValue::StringList(values))
    }

    /// `field IN (values...)` for integers
    pub fn in_integers(field: impl Into<String>, values: Vec<i64>) -> Self {
        Self::new(field, FilterOperator::In, FilterValue::IntegerList(values))
    }

    /// `field IS NULL`
    pub fn is_null(field: impl Into<String>) -> Self {
        Self::new(field, FilterOperator::IsNull, FilterValue::Null)
    }

    /// `field IS NOT NULL`
    pub fn is_not_null(field: impl Into<String>) -> Self {
        Self::new(field, FilterOperator::IsNotNull, FilterValue::Null)
    }

    /// Evaluate the condition against the value a row holds for [`Self::field`]
    ///
    /// Follows SQL three-valued logic collapsed to a boolean: any comparison
    /// against NULL (other than `IS NULL`/`IS NOT NULL`) does not match.
    #[must_use]
    pub fn matches(&self, actual: &FilterValue) -> bool {
        match self.operator {
            FilterOperator::IsNull => actual.is_null(),
            FilterOperator::IsNotNull => !actual.is_null(),
            _ if actual.is_null() => false,
            FilterOperator::Equal => actual.compare(&self.value) == Some(Ordering::Equal),
            FilterOperator::NotEqual => matches!(
                actual.compare(&self.value),
                Some(Ordering::Less | Ordering::Greater)
            ),
            FilterOperator::GreaterThan => actual.compare(&self.value) == Some(Ordering::Greater),
            FilterOperator::GreaterThanOrEqual => matches!(
                actual.compare(&self.value),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            FilterOperator::LessThan => actual.compare(&self.value) == Some(Ordering::Less),
            FilterOperator::LessThanOrEqual => matches!(
                actual.compare(&self.value),
                Some(Ordering::Less | Ordering::Equal)
            ),
            FilterOperator::Like => match (actual, &self.value) {
                (FilterValue::String(text), FilterValue::String(pattern)) => {
                    like_match(text, pattern)
                }
                _ => false,
            },
            FilterOperator::In => actual.is_in(&self.value),
        }
    }
}

impl fmt::Display for FilterCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.operator.is_unary() {
            write!(f, "{} {}", self.field, self.operator)
        } else {
            write!(f, "{} {} {}", self.field, self.operator, self.value)
        }
    }
}

/// SQL LIKE matching: `%` matches any run of characters, `_` exactly one
fn like_match(text: &str, pattern: &str) -> bool {
    let text: Vec<char> = text.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();

    // dp[j]: pattern[..i] matches text[..j]
    let mut dp = vec![false; text.len() + 1];
    dp[0] = true;
    for p in &pattern {
        let mut next = vec![false; text.len() + 1];
        match p {
            '%' => {
                let mut seen = false;
                for j in 0..=text.len() {
                    seen |= dp[j];
                    next[j] = seen;
                }
            }
            '_' => {
                for j in 1..=text.len() {
                    next[j] = dp[j - 1];
                }
            }
            c => {
                for j in 1..=text.len() {
                    next[j] = dp[j - 1] && text[j - 1] == *c;
                }
            }
        }
        dp = next;
    }
    dp[text.len()]
}

/// A combinable boolean expression for a query's filter clause
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// A single atomic condition
    Condition(FilterCondition),
    /// Conjunction of two predicates, left operand first
    And(Box<Predicate>, Box<Predicate>),
}

impl Predicate {
    /// Conjoin `other` to the right of `self`
    #[must_use]
    pub fn and(self, other: Predicate) -> Self {
        Self::And(Box::new(self), Box::new(other))
    }

    /// The atomic conditions of this predicate, left to right
    pub fn conditions(&self) -> Vec<&FilterCondition> {
        let mut out = Vec::new();
        self.collect_conditions(&mut out);
        out
    }

    fn collect_conditions<'a>(&'a self, out: &mut Vec<&'a FilterCondition>) {
        match self {
            Self::Condition(c) => out.push(c),
            Self::And(left, right) => {
                left.collect_conditions(out);
                right.collect_conditions(out);
            }
        }
    }

    /// Number of atomic conditions
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Condition(_) => 1,
            Self::And(left, right) => left.len() + right.len(),
        }
    }

    /// Always false: a predicate holds at least one condition
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Evaluate the predicate, resolving fields through `lookup`
    ///
    /// A field the lookup cannot resolve is treated as NULL.
    pub fn evaluate<F>(&self, lookup: &F) -> bool
    where
        F: Fn(&str) -> Option<FilterValue>,
    {
        match self {
            Self::Condition(c) => {
                let actual = lookup(&c.field).unwrap_or(FilterValue::Null);
                c.matches(&actual)
            }
            Self::And(left, right) => left.evaluate(lookup) && right.evaluate(lookup),
        }
    }
}

impl From<FilterCondition> for Predicate {
    fn from(condition: FilterCondition) -> Self {
        Self::Condition(condition)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Condition(c) => write!(f, "{}", c),
            Self::And(left, right) => write!(f, "{} AND {}", left, right),
        }
    }
}
