//! Page requests, orderings and result pages
//!
//! # Example
//!
//! ```rust
//! use rowsift::repository::{OrderSpec, PageRequest};
//!
//! // Skip 40 rows, take 20, newest first, unnamed members last
//! let request = PageRequest::new(40, 20)
//!     .unwrap()
//!     .with_sort(vec![
//!         OrderSpec::desc("member.age"),
//!         OrderSpec::asc("member.username").nulls_last(),
//!     ]);
//!
//! assert_eq!(request.offset(), 40);
//! assert_eq!(request.limit(), 20);
//! assert_eq!(request.sort().len(), 2);
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::{PageError, PageResult};

/// Page size used when the caller does not pick one
pub const DEFAULT_LIMIT: u64 = 20;

/// Direction for ordering results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderDirection {
    /// Sort in ascending order (A-Z, 0-9)
    #[default]
    Asc,
    /// Sort in descending order (Z-A, 9-0)
    Desc,
}

impl OrderDirection {
    /// SQL keyword for the direction
    #[must_use]
    pub const fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asc => write!(f, "asc"),
            Self::Desc => write!(f, "desc"),
        }
    }
}

/// Where NULL values land in an ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NullOrdering {
    /// Whatever the store does by default
    ///
    /// In-memory ordering treats NULL as larger than any value, which matches
    /// PostgreSQL: last when ascending, first when descending.
    #[default]
    Default,
    /// NULLs before all values
    NullsFirst,
    /// NULLs after all values
    NullsLast,
}

impl NullOrdering {
    /// SQL clause for the null ordering, empty for the store default
    #[must_use]
    pub const fn as_sql(&self) -> &'static str {
        match self {
            Self::Default => "",
            Self::NullsFirst => " NULLS FIRST",
            Self::NullsLast => " NULLS LAST",
        }
    }
}

/// One ordering term: field, direction and null placement
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderSpec {
    /// Qualified field name, e.g. `member.username`
    pub field: String,
    /// Sort direction
    #[serde(default)]
    pub direction: OrderDirection,
    /// Null placement
    #[serde(default)]
    pub nulls: NullOrdering,
}

impl OrderSpec {
    /// Ascending order on `field`
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: OrderDirection::Asc,
            nulls: NullOrdering::Default,
        }
    }

    /// Descending order on `field`
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: OrderDirection::Desc,
            nulls: NullOrdering::Default,
        }
    }

    /// Place NULLs first
    #[must_use]
    pub fn nulls_first(mut self) -> Self {
        self.nulls = NullOrdering::NullsFirst;
        self
    }

    /// Place NULLs last
    #[must_use]
    pub fn nulls_last(mut self) -> Self {
        self.nulls = NullOrdering::NullsLast;
        self
    }
}

impl fmt::Display for OrderSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.direction)?;
        match self.nulls {
            NullOrdering::Default => Ok(()),
            NullOrdering::NullsFirst => write!(f, " nulls first"),
            NullOrdering::NullsLast => write!(f, " nulls last"),
        }
    }
}

/// Parses `field[:asc|desc[:nulls_first|nulls_last]]`
///
/// ```rust
/// use rowsift::repository::{NullOrdering, OrderDirection, OrderSpec};
///
/// let spec: OrderSpec = "member.username:asc:nulls_last".parse().unwrap();
/// assert_eq!(spec.direction, OrderDirection::Asc);
/// assert_eq!(spec.nulls, NullOrdering::NullsLast);
/// ```
impl FromStr for OrderSpec {
    type Err = PageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(':').map(str::trim);
        let field = parts.next().unwrap_or_default();
        if field.is_empty() {
            return Err(PageError::invalid(format!("empty sort field in '{}'", s)));
        }

        let direction = match parts.next().map(str::to_ascii_lowercase).as_deref() {
            None | Some("") | Some("asc") => OrderDirection::Asc,
            Some("desc") => OrderDirection::Desc,
            Some(other) => {
                return Err(PageError::invalid(format!(
                    "unknown sort direction '{}'",
                    other
                )))
            }
        };

        let nulls = match parts
            .next()
            .map(|n| n.to_ascii_lowercase().replace('-', "_"))
            .as_deref()
        {
            None | Some("") => NullOrdering::Default,
            Some("nulls_first") | Some("first") => NullOrdering::NullsFirst,
            Some("nulls_last") | Some("last") => NullOrdering::NullsLast,
            Some(other) => {
                return Err(PageError::invalid(format!(
                    "unknown null ordering '{}'",
                    other
                )))
            }
        };

        if parts.next().is_some() {
            return Err(PageError::invalid(format!("too many sort segments in '{}'", s)));
        }

        Ok(Self {
            field: field.to_string(),
            direction,
            nulls,
        })
    }
}

/// Parse a comma-separated ordering such as `member.age:desc,member.username:asc:nulls_last`
///
/// Blank input yields an empty ordering.
pub fn parse_sort(s: &str) -> PageResult<Vec<OrderSpec>> {
    s.split(',')
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .map(OrderSpec::from_str)
        .collect()
}

/// Unchecked wire form of a [`PageRequest`]
#[derive(Deserialize)]
struct RawPageRequest {
    #[serde(default)]
    offset: i64,
    #[serde(default = "default_raw_limit")]
    limit: i64,
    #[serde(default)]
    sort: Vec<OrderSpec>,
}

fn default_raw_limit() -> i64 {
    DEFAULT_LIMIT as i64
}

impl TryFrom<RawPageRequest> for PageRequest {
    type Error = PageError;

    fn try_from(raw: RawPageRequest) -> Result<Self, Self::Error> {
        Ok(Self::from_signed(raw.offset, raw.limit)?.with_sort(raw.sort))
    }
}

/// A validated request for one page of rows
///
/// `limit` is always positive and `offset + limit` never overflows; the
/// constructors and deserialization reject anything else with
/// [`PageError::InvalidPageRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPageRequest")]
pub struct PageRequest {
    offset: u64,
    limit: u64,
    sort: Vec<OrderSpec>,
}

impl PageRequest {
    /// Skip `offset` rows and take at most `limit`
    pub fn new(offset: u64, limit: u64) -> PageResult<Self> {
        if limit == 0 {
            return Err(PageError::invalid("limit must be positive"));
        }
        if offset.checked_add(limit).is_none() {
            return Err(PageError::invalid(format!(
                "offset {} plus limit {} overflows",
                offset, limit
            )));
        }
        Ok(Self {
            offset,
            limit,
            sort: Vec::new(),
        })
    }

    /// The first `limit` rows
    pub fn first_page(limit: u64) -> PageResult<Self> {
        Self::new(0, limit)
    }

    /// A 1-indexed page of `page_size` rows; page 0 is treated as page 1
    ///
    /// ```rust
    /// use rowsift::repository::PageRequest;
    ///
    /// let third = PageRequest::page(3, 20).unwrap();
    /// assert_eq!(third.offset(), 40);
    /// ```
    pub fn page(page_number: u64, page_size: u64) -> PageResult<Self> {
        let offset = page_number
            .saturating_sub(1)
            .checked_mul(page_size)
            .ok_or_else(|| PageError::invalid(format!("page {} is out of range", page_number)))?;
        Self::new(offset, page_size)
    }

    /// Validate raw signed input such as query-string parameters
    ///
    /// ```rust
    /// use rowsift::repository::PageRequest;
    ///
    /// assert!(PageRequest::from_signed(-1, 10).is_err());
    /// assert!(PageRequest::from_signed(0, 0).is_err());
    /// assert!(PageRequest::from_signed(0, -5).is_err());
    /// assert!(PageRequest::from_signed(10, 5).is_ok());
    /// ```
    pub fn from_signed(offset: i64, limit: i64) -> PageResult<Self> {
        let offset = u64::try_from(offset)
            .map_err(|_| PageError::invalid(format!("offset must not be negative, got {}", offset)))?;
        let limit = u64::try_from(limit)
            .ok()
            .filter(|l| *l > 0)
            .ok_or_else(|| PageError::invalid(format!("limit must be positive, got {}", limit)))?;
        Self::new(offset, limit)
    }

    /// Replace the ordering
    #[must_use]
    pub fn with_sort(mut self, sort: Vec<OrderSpec>) -> Self {
        self.sort = sort;
        self
    }

    /// Append one ordering term
    #[must_use]
    pub fn sorted_by(mut self, spec: OrderSpec) -> Self {
        self.sort.push(spec);
        self
    }

    /// Number of rows to skip
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Maximum number of rows to return
    #[must_use]
    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Ordering terms, most significant first
    #[must_use]
    pub fn sort(&self) -> &[OrderSpec] {
        &self.sort
    }

    /// The request for the page that follows this one, same size and ordering
    ///
    /// Fails with [`PageError::InvalidPageRequest`] once the following page
    /// would run past `u64::MAX`.
    pub fn next(&self) -> PageResult<Self> {
        let offset = self.offset.checked_add(self.limit).ok_or_else(|| {
            PageError::invalid(format!("no page follows offset {}", self.offset))
        })?;
        Ok(Self::new(offset, self.limit)?.with_sort(self.sort.clone()))
    }

    /// Re-check the invariants the constructors establish
    pub fn validate(&self) -> PageResult<()> {
        Self::new(self.offset, self.limit).map(|_| ())
    }

    /// Build a request without checking it
    #[cfg(test)]
    pub(crate) fn unchecked(offset: u64, limit: u64) -> Self {
        Self {
            offset,
            limit,
            sort: Vec::new(),
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_LIMIT,
            sort: Vec::new(),
        }
    }
}

/// One page of results plus the metadata needed to navigate
///
/// `total` is exact and never smaller than `offset + content.len()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    content: Vec<T>,
    offset: u64,
    limit: u64,
    total: u64,
}

impl<T> Page<T> {
    pub(crate) fn new(content: Vec<T>, request: &PageRequest, total: u64) -> Self {
        debug_assert!(content.len() as u64 <= request.limit());
        debug_assert!(total >= request.offset() + content.len() as u64);
        Self {
            content,
            offset: request.offset(),
            limit: request.limit(),
            total,
        }
    }

    /// An empty page at the position of `request`
    ///
    /// The total is inferred the same way a short page infers it: nothing
    /// exists at or beyond `offset`, so `total == offset`.
    #[must_use]
    pub fn empty(request: &PageRequest) -> Self {
        Self::new(Vec::new(), request, request.offset())
    }

    /// The rows of this page, in the requested order
    #[must_use]
    pub fn content(&self) -> &[T] {
        &self.content
    }

    /// Take ownership of the rows
    #[must_use]
    pub fn into_content(self) -> Vec<T> {
        self.content
    }

    /// Rows skipped before this page
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Requested page capacity
    #[must_use]
    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Total number of matching rows across all pages
    #[must_use]
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Number of rows on this page
    #[must_use]
    pub fn len(&self) -> usize {
        self.content.len()
    }

    /// Whether this page holds no rows
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Total number of pages of this size, rounding up
    #[must_use]
    pub fn total_pages(&self) -> u64 {
        self.total.div_ceil(self.limit)
    }

    /// 1-indexed page number, assuming page-aligned offsets
    #[must_use]
    pub fn page_number(&self) -> u64 {
        self.offset / self.limit + 1
    }

    /// Whether rows exist beyond this page
    #[must_use]
    pub fn has_next(&self) -> bool {
        self.offset + (self.content.len() as u64) < self.total
    }

    /// Whether rows exist before this page
    #[must_use]
    pub fn has_previous(&self) -> bool {
        self.offset > 0
    }

    /// Whether this is the first page
    #[must_use]
    pub fn is_first(&self) -> bool {
        !self.has_previous()
    }

    /// Whether this is the last page
    #[must_use]
    pub fn is_last(&self) -> bool {
        !self.has_next()
    }

    /// Map each row to a new type, keeping the page metadata
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            content: self.content.into_iter().map(f).collect(),
            offset: self.offset,
            limit: self.limit,
            total: self.total,
        }
    }

    /// Navigation metadata for responses
    #[must_use]
    pub fn meta(&self) -> PaginationMeta {
        PaginationMeta {
            offset: self.offset,
            limit: self.limit,
            total: self.total,
            page: self.page_number(),
            total_pages: self.total_pages(),
            has_next: self.has_next(),
            has_prev: self.has_previous(),
        }
    }
}

/// Pagination metadata detached from the rows, for response envelopes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationMeta {
    /// Rows skipped before the page
    pub offset: u64,
    /// Page capacity
    pub limit: u64,
    /// Total number of matching rows
    pub total: u64,
    /// Current page number (1-indexed)
    pub page: u64,
    /// Total number of pages
    pub total_pages: u64,
    /// Whether there is a next page
    pub has_next: bool,
    /// Whether there is a previous page
    pub has_prev: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_direction_display_and_sql() {
        assert_eq!(OrderDirection::Asc.to_string(), "asc");
        assert_eq!(OrderDirection::Desc.as_sql(), "DESC");
        assert_eq!(OrderDirection::default(), OrderDirection::Asc);
    }

    #[test]
    fn test_order_spec_builders() {
        let spec = OrderSpec::asc("member.username").nulls_last();
        assert_eq!(spec.direction, OrderDirection::Asc);
        assert_eq!(spec.nulls, NullOrdering::NullsLast);
        assert_eq!(spec.to_string(), "member.username asc nulls last");
        assert_eq!(OrderSpec::desc("member.age").to_string(), "member.age desc");
    }

    #[test]
    fn test_order_spec_parse() {
        let spec: OrderSpec = "member.age".parse().unwrap();
        assert_eq!(spec, OrderSpec::asc("member.age"));

        let spec: OrderSpec = "member.username:DESC:nulls-first".parse().unwrap();
        assert_eq!(spec, OrderSpec::desc("member.username").nulls_first());

        assert!("".parse::<OrderSpec>().is_err());
        assert!("member.age:sideways".parse::<OrderSpec>().is_err());
        assert!("member.age:asc:middle".parse::<OrderSpec>().is_err());
        assert!("member.age:asc:last:extra".parse::<OrderSpec>().is_err());
    }

    #[test]
    fn test_parse_sort_list() {
        let sort = parse_sort("member.age:desc, member.username:asc:nulls_last").unwrap();
        assert_eq!(
            sort,
            vec![
                OrderSpec::desc("member.age"),
                OrderSpec::asc("member.username").nulls_last(),
            ]
        );
        assert!(parse_sort("  ").unwrap().is_empty());
        assert!(parse_sort("member.age:up").is_err());
    }

    #[test]
    fn test_page_request_rejects_zero_limit() {
        let err = PageRequest::new(0, 0).unwrap_err();
        assert!(matches!(err, PageError::InvalidPageRequest(_)));
    }

    #[test]
    fn test_page_request_rejects_overflow() {
        assert!(PageRequest::new(u64::MAX, 1).is_err());
        assert!(PageRequest::page(u64::MAX, 20).is_err());
    }

    #[test]
    fn test_page_request_page_numbers() {
        assert_eq!(PageRequest::page(1, 20).unwrap().offset(), 0);
        assert_eq!(PageRequest::page(0, 20).unwrap().offset(), 0);
        assert_eq!(PageRequest::page(4, 25).unwrap().offset(), 75);
    }

    #[test]
    fn test_page_request_from_signed() {
        let req = PageRequest::from_signed(3, 2).unwrap();
        assert_eq!((req.offset(), req.limit()), (3, 2));
        assert!(PageRequest::from_signed(-1, 2).is_err());
        assert!(PageRequest::from_signed(0, 0).is_err());
        assert!(PageRequest::from_signed(0, -1).is_err());
    }

    #[test]
    fn test_page_request_next_keeps_sort() {
        let req = PageRequest::new(0, 10)
            .unwrap()
            .sorted_by(OrderSpec::desc("member.username"));
        let next = req.next().unwrap();
        assert_eq!(next.offset(), 10);
        assert_eq!(next.limit(), 10);
        assert_eq!(next.sort(), req.sort());
        assert!(next.validate().is_ok());
    }

    #[test]
    fn test_page_request_next_past_the_end() {
        let last = PageRequest::new(u64::MAX - 5, 5).unwrap();
        assert!(matches!(
            last.next(),
            Err(PageError::InvalidPageRequest(_))
        ));

        let req = PageRequest::new(u64::MAX - 10, 5).unwrap();
        let next = req.next().unwrap();
        assert_eq!(next.offset(), u64::MAX - 5);
        assert!(next.validate().is_ok());
    }

    #[test]
    fn test_page_request_default() {
        let req = PageRequest::default();
        assert_eq!(req.offset(), 0);
        assert_eq!(req.limit(), DEFAULT_LIMIT);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_page_request_deserialize_validates() {
        let req: PageRequest = serde_json::from_str(
            r#"{"offset": 4, "limit": 2, "sort": [{"field": "member.username", "direction": "desc"}]}"#,
        )
        .unwrap();
        assert_eq!(req.offset(), 4);
        assert_eq!(req.sort()[0], OrderSpec::desc("member.username"));

        let defaulted: PageRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(defaulted, PageRequest::default());

        assert!(serde_json::from_str::<PageRequest>(r#"{"offset": -1, "limit": 2}"#).is_err());
        assert!(serde_json::from_str::<PageRequest>(r#"{"limit": 0}"#).is_err());
    }

    fn page_of(len: usize, offset: u64, limit: u64, total: u64) -> Page<usize> {
        let req = PageRequest::new(offset, limit).unwrap();
        Page::new((0..len).collect(), &req, total)
    }

    #[test]
    fn test_page_navigation() {
        let first = page_of(2, 0, 2, 4);
        assert!(first.is_first());
        assert!(first.has_next());
        assert_eq!(first.page_number(), 1);
        assert_eq!(first.total_pages(), 2);

        let last = page_of(2, 2, 2, 4);
        assert!(last.has_previous());
        assert!(last.is_last());
        assert_eq!(last.page_number(), 2);

        let partial = page_of(1, 3, 2, 4);
        assert!(partial.is_last());
        assert_eq!(partial.total_pages(), 2);
    }

    #[test]
    fn test_page_map_keeps_metadata() {
        let page = page_of(3, 0, 5, 3).map(|n| n * 10);
        assert_eq!(page.content(), &[0, 10, 20]);
        assert_eq!(page.total(), 3);
        assert_eq!(page.limit(), 5);
    }

    #[test]
    fn test_page_empty() {
        let req = PageRequest::new(10, 5).unwrap();
        let page: Page<u8> = Page::empty(&req);
        assert!(page.is_empty());
        assert_eq!(page.total(), 10);
        assert!(!page.has_next());
    }

    #[test]
    fn test_page_meta() {
        let meta = page_of(2, 2, 2, 5).meta();
        assert_eq!(meta.page, 2);
        assert_eq!(meta.total_pages, 3);
        assert!(meta.has_next);
        assert!(meta.has_prev);
    }

    #[test]
    fn test_page_serializes_metadata() {
        let json = serde_json::to_value(page_of(1, 0, 10, 1)).unwrap();
        assert_eq!(json["total"], 1);
        assert_eq!(json["limit"], 10);
        assert_eq!(json["content"].as_array().unwrap().len(), 1);
    }
}
