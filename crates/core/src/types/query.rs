//! Typed list-query vocabulary: field values, filters, sorting and paging.
//!
//! Each collection describes its fields with an enum implementing [`Field`].
//! Filters are then `(field, operator, value)` triples whose value has already
//! been parsed into the field's [`FieldKind`], so malformed input is rejected
//! before any record is inspected.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Default number of items per page.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Upper bound on the page size a caller may request.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Errors produced while building a query from untyped input.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// The field name does not exist on the collection.
    #[error("unknown field '{0}'")]
    UnknownField(String),
    /// The comparison operator is not supported.
    #[error("unknown filter operator '{0}'")]
    UnknownOperator(String),
    /// The value could not be parsed as the field's kind.
    #[error("invalid {kind} value for field '{field}': {value}")]
    InvalidValue {
        /// Field being filtered.
        field: String,
        /// Expected kind of the field.
        kind: FieldKind,
        /// Raw value as supplied.
        value: String,
    },
    /// The sort order is neither `asc` nor `desc`.
    #[error("invalid sort order '{0}' (expected 'asc' or 'desc')")]
    InvalidSortOrder(String),
    /// The filter expression is not of the form `field:op:value`.
    #[error("malformed filter '{0}' (expected field:op:value)")]
    MalformedFilter(String),
}

/// The value type a field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Number,
    Bool,
    Timestamp,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Bool => "bool",
            Self::Timestamp => "timestamp",
        };
        f.write_str(name)
    }
}

/// A single field value extracted from a record or parsed from a filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// The field is absent on this record.
    Null,
    Text(String),
    Number(Decimal),
    Bool(bool),
    Timestamp(DateTime<Utc>),
}

impl FieldValue {
    /// Parse a raw string into a value of the given kind.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::InvalidValue` if the string does not parse as `kind`.
    pub fn parse(field: &str, kind: FieldKind, raw: &str) -> Result<Self, QueryError> {
        let invalid = || QueryError::InvalidValue {
            field: field.to_owned(),
            kind,
            value: raw.to_owned(),
        };

        match kind {
            FieldKind::Text => Ok(Self::Text(raw.to_owned())),
            FieldKind::Number => Decimal::from_str(raw.trim())
                .map(Self::Number)
                .map_err(|_| invalid()),
            FieldKind::Bool => match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" => Ok(Self::Bool(true)),
                "false" | "no" | "0" => Ok(Self::Bool(false)),
                _ => Err(invalid()),
            },
            FieldKind::Timestamp => DateTime::parse_from_rfc3339(raw.trim())
                .map(|dt| Self::Timestamp(dt.with_timezone(&Utc)))
                .map_err(|_| invalid()),
        }
    }

    /// Natural ordering between two values of the same kind.
    ///
    /// Values of different kinds are incomparable and return `None`.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Null, Self::Null) => Some(Ordering::Equal),
            (Self::Text(a), Self::Text(b)) => Some(a.cmp(b)),
            (Self::Number(a), Self::Number(b)) => Some(a.cmp(b)),
            (Self::Bool(a), Self::Bool(b)) => Some(a.cmp(b)),
            (Self::Timestamp(a), Self::Timestamp(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Text rendering used by the `contains` operator and free-text search.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Text(s) => s.clone(),
            Self::Number(n) => n.to_string(),
            Self::Bool(b) => b.to_string(),
            Self::Timestamp(t) => t.to_rfc3339(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<Option<&str>> for FieldValue {
    fn from(value: Option<&str>) -> Self {
        value.map_or(Self::Null, Self::from)
    }
}

impl From<Decimal> for FieldValue {
    fn from(value: Decimal) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value)
    }
}

impl From<Option<DateTime<Utc>>> for FieldValue {
    fn from(value: Option<DateTime<Utc>>) -> Self {
        value.map_or(Self::Null, Self::Timestamp)
    }
}

/// A queryable field of some collection.
///
/// Implemented by a plain enum per collection so filters and sorts are
/// checked against the collection's schema.
pub trait Field: Copy + Eq + fmt::Debug + Send + Sync + 'static {
    /// Every field of the collection.
    const ALL: &'static [Self];

    /// Fields consulted by free-text search.
    const SEARCHABLE: &'static [Self];

    /// Wire name of the field (as it appears in persisted JSON).
    fn name(self) -> &'static str;

    /// Kind of value the field holds.
    fn kind(self) -> FieldKind;

    /// Resolve a field by its wire name (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns `QueryError::UnknownField` if no field has this name.
    fn from_name(name: &str) -> Result<Self, QueryError> {
        let name = name.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|field| field.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| QueryError::UnknownField(name.to_owned()))
    }
}

/// Comparison operator of a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    /// Case-insensitive substring match on the text rendering.
    Contains,
}

impl FilterOp {
    /// Canonical symbol of the operator.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Contains => "contains",
        }
    }

    /// Apply the operator to a record's value (`lhs`) and the filter value (`rhs`).
    ///
    /// Ordering operators are false when the two values are incomparable.
    #[must_use]
    pub fn evaluate(self, lhs: &FieldValue, rhs: &FieldValue) -> bool {
        match self {
            Self::Eq => lhs == rhs,
            Self::Ne => lhs != rhs,
            Self::Gt => lhs.compare(rhs) == Some(Ordering::Greater),
            Self::Ge => matches!(
                lhs.compare(rhs),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Self::Lt => lhs.compare(rhs) == Some(Ordering::Less),
            Self::Le => matches!(lhs.compare(rhs), Some(Ordering::Less | Ordering::Equal)),
            Self::Contains => lhs
                .render()
                .to_lowercase()
                .contains(&rhs.render().to_lowercase()),
        }
    }
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for FilterOp {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "==" | "=" | "eq" => Ok(Self::Eq),
            "!=" | "ne" => Ok(Self::Ne),
            ">" | "gt" => Ok(Self::Gt),
            ">=" | "ge" | "gte" => Ok(Self::Ge),
            "<" | "lt" => Ok(Self::Lt),
            "<=" | "le" | "lte" => Ok(Self::Le),
            "contains" => Ok(Self::Contains),
            _ => Err(QueryError::UnknownOperator(s.to_owned())),
        }
    }
}

/// A typed filter over the fields `F` of one collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter<F> {
    pub field: F,
    pub op: FilterOp,
    pub value: FieldValue,
}

impl<F: Field> Filter<F> {
    /// Create a filter from already-typed parts.
    #[must_use]
    pub fn new(field: F, op: FilterOp, value: impl Into<FieldValue>) -> Self {
        Self {
            field,
            op,
            value: value.into(),
        }
    }

    /// Parse a `field:op:value` expression.
    ///
    /// Only the first two colons separate parts, so values such as RFC 3339
    /// timestamps may contain colons.
    ///
    /// # Errors
    ///
    /// Returns a `QueryError` if the expression is malformed, names an unknown
    /// field or operator, or the value does not parse as the field's kind.
    pub fn parse(expr: &str) -> Result<Self, QueryError> {
        let mut parts = expr.splitn(3, ':');
        let (Some(field), Some(op), Some(value)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(QueryError::MalformedFilter(expr.to_owned()));
        };

        let field = F::from_name(field)?;
        let op: FilterOp = op.parse()?;
        let value = if op == FilterOp::Contains {
            // Substring search always works on the text rendering.
            FieldValue::Text(value.to_owned())
        } else {
            FieldValue::parse(field.name(), field.kind(), value)?
        };

        Ok(Self { field, op, value })
    }

    /// Whether a record's value for this filter's field satisfies it.
    #[must_use]
    pub fn matches(&self, actual: &FieldValue) -> bool {
        self.op.evaluate(actual, &self.value)
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl FromStr for SortOrder {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(QueryError::InvalidSortOrder(s.to_owned())),
        }
    }
}

/// Sort by a single field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort<F> {
    pub field: F,
    pub order: SortOrder,
}

impl<F: Field> Sort<F> {
    #[must_use]
    pub const fn asc(field: F) -> Self {
        Self {
            field,
            order: SortOrder::Asc,
        }
    }

    #[must_use]
    pub const fn desc(field: F) -> Self {
        Self {
            field,
            order: SortOrder::Desc,
        }
    }

    /// Compare two values under this sort's direction.
    ///
    /// Absent values sort before present ones. Values of mismatched kinds are
    /// treated as equal so a stable sort keeps their original relative order.
    #[must_use]
    pub fn compare(&self, a: &FieldValue, b: &FieldValue) -> Ordering {
        let ordering = match (a, b) {
            (FieldValue::Null, FieldValue::Null) => Ordering::Equal,
            (FieldValue::Null, _) => Ordering::Less,
            (_, FieldValue::Null) => Ordering::Greater,
            _ => a.compare(b).unwrap_or(Ordering::Equal),
        };
        match self.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }
}

/// Offset pagination: a 1-based page number and a page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    page_size: u32,
}

impl PageRequest {
    /// Build a page request, clamping to `page >= 1` and
    /// `1 <= page_size <= MAX_PAGE_SIZE`.
    #[must_use]
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    #[must_use]
    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Index of the first item on this page.
    #[must_use]
    pub fn start(&self) -> usize {
        (self.page as usize - 1).saturating_mul(self.page_size as usize)
    }

    /// Index one past the last item on this page.
    #[must_use]
    pub fn end(&self) -> usize {
        self.start().saturating_add(self.page_size as usize)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_SIZE)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum TestField {
        Name,
        Price,
        InStock,
        CreatedAt,
    }

    impl Field for TestField {
        const ALL: &'static [Self] = &[Self::Name, Self::Price, Self::InStock, Self::CreatedAt];
        const SEARCHABLE: &'static [Self] = &[Self::Name];

        fn name(self) -> &'static str {
            match self {
                Self::Name => "name",
                Self::Price => "price",
                Self::InStock => "inStock",
                Self::CreatedAt => "createdAt",
            }
        }

        fn kind(self) -> FieldKind {
            match self {
                Self::Name => FieldKind::Text,
                Self::Price => FieldKind::Number,
                Self::InStock => FieldKind::Bool,
                Self::CreatedAt => FieldKind::Timestamp,
            }
        }
    }

    #[test]
    fn test_parse_filter() {
        let filter: Filter<TestField> = Filter::parse("price:>=:12.50").unwrap();
        assert_eq!(filter.field, TestField::Price);
        assert_eq!(filter.op, FilterOp::Ge);
        assert_eq!(filter.value, FieldValue::Number(Decimal::new(1250, 2)));
    }

    #[test]
    fn test_parse_filter_timestamp_keeps_colons() {
        let filter: Filter<TestField> = Filter::parse("createdAt:lt:2024-01-01T10:00:00Z").unwrap();
        assert!(matches!(filter.value, FieldValue::Timestamp(_)));
    }

    #[test]
    fn test_parse_filter_errors() {
        assert!(matches!(
            Filter::<TestField>::parse("name"),
            Err(QueryError::MalformedFilter(_))
        ));
        assert!(matches!(
            Filter::<TestField>::parse("colour:==:red"),
            Err(QueryError::UnknownField(_))
        ));
        assert!(matches!(
            Filter::<TestField>::parse("name:~:x"),
            Err(QueryError::UnknownOperator(_))
        ));
        assert!(matches!(
            Filter::<TestField>::parse("price:>:cheap"),
            Err(QueryError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_field_lookup_is_case_insensitive() {
        assert_eq!(TestField::from_name("INSTOCK").unwrap(), TestField::InStock);
    }

    #[test]
    fn test_contains_is_case_insensitive() {
        let filter = Filter::new(TestField::Name, FilterOp::Contains, "WIDGET");
        assert!(filter.matches(&FieldValue::from("Blue widget")));
        assert!(!filter.matches(&FieldValue::from("Gadget")));
        assert!(!filter.matches(&FieldValue::Null));
    }

    #[test]
    fn test_ordering_ops_across_kinds_are_false() {
        let lhs = FieldValue::from("10");
        let rhs = FieldValue::Number(Decimal::new(5, 0));
        assert!(!FilterOp::Gt.evaluate(&lhs, &rhs));
        assert!(!FilterOp::Le.evaluate(&lhs, &rhs));
        assert!(FilterOp::Ne.evaluate(&lhs, &rhs));
    }

    #[test]
    fn test_decimal_equality_ignores_scale() {
        let filter = Filter::new(TestField::Price, FilterOp::Eq, Decimal::new(150, 2));
        assert!(filter.matches(&FieldValue::Number(Decimal::new(15, 1))));
    }

    #[test]
    fn test_sort_compare_direction() {
        let a = FieldValue::from("a");
        let b = FieldValue::from("b");
        assert_eq!(Sort::asc(TestField::Name).compare(&a, &b), Ordering::Less);
        assert_eq!(Sort::desc(TestField::Name).compare(&a, &b), Ordering::Greater);
        assert_eq!(
            Sort::asc(TestField::Name).compare(&a, &FieldValue::Bool(true)),
            Ordering::Equal
        );
        assert_eq!(
            Sort::asc(TestField::Name).compare(&FieldValue::Null, &a),
            Ordering::Less
        );
    }

    #[test]
    fn test_page_request_clamps() {
        let page = PageRequest::new(0, 0);
        assert_eq!(page.page(), 1);
        assert_eq!(page.page_size(), 1);
        assert_eq!(PageRequest::new(3, 1000).page_size(), MAX_PAGE_SIZE);
    }

    #[test]
    fn test_page_request_bounds() {
        let page = PageRequest::new(3, 10);
        assert_eq!(page.start(), 20);
        assert_eq!(page.end(), 30);
    }

    #[test]
    fn test_sort_order_parse_and_default() {
        assert_eq!("ASC".parse::<SortOrder>().unwrap(), SortOrder::Asc);
        assert!("up".parse::<SortOrder>().is_err());
        assert_eq!(SortOrder::default(), SortOrder::Desc);
    }
}
