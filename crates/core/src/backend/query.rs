//! Row filters and ordering
//!
//! A `Query` is both rendered into PostgREST parameters for the hosted backend
//! and evaluated directly against JSON rows by the in-memory backend.

use serde_json::Value;
use std::cmp::Ordering;

/// A single column predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    Eq(String, String),
    Gte(String, String),
    Lte(String, String),
    In(String, Vec<String>),
}

impl Filter {
    fn column(&self) -> &str {
        match self {
            Self::Eq(column, _) | Self::Gte(column, _) | Self::Lte(column, _) => column,
            Self::In(column, _) => column,
        }
    }

    fn to_param(&self) -> (String, String) {
        let value = match self {
            Self::Eq(_, v) => format!("eq.{}", v),
            Self::Gte(_, v) => format!("gte.{}", v),
            Self::Lte(_, v) => format!("lte.{}", v),
            Self::In(_, values) => format!("in.({})", values.join(",")),
        };
        (self.column().to_string(), value)
    }

    fn matches(&self, row: &Value) -> bool {
        let Some(actual) = column_text(row, self.column()) else {
            return false;
        };
        match self {
            Self::Eq(_, v) => actual == *v,
            Self::Gte(_, v) => actual.as_str() >= v.as_str(),
            Self::Lte(_, v) => actual.as_str() <= v.as_str(),
            Self::In(_, values) => values.iter().any(|v| *v == actual),
        }
    }
}

/// Sort direction of an ordering clause
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    fn suffix(self) -> &'static str {
        match self {
            Self::Ascending => "asc",
            Self::Descending => "desc",
        }
    }
}

/// Filters plus ordering for one collection request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    filters: Vec<Filter>,
    order: Vec<(String, Direction)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep rows whose column equals `value`
    pub fn eq(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push(Filter::Eq(column.into(), value.into()));
        self
    }

    /// Keep rows whose column is at least `value`
    pub fn gte(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push(Filter::Gte(column.into(), value.into()));
        self
    }

    /// Keep rows whose column is at most `value`
    pub fn lte(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push(Filter::Lte(column.into(), value.into()));
        self
    }

    /// Keep rows whose column is one of `values`
    pub fn in_list<I, S>(mut self, column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.filters.push(Filter::In(column.into(), values));
        self
    }

    /// Append an ordering clause; earlier clauses take precedence
    pub fn order(mut self, column: impl Into<String>, direction: Direction) -> Self {
        self.order.push((column.into(), direction));
        self
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    /// Render as PostgREST query parameters
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params: Vec<(String, String)> =
            self.filters.iter().map(Filter::to_param).collect();
        if !self.order.is_empty() {
            let clauses: Vec<String> = self
                .order
                .iter()
                .map(|(column, direction)| format!("{}.{}", column, direction.suffix()))
                .collect();
            params.push(("order".to_string(), clauses.join(",")));
        }
        params
    }

    /// Whether a row passes every filter
    pub fn matches(&self, row: &Value) -> bool {
        self.filters.iter().all(|filter| filter.matches(row))
    }

    /// Sort rows by the ordering clauses; missing values sort last
    pub fn sort(&self, rows: &mut [Value]) {
        if self.order.is_empty() {
            return;
        }
        rows.sort_by(|a, b| {
            for (column, direction) in &self.order {
                let ordering = match (column_text(a, column), column_text(b, column)) {
                    (Some(x), Some(y)) => {
                        let natural = x.cmp(&y);
                        match direction {
                            Direction::Ascending => natural,
                            Direction::Descending => natural.reverse(),
                        }
                    }
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            Ordering::Equal
        });
    }
}

/// Text form of a scalar column, `None` for missing or null
fn column_text(row: &Value, column: &str) -> Option<String> {
    match row.get(column)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}
