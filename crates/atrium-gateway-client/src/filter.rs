//! Row filters for gateway queries
//!
//! Filters have two interpreters:
//! - [`Filter::to_query_params`] renders the PostgREST-style query string the
//!   remote gateway understands (`status=eq.pending`,
//!   `or=(follower_id.eq.a,following_id.eq.a)`)
//! - [`Filter::matches`] evaluates the same filter against a JSON row, which
//!   is what in-process gateway implementations and tests use

use serde_json::Value;

/// A composable row filter
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Column equals value
    Eq(String, Value),
    /// Column does not equal value
    Neq(String, Value),
    /// Column is one of the given values
    In(String, Vec<Value>),
    /// At least one sub-filter matches (OR)
    Any(Vec<Filter>),
    /// Every sub-filter matches (AND)
    All(Vec<Filter>),
}

impl Filter {
    /// Shorthand for an equality filter
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq(column.into(), value.into())
    }

    /// Shorthand for an inequality filter
    pub fn neq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Neq(column.into(), value.into())
    }

    /// Render as top-level query parameters
    ///
    /// `All` flattens into one parameter per sub-filter; `Any` renders as a
    /// single `or=(...)` parameter. Values are percent-encoded by the client
    /// at URL build time.
    pub fn to_query_params(&self) -> Vec<(String, String)> {
        match self {
            Filter::Eq(col, v) => vec![(col.clone(), format!("eq.{}", literal(v)))],
            Filter::Neq(col, v) => vec![(col.clone(), format!("neq.{}", literal(v)))],
            Filter::In(col, vs) => vec![(col.clone(), format!("in.({})", literals(vs)))],
            Filter::Any(fs) => {
                let inner: Vec<String> = fs.iter().map(|f| f.expr()).collect();
                vec![("or".to_string(), format!("({})", inner.join(",")))]
            }
            Filter::All(fs) => fs.iter().flat_map(|f| f.to_query_params()).collect(),
        }
    }

    /// Render in nested expression form, for use inside `or(...)`/`and(...)`
    fn expr(&self) -> String {
        match self {
            Filter::Eq(col, v) => format!("{}.eq.{}", col, literal(v)),
            Filter::Neq(col, v) => format!("{}.neq.{}", col, literal(v)),
            Filter::In(col, vs) => format!("{}.in.({})", col, literals(vs)),
            Filter::Any(fs) => {
                let inner: Vec<String> = fs.iter().map(|f| f.expr()).collect();
                format!("or({})", inner.join(","))
            }
            Filter::All(fs) => {
                let inner: Vec<String> = fs.iter().map(|f| f.expr()).collect();
                format!("and({})", inner.join(","))
            }
        }
    }

    /// Evaluate this filter against a JSON row
    pub fn matches(&self, row: &Value) -> bool {
        match self {
            Filter::Eq(col, v) => row.get(col).map_or(false, |actual| actual == v),
            Filter::Neq(col, v) => row.get(col).map_or(false, |actual| actual != v),
            Filter::In(col, vs) => row.get(col).map_or(false, |actual| vs.contains(actual)),
            Filter::Any(fs) => fs.iter().any(|f| f.matches(row)),
            Filter::All(fs) => fs.iter().all(|f| f.matches(row)),
        }
    }
}

/// Sort order for a select
#[derive(Debug, Clone)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

impl Order {
    pub fn asc(column: impl Into<String>) -> Self {
        Self { column: column.into(), ascending: true }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self { column: column.into(), ascending: false }
    }

    /// Render as the `order` query parameter value
    pub fn to_query_value(&self) -> String {
        let dir = if self.ascending { "asc" } else { "desc" };
        format!("{}.{}", self.column, dir)
    }
}

/// Render a JSON value as a filter literal (strings are unquoted)
fn literal(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn literals(vs: &[Value]) -> String {
    vs.iter().map(literal).collect::<Vec<_>>().join(",")
}
