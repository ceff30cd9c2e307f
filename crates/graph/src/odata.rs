//! OData system query options (`$select`, `$filter`, ...).

use std::fmt;

/// Builds the query string appended to a Graph resource path. Options are
/// emitted in the order they were added, with values percent-encoded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ODataQuery {
    options: Vec<(&'static str, String)>,
}

impl ODataQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(self, fields: &str) -> Self {
        self.with("$select", fields)
    }

    pub fn filter(self, expr: &str) -> Self {
        self.with("$filter", expr)
    }

    pub fn orderby(self, expr: &str) -> Self {
        self.with("$orderby", expr)
    }

    pub fn top(self, n: u32) -> Self {
        self.with("$top", &n.to_string())
    }

    fn with(mut self, key: &'static str, value: &str) -> Self {
        self.options.push((key, value.to_string()));
        self
    }

    /// `path` with this query appended.
    pub fn apply(&self, path: &str) -> String {
        if self.options.is_empty() {
            path.to_string()
        } else {
            format!("{path}?{self}")
        }
    }
}

impl fmt::Display for ODataQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.options.iter().enumerate() {
            if i > 0 {
                f.write_str("&")?;
            }
            write!(f, "{key}={}", urlencoding::encode(value))?;
        }
        Ok(())
    }
}
