//! Report filter bar state

use serde::{Deserialize, Serialize};
use std::fmt;

/// Comparison applied by a [`ReportFilter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    Is,
    IsNot,
    Contains,
    StartsWith,
}

impl FilterOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Is => "=",
            FilterOperator::IsNot => "!=",
            FilterOperator::Contains => "~",
            FilterOperator::StartsWith => "^",
        }
    }
}

/// A single condition on a report property such as `request.path`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReportFilter {
    pub key: String,
    pub operator: FilterOperator,
    pub value: String,
}

impl ReportFilter {
    pub fn new(key: impl Into<String>, operator: FilterOperator, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            operator,
            value: value.into(),
        }
    }
}

impl fmt::Display for ReportFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.key, self.operator.as_str(), self.value)
    }
}

/// Active filters, kept in insertion order without duplicates
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportFilters {
    filters: Vec<ReportFilter>,
}

impl ReportFilters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a filter. Returns false when an identical filter was already active.
    pub fn add(&mut self, filter: ReportFilter) -> bool {
        if self.filters.contains(&filter) {
            return false;
        }
        self.filters.push(filter);
        true
    }

    /// Removes every listed filter, returning how many were active
    pub fn remove(&mut self, to_remove: &[ReportFilter]) -> usize {
        let before = self.filters.len();
        self.filters.retain(|f| !to_remove.contains(f));
        before - self.filters.len()
    }

    /// Removes every filter on the given property keys
    pub fn remove_keys<S: AsRef<str>>(&mut self, keys: &[S]) -> usize {
        let before = self.filters.len();
        self.filters
            .retain(|f| !keys.iter().any(|k| k.as_ref() == f.key));
        before - self.filters.len()
    }

    pub fn clear(&mut self) {
        self.filters.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReportFilter> {
        self.filters.iter()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn contains(&self, filter: &ReportFilter) -> bool {
        self.filters.contains(filter)
    }

    pub fn to_vec(&self) -> Vec<ReportFilter> {
        self.filters.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn path(value: &str) -> ReportFilter {
        ReportFilter::new("request.path", FilterOperator::Is, value)
    }

    fn status(value: &str) -> ReportFilter {
        ReportFilter::new("response.status_code", FilterOperator::Is, value)
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut filters = ReportFilters::new();
        assert!(filters.add(path("/realtime/v1/websocket")));
        assert!(!filters.add(path("/realtime/v1/websocket")));
        assert_eq!(filters.len(), 1);
    }

    #[test]
    fn test_sequence_matches_set_semantics() {
        enum Op {
            Add(ReportFilter),
            Remove(ReportFilter),
        }
        let ops = vec![
            Op::Add(path("/a")),
            Op::Add(status("500")),
            Op::Add(path("/b")),
            Op::Remove(path("/a")),
            Op::Add(path("/a")),
            Op::Remove(status("404")),
            Op::Remove(status("500")),
            Op::Add(path("/b")),
        ];

        let mut filters = ReportFilters::new();
        let mut expected: HashSet<ReportFilter> = HashSet::new();
        for op in ops {
            match op {
                Op::Add(f) => {
                    filters.add(f.clone());
                    expected.insert(f);
                }
                Op::Remove(f) => {
                    filters.remove(std::slice::from_ref(&f));
                    expected.remove(&f);
                }
            }
        }

        let actual: HashSet<ReportFilter> = filters.iter().cloned().collect();
        assert_eq!(actual, expected);
        assert_eq!(filters.len(), expected.len());
    }

    #[test]
    fn test_remove_by_key() {
        let mut filters = ReportFilters::new();
        filters.add(path("/a"));
        filters.add(path("/b"));
        filters.add(status("500"));

        assert_eq!(filters.remove_keys(&["request.path"]), 2);
        assert_eq!(filters.to_vec(), vec![status("500")]);
    }

    #[test]
    fn test_display() {
        assert_eq!(path("/a").to_string(), "request.path=/a");
        let f = ReportFilter::new("request.method", FilterOperator::IsNot, "GET");
        assert_eq!(f.to_string(), "request.method!=GET");
    }
}
