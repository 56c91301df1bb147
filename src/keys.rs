//! # Cache Keys
//!
//! Queries are addressed by hierarchical [`CacheKey`]s such as
//! `projects / abc123 / analytics / warehouse-access-tokens`. A key is a list of
//! [`KeySegment`]s; the last segment is usually a parameter map describing the query.
//!
//! Invalidation works on prefixes: invalidating `projects / abc123` hits every cached
//! read of that project. Parameter maps match partially, so a query key carrying
//! `{attribute: "realtime_connections_connected"}` matches any cached key whose map
//! contains that pair.

use std::{collections::BTreeMap, fmt};

/// One level of a [`CacheKey`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeySegment {
    Name(String),
    Params(BTreeMap<String, String>),
}

impl KeySegment {
    /// Whether `self` (a segment of a cached key) is covered by `query`
    fn matches(&self, query: &KeySegment) -> bool {
        match (self, query) {
            (KeySegment::Name(a), KeySegment::Name(b)) => a == b,
            (KeySegment::Params(own), KeySegment::Params(wanted)) => wanted
                .iter()
                .all(|(k, v)| own.get(k).is_some_and(|value| value == v)),
            _ => false,
        }
    }
}

/// Hierarchical identifier for a cached query result
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    segments: Vec<KeySegment>,
}

impl CacheKey {
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            segments: vec![KeySegment::Name(root.into())],
        }
    }

    /// Appends a named segment
    pub fn push(mut self, name: impl Into<String>) -> Self {
        self.segments.push(KeySegment::Name(name.into()));
        self
    }

    /// Appends a parameter segment. Parameters without a value are left out so that
    /// equivalent parameter sets produce equal keys.
    pub fn with_params<I, K>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, Option<String>)>,
        K: Into<String>,
    {
        let map = params
            .into_iter()
            .filter_map(|(k, v)| v.map(|v| (k.into(), v)))
            .collect();
        self.segments.push(KeySegment::Params(map));
        self
    }

    pub fn segments(&self) -> &[KeySegment] {
        &self.segments
    }

    /// Returns true when `query` addresses this key: every segment of `query` matches the
    /// segment at the same position here.
    pub fn matches(&self, query: &CacheKey) -> bool {
        query.segments.len() <= self.segments.len()
            && self
                .segments
                .iter()
                .zip(query.segments.iter())
                .all(|(own, wanted)| own.matches(wanted))
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for segment in &self.segments {
            if !first {
                f.write_str("/")?;
            }
            first = false;
            match segment {
                KeySegment::Name(name) => f.write_str(name)?,
                KeySegment::Params(params) => {
                    f.write_str("{")?;
                    let mut first_param = true;
                    for (k, v) in params {
                        if !first_param {
                            f.write_str(",")?;
                        }
                        first_param = false;
                        write!(f, "{k}={v}")?;
                    }
                    f.write_str("}")?;
                }
            }
        }
        Ok(())
    }
}

/// Cache keys for the analytics endpoints
pub mod analytics_keys {
    use super::CacheKey;
    use crate::api::{ApiReportParams, InfraMonitoringParams};

    /// `databaseIdentifier` of reads that go to the project's primary database
    pub const PRIMARY_DATABASE: &str = "primary";

    /// Root of every read scoped to one project
    pub fn project(project_ref: &str) -> CacheKey {
        CacheKey::new("projects").push(project_ref)
    }

    pub fn warehouse_access_tokens(project_ref: &str) -> CacheKey {
        project(project_ref)
            .push("analytics")
            .push("warehouse-access-tokens")
    }

    /// Namespace of every infra-monitoring chart of the project
    pub fn infra_monitoring_root(project_ref: &str) -> CacheKey {
        project(project_ref).push("infra-monitoring")
    }

    /// Key of one chart read. Every parameter is always present, so the key of a read
    /// never matches the keys of reads on other databases or ranges.
    pub fn infra_monitoring(params: &InfraMonitoringParams) -> CacheKey {
        let database = params
            .database_identifier
            .clone()
            .unwrap_or_else(|| PRIMARY_DATABASE.to_string());
        infra_monitoring_root(&params.project_ref).with_params([
            ("attribute", Some(params.attribute.clone())),
            ("startDate", Some(params.start_date.to_rfc3339())),
            ("endDate", Some(params.end_date.to_rfc3339())),
            ("interval", Some(params.interval.as_str().to_string())),
            ("databaseIdentifier", Some(database)),
        ])
    }

    pub fn api_report(params: &ApiReportParams) -> CacheKey {
        let filters = params
            .filters
            .iter()
            .map(|f| f.to_string())
            .collect::<Vec<_>>()
            .join("&");
        project(&params.project_ref)
            .push("api-report")
            .with_params([
                ("filterBy", Some(params.filter_by.clone())),
                ("start", Some(params.start.to_rfc3339())),
                ("end", Some(params.end.to_rfc3339())),
                ("filters", Some(filters)),
            ])
    }
}
