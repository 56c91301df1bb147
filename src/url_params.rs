//! Query parameters of the report page URL
//!
//! The report page lives at `/project/{ref}/reports/realtime`. Two optional parameters
//! deep-link into it: `db` selects a database (read replica) and `chart` scrolls to a
//! chart by id.

use thiserror::Error;
use url::Url;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum UrlParamsError {
    #[error("Invalid URL '{url}': {reason}")]
    Invalid { url: String, reason: String },

    #[error("'{path}' is not a report page")]
    NotAReportPage { path: String },
}

/// Parameters read from the report page URL
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportUrlParams {
    pub project_ref: String,
    pub report: String,
    /// Database identifier to preselect
    pub db: Option<String>,
    /// Chart id to focus
    pub chart: Option<String>,
}

impl ReportUrlParams {
    pub fn from_url(url: &Url) -> Result<Self, UrlParamsError> {
        let not_a_report = || UrlParamsError::NotAReportPage {
            path: url.path().to_string(),
        };

        let segments: Vec<&str> = url
            .path_segments()
            .ok_or_else(not_a_report)?
            .filter(|s| !s.is_empty())
            .collect();

        let (project_ref, report) = match segments.as_slice() {
            ["project", project_ref, "reports", report] => (*project_ref, *report),
            _ => return Err(not_a_report()),
        };

        let mut params = Self {
            project_ref: project_ref.to_string(),
            report: report.to_string(),
            ..Self::default()
        };
        for (name, value) in url.query_pairs() {
            let value = (!value.is_empty()).then(|| value.into_owned());
            match name.as_ref() {
                "db" => params.db = value,
                "chart" => params.chart = value,
                _ => {}
            }
        }
        Ok(params)
    }

    /// Parses an absolute URL or a path such as `/project/abc/reports/realtime?db=x`
    pub fn parse(input: &str) -> Result<Self, UrlParamsError> {
        let invalid = |e: url::ParseError| UrlParamsError::Invalid {
            url: input.to_string(),
            reason: e.to_string(),
        };
        let url = match Url::parse(input) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse("http://localhost/")
                .and_then(|base| base.join(input))
                .map_err(invalid)?,
            Err(e) => return Err(invalid(e)),
        };
        Self::from_url(&url)
    }
}
