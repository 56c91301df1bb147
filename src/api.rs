//! # Analytics API
//!
//! The [`AnalyticsApi`] trait is the only way the coordinators reach the network. The
//! crate ships [`HttpClient`], a `reqwest` implementation talking to the platform API;
//! tests and previews can substitute any other implementation.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::{collections::BTreeMap, future::Future};
use tracing::debug;
use url::Url;

use crate::{
    config::ReportsConfig,
    date_range::ChartInterval,
    errors::{ApiError, ApiResult, ResponseError},
    filters::ReportFilter,
};

/// Token returned when a warehouse access token is created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarehouseAccessToken {
    pub id: i64,
    #[serde(default)]
    pub description: String,
    pub token: String,
    #[serde(default)]
    pub inserted_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
struct CreateWarehouseAccessTokenBody<'a> {
    description: &'a str,
}

/// Parameters of one infra-monitoring chart read
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InfraMonitoringParams {
    pub project_ref: String,
    pub attribute: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub interval: ChartInterval,
    pub database_identifier: Option<String>,
}

/// One bucket of a chart series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub period_start: String,
    #[serde(flatten)]
    pub values: BTreeMap<String, serde_json::Value>,
}

/// Chart-plottable series returned by the infra-monitoring endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    #[serde(default)]
    pub data: Vec<ChartPoint>,
}

/// Parameters of the shared API gateway report
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ApiReportParams {
    pub project_ref: String,
    pub filter_by: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub filters: Vec<ReportFilter>,
}

/// Rows of the shared API gateway report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiReportData {
    #[serde(default)]
    pub result: Vec<serde_json::Value>,
}

/// Remote operations used by the report and mutation coordinators
pub trait AnalyticsApi: Clone + 'static {
    /// `POST /projects/{ref}/analytics/warehouse/access-tokens`
    fn create_warehouse_access_token(
        &self,
        project_ref: &str,
        description: &str,
    ) -> impl Future<Output = ApiResult<WarehouseAccessToken>>;

    /// `GET /projects/{ref}/infra-monitoring`
    fn infra_monitoring(
        &self,
        params: &InfraMonitoringParams,
    ) -> impl Future<Output = ApiResult<ChartSeries>>;

    /// `GET /projects/{ref}/analytics/endpoints/api-report`
    fn api_report(&self, params: &ApiReportParams) -> impl Future<Output = ApiResult<ApiReportData>>;
}

fn timestamp(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Turns a failed response body into an [`ApiError`], preferring the server's `message`.
pub fn error_from_body(status: u16, body: &str) -> ApiError {
    let message = match serde_json::from_str::<ResponseError>(body) {
        Ok(error) => error.message,
        Err(_) if body.trim().is_empty() => format!("Request failed with status {status}"),
        Err(_) => body.trim().to_string(),
    };
    ApiError::from_status(status, message)
}

/// `reqwest` client for the platform API
#[derive(Clone, Debug)]
pub struct HttpClient {
    http: reqwest::Client,
    base_url: Url,
    access_token: Option<String>,
}

impl HttpClient {
    pub fn new(base_url: &str, access_token: Option<String>) -> ApiResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ApiError::invalid_input(format!("Invalid API base URL '{base_url}': {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::invalid_input(format!(
                "API base URL '{base_url}' cannot carry a path"
            )));
        }
        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
            access_token,
        })
    }

    pub fn from_config(config: &ReportsConfig) -> ApiResult<Self> {
        Self::new(&config.api_base_url, config.access_token.clone())
    }

    /// Appends percent-encoded path segments to the base URL
    pub fn endpoint(&self, segments: &[&str]) -> ApiResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::invalid_input("API base URL cannot carry a path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> ApiResult<T> {
        let response = self.authorize(request).send().await?;
        let status = response.status();
        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| ApiError::transport(format!("Failed to decode response: {e}")));
        }
        let body = response.text().await.unwrap_or_default();
        Err(error_from_body(status.as_u16(), &body))
    }
}

impl AnalyticsApi for HttpClient {
    async fn create_warehouse_access_token(
        &self,
        project_ref: &str,
        description: &str,
    ) -> ApiResult<WarehouseAccessToken> {
        let url = self.endpoint(&[
            "projects",
            project_ref,
            "analytics",
            "warehouse",
            "access-tokens",
        ])?;
        debug!("🌐 [HTTP] POST {}", url);
        self.send(
            self.http
                .post(url)
                .json(&CreateWarehouseAccessTokenBody { description }),
        )
        .await
    }

    async fn infra_monitoring(&self, params: &InfraMonitoringParams) -> ApiResult<ChartSeries> {
        let url = self.endpoint(&["projects", &params.project_ref, "infra-monitoring"])?;
        let mut query = vec![
            ("attribute", params.attribute.clone()),
            ("startDate", timestamp(&params.start_date)),
            ("endDate", timestamp(&params.end_date)),
            ("interval", params.interval.as_str().to_string()),
        ];
        if let Some(db) = &params.database_identifier {
            query.push(("databaseIdentifier", db.clone()));
        }
        debug!("🌐 [HTTP] GET {} ({})", url, params.attribute);
        self.send(self.http.get(url).query(&query)).await
    }

    async fn api_report(&self, params: &ApiReportParams) -> ApiResult<ApiReportData> {
        let url = self.endpoint(&[
            "projects",
            &params.project_ref,
            "analytics",
            "endpoints",
            "api-report",
        ])?;
        let mut query = vec![
            ("product", params.filter_by.clone()),
            ("iso_timestamp_start", timestamp(&params.start)),
            ("iso_timestamp_end", timestamp(&params.end)),
        ];
        query.extend(params.filters.iter().map(|f| ("filter", f.to_string())));
        debug!("🌐 [HTTP] GET {}", url);
        self.send(self.http.get(url).query(&query)).await
    }
}
