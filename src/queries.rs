//! Analytics reads expressed as [`Query`]s

use std::time::Duration;

use crate::{
    api::{AnalyticsApi, ApiReportData, ApiReportParams, ChartSeries, InfraMonitoringParams},
    errors::ApiError,
    keys::{CacheKey, analytics_keys},
    query::Query,
};

/// One infra-monitoring chart series
#[derive(Clone)]
pub struct InfraMonitoringQuery<A> {
    api: A,
    stale_time: Option<Duration>,
}

impl<A: AnalyticsApi> InfraMonitoringQuery<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            stale_time: None,
        }
    }

    pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time = Some(stale_time);
        self
    }
}

impl<A: AnalyticsApi> Query<InfraMonitoringParams> for InfraMonitoringQuery<A> {
    type Output = ChartSeries;
    type Error = ApiError;

    async fn run(&self, params: InfraMonitoringParams) -> Result<ChartSeries, ApiError> {
        self.api.infra_monitoring(&params).await
    }

    fn key(&self, params: &InfraMonitoringParams) -> CacheKey {
        analytics_keys::infra_monitoring(params)
    }

    fn stale_time(&self) -> Option<Duration> {
        self.stale_time
    }
}

/// The shared API gateway report shown under the charts
#[derive(Clone)]
pub struct ApiReportQuery<A> {
    api: A,
}

impl<A: AnalyticsApi> ApiReportQuery<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }
}

impl<A: AnalyticsApi> Query<ApiReportParams> for ApiReportQuery<A> {
    type Output = ApiReportData;
    type Error = ApiError;

    async fn run(&self, params: ApiReportParams) -> Result<ApiReportData, ApiError> {
        self.api.api_report(&params).await
    }

    fn key(&self, params: &ApiReportParams) -> CacheKey {
        analytics_keys::api_report(params)
    }
}
