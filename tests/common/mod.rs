// Test doubles shared by the integration tests

#![allow(dead_code)]

use dioxus_studio_reports::prelude::*;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct FakeState {
    token_writes: Vec<(String, String)>,
    create_error: Option<ApiError>,
    infra_reads: Vec<InfraMonitoringParams>,
    report_reads: Vec<ApiReportParams>,
}

/// In-memory `AnalyticsApi` recording every call
#[derive(Clone, Default)]
pub struct FakeApi {
    state: Arc<Mutex<FakeState>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every token write fails with `error`
    pub fn failing_with(error: ApiError) -> Self {
        let api = Self::default();
        api.state.lock().unwrap().create_error = Some(error);
        api
    }

    pub fn token_writes(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().token_writes.clone()
    }

    pub fn infra_reads(&self) -> Vec<InfraMonitoringParams> {
        self.state.lock().unwrap().infra_reads.clone()
    }

    pub fn report_reads(&self) -> Vec<ApiReportParams> {
        self.state.lock().unwrap().report_reads.clone()
    }
}

impl AnalyticsApi for FakeApi {
    async fn create_warehouse_access_token(
        &self,
        project_ref: &str,
        description: &str,
    ) -> ApiResult<WarehouseAccessToken> {
        let mut state = self.state.lock().unwrap();
        state
            .token_writes
            .push((project_ref.to_string(), description.to_string()));
        if let Some(error) = &state.create_error {
            return Err(error.clone());
        }
        Ok(WarehouseAccessToken {
            id: state.token_writes.len() as i64,
            description: description.to_string(),
            token: format!("token-{}", state.token_writes.len()),
            inserted_at: None,
        })
    }

    async fn infra_monitoring(&self, params: &InfraMonitoringParams) -> ApiResult<ChartSeries> {
        self.state.lock().unwrap().infra_reads.push(params.clone());
        Ok(ChartSeries::default())
    }

    async fn api_report(&self, params: &ApiReportParams) -> ApiResult<ApiReportData> {
        let mut state = self.state.lock().unwrap();
        state.report_reads.push(params.clone());
        Ok(ApiReportData {
            result: vec![serde_json::json!({ "count": state.report_reads.len() })],
        })
    }
}
