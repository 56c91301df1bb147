#![doc = include_str!("../README.md")]

// Core modules
pub mod cache;
pub mod errors;
pub mod keys;
pub mod platform;
pub mod query;
pub mod query_state;
pub mod refresh;

// Remote API and configuration
pub mod api;
pub mod config;
pub mod queries;

// Mutations
pub mod access_tokens;
pub mod mutation;
pub mod notify;

// Reports
pub mod database_selector;
pub mod date_range;
pub mod filters;
pub mod plan;
pub mod realtime;
pub mod report;
pub mod scheduler;
pub mod url_params;

pub mod hooks;

pub mod prelude {
    //! The prelude exports the types and hooks most views need.

    // Queries and the shared cache
    pub use crate::cache::{CacheInvalidator, QueryCache};
    pub use crate::keys::{CacheKey, analytics_keys};
    pub use crate::query::{Query, QueryClient};
    pub use crate::query_state::QueryState;

    // API
    pub use crate::api::{
        AnalyticsApi, ApiReportData, ApiReportParams, ChartSeries, HttpClient,
        InfraMonitoringParams, WarehouseAccessToken,
    };
    pub use crate::config::ReportsConfig;
    pub use crate::errors::{ApiError, ApiResult};
    pub use crate::queries::{ApiReportQuery, InfraMonitoringQuery};

    // Mutations
    pub use crate::access_tokens::{
        CreateWarehouseAccessToken, WarehouseAccessTokenCreateVariables,
        use_create_warehouse_access_token,
    };
    pub use crate::mutation::{Mutation, MutationOptions, MutationState, run_mutation, use_mutation};
    pub use crate::notify::{LogNotifier, Notifier, ToastQueue};

    // Reports
    pub use crate::database_selector::DatabaseSelector;
    pub use crate::date_range::{ChartInterval, DatePickerHelper, DatePickerValue, DateRange};
    pub use crate::filters::{FilterOperator, ReportFilter, ReportFilters};
    pub use crate::plan::PlanTier;
    pub use crate::report::{ReportPhase, ReportViewCoordinator, fetch_charts, fetch_report};
    pub use crate::url_params::ReportUrlParams;

    // Hooks
    pub use crate::hooks::{
        RealtimeReport, use_invalidate_query, use_query, use_query_client, use_realtime_report,
        use_reports_root,
    };
}
