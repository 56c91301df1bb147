//! # Report Hooks
//!
//! Dioxus bindings for the query cache and the report coordinator.
//!
//! - [`use_reports_root`] puts the shared [`QueryClient`], [`ToastQueue`],
//!   [`DatabaseSelector`] and [`ReportsConfig`] into context. Call it once near the root.
//! - [`use_query`] reads a [`Query`] through the cache and re-runs when its key is
//!   invalidated.
//! - [`use_realtime_report`] drives a [`ReportViewCoordinator`] from a component.
//!
//! ```rust,ignore
//! use dioxus::prelude::*;
//! use dioxus_studio_reports::prelude::*;
//!
//! #[component]
//! fn App() -> Element {
//!     use_reports_root(ReportsConfig::default());
//!     rsx! { RealtimePage { project_ref: "abc123" } }
//! }
//!
//! #[component]
//! fn RealtimePage(project_ref: String) -> Element {
//!     let api = use_hook(|| HttpClient::new("https://api.example.com/platform", None).unwrap());
//!     let report = use_realtime_report(api.clone(), project_ref, None);
//!     let coordinator = report.coordinator();
//!
//!     rsx! {
//!         button {
//!             disabled: coordinator.read().is_refreshing(),
//!             onclick: move |_| report.refresh(),
//!             "Refresh report"
//!         }
//!         for params in coordinator.read().chart_queries() {
//!             ChartSeriesView { api: api.clone(), params }
//!         }
//!     }
//! }
//! ```

use dioxus::prelude::*;
use dioxus::dioxus_core::{ReactiveContext, schedule_update};
use std::fmt::Debug;
use tracing::debug;

use crate::{
    api::{AnalyticsApi, ApiReportParams},
    cache::CacheInvalidator,
    config::ReportsConfig,
    database_selector::DatabaseSelector,
    date_range::{DatePickerValue, DateRangeError},
    filters::ReportFilter,
    keys::CacheKey,
    notify::ToastQueue,
    plan::PlanTier,
    platform::time,
    query::{Query, QueryClient},
    query_state::QueryState,
    report::{ReportViewCoordinator, fetch_report},
    url_params::ReportUrlParams,
};

/// Provides the shared report context to every descendant component
///
/// Also runs [`QueryClient::maintain`] every `maintenance_interval_secs` for as long as
/// the calling component is mounted.
pub fn use_reports_root(config: ReportsConfig) -> QueryClient {
    let stale_time = config.stale_time();
    let max_cache_size = config.max_cache_size;
    let maintenance_interval = config.maintenance_interval();
    let client = use_context_provider(|| {
        QueryClient::new()
            .with_stale_time(stale_time)
            .with_max_cache_size(max_cache_size)
    });

    let client_for_maintenance = client.clone();
    use_hook(move || {
        spawn(async move {
            loop {
                time::sleep(maintenance_interval).await;
                client_for_maintenance.maintain();
            }
        })
    });

    use_context_provider(ToastQueue::new);
    use_context_provider(DatabaseSelector::new);
    use_context_provider(|| config);
    client
}

pub fn use_query_client() -> QueryClient {
    use_context::<QueryClient>()
}

/// Returns a function invalidating every cached read under `key`
pub fn use_invalidate_query(key: CacheKey) -> impl Fn() + Clone {
    let client = use_query_client();
    move || {
        client.invalidate(&key);
    }
}

/// Reads `query` through the shared cache
///
/// Serves cached data right away (stale data included) and fetches when the entry is
/// missing or stale. Invalidating the query's key marks this hook dirty, which refetches.
pub fn use_query<Q, Param>(query: Q, param: Param) -> Signal<QueryState<Q::Output, Q::Error>>
where
    Q: Query<Param>,
    Param: Clone + PartialEq + Debug + 'static,
{
    let state = use_signal(|| QueryState::Loading);
    let client = use_query_client();

    let _execution_memo = use_memo(use_reactive!(|param| {
        let key = query.key(&param);
        let registry = client.refresh_registry();

        if let Some(reactive_context) = ReactiveContext::current() {
            registry.subscribe_to_refresh(&key, reactive_context);
        }
        // Reading the counter makes the memo re-run on refresh
        let _refresh_count = registry.get_refresh_count(&key);

        let cached = client
            .cache()
            .get_with_staleness::<Q::Output>(&key, client.stale_time_for::<Q, Param>(&query));
        let needs_fetch = cached.as_ref().is_none_or(|(_, is_stale)| *is_stale);

        let mut state_for_cache = state;
        match cached {
            Some((data, _)) => {
                spawn(async move {
                    state_for_cache.set(QueryState::Success(data));
                });
            }
            None => {
                spawn(async move {
                    if !state_for_cache.peek().is_success() {
                        state_for_cache.set(QueryState::Loading);
                    }
                });
            }
        }

        if !needs_fetch || client.is_fetching(&key) {
            return;
        }

        debug!("🔄 [QUERY] Fetching from view: {}", key);
        let client = client.clone();
        let query = query.clone();
        let mut state_for_fetch = state;
        spawn(async move {
            let result = client.fetch_query(&query, param).await;
            let succeeded = result.is_ok();
            state_for_fetch.set(result.into());
            if succeeded {
                // Other views reading this key pick up the new entry
                client.refresh_registry().trigger_refresh(&key);
            }
        });
    }));

    state
}

/// Handle returned by [`use_realtime_report`]
pub struct RealtimeReport<A: 'static> {
    coordinator: Signal<ReportViewCoordinator<QueryClient>>,
    client: QueryClient,
    api: A,
}

impl<A: Clone + 'static> Clone for RealtimeReport<A> {
    fn clone(&self) -> Self {
        Self {
            coordinator: self.coordinator,
            client: self.client.clone(),
            api: self.api.clone(),
        }
    }
}

impl<A: AnalyticsApi> RealtimeReport<A> {
    pub fn coordinator(&self) -> Signal<ReportViewCoordinator<QueryClient>> {
        self.coordinator
    }

    fn run(&self, params: Option<ApiReportParams>) {
        let Some(params) = params else {
            return;
        };
        let client = self.client.clone();
        let api = self.api.clone();
        let mut coordinator = self.coordinator;
        spawn(async move {
            let result = fetch_report(&client, &api, params.clone()).await;
            coordinator.write().complete(&params, result);
        });
    }

    fn dispatch_pending(&self) {
        let mut coordinator = self.coordinator;
        let params = {
            let mut coordinator = coordinator.write();
            if coordinator.needs_dispatch() {
                coordinator.dispatch()
            } else {
                None
            }
        };
        self.run(params);
    }

    fn mount(&self) {
        let mut coordinator = self.coordinator;
        {
            let mut coordinator = coordinator.write();
            coordinator.on_mount();
            if let Err(error) = coordinator.resolve_default_range(time::now()) {
                debug!("📅 [REPORT] Default range failed to resolve: {}", error);
            }
        }
        self.dispatch_pending();
    }

    pub fn set_plan(&self, plan: PlanTier) {
        let mut coordinator = self.coordinator;
        if coordinator.peek().plan() != Some(plan) {
            coordinator.write().set_plan(plan);
        }
    }

    /// Returns whether the upgrade prompt was shown instead of applying the range
    pub fn handle_date_picker_change(&self, value: DatePickerValue) -> Result<bool, DateRangeError> {
        let mut coordinator = self.coordinator;
        let prompted = coordinator
            .write()
            .handle_date_picker_change(value, time::now())?;
        self.dispatch_pending();
        Ok(prompted)
    }

    pub fn update_date_range(&self, from: &str, to: &str) -> Result<(), DateRangeError> {
        let mut coordinator = self.coordinator;
        coordinator.write().update_date_range(from, to)?;
        self.dispatch_pending();
        Ok(())
    }

    pub fn dismiss_upgrade_prompt(&self) {
        let mut coordinator = self.coordinator;
        coordinator.write().dismiss_upgrade_prompt();
    }

    pub fn add_filter(&self, filter: ReportFilter) {
        let mut coordinator = self.coordinator;
        coordinator.write().add_filter(filter);
        self.dispatch_pending();
    }

    pub fn remove_filters(&self, filters: &[ReportFilter]) {
        let mut coordinator = self.coordinator;
        coordinator.write().remove_filters(filters);
        self.dispatch_pending();
    }

    pub fn remove_filter_keys<S: AsRef<str>>(&self, keys: &[S]) {
        let mut coordinator = self.coordinator;
        coordinator.write().remove_filter_keys(keys);
        self.dispatch_pending();
    }

    /// Invalidates every chart of the selected range and refetches the shared report
    pub fn refresh(&self) {
        let mut coordinator = self.coordinator;
        let params = coordinator.write().refresh();
        self.run(params);
    }
}

/// Drives the Realtime report of `project_ref`
///
/// After the first render the URL parameters are applied, the default range is resolved and
/// the shared report query is dispatched. Pending timers are cancelled when the
/// component unmounts.
pub fn use_realtime_report<A: AnalyticsApi>(
    api: A,
    project_ref: String,
    url_params: Option<ReportUrlParams>,
) -> RealtimeReport<A> {
    let client = use_query_client();
    let database = use_context::<DatabaseSelector>();
    let config = use_context::<ReportsConfig>();

    let invalidator = client.clone();
    let mut coordinator = use_signal(move || {
        let coordinator = ReportViewCoordinator::new(project_ref, invalidator, database, &config)
            .with_change_listener(schedule_update());
        match url_params {
            Some(params) => coordinator.with_url_params(params),
            None => coordinator,
        }
    });

    let report = RealtimeReport {
        coordinator,
        client,
        api,
    };

    let report_for_mount = report.clone();
    use_effect(move || report_for_mount.mount());

    use_drop(move || {
        if let Ok(mut coordinator) = coordinator.try_write() {
            coordinator.unmount();
        }
    });

    report
}
