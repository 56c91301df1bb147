//! # Realtime Report View
//!
//! [`ReportViewCoordinator`] holds the state behind the Realtime report page: the
//! selected date range, the report filters, plan gating and the manual refresh. It is
//! synchronous; reads are described by [`ReportViewCoordinator::chart_queries`] and
//! [`ReportViewCoordinator::report_query`] and run by the caller (see [`fetch_report`]
//! and [`fetch_charts`]), which hands the shared report result back through
//! [`ReportViewCoordinator::complete`].
//!
//! ```text
//! Initial ──range──▶ RangeSelected ──dispatch──▶ Loading ──complete──▶ Loaded | Error
//!                                                                         │
//!                              Loaded | Error ◀──complete── Refreshing ◀──refresh
//! ```

use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};
use tracing::{debug, warn};

use crate::{
    api::{AnalyticsApi, ApiReportData, ApiReportParams, ChartSeries, InfraMonitoringParams},
    cache::CacheInvalidator,
    config::ReportsConfig,
    database_selector::DatabaseSelector,
    date_range::{DatePickerHelper, DatePickerValue, DateRange, DateRangeError},
    errors::{ApiError, ApiResult},
    filters::{ReportFilter, ReportFilters},
    keys::analytics_keys,
    plan::PlanTier,
    queries::{ApiReportQuery, InfraMonitoringQuery},
    query::QueryClient,
    realtime::{ReportAttributeSpec, realtime_report_attributes, visible_report_attributes},
    scheduler::ViewScheduler,
    url_params::ReportUrlParams,
};

/// `product` sent with the shared API report
pub const REALTIME_FILTER_BY: &str = "realtime";

/// Sections of the shared API report the Realtime page leaves out
pub const REALTIME_HIDDEN_REPORTS: &[&str] = &["networkTraffic"];

const REFRESH_INDICATOR_TASK: &str = "refresh-indicator";
const DATABASE_SELECTOR_TASK: &str = "database-selector";
const CHART_FOCUS_TASK: &str = "chart-focus";

/// Called after a scheduled callback changed the view state
pub type ChangeListener = Arc<dyn Fn() + Send + Sync>;

fn notify_change(listener: &Option<ChangeListener>) {
    if let Some(listener) = listener {
        listener();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportPhase {
    Initial,
    RangeSelected,
    Loading,
    Loaded,
    Error(String),
    Refreshing,
}

/// Coordinator of the Realtime report page
pub struct ReportViewCoordinator<I> {
    project_ref: String,
    plan: Option<PlanTier>,
    invalidator: I,
    database: DatabaseSelector,
    default_helper: DatePickerHelper,
    date_range: Option<DateRange>,
    filters: ReportFilters,
    phase: ReportPhase,
    report: Option<ApiReportData>,
    show_upgrade_prompt: bool,
    needs_dispatch: bool,
    is_refreshing: Arc<AtomicBool>,
    focused_chart: Arc<Mutex<Option<String>>>,
    url_params: Option<ReportUrlParams>,
    refresh_indicator_delay: Duration,
    database_selector_delay: Duration,
    chart_focus_delay: Duration,
    on_change: Option<ChangeListener>,
    scheduler: ViewScheduler,
}

impl<I: CacheInvalidator> ReportViewCoordinator<I> {
    pub fn new(
        project_ref: impl Into<String>,
        invalidator: I,
        database: DatabaseSelector,
        config: &ReportsConfig,
    ) -> Self {
        Self {
            project_ref: project_ref.into(),
            plan: None,
            invalidator,
            database,
            default_helper: config.default_date_helper,
            date_range: None,
            filters: ReportFilters::new(),
            phase: ReportPhase::Initial,
            report: None,
            show_upgrade_prompt: false,
            needs_dispatch: false,
            is_refreshing: Arc::new(AtomicBool::new(false)),
            focused_chart: Arc::new(Mutex::new(None)),
            url_params: None,
            refresh_indicator_delay: config.refresh_indicator_delay(),
            database_selector_delay: config.database_selector_delay(),
            chart_focus_delay: config.chart_focus_delay(),
            on_change: None,
            scheduler: ViewScheduler::new(),
        }
    }

    /// URL parameters applied by the first [`on_mount`](Self::on_mount)
    pub fn with_url_params(mut self, params: ReportUrlParams) -> Self {
        self.url_params = Some(params);
        self
    }

    /// Listener run whenever a timer changes the refresh indicator, the selected
    /// database or the focused chart
    pub fn with_change_listener(mut self, listener: ChangeListener) -> Self {
        self.on_change = Some(listener);
        self
    }

    /// Sets the organization plan once it has loaded. Until then no chart is hidden and
    /// no range is gated.
    pub fn set_plan(&mut self, plan: PlanTier) {
        self.plan = Some(plan);
    }

    pub fn project_ref(&self) -> &str {
        &self.project_ref
    }

    pub fn plan(&self) -> Option<PlanTier> {
        self.plan
    }

    pub fn phase(&self) -> &ReportPhase {
        &self.phase
    }

    pub fn date_range(&self) -> Option<&DateRange> {
        self.date_range.as_ref()
    }

    pub fn filters(&self) -> &ReportFilters {
        &self.filters
    }

    pub fn report_data(&self) -> Option<&ApiReportData> {
        self.report.as_ref()
    }

    pub fn show_upgrade_prompt(&self) -> bool {
        self.show_upgrade_prompt
    }

    pub fn dismiss_upgrade_prompt(&mut self) {
        self.show_upgrade_prompt = false;
    }

    /// Cosmetic spinner flag of the refresh button
    pub fn is_refreshing(&self) -> bool {
        self.is_refreshing.load(Ordering::SeqCst)
    }

    /// Chart id requested by the `chart` URL parameter, once its delay has elapsed
    pub fn focused_chart(&self) -> Option<String> {
        self.focused_chart.lock().ok().and_then(|c| c.clone())
    }

    /// True when range or filters changed since the last [`dispatch`](Self::dispatch)
    pub fn needs_dispatch(&self) -> bool {
        self.needs_dispatch
    }

    fn is_free_plan(&self) -> bool {
        self.plan.is_some_and(|plan| plan.is_restricted())
    }

    /// Every chart of the report, including the ones hidden on the current plan
    pub fn attributes(&self) -> Vec<ReportAttributeSpec> {
        realtime_report_attributes(self.is_free_plan())
    }

    /// The charts to render
    pub fn visible_attributes(&self) -> Vec<ReportAttributeSpec> {
        let specs = self.attributes();
        visible_report_attributes(&specs).into_iter().cloned().collect()
    }

    pub fn hidden_reports(&self) -> &'static [&'static str] {
        REALTIME_HIDDEN_REPORTS
    }

    /// Whether `section` of the shared API report is rendered on this page
    pub fn shows_report_section(&self, section: &str) -> bool {
        !self.hidden_reports().iter().any(|hidden| *hidden == section)
    }

    fn select_range(&mut self, range: DateRange) {
        debug!(
            "📅 [REPORT] Range {} → {} ({})",
            range.start(),
            range.end(),
            range.interval()
        );
        self.date_range = Some(range);
        self.needs_dispatch = true;
        if self.phase == ReportPhase::Initial {
            self.phase = ReportPhase::RangeSelected;
        }
    }

    /// Applies the default preset if no range has been selected yet.
    pub fn resolve_default_range(&mut self, now: DateTime<Utc>) -> Result<DateRange, DateRangeError> {
        if let Some(range) = self.date_range {
            return Ok(range);
        }
        let range = self.default_helper.resolve(now)?;
        self.select_range(range);
        Ok(range)
    }

    /// Handles a date picker submission.
    ///
    /// Returns `Ok(true)` when the range reaches past the plan's retention: the upgrade
    /// prompt is shown and the selected range is left unchanged.
    pub fn handle_date_picker_change(
        &mut self,
        value: DatePickerValue,
        now: DateTime<Utc>,
    ) -> Result<bool, DateRangeError> {
        let range = value.resolve(now)?;
        let requested_start = value.requested_start(now);
        if let Some(plan) = self
            .plan
            .filter(|plan| plan.exceeds_retention(requested_start, now))
        {
            debug!("🔒 [REPORT] Range exceeds {:?} retention, showing upgrade prompt", plan);
            self.show_upgrade_prompt = true;
            return Ok(true);
        }
        self.select_range(range);
        Ok(false)
    }

    /// Zooms to a range selected on a chart. Bounds are RFC 3339 timestamps.
    pub fn update_date_range(&mut self, from: &str, to: &str) -> Result<(), DateRangeError> {
        let range = DateRange::parse(from, to)?;
        self.select_range(range);
        Ok(())
    }

    pub fn add_filter(&mut self, filter: ReportFilter) -> bool {
        let added = self.filters.add(filter);
        self.needs_dispatch |= added;
        added
    }

    pub fn remove_filters(&mut self, filters: &[ReportFilter]) -> usize {
        let removed = self.filters.remove(filters);
        self.needs_dispatch |= removed > 0;
        removed
    }

    /// Removes every filter on one of `keys`
    pub fn remove_filter_keys<S: AsRef<str>>(&mut self, keys: &[S]) -> usize {
        let removed = self.filters.remove_keys(keys);
        self.needs_dispatch |= removed > 0;
        removed
    }

    /// One read per metric attribute of every configured chart, hidden ones included
    pub fn chart_queries(&self) -> Vec<InfraMonitoringParams> {
        let Some(range) = self.date_range else {
            return Vec::new();
        };
        let database_identifier = self.database.selected();
        self.attributes()
            .iter()
            .flat_map(|spec| spec.attributes.iter())
            .map(|attribute| InfraMonitoringParams {
                project_ref: self.project_ref.clone(),
                attribute: attribute.attribute.to_string(),
                start_date: range.start(),
                end_date: range.end(),
                interval: range.interval(),
                database_identifier: database_identifier.clone(),
            })
            .collect()
    }

    /// Parameters of the shared API report for the current range and filters
    pub fn report_query(&self) -> Option<ApiReportParams> {
        let range = self.date_range?;
        Some(ApiReportParams {
            project_ref: self.project_ref.clone(),
            filter_by: REALTIME_FILTER_BY.to_string(),
            start: range.start(),
            end: range.end(),
            filters: self.filters.to_vec(),
        })
    }

    /// Marks the report as loading and returns the read to run
    pub fn dispatch(&mut self) -> Option<ApiReportParams> {
        let params = self.report_query()?;
        self.needs_dispatch = false;
        if self.phase != ReportPhase::Refreshing {
            self.phase = ReportPhase::Loading;
        }
        debug!("📊 [REPORT] Dispatching report query for {}", self.project_ref);
        Some(params)
    }

    /// Records the shared report result. Results for parameters that are no longer
    /// current are dropped and `false` is returned.
    pub fn complete(&mut self, params: &ApiReportParams, result: ApiResult<ApiReportData>) -> bool {
        if self.report_query().as_ref() != Some(params) {
            debug!("📊 [REPORT] Ignoring result for outdated parameters");
            return false;
        }
        match result {
            Ok(data) => {
                self.report = Some(data);
                self.phase = ReportPhase::Loaded;
            }
            Err(error) => {
                warn!("📊 [REPORT] Report query failed: {}", error);
                self.phase = ReportPhase::Error(error.message().to_string());
            }
        }
        true
    }

    /// Manual refresh.
    ///
    /// Invalidates the infra-monitoring read of every chart attribute for exactly the
    /// selected range, interval and database, then returns the report read to
    /// re-dispatch. The refresh indicator clears after a fixed delay whether or not the
    /// reads have finished.
    ///
    /// Only a settled report (loaded or failed) can be refreshed; in any other phase
    /// this does nothing and returns `None`.
    pub fn refresh(&mut self) -> Option<ApiReportParams> {
        if !matches!(self.phase, ReportPhase::Loaded | ReportPhase::Error(_)) {
            debug!("🔄 [REPORT] Ignoring refresh while {:?}", self.phase);
            return None;
        }
        self.date_range?;

        self.is_refreshing.store(true, Ordering::SeqCst);
        let flag = self.is_refreshing.clone();
        let on_change = self.on_change.clone();
        self.scheduler
            .schedule(REFRESH_INDICATOR_TASK, self.refresh_indicator_delay, move || {
                flag.store(false, Ordering::SeqCst);
                notify_change(&on_change);
            });

        let chart_queries = self.chart_queries();
        for params in &chart_queries {
            self.invalidator
                .invalidate(&analytics_keys::infra_monitoring(params));
        }
        debug!(
            "🔄 [REPORT] Invalidated {} chart queries for {}",
            chart_queries.len(),
            self.project_ref
        );

        let params = self.report_query()?;
        self.invalidator.invalidate(&analytics_keys::api_report(&params));
        self.phase = ReportPhase::Refreshing;
        self.needs_dispatch = false;
        Some(params)
    }

    /// Applies the URL parameters. Only the first call has an effect.
    pub fn on_mount(&mut self) {
        let Some(params) = self.url_params.take() else {
            return;
        };

        if let Some(db) = params.db {
            let database = self.database.clone();
            let on_change = self.on_change.clone();
            self.scheduler
                .schedule(DATABASE_SELECTOR_TASK, self.database_selector_delay, move || {
                    database.select(Some(db));
                    notify_change(&on_change);
                });
        }
        if let Some(chart) = params.chart {
            let focused = self.focused_chart.clone();
            let on_change = self.on_change.clone();
            self.scheduler
                .schedule(CHART_FOCUS_TASK, self.chart_focus_delay, move || {
                    if let Ok(mut focused) = focused.lock() {
                        *focused = Some(chart);
                    }
                    notify_change(&on_change);
                });
        }
    }

    /// Cancels pending timers; dropping the coordinator does the same.
    pub fn unmount(&mut self) -> usize {
        self.scheduler.cancel_all()
    }
}

/// Runs the shared report read through the query cache
pub async fn fetch_report<A: AnalyticsApi>(
    client: &QueryClient,
    api: &A,
    params: ApiReportParams,
) -> Result<ApiReportData, ApiError> {
    client
        .fetch_query(&ApiReportQuery::new(api.clone()), params)
        .await
}

/// Runs every chart read concurrently through the query cache
pub async fn fetch_charts<A: AnalyticsApi>(
    client: &QueryClient,
    api: &A,
    queries: Vec<InfraMonitoringParams>,
) -> Vec<(InfraMonitoringParams, Result<ChartSeries, ApiError>)> {
    let query = InfraMonitoringQuery::new(api.clone());
    join_all(queries.into_iter().map(|params| {
        let query = query.clone();
        async move {
            let result = client.fetch_query(&query, params.clone()).await;
            (params, result)
        }
    }))
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{date_range::ChartInterval, filters::FilterOperator, keys::CacheKey};
    use chrono::{Duration as ChronoDuration, TimeZone};

    #[derive(Clone, Default)]
    struct RecordingInvalidator {
        keys: Arc<Mutex<Vec<CacheKey>>>,
    }

    impl RecordingInvalidator {
        fn keys(&self) -> Vec<CacheKey> {
            self.keys.lock().unwrap().clone()
        }
    }

    impl CacheInvalidator for RecordingInvalidator {
        fn invalidate(&self, key: &CacheKey) -> usize {
            self.keys.lock().unwrap().push(key.clone());
            1
        }

        fn is_stale(&self, key: &CacheKey) -> bool {
            self.keys.lock().unwrap().contains(key)
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn coordinator() -> (ReportViewCoordinator<RecordingInvalidator>, RecordingInvalidator) {
        let invalidator = RecordingInvalidator::default();
        let coordinator = ReportViewCoordinator::new(
            "abc123",
            invalidator.clone(),
            DatabaseSelector::new(),
            &ReportsConfig::default(),
        );
        (coordinator, invalidator)
    }

    fn load(report: &mut ReportViewCoordinator<RecordingInvalidator>) -> ApiReportParams {
        report.resolve_default_range(now()).unwrap();
        let params = report.dispatch().unwrap();
        report.complete(&params, Ok(ApiReportData::default()));
        params
    }

    #[test]
    fn test_default_range_is_last_hour() {
        let (mut report, _) = coordinator();
        assert_eq!(report.phase(), &ReportPhase::Initial);
        assert_eq!(report.report_query(), None);

        let range = report.resolve_default_range(now()).unwrap();
        assert_eq!(range.start(), now() - ChronoDuration::hours(1));
        assert_eq!(range.end(), now());
        assert_eq!(range.interval(), ChartInterval::OneMinute);
        assert_eq!(report.phase(), &ReportPhase::RangeSelected);
        assert!(report.needs_dispatch());
    }

    #[test]
    fn test_dispatch_and_complete() {
        let (mut report, _) = coordinator();
        report.resolve_default_range(now()).unwrap();

        let params = report.dispatch().unwrap();
        assert_eq!(params.filter_by, "realtime");
        assert_eq!(report.phase(), &ReportPhase::Loading);
        assert!(!report.needs_dispatch());

        assert!(report.complete(&params, Ok(ApiReportData::default())));
        assert_eq!(report.phase(), &ReportPhase::Loaded);

        report.dispatch();
        report.complete(&params, Err(ApiError::transport("gateway timeout")));
        assert_eq!(
            report.phase(),
            &ReportPhase::Error("gateway timeout".to_string())
        );
    }

    #[test]
    fn test_outdated_result_is_ignored() {
        let (mut report, _) = coordinator();
        report.resolve_default_range(now()).unwrap();
        let stale = report.dispatch().unwrap();

        report.add_filter(ReportFilter::new("status_code", FilterOperator::Is, "500"));
        let current = report.dispatch().unwrap();

        assert!(!report.complete(&stale, Ok(ApiReportData::default())));
        assert_eq!(report.phase(), &ReportPhase::Loading);
        assert!(report.complete(&current, Ok(ApiReportData::default())));
    }

    #[test]
    fn test_filter_changes_recompute_report_query() {
        let (mut report, _) = coordinator();
        report.resolve_default_range(now()).unwrap();
        report.dispatch();

        let errors = ReportFilter::new("status_code", FilterOperator::Is, "500");
        let path = ReportFilter::new("request.path", FilterOperator::StartsWith, "/realtime");
        assert!(report.add_filter(errors.clone()));
        assert!(report.add_filter(path.clone()));
        assert!(!report.add_filter(errors.clone()));
        assert!(report.needs_dispatch());
        assert_eq!(report.dispatch().unwrap().filters, vec![errors.clone(), path.clone()]);

        assert_eq!(report.remove_filter_keys(&["status_code"]), 1);
        assert!(report.needs_dispatch());
        assert_eq!(report.report_query().unwrap().filters, vec![path.clone()]);

        report.dispatch();
        assert_eq!(report.remove_filters(&[errors]), 0);
        assert!(!report.needs_dispatch());
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_invalidates_every_chart_for_exact_range() {
        let (mut report, invalidator) = coordinator();
        let range = report.resolve_default_range(now()).unwrap();
        let params = report.dispatch().unwrap();
        report.complete(&params, Ok(ApiReportData::default()));

        let refreshed = report.refresh().unwrap();
        assert_eq!(refreshed, params);
        assert_eq!(report.phase(), &ReportPhase::Refreshing);

        let expected: Vec<CacheKey> = report
            .chart_queries()
            .iter()
            .map(analytics_keys::infra_monitoring)
            .chain(std::iter::once(analytics_keys::api_report(&params)))
            .collect();
        assert_eq!(invalidator.keys(), expected);
        assert_eq!(
            report.chart_queries().len(),
            report
                .attributes()
                .iter()
                .map(|spec| spec.attributes.len())
                .sum::<usize>()
        );
        assert!(report.chart_queries().iter().all(|q| q.start_date == range.start()
            && q.end_date == range.end()
            && q.interval == range.interval()
            && q.database_identifier.is_none()));

        report.complete(&params, Ok(ApiReportData::default()));
        assert_eq!(report.phase(), &ReportPhase::Loaded);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_indicator_clears_after_delay() {
        let (mut report, _) = coordinator();
        load(&mut report);
        report.refresh();
        assert!(report.is_refreshing());

        tokio::time::sleep(std::time::Duration::from_millis(900)).await;
        assert!(report.is_refreshing());
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
        assert!(!report.is_refreshing());
    }

    #[tokio::test(start_paused = true)]
    async fn test_change_listener_runs_when_timers_fire() {
        let changes = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = changes.clone();
        let (report, _) = coordinator();
        let mut report = report.with_change_listener(Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        load(&mut report);

        report.refresh();
        assert_eq!(changes.load(Ordering::SeqCst), 0);
        tokio::time::sleep(std::time::Duration::from_millis(1100)).await;
        assert_eq!(changes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_refresh_without_range_does_nothing() {
        let (mut report, invalidator) = coordinator();
        assert_eq!(report.refresh(), None);
        assert!(!report.is_refreshing());
        assert!(invalidator.keys().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_only_from_settled_report() {
        let (mut report, invalidator) = coordinator();
        report.resolve_default_range(now()).unwrap();
        assert_eq!(report.refresh(), None);
        assert_eq!(report.phase(), &ReportPhase::RangeSelected);
        assert!(report.needs_dispatch());

        let params = report.dispatch().unwrap();
        assert_eq!(report.refresh(), None);
        assert_eq!(report.phase(), &ReportPhase::Loading);
        assert!(!report.is_refreshing());
        assert!(invalidator.keys().is_empty());

        report.complete(&params, Err(ApiError::transport("gateway timeout")));
        assert_eq!(report.refresh(), Some(params.clone()));
        assert_eq!(report.phase(), &ReportPhase::Refreshing);

        // A second click while refreshing is ignored too
        assert_eq!(report.refresh(), None);
    }

    #[test]
    fn test_network_traffic_section_hidden() {
        let (report, _) = coordinator();
        assert_eq!(report.hidden_reports(), &["networkTraffic"]);
        assert!(!report.shows_report_section("networkTraffic"));
        assert!(report.shows_report_section("totalRequests"));
    }

    #[test]
    fn test_upgrade_prompt_keeps_selected_range() {
        let (mut report, _) = coordinator();
        report.set_plan(PlanTier::Free);
        let initial = report.resolve_default_range(now()).unwrap();

        let prompted = report
            .handle_date_picker_change(DatePickerValue::Helper(DatePickerHelper::Last7Days), now())
            .unwrap();
        assert!(prompted);
        assert!(report.show_upgrade_prompt());
        assert_eq!(report.date_range(), Some(&initial));

        report.dismiss_upgrade_prompt();
        let prompted = report
            .handle_date_picker_change(DatePickerValue::Helper(DatePickerHelper::Last3Hours), now())
            .unwrap();
        assert!(!prompted);
        assert!(!report.show_upgrade_prompt());
        assert_eq!(report.date_range().unwrap().interval(), ChartInterval::FiveMinutes);
    }

    #[test]
    fn test_paid_plan_within_retention_has_no_prompt() {
        let (mut report, _) = coordinator();
        report.set_plan(PlanTier::Pro);
        let prompted = report
            .handle_date_picker_change(DatePickerValue::Helper(DatePickerHelper::Last7Days), now())
            .unwrap();
        assert!(!prompted);
        assert_eq!(
            report.date_range().unwrap().start(),
            now() - ChronoDuration::days(7)
        );
    }

    #[test]
    fn test_presets_at_retention_edge_mid_bucket() {
        let mid_bucket = Utc.with_ymd_and_hms(2026, 3, 1, 12, 15, 0).unwrap();

        let (mut free, _) = coordinator();
        free.set_plan(PlanTier::Free);
        let prompted = free
            .handle_date_picker_change(
                DatePickerValue::Helper(DatePickerHelper::Last24Hours),
                mid_bucket,
            )
            .unwrap();
        assert!(!prompted);
        assert!(!free.show_upgrade_prompt());
        assert_eq!(
            free.date_range().unwrap().start(),
            Utc.with_ymd_and_hms(2026, 2, 28, 12, 0, 0).unwrap()
        );

        let (mut pro, _) = coordinator();
        pro.set_plan(PlanTier::Pro);
        let prompted = pro
            .handle_date_picker_change(
                DatePickerValue::Helper(DatePickerHelper::Last7Days),
                mid_bucket,
            )
            .unwrap();
        assert!(!prompted);

        let prompted = pro
            .handle_date_picker_change(
                DatePickerValue::Helper(DatePickerHelper::Last14Days),
                mid_bucket,
            )
            .unwrap();
        assert!(prompted);
    }

    #[test]
    fn test_free_plan_hides_latency_charts() {
        let (mut report, _) = coordinator();
        let all = report.visible_attributes().len();
        report.set_plan(PlanTier::Free);
        assert_eq!(report.visible_attributes().len(), all - 3);
        assert_eq!(report.attributes().len(), all);
    }

    #[test]
    fn test_chart_zoom_skips_plan_gating() {
        let (mut report, _) = coordinator();
        report.set_plan(PlanTier::Free);
        report
            .update_date_range("2026-02-01T00:00:00Z", "2026-02-01T02:00:00Z")
            .unwrap();
        assert_eq!(report.date_range().unwrap().interval(), ChartInterval::FiveMinutes);
        assert!(!report.show_upgrade_prompt());
        assert!(report.update_date_range("yesterday", "today").is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_url_params_apply_once_after_delays() {
        let selector = DatabaseSelector::new();
        let mut report = ReportViewCoordinator::new(
            "abc123",
            RecordingInvalidator::default(),
            selector.clone(),
            &ReportsConfig::default(),
        )
        .with_url_params(ReportUrlParams {
            project_ref: "abc123".into(),
            report: "realtime".into(),
            db: Some("abc123-rr".into()),
            chart: Some("channel-events".into()),
        });

        report.on_mount();
        tokio::time::sleep(std::time::Duration::from_millis(150)).await;
        assert_eq!(selector.selected().as_deref(), Some("abc123-rr"));
        assert_eq!(report.focused_chart(), None);

        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        assert_eq!(report.focused_chart().as_deref(), Some("channel-events"));

        selector.select(None);
        report.on_mount();
        tokio::time::sleep(std::time::Duration::from_millis(300)).await;
        assert_eq!(selector.selected(), None);

        report.resolve_default_range(now()).unwrap();
        selector.select(Some("abc123-rr".into()));
        assert!(report
            .chart_queries()
            .iter()
            .all(|q| q.database_identifier.as_deref() == Some("abc123-rr")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unmount_cancels_pending_timers() {
        let selector = DatabaseSelector::new();
        let mut report = ReportViewCoordinator::new(
            "abc123",
            RecordingInvalidator::default(),
            selector.clone(),
            &ReportsConfig::default(),
        )
        .with_url_params(ReportUrlParams {
            project_ref: "abc123".into(),
            report: "realtime".into(),
            db: Some("abc123-rr".into()),
            chart: None,
        });
        load(&mut report);

        report.on_mount();
        report.refresh();
        assert_eq!(report.unmount(), 2);

        tokio::time::sleep(std::time::Duration::from_secs(2)).await;
        assert_eq!(selector.selected(), None);
        assert!(report.is_refreshing());
    }
}
