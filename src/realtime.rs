//! Chart definitions of the Realtime report

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ChartStyle {
    Line,
    Bar,
    StackedAreaLine,
}

/// Backend serving a metric attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MetricProvider {
    InfraMonitoring,
}

/// One series plotted by a chart
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MultiAttribute {
    pub attribute: &'static str,
    pub provider: MetricProvider,
    pub label: &'static str,
}

/// A chart of the report: identity, plotted series and display hints
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportAttributeSpec {
    pub id: &'static str,
    pub label: &'static str,
    pub attributes: Vec<MultiAttribute>,
    pub hide: bool,
    pub show_tooltip: bool,
    pub show_legend: bool,
    pub hide_chart_type: bool,
    pub default_chart_style: ChartStyle,
}

fn chart(
    id: &'static str,
    label: &'static str,
    style: ChartStyle,
    attributes: &[(&'static str, &'static str)],
) -> ReportAttributeSpec {
    ReportAttributeSpec {
        id,
        label,
        attributes: attributes
            .iter()
            .map(|&(attribute, label)| MultiAttribute {
                attribute,
                provider: MetricProvider::InfraMonitoring,
                label,
            })
            .collect(),
        hide: false,
        show_tooltip: true,
        show_legend: attributes.len() > 1,
        hide_chart_type: false,
        default_chart_style: style,
    }
}

/// Charts of the Realtime report. On the free plan the latency charts are hidden; they
/// stay in the list so a manual refresh still covers them.
pub fn realtime_report_attributes(is_free_plan: bool) -> Vec<ReportAttributeSpec> {
    let premium = |mut spec: ReportAttributeSpec| {
        spec.hide = is_free_plan;
        spec
    };

    vec![
        chart(
            "client-connections",
            "Connected Clients",
            ChartStyle::Line,
            &[("realtime_connections_connected", "Connections")],
        ),
        chart(
            "channel-events",
            "Channel Events",
            ChartStyle::StackedAreaLine,
            &[
                ("realtime_channel_events", "Events"),
                ("realtime_channel_presence_events", "Presence events"),
                ("realtime_channel_db_events", "Postgres changes events"),
            ],
        ),
        chart(
            "rate-of-channel-joins",
            "Rate of Channel Joins",
            ChartStyle::Bar,
            &[("realtime_channel_joins", "Joins per second")],
        ),
        chart(
            "message-payload-size",
            "Message Payload Size",
            ChartStyle::Line,
            &[("realtime_payload_size", "Payload size")],
        ),
        premium(chart(
            "broadcast-latency",
            "Broadcast Latency",
            ChartStyle::Line,
            &[("realtime_sends_latency", "Latency")],
        )),
        premium(chart(
            "postgres-changes-latency",
            "Postgres Changes Latency",
            ChartStyle::Line,
            &[("realtime_replication_connection_lag", "Replication lag")],
        )),
        premium(chart(
            "authorization-latency",
            "RLS Authorization Latency",
            ChartStyle::Line,
            &[("realtime_authorization_rls_execution_time", "Execution time")],
        )),
    ]
}

/// The charts that are actually rendered
pub fn visible_report_attributes(specs: &[ReportAttributeSpec]) -> Vec<&ReportAttributeSpec> {
    specs.iter().filter(|spec| !spec.hide).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_plan_hides_premium_charts() {
        let free = realtime_report_attributes(true);
        let paid = realtime_report_attributes(false);

        assert_eq!(free.len(), paid.len());
        assert_eq!(visible_report_attributes(&paid).len(), paid.len());
        assert_eq!(visible_report_attributes(&free).len(), paid.len() - 3);
        assert!(
            visible_report_attributes(&free)
                .iter()
                .all(|spec| !spec.id.ends_with("latency"))
        );
    }

    #[test]
    fn test_chart_ids_are_unique() {
        let specs = realtime_report_attributes(false);
        let mut ids: Vec<_> = specs.iter().map(|s| s.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), specs.len());
    }
}
