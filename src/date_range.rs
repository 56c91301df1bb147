//! Date ranges and chart bucketing for reports

use chrono::{DateTime, Duration, DurationRound, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DateRangeError {
    #[error("Range start {start} is after its end {end}")]
    StartAfterEnd {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("Interval {interval} does not evenly divide the range")]
    UnevenInterval { interval: ChartInterval },

    #[error("Invalid timestamp '{0}'")]
    InvalidTimestamp(String),
}

/// Bucket width used when plotting a range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChartInterval {
    #[serde(rename = "1m")]
    OneMinute,
    #[serde(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "10m")]
    TenMinutes,
    #[serde(rename = "30m")]
    ThirtyMinutes,
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "1d")]
    OneDay,
}

impl ChartInterval {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartInterval::OneMinute => "1m",
            ChartInterval::FiveMinutes => "5m",
            ChartInterval::TenMinutes => "10m",
            ChartInterval::ThirtyMinutes => "30m",
            ChartInterval::OneHour => "1h",
            ChartInterval::OneDay => "1d",
        }
    }

    pub fn duration(&self) -> Duration {
        match self {
            ChartInterval::OneMinute => Duration::minutes(1),
            ChartInterval::FiveMinutes => Duration::minutes(5),
            ChartInterval::TenMinutes => Duration::minutes(10),
            ChartInterval::ThirtyMinutes => Duration::minutes(30),
            ChartInterval::OneHour => Duration::hours(1),
            ChartInterval::OneDay => Duration::days(1),
        }
    }

    /// Picks the bucket width for a range of the given length
    pub fn for_span(span: Duration) -> Self {
        let hours = span.num_seconds() as f64 / 3600.0;
        if hours < 1.1 {
            ChartInterval::OneMinute
        } else if hours < 3.1 {
            ChartInterval::FiveMinutes
        } else if hours < 6.1 {
            ChartInterval::TenMinutes
        } else if hours < 25.0 {
            ChartInterval::ThirtyMinutes
        } else if hours < 7.1 * 24.0 {
            ChartInterval::OneHour
        } else {
            ChartInterval::OneDay
        }
    }
}

impl std::fmt::Display for ChartInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A closed time range plotted in buckets of `interval`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    interval: ChartInterval,
}

impl DateRange {
    /// Creates a range whose bounds already sit on bucket boundaries of `interval`.
    pub fn new(
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        interval: ChartInterval,
    ) -> Result<Self, DateRangeError> {
        if start > end {
            return Err(DateRangeError::StartAfterEnd { start, end });
        }
        let step = interval.duration().num_seconds();
        if (end - start).num_seconds() % step != 0 {
            return Err(DateRangeError::UnevenInterval { interval });
        }
        Ok(Self {
            start,
            end,
            interval,
        })
    }

    /// Creates a range covering `[start, end]`, widened outwards to bucket boundaries.
    pub fn aligned(
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        interval: ChartInterval,
    ) -> Result<Self, DateRangeError> {
        if start > end {
            return Err(DateRangeError::StartAfterEnd { start, end });
        }
        let step = interval.duration();
        let floor = |t: DateTime<Utc>| t.duration_trunc(step).unwrap_or(t);
        let aligned_start = floor(start);
        let mut aligned_end = floor(end);
        if aligned_end < end {
            aligned_end += step;
        }
        Self::new(aligned_start, aligned_end, interval)
    }

    /// Creates an aligned range, picking the interval from the range length.
    pub fn with_granularity(
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Self, DateRangeError> {
        let interval = ChartInterval::for_span(end - start);
        Self::aligned(start, end, interval)
    }

    /// Parses two RFC 3339 timestamps, as emitted by chart zoom selections.
    pub fn parse(from: &str, to: &str) -> Result<Self, DateRangeError> {
        let parse = |s: &str| {
            DateTime::parse_from_rfc3339(s)
                .map(|t| t.with_timezone(&Utc))
                .map_err(|_| DateRangeError::InvalidTimestamp(s.to_string()))
        };
        Self::with_granularity(parse(from)?, parse(to)?)
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn interval(&self) -> ChartInterval {
        self.interval
    }

    pub fn span(&self) -> Duration {
        self.end - self.start
    }

    /// Number of chart buckets in the range
    pub fn bucket_count(&self) -> i64 {
        self.span().num_seconds() / self.interval.duration().num_seconds()
    }
}

/// Relative date presets offered by the report date picker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DatePickerHelper {
    #[serde(rename = "last_10_minutes")]
    Last10Minutes,
    #[serde(rename = "last_30_minutes")]
    Last30Minutes,
    #[serde(rename = "last_60_minutes")]
    Last60Minutes,
    #[serde(rename = "last_3_hours")]
    Last3Hours,
    #[serde(rename = "last_24_hours")]
    Last24Hours,
    #[serde(rename = "last_7_days")]
    Last7Days,
    #[serde(rename = "last_14_days")]
    Last14Days,
    #[serde(rename = "last_28_days")]
    Last28Days,
}

impl DatePickerHelper {
    pub const ALL: [DatePickerHelper; 8] = [
        DatePickerHelper::Last10Minutes,
        DatePickerHelper::Last30Minutes,
        DatePickerHelper::Last60Minutes,
        DatePickerHelper::Last3Hours,
        DatePickerHelper::Last24Hours,
        DatePickerHelper::Last7Days,
        DatePickerHelper::Last14Days,
        DatePickerHelper::Last28Days,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            DatePickerHelper::Last10Minutes => "Last 10 minutes",
            DatePickerHelper::Last30Minutes => "Last 30 minutes",
            DatePickerHelper::Last60Minutes => "Last 60 minutes",
            DatePickerHelper::Last3Hours => "Last 3 hours",
            DatePickerHelper::Last24Hours => "Last 24 hours",
            DatePickerHelper::Last7Days => "Last 7 days",
            DatePickerHelper::Last14Days => "Last 14 days",
            DatePickerHelper::Last28Days => "Last 28 days",
        }
    }

    pub fn lookback(&self) -> Duration {
        match self {
            DatePickerHelper::Last10Minutes => Duration::minutes(10),
            DatePickerHelper::Last30Minutes => Duration::minutes(30),
            DatePickerHelper::Last60Minutes => Duration::minutes(60),
            DatePickerHelper::Last3Hours => Duration::hours(3),
            DatePickerHelper::Last24Hours => Duration::hours(24),
            DatePickerHelper::Last7Days => Duration::days(7),
            DatePickerHelper::Last14Days => Duration::days(14),
            DatePickerHelper::Last28Days => Duration::days(28),
        }
    }

    /// Resolves the preset against `now`
    pub fn resolve(&self, now: DateTime<Utc>) -> Result<DateRange, DateRangeError> {
        DateRange::with_granularity(now - self.lookback(), now)
    }
}

/// Value submitted by the date picker: either a preset or explicit bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePickerValue {
    Helper(DatePickerHelper),
    Absolute {
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    },
}

impl DatePickerValue {
    pub fn resolve(&self, now: DateTime<Utc>) -> Result<DateRange, DateRangeError> {
        match self {
            DatePickerValue::Helper(helper) => helper.resolve(now),
            DatePickerValue::Absolute { from, to } => DateRange::with_granularity(*from, *to),
        }
    }

    /// Start asked for by the user, before widening to a bucket boundary
    pub fn requested_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            DatePickerValue::Helper(helper) => now - helper.lookback(),
            DatePickerValue::Absolute { from, .. } => *from,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, h, m, s).unwrap()
    }

    #[test]
    fn test_new_rejects_inverted_range() {
        let err = DateRange::new(at(12, 0, 0), at(11, 0, 0), ChartInterval::OneMinute);
        assert!(matches!(err, Err(DateRangeError::StartAfterEnd { .. })));
    }

    #[test]
    fn test_new_rejects_uneven_interval() {
        let err = DateRange::new(at(12, 0, 0), at(12, 7, 0), ChartInterval::FiveMinutes);
        assert_eq!(
            err,
            Err(DateRangeError::UnevenInterval {
                interval: ChartInterval::FiveMinutes
            })
        );
    }

    #[test]
    fn test_aligned_widens_to_boundaries() {
        let range =
            DateRange::aligned(at(12, 3, 20), at(12, 57, 10), ChartInterval::FiveMinutes).unwrap();
        assert_eq!(range.start(), at(12, 0, 0));
        assert_eq!(range.end(), at(13, 0, 0));
        assert_eq!(range.bucket_count(), 12);
    }

    #[test]
    fn test_granularity_by_span() {
        assert_eq!(
            ChartInterval::for_span(Duration::minutes(60)),
            ChartInterval::OneMinute
        );
        assert_eq!(
            ChartInterval::for_span(Duration::hours(3)),
            ChartInterval::FiveMinutes
        );
        assert_eq!(
            ChartInterval::for_span(Duration::hours(24)),
            ChartInterval::ThirtyMinutes
        );
        assert_eq!(
            ChartInterval::for_span(Duration::days(7)),
            ChartInterval::OneHour
        );
        assert_eq!(
            ChartInterval::for_span(Duration::days(28)),
            ChartInterval::OneDay
        );
    }

    #[test]
    fn test_helper_resolves_last_hour() {
        let range = DatePickerHelper::Last60Minutes
            .resolve(at(12, 30, 0))
            .unwrap();
        assert_eq!(range.start(), at(11, 30, 0));
        assert_eq!(range.end(), at(12, 30, 0));
        assert_eq!(range.interval(), ChartInterval::OneMinute);
    }

    #[test]
    fn test_requested_start_is_not_aligned() {
        let now = at(12, 15, 0);
        let value = DatePickerValue::Helper(DatePickerHelper::Last24Hours);
        assert_eq!(value.requested_start(now), now - Duration::hours(24));
        assert!(value.resolve(now).unwrap().start() < value.requested_start(now));

        let from = at(9, 7, 0);
        let absolute = DatePickerValue::Absolute { from, to: now };
        assert_eq!(absolute.requested_start(now), from);
    }

    #[test]
    fn test_parse_zoom_selection() {
        let range = DateRange::parse("2026-03-01T10:00:00Z", "2026-03-01T12:00:00Z").unwrap();
        assert_eq!(range.interval(), ChartInterval::FiveMinutes);
        assert!(matches!(
            DateRange::parse("yesterday", "2026-03-01T12:00:00Z"),
            Err(DateRangeError::InvalidTimestamp(_))
        ));
    }
}
