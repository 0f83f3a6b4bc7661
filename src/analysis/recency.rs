use crate::error::{ReportError, ReportResult};
use crate::models::combined::Cell;
use crate::models::project::CommitTimestamp;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Formats with an explicit offset, tried in order.
const OFFSET_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%:z", "%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%z"];

/// Formats without an offset; read as UTC.
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"];

/// Parse a snapshot timestamp into UTC.
/// Accepts `YYYY-MM-DD HH:MM:SS±HH:MM`, RFC 3339, offset-less values (UTC),
/// a trailing ` UTC` suffix and bare dates (midnight UTC).
pub fn parse_timestamp(value: &str) -> ReportResult<DateTime<Utc>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ReportError::unparseable_timestamp(value));
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(ts.with_timezone(&Utc));
    }

    for format in OFFSET_FORMATS {
        if let Ok(ts) = DateTime::parse_from_str(trimmed, format) {
            return Ok(ts.with_timezone(&Utc));
        }
    }

    let naive_part = trimmed.strip_suffix(" UTC").unwrap_or(trimmed);
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(naive_part, format) {
            return Ok(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(naive_part, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }

    Err(ReportError::unparseable_timestamp(value))
}

/// Read the optional `last_commit_date` column. Blank is missing; garbage is
/// kept as invalid rather than failing the whole load.
pub fn parse_commit_timestamp(raw: Option<&str>) -> CommitTimestamp {
    match raw.map(str::trim) {
        None | Some("") => CommitTimestamp::Missing,
        Some(value) => match parse_timestamp(value) {
            Ok(ts) => CommitTimestamp::At(ts),
            Err(err) => {
                log::warn!("{err}; last commit marked invalid");
                CommitTimestamp::Invalid(value.to_string())
            }
        },
    }
}

/// Whole days between the last commit and `now`, both in UTC.
pub fn days_since_last_commit(last_commit: &CommitTimestamp, now: DateTime<Utc>) -> Cell<i64> {
    match last_commit {
        CommitTimestamp::At(ts) => Cell::Value(now.signed_duration_since(*ts).num_days()),
        CommitTimestamp::Missing => Cell::NoData,
        CommitTimestamp::Invalid(_) => Cell::InvalidDate,
    }
}
