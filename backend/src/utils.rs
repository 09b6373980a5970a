use crate::models::UploadPeriod;
use chrono::{DateTime, Months, SecondsFormat, Utc};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref ISO8601_DURATION: Regex =
        Regex::new(r"^P(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?)?$")
            .expect("duration pattern is valid");
}

/// Parse ISO8601 duration string (PT1H2M3S) to total seconds.
/// Anything that does not parse counts as zero.
pub fn parse_iso8601_duration_to_seconds(duration_str: &str) -> u64 {
    let Some(captures) = ISO8601_DURATION.captures(duration_str.trim()) else {
        return 0;
    };

    let part = |index: usize| -> u64 {
        captures
            .get(index)
            .and_then(|m| m.as_str().parse::<u64>().ok())
            .unwrap_or(0)
    };

    part(1)
        .saturating_mul(86_400)
        .saturating_add(part(2).saturating_mul(3_600))
        .saturating_add(part(3).saturating_mul(60))
        .saturating_add(part(4))
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Lower bound for `publishedAfter`, counted back from `now` in calendar months.
pub fn published_after(period: UploadPeriod, now: DateTime<Utc>) -> Option<String> {
    let months = period.months()?;
    now.checked_sub_months(Months::new(months))
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
}
