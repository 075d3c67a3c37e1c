// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of MeterFlow.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use meterflow_types::{EngineConfig, NormalizedSample, RawSample};
use tracing::debug;

use crate::error::{EngineError, EngineResult};

/// Explicit datetime format used by the broker's interval readings
const BROKER_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse a civil datetime string in the fixed timezone.
///
/// Tries the broker's explicit format first, then falls back to a general
/// ISO 8601 parse before giving up. Timestamps that fall into a DST gap do
/// not exist in the civil timezone and are treated as malformed.
pub fn parse_civil_timestamp(raw: &str, timezone: Tz) -> EngineResult<DateTime<Tz>> {
    let malformed = || EngineError::MalformedTimestamp {
        raw: raw.to_owned(),
    };

    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, BROKER_DATETIME_FORMAT) {
        return timezone
            .from_local_datetime(&naive)
            .earliest()
            .ok_or_else(malformed);
    }

    // ISO 8601 with explicit offset ("2024-01-01T23:30:00+01:00")
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&timezone));
    }

    // ISO 8601 without offset ("2024-01-01T23:30:00")
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return timezone
            .from_local_datetime(&naive)
            .earliest()
            .ok_or_else(malformed);
    }

    Err(malformed())
}

/// Convert a raw end-of-interval reading into the canonical
/// `{start, end, value}` record.
///
/// `start = end - interval_length` with the configured default interval when
/// the broker omits it. Missing, NaN and negative values are rejected. Pure,
/// no side effects.
pub fn normalize_sample(raw: &RawSample, config: &EngineConfig) -> EngineResult<NormalizedSample> {
    let value = raw.value.ok_or_else(|| EngineError::InvalidValue {
        reason: "missing value".to_owned(),
    })?;

    if !value.is_finite() {
        return Err(EngineError::InvalidValue {
            reason: format!("non-finite value {value}"),
        });
    }

    if value < 0.0 {
        return Err(EngineError::InvalidValue {
            reason: format!("negative value {value}"),
        });
    }

    let interval_minutes = raw
        .interval_length_minutes
        .unwrap_or(config.default_interval_minutes);
    if interval_minutes == 0 {
        return Err(EngineError::InvalidInterval { minutes: 0 });
    }

    let end = parse_civil_timestamp(&raw.end_timestamp, config.timezone)?;
    let start = end - Duration::minutes(i64::from(interval_minutes));

    Ok(NormalizedSample {
        start,
        end,
        value,
        off_peak: raw.off_peak,
    })
}

/// Trailing cutoff instant: end of yesterday in the civil timezone.
///
/// The broker is known to lag by 1-2 days, so anything starting after this
/// instant is either not yet consolidated or bogus.
pub fn default_cutoff(config: &EngineConfig) -> DateTime<Tz> {
    let now = Utc::now().with_timezone(&config.timezone);
    match at_midnight(now.date_naive(), config.timezone) {
        Some(start_of_today) => start_of_today - Duration::days(config.cutoff_lag_days - 1),
        None => now,
    }
}

/// Midnight of `date` in `timezone`; `None` only if midnight falls into a
/// DST gap, which no real-world zone does
pub(crate) fn at_midnight(date: NaiveDate, timezone: Tz) -> Option<DateTime<Tz>> {
    date.and_hms_opt(0, 0, 0)
        .and_then(|naive| timezone.from_local_datetime(&naive).earliest())
}

/// Normalize a batch of raw samples, dropping everything that cannot be
/// trusted: null/NaN/negative values, unparseable timestamps and samples
/// starting strictly after the cutoff.
///
/// Returns an empty vector (never an error) when nothing survives; callers
/// must treat an empty result as a valid, low-information outcome. Output
/// order is not guaranteed; use [`sort_chronological`] when order matters.
pub fn filter_valid(
    samples: &[RawSample],
    config: &EngineConfig,
    cutoff: Option<DateTime<Tz>>,
) -> Vec<NormalizedSample> {
    let cutoff = cutoff.unwrap_or_else(|| default_cutoff(config));

    samples
        .iter()
        .filter_map(|raw| match normalize_sample(raw, config) {
            Ok(sample) if sample.start > cutoff => None,
            Ok(sample) => Some(sample),
            Err(err) => {
                debug!("Skipping sample at '{}': {}", raw.end_timestamp, err);
                None
            }
        })
        .collect()
}

/// Sort samples by interval start, oldest first
pub fn sort_chronological(samples: &mut [NormalizedSample]) {
    samples.sort_by(|a, b| a.start.cmp(&b.start));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> EngineConfig {
        EngineConfig::default()
    }

    fn far_cutoff(cfg: &EngineConfig) -> DateTime<Tz> {
        parse_civil_timestamp("2030-01-01 00:00:00", cfg.timezone).unwrap()
    }

    #[test]
    fn test_normalize_default_interval() {
        let cfg = config();
        let raw = RawSample::new("2024-01-01 12:00:00", Some(1.5));
        let sample = normalize_sample(&raw, &cfg).unwrap();

        assert_eq!(sample.interval_minutes(), 30);
        assert_eq!(
            sample.end - sample.start,
            Duration::minutes(i64::from(cfg.default_interval_minutes))
        );
        assert_eq!(sample.end.format("%H:%M").to_string(), "12:00");
        assert_eq!(sample.start.format("%H:%M").to_string(), "11:30");
    }

    #[test]
    fn test_normalize_explicit_interval() {
        let raw = RawSample {
            end_timestamp: "2024-01-01 12:00:00".to_owned(),
            interval_length_minutes: Some(60),
            value: Some(2.0),
            off_peak: None,
        };
        let sample = normalize_sample(&raw, &config()).unwrap();
        assert_eq!(sample.interval_minutes(), 60);
    }

    #[test]
    fn test_normalize_iso_fallback() {
        let cfg = config();
        let with_t = normalize_sample(&RawSample::new("2024-01-01T12:00:00", Some(1.0)), &cfg);
        assert!(with_t.is_ok());

        let with_offset = normalize_sample(
            &RawSample::new("2024-01-01T12:00:00+01:00", Some(1.0)),
            &cfg,
        )
        .unwrap();
        // Paris is UTC+1 in January, so the civil time is unchanged
        assert_eq!(with_offset.end.format("%H:%M").to_string(), "12:00");
    }

    #[test]
    fn test_normalize_malformed_timestamp() {
        let result = normalize_sample(&RawSample::new("not a date", Some(1.0)), &config());
        assert!(matches!(
            result,
            Err(EngineError::MalformedTimestamp { .. })
        ));
    }

    #[test]
    fn test_normalize_rejects_bad_values() {
        let cfg = config();
        for bad in [None, Some(f32::NAN), Some(f32::INFINITY), Some(-1.0)] {
            let result = normalize_sample(&RawSample::new("2024-01-01 12:00:00", bad), &cfg);
            assert!(matches!(result, Err(EngineError::InvalidValue { .. })));
        }
    }

    #[test]
    fn test_filter_drops_invalid_and_late_samples() {
        let cfg = config();
        let cutoff = parse_civil_timestamp("2024-06-01 00:00:00", cfg.timezone).unwrap();

        let samples = vec![
            RawSample::new("2024-05-31 10:00:00", Some(1.0)),
            RawSample::new("2024-05-31 10:30:00", None),
            RawSample::new("garbage", Some(1.0)),
            // Starts after the cutoff, must be dropped
            RawSample::new("2024-06-02 10:00:00", Some(1.0)),
        ];

        let filtered = filter_valid(&samples, &cfg, Some(cutoff));
        assert_eq!(filtered.len(), 1);
        assert!((filtered[0].value - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_filter_boundary_is_strict() {
        let cfg = config();
        let cutoff = parse_civil_timestamp("2024-06-01 00:00:00", cfg.timezone).unwrap();

        // Starts exactly at the cutoff: kept (only strictly-after is dropped)
        let samples = vec![RawSample::new("2024-06-01 00:30:00", Some(1.0))];
        let filtered = filter_valid(&samples, &cfg, Some(cutoff));
        assert_eq!(filtered.len(), 1);
    }

    #[test]
    fn test_filter_all_invalid_yields_empty() {
        let cfg = config();
        let samples = vec![
            RawSample::new("2024-05-31 10:00:00", None),
            RawSample::new("bogus", Some(1.0)),
        ];
        let filtered = filter_valid(&samples, &cfg, Some(far_cutoff(&cfg)));
        assert!(filtered.is_empty());
    }

    #[test]
    fn test_filter_idempotent() {
        let cfg = config();
        let cutoff = far_cutoff(&cfg);

        let samples = vec![
            RawSample::new("2024-05-31 10:00:00", Some(1.0)),
            RawSample::new("2024-05-31 10:30:00", Some(2.0)),
            RawSample::new("2024-05-31 11:00:00", None),
        ];

        let once = filter_valid(&samples, &cfg, Some(cutoff));

        // Re-emit the surviving samples as raw and filter again with the
        // same cutoff: nothing further may change
        let roundtrip: Vec<RawSample> = once
            .iter()
            .map(|s| RawSample {
                end_timestamp: s.end.format(BROKER_DATETIME_FORMAT).to_string(),
                interval_length_minutes: Some(s.interval_minutes() as u32),
                value: Some(s.value),
                off_peak: s.off_peak,
            })
            .collect();
        let twice = filter_valid(&roundtrip, &cfg, Some(cutoff));

        assert_eq!(once, twice);
    }

    #[test]
    fn test_sort_chronological() {
        let cfg = config();
        let samples = vec![
            RawSample::new("2024-05-31 11:00:00", Some(3.0)),
            RawSample::new("2024-05-31 10:00:00", Some(1.0)),
            RawSample::new("2024-05-31 10:30:00", Some(2.0)),
        ];
        let mut filtered = filter_valid(&samples, &cfg, Some(far_cutoff(&cfg)));
        sort_chronological(&mut filtered);

        let values: Vec<f32> = filtered.iter().map(|s| s.value).collect();
        assert_eq!(values, vec![1.0, 2.0, 3.0]);
    }
}
