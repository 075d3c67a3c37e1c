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

use chrono::{Datelike, Timelike};
use meterflow_types::{HourlyProfilePoint, NormalizedSample, WeekdayCompleteness};
use std::collections::BTreeMap;

/// Sentinel reported instead of a time-of-day when a weekday bucket is empty
pub const EMPTY_BUCKET_SENTINEL: &str = "—";

/// Group normalized samples by ISO weekday (1 = Monday .. 7 = Sunday) of
/// their *start* instant, independent of calendar date.
///
/// Classification deliberately keys on `start`, not `end`: a sample ending
/// at 00:00 on Tuesday covers 23:30-24:00 of Monday and belongs to Monday's
/// profile.
pub fn bucket_by_weekday(samples: &[NormalizedSample]) -> BTreeMap<u8, Vec<NormalizedSample>> {
    let mut buckets: BTreeMap<u8, Vec<NormalizedSample>> = BTreeMap::new();
    for sample in samples {
        let weekday = sample.start.weekday().number_from_monday() as u8;
        buckets.entry(weekday).or_default().push(sample.clone());
    }
    buckets
}

/// Compute the per-weekday data-quality signal: sample count plus the
/// earliest and latest time-of-day observed among sample starts.
///
/// All seven weekdays are always reported; an empty bucket gets the
/// [`EMPTY_BUCKET_SENTINEL`] instead of a time, never an error.
pub fn audit_completeness(
    buckets: &BTreeMap<u8, Vec<NormalizedSample>>,
) -> Vec<WeekdayCompleteness> {
    (1..=7)
        .map(|weekday| {
            let bucket = buckets.get(&weekday).map(Vec::as_slice).unwrap_or(&[]);
            if bucket.is_empty() {
                return WeekdayCompleteness {
                    weekday,
                    count: 0,
                    min_time_of_day: EMPTY_BUCKET_SENTINEL.to_owned(),
                    max_time_of_day: EMPTY_BUCKET_SENTINEL.to_owned(),
                };
            }

            let mut min_time = bucket[0].start.time();
            let mut max_time = min_time;
            for sample in bucket {
                let time = sample.start.time();
                min_time = min_time.min(time);
                max_time = max_time.max(time);
            }

            WeekdayCompleteness {
                weekday,
                count: bucket.len(),
                min_time_of_day: min_time.format("%H:%M").to_string(),
                max_time_of_day: max_time.format("%H:%M").to_string(),
            }
        })
        .collect()
}

/// Average power per (weekday, hour-of-day) cell, for the load-profile
/// heatmap. Classified on `start` like the weekday buckets.
pub fn hourly_profile(samples: &[NormalizedSample]) -> Vec<HourlyProfilePoint> {
    let mut cells: BTreeMap<(u8, u8), (f32, usize)> = BTreeMap::new();

    for sample in samples {
        let weekday = sample.start.weekday().number_from_monday() as u8;
        let hour = sample.start.hour() as u8;
        let cell = cells.entry((weekday, hour)).or_insert((0.0, 0));
        cell.0 += sample.value;
        cell.1 += 1;
    }

    cells
        .into_iter()
        .map(|((weekday, hour), (sum, count))| HourlyProfilePoint {
            weekday,
            hour,
            avg_power_kw: sum / count as f32,
            sample_count: count,
        })
        .collect()
}
