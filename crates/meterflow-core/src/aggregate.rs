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

//! Rolls normalized samples into energy totals at hour/day/week/month
//! granularity.
//!
//! Two entry points, never conflated: [`aggregate_power`] for the load-curve
//! feed (kW × interval duration) and [`aggregate_energy`] for the daily
//! consumption feed (values already in kWh, no duration multiplication).

use chrono::{DateTime, Datelike, Days, NaiveDate, TimeZone, Timelike};
use chrono_tz::Tz;
use meterflow_types::{
    AggregateBucket, Granularity, MonthlyAggregate, NormalizedSample, WeeklyAggregate,
};
use std::collections::BTreeMap;

use crate::normalize::at_midnight;

/// Aggregate load-curve samples (kW) into energy buckets.
///
/// Energy per sample is `power_kw * interval_hours`; summing the resulting
/// hour buckets of a day reproduces the day bucket exactly.
pub fn aggregate_power(
    samples: &[NormalizedSample],
    granularity: Granularity,
) -> Vec<AggregateBucket> {
    aggregate_with(samples, granularity, |s| s.value * s.interval_hours())
}

/// Aggregate the daily consumption feed, whose values are already kWh.
pub fn aggregate_energy(
    samples: &[NormalizedSample],
    granularity: Granularity,
) -> Vec<AggregateBucket> {
    aggregate_with(samples, granularity, |s| s.value)
}

struct BucketAcc {
    bucket_start: DateTime<Tz>,
    energy_kwh: f32,
    peak_energy_kwh: f32,
    off_peak_energy_kwh: f32,
    sample_count: usize,
    max_power_kw: f32,
    min_power_kw: f32,
    power_sum_kw: f32,
    saw_tariff_flag: bool,
    all_off_peak: bool,
}

impl BucketAcc {
    fn new(bucket_start: DateTime<Tz>) -> Self {
        Self {
            bucket_start,
            energy_kwh: 0.0,
            peak_energy_kwh: 0.0,
            off_peak_energy_kwh: 0.0,
            sample_count: 0,
            max_power_kw: f32::MIN,
            min_power_kw: f32::MAX,
            power_sum_kw: 0.0,
            saw_tariff_flag: false,
            all_off_peak: true,
        }
    }

    fn fold(&mut self, sample: &NormalizedSample, energy_kwh: f32) {
        self.energy_kwh += energy_kwh;
        // Samples without a tariff flag count as peak (the base tariff);
        // the AND-fold below keeps mixed buckets from reading as cheap
        if sample.off_peak == Some(true) {
            self.off_peak_energy_kwh += energy_kwh;
        } else {
            self.peak_energy_kwh += energy_kwh;
        }
        self.saw_tariff_flag |= sample.off_peak.is_some();
        self.all_off_peak &= sample.off_peak == Some(true);

        self.sample_count += 1;
        self.max_power_kw = self.max_power_kw.max(sample.value);
        self.min_power_kw = self.min_power_kw.min(sample.value);
        self.power_sum_kw += sample.value;
    }

    fn finish(self, key: String) -> AggregateBucket {
        AggregateBucket {
            key,
            bucket_start: self.bucket_start,
            energy_kwh: self.energy_kwh,
            peak_energy_kwh: self.peak_energy_kwh,
            off_peak_energy_kwh: self.off_peak_energy_kwh,
            sample_count: self.sample_count,
            max_power_kw: self.max_power_kw,
            min_power_kw: self.min_power_kw,
            avg_power_kw: self.power_sum_kw / self.sample_count as f32,
            all_off_peak: self.saw_tariff_flag.then_some(self.all_off_peak),
        }
    }
}

fn aggregate_with(
    samples: &[NormalizedSample],
    granularity: Granularity,
    energy_of: impl Fn(&NormalizedSample) -> f32,
) -> Vec<AggregateBucket> {
    let mut buckets: BTreeMap<String, BucketAcc> = BTreeMap::new();

    for sample in samples {
        let (key, bucket_start) = bucket_key(sample.start, granularity);
        buckets
            .entry(key)
            .or_insert_with(|| BucketAcc::new(bucket_start))
            .fold(sample, energy_of(sample));
    }

    buckets
        .into_iter()
        .map(|(key, acc)| acc.finish(key))
        .collect()
}

/// Bucket key and bucket start for a sample, keyed on the sample's `start`.
///
/// - hour: start of the containing civil hour
/// - day: civil date
/// - week: ISO week (Monday start, first week contains the first Thursday),
///   keyed "%G-W%V" so "2024-12-30" lands in "2025-W01"
/// - month: "%Y-%m"
fn bucket_key(start: DateTime<Tz>, granularity: Granularity) -> (String, DateTime<Tz>) {
    let timezone = start.timezone();
    let date = start.date_naive();

    match granularity {
        Granularity::Hour => {
            let key = start.format("%Y-%m-%dT%H:00").to_string();
            let hour_start = date
                .and_hms_opt(start.hour(), 0, 0)
                .and_then(|naive| timezone.from_local_datetime(&naive).earliest())
                .unwrap_or(start);
            (key, hour_start)
        }
        Granularity::Day => (
            start.format("%Y-%m-%d").to_string(),
            midnight_or(date, timezone, start),
        ),
        Granularity::Week => {
            let key = start.format("%G-W%V").to_string();
            let monday = date
                .checked_sub_days(Days::new(u64::from(start.weekday().num_days_from_monday())))
                .unwrap_or(date);
            (key, midnight_or(monday, timezone, start))
        }
        Granularity::Month => {
            let key = start.format("%Y-%m").to_string();
            let first = NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date);
            (key, midnight_or(first, timezone, start))
        }
    }
}

fn midnight_or(date: NaiveDate, timezone: Tz, fallback: DateTime<Tz>) -> DateTime<Tz> {
    at_midnight(date, timezone).unwrap_or(fallback)
}

/// Project week buckets into the view shape the persistence layer caches
pub fn weekly_views(buckets: &[AggregateBucket]) -> Vec<WeeklyAggregate> {
    buckets
        .iter()
        .map(|b| WeeklyAggregate {
            week: b.key.clone(),
            total_kwh: b.energy_kwh,
            peak_kwh: b.peak_energy_kwh,
            off_peak_kwh: b.off_peak_energy_kwh,
        })
        .collect()
}

/// Project month buckets into the view shape the persistence layer caches
/// (and the HP/HC resolver consumes as its second tier)
pub fn monthly_views(buckets: &[AggregateBucket]) -> Vec<MonthlyAggregate> {
    buckets
        .iter()
        .map(|b| MonthlyAggregate {
            month: b.key.clone(),
            total_kwh: b.energy_kwh,
            peak_kwh: b.peak_energy_kwh,
            off_peak_kwh: b.off_peak_energy_kwh,
        })
        .collect()
}
