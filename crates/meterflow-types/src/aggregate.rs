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

use chrono::DateTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Time granularity for energy rollups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Hour,
    Day,
    Week,
    Month,
}

impl Granularity {
    /// Human-readable name, used in log messages and progress labels
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Hour => "hourly",
            Self::Day => "daily",
            Self::Week => "weekly",
            Self::Month => "monthly",
        }
    }
}

/// Energy rollup for one time bucket at a given granularity.
///
/// Invariants:
/// - `energy_kwh == peak_energy_kwh + off_peak_energy_kwh` (samples without a
///   tariff flag count toward peak, the base tariff)
/// - summing `energy_kwh` over the hour buckets of a day equals the day
///   bucket's `energy_kwh` (aggregation is conservative)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateBucket {
    /// Sortable bucket key: "2024-01-15T08:00", "2024-01-15", "2024-W03"
    /// or "2024-01" depending on granularity
    pub key: String,

    /// Start of the bucket in the civil timezone
    pub bucket_start: DateTime<Tz>,

    /// Total energy over the bucket (kWh)
    pub energy_kwh: f32,

    /// Energy consumed during peak-tariff (HP) intervals (kWh)
    pub peak_energy_kwh: f32,

    /// Energy consumed during off-peak-tariff (HC) intervals (kWh)
    pub off_peak_energy_kwh: f32,

    /// Number of samples that contributed to the bucket
    pub sample_count: usize,

    /// Highest interval-average power seen in the bucket (kW)
    pub max_power_kw: f32,

    /// Lowest interval-average power seen in the bucket (kW)
    pub min_power_kw: f32,

    /// Mean interval-average power over the bucket (kW)
    pub avg_power_kw: f32,

    /// `Some(true)` only when *every* contributing sample was flagged
    /// off-peak; a mixed bucket must never present itself as purely cheap.
    /// `None` when no sample carried a tariff flag.
    pub all_off_peak: Option<bool>,
}

/// Data-quality signal for one ISO weekday bucket (1 = Monday .. 7 = Sunday)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekdayCompleteness {
    pub weekday: u8,
    pub count: usize,
    /// Earliest time-of-day observed among sample starts ("HH:mm"),
    /// or "—" when the bucket is empty
    pub min_time_of_day: String,
    /// Latest time-of-day observed among sample starts ("HH:mm"),
    /// or "—" when the bucket is empty
    pub max_time_of_day: String,
}

/// Average power for one (weekday, hour-of-day) cell of the load profile
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyProfilePoint {
    /// ISO weekday, 1 = Monday .. 7 = Sunday
    pub weekday: u8,
    /// Hour of day in the civil timezone, 0..=23
    pub hour: u8,
    pub avg_power_kw: f32,
    pub sample_count: usize,
}
