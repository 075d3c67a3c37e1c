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

/// Raw end-of-interval meter reading as delivered by the utility-data broker.
///
/// The broker reports each interval by its *end* instant as a civil datetime
/// string (no offset). Values may be missing, negative or NaN for intervals
/// the meter failed to report; the engine rejects those during normalization
/// instead of trusting the feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    /// End of the measurement interval, e.g. "2024-01-01 23:30:00"
    pub end_timestamp: String,

    /// Interval length in minutes; the load curve feed nominally reports
    /// every 30 minutes and omits the field when that default applies
    pub interval_length_minutes: Option<u32>,

    /// Average power over the interval (kW) for the load-curve feed, or
    /// energy (kWh) for the daily consumption feed
    pub value: Option<f32>,

    /// Tariff flag: `Some(true)` = off-peak (HC), `Some(false)` = peak (HP),
    /// `None` = the feed carries no tariff information for this interval
    pub off_peak: Option<bool>,
}

impl RawSample {
    /// Convenience constructor for the common flagless load-curve shape
    pub fn new(end_timestamp: impl Into<String>, value: Option<f32>) -> Self {
        Self {
            end_timestamp: end_timestamp.into(),
            interval_length_minutes: None,
            value,
            off_peak: None,
        }
    }
}

/// Canonical per-interval record in the fixed civil timezone.
///
/// Invariant: `end - start` equals the raw sample's interval length and `end`
/// is the raw end timestamp parsed in the configured timezone. Derived during
/// one normalization pass, never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedSample {
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
    pub value: f32,
    pub off_peak: Option<bool>,
}

impl NormalizedSample {
    /// Interval length in minutes
    pub fn interval_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// Interval length in hours, used for power → energy conversion
    pub fn interval_hours(&self) -> f32 {
        self.interval_minutes() as f32 / 60.0
    }
}
