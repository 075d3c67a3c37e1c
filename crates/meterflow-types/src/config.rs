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

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Engine configuration shared by the normalization and aggregation passes.
///
/// The civil timezone is injected here rather than read from ambient process
/// state so every interval boundary and weekday classification is computed in
/// the homeowner's timezone, regardless of where the engine runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Fixed civil timezone for all interval boundaries (IANA name)
    #[serde(default = "default_timezone")]
    pub timezone: Tz,

    /// Interval length assumed when the broker omits it (minutes)
    #[serde(default = "default_interval_minutes")]
    pub default_interval_minutes: u32,

    /// The broker lags by at least one full day; samples starting after
    /// "end of yesterday" are dropped by the cutoff filter
    #[serde(default = "default_cutoff_lag_days")]
    pub cutoff_lag_days: i64,

    /// Historical peak share used by the heuristic HP/HC fallback tier
    /// (0.70 = 70% peak / 30% off-peak)
    #[serde(default = "default_fallback_peak_ratio")]
    pub fallback_peak_ratio: f32,

    /// Batch size for HP/HC recomputation from raw samples; bounds
    /// per-iteration cost on a full year of half-hour data
    #[serde(default = "default_raw_batch_size")]
    pub raw_batch_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            default_interval_minutes: default_interval_minutes(),
            cutoff_lag_days: default_cutoff_lag_days(),
            fallback_peak_ratio: default_fallback_peak_ratio(),
            raw_batch_size: default_raw_batch_size(),
        }
    }
}

fn default_timezone() -> Tz {
    chrono_tz::Europe::Paris
}

fn default_interval_minutes() -> u32 {
    30
}

fn default_cutoff_lag_days() -> i64 {
    1
}

fn default_fallback_peak_ratio() -> f32 {
    0.70
}

fn default_raw_batch_size() -> usize {
    1000
}

/// Configuration for the segmented year fetch against the utility broker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Total history window requested from the broker (days)
    #[serde(default = "default_history_days")]
    pub history_days: i64,

    /// Maximum span of one broker request; the provider rejects ranges
    /// longer than a week on the load-curve endpoint
    #[serde(default = "default_segment_days")]
    pub segment_days: i64,

    /// Pause between segment requests to respect the broker's rate limits
    #[serde(default = "default_segment_pause_ms")]
    pub segment_pause_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            history_days: default_history_days(),
            segment_days: default_segment_days(),
            segment_pause_ms: default_segment_pause_ms(),
        }
    }
}

fn default_history_days() -> i64 {
    365
}

fn default_segment_days() -> i64 {
    7
}

fn default_segment_pause_ms() -> u64 {
    500
}

/// Progress notification emitted after each fetch segment, consumed by the
/// UI progress indicator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// Monotonically increasing, 0..=100
    pub percent: u8,
    pub stage_label: String,
}
