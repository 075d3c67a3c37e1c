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

pub mod aggregate;
pub mod config;
pub mod sample;
pub mod split;

// Re-export common types for convenience
pub use aggregate::{AggregateBucket, Granularity, HourlyProfilePoint, WeekdayCompleteness};
pub use config::{EngineConfig, FetchConfig, ProgressEvent};
pub use sample::{NormalizedSample, RawSample};
pub use split::{HpHcSplit, MonthlyAggregate, PrecomputedTotal, SplitTier, WeeklyAggregate};
