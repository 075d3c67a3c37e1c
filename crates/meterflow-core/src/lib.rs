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

//! Interval time-series normalization and aggregation engine.
//!
//! Takes raw, irregularly-lagged, end-of-interval meter readings and turns
//! them into analysis-ready buckets: canonical per-interval records,
//! weekday/hour profiles, hourly/daily/weekly/monthly energy rollups and a
//! peak/off-peak (HP/HC) split resolved through a tiered fallback strategy.
//!
//! Everything in this crate is a pure, synchronous transform over in-memory
//! slices; fetching and persistence live in `meterflow-broker` and the
//! excluded UI layers.

pub mod aggregate;
pub mod error;
pub mod hphc;
pub mod normalize;
pub mod weekday;

pub use aggregate::{aggregate_energy, aggregate_power, monthly_views, weekly_views};
pub use error::{EngineError, EngineResult};
pub use hphc::{SplitCandidates, resolve_split};
pub use normalize::{default_cutoff, filter_valid, normalize_sample, sort_chronological};
pub use weekday::{audit_completeness, bucket_by_weekday, hourly_profile};
