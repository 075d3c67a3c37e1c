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

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Data source tier used to produce an HP/HC split, from most to least
/// authoritative. The resolver picks the first available tier and never
/// blends two of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SplitTier {
    /// Pre-aggregated yearly totals delivered by the persistence layer
    PrecomputedTotal,
    /// Monthly aggregates summed into totals
    PrecomputedMonthly,
    /// Recomputed from raw load-curve samples
    ComputedFromRaw,
    /// Fixed historical ratio applied to a bare consumption total;
    /// low-confidence, must be surfaced to the caller as such
    HeuristicFallback,
}

impl SplitTier {
    /// Get human-readable name for the tier
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::PrecomputedTotal => "precomputed total",
            Self::PrecomputedMonthly => "precomputed monthly",
            Self::ComputedFromRaw => "computed from raw samples",
            Self::HeuristicFallback => "heuristic fallback",
        }
    }

    /// Get config string value (kebab-case)
    pub fn to_config_value(&self) -> &'static str {
        match self {
            Self::PrecomputedTotal => "precomputed-total",
            Self::PrecomputedMonthly => "precomputed-monthly",
            Self::ComputedFromRaw => "computed-from-raw",
            Self::HeuristicFallback => "heuristic-fallback",
        }
    }

    /// List all tiers in resolution priority order
    pub fn all() -> &'static [SplitTier] {
        &[
            Self::PrecomputedTotal,
            Self::PrecomputedMonthly,
            Self::ComputedFromRaw,
            Self::HeuristicFallback,
        ]
    }
}

impl fmt::Display for SplitTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for SplitTier {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "precomputed-total" => Ok(Self::PrecomputedTotal),
            "precomputed-monthly" => Ok(Self::PrecomputedMonthly),
            "computed-from-raw" => Ok(Self::ComputedFromRaw),
            "heuristic-fallback" => Ok(Self::HeuristicFallback),
            _ => Err(anyhow::anyhow!(
                "Unknown split tier: '{}'. Supported tiers: {}",
                s,
                Self::all()
                    .iter()
                    .map(|t| t.to_config_value())
                    .collect::<Vec<_>>()
                    .join(", ")
            )),
        }
    }
}

/// Peak / off-peak consumption breakdown for one analysis request.
///
/// Created fresh per request and never persisted; `tier` is always reported
/// so the UI can tell an authoritative split from a heuristic one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HpHcSplit {
    pub peak_kwh: f32,
    pub off_peak_kwh: f32,
    /// Share of peak energy against the tier's own total, 0.0..=100.0
    pub peak_pct: f32,
    /// Share of off-peak energy against the tier's own total, 0.0..=100.0
    pub off_peak_pct: f32,
    pub tier: SplitTier,
}

/// Pre-aggregated yearly totals, when the persistence layer has them
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrecomputedTotal {
    pub total_kwh: f32,
    pub peak_kwh: f32,
    pub off_peak_kwh: f32,
}

/// Pre-aggregated per-month view ("2024-01" keys)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyAggregate {
    pub month: String,
    pub total_kwh: f32,
    pub peak_kwh: f32,
    pub off_peak_kwh: f32,
}

/// Pre-aggregated per-ISO-week view ("2024-W03" keys), exposed to chart
/// consumers alongside the monthly one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyAggregate {
    pub week: String,
    pub total_kwh: f32,
    pub peak_kwh: f32,
    pub off_peak_kwh: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_tier_roundtrip() {
        for tier in SplitTier::all() {
            let parsed: SplitTier = tier.to_config_value().parse().unwrap();
            assert_eq!(parsed, *tier);
        }
    }

    #[test]
    fn test_split_tier_unknown() {
        assert!("guesswork".parse::<SplitTier>().is_err());
    }
}
