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

//! Tiered peak/off-peak (HP/HC) resolution.
//!
//! Consumers needing an HP/HC percentage breakdown hand over every candidate
//! source they have; the resolver picks the first available tier in priority
//! order and reports which one it used. Tiers are never blended, and absence
//! of a source is expected rather than exceptional.

use meterflow_types::{
    EngineConfig, Granularity, HpHcSplit, MonthlyAggregate, NormalizedSample, PrecomputedTotal,
    SplitTier,
};
use tracing::{debug, warn};

use crate::aggregate::aggregate_power;

/// Candidate HP/HC sources for one analysis request. Any of them may be
/// absent ("tier unavailable", not an error).
#[derive(Debug, Clone, Default)]
pub struct SplitCandidates<'a> {
    /// Pre-aggregated yearly totals from the persistence layer
    pub precomputed_total: Option<PrecomputedTotal>,

    /// Pre-aggregated monthly view
    pub precomputed_monthly: Option<&'a [MonthlyAggregate]>,

    /// Raw load-curve samples for recomputation
    pub raw_samples: Option<&'a [NormalizedSample]>,

    /// Bare consumption total, the last resort for the heuristic tier (kWh)
    pub plain_total_kwh: Option<f32>,
}

/// Resolve a peak/off-peak split from the first available candidate source.
///
/// Resolution order: precomputed total → precomputed monthly → recomputation
/// from raw samples → fixed-ratio heuristic. The chosen tier is always
/// reported in the result so the caller can tell authoritative data from a
/// guess.
pub fn resolve_split(candidates: &SplitCandidates<'_>, config: &EngineConfig) -> HpHcSplit {
    if let Some(total) = candidates.precomputed_total
        && total.total_kwh > 0.0
    {
        debug!("HP/HC split resolved from precomputed totals");
        return build_split(total.peak_kwh, total.off_peak_kwh, SplitTier::PrecomputedTotal);
    }

    if let Some(monthly) = candidates.precomputed_monthly
        && !monthly.is_empty()
    {
        let peak_kwh: f32 = monthly.iter().map(|m| m.peak_kwh).sum();
        let off_peak_kwh: f32 = monthly.iter().map(|m| m.off_peak_kwh).sum();
        debug!(
            "HP/HC split summed from {} monthly aggregates",
            monthly.len()
        );
        return build_split(peak_kwh, off_peak_kwh, SplitTier::PrecomputedMonthly);
    }

    if let Some(raw) = candidates.raw_samples
        && let Some((peak_kwh, off_peak_kwh)) = recompute_from_raw(raw, config)
    {
        return build_split(peak_kwh, off_peak_kwh, SplitTier::ComputedFromRaw);
    }

    let total_kwh = candidates.plain_total_kwh.unwrap_or(0.0);
    let peak_kwh = total_kwh * config.fallback_peak_ratio;
    warn!(
        "No HP/HC source available, splitting {:.1} kWh with the historical {:.0}/{:.0} ratio",
        total_kwh,
        config.fallback_peak_ratio * 100.0,
        (1.0 - config.fallback_peak_ratio) * 100.0
    );
    build_split(peak_kwh, total_kwh - peak_kwh, SplitTier::HeuristicFallback)
}

/// Recompute the split from raw load-curve samples through the temporal
/// aggregator.
///
/// Samples are processed in fixed-size batches purely to bound per-iteration
/// cost on a full year of half-hour data. Samples failing basic validity
/// checks (non-finite, negative, missing tariff flag) are skipped rather
/// than aborting the computation. Returns `None` when no usable sample was
/// found, so the caller can fall through to the heuristic tier.
fn recompute_from_raw(samples: &[NormalizedSample], config: &EngineConfig) -> Option<(f32, f32)> {
    let mut peak_kwh = 0.0_f32;
    let mut off_peak_kwh = 0.0_f32;
    let mut usable = 0_usize;

    for batch in samples.chunks(config.raw_batch_size.max(1)) {
        let flagged: Vec<NormalizedSample> = batch
            .iter()
            .filter(|s| s.off_peak.is_some() && s.value.is_finite() && s.value >= 0.0)
            .cloned()
            .collect();
        usable += flagged.len();

        for bucket in aggregate_power(&flagged, Granularity::Day) {
            peak_kwh += bucket.peak_energy_kwh;
            off_peak_kwh += bucket.off_peak_energy_kwh;
        }
    }

    if usable == 0 {
        debug!(
            "No usable tariff-flagged sample among {} raw samples",
            samples.len()
        );
        return None;
    }

    debug!(
        "HP/HC split recomputed from {} of {} raw samples",
        usable,
        samples.len()
    );
    Some((peak_kwh, off_peak_kwh))
}

/// Percentages are computed against the tier's own total; a zero total
/// yields 0% rather than NaN.
fn build_split(peak_kwh: f32, off_peak_kwh: f32, tier: SplitTier) -> HpHcSplit {
    let total_kwh = peak_kwh + off_peak_kwh;
    let (peak_pct, off_peak_pct) = if total_kwh > 0.0 {
        (
            peak_kwh / total_kwh * 100.0,
            off_peak_kwh / total_kwh * 100.0,
        )
    } else {
        (0.0, 0.0)
    };

    HpHcSplit {
        peak_kwh,
        off_peak_kwh,
        peak_pct,
        off_peak_pct,
        tier,
    }
}
