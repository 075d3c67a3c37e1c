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

//! Segmented year fetch against the utility broker.
//!
//! The load-curve endpoint caps requests at one week, so a full year is
//! pulled as sequential ≤7-day segments with a pause between requests as a
//! rate-limit courtesy. A failed segment is logged and skipped; the fetch
//! only fails wholesale when *every* segment failed.

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use meterflow_types::{FetchConfig, ProgressEvent, RawSample};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

use crate::client::BrokerClient;
use crate::errors::{BrokerError, BrokerResult};

/// Seam between the orchestrator and the broker transport, so tests and the
/// persistence cache can stand in for the real REST client
#[async_trait]
pub trait MeterDataProvider: Send + Sync {
    /// Fetch raw samples for one bounded date range (end exclusive)
    async fn fetch_segment(
        &self,
        usage_point_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> BrokerResult<Vec<RawSample>>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}

#[async_trait]
impl MeterDataProvider for BrokerClient {
    async fn fetch_segment(
        &self,
        usage_point_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> BrokerResult<Vec<RawSample>> {
        self.get_load_curve(usage_point_id, start, end).await
    }

    fn name(&self) -> &str {
        "broker"
    }
}

/// Fetch a year of raw samples in bounded segments, oldest first.
///
/// Emits a monotonically increasing [`ProgressEvent`] after each segment and
/// checks the cooperative `cancel` flag between segments. Partial failure is
/// tolerated: callers receive whatever samples were retrieved, and only a
/// wholesale failure of every segment surfaces
/// [`BrokerError::NoDataRetrieved`].
pub async fn fetch_year<F>(
    provider: &dyn MeterDataProvider,
    usage_point_id: &str,
    config: &FetchConfig,
    mut on_progress: F,
    cancel: &AtomicBool,
) -> BrokerResult<Vec<RawSample>>
where
    F: FnMut(ProgressEvent),
{
    let today = Utc::now().date_naive();
    let window_start = today - Duration::days(config.history_days);
    let segment_days = config.segment_days.max(1);
    let total_segments = ((config.history_days + segment_days - 1) / segment_days).max(1);

    info!(
        "Fetching {} days of history from {} in {} segments",
        config.history_days,
        provider.name(),
        total_segments
    );

    let mut samples = Vec::new();
    let mut succeeded = 0_i64;
    let mut failed = 0_i64;

    for segment_index in 0..total_segments {
        if cancel.load(Ordering::Relaxed) {
            info!("Fetch cancelled after {} segments", segment_index);
            return Err(BrokerError::Cancelled);
        }

        let start = window_start + Duration::days(segment_index * segment_days);
        let end = (start + Duration::days(segment_days)).min(today);

        match provider.fetch_segment(usage_point_id, start, end).await {
            Ok(mut segment) => {
                debug!(
                    "Segment {}/{} ({} to {}): {} samples",
                    segment_index + 1,
                    total_segments,
                    start,
                    end,
                    segment.len()
                );
                samples.append(&mut segment);
                succeeded += 1;
            }
            Err(err) => {
                warn!(
                    "Segment {}/{} ({} to {}) failed, skipping: {}",
                    segment_index + 1,
                    total_segments,
                    start,
                    end,
                    err
                );
                failed += 1;
            }
        }

        let done = segment_index + 1;
        let percent = ((done as f64 / total_segments as f64) * 100.0).round() as u8;
        on_progress(ProgressEvent {
            percent,
            stage_label: format!("Fetching consumption history ({done}/{total_segments})"),
        });

        // Rate-limit courtesy pause, also the scheduling point where UI
        // updates can run
        if done < total_segments && config.segment_pause_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(config.segment_pause_ms)).await;
        }
    }

    if succeeded == 0 {
        return Err(BrokerError::NoDataRetrieved);
    }

    info!(
        "Fetched {} samples ({} segments ok, {} failed)",
        samples.len(),
        succeeded,
        failed
    );
    Ok(samples)
}
