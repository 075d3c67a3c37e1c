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

use meterflow_types::RawSample;
use serde::{Deserialize, Serialize};

/// Top-level payload of the broker's metering endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeterReadingResponse {
    pub meter_reading: MeterReadingPayload,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeterReadingPayload {
    pub usage_point_id: String,
    #[serde(default)]
    pub interval_reading: Vec<MeterReadingDto>,
}

/// One interval reading as the broker ships it.
///
/// The feed is loosely shaped: the timestamp field is sometimes `date`
/// (daily consumption) and sometimes `date_time` (load curve), values arrive
/// as strings, and the interval length is an ISO 8601 duration ("PT30M").
/// [`MeterReadingDto::into_raw_sample`] is the boundary adapter that folds
/// all of that into the one canonical shape the engine sees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeterReadingDto {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub date_time: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub interval_length: Option<String>,
    #[serde(default)]
    pub off_peak: Option<bool>,
}

impl MeterReadingDto {
    /// Fold the loose wire shape into a canonical [`RawSample`].
    ///
    /// Prefers `date_time` over `date`; returns `None` only when no
    /// timestamp is present at all. Unparseable values stay `None` in the
    /// sample so the engine's validity filter rejects them with the rest.
    pub fn into_raw_sample(self) -> Option<RawSample> {
        let end_timestamp = self.date_time.or(self.date)?;
        let value = self.value.as_deref().and_then(|v| v.parse::<f32>().ok());
        let interval_length_minutes = self.interval_length.as_deref().and_then(parse_iso_duration);

        Some(RawSample {
            end_timestamp,
            interval_length_minutes,
            value,
            off_peak: self.off_peak,
        })
    }
}

/// Lenient ISO 8601 duration parse for the broker's interval lengths
/// ("PT30M", "PT1H"); anything else falls back to the engine default
fn parse_iso_duration(raw: &str) -> Option<u32> {
    let body = raw.strip_prefix("PT")?;
    if let Some(minutes) = body.strip_suffix('M') {
        return minutes.parse().ok();
    }
    if let Some(hours) = body.strip_suffix('H') {
        return hours.parse::<u32>().ok().map(|h| h * 60);
    }
    None
}
