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

use thiserror::Error;

/// Engine error types.
///
/// All of these are per-sample conditions: batch APIs recover locally by
/// dropping the offending sample and continuing, they never fail wholesale
/// because one meter reading was bad.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Malformed timestamp: '{raw}' (expected 'YYYY-MM-DD HH:MM:SS' or ISO 8601)")]
    MalformedTimestamp { raw: String },

    #[error("Invalid sample value: {reason}")]
    InvalidValue { reason: String },

    #[error("Invalid interval length: {minutes} minutes")]
    InvalidInterval { minutes: u32 },
}

pub type EngineResult<T> = Result<T, EngineError>;
