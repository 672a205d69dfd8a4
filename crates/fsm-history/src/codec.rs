// SPDX-License-Identifier: MIT
// Copyright (c) 2026 FSM Runtime Contributors

//! Base64-encoded JSON snapshot codec (§6), matching the encoding
//! `fsm-engine` writes into `HistoryRecord`'s `*_b64` fields — decoding
//! lives here rather than in `fsm-engine` since only inspection/debug
//! paths (the history reader, the debug channel) ever need it back out.

use base64::Engine as _;
use fsm_core::PersistenceError;
use serde::de::DeserializeOwned;
use serde::Serialize;

pub fn encode<T: Serialize>(value: &T) -> Result<String, PersistenceError> {
    let json = serde_json::to_vec(value)?;
    Ok(base64::engine::general_purpose::STANDARD.encode(json))
}

pub fn decode<T: DeserializeOwned>(encoded: &str) -> Result<T, PersistenceError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map_err(|error| PersistenceError::Io(format!("invalid base64 snapshot: {error}")))?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
#[path = "codec_tests.rs"]
mod tests;
