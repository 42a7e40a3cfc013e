// SPDX-License-Identifier: GPL-3.0-only

//! Per-tick frame analysis
//!
//! A sampled raster goes through the line analyzer, and the single best
//! row of the tick is handed to the pattern decoder.

pub mod tasks;
pub mod types;

pub use tasks::{Code128Decoder, LineAnalyzer, PatternDecoder};
pub use types::{DecodedCode, RunLengthPattern, ScoreResult};
