// SPDX-License-Identifier: GPL-3.0-only

//! Frame processing tasks
//!
//! Row analysis scores a sample; the decoder reads the best row.

pub mod code128;
pub mod line_analyzer;

pub use code128::{Code128Decoder, PatternDecoder};
pub use line_analyzer::LineAnalyzer;
