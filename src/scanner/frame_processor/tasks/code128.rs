// SPDX-License-Identifier: GPL-3.0-only

//! CODE128 decoding from a run-length pattern
//!
//! The pattern is painted back into a short grayscale strip and handed to
//! `zedbar`, which owns the symbology: width table, code sets, FNC
//! handling and the check character.
//!
//! ```text
//! quiet │ runs scaled to >= 3 px, repeated over a few rows │ quiet
//! ```

use crate::config::DecoderConfig;
use crate::constants::decoder as limits;
use crate::scanner::frame_processor::types::{DecodedCode, RunLengthPattern};
use tracing::{debug, trace, warn};
use zedbar::config::Code128;
use zedbar::{Image, Scanner, SymbolType};

const DARK: u8 = 0;
const LIGHT: u8 = 255;

/// Decodes one row pattern into text
pub trait PatternDecoder: Send + Sync {
    /// Never panics; `None` when nothing trustworthy was found
    fn decode(&self, pattern: &RunLengthPattern) -> Option<DecodedCode>;
}

/// CODE128 decoder
#[derive(Debug, Clone, Default)]
pub struct Code128Decoder {
    config: DecoderConfig,
}

impl Code128Decoder {
    pub fn new(config: DecoderConfig) -> Self {
        Self { config }
    }

    fn scan(&self, pattern: &RunLengthPattern) -> Option<DecodedCode> {
        let (width, pixels) = render(pattern)?;
        let mut image = match Image::from_gray(&pixels, width, limits::RENDER_ROWS) {
            Ok(image) => image,
            Err(err) => {
                warn!(error = %err, width, "Rendered row rejected");
                return None;
            }
        };

        let mut scanner = Scanner::with_config(
            zedbar::DecoderConfig::new()
                .enable(Code128)
                .position_tracking(false),
        );
        let result = scanner.scan(&mut image);
        trace!(width, symbols = result.len(), "Scanned rendered row");

        result
            .iter()
            .filter(|symbol| symbol.symbol_type() == SymbolType::Code128)
            .find_map(|symbol| symbol.data_string().filter(|text| !text.is_empty()))
            .map(DecodedCode::new)
    }
}

impl PatternDecoder for Code128Decoder {
    fn decode(&self, pattern: &RunLengthPattern) -> Option<DecodedCode> {
        if pattern.len() < limits::MIN_PATTERN_RUNS {
            return None;
        }

        if let Some(code) = self.scan(pattern) {
            debug!(code = %code, "Decoded CODE128");
            return Some(code);
        }
        if self.config.try_reversed
            && let Some(code) = self.scan(&pattern.reversed())
        {
            debug!(code = %code, "Decoded CODE128 (reversed)");
            return Some(code);
        }
        if self.config.numeric_fallback {
            let digits = numeric_fallback(pattern);
            debug!(digits = %digits, "No symbol found, using numeric fallback");
            return (!digits.is_empty()).then(|| DecodedCode::new(digits));
        }
        None
    }
}

/// Paint the runs as one grayscale row repeated `RENDER_ROWS` times
///
/// Runs are scaled so the narrowest covers `MIN_RUN_PIXELS`, and a light
/// quiet zone is added on both sides. `None` when every run is empty.
fn render(pattern: &RunLengthPattern) -> Option<(u32, Vec<u8>)> {
    let narrowest = pattern.runs.iter().copied().filter(|&w| w > 0).min()?;
    let scale = limits::MIN_RUN_PIXELS.div_ceil(narrowest);
    let quiet = (limits::QUIET_ZONE_RUNS * narrowest * scale) as usize;

    let mut row = vec![LIGHT; quiet];
    for (index, &width) in pattern.runs.iter().enumerate() {
        let value = if pattern.is_dark(index) { DARK } else { LIGHT };
        row.extend(std::iter::repeat_n(value, (width * scale) as usize));
    }
    row.extend(std::iter::repeat_n(LIGHT, quiet));

    let width = u32::try_from(row.len()).ok()?;
    Some((width, row.repeat(limits::RENDER_ROWS as usize)))
}

/// Digits from groups of run widths, for rows no symbol could be read from
fn numeric_fallback(pattern: &RunLengthPattern) -> String {
    pattern
        .runs
        .chunks_exact(limits::FALLBACK_GROUP_SIZE)
        .take(limits::FALLBACK_MAX_DIGITS)
        .map(|group| char::from(b'0' + (group.iter().sum::<u32>() % 10) as u8))
        .collect()
}
