// SPDX-License-Identifier: GPL-3.0-only

//! Row analysis and barcode-likeness scoring
//!
//! Rows in a centered band are binarized on BT.601 luminance, run-length
//! encoded, and scored on three independent signals. The best row of the
//! frame wins.

use crate::config::{ScannerConfig, ScoringBands};
use crate::constants::{analysis, scoring};
use crate::scanner::frame_processor::types::{RunLengthPattern, ScoreResult};
use crate::scanner::sampler::RasterSample;
use tracing::trace;

/// Luminance of one RGB pixel
pub fn luminance(r: u8, g: u8, b: u8) -> f32 {
    let [wr, wg, wb] = analysis::LUMA_WEIGHTS;
    wr * r as f32 + wg * g as f32 + wb * b as f32
}

/// Binarize and run-length encode one RGBA row
pub fn encode_row(row: &[u8], threshold: u8) -> RunLengthPattern {
    let threshold = threshold as f32;
    RunLengthPattern::from_classified(
        row.chunks_exact(4)
            .map(|px| luminance(px[0], px[1], px[2]) < threshold),
    )
}

pub struct LineAnalyzer {
    band_fraction: f32,
    row_step: u32,
    threshold: u8,
    bands: ScoringBands,
}

impl Default for LineAnalyzer {
    fn default() -> Self {
        Self::new(&ScannerConfig::default())
    }
}

impl LineAnalyzer {
    pub fn new(config: &ScannerConfig) -> Self {
        Self {
            band_fraction: config.band_fraction,
            row_step: config.row_step.max(1),
            threshold: config.luminance_threshold,
            bands: config.scoring,
        }
    }

    /// Rows inside the centered scan band
    pub fn band_rows(&self, height: u32) -> impl Iterator<Item = u32> + use<> {
        let band = ((height as f32 * self.band_fraction).round() as u32).clamp(1, height.max(1));
        let start = height.saturating_sub(band) / 2;
        let end = (start + band).min(height);
        (start..end).step_by(self.row_step as usize)
    }

    /// Score one row's pattern in [0, 1]
    pub fn score_pattern(&self, pattern: &RunLengthPattern) -> f32 {
        let mut score = 0.0;
        if self.bands.transitions.contains(pattern.transitions()) {
            score += scoring::TRANSITIONS_SHARE;
        }
        if self.bands.variance.contains(pattern.width_variance()) {
            score += scoring::VARIANCE_SHARE;
        }
        if self.bands.runs.contains(pattern.len()) {
            score += scoring::RUNS_SHARE;
        }
        score
    }

    /// Best-scoring row of the sample; zero for an unanalyzable sample
    pub fn analyze(&self, sample: &RasterSample) -> ScoreResult {
        let mut best = ScoreResult::zero();
        let mut rows = 0usize;

        for y in self.band_rows(sample.height) {
            rows += 1;
            let pattern = encode_row(sample.row(y), self.threshold);
            let score = self.score_pattern(&pattern);
            if score > best.score || (rows == 1 && best.pattern.is_empty()) {
                best = ScoreResult { score, pattern };
            }
        }

        trace!(
            rows,
            score = best.score,
            runs = best.pattern.len(),
            "Analyzed sample"
        );
        best
    }
}
