// SPDX-License-Identifier: GPL-3.0-only

//! Types shared by the frame processing tasks

use std::fmt;

/// Widths of alternating dark and light runs along one row
///
/// Index parity gives the color: even indices have the color of the
/// first run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunLengthPattern {
    pub runs: Vec<u32>,
    pub starts_dark: bool,
}

impl RunLengthPattern {
    pub fn new(runs: Vec<u32>, starts_dark: bool) -> Self {
        Self { runs, starts_dark }
    }

    /// Run-length encode a row of dark/light classifications
    pub fn from_classified(pixels: impl IntoIterator<Item = bool>) -> Self {
        let mut pixels = pixels.into_iter();
        let Some(first) = pixels.next() else {
            return Self::default();
        };

        let mut runs = vec![1u32];
        let mut current = first;
        for dark in pixels {
            if dark == current {
                if let Some(last) = runs.last_mut() {
                    *last += 1;
                }
            } else {
                runs.push(1);
                current = dark;
            }
        }
        Self {
            runs,
            starts_dark: first,
        }
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Polarity changes along the row
    pub fn transitions(&self) -> usize {
        self.runs.len().saturating_sub(1)
    }

    pub fn is_dark(&self, index: usize) -> bool {
        (index % 2 == 0) == self.starts_dark
    }

    pub fn mean_width(&self) -> f32 {
        if self.runs.is_empty() {
            return 0.0;
        }
        self.runs.iter().sum::<u32>() as f32 / self.runs.len() as f32
    }

    /// Population variance of the run widths
    pub fn width_variance(&self) -> f32 {
        if self.runs.is_empty() {
            return 0.0;
        }
        let mean = self.mean_width();
        self.runs
            .iter()
            .map(|&w| {
                let d = w as f32 - mean;
                d * d
            })
            .sum::<f32>()
            / self.runs.len() as f32
    }

    /// The same row read right to left
    pub fn reversed(&self) -> Self {
        let mut runs = self.runs.clone();
        runs.reverse();
        let last_is_dark = self.runs.len().checked_sub(1).is_some_and(|i| self.is_dark(i));
        Self {
            runs,
            starts_dark: last_is_dark,
        }
    }
}

/// Barcode-likeness of one row, with the row's pattern
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreResult {
    /// In [0, 1]
    pub score: f32,
    pub pattern: RunLengthPattern,
}

impl ScoreResult {
    pub fn zero() -> Self {
        Self::default()
    }
}

/// A decoded symbol's text
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DecodedCode(String);

impl DecodedCode {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for DecodedCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DecodedCode {
    fn from(text: &str) -> Self {
        Self(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_length_encoding() {
        let pattern = RunLengthPattern::from_classified([
            false, false, true, true, true, false, true,
        ]);
        assert_eq!(pattern.runs, vec![2, 3, 1, 1]);
        assert!(!pattern.starts_dark);
        assert_eq!(pattern.transitions(), 3);
        assert!(pattern.is_dark(1));
        assert!(!pattern.is_dark(2));
    }

    #[test]
    fn test_empty_row() {
        let pattern = RunLengthPattern::from_classified(std::iter::empty());
        assert!(pattern.is_empty());
        assert_eq!(pattern.transitions(), 0);
        assert_eq!(pattern.width_variance(), 0.0);
    }

    #[test]
    fn test_reversed_keeps_colors() {
        let pattern = RunLengthPattern::new(vec![5, 1, 2, 3], false);
        let reversed = pattern.reversed();
        assert_eq!(reversed.runs, vec![3, 2, 1, 5]);
        // Last run of the original (index 3) is dark
        assert!(reversed.starts_dark);
        assert_eq!(reversed.reversed(), pattern);
    }

    #[test]
    fn test_variance() {
        let pattern = RunLengthPattern::new(vec![1, 3], true);
        assert_eq!(pattern.mean_width(), 2.0);
        assert_eq!(pattern.width_variance(), 1.0);
    }
}
