// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for constants module

use pos_scanner::constants::{CooldownPolicy, decoder, file_formats, scoring, timing};

#[test]
fn test_cooldown_policy_default() {
    assert_eq!(CooldownPolicy::default(), CooldownPolicy::PerCode);
}

#[test]
fn test_cooldown_policy_display_names() {
    assert_eq!(CooldownPolicy::PerCode.display_name(), "Per code");
    assert_eq!(CooldownPolicy::Global.display_name(), "Global");
}

#[test]
fn test_cooldown_policy_serde_names() {
    assert_eq!(
        serde_json::to_string(&CooldownPolicy::PerCode).unwrap(),
        "\"per_code\""
    );
    let global: CooldownPolicy = serde_json::from_str("\"global\"").unwrap();
    assert_eq!(global, CooldownPolicy::Global);
}

#[test]
fn test_scoring_shares_sum_to_one() {
    let total = scoring::TRANSITIONS_SHARE + scoring::VARIANCE_SHARE + scoring::RUNS_SHARE;
    assert!((total - 1.0).abs() < 1e-6);
}

#[test]
fn test_scoring_bands_are_ordered() {
    assert!(scoring::TRANSITIONS_MIN < scoring::TRANSITIONS_MAX);
    assert!(scoring::VARIANCE_MIN < scoring::VARIANCE_MAX);
    assert!(scoring::RUNS_MIN < scoring::RUNS_MAX);
}

#[test]
fn test_timing_relationships() {
    assert!(timing::TICK_INTERVAL < timing::COOLDOWN);
    assert!(timing::DETECTION_START_DELAY < timing::READY_TIMEOUT);
    assert!(timing::READY_POLL_INTERVAL < timing::TICK_INTERVAL);
}

#[test]
fn test_minimum_pattern_is_two_character_symbol() {
    // Start, two data, check, stop, plus both quiet zones
    let two_chars = 4 * decoder::ELEMENTS_PER_SYMBOL + decoder::ELEMENTS_PER_STOP + 2;
    assert_eq!(decoder::MIN_PATTERN_RUNS, two_chars);
}

#[test]
fn test_image_extensions() {
    assert!(file_formats::is_image_extension("png"));
    assert!(file_formats::is_image_extension("JPG"));
    assert!(!file_formats::is_image_extension("mp4"));
    assert!(!file_formats::is_image_extension(""));
}
