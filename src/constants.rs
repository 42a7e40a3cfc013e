// SPDX-License-Identifier: GPL-3.0-only

//! Scanner-wide constants

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How repeated decodes are suppressed inside the cooldown window
///
/// Both policies share one window length; they differ in what resets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CooldownPolicy {
    /// Suppress only a repeat of the last emitted code (default)
    #[default]
    PerCode,
    /// Suppress every emission until the window has elapsed
    Global,
}

impl CooldownPolicy {
    /// Get display name for the policy
    pub fn display_name(&self) -> &'static str {
        match self {
            CooldownPolicy::PerCode => "Per code",
            CooldownPolicy::Global => "Global",
        }
    }
}

/// Session timing
pub mod timing {
    use super::Duration;

    /// Delay between the end of one tick and the start of the next
    pub const TICK_INTERVAL: Duration = Duration::from_millis(100);

    /// Settling delay between playback start and the first tick
    pub const DETECTION_START_DELAY: Duration = Duration::from_millis(1000);

    /// Upper bound on waiting for the sink to load metadata and start playing
    pub const READY_TIMEOUT: Duration = Duration::from_secs(10);

    /// Window during which a repeat emission is suppressed
    pub const COOLDOWN: Duration = Duration::from_millis(2000);

    /// Poll interval while native sinks wait for their first frame
    pub const READY_POLL_INTERVAL: Duration = Duration::from_millis(20);

    /// Log every Nth tick at debug level
    pub const TICK_LOG_INTERVAL: u64 = 50;
}

/// Row sampling and binarization
pub mod analysis {
    /// Fraction of the frame height (centered) covered by the scan band
    pub const BAND_FRACTION: f32 = 0.6;

    /// Rows skipped between two analyzed rows
    pub const ROW_STEP: u32 = 4;

    /// Luminance below this value is a bar, at or above it a space
    pub const LUMINANCE_THRESHOLD: u8 = 128;

    /// ITU-R BT.601 luma weights (R, G, B)
    pub const LUMA_WEIGHTS: [f32; 3] = [0.299, 0.587, 0.114];

    /// Minimum tick score before a decode is attempted
    pub const MIN_SCORE: f32 = 0.35;
}

/// Barcode-likeness scoring bands and their shares of the score
pub mod scoring {
    /// Plausible polarity transitions for a 1-D symbol
    pub const TRANSITIONS_MIN: usize = 25;
    pub const TRANSITIONS_MAX: usize = 80;
    pub const TRANSITIONS_SHARE: f32 = 0.3;

    /// Run-width variance band (pixel²)
    pub const VARIANCE_MIN: f32 = 2.0;
    pub const VARIANCE_MAX: f32 = 50.0;
    pub const VARIANCE_SHARE: f32 = 0.4;

    /// Plausible element count
    pub const RUNS_MIN: usize = 20;
    pub const RUNS_MAX: usize = 120;
    pub const RUNS_SHARE: f32 = 0.3;
}

/// CODE128 decoding
pub mod decoder {
    /// Shortest run sequence worth attempting (start + data + check + stop + margins)
    pub const MIN_PATTERN_RUNS: usize = 33;

    /// Elements (bars + spaces) per symbol character
    pub const ELEMENTS_PER_SYMBOL: usize = 6;

    /// Elements in the stop pattern (includes the termination bar)
    pub const ELEMENTS_PER_STOP: usize = 7;

    /// Rows in the strip a pattern is painted into
    pub const RENDER_ROWS: u32 = 8;

    /// Narrowest painted run, in pixels
    pub const MIN_RUN_PIXELS: u32 = 3;

    /// Light margin on each side, in narrowest runs
    pub const QUIET_ZONE_RUNS: u32 = 10;

    /// Runs summed per digit by the numeric fallback
    pub const FALLBACK_GROUP_SIZE: usize = 3;

    /// Longest string the numeric fallback produces
    pub const FALLBACK_MAX_DIGITS: usize = 8;
}

/// Host environment detection
pub mod host {
    /// User-agent markers of a mobile browser (matched case-insensitively)
    pub const MOBILE_MARKERS: &[&str] = &[
        "android",
        "webos",
        "iphone",
        "ipad",
        "ipod",
        "blackberry",
        "iemobile",
        "opera mini",
    ];

    /// Host names treated as loopback
    pub const LOOPBACK_HOSTS: &[&str] = &["localhost", "127.0.0.1", "::1"];

    /// Scheme of a secure context
    pub const SECURE_SCHEME: &str = "https";
}

/// Supported file formats for the virtual camera
pub mod file_formats {
    /// Supported image file extensions
    pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp"];

    /// Check if a file extension is a supported image format
    pub fn is_image_extension(ext: &str) -> bool {
        IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str())
    }
}

/// Virtual camera timing
pub mod virtual_camera {
    use super::Duration;

    /// How long each still image is shown before the next one
    pub const IMAGE_STREAM_FRAME_DURATION: Duration = Duration::from_millis(33);
}

/// V4L2 capture
pub mod v4l2 {
    /// Memory-mapped buffers requested from the driver
    pub const BUFFER_COUNT: u32 = 4;

    /// Device node prefix
    pub const DEVICE_PREFIX: &str = "/dev/video";

    /// Pause after a failed dequeue before retrying
    pub const RETRY_DELAY_MS: u64 = 10;
}

/// Application identity
pub mod app_info {
    /// Directory name under the user config dir
    pub const CONFIG_DIR_NAME: &str = "pos-scanner";

    /// Config file name
    pub const CONFIG_FILE_NAME: &str = "config.json";

    /// Build version (git describe, set by build.rs)
    pub fn version() -> &'static str {
        env!("GIT_VERSION")
    }
}
