// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the scanner

use crate::backends::camera::types::{BackendError, MediaError, MediaErrorKind};
use crate::scanner::probe::{DeviceCapabilities, DeviceClass};
use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for session operations
pub type ScanResult<T> = Result<T, ScanError>;

/// Main application error type
#[derive(Debug)]
pub enum AppError {
    /// Stream acquisition or sampling errors
    Scan(ScanError),
    /// Backend setup errors (device open, image loading)
    Backend(BackendError),
    /// Configuration errors
    Config(ConfigError),
    /// Filesystem errors
    Io(std::io::Error),
    /// Generic error with message
    Other(String),
}

/// Categorized failure of a scan attempt
///
/// Every variant is surfaced to the caller; the session is back to idle
/// when one is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    /// No capture API or no camera at all
    CameraUnavailable(String),
    /// User or policy declined camera access
    PermissionDenied(String),
    /// Another process holds the camera
    DeviceBusy(String),
    /// Neither the tuned nor the permissive constraint set could be met
    UnsupportedConstraints(String),
    /// Mobile page served over plain HTTP from a non-loopback host
    InsecureContext,
    /// The stream never reached a playable state
    Timeout(String),
    /// The sink failed to load or play the stream
    Playback(String),
    /// The sink has nothing decoded to draw yet
    SinkNotReady,
}

/// Configuration errors
#[derive(Debug)]
pub enum ConfigError {
    /// Config file could not be read
    Io(std::io::Error),
    /// Config file is not valid JSON for this schema
    Parse(serde_json::Error),
    /// Values are out of range
    Invalid(String),
}

impl ScanError {
    /// Map a media-facility failure onto the scan taxonomy
    pub fn from_media(err: MediaError) -> Self {
        match err.kind {
            MediaErrorKind::NotAllowed => ScanError::PermissionDenied(err.message),
            MediaErrorKind::NotFound | MediaErrorKind::NotSupported => {
                ScanError::CameraUnavailable(err.message)
            }
            MediaErrorKind::NotReadable => ScanError::DeviceBusy(err.message),
            MediaErrorKind::Overconstrained => ScanError::UnsupportedConstraints(err.message),
            MediaErrorKind::Playback => ScanError::Playback(err.message),
            MediaErrorKind::Other => ScanError::CameraUnavailable(err.message),
        }
    }

    /// Whether retrying without changing hardware or transport can succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ScanError::PermissionDenied(_)
                | ScanError::DeviceBusy(_)
                | ScanError::Timeout(_)
                | ScanError::Playback(_)
                | ScanError::SinkNotReady
        )
    }

    /// What the user should do about it
    pub fn remediation(&self, caps: &DeviceCapabilities) -> &'static str {
        let mobile = caps.is_mobile_platform;
        match self {
            ScanError::CameraUnavailable(_) if mobile => {
                "This browser cannot access the camera; open the page in Chrome or Safari"
            }
            ScanError::CameraUnavailable(_) => "Connect a camera and try again",
            ScanError::PermissionDenied(_) => match caps.device_class() {
                DeviceClass::Android => {
                    "Tap the lock icon in the address bar, allow camera, then reload"
                }
                DeviceClass::Mobile => "Allow camera access in Settings > Safari > Camera, then reload",
                DeviceClass::Desktop => "Allow camera access for this site and try again",
            },
            ScanError::DeviceBusy(_) => "Close other apps using the camera and try again",
            ScanError::UnsupportedConstraints(_) => "Try another camera",
            ScanError::InsecureContext => {
                "Camera access on phones requires HTTPS (e.g. ngrok / Cloudflare Tunnel) or localhost"
            }
            ScanError::Timeout(_) | ScanError::Playback(_) => {
                "The camera did not start; try again"
            }
            ScanError::SinkNotReady => "Waiting for the camera to deliver frames",
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Scan(e) => write!(f, "Scan error: {}", e),
            AppError::Backend(e) => write!(f, "Backend error: {}", e),
            AppError::Config(e) => write!(f, "Configuration error: {}", e),
            AppError::Io(e) => write!(f, "I/O error: {}", e),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanError::CameraUnavailable(msg) => write!(f, "Camera unavailable: {}", msg),
            ScanError::PermissionDenied(msg) => write!(f, "Camera permission denied: {}", msg),
            ScanError::DeviceBusy(msg) => write!(f, "Camera is busy: {}", msg),
            ScanError::UnsupportedConstraints(msg) => {
                write!(f, "Unsupported camera constraints: {}", msg)
            }
            ScanError::InsecureContext => write!(f, "Camera requires a secure context"),
            ScanError::Timeout(msg) => write!(f, "Timed out waiting for video: {}", msg),
            ScanError::Playback(msg) => write!(f, "Video playback failed: {}", msg),
            ScanError::SinkNotReady => write!(f, "Video sink is not ready"),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Failed to read config: {}", e),
            ConfigError::Parse(e) => write!(f, "Failed to parse config: {}", e),
            ConfigError::Invalid(msg) => write!(f, "Invalid config: {}", msg),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Scan(e) => Some(e),
            AppError::Backend(e) => Some(e),
            AppError::Config(e) => Some(e),
            AppError::Io(e) => Some(e),
            AppError::Other(_) => None,
        }
    }
}

impl std::error::Error for ScanError {}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            ConfigError::Invalid(_) => None,
        }
    }
}

impl From<MediaError> for ScanError {
    fn from(err: MediaError) -> Self {
        ScanError::from_media(err)
    }
}

// Conversions from sub-errors to AppError
impl From<ScanError> for AppError {
    fn from(err: ScanError) -> Self {
        AppError::Scan(err)
    }
}

impl From<BackendError> for AppError {
    fn from(err: BackendError) -> Self {
        AppError::Backend(err)
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err)
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err)
    }
}
