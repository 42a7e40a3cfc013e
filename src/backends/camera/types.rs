// SPDX-License-Identifier: GPL-3.0-only
// Shared types for camera backend abstraction

//! Shared types for camera backends

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Pixel format of a frame buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// RGBA - 32-bit with alpha (4 bytes per pixel)
    /// The only format sinks hand to the sampler
    RGBA,
    /// YUYV - Packed 4:2:2 (Y0 U Y1 V interleaved)
    /// Common raw format from webcam sensors
    YUYV,
    /// Motion JPEG - each buffer is a complete JPEG image
    MJPEG,
    /// RGB24 - 24-bit RGB (3 bytes per pixel, no alpha)
    RGB24,
}

impl PixelFormat {
    /// V4L2 FourCC code for this format
    pub fn fourcc(&self) -> [u8; 4] {
        match self {
            Self::RGBA => *b"AB24",
            Self::YUYV => *b"YUYV",
            Self::MJPEG => *b"MJPG",
            Self::RGB24 => *b"RGB3",
        }
    }

    /// Parse a V4L2 FourCC code
    pub fn from_fourcc(code: &[u8; 4]) -> Option<Self> {
        match code {
            b"AB24" | b"RGBA" => Some(Self::RGBA),
            b"YUYV" | b"YUY2" => Some(Self::YUYV),
            b"MJPG" | b"JPEG" => Some(Self::MJPEG),
            b"RGB3" => Some(Self::RGB24),
            _ => None,
        }
    }

}

/// A single frame from a video sink
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    pub data: Arc<[u8]>,
    pub format: PixelFormat,
    /// Row stride in bytes (may include padding)
    pub stride: u32,
    /// Timestamp when frame was captured
    pub captured_at: Instant,
}

impl CameraFrame {
    /// Wrap tightly packed RGBA data
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            data: Arc::from(data),
            format: PixelFormat::RGBA,
            stride: width * 4,
            captured_at: Instant::now(),
        }
    }
}

/// Which way the camera faces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacingMode {
    /// Front camera
    User,
    /// Rear camera
    Environment,
}

/// Facing-mode requirement of a constraint set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacingConstraint {
    /// The stream must come from a camera facing this way
    Exact(FacingMode),
    /// Prefer this facing, accept any
    Ideal(FacingMode),
}

impl FacingConstraint {
    pub fn is_exact(&self) -> bool {
        matches!(self, FacingConstraint::Exact(_))
    }
}

/// Numeric constraint with optional lower bound, preference and upper bound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConstraintRange {
    pub min: Option<u32>,
    pub ideal: Option<u32>,
    pub max: Option<u32>,
}

impl ConstraintRange {
    pub const fn any() -> Self {
        Self {
            min: None,
            ideal: None,
            max: None,
        }
    }

    pub const fn new(min: Option<u32>, ideal: Option<u32>, max: Option<u32>) -> Self {
        Self { min, ideal, max }
    }

    /// True if no bound or preference is set
    pub fn is_unconstrained(&self) -> bool {
        self.min.is_none() && self.ideal.is_none() && self.max.is_none()
    }

    /// Check a negotiated value against the hard bounds
    pub fn accepts(&self, value: u32) -> bool {
        self.min.is_none_or(|min| value >= min) && self.max.is_none_or(|max| value <= max)
    }

    /// Value to request: ideal, else the nearest bound
    pub fn target(&self) -> Option<u32> {
        self.ideal.or(self.min).or(self.max)
    }
}

/// Constraint set handed to the platform capture facility
///
/// Audio is never requested.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StreamConstraints {
    pub facing: Option<FacingConstraint>,
    pub width: ConstraintRange,
    pub height: ConstraintRange,
    pub frame_rate: ConstraintRange,
}

impl StreamConstraints {
    /// Conservative ceiling for Android devices, rear camera required
    pub fn android() -> Self {
        Self {
            facing: Some(FacingConstraint::Exact(FacingMode::Environment)),
            width: ConstraintRange::new(Some(640), Some(1280), Some(1920)),
            height: ConstraintRange::new(Some(480), Some(720), Some(1080)),
            frame_rate: ConstraintRange::new(Some(15), Some(24), Some(30)),
        }
    }

    /// Relaxed profile for other phones and tablets
    pub fn mobile() -> Self {
        Self {
            facing: Some(FacingConstraint::Ideal(FacingMode::Environment)),
            width: ConstraintRange::new(None, Some(1280), Some(1920)),
            height: ConstraintRange::new(None, Some(720), Some(1080)),
            frame_rate: ConstraintRange::new(None, Some(30), Some(60)),
        }
    }

    /// Most permissive tuned profile, for desktops
    pub fn desktop() -> Self {
        Self {
            facing: Some(FacingConstraint::Ideal(FacingMode::Environment)),
            width: ConstraintRange::new(None, Some(1920), None),
            height: ConstraintRange::new(None, Some(1080), None),
            frame_rate: ConstraintRange::new(None, Some(60), None),
        }
    }

    /// Any camera, no preferences
    pub fn permissive() -> Self {
        Self::default()
    }

    /// True for the `video: true` set
    pub fn is_permissive(&self) -> bool {
        self.facing.is_none()
            && self.width.is_unconstrained()
            && self.height.is_unconstrained()
            && self.frame_rate.is_unconstrained()
    }

    /// Check a negotiated mode against the hard bounds
    pub fn is_satisfied_by(&self, width: u32, height: u32, fps: Option<u32>) -> bool {
        self.width.accepts(width)
            && self.height.accepts(height)
            && fps.is_none_or(|fps| self.frame_rate.accepts(fps))
    }
}

impl std::fmt::Display for StreamConstraints {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_permissive() {
            return write!(f, "any camera");
        }
        let dim = |r: &ConstraintRange| {
            r.target()
                .map(|v| v.to_string())
                .unwrap_or_else(|| "*".to_string())
        };
        write!(
            f,
            "{}x{} @ {}fps",
            dim(&self.width),
            dim(&self.height),
            dim(&self.frame_rate)
        )?;
        match self.facing {
            Some(FacingConstraint::Exact(mode)) => write!(f, " (exactly {:?})", mode),
            Some(FacingConstraint::Ideal(mode)) => write!(f, " (prefer {:?})", mode),
            None => Ok(()),
        }
    }
}

/// Failure category reported by the platform capture facility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaErrorKind {
    /// User or policy declined access
    NotAllowed,
    /// No camera matched
    NotFound,
    /// The platform cannot capture at all
    NotSupported,
    /// Hardware is held by another process
    NotReadable,
    /// The constraint set cannot be met
    Overconstrained,
    /// The sink failed to load or play the stream
    Playback,
    /// Anything else
    Other,
}

impl MediaErrorKind {
    /// Parse a DOM exception name (`NotAllowedError`, ...)
    pub fn from_dom_name(name: &str) -> Self {
        match name {
            "NotAllowedError" | "PermissionDeniedError" | "SecurityError" => Self::NotAllowed,
            "NotFoundError" | "DevicesNotFoundError" => Self::NotFound,
            "NotSupportedError" | "TypeError" => Self::NotSupported,
            "NotReadableError" | "TrackStartError" | "AbortError" => Self::NotReadable,
            "OverconstrainedError" | "ConstraintNotSatisfiedError" => Self::Overconstrained,
            "MediaError" | "NotPlayableError" => Self::Playback,
            _ => Self::Other,
        }
    }
}

/// Error returned by the platform capture facility or a sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaError {
    pub kind: MediaErrorKind,
    pub message: String,
}

impl MediaError {
    pub fn new(kind: MediaErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for MediaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for MediaError {}

/// Represents a capture device node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraDevice {
    pub name: String,
    pub path: String,
    pub driver: String,
}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Error types for backend operations
#[derive(Debug, Clone)]
pub enum BackendError {
    /// Backend is not available on this system
    NotAvailable(String),
    /// Camera device not found
    DeviceNotFound(String),
    /// Format not supported
    FormatNotSupported(String),
    /// General I/O error
    IoError(String),
    /// Other errors
    Other(String),
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::NotAvailable(msg) => write!(f, "Backend not available: {}", msg),
            BackendError::DeviceNotFound(msg) => write!(f, "Device not found: {}", msg),
            BackendError::FormatNotSupported(msg) => write!(f, "Format not supported: {}", msg),
            BackendError::IoError(msg) => write!(f, "I/O error: {}", msg),
            BackendError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for BackendError {}

impl From<std::io::Error> for BackendError {
    fn from(err: std::io::Error) -> Self {
        BackendError::IoError(err.to_string())
    }
}
