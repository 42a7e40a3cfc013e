// SPDX-License-Identifier: GPL-3.0-only

//! Camera backend abstraction
//!
//! Three traits stand in for a platform's media-capture facility:
//!
//! ```text
//! ┌─────────────────────┐
//! │   Scan session      │
//! └──────────┬──────────┘
//!            │ open_stream(constraints)
//!            ▼
//! ┌─────────────────────┐        ┌─────────────────────┐
//! │  CameraBackend      │ ─────▶ │  MediaStream        │  ← live tracks
//! └─────────────────────┘        └──────────┬──────────┘
//!                                           │ bind
//!                                           ▼
//!                                ┌─────────────────────┐
//!                                │  VideoSink          │  ← frames are drawn here
//!                                └─────────────────────┘
//! ```

pub mod format_converters;
pub mod types;
pub mod v4l2;

pub use types::*;

use std::future::Future;
use std::sync::Arc;

/// Platform media-capture facility
///
/// The `getUserMedia` equivalent. Backends are shared between a session
/// and its tick loop, so they must be `Send + Sync`.
pub trait CameraBackend: Send + Sync + 'static {
    /// Stream type produced by this backend
    type Stream: MediaStream;

    /// Whether the modern capture API is present at all
    fn has_capture_api(&self) -> bool;

    /// Whether a legacy capture API is present
    fn has_legacy_capture_api(&self) -> bool {
        false
    }

    /// Open a video stream satisfying `constraints`
    ///
    /// Fails with `Overconstrained` when the constraint set cannot be met,
    /// which is the only failure the acquirer retries.
    fn open_stream(
        &self,
        constraints: &StreamConstraints,
    ) -> impl Future<Output = Result<Self::Stream, MediaError>> + Send;

    /// Get the backend type identifier
    fn backend_type(&self) -> CameraBackendType;
}

/// A live video stream holding the camera
pub trait MediaStream: Send + Sync + 'static {
    /// Stop every track; must be idempotent
    fn stop_tracks(&self);

    /// Number of tracks still live
    fn live_tracks(&self) -> usize;

    /// Human-readable description for logs
    fn label(&self) -> String;
}

/// Element a stream is bound to for playback and frame reads
pub trait VideoSink<S: MediaStream>: Send + Sync + 'static {
    /// Attach a stream as the sink's source
    fn bind(&self, stream: Arc<S>);

    /// Detach the current source, if any
    fn unbind(&self);

    /// Mute and request inline playback (needed for autoplay on phones)
    fn configure_inline_playback(&self);

    /// Resolve once metadata is loaded and playback has started
    fn wait_until_playing(&self) -> impl Future<Output = Result<(), MediaError>> + Send;

    /// Native size of the decoded video; zero while nothing is decoded
    fn natural_size(&self) -> (u32, u32);

    /// Current frame as the sink would draw it
    fn current_frame(&self) -> Option<CameraFrame>;
}

/// Camera backend type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CameraBackendType {
    /// Still images served as a stream
    Virtual,
    /// Video4Linux2 capture device
    V4l2,
    /// Test or embedder-provided backend
    Custom,
}

impl std::fmt::Display for CameraBackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraBackendType::Virtual => write!(f, "virtual"),
            CameraBackendType::V4l2 => write!(f, "V4L2"),
            CameraBackendType::Custom => write!(f, "custom"),
        }
    }
}
