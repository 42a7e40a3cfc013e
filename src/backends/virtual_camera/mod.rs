// SPDX-License-Identifier: GPL-3.0-only

//! Virtual camera backend serving still images as a live stream
//!
//! Lets the scanner run without hardware: a file or directory of images
//! becomes a looping video.
//!
//! ```text
//! image files ──▶ Vec<CameraFrame> ──▶ VirtualStream ──▶ VirtualSink
//!                                      (frame index    (current frame
//!                                       from elapsed    at draw time)
//!                                       time)
//! ```

mod file_source;

pub use file_source::{load_frames, load_image_as_frame};

use crate::backends::camera::types::{
    BackendResult, CameraFrame, FacingConstraint, FacingMode, MediaError, MediaErrorKind,
    StreamConstraints,
};
use crate::backends::camera::{CameraBackend, CameraBackendType, MediaStream, VideoSink};
use crate::constants::virtual_camera as vc_timing;
use std::future::Future;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

/// Backend that plays a fixed list of frames in a loop
#[derive(Debug, Clone)]
pub struct VirtualCameraBackend {
    frames: Arc<[CameraFrame]>,
    frame_duration: Duration,
    facing: Option<FacingMode>,
}

impl VirtualCameraBackend {
    /// Serve these frames, posing as a rear camera
    pub fn from_frames(frames: Vec<CameraFrame>) -> Self {
        Self {
            frames: Arc::from(frames),
            frame_duration: vc_timing::IMAGE_STREAM_FRAME_DURATION,
            facing: Some(FacingMode::Environment),
        }
    }

    /// Load an image file or directory of images
    pub fn from_path(path: &Path) -> BackendResult<Self> {
        let frames = load_frames(path)?;
        info!(path = %path.display(), frames = frames.len(), "Virtual camera source loaded");
        Ok(Self::from_frames(frames))
    }

    /// How long each frame is shown
    pub fn with_frame_duration(mut self, duration: Duration) -> Self {
        self.frame_duration = duration;
        self
    }

    /// Which way the virtual camera claims to face (`None` = unknown)
    pub fn with_facing(mut self, facing: Option<FacingMode>) -> Self {
        self.facing = facing;
        self
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    fn check_constraints(&self, constraints: &StreamConstraints) -> Result<(), MediaError> {
        let Some(first) = self.frames.first() else {
            return Err(MediaError::new(
                MediaErrorKind::NotFound,
                "Virtual camera has no frames",
            ));
        };

        if let Some(FacingConstraint::Exact(wanted)) = constraints.facing
            && self.facing != Some(wanted)
        {
            return Err(MediaError::new(
                MediaErrorKind::Overconstrained,
                format!("No camera facing {:?}", wanted),
            ));
        }

        if !constraints.is_satisfied_by(first.width, first.height, None) {
            return Err(MediaError::new(
                MediaErrorKind::Overconstrained,
                format!(
                    "{}x{} source does not satisfy {}",
                    first.width, first.height, constraints
                ),
            ));
        }
        Ok(())
    }
}

impl CameraBackend for VirtualCameraBackend {
    type Stream = VirtualStream;

    fn has_capture_api(&self) -> bool {
        true
    }

    fn open_stream(
        &self,
        constraints: &StreamConstraints,
    ) -> impl Future<Output = Result<VirtualStream, MediaError>> + Send {
        let result = self.check_constraints(constraints).map(|()| VirtualStream {
            frames: Arc::clone(&self.frames),
            frame_duration: self.frame_duration,
            started: Instant::now(),
            live: AtomicBool::new(true),
        });
        if let Err(e) = &result {
            debug!(error = %e, "Virtual camera refused constraints");
        }
        std::future::ready(result)
    }

    fn backend_type(&self) -> CameraBackendType {
        CameraBackendType::Virtual
    }
}

/// Looping playback of the backend's frames
#[derive(Debug)]
pub struct VirtualStream {
    frames: Arc<[CameraFrame]>,
    frame_duration: Duration,
    started: Instant,
    live: AtomicBool,
}

impl VirtualStream {
    /// Frame shown at the current instant; `None` once stopped
    pub fn current_frame(&self) -> Option<CameraFrame> {
        if !self.live.load(Ordering::SeqCst) || self.frames.is_empty() {
            return None;
        }
        let step = self.frame_duration.as_millis().max(1);
        let index = (self.started.elapsed().as_millis() / step) as usize % self.frames.len();
        self.frames.get(index).cloned()
    }
}

impl MediaStream for VirtualStream {
    fn stop_tracks(&self) {
        if self.live.swap(false, Ordering::SeqCst) {
            debug!("Virtual camera stream stopped");
        }
    }

    fn live_tracks(&self) -> usize {
        usize::from(self.live.load(Ordering::SeqCst))
    }

    fn label(&self) -> String {
        match self.frames.first() {
            Some(f) => format!("virtual {}x{} ({} frames)", f.width, f.height, self.frames.len()),
            None => "virtual (empty)".to_string(),
        }
    }
}

/// Sink that draws whatever frame the bound stream is showing
#[derive(Debug, Default)]
pub struct VirtualSink {
    source: Mutex<Option<Arc<VirtualStream>>>,
    inline_playback: AtomicBool,
}

impl VirtualSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether inline playback was requested
    pub fn inline_playback(&self) -> bool {
        self.inline_playback.load(Ordering::SeqCst)
    }

    fn source(&self) -> Option<Arc<VirtualStream>> {
        self.source.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl VideoSink<VirtualStream> for VirtualSink {
    fn bind(&self, stream: Arc<VirtualStream>) {
        *self.source.lock().unwrap_or_else(|e| e.into_inner()) = Some(stream);
    }

    fn unbind(&self) {
        self.source.lock().unwrap_or_else(|e| e.into_inner()).take();
    }

    fn configure_inline_playback(&self) {
        self.inline_playback.store(true, Ordering::SeqCst);
    }

    fn wait_until_playing(&self) -> impl Future<Output = Result<(), MediaError>> + Send {
        let result = match self.source() {
            Some(stream) if stream.live_tracks() > 0 => Ok(()),
            Some(_) => Err(MediaError::new(
                MediaErrorKind::Playback,
                "Bound stream has no live tracks",
            )),
            None => Err(MediaError::new(
                MediaErrorKind::Playback,
                "No stream bound to sink",
            )),
        };
        std::future::ready(result)
    }

    fn natural_size(&self) -> (u32, u32) {
        self.current_frame()
            .map(|f| (f.width, f.height))
            .unwrap_or((0, 0))
    }

    fn current_frame(&self) -> Option<CameraFrame> {
        self.source().and_then(|s| s.current_frame())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, value: u8) -> CameraFrame {
        CameraFrame::from_rgba(width, height, vec![value; (width * height * 4) as usize])
    }

    #[tokio::test]
    async fn test_small_source_is_overconstrained_for_android() {
        let backend = VirtualCameraBackend::from_frames(vec![solid(320, 240, 0)]);
        let err = backend
            .open_stream(&StreamConstraints::android())
            .await
            .unwrap_err();
        assert_eq!(err.kind, MediaErrorKind::Overconstrained);

        assert!(
            backend
                .open_stream(&StreamConstraints::permissive())
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_unknown_facing_fails_exact_constraint() {
        let backend =
            VirtualCameraBackend::from_frames(vec![solid(1280, 720, 0)]).with_facing(None);
        let err = backend
            .open_stream(&StreamConstraints::android())
            .await
            .unwrap_err();
        assert_eq!(err.kind, MediaErrorKind::Overconstrained);
    }

    #[tokio::test]
    async fn test_empty_backend_is_not_found() {
        let backend = VirtualCameraBackend::from_frames(Vec::new());
        let err = backend
            .open_stream(&StreamConstraints::permissive())
            .await
            .unwrap_err();
        assert_eq!(err.kind, MediaErrorKind::NotFound);
    }

    #[tokio::test(start_paused = true)]
    async fn test_frames_cycle_with_time() {
        let backend = VirtualCameraBackend::from_frames(vec![solid(2, 2, 0), solid(2, 2, 255)])
            .with_frame_duration(Duration::from_millis(100));
        let stream = backend
            .open_stream(&StreamConstraints::permissive())
            .await
            .unwrap();

        assert_eq!(stream.current_frame().unwrap().data[0], 0);
        tokio::time::advance(Duration::from_millis(150)).await;
        assert_eq!(stream.current_frame().unwrap().data[0], 255);
        tokio::time::advance(Duration::from_millis(100)).await;
        assert_eq!(stream.current_frame().unwrap().data[0], 0);
    }

    #[tokio::test]
    async fn test_sink_goes_dark_after_stop() {
        let backend = VirtualCameraBackend::from_frames(vec![solid(4, 3, 9)]);
        let stream = Arc::new(
            backend
                .open_stream(&StreamConstraints::desktop())
                .await
                .unwrap(),
        );
        let sink = VirtualSink::new();
        sink.bind(Arc::clone(&stream));
        sink.wait_until_playing().await.unwrap();
        assert_eq!(sink.natural_size(), (4, 3));

        stream.stop_tracks();
        stream.stop_tracks();
        assert_eq!(stream.live_tracks(), 0);
        assert_eq!(sink.natural_size(), (0, 0));
        assert!(sink.wait_until_playing().await.is_err());
    }
}
