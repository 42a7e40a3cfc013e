// SPDX-License-Identifier: GPL-3.0-only

//! Video4Linux2 capture backend
//!
//! Opens a `/dev/video*` node with the v4l crate, negotiates a mode close
//! to the constraint set's ideal values, and runs a capture thread that
//! keeps the latest frame (converted to RGBA) for the sink to draw.

use super::format_converters::{mjpeg_to_rgba, rgb_to_rgba, yuyv_to_rgba};
use super::types::*;
use super::{CameraBackend, CameraBackendType, MediaStream, VideoSink};
use crate::constants::{timing, v4l2 as v4l2_consts};
use std::future::Future;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use tokio::sync::oneshot;
use tracing::{debug, info, trace, warn};
use v4l::FourCC;
use v4l::buffer::Type;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;
use v4l::video::capture::Parameters;

/// Formats tried during negotiation, in order of preference
const NEGOTIATION_ORDER: [PixelFormat; 3] =
    [PixelFormat::YUYV, PixelFormat::MJPEG, PixelFormat::RGB24];

/// List `/dev/video*` nodes that report video capture capability
pub fn list_video_devices() -> Vec<CameraDevice> {
    let mut paths: Vec<_> = std::fs::read_dir("/dev")
        .into_iter()
        .flatten()
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            path.to_str()
                .map(|p| p.starts_with(v4l2_consts::DEVICE_PREFIX))
                .unwrap_or(false)
        })
        .collect();
    paths.sort();

    paths
        .into_iter()
        .filter_map(|path| {
            let dev = Device::with_path(&path).ok()?;
            let caps = dev.query_caps().ok()?;
            if !caps
                .capabilities
                .contains(v4l::capability::Flags::VIDEO_CAPTURE)
            {
                return None;
            }
            Some(CameraDevice {
                name: caps.card,
                path: path.to_string_lossy().into_owned(),
                driver: caps.driver,
            })
        })
        .collect()
}

/// Map an OS error from device access onto the capture error taxonomy
pub fn media_error_from_io(err: &io::Error, path: &str) -> MediaError {
    let kind = match err.raw_os_error() {
        Some(libc::EACCES) | Some(libc::EPERM) => MediaErrorKind::NotAllowed,
        Some(libc::EBUSY) => MediaErrorKind::NotReadable,
        Some(libc::ENOENT) | Some(libc::ENODEV) | Some(libc::ENXIO) => MediaErrorKind::NotFound,
        _ => match err.kind() {
            io::ErrorKind::PermissionDenied => MediaErrorKind::NotAllowed,
            io::ErrorKind::NotFound => MediaErrorKind::NotFound,
            _ => MediaErrorKind::Other,
        },
    };
    MediaError::new(kind, format!("{}: {}", path, err))
}

/// V4L2 camera backend
///
/// Uses the configured device node, or the first capture-capable node.
#[derive(Debug, Clone, Default)]
pub struct V4l2Backend {
    device_path: Option<String>,
}

impl V4l2Backend {
    pub fn new(device_path: Option<String>) -> Self {
        Self { device_path }
    }

    fn resolve_path(&self) -> Option<String> {
        self.device_path
            .clone()
            .or_else(|| list_video_devices().into_iter().next().map(|d| d.path))
    }
}

impl CameraBackend for V4l2Backend {
    type Stream = V4l2Stream;

    fn has_capture_api(&self) -> bool {
        match &self.device_path {
            Some(path) => Path::new(path).exists(),
            None => !list_video_devices().is_empty(),
        }
    }

    fn open_stream(
        &self,
        constraints: &StreamConstraints,
    ) -> impl Future<Output = Result<V4l2Stream, MediaError>> + Send {
        let constraints = constraints.clone();
        let path = self.resolve_path();

        async move {
            if constraints.facing.is_some_and(|f| f.is_exact()) {
                return Err(MediaError::new(
                    MediaErrorKind::Overconstrained,
                    "V4L2 devices do not report which way they face",
                ));
            }
            let path = path.ok_or_else(|| {
                MediaError::new(MediaErrorKind::NotFound, "No V4L2 capture device found")
            })?;
            V4l2Stream::open(path, constraints).await
        }
    }

    fn backend_type(&self) -> CameraBackendType {
        CameraBackendType::V4l2
    }
}

/// Mode the driver agreed to
#[derive(Debug, Clone, Copy)]
struct NegotiatedMode {
    width: u32,
    height: u32,
    stride: u32,
    fps: Option<u32>,
    format: PixelFormat,
}

/// A running V4L2 capture
pub struct V4l2Stream {
    path: String,
    mode: NegotiatedMode,
    running: Arc<AtomicBool>,
    latest: Arc<Mutex<Option<CameraFrame>>>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl V4l2Stream {
    async fn open(path: String, constraints: StreamConstraints) -> Result<Self, MediaError> {
        let running = Arc::new(AtomicBool::new(true));
        let latest = Arc::new(Mutex::new(None));
        let (ready_tx, ready_rx) = oneshot::channel();

        let thread = std::thread::Builder::new()
            .name("v4l2-capture".to_string())
            .spawn({
                let path = path.clone();
                let running = Arc::clone(&running);
                let latest = Arc::clone(&latest);
                move || capture_loop(&path, &constraints, ready_tx, latest, running)
            })
            .map_err(|e| MediaError::new(MediaErrorKind::Other, e.to_string()))?;

        // A failed negotiation ends the thread on its own
        let mode = match ready_rx.await {
            Ok(result) => result?,
            Err(_) => {
                return Err(MediaError::new(
                    MediaErrorKind::Other,
                    "capture thread exited during negotiation",
                ));
            }
        };

        info!(
            path = %path,
            width = mode.width,
            height = mode.height,
            fps = ?mode.fps,
            format = ?mode.format,
            "V4L2 stream opened"
        );

        Ok(Self {
            path,
            mode,
            running,
            latest,
            thread: Mutex::new(Some(thread)),
        })
    }

    fn latest_frame(&self) -> Option<CameraFrame> {
        self.latest
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl MediaStream for V4l2Stream {
    fn stop_tracks(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        info!(path = %self.path, "Stopping V4L2 capture");

        let handle = self.thread.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(handle) = handle
            && handle.join().is_err()
        {
            warn!(path = %self.path, "V4L2 capture thread panicked");
        }
    }

    fn live_tracks(&self) -> usize {
        usize::from(self.running.load(Ordering::SeqCst))
    }

    fn label(&self) -> String {
        format!(
            "{} {}x{} {:?}",
            self.path, self.mode.width, self.mode.height, self.mode.format
        )
    }
}

impl Drop for V4l2Stream {
    fn drop(&mut self) {
        self.stop_tracks();
    }
}

/// Capture thread body: negotiate, report, then stream until stopped
fn capture_loop(
    path: &str,
    constraints: &StreamConstraints,
    ready: oneshot::Sender<Result<NegotiatedMode, MediaError>>,
    latest: Arc<Mutex<Option<CameraFrame>>>,
    running: Arc<AtomicBool>,
) {
    static FRAME_COUNTER: AtomicU64 = AtomicU64::new(0);

    let (dev, mode) = match negotiate(path, constraints) {
        Ok(negotiated) => negotiated,
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };

    let mut stream = match MmapStream::with_buffers(&dev, Type::VideoCapture, v4l2_consts::BUFFER_COUNT) {
        Ok(stream) => stream,
        Err(e) => {
            let _ = ready.send(Err(media_error_from_io(&e, path)));
            return;
        }
    };

    if ready.send(Ok(mode)).is_err() {
        debug!(path, "Stream request abandoned before first frame");
        return;
    }

    while running.load(Ordering::SeqCst) {
        match stream.next() {
            Ok((buf, meta)) => {
                let frame_num = FRAME_COUNTER.fetch_add(1, Ordering::Relaxed);
                match convert_buffer(buf, &mode) {
                    Some(frame) => {
                        *latest.lock().unwrap_or_else(|e| e.into_inner()) = Some(frame);
                    }
                    None => {
                        if frame_num % 30 == 0 {
                            debug!(frame = frame_num, size = buf.len(), "Dropped undecodable buffer");
                        }
                    }
                }
                if frame_num % 300 == 0 {
                    trace!(frame = frame_num, sequence = meta.sequence, "V4L2 frame captured");
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to dequeue V4L2 buffer");
                std::thread::sleep(std::time::Duration::from_millis(
                    v4l2_consts::RETRY_DELAY_MS,
                ));
            }
        }
    }

    *latest.lock().unwrap_or_else(|e| e.into_inner()) = None;
    debug!(path, "V4L2 capture loop ended");
}

fn negotiate(
    path: &str,
    constraints: &StreamConstraints,
) -> Result<(Device, NegotiatedMode), MediaError> {
    let dev = Device::with_path(path).map_err(|e| media_error_from_io(&e, path))?;

    let mut requested = dev.format().map_err(|e| media_error_from_io(&e, path))?;
    if let Some(width) = constraints.width.target() {
        requested.width = width;
    }
    if let Some(height) = constraints.height.target() {
        requested.height = height;
    }

    let mut accepted = None;
    for candidate in NEGOTIATION_ORDER {
        requested.fourcc = FourCC::new(&candidate.fourcc());
        match dev.set_format(&requested) {
            Ok(format) if format.fourcc == requested.fourcc => {
                accepted = Some((format, candidate));
                break;
            }
            Ok(format) => {
                debug!(path, wanted = ?candidate, got = ?format.fourcc, "Driver substituted format");
            }
            Err(e) => debug!(path, wanted = ?candidate, error = %e, "Format rejected"),
        }
    }

    let (format, pixel_format) = accepted.ok_or_else(|| {
        MediaError::new(
            MediaErrorKind::NotSupported,
            format!("{} offers no YUYV, MJPG or RGB3 mode", path),
        )
    })?;

    let params = match constraints.frame_rate.target() {
        Some(fps) => dev.set_params(&Parameters::with_fps(fps)),
        None => dev.params(),
    };
    let fps = params.ok().and_then(|p| {
        (p.interval.numerator > 0).then(|| p.interval.denominator / p.interval.numerator)
    });

    if !constraints.is_satisfied_by(format.width, format.height, fps) {
        return Err(MediaError::new(
            MediaErrorKind::Overconstrained,
            format!(
                "{} negotiated {}x{} @ {:?}fps, outside {}",
                path, format.width, format.height, fps, constraints
            ),
        ));
    }

    let mode = NegotiatedMode {
        width: format.width,
        height: format.height,
        stride: format.stride,
        fps,
        format: pixel_format,
    };
    Ok((dev, mode))
}

fn convert_buffer(buf: &[u8], mode: &NegotiatedMode) -> Option<CameraFrame> {
    let (width, height, rgba) = match mode.format {
        PixelFormat::YUYV => (
            mode.width,
            mode.height,
            yuyv_to_rgba(buf, mode.width, mode.height, mode.stride),
        ),
        PixelFormat::MJPEG => mjpeg_to_rgba(buf).ok()?,
        PixelFormat::RGB24 => {
            let row_bytes = mode.width as usize * 3;
            let stride = (mode.stride as usize).max(row_bytes);
            let packed: Vec<u8> = buf
                .chunks(stride)
                .take(mode.height as usize)
                .flat_map(|row| row[..row_bytes.min(row.len())].iter().copied())
                .collect();
            (mode.width, mode.height, rgb_to_rgba(&packed))
        }
        PixelFormat::RGBA => (mode.width, mode.height, buf.to_vec()),
    };

    if rgba.len() < (width as usize) * (height as usize) * 4 {
        return None;
    }
    Some(CameraFrame::from_rgba(width, height, rgba))
}

/// Sink for a V4L2 stream; "playing" once the first frame has arrived
#[derive(Default)]
pub struct V4l2Sink {
    source: Mutex<Option<Arc<V4l2Stream>>>,
    inline_playback: AtomicBool,
}

impl V4l2Sink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether inline playback was requested
    pub fn inline_playback(&self) -> bool {
        self.inline_playback.load(Ordering::SeqCst)
    }

    fn source(&self) -> Option<Arc<V4l2Stream>> {
        self.source.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl VideoSink<V4l2Stream> for V4l2Sink {
    fn bind(&self, stream: Arc<V4l2Stream>) {
        *self.source.lock().unwrap_or_else(|e| e.into_inner()) = Some(stream);
    }

    fn unbind(&self) {
        self.source.lock().unwrap_or_else(|e| e.into_inner()).take();
    }

    fn configure_inline_playback(&self) {
        // Native capture has no autoplay policy; recorded for parity
        self.inline_playback.store(true, Ordering::SeqCst);
    }

    fn wait_until_playing(&self) -> impl Future<Output = Result<(), MediaError>> + Send {
        let source = self.source();
        async move {
            let stream = source.ok_or_else(|| {
                MediaError::new(MediaErrorKind::Playback, "No stream bound to sink")
            })?;
            loop {
                if stream.live_tracks() == 0 {
                    return Err(MediaError::new(
                        MediaErrorKind::Playback,
                        "Capture stopped before the first frame",
                    ));
                }
                if stream.latest_frame().is_some() {
                    return Ok(());
                }
                tokio::time::sleep(timing::READY_POLL_INTERVAL).await;
            }
        }
    }

    fn natural_size(&self) -> (u32, u32) {
        self.source()
            .and_then(|s| s.latest_frame())
            .map(|f| (f.width, f.height))
            .unwrap_or((0, 0))
    }

    fn current_frame(&self) -> Option<CameraFrame> {
        self.source().and_then(|s| s.latest_frame())
    }
}
