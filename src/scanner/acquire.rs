// SPDX-License-Identifier: GPL-3.0-only

//! Camera stream acquisition
//!
//! Gating, one constraint relaxation, sink binding and a bounded wait for
//! playback. Every failure path releases whatever was acquired.

use crate::backends::camera::{
    CameraBackend, MediaErrorKind, MediaStream, StreamConstraints, VideoSink,
};
use crate::errors::{ScanError, ScanResult};
use crate::scanner::probe::{DeviceCapabilities, DeviceClass};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Owns a live stream and the sink it is bound to
///
/// Releasing stops every track and unbinds the sink. It happens at most
/// once, explicitly or on drop.
pub struct StreamHandle<S: MediaStream, V: VideoSink<S>> {
    stream: Arc<S>,
    sink: Arc<V>,
    released: AtomicBool,
}

impl<S: MediaStream, V: VideoSink<S>> StreamHandle<S, V> {
    fn new(stream: Arc<S>, sink: Arc<V>) -> Self {
        Self {
            stream,
            sink,
            released: AtomicBool::new(false),
        }
    }

    pub fn stream(&self) -> &Arc<S> {
        &self.stream
    }

    pub fn sink(&self) -> &Arc<V> {
        &self.sink
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    pub fn release(&self) {
        if self.released.swap(true, Ordering::SeqCst) {
            return;
        }
        self.stream.stop_tracks();
        self.sink.unbind();
        debug!(stream = %self.stream.label(), "Stream released");
    }
}

impl<S: MediaStream, V: VideoSink<S>> Drop for StreamHandle<S, V> {
    fn drop(&mut self) {
        self.release();
    }
}

/// Tuned constraint set for a device class
pub fn constraints_for(class: DeviceClass) -> StreamConstraints {
    match class {
        DeviceClass::Android => StreamConstraints::android(),
        DeviceClass::Mobile => StreamConstraints::mobile(),
        DeviceClass::Desktop => StreamConstraints::desktop(),
    }
}

/// Refuse before touching the capture facility
pub fn check_access(caps: &DeviceCapabilities) -> ScanResult<()> {
    if !caps.has_camera_api {
        return Err(ScanError::CameraUnavailable(
            "no media capture API".to_string(),
        ));
    }
    if caps.requires_secure_transport() {
        return Err(ScanError::InsecureContext);
    }
    Ok(())
}

/// Open with the tuned set, retrying once with any camera on a constraint
/// mismatch only
pub async fn open_with_fallback<B: CameraBackend>(
    backend: &B,
    caps: &DeviceCapabilities,
) -> ScanResult<B::Stream> {
    let primary = constraints_for(caps.device_class());
    debug!(backend = %backend.backend_type(), constraints = %primary, "Requesting camera stream");

    match backend.open_stream(&primary).await {
        Ok(stream) => Ok(stream),
        Err(e) if e.kind == MediaErrorKind::Overconstrained => {
            warn!(error = %e, "Tuned constraints unsatisfiable, retrying with any camera");
            backend
                .open_stream(&StreamConstraints::permissive())
                .await
                .map_err(ScanError::from)
        }
        Err(e) => Err(e.into()),
    }
}

/// Acquire a playing stream bound to `sink`
pub async fn acquire<B, V>(
    backend: &B,
    sink: Arc<V>,
    caps: &DeviceCapabilities,
    ready_timeout: Duration,
) -> ScanResult<StreamHandle<B::Stream, V>>
where
    B: CameraBackend,
    V: VideoSink<B::Stream>,
{
    check_access(caps)?;

    let stream = Arc::new(open_with_fallback(backend, caps).await?);
    let handle = StreamHandle::new(stream, sink);

    handle.sink.bind(Arc::clone(&handle.stream));
    if caps.is_mobile_platform {
        handle.sink.configure_inline_playback();
    }

    match tokio::time::timeout(ready_timeout, handle.sink.wait_until_playing()).await {
        Ok(Ok(())) => {
            info!(stream = %handle.stream.label(), "Camera stream playing");
            Ok(handle)
        }
        Ok(Err(e)) => {
            handle.release();
            Err(ScanError::Playback(e.message))
        }
        Err(_) => {
            handle.release();
            Err(ScanError::Timeout(format!(
                "no playback after {}ms",
                ready_timeout.as_millis()
            )))
        }
    }
}

/// Camera self-test: gate, open any camera, release immediately
pub async fn check_camera<B: CameraBackend>(
    backend: &B,
    caps: &DeviceCapabilities,
) -> ScanResult<()> {
    check_access(caps)?;
    let stream = backend
        .open_stream(&StreamConstraints::permissive())
        .await?;
    info!(stream = %stream.label(), "Camera self-test opened stream");
    stream.stop_tracks();
    Ok(())
}
