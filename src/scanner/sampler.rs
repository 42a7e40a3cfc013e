// SPDX-License-Identifier: GPL-3.0-only

//! Frame sampling
//!
//! Copies the sink's current frame into a tightly packed RGBA raster.
//! Samples are never kept across ticks.

use crate::backends::camera::format_converters::{mjpeg_to_rgba, rgb_to_rgba, yuyv_to_rgba};
use crate::backends::camera::{CameraFrame, MediaStream, PixelFormat, VideoSink};
use crate::errors::{ScanError, ScanResult};
use crate::scanner::acquire::StreamHandle;

/// One frame's pixels, RGBA without row padding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterSample {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl RasterSample {
    /// Wrap packed RGBA; `None` if the buffer is short
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        (data.len() >= width as usize * height as usize * 4).then_some(Self {
            width,
            height,
            data,
        })
    }

    /// Convert any sink frame to a packed RGBA raster
    pub fn from_frame(frame: &CameraFrame) -> Option<Self> {
        let (width, height, data) = match frame.format {
            PixelFormat::RGBA => (frame.width, frame.height, copy_rgba_without_stride(frame)),
            PixelFormat::YUYV => (
                frame.width,
                frame.height,
                yuyv_to_rgba(&frame.data, frame.width, frame.height, frame.stride),
            ),
            PixelFormat::MJPEG => mjpeg_to_rgba(&frame.data).ok()?,
            PixelFormat::RGB24 => (frame.width, frame.height, rgb_to_rgba(&frame.data)),
        };
        Self::from_rgba(width, height, data)
    }

    /// One row of RGBA pixels
    pub fn row(&self, y: u32) -> &[u8] {
        let row_bytes = self.width as usize * 4;
        let start = y as usize * row_bytes;
        &self.data[start..start + row_bytes]
    }
}

/// Capture the current frame of a handle's sink
pub fn sample<S, V>(handle: &StreamHandle<S, V>) -> ScanResult<RasterSample>
where
    S: MediaStream,
    V: VideoSink<S>,
{
    sample_sink(handle.sink().as_ref())
}

/// Capture the current frame of a sink
///
/// Fails with `SinkNotReady` while the sink has nothing decoded.
pub fn sample_sink<S: MediaStream, V: VideoSink<S>>(sink: &V) -> ScanResult<RasterSample> {
    let (width, height) = sink.natural_size();
    if width == 0 || height == 0 {
        return Err(ScanError::SinkNotReady);
    }
    let frame = sink.current_frame().ok_or(ScanError::SinkNotReady)?;
    RasterSample::from_frame(&frame).ok_or(ScanError::SinkNotReady)
}

fn copy_rgba_without_stride(frame: &CameraFrame) -> Vec<u8> {
    let width = frame.width as usize;
    let height = frame.height as usize;
    let stride = frame.stride as usize;

    let mut result = Vec::with_capacity(width * height * 4);

    for y in 0..height {
        let row_start = y * stride;
        let row_end = row_start + width * 4;
        if row_end <= frame.data.len() {
            result.extend_from_slice(&frame.data[row_start..row_end]);
        }
    }

    result
}
