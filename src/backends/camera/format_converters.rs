// SPDX-License-Identifier: GPL-3.0-only
//! Pixel format conversion for native capture buffers
//!
//! Sinks only ever hand RGBA to the sampler, so every raw capture format
//! is converted here first.

use image::ImageFormat;

/// Convert YUYV (YUV 4:2:2) to tightly packed RGBA
///
/// YUYV format: Y0 U Y1 V - each 4-byte group encodes 2 pixels.
/// Uses BT.601 coefficients for YUV to RGB conversion. `stride` is the
/// number of bytes per source row (may include padding).
pub fn yuyv_to_rgba(data: &[u8], width: u32, height: u32, stride: u32) -> Vec<u8> {
    let width = width as usize;
    let height = height as usize;
    let stride = (stride as usize).max(width * 2);
    let mut rgba = Vec::with_capacity(width * height * 4);

    for row in 0..height {
        let start = row * stride;
        let end = start + width * 2;
        let Some(line) = data.get(start..end) else {
            break;
        };

        for chunk in line.chunks_exact(4) {
            let y0 = chunk[0] as f32;
            let u = chunk[1] as f32 - 128.0;
            let y1 = chunk[2] as f32;
            let v = chunk[3] as f32 - 128.0;

            for y in [y0, y1] {
                rgba.push((y + 1.402 * v).clamp(0.0, 255.0) as u8);
                rgba.push((y - 0.344 * u - 0.714 * v).clamp(0.0, 255.0) as u8);
                rgba.push((y + 1.772 * u).clamp(0.0, 255.0) as u8);
                rgba.push(255);
            }
        }
    }

    rgba
}

/// Decode one MJPEG buffer to RGBA, returning (width, height, pixels)
pub fn mjpeg_to_rgba(data: &[u8]) -> Result<(u32, u32, Vec<u8>), image::ImageError> {
    let img = image::load_from_memory_with_format(data, ImageFormat::Jpeg)?.to_rgba8();
    let (width, height) = img.dimensions();
    Ok((width, height, img.into_raw()))
}

/// Convert RGB to RGBA by adding alpha=255
pub fn rgb_to_rgba(rgb: &[u8]) -> Vec<u8> {
    let mut rgba = Vec::with_capacity(rgb.len() / 3 * 4);
    for chunk in rgb.chunks_exact(3) {
        rgba.push(chunk[0]);
        rgba.push(chunk[1]);
        rgba.push(chunk[2]);
        rgba.push(255);
    }
    rgba
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yuyv_to_rgba_white() {
        // Pure white in YUV (Y=255, U=128, V=128)
        let yuyv = vec![255u8, 128, 255, 128];
        let rgba = yuyv_to_rgba(&yuyv, 2, 1, 4);

        assert_eq!(rgba.len(), 8);
        assert!(rgba[0] > 250);
        assert!(rgba[1] > 250);
        assert!(rgba[2] > 250);
        assert_eq!(rgba[3], 255);
    }

    #[test]
    fn test_yuyv_to_rgba_skips_stride_padding() {
        // 2x2, black top row, white bottom row, 2 bytes padding per row
        let yuyv = vec![
            0u8, 128, 0, 128, 9, 9, //
            255, 128, 255, 128, 9, 9,
        ];
        let rgba = yuyv_to_rgba(&yuyv, 2, 2, 6);

        assert_eq!(rgba.len(), 16);
        assert_eq!(rgba[0], 0);
        assert!(rgba[8] > 250);
    }

    #[test]
    fn test_yuyv_truncated_input() {
        let rgba = yuyv_to_rgba(&[0u8, 128], 2, 2, 4);
        assert!(rgba.is_empty());
    }

    #[test]
    fn test_rgb_to_rgba() {
        let rgb = vec![255, 128, 64, 0, 0, 0];
        let rgba = rgb_to_rgba(&rgb);

        assert_eq!(rgba.len(), 8);
        assert_eq!(rgba[0..4], [255, 128, 64, 255]);
        assert_eq!(rgba[4..8], [0, 0, 0, 255]);
    }

    #[test]
    fn test_mjpeg_rejects_garbage() {
        assert!(mjpeg_to_rgba(&[0, 1, 2, 3]).is_err());
    }
}
