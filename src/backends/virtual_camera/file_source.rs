// SPDX-License-Identifier: GPL-3.0-only

//! Still-image sources for the virtual camera
//!
//! A source is either one image file or a directory of images, which are
//! played back in file-name order.

use crate::backends::camera::types::{BackendError, BackendResult, CameraFrame};
use crate::constants::file_formats;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Load every frame a source path provides
///
/// Directories yield their image files sorted by name; anything that is
/// not a supported image is skipped. A lone file must be an image.
pub fn load_frames(path: &Path) -> BackendResult<Vec<CameraFrame>> {
    if path.is_dir() {
        let files = image_files_in(path)?;
        if files.is_empty() {
            return Err(BackendError::DeviceNotFound(format!(
                "No images in '{}'",
                path.display()
            )));
        }
        debug!(dir = %path.display(), count = files.len(), "Loading image directory");
        return files.iter().map(|f| load_image_as_frame(f)).collect();
    }

    if !path.exists() {
        return Err(BackendError::DeviceNotFound(path.display().to_string()));
    }

    let extension = extension_of(path);
    if !file_formats::is_image_extension(&extension) {
        return Err(BackendError::FormatNotSupported(format!(
            "Unsupported file format: {}",
            extension
        )));
    }
    Ok(vec![load_image_as_frame(path)?])
}

/// Load an image file and convert it to a CameraFrame
///
/// Supports common image formats: PNG, JPEG, GIF, BMP, WebP
pub fn load_image_as_frame(path: &Path) -> BackendResult<CameraFrame> {
    info!(path = %path.display(), "Loading image file");

    let img = image::open(path).map_err(|e| {
        BackendError::Other(format!("Failed to load image '{}': {}", path.display(), e))
    })?;

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();

    info!(width, height, "Image loaded successfully");
    Ok(CameraFrame::from_rgba(width, height, rgba.into_raw()))
}

fn image_files_in(dir: &Path) -> BackendResult<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && file_formats::is_image_extension(&extension_of(p)))
        .collect();
    files.sort();
    Ok(files)
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "pos-scanner-{}-{}",
            name,
            uuid::Uuid::new_v4()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_load_png_frame() {
        let dir = scratch_dir("png");
        let path = dir.join("frame.png");
        image::RgbaImage::from_pixel(3, 2, image::Rgba([10, 20, 30, 255]))
            .save(&path)
            .unwrap();

        let frame = load_image_as_frame(&path).unwrap();
        assert_eq!((frame.width, frame.height), (3, 2));
        assert_eq!(frame.stride, 12);
        assert_eq!(&frame.data[0..4], &[10, 20, 30, 255]);

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_directory_is_sorted_and_filtered() {
        let dir = scratch_dir("dir");
        image::RgbaImage::from_pixel(2, 2, image::Rgba([0, 0, 0, 255]))
            .save(dir.join("b.png"))
            .unwrap();
        image::RgbaImage::from_pixel(4, 4, image::Rgba([255, 255, 255, 255]))
            .save(dir.join("a.png"))
            .unwrap();
        std::fs::write(dir.join("notes.txt"), "not an image").unwrap();

        let frames = load_frames(&dir).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].width, 4);
        assert_eq!(frames[1].width, 2);

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_empty_directory_has_no_device() {
        let dir = scratch_dir("empty");
        assert!(matches!(
            load_frames(&dir),
            Err(BackendError::DeviceNotFound(_))
        ));
        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_rejects_non_image_file() {
        let dir = scratch_dir("txt");
        let path = dir.join("clip.txt");
        std::fs::write(&path, "hello").unwrap();
        assert!(matches!(
            load_frames(&path),
            Err(BackendError::FormatNotSupported(_))
        ));
        std::fs::remove_dir_all(dir).ok();
    }
}
