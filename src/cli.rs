// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands
//!
//! This module provides command-line functionality for:
//! - Running a scan session against a camera or still images
//! - Analyzing a single image
//! - Probing the host and testing the camera
//! - Listing capture devices

use chrono::Local;
use pos_scanner::backends::camera::v4l2::{V4l2Backend, V4l2Sink, list_video_devices};
use pos_scanner::backends::camera::{CameraBackend, VideoSink};
use pos_scanner::backends::virtual_camera::{VirtualCameraBackend, VirtualSink, load_frames};
use pos_scanner::scanner::{
    Code128Decoder, LineAnalyzer, PatternDecoder, RasterSample, check_camera, probe as probe_host,
};
use pos_scanner::{AppError, AppResult, DecodedCode, HostEnvironment, ScanSession, ScannerConfig};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

pub struct ScanOptions {
    pub images: Vec<PathBuf>,
    pub device: Option<String>,
    pub duration: Option<u64>,
    pub host: Option<HostEnvironment>,
    pub config: Option<PathBuf>,
}

/// Browser host description from CLI flags, if any were given
pub fn host_override(
    user_agent: Option<String>,
    page_url: Option<String>,
) -> Option<HostEnvironment> {
    if user_agent.is_none() && page_url.is_none() {
        return None;
    }
    Some(HostEnvironment::from_page(
        user_agent.unwrap_or_default(),
        page_url.unwrap_or_else(|| "http://localhost/".to_string()),
    ))
}

/// Host the session runs in: the override with the backend's real API
/// availability, or this native process
fn host_for<B: CameraBackend>(backend: &B, host: Option<HostEnvironment>) -> HostEnvironment {
    match host {
        Some(env) => HostEnvironment {
            has_media_devices: backend.has_capture_api(),
            has_legacy_get_user_media: backend.has_legacy_capture_api(),
            ..env
        },
        None => HostEnvironment::native(backend),
    }
}

/// Run a scan session, printing every decoded code
pub fn scan(options: ScanOptions) -> AppResult<()> {
    let config = ScannerConfig::load(options.config.as_deref())?;

    if options.images.is_empty() {
        let backend = V4l2Backend::new(options.device);
        run_session(backend, V4l2Sink::new(), options.host, config, options.duration)
    } else {
        let mut frames = Vec::new();
        for path in &options.images {
            frames.extend(load_frames(path)?);
        }
        println!("Serving {} image(s) as the camera", frames.len());
        let backend = VirtualCameraBackend::from_frames(frames);
        run_session(backend, VirtualSink::new(), options.host, config, options.duration)
    }
}

fn run_session<B, V>(
    backend: B,
    sink: V,
    host: Option<HostEnvironment>,
    config: ScannerConfig,
    duration: Option<u64>,
) -> AppResult<()>
where
    B: CameraBackend,
    V: VideoSink<B::Stream>,
{
    let env = host_for(&backend, host);
    let caps = probe_host(&env);
    let (cooldown, policy) = (config.cooldown(), config.cooldown_policy);

    // Set up Ctrl+C handler
    let stop_flag = Arc::new(AtomicBool::new(false));
    let stop_flag_clone = stop_flag.clone();
    ctrlc::set_handler(move || {
        stop_flag_clone.store(true, Ordering::SeqCst);
    })
    .map_err(|e| AppError::Other(e.to_string()))?;

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let session = ScanSession::new(
            Arc::new(backend),
            Arc::new(sink),
            env,
            config,
            |code: &DecodedCode| {
                println!("[{}] {}", Local::now().format("%H:%M:%S%.3f"), code);
            },
        );

        if let Err(e) = session.start().await {
            eprintln!("Hint: {}", e.remediation(&caps));
            return Err(AppError::from(e));
        }

        println!(
            "Scanning... (cooldown {} ms, {}; press Ctrl+C to stop)",
            cooldown.as_millis(),
            policy.display_name().to_lowercase()
        );
        let started = tokio::time::Instant::now();
        let limit = duration.map(Duration::from_secs);

        loop {
            if stop_flag.load(Ordering::SeqCst) {
                println!();
                println!("Stopping...");
                break;
            }
            if limit.is_some_and(|limit| started.elapsed() >= limit) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        session.stop();
        if let Some(code) = session.last_emitted() {
            println!("Last code: {}", code);
        }
        Ok(())
    })
}

/// Analyze one still image and print what the scanner sees
pub fn analyze(image: &Path, config: Option<&Path>) -> AppResult<()> {
    let config = ScannerConfig::load(config)?;
    let frame = load_frames(image)?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::Other(format!("No image in {}", image.display())))?;
    let raster = RasterSample::from_frame(&frame)
        .ok_or_else(|| AppError::Other("Image has no usable pixels".to_string()))?;

    let best = LineAnalyzer::new(&config).analyze(&raster);
    println!("Image: {}x{}", raster.width, raster.height);
    println!("Score: {:.2} (threshold {:.2})", best.score, config.min_score);
    println!("Runs: {}", best.pattern.len());

    match Code128Decoder::new(config.decoder).decode(&best.pattern) {
        Some(code) => println!("Decoded: {}", code),
        None => println!("Decoded: (none)"),
    }
    Ok(())
}

/// Print probed capabilities as JSON
pub fn probe(host: Option<HostEnvironment>) -> AppResult<()> {
    let env = host_for(&V4l2Backend::default(), host);
    let caps = probe_host(&env);
    let report = serde_json::json!({
        "user_agent": env.user_agent,
        "page_url": env.page_url,
        "capabilities": caps,
        "device_class": caps.device_class(),
    });
    let text = serde_json::to_string_pretty(&report)
        .map_err(|e| AppError::Other(e.to_string()))?;
    println!("{}", text);
    Ok(())
}

/// Camera self-test
pub fn check(device: Option<String>) -> AppResult<()> {
    let backend = V4l2Backend::new(device);
    let caps = probe_host(&HostEnvironment::native(&backend));

    let rt = tokio::runtime::Runtime::new()?;
    match rt.block_on(check_camera(&backend, &caps)) {
        Ok(()) => {
            println!("Camera OK");
            Ok(())
        }
        Err(e) => {
            eprintln!("Hint: {}", e.remediation(&caps));
            Err(e.into())
        }
    }
}

/// List all available capture devices
pub fn list_devices() {
    let devices = list_video_devices();

    if devices.is_empty() {
        println!("No cameras found.");
        return;
    }

    println!("Available cameras:");
    println!();
    for (index, device) in devices.iter().enumerate() {
        println!("  [{}] {}", index, device.name);
        println!("      Path: {}  Driver: {}", device.path, device.driver);
    }
}
