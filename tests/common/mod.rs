// SPDX-License-Identifier: GPL-3.0-only

//! Shared fixtures for integration tests
//!
//! A scripted camera backend that records every stream it hands out, a
//! sink with selectable playback behavior, and a CODE128 raster painter.

#![allow(dead_code)]

use pos_scanner::backends::camera::{
    CameraBackend, CameraBackendType, CameraFrame, MediaError, MediaErrorKind, MediaStream,
    StreamConstraints, VideoSink,
};
use pos_scanner::scanner::frame_processor::types::RunLengthPattern;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const DESKTOP_UA: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36";
pub const IPHONE_UA: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_5 like Mac OS X) \
    AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.5 Mobile/15E148 Safari/604.1";
pub const ANDROID_UA: &str = "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/126.0.0.0 Mobile Safari/537.36";

/// Backend whose failures are scripted per open call
pub struct FakeBackend {
    frame: Option<CameraFrame>,
    failures: Mutex<VecDeque<MediaErrorKind>>,
    open_delay: Duration,
    opens: AtomicUsize,
    seen: Mutex<Vec<StreamConstraints>>,
    tracks: Arc<Mutex<Vec<Arc<AtomicBool>>>>,
}

impl FakeBackend {
    /// Streams show `frame` (or nothing) forever
    pub fn new(frame: Option<CameraFrame>) -> Self {
        Self {
            frame,
            failures: Mutex::new(VecDeque::new()),
            open_delay: Duration::ZERO,
            opens: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
            tracks: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Fail the next opens with these kinds, in order
    pub fn fail_with(self, kinds: impl IntoIterator<Item = MediaErrorKind>) -> Self {
        self.failures.lock().unwrap().extend(kinds);
        self
    }

    pub fn with_open_delay(mut self, delay: Duration) -> Self {
        self.open_delay = delay;
        self
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    /// Live tracks across every stream ever opened
    pub fn live_tracks(&self) -> usize {
        self.tracks
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.load(Ordering::SeqCst))
            .count()
    }

    pub fn constraints_seen(&self) -> Vec<StreamConstraints> {
        self.seen.lock().unwrap().clone()
    }
}

impl CameraBackend for FakeBackend {
    type Stream = FakeStream;

    fn has_capture_api(&self) -> bool {
        true
    }

    fn open_stream(
        &self,
        constraints: &StreamConstraints,
    ) -> impl Future<Output = Result<FakeStream, MediaError>> + Send {
        self.opens.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(constraints.clone());
        let failure = self.failures.lock().unwrap().pop_front();
        let delay = self.open_delay;
        let frame = self.frame.clone();
        let registry = Arc::clone(&self.tracks);

        async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if let Some(kind) = failure {
                return Err(MediaError::new(kind, "scripted failure"));
            }
            let live = Arc::new(AtomicBool::new(true));
            registry.lock().unwrap().push(Arc::clone(&live));
            Ok(FakeStream { live, frame })
        }
    }

    fn backend_type(&self) -> CameraBackendType {
        CameraBackendType::Custom
    }
}

pub struct FakeStream {
    live: Arc<AtomicBool>,
    frame: Option<CameraFrame>,
}

impl MediaStream for FakeStream {
    fn stop_tracks(&self) {
        self.live.store(false, Ordering::SeqCst);
    }

    fn live_tracks(&self) -> usize {
        usize::from(self.live.load(Ordering::SeqCst))
    }

    fn label(&self) -> String {
        "fake".to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Playback {
    /// Playing as soon as a stream is bound
    Ready,
    /// Playback fails
    Fail,
    /// Never starts playing
    Hang,
}

pub struct FakeSink {
    playback: Playback,
    source: Mutex<Option<Arc<FakeStream>>>,
    inline: AtomicBool,
}

impl FakeSink {
    pub fn new(playback: Playback) -> Self {
        Self {
            playback,
            source: Mutex::new(None),
            inline: AtomicBool::new(false),
        }
    }

    pub fn is_bound(&self) -> bool {
        self.source.lock().unwrap().is_some()
    }

    pub fn inline_playback(&self) -> bool {
        self.inline.load(Ordering::SeqCst)
    }
}

impl VideoSink<FakeStream> for FakeSink {
    fn bind(&self, stream: Arc<FakeStream>) {
        *self.source.lock().unwrap() = Some(stream);
    }

    fn unbind(&self) {
        self.source.lock().unwrap().take();
    }

    fn configure_inline_playback(&self) {
        self.inline.store(true, Ordering::SeqCst);
    }

    fn wait_until_playing(&self) -> impl Future<Output = Result<(), MediaError>> + Send {
        let playback = self.playback;
        let bound = self.is_bound();
        async move {
            match playback {
                Playback::Ready if bound => Ok(()),
                Playback::Ready => Err(MediaError::new(MediaErrorKind::Playback, "unbound")),
                Playback::Fail => Err(MediaError::new(
                    MediaErrorKind::Playback,
                    "decode error",
                )),
                Playback::Hang => std::future::pending().await,
            }
        }
    }

    fn natural_size(&self) -> (u32, u32) {
        self.current_frame()
            .map(|f| (f.width, f.height))
            .unwrap_or((0, 0))
    }

    fn current_frame(&self) -> Option<CameraFrame> {
        let source = self.source.lock().unwrap();
        let stream = source.as_ref()?;
        if stream.live_tracks() == 0 {
            return None;
        }
        stream.frame.clone()
    }
}

/// CODE128 element widths for values 0..=105, plus the stop pattern
const WIDTHS: [&str; 107] = [
    "212222", "222122", "222221", "121223", "121322", "131222", "122213", "122312",
    "132212", "221213", "221312", "231212", "112232", "122132", "122231", "113222",
    "123122", "123221", "223211", "221132", "221231", "213212", "223112", "312131",
    "311222", "321122", "321221", "312212", "322112", "322211", "212123", "212321",
    "232121", "111323", "131123", "131321", "112313", "132113", "132311", "211313",
    "231113", "231311", "112133", "112331", "132131", "113123", "113321", "133121",
    "313121", "211331", "231131", "213113", "213311", "213131", "311123", "311321",
    "331121", "312113", "312311", "332111", "314111", "221411", "431111", "111224",
    "111422", "121124", "121421", "141122", "141221", "112214", "112412", "122114",
    "122411", "142112", "142211", "241211", "221114", "413111", "241112", "134111",
    "111242", "121142", "121241", "114212", "124112", "124211", "411212", "421112",
    "421211", "212141", "214121", "412121", "111143", "111341", "131141", "114113",
    "114311", "411113", "411311", "113141", "114131", "311141", "411131", "211412",
    "211214", "211232", "2331112",
];

pub const START_A: u8 = 103;
pub const START_B: u8 = 104;
pub const START_C: u8 = 105;
const STOP: u8 = 106;

/// Element widths (in modules) of a symbol from raw values, quiet zones
/// included; the check character is computed here
pub fn code128_symbol(start: u8, data: &[u8]) -> Vec<u32> {
    let weighted: u32 = data
        .iter()
        .enumerate()
        .map(|(i, &v)| (i as u32 + 1) * u32::from(v))
        .sum();
    let check = ((u32::from(start) + weighted) % 103) as u8;

    let mut widths = vec![10];
    for value in std::iter::once(start)
        .chain(data.iter().copied())
        .chain([check, STOP])
    {
        widths.extend(WIDTHS[value as usize].bytes().map(|d| u32::from(d - b'0')));
    }
    widths.push(10);
    widths
}

/// Code B values of printable ASCII text
pub fn code_b(text: &str) -> Vec<u8> {
    text.bytes().map(|b| b - 32).collect()
}

/// Element widths (in modules) of a Code B symbol, quiet zones included
pub fn code128_modules(text: &str) -> Vec<u32> {
    code128_symbol(START_B, &code_b(text))
}

/// Run pattern of a symbol at `module` pixels per module
pub fn code128_pattern(start: u8, data: &[u8], module: u32) -> RunLengthPattern {
    let runs = code128_symbol(start, data)
        .into_iter()
        .map(|w| w * module)
        .collect();
    // Quiet zone first
    RunLengthPattern::new(runs, false)
}

/// RGBA frame with the symbol painted across every row
pub fn code128_frame(text: &str, module: u32, height: u32) -> CameraFrame {
    let mut row = Vec::new();
    for (i, width) in code128_modules(text).into_iter().enumerate() {
        // Quiet zone first, so even elements are light
        let value = if i % 2 == 0 { 255 } else { 0 };
        for _ in 0..width * module {
            row.extend_from_slice(&[value, value, value, 255]);
        }
    }
    let width = (row.len() / 4) as u32;
    let mut data = Vec::with_capacity(row.len() * height as usize);
    for _ in 0..height {
        data.extend_from_slice(&row);
    }
    CameraFrame::from_rgba(width, height, data)
}

/// Uniform gray frame
pub fn gray_frame(width: u32, height: u32) -> CameraFrame {
    CameraFrame::from_rgba(width, height, vec![128; (width * height * 4) as usize])
}
