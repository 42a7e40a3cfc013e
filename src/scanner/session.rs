// SPDX-License-Identifier: GPL-3.0-only

//! Scan session controller
//!
//! Owns the stream handle and session state, runs the tick loop, and
//! routes decoded codes through the cooldown to the consumer.
//!
//! ```text
//! Idle ──start()──▶ Starting ──acquired──▶ Active
//!  ▲                   │                     │
//!  └──── error ────────┘                     │
//!  └──────────────── stop() ─────────────────┘
//! ```

use crate::backends::camera::{CameraBackend, MediaStream, VideoSink};
use crate::config::ScannerConfig;
use crate::constants::timing;
use crate::errors::{ScanError, ScanResult};
use crate::scanner::acquire::{StreamHandle, acquire};
use crate::scanner::frame_processor::{Code128Decoder, DecodedCode, LineAnalyzer, PatternDecoder};
use crate::scanner::probe::{DeviceCapabilities, HostEnvironment, probe};
use crate::scanner::sampler::sample;
use crate::scanner::state::{SessionPhase, SessionState};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

/// Receives every emitted code, in tick order
pub type CodeConsumer = Arc<dyn Fn(&DecodedCode) + Send + Sync>;

struct Inner<S: MediaStream, V: VideoSink<S>> {
    phase: SessionPhase,
    /// Bumped by every start and stop; stale tasks compare against it
    epoch: u64,
    handle: Option<Arc<StreamHandle<S, V>>>,
    state: SessionState,
    ticker: Option<JoinHandle<()>>,
    stop_flag: Option<Arc<AtomicBool>>,
}

impl<S: MediaStream, V: VideoSink<S>> Default for Inner<S, V> {
    fn default() -> Self {
        Self {
            phase: SessionPhase::Idle,
            epoch: 0,
            handle: None,
            state: SessionState::default(),
            ticker: None,
            stop_flag: None,
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Puts a dropped start back to `Idle`
///
/// A start future dropped mid-acquire (caller timeout, `select!`) would
/// otherwise leave the phase at `Starting` for good.
struct StartGuard<'a, S: MediaStream, V: VideoSink<S>> {
    session: Uuid,
    inner: &'a Mutex<Inner<S, V>>,
    epoch: u64,
    armed: bool,
}

impl<S: MediaStream, V: VideoSink<S>> StartGuard<'_, S, V> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl<S: MediaStream, V: VideoSink<S>> Drop for StartGuard<'_, S, V> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut inner = lock(self.inner);
        if inner.epoch == self.epoch && inner.phase == SessionPhase::Starting {
            inner.phase = SessionPhase::Idle;
            debug!(session = %self.session, "Start cancelled, session idle");
        }
    }
}

/// One camera, one stream, one tick loop
pub struct ScanSession<B: CameraBackend, V: VideoSink<B::Stream>> {
    id: Uuid,
    backend: Arc<B>,
    sink: Arc<V>,
    env: HostEnvironment,
    config: Arc<ScannerConfig>,
    analyzer: Arc<LineAnalyzer>,
    decoder: Arc<dyn PatternDecoder>,
    consumer: CodeConsumer,
    inner: Arc<Mutex<Inner<B::Stream, V>>>,
    start_gate: tokio::sync::Mutex<()>,
    /// Held by the tick loop while the consumer runs
    emitting: Arc<Mutex<()>>,
    status: watch::Sender<bool>,
}

impl<B, V> ScanSession<B, V>
where
    B: CameraBackend,
    V: VideoSink<B::Stream>,
{
    pub fn new<F>(
        backend: Arc<B>,
        sink: Arc<V>,
        env: HostEnvironment,
        config: ScannerConfig,
        consumer: F,
    ) -> Self
    where
        F: Fn(&DecodedCode) + Send + Sync + 'static,
    {
        let analyzer = Arc::new(LineAnalyzer::new(&config));
        let decoder: Arc<dyn PatternDecoder> = Arc::new(Code128Decoder::new(config.decoder));
        let (status, _) = watch::channel(false);

        Self {
            id: Uuid::new_v4(),
            backend,
            sink,
            env,
            config: Arc::new(config),
            analyzer,
            decoder,
            consumer: Arc::new(consumer),
            inner: Arc::new(Mutex::new(Inner::default())),
            start_gate: tokio::sync::Mutex::new(()),
            emitting: Arc::new(Mutex::new(())),
            status,
        }
    }

    /// Replace the CODE128 decoder
    pub fn with_decoder(mut self, decoder: impl PatternDecoder + 'static) -> Self {
        self.decoder = Arc::new(decoder);
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Capabilities of the host this session runs in
    pub fn capabilities(&self) -> DeviceCapabilities {
        probe(&self.env)
    }

    pub fn phase(&self) -> SessionPhase {
        lock(&self.inner).phase
    }

    pub fn is_scanning(&self) -> bool {
        *self.status.borrow()
    }

    /// Watch the "is scanning" flag
    pub fn subscribe_status(&self) -> watch::Receiver<bool> {
        self.status.subscribe()
    }

    pub fn last_emitted(&self) -> Option<DecodedCode> {
        lock(&self.inner).state.last_emitted_code.clone()
    }

    /// Acquire the camera and start ticking
    ///
    /// A no-op while already starting or active. On failure the session
    /// is idle again and nothing is left holding the camera.
    pub async fn start(&self) -> ScanResult<()> {
        let _gate = self.start_gate.lock().await;

        let epoch = {
            let mut inner = lock(&self.inner);
            if inner.phase != SessionPhase::Idle {
                debug!(session = %self.id, phase = %inner.phase, "Start ignored");
                return Ok(());
            }
            inner.phase = SessionPhase::Starting;
            inner.epoch += 1;
            inner.epoch
        };
        let guard = StartGuard {
            session: self.id,
            inner: &self.inner,
            epoch,
            armed: true,
        };

        let caps = probe(&self.env);
        info!(
            session = %self.id,
            backend = %self.backend.backend_type(),
            class = ?caps.device_class(),
            secure = caps.is_secure_context,
            "Starting scan session"
        );

        let acquired = acquire(
            self.backend.as_ref(),
            Arc::clone(&self.sink),
            &caps,
            self.config.ready_timeout(),
        )
        .await;

        let handle = match acquired {
            Ok(handle) => Arc::new(handle),
            Err(e) => {
                guard.disarm();
                let mut inner = lock(&self.inner);
                if inner.epoch == epoch {
                    inner.phase = SessionPhase::Idle;
                }
                warn!(session = %self.id, error = %e, "Scan session failed to start");
                return Err(e);
            }
        };

        guard.disarm();
        let mut inner = lock(&self.inner);
        if inner.epoch != epoch || inner.phase != SessionPhase::Starting {
            drop(inner);
            handle.release();
            info!(session = %self.id, "Stopped while starting, stream released");
            return Ok(());
        }

        let stop_flag = Arc::new(AtomicBool::new(false));
        let ticker = tokio::spawn(tick_loop(TickContext {
            session: self.id,
            epoch,
            handle: Arc::clone(&handle),
            inner: Arc::clone(&self.inner),
            config: Arc::clone(&self.config),
            analyzer: Arc::clone(&self.analyzer),
            decoder: Arc::clone(&self.decoder),
            consumer: Arc::clone(&self.consumer),
            emitting: Arc::clone(&self.emitting),
            stop: Arc::clone(&stop_flag),
        }));

        inner.phase = SessionPhase::Active;
        inner.state.activate();
        inner.handle = Some(handle);
        inner.ticker = Some(ticker);
        inner.stop_flag = Some(stop_flag);
        drop(inner);

        self.status.send_replace(true);
        info!(session = %self.id, "Scan session active");
        Ok(())
    }

    /// Stop ticking and release the camera; safe to call in any phase
    ///
    /// Once this returns the consumer is not called again. A consumer
    /// already running on another thread is waited for.
    pub fn stop(&self) {
        let (previous, handle, ticker, stop_flag) = {
            let mut inner = lock(&self.inner);
            let previous = inner.phase;
            inner.phase = SessionPhase::Idle;
            inner.epoch += 1;
            inner.state.reset();
            (
                previous,
                inner.handle.take(),
                inner.ticker.take(),
                inner.stop_flag.take(),
            )
        };

        if let Some(flag) = stop_flag {
            flag.store(true, Ordering::SeqCst);
        }
        let ticker_id = ticker.as_ref().map(JoinHandle::id);
        if let Some(ticker) = ticker {
            ticker.abort();
        }
        // A consumer stopping its own session already holds the lock
        if ticker_id.is_some() && ticker_id != tokio::task::try_id() {
            drop(lock(&self.emitting));
        }
        if let Some(handle) = handle {
            handle.release();
        }

        self.status.send_if_modified(|scanning| std::mem::replace(scanning, false));
        if previous != SessionPhase::Idle {
            info!(session = %self.id, from = %previous, "Scan session stopped");
        }
    }
}

impl<B, V> Drop for ScanSession<B, V>
where
    B: CameraBackend,
    V: VideoSink<B::Stream>,
{
    fn drop(&mut self) {
        self.stop();
    }
}

struct TickContext<S: MediaStream, V: VideoSink<S>> {
    session: Uuid,
    epoch: u64,
    handle: Arc<StreamHandle<S, V>>,
    inner: Arc<Mutex<Inner<S, V>>>,
    config: Arc<ScannerConfig>,
    analyzer: Arc<LineAnalyzer>,
    decoder: Arc<dyn PatternDecoder>,
    consumer: CodeConsumer,
    emitting: Arc<Mutex<()>>,
    stop: Arc<AtomicBool>,
}

async fn tick_loop<S: MediaStream, V: VideoSink<S>>(ctx: TickContext<S, V>) {
    tokio::time::sleep(ctx.config.detection_start_delay()).await;

    let mut tick: u64 = 0;
    while !ctx.stop.load(Ordering::SeqCst) {
        tick += 1;
        run_tick(&ctx, tick);
        tokio::time::sleep(ctx.config.tick_interval()).await;
    }
    debug!(session = %ctx.session, ticks = tick, "Tick loop ended");
}

fn run_tick<S: MediaStream, V: VideoSink<S>>(ctx: &TickContext<S, V>, tick: u64) {
    if tick % timing::TICK_LOG_INTERVAL == 0 {
        debug!(session = %ctx.session, tick, "Scanning");
    }

    let raster = match sample(&ctx.handle) {
        Ok(raster) => raster,
        Err(ScanError::SinkNotReady) => {
            warn!(session = %ctx.session, tick, "Video sink not ready, skipping tick");
            return;
        }
        Err(e) => {
            warn!(session = %ctx.session, tick, error = %e, "Sampling failed");
            return;
        }
    };

    let best = ctx.analyzer.analyze(&raster);
    trace!(session = %ctx.session, tick, score = best.score, runs = best.pattern.len(), "Tick scored");
    if best.score < ctx.config.min_score {
        return;
    }
    let Some(code) = ctx.decoder.decode(&best.pattern) else {
        return;
    };

    let emit = {
        let mut inner = lock(&ctx.inner);
        if inner.phase != SessionPhase::Active || inner.epoch != ctx.epoch {
            return;
        }
        inner.state.try_emit(
            &code,
            Instant::now(),
            ctx.config.cooldown(),
            ctx.config.cooldown_policy,
        )
    };

    if emit {
        let _emitting = lock(&ctx.emitting);
        if ctx.stop.load(Ordering::SeqCst) {
            return;
        }
        info!(session = %ctx.session, code = %code, "Code decoded");
        (ctx.consumer)(&code);
    } else {
        debug!(session = %ctx.session, code = %code, "Repeat inside cooldown, suppressed");
    }
}
