// SPDX-License-Identifier: GPL-3.0-only

//! Barcode scanning pipeline
//!
//! ```text
//! probe ──▶ acquire ──▶ sample (every tick) ──▶ analyze ──▶ decode
//!                                                              │
//!                         consumer ◀── cooldown ◀── session ◀──┘
//! ```

pub mod acquire;
pub mod frame_processor;
pub mod probe;
pub mod sampler;
pub mod session;
pub mod state;

pub use acquire::{StreamHandle, acquire, check_camera};
pub use frame_processor::{
    Code128Decoder, DecodedCode, LineAnalyzer, PatternDecoder, RunLengthPattern, ScoreResult,
};
pub use probe::{DeviceCapabilities, DeviceClass, HostEnvironment, probe};
pub use sampler::{RasterSample, sample};
pub use session::{CodeConsumer, ScanSession};
pub use state::{SessionPhase, SessionState};
