// SPDX-License-Identifier: GPL-3.0-only

//! POS Scanner - camera barcode scanning for point-of-sale inventory lookup
//!
//! This library turns a live camera stream into decoded CODE128 strings
//! for a catalog lookup it does not implement.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`backends`]: Camera capture abstraction, V4L2 and virtual cameras
//! - [`scanner`]: Probing, acquisition, sampling, analysis, decoding and the session
//! - [`config`]: Scanner configuration handling
//! - [`errors`]: Error taxonomy with remediation text
//!
//! # Example
//!
//! ```ignore
//! let session = ScanSession::new(backend, sink, env, ScannerConfig::default(), |code| {
//!     println!("{}", code);
//! });
//! session.start().await?;
//! ```

pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod scanner;

// Re-export commonly used types
pub use config::ScannerConfig;
pub use constants::CooldownPolicy;
pub use errors::{AppError, AppResult, ConfigError, ScanError, ScanResult};
pub use scanner::{DecodedCode, DeviceCapabilities, HostEnvironment, ScanSession, SessionPhase};
