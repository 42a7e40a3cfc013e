// SPDX-License-Identifier: GPL-3.0-only

//! Session lifecycle and emission cooldown

use crate::constants::CooldownPolicy;
use crate::scanner::frame_processor::DecodedCode;
use std::time::Duration;
use tokio::time::Instant;

/// Lifecycle of a scan session
///
/// Errors go back to `Idle`; there is no failed state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    Idle,
    Starting,
    Active,
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionPhase::Idle => write!(f, "idle"),
            SessionPhase::Starting => write!(f, "starting"),
            SessionPhase::Active => write!(f, "active"),
        }
    }
}

/// What the session remembers between ticks
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub is_active: bool,
    pub last_emitted_code: Option<DecodedCode>,
    pub last_emission: Option<Instant>,
}

impl SessionState {
    pub fn activate(&mut self) {
        *self = Self {
            is_active: true,
            ..Default::default()
        };
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Whether `code` may be emitted at `now`
    pub fn should_emit(
        &self,
        code: &DecodedCode,
        now: Instant,
        cooldown: Duration,
        policy: CooldownPolicy,
    ) -> bool {
        let Some(last) = self.last_emission else {
            return true;
        };
        let elapsed = now.saturating_duration_since(last) >= cooldown;
        match policy {
            CooldownPolicy::PerCode => {
                elapsed || self.last_emitted_code.as_ref() != Some(code)
            }
            CooldownPolicy::Global => elapsed,
        }
    }

    /// Record the emission if the cooldown allows it
    pub fn try_emit(
        &mut self,
        code: &DecodedCode,
        now: Instant,
        cooldown: Duration,
        policy: CooldownPolicy,
    ) -> bool {
        if !self.should_emit(code, now, cooldown, policy) {
            return false;
        }
        self.last_emitted_code = Some(code.clone());
        self.last_emission = Some(now);
        true
    }
}
