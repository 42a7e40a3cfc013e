// SPDX-License-Identifier: GPL-3.0-only

//! Device capability probing
//!
//! A pure function of the host description: no I/O, no failure. Unknown
//! facts default to `false`.

use crate::backends::camera::CameraBackend;
use crate::constants::host;
use serde::{Deserialize, Serialize};

/// What the scanner knows about the place it runs in
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostEnvironment {
    pub user_agent: String,
    /// Full page URL; its scheme and host drive the secure-context checks
    pub page_url: String,
    /// Modern capture API present
    pub has_media_devices: bool,
    /// Legacy vendor-prefixed capture API present
    pub has_legacy_get_user_media: bool,
    pub max_touch_points: u32,
}

impl HostEnvironment {
    /// Describe a browser page; capture APIs are assumed present
    pub fn from_page(user_agent: impl Into<String>, page_url: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
            page_url: page_url.into(),
            has_media_devices: true,
            has_legacy_get_user_media: false,
            max_touch_points: 0,
        }
    }

    /// Describe this native process driving `backend`
    pub fn native<B: CameraBackend>(backend: &B) -> Self {
        Self {
            user_agent: format!(
                "pos-scanner/{} ({}; {})",
                env!("CARGO_PKG_VERSION"),
                std::env::consts::OS,
                std::env::consts::ARCH
            ),
            page_url: "file://localhost/".to_string(),
            has_media_devices: backend.has_capture_api(),
            has_legacy_get_user_media: backend.has_legacy_capture_api(),
            max_touch_points: 0,
        }
    }

    /// Lowercased URL scheme, empty if unparseable
    pub fn scheme(&self) -> String {
        self.page_url
            .split_once(':')
            .map(|(scheme, _)| scheme.to_ascii_lowercase())
            .unwrap_or_default()
    }

    /// Lowercased host without port or IPv6 brackets
    pub fn host(&self) -> String {
        let Some((_, rest)) = self.page_url.split_once("://") else {
            return String::new();
        };
        let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
        let authority = authority.rsplit_once('@').map_or(authority, |(_, h)| h);

        let host = if let Some(bracketed) = authority.strip_prefix('[') {
            bracketed.split(']').next().unwrap_or_default()
        } else {
            authority.split(':').next().unwrap_or_default()
        };
        host.to_ascii_lowercase()
    }
}

/// Coarse device class used to pick constraints and phrase errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    Android,
    Mobile,
    Desktop,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceCapabilities {
    pub is_mobile_platform: bool,
    pub is_android_platform: bool,
    pub is_secure_context: bool,
    pub is_loopback_host: bool,
    /// Modern or legacy capture API present
    pub has_camera_api: bool,
}

impl DeviceCapabilities {
    pub fn device_class(&self) -> DeviceClass {
        if self.is_android_platform {
            DeviceClass::Android
        } else if self.is_mobile_platform {
            DeviceClass::Mobile
        } else {
            DeviceClass::Desktop
        }
    }

    /// Mobile browsers refuse capture outside a secure or loopback origin
    pub fn requires_secure_transport(&self) -> bool {
        self.is_mobile_platform && !self.is_secure_context && !self.is_loopback_host
    }
}

pub fn probe(env: &HostEnvironment) -> DeviceCapabilities {
    let ua = env.user_agent.to_lowercase();
    let is_android_platform = ua.contains("android");
    // Touch-capable browsers (iPadOS in desktop mode) count as mobile
    let is_mobile_platform = is_android_platform
        || host::MOBILE_MARKERS.iter().any(|marker| ua.contains(marker))
        || env.max_touch_points > 0;

    let host_name = env.host();
    DeviceCapabilities {
        is_mobile_platform,
        is_android_platform,
        is_secure_context: env.scheme() == host::SECURE_SCHEME,
        is_loopback_host: host::LOOPBACK_HOSTS.contains(&host_name.as_str()),
        has_camera_api: env.has_media_devices || env.has_legacy_get_user_media,
    }
}
