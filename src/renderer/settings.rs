//! OIT Settings
//!
//! Runtime configuration of the OIT tasks.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use myth_oit::OitSettings;
//!
//! // Default: OIT enabled, 2048 × 2048 fallback resolution
//! let settings = OitSettings::default();
//!
//! // Honour MYTH_ENABLE_OIT=0 to switch OIT off without rebuilding
//! let settings = OitSettings::from_env();
//! ```
//!
//! | Field | Default | Meaning |
//! |-------|---------|---------|
//! | `enabled` | `true` | OIT producers request buffers and the resolve pass runs |
//! | `fallback_screen_size` | `2048` | Square resolution used when no output target is bound |
//!
//! The per-pixel sample budget is deliberately not a setting: it is baked into
//! the resolve shader, see [`SAMPLES_PER_PIXEL`](crate::renderer::oit::SAMPLES_PER_PIXEL).

use serde::{Deserialize, Serialize};

use crate::renderer::oit::FALLBACK_SCREEN_SIZE;

/// Environment variable switching OIT on or off.
pub const ENABLE_OIT_ENV: &str = "MYTH_ENABLE_OIT";

/// Configuration shared by the OIT producer and resolve tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OitSettings {
    pub enabled: bool,
    pub fallback_screen_size: i32,
}

impl Default for OitSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            fallback_screen_size: FALLBACK_SCREEN_SIZE,
        }
    }
}

impl OitSettings {
    /// Defaults, with `enabled` overridden by `MYTH_ENABLE_OIT` when set.
    #[must_use]
    pub fn from_env() -> Self {
        let mut settings = Self::default();
        if let Ok(value) = std::env::var(ENABLE_OIT_ENV) {
            settings.enabled = parse_enabled(&value);
        }
        settings
    }
}

fn parse_enabled(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "0" | "false" | "off" | "no"
    )
}
