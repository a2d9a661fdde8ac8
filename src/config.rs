use serde::Deserialize;
use thiserror::Error;

use crate::control::{DriveMode, Tuning, UnknownDriveMode};
use crate::input::KeyBindings;

/// Errors surfaced while loading playground settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse playground settings")]
    Parse(#[from] ron::error::SpannedError),
    #[error(transparent)]
    UnknownDriveMode(#[from] UnknownDriveMode),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawConfig {
    drive_mode: Option<String>,
    tuning: Tuning,
    bindings: KeyBindings,
}

/// Fully-resolved playground settings.
#[derive(Debug, Clone)]
pub struct PlaygroundConfig {
    pub drive_mode: DriveMode,
    pub tuning: Tuning,
    pub bindings: KeyBindings,
}

impl Default for PlaygroundConfig {
    fn default() -> Self {
        Self {
            drive_mode: DriveMode::default(),
            tuning: Tuning::default(),
            bindings: KeyBindings::default(),
        }
    }
}

impl PlaygroundConfig {
    /// Parses a RON settings document. Unknown drive-mode identifiers are
    /// rejected here rather than ignored at dispatch time.
    pub fn from_ron(settings: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = ron::Options::default()
            .with_default_extension(ron::extensions::Extensions::IMPLICIT_SOME)
            .from_str(settings)?;
        let drive_mode = match raw.drive_mode {
            Some(name) => name.parse()?,
            None => DriveMode::default(),
        };

        Ok(Self {
            drive_mode,
            tuning: raw.tuning,
            bindings: raw.bindings,
        })
    }
}
