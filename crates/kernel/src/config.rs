use crate::engine::EngineError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Window parameters handed to the window factory at init.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub resizable: bool,
    pub show_cursor: bool,
    /// Confine the cursor to the window.
    pub capture_mouse: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Dreivy!".into(),
            width: 1280,
            height: 720,
            resizable: true,
            show_cursor: true,
            capture_mouse: false,
        }
    }
}

/// Engine configuration. Every field has a default, so an empty document is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub window: WindowConfig,
    pub clear_color: [f32; 4],
    /// Upper bound on a frame delta, in seconds.
    pub max_frame_delta: f32,
    /// Advance the clock by this many seconds per frame instead of wall time.
    pub fixed_timestep: Option<f32>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            clear_color: [0.1, 0.1, 0.15, 1.0],
            max_frame_delta: 0.1,
            fixed_timestep: None,
        }
    }
}

impl EngineConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self, EngineError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&text)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(EngineError::InvalidConfig(format!(
                "window size {}x{} must be non-zero",
                self.window.width, self.window.height
            )));
        }
        if !is_positive(self.max_frame_delta) {
            return Err(EngineError::InvalidConfig(format!(
                "max_frame_delta {} must be positive",
                self.max_frame_delta
            )));
        }
        if let Some(step) = self.fixed_timestep {
            if !is_positive(step) {
                return Err(EngineError::InvalidConfig(format!(
                    "fixed_timestep {step} must be positive"
                )));
            }
        }
        Ok(())
    }
}

fn is_positive(value: f32) -> bool {
    value.is_finite() && value > 0.0
}
