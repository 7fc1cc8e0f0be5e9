// SPDX-License-Identifier: GPL-3.0-only

//! Session configuration
//!
//! A [`CameraConfig`] describes one virtual camera session. It can be built
//! in code or loaded from a JSON file; missing fields fall back to defaults:
//!
//! ```json
//! {
//!   "width": 640,
//!   "height": 480,
//!   "fps": 20,
//!   "format": "NV12",
//!   "backend": "pipewire",
//!   "options": { "node_description": "Studio camera" }
//! }
//! ```

use crate::backends::{BackendOptions, BackendParams};
use crate::constants::defaults;
use crate::errors::{CameraError, CameraResult};
use crate::media::formats::PixelFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Parameters of a virtual camera session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Target frame rate
    pub fps: f64,
    /// Format frames are sent in
    pub format: PixelFormat,
    /// Device to bind to; any free device when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    /// Backend to use; every registered backend is tried in order when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
    /// Log the achieved frame rate about once a second
    pub print_fps: bool,
    /// Backend-specific options passed through unchanged
    #[serde(skip_serializing_if = "BackendOptions::is_empty")]
    pub options: BackendOptions,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            width: defaults::WIDTH,
            height: defaults::HEIGHT,
            fps: defaults::FPS,
            format: PixelFormat::default(),
            device: None,
            backend: None,
            print_fps: false,
            options: BackendOptions::new(),
        }
    }
}

impl CameraConfig {
    /// Create a configuration with the given geometry and rate, RGB frames
    pub fn new(width: u32, height: u32, fps: f64) -> Self {
        Self {
            width,
            height,
            fps,
            ..Self::default()
        }
    }

    /// Set the frame format
    pub fn with_format(mut self, format: PixelFormat) -> Self {
        self.format = format;
        self
    }

    /// Require a specific device
    pub fn with_device(mut self, device: impl Into<String>) -> Self {
        self.device = Some(device.into());
        self
    }

    /// Require a specific backend
    pub fn with_backend(mut self, backend: impl Into<String>) -> Self {
        self.backend = Some(backend.into());
        self
    }

    /// Enable or disable periodic rate reports
    pub fn with_print_fps(mut self, print_fps: bool) -> Self {
        self.print_fps = print_fps;
        self
    }

    /// Add a backend-specific option
    pub fn with_option(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }

    /// Check the values a session cannot work with
    pub fn validate(&self) -> CameraResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(CameraError::Configuration(format!(
                "frame size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        if !(self.fps.is_finite() && self.fps > 0.0) {
            return Err(CameraError::Configuration(format!(
                "fps must be a positive number, got {}",
                self.fps
            )));
        }
        if self.fps < defaults::MIN_FPS {
            return Err(CameraError::Configuration(format!(
                "fps must be at least {}, got {}",
                defaults::MIN_FPS,
                self.fps
            )));
        }
        if matches!(self.format, PixelFormat::I420 | PixelFormat::Nv12)
            && (self.width % 2 != 0 || self.height % 2 != 0)
        {
            return Err(CameraError::Configuration(format!(
                "{} needs an even frame size, got {}x{}",
                self.format, self.width, self.height
            )));
        }
        if matches!(self.format, PixelFormat::Yuyv | PixelFormat::Uyvy) && self.width % 2 != 0 {
            return Err(CameraError::Configuration(format!(
                "{} needs an even width, got {}",
                self.format, self.width
            )));
        }
        if self.device.as_deref() == Some("") {
            return Err(CameraError::Configuration(
                "device name must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Parameters handed to each candidate backend
    pub fn to_backend_params(&self) -> BackendParams {
        BackendParams {
            width: self.width,
            height: self.height,
            fps: self.fps,
            format: self.format,
            device: self.device.clone(),
            options: self.options.clone(),
        }
    }

    /// Parse a configuration from JSON
    pub fn from_json(json: &str) -> CameraResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config)
    }

    /// Serialize the configuration as pretty-printed JSON
    pub fn to_json(&self) -> CameraResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a configuration file
    pub fn load(path: &Path) -> CameraResult<Self> {
        debug!(path = %path.display(), "Loading configuration");
        let contents = std::fs::read_to_string(path).map_err(|e| {
            CameraError::Configuration(format!("could not read {}: {}", path.display(), e))
        })?;
        Self::from_json(&contents).map_err(|e| match e {
            CameraError::Configuration(msg) => {
                CameraError::Configuration(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    /// Write the configuration to a file, creating parent directories
    pub fn save(&self, path: &Path) -> CameraResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json()?)?;
        debug!(path = %path.display(), "Configuration saved");
        Ok(())
    }

    /// Default configuration file location, e.g. `~/.config/virtualcam/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(defaults::CONFIG_DIR).join(defaults::CONFIG_FILE))
    }
}
