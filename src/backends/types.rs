// SPDX-License-Identifier: GPL-3.0-only

//! Shared types for virtual camera backends

use crate::media::formats::{FourCc, PixelFormat};
use std::collections::BTreeMap;

/// Backend-specific construction options (e.g. a PipeWire node description)
pub type BackendOptions = BTreeMap<String, serde_json::Value>;

/// Parameters every backend is constructed with
#[derive(Debug, Clone, PartialEq)]
pub struct BackendParams {
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Target frame rate; advisory, a backend may pick the nearest native rate
    pub fps: f64,
    /// Format frames will be sent in
    pub format: PixelFormat,
    /// Device to bind to; `None` lets the backend pick any free device
    pub device: Option<String>,
    /// Options only some backends understand
    pub options: BackendOptions,
}

impl BackendParams {
    /// Create parameters for the given geometry, rate and format
    pub fn new(width: u32, height: u32, fps: f64, format: PixelFormat) -> Self {
        Self {
            width,
            height,
            fps,
            format,
            device: None,
            options: BackendOptions::new(),
        }
    }

    /// Require a specific device
    pub fn with_device(mut self, device: impl Into<String>) -> Self {
        self.device = Some(device.into());
        self
    }

    /// Add a backend-specific option
    pub fn with_option(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }

    /// Code of the requested pixel format
    pub fn fourcc(&self) -> FourCc {
        self.format.fourcc()
    }

    /// Size in bytes of one frame in the requested format
    pub fn frame_size(&self) -> usize {
        self.format.frame_size(self.width, self.height)
    }

    /// Look up a string option
    pub fn option_str(&self, key: &str) -> Option<&str> {
        self.options.get(key).and_then(|value| value.as_str())
    }
}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Error types for backend operations
///
/// The registry reports construction failures to the caller verbatim, so
/// every message should say what went wrong and, where possible, how to fix it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Backend is not available on this system
    NotAvailable(String),
    /// Failed to initialize backend
    InitializationFailed(String),
    /// Requested device does not exist, or no usable device was found
    DeviceNotFound(String),
    /// Device is already bound by another session
    DeviceBusy(String),
    /// Device exists but cannot be opened by this user
    PermissionDenied(String),
    /// Pixel format not supported
    FormatNotSupported(String),
    /// Resolution not supported
    ResolutionNotSupported(String),
    /// General I/O error
    IoError(String),
    /// Other errors
    Other(String),
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::NotAvailable(msg) => write!(f, "Backend not available: {}", msg),
            BackendError::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            BackendError::DeviceNotFound(msg) => write!(f, "Device not found: {}", msg),
            BackendError::DeviceBusy(msg) => write!(f, "Device busy: {}", msg),
            BackendError::PermissionDenied(msg) => write!(f, "Permission denied: {}", msg),
            BackendError::FormatNotSupported(msg) => write!(f, "Format not supported: {}", msg),
            BackendError::ResolutionNotSupported(msg) => {
                write!(f, "Resolution not supported: {}", msg)
            }
            BackendError::IoError(msg) => write!(f, "I/O error: {}", msg),
            BackendError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for BackendError {}

impl From<std::io::Error> for BackendError {
    fn from(err: std::io::Error) -> Self {
        BackendError::IoError(err.to_string())
    }
}
