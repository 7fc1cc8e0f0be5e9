// SPDX-License-Identifier: GPL-3.0-only

//! Error types for virtual camera sessions

use crate::backends::BackendError;
use crate::media::formats::ShapeSpec;
use crate::media::frame::ElementType;
use std::fmt;

/// Result type alias using CameraError
pub type CameraResult<T> = Result<T, CameraError>;

/// Errors surfaced by [`crate::Camera`] and the backend registry
#[derive(Debug, Clone)]
pub enum CameraError {
    /// Invalid parameters, unreadable configuration or an unknown backend name
    Configuration(String),
    /// Every candidate backend failed; one message per attempted backend
    BackendUnavailable(Vec<String>),
    /// Frame rejected before reaching the backend
    Validation(ValidationError),
    /// Backend failed while the session was running
    Backend(BackendError),
    /// The camera was already closed
    Closed,
}

/// Coarse classification of a [`ValidationError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Dimensions, channel count or element count mismatch
    Shape,
    /// Element type is not an 8-bit unsigned integer
    Type,
}

/// Frame validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Element type is not `u8`
    ElementType { found: ElementType },
    /// Buffer length disagrees with its own declared shape
    Inconsistent { shape: Vec<usize>, len: usize },
    /// Dimensions do not match the negotiated geometry
    Shape {
        expected: ShapeSpec,
        found: Vec<usize>,
    },
    /// Channel count is neither the expected one nor an accepted legacy one
    ChannelCount { expected: usize, found: usize },
    /// Total element count does not match a size-only format
    Size { expected: usize, found: usize },
}

impl ValidationError {
    /// Classify the error as a shape or type failure
    pub fn kind(&self) -> ValidationErrorKind {
        match self {
            ValidationError::ElementType { .. } => ValidationErrorKind::Type,
            ValidationError::Inconsistent { .. }
            | ValidationError::Shape { .. }
            | ValidationError::ChannelCount { .. }
            | ValidationError::Size { .. } => ValidationErrorKind::Shape,
        }
    }
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            CameraError::BackendUnavailable(messages) if messages.is_empty() => {
                write!(f, "No virtual camera backend is registered")
            }
            CameraError::BackendUnavailable(messages) => write!(f, "{}", messages.join("\n")),
            CameraError::Validation(e) => write!(f, "Invalid frame: {}", e),
            CameraError::Backend(e) => write!(f, "{}", e),
            CameraError::Closed => write!(f, "Virtual camera is closed"),
        }
    }
}

fn format_shape(shape: &[usize]) -> String {
    let dims: Vec<String> = shape.iter().map(|d| d.to_string()).collect();
    if dims.len() == 1 {
        format!("({},)", dims[0])
    } else {
        format!("({})", dims.join(", "))
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::ElementType { found } => {
                write!(f, "frame elements must be u8, got {}", found)
            }
            ValidationError::Inconsistent { shape, len } => write!(
                f,
                "frame shape {} does not describe a buffer of {} elements",
                format_shape(shape),
                len
            ),
            ValidationError::Shape { expected, found } => write!(
                f,
                "mismatching frame dimensions: {} != {}",
                format_shape(found),
                expected
            ),
            ValidationError::ChannelCount { expected, found } => write!(
                f,
                "invalid number of color channels: expected {}, got {}",
                expected, found
            ),
            ValidationError::Size { expected, found } => write!(
                f,
                "mismatching frame size: {} elements != {} elements",
                found, expected
            ),
        }
    }
}

impl std::error::Error for CameraError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CameraError::Validation(e) => Some(e),
            CameraError::Backend(e) => Some(e),
            _ => None,
        }
    }
}

impl std::error::Error for ValidationError {}

impl From<ValidationError> for CameraError {
    fn from(err: ValidationError) -> Self {
        CameraError::Validation(err)
    }
}

impl From<BackendError> for CameraError {
    fn from(err: BackendError) -> Self {
        CameraError::Backend(err)
    }
}

impl From<std::io::Error> for CameraError {
    fn from(err: std::io::Error) -> Self {
        CameraError::Configuration(err.to_string())
    }
}

impl From<serde_json::Error> for CameraError {
    fn from(err: serde_json::Error) -> Self {
        CameraError::Configuration(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_joins_messages() {
        let err = CameraError::BackendUnavailable(vec![
            "v4l2loopback backend: no device".to_string(),
            "pipewire backend: daemon not running".to_string(),
        ]);
        assert_eq!(
            err.to_string(),
            "v4l2loopback backend: no device\npipewire backend: daemon not running"
        );
    }

    #[test]
    fn test_validation_kinds() {
        let err = ValidationError::ElementType {
            found: ElementType::U16,
        };
        assert_eq!(err.kind(), ValidationErrorKind::Type);

        let err = ValidationError::Size {
            expected: 6,
            found: 4,
        };
        assert_eq!(err.kind(), ValidationErrorKind::Shape);
    }

    #[test]
    fn test_shape_message() {
        let err = ValidationError::Shape {
            expected: ShapeSpec::Dims {
                height: 720,
                width: 1280,
                channels: Some(3),
            },
            found: vec![1280, 720, 3],
        };
        assert_eq!(
            err.to_string(),
            "mismatching frame dimensions: (1280, 720, 3) != (720, 1280, 3)"
        );
    }
}
