// SPDX-License-Identifier: GPL-3.0-only

//! Frame buffers and their validation
//!
//! A [`Frame`] is a borrowed view over raw pixel memory tagged with a shape
//! and an element type, the way an n-dimensional array would describe it.
//! Typed slices (`&[u16]`, `&[f32]`, ...) are reinterpreted as bytes without
//! copying, so a wrongly typed buffer can be reported instead of silently
//! forwarded.

use crate::errors::ValidationError;
use crate::media::formats::ShapeSpec;
use std::borrow::Cow;
use std::fmt;

/// Element type of a frame buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    F32,
    F64,
}

impl ElementType {
    /// Size of one element in bytes
    pub const fn size(&self) -> usize {
        match self {
            ElementType::U8 | ElementType::I8 => 1,
            ElementType::U16 | ElementType::I16 => 2,
            ElementType::U32 | ElementType::I32 | ElementType::F32 => 4,
            ElementType::F64 => 8,
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ElementType::U8 => "u8",
            ElementType::I8 => "i8",
            ElementType::U16 => "u16",
            ElementType::I16 => "i16",
            ElementType::U32 => "u32",
            ElementType::I32 => "i32",
            ElementType::F32 => "f32",
            ElementType::F64 => "f64",
        };
        write!(f, "{}", name)
    }
}

/// Plain-old-data element that can back a [`Frame`]
pub trait Element: bytemuck::Pod {
    const ELEMENT_TYPE: ElementType;
}

macro_rules! impl_element {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl Element for $ty {
                const ELEMENT_TYPE: ElementType = ElementType::$variant;
            }
        )*
    };
}

impl_element!(
    u8 => U8,
    i8 => I8,
    u16 => U16,
    i16 => I16,
    u32 => U32,
    i32 => I32,
    f32 => F32,
    f64 => F64,
);

/// Borrowed frame buffer with shape and element type
#[derive(Debug, Clone)]
pub struct Frame<'a> {
    data: &'a [u8],
    shape: Vec<usize>,
    element_type: ElementType,
}

impl<'a> Frame<'a> {
    /// Wrap 8-bit pixel data with the given shape, e.g. `[height, width, 3]`
    pub fn new(data: &'a [u8], shape: &[usize]) -> Self {
        Self {
            data,
            shape: shape.to_vec(),
            element_type: ElementType::U8,
        }
    }

    /// Wrap a typed slice; non-`u8` element types are rejected by validation
    pub fn from_elements<T: Element>(data: &'a [T], shape: &[usize]) -> Self {
        Self {
            data: bytemuck::cast_slice(data),
            shape: shape.to_vec(),
            element_type: T::ELEMENT_TYPE,
        }
    }

    /// Wrap a flat buffer, as used by the size-checked YUV formats
    pub fn flat(data: &'a [u8]) -> Self {
        Self::new(data, &[data.len()])
    }

    /// Dimensions of the buffer
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Element type of the buffer
    pub fn element_type(&self) -> ElementType {
        self.element_type
    }

    /// Raw bytes of the buffer
    pub fn as_bytes(&self) -> &'a [u8] {
        self.data
    }

    /// Number of elements actually stored
    pub fn len(&self) -> usize {
        self.data.len() / self.element_type.size()
    }

    /// Check if the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Frame that passed validation, ready for a backend
#[derive(Debug, Clone)]
pub struct ValidatedFrame<'a> {
    data: Cow<'a, [u8]>,
    alpha_dropped: bool,
}

impl<'a> ValidatedFrame<'a> {
    /// Bytes to hand to the backend
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// True if a legacy 4-channel buffer was accepted and its alpha removed
    pub fn alpha_dropped(&self) -> bool {
        self.alpha_dropped
    }
}

/// Check a frame against the shape its pixel format requires
///
/// Element type is checked first, then buffer consistency, then shape.
/// Where three channels are expected, a four-channel buffer is accepted
/// as a deprecated input: the alpha channel is dropped into a new buffer.
pub fn validate<'a>(
    frame: &Frame<'a>,
    spec: &ShapeSpec,
) -> Result<ValidatedFrame<'a>, ValidationError> {
    if frame.element_type != ElementType::U8 {
        return Err(ValidationError::ElementType {
            found: frame.element_type,
        });
    }

    let declared = frame
        .shape
        .iter()
        .try_fold(1usize, |acc, &dim| acc.checked_mul(dim));
    let Some(declared) = declared.filter(|&n| n == frame.data.len()) else {
        return Err(ValidationError::Inconsistent {
            shape: frame.shape.clone(),
            len: frame.data.len(),
        });
    };

    match *spec {
        ShapeSpec::Elements(expected) => {
            if declared != expected {
                return Err(ValidationError::Size {
                    expected,
                    found: declared,
                });
            }
            Ok(ValidatedFrame {
                data: Cow::Borrowed(frame.data),
                alpha_dropped: false,
            })
        }
        ShapeSpec::Dims {
            height,
            width,
            channels: None,
        } => {
            if frame.shape != [height, width] {
                return Err(ValidationError::Shape {
                    expected: *spec,
                    found: frame.shape.clone(),
                });
            }
            Ok(ValidatedFrame {
                data: Cow::Borrowed(frame.data),
                alpha_dropped: false,
            })
        }
        ShapeSpec::Dims {
            height,
            width,
            channels: Some(expected),
        } => {
            if frame.shape.len() != 3 || frame.shape[0] != height || frame.shape[1] != width {
                return Err(ValidationError::Shape {
                    expected: *spec,
                    found: frame.shape.clone(),
                });
            }

            let found = frame.shape[2];
            if found == expected {
                Ok(ValidatedFrame {
                    data: Cow::Borrowed(frame.data),
                    alpha_dropped: false,
                })
            } else if expected == 3 && found == 4 {
                Ok(ValidatedFrame {
                    data: Cow::Owned(drop_alpha(frame.data)),
                    alpha_dropped: true,
                })
            } else {
                Err(ValidationError::ChannelCount { expected, found })
            }
        }
    }
}

/// Copy the first three channels of every 4-channel pixel
fn drop_alpha(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() / 4 * 3);
    for pixel in data.chunks_exact(4) {
        out.extend_from_slice(&pixel[..3]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ValidationErrorKind;
    use crate::media::formats::PixelFormat;

    #[test]
    fn test_typed_slices_keep_element_type() {
        let data = vec![0u16; 12];
        let frame = Frame::from_elements(&data, &[2, 2, 3]);
        assert_eq!(frame.element_type(), ElementType::U16);
        assert_eq!(frame.as_bytes().len(), 24);
        assert_eq!(frame.len(), 12);
    }

    #[test]
    fn test_rgb_exact_shape() {
        let spec = PixelFormat::Rgb.required_shape(4, 2);
        let data = vec![7u8; 2 * 4 * 3];
        let validated = validate(&Frame::new(&data, &[2, 4, 3]), &spec).unwrap();
        assert!(!validated.alpha_dropped());
        assert_eq!(validated.as_bytes(), &data[..]);
    }

    #[test]
    fn test_transposed_shape_rejected() {
        let spec = PixelFormat::Rgb.required_shape(4, 2);
        let data = vec![0u8; 2 * 4 * 3];
        let err = validate(&Frame::new(&data, &[4, 2, 3]), &spec).unwrap_err();
        assert!(matches!(err, ValidationError::Shape { .. }));
    }

    #[test]
    fn test_legacy_alpha_is_dropped() {
        let spec = PixelFormat::Rgb.required_shape(2, 1);
        let data = [1u8, 2, 3, 255, 4, 5, 6, 255];
        let validated = validate(&Frame::new(&data, &[1, 2, 4]), &spec).unwrap();
        assert!(validated.alpha_dropped());
        assert_eq!(validated.as_bytes(), &[1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_rgba_is_first_class() {
        let spec = PixelFormat::Rgba.required_shape(2, 1);
        let data = [1u8, 2, 3, 255, 4, 5, 6, 255];
        let validated = validate(&Frame::new(&data, &[1, 2, 4]), &spec).unwrap();
        assert!(!validated.alpha_dropped());
        assert_eq!(validated.as_bytes().len(), 8);

        let rgb = [0u8; 6];
        let err = validate(&Frame::new(&rgb, &[1, 2, 3]), &spec).unwrap_err();
        assert_eq!(
            err,
            ValidationError::ChannelCount {
                expected: 4,
                found: 3
            }
        );
    }

    #[test]
    fn test_wrong_channel_count() {
        let spec = PixelFormat::Bgr.required_shape(2, 2);
        let data = vec![0u8; 2 * 2 * 2];
        let err = validate(&Frame::new(&data, &[2, 2, 2]), &spec).unwrap_err();
        assert_eq!(
            err,
            ValidationError::ChannelCount {
                expected: 3,
                found: 2
            }
        );
    }

    #[test]
    fn test_gray_requires_two_dims() {
        let spec = PixelFormat::Gray.required_shape(3, 2);
        let data = vec![0u8; 6];
        assert!(validate(&Frame::new(&data, &[2, 3]), &spec).is_ok());
        let err = validate(&Frame::new(&data, &[2, 3, 1]), &spec).unwrap_err();
        assert!(matches!(err, ValidationError::Shape { .. }));
    }

    #[test]
    fn test_size_only_formats_ignore_layout() {
        let spec = PixelFormat::Nv12.required_shape(4, 2);
        let data = vec![0u8; 12];
        assert!(validate(&Frame::flat(&data), &spec).is_ok());
        assert!(validate(&Frame::new(&data, &[3, 4]), &spec).is_ok());

        let short = vec![0u8; 11];
        let err = validate(&Frame::flat(&short), &spec).unwrap_err();
        assert_eq!(
            err,
            ValidationError::Size {
                expected: 12,
                found: 11
            }
        );
    }

    #[test]
    fn test_wrong_element_type() {
        let spec = PixelFormat::Rgb.required_shape(2, 2);
        let data = vec![0f32; 12];
        let err = validate(&Frame::from_elements(&data, &[2, 2, 3]), &spec).unwrap_err();
        assert_eq!(err.kind(), ValidationErrorKind::Type);
    }

    #[test]
    fn test_inconsistent_buffer() {
        let spec = PixelFormat::Rgb.required_shape(2, 2);
        let data = vec![0u8; 5];
        let err = validate(&Frame::new(&data, &[2, 2, 3]), &spec).unwrap_err();
        assert!(matches!(err, ValidationError::Inconsistent { .. }));
    }

    #[test]
    fn test_overflowing_shape_is_inconsistent() {
        let spec = PixelFormat::Rgb.required_shape(2, 2);
        let data = vec![0u8; 12];
        // The unchecked product of this shape wraps around to exactly 12
        let huge = usize::MAX / 2 + 3;
        assert_eq!(huge.wrapping_mul(2).wrapping_mul(3), data.len());
        let err = validate(&Frame::new(&data, &[huge, 2, 3]), &spec).unwrap_err();
        assert!(matches!(err, ValidationError::Inconsistent { .. }));
        assert_eq!(err.kind(), ValidationErrorKind::Shape);
    }
}
