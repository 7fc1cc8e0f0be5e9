// SPDX-License-Identifier: GPL-3.0-only

//! Pixel formats accepted by virtual camera backends

use super::fourcc::FourCc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Frame layout negotiated between the caller and a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PixelFormat {
    // ===== Interleaved, shape-checked =====
    /// RGB 24-bit, `(height, width, 3)`
    #[default]
    Rgb,
    /// BGR 24-bit, `(height, width, 3)`
    Bgr,
    /// RGBA 32-bit, `(height, width, 4)`
    Rgba,
    /// 8-bit grayscale, `(height, width)`
    Gray,

    // ===== Planar/packed YUV, size-checked =====
    /// I420 4:2:0 - Planar (Y + U + V planes)
    I420,
    /// NV12 4:2:0 - Semi-planar (Y + interleaved UV)
    Nv12,
    /// YUYV 4:2:2 - Packed (Y0 U Y1 V)
    Yuyv,
    /// UYVY 4:2:2 - Packed (U Y0 V Y1)
    Uyvy,
}

/// Buffer shape a pixel format requires for a given geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeSpec {
    /// Exact dimensions; `channels` is `None` for 2D (single channel) buffers
    Dims {
        height: usize,
        width: usize,
        channels: Option<usize>,
    },
    /// Only the total number of elements is fixed
    Elements(usize),
}

impl ShapeSpec {
    /// Total number of bytes a matching buffer holds
    pub fn byte_len(&self) -> usize {
        match *self {
            ShapeSpec::Dims {
                height,
                width,
                channels,
            } => height * width * channels.unwrap_or(1),
            ShapeSpec::Elements(count) => count,
        }
    }
}

impl fmt::Display for ShapeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShapeSpec::Dims {
                height,
                width,
                channels: Some(channels),
            } => write!(f, "({}, {}, {})", height, width, channels),
            ShapeSpec::Dims {
                height,
                width,
                channels: None,
            } => write!(f, "({}, {})", height, width),
            ShapeSpec::Elements(count) => write!(f, "{} elements", count),
        }
    }
}

impl PixelFormat {
    /// Every format, in catalog order
    pub const ALL: [PixelFormat; 8] = [
        PixelFormat::Rgb,
        PixelFormat::Bgr,
        PixelFormat::Rgba,
        PixelFormat::Gray,
        PixelFormat::I420,
        PixelFormat::Nv12,
        PixelFormat::Yuyv,
        PixelFormat::Uyvy,
    ];

    /// Canonical code used when talking to backends
    ///
    /// Interleaved RGB codes follow libyuv, which names formats after their
    /// order in a register rather than in memory (`raw ` is RGB in memory).
    pub const fn fourcc(&self) -> FourCc {
        match self {
            Self::Rgb => FourCc::new(b"raw "),
            Self::Bgr => FourCc::new(b"24BG"),
            Self::Rgba => FourCc::new(b"ABGR"),
            Self::Gray => FourCc::new(b"J400"),
            Self::I420 => FourCc::new(b"I420"),
            Self::Nv12 => FourCc::new(b"NV12"),
            Self::Yuyv => FourCc::new(b"YUY2"),
            Self::Uyvy => FourCc::new(b"UYVY"),
        }
    }

    /// Look a format up by its canonical code
    pub fn from_fourcc(code: FourCc) -> Option<Self> {
        Self::ALL.into_iter().find(|format| format.fourcc() == code)
    }

    /// Short upper-case name
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Rgb => "RGB",
            Self::Bgr => "BGR",
            Self::Rgba => "RGBA",
            Self::Gray => "GRAY",
            Self::I420 => "I420",
            Self::Nv12 => "NV12",
            Self::Yuyv => "YUYV",
            Self::Uyvy => "UYVY",
        }
    }

    /// Number of interleaved channels for shape-checked formats
    pub const fn channels(&self) -> Option<usize> {
        match self {
            Self::Rgb | Self::Bgr => Some(3),
            Self::Rgba => Some(4),
            Self::Gray => Some(1),
            Self::I420 | Self::Nv12 | Self::Yuyv | Self::Uyvy => None,
        }
    }

    /// Shape a frame of `width` x `height` must have in this format
    pub fn required_shape(&self, width: u32, height: u32) -> ShapeSpec {
        let (width, height) = (width as usize, height as usize);
        match self {
            Self::Rgb | Self::Bgr => ShapeSpec::Dims {
                height,
                width,
                channels: Some(3),
            },
            Self::Rgba => ShapeSpec::Dims {
                height,
                width,
                channels: Some(4),
            },
            Self::Gray => ShapeSpec::Dims {
                height,
                width,
                channels: None,
            },
            // 4:2:0, chroma subsampled in both directions
            Self::I420 | Self::Nv12 => ShapeSpec::Elements(width * height * 3 / 2),
            // 4:2:2, chroma subsampled horizontally
            Self::Yuyv | Self::Uyvy => ShapeSpec::Elements(width * height * 2),
        }
    }

    /// Size in bytes of one frame
    pub fn frame_size(&self, width: u32, height: u32) -> usize {
        self.required_shape(width, height).byte_len()
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Error returned for names and codes outside the catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPixelFormat(pub String);

impl fmt::Display for UnknownPixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown pixel format {:?} (expected one of RGB, BGR, RGBA, GRAY, I420, NV12, YUYV, UYVY)",
            self.0
        )
    }
}

impl std::error::Error for UnknownPixelFormat {}

impl FromStr for PixelFormat {
    type Err = UnknownPixelFormat;

    /// Parse a format from its name (case insensitive) or its exact code
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let by_name = Self::ALL
            .into_iter()
            .find(|format| format.name().eq_ignore_ascii_case(s.trim()));
        if let Some(format) = by_name {
            return Ok(format);
        }

        s.parse::<FourCc>()
            .ok()
            .and_then(Self::from_fourcc)
            .ok_or_else(|| UnknownPixelFormat(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_codes_are_injective() {
        let codes: HashSet<FourCc> = PixelFormat::ALL.iter().map(|f| f.fourcc()).collect();
        assert_eq!(codes.len(), PixelFormat::ALL.len());
    }

    #[test]
    fn test_fourcc_round_trip() {
        for format in PixelFormat::ALL {
            let packed = format.fourcc().to_u32();
            assert_eq!(FourCc::from_u32(packed), format.fourcc());
            assert_eq!(PixelFormat::from_fourcc(FourCc::from_u32(packed)), Some(format));
        }
    }

    #[test]
    fn test_frame_sizes() {
        assert_eq!(PixelFormat::Rgb.frame_size(1280, 720), 1280 * 720 * 3);
        assert_eq!(PixelFormat::Rgba.frame_size(1280, 720), 1280 * 720 * 4);
        assert_eq!(PixelFormat::Gray.frame_size(1280, 720), 1280 * 720);
        assert_eq!(PixelFormat::I420.frame_size(1280, 720), 1280 * 720 * 3 / 2);
        assert_eq!(PixelFormat::Nv12.frame_size(1280, 720), 1280 * 720 * 3 / 2);
        assert_eq!(PixelFormat::Yuyv.frame_size(1280, 720), 1280 * 720 * 2);
        assert_eq!(PixelFormat::Uyvy.frame_size(1280, 720), 1280 * 720 * 2);
    }

    #[test]
    fn test_parse_name_and_code() {
        assert_eq!("rgb".parse::<PixelFormat>().unwrap(), PixelFormat::Rgb);
        assert_eq!("YUY2".parse::<PixelFormat>().unwrap(), PixelFormat::Yuyv);
        assert_eq!("raw ".parse::<PixelFormat>().unwrap(), PixelFormat::Rgb);
        assert!("MJPG".parse::<PixelFormat>().is_err());
    }

    #[test]
    fn test_serde_uses_names() {
        let json = serde_json::to_string(&PixelFormat::Nv12).unwrap();
        assert_eq!(json, "\"NV12\"");
        let parsed: PixelFormat = serde_json::from_str("\"GRAY\"").unwrap();
        assert_eq!(parsed, PixelFormat::Gray);
    }
}
