// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the pixel format catalog and frame validation

use std::collections::HashSet;
use virtualcam::errors::ValidationErrorKind;
use virtualcam::media::validate;
use virtualcam::{FourCc, Frame, PixelFormat, ShapeSpec};

#[test]
fn test_every_code_round_trips() {
    let mut seen = HashSet::new();
    for format in PixelFormat::ALL {
        let code = format.fourcc();
        assert!(seen.insert(code), "{} shares its code", format);
        assert_eq!(FourCc::from_u32(code.to_u32()), code);
        assert_eq!(PixelFormat::from_fourcc(code), Some(format));
    }
}

#[test]
fn test_fourcc_packing_is_little_endian() {
    let code = FourCc::new(b"NV12");
    assert_eq!(
        code.to_u32(),
        b'N' as u32 | (b'V' as u32) << 8 | (b'1' as u32) << 16 | (b'2' as u32) << 24
    );
    assert_eq!(PixelFormat::Rgb.fourcc(), FourCc::new(b"raw "));
}

#[test]
fn test_unknown_code_is_not_in_catalog() {
    assert_eq!(PixelFormat::from_fourcc(FourCc::new(b"MJPG")), None);
    assert!("MJPG".parse::<PixelFormat>().is_err());
}

#[test]
fn test_valid_frame_for_each_format() {
    let (w, h) = (8u32, 6u32);
    for format in PixelFormat::ALL {
        let data = vec![0u8; format.frame_size(w, h)];
        let frame = match format.required_shape(w, h) {
            ShapeSpec::Dims {
                height,
                width,
                channels: Some(c),
            } => Frame::new(&data, &[height, width, c]),
            ShapeSpec::Dims { height, width, .. } => Frame::new(&data, &[height, width]),
            ShapeSpec::Elements(_) => Frame::flat(&data),
        };
        let validated = validate(&frame, &format.required_shape(w, h));
        assert!(validated.is_ok(), "{} rejected a valid frame", format);
        assert_eq!(validated.unwrap().as_bytes().len(), data.len());
    }
}

#[test]
fn test_swapped_dimensions_are_rejected() {
    let data = vec![0u8; 8 * 6];
    let spec = PixelFormat::Gray.required_shape(8, 6);
    let err = validate(&Frame::new(&data, &[8, 6]), &spec).unwrap_err();
    assert_eq!(err.kind(), ValidationErrorKind::Shape);
}

#[test]
fn test_rgba_format_requires_four_channels() {
    let data = vec![0u8; 8 * 6 * 3];
    let spec = PixelFormat::Rgba.required_shape(8, 6);
    let err = validate(&Frame::new(&data, &[6, 8, 3]), &spec).unwrap_err();
    assert_eq!(err.kind(), ValidationErrorKind::Shape);
}

#[test]
fn test_float_frames_are_type_errors() {
    let data = vec![0.5f32; 8 * 6 * 3];
    let spec = PixelFormat::Bgr.required_shape(8, 6);
    let err = validate(&Frame::from_elements(&data, &[6, 8, 3]), &spec).unwrap_err();
    assert_eq!(err.kind(), ValidationErrorKind::Type);
}

#[test]
fn test_yuv_size_mismatch() {
    let spec = PixelFormat::Yuyv.required_shape(8, 6);
    assert_eq!(spec, ShapeSpec::Elements(8 * 6 * 2));

    let data = vec![0u8; 8 * 6 * 3 / 2];
    let err = validate(&Frame::flat(&data), &spec).unwrap_err();
    assert_eq!(err.kind(), ValidationErrorKind::Shape);
    assert!(err.to_string().contains("72 elements != 96 elements"));
}
