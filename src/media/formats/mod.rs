// SPDX-License-Identifier: GPL-3.0-only

//! Pixel format catalog
//!
//! Maps each supported format to its four-character code and to the buffer
//! shape a frame in that format must have.

pub mod fourcc;
pub mod pixel_format;

pub use fourcc::{FourCc, ParseFourCcError};
pub use pixel_format::{PixelFormat, ShapeSpec, UnknownPixelFormat};
