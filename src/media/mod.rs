// SPDX-License-Identifier: GPL-3.0-only

//! Pixel formats and frame buffers
//!
//! # Format Catalog
//!
//! The [`formats`] module maps each supported pixel format to the
//! four-character code backends negotiate with, and to the buffer shape a
//! frame in that format must have.
//!
//! # Frame Validation
//!
//! The [`frame`] module wraps caller memory in a [`Frame`] and checks it
//! against a [`ShapeSpec`] before anything is sent:
//!
//! ```text
//! RGB/BGR    (height, width, 3)   4 channels accepted, alpha dropped
//! RGBA       (height, width, 4)
//! GRAY       (height, width)
//! I420/NV12  width * height * 3 / 2 elements
//! YUYV/UYVY  width * height * 2 elements
//! ```
//!
//! No pixel data is ever converted between formats here; that is left to the
//! backend.

pub mod formats;
pub mod frame;

pub use formats::{FourCc, PixelFormat, ShapeSpec};
pub use frame::{Element, ElementType, Frame, ValidatedFrame, validate};
