// SPDX-License-Identifier: GPL-3.0-only

//! virtualcam - send frames to a virtual camera device
//!
//! This library picks a working virtual camera backend, checks every frame
//! against the negotiated pixel format before handing it over, and paces
//! delivery so the output converges to the requested frame rate.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`backends`]: Backend trait, registry with ordered fallback, and the
//!   v4l2loopback and PipeWire outputs
//! - [`media`]: Pixel format catalog and frame validation
//! - [`pacing`]: Frame rate measurement and sleep compensation
//! - [`session`]: The [`Camera`] session tying it all together
//! - [`config`]: Session configuration, loadable from JSON
//!
//! # Example
//!
//! ```no_run
//! use virtualcam::{Camera, CameraConfig, Frame, default_registry};
//!
//! let config = CameraConfig::new(640, 480, 20.0);
//! let mut camera = Camera::open(&default_registry(), &config)?;
//! let frame = vec![0u8; 640 * 480 * 3];
//! loop {
//!     camera.send(&Frame::new(&frame, &[480, 640, 3]))?;
//!     camera.wait_for_next_frame();
//! }
//! # Ok::<(), virtualcam::CameraError>(())
//! ```

pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod media;
pub mod pacing;
pub mod session;

// Re-export commonly used types
pub use backends::{
    BackendDescriptor, BackendError, BackendParams, BackendRegistry, VirtualCameraBackend,
    default_registry,
};
pub use config::CameraConfig;
pub use errors::{CameraError, CameraResult, ValidationError, ValidationErrorKind};
pub use media::{Frame, FourCc, PixelFormat, ShapeSpec};
pub use pacing::{Clock, ManualClock, SystemClock};
pub use session::Camera;
