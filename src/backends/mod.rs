// SPDX-License-Identifier: GPL-3.0-only

//! Virtual camera output backends
//!
//! A backend takes validated, tightly packed frames and makes them visible to
//! other applications as a camera device.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │   Camera session    │
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │   BackendRegistry   │  ← Ordered fallback, failure collection
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │ VirtualCameraBackend│  ← Common interface
//! └──────────┬──────────┘
//!            │
//!       ┌────┴─────┐
//!       ▼          ▼
//! ┌────────────┐ ┌────────┐
//! │v4l2loopback│ │PipeWire│
//! └────────────┘ └────────┘
//! ```
//!
//! # Modules
//!
//! - [`registry`]: Named backend factories and ordered resolution
//! - [`device_claims`]: Devices bound by this process
//! - [`v4l2loopback`]: Kernel loopback device output
//! - `pipewire`: PipeWire source node (feature `pipewire`)

pub mod device_claims;
#[cfg(feature = "pipewire")]
pub mod pipewire;
pub mod registry;
pub mod types;
pub mod v4l2loopback;

pub use device_claims::{DeviceClaim, DeviceClaims};
pub use registry::{BackendDescriptor, BackendFactory, BackendRegistry, ResolvedBackend};
pub use types::*;

use crate::media::formats::FourCc;

/// Virtual camera output trait
///
/// Backends receive frames that already match the negotiated format and
/// geometry byte for byte. Conversion, if any, is the backend's own business.
pub trait VirtualCameraBackend: Send {
    /// Deliver one frame
    ///
    /// # Arguments
    /// * `frame` - Tightly packed frame data, exactly one frame long
    fn send(&mut self, frame: &[u8]) -> BackendResult<()>;

    /// Release the device
    ///
    /// Called at most once by the session.
    fn close(&mut self) -> BackendResult<()>;

    /// Name of the bound device (e.g. `/dev/video2` or a PipeWire node name)
    fn device(&self) -> &str;

    /// Format the device actually receives, if the backend can tell
    fn native_fourcc(&self) -> Option<FourCc>;
}

/// Registry with every backend compiled into this build
///
/// Resolution order is v4l2loopback, then PipeWire. Both share one claim set
/// so concurrent sessions never bind the same device.
pub fn default_registry() -> BackendRegistry {
    let claims = DeviceClaims::new();
    let mut registry = BackendRegistry::new();
    registry.register(v4l2loopback::descriptor(claims.clone()));
    #[cfg(feature = "pipewire")]
    registry.register(pipewire::descriptor(claims));
    registry
}
