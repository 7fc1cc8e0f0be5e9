// SPDX-License-Identifier: GPL-3.0-only

//! Backend registry and selection
//!
//! The registry is an ordered list of named backend factories. Resolution
//! tries them in registration order and keeps the first backend that
//! constructs successfully:
//!
//! ```text
//! [v4l2loopback] ──fail──▶ [pipewire] ──ok──▶ ResolvedBackend
//!        │                      │
//!        └──▶ "v4l2loopback backend: <message>" recorded
//! ```
//!
//! When a backend name is requested explicitly only that backend is tried.

use super::VirtualCameraBackend;
use super::types::{BackendParams, BackendResult};
use crate::errors::{CameraError, CameraResult};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Factory constructing a backend from shared parameters
pub type BackendFactory =
    Arc<dyn Fn(&BackendParams) -> BackendResult<Box<dyn VirtualCameraBackend>> + Send + Sync>;

/// A named backend factory
#[derive(Clone)]
pub struct BackendDescriptor {
    name: String,
    factory: BackendFactory,
}

impl BackendDescriptor {
    /// Create a descriptor from a name and a constructor closure
    pub fn new<F>(name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&BackendParams) -> BackendResult<Box<dyn VirtualCameraBackend>>
            + Send
            + Sync
            + 'static,
    {
        Self {
            name: name.into(),
            factory: Arc::new(factory),
        }
    }

    /// Backend name used for selection and in error messages
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Construct a backend instance
    pub fn construct(&self, params: &BackendParams) -> BackendResult<Box<dyn VirtualCameraBackend>> {
        (self.factory)(params)
    }
}

impl std::fmt::Debug for BackendDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendDescriptor")
            .field("name", &self.name)
            .finish()
    }
}

/// A successfully constructed backend
pub struct ResolvedBackend {
    /// Name of the backend that succeeded
    pub name: String,
    /// The live backend instance
    pub backend: Box<dyn VirtualCameraBackend>,
    /// Failures of candidates tried before this one
    pub failures: Vec<String>,
}

impl std::fmt::Debug for ResolvedBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedBackend")
            .field("name", &self.name)
            .field("device", &self.backend.device())
            .field("failures", &self.failures)
            .finish()
    }
}

/// Ordered set of available backends
#[derive(Clone, Debug, Default)]
pub struct BackendRegistry {
    descriptors: Vec<BackendDescriptor>,
}

impl BackendRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a backend at the end of the candidate list
    ///
    /// Registering a name twice replaces the earlier factory but keeps its
    /// position.
    pub fn register(&mut self, descriptor: BackendDescriptor) -> &mut Self {
        if let Some(existing) = self
            .descriptors
            .iter_mut()
            .find(|d| d.name == descriptor.name)
        {
            debug!(backend = %descriptor.name, "Replacing registered backend");
            *existing = descriptor;
        } else {
            debug!(backend = %descriptor.name, "Registering backend");
            self.descriptors.push(descriptor);
        }
        self
    }

    /// Builder-style variant of [`BackendRegistry::register`]
    pub fn with(mut self, descriptor: BackendDescriptor) -> Self {
        self.register(descriptor);
        self
    }

    /// Names of registered backends, in resolution order
    pub fn names(&self) -> Vec<&str> {
        self.descriptors.iter().map(|d| d.name()).collect()
    }

    /// Find a backend by name
    pub fn get(&self, name: &str) -> Option<&BackendDescriptor> {
        self.descriptors.iter().find(|d| d.name == name)
    }

    /// Number of registered backends
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Check if no backend is registered
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Construct the first backend that succeeds
    ///
    /// # Arguments
    /// * `requested` - Backend name to force, or `None` to try all in order
    /// * `params` - Parameters passed unchanged to every candidate
    ///
    /// # Returns
    /// * `Ok(ResolvedBackend)` - The first backend that constructed
    /// * `Err(CameraError::Configuration)` - `requested` is not registered
    /// * `Err(CameraError::BackendUnavailable)` - Every candidate failed
    pub fn resolve(
        &self,
        requested: Option<&str>,
        params: &BackendParams,
    ) -> CameraResult<ResolvedBackend> {
        let candidates: Vec<&BackendDescriptor> = match requested {
            Some(name) => {
                let descriptor = self.get(name).ok_or_else(|| {
                    CameraError::Configuration(format!(
                        "unknown backend '{}' (available: {})",
                        name,
                        if self.is_empty() {
                            "none".to_string()
                        } else {
                            self.names().join(", ")
                        }
                    ))
                })?;
                vec![descriptor]
            }
            None => self.descriptors.iter().collect(),
        };

        let mut failures = Vec::new();
        for descriptor in candidates {
            debug!(
                backend = %descriptor.name,
                width = params.width,
                height = params.height,
                format = %params.format,
                device = ?params.device,
                "Trying backend"
            );

            match descriptor.construct(params) {
                Ok(backend) => {
                    info!(
                        backend = %descriptor.name,
                        device = %backend.device(),
                        "Virtual camera backend ready"
                    );
                    return Ok(ResolvedBackend {
                        name: descriptor.name.clone(),
                        backend,
                        failures,
                    });
                }
                Err(e) => {
                    warn!(backend = %descriptor.name, error = %e, "Backend failed to start");
                    failures.push(format!("{} backend: {}", descriptor.name, e));
                }
            }
        }

        Err(CameraError::BackendUnavailable(failures))
    }
}
