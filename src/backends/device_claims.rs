// SPDX-License-Identifier: GPL-3.0-only

//! In-process bookkeeping of bound devices
//!
//! Loopback drivers happily let the same device be opened several times, so
//! two sessions could end up writing into one camera. Backends built from the
//! same registry share a [`DeviceClaims`] set and refuse devices that are
//! already claimed. This does not protect against other processes.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// Shared set of device names currently bound by a backend
#[derive(Debug, Clone, Default)]
pub struct DeviceClaims {
    claimed: Arc<Mutex<HashSet<String>>>,
}

impl DeviceClaims {
    /// Create an empty claim set
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        // The set stays consistent even if a holder panicked mid-insert
        self.claimed.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Claim a device, or return `None` if it is already bound
    pub fn try_claim(&self, device: &str) -> Option<DeviceClaim> {
        let mut claimed = self.lock();
        if !claimed.insert(device.to_string()) {
            return None;
        }
        debug!(device, "Device claimed");
        Some(DeviceClaim {
            device: device.to_string(),
            claims: self.clone(),
        })
    }

    /// Check if a device is currently bound
    pub fn is_claimed(&self, device: &str) -> bool {
        self.lock().contains(device)
    }

    fn release(&self, device: &str) {
        if self.lock().remove(device) {
            debug!(device, "Device released");
        }
    }
}

/// Exclusive claim on one device, released on drop
#[derive(Debug)]
pub struct DeviceClaim {
    device: String,
    claims: DeviceClaims,
}

impl DeviceClaim {
    /// Name of the claimed device
    pub fn device(&self) -> &str {
        &self.device
    }
}

impl Drop for DeviceClaim {
    fn drop(&mut self) {
        self.claims.release(&self.device);
    }
}
