// SPDX-License-Identifier: GPL-3.0-only

//! Shared helpers for integration tests

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use virtualcam::backends::BackendResult;
use virtualcam::{BackendDescriptor, BackendError, FourCc, VirtualCameraBackend};

/// What a mock backend saw, shared with the test
#[derive(Debug, Default)]
pub struct CallLog {
    /// Number of times the factory ran
    pub constructed: usize,
    /// Bytes of every frame received
    pub frames: Vec<Vec<u8>>,
    /// Number of close calls
    pub closes: usize,
}

pub type SharedLog = Arc<Mutex<CallLog>>;

pub fn new_log() -> SharedLog {
    Arc::new(Mutex::new(CallLog::default()))
}

/// Backend that records everything it is asked to do
pub struct MockBackend {
    device: String,
    fourcc: Option<FourCc>,
    log: SharedLog,
    fail_sends: bool,
}

impl VirtualCameraBackend for MockBackend {
    fn send(&mut self, frame: &[u8]) -> BackendResult<()> {
        if self.fail_sends {
            return Err(BackendError::IoError("mock write failed".to_string()));
        }
        self.log.lock().unwrap().frames.push(frame.to_vec());
        Ok(())
    }

    fn close(&mut self) -> BackendResult<()> {
        self.log.lock().unwrap().closes += 1;
        Ok(())
    }

    fn device(&self) -> &str {
        &self.device
    }

    fn native_fourcc(&self) -> Option<FourCc> {
        self.fourcc
    }
}

/// Descriptor for a working mock backend
pub fn mock_descriptor(name: &str, log: SharedLog) -> BackendDescriptor {
    mock_descriptor_with(name, log, None, false)
}

/// Descriptor for a mock backend reporting `fourcc`, optionally failing sends
pub fn mock_descriptor_with(
    name: &str,
    log: SharedLog,
    fourcc: Option<FourCc>,
    fail_sends: bool,
) -> BackendDescriptor {
    let device = format!("mock:{}", name);
    BackendDescriptor::new(name, move |_params| {
        log.lock().unwrap().constructed += 1;
        Ok(Box::new(MockBackend {
            device: device.clone(),
            fourcc,
            log: log.clone(),
            fail_sends,
        }) as Box<dyn VirtualCameraBackend>)
    })
}

/// Descriptor whose construction always fails with `message`
pub fn failing_descriptor(name: &str, message: &str, log: SharedLog) -> BackendDescriptor {
    let message = message.to_string();
    BackendDescriptor::new(name, move |_params| {
        log.lock().unwrap().constructed += 1;
        Err(BackendError::NotAvailable(message.clone()))
    })
}
