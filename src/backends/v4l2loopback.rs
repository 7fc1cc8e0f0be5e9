// SPDX-License-Identifier: GPL-3.0-only

//! v4l2loopback output backend
//!
//! Writes frames into a `/dev/videoN` node created by the v4l2loopback kernel
//! module. Applications reading that node see an ordinary webcam.
//!
//! Frames are written as-is: the V4L2 output format is set to the pixel
//! format the caller negotiated, so no conversion happens on the way.

use super::VirtualCameraBackend;
use super::device_claims::{DeviceClaim, DeviceClaims};
use super::registry::BackendDescriptor;
use super::types::{BackendError, BackendParams, BackendResult};
use crate::constants::pipeline::FRAME_LOG_INTERVAL;
use crate::media::formats::{FourCc, PixelFormat};
use std::io;
use std::os::unix::io::RawFd;
use tracing::{debug, info, warn};
use v4l::capability::Flags;
use v4l::video::Output;
use v4l::{Device, Format, FourCC};

/// Registry name of this backend
pub const BACKEND_NAME: &str = "v4l2loopback";

/// Driver name reported by VIDIOC_QUERYCAP for loopback devices
const LOOPBACK_DRIVER: &str = "v4l2 loopback";

/// Device nodes scanned when no device is requested
const MAX_SCANNED_DEVICES: usize = 100;

/// V4L2 pixel format used on the output node for each catalog format
pub fn v4l2_pixel_format(format: PixelFormat) -> FourCC {
    match format {
        PixelFormat::Rgb => FourCC::new(b"RGB3"),
        PixelFormat::Bgr => FourCC::new(b"BGR3"),
        PixelFormat::Rgba => FourCC::new(b"AB24"),
        PixelFormat::Gray => FourCC::new(b"GREY"),
        PixelFormat::I420 => FourCC::new(b"YU12"),
        PixelFormat::Nv12 => FourCC::new(b"NV12"),
        PixelFormat::Yuyv => FourCC::new(b"YUYV"),
        PixelFormat::Uyvy => FourCC::new(b"UYVY"),
    }
}

/// Device nodes tried in order when no device is requested
pub fn candidate_devices() -> impl Iterator<Item = String> {
    (0..MAX_SCANNED_DEVICES).map(|index| format!("/dev/video{}", index))
}

/// Registry entry for this backend
///
/// Sessions built from the same descriptor never bind the same device twice.
pub fn descriptor(claims: DeviceClaims) -> BackendDescriptor {
    BackendDescriptor::new(BACKEND_NAME, move |params| {
        let output = V4l2LoopbackOutput::open(params, &claims)?;
        Ok(Box::new(output) as Box<dyn VirtualCameraBackend>)
    })
}

/// Open handle on a v4l2loopback output node
pub struct V4l2LoopbackOutput {
    device: Option<Device>,
    claim: Option<DeviceClaim>,
    path: String,
    format: PixelFormat,
    frame_size: usize,
    frames_written: u64,
}

impl V4l2LoopbackOutput {
    /// Bind to the requested device, or to the first free loopback device
    ///
    /// # Arguments
    /// * `params` - Geometry and format; `params.device` is mandatory if set
    /// * `claims` - Devices already bound in this process
    pub fn open(params: &BackendParams, claims: &DeviceClaims) -> BackendResult<Self> {
        let (device, claim) = match params.device.as_deref() {
            Some(path) => open_loopback(path, claims)?,
            None => scan_for_loopback(claims)?,
        };
        let path = claim.device().to_string();

        let requested = Format::new(params.width, params.height, v4l2_pixel_format(params.format));
        // v4l2loopback fills in bytesperline, sizeimage and colorspace itself
        let applied = Output::set_format(&device, &requested).map_err(|e| {
            BackendError::InitializationFailed(format!(
                "virtual camera device {} could not be configured: {}",
                path, e
            ))
        })?;

        if applied.fourcc != requested.fourcc {
            return Err(BackendError::FormatNotSupported(format!(
                "{} rejected pixel format {} (driver chose {})",
                path, params.format, applied.fourcc
            )));
        }
        if applied.width != params.width || applied.height != params.height {
            return Err(BackendError::ResolutionNotSupported(format!(
                "{} rejected {}x{} (driver chose {}x{})",
                path, params.width, params.height, applied.width, applied.height
            )));
        }

        info!(
            device = %path,
            width = params.width,
            height = params.height,
            format = %params.format,
            "v4l2loopback output configured"
        );

        Ok(Self {
            device: Some(device),
            claim: Some(claim),
            path,
            format: params.format,
            frame_size: params.frame_size(),
            frames_written: 0,
        })
    }

    fn fd(&self) -> BackendResult<RawFd> {
        self.device
            .as_ref()
            .map(|device| device.handle().fd())
            .ok_or_else(|| BackendError::Other(format!("{} is closed", self.path)))
    }
}

impl VirtualCameraBackend for V4l2LoopbackOutput {
    fn send(&mut self, frame: &[u8]) -> BackendResult<()> {
        let fd = self.fd()?;
        let len = frame.len().min(self.frame_size);

        let written = unsafe { libc::write(fd, frame.as_ptr() as *const libc::c_void, len) };
        if written < 0 {
            let err = io::Error::last_os_error();
            if matches!(
                err.kind(),
                io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
            ) {
                // No reader keeping up; dropping one frame is not fatal
                warn!(device = %self.path, error = %err, "Frame dropped");
                return Ok(());
            }
            return Err(BackendError::IoError(format!(
                "error writing frame to {}: {}",
                self.path, err
            )));
        }
        if written as usize != len {
            return Err(BackendError::IoError(format!(
                "short write to {}: {} of {} bytes",
                self.path, written, len
            )));
        }

        self.frames_written += 1;
        if self.frames_written % FRAME_LOG_INTERVAL == 0 {
            debug!(device = %self.path, frames = self.frames_written, "Frames written");
        }
        Ok(())
    }

    fn close(&mut self) -> BackendResult<()> {
        // Closing the fd happens in Device's drop
        self.device.take();
        self.claim.take();
        info!(device = %self.path, frames = self.frames_written, "v4l2loopback output closed");
        Ok(())
    }

    fn device(&self) -> &str {
        &self.path
    }

    fn native_fourcc(&self) -> Option<FourCc> {
        Some(self.format.fourcc())
    }
}

/// Probe `/dev/video0..99` and bind the first usable loopback device
fn scan_for_loopback(claims: &DeviceClaims) -> BackendResult<(Device, DeviceClaim)> {
    for path in candidate_devices() {
        match open_loopback(&path, claims) {
            Ok(opened) => return Ok(opened),
            // Missing permissions would hide every device; report it instead of skipping
            Err(e @ BackendError::PermissionDenied(_)) => return Err(e),
            Err(e) => debug!(device = %path, error = %e, "Skipping device"),
        }
    }

    Err(BackendError::DeviceNotFound(format!(
        "No v4l2 loopback device found at /dev/video[0-{}]. \
         Did you run 'modprobe v4l2loopback'?",
        MAX_SCANNED_DEVICES - 1
    )))
}

/// Open one device node and make sure it is a free loopback output
fn open_loopback(path: &str, claims: &DeviceClaims) -> BackendResult<(Device, DeviceClaim)> {
    let claim = claims
        .try_claim(path)
        .ok_or_else(|| BackendError::DeviceBusy(format!("{} is already in use", path)))?;

    let device = Device::with_path(path).map_err(|e| match e.kind() {
        io::ErrorKind::PermissionDenied => BackendError::PermissionDenied(format!(
            "could not access {}. Add your user to the 'video' group \
             ('usermod -a -G video $USER') and log in again",
            path
        )),
        io::ErrorKind::NotFound => {
            BackendError::DeviceNotFound(format!("{} does not exist", path))
        }
        _ => BackendError::DeviceNotFound(format!("{} could not be opened: {}", path, e)),
    })?;

    let caps = device.query_caps().map_err(|e| {
        BackendError::NotAvailable(format!(
            "capabilities of {} could not be queried: {}",
            path, e
        ))
    })?;

    if !caps.capabilities.contains(Flags::VIDEO_OUTPUT) {
        return Err(BackendError::NotAvailable(format!(
            "{} is not a video output device",
            path
        )));
    }
    if caps.driver != LOOPBACK_DRIVER {
        return Err(BackendError::NotAvailable(format!(
            "{} is not a v4l2loopback device (driver: {})",
            path, caps.driver
        )));
    }

    debug!(device = %path, card = %caps.card, "Found v4l2loopback device");
    Ok((device, claim))
}
