// SPDX-License-Identifier: GPL-3.0-only

//! Virtual camera session
//!
//! [`Camera`] owns exactly one backend for its whole life. Every frame goes
//! through the same steps:
//!
//! ```text
//! send(frame)
//!   ├─ validate against the negotiated format   (nothing counted on failure)
//!   ├─ count + timestamp + measure rate
//!   ├─ periodic rate report / degradation check
//!   └─ backend.send(bytes)
//! ```
//!
//! The backend is released exactly once, by [`Camera::close`] or on drop.

use crate::backends::{BackendRegistry, VirtualCameraBackend};
use crate::config::CameraConfig;
use crate::constants::session::{DEGRADATION_MIN_FRAMES, DEGRADATION_RATIO, REPORT_INTERVAL};
use crate::errors::{CameraError, CameraResult};
use crate::media::formats::{FourCc, PixelFormat, ShapeSpec};
use crate::media::frame::{Frame, validate};
use crate::pacing::{Clock, FramePacer, SystemClock};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// An open virtual camera
pub struct Camera<C: Clock = SystemClock> {
    backend: Option<Box<dyn VirtualCameraBackend>>,
    backend_name: String,
    device: String,
    width: u32,
    height: u32,
    fps: f64,
    format: PixelFormat,
    shape: ShapeSpec,
    print_fps: bool,
    frames_sent: u64,
    pacer: FramePacer<C>,
    last_report: Instant,
    rate_degraded: bool,
    alpha_notice_shown: bool,
}

impl Camera<SystemClock> {
    /// Open a camera with the first backend of `registry` that works
    ///
    /// # Errors
    /// * [`CameraError::Configuration`] - invalid config or unknown backend name
    /// * [`CameraError::BackendUnavailable`] - every candidate backend failed
    pub fn open(registry: &BackendRegistry, config: &CameraConfig) -> CameraResult<Self> {
        Self::open_with_clock(registry, config, SystemClock)
    }
}

impl<C: Clock> Camera<C> {
    /// Open a camera whose pacing runs on `clock`
    pub fn open_with_clock(
        registry: &BackendRegistry,
        config: &CameraConfig,
        clock: C,
    ) -> CameraResult<Self> {
        config.validate()?;

        let params = config.to_backend_params();
        let resolved = registry.resolve(config.backend.as_deref(), &params)?;
        for failure in &resolved.failures {
            debug!(failure = %failure, "Skipped backend");
        }

        let device = resolved.backend.device().to_string();
        info!(
            backend = %resolved.name,
            device = %device,
            width = config.width,
            height = config.height,
            fps = config.fps,
            format = %config.format,
            "Virtual camera opened"
        );

        let pacer = FramePacer::new(config.fps, clock);
        let last_report = pacer.clock().now();

        Ok(Self {
            backend: Some(resolved.backend),
            backend_name: resolved.name,
            device,
            width: config.width,
            height: config.height,
            fps: config.fps,
            format: config.format,
            shape: config.format.required_shape(config.width, config.height),
            print_fps: config.print_fps,
            frames_sent: 0,
            pacer,
            last_report,
            rate_degraded: false,
            alpha_notice_shown: false,
        })
    }

    /// Send one frame to the virtual camera
    ///
    /// The frame must match [`Camera::format`] at the camera's size. RGB and
    /// BGR cameras also take 4-channel frames and drop the alpha channel;
    /// that path is deprecated and logs a warning once.
    pub fn send(&mut self, frame: &Frame<'_>) -> CameraResult<()> {
        if self.backend.is_none() {
            return Err(CameraError::Closed);
        }

        let validated = validate(frame, &self.shape)?;
        if validated.alpha_dropped() && !self.alpha_notice_shown {
            self.alpha_notice_shown = true;
            warn!(
                format = %self.format,
                "4-channel frames are deprecated for {}, the alpha channel is dropped; send {} frames instead",
                self.format,
                self.format
            );
        }

        self.frames_sent += 1;
        let now = self.pacer.measure();

        if self.print_fps && now.saturating_duration_since(self.last_report) > REPORT_INTERVAL {
            self.last_report = now;
            info!(backend = %self.backend_name, "{}", self.rate_report());
        }
        self.check_rate();

        let backend = self.backend.as_mut().ok_or(CameraError::Closed)?;
        backend.send(validated.as_bytes())?;
        Ok(())
    }

    /// Block until the next frame is due at the target rate
    ///
    /// Call after producing a frame and before sending it. The sleep shrinks
    /// automatically when frame production or scheduling overhead would
    /// otherwise keep the rate below target.
    pub fn wait_for_next_frame(&mut self) {
        self.pacer.wait_for_next_frame(self.fps);
    }

    /// Release the backend; later calls do nothing
    pub fn close(&mut self) -> CameraResult<()> {
        let Some(mut backend) = self.backend.take() else {
            return Ok(());
        };
        info!(
            backend = %self.backend_name,
            device = %self.device,
            frames = self.frames_sent,
            "Closing virtual camera"
        );
        backend.close()?;
        Ok(())
    }

    /// Achieved rate as shown in periodic reports, e.g. `19.8 fps | 35 %`
    ///
    /// The percentage is the share of each frame interval spent outside
    /// [`Camera::wait_for_next_frame`]; it only appears once pacing had to
    /// compensate.
    pub fn rate_report(&self) -> String {
        let mut report = format!("{:.1} fps", self.pacer.current_fps());
        if self.pacer.extra_time_per_frame() > std::time::Duration::ZERO {
            report.push_str(&format!(" | {:.0} %", 100.0 * self.busy_ratio()));
        }
        report
    }

    fn check_rate(&mut self) {
        if self.rate_degraded || self.frames_sent < DEGRADATION_MIN_FRAMES {
            return;
        }
        let current = self.pacer.current_fps();
        if current < self.fps * DEGRADATION_RATIO {
            self.rate_degraded = true;
            warn!(
                backend = %self.backend_name,
                current_fps = current,
                target_fps = self.fps,
                "Frames are sent at {:.1} fps, well below the target of {:.1} fps",
                current,
                self.fps
            );
        }
    }

    /// Name of the backend in use
    pub fn backend(&self) -> &str {
        &self.backend_name
    }

    /// Device the backend is bound to
    pub fn device(&self) -> &str {
        &self.device
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Target frame rate
    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// Format frames are expected in
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Format the device receives, if the backend reports one in the catalog
    pub fn native_format(&self) -> Option<PixelFormat> {
        self.native_fourcc().and_then(PixelFormat::from_fourcc)
    }

    /// Code of the format the device receives, if the backend knows it
    pub fn native_fourcc(&self) -> Option<FourCc> {
        self.backend.as_ref().and_then(|b| b.native_fourcc())
    }

    /// Frames accepted so far
    pub fn frames_sent(&self) -> u64 {
        self.frames_sent
    }

    /// Achieved frame rate
    pub fn current_fps(&self) -> f64 {
        self.pacer.current_fps()
    }

    /// Share of each frame interval spent producing the frame, in `[0, 1]`
    pub fn busy_ratio(&self) -> f64 {
        self.pacer.busy_ratio(self.fps)
    }

    /// True once the achieved rate fell below half the target
    pub fn rate_degraded(&self) -> bool {
        self.rate_degraded
    }

    /// True once a 4-channel frame had its alpha channel dropped
    ///
    /// The deprecation warning is logged when this first becomes true.
    pub fn alpha_dropped(&self) -> bool {
        self.alpha_notice_shown
    }

    pub fn is_closed(&self) -> bool {
        self.backend.is_none()
    }
}

impl<C: Clock> std::fmt::Debug for Camera<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Camera")
            .field("backend", &self.backend_name)
            .field("device", &self.device)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("fps", &self.fps)
            .field("format", &self.format)
            .field("frames_sent", &self.frames_sent)
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl<C: Clock> Drop for Camera<C> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            error!(backend = %self.backend_name, error = %e, "Failed to close virtual camera");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::{BackendDescriptor, BackendResult};
    use crate::pacing::ManualClock;
    use std::time::Duration;

    struct NullBackend;

    impl VirtualCameraBackend for NullBackend {
        fn send(&mut self, _frame: &[u8]) -> BackendResult<()> {
            Ok(())
        }

        fn close(&mut self) -> BackendResult<()> {
            Ok(())
        }

        fn device(&self) -> &str {
            "null"
        }

        fn native_fourcc(&self) -> Option<FourCc> {
            None
        }
    }

    fn registry() -> BackendRegistry {
        BackendRegistry::new().with(BackendDescriptor::new("null", |_| {
            Ok(Box::new(NullBackend) as Box<dyn VirtualCameraBackend>)
        }))
    }

    #[test]
    fn test_invalid_config_is_rejected_before_resolution() {
        let err = Camera::open(&registry(), &CameraConfig::new(0, 0, 30.0)).unwrap_err();
        assert!(matches!(err, CameraError::Configuration(_)));
    }

    #[test]
    fn test_rate_report_format() {
        let clock = ManualClock::new();
        let mut camera =
            Camera::open_with_clock(&registry(), &CameraConfig::new(2, 2, 20.0), clock.clone())
                .unwrap();
        assert_eq!(camera.rate_report(), "20.0 fps");
        assert_eq!(camera.native_format(), None);

        let data = [0u8; 12];
        camera.send(&Frame::new(&data, &[2, 2, 3])).unwrap();
        clock.advance(Duration::from_millis(100));
        camera.send(&Frame::new(&data, &[2, 2, 3])).unwrap();
        clock.advance(Duration::from_millis(10));
        camera.wait_for_next_frame();
        assert!(camera.rate_report().ends_with('%'));
    }

    #[test]
    fn test_slow_sender_marks_rate_degraded() {
        let clock = ManualClock::new();
        let mut camera =
            Camera::open_with_clock(&registry(), &CameraConfig::new(2, 2, 30.0), clock.clone())
                .unwrap();
        let data = [0u8; 12];
        for _ in 0..DEGRADATION_MIN_FRAMES - 1 {
            camera.send(&Frame::new(&data, &[2, 2, 3])).unwrap();
            clock.advance(Duration::from_millis(100));
        }
        // Still under the frame threshold
        assert!(!camera.rate_degraded());

        camera.send(&Frame::new(&data, &[2, 2, 3])).unwrap();
        assert!(camera.rate_degraded());
    }
}
