// SPDX-License-Identifier: GPL-3.0-only

//! PipeWire virtual camera backend
//!
//! Creates a PipeWire video source node that other applications (video
//! conferencing software, browsers via xdg-desktop-portal) can pick as a
//! camera:
//!
//! ```text
//! appsrc ──▶ videoconvert ──▶ pipewiresink (mode=provide)
//! ```
//!
//! Frames enter appsrc in the negotiated format; videoconvert only acts when
//! the consumer asks PipeWire for something else.

use super::VirtualCameraBackend;
use super::device_claims::{DeviceClaim, DeviceClaims};
use super::registry::BackendDescriptor;
use super::types::{BackendError, BackendParams, BackendResult};
use crate::constants::pipeline::{FRAME_LOG_INTERVAL, START_TIMEOUT_SECS};
use crate::media::formats::{FourCc, PixelFormat};
use gstreamer::prelude::*;
use gstreamer_app::AppSrc;
use gstreamer_video::{VideoFormat, VideoInfo};
use tracing::{debug, error, info, warn};

/// Registry name of this backend
pub const BACKEND_NAME: &str = "pipewire";

/// Node name used when neither a device nor `node_name` is given
pub const DEFAULT_NODE_NAME: &str = "virtualcam";

/// Human readable node description shown by camera pickers
pub const DEFAULT_NODE_DESCRIPTION: &str = "Virtual Camera";

/// GStreamer video format carrying each catalog format unchanged
pub fn video_format(format: PixelFormat) -> VideoFormat {
    match format {
        PixelFormat::Rgb => VideoFormat::Rgb,
        PixelFormat::Bgr => VideoFormat::Bgr,
        PixelFormat::Rgba => VideoFormat::Rgba,
        PixelFormat::Gray => VideoFormat::Gray8,
        PixelFormat::I420 => VideoFormat::I420,
        PixelFormat::Nv12 => VideoFormat::Nv12,
        PixelFormat::Yuyv => VideoFormat::Yuy2,
        PixelFormat::Uyvy => VideoFormat::Uyvy,
    }
}

/// Catalog format for a GStreamer video format, if there is one
pub fn pixel_format(format: VideoFormat) -> Option<PixelFormat> {
    PixelFormat::ALL
        .into_iter()
        .find(|candidate| video_format(*candidate) == format)
}

/// Registry entry for this backend
pub fn descriptor(claims: DeviceClaims) -> BackendDescriptor {
    BackendDescriptor::new(BACKEND_NAME, move |params| {
        let output = PipeWireOutput::new(params, &claims)?;
        Ok(Box::new(output) as Box<dyn VirtualCameraBackend>)
    })
}

/// PipeWire provider node fed through a GStreamer pipeline
pub struct PipeWireOutput {
    pipeline: Option<gstreamer::Pipeline>,
    appsrc: AppSrc,
    sink: gstreamer::Element,
    claim: Option<DeviceClaim>,
    node_name: String,
    frame_size: usize,
    frames_pushed: u64,
}

impl PipeWireOutput {
    /// Build and start the pipeline
    ///
    /// The node is named after `params.device`, the `node_name` option, or
    /// [`DEFAULT_NODE_NAME`], in that order. The `node_description` option
    /// overrides the description.
    pub fn new(params: &BackendParams, claims: &DeviceClaims) -> BackendResult<Self> {
        gstreamer::init()
            .map_err(|e| BackendError::NotAvailable(format!("GStreamer init failed: {}", e)))?;

        let node_name = params
            .device
            .clone()
            .or_else(|| params.option_str("node_name").map(str::to_string))
            .unwrap_or_else(|| DEFAULT_NODE_NAME.to_string());
        let node_description = params
            .option_str("node_description")
            .unwrap_or(DEFAULT_NODE_DESCRIPTION)
            .to_string();

        let claim = claims.try_claim(&node_name).ok_or_else(|| {
            BackendError::DeviceBusy(format!("PipeWire node '{}' is already in use", node_name))
        })?;

        let info = video_info(params)?;
        let caps = info.to_caps().map_err(|e| {
            BackendError::FormatNotSupported(format!(
                "no caps for {} {}x{}: {}",
                params.format, params.width, params.height, e
            ))
        })?;

        info!(
            node = %node_name,
            width = params.width,
            height = params.height,
            format = %params.format,
            "Creating PipeWire virtual camera pipeline"
        );

        let pipeline = gstreamer::Pipeline::new();

        let appsrc = make_element("appsrc", "virtualcam_src")?
            .downcast::<AppSrc>()
            .map_err(|_| {
                BackendError::InitializationFailed("Failed to downcast to AppSrc".into())
            })?;
        let videoconvert = make_element("videoconvert", "virtualcam_convert")?;
        let sink = make_element("pipewiresink", "virtualcam_sink")?;

        appsrc.set_caps(Some(&caps));
        appsrc.set_format(gstreamer::Format::Time);
        appsrc.set_is_live(true);
        appsrc.set_do_timestamp(true);

        // "provide" mode exposes the stream as a source node instead of
        // connecting to an existing sink
        sink.set_property_from_str("mode", "provide");

        // media.role = "Camera" is what xdg-desktop-portal filters on
        let stream_props = gstreamer::Structure::builder("props")
            .field("media.class", "Video/Source")
            .field("media.role", "Camera")
            .field("node.name", node_name.as_str())
            .field("node.description", node_description.as_str())
            .build();
        sink.set_property("stream-properties", &stream_props);

        pipeline
            .add_many([appsrc.upcast_ref(), &videoconvert, &sink])
            .map_err(|e| {
                BackendError::InitializationFailed(format!("Failed to add elements: {}", e))
            })?;
        gstreamer::Element::link_many([appsrc.upcast_ref(), &videoconvert, &sink]).map_err(
            |e| BackendError::InitializationFailed(format!("Failed to link elements: {}", e)),
        )?;

        let output = Self {
            pipeline: Some(pipeline),
            appsrc,
            sink,
            claim: Some(claim),
            node_name,
            frame_size: params.frame_size(),
            frames_pushed: 0,
        };
        output.start()?;
        Ok(output)
    }

    fn pipeline(&self) -> BackendResult<&gstreamer::Pipeline> {
        self.pipeline
            .as_ref()
            .ok_or_else(|| BackendError::Other(format!("PipeWire node '{}' is closed", self.node_name)))
    }

    fn start(&self) -> BackendResult<()> {
        debug!(node = %self.node_name, "Starting virtual camera pipeline");
        let pipeline = self.pipeline()?;

        pipeline.set_state(gstreamer::State::Playing).map_err(|e| {
            BackendError::NotAvailable(format!(
                "could not start PipeWire node (is the PipeWire daemon running?): {}",
                e
            ))
        })?;

        let (result, _state, _pending) =
            pipeline.state(gstreamer::ClockTime::from_seconds(START_TIMEOUT_SECS));
        if result.is_err() {
            let _ = pipeline.set_state(gstreamer::State::Null);
            return Err(BackendError::InitializationFailed(
                "pipeline failed to reach Playing state".into(),
            ));
        }

        info!(node = %self.node_name, "PipeWire virtual camera started");
        Ok(())
    }
}

/// Describe the appsrc input, rejecting geometries GStreamer would pad
fn video_info(params: &BackendParams) -> BackendResult<VideoInfo> {
    let framerate = gstreamer::Fraction::new((params.fps * 1000.0).round() as i32, 1000);
    let info = VideoInfo::builder(video_format(params.format), params.width, params.height)
        .fps(framerate)
        .build()
        .map_err(|e| {
            BackendError::ResolutionNotSupported(format!(
                "{}x{} in {}: {}",
                params.width, params.height, params.format, e
            ))
        })?;

    // GStreamer aligns rows to 4 bytes; tightly packed frames would be misread
    if info.size() != params.frame_size() {
        return Err(BackendError::ResolutionNotSupported(format!(
            "{}x{} in {} needs row padding ({} bytes per frame instead of {}); \
             use a width that is a multiple of 4",
            params.width,
            params.height,
            params.format,
            info.size(),
            params.frame_size()
        )));
    }

    Ok(info)
}

fn make_element(factory: &str, name: &str) -> BackendResult<gstreamer::Element> {
    gstreamer::ElementFactory::make(factory)
        .name(name)
        .build()
        .map_err(|e| {
            BackendError::NotAvailable(format!(
                "GStreamer element '{}' is missing ({}); install the GStreamer PipeWire and base plugins",
                factory, e
            ))
        })
}

impl VirtualCameraBackend for PipeWireOutput {
    fn send(&mut self, frame: &[u8]) -> BackendResult<()> {
        self.pipeline()?;

        let size = frame.len().min(self.frame_size);
        let mut buffer = gstreamer::Buffer::with_size(size)
            .map_err(|e| BackendError::Other(format!("Failed to create buffer: {}", e)))?;
        {
            let buffer_ref = buffer.get_mut().ok_or_else(|| {
                BackendError::Other("Failed to get mutable buffer reference".into())
            })?;
            let mut map = buffer_ref
                .map_writable()
                .map_err(|e| BackendError::Other(format!("Failed to map buffer: {}", e)))?;
            map.copy_from_slice(&frame[..size]);
        }

        match self.appsrc.push_buffer(buffer) {
            Ok(_) => {
                self.frames_pushed += 1;
                if self.frames_pushed % FRAME_LOG_INTERVAL == 0 {
                    debug!(node = %self.node_name, frames = self.frames_pushed, "Frames pushed");
                }
                Ok(())
            }
            Err(e) => {
                warn!(node = %self.node_name, ?e, "Failed to push frame");
                Err(BackendError::IoError(format!(
                    "Failed to push frame to PipeWire node '{}': {:?}",
                    self.node_name, e
                )))
            }
        }
    }

    fn close(&mut self) -> BackendResult<()> {
        let Some(pipeline) = self.pipeline.take() else {
            return Ok(());
        };
        debug!(node = %self.node_name, "Stopping virtual camera pipeline");

        // Release the node name even if teardown below fails
        self.claim.take();

        if let Err(e) = self.appsrc.end_of_stream() {
            warn!(node = %self.node_name, ?e, "Failed to send EOS");
        }
        pipeline
            .set_state(gstreamer::State::Null)
            .map_err(|e| BackendError::Other(format!("Failed to stop pipeline: {}", e)))?;

        info!(node = %self.node_name, frames = self.frames_pushed, "PipeWire virtual camera stopped");
        Ok(())
    }

    fn device(&self) -> &str {
        &self.node_name
    }

    fn native_fourcc(&self) -> Option<FourCc> {
        let caps = self.sink.static_pad("sink")?.current_caps()?;
        let info = VideoInfo::from_caps(&caps).ok()?;
        pixel_format(info.format()).map(|format| format.fourcc())
    }
}

impl Drop for PipeWireOutput {
    fn drop(&mut self) {
        if let Some(pipeline) = self.pipeline.take() {
            debug!(node = %self.node_name, "Dropping virtual camera pipeline");
            if let Err(e) = pipeline.set_state(gstreamer::State::Null) {
                error!(?e, "Failed to set pipeline to Null on drop");
            }
        }
    }
}
