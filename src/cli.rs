// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for virtual camera operations
//!
//! This module provides command-line functionality for:
//! - Listing registered backends
//! - Listing pixel formats
//! - Streaming a test pattern

use crate::StreamArgs;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tracing::{debug, info};
use virtualcam::constants::session::REPORT_INTERVAL;
use virtualcam::{Camera, CameraConfig, Frame, PixelFormat, ShapeSpec, default_registry};

/// List all registered backends in resolution order
pub fn list_backends() -> Result<(), Box<dyn std::error::Error>> {
    let registry = default_registry();

    if registry.is_empty() {
        println!("No backends compiled in.");
        return Ok(());
    }

    println!("Backends (tried in this order):");
    println!();
    for (index, name) in registry.names().iter().enumerate() {
        println!("  [{}] {}", index, name);
    }

    Ok(())
}

/// List supported pixel formats with their frame size at `width` x `height`
pub fn list_formats(width: u32, height: u32) -> Result<(), Box<dyn std::error::Error>> {
    println!("Pixel formats at {}x{}:", width, height);
    println!();
    println!("  {:<6} {:<6} {:<22} {:>10}", "Name", "Code", "Shape", "Bytes");
    for format in PixelFormat::ALL {
        let shape = format.required_shape(width, height);
        println!(
            "  {:<6} {:<6} {:<22} {:>10}",
            format.name(),
            format!("{:?}", format.fourcc().as_str().unwrap_or("????")),
            shape.to_string(),
            shape.byte_len()
        );
    }

    Ok(())
}

/// Stream an animated gradient until Ctrl+C or the frame limit
pub fn stream(args: StreamArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = stream_config(&args)?;

    // Set up Ctrl+C handler
    let stop_flag = Arc::new(AtomicBool::new(false));
    let stop_flag_clone = stop_flag.clone();
    ctrlc::set_handler(move || {
        stop_flag_clone.store(true, Ordering::SeqCst);
    })?;

    // The rate report goes to stdout instead of the log
    let session_config = CameraConfig {
        print_fps: false,
        ..config.clone()
    };
    let mut camera = Camera::open(&default_registry(), &session_config)?;
    println!(
        "Virtual camera started: {} on {} ({}x{} @ {}fps, {})",
        camera.backend(),
        camera.device(),
        camera.width(),
        camera.height(),
        camera.fps(),
        camera.format()
    );
    if let Some(native) = camera.native_fourcc() {
        debug!(native = %native, "Device format");
    }
    println!("Press Ctrl+C to stop");

    let mut pattern = TestPattern::new(camera.format(), camera.width(), camera.height());
    let mut reporter = config.print_fps.then(|| RateReporter::new(Instant::now()));
    while !stop_flag.load(Ordering::SeqCst) {
        if args.frames.is_some_and(|limit| camera.frames_sent() >= limit) {
            break;
        }

        pattern.draw(camera.frames_sent());
        camera.send(&pattern.frame())?;
        if let Some(reporter) = reporter.as_mut() {
            if reporter.due(Instant::now()) {
                println!("{}", camera.rate_report());
            }
        }
        camera.wait_for_next_frame();
    }

    let frames = camera.frames_sent();
    camera.close()?;
    println!("Stopped after {} frames", frames);

    Ok(())
}

/// Merge the config file (explicit, or the default one if present) with flags
fn stream_config(args: &StreamArgs) -> Result<CameraConfig, Box<dyn std::error::Error>> {
    let mut config = match args.config.clone() {
        Some(path) => CameraConfig::load(&path)?,
        None => match CameraConfig::default_path().filter(|path| path.exists()) {
            Some(path) => {
                info!(path = %path.display(), "Using default configuration file");
                CameraConfig::load(&path)?
            }
            None => CameraConfig::default(),
        },
    };

    if let Some(width) = args.width {
        config.width = width;
    }
    if let Some(height) = args.height {
        config.height = height;
    }
    if let Some(fps) = args.fps {
        config.fps = fps;
    }
    if let Some(format) = args.format {
        config.format = format;
    }
    if let Some(device) = &args.device {
        config.device = Some(device.clone());
    }
    if let Some(backend) = &args.backend {
        config.backend = Some(backend.clone());
    }
    config.print_fps |= args.print_fps;

    Ok(config)
}

/// Decides when `stream --print-fps` prints the rate report
struct RateReporter {
    last: Instant,
}

impl RateReporter {
    fn new(now: Instant) -> Self {
        Self { last: now }
    }

    /// True at most once per report interval
    fn due(&mut self, now: Instant) -> bool {
        if now.saturating_duration_since(self.last) > REPORT_INTERVAL {
            self.last = now;
            true
        } else {
            false
        }
    }
}

/// Edge length of one frame counter bit, in pixels
const BIT_SIZE: u32 = 10;

/// Bits of the frame counter drawn in the top-left corner
const COUNTER_BITS: u32 = 12;

/// Gradient change per frame
const SPEED: u64 = 2;

const RED: [u8; 3] = [255, 0, 0];
const WHITE: [u8; 3] = [255, 255, 255];

/// Animated color gradient with a binary frame counter, in any catalog format
struct TestPattern {
    format: PixelFormat,
    width: u32,
    height: u32,
    buffer: Vec<u8>,
}

impl TestPattern {
    fn new(format: PixelFormat, width: u32, height: u32) -> Self {
        Self {
            format,
            width,
            height,
            buffer: vec![0; format.frame_size(width, height)],
        }
    }

    /// Frame view with the shape the format requires
    fn frame(&self) -> Frame<'_> {
        match self.format.required_shape(self.width, self.height) {
            ShapeSpec::Dims {
                height,
                width,
                channels: Some(channels),
            } => Frame::new(&self.buffer, &[height, width, channels]),
            ShapeSpec::Dims { height, width, .. } => Frame::new(&self.buffer, &[height, width]),
            ShapeSpec::Elements(_) => Frame::flat(&self.buffer),
        }
    }

    fn draw(&mut self, frame_index: u64) {
        let gradient = Gradient::new(self.width, self.height, frame_index);
        let format = self.format;
        let (w, h) = (self.width as usize, self.height as usize);

        match format {
            PixelFormat::Rgb | PixelFormat::Bgr | PixelFormat::Rgba | PixelFormat::Gray => {
                let bpp = self.buffer.len() / (w * h);
                for (i, px) in self.buffer.chunks_exact_mut(bpp).enumerate() {
                    let [r, g, b] = gradient.rgb_at((i % w) as u32, (i / w) as u32);
                    match format {
                        PixelFormat::Rgb => px.copy_from_slice(&[r, g, b]),
                        PixelFormat::Bgr => px.copy_from_slice(&[b, g, r]),
                        PixelFormat::Rgba => px.copy_from_slice(&[r, g, b, 255]),
                        _ => px[0] = yuv([r, g, b]).0,
                    }
                }
            }
            PixelFormat::I420 | PixelFormat::Nv12 => {
                let (luma, chroma) = self.buffer.split_at_mut(w * h);
                let (cw, ch) = (w / 2, h / 2);
                for y in 0..h {
                    for x in 0..w {
                        let (l, u, v) = yuv(gradient.rgb_at(x as u32, y as u32));
                        luma[y * w + x] = l;
                        // Chroma sampled at the top-left pixel of each 2x2 block
                        if x % 2 == 0 && y % 2 == 0 {
                            let c = (y / 2) * cw + x / 2;
                            if format == PixelFormat::I420 {
                                chroma[c] = u;
                                chroma[cw * ch + c] = v;
                            } else {
                                chroma[c * 2] = u;
                                chroma[c * 2 + 1] = v;
                            }
                        }
                    }
                }
            }
            PixelFormat::Yuyv | PixelFormat::Uyvy => {
                for (i, macropixel) in self.buffer.chunks_exact_mut(4).enumerate() {
                    let (x, y) = ((i * 2 % w) as u32, (i * 2 / w) as u32);
                    let (l0, u, v) = yuv(gradient.rgb_at(x, y));
                    let (l1, _, _) = yuv(gradient.rgb_at(x + 1, y));
                    if format == PixelFormat::Yuyv {
                        macropixel.copy_from_slice(&[l0, u, l1, v]);
                    } else {
                        macropixel.copy_from_slice(&[u, l0, v, l1]);
                    }
                }
            }
        }
    }
}

/// Colors of one pattern frame
#[derive(Clone, Copy)]
struct Gradient {
    width: u32,
    height: u32,
    stop: u32,
    frame_index: u64,
}

impl Gradient {
    fn new(width: u32, height: u32, frame_index: u64) -> Self {
        // Gradient end value bounces between 0 and 255
        let phase = (frame_index * SPEED) % 510;
        let stop = if phase < 255 { phase } else { 510 - phase } as u32;
        Self {
            width: width.max(2) - 1,
            height: height.max(2) - 1,
            stop,
            frame_index,
        }
    }

    fn rgb_at(&self, x: u32, y: u32) -> [u8; 3] {
        if y < BIT_SIZE && x < COUNTER_BITS * BIT_SIZE {
            let bit = COUNTER_BITS - 1 - x / BIT_SIZE;
            return if (self.frame_index >> bit) & 1 == 1 {
                RED
            } else {
                WHITE
            };
        }

        let x = x.min(self.width);
        let y = y.min(self.height);
        let r = self.stop * x / self.width;
        let g = (255 - self.stop / 2) * y / self.height;
        let b = 192 + (self.stop as i32 - 192) * y as i32 / self.height as i32;
        [r as u8, g as u8, b as u8]
    }
}

/// BT.601 limited-range conversion
fn yuv([r, g, b]: [u8; 3]) -> (u8, u8, u8) {
    let (r, g, b) = (r as i32, g as i32, b as i32);
    let y = ((66 * r + 129 * g + 25 * b + 128) >> 8) + 16;
    let u = ((-38 * r - 74 * g + 112 * b + 128) >> 8) + 128;
    let v = ((112 * r - 94 * g - 18 * b + 128) >> 8) + 128;
    (y.clamp(0, 255) as u8, u.clamp(0, 255) as u8, v.clamp(0, 255) as u8)
}
