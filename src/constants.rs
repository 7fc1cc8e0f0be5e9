// SPDX-License-Identifier: GPL-3.0-only

//! Crate-wide constants

/// Frame pacing constants
pub mod pacing {
    /// Weight of a new interval sample in the moving average
    pub const EMA_WEIGHT: f64 = 0.2;

    /// Gain applied to the relative rate error when adjusting the sleep
    /// compensation
    pub const COMPENSATION_STEP: f64 = 0.01;
}

/// Camera session constants
pub mod session {
    use std::time::Duration;

    /// Minimum time between two frame rate reports
    pub const REPORT_INTERVAL: Duration = Duration::from_secs(1);

    /// Frames sent before the achieved rate is judged
    pub const DEGRADATION_MIN_FRAMES: u64 = 100;

    /// Achieved/target rate ratio below which the rate counts as degraded
    pub const DEGRADATION_RATIO: f64 = 0.5;
}

/// Session defaults used by the configuration and the CLI
pub mod defaults {
    /// Default frame width
    pub const WIDTH: u32 = 1280;

    /// Default frame height
    pub const HEIGHT: u32 = 720;

    /// Default target frame rate
    pub const FPS: f64 = 30.0;

    /// Lowest accepted target frame rate, one frame every 100 seconds
    pub const MIN_FPS: f64 = 0.01;

    /// Config directory name under the platform config dir
    pub const CONFIG_DIR: &str = "virtualcam";

    /// Config file name
    pub const CONFIG_FILE: &str = "config.json";
}

/// GStreamer pipeline constants
pub mod pipeline {
    /// Pipeline playing state timeout on start
    pub const START_TIMEOUT_SECS: u64 = 5;

    /// Frame counter modulo for periodic debug logging
    pub const FRAME_LOG_INTERVAL: u64 = 100;
}
