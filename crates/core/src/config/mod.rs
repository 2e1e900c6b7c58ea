use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::{
    record::RecordingSettings, sequence::DEFAULT_STEP, ArcballCamera, CameraPose,
    CaptureScheduler, OrbitClock, Result,
};

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub camera: CameraConfig,
    pub capture: CaptureConfig,
    pub output: RecordingSettings,
}

impl AppConfig {
    /// Reads a JSON configuration file. Missing fields keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        Ok(serde_json::from_str(contents)?)
    }

    /// Scheduler holding a camera built from [`CameraConfig`].
    pub fn scheduler(&self) -> Result<CaptureScheduler> {
        Ok(CaptureScheduler::new(self.camera.build())
            .with_step(self.capture.step_radians)?
            .with_high_dynamic_range(self.capture.high_dynamic_range))
    }

    /// Capture clock; a zero tick interval is rejected.
    pub fn clock(&self) -> Result<OrbitClock> {
        OrbitClock::from_millis(self.capture.tick_interval_ms)
    }
}

/// Initial arcball parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub radius: f32,
    pub inclination_angle: f32,
    pub target: [f32; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        let pose = CameraPose::default();
        Self {
            radius: pose.radius,
            inclination_angle: pose.inclination_angle,
            target: pose.target.to_array(),
        }
    }
}

impl CameraConfig {
    pub fn build(&self) -> ArcballCamera {
        ArcballCamera::new(CameraPose {
            radius: self.radius,
            inclination_angle: self.inclination_angle,
            rotation_angle: 0.0,
            target: Vec3::from_array(self.target),
        })
    }
}

/// Configuration of the orbit capture loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub tick_interval_ms: u64,
    pub step_radians: f32,
    pub high_dynamic_range: bool,
    /// Snapshot size for the built-in renderer.
    pub width: u32,
    pub height: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 50,
            step_radians: DEFAULT_STEP,
            high_dynamic_range: false,
            width: 300,
            height: 200,
        }
    }
}
