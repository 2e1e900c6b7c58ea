//! Core library for Film3D.
//!
//! Film3D orbits a virtual camera around a loaded model, snapshots the view
//! at every step of one revolution and assembles the snapshots into a looping
//! animated image. Each module owns one stage of that pipeline: the arcball
//! camera, the rotation sequence, the capture scheduler and its clock, the
//! frame store and the GIF encoder. Rendering is reached only through the
//! [`Renderer`] trait.

pub mod camera;
pub mod capture;
pub mod config;
pub mod error;
pub mod frames;
pub mod record;
pub mod render;
pub mod sequence;
pub mod timeline;

#[cfg(test)]
pub(crate) mod testing;

pub use camera::{Aabb, ArcballCamera, CameraPose, CameraTransform};
pub use capture::{CancelToken, CaptureReport, CaptureScheduler, SnapshotTicket, TickOutcome};
pub use config::{AppConfig, CameraConfig, CaptureConfig};
pub use error::{Film3dError, Result};
pub use frames::{Frame, FrameStore};
pub use record::{AnimatedImageEncoder, EncodedAnimation, RecordingSettings};
pub use render::{Renderer, SnapshotFuture, WireframeRenderer};
pub use sequence::RotationSequence;
pub use timeline::OrbitClock;
