//! Renderer doubles shared by the unit tests.

use std::time::Duration;

use futures::future::{self, FutureExt};
use image::{DynamicImage, Rgba, RgbaImage};

use crate::{
    camera::CameraTransform,
    render::{Renderer, SnapshotFuture},
    Film3dError,
};

#[derive(Debug, Clone)]
enum Completion {
    Never,
    Immediate,
    /// Sleeps for the listed durations in turn, so results arrive out of
    /// order.
    Delayed(Vec<Duration>),
    FailEvery(usize),
}

/// Renderer whose snapshots are 2x2 rasters whose red channel holds the
/// request index.
#[derive(Debug)]
pub(crate) struct StubRenderer {
    completion: Completion,
    poses: Vec<CameraTransform>,
    requests: usize,
}

impl StubRenderer {
    fn with(completion: Completion) -> Self {
        Self {
            completion,
            poses: Vec::new(),
            requests: 0,
        }
    }

    pub(crate) fn pending() -> Self {
        Self::with(Completion::Never)
    }

    pub(crate) fn immediate() -> Self {
        Self::with(Completion::Immediate)
    }

    pub(crate) fn delayed(millis: &[u64]) -> Self {
        Self::with(Completion::Delayed(
            millis.iter().copied().map(Duration::from_millis).collect(),
        ))
    }

    pub(crate) fn failing_every(n: usize) -> Self {
        Self::with(Completion::FailEvery(n))
    }

    pub(crate) fn requests(&self) -> usize {
        self.requests
    }

    pub(crate) fn poses(&self) -> &[CameraTransform] {
        &self.poses
    }

    pub(crate) fn raster(marker: u8) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, Rgba([marker, 0, 0, 255])))
    }

    pub(crate) fn marker(image: &DynamicImage) -> u8 {
        image.to_rgba8().get_pixel(0, 0).0[0]
    }
}

impl Renderer for StubRenderer {
    fn apply_pose(&mut self, pose: &CameraTransform) {
        self.poses.push(*pose);
    }

    fn request_snapshot(&mut self, _high_dynamic_range: bool) -> SnapshotFuture {
        let index = self.requests;
        self.requests += 1;
        let image = Self::raster(index as u8);

        match &self.completion {
            Completion::Never => future::pending().boxed(),
            Completion::Immediate => future::ready(Ok(image)).boxed(),
            Completion::Delayed(delays) => {
                let delay = delays[index % delays.len()];
                async move {
                    tokio::time::sleep(delay).await;
                    Ok(image)
                }
                .boxed()
            }
            Completion::FailEvery(n) if (index + 1) % n == 0 => {
                future::ready(Err(Film3dError::snapshot_failed(0.0, "renderer returned nothing")))
                    .boxed()
            }
            Completion::FailEvery(_) => future::ready(Ok(image)).boxed(),
        }
    }
}
