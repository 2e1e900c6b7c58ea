use std::sync::Arc;

use image::DynamicImage;

/// A captured raster together with its position in the store.
#[derive(Debug, Clone)]
pub struct Frame {
    pub ordinal: usize,
    /// Camera rotation the snapshot was taken at.
    pub angle: f32,
    pub image: Arc<DynamicImage>,
}

impl Frame {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Ordered, append-only collection of captured frames.
///
/// Survives across capture runs until explicitly cleared.
#[derive(Debug, Default, Clone)]
pub struct FrameStore {
    frames: Vec<Frame>,
}

impl FrameStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a frame at the end and returns its ordinal.
    pub fn append(&mut self, angle: f32, image: impl Into<Arc<DynamicImage>>) -> usize {
        let ordinal = self.frames.len();
        self.frames.push(Frame {
            ordinal,
            angle,
            image: image.into(),
        });
        ordinal
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    pub fn count(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Copy of the frames accumulated so far. Later appends are not visible
    /// through the returned vector.
    pub fn all(&self) -> Vec<Frame> {
        self.frames.clone()
    }

    pub fn as_slice(&self) -> &[Frame] {
        &self.frames
    }
}

#[cfg(test)]
mod tests {
    use image::RgbaImage;

    use super::*;

    fn raster() -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::new(2, 2))
    }

    #[test]
    fn appends_in_order_with_ordinals() {
        let mut store = FrameStore::new();
        assert_eq!(store.append(0.1, raster()), 0);
        assert_eq!(store.append(0.2, raster()), 1);

        let angles: Vec<f32> = store.all().iter().map(|frame| frame.angle).collect();
        assert_eq!(angles, vec![0.1, 0.2]);
        assert_eq!(store.as_slice()[1].ordinal, 1);
    }

    #[test]
    fn all_returns_a_snapshot() {
        let mut store = FrameStore::new();
        store.append(0.0, raster());
        let snapshot = store.all();

        store.append(0.5, raster());
        assert_eq!(snapshot.len(), 1);
        assert_eq!(store.count(), 2);
    }

    #[test]
    fn clear_is_idempotent() {
        let mut store = FrameStore::new();
        store.append(0.0, raster());
        store.append(0.05, raster());

        store.clear();
        let once = store.count();
        store.clear();

        assert_eq!(once, 0);
        assert!(store.is_empty());
        assert!(store.all().is_empty());
        assert_eq!(store.append(1.0, raster()), 0);
    }
}
