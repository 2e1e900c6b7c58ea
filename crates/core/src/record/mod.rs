use std::{
    fs::{self, File},
    io::Write,
    path::{Component, Path, PathBuf},
    time::Duration,
};

use directories::UserDirs;
use image::{
    codecs::gif::{GifEncoder, Repeat},
    Delay, RgbaImage,
};
use serde::{Deserialize, Serialize};

use crate::{frames::Frame, Film3dError, Result};

/// Highest frame rate an animation can be encoded at.
pub const MAX_FRAMES_PER_SECOND: u32 = 30;

/// Output options for the animated image encoder.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingSettings {
    /// Directory the `.gif` files are written to.
    pub output_dir: PathBuf,
    pub frames_per_second: u32,
}

impl Default for RecordingSettings {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            frames_per_second: 20,
        }
    }
}

/// The user's documents folder, or the working directory when the platform
/// has none.
pub fn default_output_dir() -> PathBuf {
    UserDirs::new()
        .and_then(|dirs| dirs.document_dir().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Summary of a successfully written animation.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedAnimation {
    pub path: PathBuf,
    pub frame_count: usize,
    /// Frames that could not be converted and were left out.
    pub skipped: usize,
    pub frame_delay: Duration,
}

/// Writes an ordered frame sequence as a looping animated GIF.
///
/// The file is assembled under a temporary name and renamed into place only
/// once it has been fully written, so a failed encode never leaves a partial
/// `.gif` behind. GIF output carries no EXIF block, which keeps location
/// metadata out of the file.
#[derive(Debug, Clone)]
pub struct AnimatedImageEncoder {
    output_dir: PathBuf,
}

impl AnimatedImageEncoder {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn from_settings(settings: &RecordingSettings) -> Self {
        Self::new(settings.output_dir.clone())
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Path the animation for `filename` is written to.
    pub fn output_path(&self, filename: &str) -> PathBuf {
        let filename = filename.trim();
        let has_extension = Path::new(filename)
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("gif"));
        if has_extension {
            self.output_dir.join(filename)
        } else {
            self.output_dir.join(format!("{filename}.gif"))
        }
    }

    /// Encodes `frames` in order with a delay of `1 / frames_per_second`,
    /// rounded to the centisecond resolution of the GIF format.
    pub fn encode(
        &self,
        frames: &[Frame],
        filename: &str,
        frames_per_second: u32,
    ) -> Result<EncodedAnimation> {
        validate_request(frames, filename, frames_per_second)?;

        let path = self.output_path(filename);
        let mut staging = path.clone().into_os_string();
        staging.push(".tmp");
        let staging = PathBuf::from(staging);

        let file = File::create(&staging).map_err(|source| Film3dError::DestinationUnavailable {
            path: path.clone(),
            source,
        })?;

        let result = write_animation(file, frames, frames_per_second, &path)
            .and_then(|encoded| {
                fs::rename(&staging, &path)
                    .map_err(|err| Film3dError::finalize_failed(path.clone(), err.to_string()))?;
                Ok(encoded)
            });

        match result {
            Ok((frame_count, skipped)) => {
                let animation = EncodedAnimation {
                    path,
                    frame_count,
                    skipped,
                    frame_delay: frame_delay(frames_per_second),
                };
                tracing::info!(
                    path = %animation.path.display(),
                    frames = animation.frame_count,
                    skipped = animation.skipped,
                    delay = ?animation.frame_delay,
                    "animated image saved"
                );
                Ok(animation)
            }
            Err(err) => {
                let _ = fs::remove_file(&staging);
                Err(err)
            }
        }
    }
}

fn validate_request(frames: &[Frame], filename: &str, frames_per_second: u32) -> Result<()> {
    if frames.is_empty() {
        return Err(Film3dError::invalid_request("no frames to encode"));
    }
    let name = filename.trim();
    if name.is_empty() {
        return Err(Film3dError::invalid_request("output name is empty"));
    }
    if !is_plain_file_name(name) {
        return Err(Film3dError::invalid_request(format!(
            "output name `{name}` must not contain a path"
        )));
    }
    if frames_per_second == 0 || frames_per_second > MAX_FRAMES_PER_SECOND {
        return Err(Film3dError::invalid_request(format!(
            "frame rate must be within 1..={MAX_FRAMES_PER_SECOND}, got {frames_per_second}"
        )));
    }
    Ok(())
}

/// A single normal path component, so the file stays inside the output
/// directory on every platform.
fn is_plain_file_name(name: &str) -> bool {
    if name.contains(['/', '\\']) {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// Delay written per frame, in hundredths of a second.
/// Callers must reject a zero frame rate first.
fn frame_delay_centis(frames_per_second: u32) -> u32 {
    (100 + frames_per_second / 2) / frames_per_second
}

fn frame_delay(frames_per_second: u32) -> Duration {
    Duration::from_millis(u64::from(frame_delay_centis(frames_per_second)) * 10)
}

/// Encodes into memory, then writes the finished stream to `file`.
/// Returns the number of frames written and skipped.
fn write_animation(
    mut file: File,
    frames: &[Frame],
    frames_per_second: u32,
    path: &Path,
) -> Result<(usize, usize)> {
    let finalize_err = |reason: String| Film3dError::finalize_failed(path.to_path_buf(), reason);
    let delay = Delay::from_numer_denom_ms(frame_delay_centis(frames_per_second) * 10, 1);

    let mut buffer = Vec::new();
    let mut written = 0;
    let mut skipped = 0;
    {
        let mut encoder = GifEncoder::new(&mut buffer);
        encoder
            .set_repeat(Repeat::Infinite)
            .map_err(|err| finalize_err(err.to_string()))?;

        let mut canvas: Option<(u32, u32)> = None;
        for frame in frames {
            let Some(raster) = convert_frame(frame, canvas) else {
                skipped += 1;
                continue;
            };
            canvas.get_or_insert(raster.dimensions());
            encoder
                .encode_frame(image::Frame::from_parts(raster, 0, 0, delay))
                .map_err(|err| finalize_err(err.to_string()))?;
            written += 1;
        }
    }

    if written == 0 {
        return Err(finalize_err("none of the frames could be converted".to_owned()));
    }

    file.write_all(&buffer)
        .and_then(|()| file.sync_all())
        .map_err(|err| finalize_err(err.to_string()))?;
    Ok((written, skipped))
}

/// Converts a frame to RGBA, rejecting rasters the GIF stream cannot hold.
fn convert_frame(frame: &Frame, canvas: Option<(u32, u32)>) -> Option<RgbaImage> {
    let (width, height) = (frame.width(), frame.height());
    let max = u32::from(u16::MAX);
    let reason = if width == 0 || height == 0 {
        Some("empty raster")
    } else if width > max || height > max {
        Some("raster exceeds GIF dimensions")
    } else if canvas.is_some_and(|size| size != (width, height)) {
        Some("size differs from the first frame")
    } else {
        None
    };

    if let Some(reason) = reason {
        tracing::warn!(ordinal = frame.ordinal, width, height, reason, "skipping frame");
        return None;
    }
    Some(frame.image.to_rgba8())
}
