use std::path::PathBuf;

/// Result alias that carries the custom [`Film3dError`] type.
pub type Result<T> = std::result::Result<T, Film3dError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum Film3dError {
    /// The rotation sequence was configured with a non-positive (or NaN)
    /// step, which would never complete a revolution.
    #[error("rotation step must be positive, got {0}")]
    InvalidStepSize(f32),
    /// The capture clock was configured with a zero period.
    #[error("tick interval must be non-zero")]
    InvalidTickInterval,
    /// An encode was requested without frames, without a filename, or with a
    /// frame rate outside `1..=30`.
    #[error("invalid encode request: {0}")]
    InvalidEncodeRequest(String),
    /// The output file could not be created.
    #[error("cannot open output `{}`: {source}", path.display())]
    DestinationUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Frames were accepted but the animation could not be written out.
    #[error("failed to finalize `{}`: {reason}", path.display())]
    EncodeFinalizeFailed { path: PathBuf, reason: String },
    /// A single snapshot could not be produced. Never fatal for a capture.
    #[error("snapshot at angle {angle:.3} failed: {reason}")]
    RendererSnapshotFailure { angle: f32, reason: String },
    /// Configuration file could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
    /// Free-form message for conditions without a dedicated variant.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl Film3dError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    pub fn invalid_request<T: Into<String>>(reason: T) -> Self {
        Self::InvalidEncodeRequest(reason.into())
    }

    pub fn snapshot_failed<T: Into<String>>(angle: f32, reason: T) -> Self {
        Self::RendererSnapshotFailure {
            angle,
            reason: reason.into(),
        }
    }

    pub(crate) fn finalize_failed<T: Into<String>>(path: PathBuf, reason: T) -> Self {
        Self::EncodeFinalizeFailed {
            path,
            reason: reason.into(),
        }
    }
}
