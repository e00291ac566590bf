//! Error type shared by the library.

use thiserror::Error;

/// Errors surfaced by styling, layout, rendering and export.
///
/// Degenerate data (no primitives, zero data range) is never an error; the
/// heuristics fall back to documented defaults instead.
#[derive(Debug, Error)]
pub enum VizError {
    #[error("unknown cycle '{0}'; use 'default', 'clinical', or 'comparison'")]
    UnknownCycle(String),

    #[error("unknown legend position '{0}'")]
    UnknownPosition(String),

    #[error("unknown layout '{0}'")]
    UnknownLayout(String),

    #[error("unsupported format '{format}'; supported formats: {supported}")]
    UnsupportedFormat { format: String, supported: String },

    #[error("invalid hex color '{0}'")]
    InvalidColor(String),

    #[error("comparison index {index} out of range for {len} positions")]
    ComparisonIndex { index: usize, len: usize },

    #[error("before and after images must be identical size; got {before:?} and {after:?}")]
    ImageSizeMismatch {
        before: (u32, u32),
        after: (u32, u32),
    },

    #[error("no usable font found; set PRS_VIZ_FONT or StyleConfig::custom_font_paths")]
    FontUnavailable,

    #[error("drawing failed: {0}")]
    Drawing(String),

    #[error("image encoding failed: {0}")]
    Encode(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("invalid style config: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, VizError>;

/// Map a plotters drawing error into [`VizError::Drawing`].
pub(crate) fn drawing<E: std::fmt::Debug>(e: E) -> VizError {
    VizError::Drawing(format!("{e:?}"))
}
