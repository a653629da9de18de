//! Central error types for the engine (thiserror-based).

use thiserror::Error;

use crate::color::ColorRange;

/// Top-level player error. Everything surfaced through the error callback
/// or returned from caller-facing APIs is one of these.
#[derive(Error, Debug)]
pub enum PlayerError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("source error: {0}")]
    Source(#[from] SourceError),

    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("render error: {0}")]
    Render(#[from] RenderError),
}

/// Invalid caller configuration, reported synchronously on the calling thread.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{operation} must be called before prepare")]
    AfterPrepare { operation: &'static str },

    #[error("player is released")]
    Released,
}

/// Unreadable or unsupported source — fatal to the prepare operation.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("no source set")]
    NoSource,

    #[error("source is not playable: {path}")]
    Unplayable { path: String },

    #[error("unsupported mime type: {mime}")]
    UnsupportedMime { mime: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Decoder failures — fatal to the current playback session.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("decoder configuration failed: {reason}")]
    Configure { reason: String },

    #[error("decode failed at {pts_us}us: {reason}")]
    Frame { pts_us: i64, reason: String },

    #[error("decoder session released or invalid")]
    InvalidSession,
}

/// GPU pipeline errors.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("unsupported format: {bit_depth}-bit {range:?} range")]
    UnsupportedFormat { bit_depth: u32, range: ColorRange },

    #[error("GPU context initialization failed: {0}")]
    ContextInit(String),

    #[error("GPU allocation failed: {what}")]
    AllocFailed { what: &'static str },

    #[error("window surface creation failed: {0}")]
    SurfaceCreate(String),

    #[error("draw call failed: {0}")]
    DrawFailed(String),
}

/// Convenience Result type for player operations.
pub type PlayerResult<T> = Result<T, PlayerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_wraps_into_player_error() {
        let err: PlayerError = ConfigError::AfterPrepare {
            operation: "set_texture_source",
        }
        .into();
        assert!(matches!(err, PlayerError::Config(_)));
        assert!(err.to_string().contains("before prepare"));
    }

    #[test]
    fn unsupported_format_message() {
        let err = RenderError::UnsupportedFormat {
            bit_depth: 12,
            range: ColorRange::Full,
        };
        assert!(err.to_string().contains("unsupported format"));
        assert!(err.to_string().contains("12"));
    }
}
