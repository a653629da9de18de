//! `hdrplay-common` — Shared types, traits, and errors for the HDR playback engine.
//!
//! This crate is the foundation every other engine crate depends on.
//! It defines the core abstractions:
//!
//! - **Types**: `MediaTime`, `Resolution`, `CropRect` (newtypes for safety)
//! - **Color**: `ColorStandard`, `ColorRange`, `ColorTransfer`, `ColorSpace`
//! - **Format**: `MediaSource`, `MediaFormat`, `CodecProfile`
//! - **GPU**: `GpuBackend`, `SurfaceHandle`, `DrawOp` (backend abstraction)
//! - **Display**: `DisplayCapabilities` (injectable capability snapshot)
//! - **Errors**: `PlayerError`, `ConfigError`, `DecodeError`, etc. (thiserror-based)
//! - **Config**: `TextureSource`, `HdrBitDepth`, `ToneMapping`

pub mod color;
pub mod config;
pub mod display;
pub mod error;
pub mod format;
pub mod gpu;
pub mod types;

// Re-export commonly used items at crate root
pub use color::{ColorMatrix, ColorRange, ColorSpace, ColorStandard, ColorTransfer, Yuv420Layout};
pub use config::{HdrBitDepth, LuminanceSource, TextureSource, ToneMapping};
pub use display::DisplayCapabilities;
pub use error::{ConfigError, DecodeError, PlayerError, PlayerResult, RenderError, SourceError};
pub use format::{CodecProfile, MediaFormat, MediaSource};
pub use gpu::{
    ContextConfig, DrawOp, ExternalTextureId, FramebufferId, GpuBackend, PassDesc, PlanarImage,
    RenderDestination, SurfaceColorSpace, SurfaceHandle, TextureId, WindowSurfaceId,
};
pub use types::{CropRect, MediaTime, Resolution};
