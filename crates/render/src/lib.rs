//! `hdrplay-render` — GPU render pipeline for decoded video.
//!
//! Converts whichever representation the decoder emits (planar buffer,
//! opaque external texture, or raw-YUV external texture) into a 2-D texture,
//! runs it through the registered transform chain over a ping-pong target
//! pair, and presents with the negotiated color space:
//!
//! - [`color`] — YUV->RGB matrix table keyed by (bit depth, range)
//! - [`hdr`] — HDR static metadata blob parsing
//! - [`target`] / [`pingpong`] — render target arena
//! - [`renderer`] — per-mode ingestion renderers
//! - [`transform`] — the [`VideoTransform`] contract and stock passes
//! - [`surface`] — output surface and color-space negotiation
//! - [`output`] — the [`GlVideoOutput`] orchestrator

pub mod color;
pub mod hdr;
pub mod output;
pub mod pingpong;
pub mod renderer;
pub mod surface;
pub mod target;
pub mod transform;

pub use color::yuv_to_rgb_matrix;
pub use hdr::HdrStaticMetadata;
pub use output::GlVideoOutput;
pub use pingpong::PingPongTargets;
pub use surface::OutputSurface;
pub use target::{RenderTexture, ScreenTarget};
pub use transform::{LutTransform, ToneMapTransform, TransformOutcome, VideoTransform};
