//! GPU backend abstraction.
//!
//! The render pipeline programs against [`GpuBackend`], never against a
//! concrete graphics API. A backend owns one context (created at output
//! prepare, destroyed at output stop), window surfaces, textures and
//! framebuffers, and executes typed [`DrawOp`]s; the shader source behind
//! each op is the backend's concern.

use std::sync::Arc;

use crate::color::{ColorMatrix, ColorSpace, Yuv420Layout};
use crate::error::RenderError;
use crate::types::{CropRect, Resolution};

/// Opaque 2-D texture handle.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TextureId(pub u64);

/// Opaque framebuffer handle.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct FramebufferId(pub u64);

/// Opaque external (decoder-written) texture handle.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ExternalTextureId(pub u64);

/// Opaque window surface handle.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct WindowSurfaceId(pub u64);

/// Platform presentation surface, as handed in by the embedder.
///
/// Identity (`id`) decides window-surface reuse: two handles with the same id
/// are the same underlying surface.
pub trait SurfaceHandle: Send + Sync {
    fn id(&self) -> u64;

    fn is_valid(&self) -> bool;

    /// Platform debug string. On older platforms the HDR capability of a
    /// surface is inferred from this description.
    fn description(&self) -> String;
}

/// GPU context configuration chosen at output prepare.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ContextConfig {
    /// Requested RGBA channel size in bits (8, 10, or 16).
    pub bit_depth: u32,
}

/// Color space tag requested for a window surface.
///
/// Only applied when both the surface and the display/driver support it;
/// otherwise presentation falls back to the default (untagged) color space.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SurfaceColorSpace {
    Bt2020Pq,
    Bt2020Hlg,
    Bt2020Linear,
}

impl SurfaceColorSpace {
    /// The surface tag matching a rendered color space, if it needs one.
    pub fn from_color_space(color_space: ColorSpace) -> Option<Self> {
        match color_space {
            ColorSpace::Bt2020Pq => Some(Self::Bt2020Pq),
            ColorSpace::Bt2020Hlg => Some(Self::Bt2020Hlg),
            ColorSpace::Bt2020Linear => Some(Self::Bt2020Linear),
            ColorSpace::Sdr => None,
        }
    }
}

/// A planar YUV 4:2:0 image in CPU memory, described for upload+convert.
#[derive(Clone, Debug)]
pub struct PlanarImage<'a> {
    pub data: &'a [u8],
    pub width: u32,
    pub height: u32,
    /// Row stride in bytes (10-bit samples are stored two bytes each).
    pub stride: u32,
    /// Plane height in rows.
    pub slice_height: u32,
    pub bit_depth: u32,
    pub crop: CropRect,
    pub layout: Yuv420Layout,
}

/// Parameters of a color/tone-mapping pass, dispatched by the backend.
#[derive(Clone, Debug)]
pub enum PassDesc {
    /// Compress HDR luminance into a displayable range.
    ToneMap {
        source: ColorSpace,
        source_peak_nits: f32,
        target_peak_nits: f32,
    },
    /// Map between gamuts (e.g. BT.2020 -> BT.709).
    GamutMap { from: ColorSpace, to: ColorSpace },
    /// Apply a 3-D lookup table (RGB triples, `size`^3 entries).
    Lut3d { size: u32, data: Arc<[f32]> },
    /// Apply a power-curve adjustment.
    Gamma { exponent: f32 },
}

/// One typed draw call.
#[derive(Clone, Debug)]
pub enum DrawOp<'a> {
    /// Sample an opaque external texture through its transform matrix
    /// (the matrix corrects orientation/cropping of the decoder image).
    External {
        texture: ExternalTextureId,
        transform: [f32; 16],
    },
    /// Sample an external texture as raw YUV (Y2Y extension) and convert
    /// with the given YUV->RGB matrix.
    ExternalYuv {
        texture: ExternalTextureId,
        transform: [f32; 16],
        matrix: &'a ColorMatrix,
    },
    /// Upload a planar buffer and convert with the given YUV->RGB matrix.
    Planar {
        image: PlanarImage<'a>,
        matrix: &'a ColorMatrix,
    },
    /// Blit a 2-D texture.
    Texture { texture: TextureId },
    /// Run a color/tone-mapping pass over a 2-D texture.
    Pass {
        texture: TextureId,
        pass: &'a PassDesc,
    },
}

/// Where a draw lands: an off-screen framebuffer, or the current window
/// surface backbuffer when `framebuffer` is `None`.
#[derive(Copy, Clone, Debug)]
pub struct RenderDestination {
    pub framebuffer: Option<FramebufferId>,
    pub viewport: Resolution,
}

/// GPU backend capability — implemented per graphics API, faked in tests.
pub trait GpuBackend: Send + Sync {
    // -- Context --

    /// Initialize the single GPU context. Fails if the requested channel
    /// depth has no matching config on this display.
    fn init_context(&self, config: &ContextConfig) -> Result<(), RenderError>;

    fn destroy_context(&self);

    // -- Window surfaces --

    fn create_window_surface(
        &self,
        surface: &dyn SurfaceHandle,
        color_space: Option<SurfaceColorSpace>,
    ) -> Result<WindowSurfaceId, RenderError>;

    fn destroy_window_surface(&self, surface: WindowSurfaceId);

    fn window_surface_size(&self, surface: WindowSurfaceId) -> Resolution;

    fn is_window_surface_valid(&self, surface: WindowSurfaceId) -> bool;

    fn make_current(&self, surface: WindowSurfaceId) -> Result<(), RenderError>;

    /// Queue the backbuffer for presentation at the given timestamp.
    fn present(&self, surface: WindowSurfaceId, pts_ns: i64) -> Result<(), RenderError>;

    // -- Resources --

    fn create_texture(
        &self,
        width: u32,
        height: u32,
        bit_depth: u32,
    ) -> Result<TextureId, RenderError>;

    fn destroy_texture(&self, texture: TextureId);

    fn create_framebuffer(&self, color: TextureId) -> Result<FramebufferId, RenderError>;

    fn destroy_framebuffer(&self, framebuffer: FramebufferId);

    fn create_external_texture(&self) -> Result<ExternalTextureId, RenderError>;

    fn destroy_external_texture(&self, texture: ExternalTextureId);

    /// Latch the most recent decoder image into the external texture and
    /// return its sampling transform matrix.
    fn acquire_external_image(
        &self,
        texture: ExternalTextureId,
    ) -> Result<[f32; 16], RenderError>;

    // -- Drawing --

    fn clear(&self, dest: &RenderDestination) -> Result<(), RenderError>;

    fn draw(&self, op: &DrawOp<'_>, dest: &RenderDestination) -> Result<(), RenderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surface_color_space_mapping() {
        assert_eq!(
            SurfaceColorSpace::from_color_space(ColorSpace::Bt2020Pq),
            Some(SurfaceColorSpace::Bt2020Pq)
        );
        assert_eq!(
            SurfaceColorSpace::from_color_space(ColorSpace::Bt2020Hlg),
            Some(SurfaceColorSpace::Bt2020Hlg)
        );
        assert_eq!(SurfaceColorSpace::from_color_space(ColorSpace::Sdr), None);
    }
}
