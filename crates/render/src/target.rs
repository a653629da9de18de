//! Render targets: off-screen texture targets and the on-screen target.

use tracing::debug;

use hdrplay_common::{
    ColorSpace, FramebufferId, GpuBackend, LuminanceSource, RenderDestination, RenderError,
    Resolution, TextureId,
};

/// An off-screen render target: one texture and the framebuffer wrapping it,
/// plus the color metadata of the image it currently holds.
///
/// GPU resources are destroyed and recreated exactly when the
/// `(width, height, bit depth)` tuple changes.
#[derive(Debug, Default)]
pub struct RenderTexture {
    texture: Option<TextureId>,
    framebuffer: Option<FramebufferId>,
    size: Resolution,
    bit_depth: u32,

    pub color_space: ColorSpace,
    pub max_content_luminance: f32,
    pub max_frame_average_luminance: f32,
    pub max_mastering_luminance: f32,
}

impl RenderTexture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the target's GPU resources match `(size, bit_depth)`,
    /// reallocating only on change.
    pub fn ensure(
        &mut self,
        backend: &dyn GpuBackend,
        size: Resolution,
        bit_depth: u32,
    ) -> Result<(), RenderError> {
        if self.texture.is_some() && self.size == size && self.bit_depth == bit_depth {
            return Ok(());
        }
        self.destroy(backend);
        debug!(%size, bit_depth, "allocating render target");
        let texture = backend.create_texture(size.width, size.height, bit_depth)?;
        let framebuffer = match backend.create_framebuffer(texture) {
            Ok(framebuffer) => framebuffer,
            Err(err) => {
                backend.destroy_texture(texture);
                return Err(err);
            }
        };
        self.texture = Some(texture);
        self.framebuffer = Some(framebuffer);
        self.size = size;
        self.bit_depth = bit_depth;
        Ok(())
    }

    pub fn texture(&self) -> Option<TextureId> {
        self.texture
    }

    pub fn size(&self) -> Resolution {
        self.size
    }

    pub fn bit_depth(&self) -> u32 {
        self.bit_depth
    }

    /// Draw destination for this target. Only valid after `ensure`.
    pub fn destination(&self) -> RenderDestination {
        RenderDestination {
            framebuffer: self.framebuffer,
            viewport: self.size,
        }
    }

    /// The luminance value (nits) selected by a [`LuminanceSource`];
    /// 0 = unknown.
    pub fn luminance(&self, source: LuminanceSource) -> f32 {
        match source {
            LuminanceSource::MaxContent => self.max_content_luminance,
            LuminanceSource::MaxFrameAverage => self.max_frame_average_luminance,
            LuminanceSource::MaxMastering => self.max_mastering_luminance,
        }
    }

    /// Copy color metadata from another target (transform output carries its
    /// input's description unless the transform rewrites it).
    pub fn inherit_metadata(&mut self, source: &RenderTexture) {
        self.color_space = source.color_space;
        self.max_content_luminance = source.max_content_luminance;
        self.max_frame_average_luminance = source.max_frame_average_luminance;
        self.max_mastering_luminance = source.max_mastering_luminance;
    }

    pub fn destroy(&mut self, backend: &dyn GpuBackend) {
        if let Some(framebuffer) = self.framebuffer.take() {
            backend.destroy_framebuffer(framebuffer);
        }
        if let Some(texture) = self.texture.take() {
            backend.destroy_texture(texture);
        }
        self.size = Resolution::default();
        self.bit_depth = 0;
    }
}

/// The on-screen target: the current window surface's backbuffer.
#[derive(Debug, Default)]
pub struct ScreenTarget {
    size: Resolution,
}

impl ScreenTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_render_size(&mut self, size: Resolution) {
        self.size = size;
    }

    pub fn destination(&self) -> RenderDestination {
        RenderDestination {
            framebuffer: None,
            viewport: self.size,
        }
    }
}
