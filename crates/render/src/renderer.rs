//! Ingestion renderers: one per source representation.
//!
//! Each renderer owns the per-mode sampling state and emits a single typed
//! draw op; the backend supplies the shader behind it.

use std::sync::Arc;

use hdrplay_common::{
    ColorMatrix, ColorRange, CropRect, DrawOp, ExternalTextureId, GpuBackend, PlanarImage,
    RenderDestination, RenderError, Resolution, TextureId, Yuv420Layout,
};

use crate::color::yuv_to_rgb_matrix;

const IDENTITY_MATRIX: [f32; 16] = ColorMatrix::IDENTITY.0;

/// Samples the decoder's opaque external texture. The transform matrix from
/// the latched image corrects orientation/crop sampling artifacts.
#[derive(Debug, Default)]
pub struct ExternalTextureRenderer {
    texture: Option<ExternalTextureId>,
    transform: Option<[f32; 16]>,
}

impl ExternalTextureRenderer {
    pub fn set_texture(&mut self, texture: ExternalTextureId) {
        self.texture = Some(texture);
    }

    pub fn set_transform(&mut self, transform: [f32; 16]) {
        self.transform = Some(transform);
    }

    pub fn draw(
        &self,
        backend: &dyn GpuBackend,
        dest: &RenderDestination,
    ) -> Result<(), RenderError> {
        let Some(texture) = self.texture else {
            return Err(RenderError::DrawFailed("no external texture".to_string()));
        };
        backend.draw(
            &DrawOp::External {
                texture,
                transform: self.transform.unwrap_or(IDENTITY_MATRIX),
            },
            dest,
        )
    }
}

/// Samples the external texture as raw YUV (Y2Y extension) and converts with
/// the matrix matching the stream's bit depth and range, skipping the
/// driver's opaque intermediate conversion.
#[derive(Debug)]
pub struct Y2yTextureRenderer {
    texture: Option<ExternalTextureId>,
    transform: Option<[f32; 16]>,
    bit_depth: u32,
    color_range: ColorRange,
}

impl Default for Y2yTextureRenderer {
    fn default() -> Self {
        Self {
            texture: None,
            transform: None,
            bit_depth: 8,
            color_range: ColorRange::Limited,
        }
    }
}

impl Y2yTextureRenderer {
    pub fn set_texture(&mut self, texture: ExternalTextureId) {
        self.texture = Some(texture);
    }

    pub fn set_transform(&mut self, transform: [f32; 16]) {
        self.transform = Some(transform);
    }

    pub fn set_bit_depth(&mut self, bit_depth: u32) {
        self.bit_depth = bit_depth;
    }

    pub fn set_color_range(&mut self, color_range: ColorRange) {
        self.color_range = color_range;
    }

    pub fn draw(
        &self,
        backend: &dyn GpuBackend,
        dest: &RenderDestination,
    ) -> Result<(), RenderError> {
        let Some(texture) = self.texture else {
            return Err(RenderError::DrawFailed("no external texture".to_string()));
        };
        let matrix = yuv_to_rgb_matrix(self.bit_depth, self.color_range)?;
        backend.draw(
            &DrawOp::ExternalYuv {
                texture,
                transform: self.transform.unwrap_or(IDENTITY_MATRIX),
                matrix,
            },
            dest,
        )
    }
}

/// Geometry of the decoder's planar output, captured at format change.
#[derive(Copy, Clone, Debug)]
pub struct PlanarFormat {
    pub coded: Resolution,
    pub stride: u32,
    pub slice_height: u32,
    pub bit_depth: u32,
    pub crop: CropRect,
    pub layout: Yuv420Layout,
    pub color_range: ColorRange,
}

/// Uploads and converts the decoder's planar YUV buffer into a 2-D texture.
///
/// The conversion samples quantized texels directly, so its destination must
/// match the video size exactly; resampling happens in later passes.
#[derive(Debug, Default)]
pub struct PlanarRenderer {
    format: Option<PlanarFormat>,
    data: Option<Arc<[u8]>>,
}

impl PlanarRenderer {
    pub fn set_buffer_format(&mut self, format: PlanarFormat) {
        self.format = Some(format);
    }

    pub fn update_buffer(&mut self, data: Arc<[u8]>) {
        self.data = Some(data);
    }

    pub fn draw(
        &self,
        backend: &dyn GpuBackend,
        dest: &RenderDestination,
    ) -> Result<(), RenderError> {
        let Some(format) = self.format else {
            return Err(RenderError::DrawFailed("no planar format".to_string()));
        };
        let Some(data) = &self.data else {
            return Err(RenderError::DrawFailed("no planar buffer".to_string()));
        };
        let matrix = yuv_to_rgb_matrix(format.bit_depth, format.color_range)?;
        backend.draw(
            &DrawOp::Planar {
                image: PlanarImage {
                    data: data.as_ref(),
                    width: format.coded.width,
                    height: format.coded.height,
                    stride: format.stride,
                    slice_height: format.slice_height,
                    bit_depth: format.bit_depth,
                    crop: format.crop,
                    layout: format.layout,
                },
                matrix,
            },
            dest,
        )
    }
}

/// Blits a plain 2-D texture (chain intermediate or final image).
#[derive(Debug, Default)]
pub struct Texture2dRenderer {
    texture: Option<TextureId>,
}

impl Texture2dRenderer {
    pub fn set_texture(&mut self, texture: TextureId) {
        self.texture = Some(texture);
    }

    pub fn draw(
        &self,
        backend: &dyn GpuBackend,
        dest: &RenderDestination,
    ) -> Result<(), RenderError> {
        let Some(texture) = self.texture else {
            return Err(RenderError::DrawFailed("no source texture".to_string()));
        };
        backend.draw(&DrawOp::Texture { texture }, dest)
    }
}
