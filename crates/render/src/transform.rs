//! Pluggable GPU transform passes.
//!
//! Transforms run between ingestion and presentation, each consuming the
//! front ping-pong target and producing the back one. A transform that has
//! nothing to do reports [`TransformOutcome::Skipped`], which keeps the
//! pair unswapped and saves the GPU pass.

use std::sync::Arc;

use tracing::debug;

use hdrplay_common::{ColorSpace, DrawOp, GpuBackend, PassDesc, RenderError, ToneMapping};

use crate::target::RenderTexture;

/// Whether a transform modified the image.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TransformOutcome {
    /// The destination holds the transformed image; the pair swaps.
    Applied,
    /// No-op; the source remains the current image.
    Skipped,
}

/// One pass in the video transform chain.
///
/// Implementations are registered with the video output and invoked once
/// per frame, in registration order, on the render thread.
pub trait VideoTransform: Send {
    fn render_to_target(
        &mut self,
        backend: &dyn GpuBackend,
        source: &RenderTexture,
        dest: &mut RenderTexture,
    ) -> Result<TransformOutcome, RenderError>;

    /// Drop GPU resources (output stop). The transform itself survives and
    /// may lazily rebuild on the next frame.
    fn destroy(&mut self, _backend: &dyn GpuBackend) {}
}

fn run_pass(
    backend: &dyn GpuBackend,
    pass: &PassDesc,
    source: &RenderTexture,
    dest: &mut RenderTexture,
) -> Result<(), RenderError> {
    let Some(texture) = source.texture() else {
        return Err(RenderError::DrawFailed(
            "transform source not allocated".to_string(),
        ));
    };
    dest.inherit_metadata(source);
    backend.draw(&DrawOp::Pass { texture, pass }, &dest.destination())
}

/// Compresses HDR (PQ/HLG) content into the displayable range.
///
/// The source peak comes from the configured luminance source, falling back
/// to the configured nits when the metadata value is unknown; SDR input is
/// passed through untouched.
pub struct ToneMapTransform {
    config: ToneMapping,
    target_peak_nits: f32,
}

impl ToneMapTransform {
    pub fn new(config: ToneMapping, target_peak_nits: f32) -> Self {
        Self {
            config,
            target_peak_nits,
        }
    }

    /// Effective source peak for a given input target.
    fn source_peak_nits(&self, source: &RenderTexture) -> f32 {
        let nits = source.luminance(self.config.source);
        if nits > 0.0 {
            nits
        } else {
            self.config.fallback_nits
        }
    }
}

impl VideoTransform for ToneMapTransform {
    fn render_to_target(
        &mut self,
        backend: &dyn GpuBackend,
        source: &RenderTexture,
        dest: &mut RenderTexture,
    ) -> Result<TransformOutcome, RenderError> {
        if !source.color_space.is_hdr() {
            return Ok(TransformOutcome::Skipped);
        }
        let source_peak_nits = self.source_peak_nits(source);
        debug!(
            source_peak_nits,
            target_peak_nits = self.target_peak_nits,
            "tone map pass"
        );
        run_pass(
            backend,
            &PassDesc::ToneMap {
                source: source.color_space,
                source_peak_nits,
                target_peak_nits: self.target_peak_nits,
            },
            source,
            dest,
        )?;
        // The output is display-referred SDR.
        dest.color_space = ColorSpace::Sdr;
        dest.max_content_luminance = 0.0;
        dest.max_frame_average_luminance = 0.0;
        dest.max_mastering_luminance = 0.0;
        Ok(TransformOutcome::Applied)
    }
}

/// Applies a 3-D color lookup table. With no LUT loaded it reports a no-op,
/// so an idle LUT slot costs nothing.
#[derive(Default)]
pub struct LutTransform {
    lut: Option<(u32, Arc<[f32]>)>,
}

impl LutTransform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a LUT of `size`^3 RGB triples, or clear it with `None`.
    pub fn set_lut(&mut self, lut: Option<(u32, Arc<[f32]>)>) {
        self.lut = lut;
    }
}

impl VideoTransform for LutTransform {
    fn render_to_target(
        &mut self,
        backend: &dyn GpuBackend,
        source: &RenderTexture,
        dest: &mut RenderTexture,
    ) -> Result<TransformOutcome, RenderError> {
        let Some((size, data)) = &self.lut else {
            return Ok(TransformOutcome::Skipped);
        };
        run_pass(
            backend,
            &PassDesc::Lut3d {
                size: *size,
                data: Arc::clone(data),
            },
            source,
            dest,
        )?;
        Ok(TransformOutcome::Applied)
    }
}
