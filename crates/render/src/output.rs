//! GPU video output: mode selection, format bookkeeping, the per-frame
//! ping-pong render, and presentation.
//!
//! `GlVideoOutput` is a cloneable handle over one shared state behind a
//! single lock; the embedder configures it (surface, transforms, texture
//! source, bit depth) while the player's worker drives the frame protocol.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use hdrplay_common::{
    ColorSpace, ConfigError, ContextConfig, CropRect, DisplayCapabilities, ExternalTextureId,
    GpuBackend, HdrBitDepth, MediaFormat, MediaTime, PlayerError, RenderError, Resolution,
    SurfaceHandle, TextureSource,
};
use hdrplay_media::{FramePayload, OutputMode, VideoDecoder};
use hdrplay_player::VideoOutput;

use crate::hdr::HdrStaticMetadata;
use crate::pingpong::PingPongTargets;
use crate::renderer::{
    ExternalTextureRenderer, PlanarFormat, PlanarRenderer, Texture2dRenderer, Y2yTextureRenderer,
};
use crate::surface::OutputSurface;
use crate::target::{RenderTexture, ScreenTarget};
use crate::transform::{TransformOutcome, VideoTransform};

#[derive(Default)]
struct OutputState {
    prepared: bool,
    texture_source: TextureSource,
    hdr_bit_depth: HdrBitDepth,

    buffer_mode: bool,
    y2y_mode: bool,
    profile_10bit: bool,

    video_size: Resolution,
    color_space: ColorSpace,
    metadata: HdrStaticMetadata,

    external_texture: Option<ExternalTextureId>,
    external_renderer: ExternalTextureRenderer,
    y2y_renderer: Y2yTextureRenderer,
    planar_renderer: PlanarRenderer,
    texture2d_renderer: Texture2dRenderer,

    /// Buffer-mode intermediate: planar conversion lands here, then flows on
    /// as an ordinary 2-D texture.
    planar_target: RenderTexture,
    ping_pong: PingPongTargets,
    screen: ScreenTarget,
    transforms: Vec<Box<dyn VideoTransform>>,
    surface: OutputSurface,
}

impl OutputState {
    /// Bit depth for chain targets and the GPU context: the configured HDR
    /// depth for 10-bit streams, plain 8-bit otherwise.
    fn target_bit_depth(&self) -> u32 {
        if self.profile_10bit {
            self.hdr_bit_depth.bits()
        } else {
            8
        }
    }
}

struct OutputInner {
    backend: Arc<dyn GpuBackend>,
    display: DisplayCapabilities,
    state: Mutex<OutputState>,
}

/// GPU-backed [`VideoOutput`] implementation.
#[derive(Clone)]
pub struct GlVideoOutput {
    inner: Arc<OutputInner>,
}

impl GlVideoOutput {
    pub fn new(backend: Arc<dyn GpuBackend>, display: DisplayCapabilities) -> Self {
        Self {
            inner: Arc::new(OutputInner {
                backend,
                display,
                state: Mutex::new(OutputState::default()),
            }),
        }
    }

    /// Attach (or detach) the presentation surface. Takes effect on the next
    /// render call.
    pub fn set_output_surface(&self, handle: Option<Arc<dyn SurfaceHandle>>) {
        let mut state = self.inner.state.lock();
        state.surface.set_surface(self.inner.backend.as_ref(), handle);
    }

    /// Append a transform to the chain. Transforms run in registration order.
    pub fn add_video_transform(&self, transform: Box<dyn VideoTransform>) {
        self.inner.state.lock().transforms.push(transform);
    }

    /// Select the ingestion mode. Must be called before prepare.
    pub fn set_texture_source(&self, source: TextureSource) -> Result<(), ConfigError> {
        let mut state = self.inner.state.lock();
        if state.prepared {
            return Err(ConfigError::AfterPrepare {
                operation: "set_texture_source",
            });
        }
        state.texture_source = source;
        Ok(())
    }

    pub fn texture_source(&self) -> TextureSource {
        self.inner.state.lock().texture_source
    }

    /// Select the HDR presentation bit depth. Must be called before prepare.
    pub fn set_hdr_bit_depth(&self, bit_depth: HdrBitDepth) -> Result<(), ConfigError> {
        let mut state = self.inner.state.lock();
        if state.prepared {
            return Err(ConfigError::AfterPrepare {
                operation: "set_hdr_bit_depth",
            });
        }
        state.hdr_bit_depth = bit_depth;
        Ok(())
    }

    pub fn hdr_bit_depth(&self) -> HdrBitDepth {
        self.inner.state.lock().hdr_bit_depth
    }

    fn render_frame(&self, pts: MediaTime) -> Result<bool, RenderError> {
        let inner = &*self.inner;
        let backend = inner.backend.as_ref();
        let mut state = inner.state.lock();

        if !state.surface.is_valid() {
            return Ok(false);
        }
        let video_size = state.video_size;
        if video_size.is_empty() {
            return Ok(false);
        }

        // Texture mode: latch the newest decoder image and pick up its
        // sampling matrix before anything is drawn.
        if !state.buffer_mode {
            if let Some(texture) = state.external_texture {
                let transform = backend.acquire_external_image(texture)?;
                state.external_renderer.set_transform(transform);
                state.y2y_renderer.set_transform(transform);
            }
        }

        let target_bits = state.target_bit_depth();
        let use_chain = !state.transforms.is_empty();

        if state.buffer_mode {
            // The planar pass fetches quantized texels and cannot resample;
            // its target must match the video size exactly. The result is an
            // ordinary 2-D texture that later stages may resample freely.
            let OutputState {
                planar_target,
                planar_renderer,
                texture2d_renderer,
                ..
            } = &mut *state;
            planar_target.ensure(backend, video_size, target_bits)?;
            planar_renderer.draw(backend, &planar_target.destination())?;
            let texture = planar_target.texture().expect("planar target allocated");
            texture2d_renderer.set_texture(texture);
        }

        let final_color_space = if use_chain {
            state.ping_pong.ensure(backend, video_size, target_bits)?;

            // Describe the chain input for the transforms.
            let metadata = state.metadata;
            let color_space = state.color_space;
            {
                let front = state.ping_pong.front_mut();
                front.color_space = color_space;
                front.max_content_luminance = metadata.max_content_luminance as f32;
                front.max_frame_average_luminance =
                    metadata.max_frame_average_luminance as f32;
                front.max_mastering_luminance = metadata.max_mastering_luminance as f32;
            }

            {
                let OutputState {
                    ping_pong,
                    buffer_mode,
                    y2y_mode,
                    texture2d_renderer,
                    y2y_renderer,
                    external_renderer,
                    ..
                } = &mut *state;
                let dest = ping_pong.front().destination();
                if *buffer_mode {
                    texture2d_renderer.draw(backend, &dest)?;
                } else if *y2y_mode {
                    y2y_renderer.draw(backend, &dest)?;
                } else {
                    external_renderer.draw(backend, &dest)?;
                }
            }

            {
                let OutputState {
                    ping_pong,
                    transforms,
                    ..
                } = &mut *state;
                for transform in transforms.iter_mut() {
                    let (front, back) = ping_pong.pair_mut();
                    match transform.render_to_target(backend, front, back)? {
                        TransformOutcome::Applied => ping_pong.swap(),
                        TransformOutcome::Skipped => {}
                    }
                }
            }

            let front = state.ping_pong.front();
            let final_color_space = front.color_space;
            let texture = front.texture().expect("front target allocated");
            state.texture2d_renderer.set_texture(texture);
            final_color_space
        } else {
            state.color_space
        };

        // Resolve the window surface for the final color space; no surface
        // is a soft skip, the caller simply presents nothing this frame.
        let window = {
            let OutputState { surface, .. } = &mut *state;
            match surface.window_surface(backend, &inner.display, final_color_space)? {
                Some(window) => window,
                None => return Ok(false),
            }
        };

        backend.make_current(window)?;
        state.screen.set_render_size(backend.window_surface_size(window));
        let dest = state.screen.destination();
        backend.clear(&dest)?;
        if use_chain || state.buffer_mode {
            state.texture2d_renderer.draw(backend, &dest)?;
        } else if state.y2y_mode {
            state.y2y_renderer.draw(backend, &dest)?;
        } else {
            state.external_renderer.draw(backend, &dest)?;
        }
        backend.present(window, pts.as_nanos())?;
        Ok(true)
    }

    fn teardown(&self, state: &mut OutputState) {
        let backend = self.inner.backend.as_ref();
        state.planar_target.destroy(backend);
        state.ping_pong.destroy(backend);
        for transform in &mut state.transforms {
            transform.destroy(backend);
        }
        if let Some(texture) = state.external_texture.take() {
            backend.destroy_external_texture(texture);
        }
        state.external_renderer = ExternalTextureRenderer::default();
        state.y2y_renderer = Y2yTextureRenderer::default();
        state.planar_renderer = PlanarRenderer::default();
        state.texture2d_renderer = Texture2dRenderer::default();
        state.surface.release(backend);
        backend.destroy_context();
        state.prepared = false;
        state.buffer_mode = false;
        state.y2y_mode = false;
    }
}

impl VideoOutput for GlVideoOutput {
    fn on_decoder_prepare(
        &mut self,
        decoder: &mut dyn VideoDecoder,
        format: &MediaFormat,
    ) -> Result<(), PlayerError> {
        let inner = &*self.inner;
        let backend = inner.backend.as_ref();
        let mut state = inner.state.lock();

        state.profile_10bit = format.is_10bit_profile();

        // 10-bit streams get the configured presentation depth; if the
        // display has no matching config, fall back to 8-bit rather than
        // failing prepare.
        let requested_bits = state.target_bit_depth();
        if let Err(err) = backend.init_context(&ContextConfig {
            bit_depth: requested_bits,
        }) {
            if requested_bits == 8 {
                return Err(err.into());
            }
            warn!(requested_bits, error = %err, "falling back to 8-bit context");
            backend.init_context(&ContextConfig { bit_depth: 8 })?;
        }

        state.buffer_mode = match state.texture_source {
            TextureSource::Auto => {
                state.profile_10bit && decoder.supports_10bit_planar_output()
            }
            TextureSource::Buffer => true,
            TextureSource::External | TextureSource::Y2y => false,
        };

        if state.buffer_mode {
            decoder.set_output_texture(None);
            decoder.set_output_mode(OutputMode::Buffer);
        } else {
            decoder.set_output_mode(OutputMode::Texture);
            let texture = backend.create_external_texture()?;
            state.external_texture = Some(texture);
            decoder.set_output_texture(Some(texture));
            state.external_renderer.set_texture(texture);
            state.y2y_renderer.set_texture(texture);
        }

        state.video_size = format.resolution();
        state.prepared = true;
        info!(
            buffer_mode = state.buffer_mode,
            profile_10bit = state.profile_10bit,
            bit_depth = state.target_bit_depth(),
            "video output prepared"
        );
        Ok(())
    }

    fn on_format_changed(&mut self, format: &MediaFormat) {
        let mut state = self.inner.state.lock();

        state.color_space = ColorSpace::from_format(format.color_standard, format.color_transfer);
        state.metadata = format
            .hdr_static_info
            .as_deref()
            .and_then(HdrStaticMetadata::parse)
            .unwrap_or_default();
        state.video_size = format.display_size();

        if state.buffer_mode {
            let coded = format.resolution();
            state.planar_renderer.set_buffer_format(PlanarFormat {
                coded,
                stride: format.stride.unwrap_or(coded.width),
                slice_height: format.slice_height.unwrap_or(coded.height),
                bit_depth: format.planar_bit_depth(),
                crop: format.crop.unwrap_or_else(|| CropRect::full(coded)),
                layout: format.yuv_layout.unwrap_or_default(),
                color_range: format.color_range,
            });
        } else {
            // Y2Y pays off only for HDR content, and only when the driver
            // advertises the extension.
            state.y2y_mode = match state.texture_source {
                TextureSource::Auto => {
                    state.color_space.is_hdr() && self.inner.display.supports_y2y_sampling
                }
                TextureSource::Y2y => true,
                TextureSource::External | TextureSource::Buffer => false,
            };
            if state.y2y_mode {
                let bit_depth = if state.profile_10bit { 10 } else { 8 };
                state.y2y_renderer.set_bit_depth(bit_depth);
                state.y2y_renderer.set_color_range(format.color_range);
            }
        }
        debug!(
            color_space = ?state.color_space,
            y2y = state.y2y_mode,
            size = %state.video_size,
            "output format changed"
        );
    }

    fn on_buffer_available(&mut self, payload: &FramePayload, _pts: MediaTime) {
        if let FramePayload::Planar(data) = payload {
            let mut state = self.inner.state.lock();
            if state.buffer_mode {
                state.planar_renderer.update_buffer(Arc::clone(data));
            }
        }
    }

    fn on_buffer_render(&mut self, pts: MediaTime) -> bool {
        match self.render_frame(pts) {
            Ok(rendered) => rendered,
            Err(err) => {
                warn!(error = %err, "frame render failed");
                false
            }
        }
    }

    fn on_buffer_release(&mut self, _pts: MediaTime, _rendered: bool) {}

    fn on_output_stop(&mut self) {
        let mut state = self.inner.state.lock();
        if state.prepared {
            self.teardown(&mut state);
        }
    }

    fn release(&mut self) {
        let mut state = self.inner.state.lock();
        if state.prepared {
            self.teardown(&mut state);
        } else {
            state.surface.release(self.inner.backend.as_ref());
        }
        state.transforms.clear();
    }
}
