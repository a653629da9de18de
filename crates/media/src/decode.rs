//! Decoder capability trait and the typed event protocol.
//!
//! A hardware decoder runs asynchronously on its own thread(s). Instead of
//! re-entrant callbacks, it reports through a channel of [`DecoderEvent`]s
//! consumed by the player's single worker loop; events that need an answer
//! (input data, render decision) carry a rendezvous reply channel, which
//! also throttles the decoder to the consumer's pace.

use std::sync::Arc;

use crossbeam::channel::Sender;

use hdrplay_common::{DecodeError, ExternalTextureId, MediaFormat, MediaTime, Yuv420Layout};

use crate::extract::SampleInfo;

/// Where the decoder writes its output.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputMode {
    /// Planar YUV into CPU-visible buffers.
    Buffer,
    /// Into a GPU external texture.
    #[default]
    Texture,
}

/// One compressed sample handed to the decoder.
#[derive(Clone, Debug, Default)]
pub struct SampleChunk {
    pub data: Vec<u8>,
    pub info: SampleInfo,
}

/// A decoded frame, in whichever representation the output mode dictates.
#[derive(Clone, Debug)]
pub enum FramePayload {
    /// Raw planar YUV bytes (buffer mode). Geometry comes from the most
    /// recent format change.
    Planar(Arc<[u8]>),
    /// The frame has been latched into the decoder's external texture
    /// (texture mode); the renderer acquires it through the GPU backend.
    External,
}

/// Events produced by a running decoder, in decode order.
#[derive(Debug)]
pub enum DecoderEvent {
    /// An input buffer is free; the consumer replies with one sample.
    InputRequested { reply: Sender<SampleChunk> },
    /// A frame is decoded; the consumer replies whether to render it.
    OutputReady {
        pts: MediaTime,
        payload: FramePayload,
        reply: Sender<bool>,
    },
    /// The frame's buffer is being returned to the decoder. The consumer
    /// paces (sleeps out the presentation delay) before acknowledging.
    OutputReleased {
        pts: MediaTime,
        rendered: bool,
        done: Sender<()>,
    },
    /// The decoder's output geometry/color description changed.
    FormatChanged(MediaFormat),
    /// All input has been decoded and delivered.
    EndOfStream,
    /// Fatal decode failure; the session does not recover.
    Error(DecodeError),
}

/// Asynchronous video decoder capability.
///
/// Lifecycle mirrors a hardware codec: `configure` -> `start` ->
/// (`pause`/`resume`/`flush`)* -> `stop` -> possibly `configure` again ->
/// `release`. After `stop` the decoder must be reconfigured before restarting.
pub trait VideoDecoder: Send {
    /// Configure for the given input format. Events flow into `events`
    /// once started.
    fn configure(
        &mut self,
        format: &MediaFormat,
        events: Sender<DecoderEvent>,
    ) -> Result<(), DecodeError>;

    fn start(&mut self);

    fn pause(&mut self);

    fn resume(&mut self);

    fn stop(&mut self);

    /// Drop all queued input/output without stopping.
    fn flush(&mut self);

    fn release(&mut self);

    /// Select the output representation. Only meaningful before `configure`.
    fn set_output_mode(&mut self, mode: OutputMode);

    /// Texture-mode destination; `None` detaches.
    fn set_output_texture(&mut self, texture: Option<ExternalTextureId>);

    /// Whether the decoder can emit 10-bit planar buffers (P010-class).
    fn supports_10bit_planar_output(&self) -> bool;

    /// Whether a planar layout is supported in buffer mode.
    fn supports_color_format(&self, layout: Yuv420Layout) -> bool;
}
