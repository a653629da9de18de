//! Software implementations of the extractor and decoder capabilities.
//!
//! These produce deterministic buffers and timestamps with no hardware or
//! container involved, so the playback state machine and the render pipeline
//! can run headless (and under test) against the exact same protocol a
//! hardware codec drives.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use crossbeam::channel::{bounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::{Condvar, Mutex};
use tracing::{debug, warn};

use hdrplay_common::{
    CodecProfile, ColorRange, ColorStandard, ColorTransfer, CropRect, DecodeError,
    ExternalTextureId, MediaFormat, MediaSource, MediaTime, SourceError, Yuv420Layout,
};

use crate::decode::{DecoderEvent, FramePayload, OutputMode, SampleChunk, VideoDecoder};
use crate::extract::{MediaExtractor, SampleInfo};

/// Description of the synthetic stream a [`SoftwareExtractor`] produces.
#[derive(Clone, Debug)]
pub struct StreamConfig {
    pub mime: String,
    pub width: u32,
    pub height: u32,
    pub frame_count: u32,
    pub fps: u32,
    /// Every n-th frame is a sync sample.
    pub keyframe_interval: u32,
    pub profile: CodecProfile,
    pub level: u32,
    pub color_standard: ColorStandard,
    pub color_range: ColorRange,
    pub color_transfer: ColorTransfer,
    /// When false, probing fails (exercises the unplayable-source path).
    pub playable: bool,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            mime: "video/hevc".to_string(),
            width: 320,
            height: 180,
            frame_count: 30,
            fps: 30,
            keyframe_interval: 10,
            profile: CodecProfile::Main,
            level: 120,
            color_standard: ColorStandard::Bt709,
            color_range: ColorRange::Limited,
            color_transfer: ColorTransfer::SdrVideo,
            playable: true,
        }
    }
}

impl StreamConfig {
    /// A 10-bit BT.2020 PQ stream (HDR10-shaped).
    pub fn hdr10() -> Self {
        Self {
            profile: CodecProfile::Main10Hdr10,
            color_standard: ColorStandard::Bt2020,
            color_transfer: ColorTransfer::St2084,
            ..Self::default()
        }
    }

    fn pts_of(&self, index: u32) -> MediaTime {
        MediaTime::from_micros(index as i64 * 1_000_000 / self.fps as i64)
    }
}

/// Deterministic pull-based sample source.
///
/// Each sample payload is `[index: u32 LE][pts_us: i64 LE]`, so downstream
/// stages can verify exactly which frame they received.
pub struct SoftwareExtractor {
    config: StreamConfig,
    position: u32,
    source_set: bool,
    released: bool,
}

impl SoftwareExtractor {
    pub fn new(config: StreamConfig) -> Self {
        Self {
            config,
            position: 0,
            source_set: false,
            released: false,
        }
    }

    fn at_end(&self) -> bool {
        self.position >= self.config.frame_count
    }
}

/// Decode the `[index][pts_us]` payload written by [`SoftwareExtractor`].
pub fn decode_sample_payload(data: &[u8]) -> Option<(u32, i64)> {
    let mut cursor = std::io::Cursor::new(data);
    let index = cursor.read_u32::<LittleEndian>().ok()?;
    let pts = cursor.read_i64::<LittleEndian>().ok()?;
    Some((index, pts))
}

impl MediaExtractor for SoftwareExtractor {
    fn set_source(&mut self, source: &MediaSource) -> Result<(), SourceError> {
        if !self.config.playable {
            return Err(SourceError::Unplayable {
                path: source.path().display().to_string(),
            });
        }
        self.source_set = true;
        self.position = 0;
        Ok(())
    }

    fn is_available(&self) -> bool {
        self.source_set && !self.released && self.config.playable
    }

    fn mime_type(&self) -> String {
        self.config.mime.clone()
    }

    fn profile(&self) -> CodecProfile {
        self.config.profile
    }

    fn profile_level(&self) -> u32 {
        self.config.level
    }

    fn max_input_size(&self) -> usize {
        64
    }

    fn csd0(&self) -> Option<Vec<u8>> {
        // Stand-in parameter sets; content is irrelevant to the engine.
        Some(vec![0x00, 0x00, 0x00, 0x01, 0x40])
    }

    fn csd1(&self) -> Option<Vec<u8>> {
        None
    }

    fn width(&self) -> u32 {
        self.config.width
    }

    fn height(&self) -> u32 {
        self.config.height
    }

    fn color_standard(&self) -> ColorStandard {
        self.config.color_standard
    }

    fn color_range(&self) -> ColorRange {
        self.config.color_range
    }

    fn color_transfer(&self) -> ColorTransfer {
        self.config.color_transfer
    }

    fn read_sample(&mut self, buf: &mut Vec<u8>) -> SampleInfo {
        buf.clear();
        if self.released || !self.source_set || self.at_end() {
            return SampleInfo {
                size: 0,
                pts: MediaTime::ZERO,
                is_keyframe: false,
                end_of_stream: true,
            };
        }
        let index = self.position;
        let pts = self.config.pts_of(index);
        buf.write_u32::<LittleEndian>(index).expect("vec write");
        buf.write_i64::<LittleEndian>(pts.as_micros())
            .expect("vec write");
        SampleInfo {
            size: buf.len(),
            pts,
            is_keyframe: index % self.config.keyframe_interval == 0,
            end_of_stream: false,
        }
    }

    fn advance(&mut self) -> bool {
        if !self.at_end() {
            self.position += 1;
        }
        !self.at_end()
    }

    fn seek_pre_sync(&mut self, target: MediaTime) {
        let target_us = target.as_micros().max(0);
        let mut index =
            (target_us * self.config.fps as i64 / 1_000_000) as u32;
        if self.config.frame_count > 0 {
            index = index.min(self.config.frame_count - 1);
        }
        index -= index % self.config.keyframe_interval.max(1);
        debug!(target = %target, index, "software extractor seek");
        self.position = index;
    }

    fn release(&mut self) {
        self.released = true;
    }
}

struct Gate {
    paused: bool,
    stopping: bool,
    flush_epoch: u64,
}

struct Shared {
    gate: Mutex<Gate>,
    cond: Condvar,
}

impl Shared {
    fn stopping(&self) -> bool {
        self.gate.lock().stopping
    }
}

/// Software decoder driving the full [`DecoderEvent`] protocol from its own
/// thread: requests input, emits planar or external-texture frames carrying
/// the sample's pts, honors pause/resume/flush/stop, and parks at end of
/// stream until the next flush — hardware-codec semantics throughout.
pub struct SoftwareDecoder {
    supports_10bit_planar: bool,
    hdr_static_info: Option<Vec<u8>>,
    output_mode: OutputMode,
    output_texture: Option<ExternalTextureId>,
    configured: Option<(MediaFormat, Sender<DecoderEvent>)>,
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl SoftwareDecoder {
    pub fn new() -> Self {
        Self {
            supports_10bit_planar: false,
            hdr_static_info: None,
            output_mode: OutputMode::default(),
            output_texture: None,
            configured: None,
            shared: Arc::new(Shared {
                gate: Mutex::new(Gate {
                    paused: false,
                    stopping: false,
                    flush_epoch: 0,
                }),
                cond: Condvar::new(),
            }),
            worker: None,
        }
    }

    /// Advertise 10-bit planar (P010-class) buffer output support.
    pub fn with_10bit_planar_support(mut self, supported: bool) -> Self {
        self.supports_10bit_planar = supported;
        self
    }

    /// Attach an HDR static metadata blob to the output format change.
    pub fn with_hdr_static_info(mut self, blob: Vec<u8>) -> Self {
        self.hdr_static_info = Some(blob);
        self
    }

    /// The texture-mode destination, if one was attached.
    pub fn output_texture(&self) -> Option<ExternalTextureId> {
        self.output_texture
    }

    fn join_worker(&mut self) {
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                warn!("software decoder thread panicked");
            }
        }
    }
}

impl Default for SoftwareDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Wait for a rendezvous reply, bailing out if the decoder is stopping or
/// the consumer went away.
fn recv_reply<T>(shared: &Shared, rx: &Receiver<T>) -> Option<T> {
    loop {
        if shared.stopping() {
            return None;
        }
        match rx.recv_timeout(Duration::from_millis(10)) {
            Ok(value) => return Some(value),
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => return None,
        }
    }
}

struct DecodeLoop {
    format: MediaFormat,
    events: Sender<DecoderEvent>,
    shared: Arc<Shared>,
    output_mode: OutputMode,
    supports_10bit_planar: bool,
    hdr_static_info: Option<Vec<u8>>,
}

impl DecodeLoop {
    fn output_format(&self) -> MediaFormat {
        let ten_bit = self.format.is_10bit_profile() && self.supports_10bit_planar;
        let bytes_per_sample = if ten_bit { 2 } else { 1 };
        let mut format = self.format.clone();
        format.stride = Some(format.width * bytes_per_sample);
        format.slice_height = Some(format.height);
        format.crop = Some(CropRect::full(format.resolution()));
        format.yuv_layout = Some(Yuv420Layout::I420);
        format.hdr_static_info = self.hdr_static_info.clone();
        format
    }

    fn planar_frame(&self, chunk: &SampleChunk) -> Arc<[u8]> {
        let format = self.output_format();
        let stride = format.stride.unwrap_or(format.width) as usize;
        let rows = format.slice_height.unwrap_or(format.height) as usize;
        let luma = stride * rows;
        let mut data = vec![(chunk.info.pts.as_millis() & 0xFF) as u8; luma + luma / 2];
        let header = chunk.data.as_slice();
        let n = header.len().min(data.len());
        data[..n].copy_from_slice(&header[..n]);
        data.into()
    }

    fn run(self) {
        let mut sent_format = false;
        loop {
            {
                let mut gate = self.shared.gate.lock();
                while gate.paused && !gate.stopping {
                    self.shared.cond.wait(&mut gate);
                }
                if gate.stopping {
                    break;
                }
            }

            let (reply_tx, reply_rx) = bounded(1);
            if self
                .events
                .send(DecoderEvent::InputRequested { reply: reply_tx })
                .is_err()
            {
                break;
            }
            let chunk = match recv_reply(&self.shared, &reply_rx) {
                Some(chunk) => chunk,
                None => break,
            };

            if chunk.info.end_of_stream {
                if self.events.send(DecoderEvent::EndOfStream).is_err() {
                    break;
                }
                // Park until a flush (seek/repeat) or stop.
                let mut gate = self.shared.gate.lock();
                let epoch = gate.flush_epoch;
                while gate.flush_epoch == epoch && !gate.stopping {
                    self.shared.cond.wait(&mut gate);
                }
                if gate.stopping {
                    break;
                }
                continue;
            }

            if !sent_format {
                if self
                    .events
                    .send(DecoderEvent::FormatChanged(self.output_format()))
                    .is_err()
                {
                    break;
                }
                sent_format = true;
            }

            let payload = match self.output_mode {
                OutputMode::Buffer => FramePayload::Planar(self.planar_frame(&chunk)),
                OutputMode::Texture => FramePayload::External,
            };

            let (render_tx, render_rx) = bounded(1);
            if self
                .events
                .send(DecoderEvent::OutputReady {
                    pts: chunk.info.pts,
                    payload,
                    reply: render_tx,
                })
                .is_err()
            {
                break;
            }
            let rendered = match recv_reply(&self.shared, &render_rx) {
                Some(rendered) => rendered,
                None => break,
            };

            let (done_tx, done_rx) = bounded(1);
            if self
                .events
                .send(DecoderEvent::OutputReleased {
                    pts: chunk.info.pts,
                    rendered,
                    done: done_tx,
                })
                .is_err()
            {
                break;
            }
            if recv_reply(&self.shared, &done_rx).is_none() {
                break;
            }
        }
        debug!("software decoder thread exit");
    }
}

impl VideoDecoder for SoftwareDecoder {
    fn configure(
        &mut self,
        format: &MediaFormat,
        events: Sender<DecoderEvent>,
    ) -> Result<(), DecodeError> {
        if self.worker.is_some() {
            return Err(DecodeError::Configure {
                reason: "decoder is running; stop before reconfiguring".to_string(),
            });
        }
        self.configured = Some((format.clone(), events));
        let mut gate = self.shared.gate.lock();
        gate.paused = false;
        gate.stopping = false;
        Ok(())
    }

    fn start(&mut self) {
        if self.worker.is_some() {
            return;
        }
        let Some((format, events)) = self.configured.clone() else {
            warn!("start called on unconfigured software decoder");
            return;
        };
        let decode_loop = DecodeLoop {
            format,
            events,
            shared: Arc::clone(&self.shared),
            output_mode: self.output_mode,
            supports_10bit_planar: self.supports_10bit_planar,
            hdr_static_info: self.hdr_static_info.clone(),
        };
        self.worker = Some(
            thread::Builder::new()
                .name("software-decoder".to_string())
                .spawn(move || decode_loop.run())
                .expect("spawn decoder thread"),
        );
    }

    fn pause(&mut self) {
        self.shared.gate.lock().paused = true;
        self.shared.cond.notify_all();
    }

    fn resume(&mut self) {
        self.shared.gate.lock().paused = false;
        self.shared.cond.notify_all();
    }

    fn stop(&mut self) {
        {
            let mut gate = self.shared.gate.lock();
            gate.stopping = true;
        }
        self.shared.cond.notify_all();
        self.join_worker();
        self.configured = None;
    }

    fn flush(&mut self) {
        let mut gate = self.shared.gate.lock();
        gate.flush_epoch += 1;
        drop(gate);
        self.shared.cond.notify_all();
    }

    fn release(&mut self) {
        self.stop();
    }

    fn set_output_mode(&mut self, mode: OutputMode) {
        self.output_mode = mode;
    }

    fn set_output_texture(&mut self, texture: Option<ExternalTextureId>) {
        self.output_texture = texture;
    }

    fn supports_10bit_planar_output(&self) -> bool {
        self.supports_10bit_planar
    }

    fn supports_color_format(&self, layout: Yuv420Layout) -> bool {
        matches!(layout, Yuv420Layout::I420 | Yuv420Layout::Nv12)
    }
}

impl Drop for SoftwareDecoder {
    fn drop(&mut self) {
        self.stop();
    }
}
