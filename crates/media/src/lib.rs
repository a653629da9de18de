//! `hdrplay-media` — Extractor and decoder capability interfaces.
//!
//! The hardware codec and container demuxer stay outside this repository;
//! the engine programs against two capability traits:
//!
//! - [`MediaExtractor`] — pull-based compressed sample source
//! - [`VideoDecoder`] — asynchronous decoder reporting through a channel of
//!   typed [`DecoderEvent`]s
//!
//! [`software`] provides deterministic implementations of both, used for
//! headless operation and throughout the engine's tests.

pub mod decode;
pub mod extract;
pub mod software;

pub use decode::{DecoderEvent, FramePayload, OutputMode, SampleChunk, VideoDecoder};
pub use extract::{MediaExtractor, SampleInfo};
pub use software::{SoftwareDecoder, SoftwareExtractor, StreamConfig};
