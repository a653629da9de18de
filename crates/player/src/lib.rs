//! `hdrplay-player` — The decode/playback state machine.
//!
//! A [`VideoPlayer`] owns a decoder, an extractor, and a video output for
//! its lifetime and drives them from one dedicated worker thread:
//!
//! - [`state`] — playback lifecycle states
//! - [`sync`] — wall-clock presentation pacing ([`TimeSyncer`])
//! - [`callback`] — progress/end/error callbacks with optional dispatch context
//! - [`output`] — the [`VideoOutput`] seam a GPU pipeline implements
//! - [`player`] — the worker loop and caller-facing API

pub mod callback;
pub mod output;
pub mod player;
pub mod state;
pub mod sync;

pub use callback::{CallbackDispatcher, PlayerCallback};
pub use output::{VideoOutput, VideoSizeListener};
pub use player::VideoPlayer;
pub use state::PlayState;
pub use sync::TimeSyncer;
