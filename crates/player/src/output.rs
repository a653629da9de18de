//! The seam between the playback state machine and a video output.

use hdrplay_common::{MediaFormat, MediaTime, PlayerError, Resolution};
use hdrplay_media::{FramePayload, VideoDecoder};

/// Consumer of decoded video frames.
///
/// All methods are invoked from the player's worker thread, strictly
/// serialized with player operations. A GPU implementation creates its
/// context in `on_decoder_prepare` and tears it down in `on_output_stop`.
pub trait VideoOutput: Send {
    /// Inspect the input format, select the ingestion mode, and configure
    /// the decoder (output mode, destination texture) before the player
    /// configures it.
    fn on_decoder_prepare(
        &mut self,
        decoder: &mut dyn VideoDecoder,
        format: &MediaFormat,
    ) -> Result<(), PlayerError>;

    /// The decoder's output geometry/color description changed.
    fn on_format_changed(&mut self, format: &MediaFormat);

    /// Ingest the decoded payload for the upcoming render call.
    fn on_buffer_available(&mut self, payload: &FramePayload, pts: MediaTime);

    /// Render and present the current frame. Returning false declines the
    /// frame (e.g. no valid output surface yet) — a soft skip, not an error.
    fn on_buffer_render(&mut self, pts: MediaTime) -> bool;

    /// The frame's buffer went back to the decoder (after pacing).
    fn on_buffer_release(&mut self, pts: MediaTime, rendered: bool);

    /// Tear down GPU state (player stop). Registered transforms survive;
    /// their GPU resources do not.
    fn on_output_stop(&mut self);

    /// Final teardown (player release).
    fn release(&mut self);
}

/// Listener for decoded video size changes.
pub trait VideoSizeListener: Send + Sync {
    fn on_video_size_change(&self, size: Resolution);
}
