//! Extractor (demuxer) capability trait.

use hdrplay_common::{
    CodecProfile, ColorRange, ColorStandard, ColorTransfer, MediaSource, MediaTime, SourceError,
};

/// Timing and flags of one compressed sample.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SampleInfo {
    /// Payload size in bytes.
    pub size: usize,
    /// Presentation timestamp.
    pub pts: MediaTime,
    /// Whether the sample is a sync sample (IDR or equivalent).
    pub is_keyframe: bool,
    /// Whether this is the end-of-stream marker (empty payload).
    pub end_of_stream: bool,
}

/// Pull-based sample source for one video track.
///
/// A concrete implementation wraps a container demuxer; the engine only ever
/// talks to this trait. All methods other than `set_source` assume a source
/// has been set and probed.
pub trait MediaExtractor: Send {
    /// Attach and probe a source. Fails for unreadable containers.
    fn set_source(&mut self, source: &MediaSource) -> Result<(), SourceError>;

    /// Whether a playable video track was found.
    fn is_available(&self) -> bool;

    fn mime_type(&self) -> String;

    fn profile(&self) -> CodecProfile;

    fn profile_level(&self) -> u32;

    /// Upper bound on compressed sample size, for decoder input buffers.
    fn max_input_size(&self) -> usize;

    /// Codec-specific data (SPS/PPS or equivalent).
    fn csd0(&self) -> Option<Vec<u8>>;

    fn csd1(&self) -> Option<Vec<u8>>;

    fn width(&self) -> u32;

    fn height(&self) -> u32;

    fn color_standard(&self) -> ColorStandard;

    fn color_range(&self) -> ColorRange;

    fn color_transfer(&self) -> ColorTransfer;

    /// Read the current sample into `buf` (replacing its contents) and
    /// return its timing/flags. At end of stream the buffer is left empty
    /// and the info carries `end_of_stream`.
    fn read_sample(&mut self, buf: &mut Vec<u8>) -> SampleInfo;

    /// Step to the next sample. Returns false once past the last sample.
    fn advance(&mut self) -> bool;

    /// Seek to the nearest sync sample at or before the target time.
    fn seek_pre_sync(&mut self, target: MediaTime);

    /// Release demuxer resources. Further reads return end-of-stream.
    fn release(&mut self);
}
