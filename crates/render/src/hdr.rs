//! HDR static metadata (SMPTE ST 2086 / CTA-861.3) parsing.

use byteorder::{LittleEndian, ReadBytesExt};

use hdrplay_common::LuminanceSource;

/// Mastering display + content light level metadata.
///
/// All-zero luminance fields mean "unknown", not literally zero nits;
/// consumers must apply their own fallback.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct HdrStaticMetadata {
    /// Display primaries, chromaticity coordinates (0.00002 units).
    pub primary_r_x: u16,
    pub primary_r_y: u16,
    pub primary_g_x: u16,
    pub primary_g_y: u16,
    pub primary_b_x: u16,
    pub primary_b_y: u16,
    pub white_point_x: u16,
    pub white_point_y: u16,
    /// Peak mastering display luminance in nits.
    pub max_mastering_luminance: u16,
    pub min_mastering_luminance: u16,
    /// Maximum content light level in nits.
    pub max_content_luminance: u16,
    /// Maximum frame-average light level in nits.
    pub max_frame_average_luminance: u16,
}

impl HdrStaticMetadata {
    /// Byte length of the fixed-layout blob: one descriptor-type byte
    /// followed by twelve little-endian u16 values.
    pub const BLOB_LEN: usize = 1 + 12 * 2;

    /// Parse the fixed-layout little-endian blob attached to format-change
    /// events. Returns `None` for truncated blobs.
    pub fn parse(blob: &[u8]) -> Option<Self> {
        if blob.len() < Self::BLOB_LEN {
            return None;
        }
        // Skip the descriptor-type byte; the rest is a u16 array.
        let mut cursor = std::io::Cursor::new(&blob[1..]);
        let mut read = || cursor.read_u16::<LittleEndian>().ok();
        Some(Self {
            primary_r_x: read()?,
            primary_r_y: read()?,
            primary_g_x: read()?,
            primary_g_y: read()?,
            primary_b_x: read()?,
            primary_b_y: read()?,
            white_point_x: read()?,
            white_point_y: read()?,
            max_mastering_luminance: read()?,
            min_mastering_luminance: read()?,
            max_content_luminance: read()?,
            max_frame_average_luminance: read()?,
        })
    }

    /// The luminance value selected by a [`LuminanceSource`], in nits
    /// (0 = unknown).
    pub fn luminance(&self, source: LuminanceSource) -> f32 {
        let nits = match source {
            LuminanceSource::MaxContent => self.max_content_luminance,
            LuminanceSource::MaxFrameAverage => self.max_frame_average_luminance,
            LuminanceSource::MaxMastering => self.max_mastering_luminance,
        };
        nits as f32
    }
}

/// Build the wire blob from metadata (test and software-decoder helper).
pub fn encode_blob(metadata: &HdrStaticMetadata) -> Vec<u8> {
    use byteorder::WriteBytesExt;
    let values = [
        metadata.primary_r_x,
        metadata.primary_r_y,
        metadata.primary_g_x,
        metadata.primary_g_y,
        metadata.primary_b_x,
        metadata.primary_b_y,
        metadata.white_point_x,
        metadata.white_point_y,
        metadata.max_mastering_luminance,
        metadata.min_mastering_luminance,
        metadata.max_content_luminance,
        metadata.max_frame_average_luminance,
    ];
    let mut blob = vec![0u8];
    for value in values {
        blob.write_u16::<LittleEndian>(value).expect("vec write");
    }
    blob
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blob_roundtrip() {
        let metadata = HdrStaticMetadata {
            primary_r_x: 35400,
            primary_r_y: 14600,
            primary_g_x: 8500,
            primary_g_y: 39850,
            primary_b_x: 6550,
            primary_b_y: 2300,
            white_point_x: 15635,
            white_point_y: 16450,
            max_mastering_luminance: 1000,
            min_mastering_luminance: 50,
            max_content_luminance: 1000,
            max_frame_average_luminance: 400,
        };
        let blob = encode_blob(&metadata);
        assert_eq!(blob.len(), HdrStaticMetadata::BLOB_LEN);
        assert_eq!(HdrStaticMetadata::parse(&blob), Some(metadata));
    }

    #[test]
    fn truncated_blob_is_rejected() {
        let blob = encode_blob(&HdrStaticMetadata::default());
        assert_eq!(HdrStaticMetadata::parse(&blob[..blob.len() - 1]), None);
        assert_eq!(HdrStaticMetadata::parse(&[]), None);
    }

    #[test]
    fn default_means_unknown() {
        let metadata = HdrStaticMetadata::default();
        assert_eq!(metadata.luminance(LuminanceSource::MaxContent), 0.0);
        assert_eq!(metadata.luminance(LuminanceSource::MaxMastering), 0.0);
    }

    #[test]
    fn luminance_selection() {
        let metadata = HdrStaticMetadata {
            max_mastering_luminance: 4000,
            max_content_luminance: 1000,
            max_frame_average_luminance: 400,
            ..Default::default()
        };
        assert_eq!(metadata.luminance(LuminanceSource::MaxContent), 1000.0);
        assert_eq!(metadata.luminance(LuminanceSource::MaxFrameAverage), 400.0);
        assert_eq!(metadata.luminance(LuminanceSource::MaxMastering), 4000.0);
    }
}
