//! Output configuration: ingestion mode, display bit depth, tone mapping.

use serde::{Deserialize, Serialize};

/// How decoded frames enter the GPU pipeline. Must be chosen before prepare;
/// the mode is fixed for the stream's lifetime once prepare has run.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextureSource {
    /// Pick automatically: planar buffers for 10-bit HDR when the decoder
    /// supports them, external textures otherwise (Y2Y preferred for HDR
    /// when the display advertises the extension).
    #[default]
    Auto,
    /// Force planar YUV buffer ingestion.
    Buffer,
    /// Force the opaque external-texture path.
    External,
    /// Force the raw-YUV (Y2Y) external-texture path.
    Y2y,
}

/// Bit depth requested for HDR presentation targets and the GPU context.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HdrBitDepth {
    Eight,
    #[default]
    Ten,
    Sixteen,
}

impl HdrBitDepth {
    pub fn bits(self) -> u32 {
        match self {
            Self::Eight => 8,
            Self::Ten => 10,
            Self::Sixteen => 16,
        }
    }
}

/// Which HDR static metadata field drives tone mapping.
///
/// The metadata carries three candidate peaks (max content, max frame-average,
/// max mastering); which one a tone mapper should trust is content-dependent,
/// so it is explicit configuration rather than a pipeline guess.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LuminanceSource {
    #[default]
    MaxContent,
    MaxFrameAverage,
    MaxMastering,
}

/// Tone mapping configuration.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToneMapping {
    /// Metadata field supplying the source peak luminance.
    pub source: LuminanceSource,
    /// Peak assumed when the selected field is unknown (0 in the metadata).
    pub fallback_nits: f32,
}

impl Default for ToneMapping {
    fn default() -> Self {
        Self {
            source: LuminanceSource::MaxContent,
            fallback_nits: 1000.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hdr_bit_depth_bits() {
        assert_eq!(HdrBitDepth::Eight.bits(), 8);
        assert_eq!(HdrBitDepth::Ten.bits(), 10);
        assert_eq!(HdrBitDepth::Sixteen.bits(), 16);
    }

    #[test]
    fn tone_mapping_defaults() {
        let tm = ToneMapping::default();
        assert_eq!(tm.source, LuminanceSource::MaxContent);
        assert!((tm.fallback_nits - 1000.0).abs() < f32::EPSILON);
    }

    #[test]
    fn texture_source_default_is_auto() {
        assert_eq!(TextureSource::default(), TextureSource::Auto);
    }

    #[test]
    fn tone_mapping_roundtrips_through_json() {
        let tm = ToneMapping {
            source: LuminanceSource::MaxMastering,
            fallback_nits: 600.0,
        };
        let json = serde_json::to_string(&tm).unwrap();
        let restored: ToneMapping = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, tm);
    }
}
