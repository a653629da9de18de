//! Media source and format descriptor — built at prepare time from extractor
//! output, amended by the decoder with its output geometry.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::color::{ColorRange, ColorStandard, ColorTransfer, Yuv420Layout};
use crate::types::{CropRect, Resolution};

/// A playable media source. Only local files; network sources are out of scope.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaSource {
    path: PathBuf,
}

impl MediaSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Codec profile, as far as the pipeline cares: whether the stream is a
/// 10-bit (HDR-capable) profile.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CodecProfile {
    Baseline,
    #[default]
    Main,
    High,
    High10,
    Main10,
    Main10Hdr10,
    Main10Hdr10Plus,
}

impl CodecProfile {
    pub fn is_10bit(self) -> bool {
        matches!(
            self,
            Self::High10 | Self::Main10 | Self::Main10Hdr10 | Self::Main10Hdr10Plus
        )
    }
}

/// Stream format descriptor.
///
/// The input half is assembled from extractor output at prepare time; the
/// output-geometry fields (`stride`, `slice_height`, `crop`, `yuv_layout`,
/// `hdr_static_info`) are filled in by the decoder on format change.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaFormat {
    pub mime: String,
    pub width: u32,
    pub height: u32,
    pub profile: CodecProfile,
    pub level: u32,
    pub max_input_size: usize,
    pub color_standard: ColorStandard,
    pub color_range: ColorRange,
    pub color_transfer: ColorTransfer,
    /// Codec-specific data (SPS/PPS or equivalent).
    pub csd0: Option<Vec<u8>>,
    pub csd1: Option<Vec<u8>>,

    /// Row stride of the decoder's planar output, in bytes.
    pub stride: Option<u32>,
    /// Plane height of the decoder's planar output, in rows.
    pub slice_height: Option<u32>,
    pub crop: Option<CropRect>,
    pub yuv_layout: Option<Yuv420Layout>,
    /// Raw HDR static metadata blob attached by the decoder, if any.
    pub hdr_static_info: Option<Vec<u8>>,
}

impl MediaFormat {
    /// Whether the stream carries a 10-bit HDR-capable profile.
    pub fn is_10bit_profile(&self) -> bool {
        self.profile.is_10bit()
    }

    /// Coded resolution.
    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.width, self.height)
    }

    /// Displayable size: the crop window if the decoder reported one,
    /// otherwise the coded size.
    pub fn display_size(&self) -> Resolution {
        match self.crop {
            Some(crop) if crop.right > 0 && crop.bottom > 0 => {
                Resolution::new(crop.width(), crop.height())
            }
            _ => self.resolution(),
        }
    }

    /// Bit depth of the planar output, inferred from stride vs. width:
    /// two bytes per sample means 10-bit stored in 16-bit containers.
    pub fn planar_bit_depth(&self) -> u32 {
        match self.stride {
            Some(stride) if self.width > 0 && stride / self.width == 2 => 10,
            _ => 8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_bit_depth() {
        assert!(CodecProfile::Main10.is_10bit());
        assert!(CodecProfile::Main10Hdr10.is_10bit());
        assert!(CodecProfile::High10.is_10bit());
        assert!(!CodecProfile::Main.is_10bit());
        assert!(!CodecProfile::High.is_10bit());
    }

    #[test]
    fn display_size_prefers_crop() {
        let format = MediaFormat {
            width: 1920,
            height: 1088,
            crop: Some(CropRect::new(0, 0, 1919, 1079)),
            ..Default::default()
        };
        assert_eq!(format.display_size(), Resolution::new(1920, 1080));
    }

    #[test]
    fn display_size_without_crop() {
        let format = MediaFormat {
            width: 1280,
            height: 720,
            ..Default::default()
        };
        assert_eq!(format.display_size(), Resolution::new(1280, 720));
    }

    #[test]
    fn planar_bit_depth_from_stride() {
        let mut format = MediaFormat {
            width: 1920,
            height: 1080,
            stride: Some(3840),
            ..Default::default()
        };
        assert_eq!(format.planar_bit_depth(), 10);
        format.stride = Some(1920);
        assert_eq!(format.planar_bit_depth(), 8);
        format.stride = None;
        assert_eq!(format.planar_bit_depth(), 8);
    }
}
