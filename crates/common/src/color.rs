//! Color standard, range, transfer function, and color space types.

use serde::{Deserialize, Serialize};

/// Color standard (primaries + matrix coefficients) signaled by the container.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorStandard {
    /// BT.709 (HD video).
    #[default]
    Bt709,
    /// BT.601 NTSC (SD video, 525-line).
    Bt601Ntsc,
    /// BT.601 PAL (SD video, 625-line).
    Bt601Pal,
    /// BT.2020 (UHD / HDR content).
    Bt2020,
}

/// Quantization range of the YUV samples.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorRange {
    /// Limited/video range (Y in 16..235 for 8-bit).
    #[default]
    Limited,
    /// Full/PC range (0..255 for 8-bit).
    Full,
}

/// Transfer function (opto-electronic curve) signaled by the container.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorTransfer {
    /// SDR video gamma (BT.709/BT.601).
    #[default]
    SdrVideo,
    /// Linear light.
    Linear,
    /// PQ / SMPTE ST 2084 (HDR10).
    St2084,
    /// HLG / Hybrid Log-Gamma (broadcast HDR).
    Hlg,
}

/// Working color space of a decoded/rendered image.
///
/// Derived from (standard, transfer): BT.2020 content with an HDR or linear
/// transfer gets its own variant, everything else collapses to SDR.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorSpace {
    #[default]
    Sdr,
    Bt2020Pq,
    Bt2020Hlg,
    Bt2020Linear,
}

impl ColorSpace {
    /// Classify the container-signaled (standard, transfer) pair.
    pub fn from_format(standard: ColorStandard, transfer: ColorTransfer) -> Self {
        if standard != ColorStandard::Bt2020 {
            return Self::Sdr;
        }
        match transfer {
            ColorTransfer::St2084 => Self::Bt2020Pq,
            ColorTransfer::Hlg => Self::Bt2020Hlg,
            ColorTransfer::Linear => Self::Bt2020Linear,
            ColorTransfer::SdrVideo => Self::Sdr,
        }
    }

    pub fn is_hdr(self) -> bool {
        !matches!(self, Self::Sdr)
    }
}

/// Memory layout of a planar/semi-planar YUV 4:2:0 buffer.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Yuv420Layout {
    /// Y plane, then U plane, then V plane.
    #[default]
    I420,
    /// Y plane, then V plane, then U plane.
    Yv12,
    /// Y plane, then interleaved UV.
    Nv12,
    /// Y plane, then interleaved VU.
    Nv21,
}

/// Column-major 4x4 color conversion matrix, as consumed by GPU shaders.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColorMatrix(pub [f32; 16]);

impl ColorMatrix {
    pub const IDENTITY: Self = Self([
        1.0, 0.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, //
        0.0, 0.0, 0.0, 1.0,
    ]);

    pub fn as_slice(&self) -> &[f32; 16] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_space_classification() {
        assert_eq!(
            ColorSpace::from_format(ColorStandard::Bt2020, ColorTransfer::St2084),
            ColorSpace::Bt2020Pq
        );
        assert_eq!(
            ColorSpace::from_format(ColorStandard::Bt2020, ColorTransfer::Hlg),
            ColorSpace::Bt2020Hlg
        );
        assert_eq!(
            ColorSpace::from_format(ColorStandard::Bt2020, ColorTransfer::Linear),
            ColorSpace::Bt2020Linear
        );
        // BT.709 is SDR no matter the transfer claim.
        assert_eq!(
            ColorSpace::from_format(ColorStandard::Bt709, ColorTransfer::St2084),
            ColorSpace::Sdr
        );
        // BT.2020 with an SDR curve is still SDR (wide-gamut SDR).
        assert_eq!(
            ColorSpace::from_format(ColorStandard::Bt2020, ColorTransfer::SdrVideo),
            ColorSpace::Sdr
        );
    }

    #[test]
    fn hdr_detection() {
        assert!(ColorSpace::Bt2020Pq.is_hdr());
        assert!(ColorSpace::Bt2020Hlg.is_hdr());
        assert!(ColorSpace::Bt2020Linear.is_hdr());
        assert!(!ColorSpace::Sdr.is_hdr());
    }

    #[test]
    fn identity_matrix_diagonal() {
        let m = ColorMatrix::IDENTITY;
        for row in 0..4 {
            for col in 0..4 {
                let expected = if row == col { 1.0 } else { 0.0 };
                assert_eq!(m.0[col * 4 + row], expected);
            }
        }
    }
}
