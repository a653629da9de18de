//! YUV -> RGB conversion matrix table.
//!
//! BT.2020 conversion matrices for every supported (bit depth, range) pair,
//! column-major as shaders consume them. The constants are the published
//! quantization-aware matrices; they differ per bit depth only in the offset
//! column because the quantization step size changes.

use hdrplay_common::{ColorMatrix, ColorRange, RenderError};

static BT2020_8BIT_FULL_YUV_TO_RGB: ColorMatrix = ColorMatrix([
    1.000000, 1.000000, 1.000000, 0.000000, //
    -0.000000, -0.164553, 1.881400, 0.000000, //
    1.474600, -0.571353, -0.000000, 0.000000, //
    -0.740191, 0.369396, -0.944389, 1.000000,
]);

static BT2020_8BIT_LIMITED_YUV_TO_RGB: ColorMatrix = ColorMatrix([
    1.164384, 1.164384, 1.164384, 0.000000, //
    -0.000000, -0.187326, 2.141772, 0.000000, //
    1.678674, -0.650424, -0.000000, 0.000000, //
    -0.915688, 0.347458, -1.148145, 1.000000,
]);

static BT2020_10BIT_FULL_YUV_TO_RGB: ColorMatrix = ColorMatrix([
    1.000000, 1.000000, 1.000000, 0.000000, //
    -0.000000, -0.164553, 1.881400, 0.000000, //
    1.474600, -0.571353, -0.000000, 0.000000, //
    -0.738021, 0.368313, -0.941620, 1.000000,
]);

static BT2020_10BIT_LIMITED_YUV_TO_RGB: ColorMatrix = ColorMatrix([
    1.167808, 1.167808, 1.167808, 0.000000, //
    -0.000000, -0.187877, 2.148072, 0.000000, //
    1.683611, -0.652337, -0.000000, 0.000000, //
    -0.915688, 0.347458, -1.148145, 1.000000,
]);

static BT2020_12BIT_FULL_YUV_TO_RGB: ColorMatrix = ColorMatrix([
    1.000000, 1.000000, 1.000000, 0.000000, //
    -0.000000, -0.164553, 1.881400, 0.000000, //
    1.474600, -0.571353, -0.000000, 0.000000, //
    -0.737480, 0.368043, -0.940930, 1.000000,
]);

static BT2020_12BIT_LIMITED_YUV_TO_RGB: ColorMatrix = ColorMatrix([
    1.168664, 1.168664, 1.168664, 0.000000, //
    -0.000000, -0.188015, 2.149647, 0.000000, //
    1.684846, -0.652816, -0.000000, 0.000000, //
    -0.915688, 0.347458, -1.148145, 1.000000,
]);

/// Look up the YUV->RGB matrix for a (bit depth, range) pair.
///
/// Supported bit depths are 8, 10, and 12; anything else is an unsupported
/// format, never silently mapped to a default matrix.
pub fn yuv_to_rgb_matrix(
    bit_depth: u32,
    range: ColorRange,
) -> Result<&'static ColorMatrix, RenderError> {
    let pair = match bit_depth {
        8 => (&BT2020_8BIT_FULL_YUV_TO_RGB, &BT2020_8BIT_LIMITED_YUV_TO_RGB),
        10 => (&BT2020_10BIT_FULL_YUV_TO_RGB, &BT2020_10BIT_LIMITED_YUV_TO_RGB),
        12 => (&BT2020_12BIT_FULL_YUV_TO_RGB, &BT2020_12BIT_LIMITED_YUV_TO_RGB),
        _ => return Err(RenderError::UnsupportedFormat { bit_depth, range }),
    };
    Ok(match range {
        ColorRange::Full => pair.0,
        ColorRange::Limited => pair.1,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_matrix_values() {
        let m = yuv_to_rgb_matrix(8, ColorRange::Limited).unwrap();
        assert!((m.0[0] - 1.164384).abs() < 1e-6);
        assert!((m.0[12] - -0.915688).abs() < 1e-6);

        let m = yuv_to_rgb_matrix(10, ColorRange::Full).unwrap();
        assert!((m.0[0] - 1.0).abs() < 1e-6);
        assert!((m.0[12] - -0.738021).abs() < 1e-6);
    }

    #[test]
    fn every_supported_pair_resolves() {
        for bit_depth in [8, 10, 12] {
            for range in [ColorRange::Limited, ColorRange::Full] {
                assert!(yuv_to_rgb_matrix(bit_depth, range).is_ok());
            }
        }
    }

    #[test]
    fn full_and_limited_differ() {
        let full = yuv_to_rgb_matrix(10, ColorRange::Full).unwrap();
        let limited = yuv_to_rgb_matrix(10, ColorRange::Limited).unwrap();
        assert_ne!(full.0, limited.0);
    }

    #[test]
    fn unsupported_bit_depth_is_an_error() {
        let err = yuv_to_rgb_matrix(12 + 4, ColorRange::Limited).unwrap_err();
        assert!(matches!(
            err,
            RenderError::UnsupportedFormat { bit_depth: 16, .. }
        ));
        assert!(yuv_to_rgb_matrix(9, ColorRange::Full).is_err());
    }
}
