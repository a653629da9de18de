//! Display capability description.
//!
//! An explicit, injectable snapshot of what the display/driver combination
//! can do, replacing process-wide lazy capability caches so tests (and
//! multi-display embedders) can substitute their own.

use crate::color::ColorSpace;
use crate::gpu::SurfaceColorSpace;

/// Capabilities of the display the pipeline presents to.
#[derive(Clone, Debug)]
pub struct DisplayCapabilities {
    /// Display/driver support for BT.2020 PQ window surfaces.
    pub supports_bt2020_pq: bool,
    /// Display/driver support for BT.2020 HLG window surfaces.
    pub supports_bt2020_hlg: bool,
    /// Display/driver support for BT.2020 linear window surfaces.
    pub supports_bt2020_linear: bool,
    /// Driver support for raw-YUV sampling of external textures (Y2Y).
    pub supports_y2y_sampling: bool,
    /// Platform API level; at or above [`Self::HDR_SURFACE_API_LEVEL`] every
    /// valid surface is HDR-capable.
    pub api_level: u32,
    /// Peak luminance of the display in nits (0 = unknown).
    pub max_luminance_nits: f32,
}

impl DisplayCapabilities {
    /// First platform API level where any surface may carry an HDR color
    /// space, with no heuristics needed.
    pub const HDR_SURFACE_API_LEVEL: u32 = 33;

    /// An SDR-only display (no HDR surfaces, no Y2Y).
    pub fn sdr_only(api_level: u32) -> Self {
        Self {
            supports_bt2020_pq: false,
            supports_bt2020_hlg: false,
            supports_bt2020_linear: false,
            supports_y2y_sampling: false,
            api_level,
            max_luminance_nits: 0.0,
        }
    }

    /// A fully HDR-capable display.
    pub fn hdr(api_level: u32, max_luminance_nits: f32) -> Self {
        Self {
            supports_bt2020_pq: true,
            supports_bt2020_hlg: true,
            supports_bt2020_linear: true,
            supports_y2y_sampling: true,
            api_level,
            max_luminance_nits,
        }
    }

    /// Whether the display/driver advertises the transfer function needed to
    /// present the given color space.
    pub fn supports_surface_color_space(&self, color_space: ColorSpace) -> bool {
        match SurfaceColorSpace::from_color_space(color_space) {
            None => true,
            Some(SurfaceColorSpace::Bt2020Pq) => self.supports_bt2020_pq,
            Some(SurfaceColorSpace::Bt2020Hlg) => self.supports_bt2020_hlg,
            Some(SurfaceColorSpace::Bt2020Linear) => self.supports_bt2020_linear,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sdr_display_rejects_hdr_spaces() {
        let caps = DisplayCapabilities::sdr_only(30);
        assert!(caps.supports_surface_color_space(ColorSpace::Sdr));
        assert!(!caps.supports_surface_color_space(ColorSpace::Bt2020Pq));
        assert!(!caps.supports_surface_color_space(ColorSpace::Bt2020Hlg));
    }

    #[test]
    fn hdr_display_accepts_all() {
        let caps = DisplayCapabilities::hdr(34, 1000.0);
        assert!(caps.supports_surface_color_space(ColorSpace::Bt2020Pq));
        assert!(caps.supports_surface_color_space(ColorSpace::Bt2020Hlg));
        assert!(caps.supports_surface_color_space(ColorSpace::Bt2020Linear));
    }
}
