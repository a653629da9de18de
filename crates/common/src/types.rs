//! Core types with newtype pattern for type safety.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

/// Media timestamp with microsecond precision.
///
/// Presentation timestamps flow through the engine in microseconds (the
/// demuxer/decoder unit); the caller-facing API speaks seconds.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MediaTime(pub i64);

impl MediaTime {
    pub const ZERO: Self = Self(0);

    pub fn from_micros(us: i64) -> Self {
        Self(us)
    }

    pub fn from_millis(ms: i64) -> Self {
        Self(ms * 1_000)
    }

    pub fn from_secs(secs: f64) -> Self {
        Self((secs * 1_000_000.0) as i64)
    }

    pub fn as_micros(self) -> i64 {
        self.0
    }

    pub fn as_millis(self) -> i64 {
        self.0 / 1_000
    }

    pub fn as_nanos(self) -> i64 {
        self.0 * 1_000
    }

    pub fn as_secs(self) -> f64 {
        self.0 as f64 / 1_000_000.0
    }
}

impl Add for MediaTime {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for MediaTime {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl fmt::Display for MediaTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}s", self.as_secs())
    }
}

/// Video/image resolution.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const HD: Self = Self {
        width: 1920,
        height: 1080,
    };
    pub const UHD: Self = Self {
        width: 3840,
        height: 2160,
    };

    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn pixel_count(self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn aspect_ratio(self) -> f64 {
        self.width as f64 / self.height as f64
    }

    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Crop rectangle with inclusive right/bottom edges (decoder convention).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CropRect {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl CropRect {
    pub fn new(left: u32, top: u32, right: u32, bottom: u32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Full-frame crop for the given resolution.
    pub fn full(resolution: Resolution) -> Self {
        Self {
            left: 0,
            top: 0,
            right: resolution.width.saturating_sub(1),
            bottom: resolution.height.saturating_sub(1),
        }
    }

    pub fn width(self) -> u32 {
        self.right - self.left + 1
    }

    pub fn height(self) -> u32 {
        self.bottom - self.top + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_time_conversions() {
        let t = MediaTime::from_secs(1.5);
        assert_eq!(t.as_micros(), 1_500_000);
        assert_eq!(t.as_millis(), 1_500);
        assert_eq!(t.as_nanos(), 1_500_000_000);
        assert!((t.as_secs() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn media_time_arithmetic() {
        let a = MediaTime::from_micros(1_000_000);
        let b = MediaTime::from_micros(400_000);
        assert_eq!((a - b).as_micros(), 600_000);
        assert_eq!((a + b).as_micros(), 1_400_000);
    }

    #[test]
    fn crop_inclusive_edges() {
        // 1918x1078 content inside a 1920x1080 coded frame.
        let crop = CropRect::new(0, 0, 1917, 1077);
        assert_eq!(crop.width(), 1918);
        assert_eq!(crop.height(), 1078);
    }

    #[test]
    fn crop_full_frame() {
        let crop = CropRect::full(Resolution::HD);
        assert_eq!(crop.width(), 1920);
        assert_eq!(crop.height(), 1080);
    }
}
