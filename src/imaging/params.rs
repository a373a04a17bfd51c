//! Parameter types for the optimization pipeline.
//!
//! These structs describe *what* to produce, not *how*. They flow between the
//! three stages by value: the prober yields [`Bounds`], the planner turns
//! bounds + [`Envelope`] into a [`ScalePlan`], and the renderer consumes the
//! plan. Nothing here is mutated after construction.
//!
//! ## Types
//!
//! - [`Bounds`] — Intrinsic pixel dimensions, before orientation correction.
//! - [`Orientation`] — The four rotations we correct; mirrored EXIF values collapse to `Normal`.
//! - [`Envelope`] — Caller's max box, optional min box, and max-vs-min ratio policy.
//! - [`ScalePlan`] — Power-of-two decode sample size + residual scale + rotation.
//! - [`Quality`] — JPEG quality (0–100). Clamped on construction.
//! - [`OutputTarget`] — Directory and file-name prefix for produced files.
//! - [`OptimizeSettings`] — Everything one `optimize` call needs besides the source.

use serde::Serialize;
use std::path::PathBuf;

/// Intrinsic image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Bounds {
    pub width: u32,
    pub height: u32,
}

impl Bounds {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Bounds as an `(width, height)` tuple, the shape the calculations use.
    pub fn as_tuple(self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Orientation correction read from embedded EXIF metadata.
///
/// Rotations are clockwise, matching EXIF values 6 (90°), 3 (180°) and 8 (270°).
/// The mirrored variants (2, 4, 5, 7) are not corrected and map to `Normal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Orientation {
    #[default]
    Normal,
    Rotate90,
    Rotate180,
    Rotate270,
}

impl Orientation {
    /// Map a raw EXIF orientation value.
    pub fn from_exif(value: u16) -> Self {
        match value {
            6 => Orientation::Rotate90,
            3 => Orientation::Rotate180,
            8 => Orientation::Rotate270,
            _ => Orientation::Normal,
        }
    }

    /// Clockwise rotation in degrees.
    pub fn degrees(self) -> u32 {
        match self {
            Orientation::Normal => 0,
            Orientation::Rotate90 => 90,
            Orientation::Rotate180 => 180,
            Orientation::Rotate270 => 270,
        }
    }

    /// True when applying this rotation swaps width and height.
    pub fn swaps_axes(self) -> bool {
        matches!(self, Orientation::Rotate90 | Orientation::Rotate270)
    }
}

impl From<image::metadata::Orientation> for Orientation {
    fn from(value: image::metadata::Orientation) -> Self {
        Orientation::from_exif(value.to_exif().into())
    }
}

/// Caller-supplied target box for the output image.
///
/// `min_width`/`min_height` of 0 leave that axis unconstrained.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Envelope {
    pub max_width: f64,
    pub max_height: f64,
    pub min_width: u32,
    pub min_height: u32,
    /// `true`: shrink by the larger of the two axis ratios (fit inside the box).
    /// `false`: shrink by the smaller one (cover the box).
    pub use_max_dimension: bool,
}

impl Envelope {
    /// A max-only envelope with the fit-inside policy.
    pub fn max(max_width: f64, max_height: f64) -> Self {
        Self {
            max_width,
            max_height,
            min_width: 0,
            min_height: 0,
            use_max_dimension: true,
        }
    }

    pub fn with_min(self, min_width: u32, min_height: u32) -> Self {
        Self {
            min_width,
            min_height,
            ..self
        }
    }

    pub fn has_min(&self) -> bool {
        self.min_width > 0 || self.min_height > 0
    }
}

impl Default for Envelope {
    fn default() -> Self {
        Self::max(1280.0, 1280.0)
    }
}

/// How to produce pixels from the source.
///
/// `sample_size * residual_scale` is the total downscale factor computed from
/// the bounds and the envelope.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScalePlan {
    /// Power-of-two factor the decoder subsamples by.
    pub sample_size: u32,
    /// Leftover shrink in `[1, 2)`, applied after decode.
    pub residual_scale: f64,
    pub rotation: Orientation,
}

impl ScalePlan {
    /// Total downscale factor this plan realizes.
    pub fn total_scale(&self) -> f64 {
        self.sample_size as f64 * self.residual_scale
    }

    /// True when the post-decode transform would leave the buffer untouched.
    pub fn is_identity_transform(&self) -> bool {
        self.rotation == Orientation::Normal && self.residual_scale <= 1.0
    }
}

/// JPEG encoding quality (0-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u8);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.min(100) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Quality as handed to the JPEG encoder, whose scale starts at 1.
    pub fn encoder_value(self) -> u8 {
        self.0.max(1)
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(80)
    }
}

/// Where produced files land and how they are named (`<prefix>_<id>.jpg`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTarget {
    pub directory: PathBuf,
    pub prefix: String,
}

/// Complete parameters for one optimize call.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizeSettings {
    pub envelope: Envelope,
    pub quality: Quality,
    pub output: OutputTarget,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(0).value(), 0);
        assert_eq!(Quality::new(50).value(), 50);
        assert_eq!(Quality::new(150).value(), 100);
    }

    #[test]
    fn quality_zero_encodes_as_one() {
        assert_eq!(Quality::new(0).encoder_value(), 1);
        assert_eq!(Quality::new(80).encoder_value(), 80);
    }

    #[test]
    fn quality_default_is_80() {
        assert_eq!(Quality::default().value(), 80);
    }

    #[test]
    fn orientation_from_exif_values() {
        assert_eq!(Orientation::from_exif(1), Orientation::Normal);
        assert_eq!(Orientation::from_exif(6), Orientation::Rotate90);
        assert_eq!(Orientation::from_exif(3), Orientation::Rotate180);
        assert_eq!(Orientation::from_exif(8), Orientation::Rotate270);
        // Mirrored variants are not corrected
        for mirrored in [2, 4, 5, 7] {
            assert_eq!(Orientation::from_exif(mirrored), Orientation::Normal);
        }
        assert_eq!(Orientation::from_exif(0), Orientation::Normal);
    }

    #[test]
    fn orientation_from_image_crate() {
        use image::metadata::Orientation as Exif;
        assert_eq!(Orientation::from(Exif::Rotate90), Orientation::Rotate90);
        assert_eq!(Orientation::from(Exif::Rotate270), Orientation::Rotate270);
        assert_eq!(Orientation::from(Exif::FlipHorizontal), Orientation::Normal);
        assert_eq!(Orientation::from(Exif::Rotate90FlipH), Orientation::Normal);
    }

    #[test]
    fn only_quarter_turns_swap_axes() {
        assert!(!Orientation::Normal.swaps_axes());
        assert!(Orientation::Rotate90.swaps_axes());
        assert!(!Orientation::Rotate180.swaps_axes());
        assert!(Orientation::Rotate270.swaps_axes());
    }

    #[test]
    fn envelope_min_is_optional() {
        let env = Envelope::max(1280.0, 1280.0);
        assert!(!env.has_min());
        assert!(env.with_min(101, 0).has_min());
    }

    #[test]
    fn identity_transform_detection() {
        let plan = ScalePlan {
            sample_size: 4,
            residual_scale: 1.0,
            rotation: Orientation::Normal,
        };
        assert!(plan.is_identity_transform());
        assert!(
            !ScalePlan {
                rotation: Orientation::Rotate180,
                ..plan
            }
            .is_identity_transform()
        );
        assert!(
            !ScalePlan {
                residual_scale: 1.2,
                ..plan
            }
            .is_identity_transform()
        );
    }
}
