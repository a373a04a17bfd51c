//! Pixel transforms between decode and encode.
//!
//! Each function takes the buffer by value and returns its successor, so the
//! predecessor is dropped as soon as the new buffer exists. At most two
//! full-size buffers are alive at any point.

use super::calculations::{Resample, transformed_dimensions};
use super::params::{Orientation, ScalePlan};
use image::DynamicImage;
use image::imageops::FilterType;

/// Apply the plan's rotation, then shrink by its residual scale.
///
/// An identity plan returns the input untouched.
pub fn apply_plan(image: DynamicImage, plan: &ScalePlan) -> DynamicImage {
    if plan.is_identity_transform() {
        return image;
    }

    let rotated = rotate(image, plan.rotation);
    if plan.residual_scale <= 1.0 {
        return rotated;
    }

    // Rotation already happened, so dimensions come from the unrotated view
    let (width, height) = transformed_dimensions(
        (rotated.width(), rotated.height()),
        &ScalePlan {
            rotation: Orientation::Normal,
            ..*plan
        },
    );
    rotated.resize_exact(width, height, FilterType::Triangle)
}

/// Apply a finalize decision with a high-quality filter.
pub fn resample(image: DynamicImage, decision: Resample) -> DynamicImage {
    match decision {
        Resample::Keep => image,
        Resample::Shrink { width, height } | Resample::ScaleUp { width, height } => {
            image.resize_exact(width, height, FilterType::Lanczos3)
        }
    }
}

fn rotate(image: DynamicImage, orientation: Orientation) -> DynamicImage {
    match orientation {
        Orientation::Normal => image,
        Orientation::Rotate90 => image.rotate90(),
        Orientation::Rotate180 => image.rotate180(),
        Orientation::Rotate270 => image.rotate270(),
    }
}
