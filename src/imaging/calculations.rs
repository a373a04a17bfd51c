//! Pure calculation functions for the scale planner.
//!
//! All functions here are pure and testable without any I/O or images.
//! Dimensions are `(width, height)` tuples; ratios are `f64`.

use super::backend::ImagingError;
use super::params::{Bounds, Envelope, Orientation, ScalePlan};

/// Reject envelopes the planner cannot work with.
///
/// The max box must be at least one pixel on each axis, and a min box may not
/// exceed it.
pub fn validate_envelope(envelope: &Envelope) -> Result<(), ImagingError> {
    let valid = |v: f64| v.is_finite() && v >= 1.0;
    if !valid(envelope.max_width) || !valid(envelope.max_height) {
        return Err(ImagingError::InvalidConfig(format!(
            "max envelope must be at least 1x1, got {}x{}",
            envelope.max_width, envelope.max_height
        )));
    }
    if envelope.min_width as f64 > envelope.max_width
        || envelope.min_height as f64 > envelope.max_height
    {
        return Err(ImagingError::InvalidConfig(format!(
            "min envelope {}x{} exceeds max envelope {}x{}",
            envelope.min_width, envelope.min_height, envelope.max_width, envelope.max_height
        )));
    }
    Ok(())
}

/// Calculate how much the source must shrink to meet the max envelope.
///
/// Uses the larger axis ratio when `use_max_dimension` is set (fit inside),
/// the smaller one otherwise (cover). Never below 1: this stage does not upsample.
///
/// # Examples
/// ```
/// # use photo_slim::imaging::{Envelope, calculations::scale_down_factor};
/// let factor = scale_down_factor((3000, 2000), &Envelope::max(1280.0, 1280.0));
/// assert!((factor - 2.34375).abs() < 1e-9);
///
/// // Already small enough: clamps to 1
/// assert_eq!(scale_down_factor((640, 480), &Envelope::max(1280.0, 1280.0)), 1.0);
/// ```
pub fn scale_down_factor(bounds: (u32, u32), envelope: &Envelope) -> f64 {
    let (w, h) = bounds;
    let width_ratio = w as f64 / envelope.max_width;
    let height_ratio = h as f64 / envelope.max_height;

    let factor = if envelope.use_max_dimension {
        width_ratio.max(height_ratio)
    } else {
        width_ratio.min(height_ratio)
    };

    factor.max(1.0)
}

/// Largest power of two that does not exceed `raw_scale`.
///
/// The decoder subsamples by this factor; the remainder (always in `[1, 2)`)
/// is left for the post-decode transform.
pub fn nearest_sample_size(raw_scale: f64) -> u32 {
    let mut sample: u32 = 1;
    while let Some(next) = sample.checked_mul(2) {
        if next as f64 > raw_scale {
            break;
        }
        sample = next;
    }
    sample
}

/// Build the full scale plan for an image.
///
/// Fails with `InvalidImage` on zero-sized bounds and `InvalidConfig` on a
/// non-positive max envelope.
pub fn plan_scale(
    bounds: Bounds,
    envelope: &Envelope,
    orientation: Orientation,
) -> Result<ScalePlan, ImagingError> {
    if bounds.width == 0 || bounds.height == 0 {
        return Err(ImagingError::InvalidImage(format!(
            "image has zero dimension ({}x{})",
            bounds.width, bounds.height
        )));
    }
    validate_envelope(envelope)?;

    let raw_scale = scale_down_factor(bounds.as_tuple(), envelope);
    let sample_size = nearest_sample_size(raw_scale);

    Ok(ScalePlan {
        sample_size,
        residual_scale: raw_scale / sample_size as f64,
        rotation: orientation,
    })
}

/// Dimensions of a buffer decoded at `1/sample_size` resolution.
///
/// Rounds up, matching DCT-scaled JPEG output: a 1001px edge at 1/2 yields 501px.
pub fn subsampled_dimensions(dims: (u32, u32), sample_size: u32) -> (u32, u32) {
    let (w, h) = dims;
    let s = sample_size.max(1);
    (w.div_ceil(s).max(1), h.div_ceil(s).max(1))
}

/// Dimensions after applying a plan's rotation, then its residual scale.
pub fn transformed_dimensions(decoded: (u32, u32), plan: &ScalePlan) -> (u32, u32) {
    let (w, h) = if plan.rotation.swaps_axes() {
        (decoded.1, decoded.0)
    } else {
        decoded
    };

    if plan.residual_scale <= 1.0 {
        return (w, h);
    }
    (
        scale_edge(w, plan.residual_scale),
        scale_edge(h, plan.residual_scale),
    )
}

/// What the finalize step must do to a rendered buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resample {
    /// Already within the envelope.
    Keep,
    /// Larger than the max envelope; shrink to `width`x`height`.
    Shrink { width: u32, height: u32 },
    /// Under the min envelope; grow to `width`x`height`.
    ScaleUp { width: u32, height: u32 },
}

impl Resample {
    /// Output dimensions once this decision is applied to `dims`.
    pub fn output_dimensions(&self, dims: (u32, u32)) -> (u32, u32) {
        match *self {
            Resample::Keep => dims,
            Resample::Shrink { width, height } | Resample::ScaleUp { width, height } => {
                (width, height)
            }
        }
    }
}

/// Decide the final resample for a rendered buffer.
///
/// The min envelope wins: if the buffer is under a set minimum, the binding
/// axis is the one that is under (the larger ratio when both are). Otherwise
/// the buffer is fitted inside the max envelope, which only ever shrinks.
pub fn finalize_resample(dims: (u32, u32), envelope: &Envelope) -> Resample {
    let (w, h) = (dims.0 as f64, dims.1 as f64);

    if envelope.has_min() {
        let width_under = envelope.min_width > 0 && w < envelope.min_width as f64;
        let height_under = envelope.min_height > 0 && h < envelope.min_height as f64;
        if width_under || height_under {
            let width_ratio = w / envelope.min_width as f64;
            let height_ratio = h / envelope.min_height as f64;
            let factor = match (width_under, height_under) {
                (true, false) => width_ratio,
                (false, true) => height_ratio,
                _ => width_ratio.max(height_ratio),
            };
            return Resample::ScaleUp {
                width: scale_edge(dims.0, factor),
                height: scale_edge(dims.1, factor),
            };
        }
    }

    let factor = (w / envelope.max_width).max(h / envelope.max_height);
    if factor > 1.0 {
        let (width, height) = (scale_edge(dims.0, factor), scale_edge(dims.1, factor));
        // Overshoot below half a pixel rounds back to the same size
        if (width, height) != dims {
            return Resample::Shrink { width, height };
        }
    }
    Resample::Keep
}

fn scale_edge(edge: u32, factor: f64) -> u32 {
    (edge as f64 / factor).round().max(1.0) as u32
}
