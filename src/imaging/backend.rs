//! Image codec backend trait and the pipeline's error type.
//!
//! The [`ImageBackend`] trait covers the four codec operations the pipeline
//! needs: identify (header-only bounds), read_orientation, decode (subsampled)
//! and encode_jpeg. Everything between decode and encode (rotation, residual
//! scale, final resample) is plain pixel math in [`transform`](super::transform)
//! and does not belong to a backend.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend): pure Rust, statically
//! linked, no system codecs.

use super::params::{Bounds, Orientation, Quality};
use super::source::ImageSource;
use image::{DynamicImage, ImageResult};
use std::io::Write;
use std::path::PathBuf;
use thiserror::Error;

/// Every way an optimize call can fail. No stage retries; the first error aborts the call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ImagingError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Invalid image: {0}")]
    InvalidImage(String),
    #[error("Failed to decode {origin}: {reason}")]
    Decode { origin: String, reason: String },
    #[error("Failed to encode {}: {reason}", path.display())]
    Encode { path: PathBuf, reason: String },
}

/// Trait for image codec backends.
///
/// Implementations must be `Sync`: the batch driver shares one backend across
/// rayon workers.
pub trait ImageBackend: Sync {
    /// Read intrinsic dimensions from the header without decoding pixels.
    fn identify(&self, source: &ImageSource) -> Result<Bounds, ImagingError>;

    /// Read the EXIF orientation tag. Callers treat failure as `Normal`.
    fn read_orientation(&self, source: &ImageSource) -> Result<Orientation, ImagingError>;

    /// Decode pixels at `1/sample_size` resolution (rounded up per axis).
    fn decode(&self, source: &ImageSource, sample_size: u32) -> Result<DynamicImage, ImagingError>;

    /// Compress `image` as JPEG into `out`.
    fn encode_jpeg(
        &self,
        image: &DynamicImage,
        quality: Quality,
        out: &mut dyn Write,
    ) -> ImageResult<()>;
}
