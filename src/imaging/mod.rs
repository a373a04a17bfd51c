//! Image pipeline: probe → plan → render → finalize.
//!
//! | Stage | Crate / function |
//! |---|---|
//! | **Probe** | `image::ImageReader::into_dimensions` (header only) |
//! | **Orientation** | `image::ImageDecoder::orientation` (EXIF) |
//! | **Decode** | `jpeg_decoder` DCT scaling, `image` decoders otherwise |
//! | **Rotate + residual** | `rotate90/180/270` + `resize_exact` (Triangle) |
//! | **Finalize** | `resize_exact` (Lanczos3) + `JpegEncoder` |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for scale and dimension math (unit testable)
//! - **Parameters**: Data structures flowing between stages
//! - **Source**: Re-openable handles over files or in-memory bytes
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Transform**: Pixel-space rotation and resampling
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
pub mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;
mod source;
mod transform;

pub use backend::{ImageBackend, ImagingError};
pub use calculations::Resample;
pub use operations::{
    OptimizedImage, SourceInfo, finalize, inspect, optimize, plan, probe, read_orientation, render,
};
pub use params::{
    Bounds, Envelope, OptimizeSettings, Orientation, OutputTarget, Quality, ScalePlan,
};
pub use rust_backend::{RustBackend, supported_input_extensions};
pub use source::{ImageSource, SourceReader};
