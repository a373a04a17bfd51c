//! Pure Rust codec backend, no system libraries.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `image::ImageReader::into_dimensions` (header only) |
//! | Orientation | `image::ImageDecoder::orientation` (EXIF, no pixel decode) |
//! | Decode JPEG (8-bit RGB/gray) | `jpeg_decoder::Decoder::scale` (DCT-domain 1/2, 1/4, 1/8) |
//! | Decode other formats | `image` crate decoders + `thumbnail_exact` area reduction |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` |
//!
//! DCT scaling is what keeps peak memory bounded for camera photos: a 4000x3000
//! JPEG planned at sample size 4 is only ever materialized as 1000x750.

use super::backend::{ImageBackend, ImagingError};
use super::calculations::subsampled_dimensions;
use super::params::{Bounds, Orientation, Quality};
use super::source::ImageSource;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GrayImage, ImageDecoder, ImageFormat, ImageReader, ImageResult, RgbImage};
use std::io::Write;
use tracing::debug;

/// Largest subsampling the JPEG decoder can do natively (1/8).
const MAX_DCT_SCALE: u32 = 8;

/// Extensions whose decoders are compiled in.
const PHOTO_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
];

/// Returns the image file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> Vec<&'static str> {
    PHOTO_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
}

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Open a source with its format sniffed from the leading bytes.
fn open_reader(
    source: &ImageSource,
) -> Result<ImageReader<super::source::SourceReader>, ImagingError> {
    ImageReader::new(source.open()?)
        .with_guessed_format()
        .map_err(|e| source.decode_error(e))
}

/// Decode a JPEG with DCT scaling.
///
/// Returns `Ok(None)` for pixel formats the scaled path does not cover
/// (16-bit gray, CMYK); the caller falls back to the generic decoder.
fn decode_jpeg_scaled(
    source: &ImageSource,
    sample_size: u32,
) -> Result<Option<DynamicImage>, ImagingError> {
    use jpeg_decoder::PixelFormat;

    let mut decoder = jpeg_decoder::Decoder::new(source.open()?);
    decoder.read_info().map_err(|e| source.decode_error(e))?;
    let info = decoder
        .info()
        .ok_or_else(|| source.decode_error("missing JPEG frame header"))?;

    if !matches!(info.pixel_format, PixelFormat::RGB24 | PixelFormat::L8) {
        return Ok(None);
    }

    let dct_scale = sample_size.clamp(1, MAX_DCT_SCALE);
    let (width, height) = if dct_scale > 1 {
        let (rw, rh) =
            subsampled_dimensions((info.width as u32, info.height as u32), dct_scale);
        decoder
            .scale(rw as u16, rh as u16)
            .map_err(|e| source.decode_error(e))?
    } else {
        (info.width, info.height)
    };

    let pixels = decoder.decode().map_err(|e| source.decode_error(e))?;
    let (width, height) = (width as u32, height as u32);
    let decoded = match info.pixel_format {
        PixelFormat::RGB24 => {
            RgbImage::from_raw(width, height, pixels).map(DynamicImage::ImageRgb8)
        }
        _ => GrayImage::from_raw(width, height, pixels).map(DynamicImage::ImageLuma8),
    }
    .ok_or_else(|| source.decode_error("JPEG pixel buffer size mismatch"))?;

    debug!(
        source = %source.describe(),
        width,
        height,
        dct_scale,
        "decoded JPEG with DCT scaling"
    );

    // Beyond 1/8 the decoder cannot go further; reduce the rest in pixel space
    Ok(Some(reduce(decoded, sample_size / dct_scale)))
}

/// Full decode through the `image` crate, then area-reduce by `sample_size`.
fn decode_generic(source: &ImageSource, sample_size: u32) -> Result<DynamicImage, ImagingError> {
    let decoded = open_reader(source)?
        .decode()
        .map_err(|e| source.decode_error(e))?;
    debug!(
        source = %source.describe(),
        width = decoded.width(),
        height = decoded.height(),
        sample_size,
        "decoded at full resolution"
    );
    Ok(reduce(decoded, sample_size))
}

/// Shrink by an integer factor with area averaging. Consumes the input so the
/// larger buffer is released as soon as the reduced one exists.
fn reduce(image: DynamicImage, factor: u32) -> DynamicImage {
    if factor <= 1 {
        return image;
    }
    let (w, h) = subsampled_dimensions((image.width(), image.height()), factor);
    image.thumbnail_exact(w, h)
}

impl ImageBackend for RustBackend {
    fn identify(&self, source: &ImageSource) -> Result<Bounds, ImagingError> {
        let (width, height) = open_reader(source)?
            .into_dimensions()
            .map_err(|e| source.decode_error(e))?;
        Ok(Bounds { width, height })
    }

    fn read_orientation(&self, source: &ImageSource) -> Result<Orientation, ImagingError> {
        let mut decoder = open_reader(source)?
            .into_decoder()
            .map_err(|e| source.decode_error(e))?;
        let orientation = decoder
            .orientation()
            .map_err(|e| source.decode_error(e))?;
        Ok(Orientation::from(orientation))
    }

    fn decode(&self, source: &ImageSource, sample_size: u32) -> Result<DynamicImage, ImagingError> {
        if open_reader(source)?.format() == Some(ImageFormat::Jpeg) {
            match decode_jpeg_scaled(source, sample_size) {
                Ok(Some(image)) => return Ok(image),
                Ok(None) => debug!(
                    source = %source.describe(),
                    "JPEG pixel format not DCT-scalable, using generic decoder"
                ),
                Err(e) => debug!(
                    source = %source.describe(),
                    error = %e,
                    "scaled JPEG decode failed, using generic decoder"
                ),
            }
        }
        decode_generic(source, sample_size)
    }

    fn encode_jpeg(
        &self,
        image: &DynamicImage,
        quality: Quality,
        out: &mut dyn Write,
    ) -> ImageResult<()> {
        let encoder = JpegEncoder::new_with_quality(out, quality.encoder_value());
        match image {
            DynamicImage::ImageRgb8(_) | DynamicImage::ImageLuma8(_) => {
                image.write_with_encoder(encoder)
            }
            // JPEG has no alpha and no 16-bit mode
            other => DynamicImage::ImageRgb8(other.to_rgb8()).write_with_encoder(encoder),
        }
    }
}
