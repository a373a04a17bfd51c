//! High-level pipeline operations.
//!
//! These functions combine the pure calculations with backend execution:
//! probe → plan → render → finalize. [`optimize`] runs all four for one source.
//! Everything is generic over [`ImageBackend`] so the whole pipeline is testable
//! with the mock backend.

use super::backend::{ImageBackend, ImagingError};
use super::calculations::{Resample, finalize_resample, plan_scale, validate_envelope};
use super::params::{
    Bounds, Envelope, OptimizeSettings, Orientation, OutputTarget, Quality, ScalePlan,
};
use super::source::ImageSource;
use super::transform::{apply_plan, resample};
use crate::storage::write_output;
use image::DynamicImage;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, info};

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, ImagingError>;

/// Read intrinsic dimensions without decoding pixels.
///
/// A header that reports a zero-length edge is rejected here rather than left
/// for the planner to divide by.
pub fn probe(backend: &impl ImageBackend, source: &ImageSource) -> Result<Bounds> {
    let bounds = backend.identify(source)?;
    if bounds.width == 0 || bounds.height == 0 {
        return Err(ImagingError::InvalidImage(format!(
            "{} reports zero dimension ({}x{})",
            source.describe(),
            bounds.width,
            bounds.height
        )));
    }
    debug!(source = %source.describe(), width = bounds.width, height = bounds.height, "probed");
    Ok(bounds)
}

/// Best-effort EXIF orientation. Any failure reads as `Normal`.
pub fn read_orientation(backend: &impl ImageBackend, source: &ImageSource) -> Orientation {
    match backend.read_orientation(source) {
        Ok(orientation) => orientation,
        Err(e) => {
            debug!(
                source = %source.describe(),
                error = %e,
                "orientation unreadable, assuming normal"
            );
            Orientation::Normal
        }
    }
}

/// What a source looks like before any work is done on it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SourceInfo {
    pub bounds: Bounds,
    pub orientation: Orientation,
    pub file_size_bytes: u64,
}

/// Probe bounds, orientation and encoded size in one call.
pub fn inspect(backend: &impl ImageBackend, source: &ImageSource) -> Result<SourceInfo> {
    Ok(SourceInfo {
        bounds: probe(backend, source)?,
        orientation: read_orientation(backend, source),
        file_size_bytes: source.byte_len()?,
    })
}

/// Plan how to decode `source` so it lands inside `envelope`.
pub fn plan(
    backend: &impl ImageBackend,
    source: &ImageSource,
    bounds: Bounds,
    envelope: &Envelope,
) -> Result<ScalePlan> {
    let orientation = read_orientation(backend, source);
    let plan = plan_scale(bounds, envelope, orientation)?;
    debug!(
        source = %source.describe(),
        sample_size = plan.sample_size,
        residual_scale = plan.residual_scale,
        total_scale = plan.total_scale(),
        rotation = plan.rotation.degrees(),
        "planned"
    );
    Ok(plan)
}

/// Decode at the plan's sample size, then rotate and apply the residual scale.
pub fn render(
    backend: &impl ImageBackend,
    source: &ImageSource,
    plan: &ScalePlan,
) -> Result<DynamicImage> {
    let decoded = backend.decode(source, plan.sample_size)?;
    if decoded.width() == 0 || decoded.height() == 0 {
        return Err(source.decode_error("decoder produced an empty buffer"));
    }
    Ok(apply_plan(decoded, plan))
}

/// A compressed image on local storage.
///
/// The caller owns the file; [`OptimizedImage::delete`] removes it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizedImage {
    pub path: PathBuf,
    pub final_bounds: Bounds,
    pub file_size_bytes: u64,
}

impl OptimizedImage {
    /// Remove the produced file.
    pub fn delete(self) -> std::io::Result<()> {
        std::fs::remove_file(&self.path)
    }
}

/// Fit a rendered buffer to the envelope and encode it as JPEG into `output`.
///
/// The envelope is checked again here since callers may finalize a buffer they
/// rendered themselves.
pub fn finalize(
    backend: &impl ImageBackend,
    buffer: DynamicImage,
    envelope: &Envelope,
    quality: Quality,
    output: &OutputTarget,
) -> Result<OptimizedImage> {
    validate_envelope(envelope)?;
    let decision = finalize_resample((buffer.width(), buffer.height()), envelope);
    if decision != Resample::Keep {
        debug!(?decision, "resampling to envelope");
    }
    let image = resample(buffer, decision);
    let final_bounds = Bounds::new(image.width(), image.height());

    let stored = write_output(output, |out| backend.encode_jpeg(&image, quality, out))?;
    Ok(OptimizedImage {
        path: stored.path,
        final_bounds,
        file_size_bytes: stored.size_bytes,
    })
}

/// Run the full pipeline for one source.
///
/// No stage retries; the first failure is returned and nothing is left in the
/// output directory.
pub fn optimize(
    backend: &impl ImageBackend,
    source: &ImageSource,
    settings: &OptimizeSettings,
) -> Result<OptimizedImage> {
    let result = probe(backend, source)
        .and_then(|bounds| plan(backend, source, bounds, &settings.envelope))
        .and_then(|plan| render(backend, source, &plan))
        .and_then(|buffer| {
            finalize(
                backend,
                buffer,
                &settings.envelope,
                settings.quality,
                &settings.output,
            )
        });

    match &result {
        Ok(image) => info!(
            source = %source.describe(),
            path = %image.path.display(),
            width = image.final_bounds.width,
            height = image.final_bounds.height,
            size_bytes = image.file_size_bytes,
            "optimized"
        ),
        Err(e) => debug!(source = %source.describe(), error = %e, "optimize failed"),
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MOCK_JPEG, MockBackend, RecordedOp};
    use tempfile::TempDir;

    fn settings(dir: &TempDir, envelope: Envelope) -> OptimizeSettings {
        OptimizeSettings {
            envelope,
            quality: Quality::new(80),
            output: OutputTarget {
                directory: dir.path().to_path_buf(),
                prefix: "optimized".into(),
            },
        }
    }

    fn decode_sample_size(backend: &MockBackend) -> Option<u32> {
        backend.get_operations().iter().find_map(|op| match op {
            RecordedOp::Decode { sample_size, .. } => Some(*sample_size),
            _ => None,
        })
    }

    fn file_count(dir: &TempDir) -> usize {
        std::fs::read_dir(dir.path()).unwrap().count()
    }

    #[test]
    fn probe_calls_backend() {
        let backend = MockBackend::with_bounds(800, 600);
        let bounds = probe(&backend, &ImageSource::from_path("/a.jpg")).unwrap();
        assert_eq!(bounds, Bounds::new(800, 600));
        assert_eq!(
            backend.get_operations(),
            vec![RecordedOp::Identify("/a.jpg".into())]
        );
    }

    #[test]
    fn probe_rejects_zero_dimension() {
        let backend = MockBackend::with_bounds(0, 600);
        let err = probe(&backend, &ImageSource::from_path("/a.jpg")).unwrap_err();
        assert!(matches!(err, ImagingError::InvalidImage(_)));
    }

    #[test]
    fn orientation_failure_falls_back_to_normal() {
        let backend = MockBackend::with_bounds(10, 10).without_orientation();
        assert_eq!(
            read_orientation(&backend, &ImageSource::from_path("/a.jpg")),
            Orientation::Normal
        );
    }

    #[test]
    fn inspect_reports_size_and_orientation() {
        let backend = MockBackend::with_bounds(4000, 3000).oriented(Orientation::Rotate90);
        let info = inspect(&backend, &ImageSource::from(vec![0u8; 2048])).unwrap();
        assert_eq!(
            info,
            SourceInfo {
                bounds: Bounds::new(4000, 3000),
                orientation: Orientation::Rotate90,
                file_size_bytes: 2048,
            }
        );
    }

    #[test]
    fn plan_uses_orientation_from_backend() {
        let backend = MockBackend::with_bounds(3000, 2000).oriented(Orientation::Rotate180);
        let plan = plan(
            &backend,
            &ImageSource::from_path("/a.jpg"),
            Bounds::new(3000, 2000),
            &Envelope::default(),
        )
        .unwrap();
        assert_eq!(plan.sample_size, 2);
        assert_eq!(plan.rotation, Orientation::Rotate180);
    }

    #[test]
    fn render_swaps_axes_on_quarter_turn() {
        let backend = MockBackend::with_bounds(400, 300);
        let plan = ScalePlan {
            sample_size: 1,
            residual_scale: 1.0,
            rotation: Orientation::Rotate90,
        };
        let buffer = render(&backend, &ImageSource::from_path("/a.jpg"), &plan).unwrap();
        assert_eq!((buffer.width(), buffer.height()), (300, 400));
    }

    #[test]
    fn optimize_landscape_photo() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::with_bounds(3000, 2000);
        let result = optimize(
            &backend,
            &ImageSource::from_path("/photos/a.jpg"),
            &settings(&tmp, Envelope::default()),
        )
        .unwrap();

        assert_eq!(decode_sample_size(&backend), Some(2));
        assert_eq!(result.final_bounds, Bounds::new(1280, 853));
        assert_eq!(result.file_size_bytes, MOCK_JPEG.len() as u64);
        assert_eq!(std::fs::read(&result.path).unwrap(), MOCK_JPEG);
        assert!(result.path.starts_with(tmp.path()));
        assert!(
            backend
                .get_operations()
                .contains(&RecordedOp::Encode {
                    width: 1280,
                    height: 853,
                    quality: 80
                })
        );
    }

    #[test]
    fn optimize_portrait_exif_rotates_output() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::with_bounds(4000, 3000).oriented(Orientation::Rotate90);
        let result = optimize(
            &backend,
            &ImageSource::from_path("/photos/p.jpg"),
            &settings(&tmp, Envelope::default()),
        )
        .unwrap();
        assert_eq!(result.final_bounds, Bounds::new(960, 1280));
    }

    #[test]
    fn optimize_scales_up_to_minimum() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::with_bounds(100, 100);
        let result = optimize(
            &backend,
            &ImageSource::from_path("/icon.png"),
            &settings(&tmp, Envelope::default().with_min(101, 101)),
        )
        .unwrap();
        assert_eq!(decode_sample_size(&backend), Some(1));
        assert_eq!(result.final_bounds, Bounds::new(101, 101));
    }

    #[test]
    fn optimize_cover_policy_fits_max_box() {
        // Fit by the smaller ratio first: 3000x2000 renders at 1920x1280
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::with_bounds(3000, 2000);
        let envelope = Envelope {
            use_max_dimension: false,
            ..Envelope::default()
        };
        let result = optimize(
            &backend,
            &ImageSource::from_path("/photos/wide.jpg"),
            &settings(&tmp, envelope),
        )
        .unwrap();

        assert_eq!(decode_sample_size(&backend), Some(1));
        assert_eq!(result.final_bounds, Bounds::new(1280, 853));
        assert!(result.final_bounds.width <= 1280 && result.final_bounds.height <= 1280);
        assert!(backend.get_operations().contains(&RecordedOp::Encode {
            width: 1280,
            height: 853,
            quality: 80
        }));
    }

    #[test]
    fn finalize_rejects_min_above_max_before_resizing() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::with_bounds(4, 4);
        let envelope = Envelope::default().with_min(4_000_000_000, 4_000_000_000);
        let buffer = DynamicImage::ImageRgb8(image::RgbImage::new(4, 4));

        let err = finalize(
            &backend,
            buffer,
            &envelope,
            Quality::default(),
            &settings(&tmp, envelope).output,
        )
        .unwrap_err();
        assert!(matches!(err, ImagingError::InvalidConfig(_)));
        assert_eq!(file_count(&tmp), 0);
        assert!(backend.get_operations().is_empty());
    }

    #[test]
    fn optimize_small_image_is_untouched() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::with_bounds(640, 480);
        let result = optimize(
            &backend,
            &ImageSource::from_path("/small.jpg"),
            &settings(&tmp, Envelope::default()),
        )
        .unwrap();
        assert_eq!(result.final_bounds, Bounds::new(640, 480));
    }

    #[test]
    fn optimize_decode_failure_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend {
            fail_decode: true,
            ..MockBackend::with_bounds(3000, 2000)
        };
        let err = optimize(
            &backend,
            &ImageSource::from_path("/broken.jpg"),
            &settings(&tmp, Envelope::default()),
        )
        .unwrap_err();
        assert!(matches!(err, ImagingError::Decode { .. }));
        assert_eq!(file_count(&tmp), 0);
    }

    #[test]
    fn optimize_encode_failure_leaves_no_file() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend {
            fail_encode: true,
            ..MockBackend::with_bounds(3000, 2000)
        };
        let err = optimize(
            &backend,
            &ImageSource::from_path("/a.jpg"),
            &settings(&tmp, Envelope::default()),
        )
        .unwrap_err();
        assert!(matches!(err, ImagingError::Encode { .. }));
        assert_eq!(file_count(&tmp), 0);
    }

    #[test]
    fn optimize_invalid_envelope_is_config_error() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::with_bounds(3000, 2000);
        let err = optimize(
            &backend,
            &ImageSource::from_path("/a.jpg"),
            &settings(&tmp, Envelope::max(0.0, 1280.0)),
        )
        .unwrap_err();
        assert!(matches!(err, ImagingError::InvalidConfig(_)));
        assert!(
            !backend
                .get_operations()
                .iter()
                .any(|op| matches!(op, RecordedOp::Decode { .. }))
        );
    }

    #[test]
    fn optimized_image_delete_removes_file() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::with_bounds(50, 50);
        let result = optimize(
            &backend,
            &ImageSource::from_path("/a.jpg"),
            &settings(&tmp, Envelope::default()),
        )
        .unwrap();
        let path = result.path.clone();
        result.delete().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn each_call_produces_a_distinct_file() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::with_bounds(50, 50);
        let settings = settings(&tmp, Envelope::default());
        let a = optimize(&backend, &ImageSource::from_path("/a.jpg"), &settings).unwrap();
        let b = optimize(&backend, &ImageSource::from_path("/a.jpg"), &settings).unwrap();
        assert_ne!(a.path, b.path);
        assert_eq!(file_count(&tmp), 2);
    }
}
