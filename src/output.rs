//! Human-readable formatting of pipeline results.
//!
//! # Output Format
//!
//! ## Inspect
//!
//! ```text
//! IMG_2041.jpg
//!     Bounds: 4000x3000
//!     Orientation: 90°
//!     Size: 3412 KB
//! ```
//!
//! ## Batch
//!
//! ```text
//! Optimizing 3 images
//! 002 IMG_2042.jpg → optimized_67e55044-….jpg (1280x960, 188 KB)
//! 001 IMG_2041.jpg → optimized_3f2b09c1-….jpg (960x1280, 174 KB)
//! 003 broken.jpg failed: Failed to decode /photos/broken.jpg: …
//! Optimized 2 of 3 images, 362 KB total
//! ```
//!
//! Batch lines arrive in completion order; the positional index ties each line
//! back to its source.
//!
//! # Architecture
//!
//! Format functions are pure: no I/O, no side effects. The host decides where
//! the lines go.

use crate::batch::{BatchEvent, BatchReport};
use crate::imaging::{Bounds, SourceInfo};
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// File name of a path-like string, or the whole string if it has none.
fn display_name(source: &str) -> String {
    Path::new(source)
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| source.to_string())
}

/// `"{width}x{height}"`.
pub fn format_dimensions(bounds: Bounds) -> String {
    format!("{}x{}", bounds.width, bounds.height)
}

/// Whole kilobytes, rounded down: `"154 KB"`.
pub fn format_size(bytes: u64) -> String {
    format!("{} KB", bytes / 1024)
}

/// Describe a source before optimization.
pub fn format_source_info(source: &str, info: &SourceInfo) -> Vec<String> {
    vec![
        display_name(source),
        format!("    Bounds: {}", format_dimensions(info.bounds)),
        format!("    Orientation: {}°", info.orientation.degrees()),
        format!("    Size: {}", format_size(info.file_size_bytes)),
    ]
}

/// Format a single batch progress event as one display line.
pub fn format_batch_event(event: &BatchEvent) -> String {
    match event {
        BatchEvent::Started { total } => match total {
            1 => "Optimizing 1 image".to_string(),
            n => format!("Optimizing {} images", n),
        },
        BatchEvent::ImageFinished {
            index,
            source,
            outcome,
        } => {
            let head = format!("{} {}", format_index(index + 1), display_name(source));
            match outcome {
                Ok(image) => format!(
                    "{} → {} ({}, {})",
                    head,
                    display_name(&image.path.to_string_lossy()),
                    format_dimensions(image.final_bounds),
                    format_size(image.file_size_bytes)
                ),
                Err(e) => format!("{} failed: {}", head, e),
            }
        }
    }
}

/// Closing line for a finished batch.
pub fn format_batch_summary(report: &BatchReport) -> String {
    format!(
        "Optimized {} of {} images, {} total",
        report.succeeded(),
        report.results.len(),
        format_size(report.total_output_bytes())
    )
}
