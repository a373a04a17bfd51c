//! Parallel optimization of many sources.
//!
//! Each source is an independent optimize call; they share nothing but the
//! backend (which is `Sync`) and the output directory (where unique names keep
//! them apart). Work runs on a dedicated rayon pool sized from
//! [`ProcessingConfig`](crate::config::ProcessingConfig), so a host application
//! keeps its own global pool untouched.
//!
//! Progress is reported over an optional channel: one [`BatchEvent::Started`],
//! then one [`BatchEvent::ImageFinished`] per source in completion order. The
//! returned [`BatchReport`] lists results in input order. A failed source does
//! not stop the others.

use crate::config::{ConfigError, OptimizerConfig, effective_threads};
use crate::imaging::{
    ImageBackend, ImageSource, ImagingError, OptimizeSettings, OptimizedImage, RustBackend,
    optimize,
};
use rayon::prelude::*;
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum BatchError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Progress reported while a batch runs.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchEvent {
    Started {
        total: usize,
    },
    ImageFinished {
        /// Position of the source in the input slice.
        index: usize,
        source: String,
        outcome: Result<OptimizedImage, ImagingError>,
    },
}

/// Per-source results, in input order.
#[derive(Debug)]
pub struct BatchReport {
    pub results: Vec<Result<OptimizedImage, ImagingError>>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }

    /// Combined size of every produced file.
    pub fn total_output_bytes(&self) -> u64 {
        self.results
            .iter()
            .filter_map(|r| r.as_ref().ok())
            .map(|image| image.file_size_bytes)
            .sum()
    }
}

/// Optimize `sources` in parallel with the production backend.
pub fn optimize_batch(
    sources: &[ImageSource],
    config: &OptimizerConfig,
    events: Option<Sender<BatchEvent>>,
) -> Result<BatchReport, BatchError> {
    optimize_batch_with_backend(&RustBackend::new(), sources, config, events)
}

/// Optimize `sources` in parallel using a specific backend (allows testing with mock).
pub fn optimize_batch_with_backend(
    backend: &impl ImageBackend,
    sources: &[ImageSource],
    config: &OptimizerConfig,
    events: Option<Sender<BatchEvent>>,
) -> Result<BatchReport, BatchError> {
    let settings = OptimizeSettings::from_config(config)?;
    let threads = effective_threads(&config.processing);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()?;

    info!(total = sources.len(), threads, "starting batch");
    emit(&events, BatchEvent::Started {
        total: sources.len(),
    });

    let results: Vec<_> = pool.install(|| {
        sources
            .par_iter()
            .enumerate()
            .map(|(index, source)| {
                let outcome = optimize(backend, source, &settings);
                if let Err(e) = &outcome {
                    warn!(index, source = %source.describe(), error = %e, "batch item failed");
                }
                emit(&events, BatchEvent::ImageFinished {
                    index,
                    source: source.describe(),
                    outcome: outcome.clone(),
                });
                outcome
            })
            .collect()
    });

    let report = BatchReport { results };
    info!(
        succeeded = report.succeeded(),
        failed = report.failed(),
        "batch complete"
    );
    Ok(report)
}

/// Send an event if anyone is listening. A dropped receiver is not an error.
fn emit(events: &Option<Sender<BatchEvent>>, event: BatchEvent) {
    if let Some(tx) = events {
        let _ = tx.send(event);
    }
}
