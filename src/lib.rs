//! # Photo Slim
//!
//! Turns a picked photo into an upload-ready JPEG: shrunk to fit a caller's
//! box, rotated upright from its EXIF orientation, and re-encoded at a chosen
//! quality. Peak memory stays close to the *output* size, not the source size,
//! because large sources are never decoded at full resolution.
//!
//! # Architecture: Three-Stage Pipeline
//!
//! Every optimize call runs the same stages, each producing an immutable value
//! the next one consumes:
//!
//! ```text
//! 1. Probe     source            →  Bounds     (header only, no pixels)
//! 2. Plan      Bounds + Envelope →  ScalePlan  (sample size, residual, rotation)
//! 3. Render    ScalePlan         →  JPEG file  (subsampled decode, transform, encode)
//! ```
//!
//! Splitting it this way keeps the arithmetic pure: the planner is a plain
//! function of dimensions, so tests cover it exhaustively without encoding a
//! single image.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | The pipeline: probe, plan, render, finalize, plus the codec backend |
//! | [`storage`] | Atomic placement of produced files and cleanup of old ones |
//! | [`naming`] | `<prefix>_<uuid>.jpg` output name builder and parser |
//! | [`batch`] | Parallel optimization of many sources on a rayon pool |
//! | [`config`] | TOML config loading, validation, and conversion to per-call settings |
//! | [`output`] | Human-readable formatting of results and batch progress |
//!
//! # Design Decisions
//!
//! ## Power-of-Two Decode, Then Residual
//!
//! The downscale factor is split into a power-of-two *sample size*, done inside
//! the JPEG decoder by DCT scaling, and a residual in `[1, 2)` done in pixel
//! space. A 12 MP photo bound for a 1280px box is decoded at 1/2 and then
//! shrunk by ~1.17, so the full-resolution buffer never exists.
//!
//! ## JPEG-Only Output
//!
//! Every produced file is a baseline JPEG. It is what upload endpoints accept
//! without negotiation, and one format keeps the output contract to a name
//! pattern and a quality knob.
//!
//! ## Pure-Rust Codecs
//!
//! Decoding and encoding use the `image` and `jpeg-decoder` crates. No system
//! libraries, nothing to install.
//!
//! ## Atomic Output
//!
//! Files are encoded into a temp file in the output directory and renamed into
//! place. A failure at any stage leaves nothing behind under an output name.
//!
//! ## Caller Owns Produced Files
//!
//! Each call writes a new uniquely named file and never touches it again.
//! [`imaging::OptimizedImage::delete`] removes one; [`storage::purge_outputs`]
//! removes every file under a prefix.
//!
//! # Logging
//!
//! The crate emits [`tracing`] events and installs no subscriber; attach one
//! in the host application to see them.

pub mod batch;
pub mod config;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod storage;
