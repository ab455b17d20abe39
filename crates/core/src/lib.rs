//! NOTONOTO font composition.
//!
//! Combines an ideographic source and a Latin source into a monospaced pair
//! per weight: arbitration of shared codepoints, the width grid, supplemental
//! symbols and per-variant metadata.

pub mod arbitration;
pub mod config;
pub mod geometry;
pub mod io;
pub mod metadata;
pub mod naming;
pub mod pipeline;
pub mod sanitize;
pub mod styles;
pub mod supplemental;

pub use config::{BuildConfig, Modifiers};
pub use pipeline::{BuildOptions, PipelineContext, build_all, generate_variant};
pub use styles::Weight;
