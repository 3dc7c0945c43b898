//! `biasgrid`: label ratio → single-qubit bias → shuffled color grid.
//!
//! A run takes one labeled dataset, measures how often its labels say
//! "abnormal", encodes the remaining "normal" share as the bias of one
//! simulated qubit, measures that qubit a fixed number of times, and spreads
//! the measured frequencies over an `N × N` grid of colored cells.
//!
//! **Stages** (all synchronous, run once, in order):
//! - [`DatasetLocator`] / [`select_label_file`]: resolve `owner/slug` to a local
//!   directory (kagglehub cache, own cache, or a one-shot download) and pick a
//!   `y_*.npy` label file.
//! - [`LabelArray`]: read the `.npy` array.
//! - [`estimate_bias`]: `(probNormal, probAbnormal)` from the labels.
//! - [`RotationAngle`] / [`QubitSampler`]: `θ = 2·acos(√p)` with explicit
//!   boundary branches, then one Ry-rotated qubit measured per shot.
//! - [`map_counts_to_grid`]: floor the normal share of `N²`, give the remainder to
//!   abnormal, shuffle, lay out row-major.
//! - [`TerminalRenderer`]: draw the grid.
//!
//! [`pipeline::run`] strings these together. Acquisition failures are recovered
//! with a default estimate and reported as [`BiasSource::Default`]; everything
//! else is an error.
//!
//! **Determinism:** every random choice (label file, measurements, shuffle)
//! goes through an injected `rand::Rng`, so a seed reproduces a run.
//!
//! **Non-goals:**
//! - No multi-qubit circuits and no statistics beyond raw counts.
//! - No retries, no persistence beyond the download cache, no concurrency.

#![forbid(unsafe_code)]

mod error;
pub use error::*;

mod labels;
pub use labels::*;

mod bias;
pub use bias::*;

mod sampler;
pub use sampler::*;

mod grid;
pub use grid::*;

mod dataset;
pub use dataset::*;

mod render;
pub use render::*;

pub mod pipeline;
pub use pipeline::{PipelineConfig, RunReport};
