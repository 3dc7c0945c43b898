//! End-to-end run: acquire → estimate → sample → grid.
//!
//! Acquisition and label loading failures are recovered with the configured
//! fallback estimate and recorded as [`BiasSource::Default`]. Estimator,
//! sampler and mapper errors are returned to the caller.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{info, warn};

use crate::bias::{estimate_bias, BiasEstimate, BiasSource};
use crate::dataset::{select_label_file, DatasetHandle, DatasetLocator};
use crate::error::Result;
use crate::grid::{map_counts_to_grid, ColorGrid};
use crate::labels::LabelArray;
use crate::sampler::{OutcomeCounts, OutcomeSampler, QubitSampler, RotationAngle};

pub const DEFAULT_DATASET: &str = "orvile/mhsma-sperm-morphology-analysis-dataset";
pub const DEFAULT_LABEL_FILE: &str = "y_head_train.npy";
pub const DEFAULT_SHOTS: u64 = 1000;
pub const DEFAULT_GRID_SIZE: usize = 25;
pub const DEFAULT_FALLBACK_PROB_NORMAL: f64 = 0.5;

/// Pipeline configuration.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PipelineConfig {
    /// Dataset handle, `owner/slug`.
    pub dataset: String,
    /// Label file to prefer; `None` picks a random `y_*.npy`.
    pub preferred_label_file: Option<String>,
    /// Number of simulated measurements.
    pub shots: u64,
    /// Grid side length `N` (the grid has `N²` cells).
    pub grid_size: usize,
    /// probNormal used when no label data can be obtained.
    pub fallback_prob_normal: f64,
    /// Seed for file choice, sampling and shuffling; `None` uses OS entropy.
    pub seed: Option<u64>,
    pub locator: DatasetLocator,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            dataset: DEFAULT_DATASET.to_string(),
            preferred_label_file: Some(DEFAULT_LABEL_FILE.to_string()),
            shots: DEFAULT_SHOTS,
            grid_size: DEFAULT_GRID_SIZE,
            fallback_prob_normal: DEFAULT_FALLBACK_PROB_NORMAL,
            seed: None,
            locator: DatasetLocator::default(),
        }
    }
}

impl PipelineConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_shots(mut self, shots: u64) -> Self {
        self.shots = shots;
        self
    }

    pub fn with_grid_size(mut self, grid_size: usize) -> Self {
        self.grid_size = grid_size;
        self
    }

    pub fn with_locator(mut self, locator: DatasetLocator) -> Self {
        self.locator = locator;
        self
    }

    pub fn with_preferred_label_file(mut self, name: Option<String>) -> Self {
        self.preferred_label_file = name;
        self
    }

    pub fn with_fallback_prob_normal(mut self, p: f64) -> Self {
        self.fallback_prob_normal = p;
        self
    }
}

/// Everything a run produced.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RunReport {
    pub source: BiasSource,
    pub estimate: BiasEstimate,
    pub angle: RotationAngle,
    pub counts: OutcomeCounts,
    pub grid: ColorGrid,
}

/// Acquire labels and estimate the bias, falling back on acquisition failure.
pub fn acquire_estimate<R: Rng + ?Sized>(
    cfg: &PipelineConfig,
    rng: &mut R,
) -> Result<(BiasEstimate, BiasSource)> {
    let loaded = DatasetHandle::parse(&cfg.dataset)
        .and_then(|handle| cfg.locator.resolve(&handle))
        .and_then(|root| select_label_file(&root, cfg.preferred_label_file.as_deref(), rng))
        .and_then(|path| {
            info!(path = %path.display(), "loading labels");
            LabelArray::load(&path).map(|labels| (path, labels))
        });

    match loaded {
        Ok((path, labels)) => {
            let estimate = estimate_bias(&labels)?;
            info!(labels = labels.len(), %estimate, "bias measured");
            Ok((
                estimate,
                BiasSource::Measured {
                    path,
                    labels: labels.len(),
                },
            ))
        }
        Err(e) if e.is_recoverable() => {
            let estimate = BiasEstimate::from_prob_normal(cfg.fallback_prob_normal)?;
            warn!(error = %e, %estimate, "using default bias");
            Ok((
                estimate,
                BiasSource::Default {
                    reason: e.to_string(),
                },
            ))
        }
        Err(e) => Err(e),
    }
}

/// Sample an estimate and lay the counts out on a grid.
pub fn sample_to_grid<S, R>(
    estimate: &BiasEstimate,
    shots: u64,
    grid_size: usize,
    sampler: &mut S,
    rng: &mut R,
) -> Result<(RotationAngle, OutcomeCounts, ColorGrid)>
where
    S: OutcomeSampler + ?Sized,
    R: Rng + ?Sized,
{
    let angle = RotationAngle::from_prob_normal(estimate.prob_normal())?;
    let counts = sampler.sample(angle, shots)?;
    info!(
        theta = angle.radians(),
        normal = counts.normal(),
        abnormal = counts.abnormal(),
        "sampled"
    );
    let grid = map_counts_to_grid(&counts, grid_size, rng)?;
    Ok((angle, counts, grid))
}

/// Run the whole pipeline with [`QubitSampler`].
pub fn run(cfg: &PipelineConfig) -> Result<RunReport> {
    let mut rng = match cfg.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut sampler = QubitSampler::new(StdRng::seed_from_u64(rng.gen()));
    run_with(cfg, &mut sampler, &mut rng)
}

/// Run the whole pipeline with a caller-provided sampler and RNG.
pub fn run_with<S, R>(cfg: &PipelineConfig, sampler: &mut S, rng: &mut R) -> Result<RunReport>
where
    S: OutcomeSampler + ?Sized,
    R: Rng + ?Sized,
{
    let (estimate, source) = acquire_estimate(cfg, rng)?;
    let (angle, counts, grid) = sample_to_grid(&estimate, cfg.shots, cfg.grid_size, sampler, rng)?;
    Ok(RunReport {
        source,
        estimate,
        angle,
        counts,
        grid,
    })
}
