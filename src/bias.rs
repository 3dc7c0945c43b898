//! Bias estimation: label array → (probNormal, probAbnormal).

use std::fmt;
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::labels::LabelArray;

/// Probability pair with `prob_abnormal == 1 - prob_normal`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BiasEstimate {
    prob_normal: f64,
    prob_abnormal: f64,
}

impl BiasEstimate {
    /// Build an estimate from the probability of the normal outcome.
    ///
    /// Rejects non-finite values and anything outside `[0, 1]`.
    pub fn from_prob_normal(prob_normal: f64) -> Result<Self> {
        if !prob_normal.is_finite() || !(0.0..=1.0).contains(&prob_normal) {
            return Err(Error::invalid(format!(
                "probability of normal must be in [0, 1], got {prob_normal}"
            )));
        }
        Ok(Self {
            prob_normal,
            prob_abnormal: 1.0 - prob_normal,
        })
    }

    /// The even split used when no data is available.
    pub fn uniform() -> Self {
        Self {
            prob_normal: 0.5,
            prob_abnormal: 0.5,
        }
    }

    pub fn prob_normal(&self) -> f64 {
        self.prob_normal
    }

    pub fn prob_abnormal(&self) -> f64 {
        self.prob_abnormal
    }
}

impl fmt::Display for BiasEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Normal: {:.2}, Abnormal: {:.2}",
            self.prob_normal, self.prob_abnormal
        )
    }
}

/// Where an estimate came from.
///
/// A `Default` estimate is synthetic; consumers that care can tell it apart
/// from one measured on real labels.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BiasSource {
    /// Measured from a label file.
    Measured { path: PathBuf, labels: usize },
    /// Caller-supplied default after acquisition failed.
    Default { reason: String },
}

impl BiasSource {
    pub fn is_measured(&self) -> bool {
        matches!(self, BiasSource::Measured { .. })
    }
}

/// Reduce a label array to a [`BiasEstimate`].
///
/// `prob_abnormal` is the share of entries equal to `1`; everything else
/// counts toward `prob_normal`. Fails with [`Error::InvalidInput`] on an
/// empty array.
pub fn estimate_bias(labels: &LabelArray) -> Result<BiasEstimate> {
    if labels.is_empty() {
        return Err(Error::invalid("label array is empty"));
    }
    let prob_abnormal = labels.abnormal_count() as f64 / labels.len() as f64;
    Ok(BiasEstimate {
        prob_normal: 1.0 - prob_abnormal,
        prob_abnormal,
    })
}
