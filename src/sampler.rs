//! Single-qubit outcome sampling.
//!
//! The bias `p = probNormal` is encoded as an Ry rotation of |0⟩:
//!
//! ```text
//!   Ry(θ)|0⟩ = cos(θ/2)|0⟩ + sin(θ/2)|1⟩,   θ = 2·acos(√p)
//! ```
//!
//! so measuring in the computational basis yields `0` ("normal") with
//! probability `cos²(θ/2) = p`. Both ends of `[0, 1]` are handled by explicit
//! branches; `acos` is only evaluated strictly inside the interval.
//!
//! Notes:
//! - [`QubitSampler`] is **seedable** so runs can be reproduced in tests.
//! - [`OutcomeSampler`] is the seam for any other two-outcome simulator.

use std::collections::BTreeMap;
use std::f64::consts::PI;
use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Bernoulli, Distribution};

use crate::error::{Error, Result};

/// One of the two measurement outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Outcome {
    /// Bit `0`.
    Normal,
    /// Bit `1`.
    Abnormal,
}

impl Outcome {
    pub const ALL: [Outcome; 2] = [Outcome::Normal, Outcome::Abnormal];

    /// Measurement bitstring key, as simulators report it.
    pub fn bit(self) -> &'static str {
        match self {
            Outcome::Normal => "0",
            Outcome::Abnormal => "1",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Outcome::Normal => "normal",
            Outcome::Abnormal => "abnormal",
        }
    }

    /// Accepts either a bitstring key (`"0"`/`"1"`) or a label.
    pub fn parse(key: &str) -> Option<Self> {
        match key {
            "0" | "normal" => Some(Outcome::Normal),
            "1" | "abnormal" => Some(Outcome::Abnormal),
            _ => None,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Frequency counts over exactly two outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OutcomeCounts {
    normal: u64,
    abnormal: u64,
}

impl OutcomeCounts {
    pub fn new(normal: u64, abnormal: u64) -> Self {
        Self { normal, abnormal }
    }

    /// Build counts from simulator-style `(key, count)` pairs.
    ///
    /// Keys may be bitstrings or labels; repeated keys accumulate and a
    /// missing key counts as zero. Any other key is rejected, as is a total
    /// that does not fit in `u64`.
    pub fn from_keyed<I, K>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, u64)>,
        K: AsRef<str>,
    {
        let mut out = Self::default();
        for (key, n) in pairs {
            let key = key.as_ref();
            let slot = match Outcome::parse(key) {
                Some(Outcome::Normal) => &mut out.normal,
                Some(Outcome::Abnormal) => &mut out.abnormal,
                None => return Err(Error::invalid(format!("unknown outcome key {key:?}"))),
            };
            *slot = slot
                .checked_add(n)
                .ok_or_else(|| Error::invalid("outcome count overflows u64"))?;
        }
        out.normal
            .checked_add(out.abnormal)
            .ok_or_else(|| Error::invalid("outcome total overflows u64"))?;
        Ok(out)
    }

    pub fn get(&self, outcome: Outcome) -> u64 {
        match outcome {
            Outcome::Normal => self.normal,
            Outcome::Abnormal => self.abnormal,
        }
    }

    pub fn normal(&self) -> u64 {
        self.normal
    }

    pub fn abnormal(&self) -> u64 {
        self.abnormal
    }

    /// Total trials (saturating).
    pub fn total(&self) -> u64 {
        self.normal.saturating_add(self.abnormal)
    }

    /// Share of trials that came out normal.
    pub fn frac_normal(&self) -> Result<f64> {
        let total = self.total();
        if total == 0 {
            return Err(Error::DivideByZero("outcome counts have zero trials"));
        }
        Ok(self.normal as f64 / total as f64)
    }

    /// Bitstring-keyed map, omitting zero counts.
    pub fn to_bit_map(&self) -> BTreeMap<String, u64> {
        Outcome::ALL
            .iter()
            .filter(|o| self.get(**o) > 0)
            .map(|o| (o.bit().to_string(), self.get(*o)))
            .collect()
    }
}

/// Ry rotation angle in radians, always in `[0, π]`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RotationAngle(f64);

impl RotationAngle {
    /// Map `probNormal` to θ.
    ///
    /// - `p <= 0` → θ = π (always abnormal)
    /// - `p >= 1` → θ = 0 (always normal)
    /// - otherwise θ = 2·acos(√p)
    ///
    /// Non-finite input is [`Error::InvalidInput`].
    pub fn from_prob_normal(prob_normal: f64) -> Result<Self> {
        if !prob_normal.is_finite() {
            return Err(Error::invalid(format!(
                "probability of normal is not finite: {prob_normal}"
            )));
        }
        if prob_normal <= 0.0 {
            return Ok(Self(PI));
        }
        if prob_normal >= 1.0 {
            return Ok(Self(0.0));
        }
        Ok(Self(2.0 * prob_normal.sqrt().acos()))
    }

    pub fn radians(&self) -> f64 {
        self.0
    }

    /// Amplitudes of |0⟩ and |1⟩ after rotating |0⟩ by this angle.
    ///
    /// Exact at the endpoints.
    pub fn amplitudes(&self) -> (f64, f64) {
        if self.0 <= 0.0 {
            (1.0, 0.0)
        } else if self.0 >= PI {
            (0.0, 1.0)
        } else {
            let half = self.0 / 2.0;
            (half.cos(), half.sin())
        }
    }

    /// Probability of measuring `0` (normal).
    pub fn prob_normal(&self) -> f64 {
        let (a0, _) = self.amplitudes();
        (a0 * a0).clamp(0.0, 1.0)
    }
}

/// A two-outcome simulator driven by a rotation angle.
///
/// Implementations must return counts that sum exactly to `shots`.
pub trait OutcomeSampler {
    fn sample(&mut self, angle: RotationAngle, shots: u64) -> Result<OutcomeCounts>;
}

/// Measures a single rotated qubit once per shot.
#[derive(Debug, Clone)]
pub struct QubitSampler<R = StdRng> {
    rng: R,
}

impl QubitSampler<StdRng> {
    /// Reproducible sampler.
    pub fn with_seed(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    /// Sampler seeded from OS entropy.
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng> QubitSampler<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> OutcomeSampler for QubitSampler<R> {
    fn sample(&mut self, angle: RotationAngle, shots: u64) -> Result<OutcomeCounts> {
        let p = angle.prob_normal();
        let measure = Bernoulli::new(p)
            .map_err(|e| Error::invalid(format!("measurement probability {p}: {e}")))?;
        let mut normal = 0u64;
        for _ in 0..shots {
            if measure.sample(&mut self.rng) {
                normal += 1;
            }
        }
        Ok(OutcomeCounts::new(normal, shots - normal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries_take_explicit_branches() {
        let zero = RotationAngle::from_prob_normal(0.0).unwrap();
        assert_eq!(zero.radians(), PI);
        assert_eq!(zero.prob_normal(), 0.0);

        let one = RotationAngle::from_prob_normal(1.0).unwrap();
        assert_eq!(one.radians(), 0.0);
        assert_eq!(one.prob_normal(), 1.0);

        // Slightly out of range collapses onto the same branches.
        assert_eq!(RotationAngle::from_prob_normal(-1e-9).unwrap().radians(), PI);
        assert_eq!(RotationAngle::from_prob_normal(1.0 + 1e-9).unwrap().radians(), 0.0);
    }

    #[test]
    fn non_finite_is_rejected() {
        assert!(RotationAngle::from_prob_normal(f64::NAN).is_err());
        assert!(RotationAngle::from_prob_normal(f64::INFINITY).is_err());
    }

    #[test]
    fn interior_angle_round_trips_probability() {
        for p in [0.01, 0.25, 0.5, 0.75, 0.99] {
            let a = RotationAngle::from_prob_normal(p).unwrap();
            assert!(a.radians() > 0.0 && a.radians() < PI);
            assert!((a.prob_normal() - p).abs() < 1e-12, "p={p}");
        }
        let half = RotationAngle::from_prob_normal(0.5).unwrap();
        assert!((half.radians() - PI / 2.0).abs() < 1e-12);
    }

    #[test]
    fn angle_is_monotone_decreasing_in_p() {
        let mut prev = f64::INFINITY;
        for i in 0..=100 {
            let a = RotationAngle::from_prob_normal(i as f64 / 100.0).unwrap();
            assert!(a.radians() <= prev);
            prev = a.radians();
        }
    }

    #[test]
    fn counts_sum_to_shots() {
        let mut s = QubitSampler::with_seed(7);
        let a = RotationAngle::from_prob_normal(0.3).unwrap();
        for shots in [0u64, 1, 17, 1000] {
            assert_eq!(s.sample(a, shots).unwrap().total(), shots);
        }
    }

    #[test]
    fn extreme_bias_is_deterministic() {
        let mut s = QubitSampler::with_seed(1);
        let never = RotationAngle::from_prob_normal(0.0).unwrap();
        assert_eq!(s.sample(never, 500).unwrap(), OutcomeCounts::new(0, 500));
        let always = RotationAngle::from_prob_normal(1.0).unwrap();
        assert_eq!(s.sample(always, 500).unwrap(), OutcomeCounts::new(500, 0));
    }

    #[test]
    fn same_seed_same_counts() {
        let a = RotationAngle::from_prob_normal(0.6).unwrap();
        let c1 = QubitSampler::with_seed(42).sample(a, 1000).unwrap();
        let c2 = QubitSampler::with_seed(42).sample(a, 1000).unwrap();
        assert_eq!(c1, c2);
    }

    #[test]
    fn keyed_counts_accept_bits_and_labels() {
        let c = OutcomeCounts::from_keyed([("0", 750u64), ("1", 250)]).unwrap();
        assert_eq!(c, OutcomeCounts::new(750, 250));
        let c = OutcomeCounts::from_keyed([("normal", 3u64)]).unwrap();
        assert_eq!(c.get(Outcome::Abnormal), 0);
        assert!(OutcomeCounts::from_keyed([("01", 1u64)]).is_err());
        assert!(OutcomeCounts::from_keyed([("0", u64::MAX), ("1", 1)]).is_err());
    }

    #[test]
    fn frac_normal_guards_zero_trials() {
        let e = OutcomeCounts::new(0, 0).frac_normal().unwrap_err();
        assert!(matches!(e, Error::DivideByZero(_)));
        assert_eq!(OutcomeCounts::new(3, 1).frac_normal().unwrap(), 0.75);
    }

    #[test]
    fn bit_map_omits_zeros() {
        let m = OutcomeCounts::new(5, 0).to_bit_map();
        assert_eq!(m.len(), 1);
        assert_eq!(m.get("0"), Some(&5));
    }
}
