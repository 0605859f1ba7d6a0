//! Initial flamability distributions.
//!
//! Every tree draws its starting flamability once, at construction, from one of
//! four run-wide distribution kinds. Values are produced in percentage points
//! and scaled to `[0, 1]`.
//!
//! | kind       | draw                                                        |
//! |------------|-------------------------------------------------------------|
//! | `uniform`  | U(0.02, 0.50)                                               |
//! | `normal`   | N(26, 13), redrawn until within `[0, 52]`, then / 100        |
//! | `bimodal`  | fair coin between N(13, 6.5) and N(38, 6.5), same rejection |
//! | `constant` | 1, never grows                                              |

use crate::error::{Result, SimulationError};
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const UNIFORM_MIN: f64 = 0.02;
const UNIFORM_MAX: f64 = 0.50;

const NORMAL_MEAN: f64 = 26.0;
const NORMAL_STD_DEV: f64 = 13.0;

const BIMODAL_LOW_MEAN: f64 = 13.0;
const BIMODAL_HIGH_MEAN: f64 = 38.0;
const BIMODAL_STD_DEV: f64 = 6.5;

/// Distribution kind used to seed tree flamability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlamabilityDistribution {
    /// Uniform on `[0.02, 0.50]`
    #[default]
    Uniform,
    /// Truncated normal around 0.26
    Normal,
    /// Two truncated normal clusters around 0.13 and 0.38
    Bimodal,
    /// Every tree pinned at 1
    Constant,
}

impl FlamabilityDistribution {
    /// All recognised kinds, in declaration order.
    pub const ALL: [FlamabilityDistribution; 4] = [
        FlamabilityDistribution::Uniform,
        FlamabilityDistribution::Normal,
        FlamabilityDistribution::Bimodal,
        FlamabilityDistribution::Constant,
    ];

    /// Lowercase name as accepted by [`FromStr`].
    pub fn name(&self) -> &'static str {
        match self {
            FlamabilityDistribution::Uniform => "uniform",
            FlamabilityDistribution::Normal => "normal",
            FlamabilityDistribution::Bimodal => "bimodal",
            FlamabilityDistribution::Constant => "constant",
        }
    }

    /// Whether flamability is fixed for the lifetime of the tree.
    pub fn is_constant(&self) -> bool {
        matches!(self, FlamabilityDistribution::Constant)
    }
}

impl fmt::Display for FlamabilityDistribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FlamabilityDistribution {
    type Err = SimulationError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "uniform" => Ok(FlamabilityDistribution::Uniform),
            "normal" => Ok(FlamabilityDistribution::Normal),
            "bimodal" => Ok(FlamabilityDistribution::Bimodal),
            "constant" => Ok(FlamabilityDistribution::Constant),
            other => Err(SimulationError::invalid(format!(
                "unknown flamability distribution '{other}' (expected uniform, normal, bimodal or constant)"
            ))),
        }
    }
}

/// Normal draw in percentage points, redrawn until it lands in `[0, 2 * mean]`.
#[derive(Debug, Clone, Copy)]
struct TruncatedNormal {
    normal: Normal<f64>,
    upper: f64,
}

impl TruncatedNormal {
    fn new(mean: f64, std_dev: f64) -> Result<Self> {
        let normal = Normal::new(mean, std_dev).map_err(|e| {
            SimulationError::invalid(format!("normal(mean={mean}, sd={std_dev}): {e}"))
        })?;
        Ok(Self {
            normal,
            upper: mean * 2.0,
        })
    }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        loop {
            let value = self.normal.sample(rng);
            if (0.0..=self.upper).contains(&value) {
                return value / 100.0;
            }
        }
    }
}

/// Ready-to-use sampler for one [`FlamabilityDistribution`].
///
/// Built once per run so the normal distributions are validated up front and
/// tree placement only has to draw.
#[derive(Debug, Clone, Copy)]
pub struct FlamabilitySampler {
    kind: FlamabilityDistribution,
    normal: TruncatedNormal,
    bimodal_low: TruncatedNormal,
    bimodal_high: TruncatedNormal,
}

impl FlamabilitySampler {
    /// Build a sampler for `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::InvalidConfiguration`] if a component
    /// distribution cannot be constructed.
    pub fn new(kind: FlamabilityDistribution) -> Result<Self> {
        Ok(Self {
            kind,
            normal: TruncatedNormal::new(NORMAL_MEAN, NORMAL_STD_DEV)?,
            bimodal_low: TruncatedNormal::new(BIMODAL_LOW_MEAN, BIMODAL_STD_DEV)?,
            bimodal_high: TruncatedNormal::new(BIMODAL_HIGH_MEAN, BIMODAL_STD_DEV)?,
        })
    }

    /// Distribution this sampler draws from.
    pub fn kind(&self) -> FlamabilityDistribution {
        self.kind
    }

    /// Draw one initial flamability.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match self.kind {
            FlamabilityDistribution::Uniform => rng.random_range(UNIFORM_MIN..=UNIFORM_MAX),
            FlamabilityDistribution::Normal => self.normal.sample(rng),
            FlamabilityDistribution::Bimodal => {
                if rng.random::<f64>() < 0.5 {
                    self.bimodal_low.sample(rng)
                } else {
                    self.bimodal_high.sample(rng)
                }
            }
            FlamabilityDistribution::Constant => 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn draws(kind: FlamabilityDistribution, n: usize) -> Vec<f64> {
        let sampler = FlamabilitySampler::new(kind).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        (0..n).map(|_| sampler.sample(&mut rng)).collect()
    }

    fn mean(values: &[f64]) -> f64 {
        values.iter().sum::<f64>() / values.len() as f64
    }

    #[test]
    fn test_parse_names() {
        for kind in FlamabilityDistribution::ALL {
            assert_eq!(kind.name().parse::<FlamabilityDistribution>().unwrap(), kind);
        }
        assert_eq!(
            " Bimodal ".parse::<FlamabilityDistribution>().unwrap(),
            FlamabilityDistribution::Bimodal
        );
    }

    #[test]
    fn test_unknown_name_is_invalid_configuration() {
        let err = "lognormal".parse::<FlamabilityDistribution>().unwrap_err();
        assert!(matches!(err, SimulationError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_uniform_bounds() {
        let values = draws(FlamabilityDistribution::Uniform, 5000);
        assert!(values.iter().all(|v| (UNIFORM_MIN..=UNIFORM_MAX).contains(v)));
        assert_relative_eq!(mean(&values), 0.26, epsilon = 0.01);
    }

    #[test]
    fn test_normal_is_truncated() {
        let values = draws(FlamabilityDistribution::Normal, 5000);
        assert!(values.iter().all(|v| (0.0..=0.52).contains(v)));
        // Symmetric truncation keeps the mean in place
        assert_relative_eq!(mean(&values), 0.26, epsilon = 0.01);
    }

    #[test]
    fn test_bimodal_has_two_clusters() {
        let values = draws(FlamabilityDistribution::Bimodal, 5000);
        assert!(values.iter().all(|v| (0.0..=0.76).contains(v)));

        let low = values.iter().filter(|v| **v < 0.255).count() as f64;
        let share = low / values.len() as f64;
        assert!((0.45..0.55).contains(&share), "low cluster share {share}");

        // Trough between the modes is sparse
        let trough = values.iter().filter(|v| (0.24..0.27).contains(*v)).count();
        let peak = values.iter().filter(|v| (0.115..0.145).contains(*v)).count();
        assert!(trough < peak);
    }

    #[test]
    fn test_constant_is_one() {
        assert!(draws(FlamabilityDistribution::Constant, 100)
            .iter()
            .all(|v| *v == 1.0));
    }
}
