use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::error::{config_error, CapacityError, Result};
use crate::models::bounds::CapacityBound;
use crate::utilities::math::approx_eq;

pub const WEIGHT_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationResult {
    pub recommended: f64,
    /// Hard ceiling: the tightest bound.
    pub upper: f64,
    pub limiting_bound: String,
    pub score: f64,
    /// `recommended / value - 1` per bound.
    pub deviations: BTreeMap<String, f64>,
}

// Each satisfaction term is piecewise linear in N, so the weighted sum is
// too and its maximum over [0, upper] sits on 0, upper or a breakpoint.
pub struct Reconciler<'a> {
    bounds: &'a [CapacityBound],
    upper: f64,
    limiting_bound: &'a CapacityBound,
}

impl<'a> Reconciler<'a> {
    pub fn new(bounds: &'a [CapacityBound]) -> Result<Reconciler<'a>> {
        if bounds.is_empty() {
            return Err(config_error("reconciliation needs at least one bound"));
        }

        let mut names = BTreeSet::new();
        let mut total_weight = 0.0;

        for bound in bounds {
            if !names.insert(bound.name.as_str()) {
                return Err(config_error(format!(
                    "bound `{}` is given twice",
                    bound.name
                )));
            }

            if !(bound.value.is_finite() && bound.value >= 0.0) {
                return Err(config_error(format!(
                    "bound `{}` has invalid value {}",
                    bound.name, bound.value
                )));
            }

            if !(bound.weight >= 0.0 && bound.weight <= 1.0) {
                return Err(config_error(format!(
                    "bound `{}` has weight {} outside [0, 1]",
                    bound.name, bound.weight
                )));
            }

            bound.utility.validate()?;
            total_weight += bound.weight;
        }

        if !approx_eq(total_weight, 1.0, WEIGHT_TOLERANCE) {
            return Err(config_error(format!(
                "bound weights sum to {} instead of 1",
                total_weight
            )));
        }

        let mut limiting_bound = &bounds[0];
        for bound in &bounds[1..] {
            if bound.value < limiting_bound.value {
                limiting_bound = bound;
            }
        }

        if limiting_bound.value <= 0.0 {
            return Err(CapacityError::InfeasibleCapacity {
                bound: limiting_bound.name.clone(),
                value: limiting_bound.value,
            });
        }

        Ok(Reconciler {
            bounds,
            upper: limiting_bound.value,
            limiting_bound,
        })
    }

    pub fn upper(&self) -> f64 {
        self.upper
    }

    pub fn objective(&self, capacity: f64) -> f64 {
        self.bounds
            .iter()
            .map(|bound| bound.weight * bound.satisfaction(capacity))
            .sum()
    }

    /// Every point where the objective can peak, largest first.
    pub fn candidates(&self) -> Vec<f64> {
        let mut candidates = vec![self.upper, 0.0];

        for bound in self.bounds {
            let breakpoint = bound.breakpoint_capacity();
            if breakpoint > 0.0 && breakpoint < self.upper {
                candidates.push(breakpoint);
            }
        }

        candidates.sort_by(|a, b| b.total_cmp(a));
        candidates.dedup();
        candidates
    }

    pub fn solve(&self) -> OptimizationResult {
        let mut recommended = self.upper;
        let mut score = self.objective(self.upper);

        // Ties keep the larger capacity
        for candidate in self.candidates() {
            let candidate_score = self.objective(candidate);
            debug!(candidate, score = candidate_score, "reconciliation candidate");

            if candidate_score > score {
                recommended = candidate;
                score = candidate_score;
            }
        }

        let deviations = self
            .bounds
            .iter()
            .map(|bound| (bound.name.clone(), bound.deviation(recommended)))
            .collect();

        OptimizationResult {
            recommended,
            upper: self.upper,
            limiting_bound: self.limiting_bound.name.clone(),
            score,
            deviations,
        }
    }

    /// Evenly spaced `(capacity, score)` samples over [0, upper].
    pub fn profile(&self, samples: usize) -> Result<Vec<(f64, f64)>> {
        if samples < 2 {
            return Err(config_error("a profile needs at least two samples"));
        }

        let step = self.upper / (samples - 1) as f64;

        Ok((0..samples)
            .map(|i| {
                let capacity = if i == samples - 1 {
                    self.upper
                } else {
                    step * i as f64
                };

                (capacity, self.objective(capacity))
            })
            .collect())
    }
}

pub fn reconcile(bounds: &[CapacityBound]) -> Result<OptimizationResult> {
    Ok(Reconciler::new(bounds)?.solve())
}

// ----- Unit tests ---- //
#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::bounds::{EVACUATION, INDOOR, OUTDOOR, SERVICE};
    use crate::models::utility::Utility;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn get_reference_bounds() -> Vec<CapacityBound> {
        vec![
            CapacityBound::new(
                INDOOR,
                8228.571428571428,
                0.5,
                Utility::continuous(0.8, 1.25, -2.5).unwrap(),
            ),
            CapacityBound::new(
                OUTDOOR,
                278260.8695652174,
                0.25,
                Utility::continuous(0.6, 1.67, -1.25).unwrap(),
            ),
            CapacityBound::new(
                SERVICE,
                12396.10149718569,
                0.2,
                Utility::continuous(0.7, 1.43, -1.67).unwrap(),
            ),
            CapacityBound::new(
                EVACUATION,
                10017.391304347826,
                0.05,
                Utility::continuous(0.5, 2.0, -1.0).unwrap(),
            ),
        ]
    }

    #[test]
    fn test_reference_reconciliation() {
        let result = reconcile(&get_reference_bounds()).unwrap();

        assert_eq!(result.upper, 8228.571428571428);
        assert_eq!(result.limiting_bound, INDOOR);
        assert!(result.recommended <= result.upper);

        // Peaks where the indoor curve turns down
        assert!((result.recommended - 0.8 * 8228.571428571428).abs() < 1e-6);
        assert!((result.recommended - 6582.857142).abs() < 1e-3);
        assert!((result.deviations[INDOOR] + 0.2).abs() < 1e-9);
        assert_eq!(result.deviations.len(), 4);
    }

    #[test]
    fn test_scan_matches_dense_search() {
        let bounds = get_reference_bounds();
        let reconciler = Reconciler::new(&bounds).unwrap();
        let result = reconciler.solve();

        for (capacity, score) in reconciler.profile(10001).unwrap() {
            assert!(capacity <= reconciler.upper());
            assert!(score <= result.score + 1e-12);
        }
    }

    #[test]
    fn test_upper_when_nothing_improves() {
        // Monotone increasing curves peak at the ceiling
        let bounds = vec![
            CapacityBound::new("a", 100.0, 0.5, Utility::continuous(2.0, 1.0, 0.5).unwrap()),
            CapacityBound::new("b", 300.0, 0.5, Utility::continuous(0.5, 1.0, 1.0).unwrap()),
        ];
        let result = reconcile(&bounds).unwrap();

        assert_eq!(result.recommended, 100.0);
        assert_eq!(result.deviations["a"], 0.0);
        assert!((result.deviations["b"] + 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_deviation_shape() {
        // Minimising weighted |N/bound - 1| under the ceiling lands on it
        let bounds = vec![
            CapacityBound::new(INDOOR, 8228.57, 0.4, Utility::deviation()),
            CapacityBound::new(SERVICE, 12396.10, 0.6, Utility::deviation()),
            CapacityBound::new(EVACUATION, 10017.39, 0.0, Utility::deviation()),
        ];
        let result = reconcile(&bounds).unwrap();

        assert_eq!(result.recommended, 8228.57);
        assert_eq!(result.limiting_bound, INDOOR);
    }

    #[test]
    fn test_ceiling_invariant() {
        let mut rng = StdRng::seed_from_u64(3);

        for _ in 0..200 {
            let num_bounds = rng.gen_range(1..6);
            let mut weights: Vec<f64> = (0..num_bounds).map(|_| rng.gen_range(0.0..1.0)).collect();
            let total: f64 = weights.iter().sum();
            weights.iter_mut().for_each(|w| *w /= total);

            let bounds: Vec<CapacityBound> = weights
                .iter()
                .enumerate()
                .map(|(i, &weight)| {
                    let utility = Utility::continuous(
                        rng.gen_range(0.1..1.5),
                        rng.gen_range(-2.0..3.0),
                        rng.gen_range(-3.0..2.0),
                    )
                    .unwrap();

                    CapacityBound::new(format!("b{}", i), rng.gen_range(1.0..1e5), weight, utility)
                })
                .collect();

            let result = reconcile(&bounds).unwrap();
            let tightest = bounds.iter().map(|b| b.value).fold(f64::INFINITY, f64::min);

            assert!(result.recommended >= 0.0);
            assert!(result.recommended <= tightest);
            assert_eq!(result.upper, tightest);
        }
    }

    #[test]
    fn test_invalid_bounds() {
        assert!(matches!(reconcile(&[]), Err(CapacityError::Configuration(_))));

        let mut heavy = get_reference_bounds();
        heavy[0].weight = 0.6;
        assert!(matches!(reconcile(&heavy), Err(CapacityError::Configuration(_))));

        let mut negative = get_reference_bounds();
        negative[1].weight = -0.25;
        negative[0].weight = 1.0;
        assert!(matches!(reconcile(&negative), Err(CapacityError::Configuration(_))));

        let mut duplicated = get_reference_bounds();
        duplicated[3].name = INDOOR.to_string();
        assert!(matches!(reconcile(&duplicated), Err(CapacityError::Configuration(_))));

        let mut jump = get_reference_bounds();
        jump[2].utility.intercept = 5.0;
        assert!(matches!(reconcile(&jump), Err(CapacityError::Configuration(_))));

        let mut nan = get_reference_bounds();
        nan[1].value = f64::NAN;
        assert!(matches!(reconcile(&nan), Err(CapacityError::Configuration(_))));
    }

    #[test]
    fn test_degenerate_bound_is_infeasible() {
        let mut bounds = get_reference_bounds();
        bounds[2].value = 0.0;

        match reconcile(&bounds) {
            Err(CapacityError::InfeasibleCapacity { bound, value }) => {
                assert_eq!(bound, SERVICE);
                assert_eq!(value, 0.0);
            }
            other => panic!("expected infeasible, got {:?}", other),
        }
    }

    #[test]
    fn test_profile() {
        let bounds = get_reference_bounds();
        let reconciler = Reconciler::new(&bounds).unwrap();

        let profile = reconciler.profile(5).unwrap();
        assert_eq!(profile.len(), 5);
        assert_eq!(profile[0], (0.0, 0.0));
        assert_eq!(profile[4].0, reconciler.upper());

        assert!(reconciler.profile(1).is_err());
    }

    #[test]
    fn test_idempotent() {
        let bounds = get_reference_bounds();
        let first = reconcile(&bounds).unwrap();
        let second = reconcile(&bounds).unwrap();

        assert_eq!(first.recommended.to_bits(), second.recommended.to_bits());
        assert_eq!(first, second);
    }
}
