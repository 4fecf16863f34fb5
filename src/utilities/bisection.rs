// Bisection for the last point of a monotone predicate: `feasible` must hold
// on some prefix of [lower, upper] and fail everywhere after it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bisection {
    pub tolerance: f64,
    pub max_iterations: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchOutcome {
    /// Largest point confirmed feasible, or `lower` when none was.
    pub best: f64,
    pub iterations: usize,
    /// Width of the final bracket.
    pub width: f64,
    pub converged: bool,
}

impl Bisection {
    pub fn new(tolerance: f64, max_iterations: usize) -> Bisection {
        Bisection {
            tolerance,
            max_iterations,
        }
    }

    pub fn last_feasible(
        &self,
        lower: f64,
        upper: f64,
        mut feasible: impl FnMut(f64) -> bool,
    ) -> SearchOutcome {
        let mut left = lower;
        let mut right = upper;
        let mut best = lower;
        let mut iterations = 0;

        while right - left > self.tolerance && iterations < self.max_iterations {
            let mid = (left + right) / 2.0;

            if feasible(mid) {
                best = mid;
                left = mid;
            } else {
                right = mid;
            }

            iterations = iterations + 1;
        }

        let width = (right - left).max(0.0);

        SearchOutcome {
            best,
            iterations,
            width,
            converged: width <= self.tolerance,
        }
    }
}
