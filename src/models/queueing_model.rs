use crate::error::{config_error, ConvergenceWarning, Result};
use crate::models::service::ServiceClass;
use crate::utilities::bisection::Bisection;
use std::fmt::Display;

/// Expected time a visitor spends queueing, in hours. Unstable or degenerate
/// queues have no finite wait and order above every finite value.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub enum Wait {
    Finite(f64),
    Unbounded,
}

impl Wait {
    pub fn is_finite(&self) -> bool {
        match self {
            Wait::Finite(_) => true,
            Wait::Unbounded => false,
        }
    }

    pub fn is_unbounded(&self) -> bool {
        !self.is_finite()
    }

    pub fn within(&self, limit: f64) -> bool {
        match self {
            Wait::Finite(wait) => *wait <= limit,
            Wait::Unbounded => false,
        }
    }

    pub fn hours(&self) -> f64 {
        match self {
            Wait::Finite(wait) => *wait,
            Wait::Unbounded => f64::INFINITY,
        }
    }
}

impl Display for Wait {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Wait::Finite(wait) => write!(f, "{:.4}h", wait)?,
            Wait::Unbounded => write!(f, "Unbounded")?,
        };

        Ok(())
    }
}

// Sum_{k<c} (a^k / k!) divided by a^c / c!, built from the top term down so
// neither the powers nor the factorials are formed explicitly.
fn scaled_head_sum(offered_load: f64, servers: usize) -> f64 {
    let mut term = 1.0;
    let mut sum = 0.0;

    for k in (1..=servers).rev() {
        term = term * k as f64 / offered_load;
        sum += term;
    }

    sum
}

/// Erlang-C probability that an arriving visitor has to queue in an M/M/c
/// system. Only meaningful for 0 < rho < 1.
pub fn erlang_c(class: &ServiceClass, arrival_rate: f64) -> f64 {
    let rho = class.utilisation(arrival_rate);
    let offered_load = arrival_rate / class.service_rate;

    1.0 / (1.0 + (1.0 - rho) * scaled_head_sum(offered_load, class.servers))
}

/// Steady-state expected queueing delay Wq of an M/M/c system:
///
/// ```text
/// P0 = 1 / ( sum_{k<c} a^k/k! + a^c / (c! (1 - rho)) )
/// Wq = a^c / (c! (1 - rho)^2) * P0 / (c mu)
/// ```
///
/// with `a = lambda / mu` and `rho = a / c`. Non-decreasing in lambda over the
/// stable region.
pub fn wait_time(class: &ServiceClass, arrival_rate: f64) -> Wait {
    let rho = class.utilisation(arrival_rate);

    if !rho.is_finite() || rho >= 1.0 || rho <= 0.0 {
        return Wait::Unbounded;
    }

    let wait = erlang_c(class, arrival_rate) / (class.total_service_rate() * (1.0 - rho));

    Wait::Finite(wait)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassCapacity {
    pub name: String,
    pub max_arrival_rate: f64,
    /// Daily visitor-equivalent capacity, `max_arrival_rate / visitor_proportion`.
    pub capacity: f64,
    pub servers: usize,
    pub wait: Wait,
    pub iterations: usize,
    pub converged: bool,
    pub width: f64,
}

impl ClassCapacity {
    pub fn convergence_warning(&self) -> Option<ConvergenceWarning> {
        if self.converged {
            return None;
        }

        Some(ConvergenceWarning {
            class: self.name.clone(),
            iterations: self.iterations,
            width: self.width,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueueingModel {
    pub tolerance: f64,
    pub max_iterations: usize,
}

impl Default for QueueingModel {
    fn default() -> Self {
        QueueingModel::new(1e-6, 200)
    }
}

impl QueueingModel {
    pub fn new(tolerance: f64, max_iterations: usize) -> QueueingModel {
        QueueingModel {
            tolerance,
            max_iterations,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(config_error(format!(
                "search tolerance must be positive, got {}",
                self.tolerance
            )));
        }

        if self.max_iterations == 0 {
            return Err(config_error("search needs at least one iteration"));
        }

        Ok(())
    }

    /// Largest arrival rate whose expected wait stays within the class
    /// threshold. The search stays `tolerance` below c*mu to keep clear of the
    /// singularity at rho = 1.
    pub fn max_arrival_rate(&self, class: &ServiceClass) -> Result<ClassCapacity> {
        self.validate()?;
        class.validate()?;

        let upper = (class.total_service_rate() - self.tolerance).max(0.0);
        let bisection = Bisection::new(self.tolerance, self.max_iterations);

        let outcome = bisection.last_feasible(0.0, upper, |arrival_rate| {
            wait_time(class, arrival_rate).within(class.wait_threshold)
        });

        let max_arrival_rate = outcome.best;
        let wait = if max_arrival_rate > 0.0 {
            wait_time(class, max_arrival_rate)
        } else {
            Wait::Unbounded
        };

        Ok(ClassCapacity {
            name: class.name.clone(),
            max_arrival_rate,
            capacity: max_arrival_rate / class.visitor_proportion,
            servers: class.servers,
            wait,
            iterations: outcome.iterations,
            converged: outcome.converged,
            width: outcome.width,
        })
    }
}
