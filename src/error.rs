use std::fmt::Display;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CapacityError {
    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("no feasible capacity: bound `{bound}` has degenerated to {value}")]
    InfeasibleCapacity { bound: String, value: f64 },
}

pub type Result<T> = std::result::Result<T, CapacityError>;

pub fn config_error(message: impl Display) -> CapacityError {
    CapacityError::Configuration(message.to_string())
}

// Not an error: the search stopped on its iteration cap and the best
// feasible rate found so far is still used.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvergenceWarning {
    pub class: String,
    pub iterations: usize,
    pub width: f64,
}

impl Display for ConvergenceWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "search for class `{}` stopped after {} iterations with bracket width {:e}",
            self.class, self.iterations, self.width
        )
    }
}
