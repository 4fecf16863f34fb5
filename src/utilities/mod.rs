pub mod bisection;
pub mod logging;
pub mod math;
pub mod metrics;
