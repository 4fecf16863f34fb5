pub mod algorithms;
pub mod assessment;
pub mod error;
pub mod models;
pub mod settings;
pub mod utilities;

pub use algorithms::queue_capacity::{solve_queue_capacity, Aggregation, QueueCapacity};
pub use algorithms::reconcile::{reconcile, OptimizationResult, Reconciler};
pub use assessment::{assess, Assessment};
pub use error::{CapacityError, ConvergenceWarning, Result};
pub use models::bounds::{
    estimate_evacuation_capacity, estimate_indoor_capacity, estimate_outdoor_capacity,
    CapacityBound,
};
pub use models::queueing_model::{wait_time, ClassCapacity, QueueingModel, Wait};
pub use models::service::ServiceClass;
pub use models::utility::Utility;
pub use settings::Settings;

/// Largest arrival rate one service class sustains within its wait threshold.
pub fn find_max_arrival_rate(class: &ServiceClass, model: &QueueingModel) -> Result<f64> {
    Ok(model.max_arrival_rate(class)?.max_arrival_rate)
}
