pub mod queue_capacity;
pub mod reconcile;
