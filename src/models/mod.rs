pub mod bounds;
pub mod queueing_model;
pub mod service;
pub mod utility;
