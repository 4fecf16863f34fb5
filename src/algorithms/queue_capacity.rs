use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

use crate::error::{config_error, ConvergenceWarning, Result};
use crate::models::queueing_model::{ClassCapacity, QueueingModel};
use crate::models::service::ServiceClass;
use crate::utilities::metrics::{mean, min, weighted_mean};

/// How per-class capacities combine into one service bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    /// Weighted by each class's share of all service counters.
    ServerShare,
    Equal,
    /// The weakest class caps the venue.
    Bottleneck,
}

impl Aggregation {
    pub fn combine(&self, classes: &[ClassCapacity]) -> f64 {
        let capacities: Vec<f64> = classes.iter().map(|c| c.capacity).collect();

        match self {
            Aggregation::ServerShare => {
                let servers: Vec<f64> = classes.iter().map(|c| c.servers as f64).collect();
                weighted_mean(&capacities, &servers)
            }
            Aggregation::Equal => mean(&capacities),
            Aggregation::Bottleneck => min(&capacities),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueueCapacity {
    /// In the order the classes were given.
    pub per_class: Vec<ClassCapacity>,
    pub aggregate: f64,
    pub warnings: Vec<ConvergenceWarning>,
}

impl QueueCapacity {
    pub fn by_name(&self) -> BTreeMap<String, f64> {
        self.per_class
            .iter()
            .map(|c| (c.name.clone(), c.capacity))
            .collect()
    }
}

pub fn solve_queue_capacity(
    classes: &[ServiceClass],
    model: &QueueingModel,
    aggregation: Aggregation,
) -> Result<QueueCapacity> {
    if classes.is_empty() {
        return Err(config_error("at least one service class is required"));
    }

    model.validate()?;

    let mut names = BTreeSet::new();
    for class in classes {
        class.validate()?;

        if !names.insert(class.name.as_str()) {
            return Err(config_error(format!(
                "service class `{}` is defined twice",
                class.name
            )));
        }
    }

    // Classes are independent, collect keeps the input order
    let per_class = classes
        .par_iter()
        .map(|class| model.max_arrival_rate(class))
        .collect::<Result<Vec<ClassCapacity>>>()?;

    let mut warnings = Vec::new();
    for class in &per_class {
        debug!(
            class = %class.name,
            max_arrival_rate = class.max_arrival_rate,
            capacity = class.capacity,
            wait = %class.wait,
            iterations = class.iterations,
            "solved service class"
        );

        if let Some(warning) = class.convergence_warning() {
            warn!("{}", warning);
            warnings.push(warning);
        }
    }

    let aggregate = aggregation.combine(&per_class);
    debug!(?aggregation, aggregate, "aggregated service capacity");

    Ok(QueueCapacity {
        per_class,
        aggregate,
        warnings,
    })
}
