use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::algorithms::queue_capacity::Aggregation;
use crate::error::{config_error, Result};
use crate::models::bounds::{
    EvacuationConfig, IndoorConfig, OutdoorConfig, EVACUATION, INDOOR, OUTDOOR, SERVICE,
};
use crate::models::queueing_model::QueueingModel;
use crate::models::service::ServiceClass;
use crate::models::utility::Utility;

pub const ENV_PREFIX: &str = "VENUE";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Worker threads for the per-class solves, 0 for one per CPU.
    pub threads: usize,
    /// Number of objective samples to report, 0 to skip.
    pub profile_samples: usize,
    pub venue: VenueConfig,
    pub queue: QueueConfig,
    pub reconciliation: ReconcileConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct VenueConfig {
    pub open_hours: f64,
    pub indoor: IndoorConfig,
    pub outdoor: OutdoorConfig,
    pub evacuation: EvacuationConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Applies to every class without its own threshold.
    pub wait_threshold_hours: f64,
    pub tolerance: f64,
    pub max_iterations: usize,
    pub aggregation: Aggregation,
    pub classes: Vec<ServiceClassConfig>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServiceClassConfig {
    pub name: String,
    pub service_rate: f64,
    pub servers: usize,
    pub visitor_proportion: f64,
    pub wait_threshold_hours: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UtilityShape {
    Piecewise,
    /// Every bound scores `1 - |N / bound - 1|`.
    Deviation,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    pub shape: UtilityShape,
    /// Only the bounds listed here take part in reconciliation.
    pub bounds: BTreeMap<String, BoundConfig>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BoundConfig {
    pub weight: f64,
    pub breakpoint: Option<f64>,
    pub slope_below: Option<f64>,
    pub slope_above: Option<f64>,
    /// Derived from continuity when omitted.
    pub intercept: Option<f64>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            threads: 0,
            profile_samples: 0,
            venue: VenueConfig::default(),
            queue: QueueConfig::default(),
            reconciliation: ReconcileConfig::default(),
        }
    }
}

impl Default for VenueConfig {
    fn default() -> Self {
        VenueConfig {
            open_hours: 8.0,
            indoor: IndoorConfig::default(),
            outdoor: OutdoorConfig::default(),
            evacuation: EvacuationConfig::default(),
        }
    }
}

impl Default for IndoorConfig {
    fn default() -> Self {
        IndoorConfig {
            max_occupancy: vec![800.0, 600.0, 400.0],
            dwell_hours: 1.75,
        }
    }
}

impl Default for OutdoorConfig {
    fn default() -> Self {
        OutdoorConfig {
            effective_area: 400000.0,
            area_per_visitor: 10.0,
            dwell_hours: 1.15,
        }
    }
}

impl Default for EvacuationConfig {
    fn default() -> Self {
        EvacuationConfig {
            crowd_speed: 1.2,
            exit_width: 12.0,
            max_path_length: 1200.0,
            walking_speed: 1.5,
            dwell_hours: 1.15,
        }
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        let class = |name: &str, service_rate, servers, visitor_proportion| ServiceClassConfig {
            name: name.to_string(),
            service_rate,
            servers,
            visitor_proportion,
            wait_threshold_hours: None,
        };

        QueueConfig {
            wait_threshold_hours: 0.30,
            tolerance: 1e-6,
            max_iterations: 200,
            aggregation: Aggregation::ServerShare,
            classes: vec![
                class("rest", 320.0, 12, 0.3),
                class("retail", 200.0, 6, 0.1),
                class("medical", 40.0, 3, 0.01),
            ],
        }
    }
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        let bound = |weight, breakpoint, slope_below, slope_above| BoundConfig {
            weight,
            breakpoint: Some(breakpoint),
            slope_below: Some(slope_below),
            slope_above: Some(slope_above),
            intercept: None,
        };

        let mut bounds = BTreeMap::new();
        bounds.insert(INDOOR.to_string(), bound(0.5, 0.8, 1.25, -2.5));
        bounds.insert(OUTDOOR.to_string(), bound(0.25, 0.6, 1.67, -1.25));
        bounds.insert(SERVICE.to_string(), bound(0.2, 0.7, 1.43, -1.67));
        bounds.insert(EVACUATION.to_string(), bound(0.05, 0.5, 2.0, -1.0));

        ReconcileConfig {
            shape: UtilityShape::Piecewise,
            bounds,
        }
    }
}

impl Settings {
    /// Layers an optional config file (`name` with any supported extension)
    /// and `VENUE__`-prefixed environment variables over the defaults.
    pub fn load(name: &str) -> std::result::Result<Settings, ConfigError> {
        Config::builder()
            .add_source(File::with_name(name).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?
            .try_deserialize()
    }

    pub fn from_toml(text: &str) -> std::result::Result<Settings, ConfigError> {
        Config::builder()
            .add_source(File::from_str(text, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    pub fn worker_threads(&self) -> usize {
        if self.threads == 0 {
            num_cpus::get()
        } else {
            self.threads
        }
    }
}

impl QueueConfig {
    pub fn model(&self) -> QueueingModel {
        QueueingModel::new(self.tolerance, self.max_iterations)
    }

    pub fn service_classes(&self) -> Vec<ServiceClass> {
        self.classes
            .iter()
            .map(|class| {
                ServiceClass::new(
                    class.name.clone(),
                    class.service_rate,
                    class.servers,
                    class.visitor_proportion,
                    class.wait_threshold_hours.unwrap_or(self.wait_threshold_hours),
                )
            })
            .collect()
    }
}

impl ReconcileConfig {
    pub fn validate_names(&self) -> Result<()> {
        for name in self.bounds.keys() {
            if ![INDOOR, OUTDOOR, SERVICE, EVACUATION].contains(&name.as_str()) {
                return Err(config_error(format!(
                    "unknown bound `{}` in reconciliation",
                    name
                )));
            }
        }

        Ok(())
    }

    /// Weight and utility for a bound, or `None` if it is left out.
    pub fn utility(&self, name: &str) -> Result<Option<(f64, Utility)>> {
        let bound = match self.bounds.get(name) {
            Some(bound) => bound,
            None => return Ok(None),
        };

        let utility = match self.shape {
            UtilityShape::Deviation => Utility::deviation(),
            UtilityShape::Piecewise => {
                let require = |value: Option<f64>, field: &str| {
                    value.ok_or_else(|| {
                        config_error(format!("bound `{}` is missing `{}`", name, field))
                    })
                };

                let breakpoint = require(bound.breakpoint, "breakpoint")?;
                let slope_below = require(bound.slope_below, "slope_below")?;
                let slope_above = require(bound.slope_above, "slope_above")?;

                match bound.intercept {
                    Some(intercept) => {
                        Utility::with_intercept(breakpoint, slope_below, slope_above, intercept)?
                    }
                    None => Utility::continuous(breakpoint, slope_below, slope_above)?,
                }
            }
        };

        Ok(Some((bound.weight, utility)))
    }
}
