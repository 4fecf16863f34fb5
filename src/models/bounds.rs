use crate::error::{config_error, Result};
use crate::models::utility::Utility;
use serde::Deserialize;

pub const INDOOR: &str = "indoor";
pub const OUTDOOR: &str = "outdoor";
pub const SERVICE: &str = "service";
pub const EVACUATION: &str = "evacuation";

/// One independently derived ceiling on daily visitors, with the weight and
/// satisfaction curve it carries into reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub struct CapacityBound {
    pub name: String,
    pub value: f64,
    pub weight: f64,
    pub utility: Utility,
}

impl CapacityBound {
    pub fn new(name: impl Into<String>, value: f64, weight: f64, utility: Utility) -> CapacityBound {
        CapacityBound {
            name: name.into(),
            value,
            weight,
            utility,
        }
    }

    pub fn ratio(&self, capacity: f64) -> f64 {
        capacity / self.value
    }

    pub fn satisfaction(&self, capacity: f64) -> f64 {
        self.utility.evaluate(self.ratio(capacity))
    }

    /// Capacity at which this bound's utility changes slope.
    pub fn breakpoint_capacity(&self) -> f64 {
        self.utility.breakpoint * self.value
    }

    pub fn deviation(&self, capacity: f64) -> f64 {
        self.ratio(capacity) - 1.0
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IndoorConfig {
    /// Peak instantaneous occupancy of each hall.
    pub max_occupancy: Vec<f64>,
    pub dwell_hours: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OutdoorConfig {
    /// Walkable area in square metres.
    pub effective_area: f64,
    /// Comfort threshold in square metres per visitor.
    pub area_per_visitor: f64,
    pub dwell_hours: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EvacuationConfig {
    /// Crowd movement speed through exits, m/s.
    pub crowd_speed: f64,
    /// Total exit width, m.
    pub exit_width: f64,
    /// Longest evacuation path, m.
    pub max_path_length: f64,
    /// Outdoor walking speed, m/s.
    pub walking_speed: f64,
    pub dwell_hours: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evacuation {
    pub capacity: f64,
    pub escape_time: f64,
}

fn require_positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(config_error(format!("{} must be positive, got {}", name, value)))
    }
}

pub fn estimate_indoor_capacity(indoor: &IndoorConfig, open_hours: f64) -> Result<f64> {
    require_positive("open_hours", open_hours)?;
    require_positive("indoor.dwell_hours", indoor.dwell_hours)?;

    if indoor.max_occupancy.is_empty() {
        return Err(config_error("indoor.max_occupancy lists no halls"));
    }

    let mut total = 0.0;
    for &occupancy in &indoor.max_occupancy {
        if !(occupancy.is_finite() && occupancy >= 0.0) {
            return Err(config_error(format!(
                "hall occupancy must be non-negative, got {}",
                occupancy
            )));
        }

        total += open_hours / indoor.dwell_hours * occupancy;
    }

    Ok(total)
}

pub fn estimate_outdoor_capacity(outdoor: &OutdoorConfig, open_hours: f64) -> Result<f64> {
    require_positive("open_hours", open_hours)?;
    require_positive("outdoor.area_per_visitor", outdoor.area_per_visitor)?;
    require_positive("outdoor.dwell_hours", outdoor.dwell_hours)?;

    if !(outdoor.effective_area.is_finite() && outdoor.effective_area >= 0.0) {
        return Err(config_error(format!(
            "outdoor.effective_area must be non-negative, got {}",
            outdoor.effective_area
        )));
    }

    Ok(outdoor.effective_area / outdoor.area_per_visitor * open_hours / outdoor.dwell_hours)
}

// The escape window is whichever is longer: clearing the indoor crowd
// through the exits or walking the longest path.
pub fn estimate_evacuation_capacity(
    evacuation: &EvacuationConfig,
    indoor_capacity: f64,
) -> Result<Evacuation> {
    require_positive("evacuation.crowd_speed", evacuation.crowd_speed)?;
    require_positive("evacuation.exit_width", evacuation.exit_width)?;
    require_positive("evacuation.walking_speed", evacuation.walking_speed)?;
    require_positive("evacuation.dwell_hours", evacuation.dwell_hours)?;

    if !(evacuation.max_path_length.is_finite() && evacuation.max_path_length >= 0.0) {
        return Err(config_error(format!(
            "evacuation.max_path_length must be non-negative, got {}",
            evacuation.max_path_length
        )));
    }

    if !(indoor_capacity.is_finite() && indoor_capacity >= 0.0) {
        return Err(config_error(format!(
            "indoor capacity must be non-negative, got {}",
            indoor_capacity
        )));
    }

    let flow = evacuation.crowd_speed * evacuation.exit_width;
    let escape_time =
        (indoor_capacity / flow).max(evacuation.max_path_length / evacuation.walking_speed);

    Ok(Evacuation {
        capacity: flow * escape_time / evacuation.dwell_hours,
        escape_time,
    })
}
