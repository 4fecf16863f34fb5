use tracing::info;

use crate::algorithms::queue_capacity::{solve_queue_capacity, QueueCapacity};
use crate::algorithms::reconcile::{OptimizationResult, Reconciler};
use crate::error::Result;
use crate::models::bounds::{
    estimate_evacuation_capacity, estimate_indoor_capacity, estimate_outdoor_capacity,
    CapacityBound, Evacuation, EVACUATION, INDOOR, OUTDOOR, SERVICE,
};
use crate::settings::Settings;

#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    pub indoor: f64,
    pub outdoor: f64,
    pub evacuation: Evacuation,
    pub service: QueueCapacity,
    /// The bounds that took part in reconciliation.
    pub bounds: Vec<CapacityBound>,
    pub result: OptimizationResult,
    pub profile: Vec<(f64, f64)>,
}

pub fn assess(settings: &Settings) -> Result<Assessment> {
    settings.reconciliation.validate_names()?;

    let venue = &settings.venue;
    let indoor = estimate_indoor_capacity(&venue.indoor, venue.open_hours)?;
    let outdoor = estimate_outdoor_capacity(&venue.outdoor, venue.open_hours)?;
    let evacuation = estimate_evacuation_capacity(&venue.evacuation, indoor)?;

    let queue = &settings.queue;
    let service = solve_queue_capacity(
        &queue.service_classes(),
        &queue.model(),
        queue.aggregation,
    )?;

    info!(
        indoor,
        outdoor,
        service = service.aggregate,
        evacuation = evacuation.capacity,
        "estimated capacity bounds"
    );

    let mut bounds = Vec::new();
    for &(name, value) in &[
        (INDOOR, indoor),
        (OUTDOOR, outdoor),
        (SERVICE, service.aggregate),
        (EVACUATION, evacuation.capacity),
    ] {
        if let Some((weight, utility)) = settings.reconciliation.utility(name)? {
            bounds.push(CapacityBound::new(name, value, weight, utility));
        }
    }

    let reconciler = Reconciler::new(&bounds)?;
    let result = reconciler.solve();
    let profile = if settings.profile_samples > 0 {
        reconciler.profile(settings.profile_samples)?
    } else {
        Vec::new()
    };

    info!(
        recommended = result.recommended,
        upper = result.upper,
        limiting_bound = %result.limiting_bound,
        "reconciled capacity"
    );

    Ok(Assessment {
        indoor,
        outdoor,
        evacuation,
        service,
        bounds,
        result,
        profile,
    })
}
