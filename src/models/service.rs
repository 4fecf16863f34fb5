use crate::error::{config_error, Result};
use std::fmt::Display;

/// One category of service point (rest area, retail, medical...).
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceClass {
    pub name: String,
    /// Visitors served per hour by a single counter.
    pub service_rate: f64,
    pub servers: usize,
    /// Share of all visitors that use this class of service point.
    pub visitor_proportion: f64,
    pub wait_threshold: f64,
}

impl ServiceClass {
    pub fn new(
        name: impl Into<String>,
        service_rate: f64,
        servers: usize,
        visitor_proportion: f64,
        wait_threshold: f64,
    ) -> ServiceClass {
        ServiceClass {
            name: name.into(),
            service_rate,
            servers,
            visitor_proportion,
            wait_threshold,
        }
    }

    /// Arrival rate at which utilisation reaches one.
    pub fn total_service_rate(&self) -> f64 {
        self.servers as f64 * self.service_rate
    }

    pub fn utilisation(&self, arrival_rate: f64) -> f64 {
        arrival_rate / self.total_service_rate()
    }

    pub fn validate(&self) -> Result<()> {
        if self.servers == 0 {
            return Err(config_error(format!(
                "class `{}` needs at least one server",
                self.name
            )));
        }

        if !(self.service_rate.is_finite() && self.service_rate > 0.0) {
            return Err(config_error(format!(
                "class `{}` has non-positive service rate {}",
                self.name, self.service_rate
            )));
        }

        if !(self.visitor_proportion > 0.0 && self.visitor_proportion <= 1.0) {
            return Err(config_error(format!(
                "class `{}` has visitor proportion {} outside (0, 1]",
                self.name, self.visitor_proportion
            )));
        }

        // An infinite threshold is allowed, it saturates at the stability limit
        if !(self.wait_threshold > 0.0) {
            return Err(config_error(format!(
                "class `{}` has non-positive wait threshold {}",
                self.name, self.wait_threshold
            )));
        }

        Ok(())
    }
}

impl Display for ServiceClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (mu={}, c={}, p={}, Wq<={}h)",
            self.name, self.service_rate, self.servers, self.visitor_proportion, self.wait_threshold
        )
    }
}

// ----- Unit tests ---- //
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CapacityError;

    #[test]
    fn test_validate() {
        let valid = ServiceClass::new("rest", 320.0, 12, 0.3, 0.3);
        assert!(valid.validate().is_ok());
        assert_eq!(valid.total_service_rate(), 3840.0);
        assert_eq!(valid.utilisation(1920.0), 0.5);

        let no_servers = ServiceClass::new("rest", 320.0, 0, 0.3, 0.3);
        let zero_rate = ServiceClass::new("rest", 0.0, 12, 0.3, 0.3);
        let negative_rate = ServiceClass::new("rest", -1.0, 12, 0.3, 0.3);
        let zero_prop = ServiceClass::new("rest", 320.0, 12, 0.0, 0.3);
        let big_prop = ServiceClass::new("rest", 320.0, 12, 1.2, 0.3);
        let zero_threshold = ServiceClass::new("rest", 320.0, 12, 0.3, 0.0);
        let nan_threshold = ServiceClass::new("rest", 320.0, 12, 0.3, f64::NAN);

        for class in &[
            no_servers,
            zero_rate,
            negative_rate,
            zero_prop,
            big_prop,
            zero_threshold,
            nan_threshold,
        ] {
            match class.validate() {
                Err(CapacityError::Configuration(_)) => {}
                other => panic!("{} accepted: {:?}", class, other),
            }
        }

        let unlimited = ServiceClass::new("rest", 320.0, 12, 1.0, f64::INFINITY);
        assert!(unlimited.validate().is_ok());
    }
}
