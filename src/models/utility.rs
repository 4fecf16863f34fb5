use crate::error::{config_error, Result};
use crate::utilities::math::approx_eq;

/// Largest accepted gap between the two segments at the breakpoint when the
/// intercept is given explicitly. Admits constants rounded to two decimals.
pub const CONTINUITY_TOLERANCE: f64 = 5e-3;

/// Continuous two-segment linear satisfaction curve over the ratio
/// `x = capacity / bound`:
///
/// ```text
/// u(x) = slope_below * x               for x <= breakpoint
/// u(x) = slope_above * x + intercept   for x >  breakpoint
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Utility {
    pub breakpoint: f64,
    pub slope_below: f64,
    pub slope_above: f64,
    pub intercept: f64,
}

impl Utility {
    /// Builds the curve with the intercept that makes both segments meet at
    /// the breakpoint.
    pub fn continuous(breakpoint: f64, slope_below: f64, slope_above: f64) -> Result<Utility> {
        let utility = Utility {
            breakpoint,
            slope_below,
            slope_above,
            intercept: (slope_below - slope_above) * breakpoint,
        };

        utility.validate()?;
        Ok(utility)
    }

    /// Accepts an explicit intercept but rejects it if the curve would jump
    /// at the breakpoint.
    pub fn with_intercept(
        breakpoint: f64,
        slope_below: f64,
        slope_above: f64,
        intercept: f64,
    ) -> Result<Utility> {
        let utility = Utility {
            breakpoint,
            slope_below,
            slope_above,
            intercept,
        };

        utility.validate()?;
        Ok(utility)
    }

    /// `1 - |x - 1|`: maximising it minimises the absolute relative
    /// deviation from the bound.
    pub fn deviation() -> Utility {
        Utility {
            breakpoint: 1.0,
            slope_below: 1.0,
            slope_above: -1.0,
            intercept: 2.0,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.breakpoint.is_finite() && self.breakpoint > 0.0) {
            return Err(config_error(format!(
                "utility breakpoint must be positive, got {}",
                self.breakpoint
            )));
        }

        if !(self.slope_below.is_finite()
            && self.slope_above.is_finite()
            && self.intercept.is_finite())
        {
            return Err(config_error("utility slopes and intercept must be finite"));
        }

        let below = self.slope_below * self.breakpoint;
        let above = self.slope_above * self.breakpoint + self.intercept;
        if !approx_eq(below, above, CONTINUITY_TOLERANCE) {
            return Err(config_error(format!(
                "utility is discontinuous at {}: {} below vs {} above",
                self.breakpoint, below, above
            )));
        }

        Ok(())
    }

    pub fn evaluate(&self, ratio: f64) -> f64 {
        if ratio <= self.breakpoint {
            self.slope_below * ratio
        } else {
            self.slope_above * ratio + self.intercept
        }
    }
}

// ----- Unit tests ---- //
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CapacityError;

    #[test]
    fn test_continuous_intercept() {
        let indoor = Utility::continuous(0.8, 1.25, -2.5).unwrap();
        let service = Utility::continuous(0.7, 1.43, -1.67).unwrap();
        let evacuation = Utility::continuous(0.5, 2.0, -1.0).unwrap();

        assert!((indoor.intercept - 3.0).abs() < 1e-12);
        assert!((service.intercept - 2.17).abs() < 1e-12);
        assert!((evacuation.intercept - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_rounded_intercepts_accepted() {
        // Hand-rounded constants miss continuity by a few thousandths
        assert!(Utility::with_intercept(0.8, 1.25, -2.5, 3.0).is_ok());
        assert!(Utility::with_intercept(0.6, 1.67, -1.25, 1.75).is_ok());
        assert!(Utility::with_intercept(0.7, 1.43, -1.67, 2.17).is_ok());
        assert!(Utility::with_intercept(0.5, 2.0, -1.0, 1.5).is_ok());
    }

    #[test]
    fn test_discontinuous_rejected() {
        match Utility::with_intercept(0.8, 1.25, -2.5, 2.0) {
            Err(CapacityError::Configuration(msg)) => assert!(msg.contains("discontinuous")),
            other => panic!("accepted a jump: {:?}", other),
        }

        assert!(Utility::continuous(0.0, 1.0, -1.0).is_err());
        assert!(Utility::continuous(-0.5, 1.0, -1.0).is_err());
        assert!(Utility::continuous(0.5, f64::NAN, -1.0).is_err());
        assert!(Utility::with_intercept(0.5, 2.0, -1.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_evaluate() {
        let utility = Utility::continuous(0.8, 1.25, -2.5).unwrap();

        assert_eq!(utility.evaluate(0.0), 0.0);
        assert!((utility.evaluate(0.4) - 0.5).abs() < 1e-12);
        assert!((utility.evaluate(0.8) - 1.0).abs() < 1e-12);
        assert!((utility.evaluate(1.0) - 0.5).abs() < 1e-12);

        // Continuous either side of the breakpoint
        let left = utility.evaluate(0.8 - 1e-9);
        let right = utility.evaluate(0.8 + 1e-9);
        assert!((left - right).abs() < 1e-8);
    }

    #[test]
    fn test_deviation() {
        let utility = Utility::deviation();
        assert!(utility.validate().is_ok());

        for &x in &[0.0, 0.25, 0.9, 1.0, 1.3, 2.0] {
            let expected: f64 = 1.0 - (x - 1.0_f64).abs();
            assert!((utility.evaluate(x) - expected).abs() < 1e-12);
        }
    }
}
