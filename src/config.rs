use serde::{Deserialize, Serialize};

use crate::error::Error;

/// The range of λ covered by a sweep.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// First level of the sweep; vertices on the source side here get this as their breakpoint.
    pub lambda_min: f64,
    /// Arc breakpoints beyond this value are not processed.
    pub lambda_max: f64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            lambda_min: 0.0,
            lambda_max: f64::INFINITY,
        }
    }
}

impl SweepConfig {
    pub fn new(lambda_min: f64, lambda_max: f64) -> Result<Self, Error> {
        let config = Self {
            lambda_min,
            lambda_max,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if !self.lambda_min.is_finite() || self.lambda_max.is_nan() || self.lambda_max < self.lambda_min
        {
            Err(Error::InvalidDomain {
                min: self.lambda_min,
                max: self.lambda_max,
            })
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_must_be_ordered() {
        assert!(SweepConfig::new(1.0, 1.0).is_ok());
        assert!(SweepConfig::new(0.0, f64::INFINITY).is_ok());
        assert_eq!(
            SweepConfig::new(2.0, 1.0),
            Err(Error::InvalidDomain { min: 2.0, max: 1.0 })
        );
        assert!(SweepConfig::new(f64::NEG_INFINITY, 1.0).is_err());
        assert!(SweepConfig::new(0.0, f64::NAN).is_err());
    }
}
