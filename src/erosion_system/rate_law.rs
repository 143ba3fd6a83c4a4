use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::PhysicalConstants;
use crate::errors::{ErosionError, ErosionResult};

/// Surface erosion process. Rates are particle fluxes [particles m⁻² s⁻¹];
/// `resolve` turns them into a mass loss rate [kg m⁻² s⁻¹].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RateLaw {
    /// Ion sputtering of H2O.
    Sputtering { rate: f64 },
    /// Radiolytic loss of O2 and H2.
    Radiolysis { o2_rate: f64, h2_rate: f64 },
    /// Sum of the component processes.
    Combined { components: Vec<RateLaw> },
}

impl RateLaw {
    pub fn sputtering(rate: f64) -> Self {
        RateLaw::Sputtering { rate }
    }

    pub fn radiolysis(o2_rate: f64, h2_rate: f64) -> Self {
        RateLaw::Radiolysis { o2_rate, h2_rate }
    }

    pub fn combined(components: Vec<RateLaw>) -> Self {
        RateLaw::Combined { components }
    }

    /// Erosion rate in kg s⁻¹ m⁻². Zero, negative or non-finite totals are
    /// rejected since they would turn into infinite or negative lifetimes.
    pub fn resolve(&self, constants: &PhysicalConstants) -> ErosionResult<f64> {
        let rate = self.component_sum(constants)?;
        if rate.is_finite() && rate > 0.0 {
            Ok(rate)
        } else {
            Err(ErosionError::NumericDegeneracy(format!(
                "{self} resolves to a non-positive erosion rate ({rate:e} kg/s/m²)"
            )))
        }
    }

    fn component_sum(&self, constants: &PhysicalConstants) -> ErosionResult<f64> {
        match self {
            RateLaw::Sputtering { rate } => {
                check_particle_rate("sputtering rate", *rate)?;
                Ok(rate * constants.h2o_mass)
            }
            RateLaw::Radiolysis { o2_rate, h2_rate } => {
                check_particle_rate("O2 radiolysis rate", *o2_rate)?;
                check_particle_rate("H2 radiolysis rate", *h2_rate)?;
                Ok(o2_rate * constants.o2_mass + h2_rate * constants.h2_mass)
            }
            RateLaw::Combined { components } => {
                if components.is_empty() {
                    return Err(ErosionError::NumericDegeneracy(
                        "combined rate law has no components".to_string(),
                    ));
                }
                components
                    .iter()
                    .map(|component| component.component_sum(constants))
                    .sum()
            }
        }
    }
}

fn check_particle_rate(name: &str, rate: f64) -> ErosionResult<()> {
    if rate.is_finite() && rate >= 0.0 {
        Ok(())
    } else {
        Err(ErosionError::NumericDegeneracy(format!(
            "{name} must be non-negative and finite, got {rate:e}"
        )))
    }
}

impl fmt::Display for RateLaw {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateLaw::Sputtering { rate } => write!(f, "sputtering({rate:e})"),
            RateLaw::Radiolysis { o2_rate, h2_rate } => {
                write!(f, "radiolysis(O2 {o2_rate:e}, H2 {h2_rate:e})")
            }
            RateLaw::Combined { components } => {
                write!(f, "combined[")?;
                for (i, component) in components.iter().enumerate() {
                    if i > 0 {
                        write!(f, " + ")?;
                    }
                    write!(f, "{component}")?;
                }
                write!(f, "]")
            }
        }
    }
}
