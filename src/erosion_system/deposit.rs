use serde::{Deserialize, Serialize};

use crate::config::{require_positive, PhysicalConstants};
use crate::errors::ErosionResult;

/// Deposit density for a plume of the given source mass flux [kg/m³].
/// `base_density` is the density produced by 1 kg/s at the source.
pub fn compute_density(base_density: f64, mass_flux: f64) -> f64 {
    base_density * mass_flux
}

/// Mass rate of ejecta falling back onto the deposit area [kg/s].
pub fn compute_falling_flux(density: f64, area: f64, velocity: f64) -> f64 {
    density * area * velocity
}

/// Mass laid down over one eruption of `eruption_duration` seconds [kg].
pub fn compute_total_particles(falling_flux: f64, eruption_duration: f64) -> f64 {
    falling_flux * eruption_duration
}

/// Seconds needed to erode `particle_mass` at a constant `erosion_rate`
/// [kg s⁻¹ m⁻²] over `area`.
pub fn compute_disappearance_seconds(particle_mass: f64, erosion_rate: f64, area: f64) -> f64 {
    debug_assert!(erosion_rate > 0.0, "erosion rate must be positive");
    particle_mass / (erosion_rate * area)
}

/// Years needed to erode `particle_mass` at a constant `erosion_rate`, using
/// the year length of `constants`.
pub fn compute_disappearance_time(
    particle_mass: f64,
    erosion_rate: f64,
    area: f64,
    constants: &PhysicalConstants,
) -> f64 {
    compute_disappearance_seconds(particle_mass, erosion_rate, area) / constants.seconds_per_year
}

/// How much of the erupted mass ends up in the deposit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DepositModel {
    /// The whole source mass flux lands on the deposit area.
    AtSource,
    /// Deposit away from the source, fed by ejecta falling through a plume of
    /// density `base_density` per kg/s of source flux [kg/m³].
    Distant { base_density: f64 },
}

impl DepositModel {
    /// Build a distant deposit from a plume number density [particles/cm³]
    /// measured for a 1 kg/s source.
    pub fn distant_from_ppcc(density_ppcc: f64, constants: &PhysicalConstants) -> Self {
        DepositModel::Distant {
            base_density: density_ppcc * constants.h2o_mass * constants.cm3_per_m3,
        }
    }

    pub fn validate(&self) -> ErosionResult<()> {
        match self {
            DepositModel::AtSource => Ok(()),
            DepositModel::Distant { base_density } => require_positive("base_density", *base_density),
        }
    }

    /// Deposited mass [kg] for one eruption.
    pub fn deposited_mass(
        &self,
        mass_flux: f64,
        eruption_duration: f64,
        constants: &PhysicalConstants,
    ) -> f64 {
        let falling_flux = match self {
            DepositModel::AtSource => mass_flux,
            DepositModel::Distant { base_density } => {
                let density = compute_density(*base_density, mass_flux);
                compute_falling_flux(density, constants.source_area, constants.ejecta_velocity)
            }
        };
        compute_total_particles(falling_flux, eruption_duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{DENSITY_PPCC_50KM, OBSERVED_ERUPTION_TIME, OBSERVED_MASS_FLUX};
    use approx::assert_relative_eq;

    #[test]
    fn test_fifty_km_chain() {
        let constants = PhysicalConstants::default();
        let DepositModel::Distant { base_density } =
            DepositModel::distant_from_ppcc(DENSITY_PPCC_50KM, &constants)
        else {
            panic!("expected a distant deposit");
        };
        assert_relative_eq!(base_density, 3.10648e-17, max_relative = 1e-12);

        let density = compute_density(base_density, OBSERVED_MASS_FLUX);
        assert_relative_eq!(density, 2.174536e-13, max_relative = 1e-12);

        let falling = compute_falling_flux(density, constants.source_area, constants.ejecta_velocity);
        assert_relative_eq!(falling, 1.00028656e-2, max_relative = 1e-12);

        let total = compute_total_particles(falling, OBSERVED_ERUPTION_TIME);
        assert_relative_eq!(total, 252.07221312, max_relative = 1e-12);
    }

    #[test]
    fn test_disappearance_time_in_years() {
        // 3.154e7 kg at 1 kg/s/m² over 1 m² takes one year
        let constants = PhysicalConstants::default();
        assert_relative_eq!(compute_disappearance_time(3.154e7, 1.0, 1.0, &constants), 1.0);
        assert_relative_eq!(compute_disappearance_seconds(10.0, 0.5, 4.0), 5.0);
    }

    #[test]
    fn test_at_source_passes_flux_through() {
        let constants = PhysicalConstants::default();
        assert_eq!(
            DepositModel::AtSource.deposited_mass(7000.0, 25_200.0, &constants),
            7000.0 * 25_200.0
        );
    }

    #[test]
    fn test_distant_requires_positive_density() {
        assert!(DepositModel::Distant { base_density: 0.0 }.validate().is_err());
        assert!(DepositModel::AtSource.validate().is_ok());
    }
}
