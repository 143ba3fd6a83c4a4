use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{
    CM3_PER_M3, EJECTA_VELOCITY, EUROPA_RADIUS, H2O_PARTICLE_MASS, H2_PARTICLE_MASS,
    O2_PARTICLE_MASS, PLUME_SOURCE_AREA, SECONDS_PER_MONTH, SECONDS_PER_YEAR, VOLUME_CELL_EDGE,
};
use crate::errors::{ErosionError, ErosionResult};
use crate::erosion_system::scenario::ScenarioSpec;

/// Constants shared by every erosion sweep of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicalConstants {
    /// Deposit footprint around the plume source [m²]
    #[serde(default = "default_source_area")]
    pub source_area: f64,
    /// Mean speed of ejecta falling back onto the surface [m/s]
    #[serde(default = "default_ejecta_velocity")]
    pub ejecta_velocity: f64,
    #[serde(default = "default_h2o_mass")]
    pub h2o_mass: f64,
    #[serde(default = "default_o2_mass")]
    pub o2_mass: f64,
    #[serde(default = "default_h2_mass")]
    pub h2_mass: f64,
    #[serde(default = "default_cm3_per_m3")]
    pub cm3_per_m3: f64,
    #[serde(default = "default_seconds_per_month")]
    pub seconds_per_month: f64,
    #[serde(default = "default_seconds_per_year")]
    pub seconds_per_year: f64,
}

fn default_source_area() -> f64 {
    PLUME_SOURCE_AREA
}
fn default_ejecta_velocity() -> f64 {
    EJECTA_VELOCITY
}
fn default_h2o_mass() -> f64 {
    H2O_PARTICLE_MASS
}
fn default_o2_mass() -> f64 {
    O2_PARTICLE_MASS
}
fn default_h2_mass() -> f64 {
    H2_PARTICLE_MASS
}
fn default_cm3_per_m3() -> f64 {
    CM3_PER_M3
}
fn default_seconds_per_month() -> f64 {
    SECONDS_PER_MONTH
}
fn default_seconds_per_year() -> f64 {
    SECONDS_PER_YEAR
}

impl Default for PhysicalConstants {
    fn default() -> Self {
        PhysicalConstants {
            source_area: PLUME_SOURCE_AREA,
            ejecta_velocity: EJECTA_VELOCITY,
            h2o_mass: H2O_PARTICLE_MASS,
            o2_mass: O2_PARTICLE_MASS,
            h2_mass: H2_PARTICLE_MASS,
            cm3_per_m3: CM3_PER_M3,
            seconds_per_month: SECONDS_PER_MONTH,
            seconds_per_year: SECONDS_PER_YEAR,
        }
    }
}

impl PhysicalConstants {
    pub fn validate(&self) -> ErosionResult<()> {
        require_positive("source_area", self.source_area)?;
        require_positive("ejecta_velocity", self.ejecta_velocity)?;
        require_positive("h2o_mass", self.h2o_mass)?;
        require_positive("o2_mass", self.o2_mass)?;
        require_positive("h2_mass", self.h2_mass)?;
        require_positive("cm3_per_m3", self.cm3_per_m3)?;
        require_positive("seconds_per_month", self.seconds_per_month)?;
        require_positive("seconds_per_year", self.seconds_per_year)
    }
}

/// The body and simulation grid a density volume was produced for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyConfig {
    /// Body radius [m]
    #[serde(default = "default_radius")]
    pub radius: f64,
    /// Downward ejecta speed used for the surface flux [m/s]
    #[serde(default = "default_ejecta_velocity")]
    pub downward_velocity: f64,
    /// Edge length of one volume cell [m]
    #[serde(default = "default_cell_edge")]
    pub cell_edge: f64,
    /// Superparticles per cell to particles per cm³
    pub density_conversion_ppcc: f64,
}

fn default_radius() -> f64 {
    EUROPA_RADIUS
}
fn default_cell_edge() -> f64 {
    VOLUME_CELL_EDGE
}

impl BodyConfig {
    pub fn new(
        radius: f64,
        downward_velocity: f64,
        cell_edge: f64,
        density_conversion_ppcc: f64,
    ) -> Self {
        BodyConfig {
            radius,
            downward_velocity,
            cell_edge,
            density_conversion_ppcc,
        }
    }

    pub fn europa(density_conversion_ppcc: f64) -> Self {
        BodyConfig::new(
            EUROPA_RADIUS,
            EJECTA_VELOCITY,
            VOLUME_CELL_EDGE,
            density_conversion_ppcc,
        )
    }

    /// Horizontal area of one surface cell [m²]
    pub fn cell_area(&self) -> f64 {
        self.cell_edge.powi(2)
    }

    pub fn validate(&self) -> ErosionResult<()> {
        require_positive("radius", self.radius)?;
        require_positive("downward_velocity", self.downward_velocity)?;
        require_positive("cell_edge", self.cell_edge)?;
        require_positive("density_conversion_ppcc", self.density_conversion_ppcc)
    }
}

/// Top-level run configuration as read from JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default)]
    pub constants: PhysicalConstants,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<BodyConfig>,
    #[serde(default)]
    pub scenarios: Vec<ScenarioSpec>,
}

impl SimulationConfig {
    pub fn from_json_str(json: &str) -> ErosionResult<Self> {
        let config: SimulationConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> ErosionResult<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> ErosionResult<()> {
        self.constants.validate()?;
        if let Some(body) = &self.body {
            body.validate()?;
        }
        for scenario in &self.scenarios {
            scenario.validate(&self.constants)?;
        }
        Ok(())
    }
}

pub(crate) fn require_positive(name: &str, value: f64) -> ErosionResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ErosionError::ConfigurationError(format!(
            "{name} must be a positive finite number, got {value}"
        )))
    }
}
