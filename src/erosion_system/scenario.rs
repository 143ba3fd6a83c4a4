use log::info;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::config::PhysicalConstants;
use crate::constants::{
    DENSITY_PPCC_25KM, DENSITY_PPCC_50KM, MAX_ERUPTION_TIME, MAX_MASS_FLUX, MIN_ERUPTION_TIME,
    MIN_MASS_FLUX, SURFACE_SPUTTERING_RATE, SWEEP_SAMPLES,
};
use crate::erosion_system::deposit::DepositModel;
use crate::erosion_system::rate_law::RateLaw;
use crate::erosion_system::sweep::{
    linspace, logspace, DurationUnit, ErosionGridEvaluator, SweepGrid, SweepResult, TimeUnit,
};
use crate::errors::{ErosionError, ErosionResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisSpacing {
    Linear,
    #[default]
    Logarithmic,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisSpec {
    pub min: f64,
    pub max: f64,
    pub samples: usize,
    #[serde(default)]
    pub spacing: AxisSpacing,
}

impl AxisSpec {
    pub fn linear(min: f64, max: f64, samples: usize) -> Self {
        AxisSpec {
            min,
            max,
            samples,
            spacing: AxisSpacing::Linear,
        }
    }

    pub fn log(min: f64, max: f64, samples: usize) -> Self {
        AxisSpec {
            min,
            max,
            samples,
            spacing: AxisSpacing::Logarithmic,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SweepSpec {
    pub mass_flux: AxisSpec,
    pub eruption_time: AxisSpec,
}

impl SweepSpec {
    pub fn standard() -> Self {
        SweepSpec {
            mass_flux: AxisSpec::log(MIN_MASS_FLUX, MAX_MASS_FLUX, SWEEP_SAMPLES),
            eruption_time: AxisSpec::log(MIN_ERUPTION_TIME, MAX_ERUPTION_TIME, SWEEP_SAMPLES),
        }
    }

    pub fn build(&self) -> ErosionResult<SweepGrid> {
        let mass_flux = build_axis("mass_flux", &self.mass_flux)?;
        let eruption_time = build_axis("eruption_time", &self.eruption_time)?;
        SweepGrid::new(mass_flux, eruption_time)
    }
}

fn build_axis(name: &str, spec: &AxisSpec) -> ErosionResult<Array1<f64>> {
    if spec.samples < 2 || !(spec.min > 0.0 && spec.max > spec.min) {
        return Err(ErosionError::ConfigurationError(format!(
            "{name} axis must have 0 < min < max and at least 2 samples, got {:?}",
            spec
        )));
    }
    Ok(match spec.spacing {
        AxisSpacing::Linear => linspace(spec.min, spec.max, spec.samples),
        AxisSpacing::Logarithmic => logspace(spec.min, spec.max, spec.samples),
    })
}

/// One named erosion scenario: the process, where the deposit sits and how
/// the parameter space is swept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSpec {
    pub name: String,
    pub rate_law: RateLaw,
    pub deposit: DepositModel,
    #[serde(default = "SweepSpec::standard")]
    pub sweep: SweepSpec,
    #[serde(default)]
    pub time_unit: TimeUnit,
    #[serde(default)]
    pub duration_unit: DurationUnit,
}

impl ScenarioSpec {
    pub fn new(name: &str, rate_law: RateLaw, deposit: DepositModel) -> Self {
        ScenarioSpec {
            name: name.to_string(),
            rate_law,
            deposit,
            sweep: SweepSpec::standard(),
            time_unit: TimeUnit::Seconds,
            duration_unit: DurationUnit::Years,
        }
    }

    pub fn with_sweep(mut self, sweep: SweepSpec) -> Self {
        self.sweep = sweep;
        self
    }

    pub fn with_units(mut self, time_unit: TimeUnit, duration_unit: DurationUnit) -> Self {
        self.time_unit = time_unit;
        self.duration_unit = duration_unit;
        self
    }

    /// Check everything `run` would reject before any sweep starts,
    /// including a rate law that resolves to no erosion.
    pub fn validate(&self, constants: &PhysicalConstants) -> ErosionResult<()> {
        self.deposit.validate()?;
        self.rate_law.resolve(constants)?;
        self.sweep.build().map(|_| ())
    }

    pub fn evaluator(&self, constants: &PhysicalConstants) -> ErosionResult<ErosionGridEvaluator> {
        Ok(
            ErosionGridEvaluator::new(constants.clone(), self.rate_law.clone(), self.deposit)?
                .with_units(self.time_unit, self.duration_unit),
        )
    }

    pub fn run(&self, constants: &PhysicalConstants) -> ErosionResult<SweepResult> {
        info!("Running scenario '{}'", self.name);
        let evaluator = self.evaluator(constants)?;
        let grid = self.sweep.build()?;
        evaluator.evaluate(&grid)
    }
}

/// Scenarios behind the published erosion-time figures.
pub struct ScenarioFactory;

impl ScenarioFactory {
    fn quarter_distance(constants: &PhysicalConstants) -> DepositModel {
        DepositModel::distant_from_ppcc(DENSITY_PPCC_25KM, constants)
    }

    /// Sputtering 50 km from the source.
    pub fn fifty_km_sputtering(constants: &PhysicalConstants) -> ScenarioSpec {
        ScenarioSpec::new(
            "Sputtering 50 km from source",
            RateLaw::sputtering(SURFACE_SPUTTERING_RATE),
            DepositModel::distant_from_ppcc(DENSITY_PPCC_50KM, constants),
        )
    }

    /// Average sputtering and radiolysis on a deposit at the source.
    pub fn average_at_source() -> ScenarioSpec {
        ScenarioSpec::new(
            "Sputtering and radiolysis at source",
            RateLaw::combined(vec![
                RateLaw::sputtering(2.5e14),
                RateLaw::radiolysis(6.3e13, 8e13),
            ]),
            DepositModel::AtSource,
        )
    }

    pub fn trailing_hemisphere_sputtering(constants: &PhysicalConstants) -> ScenarioSpec {
        ScenarioSpec::new(
            "Sputtering at T.H.",
            RateLaw::sputtering(2.251e15),
            Self::quarter_distance(constants),
        )
    }

    pub fn leading_hemisphere_sputtering(constants: &PhysicalConstants) -> ScenarioSpec {
        ScenarioSpec::new(
            "Sputtering at L.H.",
            RateLaw::sputtering(1.2e14 + 2.4e14 + 2.1e12),
            Self::quarter_distance(constants),
        )
    }

    pub fn subsolar_point_radiolysis(constants: &PhysicalConstants) -> ScenarioSpec {
        ScenarioSpec::new(
            "Radiolysis at S.S.P.",
            RateLaw::radiolysis(9.0e15 + 1.8e16 + 1.4e14, 2.1e14 + 4.1e14 + 3.3e12),
            Self::quarter_distance(constants),
        )
    }

    pub fn antisolar_point_radiolysis(constants: &PhysicalConstants) -> ScenarioSpec {
        ScenarioSpec::new(
            "Radiolysis at A.S.P.",
            RateLaw::radiolysis(4e15 + 7.8e15 + 6.3e13, 5e13 + 9.9e13 + 8e11),
            Self::quarter_distance(constants),
        )
    }

    /// Strongest combined erosion 25 km from the source.
    pub fn combined_maximum(constants: &PhysicalConstants) -> ScenarioSpec {
        ScenarioSpec::new(
            "Maximum case 25 km from source",
            RateLaw::combined(vec![
                RateLaw::radiolysis(2.714e16, 6.23e14),
                RateLaw::sputtering(2.251e15),
            ]),
            Self::quarter_distance(constants),
        )
    }

    /// Weakest combined erosion 25 km from the source.
    pub fn combined_minimum(constants: &PhysicalConstants) -> ScenarioSpec {
        ScenarioSpec::new(
            "Minimum case 25 km from source",
            RateLaw::combined(vec![
                RateLaw::radiolysis(1.1863e16, 1.498e14),
                RateLaw::sputtering(3.621e14),
            ]),
            Self::quarter_distance(constants),
        )
    }

    /// Sputtering of a deposit at the source on the standard log grid.
    pub fn at_source_sputtering() -> ScenarioSpec {
        ScenarioSpec::new(
            "Sputtering at source",
            RateLaw::sputtering(SURFACE_SPUTTERING_RATE),
            DepositModel::AtSource,
        )
    }

    /// Eruptions of up to nine months, mass flux stepped by 10 kg/s.
    pub fn at_source_months() -> ScenarioSpec {
        ScenarioSpec::new(
            "Sputtering at source, eruption in months",
            RateLaw::sputtering(SURFACE_SPUTTERING_RATE),
            DepositModel::AtSource,
        )
        .with_sweep(SweepSpec {
            mass_flux: AxisSpec::linear(1.0, 9_991.0, 1000),
            eruption_time: AxisSpec::linear(1e-4, 9.0, 1000),
        })
        .with_units(TimeUnit::Months, DurationUnit::Years)
    }

    /// Short eruptions with the erosion time left in seconds.
    pub fn at_source_seconds() -> ScenarioSpec {
        ScenarioSpec::new(
            "Sputtering at source, erosion in seconds",
            RateLaw::sputtering(SURFACE_SPUTTERING_RATE),
            DepositModel::AtSource,
        )
        .with_sweep(SweepSpec {
            mass_flux: AxisSpec::linear(1.0, 9_991.0, 1000),
            eruption_time: AxisSpec::linear(1.0, 30_000.0, 100),
        })
        .with_units(TimeUnit::Seconds, DurationUnit::Seconds)
    }

    /// The four single-process panels, in figure order.
    pub fn erosion_factor_panels(constants: &PhysicalConstants) -> Vec<ScenarioSpec> {
        vec![
            Self::trailing_hemisphere_sputtering(constants),
            Self::leading_hemisphere_sputtering(constants),
            Self::subsolar_point_radiolysis(constants),
            Self::antisolar_point_radiolysis(constants),
        ]
    }

    pub fn all(constants: &PhysicalConstants) -> Vec<ScenarioSpec> {
        let mut scenarios = vec![
            Self::fifty_km_sputtering(constants),
            Self::average_at_source(),
            Self::at_source_sputtering(),
            Self::at_source_months(),
            Self::at_source_seconds(),
        ];
        scenarios.extend(Self::erosion_factor_panels(constants));
        scenarios.push(Self::combined_maximum(constants));
        scenarios.push(Self::combined_minimum(constants));
        scenarios
    }
}
