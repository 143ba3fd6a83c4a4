//! Dense (mass flux × eruption time) sweeps of the deposit lifetime.
//!
//! Every cell depends only on its own axis pair, so rows are filled in
//! parallel and written straight into their slot of the output buffer.

use log::{debug, info};
use ndarray::{Array1, Array2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::PhysicalConstants;
use crate::constants::{
    MAX_ERUPTION_TIME, MAX_MASS_FLUX, MIN_ERUPTION_TIME, MIN_MASS_FLUX, OBSERVED_ERUPTION_TIME,
    OBSERVED_MASS_FLUX, SWEEP_SAMPLES,
};
use crate::erosion_system::deposit::{
    compute_disappearance_seconds, compute_disappearance_time, DepositModel,
};
use crate::erosion_system::rate_law::RateLaw;
use crate::errors::{ErosionError, ErosionResult};

/// Unit of the eruption-time axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeUnit {
    #[default]
    Seconds,
    Months,
}

impl TimeUnit {
    pub fn to_seconds(self, value: f64, constants: &PhysicalConstants) -> f64 {
        match self {
            TimeUnit::Seconds => value,
            TimeUnit::Months => value * constants.seconds_per_month,
        }
    }
}

/// Unit the erosion time is reported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationUnit {
    #[default]
    Years,
    Seconds,
}

impl DurationUnit {
    /// A span given in years, expressed in this unit.
    pub fn years_in_unit(self, years: f64, constants: &PhysicalConstants) -> f64 {
        match self {
            DurationUnit::Years => years,
            DurationUnit::Seconds => years * constants.seconds_per_year,
        }
    }
}

/// Sample points `min..=max`, evenly spaced in log10.
pub fn logspace(min: f64, max: f64, samples: usize) -> Array1<f64> {
    let mut axis = Array1::logspace(10.0, min.log10(), max.log10(), samples);
    pin_endpoints(&mut axis, min, max);
    axis
}

/// Sample points `min..=max`, evenly spaced.
pub fn linspace(min: f64, max: f64, samples: usize) -> Array1<f64> {
    let mut axis = Array1::linspace(min, max, samples);
    pin_endpoints(&mut axis, min, max);
    axis
}

fn pin_endpoints(axis: &mut Array1<f64>, min: f64, max: f64) {
    let n = axis.len();
    if n > 0 {
        axis[0] = min;
        axis[n - 1] = max;
    }
}

/// The two sweep axes.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepGrid {
    mass_flux_rates: Array1<f64>,
    eruption_times: Array1<f64>,
}

impl SweepGrid {
    /// Axes must be non-empty, strictly increasing and positive.
    pub fn new(mass_flux_rates: Array1<f64>, eruption_times: Array1<f64>) -> ErosionResult<Self> {
        validate_axis("mass_flux_rates", &mass_flux_rates)?;
        validate_axis("eruption_times", &eruption_times)?;
        Ok(SweepGrid {
            mass_flux_rates,
            eruption_times,
        })
    }

    pub fn logspace(
        mass_flux_range: (f64, f64),
        eruption_time_range: (f64, f64),
        samples: usize,
    ) -> ErosionResult<Self> {
        check_range("mass_flux_range", mass_flux_range, samples)?;
        check_range("eruption_time_range", eruption_time_range, samples)?;
        SweepGrid::new(
            logspace(mass_flux_range.0, mass_flux_range.1, samples),
            logspace(eruption_time_range.0, eruption_time_range.1, samples),
        )
    }

    pub fn linspace(
        mass_flux_range: (f64, f64),
        eruption_time_range: (f64, f64),
        samples: usize,
    ) -> ErosionResult<Self> {
        check_range("mass_flux_range", mass_flux_range, samples)?;
        check_range("eruption_time_range", eruption_time_range, samples)?;
        SweepGrid::new(
            linspace(mass_flux_range.0, mass_flux_range.1, samples),
            linspace(eruption_time_range.0, eruption_time_range.1, samples),
        )
    }

    /// 1..1e4 kg/s against ~4.4 min..1 yr, 1000 log-spaced samples each.
    pub fn standard() -> ErosionResult<Self> {
        SweepGrid::logspace(
            (MIN_MASS_FLUX, MAX_MASS_FLUX),
            (MIN_ERUPTION_TIME, MAX_ERUPTION_TIME),
            SWEEP_SAMPLES,
        )
    }

    pub fn mass_flux_rates(&self) -> &Array1<f64> {
        &self.mass_flux_rates
    }

    pub fn eruption_times(&self) -> &Array1<f64> {
        &self.eruption_times
    }

    /// (eruption times, mass fluxes)
    pub fn shape(&self) -> (usize, usize) {
        (self.eruption_times.len(), self.mass_flux_rates.len())
    }
}

fn check_range(name: &str, range: (f64, f64), samples: usize) -> ErosionResult<()> {
    if samples < 2 {
        return Err(ErosionError::ConfigurationError(format!(
            "{name} needs at least 2 samples, got {samples}"
        )));
    }
    if !(range.0 > 0.0 && range.1 > range.0 && range.1.is_finite()) {
        return Err(ErosionError::ConfigurationError(format!(
            "{name} must satisfy 0 < min < max, got {:?}",
            range
        )));
    }
    Ok(())
}

fn validate_axis(name: &str, axis: &Array1<f64>) -> ErosionResult<()> {
    if axis.is_empty() {
        return Err(ErosionError::ConfigurationError(format!("{name} is empty")));
    }
    if let Some(bad) = axis.iter().find(|v| !(v.is_finite() && **v > 0.0)) {
        return Err(ErosionError::ConfigurationError(format!(
            "{name} must hold positive finite values, found {bad}"
        )));
    }
    if axis.windows(2).into_iter().any(|w| w[1] <= w[0]) {
        return Err(ErosionError::ConfigurationError(format!(
            "{name} must be strictly increasing"
        )));
    }
    Ok(())
}

/// Erosion time per sweep cell, indexed `[eruption_time][mass_flux]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ErosionTimeField {
    pub values: Array2<f64>,
    pub mass_flux_rates: Array1<f64>,
    pub eruption_times: Array1<f64>,
    pub unit: DurationUnit,
}

impl ErosionTimeField {
    pub fn value_at(&self, time_index: usize, flux_index: usize) -> Option<f64> {
        self.values.get([time_index, flux_index]).copied()
    }

    pub fn min(&self) -> f64 {
        self.values.iter().copied().fold(f64::INFINITY, f64::min)
    }

    pub fn max(&self) -> f64 {
        self.values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Mass flux at which each eruption-time row reaches `level`, found by
    /// interpolating linearly in log-log space between neighbouring samples.
    /// `None` where the row never crosses the level.
    pub fn level_crossings(&self, level: f64) -> Vec<Option<f64>> {
        let fluxes = &self.mass_flux_rates;
        self.values
            .rows()
            .into_iter()
            .map(|row| {
                for j in 0..row.len().saturating_sub(1) {
                    let (v0, v1) = (row[j], row[j + 1]);
                    if v0 == level {
                        return Some(fluxes[j]);
                    }
                    let brackets = (v0 < level && level < v1) || (v1 < level && level < v0);
                    if brackets {
                        return Some(interpolate_crossing(
                            (fluxes[j], v0),
                            (fluxes[j + 1], v1),
                            level,
                        ));
                    }
                }
                match row.iter().last() {
                    Some(&v) if v == level => fluxes.iter().last().copied(),
                    _ => None,
                }
            })
            .collect()
    }

    /// Smallest positive and largest value across several fields, the common
    /// colour range of a multi-panel figure.
    pub fn shared_extent(fields: &[ErosionTimeField]) -> Option<(f64, f64)> {
        let positive = fields
            .iter()
            .flat_map(|field| field.values.iter().copied())
            .filter(|v| *v > 0.0);
        positive.fold(None, |extent, v| match extent {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    }
}

fn interpolate_crossing((m0, v0): (f64, f64), (m1, v1): (f64, f64), level: f64) -> f64 {
    if v0 > 0.0 && v1 > 0.0 && m0 > 0.0 && m1 > 0.0 {
        let t = (level.ln() - v0.ln()) / (v1.ln() - v0.ln());
        (m0.ln() + t * (m1.ln() - m0.ln())).exp()
    } else {
        let t = (level - v0) / (v1 - v0);
        m0 + t * (m1 - m0)
    }
}

/// Decade contour levels `10^lo ..= 10^hi`.
pub fn decade_levels(lo_exponent: i32, hi_exponent: i32) -> Vec<f64> {
    (lo_exponent..=hi_exponent).map(|e| 10f64.powi(e)).collect()
}

/// A completed sweep together with the observed plume's erosion time.
#[derive(Debug, Clone)]
pub struct SweepResult {
    pub field: ErosionTimeField,
    pub observed: f64,
}

/// Evaluates the deposit lifetime for one rate law and deposit model.
#[derive(Debug, Clone)]
pub struct ErosionGridEvaluator {
    constants: PhysicalConstants,
    rate_law: RateLaw,
    deposit: DepositModel,
    erosion_rate: f64,
    time_unit: TimeUnit,
    duration_unit: DurationUnit,
}

impl ErosionGridEvaluator {
    /// Validates constants, deposit and rate law up front so that no sweep
    /// starts from a broken configuration.
    pub fn new(
        constants: PhysicalConstants,
        rate_law: RateLaw,
        deposit: DepositModel,
    ) -> ErosionResult<Self> {
        constants.validate()?;
        deposit.validate()?;
        let erosion_rate = rate_law.resolve(&constants)?;
        debug!("Resolved {} to {:e} kg/s/m²", rate_law, erosion_rate);

        Ok(ErosionGridEvaluator {
            constants,
            rate_law,
            deposit,
            erosion_rate,
            time_unit: TimeUnit::Seconds,
            duration_unit: DurationUnit::Years,
        })
    }

    pub fn with_units(mut self, time_unit: TimeUnit, duration_unit: DurationUnit) -> Self {
        self.time_unit = time_unit;
        self.duration_unit = duration_unit;
        self
    }

    pub fn erosion_rate(&self) -> f64 {
        self.erosion_rate
    }

    pub fn rate_law(&self) -> &RateLaw {
        &self.rate_law
    }

    pub fn deposit(&self) -> &DepositModel {
        &self.deposit
    }

    /// Erosion time for one (mass flux, eruption time) pair, with the
    /// eruption time in the evaluator's time unit.
    pub fn evaluate_point(&self, mass_flux: f64, eruption_time: f64) -> f64 {
        let duration = self.time_unit.to_seconds(eruption_time, &self.constants);
        self.erosion_time(mass_flux, duration)
    }

    fn erosion_time(&self, mass_flux: f64, eruption_seconds: f64) -> f64 {
        let mass = self
            .deposit
            .deposited_mass(mass_flux, eruption_seconds, &self.constants);
        let area = self.constants.source_area;
        match self.duration_unit {
            DurationUnit::Years => {
                compute_disappearance_time(mass, self.erosion_rate, area, &self.constants)
            }
            DurationUnit::Seconds => compute_disappearance_seconds(mass, self.erosion_rate, area),
        }
    }

    /// Erosion time of the observed plume (7000 kg/s for 25200 s).
    pub fn observed_point(&self) -> ErosionResult<f64> {
        let value = self.erosion_time(OBSERVED_MASS_FLUX, OBSERVED_ERUPTION_TIME);
        if value.is_finite() && value >= 0.0 {
            Ok(value)
        } else {
            Err(ErosionError::NumericDegeneracy(format!(
                "observed plume evaluates to {value} under {}",
                self.rate_law
            )))
        }
    }

    pub fn evaluate(&self, grid: &SweepGrid) -> ErosionResult<SweepResult> {
        let observed = self.observed_point()?;
        let (n_times, n_fluxes) = grid.shape();
        debug!(
            "Sweeping {} x {} cells under {}",
            n_times, n_fluxes, self.rate_law
        );

        let fluxes = grid.mass_flux_rates();
        let times = grid.eruption_times();
        let mut buffer = vec![0.0; n_times * n_fluxes];
        buffer
            .par_chunks_mut(n_fluxes)
            .enumerate()
            .for_each(|(i, row)| {
                let t = times[i];
                for (cell, &m) in row.iter_mut().zip(fluxes.iter()) {
                    *cell = self.evaluate_point(m, t);
                }
            });

        let values = Array2::from_shape_vec((n_times, n_fluxes), buffer).map_err(|e| {
            ErosionError::ConfigurationError(format!("sweep buffer has the wrong shape: {e}"))
        })?;

        let field = ErosionTimeField {
            values,
            mass_flux_rates: fluxes.clone(),
            eruption_times: times.clone(),
            unit: self.duration_unit,
        };
        info!(
            "Swept {} cells under {}: observed plume {:.3e}, range {:.3e}..{:.3e}",
            n_times * n_fluxes,
            self.rate_law,
            observed,
            field.min(),
            field.max()
        );

        Ok(SweepResult { field, observed })
    }
}

/// Sweep a distant deposit of the given base density [kg/m³ per kg/s].
pub fn evaluate_grid(
    rate_law: &RateLaw,
    base_density: f64,
    axes: &SweepGrid,
    constants: &PhysicalConstants,
) -> ErosionResult<SweepResult> {
    ErosionGridEvaluator::new(
        constants.clone(),
        rate_law.clone(),
        DepositModel::Distant { base_density },
    )?
    .evaluate(axes)
}
