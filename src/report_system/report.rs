use log::{info, warn};

use crate::config::PhysicalConstants;
use crate::constants::{
    METERS_PER_KM, REFERENCE_DEPOSIT_AGE, SECONDS_PER_DAY, SECONDS_PER_HOUR, SECONDS_PER_MONTH,
};
use crate::erosion_system::sweep::{DurationUnit, SweepResult};
use crate::surface_system::sampling::SurfaceProfile;

/// Eruption length in the largest of months, days, hours or minutes that
/// keeps the value at or above one.
pub fn format_eruption_time(seconds: f64) -> String {
    let units = [
        (SECONDS_PER_MONTH, "months"),
        (SECONDS_PER_DAY, "d"),
        (SECONDS_PER_HOUR, "h"),
        (60.0, "min"),
    ];
    match units.iter().find(|(length, _)| seconds >= *length) {
        Some((length, label)) => format!("{:.2} {}", seconds / length, label),
        None => format!("{:.2} s", seconds),
    }
}

/// Erosion times span many decades, so anything outside 0.01..1e4 is
/// printed in scientific notation.
pub fn format_years(years: f64) -> String {
    if (0.01..1e4).contains(&years) {
        format!("{:.2} yr", years)
    } else {
        format!("{:.3e} yr", years)
    }
}

pub fn format_distance(distance: f64) -> String {
    if distance >= METERS_PER_KM {
        format!("{:.2} km", distance / METERS_PER_KM)
    } else {
        format!("{:.2} m", distance)
    }
}

pub fn format_duration(value: f64, unit: DurationUnit) -> String {
    match unit {
        DurationUnit::Years => format_years(value),
        DurationUnit::Seconds => format!("{:.3e} s", value),
    }
}

/// Summary of one scenario sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepSummary {
    pub name: String,
    pub unit: DurationUnit,
    pub observed: f64,
    pub min: f64,
    pub max: f64,
    /// Rows whose erosion time reaches the reference deposit age.
    pub rows_reaching_reference: usize,
    /// Smallest and largest mass flux on the reference-age contour.
    pub reference_flux_range: Option<(f64, f64)>,
}

/// Collects sweep summaries for the driver's closing log.
#[derive(Debug)]
pub struct SweepReport {
    constants: PhysicalConstants,
    summaries: Vec<SweepSummary>,
}

impl SweepReport {
    /// `constants` must be the ones the recorded sweeps ran with.
    pub fn new(constants: &PhysicalConstants) -> Self {
        SweepReport {
            constants: constants.clone(),
            summaries: Vec::new(),
        }
    }

    pub fn record(&mut self, name: &str, result: &SweepResult) -> &SweepSummary {
        let field = &result.field;
        let level = field
            .unit
            .years_in_unit(REFERENCE_DEPOSIT_AGE, &self.constants);
        let crossings: Vec<f64> = field.level_crossings(level).into_iter().flatten().collect();
        let reference_flux_range = crossings.iter().fold(None, |range, &m| match range {
            None => Some((m, m)),
            Some((lo, hi)) => Some((f64::min(lo, m), f64::max(hi, m))),
        });

        let index = self.summaries.len();
        self.summaries.push(SweepSummary {
            name: name.to_string(),
            unit: field.unit,
            observed: result.observed,
            min: field.min(),
            max: field.max(),
            rows_reaching_reference: crossings.len(),
            reference_flux_range,
        });
        &self.summaries[index]
    }

    pub fn summaries(&self) -> &[SweepSummary] {
        &self.summaries
    }

    pub fn lines(&self) -> Vec<String> {
        self.summaries
            .iter()
            .map(|s| {
                let contour = match s.reference_flux_range {
                    Some((lo, hi)) => format!(
                        "{}-year contour at {:.3e}..{:.3e} kg/s ({} rows)",
                        REFERENCE_DEPOSIT_AGE, lo, hi, s.rows_reaching_reference
                    ),
                    None => format!("no {}-year contour", REFERENCE_DEPOSIT_AGE),
                };
                format!(
                    "{}: observed plume {}, range {}..{}, {}",
                    s.name,
                    format_duration(s.observed, s.unit),
                    format_duration(s.min, s.unit),
                    format_duration(s.max, s.unit),
                    contour
                )
            })
            .collect()
    }

    pub fn log_summary(&self) {
        info!("--- Erosion Summary ---");
        for line in self.lines() {
            info!("{}", line);
        }
    }
}

/// Log a surface profile, warning when cells have been stripped bare.
pub fn log_profile(profile: &SurfaceProfile, remaining: &[f64]) {
    if let Some((arc, rho)) = profile.peak_density() {
        info!(
            "Profile '{}': {} cells, peak {:.3e} /cm³ at {} along the surface",
            profile.label,
            profile.len(),
            rho,
            format_distance(arc)
        );
    }
    let depleted = SurfaceProfile::depleted_cells(remaining);
    if depleted > 0 {
        warn!(
            "Profile '{}': {} of {} surface cells fully eroded",
            profile.label,
            depleted,
            remaining.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::erosion_system::sweep::ErosionTimeField;
    use ndarray::array;

    #[test]
    fn test_format_eruption_time() {
        assert_eq!(format_eruption_time(25_200.0), "7.00 h");
        assert_eq!(format_eruption_time(2.5 * 2.628e6), "2.50 months");
        assert_eq!(format_eruption_time(172_800.0), "2.00 d");
        assert_eq!(format_eruption_time(90.0), "1.50 min");
        assert_eq!(format_eruption_time(4.0), "4.00 s");
    }

    #[test]
    fn test_format_years_and_distance() {
        assert_eq!(format_years(5.388), "5.39 yr");
        assert_eq!(format_years(5046.159), "5046.16 yr");
        assert_eq!(format_years(33_495.16), "3.350e4 yr");
        assert_eq!(format_years(0.002), "2.000e-3 yr");
        assert_eq!(format_distance(2500.0), "2.50 km");
        assert_eq!(format_distance(12.0), "12.00 m");
    }

    #[test]
    fn test_record_finds_reference_contour() {
        let result = SweepResult {
            field: ErosionTimeField {
                values: array![[1.0, 10.0, 100.0], [10.0, 100.0, 1000.0]],
                mass_flux_rates: array![1.0, 10.0, 100.0],
                eruption_times: array![1.0, 10.0],
                unit: DurationUnit::Years,
            },
            observed: 0.5,
        };
        let mut report = SweepReport::new(&PhysicalConstants::default());
        let summary = report.record("panel", &result).clone();

        assert_eq!(summary.rows_reaching_reference, 2);
        let (lo, hi) = summary.reference_flux_range.unwrap();
        assert!(lo < hi);
        assert!((1.0..100.0).contains(&lo));
        assert_eq!(summary.max, 1000.0);
        assert!(report.lines()[0].starts_with("panel: observed plume"));
    }

    #[test]
    fn test_record_without_contour() {
        let result = SweepResult {
            field: ErosionTimeField {
                values: array![[1.0, 2.0]],
                mass_flux_rates: array![1.0, 2.0],
                eruption_times: array![1.0],
                unit: DurationUnit::Years,
            },
            observed: 1.5,
        };
        let mut report = SweepReport::new(&PhysicalConstants::default());
        assert_eq!(report.record("flat", &result).reference_flux_range, None);
        assert!(report.lines()[0].contains("no 28-year contour"));
    }

    #[test]
    fn test_seconds_field_uses_configured_year() {
        let constants = PhysicalConstants {
            seconds_per_year: 1.0,
            ..PhysicalConstants::default()
        };
        // With a one-second year the reference age is 28 s
        let result = SweepResult {
            field: ErosionTimeField {
                values: array![[10.0, 100.0]],
                mass_flux_rates: array![1.0, 10.0],
                eruption_times: array![1.0],
                unit: DurationUnit::Seconds,
            },
            observed: 50.0,
        };
        let mut report = SweepReport::new(&constants);
        assert_eq!(report.record("seconds", &result).rows_reaching_reference, 1);
    }
}
