use log::debug;

use crate::config::BodyConfig;
use crate::constants::CM3_PER_M3;
use crate::errors::ErosionResult;
use crate::surface_system::boundary::{SurfaceCell, SurfaceTrace};
use crate::surface_system::volume::DensityVolume;

/// Read the volume at each surface cell of the plane `x_slice`, in traversal
/// order. Cell positions are re-quantized against the volume's own axes.
pub fn sample_field_at_surface(
    volume: &DensityVolume,
    x_slice: usize,
    surface_cells: &[SurfaceCell],
) -> ErosionResult<Vec<f64>> {
    let y_mapping = volume.y_mapping()?;
    let z_mapping = volume.z_mapping()?;
    let plane = volume.slice_x(x_slice)?;

    surface_cells
        .iter()
        .map(|cell| {
            let iy = y_mapping.checked_index("y", cell.position.y)?;
            let iz = z_mapping.checked_index("z", cell.position.z)?;
            Ok(plane[[iy, iz]])
        })
        .collect()
}

/// Flux through each cell face: `density * area * velocity`.
pub fn mass_flux(density: &[f64], area: f64, velocity: f64) -> Vec<f64> {
    density.iter().map(|rho| rho * area * velocity).collect()
}

/// Particles left after `elapsed_time` of sputtering. Negative results mean
/// the cell was fully stripped and are returned as-is.
pub fn particles_after_depletion(
    particle_count: f64,
    sputter_rate_per_area: f64,
    elapsed_time: f64,
    area: f64,
) -> f64 {
    particle_count - sputter_rate_per_area * elapsed_time * area
}

/// Surface curves for one simulated time (e.g. before, during or after an
/// eruption), all in traversal order.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceProfile {
    pub label: String,
    pub arc_length: Vec<f64>,
    /// Particles per cm³
    pub density: Vec<f64>,
    /// Particles per second falling through each cell face
    pub flux: Vec<f64>,
}

impl SurfaceProfile {
    pub fn sample(
        label: &str,
        volume: &DensityVolume,
        x_slice: usize,
        trace: &SurfaceTrace,
        body: &BodyConfig,
    ) -> ErosionResult<Self> {
        let raw = sample_field_at_surface(volume, x_slice, &trace.cells)?;
        let density: Vec<f64> = raw
            .iter()
            .map(|count| count * body.density_conversion_ppcc)
            .collect();
        let per_m3: Vec<f64> = density.iter().map(|ppcc| ppcc * CM3_PER_M3).collect();
        let flux = mass_flux(&per_m3, body.cell_area(), body.downward_velocity);
        debug!(
            "Sampled '{}' profile over {} surface cells",
            label,
            density.len()
        );

        Ok(SurfaceProfile {
            label: label.to_string(),
            arc_length: trace.arc_lengths(),
            density,
            flux,
        })
    }

    pub fn len(&self) -> usize {
        self.density.len()
    }

    pub fn is_empty(&self) -> bool {
        self.density.is_empty()
    }

    /// Particles laid on each cell by an eruption of the given duration.
    pub fn deposited(&self, eruption_duration: f64) -> Vec<f64> {
        self.flux.iter().map(|f| f * eruption_duration).collect()
    }

    pub fn particles_remaining(
        &self,
        eruption_duration: f64,
        sputter_rate_per_area: f64,
        elapsed_time: f64,
        area: f64,
    ) -> Vec<f64> {
        self.deposited(eruption_duration)
            .into_iter()
            .map(|count| particles_after_depletion(count, sputter_rate_per_area, elapsed_time, area))
            .collect()
    }

    /// Cells with nothing left.
    pub fn depleted_cells(remaining: &[f64]) -> usize {
        remaining.iter().filter(|n| **n <= 0.0).count()
    }

    pub fn peak_density(&self) -> Option<(f64, f64)> {
        self.arc_length
            .iter()
            .zip(self.density.iter())
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(arc, rho)| (*arc, *rho))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface_system::boundary::{order_boundary_by_traversal, south_pole, TraversalDirection};
    use crate::utils::point2d::Point2D;
    use approx::assert_relative_eq;
    use ndarray::{array, Array3};

    fn ones_volume() -> DensityVolume {
        let axis = array![-1.0, 0.0, 1.0];
        DensityVolume::new(Array3::ones((3, 3, 3)), axis.clone(), axis.clone(), axis).unwrap()
    }

    fn cell_at(y: f64, z: f64) -> SurfaceCell {
        SurfaceCell {
            ordinal: 0,
            position: Point2D::new(y, z),
            y_index: 0,
            z_index: 0,
            arc_length: 0.0,
        }
    }

    #[test]
    fn test_depletion_goes_negative() {
        assert_eq!(particles_after_depletion(1000.0, 10.0, 200.0, 1.0), -1000.0);
        assert_eq!(particles_after_depletion(1000.0, 1.0, 200.0, 1.0), 800.0);
    }

    #[test]
    fn test_mass_flux_elementwise() {
        assert_eq!(mass_flux(&[1.0, 2.0], 3.0, 4.0), vec![12.0, 24.0]);
    }

    #[test]
    fn test_sample_requantizes_positions() {
        let axis = array![0.0, 1.0, 2.0];
        let density = Array3::from_shape_fn((3, 3, 3), |(i, j, k)| (i * 100 + j * 10 + k) as f64);
        let volume = DensityVolume::new(density, axis.clone(), axis.clone(), axis).unwrap();
        let values =
            sample_field_at_surface(&volume, 1, &[cell_at(0.4, 1.6), cell_at(2.2, 0.0)]).unwrap();
        assert_eq!(values, vec![102.0, 120.0]);
    }

    #[test]
    fn test_sample_out_of_bounds() {
        let volume = ones_volume();
        assert!(sample_field_at_surface(&volume, 1, &[cell_at(3.0, 0.0)]).is_err());
        assert!(sample_field_at_surface(&volume, 5, &[cell_at(0.0, 0.0)]).is_err());
    }

    #[test]
    fn test_profile_units_and_depletion() {
        let volume = ones_volume();
        let axis = volume.y_axis().clone();
        let points = crate::surface_system::boundary::extract_surface_boundary(
            axis.view(),
            axis.view(),
            1.0,
        )
        .unwrap();
        let mapping = volume.y_mapping().unwrap();
        let trace = order_boundary_by_traversal(
            &points,
            south_pole(1.0),
            &mapping,
            &mapping,
            TraversalDirection::AntiClockwise,
        )
        .unwrap();
        let body = BodyConfig::new(1.0, 2.0, 0.5, 3.0);
        let profile = SurfaceProfile::sample("during", &volume, 1, &trace, &body).unwrap();

        assert_eq!(profile.len(), 4);
        assert_eq!(profile.density, vec![3.0; 4]);
        // 3 ppcc * 1e6 cm³/m³ * 0.25 m² * 2 m/s
        for flux in &profile.flux {
            assert_relative_eq!(*flux, 1.5e6);
        }
        let remaining = profile.particles_remaining(10.0, 1e6, 100.0, 0.25);
        assert_eq!(SurfaceProfile::depleted_cells(&remaining), 4);
        assert_relative_eq!(remaining[0], 1.5e7 - 2.5e7);
        assert_eq!(profile.peak_density().map(|(_, rho)| rho), Some(3.0));
    }
}
