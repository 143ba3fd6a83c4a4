use log::{debug, info};

use crate::config::BodyConfig;
use crate::errors::{ErosionError, ErosionResult};
use crate::surface_system::boundary::{
    extract_surface_boundary, order_boundary_by_traversal, south_pole, SurfaceTrace,
    TraversalDirection,
};
use crate::surface_system::sampling::SurfaceProfile;
use crate::surface_system::volume::{AxisMapping, DensityVolume};

const CELL_EDGE_TOLERANCE: f64 = 1e-6;

/// Finds the body outline in the central x plane of a density volume and
/// samples profiles along it.
#[derive(Debug, Clone)]
pub struct SurfaceCellExtractor {
    body: BodyConfig,
    direction: TraversalDirection,
}

impl SurfaceCellExtractor {
    pub fn new(body: BodyConfig) -> ErosionResult<Self> {
        body.validate()?;
        Ok(SurfaceCellExtractor {
            body,
            direction: TraversalDirection::default(),
        })
    }

    pub fn with_direction(mut self, direction: TraversalDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn body(&self) -> &BodyConfig {
        &self.body
    }

    /// Ordered surface cells of `volume`, starting at the south pole.
    pub fn extract(&self, volume: &DensityVolume) -> ErosionResult<SurfaceTrace> {
        let y_mapping = volume.y_mapping()?;
        let z_mapping = volume.z_mapping()?;
        self.check_cell_edge("y", &y_mapping)?;
        self.check_cell_edge("z", &z_mapping)?;
        let contour = extract_surface_boundary(
            volume.y_axis().view(),
            volume.z_axis().view(),
            self.body.radius,
        )?;
        debug!("Contour of radius {} has {} points", self.body.radius, contour.len());

        let trace = order_boundary_by_traversal(
            &contour,
            south_pole(self.body.radius),
            &y_mapping,
            &z_mapping,
            self.direction,
        )?;
        info!(
            "Surface trace: {} points, perimeter {:.1}",
            trace.len(),
            trace.perimeter
        );
        Ok(trace)
    }

    /// Fluxes use `cell_edge` for the cell area, so it has to be the
    /// volume's actual spacing.
    fn check_cell_edge(&self, axis: &str, mapping: &AxisMapping) -> ErosionResult<()> {
        let edge = self.body.cell_edge;
        if (mapping.cell_size - edge).abs() > CELL_EDGE_TOLERANCE * edge {
            return Err(ErosionError::ConfigurationError(format!(
                "cell_edge {edge} does not match the volume's {axis} spacing {}",
                mapping.cell_size
            )));
        }
        Ok(())
    }

    /// Profile of `volume` on the x plane nearest 0.
    pub fn profile(
        &self,
        label: &str,
        volume: &DensityVolume,
        trace: &SurfaceTrace,
    ) -> ErosionResult<SurfaceProfile> {
        let x_slice = volume.center_x_index()?;
        SurfaceProfile::sample(label, volume, x_slice, trace, &self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{Array1, Array3};

    fn shell_volume(n: usize, half_width: f64, radius: f64) -> DensityVolume {
        let axis = Array1::linspace(-half_width, half_width, n);
        let density = Array3::from_shape_fn((n, n, n), |(_, j, k)| {
            let r = (axis[j].powi(2) + axis[k].powi(2)).sqrt();
            if r >= radius {
                1.0
            } else {
                0.0
            }
        });
        DensityVolume::new(density, axis.clone(), axis.clone(), axis).unwrap()
    }

    #[test]
    fn test_extract_and_profile() {
        let body = BodyConfig::new(30.0, 2.0, 1.0, 1.0);
        let extractor = SurfaceCellExtractor::new(body).unwrap();
        let volume = shell_volume(81, 40.0, 30.0);
        let trace = extractor.extract(&volume).unwrap();

        assert!(trace.cells[0].position.z < 0.0);
        assert_relative_eq!(trace.perimeter, 2.0 * std::f64::consts::PI * 30.0, max_relative = 1e-2);

        let profile = extractor.profile("during", &volume, &trace).unwrap();
        assert_eq!(profile.len(), trace.len());
        assert!(profile.density.iter().all(|rho| *rho == 0.0 || *rho == 1.0));
    }

    #[test]
    fn test_cell_edge_must_match_spacing() {
        // Spacing is 1.0 but the body claims 10 km cells
        let body = BodyConfig::new(30.0, 2.0, 10_000.0, 1.0);
        let extractor = SurfaceCellExtractor::new(body).unwrap();
        let volume = shell_volume(81, 40.0, 30.0);
        match extractor.extract(&volume) {
            Err(ErosionError::ConfigurationError(msg)) => assert!(msg.contains("cell_edge")),
            other => panic!("Expected ConfigurationError, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_body_rejected() {
        let body = BodyConfig::new(-1.0, 2.0, 1.0, 1.0);
        assert!(matches!(
            SurfaceCellExtractor::new(body),
            Err(ErosionError::ConfigurationError(_))
        ));
    }
}
