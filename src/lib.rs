pub mod config;
pub mod constants;
pub mod erosion_system;
pub mod errors;
pub mod report_system;
pub mod surface_system;
pub mod utils;

pub use config::{BodyConfig, PhysicalConstants, SimulationConfig};
pub use constants::*;
pub use errors::{ErosionError, ErosionResult};

// Re-export commonly used items from erosion_system
pub use erosion_system::deposit::{
    compute_density, compute_disappearance_time, compute_falling_flux, compute_total_particles,
    DepositModel,
};
pub use erosion_system::rate_law::RateLaw;
pub use erosion_system::scenario::{AxisSpacing, AxisSpec, ScenarioFactory, ScenarioSpec, SweepSpec};
pub use erosion_system::sweep::{
    decade_levels, evaluate_grid, DurationUnit, ErosionGridEvaluator, ErosionTimeField, SweepGrid,
    SweepResult, TimeUnit,
};

// Re-export commonly used items from surface_system
pub use surface_system::boundary::{
    extract_surface_boundary, order_boundary_by_traversal, south_pole, SurfaceCell, SurfaceTrace,
    TraversalDirection,
};
pub use surface_system::extractor::SurfaceCellExtractor;
pub use surface_system::sampling::{
    mass_flux, particles_after_depletion, sample_field_at_surface, SurfaceProfile,
};
pub use surface_system::volume::{coordinate_to_index, AxisMapping, DensityVolume};

// Re-export commonly used items from report_system
pub use report_system::report::SweepReport;

// Re-export commonly used utilities
pub use utils::point2d::Point2D;
