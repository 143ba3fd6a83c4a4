// Particle masses
pub const H2O_PARTICLE_MASS: f64 = 2.987e-26; // kg
pub const O2_PARTICLE_MASS: f64 = 5.3137e-26; // kg
pub const H2_PARTICLE_MASS: f64 = 3.3543e-27; // kg

// Unit Conversions
pub const CM3_PER_M3: f64 = 1e6;
pub const SECONDS_PER_HOUR: f64 = 3600.0;
pub const SECONDS_PER_DAY: f64 = 86_400.0;
pub const SECONDS_PER_MONTH: f64 = 2.628e6;
pub const SECONDS_PER_HALF_YEAR: f64 = 1.577e7;
pub const SECONDS_PER_YEAR: f64 = 3.154e7;
pub const METERS_PER_KM: f64 = 1000.0;

// Plume Constants
pub const PLUME_SOURCE_AREA: f64 = 1e8; // m²
pub const EJECTA_VELOCITY: f64 = 460.0; // m/s
pub const SURFACE_SPUTTERING_RATE: f64 = 3.2e13; // particles m⁻² s⁻¹

// Deposit density per 1 kg/s of source mass flux
pub const DENSITY_PPCC_50KM: f64 = 1.04e3; // particles/cm³
pub const DENSITY_PPCC_25KM: f64 = 3.3e10 / 7000.0; // particles/cm³

// Observed plume (7000 kg/s for ~7 h)
pub const OBSERVED_MASS_FLUX: f64 = 7000.0; // kg/s
pub const OBSERVED_ERUPTION_TIME: f64 = 25_200.0; // s

// Sweep Extents
pub const MIN_MASS_FLUX: f64 = 1.0; // kg/s
pub const MAX_MASS_FLUX: f64 = 1e4; // kg/s
pub const MIN_ERUPTION_TIME: f64 = 262.800288; // s
pub const MAX_ERUPTION_TIME: f64 = SECONDS_PER_YEAR; // s
pub const SWEEP_SAMPLES: usize = 1000;

// Reference contour for the deposit age (years)
pub const REFERENCE_DEPOSIT_AGE: f64 = 28.0;

// Europa
pub const EUROPA_RADIUS: f64 = 1_560_800.0; // m
pub const VOLUME_CELL_EDGE: f64 = 10_000.0; // m
