use std::env;

use log::{info, warn};
use plume_erosion::report_system::report::{format_eruption_time, log_profile};
use plume_erosion::utils::time::years_to_seconds;
use plume_erosion::*;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut config_path = None;
    let mut volume_path = None;
    for arg in env::args().skip(1) {
        if arg.ends_with(".npz") {
            volume_path = Some(arg);
        } else {
            config_path = Some(arg);
        }
    }

    let config = match &config_path {
        Some(path) => {
            info!("Loading configuration from {}", path);
            SimulationConfig::from_json_file(path)?
        }
        None => SimulationConfig::default(),
    };
    let scenarios = if config.scenarios.is_empty() {
        ScenarioFactory::all(&config.constants)
    } else {
        config.scenarios.clone()
    };

    info!(
        "Observed plume: {} kg/s for {}",
        OBSERVED_MASS_FLUX,
        format_eruption_time(OBSERVED_ERUPTION_TIME)
    );

    let mut report = SweepReport::new(&config.constants);
    for scenario in &scenarios {
        let result = scenario.run(&config.constants)?;
        report.record(&scenario.name, &result);
    }
    report.log_summary();

    if let Some(path) = volume_path {
        match &config.body {
            Some(body) => run_surface_pipeline(&path, body)?,
            None => warn!(
                "Skipping surface pipeline for {}: no body configuration given",
                path
            ),
        }
    }

    Ok(())
}

fn run_surface_pipeline(path: &str, body: &BodyConfig) -> ErosionResult<()> {
    let volume = DensityVolume::from_npz(path)?;
    let extractor = SurfaceCellExtractor::new(body.clone())?;
    let trace = extractor.extract(&volume)?;
    let profile = extractor.profile("during eruption", &volume, &trace)?;

    let area = body.cell_area();
    for (label, elapsed) in [
        ("half a year", SECONDS_PER_HALF_YEAR),
        ("reference age", years_to_seconds(REFERENCE_DEPOSIT_AGE)),
    ] {
        let remaining = profile.particles_remaining(
            OBSERVED_ERUPTION_TIME,
            SURFACE_SPUTTERING_RATE,
            elapsed,
            area,
        );
        info!("Deposit after {}:", label);
        log_profile(&profile, &remaining);
    }
    Ok(())
}
