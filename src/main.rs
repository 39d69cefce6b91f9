use std::path::PathBuf;

use clap::Parser;
use stereo_flock::time::TickRate;
use stereo_flock::{
    FlockConfig, Mat4, OrbitCamera, Simulation, SimulationError, StereoCamera, StereoRenderer,
};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "stereo-flock",
    version,
    about = "Run a hierarchical flock headlessly and optionally render stereo frames"
)]
struct Cli {
    /// JSON config file. Flags below override its values.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of ticks to run.
    #[arg(short, long, default_value_t = 200)]
    ticks: u64,

    /// Number of agents to spawn.
    #[arg(short, long)]
    agents: Option<u32>,

    /// Seed for reproducible spawning.
    #[arg(long)]
    seed: Option<u64>,

    /// Write a left/right PNG pair of the final frame into this directory.
    #[arg(long)]
    render_dir: Option<PathBuf>,

    /// Per-eye image width in pixels.
    #[arg(long, default_value_t = 512, value_parser = clap::value_parser!(u32).range(1..))]
    width: u32,

    /// Per-eye image height in pixels.
    #[arg(long, default_value_t = 512, value_parser = clap::value_parser!(u32).range(1..))]
    height: u32,

    /// Distance between the two eyes in world units.
    #[arg(long, default_value_t = 0.5)]
    eye_separation: f32,
}

fn main() -> Result<(), SimulationError> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => FlockConfig::load(path)?,
        None => FlockConfig::default(),
    };
    if let Some(agents) = cli.agents {
        config.agent_count = agents;
    }
    if let Some(seed) = cli.seed {
        config.seed = Some(seed);
    }

    let mut sim = Simulation::builder().with_config(config).build()?;
    let mut rate = TickRate::new();

    for _ in 0..cli.ticks {
        let report = sim.step()?;
        if rate.record() {
            info!(
                tick = report.tick,
                ticks_per_second = rate.per_second(),
                isolated = report.isolated,
                interactions = report.interactions,
                "progress"
            );
        }
    }

    let tick = sim.store().tick();
    info!(tick, elapsed = sim.clock().elapsed(), "run finished");

    if let Some(dir) = &cli.render_dir {
        render(&sim, dir, &cli)?;
    }
    Ok(())
}

fn render(sim: &Simulation, dir: &std::path::Path, cli: &Cli) -> Result<(), SimulationError> {
    let renderer = match pollster::block_on(StereoRenderer::new(cli.width, cli.height)) {
        Ok(renderer) => renderer,
        Err(err) => {
            warn!(%err, "stereo rendering unavailable");
            return Err(err.into());
        }
    };

    let aspect = cli.width as f32 / cli.height as f32;
    let camera = StereoCamera::from_orbit(&OrbitCamera::default(), cli.eye_separation, aspect);
    let frame = sim.frame(Mat4::IDENTITY);
    let image = renderer.render(&camera, &frame)?;

    let stem = format!("tick_{:06}", sim.store().tick());
    let [left, right] = image.save(dir, &stem)?;
    info!(left = %left.display(), right = %right.display(), "wrote stereo frame");
    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_zero_sized_render_target_is_rejected() {
        assert!(Cli::try_parse_from(["stereo-flock", "--width", "0"]).is_err());
        assert!(Cli::try_parse_from(["stereo-flock", "--height", "0"]).is_err());
        let cli = Cli::try_parse_from(["stereo-flock", "--width", "1", "--height", "2"]).unwrap();
        assert_eq!((cli.width, cli.height), (1, 2));
    }
}
