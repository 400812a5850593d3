//! Headless evasion run
//!
//! Places an agent among a few walls, walks a threat toward it, and prints one
//! JSON record per tick describing what the evasion controller decided.

use std::path::PathBuf;

use clap::Parser;
use evasion_core::{
    default_config_toml, AgentState, EvasionConfig, EvasionController, EvasionMode,
    MovementExecutor, Occluder, OccupantId, Shape, StaticScene, Vec3,
};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

const AGENT_BODY: OccupantId = OccupantId(1);
const AGENT_RADIUS: f32 = 0.5;

/// Command line arguments for the run
#[derive(Parser, Debug)]
#[command(name = "evasion_sim")]
#[command(about = "Runs the escape point controller against a synthetic scene")]
struct Args {
    /// Random seed for reproducibility
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Number of ticks to simulate
    #[arg(long, default_value_t = 60)]
    ticks: u64,

    /// TOML configuration file (defaults are used when omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Threat speed in units per second
    #[arg(long, default_value_t = 1.5)]
    threat_speed: f32,

    /// Seconds per tick
    #[arg(long, default_value_t = 0.1)]
    dt: f32,

    /// Print the default configuration and exit
    #[arg(long)]
    print_default_config: bool,
}

/// Moves the agent in a straight line toward the last destination it was given.
#[derive(Debug, Default)]
struct StraightLineMover {
    target: Option<(Vec3, f32)>,
}

impl StraightLineMover {
    fn step(&self, from: Vec3, dt: f32) -> Vec3 {
        let Some((target, speed)) = self.target else {
            return from;
        };
        let to_target = target - from;
        let max_step = speed * dt;
        if to_target.length() <= max_step {
            target
        } else {
            from + to_target.normalize_or_zero() * max_step
        }
    }
}

impl MovementExecutor for StraightLineMover {
    fn set_destination(&mut self, point: Vec3, speed: f32) {
        self.target = Some((point, speed));
    }
}

/// One line of output
#[derive(Debug, Serialize)]
struct TickRecord {
    tick: u64,
    mode: EvasionMode,
    agent: [f32; 3],
    threat: [f32; 3],
    destination: Option<[f32; 3]>,
}

fn build_scene(agent: Vec3) -> StaticScene {
    let mut scene = StaticScene::new();
    scene.insert(Occluder::new(AGENT_BODY, Shape::sphere(agent, AGENT_RADIUS)));
    scene.insert(Occluder::new(
        OccupantId(10),
        Shape::aabb(Vec3::new(-6.0, 0.0, 3.0), Vec3::new(-2.0, 2.0, 3.5)),
    ));
    scene.insert(Occluder::new(
        OccupantId(11),
        Shape::aabb(Vec3::new(2.0, 0.0, -4.0), Vec3::new(2.5, 2.0, 1.0)),
    ));
    scene.insert(Occluder::new(
        OccupantId(12),
        Shape::sphere(Vec3::new(-3.0, 0.0, -5.0), 1.5),
    ));
    scene
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if args.print_default_config {
        print!("{}", default_config_toml());
        return Ok(());
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match &args.config {
        Some(path) => EvasionConfig::from_file(path)?,
        None => EvasionConfig::default(),
    };
    config.validate()?;

    let mut rng = SmallRng::seed_from_u64(args.seed);
    let mut state = AgentState::new(Vec3::ZERO).with_threat(Vec3::new(14.0, 0.0, 2.0));
    let mut controller = EvasionController::new(
        config,
        build_scene(state.position),
        StraightLineMover::default(),
        AGENT_BODY,
    );

    tracing::info!(
        seed = args.seed,
        ticks = args.ticks,
        body = controller.own_body().0,
        occluders = controller.scene().len(),
        avoid_range = controller.config().avoidance.avoid_range,
        "Starting evasion run"
    );

    let mut issued = 0usize;
    for tick in 0..args.ticks {
        let destination = controller.evaluate_tick(&mut state, &mut rng)?;
        issued += usize::from(destination.is_some());

        let record = TickRecord {
            tick,
            mode: state.mode,
            agent: state.position.to_array(),
            threat: state.threat.unwrap_or(Vec3::ZERO).to_array(),
            destination: destination.map(|d| d.to_array()),
        };
        println!("{}", serde_json::to_string(&record)?);

        // Advance the world for the next tick
        state.position = controller.executor().step(state.position, args.dt);
        controller.scene_mut().move_to(AGENT_BODY, state.position);
        if let Some(threat) = state.threat {
            let chase = (state.position - threat).normalize_or_zero();
            state.threat = Some(threat + chase * args.threat_speed * args.dt);
        }
    }

    tracing::info!(ticks = args.ticks, issued, "Evasion run complete");
    Ok(())
}
