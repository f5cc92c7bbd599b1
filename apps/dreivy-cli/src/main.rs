use anyhow::Context as _;
use clap::{Parser, Subcommand};
use dreivy_assets::primitives;
use dreivy_common::{Entity, Transform};
use dreivy_ecs::{Mesh, Name};
use dreivy_kernel::{Engine, EngineConfig, HeadlessWindow};
use dreivy_render::HeadlessBackend;
use glam::Vec3;
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dreivy-cli", about = "Headless runner for the dreivy engine")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print engine version and crate info
    Info,
    /// Run the frame loop against a recording backend
    Run {
        /// Number of frames to run
        #[arg(short, long, default_value = "10")]
        frames: u64,
        /// Number of renderable entities to spawn
        #[arg(short, long, default_value = "2")]
        entities: u32,
        /// YAML engine config
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("dreivy-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", dreivy_common::crate_info());
            println!("ecs: {}", dreivy_ecs::crate_info());
            println!("assets: {}", dreivy_assets::crate_info());
            println!("render: {}", dreivy_render::crate_info());
            println!("kernel: {}", dreivy_kernel::crate_info());
        }
        Commands::Run {
            frames,
            entities,
            config,
        } => run(frames, entities, config)?,
    }

    Ok(())
}

fn run(frames: u64, entities: u32, config: Option<PathBuf>) -> anyhow::Result<()> {
    let mut config = match config {
        Some(path) => EngineConfig::load(&path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    // headless runs are reproducible unless the config says otherwise
    config.fixed_timestep.get_or_insert(1.0 / 60.0);
    tracing::info!(
        frames,
        entities,
        width = config.window.width,
        height = config.window.height,
        "headless run starting"
    );

    let mut engine = headless_engine(config, entities)?;
    let summary = engine.run_frames(frames)?;
    tracing::info!(
        frames = summary.frames,
        callback_failures = summary.callback_failures,
        draws = summary.last_draw.draws,
        "headless run finished"
    );

    println!(
        "Ran {} frames: {} callback failures, {} GPU meshes ({} uploads)",
        summary.frames,
        summary.callback_failures,
        engine.gpu_meshes().len(),
        engine.gpu_meshes().upload_count()
    );
    if let Some(backend) = engine.backend() {
        print!("{}", backend.describe());
    }
    for (i, outcome) in engine.init_outcomes().iter().enumerate() {
        if let Err(failure) = outcome {
            println!("init callback {i}: {failure}");
        }
    }

    engine.shutdown();
    Ok(())
}

/// Engine over the recording backend with `entities` boxes in a row, every
/// other one bobbing on `sin(elapsed)`.
fn headless_engine(
    config: EngineConfig,
    entities: u32,
) -> anyhow::Result<Engine<HeadlessWindow, HeadlessBackend>> {
    let (width, height) = (config.window.width, config.window.height);
    let spawned = Rc::new(RefCell::new(Vec::<Entity>::new()));
    let init_list = Rc::clone(&spawned);
    let frame_list = Rc::clone(&spawned);

    let mut engine = Engine::new(config);
    engine
        .add_init_callback(move |ctx| {
            let test_box = ctx.add_mesh(primitives::test_box());
            let cube = ctx.add_mesh(primitives::unit_cube());
            let mut list = init_list.borrow_mut();
            for i in 0..entities {
                let e = ctx.create_entity();
                let x = (i as f32 - (entities as f32 - 1.0) / 2.0) * 2.0;
                ctx.add_component(e, Transform::from_position(Vec3::new(x, 0.0, 0.0)));
                ctx.add_component(e, Mesh::new(if i % 2 == 0 { test_box } else { cube }));
                ctx.add_component(e, Name(format!("entity-{i}")));
                list.push(e);
            }
            Ok(())
        })
        .add_frame_callback(move |ctx| {
            let t = ctx.elapsed();
            for (i, e) in frame_list.borrow().iter().enumerate() {
                let transform = ctx.get_component_mut::<Transform>(*e)?;
                transform.rotation.y = t * (1.0 + i as f32 * 0.25);
                if i % 2 == 1 {
                    transform.position.y = t.sin() * 3.0;
                }
            }
            Ok(())
        });

    engine.init(
        move |_| Ok(HeadlessWindow::new(width, height)),
        HeadlessBackend::new(),
    )?;
    Ok(engine)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_config() -> EngineConfig {
        EngineConfig {
            fixed_timestep: Some(0.1),
            ..EngineConfig::default()
        }
    }

    #[test]
    fn every_spawned_entity_is_drawn() {
        let mut engine = headless_engine(fixed_config(), 3).unwrap();
        let summary = engine.run_frames(4).unwrap();
        assert_eq!(summary.frames, 4);
        assert_eq!(summary.callback_failures, 0);
        assert_eq!(summary.last_draw.draws, 3);
        // two distinct meshes, each uploaded once
        assert_eq!(engine.gpu_meshes().upload_count(), 2);
        assert_eq!(engine.backend().unwrap().last_frame_draws().len(), 3);
    }

    #[test]
    fn no_entities_draws_nothing() {
        let mut engine = headless_engine(fixed_config(), 0).unwrap();
        let summary = engine.run_frames(2).unwrap();
        assert_eq!(summary.last_draw.draws, 0);
        assert!(engine.gpu_meshes().is_empty());
    }
}
