mod window;

use anyhow::Result;
use clap::Parser;
use dreivy_assets::primitives;
use dreivy_common::{Entity, Transform};
use dreivy_ecs::{Mesh, Name};
use dreivy_kernel::{Engine, EngineConfig};
use dreivy_render_wgpu::WgpuBackend;
use glam::Vec3;
use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;
use tracing_subscriber::EnvFilter;
use window::WinitWindow;

#[derive(Parser)]
#[command(name = "dreivy-desktop", about = "Dreivy desktop demo")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// YAML engine config
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("dreivy-desktop starting");

    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    let mover = Rc::new(Cell::new(Entity::INVALID));
    let setup_slot = Rc::clone(&mover);

    let mut engine: Engine<WinitWindow, WgpuBackend> = Engine::new(config);
    engine
        .add_init_callback(move |ctx| {
            let mesh = ctx.add_mesh(primitives::test_box());

            let first = ctx.create_entity();
            ctx.add_component(first, Transform::from_position(Vec3::ZERO));
            ctx.add_component(first, Mesh::new(mesh));
            ctx.add_component(first, Name::from("static box"));

            let second = ctx.create_entity();
            ctx.add_component(second, Transform::from_position(Vec3::new(1.5, 0.0, 1.5)));
            ctx.add_component(second, Mesh::new(mesh));
            ctx.add_component(second, Name::from("moving box"));
            setup_slot.set(second);
            Ok(())
        })
        .add_frame_callback(move |ctx| {
            let s = ctx.elapsed().sin() * 3.0;
            if let Some(t) = ctx.try_get_component_mut::<Transform>(mover.get()) {
                t.position.x = s;
                t.position.y = s;
            }
            Ok(())
        });

    engine.init(|config| WinitWindow::new(&config.window), WgpuBackend::new())?;
    let summary = engine.run()?;
    tracing::info!(
        frames = summary.frames,
        callback_failures = summary.callback_failures,
        "frame loop finished"
    );
    engine.shutdown();

    Ok(())
}
