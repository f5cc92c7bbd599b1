use crate::clock::FrameClock;
use crate::config::EngineConfig;
use crate::context::Context;
use crate::input::{InputState, Key};
use crate::window::Window;
use dreivy_assets::MeshTable;
use dreivy_ecs::World;
use dreivy_render::{DrawStats, GpuMeshCache, GraphicsBackend, RenderError, RenderQueue};
use std::any::Any;
use std::cell::RefCell;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::Rc;

/// Errors surfaced by the engine's public lifecycle calls.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("window creation failed: {0}")]
    WindowInit(String),
    #[error(transparent)]
    Backend(#[from] RenderError),
    #[error("config parse error: {0}")]
    Config(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("engine is not initialized")]
    NotInitialized,
    #[error("engine is already initialized")]
    AlreadyInitialized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Uninitialized,
    Initialized,
    Running,
    ShuttingDown,
    Terminated,
}

/// Why a single callback invocation did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CallbackFailure {
    #[error("callback returned an error: {0}")]
    Error(String),
    #[error("callback panicked: {0}")]
    Panic(String),
}

/// Totals for one `run`/`run_frames` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub frames: u64,
    pub callback_failures: u64,
    pub last_draw: DrawStats,
}

type Callback = Box<dyn FnMut(&mut Context<'_>) -> anyhow::Result<()>>;

/// State written by window callbacks during message pumping.
#[derive(Debug, Default)]
struct WindowSignals {
    stop_requested: bool,
    pending_resize: Option<(u32, u32)>,
    input: InputState,
}

/// The frame orchestrator.
///
/// Owns the world, the CPU mesh table, the render queue and the GPU mesh
/// cache, plus the window and graphics backend collaborators. Lifecycle:
/// [`init`](Self::init), then [`run`](Self::run), then
/// [`shutdown`](Self::shutdown) (also run on drop).
pub struct Engine<W, B>
where
    W: Window,
    B: GraphicsBackend<Surface = W::Surface>,
{
    config: EngineConfig,
    state: EngineState,
    window: Option<W>,
    backend: Option<B>,
    world: World,
    meshes: MeshTable,
    queue: RenderQueue,
    gpu_meshes: GpuMeshCache<B::Buffer>,
    clock: FrameClock,
    signals: Rc<RefCell<WindowSignals>>,
    init_callbacks: Vec<Callback>,
    frame_callbacks: Vec<Callback>,
    init_outcomes: Vec<Result<(), CallbackFailure>>,
    frame_outcomes: Vec<Result<(), CallbackFailure>>,
    frames: u64,
    last_draw: DrawStats,
}

impl<W, B> Engine<W, B>
where
    W: Window,
    B: GraphicsBackend<Surface = W::Surface>,
{
    pub fn new(config: EngineConfig) -> Self {
        let clock = make_clock(&config);
        Self {
            config,
            state: EngineState::Uninitialized,
            window: None,
            backend: None,
            world: World::new(),
            meshes: MeshTable::new(),
            queue: RenderQueue::new(),
            gpu_meshes: GpuMeshCache::new(),
            clock,
            signals: Rc::default(),
            init_callbacks: Vec::new(),
            frame_callbacks: Vec::new(),
            init_outcomes: Vec::new(),
            frame_outcomes: Vec::new(),
            frames: 0,
            last_draw: DrawStats::default(),
        }
    }

    /// Register a callback run once, after init has built everything else.
    pub fn add_init_callback<F>(&mut self, callback: F) -> &mut Self
    where
        F: FnMut(&mut Context<'_>) -> anyhow::Result<()> + 'static,
    {
        if self.state != EngineState::Uninitialized {
            tracing::warn!("init callback registered after init; it will never run");
        }
        self.init_callbacks.push(Box::new(callback));
        self
    }

    /// Register a callback run every frame, before the render queue is rebuilt.
    pub fn add_frame_callback<F>(&mut self, callback: F) -> &mut Self
    where
        F: FnMut(&mut Context<'_>) -> anyhow::Result<()> + 'static,
    {
        self.frame_callbacks.push(Box::new(callback));
        self
    }

    /// Create the window and backend, build fresh core state, wire window
    /// callbacks, then run every init callback once in registration order.
    ///
    /// An invalid config, or a window or backend failure, aborts init and
    /// leaves the engine `Uninitialized`. Callback failures are recorded, not
    /// returned.
    pub fn init<F>(&mut self, create_window: F, mut backend: B) -> Result<&mut Self, EngineError>
    where
        F: FnOnce(&EngineConfig) -> anyhow::Result<W>,
    {
        if self.state != EngineState::Uninitialized {
            return Err(EngineError::AlreadyInitialized);
        }
        if let Err(e) = self.config.validate() {
            tracing::error!("{e}");
            return Err(e);
        }

        let mut window = create_window(&self.config).map_err(|e| {
            tracing::error!("window creation failed: {e:#}");
            EngineError::WindowInit(format!("{e:#}"))
        })?;

        if let Err(e) = backend.init(window.surface(), window.width(), window.height()) {
            tracing::error!("backend initialization failed: {e}");
            return Err(e.into());
        }

        window.set_cursor_visible(self.config.window.show_cursor);
        window.set_mouse_capture(self.config.window.capture_mouse);
        self.signals = Rc::default();
        self.wire_window_callbacks(&mut window);
        self.world = World::new();
        self.meshes = MeshTable::new();
        self.queue = RenderQueue::new();
        self.gpu_meshes = GpuMeshCache::new();
        self.clock = make_clock(&self.config);
        self.window = Some(window);
        self.backend = Some(backend);
        self.state = EngineState::Initialized;
        tracing::info!(
            width = self.config.window.width,
            height = self.config.window.height,
            "engine initialized"
        );

        let mut signals = self.signals.borrow_mut();
        let WindowSignals {
            stop_requested,
            input,
            ..
        } = &mut *signals;
        let mut ctx = Context {
            world: &mut self.world,
            meshes: &mut self.meshes,
            clock: &self.clock,
            input,
            stop_requested,
        };
        self.init_outcomes = run_callbacks("init", &mut self.init_callbacks, &mut ctx);
        drop(signals);

        Ok(self)
    }

    fn wire_window_callbacks(&self, window: &mut W) {
        let signals = Rc::clone(&self.signals);
        window.set_resize_callback(Box::new(move |w, h| {
            // minimized windows report a zero dimension
            if w == 0 || h == 0 {
                return;
            }
            signals.borrow_mut().pending_resize = Some((w, h));
        }));

        let signals = Rc::clone(&self.signals);
        window.set_close_callback(Box::new(move || {
            signals.borrow_mut().stop_requested = true;
            true
        }));

        let signals = Rc::clone(&self.signals);
        window.set_key_callback(Box::new(move |key, pressed| {
            let mut signals = signals.borrow_mut();
            signals.input.set_key(key, pressed);
            if key == Key::Escape && pressed {
                signals.stop_requested = true;
            }
        }));

        let signals = Rc::clone(&self.signals);
        window.set_mouse_move_callback(Box::new(move |x, y, dx, dy| {
            signals.borrow_mut().input.move_mouse(x, y, dx, dy);
        }));

        let signals = Rc::clone(&self.signals);
        window.set_mouse_button_callback(Box::new(move |button, pressed| {
            signals.borrow_mut().input.set_button(button, pressed);
        }));
    }

    /// Run frames until the window closes or a stop is requested.
    pub fn run(&mut self) -> Result<RunSummary, EngineError> {
        self.run_loop(None)
    }

    /// Like [`run`](Self::run) but stops after at most `frames` frames.
    pub fn run_frames(&mut self, frames: u64) -> Result<RunSummary, EngineError> {
        self.run_loop(Some(frames))
    }

    fn run_loop(&mut self, limit: Option<u64>) -> Result<RunSummary, EngineError> {
        match self.state {
            EngineState::Initialized | EngineState::Running => {}
            _ => return Err(EngineError::NotInitialized),
        }
        self.state = EngineState::Running;

        let mut summary = RunSummary::default();
        while limit.is_none_or(|n| summary.frames < n) {
            if self.signals.borrow().stop_requested {
                tracing::info!("stop requested");
                break;
            }
            let Some(window) = self.window.as_mut() else {
                return Err(EngineError::NotInitialized);
            };
            if !window.process_messages() {
                tracing::info!("window requested quit");
                break;
            }

            summary.callback_failures += self.frame()?;
            summary.frames += 1;
        }
        summary.last_draw = self.last_draw;
        Ok(summary)
    }

    /// One frame: clock, pending resize, callbacks, queue rebuild, draw.
    /// Returns the number of failed callbacks.
    fn frame(&mut self) -> Result<u64, EngineError> {
        let _span = tracing::debug_span!("frame", index = self.frames).entered();
        self.clock.update();
        self.apply_pending_resize();

        let mut signals = self.signals.borrow_mut();
        let WindowSignals {
            stop_requested,
            input,
            ..
        } = &mut *signals;
        let mut ctx = Context {
            world: &mut self.world,
            meshes: &mut self.meshes,
            clock: &self.clock,
            input,
            stop_requested,
        };
        self.frame_outcomes = run_callbacks("frame", &mut self.frame_callbacks, &mut ctx);
        drop(signals);
        let failures = self.frame_outcomes.iter().filter(|o| o.is_err()).count() as u64;

        self.queue.rebuild(&self.world, &self.meshes);

        let backend = self.backend.as_mut().ok_or(EngineError::NotInitialized)?;
        backend.begin_frame(self.config.clear_color.into())?;
        self.last_draw = backend.draw(&self.queue, &mut self.gpu_meshes, &self.meshes)?;
        backend.end_frame()?;

        self.signals.borrow_mut().input.end_frame();
        self.frames += 1;
        Ok(failures)
    }

    fn apply_pending_resize(&mut self) {
        let Some((width, height)) = self.signals.borrow_mut().pending_resize.take() else {
            return;
        };
        if let Some(backend) = self.backend.as_mut() {
            tracing::debug!(width, height, "applying resize");
            backend.resize(width, height);
        }
    }

    /// Release backend resources and the window. Safe to call repeatedly and
    /// after a failed init.
    pub fn shutdown(&mut self) -> &mut Self {
        if self.state == EngineState::Terminated {
            return self;
        }
        self.state = EngineState::ShuttingDown;
        self.gpu_meshes.clear();
        if let Some(backend) = self.backend.as_mut() {
            backend.shutdown();
        }
        self.window = None;
        self.state = EngineState::Terminated;
        tracing::info!(frames = self.frames, "engine shut down");
        self
    }

    /// Ask the loop to stop before the next frame.
    pub fn request_stop(&mut self) {
        self.signals.borrow_mut().stop_requested = true;
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn meshes(&self) -> &MeshTable {
        &self.meshes
    }

    pub fn queue(&self) -> &RenderQueue {
        &self.queue
    }

    pub fn gpu_meshes(&self) -> &GpuMeshCache<B::Buffer> {
        &self.gpu_meshes
    }

    pub fn backend(&self) -> Option<&B> {
        self.backend.as_ref()
    }

    pub fn window(&self) -> Option<&W> {
        self.window.as_ref()
    }

    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    /// Frames completed over the engine's lifetime.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Outcome of each init callback, in registration order.
    pub fn init_outcomes(&self) -> &[Result<(), CallbackFailure>] {
        &self.init_outcomes
    }

    /// Outcome of each frame callback during the most recent frame.
    pub fn last_frame_outcomes(&self) -> &[Result<(), CallbackFailure>] {
        &self.frame_outcomes
    }
}

impl<W, B> Drop for Engine<W, B>
where
    W: Window,
    B: GraphicsBackend<Surface = W::Surface>,
{
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn make_clock(config: &EngineConfig) -> FrameClock {
    match config.fixed_timestep {
        Some(step) => FrameClock::fixed(step, config.max_frame_delta),
        None => FrameClock::realtime(config.max_frame_delta),
    }
}

/// Invoke each callback in order, isolating errors and panics.
fn run_callbacks(
    phase: &str,
    callbacks: &mut [Callback],
    ctx: &mut Context<'_>,
) -> Vec<Result<(), CallbackFailure>> {
    callbacks
        .iter_mut()
        .enumerate()
        .map(|(index, callback)| {
            let outcome = match catch_unwind(AssertUnwindSafe(|| callback(ctx))) {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(CallbackFailure::Error(format!("{e:#}"))),
                Err(payload) => Err(CallbackFailure::Panic(panic_message(payload.as_ref()))),
            };
            if let Err(failure) = &outcome {
                tracing::warn!(phase, index, "{failure}");
            }
            outcome
        })
        .collect()
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::MouseButton;
    use crate::window::{HeadlessWindow, WindowEvent};
    use dreivy_assets::primitives;
    use dreivy_common::{Entity, MeshHandle, Transform};
    use dreivy_ecs::Mesh;
    use dreivy_render::{ClearColor, HeadlessBackend};
    use glam::Vec3;
    use std::cell::Cell;

    type TestEngine = Engine<HeadlessWindow, HeadlessBackend>;

    fn config() -> EngineConfig {
        EngineConfig {
            fixed_timestep: Some(0.05),
            ..EngineConfig::default()
        }
    }

    fn init_with(engine: &mut TestEngine, window: HeadlessWindow) {
        engine
            .init(move |_| Ok(window), HeadlessBackend::new())
            .unwrap();
    }

    #[test]
    fn init_callbacks_run_once_in_order() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut engine = TestEngine::new(config());
        let (a, b) = (Rc::clone(&order), Rc::clone(&order));
        engine
            .add_init_callback(move |_| {
                a.borrow_mut().push("first");
                Ok(())
            })
            .add_init_callback(move |_| {
                b.borrow_mut().push("second");
                Ok(())
            });
        init_with(&mut engine, HeadlessWindow::new(64, 64));
        engine.run_frames(3).unwrap();

        assert_eq!(*order.borrow(), vec!["first", "second"]);
        assert_eq!(engine.state(), EngineState::Running);
        assert_eq!(engine.init_outcomes(), &[Ok(()), Ok(())]);
    }

    #[test]
    fn failing_callbacks_are_isolated() {
        let calls = Rc::new(Cell::new(0));
        let mut engine = TestEngine::new(config());
        let counter = Rc::clone(&calls);
        engine
            .add_init_callback(|_| anyhow::bail!("scene missing"))
            .add_init_callback(|_| panic!("boom"))
            .add_frame_callback(|_| anyhow::bail!("update failed"))
            .add_frame_callback(move |_| {
                counter.set(counter.get() + 1);
                Ok(())
            });
        init_with(&mut engine, HeadlessWindow::new(64, 64));

        assert_eq!(engine.state(), EngineState::Initialized);
        assert_eq!(
            engine.init_outcomes(),
            &[
                Err(CallbackFailure::Error("scene missing".into())),
                Err(CallbackFailure::Panic("boom".into())),
            ]
        );

        let summary = engine.run_frames(4).unwrap();
        assert_eq!(summary.frames, 4);
        assert_eq!(summary.callback_failures, 4);
        assert_eq!(calls.get(), 4);
        assert!(engine.last_frame_outcomes()[0].is_err());
        assert!(engine.last_frame_outcomes()[1].is_ok());
    }

    #[test]
    fn missing_component_error_propagates_through_callback() {
        let mut engine = TestEngine::new(config());
        engine.add_frame_callback(|ctx| {
            let e = ctx.create_entity();
            ctx.get_component::<Transform>(e)?;
            Ok(())
        });
        init_with(&mut engine, HeadlessWindow::new(8, 8));
        engine.run_frames(1).unwrap();
        let outcome = &engine.last_frame_outcomes()[0];
        assert!(matches!(outcome, Err(CallbackFailure::Error(msg)) if msg.contains("Transform")));
    }

    #[test]
    fn window_failure_aborts_init() {
        let mut engine = TestEngine::new(config());
        let ran = Rc::new(Cell::new(false));
        let flag = Rc::clone(&ran);
        engine.add_init_callback(move |_| {
            flag.set(true);
            Ok(())
        });
        let err = engine
            .init(|_| anyhow::bail!("no display"), HeadlessBackend::new())
            .err()
            .unwrap();
        assert!(matches!(err, EngineError::WindowInit(msg) if msg.contains("no display")));
        assert_eq!(engine.state(), EngineState::Uninitialized);
        assert!(!ran.get());
        assert!(matches!(engine.run(), Err(EngineError::NotInitialized)));

        engine.shutdown().shutdown();
        assert_eq!(engine.state(), EngineState::Terminated);
    }

    #[test]
    fn invalid_config_aborts_init() {
        let mut engine = TestEngine::new(EngineConfig {
            fixed_timestep: Some(-0.05),
            ..EngineConfig::default()
        });
        let window_created = Rc::new(Cell::new(false));
        let flag = Rc::clone(&window_created);
        let err = engine
            .init(
                move |_| {
                    flag.set(true);
                    Ok(HeadlessWindow::new(8, 8))
                },
                HeadlessBackend::new(),
            )
            .err()
            .unwrap();
        assert!(matches!(err, EngineError::InvalidConfig(msg) if msg.contains("fixed_timestep")));
        assert!(!window_created.get());
        assert_eq!(engine.state(), EngineState::Uninitialized);

        let mut engine = TestEngine::new(EngineConfig {
            max_frame_delta: 0.0,
            ..EngineConfig::default()
        });
        let err = engine
            .init(|_| Ok(HeadlessWindow::new(8, 8)), HeadlessBackend::new())
            .err()
            .unwrap();
        assert!(matches!(err, EngineError::InvalidConfig(_)));
    }

    #[test]
    fn backend_failure_aborts_init() {
        let mut engine = TestEngine::new(config());
        let err = engine
            .init(
                |_| Ok(HeadlessWindow::new(8, 8)),
                HeadlessBackend::new().failing_init(),
            )
            .err()
            .unwrap();
        assert!(matches!(err, EngineError::Backend(RenderError::BackendInit(_))));
        assert_eq!(engine.state(), EngineState::Uninitialized);
        assert!(engine.backend().is_none());
    }

    #[test]
    fn init_twice_is_rejected() {
        let mut engine = TestEngine::new(config());
        init_with(&mut engine, HeadlessWindow::new(8, 8));
        let err = engine
            .init(|_| Ok(HeadlessWindow::new(8, 8)), HeadlessBackend::new())
            .err()
            .unwrap();
        assert!(matches!(err, EngineError::AlreadyInitialized));
    }

    #[test]
    fn scene_from_init_callback_is_drawn_each_frame() {
        let mut engine = TestEngine::new(config());
        let spawned = Rc::new(Cell::new(Entity::INVALID));
        let slot = Rc::clone(&spawned);
        engine.add_init_callback(move |ctx| {
            let mesh = ctx.add_mesh(primitives::test_box());
            let e = ctx.create_entity();
            ctx.add_component(e, Transform::from_position(Vec3::ZERO));
            ctx.add_component(e, Mesh::new(mesh));
            slot.set(e);
            Ok(())
        });
        init_with(&mut engine, HeadlessWindow::new(64, 64));
        engine.run_frames(3).unwrap();

        let backend = engine.backend().unwrap();
        assert_eq!(backend.frames_completed(), 3);
        assert_eq!(
            backend.last_clear(),
            Some(ClearColor::from(engine.config().clear_color))
        );
        let draws = backend.last_frame_draws();
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].entity, spawned.get());
        assert_eq!(draws[0].mesh, MeshHandle(1));
        // uploaded once across all frames
        assert_eq!(backend.buffers_created(), 2);
        assert_eq!(engine.gpu_meshes().upload_count(), 1);
    }

    #[test]
    fn shared_mesh_uploads_once_per_frame_set() {
        let mut engine = TestEngine::new(config());
        engine.add_init_callback(|ctx| {
            let mesh = ctx.add_mesh(primitives::unit_cube());
            for i in 0..2 {
                let e = ctx.create_entity();
                ctx.add_component(e, Transform::from_position(Vec3::X * i as f32));
                ctx.add_component(e, Mesh::new(mesh));
            }
            Ok(())
        });
        init_with(&mut engine, HeadlessWindow::new(64, 64));
        let summary = engine.run_frames(1).unwrap();
        assert_eq!(summary.last_draw.draws, 2);
        assert_eq!(summary.last_draw.uploads, 1);
        assert_eq!(engine.backend().unwrap().buffers_created(), 2);
    }

    #[test]
    fn frame_callbacks_see_time_and_move_entities() {
        let mut engine = TestEngine::new(config());
        let target = Rc::new(Cell::new(Entity::INVALID));
        let (init_slot, frame_slot) = (Rc::clone(&target), Rc::clone(&target));
        engine
            .add_init_callback(move |ctx| {
                let mesh = ctx.add_mesh(primitives::test_box());
                let e = ctx.create_entity();
                ctx.add_component(e, Transform::default());
                ctx.add_component(e, Mesh::new(mesh));
                init_slot.set(e);
                Ok(())
            })
            .add_frame_callback(move |ctx| {
                let elapsed = ctx.elapsed();
                if let Some(t) = ctx.try_get_component_mut::<Transform>(frame_slot.get()) {
                    t.position.x = elapsed;
                }
                Ok(())
            });
        init_with(&mut engine, HeadlessWindow::new(64, 64));
        engine.run_frames(3).unwrap();

        // fixed step 0.05: elapsed is 0.0, 0.05, 0.10
        let draw = engine.backend().unwrap().last_frame_draws()[0];
        assert!((draw.world.w_axis.x - 0.10).abs() < 1e-6);
        assert_eq!(engine.clock().frame(), 3);
    }

    #[test]
    fn resize_is_deferred_to_next_frame() {
        let mut engine = TestEngine::new(config());
        let window = HeadlessWindow::new(64, 64)
            .with_event(0, WindowEvent::Resize(0, 100))
            .with_event(1, WindowEvent::Resize(800, 600))
            .with_event(1, WindowEvent::Resize(1024, 768));
        init_with(&mut engine, window);

        engine.run_frames(1).unwrap();
        assert!(engine.backend().unwrap().resizes().is_empty());

        engine.run_frames(1).unwrap();
        // only the latest size of the batch is applied, once
        assert_eq!(engine.backend().unwrap().resizes(), &[(1024, 768)]);
    }

    #[test]
    fn close_event_stops_loop() {
        let mut engine = TestEngine::new(config());
        let window = HeadlessWindow::new(64, 64).with_event(2, WindowEvent::Close);
        init_with(&mut engine, window);
        let summary = engine.run().unwrap();
        // pumps 0 and 1 produce frames; pump 2 closes the window
        assert_eq!(summary.frames, 2);
    }

    #[test]
    fn escape_requests_stop_at_next_iteration() {
        let mut engine = TestEngine::new(config());
        let window = HeadlessWindow::new(64, 64)
            .with_event(1, WindowEvent::Key(Key::Escape, true));
        init_with(&mut engine, window);
        let summary = engine.run().unwrap();
        // the frame whose pump saw Escape still completes
        assert_eq!(summary.frames, 2);
    }

    #[test]
    fn callback_can_request_stop() {
        let mut engine = TestEngine::new(config());
        engine.add_frame_callback(|ctx| {
            if ctx.frame_index() == 5 {
                ctx.request_stop();
            }
            Ok(())
        });
        init_with(&mut engine, HeadlessWindow::new(64, 64));
        let summary = engine.run().unwrap();
        assert_eq!(summary.frames, 5);
    }

    #[test]
    fn input_reaches_callbacks() {
        let mut engine = TestEngine::new(config());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        engine.add_frame_callback(move |ctx| {
            let input = ctx.input();
            sink.borrow_mut()
                .push((input.is_key_down(Key::Char('w')), input.mouse_delta()));
            Ok(())
        });
        let window = HeadlessWindow::new(64, 64)
            .with_event(0, WindowEvent::Key(Key::Char('w'), true))
            .with_event(0, WindowEvent::MouseMove(3, 4))
            .with_event(2, WindowEvent::Key(Key::Char('w'), false));
        init_with(&mut engine, window);
        engine.run_frames(3).unwrap();
        assert_eq!(
            *seen.borrow(),
            vec![(true, (3, 4)), (true, (0, 0)), (false, (0, 0))]
        );
    }

    #[test]
    fn mouse_buttons_reach_callbacks() {
        let mut engine = TestEngine::new(config());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        engine.add_frame_callback(move |ctx| {
            sink.borrow_mut()
                .push(ctx.input().is_button_down(MouseButton::Right));
            Ok(())
        });
        let window = HeadlessWindow::new(64, 64)
            .with_event(1, WindowEvent::MouseButton(MouseButton::Right, true))
            .with_event(2, WindowEvent::MouseButton(MouseButton::Right, false));
        init_with(&mut engine, window);
        engine.run_frames(3).unwrap();
        assert_eq!(*seen.borrow(), vec![false, true, false]);
    }

    #[test]
    fn cursor_options_are_applied_at_init() {
        let mut cfg = config();
        cfg.window.show_cursor = false;
        cfg.window.capture_mouse = true;
        let mut engine = TestEngine::new(cfg);
        init_with(&mut engine, HeadlessWindow::new(64, 64));
        let window = engine.window().unwrap();
        assert!(!window.cursor_visible());
        assert!(window.mouse_captured());
    }

    #[test]
    fn unknown_handle_in_world_is_not_drawn() {
        let mut engine = TestEngine::new(config());
        engine.add_init_callback(|ctx| {
            let e = ctx.create_entity();
            ctx.add_component(e, Transform::default());
            ctx.add_component(e, Mesh::new(MeshHandle(7)));
            Ok(())
        });
        init_with(&mut engine, HeadlessWindow::new(64, 64));
        let summary = engine.run_frames(1).unwrap();
        assert_eq!(summary.last_draw.draws, 0);
        assert!(engine.queue().is_empty());
    }

    #[test]
    fn allocation_failure_halts_run() {
        let mut engine = TestEngine::new(config());
        engine.add_init_callback(|ctx| {
            let mesh = ctx.add_mesh(primitives::unit_cube());
            let e = ctx.create_entity();
            ctx.add_component(e, Transform::default());
            ctx.add_component(e, Mesh::new(mesh));
            Ok(())
        });
        engine
            .init(
                |_| Ok(HeadlessWindow::new(8, 8)),
                HeadlessBackend::new().failing_allocations(),
            )
            .unwrap();
        let err = engine.run_frames(3).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Backend(RenderError::GpuAllocationFailed(_))
        ));
    }

    #[test]
    fn shutdown_is_idempotent() {
        let mut engine = TestEngine::new(config());
        engine.add_init_callback(|ctx| {
            let mesh = ctx.add_mesh(primitives::unit_cube());
            let e = ctx.create_entity();
            ctx.add_component(e, Transform::default());
            ctx.add_component(e, Mesh::new(mesh));
            Ok(())
        });
        init_with(&mut engine, HeadlessWindow::new(8, 8));
        engine.run_frames(1).unwrap();
        assert_eq!(engine.gpu_meshes().len(), 1);

        engine.shutdown().shutdown();
        assert_eq!(engine.state(), EngineState::Terminated);
        assert!(engine.window().is_none());
        assert!(engine.gpu_meshes().is_empty());
        assert_eq!(engine.backend().unwrap().shutdown_count(), 1);
        assert!(matches!(engine.run(), Err(EngineError::NotInitialized)));
    }
}
