//! Frame kernel: owns the world, the CPU mesh table, the render queue and the
//! GPU mesh cache, and sequences them once per frame.
//!
//! # Invariants
//! - One thread drives message pumping, callbacks, queue rebuild and drawing.
//! - A failing callback never stops its siblings or the frame loop.
//! - Resizes reach the backend only at the start of a frame, never mid-draw.

mod clock;
mod config;
mod context;
mod engine;
mod input;
mod window;

pub use clock::FrameClock;
pub use config::{EngineConfig, WindowConfig};
pub use context::Context;
pub use engine::{CallbackFailure, Engine, EngineError, EngineState, RunSummary};
pub use input::{InputState, Key, MouseButton};
pub use window::{
    CloseCallback, HeadlessWindow, KeyCallback, MouseButtonCallback, MouseMoveCallback,
    ResizeCallback, Window, WindowEvent,
};

pub fn crate_info() -> &'static str {
    "dreivy-kernel v0.1.0"
}
