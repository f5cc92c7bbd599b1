use crate::input::{Key, MouseButton};
use std::collections::BTreeMap;

pub type ResizeCallback = Box<dyn FnMut(u32, u32)>;
/// Returns whether the window may close.
pub type CloseCallback = Box<dyn FnMut() -> bool>;
pub type KeyCallback = Box<dyn FnMut(Key, bool)>;
/// Receives `(x, y, dx, dy)` in window pixels.
pub type MouseMoveCallback = Box<dyn FnMut(i32, i32, i32, i32)>;
pub type MouseButtonCallback = Box<dyn FnMut(MouseButton, bool)>;

/// Platform window as seen by the engine.
///
/// Callbacks fire synchronously from inside [`process_messages`](Self::process_messages)
/// on the calling thread.
pub trait Window {
    /// Handed to the graphics backend to create its presentable surface.
    type Surface;

    /// Pump pending OS messages. Returns `false` once quitting was requested.
    fn process_messages(&mut self) -> bool;

    fn set_resize_callback(&mut self, callback: ResizeCallback);
    fn set_close_callback(&mut self, callback: CloseCallback);
    fn set_key_callback(&mut self, callback: KeyCallback);
    fn set_mouse_move_callback(&mut self, callback: MouseMoveCallback);
    fn set_mouse_button_callback(&mut self, callback: MouseButtonCallback);

    fn set_cursor_visible(&mut self, visible: bool);
    /// Keep the cursor inside the window while `captured`.
    fn set_mouse_capture(&mut self, captured: bool);

    fn width(&self) -> u32;
    fn height(&self) -> u32;

    fn surface(&self) -> Self::Surface;
}

/// Event scripted into a [`HeadlessWindow`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WindowEvent {
    Resize(u32, u32),
    Close,
    Key(Key, bool),
    MouseMove(i32, i32),
    MouseButton(MouseButton, bool),
}

/// Window without an OS counterpart: replays scripted events, one batch per pump.
#[derive(Default)]
pub struct HeadlessWindow {
    width: u32,
    height: u32,
    open: bool,
    pumps: u64,
    frame_limit: Option<u64>,
    script: BTreeMap<u64, Vec<WindowEvent>>,
    mouse: (i32, i32),
    cursor_hidden: bool,
    mouse_captured: bool,
    on_resize: Option<ResizeCallback>,
    on_close: Option<CloseCallback>,
    on_key: Option<KeyCallback>,
    on_mouse_move: Option<MouseMoveCallback>,
    on_mouse_button: Option<MouseButtonCallback>,
}

impl HeadlessWindow {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            open: true,
            ..Self::default()
        }
    }

    /// Deliver `event` during the `pump`-th call to `process_messages` (0-based).
    pub fn with_event(mut self, pump: u64, event: WindowEvent) -> Self {
        self.script.entry(pump).or_default().push(event);
        self
    }

    /// Report "quit requested" after `frames` pumps.
    pub fn with_frame_limit(mut self, frames: u64) -> Self {
        self.frame_limit = Some(frames);
        self
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn pumps(&self) -> u64 {
        self.pumps
    }

    pub fn cursor_visible(&self) -> bool {
        !self.cursor_hidden
    }

    pub fn mouse_captured(&self) -> bool {
        self.mouse_captured
    }

    fn dispatch(&mut self, event: WindowEvent) {
        match event {
            WindowEvent::Resize(w, h) => {
                self.width = w;
                self.height = h;
                if let Some(cb) = self.on_resize.as_mut() {
                    cb(w, h);
                }
            }
            WindowEvent::Close => {
                let allow = self.on_close.as_mut().is_none_or(|cb| cb());
                if allow {
                    self.open = false;
                }
            }
            WindowEvent::Key(key, pressed) => {
                if let Some(cb) = self.on_key.as_mut() {
                    cb(key, pressed);
                }
            }
            WindowEvent::MouseMove(x, y) => {
                let (dx, dy) = (x - self.mouse.0, y - self.mouse.1);
                self.mouse = (x, y);
                if let Some(cb) = self.on_mouse_move.as_mut() {
                    cb(x, y, dx, dy);
                }
            }
            WindowEvent::MouseButton(button, pressed) => {
                if let Some(cb) = self.on_mouse_button.as_mut() {
                    cb(button, pressed);
                }
            }
        }
    }
}

impl Window for HeadlessWindow {
    type Surface = ();

    fn process_messages(&mut self) -> bool {
        if !self.open {
            return false;
        }
        if self.frame_limit.is_some_and(|limit| self.pumps >= limit) {
            return false;
        }
        let events = self.script.remove(&self.pumps).unwrap_or_default();
        self.pumps += 1;
        for event in events {
            self.dispatch(event);
        }
        self.open
    }

    fn set_resize_callback(&mut self, callback: ResizeCallback) {
        self.on_resize = Some(callback);
    }

    fn set_close_callback(&mut self, callback: CloseCallback) {
        self.on_close = Some(callback);
    }

    fn set_key_callback(&mut self, callback: KeyCallback) {
        self.on_key = Some(callback);
    }

    fn set_mouse_move_callback(&mut self, callback: MouseMoveCallback) {
        self.on_mouse_move = Some(callback);
    }

    fn set_mouse_button_callback(&mut self, callback: MouseButtonCallback) {
        self.on_mouse_button = Some(callback);
    }

    fn set_cursor_visible(&mut self, visible: bool) {
        self.cursor_hidden = !visible;
    }

    fn set_mouse_capture(&mut self, captured: bool) {
        self.mouse_captured = captured;
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn surface(&self) {}
}
