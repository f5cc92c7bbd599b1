use anyhow::{Context as _, bail};
use dreivy_kernel::{
    CloseCallback, Key, KeyCallback, MouseButton, MouseButtonCallback, MouseMoveCallback,
    ResizeCallback, Window, WindowConfig,
};
use std::sync::Arc;
use std::time::Duration;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{CursorGrabMode, WindowAttributes, WindowId};

/// Pumps attempted while waiting for the platform to hand out the window.
const CREATE_ATTEMPTS: u32 = 100;

#[derive(Default)]
struct Callbacks {
    resize: Option<ResizeCallback>,
    close: Option<CloseCallback>,
    key: Option<KeyCallback>,
    mouse_move: Option<MouseMoveCallback>,
    mouse_button: Option<MouseButtonCallback>,
}

struct Handler {
    attributes: WindowAttributes,
    window: Option<Arc<winit::window::Window>>,
    create_error: Option<winit::error::OsError>,
    callbacks: Callbacks,
    size: (u32, u32),
    cursor: Option<(i32, i32)>,
}

impl ApplicationHandler for Handler {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        match event_loop.create_window(self.attributes.clone()) {
            Ok(window) => {
                let size = window.inner_size();
                self.size = (size.width, size.height);
                self.window = Some(Arc::new(window));
            }
            Err(e) => self.create_error = Some(e),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::Resized(size) => {
                self.size = (size.width, size.height);
                if let Some(cb) = self.callbacks.resize.as_mut() {
                    cb(size.width, size.height);
                }
            }
            WindowEvent::CloseRequested => {
                let allow = self.callbacks.close.as_mut().is_none_or(|cb| cb());
                if allow {
                    event_loop.exit();
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key,
                        state,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                if let Some(cb) = self.callbacks.key.as_mut() {
                    cb(map_key(physical_key), state == ElementState::Pressed);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                let (x, y) = (position.x as i32, position.y as i32);
                let (px, py) = self.cursor.unwrap_or((x, y));
                self.cursor = Some((x, y));
                if let Some(cb) = self.callbacks.mouse_move.as_mut() {
                    cb(x, y, x - px, y - py);
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                if let Some(cb) = self.callbacks.mouse_button.as_mut() {
                    cb(map_button(button), state == ElementState::Pressed);
                }
            }
            _ => {}
        }
    }
}

/// Desktop window backed by winit, driven by non-blocking event pumping so the
/// engine keeps ownership of the frame loop.
pub struct WinitWindow {
    event_loop: EventLoop<()>,
    handler: Handler,
    window: Arc<winit::window::Window>,
    open: bool,
}

impl WinitWindow {
    pub fn new(config: &WindowConfig) -> anyhow::Result<Self> {
        let mut event_loop = EventLoop::new().context("creating event loop")?;
        let attributes = winit::window::Window::default_attributes()
            .with_title(config.title.clone())
            .with_inner_size(PhysicalSize::new(config.width, config.height))
            .with_resizable(config.resizable);
        let mut handler = Handler {
            attributes,
            window: None,
            create_error: None,
            callbacks: Callbacks::default(),
            size: (config.width, config.height),
            cursor: None,
        };

        for _ in 0..CREATE_ATTEMPTS {
            if let PumpStatus::Exit(code) =
                event_loop.pump_app_events(Some(Duration::from_millis(10)), &mut handler)
            {
                bail!("event loop exited with code {code} before the window opened");
            }
            if let Some(e) = handler.create_error.take() {
                bail!("creating window: {e}");
            }
            if let Some(window) = handler.window.clone() {
                tracing::info!(
                    title = %config.title,
                    width = handler.size.0,
                    height = handler.size.1,
                    "window created"
                );
                return Ok(Self {
                    event_loop,
                    handler,
                    window,
                    open: true,
                });
            }
        }
        bail!("platform never resumed the application")
    }
}

impl Window for WinitWindow {
    type Surface = wgpu::SurfaceTarget<'static>;

    fn process_messages(&mut self) -> bool {
        if !self.open {
            return false;
        }
        if let PumpStatus::Exit(code) = self
            .event_loop
            .pump_app_events(Some(Duration::ZERO), &mut self.handler)
        {
            tracing::debug!(code, "event loop exited");
            self.open = false;
        }
        self.open
    }

    fn set_resize_callback(&mut self, callback: ResizeCallback) {
        self.handler.callbacks.resize = Some(callback);
    }

    fn set_close_callback(&mut self, callback: CloseCallback) {
        self.handler.callbacks.close = Some(callback);
    }

    fn set_key_callback(&mut self, callback: KeyCallback) {
        self.handler.callbacks.key = Some(callback);
    }

    fn set_mouse_move_callback(&mut self, callback: MouseMoveCallback) {
        self.handler.callbacks.mouse_move = Some(callback);
    }

    fn set_mouse_button_callback(&mut self, callback: MouseButtonCallback) {
        self.handler.callbacks.mouse_button = Some(callback);
    }

    fn set_cursor_visible(&mut self, visible: bool) {
        self.window.set_cursor_visible(visible);
    }

    fn set_mouse_capture(&mut self, captured: bool) {
        let result = if captured {
            // not every platform can confine; locking is the fallback
            self.window
                .set_cursor_grab(CursorGrabMode::Confined)
                .or_else(|_| self.window.set_cursor_grab(CursorGrabMode::Locked))
        } else {
            self.window.set_cursor_grab(CursorGrabMode::None)
        };
        if let Err(e) = result {
            tracing::warn!(captured, "cursor grab failed: {e}");
        }
    }

    fn width(&self) -> u32 {
        self.handler.size.0
    }

    fn height(&self) -> u32 {
        self.handler.size.1
    }

    fn surface(&self) -> wgpu::SurfaceTarget<'static> {
        wgpu::SurfaceTarget::from(Arc::clone(&self.window))
    }
}

const LETTERS: [(KeyCode, char); 26] = [
    (KeyCode::KeyA, 'a'),
    (KeyCode::KeyB, 'b'),
    (KeyCode::KeyC, 'c'),
    (KeyCode::KeyD, 'd'),
    (KeyCode::KeyE, 'e'),
    (KeyCode::KeyF, 'f'),
    (KeyCode::KeyG, 'g'),
    (KeyCode::KeyH, 'h'),
    (KeyCode::KeyI, 'i'),
    (KeyCode::KeyJ, 'j'),
    (KeyCode::KeyK, 'k'),
    (KeyCode::KeyL, 'l'),
    (KeyCode::KeyM, 'm'),
    (KeyCode::KeyN, 'n'),
    (KeyCode::KeyO, 'o'),
    (KeyCode::KeyP, 'p'),
    (KeyCode::KeyQ, 'q'),
    (KeyCode::KeyR, 'r'),
    (KeyCode::KeyS, 's'),
    (KeyCode::KeyT, 't'),
    (KeyCode::KeyU, 'u'),
    (KeyCode::KeyV, 'v'),
    (KeyCode::KeyW, 'w'),
    (KeyCode::KeyX, 'x'),
    (KeyCode::KeyY, 'y'),
    (KeyCode::KeyZ, 'z'),
];

fn map_key(key: PhysicalKey) -> Key {
    let PhysicalKey::Code(code) = key else {
        return Key::Other;
    };
    match code {
        KeyCode::Escape => Key::Escape,
        KeyCode::Space => Key::Space,
        KeyCode::Enter => Key::Enter,
        KeyCode::ArrowLeft => Key::Left,
        KeyCode::ArrowRight => Key::Right,
        KeyCode::ArrowUp => Key::Up,
        KeyCode::ArrowDown => Key::Down,
        other => LETTERS
            .iter()
            .find(|(c, _)| *c == other)
            .map_or(Key::Other, |(_, ch)| Key::Char(*ch)),
    }
}

fn map_button(button: winit::event::MouseButton) -> MouseButton {
    match button {
        winit::event::MouseButton::Left => MouseButton::Left,
        winit::event::MouseButton::Right => MouseButton::Right,
        winit::event::MouseButton::Middle => MouseButton::Middle,
        _ => MouseButton::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_keys_map() {
        assert_eq!(map_key(PhysicalKey::Code(KeyCode::Escape)), Key::Escape);
        assert_eq!(map_key(PhysicalKey::Code(KeyCode::ArrowUp)), Key::Up);
    }

    #[test]
    fn letters_map_to_lowercase_chars() {
        assert_eq!(map_key(PhysicalKey::Code(KeyCode::KeyW)), Key::Char('w'));
        assert_eq!(map_key(PhysicalKey::Code(KeyCode::KeyZ)), Key::Char('z'));
    }

    #[test]
    fn unmapped_keys_are_other() {
        assert_eq!(map_key(PhysicalKey::Code(KeyCode::F5)), Key::Other);
    }

    #[test]
    fn mouse_buttons_map() {
        assert_eq!(map_button(winit::event::MouseButton::Left), MouseButton::Left);
        assert_eq!(map_button(winit::event::MouseButton::Middle), MouseButton::Middle);
        assert_eq!(map_button(winit::event::MouseButton::Back), MouseButton::Other);
        assert_eq!(map_button(winit::event::MouseButton::Other(9)), MouseButton::Other);
    }
}
