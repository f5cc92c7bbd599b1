use std::collections::HashSet;

/// Keys the engine distinguishes. Anything else maps to `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Escape,
    Space,
    Enter,
    Left,
    Right,
    Up,
    Down,
    /// Letter or digit key, lowercase.
    Char(char),
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Other,
}

/// Keyboard and mouse state fed by window callbacks.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    keys_down: HashSet<Key>,
    buttons_down: HashSet<MouseButton>,
    mouse_position: (i32, i32),
    mouse_delta: (i32, i32),
}

impl InputState {
    pub fn is_key_down(&self, key: Key) -> bool {
        self.keys_down.contains(&key)
    }

    pub fn is_button_down(&self, button: MouseButton) -> bool {
        self.buttons_down.contains(&button)
    }

    pub fn mouse_position(&self) -> (i32, i32) {
        self.mouse_position
    }

    /// Cursor movement accumulated since the last frame.
    pub fn mouse_delta(&self) -> (i32, i32) {
        self.mouse_delta
    }

    pub(crate) fn set_key(&mut self, key: Key, pressed: bool) {
        if pressed {
            self.keys_down.insert(key);
        } else {
            self.keys_down.remove(&key);
        }
    }

    pub(crate) fn set_button(&mut self, button: MouseButton, pressed: bool) {
        if pressed {
            self.buttons_down.insert(button);
        } else {
            self.buttons_down.remove(&button);
        }
    }

    pub(crate) fn move_mouse(&mut self, x: i32, y: i32, dx: i32, dy: i32) {
        self.mouse_position = (x, y);
        self.mouse_delta.0 += dx;
        self.mouse_delta.1 += dy;
    }

    pub(crate) fn end_frame(&mut self) {
        self.mouse_delta = (0, 0);
    }
}
