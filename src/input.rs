//! Input handling
//!
//! Raw winit key codes are mapped onto [`InputAction`]s as they arrive; the
//! frame loop only ever reads the resulting [`InputState`] snapshot.

use std::collections::HashSet;

use winit::event::ElementState;
use winit::keyboard::{KeyCode, PhysicalKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    MoveForward,
    MoveBackward,
    MoveLeft,
    MoveRight,
    StartAnimations,
    StopAnimations,
    EnableSpotLight,
    DisableSpotLight,
    EnablePointLight,
    DisablePointLight,
    IncreaseFog,
    DecreaseFog,
    RotateLightLeft,
    RotateLightRight,
    StartPreview,
    StopPreview,
    SolidMode,
    WireframeMode,
    PointMode,
    ToggleDepthMap,
    Quit,
}

pub fn key_binding(key: PhysicalKey) -> Option<InputAction> {
    let PhysicalKey::Code(code) = key else {
        return None;
    };

    let action = match code {
        KeyCode::KeyW => InputAction::MoveForward,
        KeyCode::KeyS => InputAction::MoveBackward,
        KeyCode::KeyA => InputAction::MoveLeft,
        KeyCode::KeyD => InputAction::MoveRight,
        KeyCode::KeyQ => InputAction::StartAnimations,
        KeyCode::KeyE => InputAction::StopAnimations,
        KeyCode::KeyZ => InputAction::EnableSpotLight,
        KeyCode::KeyX => InputAction::DisableSpotLight,
        KeyCode::KeyC => InputAction::EnablePointLight,
        KeyCode::KeyV => InputAction::DisablePointLight,
        KeyCode::KeyF => InputAction::IncreaseFog,
        KeyCode::KeyG => InputAction::DecreaseFog,
        KeyCode::KeyJ => InputAction::RotateLightLeft,
        KeyCode::KeyL => InputAction::RotateLightRight,
        KeyCode::Enter | KeyCode::NumpadEnter => InputAction::StartPreview,
        KeyCode::Backspace => InputAction::StopPreview,
        KeyCode::Digit1 => InputAction::SolidMode,
        KeyCode::Digit2 => InputAction::WireframeMode,
        KeyCode::Digit3 => InputAction::PointMode,
        KeyCode::KeyM => InputAction::ToggleDepthMap,
        KeyCode::Escape => InputAction::Quit,
        _ => return None,
    };
    Some(action)
}

/// Held actions, press edges since the last frame and accumulated mouse motion
#[derive(Debug, Default, Clone)]
pub struct InputState {
    held: HashSet<InputAction>,
    pressed: HashSet<InputAction>,
    mouse_delta: (f64, f64),
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process a key event and update input state.
    pub fn process_key(&mut self, key: PhysicalKey, state: ElementState) {
        if let Some(action) = key_binding(key) {
            self.set_action(action, state == ElementState::Pressed);
        }
    }

    /// Key repeats do not produce a second press edge.
    pub fn set_action(&mut self, action: InputAction, pressed: bool) {
        if pressed {
            if self.held.insert(action) {
                self.pressed.insert(action);
            }
        } else {
            self.held.remove(&action);
        }
    }

    pub fn add_mouse_delta(&mut self, dx: f64, dy: f64) {
        self.mouse_delta.0 += dx;
        self.mouse_delta.1 += dy;
    }

    pub fn is_held(&self, action: InputAction) -> bool {
        self.held.contains(&action)
    }

    pub fn was_pressed(&self, action: InputAction) -> bool {
        self.pressed.contains(&action)
    }

    pub fn mouse_delta(&self) -> (f64, f64) {
        self.mouse_delta
    }

    /// Clears the per-frame parts: press edges and mouse motion.
    pub fn end_frame(&mut self) {
        self.pressed.clear();
        self.mouse_delta = (0.0, 0.0);
    }

    /// Reset all inputs (e.g., on focus loss).
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
