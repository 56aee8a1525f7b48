//! Keyboard and mouse handling for the viewer.
//!
//! [`Controls`] folds raw window events into per-frame state: the discrete
//! [`Action`]s triggered since the last frame, plus the accumulated orbit drag
//! and scroll.
//!
//! | Input | Effect |
//! |-------|--------|
//! | Space / Enter | toggle scattered ↔ assembled |
//! | P | pause the clock |
//! | R | toggle auto-rotate |
//! | `=` / `-` | double / halve the point population |
//! | `]` / `[` | double / halve the entity population |
//! | Escape | quit |
//! | Left drag | orbit |
//! | Wheel | zoom |

use glam::Vec2;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// A discrete request from the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    ToggleTarget,
    TogglePause,
    ToggleAutoRotate,
    GrowPoints,
    ShrinkPoints,
    GrowEntities,
    ShrinkEntities,
    Quit,
}

impl Action {
    /// Binding for a key, if any.
    pub fn for_key(key: KeyCode) -> Option<Action> {
        match key {
            KeyCode::Space | KeyCode::Enter | KeyCode::NumpadEnter => Some(Action::ToggleTarget),
            KeyCode::KeyP => Some(Action::TogglePause),
            KeyCode::KeyR => Some(Action::ToggleAutoRotate),
            KeyCode::Equal | KeyCode::NumpadAdd => Some(Action::GrowPoints),
            KeyCode::Minus | KeyCode::NumpadSubtract => Some(Action::ShrinkPoints),
            KeyCode::BracketRight => Some(Action::GrowEntities),
            KeyCode::BracketLeft => Some(Action::ShrinkEntities),
            KeyCode::Escape => Some(Action::Quit),
            _ => None,
        }
    }
}

/// Per-frame input state.
#[derive(Debug, Default)]
pub struct Controls {
    actions: Vec<Action>,
    dragging: bool,
    last_cursor: Option<Vec2>,
    drag_delta: Vec2,
    scroll_delta: f32,
}

impl Controls {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process a winit window event.
    pub fn handle_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key) = event.physical_key {
                    self.key(key, event.state, event.repeat);
                }
            }
            WindowEvent::MouseInput { state, button, .. } => self.mouse_button(*button, *state),
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor(Vec2::new(position.x as f32, position.y as f32));
            }
            WindowEvent::MouseWheel { delta, .. } => self.scroll(*delta),
            _ => {}
        }
    }

    pub fn key(&mut self, key: KeyCode, state: ElementState, repeat: bool) {
        if state != ElementState::Pressed || repeat {
            return;
        }
        if let Some(action) = Action::for_key(key) {
            self.actions.push(action);
        }
    }

    pub fn mouse_button(&mut self, button: MouseButton, state: ElementState) {
        if button == MouseButton::Left {
            self.dragging = state == ElementState::Pressed;
            if !self.dragging {
                self.last_cursor = None;
            }
        }
    }

    pub fn cursor(&mut self, position: Vec2) {
        if !self.dragging {
            return;
        }
        if let Some(last) = self.last_cursor {
            self.drag_delta += position - last;
        }
        self.last_cursor = Some(position);
    }

    pub fn scroll(&mut self, delta: MouseScrollDelta) {
        self.scroll_delta += match delta {
            MouseScrollDelta::LineDelta(_, y) => y,
            MouseScrollDelta::PixelDelta(pos) => pos.y as f32 * 0.1,
        };
    }

    /// Actions since the last call, in the order they happened.
    pub fn take_actions(&mut self) -> std::vec::Drain<'_, Action> {
        self.actions.drain(..)
    }

    /// Drag in pixels and scroll in lines since the last call.
    pub fn take_motion(&mut self) -> (Vec2, f32) {
        let motion = (self.drag_delta, self.scroll_delta);
        self.drag_delta = Vec2::ZERO;
        self.scroll_delta = 0.0;
        motion
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_bindings() {
        assert_eq!(Action::for_key(KeyCode::Space), Some(Action::ToggleTarget));
        assert_eq!(Action::for_key(KeyCode::Enter), Some(Action::ToggleTarget));
        assert_eq!(Action::for_key(KeyCode::KeyQ), None);
    }

    #[test]
    fn test_key_repeat_and_release_ignored() {
        let mut controls = Controls::new();
        controls.key(KeyCode::Space, ElementState::Pressed, false);
        controls.key(KeyCode::Space, ElementState::Pressed, true);
        controls.key(KeyCode::Space, ElementState::Released, false);
        let actions: Vec<Action> = controls.take_actions().collect();
        assert_eq!(actions, vec![Action::ToggleTarget]);
        assert_eq!(controls.take_actions().count(), 0);
    }

    #[test]
    fn test_drag_accumulates_only_while_pressed() {
        let mut controls = Controls::new();
        controls.cursor(Vec2::new(10.0, 10.0));
        controls.mouse_button(MouseButton::Left, ElementState::Pressed);
        controls.cursor(Vec2::new(20.0, 10.0));
        controls.cursor(Vec2::new(25.0, 14.0));
        controls.mouse_button(MouseButton::Left, ElementState::Released);
        controls.cursor(Vec2::new(100.0, 100.0));

        let (drag, scroll) = controls.take_motion();
        assert_eq!(drag, Vec2::new(5.0, 4.0));
        assert_eq!(scroll, 0.0);
        assert_eq!(controls.take_motion().0, Vec2::ZERO);
    }

    #[test]
    fn test_scroll_units() {
        let mut controls = Controls::new();
        controls.scroll(MouseScrollDelta::LineDelta(0.0, 2.0));
        controls.scroll(MouseScrollDelta::PixelDelta(winit::dpi::PhysicalPosition::new(0.0, 10.0)));
        assert_eq!(controls.take_motion().1, 3.0);
    }
}
