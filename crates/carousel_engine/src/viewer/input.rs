//! Keyboard and cursor input of the viewer
//!
//! Windowing lives outside the engine. The host translates its own events
//! into [`KeyCode`]s and cursor positions, and this module turns those into
//! [`ViewerCommand`]s for [`ViewerContext::handle_command`].
//!
//! [`ViewerContext::handle_command`]: crate::viewer::ViewerContext::handle_command

use crate::render::primitives::Direction;

/// Keys the viewer reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// W key
    W,
    /// A key
    A,
    /// S key
    S,
    /// D key
    D,
    /// E key
    E,
    /// J key
    J,
    /// K key
    K,
    /// L key
    L,
    /// Q key
    Q,
    /// T key
    T,
    /// V key
    V,
    /// Space key
    Space,
    /// Left shift key
    LeftShift,
}

/// One unit of viewer input
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewerCommand {
    /// Move the camera for `delta_time` seconds
    Step {
        /// Movement direction
        direction: Direction,
        /// Seconds the key was held this frame
        delta_time: f32,
    },
    /// Cursor position normalized by the window size
    MouseLook {
        /// Horizontal position, 0 at the left edge
        x: f64,
        /// Vertical position, 0 at the top edge
        y: f64,
    },
    /// Switch between fast and slow camera movement
    ToggleFineMovement,
    /// Show or hide light frusta
    ToggleDebugView,
    /// Pause or resume the day clock
    ToggleTimeStep,
    /// Flip the lamps' user override
    ToggleLampUser,
    /// Flip the headlights' user override
    ToggleHeadlightUser,
    /// Enable or disable sunlight
    ToggleSun,
    /// Enable or disable every shadow pass
    ToggleShadows,
    /// Switch one lamp post on or off by pool slot
    ToggleLamp(usize),
}

impl ViewerCommand {
    /// Command issued once when `key` goes down
    pub fn from_key_press(key: KeyCode) -> Option<Self> {
        match key {
            KeyCode::E => Some(Self::ToggleFineMovement),
            KeyCode::V => Some(Self::ToggleDebugView),
            KeyCode::T => Some(Self::ToggleTimeStep),
            KeyCode::L => Some(Self::ToggleLampUser),
            KeyCode::K => Some(Self::ToggleSun),
            KeyCode::J => Some(Self::ToggleHeadlightUser),
            KeyCode::Q => Some(Self::ToggleShadows),
            _ => None,
        }
    }

    /// Command issued every frame while `key` is held
    pub fn from_key_held(key: KeyCode, delta_time: f32) -> Option<Self> {
        let direction = match key {
            KeyCode::W => Direction::Forward,
            KeyCode::S => Direction::Back,
            KeyCode::A => Direction::Left,
            KeyCode::D => Direction::Right,
            KeyCode::Space => Direction::Up,
            KeyCode::LeftShift => Direction::Down,
            _ => return None,
        };
        Some(Self::Step { direction, delta_time })
    }

    /// Cursor at pixel `(x, y)` of a `width` x `height` window
    pub fn from_cursor(x: f64, y: f64, width: u32, height: u32) -> Self {
        Self::MouseLook {
            x: x / f64::from(width.max(1)),
            y: y / f64::from(height.max(1)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movement_keys_only_step_while_held() {
        assert_eq!(
            ViewerCommand::from_key_held(KeyCode::W, 0.5),
            Some(ViewerCommand::Step { direction: Direction::Forward, delta_time: 0.5 })
        );
        assert_eq!(ViewerCommand::from_key_press(KeyCode::W), None);
        assert_eq!(ViewerCommand::from_key_held(KeyCode::Q, 0.5), None);
    }

    #[test]
    fn toggle_keys() {
        assert_eq!(ViewerCommand::from_key_press(KeyCode::Q), Some(ViewerCommand::ToggleShadows));
        assert_eq!(ViewerCommand::from_key_press(KeyCode::L), Some(ViewerCommand::ToggleLampUser));
        assert_eq!(
            ViewerCommand::from_key_press(KeyCode::J),
            Some(ViewerCommand::ToggleHeadlightUser)
        );
    }

    #[test]
    fn cursor_is_normalized_by_window() {
        assert_eq!(
            ViewerCommand::from_cursor(400.0, 150.0, 800, 600),
            ViewerCommand::MouseLook { x: 0.5, y: 0.25 }
        );
    }
}
