//! Key Bindings
//!
//! Maps physical keys to window-management commands.

use winit::event::{ElementState, KeyEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// A window-management action requested through the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Open a new window and assign it the next free view.
    CreateWindow,
    /// Close the oldest secondary window.
    DestroyWindow,
}

/// Returns the command bound to `event`, if any.
///
/// Only initial presses trigger commands; repeats and releases are ignored.
#[must_use]
pub fn command_for(event: &KeyEvent) -> Option<Command> {
    if event.state != ElementState::Pressed || event.repeat {
        return None;
    }
    let PhysicalKey::Code(code) = event.physical_key else {
        return None;
    };
    command_for_code(code)
}

fn command_for_code(code: KeyCode) -> Option<Command> {
    match code {
        KeyCode::KeyC => Some(Command::CreateWindow),
        KeyCode::KeyD => Some(Command::DestroyWindow),
        _ => None,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_and_destroy_keys_are_bound() {
        assert_eq!(command_for_code(KeyCode::KeyC), Some(Command::CreateWindow));
        assert_eq!(
            command_for_code(KeyCode::KeyD),
            Some(Command::DestroyWindow)
        );
    }

    #[test]
    fn other_keys_are_unbound() {
        assert_eq!(command_for_code(KeyCode::KeyA), None);
        assert_eq!(command_for_code(KeyCode::Escape), None);
        assert_eq!(command_for_code(KeyCode::Space), None);
    }
}
