//! Platform abstraction layer
//!
//! Maps raw input to game commands. Browser-only pieces (animation frame
//! scheduling, the ranking WebSocket) live in `web`.

#[cfg(target_arch = "wasm32")]
pub mod web;

/// Everything the player can ask of the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Swim up, or restart after game over
    Jump,
    TogglePause,
}

/// Map a `KeyboardEvent.code` to a command
pub fn command_for_key(code: &str) -> Option<Command> {
    match code {
        "Space" | "ArrowUp" => Some(Command::Jump),
        "Escape" | "KeyP" => Some(Command::TogglePause),
        _ => None,
    }
}

/// Click and touch both swim
pub fn command_for_pointer() -> Command {
    Command::Jump
}
