//! Terminal player.
//!
//! Runs a program at the host frame rate with:
//! - the framebuffer drawn in half-block characters
//! - live registers, timers and keypad state
//! - keyboard input mapped onto the hex keypad, plus pause and reset

mod app;
mod ui;

pub use app::{keypad_key, run_player, PlayerApp, KEY_HOLD_FRAMES};
