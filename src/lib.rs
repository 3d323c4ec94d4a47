//! # octo8
//!
//! A deterministic virtual CPU core for the CHIP-8 fantasy machine.
//!
//! The core fetches two-byte instruction words, decodes them into typed
//! [`Instruction`]s and applies them to a [`MachineState`]. Hosts build a
//! machine from a program image and a seed, write the keypad, call
//! [`MachineState::advance_frame`] once per frame, then read the
//! framebuffer and sound timer.
//!
//! ```
//! use octo8::{assemble, Instruction, MachineState, Operand};
//!
//! let program = assemble(&[
//!     Instruction::Set { x: 0, operand: Operand::Immediate(7) },
//!     Instruction::Jump { addr: 0x202 },
//! ]);
//! let mut machine = MachineState::new(&program, 1).unwrap();
//! machine.advance_frame(60).unwrap();
//! assert_eq!(machine.regs.v[0], 7);
//! ```

pub mod cpu;
pub mod config;
pub mod rom;

#[cfg(feature = "tui")]
pub mod tui;

#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use cpu::{
    assemble, decode, encode, ConstructionError, CpuError, DecodeError, Framebuffer, Instruction,
    Location, Machine, MachineState, Operand, FONT,
};
pub use config::{Config, ConfigError, MachineConfig};
pub use rom::{load_rom, RomError};

#[cfg(feature = "tui")]
pub use tui::run_player;
