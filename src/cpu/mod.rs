//! The virtual CPU core.
//!
//! This module implements the complete machine:
//! - 4KB byte-addressed memory with the font at 0x000 and programs at 0x200
//! - 16 eight-bit registers (VF doubles as the flag), I, PC and two timers
//! - a bounded call stack, a 16-key panel and a 64x32 monochrome framebuffer
//! - a seeded random generator, so identical runs draw identical bytes
//!
//! Leaf first: [`location`] names every piece of state, [`decode`] turns
//! words into [`Instruction`]s, [`execute`] applies them and [`frame`]
//! paces them against the host's frame rate.

pub mod memory;
pub mod registers;
pub mod framebuffer;
pub mod keypad;
pub mod location;
pub mod state;
pub mod decode;
pub mod execute;
pub mod frame;

pub use memory::{Memory, MemoryError, ConstructionError, FONT};
pub use registers::Registers;
pub use framebuffer::Framebuffer;
pub use keypad::Keypad;
pub use location::{Location, Machine};
pub use state::MachineState;
pub use decode::{Instruction, Operand, DecodeError, decode, encode, assemble};
pub use execute::{CpuError, execute};
pub use frame::{FrameFault, advance_frame, advance_frame_with, step};
