//! CPU register file.
//!
//! - V0-VF: sixteen 8-bit general registers; VF doubles as the flag register
//! - I: index register, wider than an address so overflow past 0xFFF is visible
//! - PC: program counter
//! - two 8-bit countdown timers

use crate::cpu::memory::PROGRAM_START;
use serde::{Deserialize, Serialize};

/// Index of the flag register, VF.
pub const FLAG: u8 = 0xF;

/// Number of general registers.
pub const REGISTER_COUNT: usize = 16;

/// The register file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registers {
    /// V0-VF
    pub v: [u8; REGISTER_COUNT],

    /// I: memory address register
    pub index: u16,

    /// PC: address of the next instruction to fetch
    pub pc: u16,

    /// Delay timer, readable by programs
    pub delay_timer: u8,

    /// Sound timer; a tone plays while it is non-zero
    pub sound_timer: u8,
}

impl Registers {
    /// Power-on register state.
    pub fn new() -> Self {
        Self {
            v: [0; REGISTER_COUNT],
            index: 0,
            pc: PROGRAM_START as u16,
            delay_timer: 0,
            sound_timer: 0,
        }
    }

    /// Current value of VF.
    pub fn flag(&self) -> u8 {
        self.v[FLAG as usize]
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}
