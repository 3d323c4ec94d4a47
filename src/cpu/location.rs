//! Addressable machine locations.
//!
//! Every piece of state an instruction touches is named by a [`Location`],
//! so the evaluator is written once against [`Machine::read`] and
//! [`Machine::write`] instead of against each field. The call stack is not
//! a cell; it is reached through [`Machine::push`] and [`Machine::pop`].
//!
//! Values travel as `u16`. A write truncates to the width of the target:
//! registers, memory cells and timers keep the low 8 bits, keys and pixels
//! store `value != 0`.

use crate::cpu::execute::CpuError;

/// One addressable location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    /// General register V0-VF
    Register(u8),
    /// Memory cell; addresses past 0xFFF fail with an address overflow
    Memory(u16),
    /// I
    Index,
    /// PC
    ProgramCounter,
    DelayTimer,
    SoundTimer,
    /// Input key 0x0-0xF, 1 when held
    Key(u8),
    /// Single pixel, wrapping at the framebuffer edges; 1 when lit
    Pixel { x: u16, y: u16 },
    /// Whole framebuffer: reads 1 if any pixel is lit, a write sets every pixel
    Framebuffer,
}

impl Location {
    /// Shorthand for the flag register VF.
    pub const FLAG: Location = Location::Register(crate::cpu::registers::FLAG);
}

/// Read/write access to machine state, plus the two effects that are not
/// plain cells: the call stack and the random byte source.
///
/// [`MachineState`](crate::cpu::MachineState) is the implementation hosts
/// use; tests can wrap it to script the random source.
pub trait Machine {
    /// Current value at `loc`.
    fn read(&self, loc: Location) -> Result<u16, CpuError>;

    /// Store `value` at `loc`, truncated to the location's width.
    fn write(&mut self, loc: Location, value: u16) -> Result<(), CpuError>;

    /// Save a return address. Fails once the stack is at its depth limit.
    fn push(&mut self, addr: u16) -> Result<(), CpuError>;

    /// Take the most recent return address.
    fn pop(&mut self) -> Result<u16, CpuError>;

    /// Advance the generator and return the next byte.
    fn random_byte(&mut self) -> u8;

    /// Read two locations at once, before either is modified.
    fn read_pair(&self, a: Location, b: Location) -> Result<(u16, u16), CpuError> {
        Ok((self.read(a)?, self.read(b)?))
    }

    /// `loc += amount`. Returns the sum before truncation so callers can
    /// detect overflow.
    fn add_into(&mut self, loc: Location, amount: u16) -> Result<u32, CpuError> {
        let sum = self.read(loc)? as u32 + amount as u32;
        self.write(loc, sum as u16)?;
        Ok(sum)
    }

    /// `loc -= amount`, wrapping. Returns `true` if a borrow occurred.
    fn subtract_into(&mut self, loc: Location, amount: u16) -> Result<bool, CpuError> {
        let old = self.read(loc)?;
        self.write(loc, old.wrapping_sub(amount))?;
        Ok(amount > old)
    }
}
