//! Instruction decoder.
//!
//! An instruction word is two bytes, read big-endian and split into four
//! nibbles `n0 n1 n2 n3`. `n0` selects the family; families `0`, `8`, `E`
//! and `F` are further split on the low nibble or low byte.
//!
//! Conventional field names:
//! - `X` = `n1`, `Y` = `n2` (register numbers)
//! - `N` = `n3` (sprite height)
//! - `NN` = low byte (immediate)
//! - `NNN` = low 12 bits (address)

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Second operand of the set/add/skip families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operand {
    /// 8-bit literal from the instruction word
    Immediate(u8),
    /// Current value of another register
    Register(u8),
}

/// A decoded instruction. Register numbers are always 0-15 and addresses
/// always 0x000-0xFFF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instruction {
    // ==================== Display ====================

    /// 00E0: turn every pixel off
    ClearScreen,

    /// DXYN: XOR an 8xN sprite from memory[I..] onto the screen at (VX, VY)
    Draw { x: u8, y: u8, height: u8 },

    // ==================== Control Flow ====================

    /// 00EE: PC := pop()
    Return,

    /// 1NNN: PC := NNN
    Jump { addr: u16 },

    /// BNNN: PC := V0 + NNN
    JumpOffset { addr: u16 },

    /// 2NNN: push(PC); PC := NNN
    Call { addr: u16 },

    /// 3XNN / 5XY0: skip the next instruction if VX == operand
    SkipIfEqual { x: u8, operand: Operand },

    /// 4XNN / 9XY0: skip the next instruction if VX != operand
    SkipIfNotEqual { x: u8, operand: Operand },

    // ==================== Arithmetic ====================

    /// 6XNN / 8XY0: VX := operand
    Set { x: u8, operand: Operand },

    /// 7XNN / 8XY4: VX += operand; the register form sets VF to the carry
    Add { x: u8, operand: Operand },

    /// 8XY5: VX := VX - VY, VF := no borrow
    Subtract { x: u8, y: u8 },

    /// 8XY7: VX := VY - VX, VF := no borrow
    SubtractReversed { x: u8, y: u8 },

    /// 8XY6: VF := VX & 1; VX >>= 1
    ShiftRight { x: u8 },

    /// 8XYE: VF := VX >> 7; VX <<= 1
    ShiftLeft { x: u8 },

    /// 8XY1
    Or { x: u8, y: u8 },

    /// 8XY2
    And { x: u8, y: u8 },

    /// 8XY3
    Xor { x: u8, y: u8 },

    /// CXNN: VX := random byte & NN
    Random { x: u8, mask: u8 },

    // ==================== Index Register ====================

    /// ANNN: I := NNN
    SetIndex { addr: u16 },

    /// FX1E: I += VX, VF := I > 0xFFF
    AddToIndex { x: u8 },

    /// FX29: I := address of the font glyph for VX
    SetIndexToFontGlyph { x: u8 },

    /// FX33: memory[I..I+3] := decimal digits of VX
    StoreBcdDigits { x: u8 },

    /// FX55: memory[I..=I+X] := V0..=VX
    DumpRegisters { x: u8 },

    /// FX65: V0..=VX := memory[I..=I+X]
    LoadRegisters { x: u8 },

    // ==================== Input & Timers ====================

    /// EX9E
    SkipIfKeyPressed { x: u8 },

    /// EXA1
    SkipIfKeyNotPressed { x: u8 },

    /// FX0A: block until a key is pressed, then VX := key
    WaitForKey { x: u8 },

    /// FX07
    GetDelayTimer { x: u8 },

    /// FX15
    SetDelayTimer { x: u8 },

    /// FX18
    SetSoundTimer { x: u8 },
}

/// Split a word into its four nibbles, most significant first.
#[inline]
fn nibbles(word: u16) -> (u8, u8, u8, u8) {
    (
        (word >> 12) as u8 & 0xF,
        (word >> 8) as u8 & 0xF,
        (word >> 4) as u8 & 0xF,
        word as u8 & 0xF,
    )
}

/// Decode one instruction word.
///
/// Total over all 65536 words: anything that is not a known instruction
/// comes back as [`DecodeError::Unrecognized`].
pub fn decode(word: u16) -> Result<Instruction, DecodeError> {
    use Instruction::*;

    let (n0, x, y, n) = nibbles(word);
    let nn = word as u8;
    let addr = word & 0x0FFF;

    let instruction = match (n0, x, y, n) {
        (0x0, 0x0, 0xE, 0x0) => ClearScreen,
        (0x0, 0x0, 0xE, 0xE) => Return,
        (0x1, ..) => Jump { addr },
        (0x2, ..) => Call { addr },
        (0x3, ..) => SkipIfEqual { x, operand: Operand::Immediate(nn) },
        (0x4, ..) => SkipIfNotEqual { x, operand: Operand::Immediate(nn) },
        (0x5, _, _, 0x0) => SkipIfEqual { x, operand: Operand::Register(y) },
        (0x6, ..) => Set { x, operand: Operand::Immediate(nn) },
        (0x7, ..) => Add { x, operand: Operand::Immediate(nn) },
        (0x8, _, _, 0x0) => Set { x, operand: Operand::Register(y) },
        (0x8, _, _, 0x1) => Or { x, y },
        (0x8, _, _, 0x2) => And { x, y },
        (0x8, _, _, 0x3) => Xor { x, y },
        (0x8, _, _, 0x4) => Add { x, operand: Operand::Register(y) },
        (0x8, _, _, 0x5) => Subtract { x, y },
        (0x8, _, _, 0x6) => ShiftRight { x },
        (0x8, _, _, 0x7) => SubtractReversed { x, y },
        (0x8, _, _, 0xE) => ShiftLeft { x },
        (0x9, _, _, 0x0) => SkipIfNotEqual { x, operand: Operand::Register(y) },
        (0xA, ..) => SetIndex { addr },
        (0xB, ..) => JumpOffset { addr },
        (0xC, ..) => Random { x, mask: nn },
        (0xD, ..) => Draw { x, y, height: n },
        (0xE, _, 0x9, 0xE) => SkipIfKeyPressed { x },
        (0xE, _, 0xA, 0x1) => SkipIfKeyNotPressed { x },
        (0xF, _, 0x0, 0x7) => GetDelayTimer { x },
        (0xF, _, 0x0, 0xA) => WaitForKey { x },
        (0xF, _, 0x1, 0x5) => SetDelayTimer { x },
        (0xF, _, 0x1, 0x8) => SetSoundTimer { x },
        (0xF, _, 0x1, 0xE) => AddToIndex { x },
        (0xF, _, 0x2, 0x9) => SetIndexToFontGlyph { x },
        (0xF, _, 0x3, 0x3) => StoreBcdDigits { x },
        (0xF, _, 0x5, 0x5) => DumpRegisters { x },
        (0xF, _, 0x6, 0x5) => LoadRegisters { x },
        _ => return Err(DecodeError::Unrecognized(word)),
    };

    Ok(instruction)
}

/// Encode an instruction back to its word.
///
/// Shifts encode with `Y = 0`; every other instruction round-trips exactly.
pub fn encode(instr: &Instruction) -> u16 {
    use Instruction::*;

    fn xy(family: u16, x: u8, y: u8, n: u16) -> u16 {
        family << 12 | (x as u16 & 0xF) << 8 | (y as u16 & 0xF) << 4 | (n & 0xF)
    }
    fn xnn(family: u16, x: u8, nn: u8) -> u16 {
        family << 12 | (x as u16 & 0xF) << 8 | nn as u16
    }
    fn nnn(family: u16, addr: u16) -> u16 {
        family << 12 | (addr & 0x0FFF)
    }

    match *instr {
        ClearScreen => 0x00E0,
        Return => 0x00EE,
        Jump { addr } => nnn(0x1, addr),
        Call { addr } => nnn(0x2, addr),
        SkipIfEqual { x, operand: Operand::Immediate(nn) } => xnn(0x3, x, nn),
        SkipIfNotEqual { x, operand: Operand::Immediate(nn) } => xnn(0x4, x, nn),
        SkipIfEqual { x, operand: Operand::Register(y) } => xy(0x5, x, y, 0x0),
        Set { x, operand: Operand::Immediate(nn) } => xnn(0x6, x, nn),
        Add { x, operand: Operand::Immediate(nn) } => xnn(0x7, x, nn),
        Set { x, operand: Operand::Register(y) } => xy(0x8, x, y, 0x0),
        Or { x, y } => xy(0x8, x, y, 0x1),
        And { x, y } => xy(0x8, x, y, 0x2),
        Xor { x, y } => xy(0x8, x, y, 0x3),
        Add { x, operand: Operand::Register(y) } => xy(0x8, x, y, 0x4),
        Subtract { x, y } => xy(0x8, x, y, 0x5),
        ShiftRight { x } => xy(0x8, x, 0, 0x6),
        SubtractReversed { x, y } => xy(0x8, x, y, 0x7),
        ShiftLeft { x } => xy(0x8, x, 0, 0xE),
        SkipIfNotEqual { x, operand: Operand::Register(y) } => xy(0x9, x, y, 0x0),
        SetIndex { addr } => nnn(0xA, addr),
        JumpOffset { addr } => nnn(0xB, addr),
        Random { x, mask } => xnn(0xC, x, mask),
        Draw { x, y, height } => xy(0xD, x, y, height as u16),
        SkipIfKeyPressed { x } => xnn(0xE, x, 0x9E),
        SkipIfKeyNotPressed { x } => xnn(0xE, x, 0xA1),
        GetDelayTimer { x } => xnn(0xF, x, 0x07),
        WaitForKey { x } => xnn(0xF, x, 0x0A),
        SetDelayTimer { x } => xnn(0xF, x, 0x15),
        SetSoundTimer { x } => xnn(0xF, x, 0x18),
        AddToIndex { x } => xnn(0xF, x, 0x1E),
        SetIndexToFontGlyph { x } => xnn(0xF, x, 0x29),
        StoreBcdDigits { x } => xnn(0xF, x, 0x33),
        DumpRegisters { x } => xnn(0xF, x, 0x55),
        LoadRegisters { x } => xnn(0xF, x, 0x65),
    }
}

/// Assemble a sequence of instructions into a big-endian program image.
pub fn assemble(program: &[Instruction]) -> Vec<u8> {
    program
        .iter()
        .flat_map(|instr| encode(instr).to_be_bytes())
        .collect()
}

/// Errors that can occur during instruction decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unrecognized instruction {0:#06x}")]
    Unrecognized(u16),
}
