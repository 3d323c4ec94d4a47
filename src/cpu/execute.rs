//! Instruction evaluator.
//!
//! Applies one decoded instruction to any [`Machine`]. The program counter
//! has already been advanced past the instruction, so skips add 2 more and
//! calls save the address of the following instruction.
//!
//! Flag-setting instructions read every operand first and write VF last,
//! so `VF` used as an operand sees its pre-instruction value and the flag
//! wins when `VF` is also the destination.
//!
//! An instruction either applies fully or fails with no effect: ranges
//! relative to I are checked before the first write.

use crate::cpu::decode::{DecodeError, Instruction, Operand};
use crate::cpu::location::{Location, Machine};
use crate::cpu::memory::{Memory, MemoryError, GLYPH_SIZE};
use crate::cpu::keypad::KEY_COUNT;
use thiserror::Error;

#[inline]
fn reg(x: u8) -> Location {
    Location::Register(x)
}

fn operand_value<M: Machine + ?Sized>(m: &M, operand: Operand) -> Result<u16, CpuError> {
    match operand {
        Operand::Immediate(nn) => Ok(nn as u16),
        Operand::Register(y) => m.read(reg(y)),
    }
}

fn skip_next<M: Machine + ?Sized>(m: &mut M) -> Result<(), CpuError> {
    m.add_into(Location::ProgramCounter, 2)?;
    Ok(())
}

/// Apply `instr` to `m`.
pub fn execute<M: Machine + ?Sized>(m: &mut M, instr: Instruction) -> Result<(), CpuError> {
    match instr {
        // ==================== Display ====================

        Instruction::ClearScreen => {
            m.write(Location::Framebuffer, 0)?;
        }

        Instruction::Draw { x, y, height } => {
            draw(m, x, y, height)?;
        }

        // ==================== Control Flow ====================

        Instruction::Return => {
            let addr = m.pop()?;
            m.write(Location::ProgramCounter, addr)?;
        }

        Instruction::Jump { addr } => {
            m.write(Location::ProgramCounter, addr)?;
        }

        Instruction::JumpOffset { addr } => {
            let v0 = m.read(reg(0))?;
            m.write(Location::ProgramCounter, v0 + addr)?;
        }

        Instruction::Call { addr } => {
            let ret = m.read(Location::ProgramCounter)?;
            m.push(ret)?;
            m.write(Location::ProgramCounter, addr)?;
        }

        Instruction::SkipIfEqual { x, operand } => {
            if m.read(reg(x))? == operand_value(m, operand)? {
                skip_next(m)?;
            }
        }

        Instruction::SkipIfNotEqual { x, operand } => {
            if m.read(reg(x))? != operand_value(m, operand)? {
                skip_next(m)?;
            }
        }

        // ==================== Arithmetic ====================

        Instruction::Set { x, operand } => {
            let value = operand_value(m, operand)?;
            m.write(reg(x), value)?;
        }

        Instruction::Add { x, operand: Operand::Immediate(nn) } => {
            m.add_into(reg(x), nn as u16)?;
        }

        Instruction::Add { x, operand: Operand::Register(y) } => {
            let other = m.read(reg(y))?;
            let sum = m.add_into(reg(x), other)?;
            m.write(Location::FLAG, (sum > 0xFF) as u16)?;
        }

        Instruction::Subtract { x, y } => {
            let vy = m.read(reg(y))?;
            let borrow = m.subtract_into(reg(x), vy)?;
            m.write(Location::FLAG, !borrow as u16)?;
        }

        Instruction::SubtractReversed { x, y } => {
            let (vx, vy) = m.read_pair(reg(x), reg(y))?;
            m.write(reg(x), vy.wrapping_sub(vx))?;
            m.write(Location::FLAG, (vx <= vy) as u16)?;
        }

        Instruction::ShiftRight { x } => {
            let vx = m.read(reg(x))?;
            m.write(reg(x), vx >> 1)?;
            m.write(Location::FLAG, vx & 1)?;
        }

        Instruction::ShiftLeft { x } => {
            let vx = m.read(reg(x))?;
            m.write(reg(x), vx << 1)?;
            m.write(Location::FLAG, vx >> 7)?;
        }

        Instruction::Or { x, y } => {
            let (vx, vy) = m.read_pair(reg(x), reg(y))?;
            m.write(reg(x), vx | vy)?;
        }

        Instruction::And { x, y } => {
            let (vx, vy) = m.read_pair(reg(x), reg(y))?;
            m.write(reg(x), vx & vy)?;
        }

        Instruction::Xor { x, y } => {
            let (vx, vy) = m.read_pair(reg(x), reg(y))?;
            m.write(reg(x), vx ^ vy)?;
        }

        Instruction::Random { x, mask } => {
            let byte = m.random_byte();
            m.write(reg(x), (byte & mask) as u16)?;
        }

        // ==================== Index Register ====================

        Instruction::SetIndex { addr } => {
            m.write(Location::Index, addr)?;
        }

        Instruction::AddToIndex { x } => {
            let (vx, i) = m.read_pair(reg(x), Location::Index)?;
            let sum = i as u32 + vx as u32;
            // I saturates at 0xFFFF; it never wraps back into low memory.
            m.write(Location::Index, sum.min(u16::MAX as u32) as u16)?;
            m.write(Location::FLAG, (sum > 0xFFF) as u16)?;
        }

        Instruction::SetIndexToFontGlyph { x } => {
            let glyph = m.read(reg(x))? & 0xF;
            m.write(Location::Index, glyph * GLYPH_SIZE as u16)?;
        }

        Instruction::StoreBcdDigits { x } => {
            let vx = m.read(reg(x))?;
            let i = m.read(Location::Index)?;
            Memory::check_range(i as usize, 3)?;
            m.write(Location::Memory(i), vx / 100)?;
            m.write(Location::Memory(i + 1), vx / 10 % 10)?;
            m.write(Location::Memory(i + 2), vx % 10)?;
        }

        Instruction::DumpRegisters { x } => {
            let i = m.read(Location::Index)?;
            Memory::check_range(i as usize, x as usize + 1)?;
            for r in 0..=x {
                let value = m.read(reg(r))?;
                m.write(Location::Memory(i + r as u16), value)?;
            }
        }

        Instruction::LoadRegisters { x } => {
            let i = m.read(Location::Index)?;
            Memory::check_range(i as usize, x as usize + 1)?;
            for r in 0..=x {
                let value = m.read(Location::Memory(i + r as u16))?;
                m.write(reg(r), value)?;
            }
        }

        // ==================== Input & Timers ====================

        Instruction::SkipIfKeyPressed { x } => {
            let key = m.read(reg(x))? as u8;
            if m.read(Location::Key(key))? != 0 {
                skip_next(m)?;
            }
        }

        Instruction::SkipIfKeyNotPressed { x } => {
            let key = m.read(reg(x))? as u8;
            if m.read(Location::Key(key))? == 0 {
                skip_next(m)?;
            }
        }

        Instruction::WaitForKey { x } => {
            let mut pressed = None;
            for k in 0..KEY_COUNT as u8 {
                if m.read(Location::Key(k))? != 0 {
                    pressed = Some(k);
                    break;
                }
            }
            match pressed {
                Some(k) => m.write(reg(x), k as u16)?,
                // Replay this instruction next cycle.
                None => {
                    m.subtract_into(Location::ProgramCounter, 2)?;
                }
            }
        }

        Instruction::GetDelayTimer { x } => {
            let value = m.read(Location::DelayTimer)?;
            m.write(reg(x), value)?;
        }

        Instruction::SetDelayTimer { x } => {
            let value = m.read(reg(x))?;
            m.write(Location::DelayTimer, value)?;
        }

        Instruction::SetSoundTimer { x } => {
            let value = m.read(reg(x))?;
            m.write(Location::SoundTimer, value)?;
        }
    }

    Ok(())
}

/// XOR an 8-pixel-wide sprite of `height` rows from memory[I..] onto the
/// framebuffer at (VX, VY). VF ends up 1 if any lit pixel was turned off.
///
/// VF is cleared before the coordinates are read, and the coordinates are
/// read once. Pixel coordinates wrap at the framebuffer edges.
fn draw<M: Machine + ?Sized>(m: &mut M, x: u8, y: u8, height: u8) -> Result<(), CpuError> {
    let i = m.read(Location::Index)?;
    Memory::check_range(i as usize, height as usize)?;

    m.write(Location::FLAG, 0)?;
    let (bx, by) = m.read_pair(reg(x), reg(y))?;

    let mut collision = false;
    for dy in 0..height as u16 {
        let sprite = m.read(Location::Memory(i + dy))? as u8;
        for dx in 0..8u16 {
            let bit = (sprite >> (7 - dx)) & 1 == 1;
            let pixel = Location::Pixel { x: bx + dx, y: by + dy };
            let existing = m.read(pixel)? != 0;
            collision |= bit && existing;
            m.write(pixel, (bit ^ existing) as u16)?;
        }
    }

    if collision {
        m.write(Location::FLAG, 1)?;
    }
    Ok(())
}

/// Errors that halt instruction dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CpuError {
    #[error("return with an empty call stack")]
    StackUnderflow,

    #[error("call stack overflow at depth {depth}")]
    StackOverflow { depth: usize },

    #[error("memory error: {0}")]
    Memory(#[from] MemoryError),

    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("invalid frame rate: {0} Hz")]
    InvalidFrameRate(u32),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::memory::FONT;
    use crate::cpu::registers::FLAG;
    use crate::cpu::MachineState;
    use std::collections::VecDeque;

    fn machine() -> MachineState {
        MachineState::new(&[], 0).unwrap()
    }

    fn set_regs(m: &mut MachineState, values: &[(u8, u8)]) {
        for &(r, v) in values {
            m.regs.v[r as usize] = v;
        }
    }

    #[test]
    fn test_add_register_carry() {
        let mut m = machine();
        set_regs(&mut m, &[(1, 200), (2, 100)]);
        execute(&mut m, Instruction::Add { x: 1, operand: Operand::Register(2) }).unwrap();
        assert_eq!(m.regs.v[1], 44);
        assert_eq!(m.regs.flag(), 1);

        set_regs(&mut m, &[(1, 155), (2, 100)]);
        execute(&mut m, Instruction::Add { x: 1, operand: Operand::Register(2) }).unwrap();
        assert_eq!(m.regs.v[1], 255);
        assert_eq!(m.regs.flag(), 0);
    }

    #[test]
    fn test_add_immediate_leaves_flag() {
        let mut m = machine();
        set_regs(&mut m, &[(3, 250), (FLAG, 7)]);
        execute(&mut m, Instruction::Add { x: 3, operand: Operand::Immediate(10) }).unwrap();
        assert_eq!(m.regs.v[3], 4);
        assert_eq!(m.regs.flag(), 7);
    }

    #[test]
    fn test_add_into_flag_register_writes_flag_last() {
        let mut m = machine();
        set_regs(&mut m, &[(FLAG, 0xFF), (1, 2)]);
        execute(&mut m, Instruction::Add { x: FLAG, operand: Operand::Register(1) }).unwrap();
        assert_eq!(m.regs.flag(), 1);
    }

    #[test]
    fn test_subtract_borrow() {
        let mut m = machine();
        set_regs(&mut m, &[(0, 5), (1, 10)]);
        execute(&mut m, Instruction::Subtract { x: 0, y: 1 }).unwrap();
        assert_eq!(m.regs.v[0], 251);
        assert_eq!(m.regs.flag(), 0);

        set_regs(&mut m, &[(0, 10), (1, 10)]);
        execute(&mut m, Instruction::Subtract { x: 0, y: 1 }).unwrap();
        assert_eq!(m.regs.v[0], 0);
        assert_eq!(m.regs.flag(), 1);
    }

    #[test]
    fn test_subtract_reversed() {
        let mut m = machine();
        set_regs(&mut m, &[(0, 5), (1, 10)]);
        execute(&mut m, Instruction::SubtractReversed { x: 0, y: 1 }).unwrap();
        assert_eq!(m.regs.v[0], 5);
        assert_eq!(m.regs.flag(), 1);

        set_regs(&mut m, &[(0, 10), (1, 5)]);
        execute(&mut m, Instruction::SubtractReversed { x: 0, y: 1 }).unwrap();
        assert_eq!(m.regs.v[0], 251);
        assert_eq!(m.regs.flag(), 0);
    }

    #[test]
    fn test_subtract_uses_pre_op_flag_operand() {
        let mut m = machine();
        set_regs(&mut m, &[(0, 3), (FLAG, 1)]);
        execute(&mut m, Instruction::Subtract { x: 0, y: FLAG }).unwrap();
        assert_eq!(m.regs.v[0], 2);
        assert_eq!(m.regs.flag(), 1);
    }

    #[test]
    fn test_shifts() {
        let mut m = machine();
        set_regs(&mut m, &[(4, 0b1000_0011)]);
        execute(&mut m, Instruction::ShiftRight { x: 4 }).unwrap();
        assert_eq!(m.regs.v[4], 0b0100_0001);
        assert_eq!(m.regs.flag(), 1);

        set_regs(&mut m, &[(4, 0b1000_0010)]);
        execute(&mut m, Instruction::ShiftLeft { x: 4 }).unwrap();
        assert_eq!(m.regs.v[4], 0b0000_0100);
        assert_eq!(m.regs.flag(), 1);

        set_regs(&mut m, &[(4, 0b0100_0000)]);
        execute(&mut m, Instruction::ShiftLeft { x: 4 }).unwrap();
        assert_eq!(m.regs.v[4], 0b1000_0000);
        assert_eq!(m.regs.flag(), 0);
    }

    #[test]
    fn test_shift_flag_register_keeps_flag() {
        let mut m = machine();
        set_regs(&mut m, &[(FLAG, 0b0000_0010)]);
        execute(&mut m, Instruction::ShiftRight { x: FLAG }).unwrap();
        assert_eq!(m.regs.flag(), 0);
    }

    #[test]
    fn test_bitwise() {
        let mut m = machine();
        set_regs(&mut m, &[(0, 0b1100), (1, 0b1010), (FLAG, 9)]);
        execute(&mut m, Instruction::Or { x: 0, y: 1 }).unwrap();
        assert_eq!(m.regs.v[0], 0b1110);
        set_regs(&mut m, &[(0, 0b1100)]);
        execute(&mut m, Instruction::And { x: 0, y: 1 }).unwrap();
        assert_eq!(m.regs.v[0], 0b1000);
        set_regs(&mut m, &[(0, 0b1100)]);
        execute(&mut m, Instruction::Xor { x: 0, y: 1 }).unwrap();
        assert_eq!(m.regs.v[0], 0b0110);
        assert_eq!(m.regs.flag(), 9);
    }

    #[test]
    fn test_skips() {
        let mut m = machine();
        set_regs(&mut m, &[(2, 0x42), (3, 0x42)]);

        execute(&mut m, Instruction::SkipIfEqual { x: 2, operand: Operand::Immediate(0x42) }).unwrap();
        assert_eq!(m.regs.pc, 0x202);
        execute(&mut m, Instruction::SkipIfEqual { x: 2, operand: Operand::Immediate(0x41) }).unwrap();
        assert_eq!(m.regs.pc, 0x202);
        execute(&mut m, Instruction::SkipIfNotEqual { x: 2, operand: Operand::Register(3) }).unwrap();
        assert_eq!(m.regs.pc, 0x202);
        execute(&mut m, Instruction::SkipIfEqual { x: 2, operand: Operand::Register(3) }).unwrap();
        assert_eq!(m.regs.pc, 0x204);
        execute(&mut m, Instruction::SkipIfNotEqual { x: 2, operand: Operand::Immediate(0) }).unwrap();
        assert_eq!(m.regs.pc, 0x206);
    }

    #[test]
    fn test_call_and_return() {
        let mut m = machine();
        m.regs.pc = 0x206;
        execute(&mut m, Instruction::Call { addr: 0x400 }).unwrap();
        assert_eq!(m.regs.pc, 0x400);
        assert_eq!(m.stack, vec![0x206]);
        execute(&mut m, Instruction::Return).unwrap();
        assert_eq!(m.regs.pc, 0x206);
        assert!(m.stack.is_empty());
    }

    #[test]
    fn test_return_on_empty_stack_has_no_effect() {
        let mut m = machine();
        let before = m.regs.clone();
        assert_eq!(execute(&mut m, Instruction::Return), Err(CpuError::StackUnderflow));
        assert_eq!(m.regs, before);
    }

    #[test]
    fn test_call_past_depth_limit_has_no_effect() {
        let mut m = machine();
        for _ in 0..16 {
            execute(&mut m, Instruction::Call { addr: 0x300 }).unwrap();
        }
        assert_eq!(
            execute(&mut m, Instruction::Call { addr: 0x500 }),
            Err(CpuError::StackOverflow { depth: 16 })
        );
        assert_eq!(m.regs.pc, 0x300);
        assert_eq!(m.stack.len(), 16);
    }

    #[test]
    fn test_jumps() {
        let mut m = machine();
        execute(&mut m, Instruction::Jump { addr: 0x345 }).unwrap();
        assert_eq!(m.regs.pc, 0x345);
        set_regs(&mut m, &[(0, 0x10)]);
        execute(&mut m, Instruction::JumpOffset { addr: 0x300 }).unwrap();
        assert_eq!(m.regs.pc, 0x310);
    }

    #[test]
    fn test_draw_collision_and_erase() {
        let mut m = machine();
        m.mem.write(0x300, 0xFF).unwrap();
        m.regs.index = 0x300;
        set_regs(&mut m, &[(0, 10), (1, 5)]);

        execute(&mut m, Instruction::Draw { x: 0, y: 1, height: 1 }).unwrap();
        assert_eq!(m.regs.flag(), 0);
        assert!((10..18).all(|x| m.framebuffer.pixel(x, 5)));
        assert_eq!(m.framebuffer.lit_count(), 8);

        execute(&mut m, Instruction::Draw { x: 0, y: 1, height: 1 }).unwrap();
        assert_eq!(m.regs.flag(), 1);
        assert_eq!(m.framebuffer.lit_count(), 0);
    }

    #[test]
    fn test_draw_collision_is_sticky_across_sprite() {
        let mut m = machine();
        // Two rows; only the first overlaps an existing pixel.
        m.mem.write(0x300, 0x80).unwrap();
        m.mem.write(0x301, 0x01).unwrap();
        m.regs.index = 0x300;
        m.framebuffer.set_pixel(0, 0, true);

        execute(&mut m, Instruction::Draw { x: 0, y: 0, height: 2 }).unwrap();
        assert_eq!(m.regs.flag(), 1);
        assert!(!m.framebuffer.pixel(0, 0));
        assert!(m.framebuffer.pixel(7, 1));
    }

    #[test]
    fn test_draw_wraps_at_edges() {
        let mut m = machine();
        m.mem.write(0x300, 0xFF).unwrap();
        m.regs.index = 0x300;
        set_regs(&mut m, &[(0, 60), (1, 31)]);
        execute(&mut m, Instruction::Draw { x: 0, y: 1, height: 1 }).unwrap();
        assert!(m.framebuffer.pixel(63, 31));
        assert!(m.framebuffer.pixel(0, 31));
        assert!(m.framebuffer.pixel(3, 31));
        assert_eq!(m.framebuffer.lit_count(), 8);
    }

    #[test]
    fn test_draw_clears_flag_before_reading_coordinates() {
        let mut m = machine();
        m.mem.write(0x300, 0x80).unwrap();
        m.regs.index = 0x300;
        set_regs(&mut m, &[(FLAG, 20), (1, 3)]);
        execute(&mut m, Instruction::Draw { x: FLAG, y: 1, height: 1 }).unwrap();
        assert!(m.framebuffer.pixel(0, 3));
        assert_eq!(m.regs.flag(), 0);
    }

    #[test]
    fn test_draw_past_memory_has_no_effect() {
        let mut m = machine();
        m.regs.index = 0xFFE;
        set_regs(&mut m, &[(FLAG, 5)]);
        let result = execute(&mut m, Instruction::Draw { x: 0, y: 0, height: 3 });
        assert!(matches!(result, Err(CpuError::Memory(MemoryError::AddressOverflow { .. }))));
        assert_eq!(m.regs.flag(), 5);
        assert_eq!(m.framebuffer.lit_count(), 0);
    }

    #[test]
    fn test_clear_screen() {
        let mut m = machine();
        m.framebuffer.fill(true);
        execute(&mut m, Instruction::ClearScreen).unwrap();
        assert_eq!(m.framebuffer.lit_count(), 0);
    }

    #[test]
    fn test_store_bcd() {
        let mut m = machine();
        m.regs.index = 0x300;
        set_regs(&mut m, &[(5, 213)]);
        execute(&mut m, Instruction::StoreBcdDigits { x: 5 }).unwrap();
        assert_eq!(m.mem.slice(0x300, 3).unwrap(), &[2, 1, 3]);

        set_regs(&mut m, &[(5, 7)]);
        execute(&mut m, Instruction::StoreBcdDigits { x: 5 }).unwrap();
        assert_eq!(m.mem.slice(0x300, 3).unwrap(), &[0, 0, 7]);
    }

    #[test]
    fn test_store_bcd_past_memory_has_no_effect() {
        let mut m = machine();
        m.regs.index = 0xFFE;
        set_regs(&mut m, &[(0, 255)]);
        assert!(execute(&mut m, Instruction::StoreBcdDigits { x: 0 }).is_err());
        assert_eq!(m.mem.read(0xFFE), Ok(0));
        assert_eq!(m.mem.read(0xFFF), Ok(0));
    }

    #[test]
    fn test_dump_and_load_round_trip() {
        let mut m = machine();
        m.regs.index = 0x400;
        let original: Vec<u8> = (0..16).map(|r| r * 11 + 3).collect();
        m.regs.v.copy_from_slice(&original);

        execute(&mut m, Instruction::DumpRegisters { x: 0xA }).unwrap();
        for r in 0..=0xA {
            m.regs.v[r] = 0;
        }
        execute(&mut m, Instruction::LoadRegisters { x: 0xA }).unwrap();

        assert_eq!(&m.regs.v[..=0xA], &original[..=0xA]);
        assert_eq!(m.mem.read(0x40B), Ok(0));
        assert_eq!(m.regs.index, 0x400);
    }

    #[test]
    fn test_dump_past_memory_has_no_effect() {
        let mut m = machine();
        m.regs.index = 0xFFC;
        m.regs.v = [9; 16];
        assert!(execute(&mut m, Instruction::DumpRegisters { x: 4 }).is_err());
        assert!(m.mem.slice(0xFFC, 4).unwrap().iter().all(|b| *b == 0));
    }

    #[test]
    fn test_load_past_memory_has_no_effect() {
        let mut m = machine();
        m.regs.index = 0xFFC;
        m.mem.write(0xFFC, 0xAA).unwrap();
        m.regs.v = [9; 16];
        assert_eq!(
            execute(&mut m, Instruction::LoadRegisters { x: 4 }),
            Err(CpuError::Memory(MemoryError::AddressOverflow { address: 0x1000 }))
        );
        assert_eq!(m.regs.v, [9; 16]);
        assert_eq!(m.regs.index, 0xFFC);
    }

    #[test]
    fn test_add_to_index_overflow_flag() {
        let mut m = machine();
        m.regs.index = 0xFF0;
        set_regs(&mut m, &[(2, 0x0F)]);
        execute(&mut m, Instruction::AddToIndex { x: 2 }).unwrap();
        assert_eq!(m.regs.index, 0xFFF);
        assert_eq!(m.regs.flag(), 0);

        set_regs(&mut m, &[(2, 0x01)]);
        execute(&mut m, Instruction::AddToIndex { x: 2 }).unwrap();
        assert_eq!(m.regs.index, 0x1000);
        assert_eq!(m.regs.flag(), 1);
    }

    #[test]
    fn test_add_to_index_saturates_past_memory() {
        let mut m = machine();
        m.regs.index = 0xFFF0;
        set_regs(&mut m, &[(1, 0x20), (4, 213)]);
        execute(&mut m, Instruction::AddToIndex { x: 1 }).unwrap();
        assert_eq!(m.regs.index, 0xFFFF);
        assert_eq!(m.regs.flag(), 1);

        assert_eq!(
            execute(&mut m, Instruction::StoreBcdDigits { x: 4 }),
            Err(CpuError::Memory(MemoryError::AddressOverflow { address: 0xFFFF }))
        );
        assert!(m.mem.slice(0, 0x20).unwrap().iter().zip(&FONT[..0x20]).all(|(a, b)| a == b));
    }

    #[test]
    fn test_add_to_index_chain_never_wraps() {
        let mut m = machine();
        set_regs(&mut m, &[(0, 0xFF), (4, 7)]);
        for _ in 0..300 {
            execute(&mut m, Instruction::AddToIndex { x: 0 }).unwrap();
        }
        assert_eq!(m.regs.index, 0xFFFF);
        assert!(matches!(
            execute(&mut m, Instruction::StoreBcdDigits { x: 4 }),
            Err(CpuError::Memory(MemoryError::AddressOverflow { .. }))
        ));
    }

    #[test]
    fn test_font_glyph() {
        let mut m = machine();
        set_regs(&mut m, &[(3, 0x1B)]);
        execute(&mut m, Instruction::SetIndexToFontGlyph { x: 3 }).unwrap();
        assert_eq!(m.regs.index, 0xB * 5);
    }

    #[test]
    fn test_key_skips() {
        let mut m = machine();
        set_regs(&mut m, &[(1, 0xA)]);
        execute(&mut m, Instruction::SkipIfKeyPressed { x: 1 }).unwrap();
        assert_eq!(m.regs.pc, 0x200);
        execute(&mut m, Instruction::SkipIfKeyNotPressed { x: 1 }).unwrap();
        assert_eq!(m.regs.pc, 0x202);

        m.set_key(0xA, true);
        execute(&mut m, Instruction::SkipIfKeyPressed { x: 1 }).unwrap();
        assert_eq!(m.regs.pc, 0x204);
        execute(&mut m, Instruction::SkipIfKeyNotPressed { x: 1 }).unwrap();
        assert_eq!(m.regs.pc, 0x204);
    }

    #[test]
    fn test_key_skips_use_low_nibble() {
        let mut m = machine();
        set_regs(&mut m, &[(0, 0x13)]);
        m.set_key(0x3, true);
        execute(&mut m, Instruction::SkipIfKeyPressed { x: 0 }).unwrap();
        assert_eq!(m.regs.pc, 0x202);
        execute(&mut m, Instruction::SkipIfKeyNotPressed { x: 0 }).unwrap();
        assert_eq!(m.regs.pc, 0x202);
    }

    #[test]
    fn test_wait_for_key() {
        let mut m = machine();
        m.regs.pc = 0x202;
        set_regs(&mut m, &[(4, 0x77)]);
        execute(&mut m, Instruction::WaitForKey { x: 4 }).unwrap();
        assert_eq!(m.regs.pc, 0x200);
        assert_eq!(m.regs.v[4], 0x77);

        m.regs.pc = 0x202;
        m.set_key(0x9, true);
        m.set_key(0x3, true);
        execute(&mut m, Instruction::WaitForKey { x: 4 }).unwrap();
        assert_eq!(m.regs.pc, 0x202);
        assert_eq!(m.regs.v[4], 0x3);
    }

    #[test]
    fn test_timers() {
        let mut m = machine();
        set_regs(&mut m, &[(0, 30), (1, 45)]);
        execute(&mut m, Instruction::SetDelayTimer { x: 0 }).unwrap();
        execute(&mut m, Instruction::SetSoundTimer { x: 1 }).unwrap();
        assert_eq!((m.regs.delay_timer, m.regs.sound_timer), (30, 45));
        execute(&mut m, Instruction::GetDelayTimer { x: 2 }).unwrap();
        assert_eq!(m.regs.v[2], 30);
        assert!(m.is_sound_active());
    }

    /// Delegates to a real machine but draws random bytes from a script.
    struct ScriptedRandom {
        inner: MachineState,
        bytes: VecDeque<u8>,
    }

    impl Machine for ScriptedRandom {
        fn read(&self, loc: Location) -> Result<u16, CpuError> {
            self.inner.read(loc)
        }
        fn write(&mut self, loc: Location, value: u16) -> Result<(), CpuError> {
            self.inner.write(loc, value)
        }
        fn push(&mut self, addr: u16) -> Result<(), CpuError> {
            self.inner.push(addr)
        }
        fn pop(&mut self) -> Result<u16, CpuError> {
            self.inner.pop()
        }
        fn random_byte(&mut self) -> u8 {
            self.bytes.pop_front().unwrap_or(0)
        }
    }

    #[test]
    fn test_random_masks_scripted_bytes() {
        let mut m = ScriptedRandom {
            inner: machine(),
            bytes: VecDeque::from(vec![0xAB, 0xFF]),
        };
        m.inner.regs.index = 0x123;
        execute(&mut m, Instruction::Random { x: 1, mask: 0x0F }).unwrap();
        execute(&mut m, Instruction::Random { x: 2, mask: 0xF0 }).unwrap();
        assert_eq!(m.inner.regs.v[1], 0x0B);
        assert_eq!(m.inner.regs.v[2], 0xF0);
        assert_eq!(m.inner.regs.index, 0x123);
    }

    #[test]
    fn test_random_is_reproducible_per_seed() {
        let draws = |seed| {
            let mut m = MachineState::new(&[], seed).unwrap();
            (0..16)
                .map(|_| {
                    execute(&mut m, Instruction::Random { x: 0, mask: 0xFF }).unwrap();
                    m.regs.v[0]
                })
                .collect::<Vec<u8>>()
        };
        assert_eq!(draws(7), draws(7));
        assert_ne!(draws(7), draws(8));
    }
}
