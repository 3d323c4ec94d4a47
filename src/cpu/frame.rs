//! Fetch-decode-evaluate cycle and the per-frame driver.

use crate::cpu::decode::{decode, Instruction};
use crate::cpu::execute::{execute, CpuError};
use crate::cpu::location::{Location, Machine};
use log::{trace, warn};

/// A frame that stopped early.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameFault {
    /// Instructions that completed before the fault.
    pub executed: u32,
    pub error: CpuError,
}

/// Read the big-endian instruction word at `pc`.
pub fn fetch<M: Machine + ?Sized>(m: &M, pc: u16) -> Result<u16, CpuError> {
    let hi = m.read(Location::Memory(pc))?;
    let lo = m.read(Location::Memory(pc + 1))?;
    Ok(hi << 8 | lo)
}

/// Run one cycle: fetch at PC, advance PC by 2, decode, evaluate.
///
/// If the word does not decode or the instruction fails, PC is put back
/// on the faulting instruction and nothing else has changed.
pub fn step<M: Machine + ?Sized>(m: &mut M) -> Result<Instruction, CpuError> {
    let pc = m.read(Location::ProgramCounter)?;
    let word = fetch(m, pc)?;
    m.write(Location::ProgramCounter, pc + 2)?;

    let outcome = decode(word)
        .map_err(CpuError::from)
        .and_then(|instr| execute(m, instr).map(|()| instr));

    match outcome {
        Ok(instr) => {
            trace!("{:#05x}: {:04x} {:?}", pc, word, instr);
            Ok(instr)
        }
        Err(error) => {
            m.write(Location::ProgramCounter, pc)?;
            Err(error)
        }
    }
}

/// Count the delay and sound timers down by one each, stopping at zero.
pub fn tick_timers<M: Machine + ?Sized>(m: &mut M) -> Result<(), CpuError> {
    for timer in [Location::DelayTimer, Location::SoundTimer] {
        if m.read(timer)? > 0 {
            m.subtract_into(timer, 1)?;
        }
    }
    Ok(())
}

/// Instructions run per frame at `hz`. Rates that do not divide
/// `baseline_rate` round down.
pub fn instructions_per_frame(hz: u32, baseline_rate: u32) -> Result<u32, CpuError> {
    match hz {
        0 => Err(CpuError::InvalidFrameRate(hz)),
        _ => Ok(baseline_rate / hz),
    }
}

/// Run one host frame: tick the timers once, then run
/// `baseline_rate / hz` cycles. Stops at the first fault.
pub fn advance_frame<M: Machine + ?Sized>(
    m: &mut M,
    hz: u32,
    baseline_rate: u32,
) -> Result<u32, FrameFault> {
    advance_frame_with(m, hz, baseline_rate, |_, _| {})
}

/// [`advance_frame`], calling `observe(pc, instruction)` after each
/// instruction completes.
pub fn advance_frame_with<M, F>(
    m: &mut M,
    hz: u32,
    baseline_rate: u32,
    mut observe: F,
) -> Result<u32, FrameFault>
where
    M: Machine + ?Sized,
    F: FnMut(u16, &Instruction),
{
    let count = instructions_per_frame(hz, baseline_rate)
        .map_err(|error| FrameFault { executed: 0, error })?;

    tick_timers(m).map_err(|error| FrameFault { executed: 0, error })?;

    for executed in 0..count {
        let pc = m
            .read(Location::ProgramCounter)
            .map_err(|error| FrameFault { executed, error })?;
        match step(m) {
            Ok(instr) => observe(pc, &instr),
            Err(error) => {
                warn!(
                    "frame halted after {} of {} instructions at {:#05x}: {}",
                    executed, count, pc, error
                );
                return Err(FrameFault { executed, error });
            }
        }
    }

    Ok(count)
}
