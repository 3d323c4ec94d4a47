//! The complete machine state for one emulated session.

use crate::config::MachineConfig;
use crate::cpu::decode::Instruction;
use crate::cpu::execute::CpuError;
use crate::cpu::frame;
use crate::cpu::framebuffer::Framebuffer;
use crate::cpu::keypad::Keypad;
use crate::cpu::location::{Location, Machine};
use crate::cpu::memory::{ConstructionError, Memory, FONT};
use crate::cpu::registers::Registers;
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Registers, memory, stack, timers, input, framebuffer and generator.
///
/// Created once from a program image and a seed. Instructions mutate it
/// through the [`Machine`] trait; the host writes keys between frames and
/// reads the framebuffer and sound timer after them.
#[derive(Clone)]
pub struct MachineState {
    pub regs: Registers,
    pub mem: Memory,
    /// Saved return addresses, most recent last.
    pub stack: Vec<u16>,
    pub keypad: Keypad,
    pub framebuffer: Framebuffer,
    /// Instructions executed since construction.
    pub cycles: u64,
    rng: StdRng,
    config: MachineConfig,
    /// Memory as constructed, restored by `reset`.
    image: Memory,
    seed: u64,
}

impl MachineState {
    /// Build a machine with the built-in font and default configuration.
    pub fn new(program: &[u8], seed: u64) -> Result<Self, ConstructionError> {
        Self::with_config(MachineConfig::default(), &FONT, program, seed)
    }

    /// Build a machine with a host-supplied font table.
    pub fn with_font(font: &[u8], program: &[u8], seed: u64) -> Result<Self, ConstructionError> {
        Self::with_config(MachineConfig::default(), font, program, seed)
    }

    pub fn with_config(
        config: MachineConfig,
        font: &[u8],
        program: &[u8],
        seed: u64,
    ) -> Result<Self, ConstructionError> {
        let image = Memory::with_image(font, program)?;
        debug!(
            "machine built: {} byte program, {} byte font, seed {}, {:?}",
            program.len(),
            font.len(),
            seed,
            config
        );

        Ok(Self {
            regs: Registers::new(),
            mem: image.clone(),
            stack: Vec::with_capacity(config.max_stack_depth),
            keypad: Keypad::new(),
            framebuffer: Framebuffer::new(),
            cycles: 0,
            rng: StdRng::seed_from_u64(seed),
            config,
            image,
            seed,
        })
    }

    /// Return to the state construction produced.
    pub fn reset(&mut self) {
        self.mem = self.image.clone();
        self.regs = Registers::new();
        self.stack.clear();
        self.keypad.release_all();
        self.framebuffer.fill(false);
        self.cycles = 0;
        self.rng = StdRng::seed_from_u64(self.seed);
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Run one fetch-decode-evaluate cycle.
    pub fn step(&mut self) -> Result<Instruction, CpuError> {
        let instr = frame::step(self)?;
        self.cycles += 1;
        Ok(instr)
    }

    /// Run one host frame at `hz`: timers first, then `baseline_rate / hz`
    /// instructions. Returns the number of instructions executed.
    ///
    /// On a fault the rest of the frame is skipped and the error returned;
    /// the faulting instruction leaves no trace.
    pub fn advance_frame(&mut self, hz: u32) -> Result<u32, CpuError> {
        self.advance_frame_with(hz, |_, _| {})
    }

    /// [`advance_frame`](Self::advance_frame), reporting each executed
    /// instruction and the address it was fetched from.
    pub fn advance_frame_with<F>(&mut self, hz: u32, observe: F) -> Result<u32, CpuError>
    where
        F: FnMut(u16, &Instruction),
    {
        let baseline_rate = self.config.baseline_rate;
        let result = frame::advance_frame_with(self, hz, baseline_rate, observe);
        let executed = match &result {
            Ok(n) => *n,
            Err(fault) => fault.executed,
        };
        self.cycles += executed as u64;
        result.map_err(|fault| fault.error)
    }

    /// Host input: press or release key `key & 0xF`.
    pub fn set_key(&mut self, key: u8, pressed: bool) {
        self.keypad.set(key, pressed);
    }

    /// Whether the host should be sounding its tone.
    pub fn is_sound_active(&self) -> bool {
        self.regs.sound_timer > 0
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }
}

impl Machine for MachineState {
    fn read(&self, loc: Location) -> Result<u16, CpuError> {
        let value = match loc {
            Location::Register(r) => self.regs.v[(r & 0xF) as usize] as u16,
            Location::Memory(addr) => self.mem.read(addr as usize)? as u16,
            Location::Index => self.regs.index,
            Location::ProgramCounter => self.regs.pc,
            Location::DelayTimer => self.regs.delay_timer as u16,
            Location::SoundTimer => self.regs.sound_timer as u16,
            Location::Key(k) => self.keypad.is_pressed(k) as u16,
            Location::Pixel { x, y } => self.framebuffer.pixel(x as usize, y as usize) as u16,
            Location::Framebuffer => (self.framebuffer.lit_count() > 0) as u16,
        };
        Ok(value)
    }

    fn write(&mut self, loc: Location, value: u16) -> Result<(), CpuError> {
        match loc {
            Location::Register(r) => self.regs.v[(r & 0xF) as usize] = value as u8,
            Location::Memory(addr) => self.mem.write(addr as usize, value as u8)?,
            Location::Index => self.regs.index = value,
            Location::ProgramCounter => self.regs.pc = value,
            Location::DelayTimer => self.regs.delay_timer = value as u8,
            Location::SoundTimer => self.regs.sound_timer = value as u8,
            Location::Key(k) => self.keypad.set(k, value != 0),
            Location::Pixel { x, y } => {
                self.framebuffer.set_pixel(x as usize, y as usize, value != 0)
            }
            Location::Framebuffer => self.framebuffer.fill(value != 0),
        }
        Ok(())
    }

    fn push(&mut self, addr: u16) -> Result<(), CpuError> {
        if self.stack.len() >= self.config.max_stack_depth {
            return Err(CpuError::StackOverflow {
                depth: self.stack.len(),
            });
        }
        self.stack.push(addr);
        Ok(())
    }

    fn pop(&mut self) -> Result<u16, CpuError> {
        self.stack.pop().ok_or(CpuError::StackUnderflow)
    }

    fn random_byte(&mut self) -> u8 {
        self.rng.random()
    }
}

impl std::fmt::Debug for MachineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MachineState")
            .field("regs", &self.regs)
            .field("stack", &self.stack)
            .field("cycles", &self.cycles)
            .field("framebuffer", &self.framebuffer)
            .finish()
    }
}
