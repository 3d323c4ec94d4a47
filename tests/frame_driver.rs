//! Small programs driven through the public frame API.

use octo8::{assemble, CpuError, Instruction, MachineConfig, MachineState, Operand, FONT};

fn imm(x: u8, nn: u8) -> Instruction {
    Instruction::Set { x, operand: Operand::Immediate(nn) }
}

fn load(program: &[Instruction]) -> MachineState {
    MachineState::new(&assemble(program), 0).unwrap()
}

#[test]
fn test_store_bcd_of_213() {
    let mut m = load(&[
        imm(0, 213),
        Instruction::SetIndex { addr: 0x300 },
        Instruction::StoreBcdDigits { x: 0 },
        Instruction::Jump { addr: 0x206 },
    ]);

    m.advance_frame(60).unwrap();
    assert_eq!(m.mem.slice(0x300, 3).unwrap(), &[2, 1, 3]);
}

#[test]
fn test_subtract_five_minus_ten() {
    let mut m = load(&[
        imm(0, 5),
        imm(1, 10),
        Instruction::Subtract { x: 0, y: 1 },
        Instruction::Jump { addr: 0x206 },
    ]);

    m.advance_frame(60).unwrap();
    assert_eq!(m.regs.v[0], 251);
    assert_eq!(m.regs.v[0xF], 0);
}

#[test]
fn test_drawing_a_sprite_twice_erases_it() {
    let mut rom = assemble(&[
        Instruction::SetIndex { addr: 0x208 },
        Instruction::Draw { x: 0, y: 1, height: 1 },
        Instruction::Draw { x: 0, y: 1, height: 1 },
        Instruction::Jump { addr: 0x206 },
    ]);
    rom.push(0xFF);
    let mut m = MachineState::new(&rom, 0).unwrap();

    m.step().unwrap();
    m.step().unwrap();
    assert_eq!(m.framebuffer().lit_count(), 8);
    assert_eq!(m.regs.v[0xF], 0);

    m.step().unwrap();
    assert_eq!(m.framebuffer().lit_count(), 0);
    assert_eq!(m.regs.v[0xF], 1);
}

#[test]
fn test_font_glyph_draw() {
    let mut m = load(&[
        imm(2, 0x0),
        Instruction::SetIndexToFontGlyph { x: 2 },
        imm(0, 10),
        imm(1, 4),
        Instruction::Draw { x: 0, y: 1, height: 5 },
        Instruction::Jump { addr: 0x20A },
    ]);

    m.advance_frame(60).unwrap();

    let expected: u32 = FONT[..5].iter().map(|row| row.count_ones()).sum();
    assert_eq!(m.framebuffer().lit_count(), expected as usize);
    // Top row of the zero glyph is 0xF0.
    assert!((10..14).all(|x| m.framebuffer().pixel(x, 4)));
    assert!(!m.framebuffer().pixel(14, 4));
}

#[test]
fn test_wait_for_key_blocks_until_press() {
    let mut m = load(&[
        Instruction::WaitForKey { x: 5 },
        Instruction::Jump { addr: 0x202 },
    ]);

    for _ in 0..3 {
        m.advance_frame(60).unwrap();
        assert_eq!(m.regs.pc, 0x200);
        assert_eq!(m.regs.v[5], 0);
    }

    m.set_key(0x7, true);
    m.advance_frame(60).unwrap();
    assert_eq!(m.regs.v[5], 0x7);
    assert_eq!(m.regs.pc, 0x202);
}

#[test]
fn test_sound_timer_runs_down() {
    let mut m = load(&[
        imm(0, 2),
        Instruction::SetSoundTimer { x: 0 },
        Instruction::Jump { addr: 0x204 },
    ]);

    m.advance_frame(60).unwrap();
    assert!(m.is_sound_active());
    m.advance_frame(60).unwrap();
    assert!(m.is_sound_active());
    m.advance_frame(60).unwrap();
    assert!(!m.is_sound_active());
}

#[test]
fn test_fault_stops_frame_and_repeats() {
    let mut m = load(&[imm(3, 1), Instruction::Return]);

    assert_eq!(m.advance_frame(60), Err(CpuError::StackUnderflow));
    assert_eq!(m.regs.pc, 0x202);
    assert_eq!(m.regs.v[3], 1);
    assert_eq!(m.cycles, 1);

    assert_eq!(m.advance_frame(60), Err(CpuError::StackUnderflow));
    assert_eq!(m.regs.pc, 0x202);
    assert_eq!(m.cycles, 1);
}

#[test]
fn test_recursion_overflows_the_stack() {
    let mut m = load(&[Instruction::Call { addr: 0x200 }]);

    // 500 / 31 = 16 calls fill the stack exactly.
    assert_eq!(m.advance_frame(31), Ok(16));
    assert_eq!(m.stack.len(), 16);

    assert_eq!(m.advance_frame(31), Err(CpuError::StackOverflow { depth: 16 }));
    assert_eq!(m.stack.len(), 16);
    assert_eq!(m.regs.pc, 0x200);
}

#[test]
fn test_zero_hz_is_rejected() {
    let mut m = load(&[Instruction::Jump { addr: 0x200 }]);
    m.regs.delay_timer = 9;
    assert_eq!(m.advance_frame(0), Err(CpuError::InvalidFrameRate(0)));
    assert_eq!(m.regs.delay_timer, 9);
    assert_eq!(m.cycles, 0);
}

#[test]
fn test_baseline_rate_sets_instructions_per_frame() {
    let config = MachineConfig { baseline_rate: 1000, ..MachineConfig::default() };
    let rom = assemble(&[Instruction::Jump { addr: 0x200 }]);
    let mut m = MachineState::with_config(config, &FONT, &rom, 0).unwrap();

    assert_eq!(m.advance_frame(100), Ok(10));
    assert_eq!(m.advance_frame(60), Ok(16));
    assert_eq!(m.cycles, 26);
}

#[test]
fn test_reset_replays_identically() {
    let mut rom = assemble(&[
        Instruction::Random { x: 0, mask: 0x3F },
        Instruction::Random { x: 1, mask: 0x1F },
        Instruction::SetIndex { addr: 0x20C },
        Instruction::Draw { x: 0, y: 1, height: 1 },
        Instruction::Add { x: 2, operand: Operand::Immediate(1) },
        Instruction::Jump { addr: 0x200 },
    ]);
    rom.push(0b1010_0000);
    let mut m = MachineState::new(&rom, 42).unwrap();

    let run = |m: &mut MachineState| {
        for _ in 0..20 {
            m.advance_frame(60).unwrap();
        }
        (m.regs.clone(), m.framebuffer().to_row_major())
    };

    let first = run(&mut m);
    m.reset();
    assert_eq!(m.framebuffer().lit_count(), 0);
    let second = run(&mut m);
    assert_eq!(first, second);
}

#[test]
fn test_jump_offset() {
    let mut m = load(&[imm(0, 4), Instruction::JumpOffset { addr: 0x300 }]);
    m.step().unwrap();
    m.step().unwrap();
    assert_eq!(m.regs.pc, 0x304);
}
