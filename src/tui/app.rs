//! Player application state and the terminal event loop.

use crate::cpu::keypad::KEY_COUNT;
use crate::MachineState;

/// Frames a key stays down after the terminal reports a press.
///
/// Terminals rarely report key releases, so each press is held briefly
/// and then released by the player.
pub const KEY_HOLD_FRAMES: u8 = 6;

/// Keyboard layout: the left hand block of a QWERTY keyboard mapped onto
/// the 4x4 hex keypad.
#[rustfmt::skip]
const KEY_LAYOUT: [(char, u8); KEY_COUNT] = [
    ('1', 0x1), ('2', 0x2), ('3', 0x3), ('4', 0xC),
    ('q', 0x4), ('w', 0x5), ('e', 0x6), ('r', 0xD),
    ('a', 0x7), ('s', 0x8), ('d', 0x9), ('f', 0xE),
    ('z', 0xA), ('x', 0x0), ('c', 0xB), ('v', 0xF),
];

/// Keypad key for a keyboard character, if it is mapped.
pub fn keypad_key(c: char) -> Option<u8> {
    let c = c.to_ascii_lowercase();
    KEY_LAYOUT
        .iter()
        .find(|(ch, _)| *ch == c)
        .map(|(_, key)| *key)
}

/// Player application state.
pub struct PlayerApp {
    /// The machine being played.
    pub machine: MachineState,
    /// Host frame rate.
    pub hz: u32,
    pub paused: bool,
    pub should_quit: bool,
    /// Status message to display.
    pub status: String,
    /// Frames left before each held key is released.
    held: [u8; KEY_COUNT],
}

impl PlayerApp {
    pub fn new(machine: MachineState, hz: u32) -> Self {
        Self {
            machine,
            hz,
            paused: false,
            should_quit: false,
            status: "Running. p: pause, Backspace: reset, Esc: quit.".into(),
            held: [0; KEY_COUNT],
        }
    }

    /// Press a keypad key and hold it for [`KEY_HOLD_FRAMES`] frames.
    pub fn press(&mut self, key: u8) {
        let key = key & 0xF;
        self.held[key as usize] = KEY_HOLD_FRAMES;
        self.machine.set_key(key, true);
    }

    pub fn is_held(&self, key: u8) -> bool {
        self.held[(key & 0xF) as usize] > 0
    }

    /// Run one frame, then age the held keys.
    pub fn tick(&mut self) {
        if self.paused {
            return;
        }

        if let Err(e) = self.machine.advance_frame(self.hz) {
            self.paused = true;
            self.status = format!("Halted at PC={:#05x}: {}", self.machine.regs.pc, e);
        }

        for key in 0..KEY_COUNT as u8 {
            let remaining = &mut self.held[key as usize];
            if *remaining > 0 {
                *remaining -= 1;
                if *remaining == 0 {
                    self.machine.set_key(key, false);
                }
            }
        }
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
        self.status = if self.paused { "Paused." } else { "Running." }.into();
    }

    /// Restart the program from its loaded image.
    pub fn reset(&mut self) {
        self.machine.reset();
        self.held = [0; KEY_COUNT];
        self.paused = false;
        self.status = "Reset.".into();
    }
}

/// Play a machine in the terminal until the user quits.
pub fn run_player(machine: MachineState, hz: u32) -> std::io::Result<()> {
    use crossterm::{
        event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
        terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
        ExecutableCommand,
    };
    use ratatui::prelude::*;
    use std::io::stdout;
    use std::time::{Duration, Instant};

    if hz == 0 {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "frame rate must be at least 1 Hz",
        ));
    }
    let frame_interval = Duration::from_secs(1) / hz;

    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut app = PlayerApp::new(machine, hz);
    let mut last_frame = Instant::now();

    loop {
        terminal.draw(|frame| {
            super::ui::draw(frame, &app);
        })?;

        let timeout = frame_interval.saturating_sub(last_frame.elapsed());
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Esc => app.should_quit = true,
                        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                            app.should_quit = true
                        }
                        KeyCode::Char('p') => app.toggle_pause(),
                        KeyCode::Backspace => app.reset(),
                        KeyCode::Char(c) => {
                            if let Some(k) = keypad_key(c) {
                                app.press(k);
                            }
                        }
                        _ => {}
                    }
                }
            }
        }

        if last_frame.elapsed() >= frame_interval {
            app.tick();
            last_frame = Instant::now();
        }

        if app.should_quit {
            break;
        }
    }

    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
}
