//! UI rendering for the player.

use super::app::PlayerApp;
use crate::cpu::framebuffer::{HEIGHT, WIDTH};
use crate::Framebuffer;
use ratatui::{
    prelude::*,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Paragraph},
};

/// Main draw function.
pub fn draw(frame: &mut Frame, app: &PlayerApp) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(WIDTH as u16 + 2),
            Constraint::Min(30),
        ])
        .split(frame.area());

    let left_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(HEIGHT as u16 / 2 + 2),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .split(chunks[0]);

    draw_screen(frame, left_chunks[0], app);
    draw_status(frame, left_chunks[1], app);

    let right_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(10),
            Constraint::Length(7),
            Constraint::Min(5),
        ])
        .split(chunks[1]);

    draw_registers(frame, right_chunks[0], app);
    draw_keypad(frame, right_chunks[1], app);
    draw_help(frame, right_chunks[2]);
}

/// Render the framebuffer two rows per terminal line using half blocks.
pub fn screen_lines(fb: &Framebuffer) -> Vec<String> {
    (0..HEIGHT / 2)
        .map(|row| {
            (0..WIDTH)
                .map(|x| match (fb.pixel(x, row * 2), fb.pixel(x, row * 2 + 1)) {
                    (true, true) => '█',
                    (true, false) => '▀',
                    (false, true) => '▄',
                    (false, false) => ' ',
                })
                .collect()
        })
        .collect()
}

fn draw_screen(frame: &mut Frame, area: Rect, app: &PlayerApp) {
    let lines: Vec<Line> = screen_lines(app.machine.framebuffer())
        .into_iter()
        .map(Line::from)
        .collect();

    let title = if app.machine.is_sound_active() {
        " Screen ♪ "
    } else {
        " Screen "
    };

    let screen = Paragraph::new(lines)
        .style(Style::default().fg(Color::Green))
        .block(Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)));

    frame.render_widget(screen, area);
}

fn draw_registers(frame: &mut Frame, area: Rect, app: &PlayerApp) {
    let regs = &app.machine.regs;

    let mut content: Vec<Line> = (0..4)
        .map(|row| {
            let spans: Vec<Span> = (0..4)
                .map(|col| {
                    let r = row * 4 + col;
                    Span::raw(format!("V{:X}={:02X} ", r, regs.v[r]))
                })
                .collect();
            Line::from(spans)
        })
        .collect();

    content.push(Line::from(vec![
        Span::raw("PC="),
        Span::styled(format!("{:03X}", regs.pc), Style::default().fg(Color::Yellow)),
        Span::raw(format!("  I={:03X}", regs.index)),
    ]));
    content.push(Line::from(format!(
        "DT={:02X}  ST={:02X}  SP={}",
        regs.delay_timer,
        regs.sound_timer,
        app.machine.stack.len()
    )));
    content.push(Line::from(vec![
        Span::raw("Cycles: "),
        Span::styled(format!("{}", app.machine.cycles), Style::default().fg(Color::Cyan)),
        Span::raw(format!("  {} Hz", app.hz)),
    ]));

    let paragraph = Paragraph::new(content)
        .block(Block::default()
            .title(" Registers ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green)));

    frame.render_widget(paragraph, area);
}

/// Keypad panel, laid out like the physical 4x4 pad.
fn draw_keypad(frame: &mut Frame, area: Rect, app: &PlayerApp) {
    const PAD: [[u8; 4]; 4] = [
        [0x1, 0x2, 0x3, 0xC],
        [0x4, 0x5, 0x6, 0xD],
        [0x7, 0x8, 0x9, 0xE],
        [0xA, 0x0, 0xB, 0xF],
    ];

    let content: Vec<Line> = PAD
        .iter()
        .map(|row| {
            let spans: Vec<Span> = row
                .iter()
                .map(|&key| {
                    let style = if app.machine.keypad.is_pressed(key) {
                        Style::default().fg(Color::Black).bg(Color::Yellow).add_modifier(Modifier::BOLD)
                    } else {
                        Style::default().fg(Color::DarkGray)
                    };
                    Span::styled(format!(" {:X} ", key), style)
                })
                .collect();
            Line::from(spans)
        })
        .collect();

    let title = match app.machine.keypad.first_pressed() {
        Some(key) => format!(" Keypad [{:X}] ", key),
        None => " Keypad ".to_string(),
    };

    let keypad = Paragraph::new(content)
        .block(Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta)));

    frame.render_widget(keypad, area);
}

fn draw_status(frame: &mut Frame, area: Rect, app: &PlayerApp) {
    let style = if app.paused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::White)
    };

    let status = Paragraph::new(app.status.clone())
        .style(style)
        .block(Block::default()
            .title(" Status ")
            .borders(Borders::ALL));

    frame.render_widget(status, area);
}

fn draw_help(frame: &mut Frame, area: Rect) {
    let help = Paragraph::new(vec![
        Line::from("1234 qwer asdf zxcv: keypad"),
        Line::from("p: Pause  Backspace: Reset"),
        Line::from("Esc: Quit"),
    ])
    .style(Style::default().fg(Color::DarkGray))
    .block(Block::default()
        .title(" Help ")
        .borders(Borders::ALL));

    frame.render_widget(help, area);
}
