//! octo8 - CLI Entry Point
//!
//! Commands:
//! - `octo8 run <rom>` - Run a ROM headless for a number of frames
//! - `octo8 play <rom>` - Play a ROM in the terminal

use clap::{Args, Parser, Subcommand};
use octo8::{Config, MachineState, FONT};

#[derive(Parser)]
#[command(name = "octo8")]
#[command(version)]
#[command(about = "A deterministic CHIP-8 virtual machine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command that builds a machine.
#[derive(Args)]
struct SessionArgs {
    /// Path to the ROM image
    rom: String,
    /// Frames per second (overrides the config file)
    #[arg(long)]
    hz: Option<u32>,
    /// Random generator seed (overrides the config file)
    #[arg(long)]
    seed: Option<u64>,
    /// JSON config file
    #[arg(short, long)]
    config: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a ROM for a fixed number of frames and print the final state
    Run {
        #[command(flatten)]
        session: SessionArgs,
        /// Number of frames to run
        #[arg(short, long, default_value = "60")]
        frames: u64,
        /// Print every executed instruction as a JSON line
        #[arg(short, long)]
        trace: bool,
    },
    /// Play a ROM in the terminal
    #[cfg(feature = "tui")]
    Play {
        #[command(flatten)]
        session: SessionArgs,
    },
}

/// One executed instruction, as printed by `run --trace`.
#[derive(serde::Serialize)]
struct TraceLine<'a> {
    frame: u64,
    pc: u16,
    instruction: &'a octo8::Instruction,
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { session, frames, trace } => {
            env_logger::init();
            run_rom(&session, frames, trace);
        }
        #[cfg(feature = "tui")]
        Commands::Play { session } => {
            play_rom(&session);
        }
    }
}

fn fail(message: String) -> ! {
    eprintln!("❌ {}", message);
    std::process::exit(1);
}

/// Config file (or defaults) with command-line overrides applied.
fn resolve_config(session: &SessionArgs) -> Config {
    let mut config = match &session.config {
        Some(path) => Config::load(path).unwrap_or_else(|e| fail(e.to_string())),
        None => Config::default(),
    };
    if let Some(hz) = session.hz {
        config.hz = hz;
    }
    if let Some(seed) = session.seed {
        config.seed = seed;
    }
    if config.hz == 0 {
        fail("frame rate must be at least 1 Hz".into());
    }
    config
}

fn build_machine(session: &SessionArgs, config: &Config) -> MachineState {
    let rom = octo8::load_rom(&session.rom).unwrap_or_else(|e| fail(e.to_string()));
    MachineState::with_config(config.machine, &FONT, &rom, config.seed)
        .unwrap_or_else(|e| fail(format!("cannot load {}: {}", session.rom, e)))
}

fn run_rom(session: &SessionArgs, frames: u64, trace: bool) {
    let config = resolve_config(session);
    let mut machine = build_machine(session, &config);

    if !trace {
        println!("🔧 Running: {} ({} frames at {} Hz, seed {})", session.rom, frames, config.hz, config.seed);
    }

    let mut fault = None;
    for frame in 0..frames {
        let result = machine.advance_frame_with(config.hz, |pc, instruction| {
            if trace {
                let line = TraceLine { frame, pc, instruction };
                match serde_json::to_string(&line) {
                    Ok(json) => println!("{}", json),
                    Err(e) => eprintln!("trace error: {}", e),
                }
            }
        });

        if let Err(e) = result {
            fault = Some((frame, e));
            break;
        }
    }

    if !trace {
        println!();
        println!("━━━ Screen ━━━");
        print!("{}", machine.framebuffer());
        println!();
        println!("━━━ Registers ━━━");
        print_registers(&machine);
    }

    if let Some((frame, e)) = fault {
        fail(format!("fault in frame {} at PC={:#05x}: {}", frame, machine.regs.pc, e));
    }
}

fn print_registers(machine: &MachineState) {
    let regs = &machine.regs;
    for (n, values) in regs.v.chunks(8).enumerate() {
        let cells: Vec<String> = values
            .iter()
            .enumerate()
            .map(|(i, v)| format!("V{:X}={:02X}", n * 8 + i, v))
            .collect();
        println!("{}", cells.join(" "));
    }
    println!("PC={:03X}  I={:03X}  DT={:02X}  ST={:02X}", regs.pc, regs.index, regs.delay_timer, regs.sound_timer);
    println!("Stack: {:03X?}", machine.stack);
    println!("Cycles: {}", machine.cycles);
}

#[cfg(feature = "tui")]
fn play_rom(session: &SessionArgs) {
    let config = resolve_config(session);
    let machine = build_machine(session, &config);

    // Logging stays off while the terminal is in raw mode.
    if let Err(e) = octo8::run_player(machine, config.hz) {
        fail(format!("player error: {}", e));
    }
}
