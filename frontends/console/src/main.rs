//! Headless console front end for pocketgb.
//!
//! Loads a BIOS, a ROM and (optionally) a save file, then clocks the
//! machine frame by frame for a bounded run, flushing the cartridge's
//! battery-backed RAM to disk before exit. The host window/input/audio
//! layer is out of scope for this crate (see spec.md §1) — this binary
//! exists to exercise the `<bios> <rom> [<save>]` CLI contract in §6.

use clap::Parser;
use pocketgb::{error::Error, gb::GameBoy};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "pocketgb", about = "A Game Boy (DMG) emulator core")]
struct Args {
    /// Path to the 256 byte DMG boot ROM
    bios_file: String,

    /// Path to the cartridge ROM
    rom_file: String,

    /// Path to the battery save file (defaults to the ROM path with a
    /// `.sav` extension)
    save_file: Option<String>,

    /// Number of frames to run before shutting down cleanly
    #[arg(long, default_value_t = 3600)]
    frames: u64,
}

fn run(args: &Args) -> Result<(), Error> {
    let mut game_boy = GameBoy::new();
    game_boy.attach_null_serial();
    game_boy.load_bios_file(&args.bios_file)?;
    game_boy.load_rom_file(&args.rom_file, args.save_file.as_deref())?;

    println!("{}", game_boy.description(9));

    for _ in 0..args.frames {
        game_boy.next_frame();
    }

    game_boy.flush_save()?;
    println!("Ran {} frame(s)", args.frames);
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("pocketgb: {}", err);
            ExitCode::FAILURE
        }
    }
}
