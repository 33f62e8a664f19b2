//! ftspi - SPI master over FTDI MPSSE
//!
//! Talks to SPI peripherals through the MPSSE engine of an FTDI USB
//! bridge.
//!
//! # Architecture
//!
//! Every programmer is an `FtdiSpi` over some MPSSE transport:
//! - **ftdi** - A real FT2232H/FT4232H/FT232H cable via libftdi1
//! - **dummy** - An in-memory MPSSE engine with an emulated flash
//!
//! Commands only see the programmer through the `SpiInterface` trait, so
//! the same implementation runs against hardware and the emulator.

mod cli;
mod commands;
mod programmers;

use clap::Parser;
use cli::{Cli, Commands};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    match cli.command {
        Commands::List => commands::list(),
        Commands::Rdid { programmer } => {
            programmers::with_programmer(&programmer, commands::run_rdid)
        }
        Commands::Status { programmer } => {
            programmers::with_programmer(&programmer, commands::run_status)
        }
        Commands::Xfer {
            programmer,
            write,
            read,
        } => {
            let write = write.map(|w| w.0).unwrap_or_default();
            if write.is_empty() && read == 0 {
                return Err("Nothing to transfer: give --write and/or --read".into());
            }
            programmers::with_programmer(&programmer, |spi| {
                commands::run_xfer(spi, &write, read)
            })
        }
        Commands::Wait {
            programmer,
            cmd,
            mask,
            expected,
            max_iterations,
        } => programmers::with_programmer(&programmer, |spi| {
            commands::run_wait(spi, cmd, mask, expected, max_iterations)
        }),
    }
}
