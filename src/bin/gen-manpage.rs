//! Writes ftspi.1 plus one ftspi-<command>.1 page per subcommand
//!
//! Usage: cargo run --bin gen-manpage -- [output-dir]

use clap::CommandFactory;
use std::fs;
use std::path::{Path, PathBuf};

#[path = "../cli.rs"]
mod cli;

fn render(cmd: clap::Command, dir: &Path, title: &str) -> std::io::Result<PathBuf> {
    let mut page = Vec::new();
    clap_mangen::Man::new(cmd).title(title).render(&mut page)?;
    let path = dir.join(format!("{}.1", title));
    fs::write(&path, page)?;
    Ok(path)
}

fn main() -> std::io::Result<()> {
    let output_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("man"));
    fs::create_dir_all(&output_dir)?;

    let cmd = cli::Cli::command();
    let mut pages = vec![render(cmd.clone(), &output_dir, "ftspi")?];

    for sub in cmd.get_subcommands() {
        let title = format!("ftspi-{}", sub.get_name());
        pages.push(render(sub.clone(), &output_dir, &title)?);
    }

    for page in &pages {
        println!("wrote {}", page.display());
    }
    println!("\nView with: man -l {}", pages[0].display());

    Ok(())
}
