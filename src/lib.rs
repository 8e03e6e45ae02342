//! `gitolite-conf` - compiler and toolkit for gitolite-admin repositories
//!
//! The core is the gitolite.conf compiler in [`config`]: a line parser that
//! builds an in-memory model of repos and groups, a mutation API over that
//! model, and a renderer that writes groups in dependency order so the
//! output always re-parses to the same model. Around it sit the SSH key
//! directory model in [`keys`] and the admin-repo working copy in [`admin`],
//! which commits and pushes changes through the `git` command line.

pub mod admin;
pub mod cli;
pub mod config;
pub mod error;
pub mod keys;
pub mod system;
pub mod utils;

use anyhow::Result;
use cli::{Args, Command};
use system::RealSystem;

/// Main entry point for the gitolite-conf binary
///
/// # Errors
///
/// Returns the error of the selected command
pub fn run(args: Args) -> Result<()> {
    let system = RealSystem::new();

    match args.command {
        Command::Check { config } => {
            print!("{}", cli::check(&system, &config)?);
        }
        Command::Format {
            config,
            output_dir,
            filename,
        } => {
            let written = cli::format(
                &system,
                &config,
                output_dir.as_deref(),
                filename.as_deref(),
            )?;
            println!("{}", written.display());
        }
        Command::Show { config, format } => {
            print!("{}", cli::show(&system, &config, format)?);
        }
        Command::Keys { keydir } => {
            print!("{}", cli::keys(&system, &keydir)?);
        }
    }

    Ok(())
}
