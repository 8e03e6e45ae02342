use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Command-line arguments for gitolite-conf
#[derive(Parser, Debug, Clone)]
#[command(name = "gitolite-conf")]
#[command(about = "Check, normalize and inspect gitolite-admin configuration")]
#[command(long_about = None)]
#[command(version)]
pub struct Args {
    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Parse a gitolite.conf and report what it declares
    Check {
        /// Path of the gitolite.conf to check
        #[arg(value_name = "CONF")]
        config: PathBuf,
    },

    /// Rewrite a gitolite.conf in canonical form
    Format {
        /// Path of the gitolite.conf to format
        #[arg(value_name = "CONF")]
        config: PathBuf,

        /// Directory to write to (defaults to the input's directory)
        #[arg(long, value_name = "DIR")]
        output_dir: Option<PathBuf>,

        /// File name to write (defaults to the input's file name)
        #[arg(long, value_name = "NAME")]
        filename: Option<String>,
    },

    /// Print the parsed model of a gitolite.conf
    Show {
        /// Path of the gitolite.conf to show
        #[arg(value_name = "CONF")]
        config: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value_t = ShowFormat::Yaml)]
        format: ShowFormat,
    },

    /// List the public keys of a key directory
    Keys {
        /// Path of the key directory
        #[arg(value_name = "KEYDIR")]
        keydir: PathBuf,
    },
}

/// Serialization used by `show`
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowFormat {
    Json,
    Yaml,
}
