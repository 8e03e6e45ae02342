//! # `gitolite-conf`
//!
//! Command-line front end for the gitolite.conf compiler.
//!
//! ## Usage
//!
//! ```sh
//! gitolite-conf check conf/gitolite.conf
//! gitolite-conf format conf/gitolite.conf --output-dir /tmp/out
//! gitolite-conf show conf/gitolite.conf --format json
//! gitolite-conf keys keydir
//! ```
//!
//! Exit codes follow [`GitoliteError::exit_code`]; anything else exits 1.

use clap::Parser as _;
use gitolite_conf::cli::Args;
use gitolite_conf::error::GitoliteError;
use tracing::error;
use tracing_subscriber::{EnvFilter, fmt};

fn main() {
    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    match gitolite_conf::run(args) {
        Ok(()) => std::process::exit(0),
        Err(err) => {
            error!("{err:#}");
            std::process::exit(
                err.downcast_ref::<GitoliteError>()
                    .map_or(1, GitoliteError::exit_code),
            );
        }
    }
}
