use std::io;

use anyhow::Result;
use clap::Parser;
use ftbridge::cli::{self, Cli};
use ftbridge::DefaultBackend;
use log::info;

fn main() -> Result<()> {
    ftbridge::init_logger();
    let args = Cli::parse();

    let backend = DefaultBackend::default();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    info!("Running {:?}", args.command);
    cli::run(args.command, &backend, &mut out)?;
    Ok(())
}
