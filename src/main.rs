use std::env;

use anyhow::Result;
use clap::Parser;
use log::LevelFilter;
use logsim::{CLIArguments, check_main, simulate_main};

fn setup_logging() -> Result<()> {
    let level = env::var("LOGSIM_LOG")
        .ok()
        .and_then(|level| level.parse().ok())
        .unwrap_or(LevelFilter::Warn);

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {}] {}",
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply()?;
    Ok(())
}

fn main() -> Result<()> {
    setup_logging()?;
    let args = CLIArguments::parse();

    match args {
        CLIArguments::Check(args) => check_main(args),
        CLIArguments::Simulate(args) => simulate_main(args),
    }
}
