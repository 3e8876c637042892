use clap::Parser;

use crate::cli::Cli;
use crate::commands::Commands;

mod cli;
mod commands;
mod error;
mod util;

pub use error::AppError;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Cli::parse();

    match args.command {
        Commands::Reverse(reverse) => reverse.run()?,
        Commands::Cat(cat) => cat.run()?,
        Commands::Count(count) => count.run()?,
    };

    Ok(())
}
