use crate::commands::Commands;

use clap::Parser;

#[derive(Parser, Debug)]
#[clap(name = "ark-cli")]
#[clap(
    about = "Read large files backward or with a progress bar",
    long_about = None
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}
