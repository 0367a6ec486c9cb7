mod commands;
mod disk_cache;
mod input_output;
mod logging;

use clap::Parser;
use commands::Commands;

/// stanza: vocabulary and word embedding tools.
#[derive(clap::Parser, Debug)]
pub struct Args {
    /// Subcommand to run.
    #[clap(subcommand)]
    pub command: Commands,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    args.command.run()
}
