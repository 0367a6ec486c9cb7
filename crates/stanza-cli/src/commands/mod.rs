mod embeddings;
mod fetch;
mod vocab;

/// Subcommands for the CLI.
#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Build, prune, and sort vocabulary files.
    #[command(subcommand)]
    Vocab(vocab::VocabCommands),

    /// Import embeddings and query their neighbors.
    #[command(subcommand)]
    Embeddings(embeddings::EmbeddingsCommands),

    /// Locate (and optionally download) a pretrained data file.
    Fetch(fetch::FetchArgs),
}

impl Commands {
    /// Run the subcommand.
    pub fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        match self {
            Commands::Vocab(cmd) => cmd.run(),
            Commands::Embeddings(cmd) => cmd.run(),
            Commands::Fetch(cmd) => cmd.run(),
        }
    }
}
