use std::io::{BufRead, Write};

use indicatif::ProgressBar;
use stanza::{
    Vocab,
    io::{read_vocab, write_vocab},
    types::TokenCount,
};

use crate::{
    input_output::{InputArgs, OutputArgs, open_path_or_stdin},
    logging::LogArgs,
};

/// Vocabulary subcommands.
#[derive(clap::Subcommand, Debug)]
pub enum VocabCommands {
    /// Count whitespace-separated tokens into a vocabulary file.
    Build(BuildArgs),

    /// Drop tokens seen fewer than `--cutoff` times.
    Prune(PruneArgs),

    /// Reorder tokens by decreasing count.
    Sort(SortArgs),
}

impl VocabCommands {
    /// Run the subcommand.
    pub fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        match self {
            VocabCommands::Build(cmd) => cmd.run(),
            VocabCommands::Prune(cmd) => cmd.run(),
            VocabCommands::Sort(cmd) => cmd.run(),
        }
    }
}

/// Args for the vocab build command.
#[derive(clap::Args, Debug)]
pub struct BuildArgs {
    /// Corpus files; reads stdin when none are given.
    files: Vec<String>,

    /// Unknown token, placed at id 0.
    #[arg(long)]
    unk: Option<String>,

    /// Drop tokens seen fewer times than this.
    #[arg(long, default_value = "0")]
    min_count: TokenCount,

    /// Sort the tokens by decreasing count.
    #[arg(long)]
    sort: bool,

    #[command(flatten)]
    output: OutputArgs,

    #[command(flatten)]
    logging: LogArgs,
}

impl BuildArgs {
    fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.logging.setup_logging(3)?;

        let progress_bar = if self.logging.show_progress() {
            ProgressBar::new_spinner()
        } else {
            ProgressBar::hidden()
        };

        let mut vocab = Vocab::new(self.unk.as_deref());
        let sources: Vec<Option<&str>> = if self.files.is_empty() {
            vec![None]
        } else {
            self.files.iter().map(|f| Some(f.as_str())).collect()
        };
        for source in sources {
            progress_bar.set_message(source.unwrap_or("<stdin>").to_string());
            count_tokens(&mut vocab, open_path_or_stdin(source)?, &progress_bar)?;
        }
        progress_bar.finish_and_clear();

        let vocab = finish_vocab(vocab, self.min_count, self.sort);
        log::info!(
            "vocabulary: {} tokens, {} occurrences",
            vocab.len(),
            vocab.total_count()
        );

        let mut writer = self.output.open_writer()?;
        write_vocab(&vocab, &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

/// Add every whitespace-separated token read from `reader` to `vocab`.
fn count_tokens<R: BufRead>(
    vocab: &mut Vocab,
    reader: R,
    progress_bar: &ProgressBar,
) -> Result<(), Box<dyn std::error::Error>> {
    for line in reader.lines() {
        vocab.update(line?.split_whitespace())?;
        progress_bar.inc(1);
    }
    Ok(())
}

fn finish_vocab(
    vocab: Vocab,
    min_count: TokenCount,
    sort: bool,
) -> Vocab {
    let vocab = if min_count > 0 {
        vocab.prune_rares(min_count)
    } else {
        vocab
    };
    if sort {
        vocab.sort_by_decreasing_count()
    } else {
        vocab
    }
}

/// Args for the vocab prune command.
#[derive(clap::Args, Debug)]
pub struct PruneArgs {
    /// Minimum count to keep a token.
    #[arg(long)]
    cutoff: TokenCount,

    #[command(flatten)]
    input: InputArgs,

    #[command(flatten)]
    output: OutputArgs,

    #[command(flatten)]
    logging: LogArgs,
}

impl PruneArgs {
    fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.logging.setup_logging(2)?;

        let vocab = read_vocab(self.input.open_reader()?)?;
        let pruned = vocab.prune_rares(self.cutoff);
        log::info!("pruned {} -> {} tokens", vocab.len(), pruned.len());

        let mut writer = self.output.open_writer()?;
        write_vocab(&pruned, &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

/// Args for the vocab sort command.
#[derive(clap::Args, Debug)]
pub struct SortArgs {
    #[command(flatten)]
    input: InputArgs,

    #[command(flatten)]
    output: OutputArgs,

    #[command(flatten)]
    logging: LogArgs,
}

impl SortArgs {
    fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.logging.setup_logging(2)?;

        let vocab = read_vocab(self.input.open_reader()?)?;

        let mut writer = self.output.open_writer()?;
        write_vocab(&vocab.sort_by_decreasing_count(), &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}
