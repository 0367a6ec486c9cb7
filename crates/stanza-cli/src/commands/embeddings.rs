use std::{io::Write, str::FromStr};

use stanza::{
    Embeddings,
    MissingRowFill,
    Neighbor,
    ann::LshOptions,
    io::load_vocab_path,
    pretrained::{load_glove_path, load_senna_paths},
};

use crate::{input_output::OutputArgs, logging::LogArgs};

/// Embedding subcommands.
#[derive(clap::Subcommand, Debug)]
pub enum EmbeddingsCommands {
    /// Convert ``GloVe`` or ``SENNA`` text vectors to ``{prefix}.npy`` / ``{prefix}.vocab``.
    Import(ImportArgs),

    /// Find the nearest neighbors of a word or vector.
    Neighbors(NeighborsArgs),
}

impl EmbeddingsCommands {
    /// Run the subcommand.
    pub fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        match self {
            EmbeddingsCommands::Import(cmd) => cmd.run(),
            EmbeddingsCommands::Neighbors(cmd) => cmd.run(),
        }
    }
}

/// Row fill for tokens missing from the imported vectors.
#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FillMode {
    /// All zeros.
    #[default]
    Zeros,

    /// Uniform draws from ``(-scale, scale)``.
    Uniform,
}

/// Args for the embeddings import command.
#[derive(clap::Args, Debug)]
pub struct ImportArgs {
    /// ``GloVe`` text vector file.
    #[arg(long, conflicts_with_all = ["senna_words", "senna_vectors"])]
    glove: Option<String>,

    /// SENNA word list file.
    #[arg(long, requires = "senna_vectors")]
    senna_words: Option<String>,

    /// SENNA vector file.
    #[arg(long, requires = "senna_words")]
    senna_vectors: Option<String>,

    /// Unknown token, placed at id 0.
    #[arg(long)]
    unk: Option<String>,

    /// Output path prefix.
    #[arg(long)]
    output_prefix: String,

    /// Restrict (and reorder) the vectors to this vocabulary file.
    #[arg(long)]
    vocab: Option<String>,

    /// Fill for vocabulary tokens with no vector.
    #[arg(long, value_enum, default_value_t = FillMode::Zeros)]
    fill: FillMode,

    /// Half-width of the uniform fill.
    #[arg(long, default_value = "0.1")]
    scale: f32,

    /// Seed for the uniform fill.
    #[arg(long, default_value = "0")]
    seed: u64,

    #[command(flatten)]
    logging: LogArgs,
}

impl ImportArgs {
    fn missing_row_fill(&self) -> MissingRowFill {
        match self.fill {
            FillMode::Zeros => MissingRowFill::Zeros,
            FillMode::Uniform => MissingRowFill::Uniform {
                scale: self.scale,
                seed: self.seed,
            },
        }
    }

    fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.logging.setup_logging(3)?;

        let unk = self.unk.as_deref();
        let emb = match (&self.glove, &self.senna_words, &self.senna_vectors) {
            (Some(glove), _, _) => load_glove_path(glove, unk)?,
            (None, Some(words), Some(vectors)) => load_senna_paths(words, vectors, unk)?,
            _ => return Err("one of --glove or --senna-words/--senna-vectors is required".into()),
        };
        log::info!("read {} vectors of width {}", emb.len(), emb.dim());

        let emb = match &self.vocab {
            Some(path) => emb.project_onto(&load_vocab_path(path)?, self.missing_row_fill())?,
            None => emb,
        };

        emb.save(&self.output_prefix)?;
        Ok(())
    }
}

/// Args for the embeddings neighbors command.
#[derive(clap::Args, Debug)]
pub struct NeighborsArgs {
    /// Path prefix of the ``.npy`` / ``.vocab`` pair.
    #[arg(long)]
    prefix: String,

    /// Query word; unknown words use the unknown token's vector.
    #[arg(long, conflicts_with = "vector", required_unless_present = "vector")]
    word: Option<String>,

    /// Query vector, as whitespace or comma separated values.
    #[arg(long)]
    vector: Option<String>,

    /// Number of neighbors.
    #[arg(short, long, default_value = "10")]
    k: usize,

    /// Use the approximate (LSH) index, ranked by cosine similarity.
    #[arg(long)]
    approx: bool,

    /// LSH hash tables.
    #[arg(long, default_value = "8")]
    lsh_tables: usize,

    /// LSH hyperplanes per table.
    #[arg(long, default_value = "12")]
    lsh_bits: usize,

    /// Emit JSON instead of tab-separated lines.
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    output: OutputArgs,

    #[command(flatten)]
    logging: LogArgs,
}

/// One line of neighbor output.
#[derive(serde::Serialize, Debug, PartialEq)]
struct NeighborRecord<'a> {
    rank: usize,
    id: usize,
    token: &'a str,
    score: f32,
}

impl NeighborsArgs {
    fn query(
        &self,
        emb: &Embeddings,
    ) -> Result<Vec<f32>, Box<dyn std::error::Error>> {
        Ok(match (&self.word, &self.vector) {
            (Some(word), _) => emb.lookup(word)?.to_vec(),
            (None, Some(vector)) => parse_vector(vector)?,
            (None, None) => return Err("one of --word or --vector is required".into()),
        })
    }

    fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.logging.setup_logging(2)?;

        let emb = Embeddings::load(&self.prefix)?;
        let query = self.query(&emb)?;

        let neighbors = if self.approx {
            let emb = emb.with_ann_options(
                LshOptions::default()
                    .with_num_tables(self.lsh_tables)
                    .with_num_bits(self.lsh_bits),
            );
            emb.k_nearest_approx(&query, self.k)?
        } else {
            emb.k_nearest(&query, self.k)?
        };

        let mut writer = self.output.open_writer()?;
        write_neighbors(&mut writer, &neighbors, self.json)?;
        writer.flush()?;
        Ok(())
    }
}

/// Parse a query vector from whitespace and/or comma separated values.
fn parse_vector(text: &str) -> Result<Vec<f32>, std::num::ParseFloatError> {
    text.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(f32::from_str)
        .collect()
}

fn write_neighbors<W: Write>(
    writer: &mut W,
    neighbors: &[Neighbor],
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let records: Vec<NeighborRecord> = neighbors
        .iter()
        .enumerate()
        .map(|(rank, n)| NeighborRecord {
            rank,
            id: n.id,
            token: &n.token,
            score: n.score,
        })
        .collect();

    if json {
        serde_json::to_writer_pretty(&mut *writer, &records)?;
        writeln!(writer)?;
    } else {
        for r in &records {
            writeln!(writer, "{}\t{}\t{}", r.rank, r.token, r.score)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_vector() {
        assert_eq!(parse_vector("3 2 1").unwrap(), vec![3.0, 2.0, 1.0]);
        assert_eq!(parse_vector(" 0.5, -1,2 ").unwrap(), vec![0.5, -1.0, 2.0]);
        assert!(parse_vector("").unwrap().is_empty());
        assert!(parse_vector("1 x").is_err());
    }

    fn neighbors() -> Vec<Neighbor> {
        vec![
            Neighbor {
                id: 3,
                token: "show".to_string(),
                score: 58.0,
            },
            Neighbor {
                id: 2,
                token: "a".to_string(),
                score: 40.0,
            },
        ]
    }

    #[test]
    fn test_write_neighbors_text() {
        let mut buf = Vec::new();
        write_neighbors(&mut buf, &neighbors(), false).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "0\tshow\t58\n1\ta\t40\n");
    }

    #[test]
    fn test_write_neighbors_json() {
        let mut buf = Vec::new();
        write_neighbors(&mut buf, &neighbors(), true).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value[0]["token"], "show");
        assert_eq!(value[0]["id"], 3);
        assert_eq!(value[1]["rank"], 1);
        assert_eq!(value[1]["score"], 40.0);
    }
}
