//! # Text Embedding Readers

use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use crate::{
    embeddings::{EmbeddingMatrix, Embeddings},
    errors::{StanzaError, StanzaResult},
    vocab::Vocab,
};

/// Row-major vectors, accumulated line by line.
#[derive(Default)]
struct RowBuffer {
    words: Vec<String>,
    data: Vec<f32>,
    dim: Option<usize>,
}

impl RowBuffer {
    fn push_row<'a, I>(
        &mut self,
        line_no: usize,
        values: I,
    ) -> StanzaResult<()>
    where
        I: Iterator<Item = &'a str>,
    {
        let start = self.data.len();
        for v in values {
            let x = v.parse::<f32>().map_err(|e| {
                StanzaError::Parse(format!("line {line_no}: bad value {v:?}: {e}"))
            })?;
            self.data.push(x);
        }
        let width = self.data.len() - start;

        let dim = *self.dim.get_or_insert(width);
        if width != dim {
            return Err(StanzaError::ShapeMismatch(format!(
                "line {line_no}: vector has width {width}, expected {dim}"
            )));
        }
        Ok(())
    }

    fn push_glove_row(
        &mut self,
        line_no: usize,
        line: &str,
    ) -> StanzaResult<()> {
        let mut fields = line.split(' ');
        let word = fields.next().unwrap_or_default();
        self.push_row(line_no, fields.filter(|f| !f.is_empty()))?;
        self.words.push(word.to_string());
        Ok(())
    }

    fn rows(&self) -> usize {
        match self.dim {
            Some(0) | None => self.words.len(),
            Some(dim) => self.data.len() / dim,
        }
    }

    /// Build embeddings; the unknown token moves to id 0, or gets a zero
    /// row there when the file has no vector for it.
    fn into_embeddings(
        self,
        unk: Option<&str>,
    ) -> StanzaResult<Embeddings> {
        let dim = self.dim.unwrap_or(0);
        let unk_row = unk.and_then(|u| self.words.iter().position(|w| w == u));
        let rows = self.words.len() + usize::from(unk.is_some() && unk_row.is_none());

        let mut vocab = Vocab::new(unk);
        let mut matrix = EmbeddingMatrix::zeros(rows, dim);
        let source = |j: usize| &self.data[j * dim..(j + 1) * dim];

        if let Some(j) = unk_row {
            matrix.row_mut(0).copy_from_slice(source(j));
        }
        for (j, word) in self.words.iter().enumerate() {
            if Some(j) == unk_row {
                continue;
            }
            if vocab.contains(word) {
                return Err(StanzaError::NotBijection(format!(
                    "token {word:?} appears more than once"
                )));
            }
            let id = vocab.push_new(word.clone(), 0);
            matrix.row_mut(id).copy_from_slice(source(j));
        }

        log::debug!("read {} vectors of width {dim}", vocab.len());
        Embeddings::new(matrix, vocab)
    }
}

/// Is this line a word2vec-style ``{count} {dim}`` header?
fn is_count_header(line: &str) -> Option<(usize, usize)> {
    let mut fields = line.split_whitespace();
    let count = fields.next()?.parse().ok()?;
    let dim = fields.next()?.parse().ok()?;
    fields.next().is_none().then_some((count, dim))
}

/// Read ``GloVe`` text vectors.
///
/// Each line is a token followed by its vector, separated by single spaces:
/// ```terminaloutput
/// the 0.418 0.24968 -0.41242 ...
/// ```
/// A word2vec-style first line of two integers, ``{count} {dim}``, is
/// skipped (and its width enforced) when the next row has exactly ``dim``
/// values; otherwise it is read as an ordinary row. Blank lines are ignored.
///
/// ## Arguments
/// * `reader` - the line reader.
/// * `unk` - the optional unknown token; placed at id 0, with a zero vector
///   if the file has none for it.
///
/// ## Returns
/// The embeddings; or [`StanzaError::Parse`] on malformed values,
/// [`StanzaError::ShapeMismatch`] on inconsistent widths, or
/// [`StanzaError::NotBijection`] on repeated tokens.
pub fn read_glove_text<R: BufRead>(
    reader: R,
    unk: Option<&str>,
) -> StanzaResult<Embeddings> {
    let mut buf = RowBuffer::default();
    // a first line that may be a count header; settled by the next row.
    let mut pending: Option<(String, usize, usize)> = None;

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim_end_matches(['\r', '\n', ' ']);
        if line.is_empty() {
            continue;
        }

        if idx == 0
            && let Some((count, dim)) = is_count_header(line)
        {
            pending = Some((line.to_string(), count, dim));
            continue;
        }

        if let Some((first, _, dim)) = pending.take() {
            if glove_row_width(line) == dim {
                buf.dim = Some(dim);
            } else {
                buf.push_glove_row(1, &first)?;
            }
        }
        buf.push_glove_row(idx + 1, line)?;
    }

    // a lone first line is a header only when it announces no rows.
    match pending {
        Some((first, count, _)) if count != 0 => buf.push_glove_row(1, &first)?,
        Some((_, _, dim)) => buf.dim = Some(dim),
        None => {}
    }

    buf.into_embeddings(unk)
}

fn glove_row_width(line: &str) -> usize {
    line.split(' ').skip(1).filter(|f| !f.is_empty()).count()
}

/// Read ``SENNA`` vectors from its split word list and vector files.
///
/// ``words.lst`` holds one token per line; ``embeddings.txt`` holds the
/// matching whitespace-separated vectors, line for line.
///
/// ## Returns
/// The embeddings; or [`StanzaError::ShapeMismatch`] if the files have
/// different line counts or the vectors differ in width.
pub fn read_senna<W: BufRead, V: BufRead>(
    words_reader: W,
    vectors_reader: V,
    unk: Option<&str>,
) -> StanzaResult<Embeddings> {
    let mut buf = RowBuffer::default();

    for (idx, line) in vectors_reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        buf.push_row(idx + 1, line.split_whitespace())?;
    }

    for line in words_reader.lines() {
        let line = line?;
        let word = line.trim();
        if !word.is_empty() {
            buf.words.push(word.to_string());
        }
    }

    if buf.words.len() != buf.rows() {
        return Err(StanzaError::ShapeMismatch(format!(
            "{} words but {} vectors",
            buf.words.len(),
            buf.rows()
        )));
    }

    buf.into_embeddings(unk)
}

/// Load ``GloVe`` text vectors from a file; see [`read_glove_text`].
pub fn load_glove_path<P: AsRef<Path>>(
    path: P,
    unk: Option<&str>,
) -> StanzaResult<Embeddings> {
    let path = path.as_ref();
    log::info!("loading GloVe vectors from {}", path.display());
    read_glove_text(BufReader::new(File::open(path)?), unk)
}

/// Load ``SENNA`` vectors from its two files; see [`read_senna`].
pub fn load_senna_paths<W: AsRef<Path>, V: AsRef<Path>>(
    words_path: W,
    vectors_path: V,
    unk: Option<&str>,
) -> StanzaResult<Embeddings> {
    let (words_path, vectors_path) = (words_path.as_ref(), vectors_path.as_ref());
    log::info!(
        "loading SENNA vectors from {} and {}",
        words_path.display(),
        vectors_path.display()
    );
    read_senna(
        BufReader::new(File::open(words_path)?),
        BufReader::new(File::open(vectors_path)?),
        unk,
    )
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    const GLOVE: &str = "the 0.1 0.2 0.3\n, -1 -2 -3\n! 1.5 0 2.5\n";

    #[test]
    fn test_read_glove() {
        let emb = read_glove_text(Cursor::new(GLOVE), None).unwrap();
        assert_eq!(emb.vocab().words(), &["the", ",", "!"]);
        assert_eq!(emb.dim(), 3);
        assert_eq!(emb.lookup("!").unwrap(), &[1.5, 0.0, 2.5]);
        assert_eq!(emb.vocab().total_count(), 0);
    }

    #[test]
    fn test_read_glove_unk() {
        let emb = read_glove_text(Cursor::new(GLOVE), Some("<unk>")).unwrap();
        assert_eq!(emb.vocab().words(), &["<unk>", "the", ",", "!"]);
        assert_eq!(emb.lookup("zebra").unwrap(), &[0.0, 0.0, 0.0]);

        // An unknown token with its own vector moves to id 0.
        let emb = read_glove_text(Cursor::new(GLOVE), Some(",")).unwrap();
        assert_eq!(emb.vocab().words(), &[",", "the", "!"]);
        assert_eq!(emb.lookup("zebra").unwrap(), &[-1.0, -2.0, -3.0]);
        assert_eq!(emb.lookup("!").unwrap(), &[1.5, 0.0, 2.5]);
    }

    #[test]
    fn test_read_glove_header() {
        let data = format!("3 3\n{GLOVE}");
        let emb = read_glove_text(Cursor::new(data), None).unwrap();
        assert_eq!(emb.len(), 3);

        // "3 4" does not match the rows' width, so it is a row of its own.
        let data = format!("3 4\n{GLOVE}");
        assert!(matches!(
            read_glove_text(Cursor::new(data), None),
            Err(StanzaError::ShapeMismatch(_))
        ));
    }

    #[test]
    fn test_read_glove_numeric_first_row() {
        let emb = read_glove_text(Cursor::new("1 0\n2 0.5\n"), None).unwrap();
        assert_eq!(emb.vocab().words(), &["1", "2"]);
        assert_eq!(emb.lookup("1").unwrap(), &[0.0]);

        let emb = read_glove_text(Cursor::new("7 2.5\n"), None).unwrap();
        assert_eq!(emb.vocab().words(), &["7"]);
        assert_eq!(emb.lookup("7").unwrap(), &[2.5]);

        let emb = read_glove_text(Cursor::new("0 3\n"), None).unwrap();
        assert!(emb.is_empty());
        assert_eq!(emb.dim(), 3);
    }

    #[test]
    fn test_read_glove_errors() {
        assert!(matches!(
            read_glove_text(Cursor::new("a 1 2\nb 1\n"), None),
            Err(StanzaError::ShapeMismatch(_))
        ));
        assert!(matches!(
            read_glove_text(Cursor::new("a 1 x\n"), None),
            Err(StanzaError::Parse(_))
        ));
        assert!(matches!(
            read_glove_text(Cursor::new("a 1\na 2\n"), None),
            Err(StanzaError::NotBijection(_))
        ));
    }

    #[test]
    fn test_read_senna() {
        let words = "PADDING\nUNKNOWN\n!\n";
        let vectors = "0 0\n0.5 -0.5\n-1.03682 1.77856\n";
        let emb = read_senna(Cursor::new(words), Cursor::new(vectors), Some("UNKNOWN")).unwrap();

        assert_eq!(emb.vocab().words(), &["UNKNOWN", "PADDING", "!"]);
        assert_eq!(emb.lookup("!").unwrap(), &[-1.03682, 1.77856]);
        assert_eq!(emb.lookup("zebra").unwrap(), &[0.5, -0.5]);

        assert!(matches!(
            read_senna(Cursor::new("a\nb\n"), Cursor::new("1 2\n"), None),
            Err(StanzaError::ShapeMismatch(_))
        ));
    }

    #[test]
    fn test_load_paths() {
        let dir = tempdir::TempDir::new("pretrained_test").unwrap();
        let glove = dir.path().join("glove.txt");
        std::fs::write(&glove, GLOVE).unwrap();
        assert_eq!(load_glove_path(&glove, None).unwrap().len(), 3);

        let words = dir.path().join("words.lst");
        let vectors = dir.path().join("embeddings.txt");
        std::fs::write(&words, "a\nb\n").unwrap();
        std::fs::write(&vectors, "1 2\n3 4\n").unwrap();
        let emb = load_senna_paths(&words, &vectors, None).unwrap();
        assert_eq!(emb.lookup("b").unwrap(), &[3.0, 4.0]);

        assert!(matches!(
            load_glove_path(dir.path().join("missing.txt"), None),
            Err(StanzaError::Io(_))
        ));
    }
}
