//! # Vocabulary Text IO

use std::{
    fs::File,
    io::{BufRead, BufReader, Write},
    path::Path,
};

use crate::{
    errors::{StanzaError, StanzaResult},
    io::write_file_atomic,
    types::TokenCount,
    vocab::Vocab,
};

/// First field of the optional header line naming the unknown token.
///
/// A header line has exactly three tab-separated fields,
/// ``%vocab<TAB>unk<TAB>{token}``; a token line never has three.
pub const VOCAB_HEADER: &str = "%vocab";

fn check_writable(token: &str) -> StanzaResult<()> {
    if token.contains(['\t', '\n', '\r']) {
        return Err(StanzaError::Parse(format!(
            "token {token:?} contains a tab or line break"
        )));
    }
    Ok(())
}

/// Check that every token of `vocab` can be written to a vocabulary file.
pub(crate) fn check_vocab_writable(vocab: &Vocab) -> StanzaResult<()> {
    if let Some(unk) = vocab.unk() {
        check_writable(unk)?;
    }
    vocab.words().iter().try_for_each(|w| check_writable(w))
}

/// Write a [`Vocab`] to a [`Write`] writer.
///
/// Lines are:
/// ```terminaloutput
/// {TOKEN}\t{COUNT}
/// ```
/// in id order, preceded by a ``%vocab`` header when an unknown token is set.
pub fn write_vocab<W: Write>(
    vocab: &Vocab,
    writer: &mut W,
) -> StanzaResult<()> {
    check_vocab_writable(vocab)?;
    if let Some(unk) = vocab.unk() {
        writeln!(writer, "{VOCAB_HEADER}\tunk\t{unk}")?;
    }
    for (id, word) in vocab.iter() {
        writeln!(writer, "{word}\t{}", vocab.count_list()[id])?;
    }
    Ok(())
}

/// Save a [`Vocab`] to a file, replacing it atomically.
pub fn save_vocab_path<P: AsRef<Path>>(
    vocab: &Vocab,
    path: P,
) -> StanzaResult<()> {
    write_file_atomic(path, |w| write_vocab(vocab, w))
}

/// Load a [`Vocab`] from a vocabulary file.
pub fn load_vocab_path<P: AsRef<Path>>(path: P) -> StanzaResult<Vocab> {
    let reader = BufReader::new(File::open(path)?);
    read_vocab(reader)
}

/// Read a [`Vocab`] from a [`BufRead`] stream.
///
/// The unknown token comes from the ``%vocab`` header; without a header the
/// vocabulary has no unknown token. Lines without a count column get count 0,
/// so plain word lists are accepted.
pub fn read_vocab<R: BufRead>(reader: R) -> StanzaResult<Vocab> {
    let (header_unk, entries) = read_entries(reader)?;
    build_vocab(entries, header_unk.as_deref())
}

/// Read a header-less [`Vocab`] whose first entry is the unknown token.
///
/// ## Arguments
/// * `reader` - the line reader.
/// * `unk` - the unknown token; must be the first entry.
pub fn read_vocab_with_unk<R: BufRead>(
    reader: R,
    unk: &str,
) -> StanzaResult<Vocab> {
    let (header_unk, entries) = read_entries(reader)?;
    if let Some(header_unk) = header_unk
        && header_unk != unk
    {
        return Err(StanzaError::NotBijection(format!(
            "file names unknown token {header_unk:?}, expected {unk:?}"
        )));
    }
    build_vocab(entries, Some(unk))
}

type Entries = Vec<(String, TokenCount)>;

fn read_entries<R: BufRead>(reader: R) -> StanzaResult<(Option<String>, Entries)> {
    let mut unk = None;
    let mut entries = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.strip_suffix('\r').unwrap_or(&line);
        if line.is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').collect();
        match fields.as_slice() {
            [VOCAB_HEADER, "unk", token] if idx == 0 => {
                unk = Some(token.to_string());
            }
            [word] => entries.push((word.to_string(), 0)),
            [word, count] => {
                let count = count.trim().parse::<TokenCount>().map_err(|e| {
                    StanzaError::Parse(format!("line {}: bad count {count:?}: {e}", idx + 1))
                })?;
                entries.push((word.to_string(), count));
            }
            _ => {
                return Err(StanzaError::Parse(format!(
                    "line {}: expected `token<TAB>count`, found {line:?}",
                    idx + 1
                )));
            }
        }
    }

    Ok((unk, entries))
}

fn build_vocab(
    entries: Entries,
    unk: Option<&str>,
) -> StanzaResult<Vocab> {
    let mut entries = entries.into_iter();
    let mut vocab = Vocab::new(unk);

    if let Some(unk) = unk {
        match entries.next() {
            Some((word, count)) if word == unk => vocab.set_count_of(0, count),
            _ => {
                return Err(StanzaError::NotBijection(format!(
                    "unknown token {unk:?} must be the first entry"
                )));
            }
        }
    }

    for (word, count) in entries {
        if vocab.contains(&word) {
            return Err(StanzaError::NotBijection(format!(
                "token {word:?} appears more than once"
            )));
        }
        vocab.push_new(word, count);
    }

    log::debug!("read vocabulary of {} tokens", vocab.len());
    Ok(vocab)
}
