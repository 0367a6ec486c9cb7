//! Validating constructors for externally supplied token/id maps.

use crate::{
    errors::{StanzaError, StanzaResult},
    types::{CommonHashSet, TokenId},
    vocab::Vocab,
};

/// Validate that ``(token, id)`` pairs form a bijection onto ``0..N``.
///
/// ## Returns
/// The tokens in id order.
pub fn try_bijection<I, S>(word_to_index: I) -> StanzaResult<Vec<String>>
where
    I: IntoIterator<Item = (S, TokenId)>,
    S: AsRef<str>,
{
    let pairs: Vec<(S, TokenId)> = word_to_index.into_iter().collect();
    let n = pairs.len();

    let mut slots: Vec<Option<String>> = vec![None; n];
    let mut seen: CommonHashSet<&str> = Default::default();
    for (word, id) in &pairs {
        let word = word.as_ref();
        if !seen.insert(word) {
            return Err(StanzaError::NotBijection(format!(
                "token {word:?} appears more than once"
            )));
        }
        let slot = slots.get_mut(*id).ok_or_else(|| {
            StanzaError::NotBijection(format!(
                "id {id} for token {word:?} is outside 0..{n}"
            ))
        })?;
        if let Some(other) = slot {
            return Err(StanzaError::NotBijection(format!(
                "id {id} is shared by {other:?} and {word:?}"
            )));
        }
        *slot = Some(word.to_string());
    }

    // n distinct ids in 0..n means every slot is filled.
    Ok(slots.into_iter().flatten().collect())
}

impl Vocab {
    /// Build a vocabulary from an external ``{ token -> id }`` map.
    ///
    /// All counts are 0.
    ///
    /// ## Arguments
    /// * `word_to_index` - ``(token, id)`` pairs; must be a bijection onto ``0..N``.
    /// * `unk` - the optional unknown token; must map to id 0.
    ///
    /// ## Returns
    /// The new [`Vocab`]; or [`StanzaError::NotBijection`].
    pub fn from_dict<I, S>(
        word_to_index: I,
        unk: Option<&str>,
    ) -> StanzaResult<Vocab>
    where
        I: IntoIterator<Item = (S, TokenId)>,
        S: AsRef<str>,
    {
        let words = try_bijection(word_to_index)?;

        if let Some(unk) = unk
            && words.first().map(String::as_str) != Some(unk)
        {
            return Err(StanzaError::NotBijection(format!(
                "unknown token {unk:?} must map to id 0"
            )));
        }

        let mut vocab = Vocab::new(unk);
        for word in words {
            if !vocab.contains(&word) {
                vocab.push_new(word, 0);
            }
        }
        Ok(vocab)
    }

    /// Build a vocabulary from an ordered list of tokens.
    ///
    /// The unknown token (if any) takes id 0; other tokens are numbered in
    /// order of first occurrence. All counts are 0.
    pub fn from_words<I, S>(
        words: I,
        unk: Option<&str>,
    ) -> Vocab
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut vocab = Vocab::new(unk);
        for word in words {
            let word = word.as_ref();
            if !vocab.contains(word) {
                vocab.push_new(word.to_string(), 0);
            }
        }
        vocab
    }
}
