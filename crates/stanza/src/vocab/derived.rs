//! # Derived Vocabularies
//!
//! Pruning, re-sorting, and subsetting. Each returns a new [`Vocab`] whose
//! ids are reassigned densely from 0; the receiver is never mutated.

use crate::{
    errors::{StanzaError, StanzaResult},
    types::{TokenCount, TokenId},
    vocab::Vocab,
};

impl Vocab {
    /// An empty vocabulary with the same unknown token (and its count).
    fn derived_base(&self) -> Vocab {
        let mut vocab = Vocab::new(self.unk());
        if let Some(unk_id) = self.unk_id() {
            vocab.set_count_of(0, self.count_list()[unk_id]);
        }
        vocab
    }

    /// Remove rare tokens.
    ///
    /// Keeps every token with ``count >= cutoff``, in original relative order;
    /// the unknown token is always kept.
    ///
    /// ## Arguments
    /// * `cutoff` - the minimum count to keep a token.
    ///
    /// ## Returns
    /// A new [`Vocab`] with remapped ids.
    pub fn prune_rares(
        &self,
        cutoff: TokenCount,
    ) -> Vocab {
        let mut vocab = self.derived_base();
        for (id, word) in self.iter() {
            let count = self.count_list()[id];
            if count >= cutoff && !self.is_unk(word) {
                vocab.push_new(word.to_string(), count);
            }
        }

        log::debug!(
            "prune_rares(cutoff={cutoff}): {} -> {} tokens",
            self.len(),
            vocab.len()
        );
        vocab
    }

    /// Reorder tokens by decreasing count.
    ///
    /// The unknown token, if any, stays at id 0 regardless of its count;
    /// the most common other token gets the next id, and so forth.
    /// Tokens with equal counts keep their original relative order.
    ///
    /// ## Returns
    /// A new [`Vocab`] with remapped ids.
    pub fn sort_by_decreasing_count(&self) -> Vocab {
        let counts = self.count_list();
        let mut ids: Vec<TokenId> = self
            .iter()
            .filter(|(_, word)| !self.is_unk(word))
            .map(|(id, _)| id)
            .collect();

        // stable: ties stay in id order.
        ids.sort_by(|&a, &b| counts[b].cmp(&counts[a]));

        let mut vocab = self.derived_base();
        for id in ids {
            vocab.push_new(self[id].to_string(), counts[id]);
        }
        vocab
    }

    /// Select a subset of tokens.
    ///
    /// The result holds the unknown token (if configured) followed by the
    /// given tokens, deduplicated, in order of first occurrence; each keeps
    /// its count from `self`.
    ///
    /// ## Returns
    /// A new [`Vocab`]; or [`StanzaError::UnknownToken`] if `self` does not
    /// contain one of the tokens.
    pub fn subset<I, S>(
        &self,
        tokens: I,
    ) -> StanzaResult<Vocab>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut vocab = self.derived_base();
        for token in tokens {
            let token = token.as_ref();
            if vocab.contains(token) {
                continue;
            }
            let id = self.get(token).ok_or_else(|| StanzaError::UnknownToken {
                token: token.to_string(),
            })?;
            vocab.push_new(token.to_string(), self.count_list()[id]);
        }
        Ok(vocab)
    }
}
