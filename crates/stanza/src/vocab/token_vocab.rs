//! # Token/Id Vocabulary

use core::{fmt::Debug, iter::Enumerate, ops::Index, slice};

use crate::{
    errors::{StanzaError, StanzaResult},
    types::{CommonHashMap, TokenCount, TokenId, hash_map_with_capacity},
};

/// ``{ String <-> 0..N }`` token vocabulary with occurrence counts.
///
/// `words[id]` is the token for `id`, and `word_index[token] == id`;
/// `counts[id]` is the count for the token at `id`. The three are always
/// the same length.
#[derive(Clone, Default)]
pub struct Vocab {
    /// Table mapping from id (position) to token.
    words: Vec<String>,

    /// Hash map from token to id.
    word_index: CommonHashMap<String, TokenId>,

    /// Table mapping from id (position) to count.
    counts: Vec<TokenCount>,

    /// The unknown token; at id 0 when present.
    unk: Option<String>,

    frozen: bool,
}

impl Debug for Vocab {
    fn fmt(
        &self,
        f: &mut core::fmt::Formatter<'_>,
    ) -> core::fmt::Result {
        f.debug_struct("Vocab")
            .field("len", &self.len())
            .field("unk", &self.unk)
            .field("frozen", &self.frozen)
            .field("words", &self.words)
            .finish()
    }
}

/// Equality covers tokens, ids, counts, and the unknown token;
/// the frozen flag is ignored.
impl PartialEq for Vocab {
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        self.unk == other.unk && self.words == other.words && self.counts == other.counts
    }
}

impl Eq for Vocab {}

impl Vocab {
    /// Create an empty vocabulary.
    ///
    /// ## Arguments
    /// * `unk` - the optional unknown token; inserted at id 0 with count 0.
    pub fn new(unk: Option<&str>) -> Self {
        let mut vocab = Self {
            unk: unk.map(str::to_string),
            ..Default::default()
        };
        if let Some(unk) = unk {
            vocab.push_new(unk.to_string(), 0);
        }
        vocab
    }

    /// Create an empty vocabulary with an unknown token at id 0.
    pub fn with_unk(unk: &str) -> Self {
        Self::new(Some(unk))
    }

    /// Append a token known to be absent; returns its new id.
    pub(crate) fn push_new(
        &mut self,
        token: String,
        count: TokenCount,
    ) -> TokenId {
        let id = self.words.len();
        self.word_index.insert(token.clone(), id);
        self.words.push(token);
        self.counts.push(count);
        id
    }

    /// Overwrite the count of an existing id.
    pub(crate) fn set_count_of(
        &mut self,
        id: TokenId,
        count: TokenCount,
    ) {
        self.counts[id] = count;
    }

    /// The number of tokens in the vocabulary, including the unknown token.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Is the vocabulary empty?
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// The unknown token, if configured.
    pub fn unk(&self) -> Option<&str> {
        self.unk.as_deref()
    }

    /// The id of the unknown token (always 0), if configured.
    pub fn unk_id(&self) -> Option<TokenId> {
        self.unk.as_ref().map(|_| 0)
    }

    /// Is `token` the configured unknown token?
    pub fn is_unk(
        &self,
        token: &str,
    ) -> bool {
        self.unk.as_deref() == Some(token)
    }

    /// Forbid any further [`Vocab::add`] / [`Vocab::update`] calls.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    /// Has [`Vocab::freeze`] been called?
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Does the vocabulary contain `token`?
    ///
    /// This never falls back to the unknown token.
    pub fn contains(
        &self,
        token: &str,
    ) -> bool {
        self.word_index.contains_key(token)
    }

    /// Get the id of `token`, without unknown-token fallback.
    pub fn get(
        &self,
        token: &str,
    ) -> Option<TokenId> {
        self.word_index.get(token).copied()
    }

    /// Add `count` occurrences of a token, and return its id.
    ///
    /// Unseen tokens are assigned the next id, ``self.len()``.
    ///
    /// ## Arguments
    /// * `token` - the token to add.
    /// * `count` - the number of occurrences to add to the token's count;
    ///   counts saturate instead of overflowing.
    ///
    /// ## Returns
    /// The token's id; or [`StanzaError::FrozenVocabulary`] if frozen.
    pub fn add(
        &mut self,
        token: &str,
        count: TokenCount,
    ) -> StanzaResult<TokenId> {
        if self.frozen {
            return Err(StanzaError::FrozenVocabulary {
                token: token.to_string(),
            });
        }
        Ok(self.add_unchecked(token, count))
    }

    /// Add a single occurrence of a token, and return its id.
    pub fn add_one(
        &mut self,
        token: &str,
    ) -> StanzaResult<TokenId> {
        self.add(token, 1)
    }

    fn add_unchecked(
        &mut self,
        token: &str,
        count: TokenCount,
    ) -> TokenId {
        match self.word_index.get(token) {
            Some(&id) => {
                self.counts[id] = self.counts[id].saturating_add(count);
                id
            }
            None => self.push_new(token.to_string(), count),
        }
    }

    /// Add one occurrence of each token, in order.
    ///
    /// A frozen vocabulary rejects the whole batch before mutating anything.
    ///
    /// ## Returns
    /// The id of each token, in order.
    pub fn update<I, S>(
        &mut self,
        tokens: I,
    ) -> StanzaResult<Vec<TokenId>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut tokens = tokens.into_iter().peekable();
        if self.frozen {
            return match tokens.peek() {
                Some(first) => Err(StanzaError::FrozenVocabulary {
                    token: AsRef::<str>::as_ref(first).to_string(),
                }),
                None => Ok(Vec::new()),
            };
        }
        Ok(tokens
            .map(|t| self.add_unchecked(t.as_ref(), 1))
            .collect())
    }

    /// Look up the id of a token.
    ///
    /// Absent tokens map to the unknown token's id when one is configured;
    /// otherwise they are an [`StanzaError::UnknownToken`] error.
    pub fn lookup(
        &self,
        token: &str,
    ) -> StanzaResult<TokenId> {
        match (self.get(token), self.unk_id()) {
            (Some(id), _) => Ok(id),
            (None, Some(unk_id)) => Ok(unk_id),
            (None, None) => Err(StanzaError::UnknownToken {
                token: token.to_string(),
            }),
        }
    }

    /// Get the token for an id.
    pub fn word(
        &self,
        id: TokenId,
    ) -> StanzaResult<&str> {
        self.words
            .get(id)
            .map(String::as_str)
            .ok_or(StanzaError::IndexOutOfRange {
                index: id,
                len: self.len(),
            })
    }

    /// The tokens, in id order.
    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// Map tokens to ids with [`Vocab::lookup`], preserving order.
    pub fn words_to_indices<I, S>(
        &self,
        tokens: I,
    ) -> StanzaResult<Vec<TokenId>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        tokens
            .into_iter()
            .map(|t| self.lookup(t.as_ref()))
            .collect()
    }

    /// Map ids to tokens, preserving order.
    ///
    /// Fails with [`StanzaError::IndexOutOfRange`] on any id ``>= self.len()``.
    pub fn indices_to_words<I>(
        &self,
        ids: I,
    ) -> StanzaResult<Vec<&str>>
    where
        I: IntoIterator<Item = TokenId>,
    {
        ids.into_iter().map(|id| self.word(id)).collect()
    }

    /// The count of a token; 0 for absent tokens.
    pub fn count(
        &self,
        token: &str,
    ) -> TokenCount {
        self.get(token).map_or(0, |id| self.counts[id])
    }

    /// The count of the token at `id`, if in range.
    pub fn count_of(
        &self,
        id: TokenId,
    ) -> Option<TokenCount> {
        self.counts.get(id).copied()
    }

    /// The counts, in id order.
    pub fn count_list(&self) -> &[TokenCount] {
        &self.counts
    }

    /// Copy the counts into a ``{ token -> count }`` map.
    pub fn counts(&self) -> CommonHashMap<String, TokenCount> {
        let mut counts = hash_map_with_capacity(self.len());
        counts.extend(self.iter().map(|(id, w)| (w.to_string(), self.counts[id])));
        counts
    }

    /// The sum of all counts, saturating instead of overflowing.
    pub fn total_count(&self) -> TokenCount {
        self.counts
            .iter()
            .fold(0, |total: TokenCount, &c| total.saturating_add(c))
    }

    /// Reset every count to 0, keeping all tokens and ids.
    pub fn clear_counts(&mut self) {
        self.counts.iter_mut().for_each(|c| *c = 0);
    }

    /// Iterate over ``(id, token)`` pairs in id order.
    pub fn iter(&self) -> VocabIter<'_> {
        VocabIter {
            inner: self.words.iter().enumerate(),
        }
    }
}

impl Index<TokenId> for Vocab {
    type Output = str;

    /// ## Panics
    /// If `id` is out of range.
    fn index(
        &self,
        id: TokenId,
    ) -> &str {
        self.words[id].as_str()
    }
}

/// Iterator over ``(id, token)`` pairs of a [`Vocab`], in id order.
#[derive(Debug, Clone)]
pub struct VocabIter<'a> {
    inner: Enumerate<slice::Iter<'a, String>>,
}

impl<'a> Iterator for VocabIter<'a> {
    type Item = (TokenId, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(id, w)| (id, w.as_str()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for VocabIter<'_> {}

impl<'a> IntoIterator for &'a Vocab {
    type Item = (TokenId, &'a str);
    type IntoIter = VocabIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_unk() {
        let v = Vocab::default();
        assert_eq!(v.len(), 0);
        assert!(v.is_empty());
        assert_eq!(v.unk(), None);
        assert!(matches!(
            v.lookup("hi"),
            Err(StanzaError::UnknownToken { .. })
        ));
    }

    #[test]
    fn test_unk() {
        let unk = "**UNK**";
        let v = Vocab::with_unk(unk);
        assert_eq!(v.len(), 1);
        assert!(v.contains(unk));
        assert_eq!(v.lookup(unk).unwrap(), 0);
        assert_eq!(v.count(unk), 0);
        assert_eq!(v.unk(), Some(unk));
        assert_eq!(v.unk_id(), Some(0));
    }

    #[test]
    fn test_add() {
        let mut v = Vocab::with_unk("**UNK**");
        assert_eq!(v.add_one("hi").unwrap(), 1);
        assert!(v.contains("hi"));
        assert_eq!(v.len(), 2);
        assert_eq!(v.count("hi"), 1);

        assert_eq!(v.add("hi", 4).unwrap(), 1);
        assert_eq!(v.len(), 2);
        assert_eq!(v.count("hi"), 5);

        let mut v = Vocab::default();
        assert_eq!(v.add_one("hi").unwrap(), 0);
        assert_eq!(&v[0], "hi");
    }

    #[test]
    fn test_add_saturates() {
        let mut v = Vocab::default();
        v.add("hi", TokenCount::MAX).unwrap();
        v.add("hi", TokenCount::MAX).unwrap();
        v.add("bye", 3).unwrap();
        assert_eq!(v.count("hi"), TokenCount::MAX);
        assert_eq!(v.total_count(), TokenCount::MAX);
    }

    #[test]
    fn test_words_to_indices() {
        let mut v = Vocab::with_unk("unk");
        let words = ["i", "like", "pie"];
        assert_eq!(v.update(words).unwrap(), vec![1, 2, 3]);
        assert_eq!(v.words_to_indices(words).unwrap(), vec![1, 2, 3]);
        assert_eq!(v.words_to_indices(["i", "said"]).unwrap(), vec![1, 0]);

        assert_eq!(v.update(["i", "said"]).unwrap(), vec![1, 4]);
        assert_eq!(v.words_to_indices(["you", "said"]).unwrap(), vec![0, 4]);
    }

    #[test]
    fn test_words_to_indices_without_unk() {
        let mut v = Vocab::default();
        v.update(["a", "b"]).unwrap();
        assert!(matches!(
            v.words_to_indices(["a", "c"]),
            Err(StanzaError::UnknownToken { token }) if token == "c"
        ));
    }

    #[test]
    fn test_indices_to_words() {
        let mut v = Vocab::with_unk("unk");
        v.update(["i", "like", "pie"]).unwrap();
        assert_eq!(
            v.indices_to_words([1, 2, 3, 0]).unwrap(),
            vec!["i", "like", "pie", "unk"]
        );

        assert!(matches!(
            v.indices_to_words([1, 4]),
            Err(StanzaError::IndexOutOfRange { index: 4, len: 4 })
        ));
    }

    #[test]
    fn test_freeze() {
        let mut v = Vocab::with_unk("unk");
        v.update(["a", "b"]).unwrap();
        v.freeze();
        assert!(v.is_frozen());

        assert!(matches!(
            v.add_one("c"),
            Err(StanzaError::FrozenVocabulary { token }) if token == "c"
        ));
        assert!(v.add_one("a").is_err());

        let before = v.clone();
        assert!(v.update(["a", "new", "b"]).is_err());
        assert_eq!(v, before);
        assert_eq!(v.count("a"), 1);

        assert_eq!(v.update(Vec::<String>::new()).unwrap(), Vec::<TokenId>::new());

        // lookups still work.
        assert_eq!(v.lookup("b").unwrap(), 2);
        assert_eq!(v.lookup("zzz").unwrap(), 0);
    }

    #[test]
    fn test_counts() {
        let mut v = Vocab::with_unk("unk");
        v.update(["hi", "hi", "hi", "bye"]).unwrap();

        let counts = v.counts();
        assert_eq!(counts.len(), 3);
        assert_eq!(counts["hi"], 3);
        assert_eq!(counts["bye"], 1);
        assert_eq!(counts["unk"], 0);
        assert_eq!(v.count("missing"), 0);
        assert_eq!(v.count_of(1), Some(3));
        assert_eq!(v.count_of(9), None);
        assert_eq!(v.total_count(), 4);

        v.clear_counts();
        assert_eq!(v.count_list(), &[0, 0, 0]);
        assert_eq!(v.len(), 3);
        assert_eq!(v.lookup("bye").unwrap(), 2);
    }

    #[test]
    fn test_iter() {
        let mut v = Vocab::with_unk("unk");
        v.update("what a show".split_whitespace()).unwrap();

        let pairs: Vec<(TokenId, &str)> = v.iter().collect();
        assert_eq!(pairs, vec![(0, "unk"), (1, "what"), (2, "a"), (3, "show")]);
        assert_eq!(v.iter().len(), 4);

        let mut n = 0;
        for (id, word) in &v {
            assert_eq!(v.lookup(word).unwrap(), id);
            n += 1;
        }
        assert_eq!(n, v.len());
    }

    #[test]
    fn test_eq_ignores_frozen() {
        let mut a = Vocab::with_unk("unk");
        a.update(["x"]).unwrap();
        let mut b = a.clone();
        b.freeze();
        assert_eq!(a, b);

        b = Vocab::new(None);
        b.update(["unk", "x"]).unwrap();
        assert_ne!(a, b);
    }
}
