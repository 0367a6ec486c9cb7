//! # Vocabulary-Backed Embeddings

use core::fmt::Debug;
use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

use once_cell::sync::OnceCell;
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    ann::{LshIndex, LshOptions},
    embeddings::EmbeddingMatrix,
    errors::{StanzaError, StanzaResult},
    io::{
        check_vocab_writable,
        load_npy_path,
        load_vocab_path,
        save_npy_path,
        save_vocab_path,
    },
    types::{CommonHashMap, TokenId, hash_map_with_capacity},
    vocab::{Vocab, VocabIter},
};

/// How [`Embeddings::project_onto`] fills rows for tokens it has no vector for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MissingRowFill {
    /// All zeros.
    Zeros,

    /// Independent draws from ``U(-scale, scale)``, from an RNG seeded
    /// with `seed`.
    Uniform {
        /// Half-width of the sampling interval.
        scale: f32,

        /// RNG seed.
        seed: u64,
    },
}

/// Dense vectors for every token of a [`Vocab`].
///
/// Row `i` of the matrix is the vector for token id `i`; the vocabulary is
/// never mutated once wrapped.
///
/// The approximate-search index is built on first use and cached; the cache
/// is a [`OnceCell`], so concurrent first queries build it exactly once.
#[derive(Clone)]
pub struct Embeddings {
    vocab: Vocab,
    matrix: EmbeddingMatrix,

    ann_options: LshOptions,
    ann: OnceCell<LshIndex>,
}

impl Debug for Embeddings {
    fn fmt(
        &self,
        f: &mut core::fmt::Formatter<'_>,
    ) -> core::fmt::Result {
        f.debug_struct("Embeddings")
            .field("len", &self.len())
            .field("dim", &self.dim())
            .field("unk", &self.vocab.unk())
            .field("ann_options", &self.ann_options)
            .field("ann_built", &self.ann.get().is_some())
            .finish()
    }
}

impl PartialEq for Embeddings {
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        self.vocab == other.vocab && self.matrix == other.matrix
    }
}

fn prefixed_path(
    prefix: &Path,
    ext: &str,
) -> PathBuf {
    let mut path: OsString = prefix.as_os_str().to_owned();
    path.push(".");
    path.push(ext);
    PathBuf::from(path)
}

impl Embeddings {
    /// Pair a matrix with a vocabulary.
    ///
    /// ## Returns
    /// The embeddings; or [`StanzaError::ShapeMismatch`] if the matrix does
    /// not have exactly one row per token.
    pub fn new(
        matrix: EmbeddingMatrix,
        vocab: Vocab,
    ) -> StanzaResult<Self> {
        if matrix.rows() != vocab.len() {
            return Err(StanzaError::ShapeMismatch(format!(
                "matrix has {} rows, vocabulary has {} tokens",
                matrix.rows(),
                vocab.len()
            )));
        }
        Ok(Self {
            vocab,
            matrix,
            ann_options: LshOptions::default(),
            ann: OnceCell::new(),
        })
    }

    /// Replace the approximate-search index options.
    ///
    /// Drops any index already built.
    pub fn with_ann_options(
        mut self,
        options: LshOptions,
    ) -> Self {
        self.ann_options = options;
        self.ann = OnceCell::new();
        self
    }

    /// The approximate-search index options.
    pub fn ann_options(&self) -> &LshOptions {
        &self.ann_options
    }

    /// The approximate-search index; built on first call.
    pub fn ann_index(&self) -> &LshIndex {
        self.ann
            .get_or_init(|| LshIndex::build(&self.matrix, self.ann_options))
    }

    /// The vocabulary.
    pub fn vocab(&self) -> &Vocab {
        &self.vocab
    }

    /// The matrix.
    pub fn matrix(&self) -> &EmbeddingMatrix {
        &self.matrix
    }

    /// Consume the embeddings, returning the vocabulary and matrix.
    pub fn into_parts(self) -> (Vocab, EmbeddingMatrix) {
        (self.vocab, self.matrix)
    }

    /// The number of tokens (and rows).
    pub fn len(&self) -> usize {
        self.vocab.len()
    }

    /// Are there no tokens?
    pub fn is_empty(&self) -> bool {
        self.vocab.is_empty()
    }

    /// The vector width.
    pub fn dim(&self) -> usize {
        self.matrix.dim()
    }

    /// Does the vocabulary contain `token`? Never falls back to the unknown token.
    pub fn contains(
        &self,
        token: &str,
    ) -> bool {
        self.vocab.contains(token)
    }

    /// Look up the vector for a token.
    ///
    /// Absent tokens get the unknown token's vector when one is configured;
    /// otherwise they are a [`StanzaError::UnknownToken`] error.
    pub fn lookup(
        &self,
        token: &str,
    ) -> StanzaResult<&[f32]> {
        Ok(self.matrix.row(self.vocab.lookup(token)?))
    }

    /// Get the vector for a token, without unknown-token fallback.
    pub fn get(
        &self,
        token: &str,
    ) -> Option<&[f32]> {
        self.vocab.get(token).map(|id| self.matrix.row(id))
    }

    /// Iterate over ``(token, vector)`` pairs in id order.
    pub fn iter(&self) -> EmbeddingsIter<'_> {
        EmbeddingsIter {
            inner: self.vocab.iter(),
            matrix: &self.matrix,
        }
    }

    /// Copy every ``(token, vector)`` pair into a map.
    pub fn to_dict(&self) -> CommonHashMap<String, Vec<f32>> {
        let mut dict = hash_map_with_capacity(self.len());
        dict.extend(self.iter().map(|(w, v)| (w.to_string(), v.to_vec())));
        dict
    }

    /// Build embeddings from a ``{ token -> vector }`` map.
    ///
    /// Ids are assigned deterministically: the unknown token (if any) at 0,
    /// then the remaining tokens in sorted order. Counts are 0.
    ///
    /// ## Arguments
    /// * `dict` - ``(token, vector)`` pairs; tokens must be distinct.
    /// * `unk` - the optional unknown token; must be a key of `dict`.
    ///
    /// ## Returns
    /// The embeddings; or [`StanzaError::ShapeMismatch`] if `unk` is missing
    /// or the vectors differ in width; or [`StanzaError::NotBijection`] on a
    /// repeated token.
    pub fn from_dict<I, S, V>(
        dict: I,
        unk: Option<&str>,
    ) -> StanzaResult<Self>
    where
        I: IntoIterator<Item = (S, V)>,
        S: AsRef<str>,
        V: AsRef<[f32]>,
    {
        let mut entries: Vec<(S, V)> = dict.into_iter().collect();
        entries.sort_by(|a, b| {
            let (a, b) = (a.0.as_ref(), b.0.as_ref());
            (Some(b) == unk)
                .cmp(&(Some(a) == unk))
                .then_with(|| a.cmp(b))
        });

        if let Some(unk) = unk
            && entries.first().map(|(w, _)| w.as_ref()) != Some(unk)
        {
            return Err(StanzaError::ShapeMismatch(format!(
                "unknown token {unk:?} has no vector"
            )));
        }

        let mut vocab = Vocab::new(unk);
        for (word, _) in entries.iter().skip(usize::from(unk.is_some())) {
            let word = word.as_ref();
            if vocab.contains(word) {
                return Err(StanzaError::NotBijection(format!(
                    "token {word:?} appears more than once"
                )));
            }
            vocab.push_new(word.to_string(), 0);
        }

        let matrix = EmbeddingMatrix::from_rows(entries.iter().map(|(_, v)| v.as_ref()))?;
        Self::new(matrix, vocab)
    }

    /// Restrict to a subset of tokens.
    ///
    /// The vocabulary is [`Vocab::subset`] of `tokens`; the matrix holds the
    /// matching rows in the new id order.
    pub fn subset<I, S>(
        &self,
        tokens: I,
    ) -> StanzaResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let vocab = self.vocab.subset(tokens)?;
        let ids: Vec<TokenId> = self.vocab.words_to_indices(vocab.words())?;
        let matrix = self.matrix.select_rows(&ids)?;
        Self::new(matrix, vocab).map(|e| e.with_ann_options(self.ann_options))
    }

    /// Build embeddings over another vocabulary, reusing known vectors.
    ///
    /// Each token of `vocab` gets a copy of its vector here when present
    /// (exact match, no unknown-token fallback), and a `fill` row otherwise.
    ///
    /// ## Returns
    /// The new embeddings, sharing the ann options of `self`.
    pub fn project_onto(
        &self,
        vocab: &Vocab,
        fill: MissingRowFill,
    ) -> StanzaResult<Self> {
        let dim = self.dim();
        let mut matrix = EmbeddingMatrix::zeros(vocab.len(), dim);

        let mut rng = match fill {
            MissingRowFill::Zeros => None,
            MissingRowFill::Uniform { scale, seed } => Some((scale, StdRng::seed_from_u64(seed))),
        };

        let mut hits = 0;
        for (id, word) in vocab.iter() {
            let row = matrix.row_mut(id);
            if let Some(known) = self.get(word) {
                row.copy_from_slice(known);
                hits += 1;
            } else if let Some((scale, rng)) = rng.as_mut() {
                for x in row.iter_mut() {
                    *x = (2.0 * rng.random::<f32>() - 1.0) * *scale;
                }
            }
        }
        log::info!(
            "projected embeddings: {hits} of {} tokens had vectors",
            vocab.len()
        );

        Self::new(matrix, vocab.clone()).map(|e| e.with_ann_options(self.ann_options))
    }

    /// Save to ``{prefix}.npy`` and ``{prefix}.vocab``.
    ///
    /// Each file is replaced atomically; [`Embeddings::load`] is the inverse.
    /// Neither file is touched when a token cannot be written.
    pub fn save<P: AsRef<Path>>(
        &self,
        path_prefix: P,
    ) -> StanzaResult<()> {
        let prefix = path_prefix.as_ref();
        check_vocab_writable(&self.vocab)?;
        log::info!("writing array to {}", prefix.display());
        save_npy_path(&self.matrix, prefixed_path(prefix, "npy"))?;
        log::info!("writing vocab to {}", prefix.display());
        save_vocab_path(&self.vocab, prefixed_path(prefix, "vocab"))?;
        Ok(())
    }

    /// Load from ``{prefix}.npy`` and ``{prefix}.vocab``.
    pub fn load<P: AsRef<Path>>(path_prefix: P) -> StanzaResult<Self> {
        let prefix = path_prefix.as_ref();
        log::info!("loading array from {}", prefix.display());
        let matrix = load_npy_path(prefixed_path(prefix, "npy"))?;
        log::info!("loading vocab from {}", prefix.display());
        let vocab = load_vocab_path(prefixed_path(prefix, "vocab"))?;
        Self::new(matrix, vocab)
    }
}

/// Iterator over ``(token, vector)`` pairs of an [`Embeddings`], in id order.
#[derive(Debug, Clone)]
pub struct EmbeddingsIter<'a> {
    inner: VocabIter<'a>,
    matrix: &'a EmbeddingMatrix,
}

impl<'a> Iterator for EmbeddingsIter<'a> {
    type Item = (&'a str, &'a [f32]);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .next()
            .map(|(id, word)| (word, self.matrix.row(id)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for EmbeddingsIter<'_> {}

impl<'a> IntoIterator for &'a Embeddings {
    type Item = (&'a str, &'a [f32]);
    type IntoIter = EmbeddingsIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> Embeddings {
        let mut v = Vocab::with_unk("unk");
        v.update("what a show".split_whitespace()).unwrap();
        let matrix = EmbeddingMatrix::new(4, 3, (0..12).map(|x| x as f32).collect()).unwrap();
        Embeddings::new(matrix, v).unwrap()
    }

    fn dict_fixture() -> CommonHashMap<String, Vec<f32>> {
        [
            ("a", [6.0, 7.0, 8.0]),
            ("show", [9.0, 10.0, 11.0]),
            ("unk", [0.0, 1.0, 2.0]),
            ("what", [3.0, 4.0, 5.0]),
        ]
        .into_iter()
        .map(|(w, v)| (w.to_string(), v.to_vec()))
        .collect()
    }

    #[test]
    fn test_new_shape_mismatch() {
        let v = Vocab::from_words(["a", "b"], None);
        assert!(matches!(
            Embeddings::new(EmbeddingMatrix::zeros(3, 2), v),
            Err(StanzaError::ShapeMismatch(_))
        ));
    }

    #[test]
    fn test_lookup() {
        let emb = fixture();
        assert_eq!(emb.lookup("what").unwrap(), &[3.0, 4.0, 5.0]);
        assert_eq!(emb.lookup("zebra").unwrap(), &[0.0, 1.0, 2.0]);
        assert_eq!(emb.get("zebra"), None);
        assert!(emb.contains("show"));
        assert_eq!(emb.len(), 4);
        assert_eq!(emb.dim(), 3);

        let no_unk = Embeddings::new(
            EmbeddingMatrix::zeros(1, 2),
            Vocab::from_words(["x"], None),
        )
        .unwrap();
        assert!(matches!(
            no_unk.lookup("y"),
            Err(StanzaError::UnknownToken { .. })
        ));
    }

    #[test]
    fn test_to_dict() {
        assert_eq!(fixture().to_dict(), dict_fixture());
    }

    #[test]
    fn test_from_dict() {
        let emb = Embeddings::from_dict(dict_fixture(), Some("unk")).unwrap();
        assert_eq!(emb.to_dict(), dict_fixture());
        assert_eq!(emb.vocab().words(), &["unk", "a", "show", "what"]);
        assert_eq!(emb.lookup("show").unwrap(), &[9.0, 10.0, 11.0]);

        let emb = Embeddings::from_dict(dict_fixture(), None).unwrap();
        assert_eq!(emb.vocab().words(), &["a", "show", "unk", "what"]);
    }

    #[test]
    fn test_from_dict_errors() {
        assert!(matches!(
            Embeddings::from_dict(dict_fixture(), Some("<unk>")),
            Err(StanzaError::ShapeMismatch(_))
        ));

        let ragged = vec![("a", vec![1.0_f32]), ("b", vec![1.0, 2.0])];
        assert!(matches!(
            Embeddings::from_dict(ragged, None),
            Err(StanzaError::ShapeMismatch(_))
        ));

        let repeated = vec![("a", vec![1.0_f32]), ("a", vec![2.0])];
        assert!(matches!(
            Embeddings::from_dict(repeated, None),
            Err(StanzaError::NotBijection(_))
        ));
    }

    #[test]
    fn test_subset() {
        let emb = fixture();
        let sub = emb.subset(["a", "what", "a"]).unwrap();

        assert_eq!(sub.vocab().words(), &["unk", "a", "what"]);
        assert_eq!(sub.vocab().count_list(), &[0, 1, 1]);
        assert_eq!(sub.lookup("unk").unwrap(), &[0.0, 1.0, 2.0]);
        assert_eq!(sub.lookup("a").unwrap(), &[6.0, 7.0, 8.0]);
        assert_eq!(sub.lookup("what").unwrap(), &[3.0, 4.0, 5.0]);
        assert_eq!(sub.lookup("show").unwrap(), &[0.0, 1.0, 2.0]);

        assert!(matches!(
            emb.subset(["zebra"]),
            Err(StanzaError::UnknownToken { .. })
        ));
    }

    #[test]
    fn test_iter() {
        let emb = fixture();
        let rows: Vec<(&str, &[f32])> = emb.iter().collect();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[3], ("show", &[9.0_f32, 10.0, 11.0][..]));
        assert_eq!((&emb).into_iter().len(), 4);
    }

    #[test]
    fn test_save_load() {
        let emb = fixture();
        let dir = tempdir::TempDir::new("embeddings_test").unwrap();
        let prefix = dir.path().join("emb");

        emb.save(&prefix).unwrap();
        assert!(dir.path().join("emb.npy").exists());
        assert!(dir.path().join("emb.vocab").exists());

        let loaded = Embeddings::load(&prefix).unwrap();
        assert_eq!(loaded, emb);
        assert_eq!(loaded.vocab().unk(), Some("unk"));
    }

    #[test]
    fn test_save_rejects_unwritable_tokens() {
        let dir = tempdir::TempDir::new("embeddings_test").unwrap();
        let prefix = dir.path().join("emb");
        fixture().save(&prefix).unwrap();
        let before = std::fs::read(dir.path().join("emb.npy")).unwrap();

        let vocab = Vocab::from_words(["a\tb", "c"], None);
        let bad = Embeddings::new(EmbeddingMatrix::zeros(2, 2), vocab).unwrap();
        assert!(matches!(bad.save(&prefix), Err(StanzaError::Parse(_))));

        assert_eq!(std::fs::read(dir.path().join("emb.npy")).unwrap(), before);
        assert_eq!(Embeddings::load(&prefix).unwrap(), fixture());

        let fresh = dir.path().join("fresh");
        assert!(bad.save(&fresh).is_err());
        assert!(!dir.path().join("fresh.npy").exists());
    }

    #[test]
    fn test_project_onto() {
        let emb = fixture();
        let target = Vocab::from_words(["<pad>", "show", "zebra", "what"], None);

        let zeros = emb.project_onto(&target, MissingRowFill::Zeros).unwrap();
        assert_eq!(zeros.vocab(), &target);
        assert_eq!(zeros.get("show").unwrap(), &[9.0, 10.0, 11.0]);
        assert_eq!(zeros.get("what").unwrap(), &[3.0, 4.0, 5.0]);
        assert_eq!(zeros.get("zebra").unwrap(), &[0.0, 0.0, 0.0]);

        let fill = MissingRowFill::Uniform {
            scale: 0.5,
            seed: 42,
        };
        let a = emb.project_onto(&target, fill).unwrap();
        let b = emb.project_onto(&target, fill).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.get("show").unwrap(), &[9.0, 10.0, 11.0]);
        for word in ["<pad>", "zebra"] {
            let row = a.get(word).unwrap();
            assert!(row.iter().all(|x| x.abs() <= 0.5));
            assert!(row.iter().any(|&x| x != 0.0));
        }
    }

    #[test]
    fn test_ann_options_reset() {
        let emb = fixture();
        let _ = emb.ann_index();
        assert!(emb.ann.get().is_some());

        let emb = emb.with_ann_options(LshOptions::default().with_num_tables(2));
        assert!(emb.ann.get().is_none());
        assert_eq!(emb.ann_index().options().num_tables, 2);
    }
}
