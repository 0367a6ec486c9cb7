//! # Token Embeddings
//!
//! An [`Embeddings`] pairs a [`Vocab`](crate::Vocab) with an
//! [`EmbeddingMatrix`] holding one row per token id.
//!
//! ## Neighbor Search
//!
//! * [`Embeddings::k_nearest`] is exact: it scores every row by inner
//!   product with the query.
//! * [`Embeddings::k_nearest_approx`] is approximate: it scores only the
//!   candidates from a lazily built [`LshIndex`](crate::ann::LshIndex) by
//!   cosine similarity. It is sub-linear, but may miss true neighbors and
//!   may return fewer than `k` results.
//!
//! ```rust
//! use stanza::{EmbeddingMatrix, Embeddings, Vocab};
//!
//! let mut vocab = Vocab::with_unk("unk");
//! vocab.update("what a show".split_whitespace()).unwrap();
//! let matrix = EmbeddingMatrix::new(4, 3, (0..12).map(|x| x as f32).collect()).unwrap();
//! let emb = Embeddings::new(matrix, vocab).unwrap();
//!
//! assert_eq!(emb.lookup("what").unwrap(), &[3.0, 4.0, 5.0]);
//!
//! let top = emb.k_nearest(&[3.0, 2.0, 1.0], 2).unwrap();
//! assert_eq!(top[0].token, "show");
//! assert_eq!(top[0].score, 58.0);
//! ```

mod matrix;
mod neighbors;
mod word_embeddings;

#[doc(inline)]
pub use matrix::EmbeddingMatrix;
#[doc(inline)]
pub use neighbors::Neighbor;
#[doc(inline)]
pub use word_embeddings::{Embeddings, EmbeddingsIter, MissingRowFill};
