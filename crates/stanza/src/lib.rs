//! # `stanza` Vocabulary and Embedding Toolkit
//!
//! Research-support tooling for NLP experiments, centered on two types:
//!
//! * [`Vocab`] - a bijection between tokens and dense ids ``0..N``,
//!   with per-token frequency counts and an optional unknown token at id 0.
//! * [`Embeddings`] - a dense ``(N, dim)`` matrix layered on a [`Vocab`],
//!   with exact and approximate nearest neighbor search.
//!
//! See:
//! * [`vocab`] to build, prune, sort, and subset vocabularies.
//! * [`embeddings`] for vector lookup, neighbor search, and persistence.
//! * [`ann`] for the locality-sensitive hashing index.
//! * [`io`] for the vocabulary and matrix file formats.
//! * [`pretrained`] to read ``GloVe`` and ``SENNA`` text embeddings.
//!
//! ## Building a Vocabulary
//!
//! ```rust
//! use stanza::Vocab;
//!
//! let mut vocab = Vocab::with_unk("<unk>");
//! vocab.update("the cat sat on the mat".split_whitespace()).unwrap();
//!
//! assert_eq!(vocab.len(), 6);
//! assert_eq!(vocab.count("the"), 2);
//! assert_eq!(vocab.lookup("dog").unwrap(), 0);
//!
//! let sorted = vocab.sort_by_decreasing_count();
//! assert_eq!(sorted.word(1).unwrap(), "the");
//! ```
//!
//! ## Crate Features
#![doc = document_features::document_features!()]
#![warn(missing_docs, unused)]

pub mod ann;
pub mod embeddings;
pub mod errors;
pub mod io;
pub mod pretrained;
pub mod types;
pub mod vocab;

#[cfg(feature = "download")]
#[doc(inline)]
pub use stanza_disk_cache as disk_cache;

#[doc(inline)]
pub use embeddings::{EmbeddingMatrix, Embeddings, MissingRowFill, Neighbor};
#[doc(inline)]
pub use errors::{StanzaError, StanzaResult};
#[doc(inline)]
pub use vocab::Vocab;
