//! # Pretrained Word Vectors
//!
//! Readers for the ``GloVe`` and ``SENNA`` text releases, and (with the
//! ``download`` feature) resolution of those files through the
//! [`disk_cache`](crate::disk_cache).
//!
//! ## Loading ``GloVe``
//!
//! ```rust,no_run
//! use stanza::{
//!     Vocab,
//!     MissingRowFill,
//!     disk_cache::{StanzaDiskCache, StanzaDiskCacheOptions},
//!     pretrained::{GloveCorpus, PretrainedSource, load_glove},
//! };
//!
//! fn example(corpus_vocab: &Vocab) -> anyhow::Result<()> {
//!     let mut cache = StanzaDiskCache::new(StanzaDiskCacheOptions::default())?;
//!     let source = PretrainedSource::glove(GloveCorpus::WikipediaGigaword, 50)?;
//!     let glove = load_glove(&mut cache, &source, Some("<unk>"), false)?;
//!
//!     let emb = glove.project_onto(corpus_vocab, MissingRowFill::Zeros)?;
//!     emb.save("corpus.glove50")?;
//!     Ok(())
//! }
//! ```

#[cfg(feature = "download")]
mod sources;
mod text_format;

#[cfg(feature = "download")]
#[doc(inline)]
pub use sources::{GloveCorpus, PretrainedSource, load_glove, load_senna};
#[doc(inline)]
pub use text_format::{load_glove_path, load_senna_paths, read_glove_text, read_senna};
