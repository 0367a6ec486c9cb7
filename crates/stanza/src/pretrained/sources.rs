//! # Pretrained Embedding Files

use std::path::PathBuf;

use crate::{
    disk_cache::StanzaDiskCache,
    embeddings::Embeddings,
    errors::{StanzaError, StanzaResult},
    pretrained::{load_glove_path, load_senna_paths},
};

/// ``GloVe`` training corpora, by release.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    strum::EnumString,
    strum::EnumIter,
    strum::Display,
)]
#[non_exhaustive]
pub enum GloveCorpus {
    /// Wikipedia 2014 + Gigaword 5; 6B tokens, dims 50, 100, 200, 300.
    #[strum(serialize = "wikipedia_gigaword")]
    WikipediaGigaword,

    /// Common Crawl; 42B tokens, dim 300.
    #[strum(serialize = "common_crawl_42b")]
    CommonCrawl42B,

    /// Common Crawl; 840B tokens, dim 300.
    #[strum(serialize = "common_crawl_840b")]
    CommonCrawl840B,

    /// Twitter; 27B tokens, dims 25, 50, 100, 200.
    #[strum(serialize = "twitter")]
    Twitter,
}

impl GloveCorpus {
    /// The vector widths released for this corpus.
    pub fn dims(self) -> &'static [usize] {
        match self {
            GloveCorpus::WikipediaGigaword => &[50, 100, 200, 300],
            GloveCorpus::CommonCrawl42B | GloveCorpus::CommonCrawl840B => &[300],
            GloveCorpus::Twitter => &[25, 50, 100, 200],
        }
    }

    /// The released text file name for width `dim`.
    ///
    /// ## Returns
    /// The file name; or [`StanzaError::ShapeMismatch`] if no such width was
    /// released.
    pub fn file_name(
        self,
        dim: usize,
    ) -> StanzaResult<String> {
        if !self.dims().contains(&dim) {
            return Err(StanzaError::ShapeMismatch(format!(
                "no {self} GloVe release of width {dim}; available: {:?}",
                self.dims()
            )));
        }
        Ok(match self {
            GloveCorpus::WikipediaGigaword => format!("glove.6B.{dim}d.txt"),
            GloveCorpus::CommonCrawl42B => "glove.42B.300d.txt".to_string(),
            GloveCorpus::CommonCrawl840B => "glove.840B.300d.txt".to_string(),
            GloveCorpus::Twitter => format!("glove.twitter.27B.{dim}d.txt"),
        })
    }
}

/// A pretrained file in the data directory, with optional mirror URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PretrainedSource {
    /// Directories between the data directory and the file.
    pub context: Vec<String>,

    /// The file name.
    pub file_name: String,

    /// Mirror URLs for the file, tried in order.
    pub urls: Vec<String>,
}

impl PretrainedSource {
    /// A source with no mirror URLs.
    pub fn new<C>(
        context: &[C],
        file_name: &str,
    ) -> Self
    where
        C: AsRef<str>,
    {
        Self {
            context: context.iter().map(|c| c.as_ref().to_string()).collect(),
            file_name: file_name.to_string(),
            urls: Vec::new(),
        }
    }

    /// The ``GloVe`` text file for `corpus` and `dim`, under ``glove/``.
    pub fn glove(
        corpus: GloveCorpus,
        dim: usize,
    ) -> StanzaResult<Self> {
        Ok(Self::new(&["glove"], &corpus.file_name(dim)?))
    }

    /// The ``SENNA`` word list, under ``senna/``.
    pub fn senna_words() -> Self {
        Self::new(&["senna"], "words.lst")
    }

    /// The ``SENNA`` vector file, under ``senna/``.
    pub fn senna_vectors() -> Self {
        Self::new(&["senna"], "embeddings.txt")
    }

    /// Set the mirror URLs.
    pub fn with_urls<I, S>(
        mut self,
        urls: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.urls = urls.into_iter().map(|u| u.as_ref().to_string()).collect();
        self
    }

    /// Find the file in the data directory, downloading it if allowed.
    ///
    /// ## Returns
    /// The local path; or [`StanzaError::External`] if the file is missing
    /// and cannot be fetched.
    pub fn resolve(
        &self,
        cache: &mut StanzaDiskCache,
        download: bool,
    ) -> StanzaResult<PathBuf> {
        cache
            .load_data_path(&self.context, &self.file_name, &self.urls, download)
            .map_err(|e| StanzaError::External(format!("{e:#}")))
    }
}

/// Resolve and load a ``GloVe`` release.
pub fn load_glove(
    cache: &mut StanzaDiskCache,
    source: &PretrainedSource,
    unk: Option<&str>,
    download: bool,
) -> StanzaResult<Embeddings> {
    load_glove_path(source.resolve(cache, download)?, unk)
}

/// Resolve and load the ``SENNA`` word list and vectors.
pub fn load_senna(
    cache: &mut StanzaDiskCache,
    words: &PretrainedSource,
    vectors: &PretrainedSource,
    unk: Option<&str>,
    download: bool,
) -> StanzaResult<Embeddings> {
    let words_path = words.resolve(cache, download)?;
    let vectors_path = vectors.resolve(cache, download)?;
    load_senna_paths(words_path, vectors_path, unk)
}
