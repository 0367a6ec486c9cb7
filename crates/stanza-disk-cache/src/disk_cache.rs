//! # Stanza Disk Cache

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use downloader::{Download, Downloader};

use crate::{STANZA_CACHE_CONFIG, path_utils};

/// Options for [`StanzaDiskCache`].
#[derive(Clone, Default, Debug)]
pub struct StanzaDiskCacheOptions {
    /// Optional path to the cache directory.
    pub cache_dir: Option<PathBuf>,

    /// Optional path to the data directory.
    pub data_dir: Option<PathBuf>,

    /// Optional [`Downloader`] builder.
    pub downloader: Option<fn() -> Downloader>,
}

impl StanzaDiskCacheOptions {
    /// Set the cache directory.
    pub fn with_cache_dir<P: AsRef<Path>>(
        mut self,
        cache_dir: Option<P>,
    ) -> Self {
        self.cache_dir = cache_dir.map(|p| p.as_ref().to_path_buf());
        self
    }

    /// Set the data directory.
    pub fn with_data_dir<P: AsRef<Path>>(
        mut self,
        data_dir: Option<P>,
    ) -> Self {
        self.data_dir = data_dir.map(|p| p.as_ref().to_path_buf());
        self
    }

    /// Set the downloader builder.
    pub fn with_downloader(
        mut self,
        downloader: Option<fn() -> Downloader>,
    ) -> Self {
        self.downloader = downloader;
        self
    }
}

/// Disk cache for pretrained embedding files.
///
/// The data directory holds files a user placed by hand (or that a previous
/// run downloaded there); the cache directory holds downloads keyed by URL
/// file name. Both are resolved through
/// [`PathResolver`](crate::path_resolver::PathResolver), honoring the
/// ``STANZA_DATA_DIR`` / ``STANZA_CACHE_DIR`` overrides.
pub struct StanzaDiskCache {
    cache_dir: PathBuf,
    data_dir: PathBuf,

    /// Connection pool for downloading files.
    downloader: Downloader,
}

impl StanzaDiskCache {
    /// Construct a new [`StanzaDiskCache`].
    pub fn new(options: StanzaDiskCacheOptions) -> anyhow::Result<Self> {
        let cache_dir = STANZA_CACHE_CONFIG
            .resolve_cache_dir(options.cache_dir)
            .context("failed to resolve cache directory")?;

        let data_dir = STANZA_CACHE_CONFIG
            .resolve_data_dir(options.data_dir)
            .context("failed to resolve data directory")?;

        let downloader = match options.downloader {
            Some(builder) => builder(),
            None => Downloader::builder().build()?,
        };

        Ok(Self {
            cache_dir,
            data_dir,
            downloader,
        })
    }

    /// Get the cache directory.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Get the data directory.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Get the cache path for `file` under the `context` dirs.
    ///
    /// Does not check that the path exists, or create any directories.
    pub fn cache_path<C, F>(
        &self,
        context: &[C],
        file: F,
    ) -> PathBuf
    where
        C: AsRef<Path>,
        F: AsRef<Path>,
    {
        path_utils::extend_path(&self.cache_dir, context, file)
    }

    /// Get the data path for `file` under the `context` dirs.
    ///
    /// Does not check that the path exists, or create any directories.
    pub fn data_path<C, F>(
        &self,
        context: &[C],
        file: F,
    ) -> PathBuf
    where
        C: AsRef<Path>,
        F: AsRef<Path>,
    {
        path_utils::extend_path(&self.data_dir, context, file)
    }

    fn fetch(
        &mut self,
        path: &Path,
        urls: &[&str],
    ) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let mut dl = Download::new_mirrored(urls);
        dl.file_name = path.to_path_buf();

        for summary in self.downloader.download(&[dl])? {
            if let Err(err) = summary {
                anyhow::bail!("failed to download {}: {err}", path.display());
            }
        }
        Ok(())
    }

    /// Load a cached download, fetching it when missing.
    ///
    /// The cached file is named after the final segment of the first URL.
    ///
    /// ## Arguments
    /// * `context` - dirs between the cache dir and the file.
    /// * `urls` - mirror URLs for the same file; tried in order.
    /// * `download` - may the file be fetched if it is not cached?
    ///
    /// ## Returns
    /// The cached path; or an error if the file is missing and `download`
    /// is false, or the download fails.
    pub fn load_cached_path<C, S>(
        &mut self,
        context: &[C],
        urls: &[S],
        download: bool,
    ) -> anyhow::Result<PathBuf>
    where
        C: AsRef<Path>,
        S: AsRef<str>,
    {
        let urls: Vec<&str> = urls.iter().map(|s| s.as_ref()).collect();
        let file_name = urls
            .first()
            .and_then(|url| path_utils::url_file_name(url))
            .context("no url with a file name to cache")?;
        let path = self.cache_path(context, file_name);

        if path.exists() {
            return Ok(path);
        }
        if !download {
            anyhow::bail!("cached file not found: {}", path.display());
        }

        self.fetch(&path, &urls)?;
        Ok(path)
    }

    /// Load a data file, fetching it into the data directory when missing.
    ///
    /// ## Arguments
    /// * `context` - dirs between the data dir and the file.
    /// * `file` - the file name.
    /// * `urls` - mirror URLs; may be empty when the file must already exist.
    /// * `download` - may the file be fetched if it is missing?
    ///
    /// ## Returns
    /// The data path; or an error naming the missing path when it does not
    /// exist and cannot be fetched.
    pub fn load_data_path<C, F, S>(
        &mut self,
        context: &[C],
        file: F,
        urls: &[S],
        download: bool,
    ) -> anyhow::Result<PathBuf>
    where
        C: AsRef<Path>,
        F: AsRef<Path>,
        S: AsRef<str>,
    {
        let path = self.data_path(context, file);
        if path.exists() {
            return Ok(path);
        }
        if urls.is_empty() {
            anyhow::bail!(
                "could not locate data {}, and no url was given",
                path.display()
            );
        }
        if !download {
            anyhow::bail!("data file not found: {}", path.display());
        }

        let urls: Vec<&str> = urls.iter().map(|s| s.as_ref()).collect();
        self.fetch(&path, &urls)?;
        Ok(path)
    }
}
