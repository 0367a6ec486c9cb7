use std::{path::PathBuf, str::FromStr};

use stanza::{
    disk_cache::StanzaDiskCache,
    pretrained::{GloveCorpus, PretrainedSource},
};

use crate::{disk_cache::DiskCacheArgs, logging::LogArgs};

/// Args for the fetch command.
///
/// Prints the local path of the resolved file. With only `--url`, the file
/// is kept in the download cache, named after the first URL.
#[derive(clap::Args, Debug)]
pub struct FetchArgs {
    /// File name within the data directory.
    #[arg(long, required_unless_present_any = ["glove", "urls"], conflicts_with = "glove")]
    name: Option<String>,

    /// Directories between the data (or cache) directory and the file.
    #[arg(long, num_args = 1..)]
    context: Vec<String>,

    /// A ``GloVe`` release, by corpus; see `--dim`.
    #[arg(long, value_parser = GloveCorpus::from_str, requires = "dim")]
    glove: Option<GloveCorpus>,

    /// Vector width of the ``GloVe`` release.
    #[arg(long)]
    dim: Option<usize>,

    /// Mirror URLs, tried in order.
    #[arg(long = "url")]
    urls: Vec<String>,

    /// Fail instead of downloading a missing file.
    #[arg(long)]
    no_download: bool,

    #[command(flatten)]
    disk_cache: DiskCacheArgs,

    #[command(flatten)]
    logging: LogArgs,
}

/// Where a fetched file lives.
#[derive(Debug, PartialEq)]
enum FetchTarget {
    /// A named file in the data directory.
    Data(PretrainedSource),

    /// A download cache entry, named after the first URL.
    Cached(Vec<String>),
}

impl FetchArgs {
    fn target(&self) -> Result<FetchTarget, Box<dyn std::error::Error>> {
        let source = match (&self.name, self.glove, self.dim) {
            (_, Some(corpus), Some(dim)) => {
                let mut source = PretrainedSource::glove(corpus, dim)?;
                if !self.context.is_empty() {
                    source.context = self.context.clone();
                }
                source
            }
            (Some(name), _, _) => PretrainedSource::new(self.context.as_slice(), name),
            (None, None, _) if !self.urls.is_empty() => {
                return Ok(FetchTarget::Cached(self.urls.clone()));
            }
            _ => return Err("one of --name, --glove/--dim, or --url is required".into()),
        };
        Ok(FetchTarget::Data(source.with_urls(&self.urls)))
    }

    fn resolve(
        &self,
        cache: &mut StanzaDiskCache,
    ) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let download = !self.no_download;
        Ok(match self.target()? {
            FetchTarget::Data(source) => {
                log::info!("resolving {}", source.file_name);
                source.resolve(cache, download)?
            }
            FetchTarget::Cached(urls) => {
                cache.load_cached_path(self.context.as_slice(), urls.as_slice(), download)?
            }
        })
    }

    pub fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.logging.setup_logging(3)?;

        let mut cache = self.disk_cache.init_disk_cache()?;
        let path = self.resolve(&mut cache)?;

        println!("{}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(clap::Parser, Debug)]
    struct TestArgs {
        #[command(flatten)]
        fetch: FetchArgs,
    }

    #[test]
    fn test_glove_source() {
        let args = TestArgs::parse_from([
            "fetch",
            "--glove",
            "wikipedia_gigaword",
            "--dim",
            "50",
            "--url",
            "https://example.com/glove.6B.50d.txt",
        ]);
        let FetchTarget::Data(source) = args.fetch.target().unwrap() else {
            panic!("expected a data file");
        };
        assert_eq!(source.context, vec!["glove".to_string()]);
        assert_eq!(source.file_name, "glove.6B.50d.txt");
        assert_eq!(source.urls.len(), 1);
    }

    #[test]
    fn test_named_source() {
        let args = TestArgs::parse_from([
            "fetch",
            "--name",
            "words.lst",
            "--context",
            "senna",
        ]);
        assert_eq!(
            args.fetch.target().unwrap(),
            FetchTarget::Data(PretrainedSource::senna_words())
        );
    }

    #[test]
    fn test_bad_glove_width() {
        let args = TestArgs::parse_from(["fetch", "--glove", "twitter", "--dim", "300"]);
        assert!(args.fetch.target().is_err());
    }

    #[test]
    fn test_cached_url_target() {
        let url = "https://example.com/senna/embeddings.txt";
        let args = TestArgs::parse_from(["fetch", "--url", url, "--context", "senna"]);
        assert_eq!(
            args.fetch.target().unwrap(),
            FetchTarget::Cached(vec![url.to_string()])
        );
    }

    #[test]
    fn test_cached_url_resolves_existing_file() {
        let dir = tempdir::TempDir::new("fetch_test").unwrap();
        let cache_dir = dir.path().join("cache");
        let cached = cache_dir.join("senna").join("embeddings.txt");
        std::fs::create_dir_all(cached.parent().unwrap()).unwrap();
        std::fs::write(&cached, "0.1 0.2\n").unwrap();

        let args = TestArgs::parse_from([
            "fetch",
            "--url",
            "https://example.com/senna/embeddings.txt",
            "--context",
            "senna",
            "--no-download",
            "--cache-dir",
            cache_dir.to_str().unwrap(),
            "--data-dir",
            dir.path().join("data").to_str().unwrap(),
        ]);
        let mut cache = args.fetch.disk_cache.init_disk_cache().unwrap();
        assert_eq!(args.fetch.resolve(&mut cache).unwrap(), cached);

        std::fs::remove_file(&cached).unwrap();
        assert!(args.fetch.resolve(&mut cache).is_err());
    }
}
