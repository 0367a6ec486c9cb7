use stanza::disk_cache::{StanzaDiskCache, StanzaDiskCacheOptions};

/// Disk cache argument group.
#[derive(clap::Args, Debug)]
pub struct DiskCacheArgs {
    /// Cache directory.
    #[arg(long, default_value = None)]
    cache_dir: Option<String>,

    /// Data directory for pretrained files.
    #[arg(long, default_value = None)]
    data_dir: Option<String>,
}

impl DiskCacheArgs {
    /// Initialize the disk cache.
    pub fn init_disk_cache(&self) -> Result<StanzaDiskCache, Box<dyn std::error::Error>> {
        let options = StanzaDiskCacheOptions::default()
            .with_cache_dir(self.cache_dir.as_ref())
            .with_data_dir(self.data_dir.as_ref());

        Ok(StanzaDiskCache::new(options)?)
    }
}
