//! # stanza-disk-cache
//!
//! Resolves the per-user data and cache directories for pretrained
//! embedding files, and fetches missing files from mirror URLs.
#![warn(missing_docs)]

use crate::path_resolver::PathResolver;

pub mod disk_cache;
pub mod path_resolver;
pub mod path_utils;

pub use disk_cache::{StanzaDiskCache, StanzaDiskCacheOptions};

/// Environment variable key to override the default cache directory.
pub const STANZA_CACHE_DIR: &str = "STANZA_CACHE_DIR";
/// Environment variable key to override the default data directory.
pub const STANZA_DATA_DIR: &str = "STANZA_DATA_DIR";

/// Default [`PathResolver`] for stanza.
pub const STANZA_CACHE_CONFIG: PathResolver = PathResolver {
    qualifier: "edu.stanford.nlp",
    organization: "",
    application: "stanza",
    cache_env_vars: &[STANZA_CACHE_DIR],
    data_env_vars: &[STANZA_DATA_DIR],
};
