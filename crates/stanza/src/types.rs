//! # Common Types

/// A dense vocabulary id in ``0..vocab.len()``.
pub type TokenId = usize;

/// A token occurrence count.
pub type TokenCount = u64;

cfg_if::cfg_if! {
    if #[cfg(feature = "ahash")] {
        /// Type Alias for hash maps in this crate.
        pub type CommonHashMap<K, V> = ahash::AHashMap<K, V>;

        /// Type Alias for hash sets in this crate.
        pub type CommonHashSet<V> = ahash::AHashSet<V>;

    } else {
        /// Type Alias for hash maps in this crate.
        pub type CommonHashMap<K, V> = std::collections::HashMap<K, V>;

        /// Type Alias for hash sets in this crate.
        pub type CommonHashSet<V> = std::collections::HashSet<V>;
    }
}

/// Create a new empty hash map.
pub fn hash_map_new<K, V>() -> CommonHashMap<K, V> {
    CommonHashMap::default()
}

/// Create a new hash map with the given capacity.
pub fn hash_map_with_capacity<K, V>(capacity: usize) -> CommonHashMap<K, V> {
    CommonHashMap::with_capacity(capacity)
}
