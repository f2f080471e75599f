//! Content-addressed file names for cache busting.
//!
//! A compiled file `app.js` is written as `<digest>.h.app.js`, where the
//! digest is the first ten hex chars of the blake3 hash of the exact bytes
//! written to disk. Any content change produces a new name, so every
//! reference to the old name goes stale and clients re-fetch.

use rustc_hash::FxHashMap;

use super::AssetCategory;

/// Hex chars kept from the blake3 digest.
pub const DIGEST_LEN: usize = 10;

/// Marker segment between digest and original name.
pub const HASH_MARKER: &str = ".h.";

/// Whether compiled files get content-addressed names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashingPolicy {
    /// Rename to `<digest>.h.<name>` and record the mapping.
    Hash,
    /// Keep the original name; nothing is recorded.
    PassThrough,
}

impl HashingPolicy {
    pub const fn from_flag(hash: bool) -> Self {
        if hash { Self::Hash } else { Self::PassThrough }
    }
}

/// Short content digest of `bytes`.
pub fn digest(bytes: &[u8]) -> String {
    let hash = blake3::hash(bytes);
    let mut hex = hex::encode(hash.as_bytes());
    hex.truncate(DIGEST_LEN);
    hex
}

/// `<digest>.h.<name>` for the given final contents.
pub fn hashed_name(name: &str, contents: &[u8]) -> String {
    format!("{}{HASH_MARKER}{name}", digest(contents))
}

/// Whether `name` already carries a digest prefix.
pub fn is_hashed(name: &str) -> bool {
    name.split_once(HASH_MARKER).is_some_and(|(prefix, rest)| {
        prefix.len() == DIGEST_LEN
            && !rest.is_empty()
            && prefix.bytes().all(|b| b.is_ascii_hexdigit())
    })
}

/// Strip the final extension (`app.js` -> `app`, `a.b.js` -> `a.b`).
pub fn stem(name: &str) -> &str {
    match name.rfind('.') {
        Some(0) | None => name,
        Some(i) => &name[..i],
    }
}

/// One hashed artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashedAsset {
    pub hashed: String,
    pub category: AssetCategory,
    /// Directory relative to the category root, `/`-joined with a trailing
    /// slash (`""` at the root, `"admin/"` one level down).
    pub rel_dir: String,
}

/// Original file name -> hashed replacement.
///
/// Keyed by bare file name because templates, imports and loader calls all
/// name files that way. Two files sharing a name in different directories
/// share one slot; [`HashTable::insert`] hands back the displaced entry so
/// the caller can report the collision.
#[derive(Debug, Default)]
pub struct HashTable {
    entries: FxHashMap<String, HashedAsset>,
}

impl HashTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a mapping, returning the entry it replaced, if any.
    pub fn insert(&mut self, name: impl Into<String>, asset: HashedAsset) -> Option<HashedAsset> {
        self.entries.insert(name.into(), asset)
    }

    pub fn get(&self, name: &str) -> Option<&HashedAsset> {
        self.entries.get(name)
    }

    pub fn hashed_name(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(|a| a.hashed.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &HashedAsset)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
