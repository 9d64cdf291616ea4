//! Label access capability used by selector matching

use std::collections::{BTreeMap, HashMap};

/// Read-only access to a set of string labels.
///
/// Selector requirements are evaluated against this trait, so any value type
/// carrying labels can be filtered without the matcher knowing its layout.
pub trait Labeled {
    /// Whether `key` is present, regardless of its value.
    fn has(&self, key: &str) -> bool;

    /// Value for `key`, if present. An empty string is a present value.
    fn get(&self, key: &str) -> Option<&str>;
}

impl Labeled for BTreeMap<String, String> {
    fn has(&self, key: &str) -> bool {
        self.contains_key(key)
    }

    fn get(&self, key: &str) -> Option<&str> {
        BTreeMap::get(self, key).map(String::as_str)
    }
}

impl<S: std::hash::BuildHasher> Labeled for HashMap<String, String, S> {
    fn has(&self, key: &str) -> bool {
        self.contains_key(key)
    }

    fn get(&self, key: &str) -> Option<&str> {
        HashMap::get(self, key).map(String::as_str)
    }
}
