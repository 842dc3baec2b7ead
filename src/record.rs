use std::collections::{BTreeMap, HashMap};

/// Read-only attribute lookup used when evaluating a pattern.
pub trait Record {
    fn attribute(&self, name: &str) -> Option<&str>;
}

impl Record for HashMap<String, String> {
    fn attribute(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

impl Record for BTreeMap<String, String> {
    fn attribute(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}
