use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// An immutable label string that is cheap to clone.
///
/// Most labels drawn each frame are string literals; those are stored as
/// `&'static str` and never allocate. Formatted labels (counters, weights)
/// are stored behind an `Arc<str>` so cloning them into render commands is a
/// refcount increment.
#[derive(Debug, Clone)]
pub struct SharedStr(Repr);

#[derive(Debug, Clone)]
enum Repr {
    Static(&'static str),
    Shared(Arc<str>),
}

impl SharedStr {
    #[inline]
    pub fn as_str(&self) -> &str {
        match &self.0 {
            Repr::Static(s) => s,
            Repr::Shared(s) => s,
        }
    }

    /// Number of characters (not bytes), used for monospace text metrics.
    pub fn char_count(&self) -> usize {
        self.as_str().chars().count()
    }
}

impl PartialEq for SharedStr {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for SharedStr {}

impl PartialEq<str> for SharedStr {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for SharedStr {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl std::hash::Hash for SharedStr {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl std::ops::Deref for SharedStr {
    type Target = str;

    #[inline]
    fn deref(&self) -> &str {
        self.as_str()
    }
}

impl AsRef<str> for SharedStr {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl From<&'static str> for SharedStr {
    #[inline]
    fn from(s: &'static str) -> Self {
        SharedStr(Repr::Static(s))
    }
}

impl From<String> for SharedStr {
    fn from(s: String) -> Self {
        SharedStr(Repr::Shared(Arc::from(s)))
    }
}

impl std::fmt::Display for SharedStr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// Hand-rolled to avoid serde's `rc` feature.
impl Serialize for SharedStr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SharedStr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(SharedStr::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_and_shared_compare_by_content() {
        let a = SharedStr::from("T9");
        let b = SharedStr::from(format!("T{}", 9));
        assert_eq!(a, b);
        assert_eq!(a, "T9");
    }

    #[test]
    fn char_count_counts_unicode_scalars() {
        let s = SharedStr::from("reset −0.1");
        assert_eq!(s.char_count(), 10);
        assert!(s.len() > 10);
    }

    #[test]
    fn deserializes_escaped_strings() {
        let s: Option<SharedStr> = serde_json::from_str("\"\\\"Hello\\\" → 9426\"").ok();
        assert_eq!(s.as_deref(), Some("\"Hello\" → 9426"));
    }

    #[test]
    fn display_matches_content() {
        assert_eq!(SharedStr::from("spikes").to_string(), "spikes");
    }
}
