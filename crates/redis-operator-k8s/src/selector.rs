//! Label selectors for list queries

use std::collections::BTreeMap;
use std::fmt;

/// An equality-based label selector in API server syntax (`k1=v1,k2=v2`).
///
/// Built from a `matchLabels` map. Label sets are unordered, so two maps with
/// the same pairs always produce the same selector.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSelector(Option<String>);

impl LabelSelector {
    /// Selector matching every object
    pub fn everything() -> Self {
        Self(None)
    }

    /// Selector requiring every `key=value` pair in `labels`
    ///
    /// An empty map selects everything.
    pub fn from_match_labels(labels: &BTreeMap<String, String>) -> Self {
        if labels.is_empty() {
            return Self::everything();
        }
        let pairs: Vec<String> = labels.iter().map(|(k, v)| format!("{k}={v}")).collect();
        Self(Some(pairs.join(",")))
    }

    /// The selector string, or `None` when nothing is filtered
    pub fn as_str(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl fmt::Display for LabelSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str().unwrap_or_default())
    }
}
