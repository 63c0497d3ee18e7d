//! Shared test utilities.
//!
//! [`CapabilityTree`] is a data-driven capability tree: build the shape a test
//! needs with [`CapabilityTree::branch`], [`CapabilityTree::sized`] and
//! [`CapabilityTree::url`], then resolve size keys against it.
//!
//! ```rust,ignore
//! use crate::test_helpers::*;
//!
//! let root = CapabilityTree::branch([
//!     ("crop", CapabilityTree::sized([("400x400", "http://x/y.jpg")])),
//! ]);
//! assert_eq!(resolve_url(&root, "crop__400x400").unwrap(), "http://x/y.jpg");
//! ```

use std::collections::BTreeMap;

use crate::config::VariantConfig;
use crate::resolve::{Capabilities, Capability, SizedLookup};

#[derive(Debug, Clone)]
pub enum CapabilityTree {
    Branch(BTreeMap<String, CapabilityTree>),
    Sized(BTreeMap<String, String>),
    Url(String),
}

impl CapabilityTree {
    pub fn branch<const N: usize>(children: [(&str, CapabilityTree); N]) -> Self {
        Self::Branch(
            children
                .into_iter()
                .map(|(name, child)| (name.to_string(), child))
                .collect(),
        )
    }

    pub fn sized<const N: usize>(entries: [(&str, &str); N]) -> Self {
        Self::Sized(
            entries
                .into_iter()
                .map(|(dims, url)| (dims.to_string(), url.to_string()))
                .collect(),
        )
    }

    pub fn url(url: &str) -> Self {
        Self::Url(url.to_string())
    }

    fn into_capability(self) -> Capability {
        match self {
            Self::Branch(_) => Capability::Node(Box::new(self)),
            Self::Sized(entries) => Capability::Sized(Box::new(SizedEntries(entries))),
            Self::Url(url) => Capability::Url(url),
        }
    }
}

impl Capabilities for CapabilityTree {
    fn capability(&self, name: &str) -> Option<Capability> {
        match self {
            Self::Branch(children) => children.get(name).cloned().map(Self::into_capability),
            _ => None,
        }
    }
}

struct SizedEntries(BTreeMap<String, String>);

impl SizedLookup for SizedEntries {
    fn url_for(&self, dimensions: &str) -> Option<String> {
        self.0.get(dimensions).cloned()
    }
}

/// Default config with an absolute media URL and a second filter.
pub fn test_config() -> VariantConfig {
    let mut config = VariantConfig::default();
    config.media_url = "http://media.test/".to_string();
    config.variants.filters = vec!["invert".to_string(), "grayscale".to_string()];
    config
}

// =========================================================================
// Assertions
// =========================================================================

/// Assert a URL map has exactly `expected` entries. Panics with the full map.
pub fn assert_urls(actual: &BTreeMap<String, String>, expected: &[(&str, &str)]) {
    let expected: BTreeMap<String, String> = expected
        .iter()
        .map(|(label, url)| (label.to_string(), url.to_string()))
        .collect();
    assert_eq!(
        actual, &expected,
        "URL map mismatch.\n  actual:   {actual:?}\n  expected: {expected:?}"
    );
}
