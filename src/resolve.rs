//! Size-key resolution against a capability tree.
//!
//! An image exposes named capabilities through [`Capabilities::capability`].
//! Resolving `filters__invert__crop__400x400` walks the tree:
//!
//! ```text
//! root ─filters→ node ─invert→ node ─crop→ sized lookup ─[400x400]→ URL
//! ```
//!
//! The trailing segment is peeled off as a dimension token when it contains an
//! `x`; otherwise it is part of the chain and the chain must end at a URL
//! (typically via the `url` capability).

use crate::size_key::{DELIMITER, DIMENSION_SEPARATOR};
use thiserror::Error;

/// A value reached by looking up a capability.
pub enum Capability {
    /// Something with further named capabilities.
    Node(Box<dyn Capabilities>),
    /// A dimension-keyed accessor (`crop`, `thumbnail`, ...).
    Sized(Box<dyn SizedLookup>),
    /// A terminal URL.
    Url(String),
}

impl std::fmt::Debug for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Node(_) => f.write_str("Node(..)"),
            Self::Sized(_) => f.write_str("Sized(..)"),
            Self::Url(url) => f.debug_tuple("Url").field(url).finish(),
        }
    }
}

/// Closed, name-based capability lookup.
pub trait Capabilities: Send + Sync {
    /// Look up a capability by name; `None` when it does not exist.
    fn capability(&self, name: &str) -> Option<Capability>;
}

/// Dimension-keyed access to variant URLs.
pub trait SizedLookup: Send + Sync {
    /// URL of the variant keyed by `dimensions` (e.g. `"400x400"`).
    fn url_for(&self, dimensions: &str) -> Option<String>;
}

/// Why a size key failed to resolve.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionFailure {
    #[error("no such capability")]
    MissingCapability,
    #[error("no variant with these dimensions")]
    MissingDimensions,
    #[error("value has no named capabilities")]
    NotTraversable,
    #[error("value is not keyed by dimensions")]
    NotSized,
    #[error("value is not a URL")]
    NotUrl,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot resolve size key '{size_key}' at segment '{segment}': {reason}")]
pub struct ResolutionError {
    pub size_key: String,
    pub segment: String,
    pub reason: ResolutionFailure,
}

/// Resolve `size_key` to a URL by walking `root`'s capabilities.
pub fn resolve_url(root: &dyn Capabilities, size_key: &str) -> Result<String, ResolutionError> {
    let fail = |segment: &str, reason| ResolutionError {
        size_key: size_key.to_string(),
        segment: segment.to_string(),
        reason,
    };

    let mut chain: Vec<&str> = size_key.split(DELIMITER).collect();
    let dimensions = match chain.last() {
        Some(last) if last.contains(DIMENSION_SEPARATOR) => chain.pop(),
        _ => None,
    };

    // `None` stands for the root, which is borrowed rather than owned.
    let mut current: Option<Capability> = None;
    let mut last_segment = "";
    for segment in chain {
        let next = match &current {
            None => root.capability(segment),
            Some(Capability::Node(node)) => node.capability(segment),
            Some(_) => return Err(fail(segment, ResolutionFailure::NotTraversable)),
        };
        current = Some(next.ok_or_else(|| fail(segment, ResolutionFailure::MissingCapability))?);
        last_segment = segment;
    }

    let url = match (current, dimensions) {
        (Some(Capability::Sized(lookup)), Some(dims)) => lookup
            .url_for(dims)
            .ok_or_else(|| fail(dims, ResolutionFailure::MissingDimensions))?,
        (_, Some(dims)) => return Err(fail(dims, ResolutionFailure::NotSized)),
        (Some(Capability::Url(url)), None) => url,
        (_, None) => return Err(fail(last_segment, ResolutionFailure::NotUrl)),
    };
    tracing::debug!(size_key, %url, "resolved size key");
    Ok(url)
}
