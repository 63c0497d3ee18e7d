//! Label → URL maps for rendition key sets.
//!
//! [`build_url_set`] validates a set of `(label, size key)` pairs, resolves
//! each one against an image and returns the URLs by label:
//!
//! ```text
//! [("large", "url"), ("medium", "crop__400x400")]
//!   → { "large":  "/media/photos/cat.jpg",
//!       "medium": "/media/__sized__/photos/cat-crop-400x400-70.jpg" }
//! ```
//!
//! The build is all-or-nothing: an invalid key or an unresolvable entry fails
//! the whole call rather than returning a partial map.

use std::collections::BTreeMap;

use thiserror::Error;
use url::Url;

use crate::resolve::{Capabilities, ResolutionError, resolve_url};
use crate::size_key::{SizeKeyError, validate_size_key_set};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UrlSetError {
    #[error(transparent)]
    SizeKey(#[from] SizeKeyError),
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
}

/// An image that may be empty and may fall back to a placeholder.
pub trait VariantSource: Capabilities {
    /// Whether the image itself exists.
    fn is_present(&self) -> bool;

    /// Whether a placeholder stands in when the image is missing.
    fn has_placeholder(&self) -> bool {
        false
    }
}

/// Resolve every pair in `sizes` against `image`.
///
/// When `absolute_url` is given, each resolved URL is passed through it.
/// Returns an empty map when the image is missing and has no placeholder.
pub fn build_url_set<I, L, K>(
    image: &impl VariantSource,
    sizes: I,
    absolute_url: Option<&dyn Fn(&str) -> String>,
) -> Result<BTreeMap<String, String>, UrlSetError>
where
    I: IntoIterator<Item = (L, K)>,
    L: Into<String>,
    K: AsRef<str>,
{
    let sizes = validate_size_key_set(sizes)?;
    let mut urls = BTreeMap::new();
    if !image.is_present() && !image.has_placeholder() {
        return Ok(urls);
    }
    for rendition in &sizes {
        let mut url = resolve_url(image, rendition.size_key.as_str())?;
        if let Some(absolute_url) = absolute_url {
            url = absolute_url(&url);
        }
        urls.insert(rendition.label.clone(), url);
    }
    Ok(urls)
}

/// A rewriter joining relative URLs onto `base`.
///
/// Absolute inputs are returned as-is by the join. A join failure is logged and
/// leaves the URL unchanged.
pub fn absolute_url_fn(base: Url) -> impl Fn(&str) -> String {
    move |relative| match base.join(relative) {
        Ok(url) => url.to_string(),
        Err(err) => {
            tracing::warn!(%base, relative, error = %err, "could not build absolute URL");
            relative.to_string()
        }
    }
}
