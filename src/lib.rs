//! # Rendition Keys
//!
//! Naming, locating and addressing derived image variants. An image stored
//! at `photos/cat.jpg` has sized variants (crops, thumbnails) and filtered
//! variants (inverted, grayscale). This crate decides what those files are
//! called, where they live, and which URL a template gets for each one.
//!
//! # Size Keys
//!
//! A size key is a chain of capability names separated by `__`:
//!
//! ```text
//! url                              the original
//! crop__400x400                    a 400x400 crop
//! filters__invert__url             the inverted copy
//! filters__invert__crop__400x400   a crop of the inverted copy
//! ```
//!
//! Templates ask for named *rendition key sets*, lists of `[label, size key]`
//! pairs configured under `[rendition_key_sets]` in `config.toml`, and get
//! back a label → URL map for one image.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`size_key`] | Size key grammar and validated rendition key sets |
//! | [`naming`] | Variant filenames: `stem-key-WxH-q.ext` and `stem__key__.ext` |
//! | [`paths`] | Storage paths of sized and filtered variants |
//! | [`resolve`] | Walks a size key through an image's capabilities to a URL |
//! | [`stored`] | The capability tree of a stored image |
//! | [`url_set`] | Label → URL maps for a rendition key set |
//! | [`registry`] | Named rendition key sets from config, validated on first use |
//! | [`format`] | Upload classification: sniffed MIME type → format identifier |
//! | [`plan`] | Every variant path a set needs for a directory of originals |
//! | [`config`] | `config.toml` loading, merging over stock defaults, validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Shallow Key Validation
//!
//! [`size_key::validate_size_key_set`] only checks the *shape* of each key:
//! its last segment is `url` or contains an `x`. Whether `crop` exists on a
//! given image is only known when the key is resolved, so that check lives in
//! [`resolve::resolve_url`] and fails with a typed
//! [`resolve::ResolutionError`] naming the segment that broke.
//!
//! ## Closed Capability Trees
//!
//! Resolution walks values implementing [`resolve::Capabilities`]. Each
//! capability is a nested node, a sized lookup keyed by `WxH`, or a final URL.
//! Nothing is looked up by reflection, so what an image exposes is exactly what
//! its `capability` match arms list.
//!
//! ## Deterministic Names
//!
//! Variant filenames depend only on the original name, the dimensions, the key
//! and the configured quality. An optional post-processor
//! ([`naming::KeyHook`]) can hash the variant key so storage names stay
//! opaque; the hook is applied to both sized and filtered names.

pub mod config;
pub mod format;
pub mod naming;
pub mod output;
pub mod paths;
pub mod plan;
pub mod registry;
pub mod resolve;
pub mod size_key;
pub mod stored;
pub mod url_set;

#[cfg(test)]
pub(crate) mod test_helpers;
