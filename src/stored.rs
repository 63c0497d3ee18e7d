//! Capability tree for an image kept in storage.
//!
//! A [`StoredImage`] is a storage name plus a shared [`ImageContext`]. It
//! answers size keys with URLs computed by the same [`PathBuilder`] a variant
//! generator uses to write files, so a resolved URL always points at the file
//! the generator produces:
//!
//! | Capability | Value |
//! |---|---|
//! | `url` | media URL + storage name |
//! | any configured sizer (`crop`, `thumbnail`) | dimension-keyed sized variants |
//! | `filters` (unfiltered images only) | configured filters, each a new [`StoredImage`] |
//!
//! Dimension tokens are checked strictly here: `400x300` must be two positive
//! integers, otherwise the lookup fails with missing dimensions.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::config::VariantConfig;
use crate::paths::{PathBuilder, join_segments};
use crate::resolve::{Capabilities, Capability, ResolutionError, SizedLookup, resolve_url};
use crate::size_key::{DIMENSION_SEPARATOR, URL_TOKEN};
use crate::url_set::VariantSource;

/// Capability name leading to the configured filters.
pub const FILTERS_CAPABILITY: &str = "filters";

/// Parse a `<width>x<height>` token into two positive integers.
pub fn parse_dimensions(token: &str) -> Option<(u32, u32)> {
    let (width, height) = token.split_once(DIMENSION_SEPARATOR)?;
    let width: u32 = width.parse().ok()?;
    let height: u32 = height.parse().ok()?;
    (width > 0 && height > 0).then_some((width, height))
}

/// Settings shared by every image resolved under one configuration.
#[derive(Debug, Clone)]
pub struct ImageContext {
    pub media_url: String,
    pub paths: PathBuilder,
    pub sizers: BTreeSet<String>,
    pub filters: BTreeSet<String>,
    /// Storage path of the placeholder image, if one is configured.
    pub placeholder: Option<String>,
}

impl ImageContext {
    pub fn from_config(config: &VariantConfig) -> Self {
        Self {
            media_url: config.media_url.clone(),
            paths: PathBuilder::from_config(config),
            sizers: config.variants.sizers.iter().cloned().collect(),
            filters: config.variants.filters.iter().cloned().collect(),
            placeholder: config
                .placeholder_image
                .as_deref()
                .map(|image| join_segments(&[&config.placeholder_dirname, image])),
        }
    }

    /// Join the media URL and a storage path.
    pub fn url(&self, path: &str) -> String {
        if self.media_url.is_empty() || self.media_url.ends_with('/') {
            format!("{}{}", self.media_url, path)
        } else {
            format!("{}/{}", self.media_url, path)
        }
    }
}

/// Whether capabilities produce URLs or bare storage paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Addressing {
    Url,
    Path,
}

/// An image file in storage, addressed by its storage-relative name.
#[derive(Debug, Clone)]
pub struct StoredImage {
    name: String,
    filtered: bool,
    addressing: Addressing,
    context: Arc<ImageContext>,
}

impl StoredImage {
    pub fn new(name: impl Into<String>, context: Arc<ImageContext>) -> Self {
        Self {
            name: name.into(),
            filtered: false,
            addressing: Addressing::Url,
            context,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The name capabilities are computed from: the image or its placeholder.
    fn source_name(&self) -> Option<&str> {
        if self.name.is_empty() {
            self.context.placeholder.as_deref()
        } else {
            Some(&self.name)
        }
    }

    fn address(&self, path: &str) -> String {
        match self.addressing {
            Addressing::Url => self.context.url(path),
            Addressing::Path => path.to_string(),
        }
    }

    fn derived(&self, name: String, filtered: bool) -> Self {
        Self {
            name,
            filtered,
            addressing: self.addressing,
            context: Arc::clone(&self.context),
        }
    }

    /// Storage path of the variant `size_key` designates.
    ///
    /// Resolves the same chain as a URL lookup, without the media URL prefix.
    pub fn variant_path(&self, size_key: &str) -> Result<String, ResolutionError> {
        let view = Self {
            addressing: Addressing::Path,
            ..self.clone()
        };
        resolve_url(&view, size_key)
    }
}

impl Capabilities for StoredImage {
    fn capability(&self, name: &str) -> Option<Capability> {
        let source = self.source_name()?;
        if name == URL_TOKEN {
            return Some(Capability::Url(self.address(source)));
        }
        if name == FILTERS_CAPABILITY && !self.filtered {
            return Some(Capability::Node(Box::new(FilterSet(
                self.derived(source.to_string(), false),
            ))));
        }
        if self.context.sizers.contains(name) {
            return Some(Capability::Sized(Box::new(SizedVariants {
                image: self.derived(source.to_string(), self.filtered),
                sizer: name.to_string(),
            })));
        }
        None
    }
}

impl VariantSource for StoredImage {
    fn is_present(&self) -> bool {
        !self.name.is_empty()
    }

    fn has_placeholder(&self) -> bool {
        self.context.placeholder.is_some()
    }
}

/// The `filters` node of an unfiltered image.
struct FilterSet(StoredImage);

impl Capabilities for FilterSet {
    fn capability(&self, name: &str) -> Option<Capability> {
        let image = &self.0;
        if !image.context.filters.contains(name) {
            return None;
        }
        let path = image.context.paths.filtered_path(&image.name, name);
        Some(Capability::Node(Box::new(image.derived(path, true))))
    }
}

/// Sized variants of one image for one sizer.
struct SizedVariants {
    image: StoredImage,
    sizer: String,
}

impl SizedLookup for SizedVariants {
    fn url_for(&self, dimensions: &str) -> Option<String> {
        let (width, height) = parse_dimensions(dimensions)?;
        let path = self
            .image
            .context
            .paths
            .sized_path(&self.image.name, width, height, &self.sizer);
        Some(self.image.address(&path))
    }
}
