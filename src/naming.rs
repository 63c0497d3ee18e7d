//! Deterministic file names for image variants.
//!
//! Two templates, chosen so sized artifacts, filtered artifacts and originals
//! can be told apart by name alone:
//!
//! - Sized: `photo.jpg` → `photo-crop-400x300-70.jpg`
//!   (`<stem>-<key>-<w>x<h>[-<quality>].<ext>`)
//! - Filtered: `photo.png` → `photo__invert__.png`
//!   (`<stem>__<key>__.<ext>`)
//!
//! Every parameter that affects the output pixels is embedded in the name, so
//! the same inputs always give the same name and a stored file with that name
//! can be reused without regenerating it.
//!
//! ## Quality suffix
//!
//! Only lossy formats (`jpg`, `jpeg`, `webp`, case-insensitive) carry the
//! quality suffix. WebP uses its own quality setting; the others use the JPEG
//! one.
//!
//! ## Key hook
//!
//! The variant-identifying part of the name (the "filename key") passes through
//! a [`KeyHook`] before assembly. The default is the identity; the digest hooks
//! turn keys into opaque, fixed-length strings.

use crate::config::{PostProcessor, VariantConfig};
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::Arc;

/// Extension assumed when a file name has no `.`.
pub const DEFAULT_EXTENSION: &str = "jpg";

/// Length of the [`KeyHook::Sha256Short`] digest, in hex characters.
const SHORT_DIGEST_LEN: usize = 16;

/// Post-processing applied to every filename key.
#[derive(Clone, Default)]
pub enum KeyHook {
    #[default]
    Identity,
    /// Full SHA-256 hex digest of the key.
    Sha256,
    /// First 16 hex characters of the SHA-256 digest.
    Sha256Short,
    Custom(Arc<dyn Fn(&str) -> String + Send + Sync>),
}

impl KeyHook {
    pub fn custom(hook: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        Self::Custom(Arc::new(hook))
    }

    pub fn apply(&self, key: &str) -> String {
        match self {
            Self::Identity => key.to_string(),
            Self::Sha256 => format!("{:x}", Sha256::digest(key.as_bytes())),
            Self::Sha256Short => {
                let mut digest = format!("{:x}", Sha256::digest(key.as_bytes()));
                digest.truncate(SHORT_DIGEST_LEN);
                digest
            }
            Self::Custom(hook) => hook(key),
        }
    }
}

impl From<PostProcessor> for KeyHook {
    fn from(processor: PostProcessor) -> Self {
        match processor {
            PostProcessor::None => Self::Identity,
            PostProcessor::Sha256 => Self::Sha256,
            PostProcessor::Sha256_16 => Self::Sha256Short,
        }
    }
}

impl fmt::Debug for KeyHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identity => f.write_str("Identity"),
            Self::Sha256 => f.write_str("Sha256"),
            Self::Sha256Short => f.write_str("Sha256Short"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// A file name split on its last `.`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitName<'a> {
    pub stem: &'a str,
    pub ext: &'a str,
}

/// Split a file name into stem and extension.
///
/// - `"photo.jpg"` → stem `"photo"`, ext `"jpg"`
/// - `"archive.tar.gz"` → stem `"archive.tar"`, ext `"gz"`
/// - `"noext"` → stem `"noext"`, ext `"jpg"` (the default)
pub fn split_file_name(file_name: &str) -> SplitName<'_> {
    match file_name.rsplit_once('.') {
        Some((stem, ext)) => SplitName { stem, ext },
        None => SplitName {
            stem: file_name,
            ext: DEFAULT_EXTENSION,
        },
    }
}

/// Encodes variant parameters into file names.
#[derive(Debug, Clone)]
pub struct NameEncoder {
    pub jpeg_quality: u32,
    pub webp_quality: u32,
    pub hook: KeyHook,
}

impl NameEncoder {
    pub fn from_config(config: &VariantConfig) -> Self {
        Self {
            jpeg_quality: config.quality.jpeg,
            webp_quality: config.quality.webp,
            hook: config.post_processor.into(),
        }
    }

    /// Replace the key hook, e.g. with a [`KeyHook::Custom`] closure.
    pub fn with_hook(mut self, hook: KeyHook) -> Self {
        self.hook = hook;
        self
    }

    /// Quality embedded in names for `ext`, or `None` for lossless formats.
    pub fn quality_for(&self, ext: &str) -> Option<u32> {
        let ext = ext.to_ascii_lowercase();
        match ext.as_str() {
            "webp" => Some(self.webp_quality),
            "jpg" | "jpeg" => Some(self.jpeg_quality),
            _ => None,
        }
    }

    /// Name of a resized/cropped variant of `file_name`.
    pub fn sized_filename(
        &self,
        file_name: &str,
        width: u32,
        height: u32,
        filename_key: &str,
    ) -> String {
        let SplitName { stem, ext } = split_file_name(file_name);
        let mut resized_key = format!("{filename_key}-{width}x{height}");
        if let Some(quality) = self.quality_for(ext) {
            resized_key.push_str(&format!("-{quality}"));
        }
        format!("{stem}-{}.{ext}", self.hook.apply(&resized_key))
    }

    /// Name of a filtered variant of `file_name`.
    pub fn filtered_filename(&self, file_name: &str, filename_key: &str) -> String {
        let SplitName { stem, ext } = split_file_name(file_name);
        format!("{stem}__{}__.{ext}", self.hook.apply(filename_key))
    }
}

impl Default for NameEncoder {
    fn default() -> Self {
        Self::from_config(&VariantConfig::default())
    }
}
