//! Storage paths for image variants.
//!
//! Sized and filtered variants are namespaced differently:
//!
//! ```text
//! photos/cat.jpg
//! ├── sized    → __sized__/photos/cat-crop-400x400-70.jpg   (prefix directory)
//! └── filtered → photos/__filtered__/cat__invert__.jpg      (sibling directory)
//! ```
//!
//! Paths are storage keys, always `/`-separated, with every space removed so
//! they are usable verbatim as cache keys.

use crate::config::VariantConfig;
use crate::naming::NameEncoder;

/// Split a storage path into its containing folder and file name.
///
/// `"photos/cat.jpg"` → `("photos", "cat.jpg")`; `"cat.jpg"` → `("", "cat.jpg")`.
pub fn split_path(path: &str) -> (&str, &str) {
    match path.rsplit_once('/') {
        Some((folder, file_name)) => (folder, file_name),
        None => ("", path),
    }
}

/// Join storage path segments with `/`, skipping empty segments.
pub fn join_segments(segments: &[&str]) -> String {
    segments
        .iter()
        .map(|s| s.trim_end_matches('/'))
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

fn strip_spaces(path: String) -> String {
    path.replace(' ', "")
}

/// Builds storage paths from original image paths.
#[derive(Debug, Clone)]
pub struct PathBuilder {
    pub sized_dirname: String,
    pub filtered_dirname: String,
    pub encoder: NameEncoder,
}

impl PathBuilder {
    pub fn from_config(config: &VariantConfig) -> Self {
        Self {
            sized_dirname: config.sized_dirname.clone(),
            filtered_dirname: config.filtered_dirname.clone(),
            encoder: NameEncoder::from_config(config),
        }
    }

    pub fn with_encoder(mut self, encoder: NameEncoder) -> Self {
        self.encoder = encoder;
        self
    }

    /// `<sized_dirname>/<folder>/<sized name>`, spaces removed.
    pub fn sized_path(
        &self,
        image_path: &str,
        width: u32,
        height: u32,
        filename_key: &str,
    ) -> String {
        let (folder, file_name) = split_path(image_path);
        let name = self
            .encoder
            .sized_filename(file_name, width, height, filename_key);
        strip_spaces(join_segments(&[&self.sized_dirname, folder, &name]))
    }

    /// `<folder>/<filtered_dirname>/<filtered name>`, spaces removed.
    pub fn filtered_path(&self, image_path: &str, filename_key: &str) -> String {
        let (folder, file_name) = split_path(image_path);
        let name = self.encoder.filtered_filename(file_name, filename_key);
        strip_spaces(join_segments(&[folder, &self.filtered_dirname, &name]))
    }
}

impl Default for PathBuilder {
    fn default() -> Self {
        Self::from_config(&VariantConfig::default())
    }
}
