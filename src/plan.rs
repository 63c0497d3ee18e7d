//! Variant planning for a directory of originals.
//!
//! Walks a storage root, classifies every file and lists the storage path of
//! each variant a rendition key set needs. This is what a generation pipeline
//! consumes to know which files to write:
//!
//! ```text
//! photos/cat.jpg (JPEG)
//!     medium: __sized__/photos/cat-crop-400x400-70.jpg
//!     inverted: photos/__filtered__/cat__invert__.jpg
//! ```
//!
//! Directories holding generated variants (the sized, filtered and
//! placeholder directories) are not descended into. Files are classified in
//! parallel with [rayon](https://docs.rs/rayon); results keep walk order.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;
use thiserror::Error;
use walkdir::WalkDir;

use crate::config::VariantConfig;
use crate::format::{FormatError, FormatId, Sniffer, classify_stream};
use crate::resolve::ResolutionError;
use crate::size_key::RenditionKeySet;
use crate::stored::{ImageContext, StoredImage};

#[derive(Error, Debug)]
pub enum PlanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("{path}: {source}")]
    Resolution {
        path: String,
        #[source]
        source: ResolutionError,
    },
}

/// What happened to one file under the root.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanOutcome {
    /// A supported image; variant storage paths by label.
    Planned {
        format: FormatId,
        variants: BTreeMap<String, String>,
    },
    /// Not an image this pipeline handles.
    Skipped { reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImagePlan {
    /// Storage name, `/`-separated and relative to the root.
    pub path: String,
    pub outcome: PlanOutcome,
}

/// Storage name of `path` relative to `root`.
fn storage_name(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Files under `root`, in file-name order, skipping generated-variant directories.
fn original_files(root: &Path, config: &VariantConfig) -> Result<Vec<PathBuf>, PlanError> {
    let generated = [
        config.sized_dirname.as_str(),
        config.filtered_dirname.as_str(),
        config.placeholder_dirname.as_str(),
    ];
    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !entry.file_type().is_dir()
                || !entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| generated.contains(&name))
        });
    for entry in walker {
        let entry = entry?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Plan every variant of `set` for the originals under `root`.
pub fn plan_directory(
    root: &Path,
    set: &RenditionKeySet,
    config: &VariantConfig,
    sniffer: &dyn Sniffer,
) -> Result<Vec<ImagePlan>, PlanError> {
    let context = Arc::new(ImageContext::from_config(config));
    let files = original_files(root, config)?;
    files
        .par_iter()
        .map(|file| plan_file(root, file, set, &context, sniffer))
        .collect()
}

fn plan_file(
    root: &Path,
    file: &Path,
    set: &RenditionKeySet,
    context: &Arc<ImageContext>,
    sniffer: &dyn Sniffer,
) -> Result<ImagePlan, PlanError> {
    let path = storage_name(root, file);
    let mut stream = File::open(file)?;
    let format = match classify_stream(sniffer, &mut stream) {
        Ok((format, _)) => format,
        Err(FormatError::Io(err)) => return Err(err.into()),
        Err(err) => {
            tracing::warn!(%path, error = %err, "skipping file");
            return Ok(ImagePlan {
                path,
                outcome: PlanOutcome::Skipped {
                    reason: err.to_string(),
                },
            });
        }
    };

    let image = StoredImage::new(path.clone(), Arc::clone(context));
    let variants = set
        .iter()
        .map(|rendition| {
            image
                .variant_path(rendition.size_key.as_str())
                .map(|variant| (rendition.label.clone(), variant))
                .map_err(|source| PlanError::Resolution {
                    path: path.clone(),
                    source,
                })
        })
        .collect::<Result<BTreeMap<_, _>, _>>()?;
    Ok(ImagePlan {
        path,
        outcome: PlanOutcome::Planned { format, variants },
    })
}
