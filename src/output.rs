//! CLI output formatting.
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.
//!
//! # Output Format
//!
//! ## Check
//!
//! ```text
//! Rendition key sets
//! 001 headshot (2 renditions)
//!     full_size: url
//!     small: thumbnail__100x100
//! 002 broken
//!     Error: rendition_key_sets.broken: ["url"] is an invalid size key set. ...
//! ```
//!
//! ## Plan
//!
//! ```text
//! 001 photos/cat.jpg (JPEG)
//!     medium: __sized__/photos/cat-crop-400x400-70.jpg
//! 002 notes.txt
//!     Skipped: Could not determine the format of the stream
//!
//! Planned 1 image, skipped 1 file
//! ```

use std::collections::BTreeMap;

use crate::plan::{ImagePlan, PlanOutcome};
use crate::registry::RegistryError;
use crate::size_key::RenditionKeySet;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

/// Lines for `check`: every named set with its renditions or its error.
pub fn format_check_output(
    results: &[(&str, Result<&RenditionKeySet, RegistryError>)],
) -> Vec<String> {
    let mut lines = vec!["Rendition key sets".to_string()];
    if results.is_empty() {
        lines.push(format!("{}(none configured)", indent(1)));
        return lines;
    }
    for (i, (name, result)) in results.iter().enumerate() {
        match result {
            Ok(set) => {
                lines.push(format!(
                    "{} {} ({})",
                    format_index(i + 1),
                    name,
                    plural(set.len(), "rendition")
                ));
                for rendition in set.iter() {
                    lines.push(format!(
                        "{}{}: {}",
                        indent(1),
                        rendition.label,
                        rendition.size_key
                    ));
                }
            }
            Err(err) => {
                lines.push(format!("{} {}", format_index(i + 1), name));
                lines.push(format!("{}Error: {}", indent(1), err));
            }
        }
    }
    lines
}

pub fn print_check_output(results: &[(&str, Result<&RenditionKeySet, RegistryError>)]) {
    for line in format_check_output(results) {
        println!("{}", line);
    }
}

/// Lines for `plan`: each file with its variant paths or skip reason.
pub fn format_plan_output(plans: &[ImagePlan]) -> Vec<String> {
    let mut lines = Vec::new();
    let mut planned = 0;
    for (i, plan) in plans.iter().enumerate() {
        match &plan.outcome {
            PlanOutcome::Planned { format, variants } => {
                planned += 1;
                lines.push(format!("{} {} ({})", format_index(i + 1), plan.path, format));
                for (label, path) in variants {
                    lines.push(format!("{}{}: {}", indent(1), label, path));
                }
            }
            PlanOutcome::Skipped { reason } => {
                lines.push(format!("{} {}", format_index(i + 1), plan.path));
                lines.push(format!("{}Skipped: {}", indent(1), reason));
            }
        }
    }
    lines.push(String::new());
    lines.push(format!(
        "Planned {}, skipped {}",
        plural(planned, "image"),
        plural(plans.len() - planned, "file")
    ));
    lines
}

pub fn print_plan_output(plans: &[ImagePlan]) {
    for line in format_plan_output(plans) {
        println!("{}", line);
    }
}

/// Pretty JSON object for a label → URL map.
pub fn format_url_set(urls: &BTreeMap<String, String>) -> String {
    serde_json::to_string_pretty(urls).unwrap_or_else(|_| "{}".to_string())
}
