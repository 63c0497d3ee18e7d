//! Size-key grammar and rendition key set validation.
//!
//! A size key is a `__`-delimited chain of capability names ending in a
//! terminal token:
//!
//! ```text
//! url                       → the original image URL
//! crop__400x400             → the `crop` sizer, keyed by `400x400`
//! filters__invert__url      → the `invert` filter's URL
//! filters__invert__crop__400x400
//! ```
//!
//! The grammar check is intentionally shallow: the last segment must be `url`
//! or contain an `x`. Whether `400x400` really is two positive integers is
//! decided later by whatever serves the sized capability (see
//! [`stored`](crate::stored)).
//!
//! A rendition key set is a collection of `(label, size key)` pairs. Validation
//! is all-or-nothing and returns a deduplicated set; iteration order is the
//! set's own order, not the input order.

use std::collections::BTreeSet;
use thiserror::Error;

/// Separator between size-key segments.
pub const DELIMITER: &str = "__";

/// Terminal segment requesting the URL of the current value.
pub const URL_TOKEN: &str = "url";

/// Separator between width and height in a dimension token.
pub const DIMENSION_SEPARATOR: char = 'x';

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SizeKeyError {
    #[error(
        "{input} is an invalid size key set. Size key sets must be a sequence of \
         [label, size key] pairs"
    )]
    InvalidSizeKeySet { input: String },
    #[error(
        "{size_key} is an invalid size. All sizes must be either 'url' or made up of \
         at least two segments separated by double underscores. Examples: \
         'crop__400x400', 'filters__invert__url'"
    )]
    InvalidSizeKey { size_key: String },
}

/// A size key that passed the grammar check.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SizeKey(String);

impl SizeKey {
    pub fn parse(raw: &str) -> Result<Self, SizeKeyError> {
        let last = raw.split(DELIMITER).last().unwrap_or(raw);
        if last == URL_TOKEN || last.contains(DIMENSION_SEPARATOR) {
            Ok(Self(raw.to_string()))
        } else {
            Err(SizeKeyError::InvalidSizeKey {
                size_key: raw.to_string(),
            })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(DELIMITER)
    }

    /// The dimension token, if the key ends in one.
    pub fn dimensions(&self) -> Option<&str> {
        self.segments()
            .last()
            .filter(|last| last.contains(DIMENSION_SEPARATOR))
    }
}

impl std::fmt::Display for SizeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One labeled entry of a rendition key set.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rendition {
    pub label: String,
    pub size_key: SizeKey,
}

/// A validated, deduplicated collection of renditions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenditionKeySet {
    entries: BTreeSet<Rendition>,
}

impl RenditionKeySet {
    /// Build a set from an untyped configuration value.
    ///
    /// The value must be an array whose elements are two-string arrays, e.g.
    /// `[["small", "thumbnail__100x100"], ["full", "url"]]`. Anything else is
    /// rejected as [`SizeKeyError::InvalidSizeKeySet`] naming the whole input.
    /// Elements are checked in order, so an invalid key ahead of a malformed
    /// element is reported as [`SizeKeyError::InvalidSizeKey`].
    pub fn from_value(value: &toml::Value) -> Result<Self, SizeKeyError> {
        let invalid_set = || SizeKeyError::InvalidSizeKeySet {
            input: value.to_string(),
        };
        let items = value.as_array().ok_or_else(invalid_set)?;
        let entries = items
            .iter()
            .map(|item| match item.as_array().map(Vec::as_slice) {
                Some([label, size_key]) => match (label.as_str(), size_key.as_str()) {
                    (Some(label), Some(size_key)) => Ok(Rendition {
                        label: label.to_string(),
                        size_key: SizeKey::parse(size_key)?,
                    }),
                    _ => Err(invalid_set()),
                },
                _ => Err(invalid_set()),
            })
            .collect::<Result<BTreeSet<_>, _>>()?;
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rendition> {
        self.entries.iter()
    }

    /// Borrowed `(label, size key)` pairs, suitable for re-validation.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|r| (r.label.as_str(), r.size_key.as_str()))
    }
}

impl<'a> IntoIterator for &'a RenditionKeySet {
    type Item = &'a Rendition;
    type IntoIter = std::collections::btree_set::Iter<'a, Rendition>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Validate `(label, size key)` pairs into a [`RenditionKeySet`].
///
/// Fails on the first invalid key; duplicate pairs collapse into one.
pub fn validate_size_key_set<I, L, K>(pairs: I) -> Result<RenditionKeySet, SizeKeyError>
where
    I: IntoIterator<Item = (L, K)>,
    L: Into<String>,
    K: AsRef<str>,
{
    let entries = pairs
        .into_iter()
        .map(|(label, size_key)| {
            Ok(Rendition {
                label: label.into(),
                size_key: SizeKey::parse(size_key.as_ref())?,
            })
        })
        .collect::<Result<BTreeSet<_>, SizeKeyError>>()?;
    Ok(RenditionKeySet { entries })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(pairs: &[(&str, &str)]) -> RenditionKeySet {
        validate_size_key_set(pairs.iter().copied()).unwrap()
    }

    #[test]
    fn accepts_dimension_terminal() {
        assert!(SizeKey::parse("crop__400x400").is_ok());
    }

    #[test]
    fn accepts_url_terminal_after_chain() {
        assert!(SizeKey::parse("filters__invert__url").is_ok());
    }

    #[test]
    fn accepts_bare_url() {
        assert!(SizeKey::parse("url").is_ok());
    }

    #[test]
    fn dimension_check_is_shallow() {
        assert!(SizeKey::parse("crop__4xy").is_ok());
    }

    #[test]
    fn triple_underscore_leaves_underscore_in_last_segment() {
        for raw in ["thumbnail___url", "filters__invert___url"] {
            assert_eq!(
                SizeKey::parse(raw),
                Err(SizeKeyError::InvalidSizeKey {
                    size_key: raw.to_string()
                }),
                "{raw}"
            );
        }
    }

    #[test]
    fn rejects_key_without_delimiter_or_terminal() {
        let err = SizeKey::parse("crop_400_400").unwrap_err();
        assert_eq!(
            err,
            SizeKeyError::InvalidSizeKey {
                size_key: "crop_400_400".into()
            }
        );
        assert!(err.to_string().contains("crop__400x400"));
    }

    #[test]
    fn dimensions_returns_terminal_token() {
        let key = SizeKey::parse("filters__invert__crop__400x300").unwrap();
        assert_eq!(key.dimensions(), Some("400x300"));
        let key = SizeKey::parse("filters__invert__url").unwrap();
        assert_eq!(key.dimensions(), None);
    }

    #[test]
    fn segments_split_on_double_underscore() {
        let key = SizeKey::parse("filters__invert__url").unwrap();
        assert_eq!(
            key.segments().collect::<Vec<_>>(),
            vec!["filters", "invert", "url"]
        );
    }

    #[test]
    fn duplicate_pairs_collapse() {
        let twice = set(&[("small", "crop__100x100"), ("small", "crop__100x100")]);
        let once = set(&[("small", "crop__100x100")]);
        assert_eq!(twice, once);
        assert_eq!(twice.len(), 1);
    }

    #[test]
    fn same_label_different_keys_both_kept() {
        let s = set(&[("small", "crop__100x100"), ("small", "thumbnail__100x100")]);
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn validation_is_idempotent() {
        let first = set(&[
            ("large", "url"),
            ("medium", "crop__400x400"),
            ("small", "thumbnail__100x100"),
            ("medium", "crop__400x400"),
        ]);
        let second = validate_size_key_set(first.pairs()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn one_bad_key_fails_the_whole_set() {
        let result =
            validate_size_key_set([("ok", "crop__400x400"), ("bad", "thumbnail"), ("ok2", "url")]);
        assert!(matches!(
            result,
            Err(SizeKeyError::InvalidSizeKey { size_key }) if size_key == "thumbnail"
        ));
    }

    #[test]
    fn empty_set_is_valid() {
        let s = validate_size_key_set(Vec::<(String, String)>::new()).unwrap();
        assert!(s.is_empty());
    }

    // =========================================================================
    // from_value tests
    // =========================================================================

    fn value(src: &str) -> toml::Value {
        let doc: toml::Value = toml::from_str(&format!("v = {src}")).unwrap();
        doc.get("v").unwrap().clone()
    }

    #[test]
    fn from_value_accepts_pairs() {
        let s = RenditionKeySet::from_value(&value(
            r#"[["full", "url"], ["small", "thumbnail__100x100"]]"#,
        ))
        .unwrap();
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn from_value_rejects_flat_list_of_strings() {
        let result = RenditionKeySet::from_value(&value(r#"["url", "crop__400x400"]"#));
        assert!(matches!(
            result,
            Err(SizeKeyError::InvalidSizeKeySet { input }) if input.contains("crop__400x400")
        ));
    }

    #[test]
    fn from_value_rejects_triples() {
        let result = RenditionKeySet::from_value(&value(r#"[["a", "url", "extra"]]"#));
        assert!(matches!(result, Err(SizeKeyError::InvalidSizeKeySet { .. })));
    }

    #[test]
    fn from_value_rejects_non_string_members() {
        let result = RenditionKeySet::from_value(&value(r#"[["a", 400]]"#));
        assert!(matches!(result, Err(SizeKeyError::InvalidSizeKeySet { .. })));
    }

    #[test]
    fn from_value_rejects_scalar() {
        let result = RenditionKeySet::from_value(&value(r#""url""#));
        assert!(matches!(result, Err(SizeKeyError::InvalidSizeKeySet { .. })));
    }

    #[test]
    fn from_value_reports_bad_key_not_bad_shape() {
        let result = RenditionKeySet::from_value(&value(r#"[["a", "crop_400_400"]]"#));
        assert!(matches!(result, Err(SizeKeyError::InvalidSizeKey { .. })));
    }

    #[test]
    fn from_value_reports_first_failing_element() {
        let result = RenditionKeySet::from_value(&value(r#"[["a", "crop_400_400"], "flat"]"#));
        assert_eq!(
            result,
            Err(SizeKeyError::InvalidSizeKey {
                size_key: "crop_400_400".to_string()
            })
        );
        let result = RenditionKeySet::from_value(&value(r#"["flat", ["a", "crop_400_400"]]"#));
        assert!(matches!(result, Err(SizeKeyError::InvalidSizeKeySet { .. })));
    }
}
