//! Named rendition key sets from configuration.
//!
//! The registry is built once from [`VariantConfig::rendition_key_sets`] and
//! never changes afterwards. Each set is validated the first time it is asked
//! for and the outcome is memoized, so a broken set in `config.toml` surfaces
//! as an error on first use instead of when the config loads.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use thiserror::Error;

use crate::config::VariantConfig;
use crate::size_key::{RenditionKeySet, SizeKeyError};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("No rendition key set exists at rendition_key_sets.{name} in config.toml")]
    UnknownRenditionSet { name: String },
    #[error("rendition_key_sets.{name}: {source}")]
    Invalid {
        name: String,
        #[source]
        source: SizeKeyError,
    },
}

#[derive(Debug)]
struct Entry {
    raw: toml::Value,
    validated: OnceLock<Result<RenditionKeySet, SizeKeyError>>,
}

/// Read-only lookup from set name to validated [`RenditionKeySet`].
#[derive(Debug, Default)]
pub struct RenditionKeyRegistry {
    entries: BTreeMap<String, Entry>,
}

impl RenditionKeyRegistry {
    pub fn from_config(config: &VariantConfig) -> Self {
        let entries = config
            .rendition_key_sets
            .iter()
            .map(|(name, raw)| {
                let entry = Entry {
                    raw: raw.clone(),
                    validated: OnceLock::new(),
                };
                (name.clone(), entry)
            })
            .collect();
        Self { entries }
    }

    /// The validated set registered under `name`.
    pub fn get(&self, name: &str) -> Result<&RenditionKeySet, RegistryError> {
        let entry = self
            .entries
            .get(name)
            .ok_or_else(|| RegistryError::UnknownRenditionSet {
                name: name.to_string(),
            })?;
        let validated = entry.validated.get_or_init(|| {
            tracing::debug!(name, "validating rendition key set");
            RenditionKeySet::from_value(&entry.raw)
        });
        validated.as_ref().map_err(|source| RegistryError::Invalid {
            name: name.to_string(),
            source: source.clone(),
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Validate every registered set, returning each outcome by name.
    pub fn check_all(&self) -> Vec<(&str, Result<&RenditionKeySet, RegistryError>)> {
        self.names().map(|name| (name, self.get(name))).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(sets: &str) -> RenditionKeyRegistry {
        let config: VariantConfig =
            toml::from_str(&format!("[rendition_key_sets]\n{sets}")).unwrap();
        RenditionKeyRegistry::from_config(&config)
    }

    #[test]
    fn get_returns_validated_set() {
        let reg = registry(
            r#"headshot = [["full", "url"], ["small", "thumbnail__100x100"], ["full", "url"]]"#,
        );
        let set = reg.get("headshot").unwrap();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn unknown_name_reports_config_path() {
        let reg = registry("");
        let err = reg.get("missing").unwrap_err();
        assert_eq!(
            err,
            RegistryError::UnknownRenditionSet {
                name: "missing".into()
            }
        );
        assert!(err.to_string().contains("rendition_key_sets.missing"));
    }

    #[test]
    fn malformed_set_fails_on_use() {
        let reg = registry(
            r#"
good = [["full", "url"]]
flat = ["url", "crop__400x400"]
"#,
        );
        assert!(reg.get("good").is_ok());
        assert!(matches!(
            reg.get("flat"),
            Err(RegistryError::Invalid {
                source: SizeKeyError::InvalidSizeKeySet { .. },
                ..
            })
        ));
    }

    #[test]
    fn invalid_key_fails_on_use() {
        let reg = registry(r#"bad = [["x", "crop_400_400"]]"#);
        let err = reg.get("bad").unwrap_err();
        assert!(err.to_string().starts_with("rendition_key_sets.bad:"));
        assert!(matches!(
            err,
            RegistryError::Invalid {
                source: SizeKeyError::InvalidSizeKey { .. },
                ..
            }
        ));
    }

    #[test]
    fn repeated_get_returns_same_set() {
        let reg = registry(r#"a = [["full", "url"]]"#);
        let first = reg.get("a").unwrap() as *const RenditionKeySet;
        let second = reg.get("a").unwrap() as *const RenditionKeySet;
        assert_eq!(first, second);
    }

    #[test]
    fn check_all_reports_every_set() {
        let reg = registry(
            r#"
a = [["full", "url"]]
b = "url"
"#,
        );
        let results = reg.check_all();
        assert_eq!(results.len(), 2);
        assert!(results[0].1.is_ok());
        assert!(results[1].1.is_err());
    }

    #[test]
    fn registry_is_shareable_across_threads() {
        let reg = std::sync::Arc::new(registry(r#"a = [["full", "url"]]"#));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let reg = std::sync::Arc::clone(&reg);
                std::thread::spawn(move || reg.get("a").unwrap().len())
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), 1);
        }
    }
}
