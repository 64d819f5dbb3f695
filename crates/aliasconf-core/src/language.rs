//! Language registry
//!
//! A flat, alias-aware map from language names to [`LanguageConfig`] records.
//! Aliases share storage with their canonical name: an update made through
//! any name is visible through all of them.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::value::Value;

/// Extension reported for unregistered languages
pub const DEFAULT_EXTENSION: &str = "txt";

/// How a language's sources are named, built and run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageConfig {
    #[serde(alias = "file_extension")]
    pub extension: String,
    pub run_command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compile_command: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
}

impl LanguageConfig {
    pub fn new(extension: impl Into<String>, run_command: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
            run_command: run_command.into(),
            compile_command: None,
            aliases: Vec::new(),
        }
    }

    pub fn with_compile_command(mut self, command: impl Into<String>) -> Self {
        self.compile_command = Some(command.into());
        self
    }

    pub fn with_aliases<S: Into<String>>(mut self, aliases: impl IntoIterator<Item = S>) -> Self {
        self.aliases = aliases.into_iter().map(Into::into).collect();
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Slot {
    canonical: String,
    config: LanguageConfig,
}

/// Registry of languages keyed by canonical name and alias
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LanguageRegistry {
    slots: Vec<Slot>,
    names: IndexMap<String, usize>,
}

impl LanguageRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry preloaded with python, pypy, cpp and rust
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register_language(
            "python",
            LanguageConfig::new("py", "python3").with_aliases(["py", "python3"]),
        );
        registry.register_language(
            "pypy",
            LanguageConfig::new("py", "pypy3").with_aliases(["pypy3"]),
        );
        registry.register_language(
            "cpp",
            LanguageConfig::new("cpp", "./a.out")
                .with_compile_command("g++ -std=c++17 -O2 -o a.out main.cpp")
                .with_aliases(["c++", "cxx"]),
        );
        registry.register_language(
            "rust",
            LanguageConfig::new("rs", "./target/release/main")
                .with_compile_command("cargo build --release")
                .with_aliases(["rs"]),
        );
        registry
    }

    /// Build a registry from a mapping of canonical name to record
    pub fn from_value(value: &Value) -> Result<Self> {
        let mut registry = Self::new();
        registry.extend_from_value(value)?;
        Ok(registry)
    }

    /// Register every record of a mapping of canonical name to record
    pub fn extend_from_value(&mut self, value: &Value) -> Result<()> {
        let entries = value.as_mapping().ok_or_else(|| {
            Error::parse(format!(
                "Language section must be a mapping, got {}",
                value.type_name()
            ))
        })?;

        for (name, entry) in entries {
            let config = serde_json::to_value(entry)
                .and_then(serde_json::from_value::<LanguageConfig>)
                .map_err(|e| {
                    Error::parse(format!("Invalid language record: {}", e)).with_path(name.clone())
                })?;
            self.register_language(name.clone(), config);
        }
        Ok(())
    }

    /// Store `config` under `name` and under each of its aliases.
    ///
    /// Registering a canonical name again replaces its record in place, and
    /// aliases it no longer lists stop resolving to it.
    pub fn register_language(&mut self, name: impl Into<String>, config: LanguageConfig) {
        let name = name.into();
        let slot = match self.names.get(&name).copied() {
            Some(idx) if self.slots[idx].canonical == name => {
                self.names
                    .retain(|n, i| *i != idx || *n == name || config.aliases.contains(n));
                self.slots[idx].config = config;
                idx
            }
            existing => {
                if existing.is_some() {
                    log::warn!("Language '{}' shadows an alias of another language", name);
                }
                self.slots.push(Slot {
                    canonical: name.clone(),
                    config,
                });
                self.names.insert(name.clone(), self.slots.len() - 1);
                self.slots.len() - 1
            }
        };

        let aliases = self.slots[slot].config.aliases.clone();
        for alias in aliases {
            if let Some(previous) = self.names.insert(alias.clone(), slot) {
                if previous != slot {
                    log::warn!(
                        "Alias '{}' moved from '{}' to '{}'",
                        alias,
                        self.slots[previous].canonical,
                        name
                    );
                }
            }
        }
        log::trace!("Registered language '{}'", name);
    }

    pub fn get_language_config(&self, name: &str) -> Option<&LanguageConfig> {
        self.names.get(name).map(|&idx| &self.slots[idx].config)
    }

    pub fn get_language_config_mut(&mut self, name: &str) -> Option<&mut LanguageConfig> {
        let idx = *self.names.get(name)?;
        Some(&mut self.slots[idx].config)
    }

    /// Canonical name of whatever `name` resolves to
    pub fn canonical_name(&self, name: &str) -> Option<&str> {
        self.names
            .get(name)
            .map(|&idx| self.slots[idx].canonical.as_str())
    }

    pub fn get_file_extension(&self, name: &str) -> &str {
        self.get_language_config(name)
            .map(|c| c.extension.as_str())
            .unwrap_or(DEFAULT_EXTENSION)
    }

    /// Run command, or the name itself when unregistered
    pub fn get_run_command<'a>(&'a self, name: &'a str) -> &'a str {
        self.get_language_config(name)
            .map(|c| c.run_command.as_str())
            .unwrap_or(name)
    }

    pub fn get_compile_command(&self, name: &str) -> Option<&str> {
        self.get_language_config(name)
            .and_then(|c| c.compile_command.as_deref())
    }

    /// Canonical names in registration order; aliases are not listed
    pub fn list_supported_languages(&self) -> Vec<&str> {
        self.iter().map(|(name, _)| name).collect()
    }

    /// Reachable canonical entries in registration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &LanguageConfig)> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(idx, slot)| self.names.get(&slot.canonical) == Some(idx))
            .map(|(_, slot)| (slot.canonical.as_str(), &slot.config))
    }

    pub fn is_supported(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }
}
