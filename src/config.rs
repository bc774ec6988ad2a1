//! Parser configuration.
//!
//! `defaults/oboformat.default.toml` is embedded so that the documented
//! defaults and runtime behavior stay in sync. Callers layer their own files,
//! `OBOFORMAT__*` environment variables or single overrides on top via
//! [`Loader`].

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat, ValueKind};
use serde::Deserialize;
use std::path::Path;

use crate::error::Result;

const DEFAULT_TOML: &str = include_str!("../defaults/oboformat.default.toml");

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct OboConfig {
    pub parser: ParserConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ParserConfig {
    pub follow_imports: bool,
    pub instance_stanzas: InstancePolicy,
    pub add_default_namespace: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            follow_imports: false,
            instance_stanzas: InstancePolicy::Abandon,
            add_default_namespace: true,
        }
    }
}

/// Handling of `[Instance]` stanzas, which the grammar does not support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InstancePolicy {
    /// Stop reading at the first instance stanza and keep what was parsed.
    Abandon,
    /// Skip the instance stanza and continue with the next stanza.
    Skip,
}

/// Stacks parser settings: the embedded defaults first, then whatever the
/// caller layers on top. Later layers win key by key.
#[derive(Debug, Clone)]
pub struct Loader {
    layers: ConfigBuilder<DefaultState>,
}

impl Loader {
    pub fn new() -> Self {
        let defaults = File::from_str(DEFAULT_TOML, FileFormat::Toml);
        Self {
            layers: Config::builder().add_source(defaults),
        }
    }

    // every settings file is TOML, mandatory or not
    fn layer_file(mut self, path: &Path, required: bool) -> Self {
        let file = File::from(path).format(FileFormat::Toml).required(required);
        self.layers = self.layers.add_source(file);
        self
    }

    /// Settings file that must exist, e.g. a project's `oboformat.toml`.
    pub fn with_file(self, path: impl AsRef<Path>) -> Self {
        self.layer_file(path.as_ref(), true)
    }

    /// Settings file that is skipped when missing, e.g. a per-user file.
    pub fn with_optional_file(self, path: impl AsRef<Path>) -> Self {
        self.layer_file(path.as_ref(), false)
    }

    /// `OBOFORMAT__PARSER__FOLLOW_IMPORTS=true` and friends. Values are
    /// parsed, so booleans need no quoting.
    pub fn with_environment(mut self) -> Self {
        let env = Environment::with_prefix("OBOFORMAT")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true);
        self.layers = self.layers.add_source(env);
        self
    }

    /// Pins one dotted key, e.g. `parser.instance_stanzas` to `"skip"`.
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self>
    where
        I: Into<ValueKind>,
    {
        self.layers = self.layers.set_override(key, value)?;
        Ok(self)
    }

    /// Merges the layers into an [`OboConfig`]. An unknown instance policy or
    /// a value of the wrong type is a [`crate::OboError::Config`].
    pub fn build(self) -> Result<OboConfig> {
        let merged = self.layers.build()?;
        Ok(merged.try_deserialize()?)
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// The settings a [`crate::Parser::new`] runs with, read through the same
/// path as layered settings.
pub fn load_defaults() -> Result<OboConfig> {
    Loader::new().build()
}
