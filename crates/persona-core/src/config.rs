//! Configuration for the resolver, the composer and property storage
//!
//! Loaded from TOML, then overridden by `PERSONA_<SECTION>_<KEY>`
//! environment variables, then validated:
//!
//! ```toml
//! [resolver]
//! boolean_is_prefix = true
//! strict_setters = true
//!
//! [composition]
//! cache_policy = "unbounded"
//! require_complete_roles = true
//! max_roles = 64
//!
//! [properties]
//! storage = "durable"
//! ```

use crate::errors::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonaConfig {
    /// Property descriptor resolution
    pub resolver: ResolverConfig,
    /// Composite type synthesis
    pub composition: CompositionConfig,
    /// Property storage
    pub properties: PropertyConfig,
}

/// Property descriptor resolution settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Accept `isX` getters for boolean properties
    pub boolean_is_prefix: bool,
    /// Treat an invalid setter signature as a configuration error;
    /// otherwise the setter is ignored and the property is read-only
    pub strict_setters: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            boolean_is_prefix: true,
            strict_setters: true,
        }
    }
}

/// Eviction policy of the synthesized-type cache
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CachePolicy {
    /// Keep every synthesized type for the process lifetime
    #[default]
    Unbounded,
}

/// Composite type synthesis settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositionConfig {
    /// Synthesized-type cache policy
    pub cache_policy: CachePolicy,
    /// Fail composition when a role method has no implementation
    pub require_complete_roles: bool,
    /// Upper bound on requested roles per composition
    pub max_roles: usize,
}

impl Default for CompositionConfig {
    fn default() -> Self {
        Self {
            cache_policy: CachePolicy::Unbounded,
            require_complete_roles: true,
            max_roles: 64,
        }
    }
}

/// Backing store for property sets created by composites
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageMode {
    /// In-memory, copy-on-write
    #[default]
    Transient,
    /// Backed by the durable property store
    Durable,
}

/// Property storage settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertyConfig {
    /// Default storage mode
    pub storage: StorageMode,
}

impl PersonaConfig {
    /// Environment variable prefix
    pub const ENV_PREFIX: &'static str = "PERSONA_";

    /// Sections environment overrides may address
    pub const SECTIONS: [&'static str; 3] = ["resolver", "composition", "properties"];

    /// Parse from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigurationError> {
        toml::from_str(content).map_err(|e| ConfigurationError::InvalidConfig {
            message: format!("Invalid TOML: {e}"),
        })
    }

    /// Load from a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigurationError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigurationError::InvalidConfig {
                message: format!("Failed to read config file {}: {e}", path.display()),
            })?;
        Self::from_toml_str(&content)
    }

    /// Load from a file, apply environment overrides and validate
    pub fn load(path: &Path) -> Result<Self, ConfigurationError> {
        let mut config = Self::load_from_file(path)?;
        config.merge_with_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `PERSONA_<SECTION>_<KEY>` overrides from the process environment
    pub fn merge_with_env(&mut self) -> Result<(), ConfigurationError> {
        self.merge_with_vars(std::env::vars())
    }

    /// Apply `PERSONA_<SECTION>_<KEY>` overrides from the given variables
    ///
    /// Variables naming no known section are ignored; an unknown key within
    /// a known section is an error.
    pub fn merge_with_vars(
        &mut self,
        vars: impl IntoIterator<Item = (String, String)>,
    ) -> Result<(), ConfigurationError> {
        for (name, value) in vars {
            let Some(rest) = name.strip_prefix(Self::ENV_PREFIX) else {
                continue;
            };
            let rest = rest.to_lowercase();
            let Some((section, key)) = rest
                .split_once('_')
                .filter(|(section, _)| Self::SECTIONS.iter().any(|known| known == section))
            else {
                tracing::trace!(variable = %name, "Ignoring unrelated environment variable");
                continue;
            };
            self.set_from_string(&format!("{section}.{key}"), &value)?;
        }
        Ok(())
    }

    /// Set one value by dotted key, e.g. `resolver.strict_setters`
    pub fn set_from_string(&mut self, key: &str, value: &str) -> Result<(), ConfigurationError> {
        match key {
            "resolver.boolean_is_prefix" => self.resolver.boolean_is_prefix = parse_bool(key, value)?,
            "resolver.strict_setters" => self.resolver.strict_setters = parse_bool(key, value)?,
            "composition.cache_policy" => {
                self.composition.cache_policy = match value {
                    "unbounded" => CachePolicy::Unbounded,
                    other => return Err(invalid_value(key, other)),
                }
            }
            "composition.require_complete_roles" => {
                self.composition.require_complete_roles = parse_bool(key, value)?;
            }
            "composition.max_roles" => {
                self.composition.max_roles =
                    value.parse().map_err(|_| invalid_value(key, value))?;
            }
            "properties.storage" => {
                self.properties.storage = match value {
                    "transient" => StorageMode::Transient,
                    "durable" => StorageMode::Durable,
                    other => return Err(invalid_value(key, other)),
                }
            }
            _ => {
                return Err(ConfigurationError::InvalidConfig {
                    message: format!("Unknown configuration key '{key}'"),
                })
            }
        }
        Ok(())
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.composition.max_roles == 0 {
            return Err(ConfigurationError::InvalidConfig {
                message: "composition.max_roles must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigurationError> {
    match value {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => Err(invalid_value(key, other)),
    }
}

fn invalid_value(key: &str, value: &str) -> ConfigurationError {
    ConfigurationError::InvalidConfig {
        message: format!("Invalid value '{value}' for '{key}'"),
    }
}
