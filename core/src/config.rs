//! file: core/src/config.rs
//! description: pack configuration and resource conflict strategies.
//!
//! Configuration is supplied once when a `BuildCore` is created, either
//! programmatically, from a JSON document, or from the process environment
//! (`NAMESPACE`, `PACK_UID`, `GENERAL_CONFLICT_STRATEGY` and one
//! `<KIND>_CONFLICT_STRATEGY` variable per resource kind).

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::resource::path::ResourceKind;

/// What happens when a resource is created at an identity that already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictStrategy {
    Throw,
    Replace,
    Ignore,
    Warn,
    /// Function kinds only.
    Append,
    /// Function kinds only.
    Prepend,
}

impl ConflictStrategy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "throw" => Some(ConflictStrategy::Throw),
            "replace" => Some(ConflictStrategy::Replace),
            "ignore" => Some(ConflictStrategy::Ignore),
            "warn" => Some(ConflictStrategy::Warn),
            "append" => Some(ConflictStrategy::Append),
            "prepend" => Some(ConflictStrategy::Prepend),
            _ => None,
        }
    }

    /// Strategies valid for every resource kind.
    pub fn is_basic(self) -> bool {
        !matches!(self, ConflictStrategy::Append | ConflictStrategy::Prepend)
    }

    pub fn is_valid_for(self, kind: ResourceKind) -> bool {
        self.is_basic() || kind.is_function_like()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ConflictStrategy::Throw => "throw",
            ConflictStrategy::Replace => "replace",
            ConflictStrategy::Ignore => "ignore",
            ConflictStrategy::Warn => "warn",
            ConflictStrategy::Append => "append",
            ConflictStrategy::Prepend => "prepend",
        }
    }
}

impl fmt::Display for ConflictStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const DEFAULT_STRATEGY: ConflictStrategy = ConflictStrategy::Warn;

/// The general strategy plus per-kind overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConflictStrategies {
    pub general: ConflictStrategy,
    pub overrides: HashMap<ResourceKind, ConflictStrategy>,
}

impl Default for ConflictStrategies {
    fn default() -> Self {
        ConflictStrategies {
            general: DEFAULT_STRATEGY,
            overrides: HashMap::new(),
        }
    }
}

impl ConflictStrategies {
    pub fn for_kind(&self, kind: ResourceKind) -> ConflictStrategy {
        self.overrides.get(&kind).copied().unwrap_or(self.general)
    }

    pub fn set_general(&mut self, strategy: ConflictStrategy) -> Result<()> {
        if !strategy.is_basic() {
            return Err(CoreError::InvalidConfig(format!(
                "`{}` cannot be used as the general conflict strategy",
                strategy
            )));
        }
        self.general = strategy;
        Ok(())
    }

    pub fn set(&mut self, kind: ResourceKind, strategy: ConflictStrategy) -> Result<()> {
        if !strategy.is_valid_for(kind) {
            return Err(CoreError::InvalidConflictStrategy { strategy, kind });
        }
        self.overrides.insert(kind, strategy);
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if !self.general.is_basic() {
            return Err(CoreError::InvalidConfig(format!(
                "`{}` cannot be used as the general conflict strategy",
                self.general
            )));
        }
        for (kind, strategy) in &self.overrides {
            if !strategy.is_valid_for(*kind) {
                return Err(CoreError::InvalidConflictStrategy {
                    strategy: *strategy,
                    kind: *kind,
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackConfig {
    pub namespace: String,
    #[serde(default = "new_pack_uid")]
    pub pack_uid: String,
    #[serde(default)]
    pub conflicts: ConflictStrategies,
}

impl Default for PackConfig {
    fn default() -> Self {
        PackConfig::new("default")
    }
}

/// Short random identifier distinguishing this pack's internal names.
pub fn new_pack_uid() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..8].to_string()
}

fn is_valid_namespace(namespace: &str) -> bool {
    !namespace.is_empty()
        && namespace
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '_' | '-' | '.'))
}

impl PackConfig {
    pub fn new(namespace: &str) -> Self {
        PackConfig {
            namespace: namespace.to_string(),
            pack_uid: new_pack_uid(),
            conflicts: ConflictStrategies::default(),
        }
    }

    pub fn with_strategy(mut self, kind: ResourceKind, strategy: ConflictStrategy) -> Result<Self> {
        self.conflicts.set(kind, strategy)?;
        Ok(self)
    }

    pub fn strategy_for(&self, kind: ResourceKind) -> ConflictStrategy {
        self.conflicts.for_kind(kind)
    }

    pub fn from_json_str(source: &str) -> Result<Self> {
        let config: PackConfig = serde_json::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_env() -> Result<Self> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Build a configuration from an environment-like lookup. Unknown or
    /// invalid strategy values are ignored and the general strategy applies,
    /// `append`/`prepend` are only honoured for functions.
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let namespace = lookup("NAMESPACE").unwrap_or_else(|| "default".to_string());
        let mut config = PackConfig::new(&namespace);
        if let Some(uid) = lookup("PACK_UID").filter(|uid| !uid.is_empty()) {
            config.pack_uid = uid;
        }

        if let Some(general) = lookup("GENERAL_CONFLICT_STRATEGY")
            .as_deref()
            .and_then(ConflictStrategy::parse)
            .filter(|s| s.is_basic())
        {
            config.conflicts.general = general;
        }

        for kind in ResourceKind::ALL {
            let Some(var) = kind.env_var() else { continue };
            match lookup(var).as_deref().map(ConflictStrategy::parse) {
                Some(Some(strategy)) if strategy.is_valid_for(kind) => {
                    config.conflicts.overrides.insert(kind, strategy);
                }
                Some(_) => log::warn!("ignoring invalid value of {}", var),
                None => {}
            }
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !is_valid_namespace(&self.namespace) {
            return Err(CoreError::InvalidConfig(format!(
                "`{}` is not a valid namespace",
                self.namespace
            )));
        }
        self.conflicts.validate()
    }
}
