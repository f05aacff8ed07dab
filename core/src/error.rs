use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cache::CacheError;
use crate::config::ConflictStrategy;
use crate::resource::path::ResourceKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Level {
    Info,
    Warning,
    Error,
    Critical,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level_str = match self {
            Level::Info => "INFO",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
            Level::Critical => "CRITICAL",
        };
        write!(f, "{}", level_str)
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;

/// Every failure the build core can report to the builder call that caused it.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("this operation is invalid outside of a function")]
    NoActiveContext,

    #[error("conditional chain {chain} is already sealed")]
    ChainAlreadySealed { chain: usize },

    #[error("unknown conditional chain {0}")]
    UnknownChain(usize),

    #[error("resource {path} already exists")]
    DuplicateResource { path: String },

    #[error("no function named {0}")]
    UnknownFunction(String),

    #[error("unsupported value at `{path}`: {shape}")]
    UnsupportedValueType { path: String, shape: String },

    #[error("unresolved placeholder cannot be serialized, resolve it into a data point first")]
    PlaceholderNotSerializable,

    #[error("unsupported condition: {0}")]
    UnsupportedCondition(String),

    #[error("conflict strategy `{strategy}` is not valid for {kind} resources")]
    InvalidConflictStrategy {
        strategy: ConflictStrategy,
        kind: ResourceKind,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("resources were already finalized")]
    AlreadyFinalized,

    #[error("{0} still contains control flow that must be lowered before emission")]
    PostProcessingRequired(String),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub trait CoreErrorExt {
    fn level(&self) -> Level;
    fn message(&self) -> String;
    fn issuer(&self) -> String;
}

impl CoreErrorExt for CoreError {
    fn level(&self) -> Level {
        match self {
            // usage contract violations abort the build
            CoreError::NoActiveContext
            | CoreError::ChainAlreadySealed { .. }
            | CoreError::UnknownChain(_)
            | CoreError::DuplicateResource { .. }
            | CoreError::AlreadyFinalized => Level::Critical,
            _ => Level::Error,
        }
    }

    fn message(&self) -> String {
        self.to_string()
    }

    fn issuer(&self) -> String {
        let issuer = match self {
            CoreError::NoActiveContext | CoreError::UnknownFunction(_) => "context",
            CoreError::ChainAlreadySealed { .. }
            | CoreError::UnknownChain(_)
            | CoreError::UnsupportedCondition(_)
            | CoreError::PostProcessingRequired(_) => "flow",
            CoreError::DuplicateResource { .. }
            | CoreError::AlreadyFinalized
            | CoreError::InvalidConflictStrategy { .. } => "graph",
            CoreError::UnsupportedValueType { .. } | CoreError::PlaceholderNotSerializable => {
                "resolve"
            }
            CoreError::InvalidConfig(_) => "config",
            CoreError::Cache(_) => "cache",
            CoreError::Io(_) | CoreError::Json(_) => "emit",
        };
        issuer.to_string()
    }
}
