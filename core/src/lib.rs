pub mod builder;
pub mod cache;
pub mod config;
pub mod context;
pub mod emit;
pub mod error;
pub mod flow;
pub mod reports;
pub mod resource;
pub mod variables;
pub mod visitor;

pub use builder::{BuildCore, DependencyReport, SaveReport};
pub use cache::{AssetCache, AssetContent, CacheError, Fetcher, MapFetcher};
pub use config::{ConflictStrategies, ConflictStrategy, PackConfig};
pub use context::ContextStack;
pub use emit::{emit, DirectoryHandler, EmitOptions, FileHandler, MemoryHandler};
pub use error::{CoreError, CoreErrorExt, Level, Result};
pub use flow::{Condition, ChainId, IfElseLowering, IfStatement};
pub use reports::{Diagnostic, Diagnostics};
pub use resource::{
    CreateOutcome, EmittedResource, FunctionResource, Node, Resource, ResourceContent, ResourceGraph, ResourceKey,
    ResourceKind, ResourceNode, ResourcePath,
};
pub use variables::{DataPoint, DataTarget, Deferred, NbtValue, NumericType, Score, SequenceKind};
pub use visitor::{PassContext, Rewrite, Visitor};

pub fn generate_error_report<E: CoreErrorExt>(error: &E) -> String {
    let level = error.level();
    let issuer = error.issuer();
    let message = error.message();

    format!("CMDFORGE | {} | {} | {}", level, issuer, message)
}
