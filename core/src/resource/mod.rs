pub mod function;
pub mod graph;
pub mod node;
pub mod path;

pub use function::FunctionResource;
pub use graph::{CreateOutcome, EmittedResource, Resource, ResourceContent, ResourceGraph, ResourceNode};
pub use node::Node;
pub use path::{ResourceKey, ResourceKind, ResourcePath};
