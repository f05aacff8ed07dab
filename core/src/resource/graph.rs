//! file: core/src/resource/graph.rs
//! description: the set of all named resources created during a build.
//!
//! The graph keeps resources in insertion order, applies the conflict
//! strategy when an identity is created twice, and runs the two-pass
//! finalization (materialize, then visitor passes) before handing the
//! published set to the emission step.

use indexmap::IndexMap;
use indexmap::map::Entry;

use crate::config::ConflictStrategy;
use crate::error::{CoreError, Result};
use crate::resource::function::FunctionResource;
use crate::resource::path::{ResourceKey, ResourceKind, ResourcePath};
use crate::visitor::{run_visitors, PassContext, Visitor};

#[derive(Debug, Clone, PartialEq)]
pub enum Resource {
    Function(FunctionResource),
    Json(serde_json::Value),
    Bytes(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResourceNode {
    pub path: ResourcePath,
    pub kind: ResourceKind,
    pub resource: Resource,
}

impl ResourceNode {
    pub fn new(path: ResourcePath, kind: ResourceKind, resource: Resource) -> Self {
        ResourceNode { path, kind, resource }
    }

    pub fn function(path: ResourcePath, body: FunctionResource) -> Self {
        ResourceNode::new(path, ResourceKind::Function, Resource::Function(body))
    }

    pub fn key(&self) -> ResourceKey {
        ResourceKey::new(self.path.clone(), self.kind)
    }

    pub fn as_function(&self) -> Option<&FunctionResource> {
        match &self.resource {
            Resource::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_function_mut(&mut self) -> Option<&mut FunctionResource> {
        match &mut self.resource {
            Resource::Function(f) => Some(f),
            _ => None,
        }
    }

    fn materialize(&mut self) {
        if let Resource::Function(f) = &mut self.resource {
            f.materialize();
        }
    }

    pub fn content(&self) -> Result<ResourceContent> {
        match &self.resource {
            Resource::Function(f) => Ok(ResourceContent::Text(f.render(&self.path)?)),
            Resource::Json(value) => Ok(ResourceContent::Json(value.clone())),
            Resource::Bytes(bytes) => Ok(ResourceContent::Bytes(bytes.clone())),
        }
    }
}

/// Finalized content of one resource.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceContent {
    Text(String),
    Json(serde_json::Value),
    Bytes(Vec<u8>),
}

impl ResourceContent {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResourceContent::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        match self {
            ResourceContent::Text(text) => Ok(text.clone().into_bytes()),
            ResourceContent::Json(value) => Ok(serde_json::to_vec_pretty(value)?),
            ResourceContent::Bytes(bytes) => Ok(bytes.clone()),
        }
    }
}

/// One `(path, extension, content)` triple handed to the emission step.
#[derive(Debug, Clone, PartialEq)]
pub struct EmittedResource {
    pub path: ResourcePath,
    pub extension: &'static str,
    pub content: ResourceContent,
}

impl EmittedResource {
    pub fn relative_path(&self) -> String {
        format!("{}.{}", self.path.relative_path(), self.extension)
    }
}

/// Result of registering a resource identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    Replaced,
    Ignored,
    /// Same as `Ignored`, the caller is expected to report a diagnostic.
    Warned,
    Append,
    Prepend,
}

impl CreateOutcome {
    /// Whether new content should be authored into the resource.
    pub fn accepts_content(self) -> bool {
        !matches!(self, CreateOutcome::Ignored | CreateOutcome::Warned)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResourceGraph {
    nodes: IndexMap<ResourceKey, ResourceNode>,
    finalized: bool,
}

impl ResourceGraph {
    pub fn new() -> Self {
        ResourceGraph::default()
    }

    /// Register `resource` at `path`, resolving an existing identity with
    /// `strategy`. For `Append`/`Prepend` the existing resource is kept and
    /// the caller splices new content into it.
    pub fn create(
        &mut self,
        path: ResourcePath,
        kind: ResourceKind,
        resource: Resource,
        strategy: ConflictStrategy,
    ) -> Result<CreateOutcome> {
        let key = ResourceKey::new(path.clone(), kind);
        let mut existing = match self.nodes.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(ResourceNode::new(path, kind, resource));
                return Ok(CreateOutcome::Created);
            }
            Entry::Occupied(existing) => existing,
        };

        if !strategy.is_valid_for(kind) {
            return Err(CoreError::InvalidConflictStrategy { strategy, kind });
        }

        match strategy {
            ConflictStrategy::Throw => Err(CoreError::DuplicateResource { path: path.to_string() }),
            ConflictStrategy::Ignore => Ok(CreateOutcome::Ignored),
            ConflictStrategy::Warn => Ok(CreateOutcome::Warned),
            ConflictStrategy::Replace => {
                existing.get_mut().resource = resource;
                Ok(CreateOutcome::Replaced)
            }
            ConflictStrategy::Append => Ok(CreateOutcome::Append),
            ConflictStrategy::Prepend => Ok(CreateOutcome::Prepend),
        }
    }

    pub fn get(&self, key: &ResourceKey) -> Option<&ResourceNode> {
        self.nodes.get(key)
    }

    pub fn contains(&self, key: &ResourceKey) -> bool {
        self.nodes.contains_key(key)
    }

    pub fn function(&self, path: &ResourcePath) -> Result<&FunctionResource> {
        self.nodes
            .get(&ResourceKey::function(path.clone()))
            .and_then(ResourceNode::as_function)
            .ok_or_else(|| CoreError::UnknownFunction(path.to_string()))
    }

    pub fn function_mut(&mut self, path: &ResourcePath) -> Result<&mut FunctionResource> {
        self.nodes
            .get_mut(&ResourceKey::function(path.clone()))
            .and_then(ResourceNode::as_function_mut)
            .ok_or_else(|| CoreError::UnknownFunction(path.to_string()))
    }

    pub fn remove(&mut self, key: &ResourceKey) -> Option<ResourceNode> {
        self.nodes.shift_remove(key)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceNode> {
        self.nodes.values()
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Materialize every resource, then run `visitors` in order over the
    /// materialized snapshot. The rewritten set replaces the graph only once
    /// every visitor has completed; on error the graph is left untouched.
    pub fn finalize_all(
        &mut self,
        visitors: &mut [Box<dyn Visitor>],
        ctx: &mut PassContext<'_>,
    ) -> Result<()> {
        if self.finalized {
            return Err(CoreError::AlreadyFinalized);
        }

        let mut snapshot = self.nodes.clone();
        for node in snapshot.values_mut() {
            node.materialize();
        }
        log::debug!("materialized {} resource(s)", snapshot.len());

        let published = run_visitors(snapshot, visitors, ctx)?;
        self.nodes = published;
        self.finalized = true;
        Ok(())
    }

    /// Enumerate the finalized resources with their content.
    pub fn emitted(&self) -> Result<Vec<EmittedResource>> {
        self.nodes
            .values()
            .map(|node| {
                Ok(EmittedResource {
                    path: node.path.clone(),
                    extension: node.kind.extension(),
                    content: node.content()?,
                })
            })
            .collect()
    }
}
