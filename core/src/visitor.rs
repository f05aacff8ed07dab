//! file: core/src/visitor.rs
//! description: post-processing passes over the resource graph.
//!
//! Each visitor reads an immutable snapshot of the resources and answers
//! with one `Rewrite` per resource, plus any resources it creates through
//! the `PassContext`. The rewrites of a visitor are applied together once it
//! has seen every resource; the next visitor then reads that result.

use indexmap::IndexMap;

use crate::config::PackConfig;
use crate::error::{CoreError, Result};
use crate::flow::chain::FlowRegistry;
use crate::resource::graph::ResourceNode;
use crate::resource::path::ResourceKey;
use crate::variables::score::RegisterAllocator;

#[derive(Debug, Clone, PartialEq)]
pub enum Rewrite {
    Keep,
    Replace(ResourceNode),
    Remove,
}

/// Build state a visitor may consult or extend while it runs.
pub struct PassContext<'a> {
    pub config: &'a PackConfig,
    pub flow: &'a mut FlowRegistry,
    pub registers: &'a mut RegisterAllocator,
    created: Vec<ResourceNode>,
}

impl<'a> PassContext<'a> {
    pub fn new(
        config: &'a PackConfig,
        flow: &'a mut FlowRegistry,
        registers: &'a mut RegisterAllocator,
    ) -> Self {
        PassContext { config, flow, registers, created: Vec::new() }
    }

    pub fn namespace(&self) -> &str {
        &self.config.namespace
    }

    /// Queue a new resource; it joins the set when the current visitor ends.
    pub fn create(&mut self, node: ResourceNode) {
        self.created.push(node);
    }

    fn take_created(&mut self) -> Vec<ResourceNode> {
        std::mem::take(&mut self.created)
    }
}

pub trait Visitor {
    fn name(&self) -> &str;

    fn on_start(&mut self, _ctx: &mut PassContext<'_>) -> Result<()> {
        Ok(())
    }

    fn visit(&mut self, node: &ResourceNode, ctx: &mut PassContext<'_>) -> Result<Rewrite>;

    fn on_end(&mut self, _ctx: &mut PassContext<'_>) -> Result<()> {
        Ok(())
    }
}

/// Run `visitors` in registration order over `snapshot` and return the
/// rewritten resource set.
pub fn run_visitors(
    snapshot: IndexMap<ResourceKey, ResourceNode>,
    visitors: &mut [Box<dyn Visitor>],
    ctx: &mut PassContext<'_>,
) -> Result<IndexMap<ResourceKey, ResourceNode>> {
    let mut working = snapshot;

    for visitor in visitors.iter_mut() {
        log::debug!("running visitor `{}` over {} resource(s)", visitor.name(), working.len());
        visitor.on_start(ctx)?;

        let mut rewrites = Vec::with_capacity(working.len());
        for node in working.values() {
            rewrites.push(visitor.visit(node, ctx)?);
        }

        visitor.on_end(ctx)?;
        working = apply_rewrites(working, rewrites, ctx.take_created())?;
    }

    Ok(working)
}

fn apply_rewrites(
    working: IndexMap<ResourceKey, ResourceNode>,
    rewrites: Vec<Rewrite>,
    created: Vec<ResourceNode>,
) -> Result<IndexMap<ResourceKey, ResourceNode>> {
    let mut next = IndexMap::with_capacity(working.len() + created.len());

    for ((key, node), rewrite) in working.into_iter().zip(rewrites) {
        match rewrite {
            Rewrite::Keep => {
                next.insert(key, node);
            }
            Rewrite::Replace(replacement) => {
                next.insert(replacement.key(), replacement);
            }
            Rewrite::Remove => {}
        }
    }

    for node in created {
        let key = node.key();
        if next.contains_key(&key) {
            return Err(CoreError::DuplicateResource { path: node.path.to_string() });
        }
        next.insert(key, node);
    }

    Ok(next)
}
