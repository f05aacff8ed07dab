//! file: core/src/flow/lower.rs
//! description: rewrites conditional chains into synthetic functions.
//!
//! At the chain's position the enclosing function receives a reset of the
//! chain's branch register and, per branch, a guard calling the branch
//! function when its condition holds and the register is still clear. The
//! branch function marks the register before its body runs, and again after
//! it when the body calls other functions, since a re-entered chain resets
//! its register on the way in.

use crate::error::Result;
use crate::flow::chain::{Branch, ChainId};
use crate::resource::function::FunctionResource;
use crate::resource::graph::ResourceNode;
use crate::resource::node::Node;
use crate::resource::path::{ResourceKind, ResourcePath};
use crate::variables::score::{Score, FLOW_OBJECTIVE};
use crate::visitor::{PassContext, Rewrite, Visitor};

#[derive(Debug, Default)]
pub struct IfElseLowering {
    lowered: usize,
}

impl IfElseLowering {
    pub fn new() -> Self {
        IfElseLowering::default()
    }

    /// Name of the function holding branch `branch` of `chain`.
    pub fn branch_function(owner: &ResourcePath, chain: ChainId, branch: usize) -> ResourcePath {
        let mut segments = Vec::with_capacity(owner.segments.len() + 2);
        segments.push(FLOW_OBJECTIVE.to_string());
        segments.extend(owner.segments.iter().cloned());
        segments.push(format!("chain_{}_{}", chain, branch));
        ResourcePath::new(&owner.namespace, ResourceKind::Function.category(), segments)
    }

    fn lower_nodes(&mut self, nodes: &[Node], ctx: &mut PassContext<'_>) -> Result<Vec<Node>> {
        let mut out = Vec::with_capacity(nodes.len());
        for node in nodes {
            match node {
                Node::Command(_) => out.push(node.clone()),
                Node::Block(inner) => out.push(Node::Block(self.lower_nodes(inner, ctx)?)),
                Node::Chain(id) => out.extend(self.lower_chain(*id, ctx)?),
            }
        }
        Ok(out)
    }

    fn lower_chain(&mut self, id: ChainId, ctx: &mut PassContext<'_>) -> Result<Vec<Node>> {
        let owner = ctx.flow.get(id)?.owner.clone();
        let branches = ctx.flow.lower(id)?;
        let register = ctx.registers.branch_register(id);
        self.lowered += 1;

        let mut out = Vec::with_capacity(1 + branches.len());
        out.push(Node::Command(register.set(0)));

        for (i, branch) in branches.iter().enumerate() {
            let prefix = guard(branch, &register)?;
            if branch.is_empty() {
                out.push(Node::Command(format!("{} run {}", prefix, register.set(1))));
                continue;
            }

            let body = self.lower_nodes(&branch.body, ctx)?;
            let function = Self::branch_function(&owner, id, i);
            out.push(Node::Command(format!("{} run function {}", prefix, function)));

            let reenters = calls_function(&body);
            let mut nodes = Vec::with_capacity(body.len() + 2);
            nodes.push(Node::Command(register.set(1)));
            nodes.extend(body);
            if reenters {
                nodes.push(Node::Command(register.set(1)));
            }
            ctx.create(ResourceNode::function(function, FunctionResource::from_nodes(nodes)));
        }

        Ok(out)
    }
}

fn guard(branch: &Branch, register: &Score) -> Result<String> {
    let mut clauses = match &branch.condition {
        Some(condition) => condition.clauses()?,
        None => Vec::new(),
    };
    clauses.push(format!("if score {} matches 0", register));
    Ok(format!("execute {}", clauses.join(" ")))
}

fn calls_function(nodes: &[Node]) -> bool {
    nodes.iter().any(|node| match node {
        Node::Command(text) => text.split_whitespace().any(|word| word == "function"),
        Node::Block(inner) => calls_function(inner),
        Node::Chain(_) => true,
    })
}

impl Visitor for IfElseLowering {
    fn name(&self) -> &str {
        "if-else-lowering"
    }

    fn visit(&mut self, node: &ResourceNode, ctx: &mut PassContext<'_>) -> Result<Rewrite> {
        let Some(function) = node.as_function() else {
            return Ok(Rewrite::Keep);
        };
        if !function.contains_flow() {
            return Ok(Rewrite::Keep);
        }

        let body = self.lower_nodes(function.nodes(), ctx)?;
        Ok(Rewrite::Replace(ResourceNode::function(
            node.path.clone(),
            FunctionResource::from_nodes(body),
        )))
    }

    fn on_end(&mut self, _ctx: &mut PassContext<'_>) -> Result<()> {
        log::debug!("lowered {} conditional chain(s)", self.lowered);
        Ok(())
    }
}
