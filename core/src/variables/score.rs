//! file: core/src/variables/score.rs
//! description: scoreboard registers and their allocation.
//!
//! A `Score` is a `<holder> <objective>` pair. Helpers return command text
//! or a `Condition`; appending them to a function is left to `BuildCore`.

use std::fmt;

use indexmap::{IndexMap, IndexSet};

use crate::error::Result;
use crate::flow::chain::ChainId;
use crate::flow::condition::Condition;
use crate::resource::function::FunctionResource;
use crate::resource::graph::{Resource, ResourceNode};
use crate::resource::node::Node;
use crate::resource::path::{ResourceKind, ResourcePath};
use crate::visitor::{PassContext, Rewrite, Visitor};

/// Objective holding every register allocated by the build core.
pub const FLOW_OBJECTIVE: &str = "__cmdforge";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Score {
    pub holder: String,
    pub objective: String,
}

impl Score {
    pub fn new(holder: impl Into<String>, objective: impl Into<String>) -> Self {
        Score { holder: holder.into(), objective: objective.into() }
    }

    pub fn set(&self, value: i32) -> String {
        format!("scoreboard players set {} {}", self, value)
    }

    pub fn add(&self, value: i32) -> String {
        format!("scoreboard players add {} {}", self, value)
    }

    pub fn remove(&self, value: i32) -> String {
        format!("scoreboard players remove {} {}", self, value)
    }

    pub fn reset(&self) -> String {
        format!("scoreboard players reset {}", self)
    }

    pub fn get(&self) -> String {
        format!("scoreboard players get {}", self)
    }

    /// `op` is one of `=`, `+=`, `-=`, `*=`, `/=`, `%=`, `<`, `>`, `><`.
    pub fn operation(&self, op: &str, source: &Score) -> String {
        format!("scoreboard players operation {} {} {}", self, op, source)
    }

    pub fn assign(&self, source: &Score) -> String {
        self.operation("=", source)
    }

    /// `range` uses the target range syntax: `3`, `1..`, `..-1`, `2..5`.
    pub fn matches(&self, range: impl fmt::Display) -> Condition {
        Condition::test(format!("score {} matches {}", self, range))
    }

    /// True when the score is not zero. An unset score also counts as true.
    pub fn truthy(&self) -> Condition {
        self.matches(0).not()
    }

    pub fn equal_to(&self, value: i32) -> Condition {
        self.matches(value)
    }

    pub fn greater_than(&self, value: i32) -> Condition {
        self.matches(format!("{}..", value.saturating_add(1)))
    }

    pub fn greater_or_equal(&self, value: i32) -> Condition {
        self.matches(format!("{}..", value))
    }

    pub fn lower_than(&self, value: i32) -> Condition {
        self.matches(format!("..{}", value.saturating_sub(1)))
    }

    pub fn lower_or_equal(&self, value: i32) -> Condition {
        self.matches(format!("..{}", value))
    }

    /// Compare against another score: `op` is one of `<`, `<=`, `=`, `>=`, `>`.
    pub fn compare(&self, op: &str, other: &Score) -> Condition {
        Condition::test(format!("score {} {} {}", self, op, other))
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.holder, self.objective)
    }
}

/// Hands out fresh registers and remembers which objectives must exist.
#[derive(Debug, Clone, Default)]
pub struct RegisterAllocator {
    next_variable: usize,
    branch_registers: IndexMap<ChainId, Score>,
    objectives: IndexSet<String>,
}

impl RegisterAllocator {
    pub fn new() -> Self {
        RegisterAllocator::default()
    }

    pub fn register_objective(&mut self, objective: &str) {
        self.objectives.insert(objective.to_string());
    }

    pub fn objectives(&self) -> impl Iterator<Item = &str> {
        self.objectives.iter().map(String::as_str)
    }

    /// A fresh anonymous register.
    pub fn variable(&mut self) -> Score {
        let score = Score::new(format!("$var_{}", self.next_variable), FLOW_OBJECTIVE);
        self.next_variable += 1;
        self.register_objective(FLOW_OBJECTIVE);
        score
    }

    /// The branch-state register of `chain`. Each chain owns its own register.
    pub fn branch_register(&mut self, chain: ChainId) -> Score {
        self.register_objective(FLOW_OBJECTIVE);
        self.branch_registers
            .entry(chain)
            .or_insert_with(|| Score::new(format!("$chain_{}", chain), FLOW_OBJECTIVE))
            .clone()
    }
}

/// Creates `<ns>:__cmdforge/load`, which adds every registered objective,
/// and hooks it into the `minecraft:load` function tag.
#[derive(Debug, Default)]
pub struct ObjectiveInit {
    saw_load_function: bool,
    saw_load_tag: bool,
}

impl ObjectiveInit {
    pub fn new() -> Self {
        ObjectiveInit::default()
    }

    pub fn load_function(namespace: &str) -> ResourcePath {
        ResourcePath::new(
            namespace,
            ResourceKind::Function.category(),
            vec![FLOW_OBJECTIVE.to_string(), "load".to_string()],
        )
    }

    pub fn load_tag() -> ResourcePath {
        ResourcePath::new(
            "minecraft",
            ResourceKind::Tag.category(),
            vec!["functions".to_string(), "load".to_string()],
        )
    }

    fn init_commands(ctx: &PassContext<'_>) -> Vec<Node> {
        ctx.registers
            .objectives()
            .map(|objective| Node::Command(format!("scoreboard objectives add {} dummy", objective)))
            .collect()
    }
}

fn merged_tag(existing: &serde_json::Value, entry: &str) -> serde_json::Value {
    let mut merged = existing.clone();
    if let Some(serde_json::Value::Array(values)) = merged.get_mut("values") {
        if !values.iter().any(|v| v.as_str() == Some(entry)) {
            values.insert(0, serde_json::Value::from(entry));
        }
        return merged;
    }
    serde_json::json!({ "values": [entry] })
}

impl Visitor for ObjectiveInit {
    fn name(&self) -> &str {
        "objective-init"
    }

    fn on_start(&mut self, _ctx: &mut PassContext<'_>) -> Result<()> {
        self.saw_load_function = false;
        self.saw_load_tag = false;
        Ok(())
    }

    fn visit(&mut self, node: &ResourceNode, ctx: &mut PassContext<'_>) -> Result<Rewrite> {
        if ctx.registers.objectives().next().is_none() {
            return Ok(Rewrite::Keep);
        }
        let load_function = Self::load_function(ctx.namespace());

        if node.kind == ResourceKind::Function && node.path == load_function {
            self.saw_load_function = true;
            let mut replaced = node.clone();
            if let Some(body) = replaced.as_function_mut() {
                body.prepend(Self::init_commands(ctx));
            }
            return Ok(Rewrite::Replace(replaced));
        }

        if node.kind == ResourceKind::Tag && node.path == Self::load_tag() {
            self.saw_load_tag = true;
            if let Resource::Json(existing) = &node.resource {
                let merged = merged_tag(existing, &load_function.to_string());
                return Ok(Rewrite::Replace(ResourceNode::new(
                    node.path.clone(),
                    node.kind,
                    Resource::Json(merged),
                )));
            }
        }

        Ok(Rewrite::Keep)
    }

    fn on_end(&mut self, ctx: &mut PassContext<'_>) -> Result<()> {
        if ctx.registers.objectives().next().is_none() {
            return Ok(());
        }
        let load_function = Self::load_function(ctx.namespace());

        if !self.saw_load_function {
            let body = FunctionResource::from_nodes(Self::init_commands(ctx));
            ctx.create(ResourceNode::function(load_function.clone(), body));
        }
        if !self.saw_load_tag {
            let tag = serde_json::json!({ "values": [load_function.to_string()] });
            ctx.create(ResourceNode::new(Self::load_tag(), ResourceKind::Tag, Resource::Json(tag)));
        }
        log::debug!("objective init hooked into {}", Self::load_tag());
        Ok(())
    }
}
