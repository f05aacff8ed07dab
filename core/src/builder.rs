//! file: core/src/builder.rs
//! description: the build capability object.
//!
//! `BuildCore` owns everything one build touches: the resource graph, the
//! context stack, conditional chains, register allocation, diagnostics and
//! pending dependency lookups. Builder code receives it as `&mut BuildCore`
//! and every nested body runs as a closure bracketed by enter/leave or by a
//! capture frame.

use std::sync::Arc;

use futures::future::{join_all, FutureExt, LocalBoxFuture};

use crate::cache::{AssetCache, AssetContent, CacheError};
use crate::config::{ConflictStrategy, PackConfig};
use crate::context::ContextStack;
use crate::emit::{emit, EmitOptions, FileHandler};
use crate::error::{CoreError, Level, Result};
use crate::flow::chain::{ChainId, FlowRegistry};
use crate::flow::condition::Condition;
use crate::flow::lower::IfElseLowering;
use crate::flow::statement::IfStatement;
use crate::reports::{Diagnostic, Diagnostics};
use crate::resource::function::FunctionResource;
use crate::resource::graph::{CreateOutcome, EmittedResource, Resource, ResourceGraph};
use crate::resource::node::Node;
use crate::resource::path::{ResourceKind, ResourcePath};
use crate::variables::data::DataPoint;
use crate::variables::nbt::NbtValue;
use crate::variables::resolve::resolve_commands;
use crate::variables::score::{ObjectiveInit, RegisterAllocator, Score};
use crate::visitor::{PassContext, Visitor};

pub type Body<'b> = Box<dyn FnOnce(&mut BuildCore) -> Result<()> + 'b>;

struct PendingDependency {
    name: String,
    category: String,
    key: String,
    lookup: LocalBoxFuture<'static, std::result::Result<AssetContent, CacheError>>,
}

/// Outcome of one dependency lookup awaited by the barrier.
#[derive(Debug, Clone, PartialEq)]
pub struct DependencyReport {
    pub name: String,
    pub category: String,
    pub key: String,
    pub result: std::result::Result<(), CacheError>,
}

impl DependencyReport {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SaveReport {
    pub dependencies: Vec<DependencyReport>,
    pub written: usize,
}

pub struct BuildCore {
    config: PackConfig,
    graph: ResourceGraph,
    stack: ContextStack,
    flow: FlowRegistry,
    registers: RegisterAllocator,
    diagnostics: Diagnostics,
    lazy: Vec<(ResourcePath, Body<'static>)>,
    cache: Option<Arc<AssetCache>>,
    dependencies: Vec<PendingDependency>,
}

impl BuildCore {
    pub fn new(config: PackConfig) -> Self {
        BuildCore {
            config,
            graph: ResourceGraph::new(),
            stack: ContextStack::new(),
            flow: FlowRegistry::new(),
            registers: RegisterAllocator::new(),
            diagnostics: Diagnostics::new(),
            lazy: Vec::new(),
            cache: None,
            dependencies: Vec::new(),
        }
    }

    pub fn with_cache(mut self, cache: Arc<AssetCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn config(&self) -> &PackConfig {
        &self.config
    }

    pub fn namespace(&self) -> &str {
        &self.config.namespace
    }

    pub fn graph(&self) -> &ResourceGraph {
        &self.graph
    }

    pub fn flow(&self) -> &FlowRegistry {
        &self.flow
    }

    pub fn registers(&self) -> &RegisterAllocator {
        &self.registers
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn context_depth(&self) -> usize {
        self.stack.depth()
    }

    pub fn function_path(&self, name: &str) -> ResourcePath {
        ResourcePath::parse(&self.config.namespace, ResourceKind::Function, name)
    }

    // ---- resources & context ----

    /// Register a resource, applying `strategy` when its identity exists.
    pub fn create_resource(
        &mut self,
        path: ResourcePath,
        kind: ResourceKind,
        resource: Resource,
        strategy: ConflictStrategy,
    ) -> Result<CreateOutcome> {
        let outcome = self.graph.create(path.clone(), kind, resource, strategy)?;
        if outcome == CreateOutcome::Warned {
            log::warn!("{} {} already exists, keeping the first definition", kind, path);
            self.diagnostics.push(
                Diagnostic::new(
                    Level::Warning,
                    "graph",
                    format!("{} already exists, keeping the first definition", kind),
                )
                .with_resource(path.to_string()),
            );
        }
        Ok(outcome)
    }

    /// Make the existing function `path` the current one.
    pub fn enter(&mut self, path: ResourcePath) -> Result<()> {
        self.graph.function(&path)?;
        self.stack.enter(path);
        Ok(())
    }

    /// Close the current function. Chains it authored can no longer grow once
    /// it is not open anywhere on the stack.
    pub fn leave(&mut self) -> Result<ResourcePath> {
        let left = self.stack.leave()?;
        if !self.stack.contains(&left) {
            self.flow.seal_owned_by(&left);
        }
        Ok(left)
    }

    pub fn current_function(&self) -> Result<&ResourcePath> {
        self.stack.current()
    }

    /// Append a command or node to the current function. A chain directly
    /// followed by anything else in its frame is sealed.
    pub fn append(&mut self, node: impl Into<Node>) -> Result<()> {
        let path = self.stack.current()?.clone();
        let function = self.graph.function_mut(&path)?;
        if let Some(Node::Chain(previous)) = function.last() {
            self.flow.seal(*previous)?;
        }
        function.push(node.into());
        Ok(())
    }

    pub fn command(&mut self, text: impl Into<String>) -> Result<()> {
        self.append(Node::Command(text.into()))
    }

    /// Run `body` and return what it appended instead of keeping it in the
    /// current function.
    pub fn capture<F>(&mut self, body: F) -> Result<Vec<Node>>
    where
        F: FnOnce(&mut BuildCore) -> Result<()>,
    {
        let path = self.stack.current()?.clone();
        self.graph.function_mut(&path)?.open_frame();
        let result = body(self);
        let captured = self.graph.function_mut(&path)?.close_frame().unwrap_or_default();
        result?;
        if let Some(Node::Chain(last)) = captured.last() {
            self.flow.seal(*last)?;
        }
        Ok(captured)
    }

    /// Define the function `name` with `body`, applying the configured
    /// function conflict strategy.
    pub fn mcfunction<F>(&mut self, name: &str, body: F) -> Result<ResourcePath>
    where
        F: FnOnce(&mut BuildCore) -> Result<()>,
    {
        let strategy = self.config.strategy_for(ResourceKind::Function);
        self.mcfunction_with(name, strategy, body)
    }

    pub fn mcfunction_with<F>(&mut self, name: &str, strategy: ConflictStrategy, body: F) -> Result<ResourcePath>
    where
        F: FnOnce(&mut BuildCore) -> Result<()>,
    {
        let path = self.function_path(name);
        self.define_function(path.clone(), strategy, body)?;
        Ok(path)
    }

    /// Define `name` once every eagerly built function exists. The body runs
    /// when resources are generated.
    pub fn lazy_mcfunction<F>(&mut self, name: &str, body: F) -> ResourcePath
    where
        F: FnOnce(&mut BuildCore) -> Result<()> + 'static,
    {
        let path = self.function_path(name);
        self.lazy.push((path.clone(), Box::new(body)));
        path
    }

    fn define_function<F>(&mut self, path: ResourcePath, strategy: ConflictStrategy, body: F) -> Result<()>
    where
        F: FnOnce(&mut BuildCore) -> Result<()>,
    {
        let outcome = self.create_resource(
            path.clone(),
            ResourceKind::Function,
            Resource::Function(FunctionResource::new()),
            strategy,
        )?;
        if !outcome.accepts_content() {
            return Ok(());
        }

        self.enter(path.clone())?;
        let prepend = outcome == CreateOutcome::Prepend;
        if prepend {
            self.graph.function_mut(&path)?.open_frame();
        }
        let result = body(self);
        let captured = if prepend { self.graph.function_mut(&path)?.close_frame() } else { None };
        self.leave()?;
        result?;

        if let Some(nodes) = captured {
            self.graph.function_mut(&path)?.prepend(nodes);
        }
        Ok(())
    }

    /// Register a JSON resource such as an advancement or a tag.
    pub fn json_resource(&mut self, kind: ResourceKind, name: &str, value: serde_json::Value) -> Result<ResourcePath> {
        if kind.is_function_like() {
            return Err(CoreError::InvalidConfig(format!("{} resources cannot hold JSON", kind)));
        }
        let path = ResourcePath::parse(&self.config.namespace, kind, name);
        let strategy = self.config.strategy_for(kind);
        self.create_resource(path.clone(), kind, Resource::Json(value), strategy)?;
        Ok(path)
    }

    // ---- control flow ----

    /// Start an if / else-if / else chain in the current function.
    pub fn if_<C, F>(&mut self, condition: C, body: F) -> Result<IfStatement<'_>>
    where
        C: Into<Condition>,
        F: FnOnce(&mut BuildCore) -> Result<()>,
    {
        let owner = self.stack.current()?.clone();
        let captured = self.capture(body)?;
        let chain = self.flow.open(owner, condition.into(), captured);
        self.append(Node::Chain(chain))?;
        Ok(IfStatement::new(self, chain))
    }

    pub fn attach_else_if<C, F>(&mut self, chain: ChainId, condition: C, body: F) -> Result<()>
    where
        C: Into<Condition>,
        F: FnOnce(&mut BuildCore) -> Result<()>,
    {
        self.flow.ensure_open(chain)?;
        let captured = self.capture(body)?;
        self.flow.push_else_if(chain, condition.into(), captured)
    }

    pub fn attach_else<F>(&mut self, chain: ChainId, body: F) -> Result<()>
    where
        F: FnOnce(&mut BuildCore) -> Result<()>,
    {
        self.flow.ensure_open(chain)?;
        let captured = self.capture(body)?;
        self.flow.push_else(chain, captured)
    }

    // ---- values ----

    pub fn variable(&mut self) -> Score {
        self.registers.variable()
    }

    /// A score on a user objective. The objective is created on load.
    pub fn score(&mut self, holder: &str, objective: &str) -> Score {
        self.registers.register_objective(objective);
        Score::new(holder, objective)
    }

    /// Slot `path` of this pack's temporary storage.
    pub fn temp_storage(&self, path: &str) -> DataPoint {
        DataPoint::storage(&format!("{}:temp", self.config.namespace), path)
    }

    /// Rebuild `value` at `target` (temporary storage when `None`) and
    /// return the target.
    pub fn resolve_nbt(&mut self, value: &NbtValue, target: Option<DataPoint>) -> Result<DataPoint> {
        self.stack.current()?;
        let target = target.unwrap_or_else(|| self.temp_storage("Resolve"));
        let temp = self.temp_storage("Score");
        for command in resolve_commands(value, &target, &temp)? {
            self.command(command)?;
        }
        Ok(target)
    }

    pub fn resolve_json(&mut self, value: &serde_json::Value, target: Option<DataPoint>) -> Result<DataPoint> {
        let value = NbtValue::from_json(value)?;
        self.resolve_nbt(&value, target)
    }

    // ---- dependencies ----

    /// Queue a dependency lookup through the asset cache. Nothing is awaited
    /// until `await_dependencies`.
    pub fn depend(&mut self, name: &str, category: &str, key: &str) -> Result<()> {
        let cache = self.asset_cache()?;
        let (category_owned, key_owned) = (category.to_string(), key.to_string());
        let lookup = async move { cache.get(&category_owned, &key_owned, false).await }.boxed_local();
        self.dependencies.push(PendingDependency {
            name: name.to_string(),
            category: category.to_string(),
            key: key.to_string(),
            lookup,
        });
        Ok(())
    }

    /// Await every queued lookup together. Successful ones become dependency
    /// resources; failures are reported per lookup and do not stop the others.
    pub async fn await_dependencies(&mut self) -> Result<Vec<DependencyReport>> {
        let pending = std::mem::take(&mut self.dependencies);
        let (meta, lookups): (Vec<_>, Vec<_>) = pending
            .into_iter()
            .map(|p| ((p.name, p.category, p.key), p.lookup))
            .unzip();
        let results = join_all(lookups).await;

        let mut reports = Vec::with_capacity(results.len());
        for ((name, category, key), result) in meta.into_iter().zip(results) {
            let result = match result {
                Ok(content) => {
                    let path = ResourcePath::parse(&self.config.namespace, ResourceKind::Dependency, &name);
                    let strategy = self.config.strategy_for(ResourceKind::Dependency);
                    let bytes = Resource::Bytes(content.into_bytes());
                    self.create_resource(path, ResourceKind::Dependency, bytes, strategy)?;
                    Ok(())
                }
                Err(error) => {
                    log::warn!("dependency `{}` failed: {}", name, error);
                    self.diagnostics.push(
                        Diagnostic::new(Level::Error, "cache", error.to_string()).with_resource(name.clone()),
                    );
                    Err(error)
                }
            };
            reports.push(DependencyReport { name, category, key, result });
        }
        Ok(reports)
    }

    /// Fetch a default game asset through the cache.
    pub async fn vanilla_resource(&self, category: &str, key: &str, want_text: bool) -> Result<AssetContent> {
        let cache = self.asset_cache()?;
        Ok(cache.get(category, key, want_text).await?)
    }

    fn asset_cache(&self) -> Result<Arc<AssetCache>> {
        self.cache
            .clone()
            .ok_or_else(|| CoreError::InvalidConfig("no asset cache is attached to this build".to_string()))
    }

    // ---- finalization ----

    /// Run lazy bodies, seal every chain and run the passes: flow lowering,
    /// then `visitors`, then objective initialization.
    pub fn finalize(&mut self, visitors: Vec<Box<dyn Visitor>>) -> Result<()> {
        if self.graph.is_finalized() {
            return Err(CoreError::AlreadyFinalized);
        }

        while !self.lazy.is_empty() {
            for (path, body) in std::mem::take(&mut self.lazy) {
                let strategy = self.config.strategy_for(ResourceKind::Function);
                self.define_function(path, strategy, body)?;
            }
        }
        self.flow.seal_all();

        let mut passes: Vec<Box<dyn Visitor>> = Vec::with_capacity(visitors.len() + 2);
        passes.push(Box::new(IfElseLowering::new()));
        passes.extend(visitors);
        passes.push(Box::new(ObjectiveInit::new()));

        let mut ctx = PassContext::new(&self.config, &mut self.flow, &mut self.registers);
        self.graph.finalize_all(&mut passes, &mut ctx)
    }

    /// Finalize and enumerate every resource with its content.
    pub fn generate_resources(&mut self, visitors: Vec<Box<dyn Visitor>>) -> Result<Vec<EmittedResource>> {
        self.finalize(visitors)?;
        self.graph.emitted()
    }

    /// Await dependencies, flush the cache, generate and emit.
    pub async fn save(
        &mut self,
        handler: &dyn FileHandler,
        options: EmitOptions,
        visitors: Vec<Box<dyn Visitor>>,
    ) -> Result<SaveReport> {
        let dependencies = self.await_dependencies().await?;
        if let Some(cache) = &self.cache {
            cache.save()?;
        }
        let resources = self.generate_resources(visitors)?;
        let written = emit(&resources, handler, &options).await?;
        Ok(SaveReport { dependencies, written })
    }
}
