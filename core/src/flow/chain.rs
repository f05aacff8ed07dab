use std::fmt;

use crate::error::{CoreError, Result};
use crate::flow::condition::Condition;
use crate::resource::node::Node;
use crate::resource::path::ResourcePath;

/// Handle of a conditional chain inside a `FlowRegistry`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChainId(pub(crate) usize);

impl ChainId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainState {
    Open,
    Sealed,
    Lowered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchKind {
    If,
    ElseIf,
    Else,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    pub kind: BranchKind,
    /// `None` for `Else`.
    pub condition: Option<Condition>,
    pub body: Vec<Node>,
}

impl Branch {
    pub fn is_empty(&self) -> bool {
        self.body.iter().all(Node::is_noop)
    }
}

/// An if / else-if / else sequence, built strictly forward.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalChain {
    pub id: ChainId,
    /// Function the chain was authored in.
    pub owner: ResourcePath,
    branches: Vec<Branch>,
    state: ChainState,
}

impl ConditionalChain {
    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }

    pub fn state(&self) -> ChainState {
        self.state
    }

    pub fn ensure_open(&self) -> Result<()> {
        match self.state {
            ChainState::Open => Ok(()),
            _ => Err(CoreError::ChainAlreadySealed { chain: self.id.0 }),
        }
    }

    fn push_else_if(&mut self, condition: Condition, body: Vec<Node>) -> Result<()> {
        self.ensure_open()?;
        self.branches.push(Branch { kind: BranchKind::ElseIf, condition: Some(condition), body });
        Ok(())
    }

    fn push_else(&mut self, body: Vec<Node>) -> Result<()> {
        self.ensure_open()?;
        self.branches.push(Branch { kind: BranchKind::Else, condition: None, body });
        self.state = ChainState::Sealed;
        Ok(())
    }
}

/// Arena owning every chain of a build. Function bodies refer to chains
/// through `Node::Chain(id)`.
#[derive(Debug, Clone, Default)]
pub struct FlowRegistry {
    chains: Vec<ConditionalChain>,
}

impl FlowRegistry {
    pub fn new() -> Self {
        FlowRegistry::default()
    }

    /// Start a chain with its `If` branch.
    pub fn open(&mut self, owner: ResourcePath, condition: Condition, body: Vec<Node>) -> ChainId {
        let id = ChainId(self.chains.len());
        self.chains.push(ConditionalChain {
            id,
            owner,
            branches: vec![Branch { kind: BranchKind::If, condition: Some(condition), body }],
            state: ChainState::Open,
        });
        log::trace!("opened conditional chain {}", id);
        id
    }

    pub fn get(&self, id: ChainId) -> Result<&ConditionalChain> {
        self.chains.get(id.0).ok_or(CoreError::UnknownChain(id.0))
    }

    fn get_mut(&mut self, id: ChainId) -> Result<&mut ConditionalChain> {
        self.chains.get_mut(id.0).ok_or(CoreError::UnknownChain(id.0))
    }

    pub fn ensure_open(&self, id: ChainId) -> Result<()> {
        self.get(id)?.ensure_open()
    }

    pub fn push_else_if(&mut self, id: ChainId, condition: Condition, body: Vec<Node>) -> Result<()> {
        self.get_mut(id)?.push_else_if(condition, body)
    }

    pub fn push_else(&mut self, id: ChainId, body: Vec<Node>) -> Result<()> {
        self.get_mut(id)?.push_else(body)
    }

    pub fn seal(&mut self, id: ChainId) -> Result<()> {
        let chain = self.get_mut(id)?;
        if chain.state == ChainState::Open {
            chain.state = ChainState::Sealed;
        }
        Ok(())
    }

    /// Seal every still-open chain authored in `owner`.
    pub fn seal_owned_by(&mut self, owner: &ResourcePath) {
        for chain in self.chains.iter_mut().filter(|c| &c.owner == owner) {
            if chain.state == ChainState::Open {
                chain.state = ChainState::Sealed;
            }
        }
    }

    pub fn seal_all(&mut self) {
        for chain in &mut self.chains {
            if chain.state == ChainState::Open {
                chain.state = ChainState::Sealed;
            }
        }
    }

    /// Hand the branches of `id` to the lowering pass and mark it lowered.
    pub fn lower(&mut self, id: ChainId) -> Result<Vec<Branch>> {
        let chain = self.get_mut(id)?;
        chain.state = ChainState::Lowered;
        Ok(chain.branches.clone())
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }
}
