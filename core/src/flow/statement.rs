use crate::builder::BuildCore;
use crate::error::Result;
use crate::flow::chain::ChainId;
use crate::flow::condition::Condition;

/// Handle returned by `BuildCore::if_`, used to continue the chain.
///
/// `else_` consumes the handle, so a sealed chain cannot be extended through
/// it. The id-based `BuildCore::attach_else_if` / `attach_else` report
/// `ChainAlreadySealed` instead.
pub struct IfStatement<'a> {
    core: &'a mut BuildCore,
    chain: ChainId,
}

impl<'a> IfStatement<'a> {
    pub(crate) fn new(core: &'a mut BuildCore, chain: ChainId) -> Self {
        IfStatement { core, chain }
    }

    pub fn chain(&self) -> ChainId {
        self.chain
    }

    pub fn else_if<C, F>(self, condition: C, body: F) -> Result<IfStatement<'a>>
    where
        C: Into<Condition>,
        F: FnOnce(&mut BuildCore) -> Result<()>,
    {
        self.core.attach_else_if(self.chain, condition, body)?;
        Ok(self)
    }

    pub fn else_<F>(self, body: F) -> Result<()>
    where
        F: FnOnce(&mut BuildCore) -> Result<()>,
    {
        self.core.attach_else(self.chain, body)
    }
}
