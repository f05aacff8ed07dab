//! file: core/src/context.rs
//! description: the stack of currently open functions.
//!
//! Builder calls never receive an explicit target. They read the top of
//! this stack to decide which function a command is appended to, so nested
//! function bodies compose like nested blocks. The stack is owned by one
//! `BuildCore` and is never shared between builds.

use crate::error::{CoreError, Result};
use crate::resource::path::ResourcePath;

#[derive(Debug, Clone, Default)]
pub struct ContextStack {
    functions: Vec<ResourcePath>,
}

impl ContextStack {
    pub fn new() -> Self {
        ContextStack::default()
    }

    pub fn enter(&mut self, function: ResourcePath) {
        log::trace!("enter {}", function);
        self.functions.push(function);
    }

    /// Pop the current function. Leaving with nothing open is a usage error.
    pub fn leave(&mut self) -> Result<ResourcePath> {
        let left = self.functions.pop().ok_or(CoreError::NoActiveContext)?;
        log::trace!("leave {}", left);
        Ok(left)
    }

    pub fn current(&self) -> Result<&ResourcePath> {
        self.functions.last().ok_or(CoreError::NoActiveContext)
    }

    pub fn depth(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub fn contains(&self, function: &ResourcePath) -> bool {
        self.functions.iter().any(|f| f == function)
    }
}
