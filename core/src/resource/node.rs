use crate::error::{CoreError, Result};
use crate::flow::chain::ChainId;
use crate::resource::path::ResourcePath;

/// Unit of function IR.
///
/// A node is either a literal command, a container contributing its own
/// command list, or a reference to a conditional chain whose content only
/// exists once the lowering pass has run.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Command(String),
    Block(Vec<Node>),
    Chain(ChainId),
}

impl Node {
    pub fn command(text: impl Into<String>) -> Self {
        Node::Command(text.into())
    }

    /// True when the node contributes no command at all.
    pub fn is_noop(&self) -> bool {
        match self {
            Node::Command(_) | Node::Chain(_) => false,
            Node::Block(nodes) => nodes.iter().all(Node::is_noop),
        }
    }

    pub fn contains_flow(&self) -> bool {
        match self {
            Node::Command(_) => false,
            Node::Chain(_) => true,
            Node::Block(nodes) => nodes.iter().any(Node::contains_flow),
        }
    }

    /// Append the literal commands of this node to `out`. Chains have no
    /// literal form and fail the flattening of `owner`.
    pub fn flatten_into(&self, out: &mut Vec<String>, owner: &ResourcePath) -> Result<()> {
        match self {
            Node::Command(text) => out.push(text.clone()),
            Node::Block(nodes) => {
                for node in nodes {
                    node.flatten_into(out, owner)?;
                }
            }
            Node::Chain(_) => return Err(CoreError::PostProcessingRequired(owner.to_string())),
        }
        Ok(())
    }
}

impl From<String> for Node {
    fn from(text: String) -> Self {
        Node::Command(text)
    }
}

impl From<&str> for Node {
    fn from(text: &str) -> Self {
        Node::Command(text.to_string())
    }
}
