use crate::error::Result;
use crate::resource::node::Node;
use crate::resource::path::ResourcePath;

/// Body of a function resource.
///
/// Commands are appended to the innermost open capture frame, or to the body
/// itself when no frame is open. Frames hold container bodies (an if-branch,
/// a prepended block) until the construct that opened them closes them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FunctionResource {
    body: Vec<Node>,
    frames: Vec<Vec<Node>>,
}

impl FunctionResource {
    pub fn new() -> Self {
        FunctionResource::default()
    }

    pub fn from_nodes(body: Vec<Node>) -> Self {
        FunctionResource { body, frames: Vec::new() }
    }

    pub fn push(&mut self, node: Node) {
        match self.frames.last_mut() {
            Some(frame) => frame.push(node),
            None => self.body.push(node),
        }
    }

    /// Last node of the innermost open frame, or of the body.
    pub fn last(&self) -> Option<&Node> {
        match self.frames.last() {
            Some(frame) => frame.last(),
            None => self.body.last(),
        }
    }

    pub fn open_frame(&mut self) {
        self.frames.push(Vec::new());
    }

    pub fn close_frame(&mut self) -> Option<Vec<Node>> {
        self.frames.pop()
    }

    pub fn frame_depth(&self) -> usize {
        self.frames.len()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.body
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.iter().all(Node::is_noop)
    }

    pub fn contains_flow(&self) -> bool {
        self.body.iter().any(Node::contains_flow)
    }

    pub fn clear(&mut self) {
        self.body.clear();
        self.frames.clear();
    }

    /// Splice `nodes` before the current body.
    pub fn prepend(&mut self, nodes: Vec<Node>) {
        let rest = std::mem::replace(&mut self.body, nodes);
        self.body.extend(rest);
    }

    /// Fold frames that were never closed into the body and inline blocks.
    /// Chains are kept as-is for the lowering pass.
    pub fn materialize(&mut self) {
        while let Some(frame) = self.frames.pop() {
            self.push(Node::Block(frame));
        }
        let body = std::mem::take(&mut self.body);
        self.body = inline_blocks(body);
    }

    /// Literal command lines of the body.
    pub fn flatten(&self, owner: &ResourcePath) -> Result<Vec<String>> {
        let mut out = Vec::with_capacity(self.body.len());
        for node in &self.body {
            node.flatten_into(&mut out, owner)?;
        }
        Ok(out)
    }

    pub fn render(&self, owner: &ResourcePath) -> Result<String> {
        Ok(self.flatten(owner)?.join("\n"))
    }
}

fn inline_blocks(nodes: Vec<Node>) -> Vec<Node> {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            Node::Block(inner) => out.extend(inline_blocks(inner)),
            other => out.push(other),
        }
    }
    out
}
