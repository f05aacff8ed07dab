pub mod chain;
pub mod condition;
pub mod lower;
pub mod statement;

pub use chain::{Branch, BranchKind, ChainId, ChainState, ConditionalChain, FlowRegistry};
pub use condition::Condition;
pub use lower::IfElseLowering;
pub use statement::IfStatement;
