pub mod data;
pub mod nbt;
pub mod resolve;
pub mod score;

pub use data::{DataPoint, DataTarget, NbtPath, PathSegment};
pub use nbt::{NbtValue, NumericType, SequenceKind};
pub use resolve::{resolve_commands, Deferred};
pub use score::{ObjectiveInit, RegisterAllocator, Score, FLOW_OBJECTIVE};
