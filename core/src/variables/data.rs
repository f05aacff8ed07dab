use std::fmt;

use crate::variables::nbt::{quote, NumericType};
use crate::variables::score::Score;

/// Holder of structured runtime data.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataTarget {
    /// A storage id such as `ns:temp`.
    Storage(String),
    /// An entity selector.
    Entity(String),
    /// Block coordinates.
    Block(String),
}

impl fmt::Display for DataTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataTarget::Storage(id) => write!(f, "storage {}", id),
            DataTarget::Entity(selector) => write!(f, "entity {}", selector),
            DataTarget::Block(pos) => write!(f, "block {}", pos),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct NbtPath {
    segments: Vec<PathSegment>,
}

impl NbtPath {
    pub fn root() -> Self {
        NbtPath::default()
    }

    /// Parse `a.b[2].c`. Quoted keys are not supported here, use `key`.
    pub fn parse(path: &str) -> Self {
        let mut segments = Vec::new();
        for part in path.split('.').filter(|p| !p.is_empty()) {
            let (key, mut rest) = match part.find('[') {
                Some(at) => (&part[..at], &part[at..]),
                None => (part, ""),
            };
            if !key.is_empty() {
                segments.push(PathSegment::Key(key.to_string()));
            }
            while let Some(close) = rest.find(']') {
                if let Ok(index) = rest[1..close].parse() {
                    segments.push(PathSegment::Index(index));
                }
                rest = &rest[close + 1..];
            }
        }
        NbtPath { segments }
    }

    pub fn key(&self, key: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::Key(key.to_string()));
        NbtPath { segments }
    }

    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::Index(index));
        NbtPath { segments }
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }
}

fn path_key(key: &str) -> String {
    let bare = !key.is_empty()
        && key.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '+'));
    if bare { key.to_string() } else { quote(key) }
}

impl fmt::Display for NbtPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("{}");
        }
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Key(key) if i == 0 => f.write_str(&path_key(key))?,
                PathSegment::Key(key) => write!(f, ".{}", path_key(key))?,
                PathSegment::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

/// One addressable slot of runtime storage: a target plus a path into it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DataPoint {
    pub target: DataTarget,
    pub path: NbtPath,
}

impl DataPoint {
    pub fn new(target: DataTarget, path: &str) -> Self {
        DataPoint { target, path: NbtPath::parse(path) }
    }

    pub fn storage(id: &str, path: &str) -> Self {
        DataPoint::new(DataTarget::Storage(id.to_string()), path)
    }

    pub fn select_key(&self, key: &str) -> Self {
        DataPoint { target: self.target.clone(), path: self.path.key(key) }
    }

    pub fn select_index(&self, index: usize) -> Self {
        DataPoint { target: self.target.clone(), path: self.path.index(index) }
    }

    pub fn set_value(&self, snbt: &str) -> String {
        format!("data modify {} set value {}", self, snbt)
    }

    pub fn insert_value(&self, index: usize, snbt: &str) -> String {
        format!("data modify {} insert {} value {}", self, index, snbt)
    }

    pub fn set_from(&self, source: &DataPoint) -> String {
        format!("data modify {} set from {}", self, source)
    }

    pub fn insert_from(&self, index: usize, source: &DataPoint) -> String {
        format!("data modify {} insert {} from {}", self, index, source)
    }

    pub fn append_from(&self, source: &DataPoint) -> String {
        format!("data modify {} append from {}", self, source)
    }

    pub fn remove(&self) -> String {
        format!("data remove {}", self)
    }

    /// Store `score`, multiplied by `scale` and cast to `numeric`, here.
    pub fn store_score(&self, numeric: NumericType, scale: f64, score: &Score) -> String {
        format!("execute store result {} {} {} run {}", self, numeric, scale, score.get())
    }
}

impl fmt::Display for DataPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.target, self.path)
    }
}
