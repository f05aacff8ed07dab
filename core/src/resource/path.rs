use std::fmt;

use serde::{Deserialize, Serialize};

/// The kind of a resource decides its category folder, its file extension
/// and which conflict strategies apply to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Function,
    Advancement,
    LootTable,
    Predicate,
    Recipe,
    Tag,
    Dependency,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 7] = [
        ResourceKind::Function,
        ResourceKind::Advancement,
        ResourceKind::LootTable,
        ResourceKind::Predicate,
        ResourceKind::Recipe,
        ResourceKind::Tag,
        ResourceKind::Dependency,
    ];

    pub fn category(self) -> &'static str {
        match self {
            ResourceKind::Function => "functions",
            ResourceKind::Advancement => "advancements",
            ResourceKind::LootTable => "loot_tables",
            ResourceKind::Predicate => "predicates",
            ResourceKind::Recipe => "recipes",
            ResourceKind::Tag => "tags",
            ResourceKind::Dependency => "dependencies",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ResourceKind::Function => "mcfunction",
            ResourceKind::Dependency => "zip",
            _ => "json",
        }
    }

    /// Function-like resources accept `append` and `prepend`.
    pub fn is_function_like(self) -> bool {
        matches!(self, ResourceKind::Function)
    }

    pub fn env_var(self) -> Option<&'static str> {
        match self {
            ResourceKind::Function => Some("MCFUNCTION_CONFLICT_STRATEGY"),
            ResourceKind::Advancement => Some("ADVANCEMENT_CONFLICT_STRATEGY"),
            ResourceKind::LootTable => Some("LOOT_TABLE_CONFLICT_STRATEGY"),
            ResourceKind::Predicate => Some("PREDICATE_CONFLICT_STRATEGY"),
            ResourceKind::Recipe => Some("RECIPE_CONFLICT_STRATEGY"),
            ResourceKind::Tag => Some("TAG_CONFLICT_STRATEGY"),
            ResourceKind::Dependency => None,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::Function => "function",
            ResourceKind::Advancement => "advancement",
            ResourceKind::LootTable => "loot_table",
            ResourceKind::Predicate => "predicate",
            ResourceKind::Recipe => "recipe",
            ResourceKind::Tag => "tag",
            ResourceKind::Dependency => "dependency",
        };
        f.write_str(name)
    }
}

/// Target path of a resource: `namespace` + `category` + path segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourcePath {
    pub namespace: String,
    pub category: String,
    pub segments: Vec<String>,
}

impl ResourcePath {
    pub fn new(namespace: &str, category: &str, segments: Vec<String>) -> Self {
        ResourcePath {
            namespace: namespace.to_string(),
            category: category.to_string(),
            segments,
        }
    }

    /// Parse `name` as `namespace:a/b` or `a/b`, falling back to
    /// `default_namespace` when no namespace is given.
    pub fn parse(default_namespace: &str, kind: ResourceKind, name: &str) -> Self {
        let (namespace, rest) = match name.split_once(':') {
            Some((ns, rest)) if !ns.is_empty() => (ns, rest),
            Some((_, rest)) => (default_namespace, rest),
            None => (default_namespace, name),
        };
        let segments = rest
            .split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        ResourcePath::new(namespace, kind.category(), segments)
    }

    /// Path relative to the pack root, without extension.
    pub fn relative_path(&self) -> String {
        let mut parts = vec!["data", self.namespace.as_str(), self.category.as_str()];
        parts.extend(self.segments.iter().map(String::as_str));
        parts.join("/")
    }

    /// A path nested under this one, in the same namespace and category.
    pub fn join(&self, segment: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.to_string());
        ResourcePath {
            namespace: self.namespace.clone(),
            category: self.category.clone(),
            segments,
        }
    }
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.segments.join("/"))
    }
}

/// Resource identity: its path plus its file extension.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceKey {
    pub path: ResourcePath,
    pub extension: &'static str,
}

impl ResourceKey {
    pub fn new(path: ResourcePath, kind: ResourceKind) -> Self {
        ResourceKey {
            path,
            extension: kind.extension(),
        }
    }

    pub fn function(path: ResourcePath) -> Self {
        ResourceKey::new(path, ResourceKind::Function)
    }

    pub fn file_name(&self) -> String {
        format!("{}.{}", self.path.relative_path(), self.extension)
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.path, self.extension)
    }
}
