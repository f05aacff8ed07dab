//! file: core/src/emit.rs
//! description: hands finalized resources to a file handler.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use indexmap::IndexMap;

use crate::error::Result;
use crate::resource::graph::{EmittedResource, ResourceContent};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmitOptions {
    /// Do not hand anything to the handler.
    pub dry: bool,
    /// Log every path and its content.
    pub verbose: bool,
}

/// Destination of emitted files. Paths are relative to the pack root.
#[async_trait(?Send)]
pub trait FileHandler {
    async fn write(&self, relative_path: &str, content: &[u8]) -> Result<()>;
}

/// Writes files under a root directory.
#[derive(Debug, Clone)]
pub struct DirectoryHandler {
    root: PathBuf,
}

impl DirectoryHandler {
    pub fn new(root: impl AsRef<Path>) -> Self {
        DirectoryHandler { root: root.as_ref().to_path_buf() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait(?Send)]
impl FileHandler for DirectoryHandler {
    async fn write(&self, relative_path: &str, content: &[u8]) -> Result<()> {
        let path = self.root.join(relative_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content)?;
        Ok(())
    }
}

/// Keeps written files in memory.
#[derive(Debug, Default)]
pub struct MemoryHandler {
    files: RefCell<IndexMap<String, Vec<u8>>>,
}

impl MemoryHandler {
    pub fn new() -> Self {
        MemoryHandler::default()
    }

    pub fn paths(&self) -> Vec<String> {
        self.files.borrow().keys().cloned().collect()
    }

    pub fn get(&self, relative_path: &str) -> Option<Vec<u8>> {
        self.files.borrow().get(relative_path).cloned()
    }

    pub fn text(&self, relative_path: &str) -> Option<String> {
        self.get(relative_path).and_then(|bytes| String::from_utf8(bytes).ok())
    }

    pub fn len(&self) -> usize {
        self.files.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.borrow().is_empty()
    }
}

#[async_trait(?Send)]
impl FileHandler for MemoryHandler {
    async fn write(&self, relative_path: &str, content: &[u8]) -> Result<()> {
        self.files.borrow_mut().insert(relative_path.to_string(), content.to_vec());
        Ok(())
    }
}

/// Emit `resources` in order. Returns how many files the handler received.
pub async fn emit(
    resources: &[EmittedResource],
    handler: &dyn FileHandler,
    options: &EmitOptions,
) -> Result<usize> {
    let mut written = 0;
    for resource in resources {
        let path = resource.relative_path();
        let bytes = resource.content.to_bytes()?;

        if options.verbose {
            match &resource.content {
                ResourceContent::Bytes(raw) => log::info!("{} ({} bytes)", path, raw.len()),
                _ => log::info!("{}\n{}", path, String::from_utf8_lossy(&bytes)),
            }
        }
        if options.dry {
            continue;
        }

        handler.write(&path, &bytes).await?;
        written += 1;
    }
    log::debug!("emitted {} of {} resource(s)", written, resources.len());
    Ok(written)
}
