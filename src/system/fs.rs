//! Capability-style directory access.
//!
//! The loader, builder and validator only ever see a [`Directory`]: something
//! that can list its immediate children (each tagged file or directory), open a
//! child directory, describe a child file and read a child file as text. The
//! real filesystem is one implementation; [`MemoryDirectory`] is a virtual tree
//! used for embedding and tests.

use crate::error::{ReelshelfError, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    File,
    Directory,
}

/// One immediate child of a directory, in listing order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub kind: EntryKind,
    /// Media type declared by the source, if it declares one at all.
    pub media_type: Option<String>,
}

impl DirEntry {
    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// A file that has been opened for materialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub name: String,
    pub media_type: Option<String>,
    pub location: PathBuf,
    pub size_bytes: u64,
}

/// Anything the format classifier can inspect without reading contents.
pub trait MediaFile {
    fn file_name(&self) -> &str;
    fn declared_media_type(&self) -> Option<&str>;
}

impl MediaFile for DirEntry {
    fn file_name(&self) -> &str {
        &self.name
    }

    fn declared_media_type(&self) -> Option<&str> {
        self.media_type.as_deref()
    }
}

impl MediaFile for FileInfo {
    fn file_name(&self) -> &str {
        &self.name
    }

    fn declared_media_type(&self) -> Option<&str> {
        self.media_type.as_deref()
    }
}

#[async_trait]
pub trait Directory: Send + Sync {
    /// Display name of this directory (the last path component).
    fn name(&self) -> &str;

    /// Immediate children in source-defined listing order. Not sorted.
    async fn entries(&self) -> Result<Vec<DirEntry>>;

    async fn subdirectory(&self, name: &str) -> Result<Box<dyn Directory>>;

    async fn file(&self, name: &str) -> Result<FileInfo>;

    async fn read_text(&self, name: &str) -> Result<String>;
}

/// Directory backed by a real OS path.
#[derive(Debug, Clone)]
pub struct LocalDirectory {
    root: PathBuf,
    name: String,
}

impl LocalDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| root.to_string_lossy().to_string());
        Self { root, name }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Resolve a child name, refusing anything that would escape `root`.
    fn child(&self, name: &str) -> Result<PathBuf> {
        let mut components = Path::new(name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(self.root.join(name)),
            _ => Err(ReelshelfError::NotFound(name.to_string())),
        }
    }

    async fn metadata(&self, name: &str) -> Result<(PathBuf, std::fs::Metadata)> {
        let path = self.child(name)?;
        match tokio::fs::metadata(&path).await {
            Ok(meta) => Ok((path, meta)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ReelshelfError::NotFound(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl Directory for LocalDirectory {
    fn name(&self) -> &str {
        &self.name
    }

    async fn entries(&self) -> Result<Vec<DirEntry>> {
        let root = self.root.clone();
        let listing = tokio::task::spawn_blocking(move || -> Result<Vec<DirEntry>> {
            if !std::fs::metadata(&root)?.is_dir() {
                return Err(ReelshelfError::NotADirectory(
                    root.to_string_lossy().to_string(),
                ));
            }

            let mut entries = Vec::new();
            let walker = WalkDir::new(&root)
                .min_depth(1)
                .max_depth(1)
                .follow_links(true);
            for entry in walker {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        warn!("Skipping unreadable entry in {:?}: {}", root, e);
                        continue;
                    }
                };
                let kind = if entry.file_type().is_dir() {
                    EntryKind::Directory
                } else if entry.file_type().is_file() {
                    EntryKind::File
                } else {
                    continue;
                };
                entries.push(DirEntry {
                    name: entry.file_name().to_string_lossy().to_string(),
                    kind,
                    // OS filesystems don't declare media types.
                    media_type: None,
                });
            }
            debug!("Listed {} entries in {:?}", entries.len(), root);
            Ok(entries)
        })
        .await
        .map_err(|e| ReelshelfError::Io(std::io::Error::other(e)))??;

        Ok(listing)
    }

    async fn subdirectory(&self, name: &str) -> Result<Box<dyn Directory>> {
        let (path, meta) = self.metadata(name).await?;
        if !meta.is_dir() {
            return Err(ReelshelfError::NotADirectory(name.to_string()));
        }
        Ok(Box::new(LocalDirectory::new(path)))
    }

    async fn file(&self, name: &str) -> Result<FileInfo> {
        let (path, meta) = self.metadata(name).await?;
        if !meta.is_file() {
            return Err(ReelshelfError::NotAFile(name.to_string()));
        }
        Ok(FileInfo {
            name: name.to_string(),
            media_type: None,
            location: path,
            size_bytes: meta.len(),
        })
    }

    async fn read_text(&self, name: &str) -> Result<String> {
        let path = self.child(name)?;
        Ok(tokio::fs::read_to_string(path).await?)
    }
}

#[derive(Debug, Clone)]
enum MemoryNode {
    File {
        contents: Vec<u8>,
        media_type: Option<String>,
        readable: bool,
    },
    Directory(MemoryDirectory),
}

/// In-memory directory tree. Children keep insertion order, which stands in
/// for filesystem listing order.
#[derive(Debug, Clone)]
pub struct MemoryDirectory {
    name: String,
    location: PathBuf,
    children: Vec<(String, MemoryNode)>,
    listable: bool,
}

impl MemoryDirectory {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            location: PathBuf::from(&name),
            name,
            children: Vec::new(),
            listable: true,
        }
    }

    /// A directory whose listing always fails.
    pub fn unlistable(name: impl Into<String>) -> Self {
        Self {
            listable: false,
            ..Self::new(name)
        }
    }

    pub fn with_file(self, name: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        self.push_file(name.into(), contents.into(), None, true)
    }

    pub fn with_typed_file(
        self,
        name: impl Into<String>,
        media_type: impl Into<String>,
        contents: impl Into<Vec<u8>>,
    ) -> Self {
        self.push_file(name.into(), contents.into(), Some(media_type.into()), true)
    }

    /// A file that lists normally but fails to open or read.
    pub fn with_unreadable_file(self, name: impl Into<String>) -> Self {
        self.push_file(name.into(), Vec::new(), None, false)
    }

    pub fn with_dir(mut self, dir: MemoryDirectory) -> Self {
        self.children
            .push((dir.name.clone(), MemoryNode::Directory(dir)));
        self
    }

    fn push_file(
        mut self,
        name: String,
        contents: Vec<u8>,
        media_type: Option<String>,
        readable: bool,
    ) -> Self {
        self.children.push((
            name,
            MemoryNode::File {
                contents,
                media_type,
                readable,
            },
        ));
        self
    }

    fn node(&self, name: &str) -> Result<&MemoryNode> {
        self.children
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, node)| node)
            .ok_or_else(|| ReelshelfError::NotFound(name.to_string()))
    }

    fn readable_file(&self, name: &str) -> Result<(&[u8], Option<&String>)> {
        match self.node(name)? {
            MemoryNode::File {
                readable: false, ..
            } => Err(ReelshelfError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                format!("{} is not readable", name),
            ))),
            MemoryNode::File {
                contents,
                media_type,
                ..
            } => Ok((contents.as_slice(), media_type.as_ref())),
            MemoryNode::Directory(_) => Err(ReelshelfError::NotAFile(name.to_string())),
        }
    }
}

#[async_trait]
impl Directory for MemoryDirectory {
    fn name(&self) -> &str {
        &self.name
    }

    async fn entries(&self) -> Result<Vec<DirEntry>> {
        if !self.listable {
            return Err(ReelshelfError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                format!("cannot list {}", self.name),
            )));
        }
        Ok(self
            .children
            .iter()
            .map(|(name, node)| match node {
                MemoryNode::File { media_type, .. } => DirEntry {
                    name: name.clone(),
                    kind: EntryKind::File,
                    media_type: media_type.clone(),
                },
                MemoryNode::Directory(_) => DirEntry {
                    name: name.clone(),
                    kind: EntryKind::Directory,
                    media_type: None,
                },
            })
            .collect())
    }

    async fn subdirectory(&self, name: &str) -> Result<Box<dyn Directory>> {
        match self.node(name)? {
            MemoryNode::Directory(dir) => {
                let mut dir = dir.clone();
                dir.location = self.location.join(name);
                Ok(Box::new(dir))
            }
            MemoryNode::File { .. } => Err(ReelshelfError::NotADirectory(name.to_string())),
        }
    }

    async fn file(&self, name: &str) -> Result<FileInfo> {
        let (contents, media_type) = self.readable_file(name)?;
        Ok(FileInfo {
            name: name.to_string(),
            media_type: media_type.cloned(),
            location: self.location.join(name),
            size_bytes: contents.len() as u64,
        })
    }

    async fn read_text(&self, name: &str) -> Result<String> {
        let (contents, _) = self.readable_file(name)?;
        String::from_utf8(contents.to_vec()).map_err(|e| {
            ReelshelfError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })
    }
}
