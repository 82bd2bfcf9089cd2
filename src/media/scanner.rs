use crate::media::catalog::Catalog;
use crate::media::format::LayoutRules;
use crate::media::loader::CollectionLoader;
use crate::system::fs::Directory;
use tracing::{debug, error, info, warn};

pub const INVALID_FOLDER_MESSAGE: &str = "No valid video folders found. Each folder must contain config.json, thumbnail image, and video files in MP4 or WebM format.";
pub const VALIDATION_FAILED_MESSAGE: &str = "Failed to validate folder structure";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FolderValidation {
    Valid,
    Invalid { reason: String },
}

impl FolderValidation {
    pub fn is_valid(&self) -> bool {
        matches!(self, FolderValidation::Valid)
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            FolderValidation::Valid => None,
            FolderValidation::Invalid { reason } => Some(reason.as_str()),
        }
    }
}

/// Cheap pre-check run before a full catalog build.
///
/// Stops at the first subdirectory that has a manifest, a thumbnail and at
/// least one playable file among its immediate children. Nothing is read or
/// materialized.
#[derive(Debug, Clone, Default)]
pub struct FolderValidator {
    rules: LayoutRules,
}

impl FolderValidator {
    pub fn new(rules: LayoutRules) -> Self {
        Self { rules }
    }

    pub async fn validate(&self, folder: &dyn Directory) -> FolderValidation {
        let entries = match folder.entries().await {
            Ok(entries) => entries,
            Err(e) => {
                error!("Failed to list {}: {}", folder.name(), e);
                return FolderValidation::Invalid {
                    reason: VALIDATION_FAILED_MESSAGE.to_string(),
                };
            }
        };

        for entry in entries.iter().filter(|e| e.is_dir()) {
            if self.has_minimal_shape(folder, &entry.name).await {
                debug!("Folder {} qualifies via {}", folder.name(), entry.name);
                return FolderValidation::Valid;
            }
        }

        FolderValidation::Invalid {
            reason: INVALID_FOLDER_MESSAGE.to_string(),
        }
    }

    async fn has_minimal_shape(&self, folder: &dyn Directory, name: &str) -> bool {
        let children = match folder.subdirectory(name).await {
            Ok(dir) => dir.entries().await,
            Err(e) => Err(e),
        };
        let children = match children {
            Ok(children) => children,
            Err(e) => {
                warn!("Skipping {} during validation: {}", name, e);
                return false;
            }
        };

        let mut has_manifest = false;
        let mut has_thumbnail = false;
        let mut has_video = false;
        for child in children.iter().filter(|c| c.is_file()) {
            has_manifest |= self.rules.is_manifest(&child.name);
            has_thumbnail |= self.rules.is_thumbnail(&child.name);
            has_video |= self.rules.classifier().is_playable(child);
        }
        has_manifest && has_thumbnail && has_video
    }
}

/// Builds a [`Catalog`] from the immediate subdirectories of a folder.
///
/// Subdirectories are loaded one at a time in listing order. That order comes
/// from the source and is not sorted, so it may differ between platforms.
/// A subdirectory that fails to load is logged and skipped; the build itself
/// never fails and may return an empty catalog.
#[derive(Debug, Clone)]
pub struct CatalogBuilder {
    loader: CollectionLoader,
}

impl CatalogBuilder {
    pub fn new(loader: CollectionLoader) -> Self {
        Self { loader }
    }

    pub async fn build(&self, folder: &dyn Directory) -> Catalog {
        info!("Scanning folder: {}", folder.name());
        let entries = match folder.entries().await {
            Ok(entries) => entries,
            Err(e) => {
                error!("Failed to list {}: {}", folder.name(), e);
                return Catalog::default();
            }
        };

        let mut collections = Vec::new();
        for entry in entries.into_iter().filter(|e| e.is_dir()) {
            let dir = match folder.subdirectory(&entry.name).await {
                Ok(dir) => dir,
                Err(e) => {
                    warn!("Failed to load video data for {}: {}", entry.name, e);
                    continue;
                }
            };
            if let Some(collection) = self.loader.load(dir.as_ref(), &entry.name).await {
                collections.push(collection);
            }
        }

        info!(
            "Found {} collections in {}",
            collections.len(),
            folder.name()
        );
        Catalog::new(collections)
    }
}
