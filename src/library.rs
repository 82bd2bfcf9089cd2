//! Folder selection: the one entry point the presentation layer drives.
//!
//! A picked folder is validated, built into a catalog, and only then accepted.
//! Accepting a folder remembers its name and replaces the previous catalog,
//! revoking every URL the old one owned.

use crate::config::Config;
use crate::error::{ReelshelfError, Result};
use crate::media::catalog::Catalog;
use crate::media::format::LayoutRules;
use crate::media::loader::CollectionLoader;
use crate::media::scanner::{CatalogBuilder, FolderValidation, FolderValidator};
use crate::memory::{FolderMemory, FolderMemoryService};
use crate::system::fs::Directory;
use crate::system::urls::UrlRegistry;
use tracing::{info, warn};

/// Result of the platform folder picker.
pub enum FolderPick {
    Picked(Box<dyn Directory>),
    Cancelled,
}

pub struct Library {
    validator: FolderValidator,
    builder: CatalogBuilder,
    urls: UrlRegistry,
    memory: FolderMemoryService,
    catalog: Option<Catalog>,
    folder_name: Option<String>,
}

impl Library {
    pub fn new(config: &Config, urls: UrlRegistry, memory: FolderMemoryService) -> Self {
        let rules = LayoutRules::new(&config.library);
        Self {
            validator: FolderValidator::new(rules.clone()),
            builder: CatalogBuilder::new(CollectionLoader::new(rules, urls.clone())),
            urls,
            memory,
            catalog: None,
            folder_name: None,
        }
    }

    /// Returns `Ok(None)` when the picker was cancelled; nothing changes then.
    /// On error the current catalog is kept.
    pub async fn select_folder(&mut self, pick: FolderPick) -> Result<Option<&Catalog>> {
        let folder = match pick {
            FolderPick::Picked(folder) => folder,
            FolderPick::Cancelled => {
                info!("Folder selection cancelled");
                return Ok(None);
            }
        };

        if let FolderValidation::Invalid { reason } = self.validator.validate(folder.as_ref()).await
        {
            warn!("Rejected folder {}: {}", folder.name(), reason);
            return Err(ReelshelfError::InvalidFolder(reason));
        }

        let catalog = self.builder.build(folder.as_ref()).await;
        if catalog.is_empty() {
            warn!("No valid videos found in {}", folder.name());
            return Err(ReelshelfError::NoValidVideos);
        }

        if let Err(e) = self.memory.remember(folder.name()) {
            warn!("Error persisting folder: {}", e);
        }

        self.release_catalog();
        info!(
            "Loaded {} collections from {}",
            catalog.len(),
            folder.name()
        );
        self.folder_name = Some(folder.name().to_string());
        Ok(Some(&*self.catalog.insert(catalog)))
    }

    pub fn catalog(&self) -> Option<&Catalog> {
        self.catalog.as_ref()
    }

    pub fn folder_name(&self) -> Option<&str> {
        self.folder_name.as_deref()
    }

    pub fn urls(&self) -> &UrlRegistry {
        &self.urls
    }

    pub fn welcome_back(&self) -> Option<FolderMemory> {
        self.memory.recall()
    }

    pub fn forget_folder(&self) -> Result<()> {
        self.memory.forget()
    }

    /// Drop the current catalog and revoke its URLs.
    pub fn close(&mut self) {
        self.release_catalog();
        self.folder_name = None;
    }

    fn release_catalog(&mut self) {
        if let Some(old) = self.catalog.take() {
            let revoked = self.urls.revoke_all(old.urls());
            info!("Released {} URLs from previous catalog", revoked);
        }
    }
}

impl Drop for Library {
    fn drop(&mut self) {
        self.release_catalog();
    }
}
