//! Remembers which folder was picked last, for a "welcome back" hint.
//!
//! Only the display name and a timestamp are kept. Access to the folder itself
//! cannot be restored from this record; the user always has to pick it again.

use crate::config::MemoryConfig;
use crate::error::{ReelshelfError, Result};
use crate::system::storage::KeyValueStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const FOLDER_NAME_KEY: &str = "reelshelf-folder";
pub const FOLDER_INFO_KEY: &str = "reelshelf-folder-info";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderMemory {
    #[serde(rename = "name")]
    pub folder_display_name: String,
    #[serde(rename = "timestamp")]
    pub selected_at_epoch_ms: i64,
}

impl FolderMemory {
    pub fn selected_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.selected_at_epoch_ms)
    }

    pub fn welcome_message(&self) -> String {
        match self.selected_at() {
            Some(at) => format!(
                "Welcome back! Last folder: {} (selected {}). Select it again to continue.",
                self.folder_display_name,
                at.format("%Y-%m-%d %H:%M UTC")
            ),
            None => format!(
                "Welcome back! Last folder: {}. Select it again to continue.",
                self.folder_display_name
            ),
        }
    }
}

pub struct FolderMemoryService {
    store: Arc<dyn KeyValueStore>,
    expiry_ms: i64,
}

impl FolderMemoryService {
    pub fn new(store: Arc<dyn KeyValueStore>, config: &MemoryConfig) -> Self {
        Self {
            store,
            expiry_ms: config.expiry_ms(),
        }
    }

    pub fn remember(&self, folder_display_name: &str) -> Result<FolderMemory> {
        self.remember_at(folder_display_name, Utc::now().timestamp_millis())
    }

    pub fn remember_at(&self, folder_display_name: &str, now_ms: i64) -> Result<FolderMemory> {
        let memory = FolderMemory {
            folder_display_name: folder_display_name.to_string(),
            selected_at_epoch_ms: now_ms,
        };
        let encoded =
            serde_json::to_string(&memory).map_err(|e| ReelshelfError::Storage(e.to_string()))?;
        self.store.set(FOLDER_NAME_KEY, folder_display_name)?;
        self.store.set(FOLDER_INFO_KEY, &encoded)?;
        info!("Remembered folder {}", folder_display_name);
        Ok(memory)
    }

    pub fn recall(&self) -> Option<FolderMemory> {
        self.recall_at(Utc::now().timestamp_millis())
    }

    /// Expiry is checked lazily here: a stale record is deleted on read.
    pub fn recall_at(&self, now_ms: i64) -> Option<FolderMemory> {
        let raw = match self.store.get(FOLDER_INFO_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!("Failed to read folder memory: {}", e);
                return None;
            }
        };
        let memory: FolderMemory = match serde_json::from_str(&raw) {
            Ok(memory) => memory,
            Err(e) => {
                warn!("Error parsing saved folder info: {}", e);
                return None;
            }
        };

        // An age that overflows is treated as expired.
        let expired = now_ms
            .checked_sub(memory.selected_at_epoch_ms)
            .map_or(true, |age| age >= self.expiry_ms);
        if expired {
            debug!("Folder memory for {} expired", memory.folder_display_name);
            if let Err(e) = self.forget() {
                warn!("Failed to clear expired folder memory: {}", e);
            }
            return None;
        }
        Some(memory)
    }

    pub fn forget(&self) -> Result<()> {
        self.store.remove(FOLDER_INFO_KEY)?;
        self.store.remove(FOLDER_NAME_KEY)?;
        Ok(())
    }
}
