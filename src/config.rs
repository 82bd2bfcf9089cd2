use crate::error::{ReelshelfError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub library: LibraryConfig,
    pub player: PlayerConfig,
    pub memory: MemoryConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct LibraryConfig {
    pub manifest_name: String,
    pub thumbnail_stem: String,
    pub thumbnail_extensions: Vec<String>, // matched case-insensitively
    pub video_extensions: Vec<String>,
    pub video_media_types: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct PlayerConfig {
    pub controls_hide_ms: u64,
    pub selector_hide_ms: u64,
    pub speed_presets: Vec<f64>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct MemoryConfig {
    pub store_path: PathBuf,
    pub expiry_days: u32,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            manifest_name: "config.json".to_string(),
            thumbnail_stem: "thumbnail".to_string(),
            thumbnail_extensions: vec![
                "png".to_string(),
                "jpg".to_string(),
                "jpeg".to_string(),
                "webp".to_string(),
            ],
            video_extensions: vec!["mp4".to_string(), "webm".to_string()],
            video_media_types: vec!["video/mp4".to_string(), "video/webm".to_string()],
        }
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            controls_hide_ms: 600,
            selector_hide_ms: 300,
            speed_presets: vec![0.25, 0.5, 0.75, 1.0, 1.25, 1.5, 1.75, 2.0],
        }
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("reelshelf-state.json"),
            expiry_days: 7,
        }
    }
}

impl MemoryConfig {
    pub fn expiry_ms(&self) -> i64 {
        i64::from(self.expiry_days) * 24 * 60 * 60 * 1000
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Config =
            toml::from_str(&content).map_err(|e| ReelshelfError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.library.manifest_name.trim().is_empty() {
            return Err(ReelshelfError::Config("library.manifest_name is empty".into()));
        }
        if self.library.video_extensions.is_empty() {
            return Err(ReelshelfError::Config(
                "library.video_extensions must not be empty".into(),
            ));
        }
        if self.library.thumbnail_extensions.is_empty() {
            return Err(ReelshelfError::Config(
                "library.thumbnail_extensions must not be empty".into(),
            ));
        }
        if self.memory.expiry_days == 0 {
            return Err(ReelshelfError::Config("memory.expiry_days must be at least 1".into()));
        }
        if let Some(bad) = self
            .player
            .speed_presets
            .iter()
            .find(|s| !s.is_finite() || **s <= 0.0)
        {
            return Err(ReelshelfError::Config(format!(
                "player.speed_presets contains invalid rate {}",
                bad
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.library.manifest_name, "config.json");
        assert_eq!(config.library.video_extensions, vec!["mp4", "webm"]);
        assert_eq!(config.player.controls_hide_ms, 600);
        assert_eq!(config.memory.expiry_ms(), 604_800_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.player.selector_hide_ms, 300);
    }

    #[test]
    fn test_partial_toml_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reelshelf.toml");
        std::fs::write(&path, "[player]\ncontrols_hide_ms = 1500\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.player.controls_hide_ms, 1500);
        assert_eq!(config.player.selector_hide_ms, 300);
        assert_eq!(config.library.thumbnail_stem, "thumbnail");
    }

    #[test]
    fn test_rejects_bad_speed_preset() {
        let mut config = Config::default();
        config.player.speed_presets.push(0.0);
        assert!(matches!(config.validate(), Err(ReelshelfError::Config(_))));
    }

    #[test]
    fn test_rejects_zero_expiry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reelshelf.toml");
        std::fs::write(&path, "[memory]\nexpiry_days = 0\n").unwrap();
        assert!(Config::load(&path).is_err());
    }
}
