use crate::error::Result;
use crate::media::catalog::{Collection, VideoAsset};
use crate::media::format::{FileRole, LayoutRules};
use crate::media::manifest::{Manifest, ManifestEntry};
use crate::system::fs::Directory;
use crate::system::urls::UrlRegistry;
use tracing::{debug, warn};

/// Turns one collection directory into a [`Collection`].
///
/// Every failure is local to the directory: the loader logs it and returns
/// `None`, it never hands an error back to the catalog build.
#[derive(Debug, Clone)]
pub struct CollectionLoader {
    rules: LayoutRules,
    urls: UrlRegistry,
}

#[derive(Debug, Default)]
struct Members {
    manifest: Option<String>,
    thumbnail: Option<String>,
    videos: Vec<String>,
}

impl CollectionLoader {
    pub fn new(rules: LayoutRules, urls: UrlRegistry) -> Self {
        Self { rules, urls }
    }

    pub async fn load(&self, dir: &dyn Directory, id: &str) -> Option<Collection> {
        let mut minted = Vec::new();
        let result = self.try_load(dir, id, &mut minted).await;

        let collection = match result {
            Ok(collection) => collection,
            Err(e) => {
                warn!("Failed to process folder {}: {}", id, e);
                None
            }
        };
        if collection.is_none() && !minted.is_empty() {
            let released = self.urls.revoke_all(minted.iter().map(String::as_str));
            debug!("Released {} URLs minted for rejected folder {}", released, id);
        }
        collection
    }

    async fn try_load(
        &self,
        dir: &dyn Directory,
        id: &str,
        minted: &mut Vec<String>,
    ) -> Result<Option<Collection>> {
        let members = self.collect_members(dir).await?;
        let (Some(manifest_name), Some(thumbnail_name)) = (&members.manifest, &members.thumbnail)
        else {
            warn!("Incomplete folder structure for {}", id);
            return Ok(None);
        };
        if members.videos.is_empty() {
            warn!("Incomplete folder structure for {}: no video files", id);
            return Ok(None);
        }

        let manifest = Manifest::parse(&dir.read_text(manifest_name).await?)?;

        let thumbnail = dir.file(thumbnail_name).await?;
        let thumbnail_url = self.urls.mint(&thumbnail);
        minted.push(thumbnail_url.clone());

        let preview_url = self.preview(dir, &members.videos).await;
        if let Some(url) = &preview_url {
            minted.push(url.clone());
        }

        let mut assets = Vec::with_capacity(manifest.videos.len());
        for entry in &manifest.videos {
            if let Some(asset) = self.resolve_entry(dir, entry, &members.videos).await {
                minted.push(asset.playable_url.clone());
                assets.push(asset);
            }
        }

        if assets.is_empty() {
            warn!(
                "No supported videos found for {}. Please convert videos to MP4 or WebM format.",
                id
            );
            return Ok(None);
        }

        debug!("Loaded collection {} with {} videos", id, assets.len());
        Ok(Collection::new(
            id,
            manifest.display_title(id),
            thumbnail_url,
            preview_url,
            manifest.version,
            assets,
        ))
    }

    async fn collect_members(&self, dir: &dyn Directory) -> Result<Members> {
        let mut members = Members::default();
        for entry in dir.entries().await? {
            if !entry.is_file() {
                continue;
            }
            match self.rules.role_of(&entry.name) {
                FileRole::Manifest => members.manifest = Some(entry.name),
                FileRole::Thumbnail => members.thumbnail = Some(entry.name),
                FileRole::Video => members.videos.push(entry.name),
                // Sources that declare media types may use any file name.
                FileRole::Other if self.rules.classifier().is_playable(&entry) => {
                    members.videos.push(entry.name)
                }
                FileRole::Other => {}
            }
        }
        Ok(members)
    }

    /// First candidate, in listing order, that opens and passes the classifier.
    async fn preview(&self, dir: &dyn Directory, candidates: &[String]) -> Option<String> {
        for name in candidates {
            match dir.file(name).await {
                Ok(file) if self.rules.classifier().is_playable(&file) => {
                    return Some(self.urls.mint(&file));
                }
                Ok(_) => {}
                Err(e) => warn!("Failed to load preview video {}: {}", name, e),
            }
        }
        None
    }

    async fn resolve_entry(
        &self,
        dir: &dyn Directory,
        entry: &ManifestEntry,
        candidates: &[String],
    ) -> Option<VideoAsset> {
        let Some(resolved) = match_candidate(&entry.filename, candidates) else {
            warn!("Video file not found: {}", entry.filename);
            return None;
        };

        let file = match dir.file(resolved).await {
            Ok(file) => file,
            Err(e) => {
                warn!("Failed to load video {}: {}", entry.filename, e);
                return None;
            }
        };
        if !self.rules.classifier().is_playable(&file) {
            warn!("Unsupported video format: {} - Skipping", entry.filename);
            return None;
        }

        if resolved != entry.filename {
            debug!("Resolved {} to {}", entry.filename, resolved);
        }
        Some(VideoAsset {
            declared_filename: entry.filename.clone(),
            display_name: entry.name.clone(),
            resolved_filename: resolved.to_string(),
            playable_url: self.urls.mint(&file),
        })
    }
}

/// Exact name first; otherwise the first candidate (listing order) starting
/// with the declared name minus its extension, so `clip.mov` finds
/// `clip.webm`. Ambiguous prefixes (`clip.mp4`, `clip2.mp4`) resolve to
/// whichever is listed first.
pub fn match_candidate<'a>(declared: &str, candidates: &'a [String]) -> Option<&'a str> {
    if let Some(exact) = candidates.iter().find(|c| *c == declared) {
        return Some(exact.as_str());
    }
    let base = strip_extension(declared);
    candidates
        .iter()
        .find(|c| c.starts_with(base))
        .map(String::as_str)
}

fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(dot) if dot + 1 < name.len() && !name[dot + 1..].contains('/') => &name[..dot],
        _ => name,
    }
}
