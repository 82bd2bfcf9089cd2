use crate::config::LibraryConfig;
use crate::system::fs::MediaFile;

/// Decides whether a file is a playable video.
///
/// A declared media type on the allow-list is authoritative. Otherwise the
/// file name suffix is checked case-insensitively, since most sources never
/// declare a media type at all.
#[derive(Debug, Clone)]
pub struct FormatClassifier {
    extensions: Vec<String>,
    media_types: Vec<String>,
}

impl Default for FormatClassifier {
    fn default() -> Self {
        Self::new(&LibraryConfig::default())
    }
}

impl FormatClassifier {
    pub fn new(config: &LibraryConfig) -> Self {
        Self {
            extensions: config.video_extensions.clone(),
            media_types: config.video_media_types.clone(),
        }
    }

    pub fn is_playable(&self, file: &impl MediaFile) -> bool {
        if let Some(media_type) = file.declared_media_type() {
            if self.media_types.iter().any(|m| m == media_type) {
                return true;
            }
        }
        self.has_video_suffix(file.file_name())
    }

    pub fn has_video_suffix(&self, name: &str) -> bool {
        suffix_in(name, &self.extensions)
    }
}

fn suffix_in(name: &str, extensions: &[String]) -> bool {
    match name.rsplit_once('.') {
        Some((_, ext)) => extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)),
        None => false,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileRole {
    Manifest,
    Thumbnail,
    Video,
    Other,
}

/// Naming rules for the members of a collection directory.
#[derive(Debug, Clone)]
pub struct LayoutRules {
    manifest_name: String,
    thumbnail_stem: String,
    thumbnail_extensions: Vec<String>,
    classifier: FormatClassifier,
}

impl Default for LayoutRules {
    fn default() -> Self {
        Self::new(&LibraryConfig::default())
    }
}

impl LayoutRules {
    pub fn new(config: &LibraryConfig) -> Self {
        Self {
            manifest_name: config.manifest_name.clone(),
            thumbnail_stem: config.thumbnail_stem.clone(),
            thumbnail_extensions: config.thumbnail_extensions.clone(),
            classifier: FormatClassifier::new(config),
        }
    }

    pub fn classifier(&self) -> &FormatClassifier {
        &self.classifier
    }

    pub fn manifest_name(&self) -> &str {
        &self.manifest_name
    }

    pub fn is_manifest(&self, name: &str) -> bool {
        name == self.manifest_name
    }

    pub fn is_thumbnail(&self, name: &str) -> bool {
        match name.rsplit_once('.') {
            Some((stem, _)) => {
                stem.eq_ignore_ascii_case(&self.thumbnail_stem)
                    && suffix_in(name, &self.thumbnail_extensions)
            }
            None => false,
        }
    }

    /// First matching role wins: manifest, then thumbnail, then video suffix.
    pub fn role_of(&self, name: &str) -> FileRole {
        if self.is_manifest(name) {
            FileRole::Manifest
        } else if self.is_thumbnail(name) {
            FileRole::Thumbnail
        } else if self.classifier.has_video_suffix(name) {
            FileRole::Video
        } else {
            FileRole::Other
        }
    }
}
