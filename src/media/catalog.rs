use serde::Serialize;

/// One manifest entry resolved to an actual loadable file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoAsset {
    pub declared_filename: String,
    pub display_name: String,
    pub resolved_filename: String,
    pub playable_url: String,
}

/// A playable group of videos sharing a manifest, thumbnail and directory.
///
/// Always holds at least one asset; [`Collection::new`] refuses to build an
/// empty one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Collection {
    id: String,
    title: String,
    thumbnail_url: String,
    preview_url: Option<String>,
    manifest_version: i64,
    assets: Vec<VideoAsset>,
}

impl Collection {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        thumbnail_url: impl Into<String>,
        preview_url: Option<String>,
        manifest_version: i64,
        assets: Vec<VideoAsset>,
    ) -> Option<Self> {
        if assets.is_empty() {
            return None;
        }
        Some(Self {
            id: id.into(),
            title: title.into(),
            thumbnail_url: thumbnail_url.into(),
            preview_url,
            manifest_version,
            assets,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn thumbnail_url(&self) -> &str {
        &self.thumbnail_url
    }

    pub fn preview_url(&self) -> Option<&str> {
        self.preview_url.as_deref()
    }

    pub fn manifest_version(&self) -> i64 {
        self.manifest_version
    }

    /// Assets in manifest order, which is the playback order.
    pub fn assets(&self) -> &[VideoAsset] {
        &self.assets
    }

    pub fn asset(&self, index: usize) -> Option<&VideoAsset> {
        self.assets.get(index)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Assets whose display name contains `term`, ignoring case, with their
    /// playback index. An empty term matches everything.
    pub fn search(&self, term: &str) -> Vec<(usize, &VideoAsset)> {
        let needle = term.to_lowercase();
        self.assets
            .iter()
            .enumerate()
            .filter(|(_, asset)| asset.display_name.to_lowercase().contains(&needle))
            .collect()
    }

    /// Every URL this collection owns.
    pub fn urls(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.thumbnail_url.as_str())
            .chain(self.preview_url.as_deref())
            .chain(self.assets.iter().map(|a| a.playable_url.as_str()))
    }
}

/// Collections discovered from one folder selection, in directory-listing
/// order. Built once and replaced wholesale.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Catalog {
    collections: Vec<Collection>,
}

impl Catalog {
    pub fn new(collections: Vec<Collection>) -> Self {
        Self { collections }
    }

    pub fn collections(&self) -> &[Collection] {
        &self.collections
    }

    pub fn get(&self, id: &str) -> Option<&Collection> {
        self.collections.iter().find(|c| c.id == id)
    }

    pub fn len(&self) -> usize {
        self.collections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Collection> {
        self.collections.iter()
    }

    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.collections.iter().flat_map(Collection::urls)
    }

    /// A copy holding only assets matching `term` (see [`Collection::search`]).
    /// Collections left without assets are dropped. The copy shares URLs with
    /// `self` and does not own them.
    pub fn filtered(&self, term: &str) -> Catalog {
        let collections = self
            .collections
            .iter()
            .filter_map(|c| {
                let assets = c.search(term).into_iter().map(|(_, a)| a.clone()).collect();
                Collection::new(
                    c.id.clone(),
                    c.title.clone(),
                    c.thumbnail_url.clone(),
                    c.preview_url.clone(),
                    c.manifest_version,
                    assets,
                )
            })
            .collect();
        Catalog::new(collections)
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a Collection;
    type IntoIter = std::slice::Iter<'a, Collection>;

    fn into_iter(self) -> Self::IntoIter {
        self.collections.iter()
    }
}
