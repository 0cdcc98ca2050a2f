//! Built-in track catalog
//!
//! The set of loops is compiled in and immutable for the process lifetime.
//! Channels are only ever created for ids present in the catalog.

use std::collections::HashSet;

use thiserror::Error;

/// Number of tracks in the built-in catalog
pub const NUM_TRACKS: usize = 14;

/// Track categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Nature,
    Urban,
    Ambient,
    WhiteNoise,
}

impl Category {
    /// All categories in display order
    pub const ALL: [Category; 4] = [
        Category::Nature,
        Category::Urban,
        Category::Ambient,
        Category::WhiteNoise,
    ];

    /// Display label
    pub fn label(&self) -> &'static str {
        match self {
            Category::Nature => "Nature",
            Category::Urban => "Urban",
            Category::Ambient => "Ambient",
            Category::WhiteNoise => "White Noise",
        }
    }
}

/// Static description of one loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackDescriptor {
    /// Unique id, also the channel id and the id stored in mixes
    pub id: String,
    /// Name shown to the user
    pub display_name: String,
    pub category: Category,
    /// Asset reference handed to the audio engine
    pub source: String,
}

impl TrackDescriptor {
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        category: Category,
        source: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            category,
            source: source.into(),
        }
    }
}

const BUILTIN_TRACKS: [(&str, &str, Category); NUM_TRACKS] = [
    ("birds", "Birds Chirping", Category::Nature),
    ("rain", "Gentle Rain", Category::Nature),
    ("waves", "Ocean Waves", Category::Nature),
    ("stream", "Babbling Stream", Category::Nature),
    ("wind", "Forest Wind", Category::Nature),
    ("summer-night", "Summer Night", Category::Nature),
    ("city", "City Ambience", Category::Urban),
    ("coffee-shop", "Coffee Shop", Category::Urban),
    ("train", "Train Journey", Category::Urban),
    ("boat", "Boat Engine", Category::Urban),
    ("fireplace", "Crackling Fire", Category::Ambient),
    ("storm", "Thunder Storm", Category::Ambient),
    ("white-noise", "White Noise", Category::WhiteNoise),
    ("pink-noise", "Pink Noise", Category::WhiteNoise),
];

/// Errors building a custom catalog
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Duplicate track id in catalog: {0}")]
    DuplicateId(String),
}

/// Ordered, id-unique list of tracks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    tracks: Vec<TrackDescriptor>,
}

impl Catalog {
    /// The compiled-in catalog. Assets resolve to `sounds/<id>.mp3`.
    pub fn builtin() -> Self {
        let tracks = BUILTIN_TRACKS
            .iter()
            .map(|(id, name, category)| {
                TrackDescriptor::new(*id, *name, *category, format!("sounds/{}.mp3", id))
            })
            .collect();
        Self { tracks }
    }

    /// Build a catalog from an explicit track list
    pub fn new(tracks: Vec<TrackDescriptor>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for track in &tracks {
            if !seen.insert(track.id.as_str()) {
                return Err(CatalogError::DuplicateId(track.id.clone()));
            }
        }
        Ok(Self { tracks })
    }

    /// Look up a track by id
    pub fn get(&self, id: &str) -> Option<&TrackDescriptor> {
        self.tracks.iter().find(|t| t.id == id)
    }

    /// Position of a track in catalog order
    pub fn position(&self, id: &str) -> Option<usize> {
        self.tracks.iter().position(|t| t.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackDescriptor> {
        self.tracks.iter()
    }

    /// Tracks in one category, in catalog order
    pub fn by_category(&self, category: Category) -> impl Iterator<Item = &TrackDescriptor> {
        self.tracks.iter().filter(move |t| t.category == category)
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}
