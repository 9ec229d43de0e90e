//! Font collection for loading and matching fonts

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use fontdb::{Database, FaceInfo, Source, ID};

use super::source::{DefaultFontSourceFactory, file_uri};
use super::{Font, FontSimulations, FontStretch, FontStyle, FontWeight};
use crate::{Result, ShapingError};

/// Weight at which a regular face gets a bold simulation
const BOLD_SIMULATION_THRESHOLD: u16 = 600;

/// Set of font faces, backed by a `fontdb` database.
///
/// Every face maps to one [`Font`] object per simulation set, so repeated
/// lookups share the face cache entry.
pub struct FontCollection {
    db: Database,
    sources: Arc<DefaultFontSourceFactory>,
    memory_uris: HashMap<ID, String>,
    fonts: Mutex<HashMap<(ID, FontSimulations), Font>>,
}

impl FontCollection {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::with_source_factory(Arc::new(DefaultFontSourceFactory::new()))
    }

    /// Create an empty collection registering in-memory fonts with `sources`
    pub fn with_source_factory(sources: Arc<DefaultFontSourceFactory>) -> Self {
        Self {
            db: Database::new(),
            sources,
            memory_uris: HashMap::new(),
            fonts: Mutex::new(HashMap::new()),
        }
    }

    /// Create a collection with system fonts loaded
    pub fn with_system_fonts() -> Self {
        let mut collection = Self::new();
        collection.load_system_fonts();
        collection
    }

    pub fn load_system_fonts(&mut self) {
        self.db.load_system_fonts();
        tracing::debug!(faces = self.db.len(), "loaded system fonts");
    }

    /// Load a font file
    pub fn load_font_file(&mut self, path: &Path) -> Result<()> {
        self.db.load_font_file(path)?;
        tracing::debug!(path = %path.display(), "loaded font file");
        Ok(())
    }

    /// Load font data from memory, returning the ids of the faces it holds
    pub fn load_font_data(&mut self, data: Vec<u8>) -> Result<Vec<ID>> {
        let data: Arc<[u8]> = data.into();
        let uri = self.sources.register(Arc::clone(&data));

        let source = Source::Binary(Arc::new(data));
        let ids: Vec<ID> = self.db.load_font_source(source).into_iter().collect();
        if ids.is_empty() {
            self.sources.unregister(&uri);
            return Err(ShapingError::FileFormat { uri });
        }

        for id in &ids {
            self.memory_uris.insert(*id, uri.clone());
        }
        tracing::debug!(%uri, faces = ids.len(), "loaded font data");
        Ok(ids)
    }

    /// Source factory that resolves this collection's in-memory fonts
    pub fn source_factory(&self) -> &Arc<DefaultFontSourceFactory> {
        &self.sources
    }

    /// Get face info by ID
    pub fn face_info(&self, id: ID) -> Option<&FaceInfo> {
        self.db.face(id)
    }

    /// List all loaded font families
    pub fn families(&self) -> Vec<&str> {
        let mut families: Vec<&str> = self
            .db
            .faces()
            .filter_map(|face| face.families.first().map(|(name, _)| name.as_str()))
            .collect();
        families.sort_unstable();
        families.dedup();
        families
    }

    /// The font for a face, without simulations
    pub fn font(&self, id: ID) -> Option<Font> {
        self.font_with_simulations(id, FontSimulations::empty())
    }

    /// Best match for the requested family and style. Bold and oblique
    /// simulations are added when the closest face lacks them.
    pub fn first_matching_font(
        &self,
        family: &str,
        weight: FontWeight,
        stretch: FontStretch,
        style: FontStyle,
    ) -> Option<Font> {
        let families = [family_for(family)];
        let id = self.db.query(&fontdb::Query {
            families: &families,
            weight: fontdb::Weight(weight.0),
            stretch: stretch.into(),
            style: style.into(),
        })?;
        let info = self.db.face(id)?;

        let mut simulations = FontSimulations::empty();
        if weight.0 >= BOLD_SIMULATION_THRESHOLD && info.weight.0 < BOLD_SIMULATION_THRESHOLD {
            simulations |= FontSimulations::BOLD;
        }
        if style != FontStyle::Normal && info.style == fontdb::Style::Normal {
            simulations |= FontSimulations::OBLIQUE;
        }

        self.font_with_simulations(id, simulations)
    }

    /// Number of loaded faces
    pub fn len(&self) -> usize {
        self.db.len()
    }

    pub fn is_empty(&self) -> bool {
        self.db.is_empty()
    }

    fn font_with_simulations(&self, id: ID, simulations: FontSimulations) -> Option<Font> {
        let mut fonts = self.fonts.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(font) = fonts.get(&(id, simulations)) {
            return Some(font.clone());
        }

        let info = self.db.face(id)?;
        let uri = self.uri_of(info)?;
        let font = Font::with_attributes(
            &uri,
            info.index,
            FontWeight::from(info.weight.0),
            info.stretch.into(),
            info.style.into(),
            simulations,
        );
        fonts.insert((id, simulations), font.clone());
        Some(font)
    }

    fn uri_of(&self, info: &FaceInfo) -> Option<String> {
        if let Some(uri) = self.memory_uris.get(&info.id) {
            return Some(uri.clone());
        }
        match &info.source {
            Source::File(path) => file_uri(path),
            // Binary data loaded behind our back has no URI we can serve.
            _ => None,
        }
    }
}

impl Default for FontCollection {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FontCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontCollection").field("faces", &self.db.len()).finish()
    }
}

fn family_for(name: &str) -> fontdb::Family<'_> {
    match name {
        "serif" => fontdb::Family::Serif,
        "sans-serif" => fontdb::Family::SansSerif,
        "monospace" => fontdb::Family::Monospace,
        "cursive" => fontdb::Family::Cursive,
        "fantasy" => fontdb::Family::Fantasy,
        _ => fontdb::Family::Name(name),
    }
}
