//! Shaping factory
//!
//! Owns the engine, the face cache and the font file loader. Everything that
//! needs a face goes through [`Factory::font_face`].

use std::sync::Arc;

use crate::config::ShapingConfig;
use crate::engine::{FontMetrics, InformationalStringId, ShapingEngine};
use crate::font::{
    DefaultFontSourceFactory, FaceCache, Font, FontCollection, FontFace, FontFile, FontFileLoader,
    FontSimulations,
};
use crate::shaping::TextAnalyzer;
use crate::{Result, ShapingError};

/// Offset of `fsType` in the OS/2 table
const OS2_FS_TYPE_OFFSET: usize = 8;

/// Entry point of the shaping pipeline
pub struct Factory<E: ShapingEngine> {
    engine: E,
    config: ShapingConfig,
    face_cache: FaceCache<E::Face>,
    sources: Arc<DefaultFontSourceFactory>,
    loader: FontFileLoader,
}

impl<E: ShapingEngine> Factory<E> {
    /// Create a factory with the default configuration
    pub fn new(engine: E) -> Self {
        Self::with_config(engine, ShapingConfig::default())
    }

    pub fn with_config(engine: E, config: ShapingConfig) -> Self {
        let sources = Arc::new(DefaultFontSourceFactory::new());
        let loader = FontFileLoader::new(sources.clone());
        Self {
            face_cache: FaceCache::new(config.face_cache_capacity),
            engine,
            config,
            sources,
            loader,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn config(&self) -> &ShapingConfig {
        &self.config
    }

    pub fn face_cache(&self) -> &FaceCache<E::Face> {
        &self.face_cache
    }

    /// Source factory resolving the URIs of this factory's fonts
    pub fn sources(&self) -> &Arc<DefaultFontSourceFactory> {
        &self.sources
    }

    /// Register in-memory font data, returning its URI
    pub fn register_font_data(&self, data: impl Into<Arc<[u8]>>) -> String {
        self.sources.register(data)
    }

    /// Empty font collection sharing this factory's sources
    pub fn font_collection(&self) -> FontCollection {
        FontCollection::with_source_factory(self.sources.clone())
    }

    pub fn text_analyzer(&self) -> TextAnalyzer<'_, E> {
        TextAnalyzer::new(self)
    }

    pub fn create_font_file(&self, uri: &str) -> Result<FontFile> {
        let stream = self.loader.create_stream_from_key(uri)?;
        Ok(FontFile::new(uri, stream))
    }

    /// Create an uncached face
    pub fn create_font_face(
        &self,
        uri: &str,
        face_index: u32,
        simulations: FontSimulations,
    ) -> Result<FontFace<E::Face>> {
        self.create_engine_face(uri, face_index, simulations).map(FontFace::new)
    }

    /// Face for `font`, shared through the face cache
    pub fn font_face(&self, font: &Font) -> Result<FontFace<E::Face>> {
        self.face_cache.get_or_create(font.id(), || {
            self.create_engine_face(font.uri(), font.face_index(), font.simulations())
        })
    }

    /// Release every cached face
    pub fn reset_font_face_cache(&self) {
        self.face_cache.reset();
    }

    /// Design metrics of `font`, computed once
    pub fn font_metrics(&self, font: &Font) -> Result<FontMetrics> {
        if let Some(metrics) = font.metrics_cell().get() {
            return Ok(*metrics);
        }
        let face = self.font_face(font)?;
        let metrics = self.engine.font_metrics(&face);
        Ok(*font.metrics_cell().get_or_init(|| metrics))
    }

    /// GDI-compatible metrics of `font` at a given size
    pub fn display_metrics(&self, font: &Font, em_size: f32, pixels_per_dip: f32) -> Result<FontMetrics> {
        let face = self.font_face(font)?;
        Ok(self.engine.display_font_metrics(&face, em_size, pixels_per_dip))
    }

    /// Whether `font` uses a symbol character map, computed once
    pub fn is_symbol_font(&self, font: &Font) -> Result<bool> {
        if let Some(&is_symbol) = font.is_symbol_cell().get() {
            return Ok(is_symbol);
        }
        let face = self.font_face(font)?;
        let is_symbol = self.engine.is_symbol_font(&face);
        Ok(*font.is_symbol_cell().get_or_init(|| is_symbol))
    }

    pub fn has_character(&self, font: &Font, code_point: u32) -> Result<bool> {
        let face = self.font_face(font)?;
        Ok(self.engine.has_character(&face, code_point))
    }

    /// Nominal glyphs for `code_points`, 0 when missing
    pub fn glyph_indices(&self, font: &Font, code_points: &[u32]) -> Result<Vec<u16>> {
        let face = self.font_face(font)?;
        Ok(self.engine.glyph_indices(&face, code_points))
    }

    pub fn informational_string(&self, font: &Font, id: InformationalStringId) -> Result<Option<String>> {
        let face = self.font_face(font)?;
        Ok(self.engine.informational_string(&face, id))
    }

    /// Font version from the `name` table, 0.0 when missing or unparseable
    pub fn font_version(&self, font: &Font) -> Result<f64> {
        if let Some(&version) = font.version_cell().get() {
            return Ok(version);
        }
        let version = self
            .informational_string(font, InformationalStringId::Version)?
            .map_or(0.0, |s| parse_version(&s));
        Ok(*font.version_cell().get_or_init(|| version))
    }

    /// Raw table data
    pub fn font_table(&self, font: &Font, tag: [u8; 4]) -> Result<Option<Vec<u8>>> {
        let face = self.font_face(font)?;
        Ok(self.engine.font_table(&face, tag))
    }

    /// OS/2 `fsType` embedding permissions, `None` without an OS/2 table
    pub fn font_embedding_rights(&self, font: &Font) -> Result<Option<u16>> {
        let Some(os2) = self.font_table(font, *b"OS/2")? else {
            return Ok(None);
        };
        match os2.get(OS2_FS_TYPE_OFFSET..OS2_FS_TYPE_OFFSET + 2) {
            Some(&[hi, lo]) => Ok(Some(u16::from_be_bytes([hi, lo]))),
            _ => Err(ShapingError::FileFormat { uri: font.uri().to_owned() }),
        }
    }

    fn create_engine_face(&self, uri: &str, face_index: u32, simulations: FontSimulations) -> Result<E::Face> {
        let file = self.create_font_file(uri)?;
        self.engine.create_face(&file, face_index, simulations).map_err(|e| {
            tracing::debug!(%uri, face_index, error = %e, "face creation failed");
            ShapingError::FileFormat { uri: uri.to_owned() }
        })
    }
}

impl<E: ShapingEngine + std::fmt::Debug> std::fmt::Debug for Factory<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Factory")
            .field("engine", &self.engine)
            .field("config", &self.config)
            .field("face_cache", &self.face_cache)
            .finish()
    }
}

/// Parse the number in a version string such as "Version 2.137"
fn parse_version(version: &str) -> f64 {
    version
        .split(' ')
        .next_back()
        .and_then(|token| token.parse().ok())
        .unwrap_or(0.0)
}
