//! Logical fonts, face handles and font sources

mod collection;
mod face;
mod face_cache;
mod file;
mod source;

pub use collection::FontCollection;
pub use face::FontFace;
pub use face_cache::{FaceCache, FaceCacheStats};
pub use file::{FontFile, FontFileLoader, FontFileStream};
pub use source::{
    DefaultFontSourceFactory, FontSource, FontSourceFactory, FontStream, LocalFontSource,
    MemoryFontSource, file_uri,
};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use crate::engine::FontMetrics;

/// Unique identity of a [`Font`] object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FontId(u64);

impl FontId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        FontId(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

/// Font weight (100-900)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FontWeight(pub u16);

impl FontWeight {
    pub const THIN: FontWeight = FontWeight(100);
    pub const EXTRA_LIGHT: FontWeight = FontWeight(200);
    pub const LIGHT: FontWeight = FontWeight(300);
    pub const NORMAL: FontWeight = FontWeight(400);
    pub const MEDIUM: FontWeight = FontWeight(500);
    pub const SEMI_BOLD: FontWeight = FontWeight(600);
    pub const BOLD: FontWeight = FontWeight(700);
    pub const EXTRA_BOLD: FontWeight = FontWeight(800);
    pub const BLACK: FontWeight = FontWeight(900);
}

impl Default for FontWeight {
    fn default() -> Self {
        FontWeight::NORMAL
    }
}

impl From<u16> for FontWeight {
    fn from(value: u16) -> Self {
        FontWeight(value.clamp(100, 900))
    }
}

/// Font style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
    Oblique,
}

impl From<fontdb::Style> for FontStyle {
    fn from(style: fontdb::Style) -> Self {
        match style {
            fontdb::Style::Normal => FontStyle::Normal,
            fontdb::Style::Italic => FontStyle::Italic,
            fontdb::Style::Oblique => FontStyle::Oblique,
        }
    }
}

impl From<FontStyle> for fontdb::Style {
    fn from(style: FontStyle) -> Self {
        match style {
            FontStyle::Normal => fontdb::Style::Normal,
            FontStyle::Italic => fontdb::Style::Italic,
            FontStyle::Oblique => fontdb::Style::Oblique,
        }
    }
}

/// Font stretch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FontStretch {
    UltraCondensed,
    ExtraCondensed,
    Condensed,
    SemiCondensed,
    #[default]
    Normal,
    SemiExpanded,
    Expanded,
    ExtraExpanded,
    UltraExpanded,
}

impl From<fontdb::Stretch> for FontStretch {
    fn from(stretch: fontdb::Stretch) -> Self {
        match stretch {
            fontdb::Stretch::UltraCondensed => FontStretch::UltraCondensed,
            fontdb::Stretch::ExtraCondensed => FontStretch::ExtraCondensed,
            fontdb::Stretch::Condensed => FontStretch::Condensed,
            fontdb::Stretch::SemiCondensed => FontStretch::SemiCondensed,
            fontdb::Stretch::Normal => FontStretch::Normal,
            fontdb::Stretch::SemiExpanded => FontStretch::SemiExpanded,
            fontdb::Stretch::Expanded => FontStretch::Expanded,
            fontdb::Stretch::ExtraExpanded => FontStretch::ExtraExpanded,
            fontdb::Stretch::UltraExpanded => FontStretch::UltraExpanded,
        }
    }
}

impl From<FontStretch> for fontdb::Stretch {
    fn from(stretch: FontStretch) -> Self {
        match stretch {
            FontStretch::UltraCondensed => fontdb::Stretch::UltraCondensed,
            FontStretch::ExtraCondensed => fontdb::Stretch::ExtraCondensed,
            FontStretch::Condensed => fontdb::Stretch::Condensed,
            FontStretch::SemiCondensed => fontdb::Stretch::SemiCondensed,
            FontStretch::Normal => fontdb::Stretch::Normal,
            FontStretch::SemiExpanded => fontdb::Stretch::SemiExpanded,
            FontStretch::Expanded => fontdb::Stretch::Expanded,
            FontStretch::ExtraExpanded => fontdb::Stretch::ExtraExpanded,
            FontStretch::UltraExpanded => fontdb::Stretch::UltraExpanded,
        }
    }
}

bitflags::bitflags! {
    /// Algorithmic styling applied on top of a face
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FontSimulations: u8 {
        const BOLD = 0x01;
        const OBLIQUE = 0x02;
    }
}

/// A logical font: one face of one font file, with its style attributes.
///
/// Cloning is cheap and keeps the identity; the face cache keys on
/// [`Font::id`]. Metrics, the symbol-font flag and the version are computed
/// on first use and remembered.
#[derive(Clone)]
pub struct Font {
    inner: Arc<FontInner>,
}

struct FontInner {
    id: FontId,
    uri: Arc<str>,
    face_index: u32,
    weight: FontWeight,
    stretch: FontStretch,
    style: FontStyle,
    simulations: FontSimulations,
    metrics: OnceLock<FontMetrics>,
    is_symbol: OnceLock<bool>,
    version: OnceLock<f64>,
}

impl Font {
    /// Create a regular font for face `face_index` of the file at `uri`
    pub fn new(uri: &str, face_index: u32) -> Self {
        Self::with_attributes(
            uri,
            face_index,
            FontWeight::NORMAL,
            FontStretch::Normal,
            FontStyle::Normal,
            FontSimulations::empty(),
        )
    }

    pub fn with_attributes(
        uri: &str,
        face_index: u32,
        weight: FontWeight,
        stretch: FontStretch,
        style: FontStyle,
        simulations: FontSimulations,
    ) -> Self {
        Self {
            inner: Arc::new(FontInner {
                id: FontId::next(),
                uri: uri.into(),
                face_index,
                weight,
                stretch,
                style,
                simulations,
                metrics: OnceLock::new(),
                is_symbol: OnceLock::new(),
                version: OnceLock::new(),
            }),
        }
    }

    pub fn id(&self) -> FontId {
        self.inner.id
    }

    /// URI of the font file
    pub fn uri(&self) -> &str {
        &self.inner.uri
    }

    /// Face index inside a font collection file
    pub fn face_index(&self) -> u32 {
        self.inner.face_index
    }

    pub fn weight(&self) -> FontWeight {
        self.inner.weight
    }

    pub fn stretch(&self) -> FontStretch {
        self.inner.stretch
    }

    pub fn style(&self) -> FontStyle {
        self.inner.style
    }

    pub fn simulations(&self) -> FontSimulations {
        self.inner.simulations
    }

    pub(crate) fn metrics_cell(&self) -> &OnceLock<FontMetrics> {
        &self.inner.metrics
    }

    pub(crate) fn is_symbol_cell(&self) -> &OnceLock<bool> {
        &self.inner.is_symbol
    }

    pub(crate) fn version_cell(&self) -> &OnceLock<f64> {
        &self.inner.version
    }
}

impl PartialEq for Font {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for Font {}

impl std::fmt::Debug for Font {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Font")
            .field("id", &self.inner.id)
            .field("uri", &self.inner.uri)
            .field("face_index", &self.inner.face_index)
            .field("weight", &self.inner.weight)
            .field("style", &self.inner.style)
            .finish()
    }
}
