//! fOS Shaping - Itemization and Glyph Production
//!
//! This crate sits between raw UTF-16 text and renderable glyph runs:
//! - Itemization: splitting text into runs with uniform shaping properties
//! - Glyph shaping through a pluggable engine (rustybuzz by default)
//! - Glyph placement in ideal or display (pixel-snapped) measuring modes
//! - A small process-shared cache of heavyweight font faces

pub mod config;
pub mod engine;
pub mod factory;
pub mod font;
pub mod shaping;
pub mod span;

pub use config::ShapingConfig;
pub use engine::{
    AnalysisSource, EngineError, FeatureRange, FontFeature, FontMetrics, GlyphMetrics,
    GlyphOffsetF, InformationalStringId, Matrix, MeasuringMode, NumberSubstitution,
    NumberSubstitutionMethod, NumberSubstitutionRange, PlacementRequest, ScriptAnalysis,
    ScriptId, ScriptRange, ScriptShapes, ShapeOutput, ShapeRequest, ShapingEngine,
    ShapingGlyphProperties, ShapingTextProperties, TextRange,
};
pub use engine::rustybuzz::{RustybuzzEngine, RustybuzzFace};
pub use factory::Factory;
pub use font::{
    DefaultFontSourceFactory, FaceCache, FaceCacheStats, Font, FontCollection, FontFace, FontFile,
    FontFileLoader, FontFileStream, FontId, FontSimulations, FontSource, FontSourceFactory,
    FontStretch, FontStyle, FontWeight, LocalFontSource, MemoryFontSource, file_uri,
};
pub use shaping::{
    CharAttribute, CharClassification, Classification, GlyphOffset, GlyphPlacements, GlyphRun,
    ItemProperties, ItemizeOptions, RunOptions, ShapedGlyphRun, TextAnalyzer, TextFormattingMode,
    TextItemizer, UnicodeClassification,
};
pub use span::Span;

/// Shaping pipeline error types
#[derive(Debug, thiserror::Error)]
pub enum ShapingError {
    #[error("Shaping engine failure: {0}")]
    Engine(#[from] EngineError),

    #[error("Unsupported or corrupt font file: {uri}")]
    FileFormat { uri: String },

    #[error("Font source I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Fragment {offset}+{size} is outside of a {length} byte font file")]
    FragmentOutOfBounds { offset: u64, size: u64, length: u64 },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Font source unavailable: {0}")]
    FontSource(String),
}

pub type Result<T> = std::result::Result<T, ShapingError>;
