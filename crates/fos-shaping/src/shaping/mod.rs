//! Itemization, glyph shaping and placement

mod analyzer;
mod classification;
mod glyphs;
mod item_props;
mod itemizer;
mod placement;

pub use analyzer::{ItemizeOptions, TextAnalyzer};
pub use classification::{CharAttribute, CharClassification, Classification, UnicodeClassification, is_surrogate};
pub use glyphs::{GlyphRun, RunOptions, TextFormattingMode, next_glyph_capacity};
pub use item_props::ItemProperties;
pub use itemizer::TextItemizer;
pub use placement::{GlyphOffset, GlyphPlacements, ShapedGlyphRun};
