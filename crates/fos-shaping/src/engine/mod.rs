//! Shaping engine contract
//!
//! The engine is the heavyweight collaborator that knows about scripts,
//! OpenType tables and glyph positioning. Everything in this crate talks to
//! it through [`ShapingEngine`]; the default implementation lives in
//! [`rustybuzz`].

pub mod rustybuzz;

use std::sync::Arc;

use crate::font::{FontFile, FontSimulations};

/// Shaping engine failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// The caller-provided glyph buffer is too small; retry with a larger one.
    #[error("glyph buffer too small")]
    InsufficientBuffer,

    /// The locale tag is not supported by the engine.
    #[error("unsupported locale: {0}")]
    InvalidLocale(String),

    #[error("{0}")]
    Failed(String),
}

/// Half-open `[start, end)` range of UTF-16 code unit indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextRange {
    pub start: u32,
    pub end: u32,
}

impl TextRange {
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn contains(&self, position: u32) -> bool {
        self.start <= position && position < self.end
    }
}

/// Script identifier: an ISO 15924 tag packed big-endian
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScriptId(pub u32);

impl ScriptId {
    pub const COMMON: ScriptId = ScriptId::from_tag(b"Zyyy");
    pub const UNKNOWN: ScriptId = ScriptId::from_tag(b"Zzzz");

    pub const fn from_tag(tag: &[u8; 4]) -> Self {
        ScriptId(u32::from_be_bytes(*tag))
    }

    pub fn tag(&self) -> [u8; 4] {
        self.0.to_be_bytes()
    }
}

/// Whether a script range needs real glyph shaping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScriptShapes {
    /// Regular text, shaped by the engine
    #[default]
    Default,
    /// Control characters with no visual; rendered as blank glyphs
    NoVisual,
}

/// Result of script analysis for one range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScriptAnalysis {
    pub script: ScriptId,
    pub shapes: ScriptShapes,
}

impl ScriptAnalysis {
    pub fn new(script: ScriptId, shapes: ScriptShapes) -> Self {
        Self { script, shapes }
    }

    /// False for control-character ranges
    pub fn requires_shaping(&self) -> bool {
        self.shapes == ScriptShapes::Default
    }
}

/// A script-analysis range reported by the engine
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScriptRange {
    pub range: TextRange,
    pub analysis: ScriptAnalysis,
}

/// How digits are substituted for a culture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NumberSubstitutionMethod {
    /// Let the culture decide
    #[default]
    FromCulture,
    /// Substitute based on the preceding strong text
    Contextual,
    /// Never substitute
    None,
    /// Native national digits of the culture
    National,
    /// Traditional digits of the script
    Traditional,
}

#[derive(Debug)]
struct NumberSubstitutionInfo {
    method: NumberSubstitutionMethod,
    locale: Option<String>,
}

/// Opaque number substitution handle.
///
/// Two handles are equal only when they are the same engine object, so runs
/// analyzed in one pass compare equal while equivalent settings from different
/// passes do not.
#[derive(Debug, Clone)]
pub struct NumberSubstitution(Arc<NumberSubstitutionInfo>);

impl NumberSubstitution {
    pub fn new(method: NumberSubstitutionMethod, locale: Option<&str>) -> Self {
        Self(Arc::new(NumberSubstitutionInfo { method, locale: locale.map(str::to_owned) }))
    }

    pub fn method(&self) -> NumberSubstitutionMethod {
        self.0.method
    }

    pub fn locale(&self) -> Option<&str> {
        self.0.locale.as_deref()
    }
}

impl PartialEq for NumberSubstitution {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for NumberSubstitution {}

/// A number-substitution range reported by the engine
#[derive(Debug, Clone, PartialEq)]
pub struct NumberSubstitutionRange {
    pub range: TextRange,
    pub substitution: NumberSubstitution,
}

/// Text plus the paragraph settings the analysis passes need
#[derive(Debug, Clone, Copy)]
pub struct AnalysisSource<'a> {
    pub text: &'a [u16],
    pub culture: Option<&'a str>,
    pub is_right_to_left: bool,
    pub number_culture: Option<&'a str>,
    pub ignore_user_override: bool,
    pub number_substitution_method: NumberSubstitutionMethod,
}

/// Per-character shaping output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShapingTextProperties {
    /// The character forms a cluster on its own and maps to a single glyph
    pub is_shaped_alone: bool,
    /// Shaping may be split after this character
    pub can_break_shaping_after: bool,
}

/// Per-glyph shaping output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShapingGlyphProperties {
    pub is_cluster_start: bool,
    pub is_diacritic: bool,
    pub is_zero_width_space: bool,
}

/// OpenType feature tag with its parameter (0 disables, 1 enables, n picks an alternate)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FontFeature {
    pub tag: [u8; 4],
    pub parameter: u32,
}

impl FontFeature {
    pub const fn new(tag: &[u8; 4], parameter: u32) -> Self {
        Self { tag: *tag, parameter }
    }
}

/// Features applied to the next `length` code units
#[derive(Debug, Clone, Copy)]
pub struct FeatureRange<'a> {
    pub features: &'a [FontFeature],
    pub length: u32,
}

/// Glyph metrics in design units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GlyphMetrics {
    pub left_side_bearing: i32,
    pub advance_width: u32,
    pub right_side_bearing: i32,
    pub top_side_bearing: i32,
    pub advance_height: u32,
    pub bottom_side_bearing: i32,
    pub vertical_origin_y: i32,
}

/// Face-wide metrics in design units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FontMetrics {
    pub design_units_per_em: u16,
    pub ascent: u16,
    pub descent: u16,
    pub line_gap: i16,
    pub cap_height: u16,
    pub x_height: u16,
    pub underline_position: i16,
    pub underline_thickness: u16,
    pub strikethrough_position: i16,
    pub strikethrough_thickness: u16,
}

/// Glyph offset produced by the engine, in DIPs at the requested em size
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GlyphOffsetF {
    pub advance_offset: f32,
    pub ascender_offset: f32,
}

/// 2D affine transform
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    pub m11: f32,
    pub m12: f32,
    pub m21: f32,
    pub m22: f32,
    pub dx: f32,
    pub dy: f32,
}

impl Matrix {
    pub const IDENTITY: Matrix = Matrix { m11: 1.0, m12: 0.0, m21: 0.0, m22: 1.0, dx: 0.0, dy: 0.0 };
}

/// How the engine measures glyphs
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MeasuringMode {
    /// Resolution independent outlines
    Natural,
    /// Pixel-hinted, GDI-compatible metrics
    GdiClassic {
        pixels_per_dip: f32,
        transform: Matrix,
        use_gdi_natural: bool,
    },
}

/// Name table strings a face can expose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InformationalStringId {
    Copyright,
    Version,
    Trademark,
    FamilyName,
    FullName,
    PostscriptName,
}

impl InformationalStringId {
    /// OpenType `name` table id
    pub fn name_id(&self) -> u16 {
        match self {
            InformationalStringId::Copyright => 0,
            InformationalStringId::FamilyName => 1,
            InformationalStringId::FullName => 4,
            InformationalStringId::Version => 5,
            InformationalStringId::PostscriptName => 6,
            InformationalStringId::Trademark => 7,
        }
    }
}

/// Input of [`ShapingEngine::shape_glyphs`]
#[derive(Debug, Clone, Copy)]
pub struct ShapeRequest<'a> {
    pub text: &'a [u16],
    pub script: ScriptAnalysis,
    /// `None` asks for the engine's default mapping
    pub locale: Option<&'a str>,
    pub number_substitution: Option<&'a NumberSubstitution>,
    pub is_sideways: bool,
    pub is_right_to_left: bool,
    pub features: &'a [FeatureRange<'a>],
}

/// Caller-owned buffers [`ShapingEngine::shape_glyphs`] writes into.
///
/// `cluster_map` and `text_props` have one slot per code unit; the glyph
/// buffers have `max_glyph_count` slots.
#[derive(Debug)]
pub struct ShapeOutput<'a> {
    pub cluster_map: &'a mut [u16],
    pub text_props: &'a mut [ShapingTextProperties],
    pub glyph_indices: &'a mut [u16],
    pub glyph_props: &'a mut [ShapingGlyphProperties],
}

impl ShapeOutput<'_> {
    pub fn max_glyph_count(&self) -> usize {
        self.glyph_indices.len().min(self.glyph_props.len())
    }
}

/// Input of [`ShapingEngine::compute_placements`]
#[derive(Debug, Clone, Copy)]
pub struct PlacementRequest<'a> {
    pub text: &'a [u16],
    pub cluster_map: &'a [u16],
    pub text_props: &'a [ShapingTextProperties],
    pub glyph_indices: &'a [u16],
    pub glyph_props: &'a [ShapingGlyphProperties],
    pub em_size: f32,
    pub mode: MeasuringMode,
    pub is_sideways: bool,
    pub is_right_to_left: bool,
    pub script: ScriptAnalysis,
    pub locale: Option<&'a str>,
    /// Same substitution the glyphs were shaped with
    pub number_substitution: Option<&'a NumberSubstitution>,
    pub features: &'a [FeatureRange<'a>],
}

/// A font shaping engine.
///
/// Implementations must be callable from several threads at once.
pub trait ShapingEngine: Send + Sync {
    /// Shaping-capable face object. Dropping it releases the native resource.
    type Face: Send + Sync;

    /// Ordered, disjoint script ranges covering the text
    fn analyze_script(&self, source: &AnalysisSource<'_>) -> Result<Vec<ScriptRange>, EngineError>;

    /// Ordered, disjoint number substitution ranges
    fn analyze_number_substitution(
        &self,
        source: &AnalysisSource<'_>,
    ) -> Result<Vec<NumberSubstitutionRange>, EngineError>;

    fn create_face(
        &self,
        file: &FontFile,
        face_index: u32,
        simulations: FontSimulations,
    ) -> Result<Self::Face, EngineError>;

    /// Shape `request.text` into `output`, returning the glyph count.
    ///
    /// Fails with [`EngineError::InsufficientBuffer`] when the glyph buffers
    /// cannot hold the result.
    fn shape_glyphs(
        &self,
        face: &Self::Face,
        request: &ShapeRequest<'_>,
        output: ShapeOutput<'_>,
    ) -> Result<usize, EngineError>;

    /// Fill `advances` and `offsets` (one slot per glyph) in DIPs at `request.em_size`
    fn compute_placements(
        &self,
        face: &Self::Face,
        request: &PlacementRequest<'_>,
        advances: &mut [f32],
        offsets: &mut [GlyphOffsetF],
    ) -> Result<(), EngineError>;

    /// Nominal glyph for each code point, 0 when missing
    fn glyph_indices(&self, face: &Self::Face, code_points: &[u32]) -> Vec<u16>;

    fn design_glyph_metrics(
        &self,
        face: &Self::Face,
        glyph_indices: &[u16],
        is_sideways: bool,
    ) -> Vec<GlyphMetrics>;

    /// Design unit metrics adjusted to the pixel grid of `em_size * pixels_per_dip`
    fn display_glyph_metrics(
        &self,
        face: &Self::Face,
        em_size: f32,
        pixels_per_dip: f32,
        use_gdi_natural: bool,
        glyph_indices: &[u16],
        is_sideways: bool,
    ) -> Vec<GlyphMetrics>;

    fn font_metrics(&self, face: &Self::Face) -> FontMetrics;

    fn display_font_metrics(&self, face: &Self::Face, _em_size: f32, _pixels_per_dip: f32) -> FontMetrics {
        self.font_metrics(face)
    }

    fn is_symbol_font(&self, _face: &Self::Face) -> bool {
        false
    }

    fn has_character(&self, face: &Self::Face, code_point: u32) -> bool {
        self.glyph_indices(face, &[code_point]).first().is_some_and(|&g| g != 0)
    }

    fn font_table(&self, _face: &Self::Face, _tag: [u8; 4]) -> Option<Vec<u8>> {
        None
    }

    fn informational_string(&self, _face: &Self::Face, _id: InformationalStringId) -> Option<String> {
        None
    }
}
