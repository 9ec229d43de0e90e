//! Glyph production for itemized runs

use super::analyzer::TextAnalyzer;
use super::item_props::ItemProperties;
use crate::engine::{
    EngineError, FeatureRange, ShapeOutput, ShapeRequest, ShapingEngine, ShapingGlyphProperties,
    ShapingTextProperties,
};
use crate::font::{Font, FontFace};
use crate::{Result, ShapingError};

pub(crate) const HYPHEN_MINUS: u16 = 0x002D;
pub(crate) const SOFT_HYPHEN: u16 = 0x00AD;

/// Characters drawn with the hyphen glyph in control runs
pub(crate) fn is_hyphen(unit: u16) -> bool {
    unit == HYPHEN_MINUS || unit == SOFT_HYPHEN
}

/// Grow a glyph buffer guess in one step past what the engine's own
/// three doublings would reach
pub fn next_glyph_capacity(max_glyph_count: usize) -> usize {
    max_glyph_count.saturating_mul(27) / 8 + 76
}

/// Text formatting mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextFormattingMode {
    /// Resolution independent metrics
    #[default]
    Ideal,
    /// Pixel-snapped, GDI-compatible metrics
    Display,
}

/// Per-run shaping settings
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions<'a> {
    pub is_sideways: bool,
    pub is_right_to_left: bool,
    /// BCP 47 tag; `None` selects the default mapping
    pub locale: Option<&'a str>,
    /// Feature lists with the code unit length each applies to
    pub features: &'a [FeatureRange<'a>],
    pub formatting_mode: TextFormattingMode,
}

/// Glyphs for one run
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GlyphRun {
    /// First glyph of the cluster each code unit belongs to
    pub cluster_map: Vec<u16>,
    pub text_props: Vec<ShapingTextProperties>,
    pub glyph_indices: Vec<u16>,
    pub glyph_props: Vec<ShapingGlyphProperties>,
    /// Per code unit: the character maps to exactly one glyph of its own
    pub can_glyph_alone: Vec<bool>,
}

impl GlyphRun {
    pub fn glyph_count(&self) -> usize {
        self.glyph_indices.len()
    }
}

impl<E: ShapingEngine> TextAnalyzer<'_, E> {
    /// Shape `text`, one itemized run, with `font`.
    ///
    /// Control runs get one `blank_glyph_index` per code unit, except
    /// hyphens which keep a visible hyphen glyph.
    ///
    /// # Panics
    ///
    /// When `item` has no script analysis.
    pub fn get_glyphs(
        &self,
        text: &[u16],
        item: &ItemProperties,
        font: &Font,
        blank_glyph_index: u16,
        options: &RunOptions<'_>,
    ) -> Result<GlyphRun> {
        let Some(&script) = item.script_analysis() else {
            panic!("glyphs requested for a run without script analysis");
        };

        let face = self.factory.font_face(font)?;
        if !script.requires_shaping() {
            return self.blank_glyphs_for_control_characters(text, &face, blank_glyph_index);
        }

        let engine = self.factory.engine();
        let config = self.factory.config();
        let text_len = text.len();
        let mut max_glyph_count = config.initial_glyph_factor.saturating_mul(text_len);
        let mut locale = options.locale;

        loop {
            let mut run = GlyphRun {
                cluster_map: vec![0; text_len],
                text_props: vec![ShapingTextProperties::default(); text_len],
                glyph_indices: vec![0; max_glyph_count],
                glyph_props: vec![ShapingGlyphProperties::default(); max_glyph_count],
                can_glyph_alone: Vec::new(),
            };
            let request = ShapeRequest {
                text,
                script,
                locale,
                number_substitution: item.number_substitution(),
                is_sideways: options.is_sideways,
                is_right_to_left: options.is_right_to_left,
                features: options.features,
            };
            let output = ShapeOutput {
                cluster_map: &mut run.cluster_map,
                text_props: &mut run.text_props,
                glyph_indices: &mut run.glyph_indices,
                glyph_props: &mut run.glyph_props,
            };

            match engine.shape_glyphs(&face, &request, output) {
                Ok(glyph_count) => {
                    run.glyph_indices.truncate(glyph_count);
                    run.glyph_props.truncate(glyph_count);
                    run.can_glyph_alone = run.text_props.iter().map(|p| p.is_shaped_alone).collect();
                    return Ok(run);
                }
                Err(EngineError::InsufficientBuffer) => {
                    let next = next_glyph_capacity(max_glyph_count);
                    if next <= max_glyph_count {
                        return Err(EngineError::InsufficientBuffer.into());
                    }
                    tracing::debug!(from = max_glyph_count, to = next, "growing glyph buffer");
                    max_glyph_count = next;
                }
                Err(EngineError::InvalidLocale(tag)) if locale.is_some() && config.retry_invalid_locale => {
                    tracing::warn!(locale = %tag, "locale rejected by the shaping engine, using the default mapping");
                    locale = None;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// One glyph per code unit with an identity cluster map
    pub fn blank_glyphs_for_control_characters(
        &self,
        text: &[u16],
        face: &FontFace<E::Face>,
        blank_glyph_index: u16,
    ) -> Result<GlyphRun> {
        let text_len = text.len();
        if text_len > u16::MAX as usize {
            return Err(ShapingError::InvalidArgument(format!(
                "control run of {text_len} code units exceeds the cluster map range"
            )));
        }

        let mut hyphen_glyph = None;
        let glyph_indices = text
            .iter()
            .map(|&unit| {
                if !is_hyphen(unit) {
                    return blank_glyph_index;
                }
                *hyphen_glyph.get_or_insert_with(|| {
                    let indices = self.factory.engine().glyph_indices(face, &[u32::from(HYPHEN_MINUS)]);
                    indices.first().copied().unwrap_or(0)
                })
            })
            .collect();

        Ok(GlyphRun {
            cluster_map: (0..text_len as u16).collect(),
            text_props: vec![
                ShapingTextProperties { is_shaped_alone: true, can_break_shaping_after: true };
                text_len
            ],
            glyph_indices,
            glyph_props: vec![
                ShapingGlyphProperties { is_cluster_start: true, ..Default::default() };
                text_len
            ],
            can_glyph_alone: vec![true; text_len],
        })
    }
}
