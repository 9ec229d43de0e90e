//! Glyph placement for shaped runs
//!
//! Advances and offsets come back from the engine as floats in DIPs and are
//! scaled to integer layout units here. Rounding is half-to-even; offsets
//! truncate toward zero.

use super::analyzer::TextAnalyzer;
use super::glyphs::{GlyphRun, HYPHEN_MINUS, RunOptions, TextFormattingMode, is_hyphen};
use super::item_props::ItemProperties;
use crate::engine::{EngineError, GlyphOffsetF, Matrix, MeasuringMode, PlacementRequest, ShapingEngine};
use crate::font::{Font, FontFace};
use crate::{Result, ShapingError};

/// Glyph offset in layout units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct GlyphOffset {
    /// Along the advance direction
    pub du: i32,
    /// Perpendicular to the advance direction, up is positive
    pub dv: i32,
}

/// Advances and offsets for every glyph of a run
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GlyphPlacements {
    pub advances: Vec<i32>,
    pub offsets: Vec<GlyphOffset>,
}

/// Glyphs and placements of one run
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ShapedGlyphRun {
    pub glyphs: GlyphRun,
    pub placements: GlyphPlacements,
}

/// Scale a DIP value to layout units
fn scale_advance(value: f64) -> i32 {
    value.round_ties_even() as i32
}

fn scale_offset(offset: &GlyphOffsetF, scaling_factor: f64) -> GlyphOffset {
    GlyphOffset {
        du: (f64::from(offset.advance_offset) * scaling_factor) as i32,
        dv: (f64::from(offset.ascender_offset) * scaling_factor) as i32,
    }
}

impl<E: ShapingEngine> TextAnalyzer<'_, E> {
    /// Compute advances and offsets for `glyphs`, the result of
    /// [`get_glyphs`](Self::get_glyphs) on the same run.
    ///
    /// `em_size` is in DIPs; results are scaled by `scaling_factor`.
    ///
    /// # Panics
    ///
    /// When `item` has no script analysis.
    #[allow(clippy::too_many_arguments)]
    pub fn get_glyph_placements(
        &self,
        text: &[u16],
        glyphs: &GlyphRun,
        item: &ItemProperties,
        font: &Font,
        em_size: f64,
        scaling_factor: f64,
        pixels_per_dip: f32,
        options: &RunOptions<'_>,
    ) -> Result<GlyphPlacements> {
        let Some(&script) = item.script_analysis() else {
            panic!("placements requested for a run without script analysis");
        };

        let face = self.factory.font_face(font)?;
        if !script.requires_shaping() {
            return self.control_character_placements(
                text,
                glyphs,
                font,
                &face,
                em_size,
                scaling_factor,
                pixels_per_dip,
                options.formatting_mode,
            );
        }

        let glyph_count = glyphs.glyph_count();
        let em_size_in_call = em_size as f32;
        let mode = match options.formatting_mode {
            TextFormattingMode::Ideal => MeasuringMode::Natural,
            TextFormattingMode::Display => MeasuringMode::GdiClassic {
                pixels_per_dip,
                transform: Matrix::IDENTITY,
                use_gdi_natural: false,
            },
        };

        let engine = self.factory.engine();
        let mut advances = vec![0f32; glyph_count];
        let mut offsets = vec![GlyphOffsetF::default(); glyph_count];
        let mut locale = options.locale;

        loop {
            let request = PlacementRequest {
                text,
                cluster_map: &glyphs.cluster_map,
                text_props: &glyphs.text_props,
                glyph_indices: &glyphs.glyph_indices,
                glyph_props: &glyphs.glyph_props,
                em_size: em_size_in_call,
                mode,
                is_sideways: options.is_sideways,
                is_right_to_left: options.is_right_to_left,
                script,
                locale,
                number_substitution: item.number_substitution(),
                features: options.features,
            };

            match engine.compute_placements(&face, &request, &mut advances, &mut offsets) {
                Ok(()) => break,
                Err(EngineError::InvalidLocale(tag))
                    if locale.is_some() && self.factory.config().retry_invalid_locale =>
                {
                    tracing::warn!(locale = %tag, "locale rejected by the shaping engine, using the default mapping");
                    locale = None;
                }
                Err(e) => return Err(e.into()),
            }
        }

        let advances = match options.formatting_mode {
            TextFormattingMode::Ideal => advances
                .iter()
                .map(|&a| scale_advance(f64::from(a) * em_size * scaling_factor / f64::from(em_size_in_call)))
                .collect(),
            // Display metrics already carry the real size.
            TextFormattingMode::Display => advances
                .iter()
                .map(|&a| scale_advance(f64::from(a) * scaling_factor))
                .collect(),
        };
        let offsets = offsets.iter().map(|o| scale_offset(o, scaling_factor)).collect();

        Ok(GlyphPlacements { advances, offsets })
    }

    /// Placements for a control run: zero everywhere except hyphens
    #[allow(clippy::too_many_arguments)]
    fn control_character_placements(
        &self,
        text: &[u16],
        glyphs: &GlyphRun,
        font: &Font,
        face: &FontFace<E::Face>,
        em_size: f64,
        scaling_factor: f64,
        pixels_per_dip: f32,
        formatting_mode: TextFormattingMode,
    ) -> Result<GlyphPlacements> {
        let glyph_count = glyphs.glyph_count();
        if glyph_count != text.len() {
            return Err(ShapingError::InvalidOperation(format!(
                "control run has {glyph_count} glyphs for {} code units",
                text.len()
            )));
        }

        let mut hyphen_advance: Option<i32> = None;
        let mut advances = Vec::with_capacity(glyph_count);
        for &unit in text {
            let advance = if is_hyphen(unit) {
                match hyphen_advance {
                    Some(advance) => advance,
                    None => {
                        let advance = self.hyphen_advance(
                            font,
                            face,
                            em_size,
                            scaling_factor,
                            pixels_per_dip,
                            formatting_mode,
                        )?;
                        *hyphen_advance.insert(advance)
                    }
                }
            } else {
                0
            };
            advances.push(advance);
        }

        Ok(GlyphPlacements { advances, offsets: vec![GlyphOffset::default(); glyph_count] })
    }

    fn hyphen_advance(
        &self,
        font: &Font,
        face: &FontFace<E::Face>,
        em_size: f64,
        scaling_factor: f64,
        pixels_per_dip: f32,
        formatting_mode: TextFormattingMode,
    ) -> Result<i32> {
        let engine = self.factory.engine();
        let glyph = engine
            .glyph_indices(face, &[u32::from(HYPHEN_MINUS)])
            .first()
            .copied()
            .unwrap_or(0);

        let metrics = match formatting_mode {
            TextFormattingMode::Ideal => engine.design_glyph_metrics(face, &[glyph], false),
            TextFormattingMode::Display => {
                engine.display_glyph_metrics(face, em_size as f32, pixels_per_dip, false, &[glyph], false)
            }
        };
        let advance_width = metrics.first().map_or(0, |m| m.advance_width);
        let design_units_per_em = self.factory.font_metrics(font)?.design_units_per_em;
        if design_units_per_em == 0 {
            return Ok(0);
        }

        let pixels_per_dip = f64::from(pixels_per_dip);
        let approximate = (f64::from(advance_width) * em_size / f64::from(design_units_per_em) * pixels_per_dip)
            .round_ties_even()
            / pixels_per_dip;
        Ok(scale_advance(approximate * scaling_factor))
    }

    /// Shape a run and place its glyphs
    #[allow(clippy::too_many_arguments)]
    pub fn get_glyphs_and_placements(
        &self,
        text: &[u16],
        item: &ItemProperties,
        font: &Font,
        blank_glyph_index: u16,
        em_size: f64,
        scaling_factor: f64,
        pixels_per_dip: f32,
        options: &RunOptions<'_>,
    ) -> Result<ShapedGlyphRun> {
        let glyphs = self.get_glyphs(text, item, font, blank_glyph_index, options)?;
        let placements = self.get_glyph_placements(
            text,
            &glyphs,
            item,
            font,
            em_size,
            scaling_factor,
            pixels_per_dip,
            options,
        )?;
        Ok(ShapedGlyphRun { glyphs, placements })
    }
}
