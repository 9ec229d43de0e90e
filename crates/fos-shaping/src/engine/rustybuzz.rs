//! Shaping engine backed by rustybuzz
//!
//! Script analysis uses `unicode-script`, metrics come straight from
//! `ttf-parser`, and shaping and positioning run through rustybuzz.

use std::str::FromStr;
use std::sync::Arc;

use rustybuzz::{Direction, Feature, GlyphBuffer, Language, UnicodeBuffer};
use ttf_parser::{GlyphId, Tag};
use unicode_properties::{GeneralCategory, UnicodeGeneralCategory};
use unicode_script::{Script, UnicodeScript};

use super::{
    AnalysisSource, EngineError, FeatureRange, FontMetrics, GlyphMetrics, GlyphOffsetF,
    InformationalStringId, MeasuringMode, NumberSubstitution, NumberSubstitutionMethod,
    NumberSubstitutionRange, PlacementRequest, ScriptAnalysis, ScriptId, ScriptRange,
    ScriptShapes, ShapeOutput, ShapeRequest, ShapingEngine, ShapingGlyphProperties,
    ShapingTextProperties, TextRange,
};
use crate::font::{FontFile, FontSimulations};

const SOFT_HYPHEN: char = '\u{00AD}';
const ZERO_WIDTH_SPACE: char = '\u{200B}';

/// Face data kept by [`RustybuzzEngine`]. Parsing is cheap, so the tables
/// are re-read per call rather than holding a self-borrowing face.
pub struct RustybuzzFace {
    data: Arc<[u8]>,
    face_index: u32,
    simulations: FontSimulations,
    uri: Arc<str>,
}

impl RustybuzzFace {
    /// Wrap font data, failing when face `face_index` cannot be parsed
    pub fn from_data(
        uri: &str,
        data: impl Into<Arc<[u8]>>,
        face_index: u32,
        simulations: FontSimulations,
    ) -> Result<Self, EngineError> {
        let face = Self { data: data.into(), face_index, simulations, uri: uri.into() };
        face.parse()?;
        Ok(face)
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn face_index(&self) -> u32 {
        self.face_index
    }

    pub fn simulations(&self) -> FontSimulations {
        self.simulations
    }

    fn parse(&self) -> Result<ttf_parser::Face<'_>, EngineError> {
        ttf_parser::Face::parse(&self.data, self.face_index)
            .map_err(|e| EngineError::Failed(format!("{}: {e}", self.uri)))
    }

    fn shaper(&self) -> Result<rustybuzz::Face<'_>, EngineError> {
        Ok(rustybuzz::Face::from_face(self.parse()?))
    }
}

impl std::fmt::Debug for RustybuzzFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RustybuzzFace")
            .field("uri", &self.uri)
            .field("face_index", &self.face_index)
            .field("len", &self.data.len())
            .finish()
    }
}

/// The default shaping engine
#[derive(Debug, Clone, Copy, Default)]
pub struct RustybuzzEngine;

impl RustybuzzEngine {
    pub fn new() -> Self {
        Self
    }
}

/// Script class of a character for run building
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharScript {
    /// Control characters; no visual
    Control,
    /// Common and inherited characters; take the script of their neighbours
    Neutral,
    Script(ScriptId),
}

fn char_script(ch: char) -> CharScript {
    if ch == SOFT_HYPHEN
        || matches!(
            ch.general_category(),
            GeneralCategory::Control | GeneralCategory::LineSeparator | GeneralCategory::ParagraphSeparator
        )
    {
        return CharScript::Control;
    }

    match ch.script() {
        Script::Common | Script::Inherited | Script::Unknown => CharScript::Neutral,
        script => CharScript::Script(script_id(script)),
    }
}

fn script_id(script: Script) -> ScriptId {
    <&[u8; 4]>::try_from(script.short_name().as_bytes())
        .map(ScriptId::from_tag)
        .unwrap_or(ScriptId::UNKNOWN)
}

/// Decode UTF-16, yielding each character with its code unit offset and width.
/// Unpaired surrogates decode to U+FFFD.
fn decode(text: &[u16]) -> impl Iterator<Item = (usize, usize, char)> + '_ {
    let mut offset = 0;
    char::decode_utf16(text.iter().copied()).map(move |decoded| {
        let (ch, width) = match decoded {
            Ok(ch) => (ch, ch.len_utf16()),
            Err(_) => (char::REPLACEMENT_CHARACTER, 1),
        };
        let start = offset;
        offset += width;
        (start, width, ch)
    })
}

fn push_or_extend(ranges: &mut Vec<ScriptRange>, start: u32, end: u32, analysis: ScriptAnalysis) {
    match ranges.last_mut() {
        Some(last) if last.analysis == analysis && last.range.end == start => last.range.end = end,
        _ => ranges.push(ScriptRange { range: TextRange::new(start, end), analysis }),
    }
}

/// Zero of the native digit set used for `locale`
fn native_digit_zero(locale: &str) -> Option<char> {
    let language = locale.split(['-', '_']).next()?.to_ascii_lowercase();
    match language.as_str() {
        "ar" => Some('\u{0660}'),
        "fa" | "ur" | "ps" => Some('\u{06F0}'),
        "hi" | "mr" | "ne" => Some('\u{0966}'),
        "bn" => Some('\u{09E6}'),
        "th" => Some('\u{0E50}'),
        _ => None,
    }
}

/// Scripts whose text makes contextual substitution pick native digits
fn is_native_digit_context(zero: char, ch: char) -> bool {
    let script = ch.script();
    match zero {
        '\u{0660}' | '\u{06F0}' => script == Script::Arabic,
        '\u{0966}' => script == Script::Devanagari,
        '\u{09E6}' => script == Script::Bengali,
        '\u{0E50}' => script == Script::Thai,
        _ => false,
    }
}

/// Resolved digit substitution for one shaping call
#[derive(Debug, Clone, Copy)]
struct DigitSubstitution {
    zero: char,
    contextual: bool,
}

impl DigitSubstitution {
    fn resolve(substitution: Option<&NumberSubstitution>, locale: Option<&str>) -> Option<Self> {
        let substitution = substitution?;
        let zero = native_digit_zero(substitution.locale().or(locale)?)?;
        match substitution.method() {
            NumberSubstitutionMethod::National | NumberSubstitutionMethod::Traditional => {
                Some(Self { zero, contextual: false })
            }
            NumberSubstitutionMethod::Contextual => Some(Self { zero, contextual: true }),
            NumberSubstitutionMethod::FromCulture | NumberSubstitutionMethod::None => None,
        }
    }

    fn apply(&self, ch: char, in_native_context: bool) -> char {
        match ch.to_digit(10) {
            Some(digit) if ch.is_ascii_digit() && (!self.contextual || in_native_context) => {
                char::from_u32(self.zero as u32 + digit).unwrap_or(ch)
            }
            _ => ch,
        }
    }
}

/// Loose BCP 47 shape check: alphanumeric subtags of 1-8 characters with a
/// 2-8 letter primary language.
fn is_valid_locale(locale: &str) -> bool {
    let mut subtags = locale.split('-');
    let Some(language) = subtags.next() else {
        return false;
    };
    (2..=8).contains(&language.len())
        && language.chars().all(|c| c.is_ascii_alphabetic())
        && subtags.all(|s| (1..=8).contains(&s.len()) && s.chars().all(|c| c.is_ascii_alphanumeric()))
}

/// Everything that decides the shaping result of a run
struct ShapeParams<'a> {
    text: &'a [u16],
    script: ScriptAnalysis,
    locale: Option<&'a str>,
    number_substitution: Option<&'a NumberSubstitution>,
    is_sideways: bool,
    is_right_to_left: bool,
    features: &'a [FeatureRange<'a>],
}

/// Glyphs in logical order
struct Shaped {
    glyph_ids: Vec<u32>,
    clusters: Vec<u32>,
    positions: Vec<rustybuzz::GlyphPosition>,
}

fn shape_text(face: &rustybuzz::Face<'_>, params: &ShapeParams<'_>) -> Result<Shaped, EngineError> {
    let mut buffer = UnicodeBuffer::new();
    let digits = DigitSubstitution::resolve(params.number_substitution, params.locale);
    let mut native_context = false;

    for (offset, _, ch) in decode(params.text) {
        if ch.is_alphabetic() {
            native_context = digits.is_some_and(|d| is_native_digit_context(d.zero, ch));
        }
        let ch = digits.map_or(ch, |d| d.apply(ch, native_context));
        buffer.add(ch, offset as u32);
    }

    buffer.set_direction(if params.is_sideways {
        Direction::TopToBottom
    } else if params.is_right_to_left {
        Direction::RightToLeft
    } else {
        Direction::LeftToRight
    });

    if let Some(locale) = params.locale {
        if !is_valid_locale(locale) {
            return Err(EngineError::InvalidLocale(locale.to_owned()));
        }
        let language =
            Language::from_str(locale).map_err(|_| EngineError::InvalidLocale(locale.to_owned()))?;
        buffer.set_language(language);
    }

    if params.script.script != ScriptId::COMMON && params.script.script != ScriptId::UNKNOWN {
        if let Some(script) = rustybuzz::Script::from_iso15924_tag(Tag::from_bytes(&params.script.script.tag())) {
            buffer.set_script(script);
        }
    }
    buffer.guess_segment_properties();

    let features = features_for(params.features);
    let output: GlyphBuffer = rustybuzz::shape(face, &features, buffer);

    let mut glyph_ids: Vec<u32> = output.glyph_infos().iter().map(|info| info.glyph_id).collect();
    let mut clusters: Vec<u32> = output.glyph_infos().iter().map(|info| info.cluster).collect();
    let mut positions = output.glyph_positions().to_vec();

    // rustybuzz emits right-to-left runs in visual order.
    if params.is_right_to_left && !params.is_sideways {
        glyph_ids.reverse();
        clusters.reverse();
        positions.reverse();
    }

    Ok(Shaped { glyph_ids, clusters, positions })
}

fn features_for(ranges: &[FeatureRange<'_>]) -> Vec<Feature> {
    let mut features = Vec::new();
    let mut start = 0usize;
    for range in ranges {
        let end = start + range.length as usize;
        for feature in range.features {
            features.push(Feature::new(Tag::from_bytes(&feature.tag), feature.parameter, start..end));
        }
        start = end;
    }
    features
}

/// Map a design unit value onto the pixel grid of `ppem` and back
fn grid_fit(value: f32, units_per_em: f32, ppem: f32) -> f32 {
    if ppem <= 0.0 || units_per_em <= 0.0 {
        return value;
    }
    (value * ppem / units_per_em).round() * units_per_em / ppem
}

impl ShapingEngine for RustybuzzEngine {
    type Face = RustybuzzFace;

    fn analyze_script(&self, source: &AnalysisSource<'_>) -> Result<Vec<ScriptRange>, EngineError> {
        let mut ranges: Vec<ScriptRange> = Vec::new();

        for (offset, width, ch) in decode(source.text) {
            let (start, end) = (offset as u32, (offset + width) as u32);
            match char_script(ch) {
                CharScript::Control => push_or_extend(
                    &mut ranges,
                    start,
                    end,
                    ScriptAnalysis::new(ScriptId::COMMON, ScriptShapes::NoVisual),
                ),
                CharScript::Neutral => {
                    let analysis = ranges
                        .last()
                        .map(|last| last.analysis)
                        .filter(ScriptAnalysis::requires_shaping)
                        .unwrap_or(ScriptAnalysis::new(ScriptId::COMMON, ScriptShapes::Default));
                    push_or_extend(&mut ranges, start, end, analysis);
                }
                CharScript::Script(script) => {
                    // Leading neutrals adopt the first real script.
                    if let Some(last) = ranges.last_mut() {
                        if last.analysis == ScriptAnalysis::new(ScriptId::COMMON, ScriptShapes::Default) {
                            last.analysis.script = script;
                        }
                    }
                    push_or_extend(&mut ranges, start, end, ScriptAnalysis::new(script, ScriptShapes::Default));
                }
            }
        }

        Ok(ranges)
    }

    fn analyze_number_substitution(
        &self,
        source: &AnalysisSource<'_>,
    ) -> Result<Vec<NumberSubstitutionRange>, EngineError> {
        let locale = source.number_culture.or(source.culture);
        let method = match source.number_substitution_method {
            // Cultures with native digits default to contextual substitution.
            NumberSubstitutionMethod::FromCulture => match locale.and_then(native_digit_zero) {
                Some(_) => NumberSubstitutionMethod::Contextual,
                None => NumberSubstitutionMethod::None,
            },
            method => method,
        };

        if method == NumberSubstitutionMethod::None || source.text.is_empty() {
            return Ok(Vec::new());
        }

        let substitution = NumberSubstitution::new(method, locale);
        Ok(vec![NumberSubstitutionRange {
            range: TextRange::new(0, source.text.len() as u32),
            substitution,
        }])
    }

    fn create_face(
        &self,
        file: &FontFile,
        face_index: u32,
        simulations: FontSimulations,
    ) -> Result<RustybuzzFace, EngineError> {
        let data = file
            .stream()
            .read_all()
            .map_err(|e| EngineError::Failed(e.to_string()))?;
        RustybuzzFace::from_data(file.uri(), data, face_index, simulations)
    }

    fn shape_glyphs(
        &self,
        face: &RustybuzzFace,
        request: &ShapeRequest<'_>,
        mut output: ShapeOutput<'_>,
    ) -> Result<usize, EngineError> {
        let text_len = request.text.len();
        if output.cluster_map.len() < text_len || output.text_props.len() < text_len {
            return Err(EngineError::Failed("text buffers shorter than the text".into()));
        }

        let shaper = face.shaper()?;
        let shaped = shape_text(
            &shaper,
            &ShapeParams {
                text: request.text,
                script: request.script,
                locale: request.locale,
                number_substitution: request.number_substitution,
                is_sideways: request.is_sideways,
                is_right_to_left: request.is_right_to_left,
                features: request.features,
            },
        )?;

        let glyph_count = shaped.glyph_ids.len();
        if glyph_count > output.max_glyph_count() {
            return Err(EngineError::InsufficientBuffer);
        }
        if glyph_count > u16::MAX as usize {
            return Err(EngineError::Failed("too many glyphs for a cluster map".into()));
        }

        let ttf = face.parse()?;
        let chars: Vec<Option<char>> = {
            let mut chars = vec![None; text_len];
            for (offset, _, ch) in decode(request.text) {
                chars[offset] = Some(ch);
            }
            chars
        };

        // First glyph of every cluster, keyed by the cluster's first code unit.
        let mut first_glyph: Vec<Option<u16>> = vec![None; text_len];
        let mut glyphs_in_cluster: Vec<u16> = vec![0; text_len];
        for (index, (&glyph_id, &cluster)) in shaped.glyph_ids.iter().zip(&shaped.clusters).enumerate() {
            let cluster = cluster as usize;
            let is_cluster_start = index == 0 || shaped.clusters[index - 1] as usize != cluster;
            if cluster < text_len {
                if is_cluster_start && first_glyph[cluster].is_none() {
                    first_glyph[cluster] = Some(index as u16);
                }
                glyphs_in_cluster[cluster] += 1;
            }

            let glyph = GlyphId(glyph_id as u16);
            output.glyph_indices[index] = glyph.0;
            output.glyph_props[index] = ShapingGlyphProperties {
                is_cluster_start,
                is_diacritic: ttf.tables().gdef.and_then(|gdef| gdef.glyph_class(glyph)) == Some(ttf_parser::gdef::GlyphClass::Mark),
                is_zero_width_space: chars.get(cluster).copied().flatten() == Some(ZERO_WIDTH_SPACE),
            };
        }

        let mut current = 0u16;
        let mut cluster_start = 0usize;
        for position in 0..text_len {
            if let Some(glyph) = first_glyph[position] {
                current = glyph;
                cluster_start = position;
            }
            output.cluster_map[position] = current;

            let next_starts_cluster =
                position + 1 == text_len || first_glyph[position + 1].is_some();
            let width = chars[position].map_or(1, char::len_utf16);
            output.text_props[position] = ShapingTextProperties {
                is_shaped_alone: cluster_start == position
                    && next_starts_cluster
                    && glyphs_in_cluster[cluster_start] == 1
                    && width == 1,
                can_break_shaping_after: next_starts_cluster,
            };
        }

        Ok(glyph_count)
    }

    fn compute_placements(
        &self,
        face: &RustybuzzFace,
        request: &PlacementRequest<'_>,
        advances: &mut [f32],
        offsets: &mut [GlyphOffsetF],
    ) -> Result<(), EngineError> {
        let glyph_count = request.glyph_indices.len();
        if advances.len() < glyph_count || offsets.len() < glyph_count {
            return Err(EngineError::Failed("placement buffers shorter than the glyph run".into()));
        }

        let ttf = face.parse()?;
        let shaper = face.shaper()?;
        let shaped = shape_text(
            &shaper,
            &ShapeParams {
                text: request.text,
                script: request.script,
                locale: request.locale,
                number_substitution: request.number_substitution,
                is_sideways: request.is_sideways,
                is_right_to_left: request.is_right_to_left,
                features: request.features,
            },
        )?;

        // Positions from the shaper only apply if it produced the same glyphs.
        let matches = shaped.glyph_ids.len() == glyph_count
            && shaped
                .glyph_ids
                .iter()
                .zip(request.glyph_indices)
                .all(|(&shaped, &requested)| shaped == requested as u32);

        let units_per_em = f32::from(ttf.units_per_em());
        let scale = request.em_size / units_per_em;
        let pixels_per_dip = match request.mode {
            MeasuringMode::Natural => None,
            MeasuringMode::GdiClassic { pixels_per_dip, .. } => Some(pixels_per_dip),
        };

        for index in 0..glyph_count {
            let (advance, dx, dy) = if matches {
                let position = &shaped.positions[index];
                let advance = if request.is_sideways { -position.y_advance } else { position.x_advance };
                (advance as f32, position.x_offset as f32, position.y_offset as f32)
            } else {
                let glyph = GlyphId(request.glyph_indices[index]);
                let advance = if request.is_sideways {
                    ttf.glyph_ver_advance(glyph)
                } else {
                    ttf.glyph_hor_advance(glyph)
                };
                (f32::from(advance.unwrap_or(0)), 0.0, 0.0)
            };

            let mut advance = advance * scale;
            if let Some(ppd) = pixels_per_dip.filter(|ppd| *ppd > 0.0) {
                advance = (advance * ppd).round() / ppd;
            }
            advances[index] = advance;
            offsets[index] = GlyphOffsetF { advance_offset: dx * scale, ascender_offset: dy * scale };
        }

        Ok(())
    }

    fn glyph_indices(&self, face: &RustybuzzFace, code_points: &[u32]) -> Vec<u16> {
        let Ok(ttf) = face.parse() else {
            return vec![0; code_points.len()];
        };
        code_points
            .iter()
            .map(|&cp| {
                char::from_u32(cp)
                    .and_then(|ch| ttf.glyph_index(ch))
                    .map_or(0, |glyph| glyph.0)
            })
            .collect()
    }

    fn design_glyph_metrics(
        &self,
        face: &RustybuzzFace,
        glyph_indices: &[u16],
        _is_sideways: bool,
    ) -> Vec<GlyphMetrics> {
        let Ok(ttf) = face.parse() else {
            return vec![GlyphMetrics::default(); glyph_indices.len()];
        };
        let ascender = i32::from(ttf.ascender());
        let line_height = ascender - i32::from(ttf.descender());

        glyph_indices
            .iter()
            .map(|&index| {
                let glyph = GlyphId(index);
                let advance_width = u32::from(ttf.glyph_hor_advance(glyph).unwrap_or(0));
                let advance_height = ttf
                    .glyph_ver_advance(glyph)
                    .map_or(line_height.max(0) as u32, u32::from);
                let vertical_origin_y = ttf.glyph_y_origin(glyph).map_or(ascender, i32::from);
                let left_side_bearing = i32::from(ttf.glyph_hor_side_bearing(glyph).unwrap_or(0));

                match ttf.glyph_bounding_box(glyph) {
                    Some(bbox) => {
                        let top_side_bearing = ttf
                            .glyph_ver_side_bearing(glyph)
                            .map_or(vertical_origin_y - i32::from(bbox.y_max), i32::from);
                        GlyphMetrics {
                            left_side_bearing,
                            advance_width,
                            right_side_bearing: advance_width as i32 - i32::from(bbox.x_max),
                            top_side_bearing,
                            advance_height,
                            bottom_side_bearing: advance_height as i32
                                - top_side_bearing
                                - i32::from(bbox.height()),
                            vertical_origin_y,
                        }
                    }
                    // Empty glyphs, such as spaces.
                    None => GlyphMetrics {
                        left_side_bearing,
                        advance_width,
                        right_side_bearing: advance_width as i32 - left_side_bearing,
                        top_side_bearing: 0,
                        advance_height,
                        bottom_side_bearing: advance_height as i32,
                        vertical_origin_y,
                    },
                }
            })
            .collect()
    }

    fn display_glyph_metrics(
        &self,
        face: &RustybuzzFace,
        em_size: f32,
        pixels_per_dip: f32,
        _use_gdi_natural: bool,
        glyph_indices: &[u16],
        is_sideways: bool,
    ) -> Vec<GlyphMetrics> {
        let units_per_em = face.parse().map_or(0.0, |ttf| f32::from(ttf.units_per_em()));
        let ppem = em_size * pixels_per_dip;
        let fit = |value: i32| grid_fit(value as f32, units_per_em, ppem).round() as i32;
        let fit_u = |value: u32| grid_fit(value as f32, units_per_em, ppem).round().max(0.0) as u32;

        self.design_glyph_metrics(face, glyph_indices, is_sideways)
            .into_iter()
            .map(|m| GlyphMetrics {
                left_side_bearing: fit(m.left_side_bearing),
                advance_width: fit_u(m.advance_width),
                right_side_bearing: fit(m.right_side_bearing),
                top_side_bearing: fit(m.top_side_bearing),
                advance_height: fit_u(m.advance_height),
                bottom_side_bearing: fit(m.bottom_side_bearing),
                vertical_origin_y: fit(m.vertical_origin_y),
            })
            .collect()
    }

    fn font_metrics(&self, face: &RustybuzzFace) -> FontMetrics {
        let Ok(ttf) = face.parse() else {
            return FontMetrics::default();
        };
        let non_negative = |value: i16| value.max(0) as u16;
        let underline = ttf.underline_metrics();
        let strikeout = ttf.strikeout_metrics();

        FontMetrics {
            design_units_per_em: ttf.units_per_em(),
            ascent: non_negative(ttf.ascender()),
            descent: non_negative(ttf.descender().saturating_neg()),
            line_gap: ttf.line_gap(),
            cap_height: non_negative(ttf.capital_height().unwrap_or(0)),
            x_height: non_negative(ttf.x_height().unwrap_or(0)),
            underline_position: underline.map_or(0, |m| m.position),
            underline_thickness: underline.map_or(0, |m| non_negative(m.thickness)),
            strikethrough_position: strikeout.map_or(0, |m| m.position),
            strikethrough_thickness: strikeout.map_or(0, |m| non_negative(m.thickness)),
        }
    }

    fn display_font_metrics(&self, face: &RustybuzzFace, em_size: f32, pixels_per_dip: f32) -> FontMetrics {
        let metrics = self.font_metrics(face);
        let units_per_em = f32::from(metrics.design_units_per_em);
        let ppem = em_size * pixels_per_dip;
        let fit_u = |value: u16| grid_fit(f32::from(value), units_per_em, ppem).round() as u16;
        let fit_i = |value: i16| grid_fit(f32::from(value), units_per_em, ppem).round() as i16;

        FontMetrics {
            design_units_per_em: metrics.design_units_per_em,
            ascent: fit_u(metrics.ascent),
            descent: fit_u(metrics.descent),
            line_gap: fit_i(metrics.line_gap),
            cap_height: fit_u(metrics.cap_height),
            x_height: fit_u(metrics.x_height),
            underline_position: fit_i(metrics.underline_position),
            underline_thickness: fit_u(metrics.underline_thickness),
            strikethrough_position: fit_i(metrics.strikethrough_position),
            strikethrough_thickness: fit_u(metrics.strikethrough_thickness),
        }
    }

    fn is_symbol_font(&self, face: &RustybuzzFace) -> bool {
        let Ok(ttf) = face.parse() else {
            return false;
        };
        ttf.tables().cmap.is_some_and(|cmap| {
            cmap.subtables.into_iter().any(|subtable| {
                subtable.platform_id == ttf_parser::PlatformId::Windows && subtable.encoding_id == 0
            })
        })
    }

    fn font_table(&self, face: &RustybuzzFace, tag: [u8; 4]) -> Option<Vec<u8>> {
        let ttf = face.parse().ok()?;
        ttf.raw_face().table(Tag::from_bytes(&tag)).map(<[u8]>::to_vec)
    }

    fn informational_string(&self, face: &RustybuzzFace, id: InformationalStringId) -> Option<String> {
        let ttf = face.parse().ok()?;
        let name_id = id.name_id();
        ttf.names()
            .into_iter()
            .filter(|name| name.name_id == name_id && name.is_unicode())
            .find_map(|name| name.to_string())
    }
}
