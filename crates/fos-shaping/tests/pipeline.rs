//! Pipeline tests for fos-shaping
//!
//! Drives itemization, shaping, placement and the face cache through a
//! recording mock engine.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use fos_shaping::{
    AnalysisSource, EngineError, Factory, Font, FontFile, FontMetrics, FontSimulations, GlyphMetrics,
    GlyphOffset, GlyphOffsetF, GlyphRun, ItemProperties, ItemizeOptions, Matrix, MeasuringMode,
    NumberSubstitution, NumberSubstitutionMethod, NumberSubstitutionRange, PlacementRequest,
    RunOptions, ScriptAnalysis, ScriptId, ScriptRange, ScriptShapes, ShapeOutput, ShapeRequest,
    ShapedGlyphRun, ShapingConfig, ShapingEngine, ShapingError, TextFormattingMode, TextRange,
    UnicodeClassification,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn utf16(text: &str) -> Vec<u16> {
    text.encode_utf16().collect()
}

// ============================================================================
// MOCK ENGINE
// ============================================================================

const HYPHEN_GLYPH: u16 = 99;

struct MockFace {
    released: Arc<AtomicUsize>,
}

impl Drop for MockFace {
    fn drop(&mut self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct MockEngine {
    /// Script ranges to report; one Latin range over the text when empty
    script_ranges: Vec<ScriptRange>,
    number_ranges: Vec<NumberSubstitutionRange>,
    /// Glyphs produced per shaping call; text length when unset
    glyph_count: Option<usize>,
    /// Locale the engine refuses
    rejected_locale: Option<&'static str>,
    advance: f32,
    offset: GlyphOffsetF,

    faces_created: AtomicUsize,
    faces_released: Arc<AtomicUsize>,
    capacities: Mutex<Vec<usize>>,
    shape_locales: Mutex<Vec<Option<String>>>,
    placement_locales: Mutex<Vec<Option<String>>>,
    shape_substitutions: Mutex<Vec<Option<NumberSubstitution>>>,
    placement_substitutions: Mutex<Vec<Option<NumberSubstitution>>>,
    modes: Mutex<Vec<MeasuringMode>>,
}

impl MockEngine {
    fn new() -> Self {
        Self {
            advance: 10.5,
            offset: GlyphOffsetF { advance_offset: 1.75, ascender_offset: -0.5 },
            ..Default::default()
        }
    }

    fn rejects(&self, locale: Option<&str>) -> bool {
        locale.is_some() && locale == self.rejected_locale
    }
}

fn latin() -> ScriptAnalysis {
    ScriptAnalysis::new(ScriptId::from_tag(b"Latn"), ScriptShapes::Default)
}

fn control() -> ScriptAnalysis {
    ScriptAnalysis::new(ScriptId::COMMON, ScriptShapes::NoVisual)
}

fn script_range(start: u32, end: u32, analysis: ScriptAnalysis) -> ScriptRange {
    ScriptRange { range: TextRange::new(start, end), analysis }
}

impl ShapingEngine for MockEngine {
    type Face = MockFace;

    fn analyze_script(&self, source: &AnalysisSource<'_>) -> Result<Vec<ScriptRange>, EngineError> {
        if self.script_ranges.is_empty() {
            return Ok(vec![script_range(0, source.text.len() as u32, latin())]);
        }
        Ok(self.script_ranges.clone())
    }

    fn analyze_number_substitution(
        &self,
        _source: &AnalysisSource<'_>,
    ) -> Result<Vec<NumberSubstitutionRange>, EngineError> {
        Ok(self.number_ranges.clone())
    }

    fn create_face(
        &self,
        _file: &FontFile,
        _face_index: u32,
        _simulations: FontSimulations,
    ) -> Result<MockFace, EngineError> {
        self.faces_created.fetch_add(1, Ordering::SeqCst);
        Ok(MockFace { released: Arc::clone(&self.faces_released) })
    }

    fn shape_glyphs(
        &self,
        _face: &MockFace,
        request: &ShapeRequest<'_>,
        output: ShapeOutput<'_>,
    ) -> Result<usize, EngineError> {
        self.capacities.lock().unwrap().push(output.max_glyph_count());
        self.shape_locales.lock().unwrap().push(request.locale.map(str::to_owned));
        self.shape_substitutions.lock().unwrap().push(request.number_substitution.cloned());

        if self.rejects(request.locale) {
            return Err(EngineError::InvalidLocale(request.locale.unwrap_or_default().to_owned()));
        }

        let text_len = request.text.len();
        let glyph_count = self.glyph_count.unwrap_or(text_len);
        if glyph_count > output.max_glyph_count() {
            return Err(EngineError::InsufficientBuffer);
        }

        for (index, slot) in output.cluster_map.iter_mut().enumerate() {
            *slot = index.min(glyph_count.saturating_sub(1)) as u16;
        }
        for (index, props) in output.text_props.iter_mut().enumerate() {
            props.is_shaped_alone = index % 2 == 0;
        }
        for (index, glyph) in output.glyph_indices[..glyph_count].iter_mut().enumerate() {
            *glyph = index as u16 + 1;
        }
        for props in &mut output.glyph_props[..glyph_count] {
            props.is_cluster_start = true;
        }
        Ok(glyph_count)
    }

    fn compute_placements(
        &self,
        _face: &MockFace,
        request: &PlacementRequest<'_>,
        advances: &mut [f32],
        offsets: &mut [GlyphOffsetF],
    ) -> Result<(), EngineError> {
        self.placement_locales.lock().unwrap().push(request.locale.map(str::to_owned));
        self.placement_substitutions.lock().unwrap().push(request.number_substitution.cloned());
        self.modes.lock().unwrap().push(request.mode);

        if self.rejects(request.locale) {
            return Err(EngineError::InvalidLocale(request.locale.unwrap_or_default().to_owned()));
        }
        advances.fill(self.advance);
        offsets.fill(self.offset);
        Ok(())
    }

    fn glyph_indices(&self, _face: &MockFace, code_points: &[u32]) -> Vec<u16> {
        code_points
            .iter()
            .map(|&cp| if cp == 0x2D { HYPHEN_GLYPH } else { 0 })
            .collect()
    }

    fn design_glyph_metrics(&self, _face: &MockFace, glyph_indices: &[u16], _is_sideways: bool) -> Vec<GlyphMetrics> {
        glyph_indices
            .iter()
            .map(|_| GlyphMetrics { advance_width: 500, ..Default::default() })
            .collect()
    }

    fn display_glyph_metrics(
        &self,
        _face: &MockFace,
        _em_size: f32,
        _pixels_per_dip: f32,
        _use_gdi_natural: bool,
        glyph_indices: &[u16],
        _is_sideways: bool,
    ) -> Vec<GlyphMetrics> {
        glyph_indices
            .iter()
            .map(|_| GlyphMetrics { advance_width: 512, ..Default::default() })
            .collect()
    }

    fn font_metrics(&self, _face: &MockFace) -> FontMetrics {
        FontMetrics { design_units_per_em: 1000, ascent: 800, descent: 200, ..Default::default() }
    }
}

fn font_for(factory: &Factory<MockEngine>) -> Font {
    let uri = factory.register_font_data(vec![0u8; 4]);
    Font::new(&uri, 0)
}

// ============================================================================
// ITEMIZATION
// ============================================================================

#[test]
fn test_itemize_latin_pair() {
    init_tracing();
    let factory = Factory::new(MockEngine::new());
    let text = utf16("ab");

    let spans = factory
        .text_analyzer()
        .itemize(&text, &ItemizeOptions::new(), &UnicodeClassification)
        .unwrap()
        .unwrap();

    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].length, 2);
    let item = &spans[0].element;
    assert!(item.is_latin());
    assert!(!item.is_indic());
    assert!(!item.has_combining_mark());
    assert!(!item.needs_caret_info());
}

#[test]
fn test_itemize_digit_with_number_culture() {
    let factory = Factory::new(MockEngine::new());
    let text = utf16("1");
    let options = ItemizeOptions::new().number_culture("ar-SA");

    let spans = factory
        .text_analyzer()
        .itemize(&text, &options, &UnicodeClassification)
        .unwrap()
        .unwrap();

    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].length, 1);
    assert_eq!(spans[0].element.digit_culture(), Some("ar-SA"));
}

#[test]
fn test_itemize_empty_text_is_absent() {
    let factory = Factory::new(MockEngine::new());
    let spans = factory
        .text_analyzer()
        .itemize(&[], &ItemizeOptions::new(), &UnicodeClassification)
        .unwrap();
    assert!(spans.is_none());
}

#[test]
fn test_itemize_lengths_sum_to_text() {
    let substitution = NumberSubstitution::new(NumberSubstitutionMethod::National, Some("ar"));
    let engine = MockEngine {
        script_ranges: vec![
            script_range(0, 5, latin()),
            script_range(5, 6, control()),
            script_range(6, 12, latin()),
        ],
        number_ranges: vec![
            NumberSubstitutionRange { range: TextRange::new(0, 3), substitution: substitution.clone() },
            NumberSubstitutionRange { range: TextRange::new(3, 12), substitution },
        ],
        ..MockEngine::new()
    };
    let factory = Factory::new(engine);
    let text = utf16("abc12\tx34 yz");
    let options = ItemizeOptions::new().number_culture("ar");

    let spans = factory
        .text_analyzer()
        .itemize(&text, &options, &UnicodeClassification)
        .unwrap()
        .unwrap();

    assert_eq!(spans.iter().map(|s| s.length as usize).sum::<usize>(), text.len());
    assert!(spans.iter().all(|s| s.length > 0));
    // Boundaries: 3 (numbers + digits), 5 (script + digits), 6, 7, 9.
    assert_eq!(spans.iter().map(|s| s.length).collect::<Vec<_>>(), vec![3, 2, 1, 1, 2, 3]);
}

#[test]
fn test_itemize_coinciding_boundaries_cut_once() {
    let substitution = NumberSubstitution::new(NumberSubstitutionMethod::National, Some("ar"));
    let engine = MockEngine {
        script_ranges: vec![script_range(0, 4, latin()), script_range(4, 8, control())],
        number_ranges: vec![
            NumberSubstitutionRange { range: TextRange::new(0, 4), substitution: substitution.clone() },
            NumberSubstitutionRange { range: TextRange::new(4, 8), substitution },
        ],
        ..MockEngine::new()
    };
    let factory = Factory::new(engine);
    let text = utf16("abcdefgh");

    let spans = factory
        .text_analyzer()
        .itemize(&text, &ItemizeOptions::new(), &UnicodeClassification)
        .unwrap()
        .unwrap();

    assert_eq!(spans.iter().map(|s| s.length).collect::<Vec<_>>(), vec![4, 4]);
    assert!(spans[0].element.script_analysis().is_some_and(|a| a.requires_shaping()));
    assert!(spans[1].element.script_analysis().is_some_and(|a| !a.requires_shaping()));
}

// ============================================================================
// FACE CACHE
// ============================================================================

#[test]
fn test_face_cache_eviction_releases_one() {
    let factory = Factory::new(MockEngine::new());
    let fonts: Vec<Font> = (0..5).map(|_| font_for(&factory)).collect();

    for font in &fonts {
        drop(factory.font_face(font).unwrap());
    }

    assert_eq!(factory.face_cache().len(), 4);
    assert_eq!(factory.engine().faces_created.load(Ordering::SeqCst), 5);
    assert_eq!(factory.engine().faces_released.load(Ordering::SeqCst), 1);
}

#[test]
fn test_face_cache_fast_path() {
    let factory = Factory::new(MockEngine::new());
    let font = font_for(&factory);

    let first = factory.font_face(&font).unwrap();
    let refs = first.ref_count();
    let second = factory.font_face(&font).unwrap();
    assert_eq!(second.ref_count(), refs + 1);
    let third = factory.font_face(&font).unwrap();
    assert_eq!(third.ref_count(), refs + 2);

    let stats = factory.face_cache().stats();
    assert_eq!(stats.fast_hits, 2);
    assert_eq!(stats.slow_lookups, 0);
    assert_eq!(factory.engine().faces_created.load(Ordering::SeqCst), 1);
}

#[test]
fn test_face_cache_reset() {
    let factory = Factory::new(MockEngine::new());
    for _ in 0..3 {
        let font = font_for(&factory);
        drop(factory.font_face(&font).unwrap());
    }

    factory.reset_font_face_cache();
    assert!(factory.face_cache().is_empty());
    assert_eq!(factory.engine().faces_released.load(Ordering::SeqCst), 3);
}

#[test]
fn test_face_cache_concurrent_shaping() {
    let factory = Arc::new(Factory::new(MockEngine::new()));
    let fonts: Arc<Vec<Font>> = Arc::new((0..6).map(|_| font_for(&factory)).collect());
    let text = utf16("concurrent");

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let factory = Arc::clone(&factory);
            let fonts = Arc::clone(&fonts);
            let text = text.clone();
            std::thread::spawn(move || {
                let analyzer = factory.text_analyzer();
                let item = ItemProperties::new(Some(latin()), None);
                for i in 0..50 {
                    let font = &fonts[(t + i) % fonts.len()];
                    let run = analyzer.get_glyphs(&text, &item, font, 0, &RunOptions::default()).unwrap();
                    assert_eq!(run.glyph_count(), text.len());
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert!(factory.face_cache().len() <= 4);
    factory.reset_font_face_cache();
    let engine = factory.engine();
    assert_eq!(
        engine.faces_created.load(Ordering::SeqCst),
        engine.faces_released.load(Ordering::SeqCst)
    );
}

// ============================================================================
// GLYPH SHAPING
// ============================================================================

#[test]
fn test_glyph_buffer_growth() {
    init_tracing();
    let text = utf16("abcd");
    let engine = MockEngine { glyph_count: Some(3 * text.len() + 1), ..MockEngine::new() };
    let factory = Factory::new(engine);
    let font = font_for(&factory);
    let item = ItemProperties::new(Some(latin()), None);

    let run = factory
        .text_analyzer()
        .get_glyphs(&text, &item, &font, 0, &RunOptions::default())
        .unwrap();

    let capacities = factory.engine().capacities.lock().unwrap().clone();
    assert_eq!(capacities, vec![12, 27 * 12 / 8 + 76]);
    assert_eq!(run.glyph_count(), 13);
    assert_eq!(run.glyph_props.len(), 13);
    assert_eq!(run.cluster_map.len(), text.len());
}

#[test]
fn test_initial_capacity_follows_config() {
    let text = utf16("abcd");
    let config = ShapingConfig::new().initial_glyph_factor(2);
    let factory = Factory::with_config(MockEngine::new(), config);
    let font = font_for(&factory);
    let item = ItemProperties::new(Some(latin()), None);

    factory
        .text_analyzer()
        .get_glyphs(&text, &item, &font, 0, &RunOptions::default())
        .unwrap();
    assert_eq!(*factory.engine().capacities.lock().unwrap(), vec![8]);
}

#[test]
fn test_can_glyph_alone_from_text_props() {
    let factory = Factory::new(MockEngine::new());
    let font = font_for(&factory);
    let item = ItemProperties::new(Some(latin()), None);
    let text = utf16("abc");

    let run = factory
        .text_analyzer()
        .get_glyphs(&text, &item, &font, 0, &RunOptions::default())
        .unwrap();
    assert_eq!(run.can_glyph_alone, vec![true, false, true]);
}

#[test]
fn test_invalid_locale_retries_with_default_mapping() {
    let engine = MockEngine { rejected_locale: Some("xx-BAD"), ..MockEngine::new() };
    let factory = Factory::new(engine);
    let font = font_for(&factory);
    let item = ItemProperties::new(Some(latin()), None);
    let text = utf16("ab");
    let options = RunOptions { locale: Some("xx-BAD"), ..Default::default() };

    let shaped = factory
        .text_analyzer()
        .get_glyphs_and_placements(&text, &item, &font, 0, 16.0, 1.0, 1.0, &options)
        .unwrap();
    assert_eq!(shaped.glyphs.glyph_count(), 2);

    let engine = factory.engine();
    assert_eq!(*engine.shape_locales.lock().unwrap(), vec![Some("xx-BAD".to_owned()), None]);
    assert_eq!(*engine.placement_locales.lock().unwrap(), vec![Some("xx-BAD".to_owned()), None]);
}

#[test]
fn test_invalid_locale_without_retry_fails() {
    let engine = MockEngine { rejected_locale: Some("xx-BAD"), ..MockEngine::new() };
    let factory = Factory::with_config(engine, ShapingConfig::new().no_locale_retry());
    let font = font_for(&factory);
    let item = ItemProperties::new(Some(latin()), None);
    let options = RunOptions { locale: Some("xx-BAD"), ..Default::default() };

    let result = factory.text_analyzer().get_glyphs(&utf16("ab"), &item, &font, 0, &options);
    assert!(matches!(
        result,
        Err(ShapingError::Engine(EngineError::InvalidLocale(ref tag))) if tag == "xx-BAD"
    ));
}

#[test]
#[should_panic(expected = "script analysis")]
fn test_shaping_without_script_analysis_panics() {
    let factory = Factory::new(MockEngine::new());
    let font = font_for(&factory);
    let item = ItemProperties::new(None, None);
    let _ = factory.text_analyzer().get_glyphs(&utf16("ab"), &item, &font, 0, &RunOptions::default());
}

#[test]
fn test_control_characters_use_blank_and_hyphen_glyphs() {
    let factory = Factory::new(MockEngine::new());
    let font = font_for(&factory);
    let item = ItemProperties::new(Some(control()), None);
    let text = utf16("\t\u{00AD}\n");

    let run = factory
        .text_analyzer()
        .get_glyphs(&text, &item, &font, 3, &RunOptions::default())
        .unwrap();

    assert_eq!(run.glyph_indices, vec![3, HYPHEN_GLYPH, 3]);
    assert_eq!(run.cluster_map, vec![0, 1, 2]);
    assert!(run.can_glyph_alone.iter().all(|&alone| alone));
    assert!(factory.engine().capacities.lock().unwrap().is_empty());
}

// ============================================================================
// GLYPH PLACEMENT
// ============================================================================

fn place(
    factory: &Factory<MockEngine>,
    text: &str,
    item: &ItemProperties,
    em_size: f64,
    scaling_factor: f64,
    pixels_per_dip: f32,
    mode: TextFormattingMode,
) -> ShapedGlyphRun {
    let font = font_for(factory);
    let text = utf16(text);
    let options = RunOptions { formatting_mode: mode, ..Default::default() };
    factory
        .text_analyzer()
        .get_glyphs_and_placements(&text, item, &font, 0, em_size, scaling_factor, pixels_per_dip, &options)
        .unwrap()
}

#[test]
fn test_ideal_placements() {
    let factory = Factory::new(MockEngine::new());
    let item = ItemProperties::new(Some(latin()), None);

    let shaped = place(&factory, "ab", &item, 16.0, 1.0, 1.0, TextFormattingMode::Ideal);
    // 10.5 rounds to even.
    assert_eq!(shaped.placements.advances, vec![10, 10]);
    assert_eq!(shaped.placements.offsets, vec![GlyphOffset { du: 1, dv: 0 }; 2]);

    let shaped = place(&factory, "ab", &item, 16.0, 2.0, 1.0, TextFormattingMode::Ideal);
    assert_eq!(shaped.placements.advances, vec![21, 21]);
    assert_eq!(shaped.placements.offsets, vec![GlyphOffset { du: 3, dv: -1 }; 2]);

    assert!(factory.engine().modes.lock().unwrap().iter().all(|m| *m == MeasuringMode::Natural));
}

#[test]
fn test_placement_sees_shaping_number_substitution() {
    let factory = Factory::new(MockEngine::new());
    let substitution = NumberSubstitution::new(NumberSubstitutionMethod::National, Some("ar"));
    let item = ItemProperties::new(Some(latin()), Some(substitution.clone()));

    place(&factory, "AV 12", &item, 16.0, 1.0, 1.0, TextFormattingMode::Ideal);

    let engine = factory.engine();
    assert_eq!(*engine.shape_substitutions.lock().unwrap(), vec![Some(substitution.clone())]);
    assert_eq!(*engine.placement_substitutions.lock().unwrap(), vec![Some(substitution)]);
}

#[test]
fn test_display_placements() {
    let factory = Factory::new(MockEngine::new());
    let item = ItemProperties::new(Some(latin()), None);

    let shaped = place(&factory, "abc", &item, 12.0, 3.0, 1.5, TextFormattingMode::Display);
    assert_eq!(shaped.placements.advances, vec![32; 3]);

    let modes = factory.engine().modes.lock().unwrap();
    assert_eq!(
        modes[0],
        MeasuringMode::GdiClassic { pixels_per_dip: 1.5, transform: Matrix::IDENTITY, use_gdi_natural: false }
    );
}

#[test]
fn test_control_placements_hyphen_advance() {
    let factory = Factory::new(MockEngine::new());
    let item = ItemProperties::new(Some(control()), None);

    // 500 design units at 13 DIPs is 6.5, which rounds to even.
    let shaped = place(&factory, "\t\u{00AD}\u{00AD}", &item, 13.0, 1.0, 1.0, TextFormattingMode::Ideal);
    assert_eq!(shaped.placements.advances, vec![0, 6, 6]);
    assert_eq!(shaped.placements.offsets, vec![GlyphOffset::default(); 3]);

    // Display metrics: 512 units at 13 DIPs is 6.656.
    let shaped = place(&factory, "\u{00AD}", &item, 13.0, 1.0, 1.0, TextFormattingMode::Display);
    assert_eq!(shaped.placements.advances, vec![7]);

    // 500 units at 16 DIPs and 1.5 px/DIP: 12 px, 8 DIPs, scaled by 2.
    let shaped = place(&factory, "\u{00AD}", &item, 16.0, 2.0, 1.5, TextFormattingMode::Ideal);
    assert_eq!(shaped.placements.advances, vec![16]);

    assert!(factory.engine().modes.lock().unwrap().is_empty());
}

#[test]
fn test_control_placements_require_one_glyph_per_unit() {
    let factory = Factory::new(MockEngine::new());
    let font = font_for(&factory);
    let item = ItemProperties::new(Some(control()), None);
    let text = utf16("\t\t");
    let glyphs = GlyphRun { glyph_indices: vec![0], ..Default::default() };

    let result = factory.text_analyzer().get_glyph_placements(
        &text,
        &glyphs,
        &item,
        &font,
        12.0,
        1.0,
        1.0,
        &RunOptions::default(),
    );
    assert!(matches!(result, Err(ShapingError::InvalidOperation(_))));
}

// ============================================================================
// FONT QUERIES
// ============================================================================

#[test]
fn test_font_metrics_are_cached_on_the_font() {
    let factory = Factory::new(MockEngine::new());
    let font = font_for(&factory);

    let metrics = factory.font_metrics(&font).unwrap();
    assert_eq!(metrics.design_units_per_em, 1000);

    factory.reset_font_face_cache();
    let created = factory.engine().faces_created.load(Ordering::SeqCst);
    assert_eq!(factory.font_metrics(&font).unwrap(), metrics);
    assert_eq!(factory.engine().faces_created.load(Ordering::SeqCst), created);
}

#[test]
fn test_font_queries_with_default_engine_answers() {
    let factory = Factory::new(MockEngine::new());
    let font = font_for(&factory);

    assert!(!factory.is_symbol_font(&font).unwrap());
    assert!(factory.has_character(&font, 0x2D).unwrap());
    assert!(!factory.has_character(&font, u32::from('a')).unwrap());
    assert_eq!(factory.font_version(&font).unwrap(), 0.0);
    assert_eq!(factory.font_table(&font, *b"OS/2").unwrap(), None);
    assert_eq!(factory.font_embedding_rights(&font).unwrap(), None);
}
