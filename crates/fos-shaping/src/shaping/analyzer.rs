//! Text analyzer: itemization entry point

use super::classification::Classification;
use super::item_props::ItemProperties;
use super::itemizer::TextItemizer;
use crate::Result;
use crate::engine::{AnalysisSource, NumberSubstitutionMethod, ShapingEngine};
use crate::factory::Factory;
use crate::span::Span;

/// Paragraph settings for [`TextAnalyzer::itemize`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ItemizeOptions<'a> {
    /// Text culture (BCP 47)
    pub culture: Option<&'a str>,
    pub is_right_to_left: bool,
    /// Culture for digits; digit runs are only tracked when set
    pub number_culture: Option<&'a str>,
    pub ignore_user_override: bool,
    pub number_substitution_method: NumberSubstitutionMethod,
}

impl<'a> ItemizeOptions<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn culture(mut self, culture: &'a str) -> Self {
        self.culture = Some(culture);
        self
    }

    pub fn right_to_left(mut self) -> Self {
        self.is_right_to_left = true;
        self
    }

    pub fn number_culture(mut self, culture: &'a str) -> Self {
        self.number_culture = Some(culture);
        self
    }

    pub fn ignore_user_override(mut self) -> Self {
        self.ignore_user_override = true;
        self
    }

    pub fn number_substitution_method(mut self, method: NumberSubstitutionMethod) -> Self {
        self.number_substitution_method = method;
        self
    }
}

/// Itemizes text and produces glyphs and placements for the resulting runs
pub struct TextAnalyzer<'f, E: ShapingEngine> {
    pub(super) factory: &'f Factory<E>,
}

impl<'f, E: ShapingEngine> TextAnalyzer<'f, E> {
    pub fn new(factory: &'f Factory<E>) -> Self {
        Self { factory }
    }

    pub fn factory(&self) -> &'f Factory<E> {
        self.factory
    }

    /// Split `text` into runs with uniform shaping properties.
    ///
    /// Returns `None` for empty text.
    pub fn itemize(
        &self,
        text: &[u16],
        options: &ItemizeOptions<'_>,
        classification: &dyn Classification,
    ) -> Result<Option<Vec<Span<ItemProperties>>>> {
        if text.is_empty() {
            return Ok(None);
        }

        let source = AnalysisSource {
            text,
            culture: options.culture,
            is_right_to_left: options.is_right_to_left,
            number_culture: options.number_culture,
            ignore_user_override: options.ignore_user_override,
            number_substitution_method: options.number_substitution_method,
        };
        let engine = self.factory.engine();
        let script_ranges = engine.analyze_script(&source)?;
        let number_ranges = engine.analyze_number_substitution(&source)?;

        let mut itemizer = TextItemizer::new(script_ranges, number_ranges);
        let attributes = itemizer.analyze_extended_characters_and_digits(
            text,
            options.number_culture.is_some(),
            classification,
        );
        let spans = itemizer.itemize(options.number_culture, &attributes);

        tracing::debug!(length = text.len(), runs = spans.len(), "itemized text");
        Ok(Some(spans))
    }
}

impl<E: ShapingEngine> std::fmt::Debug for TextAnalyzer<'_, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextAnalyzer").finish_non_exhaustive()
    }
}
