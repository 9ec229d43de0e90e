//! Range merging
//!
//! Script ranges, number substitution ranges and digit ranges are produced
//! independently. The itemizer walks the three lists together and cuts the
//! text at every boundary any of them has, so every property is constant
//! inside an output run.

use super::classification::{CharAttribute, Classification};
use super::item_props::ItemProperties;
use crate::engine::{NumberSubstitutionRange, ScriptRange, TextRange};
use crate::span::Span;

/// Walks one ordered range list by position
struct RangeCursor<'a, T> {
    items: &'a [T],
    range_of: fn(&T) -> TextRange,
    index: usize,
}

impl<'a, T> RangeCursor<'a, T> {
    fn new(items: &'a [T], range_of: fn(&T) -> TextRange) -> Self {
        Self { items, range_of, index: 0 }
    }

    /// Skip ranges that end at or before `position`
    fn seek(&mut self, position: u32) {
        while self
            .items
            .get(self.index)
            .is_some_and(|item| (self.range_of)(item).end <= position)
        {
            self.index += 1;
        }
    }

    /// Range covering `position`, if any
    fn active(&self, position: u32) -> Option<&'a T> {
        self.items
            .get(self.index)
            .filter(|item| (self.range_of)(item).contains(position))
    }

    /// Next boundary after `position`: the end of the covering range, or
    /// the start of the next one across a gap
    fn next_boundary(&self, position: u32) -> Option<u32> {
        let range = (self.range_of)(self.items.get(self.index)?);
        Some(if range.start > position { range.start } else { range.end })
    }
}

/// Merges analysis ranges into itemized runs
#[derive(Debug, Clone, Default)]
pub struct TextItemizer {
    script_ranges: Vec<ScriptRange>,
    number_ranges: Vec<NumberSubstitutionRange>,
    digit_ranges: Vec<(TextRange, bool)>,
}

impl TextItemizer {
    pub fn new(script_ranges: Vec<ScriptRange>, number_ranges: Vec<NumberSubstitutionRange>) -> Self {
        Self { script_ranges, number_ranges, digit_ranges: Vec::new() }
    }

    /// Record whether `range` holds digits. Ranges must be added in text order.
    pub fn set_is_digit(&mut self, range: TextRange, is_digit: bool) {
        if !range.is_empty() {
            self.digit_ranges.push((range, is_digit));
        }
    }

    pub fn script_ranges(&self) -> &[ScriptRange] {
        &self.script_ranges
    }

    pub fn number_ranges(&self) -> &[NumberSubstitutionRange] {
        &self.number_ranges
    }

    pub fn digit_ranges(&self) -> &[(TextRange, bool)] {
        &self.digit_ranges
    }

    /// Classify every code unit of `text` and record the digit ranges.
    ///
    /// Digits only count when a number culture is set.
    pub fn analyze_extended_characters_and_digits(
        &mut self,
        text: &[u16],
        has_number_culture: bool,
        classification: &dyn Classification,
    ) -> Vec<CharAttribute> {
        let mut attributes = Vec::with_capacity(text.len());
        let mut digit_start = 0u32;
        let mut in_digits = false;

        for (index, &unit) in text.iter().enumerate() {
            let class = classification.classify(unit);
            attributes.push(CharAttribute::of(unit, &class));

            let is_digit = has_number_culture && class.is_digit;
            if is_digit != in_digits {
                let index = index as u32;
                self.set_is_digit(TextRange::new(digit_start, index), in_digits);
                digit_start = index;
                in_digits = is_digit;
            }
        }
        self.set_is_digit(TextRange::new(digit_start, text.len() as u32), in_digits);

        attributes
    }

    /// Cut the text into maximal runs of constant properties.
    ///
    /// The text length is `attributes.len()`. Run lengths sum to it and no
    /// run is empty.
    pub fn itemize(&self, number_culture: Option<&str>, attributes: &[CharAttribute]) -> Vec<Span<ItemProperties>> {
        let length = attributes.len() as u32;
        let mut scripts = RangeCursor::new(self.script_ranges.as_slice(), |r| r.range);
        let mut numbers = RangeCursor::new(self.number_ranges.as_slice(), |r| r.range);
        let mut digits = RangeCursor::new(self.digit_ranges.as_slice(), |r| r.0);

        let mut spans = Vec::new();
        let mut start = 0u32;
        while start < length {
            scripts.seek(start);
            numbers.seek(start);
            digits.seek(start);

            let end = [
                scripts.next_boundary(start),
                numbers.next_boundary(start),
                digits.next_boundary(start),
            ]
            .into_iter()
            .flatten()
            .min()
            .map_or(length, |boundary| boundary.min(length));

            let is_digit = digits.active(start).is_some_and(|&(_, is_digit)| is_digit);
            let run = &attributes[start as usize..end as usize];
            let mut properties = run_properties(run);
            properties.script = scripts.active(start).map(|r| r.analysis);
            properties.number_substitution = numbers.active(start).map(|r| r.substitution.clone());
            properties.digit_culture = if is_digit { number_culture.map(str::to_owned) } else { None };

            spans.push(Span::new(properties, end - start));
            start = end;
        }

        spans
    }
}

/// Character-level properties of one run
fn run_properties(run: &[CharAttribute]) -> ItemProperties {
    let mut properties = ItemProperties { needs_caret_info: true, ..Default::default() };
    let mut strong = 0usize;
    let mut latin = 0usize;
    let mut indic = 0usize;

    for &attribute in run {
        if attribute.contains(CharAttribute::IS_COMBINING) {
            properties.has_combining_mark = true;
        }
        if attribute.contains(CharAttribute::IS_EXTENDED) {
            properties.has_extended_character = true;
        }
        if attribute.contains(CharAttribute::IS_STRONG) {
            strong += 1;
            if !attribute.contains(CharAttribute::NEEDS_CARET_INFO) {
                properties.needs_caret_info = false;
            }
            if attribute.contains(CharAttribute::IS_LATIN) {
                latin += 1;
            } else if attribute.contains(CharAttribute::IS_INDIC) {
                indic += 1;
            }
        }
    }

    properties.is_indic = indic > 0;
    properties.is_latin = strong > 0 && latin == strong;
    properties
}
