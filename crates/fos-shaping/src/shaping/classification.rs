//! Per code unit character classification

use unicode_properties::{GeneralCategory, GeneralCategoryGroup, UnicodeGeneralCategory};
use unicode_script::{Script, UnicodeScript};

bitflags::bitflags! {
    /// Itemization attributes of one UTF-16 code unit
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CharAttribute: u8 {
        const IS_COMBINING = 0x01;
        const NEEDS_CARET_INFO = 0x02;
        const IS_INDIC = 0x04;
        const IS_LATIN = 0x08;
        const IS_STRONG = 0x10;
        /// Surrogate code unit
        const IS_EXTENDED = 0x20;
    }
}

impl CharAttribute {
    /// Attributes of `unit` as reported by `classification`
    pub fn of(unit: u16, classification: &CharClassification) -> Self {
        let mut attributes = CharAttribute::empty();
        attributes.set(CharAttribute::IS_COMBINING, classification.is_combining);
        attributes.set(CharAttribute::NEEDS_CARET_INFO, classification.needs_caret_info);
        attributes.set(CharAttribute::IS_INDIC, classification.is_indic);
        attributes.set(CharAttribute::IS_LATIN, classification.is_latin);
        attributes.set(CharAttribute::IS_STRONG, classification.is_strong);
        attributes.set(CharAttribute::IS_EXTENDED, is_surrogate(unit));
        attributes
    }
}

/// True for high and low surrogates
pub fn is_surrogate(unit: u16) -> bool {
    (unit & 0xF800) == 0xD800
}

/// The six independent properties a classifier reports per code unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CharClassification {
    pub is_combining: bool,
    /// Caret stops need shaping information (complex scripts)
    pub needs_caret_info: bool,
    pub is_indic: bool,
    pub is_digit: bool,
    pub is_latin: bool,
    /// Strong directional letter
    pub is_strong: bool,
}

/// Classifies UTF-16 code units for itemization
pub trait Classification: Send + Sync {
    fn classify(&self, unit: u16) -> CharClassification;
}

/// Classifier built on Unicode general categories and scripts.
///
/// Surrogates classify as nothing; they only mark the run as extended.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnicodeClassification;

impl Classification for UnicodeClassification {
    fn classify(&self, unit: u16) -> CharClassification {
        let Some(ch) = char::from_u32(u32::from(unit)) else {
            return CharClassification::default();
        };
        let script = ch.script();
        let is_indic = is_indic_script(script);

        CharClassification {
            is_combining: ch.general_category_group() == GeneralCategoryGroup::Mark,
            needs_caret_info: is_indic || is_complex_script(script),
            is_indic,
            is_digit: ch.general_category() == GeneralCategory::DecimalNumber,
            is_latin: script == Script::Latin,
            is_strong: ch.general_category_group() == GeneralCategoryGroup::Letter,
        }
    }
}

fn is_indic_script(script: Script) -> bool {
    matches!(
        script,
        Script::Devanagari
            | Script::Bengali
            | Script::Gurmukhi
            | Script::Gujarati
            | Script::Oriya
            | Script::Tamil
            | Script::Telugu
            | Script::Kannada
            | Script::Malayalam
            | Script::Sinhala
    )
}

/// Non-Indic scripts whose clusters span several characters
fn is_complex_script(script: Script) -> bool {
    matches!(
        script,
        Script::Thai | Script::Lao | Script::Khmer | Script::Myanmar | Script::Tibetan
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(ch: char) -> CharClassification {
        UnicodeClassification.classify(ch as u16)
    }

    #[test]
    fn test_latin_letter() {
        let c = classify('a');
        assert!(c.is_strong && c.is_latin);
        assert!(!c.is_combining && !c.needs_caret_info && !c.is_indic && !c.is_digit);
    }

    #[test]
    fn test_digit_is_weak() {
        let c = classify('7');
        assert!(c.is_digit);
        assert!(!c.is_strong);
    }

    #[test]
    fn test_devanagari() {
        let letter = classify('\u{0915}');
        assert!(letter.is_indic && letter.is_strong && letter.needs_caret_info);
        assert!(!letter.is_latin);

        let sign = classify('\u{093F}');
        assert!(sign.is_combining);
    }

    #[test]
    fn test_thai_needs_caret_info() {
        let c = classify('\u{0E01}');
        assert!(c.needs_caret_info && !c.is_indic);
    }

    #[test]
    fn test_surrogates() {
        assert!(is_surrogate(0xD83D));
        assert!(is_surrogate(0xDE00));
        assert!(!is_surrogate(0xE000));
        assert_eq!(UnicodeClassification.classify(0xD83D), CharClassification::default());

        let attributes = CharAttribute::of(0xD83D, &CharClassification::default());
        assert_eq!(attributes, CharAttribute::IS_EXTENDED);
    }

    #[test]
    fn test_attribute_bits() {
        let classification = CharClassification {
            is_strong: true,
            is_latin: true,
            ..Default::default()
        };
        let attributes = CharAttribute::of(u16::from(b'a'), &classification);
        assert!(attributes.contains(CharAttribute::IS_STRONG | CharAttribute::IS_LATIN));
        assert!(!attributes.contains(CharAttribute::IS_EXTENDED));
    }
}
