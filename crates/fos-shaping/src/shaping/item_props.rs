//! Shaping properties of an itemized run

use crate::engine::{NumberSubstitution, ScriptAnalysis};

/// Properties shared by every character of one itemized run
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ItemProperties {
    pub(crate) script: Option<ScriptAnalysis>,
    pub(crate) number_substitution: Option<NumberSubstitution>,
    pub(crate) digit_culture: Option<String>,
    pub(crate) has_combining_mark: bool,
    pub(crate) needs_caret_info: bool,
    pub(crate) has_extended_character: bool,
    pub(crate) is_indic: bool,
    pub(crate) is_latin: bool,
}

impl ItemProperties {
    /// Properties of a run with no character-level attributes
    pub fn new(script: Option<ScriptAnalysis>, number_substitution: Option<NumberSubstitution>) -> Self {
        Self { script, number_substitution, needs_caret_info: true, ..Default::default() }
    }

    /// Script analysis of the run, required for shaping
    pub fn script_analysis(&self) -> Option<&ScriptAnalysis> {
        self.script.as_ref()
    }

    pub fn number_substitution(&self) -> Option<&NumberSubstitution> {
        self.number_substitution.as_ref()
    }

    /// Number culture, set only for digit runs
    pub fn digit_culture(&self) -> Option<&str> {
        self.digit_culture.as_deref()
    }

    pub fn has_combining_mark(&self) -> bool {
        self.has_combining_mark
    }

    /// False when caret stops can be placed between any two characters
    pub fn needs_caret_info(&self) -> bool {
        self.needs_caret_info
    }

    pub fn has_extended_character(&self) -> bool {
        self.has_extended_character
    }

    pub fn is_indic(&self) -> bool {
        self.is_indic
    }

    pub fn is_latin(&self) -> bool {
        self.is_latin
    }

    /// Whether runs with these two property sets can go through one shaping call
    pub fn can_shape_together(&self, other: &ItemProperties) -> bool {
        self.number_substitution == other.number_substitution && self.script == other.script
    }
}
