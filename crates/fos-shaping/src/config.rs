//! Shaping pipeline configuration

/// Tunables for a [`Factory`](crate::Factory) and the analyzers it creates.
#[derive(Debug, Clone)]
pub struct ShapingConfig {
    /// Number of font faces kept alive by the face cache
    pub face_cache_capacity: usize,
    /// First glyph buffer guess, as a multiple of the text length
    pub initial_glyph_factor: usize,
    /// Retry shaping/placement with the default locale mapping when a locale is rejected
    pub retry_invalid_locale: bool,
}

impl Default for ShapingConfig {
    fn default() -> Self {
        Self {
            // Faces pin a lot of address space, keep few of them.
            face_cache_capacity: 4,
            initial_glyph_factor: 3,
            retry_invalid_locale: true,
        }
    }
}

impl ShapingConfig {
    /// Create the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the face cache capacity (at least one slot)
    pub fn face_cache_capacity(mut self, capacity: usize) -> Self {
        self.face_cache_capacity = capacity.max(1);
        self
    }

    /// Set the initial glyph buffer factor (at least one glyph per code unit)
    pub fn initial_glyph_factor(mut self, factor: usize) -> Self {
        self.initial_glyph_factor = factor.max(1);
        self
    }

    /// Disable the default-locale retry
    pub fn no_locale_retry(mut self) -> Self {
        self.retry_invalid_locale = false;
        self
    }
}
