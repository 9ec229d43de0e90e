//! Length-tagged runs of text

/// A run of `length` UTF-16 code units sharing one `element`.
#[derive(Debug, Clone, PartialEq)]
pub struct Span<T> {
    /// Payload shared by every code unit in the run
    pub element: T,
    /// Run length in code units
    pub length: u32,
}

impl<T> Span<T> {
    pub fn new(element: T, length: u32) -> Self {
        Self { element, length }
    }
}

/// Sum of span lengths; equals the itemized text length.
pub fn total_length<T>(spans: &[Span<T>]) -> u64 {
    spans.iter().map(|s| s.length as u64).sum()
}
