//! Reference-counted font face handle

use std::sync::Arc;

/// Shared handle to an engine face.
///
/// Every clone is one outstanding reference; the engine face is dropped,
/// and its native resources released, when the last handle goes away.
pub struct FontFace<F> {
    inner: Arc<F>,
}

impl<F> FontFace<F> {
    pub fn new(face: F) -> Self {
        Self { inner: Arc::new(face) }
    }

    /// The engine face
    pub fn get(&self) -> &F {
        &self.inner
    }

    /// Outstanding references, cache slots included
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// True when both handles refer to the same engine face
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<F> Clone for FontFace<F> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<F> std::ops::Deref for FontFace<F> {
    type Target = F;

    fn deref(&self) -> &F {
        &self.inner
    }
}

impl<F> std::fmt::Debug for FontFace<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontFace")
            .field("refs", &self.ref_count())
            .finish()
    }
}
