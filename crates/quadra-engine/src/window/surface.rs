use std::collections::HashMap;

use crate::error::InitError;

/// Registry of drawing surfaces keyed by identifier.
///
/// The hosting side publishes its surfaces here; controller construction
/// resolves its target by id, the way a page is asked for an element. Generic
/// over the surface handle so resolution is testable without a real window.
#[derive(Debug)]
pub struct SurfaceTable<S> {
    entries: HashMap<String, S>,
}

impl<S> Default for SurfaceTable<S> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<S> SurfaceTable<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes a surface under `id`, replacing any previous one.
    pub fn publish(&mut self, id: impl Into<String>, surface: S) {
        self.entries.insert(id.into(), surface);
    }

    pub fn get(&self, id: &str) -> Option<&S> {
        self.entries.get(id)
    }

    /// Resolves a surface by identifier.
    ///
    /// An empty identifier is a configuration error and never reaches the
    /// lookup; an identifier with no matching surface is
    /// [`InitError::SurfaceNotFound`].
    pub fn resolve(&self, id: &str) -> Result<&S, InitError> {
        if id.is_empty() {
            return Err(InitError::MissingSurfaceId);
        }

        self.entries
            .get(id)
            .ok_or_else(|| InitError::SurfaceNotFound { id: id.to_string() })
    }
}
