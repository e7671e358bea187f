//! Vocabulary: bidirectional token label ↔ [`TokenId`] mapping.
//!
//! Two `DashMap`s give O(1) lookups in both directions. Labels arrive
//! already normalized by the segmenter, so no case folding happens here.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::id::{IdAllocator, TokenId};

/// Interned vocabulary of every token seen since the last reset.
pub struct Vocabulary {
    /// Forward map: normalized label → TokenId.
    label_to_id: DashMap<Arc<str>, TokenId>,
    /// Reverse map: TokenId → label.
    id_to_label: DashMap<TokenId, Arc<str>>,
    allocator: IdAllocator,
}

impl Vocabulary {
    pub fn new() -> Self {
        Self {
            label_to_id: DashMap::new(),
            id_to_label: DashMap::new(),
            allocator: IdAllocator::new(),
        }
    }

    /// Intern a label, returning its id. Concurrent callers with the same
    /// label all receive the same id.
    pub fn intern(&self, label: &str) -> TokenId {
        if let Some(id) = self.label_to_id.get(label) {
            return *id.value();
        }
        match self.label_to_id.entry(Arc::from(label)) {
            Entry::Occupied(e) => *e.get(),
            Entry::Vacant(e) => {
                let id = self.allocator.next();
                self.id_to_label.insert(id, Arc::clone(e.key()));
                e.insert(id);
                id
            }
        }
    }

    /// Intern every token of a sentence, preserving order.
    pub fn intern_all(&self, tokens: &[String]) -> Vec<TokenId> {
        tokens.iter().map(|t| self.intern(t)).collect()
    }

    /// Look up the id of an already-interned label.
    pub fn lookup(&self, label: &str) -> Option<TokenId> {
        self.label_to_id.get(label).map(|r| *r.value())
    }

    /// Resolve an id to its label, falling back to the id's display form.
    pub fn label(&self, id: TokenId) -> String {
        self.id_to_label
            .get(&id)
            .map(|r| r.value().to_string())
            .unwrap_or_else(|| id.to_string())
    }

    pub fn len(&self) -> usize {
        self.id_to_label.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_to_label.is_empty()
    }

    /// Drop every token. Only valid while no other thread holds token ids.
    pub fn clear(&self) {
        self.label_to_id.clear();
        self.id_to_label.clear();
        self.allocator.reset();
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Vocabulary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vocabulary")
            .field("tokens", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_is_idempotent() {
        let vocab = Vocabulary::new();
        let a = vocab.intern("apple");
        let b = vocab.intern("pear");
        assert_ne!(a, b);
        assert_eq!(vocab.intern("apple"), a);
        assert_eq!(vocab.len(), 2);
    }

    #[test]
    fn label_round_trips() {
        let vocab = Vocabulary::new();
        let id = vocab.intern("sun");
        assert_eq!(vocab.label(id), "sun");
        assert_eq!(vocab.lookup("sun"), Some(id));
        assert_eq!(vocab.lookup("moon"), None);
    }

    #[test]
    fn concurrent_interning_has_one_winner() {
        let vocab = Arc::new(Vocabulary::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let vocab = Arc::clone(&vocab);
                std::thread::spawn(move || vocab.intern("shared"))
            })
            .collect();
        let ids: Vec<TokenId> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(ids.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(vocab.len(), 1);
    }

    #[test]
    fn clear_restarts_ids() {
        let vocab = Vocabulary::new();
        vocab.intern("x");
        vocab.intern("y");
        vocab.clear();
        assert!(vocab.is_empty());
        assert_eq!(vocab.intern("y").get(), 1);
    }
}
