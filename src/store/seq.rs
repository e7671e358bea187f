//! Content-addressed set of token sequences backed by DashMap.
//!
//! Used for both sentences and chains: identity is the exact sequence,
//! order matters, and concurrent interning of the same sequence resolves
//! to a single winner through the shard lock held by the entry API.

use std::num::NonZeroU64;
use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::id::{IdAllocator, TokenId};

use super::Interned;

/// Deduplicated token sequences with a handle per distinct sequence.
pub struct SeqSet<Id> {
    by_content: DashMap<Arc<[TokenId]>, Id>,
    by_id: DashMap<Id, Arc<[TokenId]>>,
    allocator: IdAllocator,
}

impl<Id> SeqSet<Id>
where
    Id: Copy + Eq + std::hash::Hash + From<NonZeroU64>,
{
    pub fn new() -> Self {
        Self {
            by_content: DashMap::new(),
            by_id: DashMap::new(),
            allocator: IdAllocator::new(),
        }
    }

    /// Insert a sequence if absent.
    ///
    /// The sequence is visible through [`get`](Self::get) before the caller
    /// learns it won, so any follow-up work can rely on reading it back.
    pub fn intern(&self, tokens: &[TokenId]) -> Interned<Id> {
        if let Some(id) = self.by_content.get(tokens) {
            return Interned::existing(*id.value());
        }
        match self.by_content.entry(Arc::from(tokens)) {
            Entry::Occupied(e) => Interned::existing(*e.get()),
            Entry::Vacant(e) => {
                let id: Id = self.allocator.next();
                self.by_id.insert(id, Arc::clone(e.key()));
                e.insert(id);
                Interned::created(id)
            }
        }
    }

    pub fn get(&self, id: Id) -> Option<Arc<[TokenId]>> {
        self.by_id.get(&id).map(|r| Arc::clone(r.value()))
    }

    pub fn contains(&self, tokens: &[TokenId]) -> bool {
        self.by_content.contains_key(tokens)
    }

    pub fn len(&self) -> usize {
        self.by_content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_content.is_empty()
    }

    pub fn clear(&self) {
        self.by_content.clear();
        self.by_id.clear();
        self.allocator.reset();
    }
}

impl<Id> Default for SeqSet<Id>
where
    Id: Copy + Eq + std::hash::Hash + From<NonZeroU64>,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<Id: Eq + std::hash::Hash> std::fmt::Debug for SeqSet<Id> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeqSet")
            .field("sequences", &self.by_id.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::SentenceId;

    fn tok(id: u64) -> TokenId {
        TokenId::new(id).unwrap()
    }

    #[test]
    fn order_matters() {
        let set: SeqSet<SentenceId> = SeqSet::new();
        let ab = set.intern(&[tok(1), tok(2)]);
        let ba = set.intern(&[tok(2), tok(1)]);
        assert!(ab.is_new && ba.is_new);
        assert_ne!(ab.id, ba.id);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn duplicate_folds_into_existing() {
        let set: SeqSet<SentenceId> = SeqSet::new();
        let first = set.intern(&[tok(1), tok(2), tok(3)]);
        let again = set.intern(&[tok(1), tok(2), tok(3)]);
        assert!(first.is_new);
        assert!(!again.is_new);
        assert_eq!(first.id, again.id);
        assert_eq!(set.get(first.id).unwrap().as_ref(), &[tok(1), tok(2), tok(3)]);
    }

    #[test]
    fn contains_and_clear() {
        let set: SeqSet<SentenceId> = SeqSet::new();
        set.intern(&[tok(4)]);
        assert!(set.contains(&[tok(4)]));
        set.clear();
        assert!(set.is_empty());
        assert!(!set.contains(&[tok(4)]));
    }

    #[test]
    fn debug_reports_size() {
        let set: SeqSet<SentenceId> = SeqSet::new();
        set.intern(&[tok(1), tok(2)]);
        set.intern(&[tok(2), tok(3)]);
        assert_eq!(format!("{set:?}"), "SeqSet { sequences: 2 }");
    }
}
