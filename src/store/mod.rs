//! Dedup store: content-addressed sentences, pairs, chains and phrases.
//!
//! - [`SeqSet`] holds ordered token sequences (sentences and chains).
//! - Pairs are keyed by their unordered token set and remember every
//!   direction they have been observed in.
//! - Phrases are keyed by the canonical text of an accepted document and
//!   keep the first title they were submitted under.
//!
//! All interning goes through the DashMap entry API, so at most one stored
//! instance exists per distinct content and racing callers agree on the
//! winner.

pub mod seq;

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::id::{ChainId, IdAllocator, PairId, PhraseId, SentenceId, TokenId};

pub use seq::SeqSet;

/// Outcome of interning content: its handle and whether this call created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interned<T> {
    pub id: T,
    pub is_new: bool,
}

impl<T> Interned<T> {
    pub fn created(id: T) -> Self {
        Self { id, is_new: true }
    }

    pub fn existing(id: T) -> Self {
        Self { id, is_new: false }
    }
}

/// Outcome of interning a pair observed as `from → to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairInterned {
    pub id: PairId,
    /// The unordered token set was not known before.
    pub is_new: bool,
    /// This direction was not observed before.
    pub direction_is_new: bool,
}

#[derive(Debug, Clone, Copy)]
struct PairRecord {
    id: PairId,
    /// Observed as `low → high` (by token id).
    ascending: bool,
    /// Observed as `high → low`.
    descending: bool,
}

/// One accepted document.
#[derive(Debug, Clone)]
pub struct PhraseRecord {
    pub id: PhraseId,
    pub title: String,
}

/// Every deduplicated content set the engine keeps.
#[derive(Debug)]
pub struct DedupStore {
    sentences: SeqSet<SentenceId>,
    chains: SeqSet<ChainId>,
    pairs: DashMap<(TokenId, TokenId), PairRecord>,
    pair_ids: IdAllocator,
    phrases: DashMap<Arc<str>, PhraseRecord>,
    phrase_ids: IdAllocator,
}

impl DedupStore {
    pub fn new() -> Self {
        Self {
            sentences: SeqSet::new(),
            chains: SeqSet::new(),
            pairs: DashMap::new(),
            pair_ids: IdAllocator::new(),
            phrases: DashMap::new(),
            phrase_ids: IdAllocator::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Sentences
    // -----------------------------------------------------------------------

    pub fn intern_sentence(&self, tokens: &[TokenId]) -> Interned<SentenceId> {
        self.sentences.intern(tokens)
    }

    pub fn sentence(&self, id: SentenceId) -> Option<Arc<[TokenId]>> {
        self.sentences.get(id)
    }

    pub fn sentence_count(&self) -> usize {
        self.sentences.len()
    }

    // -----------------------------------------------------------------------
    // Pairs
    // -----------------------------------------------------------------------

    /// Intern the pair `{from, to}` observed in the direction `from → to`.
    ///
    /// Returns `None` when both tokens are equal: a pair is a set of two
    /// distinct tokens.
    pub fn intern_pair(&self, from: TokenId, to: TokenId) -> Option<PairInterned> {
        if from == to {
            return None;
        }
        let ascending = from < to;
        let key = if ascending { (from, to) } else { (to, from) };

        let interned = match self.pairs.entry(key) {
            Entry::Occupied(mut e) => {
                let record = e.get_mut();
                let seen = if ascending {
                    &mut record.ascending
                } else {
                    &mut record.descending
                };
                let direction_is_new = !*seen;
                *seen = true;
                PairInterned {
                    id: record.id,
                    is_new: false,
                    direction_is_new,
                }
            }
            Entry::Vacant(e) => {
                let id = self.pair_ids.next();
                e.insert(PairRecord {
                    id,
                    ascending,
                    descending: !ascending,
                });
                PairInterned {
                    id,
                    is_new: true,
                    direction_is_new: true,
                }
            }
        };
        Some(interned)
    }

    /// Whether the pair `{a, b}` exists in any direction.
    pub fn has_pair(&self, a: TokenId, b: TokenId) -> bool {
        let key = if a < b { (a, b) } else { (b, a) };
        self.pairs.contains_key(&key)
    }

    pub fn pair_count(&self) -> usize {
        self.pairs.len()
    }

    // -----------------------------------------------------------------------
    // Chains
    // -----------------------------------------------------------------------

    pub fn intern_chain(&self, tokens: &[TokenId]) -> Interned<ChainId> {
        self.chains.intern(tokens)
    }

    pub fn chain(&self, id: ChainId) -> Option<Arc<[TokenId]>> {
        self.chains.get(id)
    }

    pub fn has_chain(&self, tokens: &[TokenId]) -> bool {
        self.chains.contains(tokens)
    }

    pub fn chain_count(&self) -> usize {
        self.chains.len()
    }

    // -----------------------------------------------------------------------
    // Phrases
    // -----------------------------------------------------------------------

    /// Record an accepted document under its content key.
    ///
    /// Resubmitting the same content under another title is a no-op that
    /// returns the existing phrase.
    pub fn intern_phrase(&self, title: &str, content_key: &str) -> Interned<PhraseId> {
        if let Some(record) = self.phrases.get(content_key) {
            return Interned::existing(record.id);
        }
        match self.phrases.entry(Arc::from(content_key)) {
            Entry::Occupied(e) => Interned::existing(e.get().id),
            Entry::Vacant(e) => {
                let id = self.phrase_ids.next();
                e.insert(PhraseRecord {
                    id,
                    title: title.to_string(),
                });
                Interned::created(id)
            }
        }
    }

    pub fn phrase_count(&self) -> usize {
        self.phrases.len()
    }

    /// Titles of all phrases in acceptance order.
    pub fn titles(&self) -> Vec<String> {
        let mut records: Vec<PhraseRecord> =
            self.phrases.iter().map(|r| r.value().clone()).collect();
        records.sort_by_key(|r| r.id);
        records.into_iter().map(|r| r.title).collect()
    }

    /// Drop all content. Only valid under the engine's reset barrier.
    pub fn clear(&self) {
        self.sentences.clear();
        self.chains.clear();
        self.pairs.clear();
        self.pair_ids.reset();
        self.phrases.clear();
        self.phrase_ids.reset();
    }
}

impl Default for DedupStore {
    fn default() -> Self {
        Self::new()
    }
}
