//! Content-addressed orthotope index.
//!
//! Orthotopes are keyed by their canonical value, so racing discoveries of
//! the same grid resolve to one stored instance. Each new orthotope is
//! indexed by every token in its origin, hops and contents, and by its
//! dims for counting.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::id::{IdAllocator, OrthoId, TokenId};
use crate::ortho::{Ortho, Role};
use crate::query::{DimsOrder, dims_match};
use crate::store::Interned;

/// Every discovered orthotope plus lookup indexes.
pub struct OrthoIndex {
    by_value: DashMap<Arc<Ortho>, OrthoId>,
    by_id: DashMap<OrthoId, Arc<Ortho>>,
    by_origin: DashMap<TokenId, Vec<OrthoId>>,
    by_hop: DashMap<TokenId, Vec<OrthoId>>,
    by_contents: DashMap<TokenId, Vec<OrthoId>>,
    by_dims: DashMap<Vec<usize>, Vec<OrthoId>>,
    allocator: IdAllocator,
}

impl OrthoIndex {
    pub fn new() -> Self {
        Self {
            by_value: DashMap::new(),
            by_id: DashMap::new(),
            by_origin: DashMap::new(),
            by_hop: DashMap::new(),
            by_contents: DashMap::new(),
            by_dims: DashMap::new(),
            allocator: IdAllocator::new(),
        }
    }

    /// Insert an orthotope unless an equal one exists.
    ///
    /// Only the call that creates the entry indexes it, and indexing is
    /// complete before this returns.
    pub fn insert(&self, ortho: Ortho) -> Interned<OrthoId> {
        if let Some(id) = self.by_value.get(&ortho) {
            return Interned::existing(*id.value());
        }
        let ortho = Arc::new(ortho);
        let id = match self.by_value.entry(Arc::clone(&ortho)) {
            Entry::Occupied(e) => return Interned::existing(*e.get()),
            Entry::Vacant(e) => {
                let id: OrthoId = self.allocator.next();
                self.by_id.insert(id, Arc::clone(&ortho));
                e.insert(id);
                id
            }
        };

        for role in Role::ALL {
            let index = self.role_index(role);
            for token in ortho.tokens_in(role) {
                index.entry(token).or_default().push(id);
            }
        }
        self.by_dims.entry(ortho.dims()).or_default().push(id);
        Interned::created(id)
    }

    pub fn get(&self, id: OrthoId) -> Option<Arc<Ortho>> {
        self.by_id.get(&id).map(|r| Arc::clone(r.value()))
    }

    pub fn contains(&self, ortho: &Ortho) -> bool {
        self.by_value.contains_key(ortho)
    }

    fn role_index(&self, role: Role) -> &DashMap<TokenId, Vec<OrthoId>> {
        match role {
            Role::Origin => &self.by_origin,
            Role::Hop => &self.by_hop,
            Role::Contents => &self.by_contents,
        }
    }

    /// Orthotopes where `token` appears in the given role.
    pub fn with_role(&self, role: Role, token: TokenId) -> Vec<Arc<Ortho>> {
        let ids = self
            .role_index(role)
            .get(&token)
            .map(|r| r.value().clone())
            .unwrap_or_default();
        ids.into_iter().filter_map(|id| self.get(id)).collect()
    }

    pub fn by_origin(&self, token: TokenId) -> Vec<Arc<Ortho>> {
        self.with_role(Role::Origin, token)
    }

    /// Orthotopes containing `token` anywhere, each listed once.
    pub fn containing(&self, token: TokenId) -> Vec<Arc<Ortho>> {
        let mut ids: Vec<OrthoId> = Role::ALL
            .iter()
            .flat_map(|&role| {
                self.role_index(role)
                    .get(&token)
                    .map(|r| r.value().clone())
                    .unwrap_or_default()
            })
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids.into_iter().filter_map(|id| self.get(id)).collect()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Number of orthotopes whose dims match `query`.
    pub fn count_matching(&self, query: &[usize], order: DimsOrder) -> usize {
        self.by_dims
            .iter()
            .filter(|r| dims_match(r.key(), query, order))
            .map(|r| r.value().len())
            .sum()
    }

    /// Orthotopes whose dims match `query`.
    pub fn matching(&self, query: &[usize], order: DimsOrder) -> Vec<Arc<Ortho>> {
        let ids: Vec<OrthoId> = self
            .by_dims
            .iter()
            .filter(|r| dims_match(r.key(), query, order))
            .flat_map(|r| r.value().clone())
            .collect();
        ids.into_iter().filter_map(|id| self.get(id)).collect()
    }

    pub fn clear(&self) {
        self.by_value.clear();
        self.by_id.clear();
        self.by_origin.clear();
        self.by_hop.clear();
        self.by_contents.clear();
        self.by_dims.clear();
        self.allocator.reset();
    }
}

impl Default for OrthoIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for OrthoIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrthoIndex")
            .field("orthos", &self.len())
            .field("shapes", &self.by_dims.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tok(id: u64) -> TokenId {
        TokenId::new(id).unwrap()
    }

    fn square(o: u64, a: u64, b: u64, f: u64) -> Ortho {
        Ortho::square(tok(o), tok(a), tok(b), tok(f)).unwrap()
    }

    #[test]
    fn insert_is_content_addressed() {
        let index = OrthoIndex::new();
        let first = index.insert(square(1, 2, 3, 4));
        let again = index.insert(square(1, 3, 2, 4));
        assert!(first.is_new);
        assert!(!again.is_new);
        assert_eq!(first.id, again.id);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn indexes_every_role() {
        let index = OrthoIndex::new();
        index.insert(square(1, 2, 3, 4));
        assert_eq!(index.with_role(Role::Origin, tok(1)).len(), 1);
        assert_eq!(index.with_role(Role::Hop, tok(2)).len(), 1);
        assert_eq!(index.with_role(Role::Hop, tok(3)).len(), 1);
        assert_eq!(index.with_role(Role::Contents, tok(4)).len(), 1);
        assert!(index.with_role(Role::Origin, tok(4)).is_empty());
        assert_eq!(index.containing(tok(4)).len(), 1);
    }

    #[test]
    fn counts_by_dims() {
        let index = OrthoIndex::new();
        index.insert(square(1, 2, 3, 4));
        index.insert(square(5, 6, 7, 8));
        let (a, b, c, d, e, f) = (tok(11), tok(12), tok(13), tok(14), tok(15), tok(16));
        index.insert(Ortho::from_parts(vec![2, 3], vec![a, b, e, c, d, f]).unwrap());

        assert_eq!(index.count_matching(&[1, 1], DimsOrder::Positional), 2);
        assert_eq!(index.count_matching(&[2, 1], DimsOrder::Positional), 1);
        assert_eq!(index.count_matching(&[1, 2], DimsOrder::Positional), 0);
        assert_eq!(index.count_matching(&[1, 2], DimsOrder::Sorted), 1);
        assert_eq!(index.matching(&[1, 1], DimsOrder::Positional).len(), 2);
    }

    #[test]
    fn clear_forgets_orthos() {
        let index = OrthoIndex::new();
        let sq = square(1, 2, 3, 4);
        index.insert(sq.clone());
        index.clear();
        assert!(index.is_empty());
        assert!(!index.contains(&sq));
        assert!(index.by_origin(tok(1)).is_empty());
    }
}
