//! Orthotope matcher: finds new orthotopes completed by a newly stored element.
//!
//! Every search is read-only. A worker inserts an element first, then runs
//! the search for it, then inserts whatever the search found; because each
//! element's own search runs after that element is visible, the search
//! triggered by whichever constituent of an orthotope arrives last always
//! finds it, regardless of arrival order or worker count.
//!
//! - [`ex_nihilo`]: a new pair direction closes a 2×2 square.
//! - [`up`]: two equal orthotopes joined cell-by-cell gain a new axis.
//! - [`over`]: two orthotopes offset by one step along an axis merge into
//!   a longer one, provided every resulting line exists as a chain.

pub mod ex_nihilo;
pub mod over;
pub mod up;

use std::sync::Arc;

use crate::graph::{OrthoIndex, TokenGraph};
use crate::id::TokenId;
use crate::ortho::{Ortho, Role};
use crate::store::DedupStore;

/// The facts an orthotope needs to be valid: pair directions and chains.
pub trait Evidence: Sync {
    fn has_edge(&self, from: TokenId, to: TokenId) -> bool;
    fn has_chain(&self, tokens: &[TokenId]) -> bool;
}

/// Read access to everything a search needs.
pub trait SearchSpace: Evidence {
    fn successors(&self, token: TokenId) -> Vec<TokenId>;
    fn predecessors(&self, token: TokenId) -> Vec<TokenId>;
    fn orthos_with_role(&self, role: Role, token: TokenId) -> Vec<Arc<Ortho>>;
    fn orthos_containing(&self, token: TokenId) -> Vec<Arc<Ortho>>;

    fn orthos_by_origin(&self, token: TokenId) -> Vec<Arc<Ortho>> {
        self.orthos_with_role(Role::Origin, token)
    }
}

/// Live view over the engine's stores.
#[derive(Debug, Clone, Copy)]
pub struct Stores<'a> {
    pub graph: &'a TokenGraph,
    pub store: &'a DedupStore,
    pub orthos: &'a OrthoIndex,
}

impl Evidence for Stores<'_> {
    fn has_edge(&self, from: TokenId, to: TokenId) -> bool {
        self.graph.has_edge(from, to)
    }

    fn has_chain(&self, tokens: &[TokenId]) -> bool {
        self.store.has_chain(tokens)
    }
}

impl SearchSpace for Stores<'_> {
    fn successors(&self, token: TokenId) -> Vec<TokenId> {
        self.graph.successors(token)
    }

    fn predecessors(&self, token: TokenId) -> Vec<TokenId> {
        self.graph.predecessors(token)
    }

    fn orthos_with_role(&self, role: Role, token: TokenId) -> Vec<Arc<Ortho>> {
        self.orthos.with_role(role, token)
    }

    fn orthos_containing(&self, token: TokenId) -> Vec<Arc<Ortho>> {
        self.orthos.containing(token)
    }
}

/// What a search was triggered by.
#[derive(Debug, Clone)]
pub enum Trigger<'t> {
    /// A newly observed pair direction.
    Edge { from: TokenId, to: TokenId },
    /// A newly stored chain.
    Chain(&'t [TokenId]),
    /// A newly discovered orthotope.
    Ortho(&'t Ortho),
}

/// Run every search that applies to `trigger`.
///
/// The result may contain duplicates and orthotopes that already exist;
/// insertion is content-addressed.
pub fn discover(space: &impl SearchSpace, trigger: Trigger<'_>) -> Vec<Ortho> {
    match trigger {
        Trigger::Edge { from, to } => {
            let mut found = ex_nihilo::search(space, from, to);
            found.extend(up::from_edge(space, from, to));
            found
        }
        Trigger::Chain(tokens) => over::from_chain(space, tokens),
        Trigger::Ortho(ortho) => {
            let mut found = up::from_ortho(space, ortho);
            found.extend(over::from_ortho(space, ortho));
            found
        }
    }
}
