//! Graph store: the directed token graph and the orthotope index.
//!
//! - [`TokenGraph`] holds one node per token and one edge per observed pair
//!   direction, backed by `petgraph`.
//! - [`OrthoIndex`] holds every discovered orthotope, content-addressed and
//!   indexed by the tokens in its origin, hops and contents.

pub mod index;
pub mod orthos;

pub use index::TokenGraph;
pub use orthos::OrthoIndex;
