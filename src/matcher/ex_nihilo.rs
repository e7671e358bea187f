//! Squares built from nothing but pair directions.
//!
//! A new direction `a → b` can be either edge leaving the origin of a 2×2
//! square, or either edge entering its far corner. By symmetry of the two
//! hops, two searches cover all four positions.

use crate::id::TokenId;
use crate::ortho::Ortho;

use super::SearchSpace;

pub fn search(space: &impl SearchSpace, a: TokenId, b: TokenId) -> Vec<Ortho> {
    let mut found = from_origin_edge(space, a, b);
    found.extend(from_far_edge(space, a, b));
    found
}

/// `a → b` as an origin edge: `a → c`, `b → d`, `c → d`.
fn from_origin_edge(space: &impl SearchSpace, a: TokenId, b: TokenId) -> Vec<Ortho> {
    let fars = space.successors(b);
    space
        .successors(a)
        .into_iter()
        .filter(|&c| c != b)
        .flat_map(|c| {
            fars.iter()
                .filter(move |&&d| space.has_edge(c, d))
                .filter_map(move |&d| Ortho::square(a, b, c, d))
        })
        .collect()
}

/// `a → b` as a far edge: `o → a`, `o → c`, `c → b`.
fn from_far_edge(space: &impl SearchSpace, a: TokenId, b: TokenId) -> Vec<Ortho> {
    space
        .predecessors(a)
        .into_iter()
        .flat_map(|o| {
            space
                .successors(o)
                .into_iter()
                .filter(move |&c| c != a && space.has_edge(c, b))
                .filter_map(move |c| Ortho::square(o, a, c, b))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::testing::Fixture;

    #[test]
    fn origin_edge_closes_square() {
        let fx = Fixture::new();
        fx.document("a c. b d. c d");
        fx.sentence("a b");
        let found = search(&fx.stores(), fx.t("a"), fx.t("b"));
        assert_eq!(fx.rendered(&found), vec!["a b\nc d"]);
    }

    #[test]
    fn far_edge_closes_square() {
        let fx = Fixture::new();
        fx.document("a b. a c. c d");
        fx.sentence("b d");
        let found = search(&fx.stores(), fx.t("b"), fx.t("d"));
        assert_eq!(fx.rendered(&found), vec!["a b\nc d"]);
    }

    #[test]
    fn a_path_is_not_a_square() {
        let fx = Fixture::new();
        fx.document("a b. b d. a c");
        let found = search(&fx.stores(), fx.t("a"), fx.t("b"));
        assert!(found.is_empty());
    }

    #[test]
    fn reversed_direction_does_not_count() {
        let fx = Fixture::new();
        // `d c` instead of `c d`.
        fx.document("a b. a c. b d. d c");
        let found = search(&fx.stores(), fx.t("a"), fx.t("b"));
        assert!(found.is_empty());
    }
}
