//! "Up" growth: two orthotopes of equal shape joined cell-by-cell.
//!
//! `lo` and `ro` combine when some axis bijection `π` (between axes of equal
//! length) makes every `lo[c] → ro[π c]` an observed direction. The result
//! has one more axis, of length 2, with `lo` at 0 and `ro` at 1.

use rayon::prelude::*;

use crate::id::TokenId;
use crate::ortho::{Ortho, Role};

use super::{Evidence, SearchSpace};

/// Every orthotope obtainable by stacking `ro` on top of `lo`.
pub fn attempt(lo: &Ortho, ro: &Ortho, evidence: &impl Evidence) -> Vec<Ortho> {
    if lo.shape() != ro.shape() {
        return vec![];
    }
    let lo_hops = lo.hops();
    let ro_hops = ro.hops();
    axis_bijections(lo.shape())
        .into_iter()
        .filter(|pi| {
            evidence.has_edge(lo.origin(), ro.origin())
                && pi
                    .iter()
                    .enumerate()
                    .all(|(axis, &target)| evidence.has_edge(lo_hops[axis], ro_hops[target]))
        })
        .filter_map(|pi| stack(lo, ro, &pi, evidence))
        .collect()
}

fn stack(lo: &Ortho, ro: &Ortho, pi: &[usize], evidence: &impl Evidence) -> Option<Ortho> {
    let mut cells = Vec::with_capacity(lo.cells().len() * 2);
    let mut mapped = vec![0; pi.len()];
    for (i, &left) in lo.cells().iter().enumerate() {
        for (axis, &value) in lo.coords(i).iter().enumerate() {
            mapped[pi[axis]] = value;
        }
        let right = ro.at(&mapped);
        if !evidence.has_edge(left, right) {
            return None;
        }
        cells.push(left);
        cells.push(right);
    }
    let mut shape = lo.shape().to_vec();
    shape.push(2);
    Ortho::from_parts(shape, cells)
}

/// Permutations `π` of the axes with `shape[i] == shape[π i]`.
pub fn axis_bijections(shape: &[usize]) -> Vec<Vec<usize>> {
    fn extend(shape: &[usize], current: &mut Vec<usize>, used: &mut [bool], out: &mut Vec<Vec<usize>>) {
        let axis = current.len();
        if axis == shape.len() {
            out.push(current.clone());
            return;
        }
        for target in 0..shape.len() {
            if !used[target] && shape[target] == shape[axis] {
                used[target] = true;
                current.push(target);
                extend(shape, current, used, out);
                current.pop();
                used[target] = false;
            }
        }
    }

    let mut out = Vec::new();
    extend(
        shape,
        &mut Vec::with_capacity(shape.len()),
        &mut vec![false; shape.len()],
        &mut out,
    );
    out
}

/// A new direction `a → b` joins `lo ∋ a` and `ro ∋ b` where both sit in
/// the same role (by origin, by hop, by contents).
pub fn from_edge(space: &impl SearchSpace, a: TokenId, b: TokenId) -> Vec<Ortho> {
    Role::ALL
        .iter()
        .flat_map(|&role| {
            let los = space.orthos_with_role(role, a);
            let ros = space.orthos_with_role(role, b);
            los.par_iter()
                .flat_map_iter(|lo| {
                    ros.iter()
                        .flat_map(|ro| attempt(lo, ro, space))
                        .collect::<Vec<_>>()
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

/// A new orthotope as either side: partners hang off its origin's
/// successors (it is `lo`) or predecessors (it is `ro`).
pub fn from_ortho(space: &impl SearchSpace, ortho: &Ortho) -> Vec<Ortho> {
    let origin = ortho.origin();
    let mut found = Vec::new();
    for next in space.successors(origin) {
        for ro in space.orthos_by_origin(next) {
            found.extend(attempt(ortho, &ro, space));
        }
    }
    for prev in space.predecessors(origin) {
        for lo in space.orthos_by_origin(prev) {
            found.extend(attempt(&lo, ortho, space));
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::testing::Fixture;

    const LEFT: &str = "a b c d. a c. b d. a b";
    const RIGHT: &str = "e f. g h. e g. f h";
    const JOIN: &str = "a e. b f. c g. d h";
    const CUBE: &str = "a b\nc d\n\ne f\ng h";

    fn squares(fx: &Fixture) {
        assert!(fx.keep(Ortho::square(fx.t("a"), fx.t("b"), fx.t("c"), fx.t("d")).unwrap()));
        assert!(fx.keep(Ortho::square(fx.t("e"), fx.t("f"), fx.t("g"), fx.t("h")).unwrap()));
    }

    #[test]
    fn bijections_respect_lengths() {
        assert_eq!(axis_bijections(&[2, 2]).len(), 2);
        assert_eq!(axis_bijections(&[3, 2]), vec![vec![0, 1]]);
        assert_eq!(axis_bijections(&[2, 2, 2]).len(), 6);
        assert_eq!(axis_bijections(&[3, 3, 2]).len(), 2);
    }

    #[test]
    fn stacks_two_squares_into_a_cube() {
        let fx = Fixture::new();
        fx.document(LEFT);
        fx.document(RIGHT);
        fx.document(JOIN);
        let lo = Ortho::square(fx.t("a"), fx.t("b"), fx.t("c"), fx.t("d")).unwrap();
        let ro = Ortho::square(fx.t("e"), fx.t("f"), fx.t("g"), fx.t("h")).unwrap();
        let found = attempt(&lo, &ro, &fx.stores());
        assert_eq!(fx.rendered(&found), vec![CUBE]);
        assert_eq!(found[0].dims(), vec![1, 1, 1]);
    }

    #[test]
    fn missing_connection_blocks_stacking() {
        let fx = Fixture::new();
        fx.document(LEFT);
        fx.document(RIGHT);
        fx.document("a e. b f. c g");
        let lo = Ortho::square(fx.t("a"), fx.t("b"), fx.t("c"), fx.t("d")).unwrap();
        let ro = Ortho::square(fx.t("e"), fx.t("f"), fx.t("g"), fx.t("h")).unwrap();
        assert!(attempt(&lo, &ro, &fx.stores()).is_empty());
    }

    #[test]
    fn found_from_every_connecting_edge() {
        let fx = Fixture::new();
        fx.document(LEFT);
        fx.document(RIGHT);
        fx.document(JOIN);
        squares(&fx);
        // Origin, hop, hop, contents.
        for (a, b) in [("a", "e"), ("b", "f"), ("c", "g"), ("d", "h")] {
            let found = from_edge(&fx.stores(), fx.t(a), fx.t(b));
            assert_eq!(fx.rendered(&found), vec![CUBE], "edge {a} → {b}");
        }
    }

    #[test]
    fn found_from_either_square() {
        let fx = Fixture::new();
        fx.document(LEFT);
        fx.document(RIGHT);
        fx.document(JOIN);
        squares(&fx);
        let lo = Ortho::square(fx.t("a"), fx.t("b"), fx.t("c"), fx.t("d")).unwrap();
        let ro = Ortho::square(fx.t("e"), fx.t("f"), fx.t("g"), fx.t("h")).unwrap();
        assert_eq!(fx.rendered(&from_ortho(&fx.stores(), &lo)), vec![CUBE]);
        assert_eq!(fx.rendered(&from_ortho(&fx.stores(), &ro)), vec![CUBE]);
    }

    #[test]
    fn token_may_repeat_on_different_diagonals() {
        // `x` is a hop of both squares and lands at distances 1 and 2.
        let fx = Fixture::new();
        fx.document("a x c. a b c. p x r. p q r. a p. x q. b x. c r");
        let lo = Ortho::square(fx.t("a"), fx.t("x"), fx.t("b"), fx.t("c")).unwrap();
        let ro = Ortho::square(fx.t("p"), fx.t("x"), fx.t("q"), fx.t("r")).unwrap();
        let found = attempt(&lo, &ro, &fx.stores());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].dims(), vec![1, 1, 1]);
        let x = fx.t("x");
        assert_eq!(found[0].cells().iter().filter(|&&t| t == x).count(), 2);
    }

    #[test]
    fn repeat_on_the_joined_diagonal_is_rejected() {
        // `c` is the far corner of `lo` and a hop of `ro`: both at distance 2.
        let fx = Fixture::new();
        fx.document("a x c. a b c. p c r. p q r. a p. b q. c r");
        let lo = Ortho::square(fx.t("a"), fx.t("x"), fx.t("b"), fx.t("c")).unwrap();
        let ro = Ortho::square(fx.t("p"), fx.t("c"), fx.t("q"), fx.t("r")).unwrap();
        assert!(attempt(&lo, &ro, &fx.stores()).is_empty());
    }
}
