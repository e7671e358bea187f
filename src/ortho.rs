//! Orthotopes: k-dimensional grids of tokens discovered in the pair graph.
//!
//! An [`Ortho`] is stored densely: a `shape` (nodes per axis, each ≥ 2) and
//! the row-major `cells`. The all-zero coordinate is the origin, cells one
//! step away are hops, everything further out is contents. Every grid edge
//! `c → c + e_i` is an observed pair direction, so edges always point away
//! from the origin.
//!
//! Values are always canonical: axes sorted by (length descending, hop
//! token). Two discoveries of the same grid therefore compare equal and hash
//! the same, which is what makes orthotope creation content-addressed.

use std::cmp::Reverse;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::id::TokenId;

/// Where a token sits relative to an orthotope's origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Distance 0.
    Origin,
    /// Distance 1.
    Hop,
    /// Distance 2 or more.
    Contents,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Origin, Role::Hop, Role::Contents];

    pub fn of_distance(distance: usize) -> Self {
        match distance {
            0 => Role::Origin,
            1 => Role::Hop,
            _ => Role::Contents,
        }
    }
}

/// A canonical orthotope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Ortho {
    shape: Vec<usize>,
    cells: Vec<TokenId>,
}

impl Ortho {
    /// Build a 2×2 square `origin → {a, b} → far`.
    ///
    /// Returns `None` when the hops coincide.
    pub fn square(origin: TokenId, a: TokenId, b: TokenId, far: TokenId) -> Option<Self> {
        Self::from_parts(vec![2, 2], vec![origin, b, a, far])
    }

    /// Validate and canonicalize a grid.
    ///
    /// Returns `None` if the shape is degenerate, the cell count does not
    /// match, or a token repeats at the same distance from the origin.
    pub fn from_parts(shape: Vec<usize>, cells: Vec<TokenId>) -> Option<Self> {
        if shape.len() < 2 || shape.iter().any(|&len| len < 2) {
            return None;
        }
        if shape.iter().product::<usize>() != cells.len() {
            return None;
        }
        let raw = Self { shape, cells };
        if !raw.diagonals_are_distinct() {
            return None;
        }
        Some(raw.canonical())
    }

    // -----------------------------------------------------------------------
    // Shape
    // -----------------------------------------------------------------------

    /// Nodes per axis, non-increasing.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Axis lengths minus one, the form used by `dims` queries.
    pub fn dims(&self) -> Vec<usize> {
        self.shape.iter().map(|len| len - 1).collect()
    }

    /// Number of axes.
    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    pub fn cells(&self) -> &[TokenId] {
        &self.cells
    }

    /// Row-major stride of every axis.
    pub fn strides(&self) -> Vec<usize> {
        strides_of(&self.shape)
    }

    // -----------------------------------------------------------------------
    // Coordinates
    // -----------------------------------------------------------------------

    pub fn coords(&self, index: usize) -> Vec<usize> {
        coords_of(index, &self.shape)
    }

    pub fn index(&self, coords: &[usize]) -> usize {
        index_of(coords, &self.shape)
    }

    pub fn at(&self, coords: &[usize]) -> TokenId {
        self.cells[self.index(coords)]
    }

    /// Distance of a cell from the origin (coordinate sum).
    pub fn distance(&self, index: usize) -> usize {
        self.coords(index).iter().sum()
    }

    pub fn origin(&self) -> TokenId {
        self.cells[0]
    }

    /// The token one step from the origin along `axis`.
    pub fn hop(&self, axis: usize) -> TokenId {
        self.cells[self.strides()[axis]]
    }

    pub fn hops(&self) -> Vec<TokenId> {
        self.strides().into_iter().map(|s| self.cells[s]).collect()
    }

    /// Distinct tokens at distance two or more.
    pub fn contents(&self) -> Vec<TokenId> {
        let mut seen = HashSet::new();
        (0..self.cells.len())
            .filter(|&i| self.distance(i) >= 2)
            .map(|i| self.cells[i])
            .filter(|t| seen.insert(*t))
            .collect()
    }

    /// Distinct tokens in the given role.
    pub fn tokens_in(&self, role: Role) -> Vec<TokenId> {
        match role {
            Role::Origin => vec![self.origin()],
            Role::Hop => self.hops(),
            Role::Contents => self.contents(),
        }
    }

    pub fn contains(&self, token: TokenId) -> bool {
        self.cells.contains(&token)
    }

    // -----------------------------------------------------------------------
    // Lines and edges
    // -----------------------------------------------------------------------

    /// Every full line along `axis`, each read away from the origin.
    pub fn lines(&self, axis: usize) -> Vec<Vec<TokenId>> {
        let strides = self.strides();
        let step = strides[axis];
        let len = self.shape[axis];
        (0..self.cells.len())
            .filter(|&i| self.coords(i)[axis] == 0)
            .map(|start| (0..len).map(|k| self.cells[start + k * step]).collect())
            .collect()
    }

    /// Whether `tokens` is one of the full lines along `axis`.
    pub fn has_line(&self, axis: usize, tokens: &[TokenId]) -> bool {
        self.shape[axis] == tokens.len() && self.lines(axis).iter().any(|l| l == tokens)
    }

    /// Every directed grid edge.
    pub fn edges(&self) -> Vec<(TokenId, TokenId)> {
        let strides = self.strides();
        let mut edges = Vec::new();
        for i in 0..self.cells.len() {
            let coords = self.coords(i);
            for (axis, &step) in strides.iter().enumerate() {
                if coords[axis] + 1 < self.shape[axis] {
                    edges.push((self.cells[i], self.cells[i + step]));
                }
            }
        }
        edges
    }

    // -----------------------------------------------------------------------
    // Canonical form
    // -----------------------------------------------------------------------

    /// Reorder axes so that new axis `j` is old axis `order[j]`.
    pub fn permuted(&self, order: &[usize]) -> Self {
        let shape: Vec<usize> = order.iter().map(|&a| self.shape[a]).collect();
        let mut cells = self.cells.clone();
        for (i, &token) in self.cells.iter().enumerate() {
            let old = self.coords(i);
            let new: Vec<usize> = order.iter().map(|&a| old[a]).collect();
            cells[index_of(&new, &shape)] = token;
        }
        Self { shape, cells }
    }

    /// Axis order by (length descending, key of the hop token).
    pub fn axis_order_by<K: Ord>(&self, key: impl Fn(TokenId) -> K) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.rank()).collect();
        order.sort_by_key(|&a| (Reverse(self.shape[a]), key(self.hop(a))));
        order
    }

    fn canonical(self) -> Self {
        let order = self.axis_order_by(|t| t);
        if order.iter().enumerate().all(|(j, &a)| j == a) {
            self
        } else {
            self.permuted(&order)
        }
    }

    /// No token appears twice at the same distance from the origin.
    fn diagonals_are_distinct(&self) -> bool {
        let mut seen = HashSet::with_capacity(self.cells.len());
        (0..self.cells.len()).all(|i| seen.insert((self.distance(i), self.cells[i])))
    }
}

/// Row-major strides for a shape.
pub fn strides_of(shape: &[usize]) -> Vec<usize> {
    let mut strides = vec![1; shape.len()];
    for axis in (0..shape.len().saturating_sub(1)).rev() {
        strides[axis] = strides[axis + 1] * shape[axis + 1];
    }
    strides
}

pub fn coords_of(mut index: usize, shape: &[usize]) -> Vec<usize> {
    let mut coords = vec![0; shape.len()];
    for axis in (0..shape.len()).rev() {
        coords[axis] = index % shape[axis];
        index /= shape[axis];
    }
    coords
}

pub fn index_of(coords: &[usize], shape: &[usize]) -> usize {
    coords
        .iter()
        .zip(shape)
        .fold(0, |acc, (&c, &len)| acc * len + c)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tok(id: u64) -> TokenId {
        TokenId::new(id).unwrap()
    }

    #[test]
    fn square_has_origin_hops_and_far_corner() {
        let sq = Ortho::square(tok(1), tok(2), tok(3), tok(4)).unwrap();
        assert_eq!(sq.shape(), &[2, 2]);
        assert_eq!(sq.dims(), vec![1, 1]);
        assert_eq!(sq.origin(), tok(1));
        let mut hops = sq.hops();
        hops.sort();
        assert_eq!(hops, vec![tok(2), tok(3)]);
        assert_eq!(sq.contents(), vec![tok(4)]);
    }

    #[test]
    fn square_is_canonical_regardless_of_hop_order() {
        let a = Ortho::square(tok(1), tok(2), tok(3), tok(4)).unwrap();
        let b = Ortho::square(tok(1), tok(3), tok(2), tok(4)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn repeated_hop_is_rejected() {
        assert!(Ortho::square(tok(1), tok(2), tok(2), tok(4)).is_none());
    }

    #[test]
    fn longer_axis_comes_first() {
        // 2 rows × 3 columns given with the short axis first.
        // a b e
        // c d f
        let (a, b, c, d, e, f) = (tok(1), tok(2), tok(3), tok(4), tok(5), tok(6));
        let grid = Ortho::from_parts(vec![2, 3], vec![a, b, e, c, d, f]).unwrap();
        assert_eq!(grid.shape(), &[3, 2]);
        assert_eq!(grid.dims(), vec![2, 1]);
        assert_eq!(grid.hop(0), b);
        assert_eq!(grid.hop(1), c);
        assert_eq!(grid.at(&[2, 1]), f);
    }

    #[test]
    fn lines_follow_the_axis() {
        let (a, b, c, d, e, f) = (tok(1), tok(2), tok(3), tok(4), tok(5), tok(6));
        let grid = Ortho::from_parts(vec![2, 3], vec![a, b, e, c, d, f]).unwrap();
        let mut long = grid.lines(0);
        long.sort();
        assert_eq!(long, vec![vec![a, b, e], vec![c, d, f]]);
        assert!(grid.has_line(1, &[b, d]));
        assert!(!grid.has_line(1, &[a, d]));
    }

    #[test]
    fn edges_of_a_square() {
        let sq = Ortho::square(tok(1), tok(2), tok(3), tok(4)).unwrap();
        let mut edges = sq.edges();
        edges.sort();
        assert_eq!(
            edges,
            vec![(tok(1), tok(2)), (tok(1), tok(3)), (tok(2), tok(4)), (tok(3), tok(4))]
        );
    }

    #[test]
    fn same_distance_repeat_is_rejected() {
        // The anti-diagonal of a 3×3 grid repeats `x`.
        let x = tok(9);
        let cells = vec![
            tok(1), tok(2), x, //
            tok(4), x, tok(6), //
            x, tok(7), tok(8),
        ];
        assert!(Ortho::from_parts(vec![3, 3], cells).is_none());
    }

    #[test]
    fn permuted_round_trips_coordinates() {
        let cells: Vec<TokenId> = (1..=12).map(tok).collect();
        let raw = Ortho {
            shape: vec![2, 3, 2],
            cells,
        };
        let p = raw.permuted(&[1, 2, 0]);
        assert_eq!(p.shape(), &[3, 2, 2]);
        for i in 0..raw.cells.len() {
            let c = raw.coords(i);
            assert_eq!(p.at(&[c[1], c[2], c[0]]), raw.cells[i]);
        }
    }

    #[test]
    fn coordinate_helpers_agree() {
        let shape = [3, 2, 4];
        for i in 0..24 {
            assert_eq!(index_of(&coords_of(i, &shape), &shape), i);
        }
        assert_eq!(strides_of(&shape), vec![8, 4, 1]);
    }
}
