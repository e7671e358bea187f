//! "Over" growth: two orthotopes offset by one step along an axis.
//!
//! `R` must start where `L` takes its first step along axis `X` and agree
//! with `L` on the overlap. The merged orthotope is one node longer along
//! `X`, and each of its full lines along `X` must have been seen as a chain.

use rayon::prelude::*;

use crate::id::TokenId;
use crate::ortho::{Ortho, coords_of};

use super::{Evidence, SearchSpace};

/// Merge `r` onto `l` shifted one step along `axis` of `l`.
pub fn attempt(l: &Ortho, r: &Ortho, axis: usize, evidence: &impl Evidence) -> Option<Ortho> {
    if l.shape() != r.shape() {
        return None;
    }
    let shape = l.shape();
    let strides = l.strides();
    let step = strides[axis];
    if r.origin() != l.cells()[step] {
        return None;
    }
    let pi = shifted_axes(l, r, axis)?;

    let mut merged_shape = shape.to_vec();
    merged_shape[axis] += 1;
    let total: usize = merged_shape.iter().product();
    let mut cells = Vec::with_capacity(total);
    let mut mapped = vec![0; shape.len()];
    for index in 0..total {
        let c = coords_of(index, &merged_shape);
        let left = (c[axis] < shape[axis]).then(|| l.at(&c));
        let right = (c[axis] >= 1).then(|| {
            for (i, &value) in c.iter().enumerate() {
                mapped[pi[i]] = if i == axis { value - 1 } else { value };
            }
            r.at(&mapped)
        });
        let token = match (left, right) {
            (Some(x), Some(y)) if x != y => return None,
            (x, y) => x.or(y)?,
        };
        cells.push(token);
    }

    let grown_hop = l.hop(axis);
    let merged = Ortho::from_parts(merged_shape, cells)?;
    let grown = merged.hops().iter().position(|&h| h == grown_hop)?;
    let supported = merged
        .lines(grown)
        .iter()
        .all(|line| evidence.has_chain(line));
    supported.then_some(merged)
}

/// Axis bijection taking `l` axes to `r` axes, read off the cells of `l`
/// one step beyond `r`'s origin.
fn shifted_axes(l: &Ortho, r: &Ortho, axis: usize) -> Option<Vec<usize>> {
    let shape = l.shape();
    let strides = l.strides();
    let step = strides[axis];
    let r_hops = r.hops();
    let rank = shape.len();
    let mut pi = vec![0; rank];
    let mut used = vec![false; rank];

    for i in 0..rank {
        if i == axis && shape[axis] == 2 {
            continue;
        }
        let probe = l.cells()[step + strides[i]];
        let target = r_hops.iter().position(|&h| h == probe)?;
        if used[target] || r.shape()[target] != shape[i] {
            return None;
        }
        used[target] = true;
        pi[i] = target;
    }
    if shape[axis] == 2 {
        // The shifted axis leaves `l` entirely; it takes the one axis left.
        let target = (0..rank).find(|&t| !used[t])?;
        if r.shape()[target] != shape[axis] {
            return None;
        }
        pi[axis] = target;
    }
    Some(pi)
}

/// A new chain `p` as a line of the merged orthotope: `L` holds `p[..n]`,
/// `R` holds `p[1..]`, both as full lines.
pub fn from_chain(space: &impl SearchSpace, tokens: &[TokenId]) -> Vec<Ortho> {
    if tokens.len() < 3 {
        return vec![];
    }
    let lhs = &tokens[..tokens.len() - 1];
    let rhs = &tokens[1..];

    let lefts: Vec<_> = space
        .orthos_containing(tokens[0])
        .into_iter()
        .flat_map(|l| {
            (0..l.rank())
                .filter(|&x| l.has_line(x, lhs))
                .map(|x| (l.clone(), x))
                .collect::<Vec<_>>()
        })
        .collect();
    if lefts.is_empty() {
        return vec![];
    }
    let rights: Vec<_> = space
        .orthos_containing(tokens[1])
        .into_iter()
        .filter(|r| (0..r.rank()).any(|x| r.has_line(x, rhs)))
        .collect();

    lefts
        .par_iter()
        .flat_map_iter(|(l, x)| {
            rights
                .iter()
                .filter_map(|r| attempt(l, r, *x, space))
                .collect::<Vec<_>>()
        })
        .collect()
}

/// A new orthotope as `L` (partners start at one of its hops) or as `R`
/// (partners start at a predecessor of its origin).
pub fn from_ortho(space: &impl SearchSpace, ortho: &Ortho) -> Vec<Ortho> {
    let mut found = Vec::new();
    for axis in 0..ortho.rank() {
        for r in space.orthos_by_origin(ortho.hop(axis)) {
            found.extend(attempt(ortho, &r, axis, space));
        }
    }
    let origin = ortho.origin();
    for prev in space.predecessors(origin) {
        for l in space.orthos_by_origin(prev) {
            for axis in (0..l.rank()).filter(|&x| l.hop(x) == origin) {
                found.extend(attempt(&l, ortho, axis, space));
            }
        }
    }
    found
}
