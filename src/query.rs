//! Query helpers: `dims` parsing, shape comparison and the text dump.

use serde::{Deserialize, Serialize};

use crate::error::QueryError;
use crate::id::TokenId;
use crate::ortho::Ortho;

/// How a `dims` query is compared with an orthotope's dims.
///
/// Orthotope dims are always reported non-increasing. `Positional` takes
/// the query literally, so `1,2` never matches; `Sorted` sorts the query
/// first so `1,2` and `2,1` are the same shape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DimsOrder {
    #[default]
    Positional,
    Sorted,
}

/// Parse a comma-separated list of non-negative integers.
pub fn parse_dims(input: &str) -> Result<Vec<usize>, QueryError> {
    if input.trim().is_empty() {
        return Err(QueryError::EmptyDims);
    }
    input
        .split(',')
        .map(|component| {
            component
                .trim()
                .parse::<usize>()
                .map_err(|_| QueryError::InvalidDims {
                    input: input.to_string(),
                    component: component.to_string(),
                })
        })
        .collect()
}

/// The single place where orthotope dims are compared with a query.
pub fn dims_match(ortho_dims: &[usize], query: &[usize], order: DimsOrder) -> bool {
    match order {
        DimsOrder::Positional => ortho_dims == query,
        DimsOrder::Sorted => {
            let mut sorted = query.to_vec();
            sorted.sort_unstable_by(|a, b| b.cmp(a));
            ortho_dims == sorted.as_slice()
        }
    }
}

/// Render one orthotope as text.
///
/// Axes are ordered by (length descending, label) so the output does not
/// depend on token ids. Axis 0 runs along a row, axis 1 down the rows, and
/// every further coordinate combination starts a new block separated by a
/// blank line.
pub fn render(ortho: &Ortho, label: impl Fn(TokenId) -> String) -> String {
    let order = ortho.axis_order_by(&label);
    let view = ortho.permuted(&order);
    let shape = view.shape();
    let outer: usize = shape[2..].iter().product();
    let outer_shape = &shape[2..];

    let mut slices = Vec::with_capacity(outer);
    for o in 0..outer {
        let rest = crate::ortho::coords_of(o, outer_shape);
        let rows: Vec<String> = (0..shape[1])
            .map(|r| {
                (0..shape[0])
                    .map(|c| {
                        let mut coords = vec![c, r];
                        coords.extend_from_slice(&rest);
                        label(view.at(&coords))
                    })
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect();
        slices.push(rows.join("\n"));
    }
    slices.join("\n\n")
}

/// Render many orthotopes, sorted so that the dump is deterministic.
pub fn render_all<'a>(
    orthos: impl IntoIterator<Item = &'a Ortho>,
    label: impl Fn(TokenId) -> String,
) -> String {
    let mut blocks: Vec<String> = orthos.into_iter().map(|o| render(o, &label)).collect();
    blocks.sort();
    blocks.join("\n---\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tok(id: u64) -> TokenId {
        TokenId::new(id).unwrap()
    }

    #[test]
    fn parses_dims() {
        assert_eq!(parse_dims("1,1,1").unwrap(), vec![1, 1, 1]);
        assert_eq!(parse_dims(" 2 , 1 ").unwrap(), vec![2, 1]);
        assert_eq!(parse_dims("0").unwrap(), vec![0]);
    }

    #[test]
    fn rejects_malformed_dims() {
        assert!(matches!(parse_dims(""), Err(QueryError::EmptyDims)));
        assert!(matches!(
            parse_dims("2,,1"),
            Err(QueryError::InvalidDims { .. })
        ));
        assert!(matches!(
            parse_dims("-1"),
            Err(QueryError::InvalidDims { .. })
        ));
        assert!(matches!(
            parse_dims("two"),
            Err(QueryError::InvalidDims { .. })
        ));
    }

    #[test]
    fn positional_is_literal() {
        assert!(dims_match(&[2, 1], &[2, 1], DimsOrder::Positional));
        assert!(!dims_match(&[2, 1], &[1, 2], DimsOrder::Positional));
    }

    #[test]
    fn sorted_ignores_query_order() {
        assert!(dims_match(&[2, 1], &[1, 2], DimsOrder::Sorted));
        assert!(!dims_match(&[2, 1], &[1, 1], DimsOrder::Sorted));
    }

    #[test]
    fn renders_a_wide_grid() {
        let names = ["", "a", "b", "c", "d", "e", "f"];
        let label = |t: TokenId| names[t.get() as usize].to_string();
        let (a, b, c, d, e, f) = (tok(1), tok(2), tok(3), tok(4), tok(5), tok(6));
        let grid = Ortho::from_parts(vec![2, 3], vec![a, b, e, c, d, f]).unwrap();
        assert_eq!(render(&grid, label), "a b e\nc d f");
    }

    #[test]
    fn renders_a_cube_as_two_slices() {
        let names = ["", "a", "b", "c", "d", "e", "f", "g", "h"];
        let label = |t: TokenId| names[t.get() as usize].to_string();
        let cells: Vec<TokenId> = (1..=8).map(tok).collect();
        // Row-major over (a→e, a→c, a→b): e-axis first.
        let cube = Ortho::from_parts(vec![2, 2, 2], cells).unwrap();
        assert_eq!(render(&cube, label), "a b\nc d\n\ne f\ng h");
    }
}
