//! Flattened table layout and the reindexing kernel.
//!
//! A table over a universe of `size` elements with `arity` coordinates stores
//! tuple `(x_0, ..., x_{a-1})` at flat index `Σ x_i · size^i`, so coordinate 0
//! varies fastest. Operation tables append one more, innermost, output
//! coordinate; the kernel treats those `size` cells as an opaque block.

use crate::error::{check_shape, Error, Result};
use crate::sat::Lit;

/// Largest number of literals a single allocation can hold
const MAX_CELLS: usize = isize::MAX as usize / std::mem::size_of::<Lit>();

/// `size^exp`, or a shape error when the table would not fit in memory
pub(crate) fn power(size: usize, exp: usize) -> Result<usize> {
    u32::try_from(exp)
        .ok()
        .and_then(|exp| size.checked_pow(exp))
        .filter(|&cells| cells <= MAX_CELLS)
        .ok_or_else(|| Error::Shape(format!("table of {size}^{exp} cells is too large")))
}

/// `count` blocks of `block` cells, under the same bound as [`power`]
pub(crate) fn blocks(count: usize, block: usize) -> Result<usize> {
    count
        .checked_mul(block)
        .filter(|&cells| cells <= MAX_CELLS)
        .ok_or_else(|| Error::Shape(format!("table of {count} blocks of {block} is too large")))
}

/// Flat index of a tuple, coordinate 0 least significant
pub(crate) fn flat_index(size: usize, tuple: &[usize]) -> Result<usize> {
    let mut index = 0;
    for &coord in tuple.iter().rev() {
        check_shape!(coord < size, "coordinate {} out of range for size {}", coord, size);
        index = index * size + coord;
    }
    Ok(index)
}

/// Tuple of a flat index, inverse of [`flat_index`]
pub(crate) fn tuple_of(size: usize, arity: usize, mut index: usize) -> Vec<usize> {
    let mut tuple = Vec::with_capacity(arity);
    for _ in 0..arity {
        tuple.push(index % size);
        index /= size;
    }
    tuple
}

/// Reindex a table of `block`-sized cells.
///
/// Source coordinate `i` becomes target coordinate `new_vars[i]`: the result
/// cell at `(y_0, ..., y_{n-1})` is the source cell at
/// `(y_{new_vars[0]}, ..., y_{new_vars[a-1]})`. Targets hit by several source
/// coordinates take the diagonal; targets hit by none broadcast.
pub(crate) fn reindex(
    lits: &[Lit],
    size: usize,
    block: usize,
    new_vars: &[usize],
    new_arity: usize,
) -> Result<Vec<Lit>> {
    let arity = new_vars.len();
    check_shape!(
        lits.len() == blocks(power(size, arity)?, block)?,
        "table of length {} does not have arity {}",
        lits.len(),
        arity
    );
    if let Some(&target) = new_vars.iter().find(|&&v| v >= new_arity) {
        return Err(Error::Shape(format!(
            "polymer target {target} out of range for arity {new_arity}"
        )));
    }

    // Source offset advanced when a target coordinate ticks
    let mut strides = vec![0usize; new_arity];
    let mut stride = block;
    for &target in new_vars {
        strides[target] += stride;
        stride *= size;
    }

    let count = power(size, new_arity)?;
    let mut result = Vec::with_capacity(blocks(count, block)?);
    let mut coords = vec![0usize; new_arity];
    let mut offset = 0usize;
    for _ in 0..count {
        result.extend_from_slice(&lits[offset..offset + block]);
        // Advance (odometer style, coordinate 0 fastest)
        for (coord, &stride) in coords.iter_mut().zip(&strides) {
            *coord += 1;
            offset += stride;
            if *coord < size {
                break;
            }
            *coord = 0;
            offset -= stride * size;
        }
    }
    Ok(result)
}

/// Targets of a cyclic shift: coordinate `i` moves to `(i + offset) mod arity`
pub(crate) fn rotate_vars(arity: usize, offset: isize) -> Vec<usize> {
    if arity == 0 {
        return Vec::new();
    }
    // arity fits in isize for any table that fits in memory
    let arity = arity as isize;
    (0..arity)
        .map(|i| (i + offset).rem_euclid(arity) as usize)
        .collect()
}

/// Targets that open a fresh coordinate at `pos`
pub(crate) fn insert_vars(arity: usize, pos: usize) -> Vec<usize> {
    (0..arity).map(|i| if i < pos { i } else { i + 1 }).collect()
}

/// Targets that exchange coordinates `i` and `j`
pub(crate) fn swap_vars(arity: usize, i: usize, j: usize) -> Vec<usize> {
    (0..arity)
        .map(|k| {
            if k == i {
                j
            } else if k == j {
                i
            } else {
                k
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<Lit> {
        (2..2 + n as i32)
            .map(|v| Lit::from_dimacs(v).unwrap())
            .collect()
    }

    #[test]
    fn test_power_overflow() {
        assert_eq!(power(3, 4), Ok(81));
        assert_eq!(power(7, 0), Ok(1));
        assert!(power(usize::MAX, 2).is_err());
        assert!(power(2, 63).is_err());
        assert!(power(2, 64).is_err());
        assert_eq!(blocks(4, 3), Ok(12));
        assert!(blocks(usize::MAX / 2, 3).is_err());
    }

    #[test]
    fn test_flat_index_roundtrip() {
        for index in 0..27 {
            let tuple = tuple_of(3, 3, index);
            assert_eq!(flat_index(3, &tuple), Ok(index));
        }
        assert_eq!(tuple_of(3, 2, 5), vec![2, 1]);
        assert!(flat_index(3, &[0, 3]).is_err());
    }

    #[test]
    fn test_reindex_transpose() {
        let src = ids(4);
        let out = reindex(&src, 2, 1, &[1, 0], 2).unwrap();
        // (x0, x1) -> src(x1, x0)
        assert_eq!(out, vec![src[0], src[2], src[1], src[3]]);
    }

    #[test]
    fn test_reindex_diagonal_and_broadcast() {
        let src = ids(9);
        let diag = reindex(&src, 3, 1, &[0, 0], 1).unwrap();
        assert_eq!(diag, vec![src[0], src[4], src[8]]);

        let unary = &src[..3];
        let wide = reindex(unary, 3, 1, &[1], 2).unwrap();
        assert_eq!(wide.len(), 9);
        for (index, lit) in wide.iter().enumerate() {
            assert_eq!(*lit, unary[index / 3]);
        }
    }

    #[test]
    fn test_reindex_blocks_stay_intact() {
        // Binary "operation" table over size 2: four blocks of two cells
        let src = ids(8);
        let out = reindex(&src, 2, 2, &[1, 0], 2).unwrap();
        assert_eq!(&out[0..2], &src[0..2]);
        assert_eq!(&out[2..4], &src[4..6]);
        assert_eq!(&out[4..6], &src[2..4]);
        assert_eq!(&out[6..8], &src[6..8]);
    }

    #[test]
    fn test_reindex_rejects_bad_shapes() {
        let src = ids(4);
        assert!(reindex(&src, 2, 1, &[0], 1).is_err());
        assert!(reindex(&src, 2, 1, &[0, 2], 2).is_err());
        assert!(reindex(&src[..2], 2, 1, &[0], 63).is_err());
        assert!(reindex(&src[..2], 2, 1, &[0], 64).is_err());
    }

    #[test]
    fn test_helper_targets() {
        assert_eq!(rotate_vars(3, -1), vec![2, 0, 1]);
        assert_eq!(rotate_vars(3, 4), vec![1, 2, 0]);
        assert_eq!(insert_vars(3, 1), vec![0, 2, 3]);
        assert_eq!(swap_vars(4, 1, 3), vec![0, 3, 2, 1]);
        assert!(rotate_vars(0, 5).is_empty());
    }
}
