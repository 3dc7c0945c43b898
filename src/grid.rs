//! Sample-to-grid mapping.
//!
//! Turns [`OutcomeCounts`] into an `N × N` [`ColorGrid`]:
//!
//! 1. `normal_cells = floor(normal / total · N²)`, computed exactly in integers.
//! 2. `abnormal_cells = N² − normal_cells` (abnormal absorbs the remainder).
//! 3. The multiset is shuffled uniformly and laid out row-major.
//!
//! Rounding to nearest would break the `normal + abnormal == N²` invariant, so
//! only the floor is ever taken.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::{Error, Result};
use crate::sampler::{Outcome, OutcomeCounts};

/// Row-major `size × size` grid of outcome-colored cells.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ColorGrid {
    size: usize,
    cells: Vec<Outcome>,
}

impl ColorGrid {
    /// Side length `N`.
    pub fn size(&self) -> usize {
        self.size
    }

    /// All cells, row-major from the top-left.
    pub fn cells(&self) -> &[Outcome] {
        &self.cells
    }

    pub fn get(&self, row: usize, col: usize) -> Option<Outcome> {
        if row >= self.size || col >= self.size {
            return None;
        }
        self.cells.get(row * self.size + col).copied()
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Outcome]> {
        self.cells.chunks(self.size.max(1))
    }

    pub fn count(&self, outcome: Outcome) -> usize {
        self.cells.iter().filter(|c| **c == outcome).count()
    }
}

/// How many cells each outcome gets on an `size × size` grid.
///
/// Returns `(normal_cells, abnormal_cells)`; they always sum to `size²`.
pub fn cell_split(counts: &OutcomeCounts, size: usize) -> Result<(usize, usize)> {
    if size == 0 {
        return Err(Error::invalid("grid size must be at least 1"));
    }
    let cells = size
        .checked_mul(size)
        .ok_or_else(|| Error::invalid(format!("grid size {size} overflows")))?;
    let total = u128::from(counts.normal()) + u128::from(counts.abnormal());
    if total == 0 {
        return Err(Error::DivideByZero("outcome counts have zero trials"));
    }
    // floor(normal / total * cells) without going through f64.
    let normal_cells = (u128::from(counts.normal()) * cells as u128 / total) as usize;
    Ok((normal_cells, cells - normal_cells))
}

/// Map counts onto a shuffled `size × size` grid.
///
/// Fails with [`Error::DivideByZero`] when `counts` has no trials and with
/// [`Error::InvalidInput`] when `size` is zero.
pub fn map_counts_to_grid<R: Rng + ?Sized>(
    counts: &OutcomeCounts,
    size: usize,
    rng: &mut R,
) -> Result<ColorGrid> {
    let (normal_cells, abnormal_cells) = cell_split(counts, size)?;
    let mut cells = Vec::with_capacity(normal_cells + abnormal_cells);
    cells.extend(std::iter::repeat(Outcome::Normal).take(normal_cells));
    cells.extend(std::iter::repeat(Outcome::Abnormal).take(abnormal_cells));
    cells.shuffle(rng);
    Ok(ColorGrid { size, cells })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn even_split_on_twenty() {
        let mut rng = StdRng::seed_from_u64(0);
        let g = map_counts_to_grid(&OutcomeCounts::new(200, 200), 20, &mut rng).unwrap();
        assert_eq!(g.cells().len(), 400);
        assert_eq!(g.count(Outcome::Normal), 200);
        assert_eq!(g.count(Outcome::Abnormal), 200);
    }

    #[test]
    fn all_normal_fills_grid() {
        let mut rng = StdRng::seed_from_u64(0);
        let g = map_counts_to_grid(&OutcomeCounts::new(1, 0), 20, &mut rng).unwrap();
        assert_eq!(g.count(Outcome::Normal), 400);
        assert_eq!(g.count(Outcome::Abnormal), 0);
    }

    #[test]
    fn remainder_goes_to_abnormal() {
        // 1/3 of 4 cells = 1.33.. → 1 normal, 3 abnormal.
        assert_eq!(cell_split(&OutcomeCounts::new(1, 2), 2).unwrap(), (1, 3));
        // 2/3 of 4 cells = 2.66.. → floor 2 (nearest would give 3).
        assert_eq!(cell_split(&OutcomeCounts::new(2, 1), 2).unwrap(), (2, 2));
    }

    #[test]
    fn zero_trials_is_divide_by_zero() {
        let mut rng = StdRng::seed_from_u64(0);
        let e = map_counts_to_grid(&OutcomeCounts::new(0, 0), 20, &mut rng).unwrap_err();
        assert!(matches!(e, Error::DivideByZero(_)));
    }

    #[test]
    fn zero_size_is_invalid() {
        let mut rng = StdRng::seed_from_u64(0);
        let e = map_counts_to_grid(&OutcomeCounts::new(1, 1), 0, &mut rng).unwrap_err();
        assert!(matches!(e, Error::InvalidInput(_)));
    }

    #[test]
    fn huge_counts_do_not_overflow() {
        let (n, a) = cell_split(&OutcomeCounts::new(u64::MAX, u64::MAX), 25).unwrap();
        assert_eq!(n + a, 625);
        assert_eq!(n, 312);
    }

    #[test]
    fn rows_are_row_major() {
        let mut rng = StdRng::seed_from_u64(9);
        let g = map_counts_to_grid(&OutcomeCounts::new(3, 1), 4, &mut rng).unwrap();
        let rows: Vec<&[Outcome]> = g.rows().collect();
        assert_eq!(rows.len(), 4);
        for (r, row) in rows.iter().enumerate() {
            assert_eq!(row.len(), 4);
            for (c, cell) in row.iter().enumerate() {
                assert_eq!(Some(*cell), g.get(r, c));
            }
        }
        assert_eq!(g.get(4, 0), None);
    }

    #[test]
    fn same_seed_same_layout() {
        let counts = OutcomeCounts::new(120, 280);
        let a = map_counts_to_grid(&counts, 20, &mut StdRng::seed_from_u64(5)).unwrap();
        let b = map_counts_to_grid(&counts, 20, &mut StdRng::seed_from_u64(5)).unwrap();
        assert_eq!(a, b);
    }
}
