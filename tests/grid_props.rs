//! Property tests for the counts → grid mapping.
//!
//! 1. **Exact fill**: every successful mapping assigns exactly `N²` cells.
//! 2. **Floor split**: `normal_cells = floor(normal / total · N²)`, the rest abnormal.
//! 3. **Permutation**: repeated calls place the same multiset, in varying order.
//! 4. **Zero trials**: always `DivideByZero`.

use biasgrid::{cell_split, map_counts_to_grid, Error, Outcome, OutcomeCounts};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

proptest! {
    #[test]
    fn grid_is_always_full(
        normal in 0u64..100_000,
        abnormal in 0u64..100_000,
        size in 1usize..40,
        seed in any::<u64>(),
    ) {
        prop_assume!(normal + abnormal > 0);
        let counts = OutcomeCounts::new(normal, abnormal);
        let g = map_counts_to_grid(&counts, size, &mut StdRng::seed_from_u64(seed)).unwrap();
        prop_assert_eq!(g.size(), size);
        prop_assert_eq!(g.cells().len(), size * size);
        prop_assert_eq!(g.count(Outcome::Normal) + g.count(Outcome::Abnormal), size * size);
    }

    #[test]
    fn normal_cells_are_the_floor(
        normal in 0u64..10_000,
        abnormal in 0u64..10_000,
        size in 1usize..40,
    ) {
        prop_assume!(normal + abnormal > 0);
        let counts = OutcomeCounts::new(normal, abnormal);
        let (n, a) = cell_split(&counts, size).unwrap();
        let cells = size * size;
        prop_assert_eq!(n + a, cells);
        // n / cells <= frac < (n + 1) / cells
        let total = normal + abnormal;
        prop_assert!(n as u64 * total <= normal * cells as u64);
        prop_assert!((n as u64 + 1) * total > normal * cells as u64);
    }

    #[test]
    fn zero_trials_always_fail(size in 0usize..40, seed in any::<u64>()) {
        let r = map_counts_to_grid(&OutcomeCounts::new(0, 0), size, &mut StdRng::seed_from_u64(seed));
        prop_assert!(r.is_err());
        if size > 0 {
            prop_assert!(matches!(r, Err(Error::DivideByZero(_))));
        }
    }
}

#[test]
fn multiset_is_invariant_but_layout_varies() {
    let counts = OutcomeCounts::new(200, 200);
    let mut rng = StdRng::seed_from_u64(2024);
    let first = map_counts_to_grid(&counts, 20, &mut rng).unwrap();
    let mut saw_different_layout = false;
    for _ in 0..10 {
        let g = map_counts_to_grid(&counts, 20, &mut rng).unwrap();
        assert_eq!(g.count(Outcome::Normal), 200);
        assert_eq!(g.count(Outcome::Abnormal), 200);
        saw_different_layout |= g.cells() != first.cells();
    }
    assert!(saw_different_layout, "shuffle never changed the layout");
}

#[test]
fn shuffle_is_roughly_uniform_per_cell() {
    // With 1 normal cell out of 16, each position should hold it ~1/16 of the time.
    let counts = OutcomeCounts::new(1, 15);
    let mut rng = StdRng::seed_from_u64(7);
    let mut hits = [0u32; 16];
    let trials = 16_000;
    for _ in 0..trials {
        let g = map_counts_to_grid(&counts, 4, &mut rng).unwrap();
        let pos = g.cells().iter().position(|c| *c == Outcome::Normal).unwrap();
        hits[pos] += 1;
    }
    for (i, &h) in hits.iter().enumerate() {
        assert!((800..1200).contains(&h), "cell {i} hit {h} times");
    }
}
