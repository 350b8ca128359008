//! Tests for proximity suppression of nearby markers

#[cfg(test)]
mod tests {
    use snowpore::algorithm::proximity::{PeakCandidate, ProximityRule, trim_nearby_peaks};
    use snowpore::spatial::grid::Grid;

    const DEFAULT_RULE: ProximityRule = ProximityRule {
        factor: 1.0,
        min_distance: 0.0,
    };

    fn at(grid: &Grid, coords: [usize; 2], height: f64) -> PeakCandidate {
        PeakCandidate {
            index: grid
                .index(&coords)
                .unwrap_or_else(|| panic!("{coords:?} outside grid")),
            height,
        }
    }

    // Tests that the trim radius is the larger of the two bounds
    // Verified by taking the minimum of the bounds
    #[test]
    fn test_radius_takes_the_larger_bound() {
        let rule = ProximityRule {
            factor: 0.5,
            min_distance: 3.0,
        };
        assert_eq!(rule.radius(4.0), 3.0);
        assert_eq!(rule.radius(10.0), 5.0);
    }

    // Tests that the lower of two close peaks is removed
    // Verified by keeping the first peak in index order
    #[test]
    fn test_lower_peak_inside_radius_is_dropped() {
        let grid = Grid::new(&[20, 20]);
        let big = at(&grid, [5, 5], 4.0);
        let small = at(&grid, [5, 8], 2.0);
        let far = at(&grid, [15, 15], 3.0);

        let kept = trim_nearby_peaks(&[small, far, big], &grid, DEFAULT_RULE);
        assert_eq!(kept, vec![big.index, far.index]);
    }

    // Tests that equal heights resolve in favor of the lower index
    // Verified by reversing the index tie break
    #[test]
    fn test_equal_heights_favor_the_lower_index() {
        let grid = Grid::new(&[10, 10]);
        let first = at(&grid, [0, 0], 3.0);
        let second = at(&grid, [0, 2], 3.0);

        assert_eq!(trim_nearby_peaks(&[second, first], &grid, DEFAULT_RULE), vec![first.index]);
    }

    // Tests that a peak exactly at the radius is kept
    // Verified by using an inclusive distance comparison
    #[test]
    fn test_distance_equal_to_radius_survives() {
        let grid = Grid::new(&[10, 10]);
        let a = at(&grid, [0, 0], 2.0);
        let b = at(&grid, [0, 2], 1.0);

        assert_eq!(trim_nearby_peaks(&[a, b], &grid, DEFAULT_RULE), vec![a.index, b.index]);
    }

    // Tests the minimum distance with a zero radius factor
    // Verified by scaling the minimum distance by the factor
    #[test]
    fn test_minimum_distance_applies_without_factor() {
        let grid = Grid::new(&[10, 10]);
        let a = at(&grid, [2, 2], 1.0);
        let b = at(&grid, [2, 6], 0.5);
        let rule = ProximityRule {
            factor: 0.0,
            min_distance: 5.0,
        };

        assert_eq!(trim_nearby_peaks(&[a, b], &grid, rule), vec![a.index]);
        assert_eq!(trim_nearby_peaks(&[a, b], &grid, DEFAULT_RULE), vec![a.index, b.index]);
    }

    // Tests suppression between candidates in diagonally adjacent hash cells
    // Verified by scanning only the candidate's own cell
    #[test]
    fn test_suppression_reaches_across_cells() {
        let grid = Grid::new(&[40, 40]);
        let big = at(&grid, [19, 19], 5.0);
        let small = at(&grid, [21, 21], 1.0);

        assert_eq!(trim_nearby_peaks(&[small, big], &grid, DEFAULT_RULE), vec![big.index]);
    }

    // Tests that an empty candidate list stays empty
    // Verified by seeding the survivors with a default entry
    #[test]
    fn test_no_candidates() {
        let grid = Grid::new(&[4, 4, 4]);
        assert!(trim_nearby_peaks(&[], &grid, DEFAULT_RULE).is_empty());
    }
}
