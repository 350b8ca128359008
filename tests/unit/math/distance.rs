//! Tests for the exact Euclidean distance transform

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use ndarray::{ArrayD, IxDyn};
    use snowpore::math::distance::{
        DistanceMap, DomainBoundary, diagonal_length, euclidean_distance_transform, lower_envelope,
    };
    use snowpore::spatial::field::VoxelField;
    use snowpore::spatial::grid::Grid;

    fn field_from(shape: &[usize], pattern: impl Fn(&[usize]) -> bool) -> VoxelField {
        VoxelField::from_shape_fn(shape, 1.0, |p| pattern(p)).unwrap_or_else(|e| panic!("{e}"))
    }

    /// Distance from each voxel to the nearest background voxel, by exhaustive search
    fn brute_force(field: &VoxelField, boundary: DomainBoundary) -> Vec<f64> {
        let grid = field.grid();
        let shape = field.shape();
        let pad = match boundary {
            DomainBoundary::Solid => 1_isize,
            DomainBoundary::Open => 0,
        };
        let padded: Vec<usize> = shape.iter().map(|&n| n + 2 * pad as usize).collect();
        let padded_grid = Grid::new(&padded);

        let background: Vec<Vec<isize>> = (0..padded_grid.len())
            .map(|i| {
                padded_grid
                    .coords(i)
                    .iter()
                    .map(|&c| c as isize - pad)
                    .collect::<Vec<isize>>()
            })
            .filter(|c| {
                let inside = c
                    .iter()
                    .zip(shape)
                    .all(|(&x, &n)| x >= 0 && (x as usize) < n);
                if inside {
                    let coords: Vec<usize> = c.iter().map(|&x| x as usize).collect();
                    field.get(&coords) == Some(false)
                } else {
                    true
                }
            })
            .collect();

        (0..grid.len())
            .map(|index| {
                let here = grid.coords(index);
                background
                    .iter()
                    .map(|b| {
                        b.iter()
                            .zip(here.iter())
                            .map(|(&x, &y)| ((x - y as isize) * (x - y as isize)) as f64)
                            .sum::<f64>()
                            .sqrt()
                    })
                    .fold(f64::INFINITY, f64::min)
            })
            .collect()
    }

    // Tests the planar transform against a brute force search
    // Verified by skipping the second axis pass
    #[test]
    fn test_matches_brute_force_in_2d() {
        let field = field_from(&[9, 7], |p| (p[0] * 7 + p[1] * 3) % 11 != 0);
        for boundary in [DomainBoundary::Solid, DomainBoundary::Open] {
            let map = euclidean_distance_transform(&field, boundary);
            let expected = brute_force(&field, boundary);
            for (got, want) in map.as_slice().iter().zip(&expected) {
                assert_relative_eq!(*got, *want, epsilon = 1e-9);
            }
        }
    }

    // Tests the volumetric transform against a brute force search
    // Verified by skipping the third axis pass
    #[test]
    fn test_matches_brute_force_in_3d() {
        let field = field_from(&[6, 5, 7], |p| (p[0] + 2 * p[1] + 3 * p[2]) % 7 != 3);
        for boundary in [DomainBoundary::Solid, DomainBoundary::Open] {
            let map = euclidean_distance_transform(&field, boundary);
            let expected = brute_force(&field, boundary);
            for (got, want) in map.as_slice().iter().zip(&expected) {
                assert_relative_eq!(*got, *want, epsilon = 1e-9);
            }
        }
    }

    // Tests that background voxels have zero distance
    // Verified by seeding background with infinity
    #[test]
    fn test_background_is_zero() {
        let field = field_from(&[5, 5], |p| p[0] > 1);
        let map = euclidean_distance_transform(&field, DomainBoundary::Solid);
        let grid = field.grid();
        for (index, &d) in map.as_slice().iter().enumerate() {
            if grid.axis_position(index, 0) <= 1 {
                assert_eq!(d, 0.0);
            } else {
                assert!(d >= 1.0);
            }
        }
    }

    // Tests that a solid domain edge limits border voxels to one voxel of clearance
    // Verified by treating the solid edge as open
    #[test]
    fn test_solid_boundary_counts_outside_as_background() {
        let field = field_from(&[7, 7], |_| true);
        let map = euclidean_distance_transform(&field, DomainBoundary::Solid);
        assert_eq!(map.at(0), 1.0);
        assert_eq!(map.max(), 4.0);
    }

    // Tests that an open field with no background is capped at its diagonal
    // Verified by leaving infinite distances in the map
    #[test]
    fn test_open_all_foreground_is_capped_at_diagonal() {
        let field = field_from(&[3, 4], |_| true);
        let map = euclidean_distance_transform(&field, DomainBoundary::Open);
        assert!(map.as_slice().iter().all(|&d| d == 5.0));
        assert_eq!(diagonal_length(&[3, 4]), 5.0);
    }

    // Tests a field with no pore space
    // Verified by skipping the transform on empty masks
    #[test]
    fn test_all_background_is_zero() {
        let field = field_from(&[4, 4, 4], |_| false);
        let map = euclidean_distance_transform(&field, DomainBoundary::Solid);
        assert_eq!(map.max(), 0.0);
    }

    // Tests the one-dimensional lower envelope with distant sites
    // Verified by using the wrong sign in the parabola intersection
    #[test]
    fn test_lower_envelope_of_sparse_sites() {
        let inf = f64::INFINITY;
        let f = [inf, 0.0, inf, inf, inf, 0.0, inf];
        let mut out = [0.0; 7];
        lower_envelope(&f, &mut out);
        assert_eq!(out, [1.0, 0.0, 1.0, 4.0, 1.0, 0.0, 1.0]);

        let mut none = [0.0; 3];
        lower_envelope(&[inf, inf, inf], &mut none);
        assert!(none.iter().all(|d| d.is_infinite()));
    }

    // Tests value lookup and the shape of the map
    // Verified by reading values in column-major order
    #[test]
    fn test_lookup_and_shape() {
        let map = DistanceMap::from_array(ArrayD::from_elem(IxDyn(&[2, 2]), 2.0));
        assert_eq!(map.max(), 2.0);
        assert_eq!(map.at(3), 2.0);
        assert_eq!(map.at(4), 0.0);
        assert_eq!(map.grid().shape(), &[2, 2]);
    }
}
