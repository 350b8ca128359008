//! Tests for per-region statistics

#[cfg(test)]
mod tests {
    use ndarray::{ArrayD, IxDyn};
    use snowpore::algorithm::watershed::{LabelImage, UNASSIGNED};
    use snowpore::analysis::regions::{accumulate_regions, is_region};

    /// 3 x 3 image; each run of three values is one x column, y ascending
    fn three_by_three() -> LabelImage {
        LabelImage::from_array(
            ArrayD::from_shape_vec(IxDyn(&[3, 3]), vec![1, 1, 2, 1, 1, 2, 0, 0, 2])
                .unwrap_or_else(|e| panic!("{e}")),
        )
    }

    // Tests the sorted list of labels present in an image
    // Verified by including label 0 in the list
    #[test]
    fn test_region_labels() {
        assert!(!is_region(0));
        assert!(!is_region(UNASSIGNED));
        assert!(is_region(5));
    }

    // Tests per-region voxel counts, centroids and bounding boxes
    // Verified by dividing centroid sums by the total voxel count
    #[test]
    fn test_counts_centroids_and_boxes() {
        let regions = accumulate_regions(&three_by_three());
        assert_eq!(regions.keys().copied().collect::<Vec<_>>(), vec![1, 2]);

        let first = regions.get(&1).unwrap_or_else(|| panic!("region 1 missing"));
        assert_eq!(first.voxel_count, 4);
        assert_eq!(first.centroid().as_slice(), &[0.5, 0.5]);
        assert_eq!(first.bounding_box.min.as_slice(), &[0, 0]);
        assert_eq!(first.bounding_box.max.as_slice(), &[1, 1]);

        let second = regions.get(&2).unwrap_or_else(|| panic!("region 2 missing"));
        assert_eq!(second.voxel_count, 3);
        assert_eq!(second.coordinate_sum.as_slice(), &[3, 6]);
        assert_eq!(second.bounding_box.extent().as_slice(), &[3, 1]);
    }

    // Tests that faces on the domain edge do not count as surface
    // Verified by counting out-of-grid neighbors as surface faces
    #[test]
    fn test_surface_faces_count_label_changes_only() {
        let regions = accumulate_regions(&three_by_three());
        assert_eq!(regions.get(&1).map(|r| r.surface_faces), Some(4));
        assert_eq!(regions.get(&2).map(|r| r.surface_faces), Some(3));
    }

    // Tests that chunked reductions agree with a sequential pass
    // Verified by replacing instead of merging chunk statistics
    #[test]
    fn test_statistics_merge_across_parallel_chunks() {
        let labels = LabelImage::from_array(ArrayD::from_shape_fn(IxDyn(&[200, 100]), |p| {
            if p[0] < 100 { 1 } else { 2 }
        }));
        let regions = accumulate_regions(&labels);

        for label in [1, 2] {
            let stats = regions
                .get(&label)
                .unwrap_or_else(|| panic!("region {label} missing"));
            assert_eq!(stats.voxel_count, 10_000);
            assert_eq!(stats.surface_faces, 100);
        }
        let right = regions.get(&2).unwrap_or_else(|| panic!("region 2 missing"));
        assert_eq!(right.bounding_box.min.as_slice(), &[100, 0]);
        assert_eq!(right.bounding_box.max.as_slice(), &[199, 99]);
        assert_eq!(right.centroid().as_slice(), &[149.5, 49.5]);
    }

    // Tests that an all-background image yields no regions
    // Verified by creating an entry for label 0
    #[test]
    fn test_background_only_has_no_regions() {
        let labels = LabelImage::from_array(ArrayD::zeros(IxDyn(&[4, 4, 4])));
        assert!(accumulate_regions(&labels).is_empty());
    }
}
