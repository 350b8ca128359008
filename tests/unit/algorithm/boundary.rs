//! Tests for boundary face tagging and virtual pores

#[cfg(test)]
mod tests {
    use ndarray::{ArrayD, IxDyn};
    use snowpore::algorithm::boundary::{BoundaryOptions, tag_boundaries};
    use snowpore::algorithm::markers::MarkerSet;
    use snowpore::algorithm::watershed::LabelImage;
    use snowpore::analysis::builder::RegionGraphBuilder;
    use snowpore::analysis::graph::{ConduitLength, PoreKind, PoreNetworkGraph, ThroatKind};
    use snowpore::math::distance::DistanceMap;
    use snowpore::spatial::border::Face;

    /// Two regions split at x = 2 in a 4 x 3 field
    fn split_field() -> (PoreNetworkGraph, LabelImage, DistanceMap) {
        let labels = LabelImage::from_array(ArrayD::from_shape_fn(IxDyn(&[4, 3]), |p| {
            if p[0] < 2 { 1 } else { 2 }
        }));
        let distance = DistanceMap::from_array(ArrayD::from_elem(IxDyn(&[4, 3]), 1.0));
        let grid = labels.grid().clone();
        let seeds: Vec<usize> = [[0, 1], [3, 1]]
            .iter()
            .filter_map(|c| grid.index(c))
            .collect();
        let markers = MarkerSet::from_indices(&seeds, &grid, &[1.0; 12], &distance);
        let graph = RegionGraphBuilder::new(1.0, ConduitLength::default()).build(
            &labels,
            &markers,
            &distance,
            &[],
        );
        (graph, labels, distance)
    }

    // Tests that pores touching a face are flagged with that face
    // Verified by flagging pores against the opposite layer of each face
    #[test]
    fn test_touching_pores_are_flagged_per_face() {
        let (mut graph, labels, distance) = split_field();
        let options = BoundaryOptions {
            faces: vec![Face::Right, Face::Left, Face::Left, Face::Front],
            add_virtual_pores: false,
        };
        let report = tag_boundaries(&mut graph, &labels, &distance, &options);

        assert_eq!(report.touching.get(&Face::Left), Some(&vec![1]));
        assert_eq!(report.touching.get(&Face::Right), Some(&vec![2]));
        assert_eq!(report.touching.get(&Face::Front), Some(&vec![1, 2]));
        assert!(report.virtual_pores.is_empty());

        let left = graph.nodes.get(&1).unwrap_or_else(|| panic!("pore 1 missing"));
        assert!(left.is_boundary);
        assert_eq!(left.boundary_faces, vec![Face::Left, Face::Front]);
        assert_eq!(graph.metadata.boundary_faces, vec![Face::Left, Face::Right, Face::Front]);
        assert_eq!(graph.edge_count(), 1);
    }

    // Tests that faces outside the field's dimensionality leave pores untouched
    // Verified by indexing the third axis on a planar label image
    #[test]
    fn test_faces_beyond_the_field_are_ignored() {
        let (mut graph, labels, distance) = split_field();
        let options = BoundaryOptions {
            faces: vec![Face::Top],
            add_virtual_pores: true,
        };
        let report = tag_boundaries(&mut graph, &labels, &distance, &options);
        assert!(report.touching.is_empty());
        assert!(graph.nodes.values().all(|node| !node.is_boundary));
        assert_eq!(graph.node_count(), 2);
    }

    // Tests that a virtual pore connects to each pore on its face
    // Verified by linking only the first touching pore
    #[test]
    fn test_virtual_pore_links_every_touching_pore() {
        let (mut graph, labels, distance) = split_field();
        let options = BoundaryOptions {
            faces: vec![Face::Front],
            add_virtual_pores: true,
        };
        let report = tag_boundaries(&mut graph, &labels, &distance, &options);

        assert_eq!(report.virtual_pores, vec![3]);
        let pore = graph.nodes.get(&3).unwrap_or_else(|| panic!("virtual pore missing"));
        assert_eq!(pore.kind, PoreKind::Virtual(Face::Front));
        assert_eq!(pore.volume, 0.0);
        assert_eq!(pore.surface_area, 4.0);
        assert_eq!(graph.neighbors(3), vec![1, 2]);

        let edge = graph
            .edges
            .get(&(1, 3))
            .unwrap_or_else(|| panic!("virtual throat missing"));
        assert_eq!(edge.kind, ThroatKind::Virtual(Face::Front));
        assert_eq!(edge.face_count, 2);
        assert_eq!(edge.cross_sectional_area, 2.0);
        // Pore 1 has its centroid at y = 1, the front face at y = 0
        assert_eq!(edge.conduit_length, 1.0);
        assert!(graph.validate().is_empty());
    }

    // Tests that tagging only adds flags, virtual nodes and virtual edges
    // Verified by recomputing pore surface areas inside tag_boundaries
    #[test]
    fn test_tagging_leaves_existing_geometry_untouched() {
        let (mut graph, labels, distance) = split_field();
        let before = graph.clone();
        let options = BoundaryOptions {
            faces: vec![Face::Left, Face::Right, Face::Front, Face::Back],
            add_virtual_pores: true,
        };
        tag_boundaries(&mut graph, &labels, &distance, &options);

        for (label, original) in &before.nodes {
            let tagged = graph
                .nodes
                .get(label)
                .unwrap_or_else(|| panic!("pore {label} dropped"));
            assert!(tagged.is_boundary);
            let mut restored = tagged.clone();
            restored.is_boundary = original.is_boundary;
            restored.boundary_faces.clone_from(&original.boundary_faces);
            assert_eq!(&restored, original);
        }
        for (key, original) in &before.edges {
            assert_eq!(graph.edges.get(key), Some(original));
        }

        let added: Vec<u32> = graph
            .nodes
            .keys()
            .filter(|label| !before.nodes.contains_key(*label))
            .copied()
            .collect();
        assert_eq!(added, vec![3, 4, 5, 6]);
        for label in &added {
            assert!(
                graph
                    .nodes
                    .get(label)
                    .is_some_and(|node| matches!(node.kind, PoreKind::Virtual(_)))
            );
        }
        for (key, edge) in &graph.edges {
            if !before.edges.contains_key(key) {
                assert!(matches!(edge.kind, ThroatKind::Virtual(_)));
            }
        }
        assert!(graph.validate().is_empty());
    }

    // Tests that a face with no touching pore adds no virtual pore
    // Verified by adding virtual pores for every requested face
    #[test]
    fn test_no_virtual_pore_without_contact() {
        let labels = LabelImage::from_array(ArrayD::from_shape_fn(IxDyn(&[4, 3]), |p| {
            u32::from(p[0] == 1 && p[1] == 1)
        }));
        let distance = DistanceMap::from_array(ArrayD::from_elem(IxDyn(&[4, 3]), 1.0));
        let grid = labels.grid().clone();
        let seeds: Vec<usize> = grid.index(&[1, 1]).into_iter().collect();
        let markers = MarkerSet::from_indices(&seeds, &grid, &[1.0; 12], &distance);
        let mut graph =
            RegionGraphBuilder::new(1.0, ConduitLength::default()).build(&labels, &markers, &distance, &[]);

        let options = BoundaryOptions {
            faces: vec![Face::Left],
            add_virtual_pores: true,
        };
        let report = tag_boundaries(&mut graph, &labels, &distance, &options);
        assert_eq!(report.touching.get(&Face::Left), Some(&Vec::new()));
        assert!(report.virtual_pores.is_empty());
        assert_eq!(graph.node_count(), 1);
    }
}
