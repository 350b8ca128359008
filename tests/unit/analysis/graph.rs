//! Tests for the network graph, its invariants and its table form

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use snowpore::analysis::graph::{
        ConduitLength, PoreKind, PoreNetworkGraph, PoreNode, ThroatEdge, ThroatKind,
    };
    use snowpore::spatial::border::Face;
    use snowpore::spatial::grid::{BoundingBox, Point};

    /// Box covering rows 0 to 2 of one column
    fn column(x: usize) -> BoundingBox {
        let mut bbox = BoundingBox::from_point(&[x, 0]);
        bbox.include(&[x, 2]);
        bbox
    }

    fn node(label: u32, volume: f64, kind: PoreKind) -> PoreNode {
        PoreNode {
            label,
            centroid: Point::from_slice(&[f64::from(label), 1.0]),
            marker: [label as usize, 1].into_iter().collect(),
            voxel_count: volume as u64,
            volume,
            equivalent_radius: 1.0,
            inscribed_radius: 0.5,
            surface_area: 4.0,
            bounding_box: column(label as usize),
            is_boundary: false,
            boundary_faces: Vec::new(),
            kind,
            isolated: false,
        }
    }

    fn edge(a: u32, b: u32) -> ThroatEdge {
        ThroatEdge {
            pores: (a, b),
            face_count: 2,
            cross_sectional_area: 2.0,
            perimeter: 4.0,
            centroid: Point::from_slice(&[1.5, 1.0]),
            inscribed_radius: 0.5,
            equivalent_diameter: 2.0,
            centroid_distance: 1.0,
            conduit_length: 1.0,
            kind: ThroatKind::Interface,
        }
    }

    fn chain() -> PoreNetworkGraph {
        let mut graph = PoreNetworkGraph::empty(1.0, &[6, 3]);
        for label in 1..=3 {
            graph.nodes.insert(label, node(label, 3.0, PoreKind::Region));
        }
        graph.edges.insert((1, 2), edge(1, 2));
        graph.edges.insert((2, 3), edge(2, 3));
        graph
    }

    // Tests both conduit length rules and the zero floor
    // Verified by returning the raw difference when it is negative
    #[test]
    fn test_conduit_length_rules() {
        assert_eq!(ConduitLength::CentroidToCentroid.measure(5.0, 1.0, 2.0), 5.0);
        assert_eq!(ConduitLength::SurfaceToSurface.measure(5.0, 1.0, 2.0), 2.0);
        assert_eq!(ConduitLength::SurfaceToSurface.measure(2.0, 1.0, 2.0), 0.0);
        assert_eq!(ConduitLength::default(), ConduitLength::CentroidToCentroid);
    }

    // Tests the metadata of a graph with no pores
    // Verified by defaulting the dimensionality to 3
    #[test]
    fn test_empty_graph_metadata() {
        let graph = PoreNetworkGraph::empty(0.5, &[4, 5, 6]);
        assert_eq!(graph.node_count(), 0);
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.max_label(), 0);
        assert_eq!(graph.metadata.ndim, 3);
        assert_eq!(graph.metadata.shape, vec![4, 5, 6]);
        assert!(graph.validate().is_empty());
    }

    // Tests neighbor and edge lookups on a three-pore chain
    // Verified by storing edges under unordered keys
    #[test]
    fn test_queries_on_a_chain() {
        let mut graph = chain();
        graph
            .nodes
            .insert(4, node(4, 0.0, PoreKind::Virtual(Face::Right)));
        graph.edges.insert((3, 4), edge(3, 4));

        assert_eq!(graph.neighbors(2), vec![1, 3]);
        assert_eq!(graph.neighbors(4), vec![3]);
        assert!(graph.neighbors(9).is_empty());
        assert_eq!(graph.max_label(), 4);
        assert_eq!(graph.total_volume(), 9.0);
        assert_eq!(graph.region_nodes().count(), 3);
    }

    // Tests that validate names each broken edge and node invariant
    // Verified by skipping the dangling edge check
    #[test]
    fn test_validate_reports_broken_invariants() {
        let mut graph = chain();
        assert!(graph.validate().is_empty());

        graph.edges.insert((3, 9), edge(3, 9));
        graph.edges.insert((2, 1), edge(2, 1));
        graph.nodes.insert(5, node(6, 1.0, PoreKind::Region));

        let problems = graph.validate();
        assert_eq!(problems.len(), 3);
        assert!(problems.iter().any(|p| p.contains("missing node 9")));
        assert!(problems.iter().any(|p| p.contains("not ordered")));
        assert!(problems.iter().any(|p| p.contains("keyed 5")));
    }

    // Tests that node geometry must agree with its bounding box
    // Verified by dropping the marker containment check from validate
    #[test]
    fn test_validate_checks_node_boxes() {
        let mut graph = chain();
        if let Some(second) = graph.nodes.get_mut(&2) {
            second.marker = [5, 1].into_iter().collect();
        }
        if let Some(third) = graph.nodes.get_mut(&3) {
            third.voxel_count = 4;
        }

        let problems = graph.validate();
        assert_eq!(problems.len(), 2);
        assert!(problems.iter().any(|p| p.contains("node 2 has its marker outside")));
        assert!(problems.iter().any(|p| p.contains("node 3 holds 4 voxels in a box of 3")));
    }

    // Tests that the network table reads back from JSON unchanged
    // Verified by serializing edges without their kind
    #[test]
    fn test_tables_survive_json() {
        let mut graph = chain();
        graph.metadata.boundary_faces = vec![Face::Left];
        if let Some(first) = graph.nodes.get_mut(&1) {
            first.is_boundary = true;
            first.boundary_faces = vec![Face::Left];
        }

        let tables = graph.to_tables();
        assert_eq!(tables.nodes.len(), 3);
        assert_eq!(tables.edges.first().map(|e| (e.source, e.target)), Some((1, 2)));

        let json = serde_json::to_string(&tables).unwrap_or_else(|e| panic!("{e}"));
        assert!(json.contains("\"id\":1"));
        assert!(json.contains("\"boundary_faces\":[\"left\"]"));
        let parsed = serde_json::from_str(&json).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(PoreNetworkGraph::from_tables(parsed), graph);
    }
}
