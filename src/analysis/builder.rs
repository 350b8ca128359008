//! Assemble the pore network from a label image

use crate::algorithm::markers::MarkerSet;
use crate::algorithm::watershed::LabelImage;
use crate::analysis::graph::{ConduitLength, PoreKind, PoreNetworkGraph, PoreNode, ThroatEdge, ThroatKind};
use crate::analysis::regions::accumulate_regions;
use crate::analysis::throats::accumulate_interfaces;
use crate::math::distance::DistanceMap;
use crate::spatial::grid::Point;
use hashbrown::HashSet;
use std::f64::consts::PI;
use tracing::debug;

/// Radius of the sphere (3D) or disk (2D) with the given volume
pub fn equivalent_radius(volume: f64, ndim: usize) -> f64 {
    if ndim >= 3 {
        (3.0 * volume / (4.0 * PI)).cbrt()
    } else {
        (volume / PI).sqrt()
    }
}

/// Throat perimeter from its cross-sectional area
///
/// In 3D the perimeter of the circle with that area; in 2D the interface is
/// a line segment and the cross-section a slot bounded by two walls of that
/// length.
pub fn throat_perimeter(area: f64, ndim: usize) -> f64 {
    if ndim >= 3 {
        2.0 * (PI * area).sqrt()
    } else {
        2.0 * area
    }
}

/// Diameter of the circle with the given area in 3D; the interface length in 2D
pub fn equivalent_diameter(area: f64, ndim: usize) -> f64 {
    if ndim >= 3 {
        2.0 * (area / PI).sqrt()
    } else {
        area
    }
}

/// Euclidean distance between two points
pub fn point_distance(a: &Point, b: &Point) -> f64 {
    a.iter()
        .zip(b)
        .map(|(&x, &y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

/// Builds nodes and edges from accumulated region and interface statistics
#[derive(Debug, Clone, Copy)]
pub struct RegionGraphBuilder {
    voxel_size: f64,
    conduit_length: ConduitLength,
}

impl RegionGraphBuilder {
    /// Builder for a field with the given voxel size
    pub const fn new(voxel_size: f64, conduit_length: ConduitLength) -> Self {
        Self {
            voxel_size,
            conduit_length,
        }
    }

    /// Build the network: one node per marker, one edge per touching pair
    pub fn build(
        &self,
        labels: &LabelImage,
        markers: &MarkerSet,
        distance: &DistanceMap,
        isolated: &[u32],
    ) -> PoreNetworkGraph {
        let grid = labels.grid();
        let ndim = grid.ndim();
        let vs = self.voxel_size;
        let voxel_volume = vs.powi(ndim as i32);
        let face_area = vs.powi(ndim as i32 - 1);

        let isolated: HashSet<u32> = isolated.iter().copied().collect();
        let regions = accumulate_regions(labels);
        let interfaces = accumulate_interfaces(labels, distance);
        debug!(
            regions = regions.len(),
            interfaces = interfaces.len(),
            "region statistics accumulated"
        );

        let mut graph = PoreNetworkGraph::empty(vs, grid.shape());

        for marker in markers {
            let Some(stats) = regions.get(&marker.label) else {
                continue;
            };
            let volume = stats.voxel_count as f64 * voxel_volume;
            let node = PoreNode {
                label: marker.label,
                centroid: stats.centroid().iter().map(|&c| c * vs).collect(),
                marker: marker.coords.clone(),
                voxel_count: stats.voxel_count,
                volume,
                equivalent_radius: equivalent_radius(volume, ndim),
                inscribed_radius: marker.inscribed_radius * vs,
                surface_area: stats.surface_faces as f64 * face_area,
                bounding_box: stats.bounding_box.clone(),
                is_boundary: false,
                boundary_faces: Vec::new(),
                kind: PoreKind::Region,
                isolated: isolated.contains(&marker.label),
            };
            graph.nodes.insert(marker.label, node);
        }

        for ((a, b), stats) in interfaces {
            let (Some(node_a), Some(node_b)) = (graph.nodes.get(&a), graph.nodes.get(&b)) else {
                continue;
            };
            let area = stats.face_count as f64 * face_area;
            let centroid_distance = point_distance(&node_a.centroid, &node_b.centroid);
            let edge = ThroatEdge {
                pores: (a, b),
                face_count: stats.face_count,
                cross_sectional_area: area,
                perimeter: throat_perimeter(area, ndim),
                centroid: stats.centroid().iter().map(|&c| c * vs).collect(),
                inscribed_radius: stats.min_distance * vs,
                equivalent_diameter: equivalent_diameter(area, ndim),
                centroid_distance,
                conduit_length: self.conduit_length.measure(
                    centroid_distance,
                    node_a.inscribed_radius,
                    node_b.inscribed_radius,
                ),
                kind: ThroatKind::Interface,
            };
            graph.edges.insert((a, b), edge);
        }

        graph
    }
}
