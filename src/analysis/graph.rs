//! Pore network graph and its tabular export form

use crate::spatial::border::Face;
use crate::spatial::grid::{BoundingBox, Coord, Point};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Origin of a pore node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoreKind {
    /// A labeled region of the segmentation
    Region,
    /// A virtual pore standing for a domain face
    Virtual(Face),
}

/// Origin of a throat edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThroatKind {
    /// Shared faces between two regions
    Interface,
    /// Connection from a region to a virtual face pore
    Virtual(Face),
}

/// How conduit length is measured along a throat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConduitLength {
    /// Distance between the two pore centroids
    #[default]
    CentroidToCentroid,
    /// Centroid distance minus both inscribed radii, floored at zero
    SurfaceToSurface,
}

impl ConduitLength {
    /// Conduit length for a throat between pores with the given inscribed radii
    pub fn measure(self, centroid_distance: f64, radius_a: f64, radius_b: f64) -> f64 {
        match self {
            Self::CentroidToCentroid => centroid_distance,
            Self::SurfaceToSurface => (centroid_distance - radius_a - radius_b).max(0.0),
        }
    }
}

/// One pore of the network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoreNode {
    /// Region label
    pub label: u32,
    /// Mean voxel position times voxel size
    pub centroid: Point,
    /// Seed voxel of the region
    pub marker: Coord,
    /// Number of voxels in the region
    pub voxel_count: u64,
    /// Region volume (area in 2D)
    pub volume: f64,
    /// Radius of the sphere (circle in 2D) with the region's volume
    pub equivalent_radius: f64,
    /// Distance from the marker to the nearest solid
    pub inscribed_radius: f64,
    /// Area of voxel faces shared with other regions or solid inside the
    /// domain; faces on the domain edge are not counted
    pub surface_area: f64,
    /// Tight voxel box around the region
    pub bounding_box: BoundingBox,
    /// Whether the region touches a tagged domain face
    pub is_boundary: bool,
    /// Tagged faces the region touches
    pub boundary_faces: Vec<Face>,
    /// Region or virtual face pore
    pub kind: PoreKind,
    /// The flood never grew beyond the seed voxel
    pub isolated: bool,
}

/// One throat of the network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThroatEdge {
    /// Labels of the connected pores, ascending
    pub pores: (u32, u32),
    /// Number of shared voxel faces
    pub face_count: u64,
    /// Interface area (length in 2D)
    pub cross_sectional_area: f64,
    /// Perimeter of the interface
    pub perimeter: f64,
    /// Mean interface position
    pub centroid: Point,
    /// Smallest distance to solid along the interface
    pub inscribed_radius: f64,
    /// Diameter of the circle with the interface area (the area itself in 2D)
    pub equivalent_diameter: f64,
    /// Distance between the connected pore centroids
    pub centroid_distance: f64,
    /// Conduit length under the configured rule
    pub conduit_length: f64,
    /// Interface or virtual connection
    pub kind: ThroatKind,
}

/// Descriptive data attached to a network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkMetadata {
    /// Physical edge length of one voxel
    pub voxel_size: f64,
    /// Field extents
    pub shape: Vec<usize>,
    /// Field dimensionality
    pub ndim: usize,
    /// Faces requested for boundary tagging
    pub boundary_faces: Vec<Face>,
}

/// Pores and throats extracted from a field
///
/// Serialize through [`Self::to_tables`]; pair-keyed maps have no JSON form.
#[derive(Debug, Clone, PartialEq)]
pub struct PoreNetworkGraph {
    /// Pores keyed by label
    pub nodes: BTreeMap<u32, PoreNode>,
    /// Throats keyed by ordered label pair
    pub edges: BTreeMap<(u32, u32), ThroatEdge>,
    /// Field description
    pub metadata: NetworkMetadata,
}

impl PoreNetworkGraph {
    /// Empty network for a field
    pub fn empty(voxel_size: f64, shape: &[usize]) -> Self {
        Self {
            nodes: BTreeMap::new(),
            edges: BTreeMap::new(),
            metadata: NetworkMetadata {
                voxel_size,
                shape: shape.to_vec(),
                ndim: shape.len(),
                boundary_faces: Vec::new(),
            },
        }
    }

    /// Number of pores
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of throats
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Pores that are labeled regions
    pub fn region_nodes(&self) -> impl Iterator<Item = &PoreNode> {
        self.nodes
            .values()
            .filter(|node| node.kind == PoreKind::Region)
    }

    /// Labels connected to `label` by a throat, ascending
    pub fn neighbors(&self, label: u32) -> Vec<u32> {
        let mut found: Vec<u32> = self
            .edges
            .keys()
            .filter_map(|&(a, b)| match (a == label, b == label) {
                (true, _) => Some(b),
                (_, true) => Some(a),
                _ => None,
            })
            .collect();
        found.sort_unstable();
        found
    }

    /// Sum of pore volumes
    pub fn total_volume(&self) -> f64 {
        self.nodes.values().map(|node| node.volume).sum()
    }

    /// Largest label in use, 0 when empty
    pub fn max_label(&self) -> u32 {
        self.nodes.keys().next_back().copied().unwrap_or(0)
    }

    /// Check structural invariants, returning a description of each violation
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        for (&label, node) in &self.nodes {
            if node.label != label {
                problems.push(format!("node keyed {label} carries label {}", node.label));
            }
            if !node.bounding_box.contains(&node.marker) {
                problems.push(format!("node {label} has its marker outside its bounding box"));
            }
            if node.voxel_count > node.bounding_box.volume() as u64 {
                problems.push(format!(
                    "node {label} holds {} voxels in a box of {}",
                    node.voxel_count,
                    node.bounding_box.volume()
                ));
            }
        }
        for (&(a, b), edge) in &self.edges {
            if a >= b {
                problems.push(format!("edge ({a}, {b}) is not ordered"));
            }
            if edge.pores != (a, b) {
                problems.push(format!("edge keyed ({a}, {b}) carries {:?}", edge.pores));
            }
            for end in [a, b] {
                if !self.nodes.contains_key(&end) {
                    problems.push(format!("edge ({a}, {b}) references missing node {end}"));
                }
            }
        }
        problems
    }

    /// Generic node and edge tables for export
    pub fn to_tables(&self) -> NetworkTables {
        let nodes = self
            .nodes
            .values()
            .map(|node| NodeRecord {
                id: node.label,
                attributes: node.clone(),
            })
            .collect();
        let edges = self
            .edges
            .values()
            .map(|edge| EdgeRecord {
                source: edge.pores.0,
                target: edge.pores.1,
                attributes: edge.clone(),
            })
            .collect();
        NetworkTables {
            metadata: self.metadata.clone(),
            nodes,
            edges,
        }
    }

    /// Rebuild a graph from its tables
    pub fn from_tables(tables: NetworkTables) -> Self {
        Self {
            nodes: tables
                .nodes
                .into_iter()
                .map(|record| (record.id, record.attributes))
                .collect(),
            edges: tables
                .edges
                .into_iter()
                .map(|record| ((record.source, record.target), record.attributes))
                .collect(),
            metadata: tables.metadata,
        }
    }
}

/// A node row: integer id and attribute columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Node id (the pore label)
    pub id: u32,
    /// Attribute columns
    #[serde(flatten)]
    pub attributes: PoreNode,
}

/// An edge row: endpoints and attribute columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    /// Lower endpoint label
    pub source: u32,
    /// Higher endpoint label
    pub target: u32,
    /// Attribute columns
    #[serde(flatten)]
    pub attributes: ThroatEdge,
}

/// Node/edge table form of a network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkTables {
    /// Field description
    pub metadata: NetworkMetadata,
    /// Node rows, ascending by id
    pub nodes: Vec<NodeRecord>,
    /// Edge rows, ascending by endpoints
    pub edges: Vec<EdgeRecord>,
}
