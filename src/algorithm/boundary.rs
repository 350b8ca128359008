//! Boundary-face tagging and virtual boundary pores

use crate::algorithm::watershed::LabelImage;
use crate::analysis::builder::{equivalent_diameter, throat_perimeter};
use crate::analysis::graph::{PoreKind, PoreNetworkGraph, PoreNode, ThroatEdge, ThroatKind};
use crate::analysis::regions::is_region;
use crate::math::distance::DistanceMap;
use crate::spatial::border::Face;
use crate::spatial::grid::{BoundingBox, Grid, Point};
use std::collections::BTreeMap;
use tracing::debug;

/// Which faces to tag and whether to add virtual pores for them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoundaryOptions {
    /// Faces to tag
    pub faces: Vec<Face>,
    /// Append one virtual pore per face, linked to every touching pore
    pub add_virtual_pores: bool,
}

/// What tagging changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoundaryReport {
    /// Labels of the pores touching each tagged face
    pub touching: BTreeMap<Face, Vec<u32>>,
    /// Labels assigned to virtual pores, in face order
    pub virtual_pores: Vec<u32>,
}

/// Voxels of one region lying on a face layer
#[derive(Debug, Clone)]
struct FaceContact {
    count: u64,
    coordinate_sum: Vec<u64>,
    bounds: BoundingBox,
    min_distance: f64,
    first_voxel: usize,
}

impl FaceContact {
    fn new(grid: &Grid, index: usize, distance: f64) -> Self {
        let coords = grid.coords(index);
        Self {
            count: 1,
            coordinate_sum: coords.iter().map(|&c| c as u64).collect(),
            bounds: BoundingBox::from_point(&coords),
            min_distance: distance,
            first_voxel: index,
        }
    }

    fn add(&mut self, grid: &Grid, index: usize, distance: f64) {
        let coords = grid.coords(index);
        self.count += 1;
        for (sum, &c) in self.coordinate_sum.iter_mut().zip(&coords) {
            *sum += c as u64;
        }
        self.bounds.include(&coords);
        self.min_distance = self.min_distance.min(distance);
        self.first_voxel = self.first_voxel.min(index);
    }

    fn merge(&mut self, other: &Self) {
        self.count += other.count;
        for (sum, &s) in self.coordinate_sum.iter_mut().zip(&other.coordinate_sum) {
            *sum += s;
        }
        self.bounds = self.bounds.union(&other.bounds);
        self.min_distance = self.min_distance.min(other.min_distance);
        self.first_voxel = self.first_voxel.min(other.first_voxel);
    }

    fn centroid(&self, voxel_size: f64) -> Point {
        let count = self.count.max(1) as f64;
        self.coordinate_sum
            .iter()
            .map(|&sum| sum as f64 / count * voxel_size)
            .collect()
    }
}

/// Flag pores touching the requested faces, optionally adding virtual pores
///
/// Faces are processed in canonical order and duplicates are ignored.
/// Existing node geometry and edges are left untouched; only the boundary
/// flags change and new virtual nodes and edges are appended.
pub fn tag_boundaries(
    graph: &mut PoreNetworkGraph,
    labels: &LabelImage,
    distance: &DistanceMap,
    options: &BoundaryOptions,
) -> BoundaryReport {
    let grid = labels.grid();
    let ndim = grid.ndim();
    let vs = graph.metadata.voxel_size;
    let face_area = vs.powi(ndim as i32 - 1);

    let mut faces = options.faces.clone();
    faces.sort_unstable();
    faces.dedup();

    let mut report = BoundaryReport::default();

    for face in faces.into_iter().filter(|face| face.axis() < ndim) {
        let contacts = face_contacts(face, labels, distance);
        let mut touching = Vec::new();

        for &label in contacts.keys() {
            if let Some(node) = graph.nodes.get_mut(&label) {
                node.is_boundary = true;
                if !node.boundary_faces.contains(&face) {
                    node.boundary_faces.push(face);
                }
                touching.push(label);
            }
        }
        if !graph.metadata.boundary_faces.contains(&face) {
            graph.metadata.boundary_faces.push(face);
        }
        debug!(%face, pores = touching.len(), "boundary face tagged");

        if options.add_virtual_pores && !touching.is_empty() {
            let label = add_virtual_pore(graph, face, grid, &contacts, face_area);
            report.virtual_pores.push(label);
        }
        report.touching.insert(face, touching);
    }

    report
}

/// Face-layer voxels grouped by region label
fn face_contacts(face: Face, labels: &LabelImage, distance: &DistanceMap) -> BTreeMap<u32, FaceContact> {
    let grid = labels.grid();
    let mut contacts: BTreeMap<u32, FaceContact> = BTreeMap::new();
    for index in face.voxels(grid) {
        let label = labels.at(index);
        if !is_region(label) {
            continue;
        }
        let d = distance.at(index);
        contacts
            .entry(label)
            .and_modify(|contact| contact.add(grid, index, d))
            .or_insert_with(|| FaceContact::new(grid, index, d));
    }
    contacts
}

fn add_virtual_pore(
    graph: &mut PoreNetworkGraph,
    face: Face,
    grid: &Grid,
    contacts: &BTreeMap<u32, FaceContact>,
    face_area: f64,
) -> u32 {
    let vs = graph.metadata.voxel_size;
    let ndim = grid.ndim();
    let label = graph.max_label() + 1;
    let plane = face.layer(grid) as f64 * vs;

    let mut total: Option<FaceContact> = None;
    for contact in contacts.values() {
        match total.as_mut() {
            Some(acc) => acc.merge(contact),
            None => total = Some(contact.clone()),
        }
    }
    let Some(total) = total else {
        return label;
    };

    let area = total.count as f64 * face_area;
    graph.nodes.insert(
        label,
        PoreNode {
            label,
            centroid: total.centroid(vs),
            marker: grid.coords(total.first_voxel),
            voxel_count: 0,
            volume: 0.0,
            equivalent_radius: 0.0,
            inscribed_radius: 0.0,
            surface_area: area,
            bounding_box: total.bounds.clone(),
            is_boundary: true,
            boundary_faces: vec![face],
            kind: PoreKind::Virtual(face),
            isolated: false,
        },
    );

    for (&pore, contact) in contacts {
        let Some(node) = graph.nodes.get(&pore) else {
            continue;
        };
        let to_plane = node
            .centroid
            .get(face.axis())
            .map_or(0.0, |&c| (c - plane).abs());
        let area = contact.count as f64 * face_area;
        let edge = ThroatEdge {
            pores: (pore, label),
            face_count: contact.count,
            cross_sectional_area: area,
            perimeter: throat_perimeter(area, ndim),
            centroid: contact.centroid(vs),
            inscribed_radius: contact.min_distance * vs,
            equivalent_diameter: equivalent_diameter(area, ndim),
            centroid_distance: to_plane,
            conduit_length: to_plane,
            kind: ThroatKind::Virtual(face),
        };
        graph.edges.insert((pore, label), edge);
    }

    label
}
