//! PNG loading of binary fields and label image export
//!
//! Image column (x) maps to axis 0 and image row (y) to axis 1. Slice stacks
//! add axis 2 in file-name order.

use crate::algorithm::pipeline::Stage;
use crate::algorithm::watershed::{BACKGROUND, LabelImage};
use crate::io::error::{Result, SnowError, invalid_input};
use crate::spatial::field::VoxelField;
use image::{GrayImage, Rgb, RgbImage};
use ndarray::{Array3, ArrayD, Axis, Ix2};
use rand::seq::SliceRandom;
use rand::{SeedableRng, rngs::StdRng};
use std::path::{Path, PathBuf};

/// Grey level above which a pixel counts as pore space
pub const DEFAULT_GREY_THRESHOLD: u8 = 127;

fn open_grey(path: &Path) -> Result<GrayImage> {
    let image = image::open(path).map_err(|source| SnowError::ImageLoad {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(image.to_luma8())
}

/// Load a 2D field from a PNG; pixels brighter than `threshold` are foreground
///
/// # Errors
///
/// Returns an error if the file cannot be decoded or the field is invalid
pub fn load_png_field(path: &Path, threshold: u8, voxel_size: f64) -> Result<VoxelField> {
    let grey = open_grey(path)?;
    let shape = [grey.width() as usize, grey.height() as usize];
    VoxelField::from_shape_fn(&shape, voxel_size, |position| {
        match (position.first(), position.get(1)) {
            (Some(&x), Some(&y)) => grey
                .get_pixel_checked(x as u32, y as u32)
                .is_some_and(|pixel| pixel.0[0] > threshold),
            _ => false,
        }
    })
}

/// PNG files in a directory, sorted by name
///
/// # Errors
///
/// Returns an error if the directory cannot be read
pub fn png_files_in(directory: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(directory).map_err(|source| SnowError::FileSystem {
        path: directory.to_path_buf(),
        operation: "read directory",
        source,
    })?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.extension().and_then(|s| s.to_str()) == Some("png") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Load a 3D field from a directory of equally sized PNG slices
///
/// # Errors
///
/// Returns an error if:
/// - The directory cannot be read or holds no PNG files
/// - A slice cannot be decoded
/// - Slices differ in size
pub fn load_png_stack(directory: &Path, threshold: u8, voxel_size: f64) -> Result<VoxelField> {
    let files = png_files_in(directory)?;
    let Some(first) = files.first() else {
        return Err(invalid_input(
            Stage::Validation,
            &format!("no PNG slices in '{}'", directory.display()),
        ));
    };

    let first = open_grey(first)?;
    let (width, height) = first.dimensions();
    let mut occupancy = Array3::from_elem((width as usize, height as usize, files.len()), false);

    for (z, path) in files.iter().enumerate() {
        let slice = open_grey(path)?;
        if slice.dimensions() != (width, height) {
            return Err(invalid_input(
                Stage::Validation,
                &format!(
                    "slice '{}' is {}x{}, expected {width}x{height}",
                    path.display(),
                    slice.width(),
                    slice.height()
                ),
            ));
        }
        for (x, y, pixel) in slice.enumerate_pixels() {
            if let Some(voxel) = occupancy.get_mut((x as usize, y as usize, z)) {
                *voxel = pixel.0[0] > threshold;
            }
        }
    }

    VoxelField::from_occupancy(occupancy.into_dyn(), voxel_size)
}

/// Central planes of an array, one per axis
///
/// A 3D array yields its three mid planes, perpendicular to axes 0, 1 and 2
/// in that order. Arrays of lower dimensionality are returned whole.
pub fn mid_planes<T: Clone>(array: &ArrayD<T>) -> Vec<ArrayD<T>> {
    if array.ndim() < 3 {
        return vec![array.clone()];
    }
    (0..array.ndim())
        .map(|axis| {
            let middle = array.len_of(Axis(axis)) / 2;
            array.index_axis(Axis(axis), middle).to_owned()
        })
        .collect()
}

/// One colour per label; label 0 is black and the rest are spread over the
/// hue circle in a seeded random order so neighboring labels contrast
pub fn label_colors(max_label: u32, seed: u64) -> Vec<[u8; 3]> {
    let count = max_label as usize;
    let mut ranks: Vec<usize> = (0..count).collect();
    ranks.shuffle(&mut StdRng::seed_from_u64(seed));

    std::iter::once([0, 0, 0])
        .chain(ranks.into_iter().map(|rank| {
            let hue = rank as f64 / count.max(1) as f64;
            hsv_to_rgb(hue, 0.7, 0.95)
        }))
        .collect()
}

fn hsv_to_rgb(hue: f64, saturation: f64, value: f64) -> [u8; 3] {
    let sector = (hue.fract() * 6.0).floor();
    let f = hue.fract() * 6.0 - sector;
    let p = value * (1.0 - saturation);
    let q = value * (1.0 - saturation * f);
    let t = value * (1.0 - saturation * (1.0 - f));
    let (r, g, b) = match sector as u8 {
        0 => (value, t, p),
        1 => (q, value, p),
        2 => (p, value, t),
        3 => (p, q, value),
        4 => (t, p, value),
        _ => (value, p, q),
    };
    [r, g, b].map(|c| (c * 255.0).round().clamp(0.0, 255.0) as u8)
}

/// Write a label image as a colour PNG
///
/// A 3D image is written as its middle plane along axis 2.
///
/// # Errors
///
/// Returns an error if the parent directory cannot be created or the image
/// cannot be saved
pub fn export_label_png(labels: &LabelImage, path: &Path, seed: u64) -> Result<()> {
    let plane = mid_planes(labels.labels())
        .pop()
        .ok_or_else(|| invalid_input(Stage::Validation, &"label image has no planes"))?
        .into_dimensionality::<Ix2>()
        .map_err(|e| invalid_input(Stage::Validation, &format!("label plane is not 2D: {e}")))?;

    let colors = label_colors(labels.max_label(), seed);
    let (width, height) = plane.dim();
    let mut image = RgbImage::new(width as u32, height as u32);
    for ((x, y), &label) in plane.indexed_iter() {
        let color = if label == BACKGROUND {
            [0, 0, 0]
        } else {
            colors.get(label as usize).copied().unwrap_or([255, 255, 255])
        };
        image.put_pixel(x as u32, y as u32, Rgb(color));
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| SnowError::FileSystem {
            path: parent.to_path_buf(),
            operation: "create directory",
            source,
        })?;
    }
    image.save(path).map_err(|source| SnowError::ImageExport {
        path: path.to_path_buf(),
        source,
    })
}
