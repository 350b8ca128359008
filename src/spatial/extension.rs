//! Constant padding and cropping of N-dimensional arrays
//!
//! Used where an algorithm must see a layer of known values around the
//! domain, such as the background shell the distance transform assumes
//! when the domain boundary is treated as solid.

use ndarray::{ArrayD, IxDyn, Slice};

/// Trait for element types that have a natural padding value
pub trait Extendable: Clone {
    /// The value to use for padding new cells
    fn padding_value() -> Self;
}

impl Extendable for bool {
    fn padding_value() -> Self {
        false
    }
}

impl Extendable for f64 {
    fn padding_value() -> Self {
        0.0
    }
}

/// Pad every axis by `pad` cells on both sides with `value`
pub fn pad_array<T: Clone>(array: &ArrayD<T>, pad: usize, value: T) -> ArrayD<T> {
    let padded_shape: Vec<usize> = array.shape().iter().map(|&n| n + 2 * pad).collect();
    let mut padded = ArrayD::from_elem(IxDyn(&padded_shape), value);
    padded
        .slice_each_axis_mut(|axis| Slice::from(pad..pad + axis.len - 2 * pad))
        .assign(array);
    padded
}

/// Pad with the element type's default padding value
pub fn pad_default<T: Extendable>(array: &ArrayD<T>, pad: usize) -> ArrayD<T> {
    pad_array(array, pad, T::padding_value())
}

/// Remove `pad` cells from both sides of every axis
///
/// Axes shorter than `2 * pad` collapse to zero length.
pub fn crop_array<T: Clone>(array: &ArrayD<T>, pad: usize) -> ArrayD<T> {
    array
        .slice_each_axis(|axis| {
            let end = axis.len.saturating_sub(pad).max(pad.min(axis.len));
            Slice::from(pad.min(axis.len)..end)
        })
        .as_standard_layout()
        .into_owned()
}
