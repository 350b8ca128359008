//! Separable Gaussian smoothing with mirror-reflected boundaries

use ndarray::{ArrayD, Axis, Zip};

/// Normalized 1D Gaussian kernel
///
/// The kernel radius is `truncate * sigma` rounded to the nearest integer,
/// so `sigma = 0.4` with the default truncation yields a 5-tap kernel.
pub fn gaussian_kernel(sigma: f64, truncate: f64) -> Vec<f64> {
    if sigma <= 0.0 {
        return vec![1.0];
    }
    let radius = truncate.mul_add(sigma, 0.5).floor().max(0.0) as isize;
    let denominator = 2.0 * sigma * sigma;
    let weights: Vec<f64> = (-radius..=radius)
        .map(|x| (-((x * x) as f64) / denominator).exp())
        .collect();
    let total: f64 = weights.iter().sum();
    weights.into_iter().map(|w| w / total).collect()
}

/// Index into `[0, n)` reflecting about the array edges (`d c b a | a b c d | d c b a`)
pub const fn reflect_index(index: isize, n: usize) -> usize {
    if n == 0 {
        return 0;
    }
    let period = 2 * n as isize;
    let m = index.rem_euclid(period);
    if m < n as isize {
        m as usize
    } else {
        (period - 1 - m) as usize
    }
}

/// Convolve every axis of `input` with a Gaussian of the given sigma
///
/// Returns a copy of the input when `sigma` is zero.
pub fn gaussian_filter(input: &ArrayD<f64>, sigma: f64, truncate: f64) -> ArrayD<f64> {
    let mut output = input.as_standard_layout().into_owned();
    if sigma <= 0.0 {
        return output;
    }

    let kernel = gaussian_kernel(sigma, truncate);
    for axis in 0..output.ndim() {
        Zip::from(output.lanes_mut(Axis(axis))).par_for_each(|mut lane| {
            let source: Vec<f64> = lane.iter().copied().collect();
            let smoothed = convolve_reflect(&source, &kernel);
            lane.iter_mut()
                .zip(smoothed)
                .for_each(|(slot, value)| *slot = value);
        });
    }
    output
}

/// 1D convolution of a signal with an odd-length symmetric kernel
pub fn convolve_reflect(signal: &[f64], kernel: &[f64]) -> Vec<f64> {
    let radius = (kernel.len() / 2) as isize;
    let n = signal.len();
    (0..n as isize)
        .map(|center| {
            kernel
                .iter()
                .enumerate()
                .map(|(k, &weight)| {
                    let source = reflect_index(center + k as isize - radius, n);
                    weight * signal.get(source).copied().unwrap_or(0.0)
                })
                .sum()
        })
        .collect()
}
