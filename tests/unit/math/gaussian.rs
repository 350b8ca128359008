//! Tests for separable Gaussian smoothing

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use ndarray::{ArrayD, IxDyn};
    use snowpore::math::gaussian::{convolve_reflect, gaussian_filter, gaussian_kernel, reflect_index};

    // Tests that kernel weights sum to one and mirror around the centre
    // Verified by skipping weight normalization
    #[test]
    fn test_kernel_is_normalized_and_symmetric() {
        for sigma in [0.4, 1.0, 2.5] {
            let kernel = gaussian_kernel(sigma, 4.0);
            assert_relative_eq!(kernel.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
            let reversed: Vec<f64> = kernel.iter().rev().copied().collect();
            assert_eq!(kernel, reversed);
        }
    }

    // Tests the kernel radius from truncate and sigma
    // Verified by truncating instead of rounding the radius
    #[test]
    fn test_kernel_radius_rounds_truncate_times_sigma() {
        assert_eq!(gaussian_kernel(0.4, 4.0).len(), 5);
        assert_eq!(gaussian_kernel(1.0, 4.0).len(), 9);
        assert_eq!(gaussian_kernel(1.0, 2.6).len(), 7);
    }

    // Tests that a zero sigma returns the input
    // Verified by building a kernel for zero sigma
    #[test]
    fn test_zero_sigma_is_identity() {
        assert_eq!(gaussian_kernel(0.0, 4.0), vec![1.0]);
        let input = ArrayD::from_shape_fn(IxDyn(&[3, 3]), |p| (p[0] * 3 + p[1]) as f64);
        assert_eq!(gaussian_filter(&input, 0.0, 4.0), input);
    }

    // Tests symmetric reflection of indices past either edge
    // Verified by clamping indices to the edge
    #[test]
    fn test_reflect_index_mirrors_edges() {
        assert_eq!(reflect_index(-1, 5), 0);
        assert_eq!(reflect_index(-2, 5), 1);
        assert_eq!(reflect_index(5, 5), 4);
        assert_eq!(reflect_index(6, 5), 3);
        assert_eq!(reflect_index(12, 5), 2);
    }

    // Tests that a constant field survives smoothing
    // Verified by padding the edges with zeros
    #[test]
    fn test_constant_signal_is_unchanged() {
        let kernel = gaussian_kernel(1.0, 4.0);
        let smoothed = convolve_reflect(&[3.0; 6], &kernel);
        for value in smoothed {
            assert_relative_eq!(value, 3.0, epsilon = 1e-12);
        }
    }

    // Tests that an interior impulse yields the outer product of the kernel
    // Verified by filtering only the first axis
    #[test]
    fn test_impulse_response_is_separable() {
        let mut input = ArrayD::zeros(IxDyn(&[9, 9]));
        input[[4, 4]] = 1.0;
        let kernel = gaussian_kernel(0.8, 4.0);
        let radius = kernel.len() / 2;
        let output = gaussian_filter(&input, 0.8, 4.0);

        assert_relative_eq!(output[[4, 4]], kernel[radius] * kernel[radius], epsilon = 1e-12);
        assert_relative_eq!(
            output[[3, 4]],
            kernel[radius - 1] * kernel[radius],
            epsilon = 1e-12
        );
        assert_relative_eq!(output[[3, 4]], output[[4, 5]], epsilon = 1e-12);
        assert_relative_eq!(output.sum(), 1.0, epsilon = 1e-9);
    }
}
