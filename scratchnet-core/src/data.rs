use crate::error::{Error, Result};
use crate::nn::loss::Targets;
use crate::tensor::{constant, Scalar};

use ndarray::{Array1, Array2};
use rand::Rng;
use rand_distr::{Distribution, Normal};

/// A labelled two-dimensional point cloud.
#[derive(Debug, Clone)]
pub struct Dataset<T> {
    pub x: Array2<T>,
    pub y: Array1<usize>,
    pub classes: usize,
}

impl<T: Scalar> Dataset<T> {
    pub fn len(&self) -> usize {
        self.y.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    pub fn features(&self) -> usize {
        self.x.ncols()
    }

    pub fn targets(&self) -> Targets<T> {
        Targets::Sparse(self.y.clone())
    }
}

const ANGLE_NOISE: f64 = 0.2;

/// Interleaved spiral arms, one per class.
///
/// Each class gets `samples_per_class` points whose radius grows linearly from
/// 0 to 1 while the angle sweeps a noisy span of 4 radians.
pub fn spiral_data<T: Scalar, R: Rng + ?Sized>(
    samples_per_class: usize,
    classes: usize,
    rng: &mut R,
) -> Result<Dataset<T>> {
    if samples_per_class == 0 || classes == 0 {
        return Err(Error::Config(format!(
            "spiral data needs at least one sample and one class, got {} x {}",
            samples_per_class, classes
        )));
    }

    let noise = Normal::<f64>::new(0.0, ANGLE_NOISE).map_err(|e| Error::Config(e.to_string()))?;
    let total = samples_per_class * classes;
    let mut x = Array2::zeros((total, 2));
    let mut y = Array1::zeros(total);

    for class in 0..classes {
        let start = class as f64 * 4.0;
        for i in 0..samples_per_class {
            let row = class * samples_per_class + i;
            let radius = linspace_at(0.0, 1.0, samples_per_class, i);
            let angle = (linspace_at(start, start + 4.0, samples_per_class, i) + noise.sample(rng)) * 2.5;

            x[[row, 0]] = constant(radius * angle.sin());
            x[[row, 1]] = constant(radius * angle.cos());
            y[row] = class;
        }
    }

    Ok(Dataset { x, y, classes })
}

/// `i`-th of `n` evenly spaced points over `[start, end]`.
fn linspace_at(start: f64, end: f64, n: usize, i: usize) -> f64 {
    if n < 2 {
        return start;
    }
    start + (end - start) * i as f64 / (n - 1) as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_spiral_shape_and_labels() {
        let mut rng = StdRng::seed_from_u64(0);
        let data = spiral_data::<f64, _>(100, 3, &mut rng).unwrap();
        assert_eq!(data.x.shape(), &[300, 2]);
        assert_eq!(data.len(), 300);
        assert_eq!(data.features(), 2);
        assert_eq!(data.y[0], 0);
        assert_eq!(data.y[150], 1);
        assert_eq!(data.y[299], 2);
    }

    #[test]
    fn test_spiral_points_inside_unit_disk() {
        let mut rng = StdRng::seed_from_u64(1);
        let data = spiral_data::<f32, _>(50, 4, &mut rng).unwrap();
        for row in data.x.outer_iter() {
            let norm = (row[0] * row[0] + row[1] * row[1]).sqrt();
            assert!(norm <= 1.0 + 1e-5);
        }
        // radius is zero at the start of every arm
        assert_eq!(data.x[[50, 0]], 0.0);
    }

    #[test]
    fn test_spiral_is_deterministic_for_a_seed() {
        let a = spiral_data::<f64, _>(10, 2, &mut StdRng::seed_from_u64(9)).unwrap();
        let b = spiral_data::<f64, _>(10, 2, &mut StdRng::seed_from_u64(9)).unwrap();
        assert_eq!(a.x, b.x);
    }

    #[test]
    fn test_spiral_rejects_empty() {
        let mut rng = StdRng::seed_from_u64(2);
        assert!(matches!(spiral_data::<f64, _>(0, 3, &mut rng), Err(Error::Config(_))));
    }

    #[test]
    fn test_linspace_single_point() {
        assert_eq!(linspace_at(3.0, 7.0, 1, 0), 3.0);
        assert_eq!(linspace_at(0.0, 1.0, 5, 4), 1.0);
    }
}
