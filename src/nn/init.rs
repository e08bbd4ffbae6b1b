//! Parameter initialization.

use rand::Rng;
use rand_distr::{Distribution, Uniform};

use crate::error::FerrogradError;
use crate::tensor::Tensor;

/// Uniform init scaled by the input dimension: samples in
/// `±1/sqrt(fan_in)`, the classic bound that keeps early activations at unit
/// scale for linear layers.
pub fn scaled_uniform<R: Rng>(
    rows: usize,
    cols: usize,
    rng: &mut R,
) -> Result<Tensor, FerrogradError> {
    let bound = 1.0 / (cols as f32).sqrt();
    let dist = Uniform::new_inclusive(-bound, bound);
    let data: Vec<f32> = (0..rows * cols).map(|_| dist.sample(rng)).collect();
    Tensor::new(data, vec![rows, cols])
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn samples_stay_within_the_fan_in_bound() {
        let mut rng = StdRng::seed_from_u64(7);
        let w = scaled_uniform(8, 16, &mut rng).unwrap();
        let bound = 1.0 / (16.0f32).sqrt();
        assert!(w.get_data().iter().all(|v| v.abs() <= bound));
        assert_eq!(w.shape(), vec![8, 16]);
    }

    #[test]
    fn same_seed_same_weights() {
        let a = scaled_uniform(3, 4, &mut StdRng::seed_from_u64(1)).unwrap();
        let b = scaled_uniform(3, 4, &mut StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(a.get_data(), b.get_data());
    }
}
