//! Sampler
//!
//! Strategies for choosing the rows each tree of the forest is fitted on.
use rand::rngs::StdRng;
use rand::Rng;

// A sampler can be used to subset the data prior to fitting a new tree.
pub trait Sampler {
    /// Sample the data, returning a tuple, where the first item is the samples
    /// chosen for training, and the second are the samples never drawn.
    fn sample(&mut self, rng: &mut StdRng, index: &[usize]) -> (Vec<usize>, Vec<usize>);
}

/// Uses every row exactly once.
pub struct NoSampler;

impl Sampler for NoSampler {
    fn sample(&mut self, _rng: &mut StdRng, index: &[usize]) -> (Vec<usize>, Vec<usize>) {
        (index.to_vec(), Vec::new())
    }
}

/// Draws `index.len()` rows with replacement.
pub struct BootstrapSampler;

impl Sampler for BootstrapSampler {
    fn sample(&mut self, rng: &mut StdRng, index: &[usize]) -> (Vec<usize>, Vec<usize>) {
        if index.is_empty() {
            return (Vec::new(), Vec::new());
        }
        let mut drawn = vec![false; index.len()];
        let chosen = (0..index.len())
            .map(|_| {
                let pos = rng.gen_range(0..index.len());
                drawn[pos] = true;
                index[pos]
            })
            .collect();
        let excluded = index
            .iter()
            .zip(drawn)
            .filter(|(_, d)| !d)
            .map(|(i, _)| *i)
            .collect();
        (chosen, excluded)
    }
}
