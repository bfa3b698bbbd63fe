//! Distributions used by the generation process
use crate::shared::sequence::{Dna, NUCLEOTIDES};
use crate::shared::utils::normalize_transition_matrix;
use anyhow::{anyhow, Result};
use ndarray::{Array1, Array2, Axis};
use rand::Rng;
use rand_distr::{Distribution, WeightedIndex};

/// Generate an integer with a given probability.
///
/// Sampling is done by inverse CDF: the cumulative weights are stored once
/// and each draw is one uniform number followed by a binary search.
#[derive(Clone, Debug)]
pub struct DiscreteDistribution {
    distribution: WeightedIndex<f64>,
}

impl DiscreteDistribution {
    pub fn new(weights: Vec<f64>) -> Result<Self> {
        if weights.is_empty() {
            return Err(anyhow!("Error when creating distribution: no weights"));
        }
        if !weights.iter().all(|&x| x >= 0. && x.is_finite()) {
            return Err(anyhow!(
                "Error when creating distribution: negative or non-finite weights"
            ));
        }

        let distribution = match weights.iter().sum::<f64>().abs() < 1e-10 {
            // when all the value are 0, all the values are equiprobable.
            true => WeightedIndex::new(vec![1.; weights.len()]),
            false => WeightedIndex::new(weights),
        }
        .map_err(|e| anyhow!("Error when creating distribution: {}", e))?;
        Ok(DiscreteDistribution { distribution })
    }

    pub fn generate<R: Rng>(&self, rng: &mut R) -> usize {
        self.distribution.sample(rng)
    }
}

impl Default for DiscreteDistribution {
    fn default() -> Self {
        DiscreteDistribution {
            distribution: WeightedIndex::new(vec![1.]).expect("a single positive weight"),
        }
    }
}

// Markov chain structure (for the insertion process)
#[derive(Default, Clone, Debug)]
pub struct MarkovDNA {
    initial_distribution: DiscreteDistribution, // first nucleotide, ACGT order
    transition_matrix: Vec<DiscreteDistribution>, // Markov matrix, ACGT order, row = previous nt
}

impl MarkovDNA {
    /// `transition_probs[[i, j]]` is proportional to P(next = j | previous = i).
    /// The first nucleotide follows the steady state of the chain.
    pub fn new(transition_probs: &Array2<f64>) -> Result<Self> {
        if transition_probs.dim() != (4, 4) {
            return Err(anyhow!("The dinucleotide matrix should be 4x4"));
        }
        let mut transition_matrix = Vec::with_capacity(4);
        for probs in transition_probs.axis_iter(Axis(0)) {
            transition_matrix.push(DiscreteDistribution::new(probs.to_vec())?);
        }
        let initial_distribution =
            DiscreteDistribution::new(calc_steady_state_dist(transition_probs)?)?;
        Ok(MarkovDNA {
            initial_distribution,
            transition_matrix,
        })
    }

    pub fn generate<R: Rng>(&self, length: usize, rng: &mut R) -> Dna {
        let mut dna = Dna {
            seq: Vec::with_capacity(length),
        };
        if length == 0 {
            return dna;
        }
        let mut current_state = self.initial_distribution.generate(rng);
        dna.seq.push(NUCLEOTIDES[current_state]);
        for _ in 1..length {
            current_state = self.transition_matrix[current_state].generate(rng);
            dna.seq.push(NUCLEOTIDES[current_state]);
        }
        dna
    }
}

/// Steady state of the (row-normalized) transition matrix, by power iteration.
///```
/// use ndarray::array;
/// use vdjgen::shared::distributions::calc_steady_state_dist;
/// let m = array![[0.5, 0.5, 0., 0.], [0.5, 0.5, 0., 0.], [0., 0., 1., 0.], [0., 0., 0., 1.]];
/// let ss = calc_steady_state_dist(&array![[1., 0., 0., 0.], [1., 0., 0., 0.], [1., 0., 0., 0.], [1., 0., 0., 0.]]).unwrap();
/// assert!((ss[0] - 1.).abs() < 1e-8);
/// assert!(calc_steady_state_dist(&m).is_ok());
///```
pub fn calc_steady_state_dist(transition_matrix: &Array2<f64>) -> Result<Vec<f64>> {
    let epsilon: f64 = 1e-10;
    let mat = normalize_transition_matrix(transition_matrix)?;

    if mat.sum() == 0.0 {
        return Ok(vec![0.; mat.dim().0]);
    }

    let n = mat.nrows();
    let mut vec = Array1::from_elem(n, 1.0 / n as f64);
    for _ in 0..10000 {
        // pi_{t+1} = pi_t . M
        let vec_next = vec.dot(&mat);
        let norm = vec_next.sum();
        if norm == 0.0 {
            break;
        }
        let vec_next = vec_next / norm;

        if (&vec_next - &vec).mapv(|a| a.abs()).sum() < epsilon {
            return Ok(vec_next.to_vec());
        }
        vec = vec_next;
    }
    Err(anyhow!("No suitable steady state found for the dinucleotide matrix"))?
}
