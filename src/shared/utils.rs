use anyhow::{anyhow, Result};
use ndarray::{s, Array2};

/// Normalize the elements of the array along the second axis
/// equivalent of a/a.sum(axis=1)[:, np.newaxis] in numpy
pub fn normalize_transition_matrix(tm: &Array2<f64>) -> Result<Array2<f64>> {
    if tm.iter().any(|&x| !x.is_finite() || x < 0.) {
        return Err(anyhow!("Array contains negative or non-finite values"));
    }
    let mut normalized = Array2::<f64>::zeros(tm.dim());
    for kk in 0..tm.dim().0 {
        let sum = tm.slice(s![kk, ..]).sum();
        if sum.abs() == 0.0f64 {
            continue;
        }
        for ii in 0..tm.dim().1 {
            normalized[[kk, ii]] = tm[[kk, ii]] / sum;
        }
    }
    Ok(normalized)
}

/// Check that the array is sorted and equal to arr[0]..=arr.last()
///```
/// use vdjgen::shared::utils::sorted_and_complete;
/// assert!(sorted_and_complete(&[-2, -1, 0, 1]));
/// assert!(!sorted_and_complete(&[0, 2]));
/// assert!(!sorted_and_complete(&[1, 0]));
///```
pub fn sorted_and_complete(arr: &[i64]) -> bool {
    arr.windows(2).all(|w| w[1] == w[0] + 1)
}

/// Check that the array is equal to 0..arr.len()
pub fn sorted_and_complete_0start(arr: &[i64]) -> bool {
    arr.iter().enumerate().all(|(ii, &a)| a == ii as i64)
}

/// Return (min, max) of a list of deletion/insertion values
pub fn range_of(key: &str, arr: &[i64]) -> Result<(i64, i64)> {
    Ok((
        *arr.iter().min().ok_or(anyhow!("Empty {}", key))?,
        *arr.iter().max().ok_or(anyhow!("Empty {}", key))?,
    ))
}

/// Length of the palindromic extension implied by a deletion range
/// (negative deletions are palindromic insertions)
pub fn palindrome_length(range: (i64, i64)) -> usize {
    (-range.0).max(0) as usize
}

/// Number of nucleotides removed from the palindrome-extended segment for
/// the `index`-th deletion value of a model whose deletions span `range`.
///```
/// use vdjgen::shared::utils::deleted_nucleotides;
/// assert_eq!(deleted_nucleotides(0, (-4, 16)), 0);
/// assert_eq!(deleted_nucleotides(4, (-4, 16)), 4);
/// assert_eq!(deleted_nucleotides(0, (2, 5)), 2);
///```
pub fn deleted_nucleotides(index: usize, range: (i64, i64)) -> usize {
    index + range.0.max(0) as usize
}

pub const CONTIGUITY_ERROR: &str = "The number of insertion or deletion in the model parameters should \
     be sorted and should not contain missing value. E.g.:\n\
     %0;0\n\
     %12;1\n\
     or: \n\
     %0;1\n\
     %1;0\n\
     will both result in this error.";
