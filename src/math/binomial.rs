//! Binomial coefficients and the binomial splitting kernel.
//!
//! A daughter of a cell with `i` methylated sites keeps each site independently
//! with probability `p`, so its state is `Binomial(i, p)`:
//!
//! - `kernel(i, j, p) = C(i, j) p^j (1 - p)^(i - j)`
//!
//! Numerical notes:
//! - `C(i, j)` is accumulated multiplicatively in `f64`, which is exact up to
//!   `2^53` and stays finite for every site count a generator matrix can hold.
//! - `0^0` is taken as 1 (`powi(0)`), so `p = 0` and `p = 1` give the expected
//!   point masses at 0 and `i`.

/// `C(n, k)` as a float; zero when `k > n`.
pub fn binomial_coefficient(n: usize, k: usize) -> f64 {
    if k > n {
        return 0.0;
    }
    let k = k.min(n - k);
    let mut acc = 1.0;
    for step in 0..k {
        acc = acc * (n - step) as f64 / (step + 1) as f64;
    }
    acc.round()
}

/// Probability that a daughter of a state-`i` parent lands in state `j`.
pub fn kernel(i: usize, j: usize, p: f64) -> f64 {
    if j > i {
        return 0.0;
    }
    binomial_coefficient(i, j) * p.powi(j as i32) * (1.0 - p).powi((i - j) as i32)
}

/// Full kernel row `[kernel(i, 0, p), ..., kernel(i, i, p)]`.
pub fn kernel_row(i: usize, p: f64) -> Vec<f64> {
    (0..=i).map(|j| kernel(i, j, p)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coefficients_match_pascal() {
        assert_eq!(binomial_coefficient(0, 0), 1.0);
        assert_eq!(binomial_coefficient(5, 2), 10.0);
        assert_eq!(binomial_coefficient(10, 5), 252.0);
        assert_eq!(binomial_coefficient(3, 4), 0.0);
        assert_eq!(binomial_coefficient(52, 5), 2_598_960.0);
    }

    #[test]
    fn kernel_rows_are_distributions() {
        for &p in &[0.0, 0.3, 0.5, 1.0] {
            for i in 0..12 {
                let total: f64 = kernel_row(i, p).iter().sum();
                assert!((total - 1.0).abs() < 1e-12, "row {i} at p={p} sums to {total}");
            }
        }
    }

    #[test]
    fn kernel_extremes_are_point_masses() {
        assert_eq!(kernel(4, 4, 1.0), 1.0);
        assert_eq!(kernel(4, 3, 1.0), 0.0);
        assert_eq!(kernel(4, 0, 0.0), 1.0);
        assert_eq!(kernel(0, 0, 0.7), 1.0);
    }
}
