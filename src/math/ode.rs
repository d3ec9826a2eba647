//! Fixed-step RK4 for scalar ODEs `y' = f(x, y)`.
//!
//! The grid may run in either direction; a decreasing grid integrates with
//! negative steps. Each grid interval is split into `substeps` equal RK4 steps,
//! so output accuracy does not depend on how coarse the caller's grid is.

/// One classical Runge–Kutta step of size `h` from `(x, y)`.
pub fn rk4_step<F: Fn(f64, f64) -> f64>(f: &F, x: f64, y: f64, h: f64) -> f64 {
    let k1 = f(x, y);
    let k2 = f(x + 0.5 * h, y + 0.5 * h * k1);
    let k3 = f(x + 0.5 * h, y + 0.5 * h * k2);
    let k4 = f(x + h, y + h * k3);
    y + h / 6.0 * (k1 + 2.0 * k2 + 2.0 * k3 + k4)
}

/// Integrate from `(grid[0], y0)` through every grid point.
///
/// Returns one value per grid point; the first entry is `y0`.
pub fn integrate_on_grid<F: Fn(f64, f64) -> f64>(f: F, grid: &[f64], y0: f64, substeps: usize) -> Vec<f64> {
    let substeps = substeps.max(1);
    let mut out = Vec::with_capacity(grid.len());
    if grid.is_empty() {
        return out;
    }

    let mut y = y0;
    out.push(y);
    for w in grid.windows(2) {
        let (x0, x1) = (w[0], w[1]);
        let h = (x1 - x0) / substeps as f64;
        if h != 0.0 {
            for k in 0..substeps {
                y = rk4_step(&f, x0 + k as f64 * h, y, h);
            }
        }
        out.push(y);
    }
    out
}
