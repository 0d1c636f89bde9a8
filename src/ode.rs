//! Fixed-step RK4 integration shared by the deterministic models.

use anyhow::{Result, bail};

/// Integrate `dy/dt = f(t, y)` from `t0` to `t1` with step `dt`,
/// returning the final state. The last step is shortened so the
/// integration lands exactly on `t1`.
pub fn rk4<F>(f: F, y0: Vec<f64>, t0: f64, t1: f64, dt: f64) -> Result<Vec<f64>>
where
    F: Fn(f64, &[f64]) -> Vec<f64>,
{
    if dt <= 0.0 {
        bail!("integration step must be positive");
    }
    if t1 < t0 {
        bail!("integration horizon must not precede the start time");
    }

    let dim = y0.len();
    let mut y = y0;
    let mut t = t0;

    while t < t1 {
        let h = dt.min(t1 - t);

        let k1 = f(t, &y);
        let k2 = f(t + h / 2.0, &shifted(&y, &k1, h / 2.0));
        let k3 = f(t + h / 2.0, &shifted(&y, &k2, h / 2.0));
        let k4 = f(t + h, &shifted(&y, &k3, h));

        if [&k1, &k2, &k3, &k4].iter().any(|k| k.len() != dim) {
            bail!("derivative dimension does not match the state dimension {dim}");
        }

        for i in 0..dim {
            y[i] += h / 6.0 * (k1[i] + 2.0 * k2[i] + 2.0 * k3[i] + k4[i]);
        }
        t += h;
    }

    Ok(y)
}

fn shifted(y: &[f64], k: &[f64], h: f64) -> Vec<f64> {
    y.iter().zip(k).map(|(&yi, &ki)| yi + h * ki).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exponential_decay_matches_closed_form() {
        let y = rk4(|_, y| vec![-y[0]], vec![1.0], 0.0, 2.0, 0.01).unwrap();
        assert!((y[0] - (-2.0f64).exp()).abs() < 1e-6);
    }

    #[test]
    fn horizon_shorter_than_step_is_handled() {
        // The integrator must shorten the step to land on t1 = 0.5, so
        // the result is exactly one RK4 step of size 0.5 on dy = -y:
        // 1 - h + h^2/2 - h^3/6 + h^4/24.
        let y = rk4(|_, y| vec![-y[0]], vec![1.0], 0.0, 0.5, 1.0).unwrap();
        let one_step = 1.0 - 0.5 + 0.125 - 0.5f64.powi(3) / 6.0 + 0.5f64.powi(4) / 24.0;
        assert!((y[0] - one_step).abs() < 1e-12);
        // The single-step truncation error against e^{-0.5} is ~2.4e-4.
        assert!((y[0] - (-0.5f64).exp()).abs() < 1e-3);
    }

    #[test]
    fn invalid_step_is_rejected() {
        assert!(rk4(|_, y| y.to_vec(), vec![1.0], 0.0, 1.0, 0.0).is_err());
    }
}
