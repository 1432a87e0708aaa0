//! Seasonal ARIMA estimation by conditional sum of squares.
//!
//! The differenced series `w = (1 - B)^d (1 - B^s)^D y` is modelled as
//!
//! ```text
//! φ(B) Φ(B^s) (w_t - μ) = θ(B) Θ(B^s) ε_t
//! ```
//!
//! Starting values come from the two-stage Hannan–Rissanen regression; the
//! conditional sum of squares is then minimised with a Nelder–Mead simplex,
//! restricted to stationary and invertible parameter sets.

use nalgebra::{DMatrix, DVector};
use thiserror::Error;

use crate::models::{ModelOrder, SeasonalOrder};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {
    #[error("need at least {needed} observations for this model, got {got}")]
    InsufficientData { needed: usize, got: usize },

    #[error("series contains non-finite values")]
    NonFinite,

    #[error("series has zero variance")]
    ZeroVariance,

    #[error("estimation diverged: {0}")]
    Diverged(String),
}

/// Structure of the model to estimate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArimaSpec {
    pub order: ModelOrder,
    pub seasonal: SeasonalOrder,
    pub include_constant: bool,
}

impl ArimaSpec {
    /// Seasonal family. Never carries a constant term.
    pub fn sarimax(order: ModelOrder, seasonal: SeasonalOrder) -> Self {
        Self {
            order,
            seasonal,
            include_constant: false,
        }
    }

    /// Plain ARIMA. A mean is estimated only for undifferenced series.
    pub fn arima(order: ModelOrder) -> Self {
        Self {
            order,
            seasonal: SeasonalOrder::NONE,
            include_constant: order.d == 0,
        }
    }

    fn period(&self) -> usize {
        if self.seasonal.is_none() {
            0
        } else {
            self.seasonal.period
        }
    }

    fn seasonal_ar_len(&self) -> usize {
        if self.period() == 0 { 0 } else { self.seasonal.p }
    }

    fn seasonal_ma_len(&self) -> usize {
        if self.period() == 0 { 0 } else { self.seasonal.q }
    }

    fn seasonal_diffs(&self) -> usize {
        if self.period() == 0 { 0 } else { self.seasonal.d }
    }

    /// Highest lag of the expanded AR polynomial
    fn ar_span(&self) -> usize {
        self.order.p + self.period() * self.seasonal_ar_len()
    }

    fn param_count(&self) -> usize {
        self.order.p
            + self.seasonal_ar_len()
            + self.order.q
            + self.seasonal_ma_len()
            + usize::from(self.include_constant)
    }

    /// Observations consumed by differencing plus enough left over to estimate
    /// every parameter from at least two residuals.
    pub fn min_observations(&self) -> usize {
        self.order.d
            + self.period() * self.seasonal_diffs()
            + self.ar_span()
            + self.param_count()
            + 2
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Params {
    ar: Vec<f64>,
    seasonal_ar: Vec<f64>,
    ma: Vec<f64>,
    seasonal_ma: Vec<f64>,
    mean: f64,
}

impl Params {
    fn from_slice(spec: &ArimaSpec, v: &[f64]) -> Self {
        let mut offset = 0;
        let mut take = |n: usize| {
            let part = v[offset..offset + n].to_vec();
            offset += n;
            part
        };
        let ar = take(spec.order.p);
        let seasonal_ar = take(spec.seasonal_ar_len());
        let ma = take(spec.order.q);
        let seasonal_ma = take(spec.seasonal_ma_len());
        let mean = if spec.include_constant { take(1)[0] } else { 0.0 };
        Self { ar, seasonal_ar, ma, seasonal_ma, mean }
    }

    /// Lag coefficients `a_k` of `w_t = Σ a_k w_{t-k} + ...`
    fn ar_polynomial(&self, period: usize) -> Vec<f64> {
        let c = poly_mul(
            &lag_polynomial(&self.ar, 1, -1.0),
            &lag_polynomial(&self.seasonal_ar, period, -1.0),
        );
        c.iter().skip(1).map(|v| -v).collect()
    }

    /// Lag coefficients `m_k` of `... + ε_t + Σ m_k ε_{t-k}`
    fn ma_polynomial(&self, period: usize) -> Vec<f64> {
        let c = poly_mul(
            &lag_polynomial(&self.ma, 1, 1.0),
            &lag_polynomial(&self.seasonal_ma, period, 1.0),
        );
        c.into_iter().skip(1).collect()
    }
}

/// A fitted model, ready to forecast past the end of its training data
#[derive(Debug, Clone)]
pub struct FittedArima {
    pub spec: ArimaSpec,
    pub ar: Vec<f64>,
    pub seasonal_ar: Vec<f64>,
    pub ma: Vec<f64>,
    pub seasonal_ma: Vec<f64>,
    pub mean: f64,
    pub sigma2: f64,
    pub aic: Option<f64>,
    differenced: Vec<f64>,
    residuals: Vec<f64>,
    /// (lag, series before that differencing step), in application order
    stages: Vec<(usize, Vec<f64>)>,
}

/// Point forecasts with symmetric confidence bands
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastPath {
    pub point: Vec<f64>,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

pub fn fit(data: &[f64], spec: ArimaSpec) -> Result<FittedArima, FitError> {
    if data.iter().any(|v| !v.is_finite()) {
        return Err(FitError::NonFinite);
    }

    let needed = spec.min_observations();
    if data.len() < needed {
        return Err(FitError::InsufficientData {
            needed,
            got: data.len(),
        });
    }

    if data.iter().all(|v| *v == data[0]) {
        return Err(FitError::ZeroVariance);
    }

    let (differenced, stages) = difference_stages(data, &spec);

    let objective = |v: &[f64]| conditional_sum_of_squares(&differenced, &spec, v);
    let start = feasible_start(initial_estimates(&differenced, &spec), &spec, &objective);
    let steps = simplex_steps(&differenced, &spec, &start);

    let (best, css) = NelderMead::default().minimize(&objective, start, &steps);
    if !css.is_finite() {
        return Err(FitError::Diverged(
            "conditional sum of squares is not finite".to_string(),
        ));
    }

    let params = Params::from_slice(&spec, &best);
    let period = spec.period();
    let centered: Vec<f64> = differenced.iter().map(|v| v - params.mean).collect();
    let residuals = innovations(
        &centered,
        &params.ar_polynomial(period),
        &params.ma_polynomial(period),
    );

    let n_used = differenced.len() - spec.ar_span();
    let sigma2 = css / n_used as f64;
    let aic = if sigma2 > 0.0 {
        let n = n_used as f64;
        let k = (spec.param_count() + 1) as f64;
        Some(n * (2.0 * std::f64::consts::PI * sigma2).ln() + n + 2.0 * k)
    } else {
        None
    };

    Ok(FittedArima {
        spec,
        ar: params.ar,
        seasonal_ar: params.seasonal_ar,
        ma: params.ma,
        seasonal_ma: params.seasonal_ma,
        mean: params.mean,
        sigma2,
        aic,
        differenced,
        residuals,
        stages,
    })
}

impl FittedArima {
    fn params(&self) -> Params {
        Params {
            ar: self.ar.clone(),
            seasonal_ar: self.seasonal_ar.clone(),
            ma: self.ma.clone(),
            seasonal_ma: self.seasonal_ma.clone(),
            mean: self.mean,
        }
    }

    /// Point forecasts for the `horizon` observations after the training data
    pub fn forecast(&self, horizon: usize) -> Result<Vec<f64>, FitError> {
        let params = self.params();
        let period = self.spec.period();
        let ar = params.ar_polynomial(period);
        let ma = params.ma_polynomial(period);

        let mut z: Vec<f64> = self.differenced.iter().map(|v| v - self.mean).collect();
        let mut e = self.residuals.clone();

        for _ in 0..horizon {
            let t = z.len();
            let mut next = 0.0;
            for (i, a) in ar.iter().enumerate() {
                next += a * z[t - 1 - i];
            }
            for (j, m) in ma.iter().enumerate() {
                if let Some(idx) = t.checked_sub(j + 1) {
                    next += m * e[idx];
                }
            }
            z.push(next);
            e.push(0.0);
        }

        let mut out: Vec<f64> = z[self.differenced.len()..]
            .iter()
            .map(|v| v + self.mean)
            .collect();

        for (lag, history) in self.stages.iter().rev() {
            out = integrate(history, &out, *lag);
        }

        if out.iter().any(|v| !v.is_finite()) {
            return Err(FitError::Diverged("forecast is not finite".to_string()));
        }

        Ok(out)
    }

    /// Forecasts with bands of `z_score` standard errors, using the psi-weights
    /// of the model including its differencing operators.
    pub fn forecast_with_intervals(
        &self,
        horizon: usize,
        z_score: f64,
    ) -> Result<ForecastPath, FitError> {
        let point = self.forecast(horizon)?;
        let psi = self.psi_weights(horizon);

        let mut cumulative = 0.0;
        let mut lower = Vec::with_capacity(horizon);
        let mut upper = Vec::with_capacity(horizon);
        for (value, weight) in point.iter().zip(psi.iter()) {
            cumulative += weight * weight;
            let half_width = z_score * (self.sigma2 * cumulative).sqrt();
            lower.push(value - half_width);
            upper.push(value + half_width);
        }

        Ok(ForecastPath { point, lower, upper })
    }

    fn psi_weights(&self, horizon: usize) -> Vec<f64> {
        let params = self.params();
        let period = self.spec.period();

        let ar: Vec<f64> = params.ar_polynomial(period);
        let mut ar_c = lag_polynomial(&ar, 1, -1.0);
        for _ in 0..self.spec.order.d {
            ar_c = poly_mul(&ar_c, &[1.0, -1.0]);
        }
        for _ in 0..self.spec.seasonal_diffs() {
            ar_c = poly_mul(&ar_c, &lag_polynomial(&[1.0], period, -1.0));
        }
        let ma_c = lag_polynomial(&params.ma_polynomial(period), 1, 1.0);

        let mut psi: Vec<f64> = Vec::with_capacity(horizon);
        for j in 0..horizon {
            if j == 0 {
                psi.push(1.0);
                continue;
            }
            let mut value = ma_c.get(j).copied().unwrap_or(0.0);
            for i in 1..=j.min(ar_c.len() - 1) {
                value -= ar_c[i] * psi[j - i];
            }
            psi.push(value);
        }
        psi
    }
}

/// `x_t - x_{t-lag}`
pub fn lag_difference(data: &[f64], lag: usize) -> Vec<f64> {
    if data.len() <= lag {
        return Vec::new();
    }
    (lag..data.len()).map(|i| data[i] - data[i - lag]).collect()
}

/// Inverse of `lag_difference`, continuing `history` with `diffs`
pub fn integrate(history: &[f64], diffs: &[f64], lag: usize) -> Vec<f64> {
    let mut extended = history.to_vec();
    for d in diffs {
        let base = extended[extended.len() - lag];
        extended.push(d + base);
    }
    extended.split_off(history.len())
}

fn difference_stages(data: &[f64], spec: &ArimaSpec) -> (Vec<f64>, Vec<(usize, Vec<f64>)>) {
    let mut stages = Vec::new();
    let mut current = data.to_vec();

    for _ in 0..spec.seasonal_diffs() {
        let next = lag_difference(&current, spec.period());
        stages.push((spec.period(), current));
        current = next;
    }
    for _ in 0..spec.order.d {
        let next = lag_difference(&current, 1);
        stages.push((1, current));
        current = next;
    }

    (current, stages)
}

/// `1 + sign * Σ coeffs[i] B^((i+1) * step)` as a dense coefficient vector
fn lag_polynomial(coeffs: &[f64], step: usize, sign: f64) -> Vec<f64> {
    let mut poly = vec![0.0; coeffs.len() * step + 1];
    poly[0] = 1.0;
    for (i, c) in coeffs.iter().enumerate() {
        poly[(i + 1) * step] = sign * c;
    }
    poly
}

fn poly_mul(a: &[f64], b: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, x) in a.iter().enumerate() {
        for (j, y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    out
}

/// Stationarity of `x_t = Σ a_k x_{t-k}` via the step-down (Schur–Cohn)
/// recursion: every reflection coefficient must lie strictly inside (-1, 1).
pub fn is_stationary(coeffs: &[f64]) -> bool {
    let mut a = coeffs.to_vec();
    while let Some(&k) = a.last() {
        if !k.is_finite() || k.abs() >= 1.0 {
            return false;
        }
        let j = a.len();
        let denom = 1.0 - k * k;
        a = (0..j - 1).map(|i| (a[i] + k * a[j - 2 - i]) / denom).collect();
    }
    true
}

pub fn is_invertible(ma: &[f64]) -> bool {
    let flipped: Vec<f64> = ma.iter().map(|m| -m).collect();
    is_stationary(&flipped)
}

/// One-step prediction errors, conditioned on the first `ar.len()`
/// observations and zero pre-sample innovations.
fn innovations(z: &[f64], ar: &[f64], ma: &[f64]) -> Vec<f64> {
    let start = ar.len();
    let mut e = vec![0.0; z.len()];
    for t in start..z.len() {
        let mut predicted = 0.0;
        for (i, a) in ar.iter().enumerate() {
            predicted += a * z[t - 1 - i];
        }
        for (j, m) in ma.iter().enumerate() {
            if let Some(idx) = t.checked_sub(j + 1) {
                predicted += m * e[idx];
            }
        }
        e[t] = z[t] - predicted;
    }
    e
}

fn conditional_sum_of_squares(w: &[f64], spec: &ArimaSpec, v: &[f64]) -> f64 {
    let params = Params::from_slice(spec, v);
    let period = spec.period();
    let ar = params.ar_polynomial(period);
    let ma = params.ma_polynomial(period);

    if !is_stationary(&ar) || !is_invertible(&ma) {
        return f64::INFINITY;
    }

    let z: Vec<f64> = w.iter().map(|x| x - params.mean).collect();
    let css: f64 = innovations(&z, &ar, &ma)[ar.len()..].iter().map(|e| e * e).sum();

    if css.is_finite() { css } else { f64::INFINITY }
}

/// Hannan–Rissanen: a long autoregression supplies innovation estimates, then
/// the ARMA coefficients are regressed on lagged values and lagged innovations.
/// Seasonal coefficients start at zero.
fn initial_estimates(w: &[f64], spec: &ArimaSpec) -> Vec<f64> {
    let p = spec.order.p;
    let q = spec.order.q;
    let n = w.len();
    let mean = if spec.include_constant {
        w.iter().sum::<f64>() / n as f64
    } else {
        0.0
    };
    let z: Vec<f64> = w.iter().map(|x| x - mean).collect();

    let (long_order, innovations) = if q > 0 {
        let m = (p + q).max(4).min(n / 3);
        (m, long_ar_residuals(&z, m))
    } else {
        (0, vec![0.0; n])
    };

    let start = p.max(long_order + q);
    let cols = p + q;
    let mut coefficients = vec![0.0; cols];

    if cols > 0 && n > start + cols {
        let rows = n - start;
        let mut x = Vec::with_capacity(rows * cols);
        let mut y = Vec::with_capacity(rows);
        for t in start..n {
            y.push(z[t]);
            for i in 1..=p {
                x.push(z[t - i]);
            }
            for j in 1..=q {
                x.push(innovations[t - j]);
            }
        }
        if let Some(beta) = least_squares(rows, cols, &x, y) {
            coefficients = beta;
        }
    }

    let mut v = Vec::with_capacity(spec.param_count());
    v.extend_from_slice(&coefficients[..p]);
    v.extend(std::iter::repeat(0.0).take(spec.seasonal_ar_len()));
    v.extend_from_slice(&coefficients[p..]);
    v.extend(std::iter::repeat(0.0).take(spec.seasonal_ma_len()));
    if spec.include_constant {
        v.push(mean);
    }
    v
}

fn long_ar_residuals(z: &[f64], order: usize) -> Vec<f64> {
    let n = z.len();
    let mut residuals = vec![0.0; n];
    if order == 0 || n <= 2 * order {
        return residuals;
    }

    let rows = n - order;
    let mut x = Vec::with_capacity(rows * order);
    let mut y = Vec::with_capacity(rows);
    for t in order..n {
        y.push(z[t]);
        for i in 1..=order {
            x.push(z[t - i]);
        }
    }

    if let Some(beta) = least_squares(rows, order, &x, y) {
        for t in order..n {
            let fitted: f64 = (1..=order).map(|i| beta[i - 1] * z[t - i]).sum();
            residuals[t] = z[t] - fitted;
        }
    }
    residuals
}

/// Minimum-norm least squares through the SVD; rank-deficient designs are
/// solved rather than rejected.
fn least_squares(rows: usize, cols: usize, x: &[f64], y: Vec<f64>) -> Option<Vec<f64>> {
    let x = DMatrix::from_row_slice(rows, cols, x);
    let y = DVector::from_vec(y);
    let beta = x.svd(true, true).solve(&y, 1e-10).ok()?;
    if beta.iter().all(|b| b.is_finite()) {
        Some(beta.iter().copied().collect())
    } else {
        None
    }
}

/// Halve the coefficients until the start is stationary and invertible,
/// falling back to white noise around the mean.
fn feasible_start<F: Fn(&[f64]) -> f64>(mut v: Vec<f64>, spec: &ArimaSpec, objective: &F) -> Vec<f64> {
    let coefficient_count = spec.param_count() - usize::from(spec.include_constant);
    for _ in 0..8 {
        if objective(&v).is_finite() {
            return v;
        }
        for c in v.iter_mut().take(coefficient_count) {
            *c *= 0.5;
        }
    }
    for c in v.iter_mut().take(coefficient_count) {
        *c = 0.0;
    }
    v
}

fn simplex_steps(w: &[f64], spec: &ArimaSpec, start: &[f64]) -> Vec<f64> {
    let mut steps = vec![0.1; start.len()];
    if spec.include_constant {
        let n = w.len() as f64;
        let mean = w.iter().sum::<f64>() / n;
        let std_dev = (w.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n).sqrt();
        if let Some(last) = steps.last_mut() {
            *last = (0.1 * std_dev).max(1e-3);
        }
    }
    steps
}

/// Derivative-free simplex minimiser. Deterministic for a given start.
#[derive(Debug, Clone, Copy)]
pub(crate) struct NelderMead {
    pub max_iterations: usize,
    pub tolerance: f64,
}

impl Default for NelderMead {
    fn default() -> Self {
        Self {
            max_iterations: 2000,
            tolerance: 1e-10,
        }
    }
}

impl NelderMead {
    pub fn minimize<F: Fn(&[f64]) -> f64>(
        &self,
        f: &F,
        x0: Vec<f64>,
        steps: &[f64],
    ) -> (Vec<f64>, f64) {
        let eval = |x: &[f64]| {
            let v = f(x);
            if v.is_nan() { f64::INFINITY } else { v }
        };

        let n = x0.len();
        if n == 0 {
            let fx = eval(&x0);
            return (x0, fx);
        }

        let mut simplex: Vec<(Vec<f64>, f64)> = Vec::with_capacity(n + 1);
        let f0 = eval(&x0);
        simplex.push((x0.clone(), f0));
        for i in 0..n {
            let mut x = x0.clone();
            x[i] += steps[i];
            let fx = eval(&x);
            simplex.push((x, fx));
        }

        for _ in 0..self.max_iterations {
            simplex.sort_by(|a, b| a.1.total_cmp(&b.1));
            let best = simplex[0].1;
            let worst = simplex[n].1;
            if worst.is_finite() && (worst - best).abs() <= self.tolerance * (best.abs() + self.tolerance) {
                break;
            }

            let centroid: Vec<f64> = (0..n)
                .map(|j| simplex[..n].iter().map(|(x, _)| x[j]).sum::<f64>() / n as f64)
                .collect();
            let worst_x = simplex[n].0.clone();
            let along = |coef: f64| -> Vec<f64> {
                centroid
                    .iter()
                    .zip(worst_x.iter())
                    .map(|(c, w)| c + coef * (w - c))
                    .collect()
            };

            let reflected = along(-1.0);
            let fr = eval(&reflected);

            if fr < best {
                let expanded = along(-2.0);
                let fe = eval(&expanded);
                simplex[n] = if fe < fr { (expanded, fe) } else { (reflected, fr) };
                continue;
            }

            if fr < simplex[n - 1].1 {
                simplex[n] = (reflected, fr);
                continue;
            }

            let (contracted, fc, accept) = if fr < worst {
                let c = along(-0.5);
                let fc = eval(&c);
                (c, fc, fc <= fr)
            } else {
                let c = along(0.5);
                let fc = eval(&c);
                (c, fc, fc < worst)
            };

            if accept {
                simplex[n] = (contracted, fc);
                continue;
            }

            let best_x = simplex[0].0.clone();
            for vertex in simplex.iter_mut().skip(1) {
                let shrunk: Vec<f64> = best_x
                    .iter()
                    .zip(vertex.0.iter())
                    .map(|(b, x)| b + 0.5 * (x - b))
                    .collect();
                let fs = eval(&shrunk);
                *vertex = (shrunk, fs);
            }
        }

        simplex.sort_by(|a, b| a.1.total_cmp(&b.1));
        simplex.swap_remove(0)
    }
}
