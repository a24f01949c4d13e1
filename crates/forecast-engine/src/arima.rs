//! Autoregressive integrated model (ARIMA with no moving-average terms).
//!
//! AR coefficients are estimated on the `d`-times differenced series by
//! Yule-Walker: the Toeplitz system of sample autocovariances is solved by
//! Cholesky. A positive definite autocovariance matrix always yields a
//! stationary AR polynomial, so forecasts of the differenced series decay
//! instead of exploding on short, noisy histories.

use analysis_core::{AnalysisError, ModelSummary};
use nalgebra::{DMatrix, DVector};
use statrs::distribution::{ContinuousCDF, Normal};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArimaOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
}

impl ArimaOrder {
    pub const fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }
}

/// Fitted model, holding enough of the observed series to forecast from.
#[derive(Debug, Clone)]
pub struct ArimaModel {
    order: ArimaOrder,
    ar_coeffs: Vec<f64>,
    sigma2: f64,
    /// Last observed value of the series differenced 0..d times.
    level_tails: Vec<f64>,
    /// The d-times differenced series.
    differenced: Vec<f64>,
    nobs: usize,
}

impl ArimaModel {
    pub fn fit(series: &[f64], order: ArimaOrder) -> Result<Self, AnalysisError> {
        if order.q != 0 {
            return Err(AnalysisError::ModelFitFailure(format!(
                "moving-average terms are not supported (q = {})",
                order.q
            )));
        }
        if series.iter().any(|v| !v.is_finite()) {
            return Err(AnalysisError::ModelFitFailure(
                "series contains non-finite observations".to_string(),
            ));
        }

        let mut level_tails = Vec::with_capacity(order.d);
        let mut differenced = series.to_vec();
        for _ in 0..order.d {
            match differenced.last() {
                Some(&last) => level_tails.push(last),
                None => break,
            }
            differenced = difference(&differenced);
        }

        let p = order.p;
        if differenced.len() <= p {
            return Err(AnalysisError::InsufficientData(format!(
                "ARIMA({},{},{}) needs more than {} observations, got {}",
                order.p,
                order.d,
                order.q,
                p + order.d,
                series.len()
            )));
        }

        let rows = differenced.len() - p;
        let (ar_coeffs, residuals) = if p == 0 {
            (Vec::new(), differenced[..].to_vec())
        } else {
            estimate_ar(&differenced, p)?
        };

        let sigma2 = residuals.iter().map(|r| r * r).sum::<f64>() / rows as f64;
        if !sigma2.is_finite() {
            return Err(AnalysisError::ModelFitFailure(
                "residual variance is not finite".to_string(),
            ));
        }

        Ok(Self {
            order,
            ar_coeffs,
            sigma2,
            level_tails,
            differenced,
            nobs: series.len(),
        })
    }

    pub fn ar_coefficients(&self) -> &[f64] {
        &self.ar_coeffs
    }

    /// Point forecasts for the next `horizon` steps, in the original scale.
    pub fn forecast(&self, horizon: usize) -> Result<Vec<f64>, AnalysisError> {
        let p = self.ar_coeffs.len();
        let mut extended = self.differenced.clone();
        extended.reserve(horizon);

        for _ in 0..horizon {
            let n = extended.len();
            let next: f64 = (0..p).map(|i| self.ar_coeffs[i] * extended[n - 1 - i]).sum();
            extended.push(next);
        }

        let mut forecasts = extended.split_off(self.differenced.len());
        for &tail in self.level_tails.iter().rev() {
            forecasts = integrate(&forecasts, tail);
        }

        if forecasts.iter().any(|v| !v.is_finite()) {
            return Err(AnalysisError::ModelFitFailure(
                "forecast diverged to a non-finite value".to_string(),
            ));
        }
        Ok(forecasts)
    }

    /// Symmetric prediction interval `(lower, upper)` for each forecast step.
    ///
    /// Step `h` has variance `sigma2 * sum(psi_j^2, j < h)` where `psi` are the
    /// MA(inf) weights of the integrated AR polynomial.
    pub fn forecast_interval(
        &self,
        horizon: usize,
        confidence: f64,
    ) -> Result<Vec<(f64, f64)>, AnalysisError> {
        if !(confidence > 0.0 && confidence < 1.0) {
            return Err(AnalysisError::InvalidData(format!(
                "confidence must lie in (0, 1), got {}",
                confidence
            )));
        }

        let points = self.forecast(horizon)?;
        let normal = Normal::new(0.0, 1.0)
            .map_err(|e| AnalysisError::ModelFitFailure(e.to_string()))?;
        let z = normal.inverse_cdf(0.5 + confidence / 2.0);

        let psi = psi_weights(&self.integrated_ar_polynomial(), horizon);
        let mut cumulative = 0.0;
        let bands = points
            .iter()
            .zip(psi.iter())
            .map(|(&point, &w)| {
                cumulative += w * w;
                let half_width = z * (self.sigma2 * cumulative).sqrt();
                (point - half_width, point + half_width)
            })
            .collect();
        Ok(bands)
    }

    /// Coefficients `phi*_1..` of `(1 - sum phi_i B^i)(1 - B)^d` written as
    /// `1 - sum phi*_j B^j`.
    fn integrated_ar_polynomial(&self) -> Vec<f64> {
        let mut poly: Vec<f64> = std::iter::once(1.0)
            .chain(self.ar_coeffs.iter().map(|c| -c))
            .collect();
        for _ in 0..self.level_tails.len() {
            let mut next = vec![0.0; poly.len() + 1];
            for (i, &c) in poly.iter().enumerate() {
                next[i] += c;
                next[i + 1] -= c;
            }
            poly = next;
        }
        poly.iter().skip(1).map(|c| -c).collect()
    }

    pub fn summary(&self) -> ModelSummary {
        ModelSummary {
            order: (self.order.p, self.order.d, self.order.q),
            ar_coefficients: self.ar_coeffs.clone(),
            sigma2: self.sigma2,
            observations: self.nobs,
        }
    }
}

fn psi_weights(phi_star: &[f64], horizon: usize) -> Vec<f64> {
    let mut psi = Vec::with_capacity(horizon);
    for j in 0..horizon {
        if j == 0 {
            psi.push(1.0);
            continue;
        }
        let w: f64 = (1..=j.min(phi_star.len()))
            .map(|i| phi_star[i - 1] * psi[j - i])
            .sum();
        psi.push(w);
    }
    psi
}

/// First difference of a series.
pub fn difference(data: &[f64]) -> Vec<f64> {
    data.windows(2).map(|w| w[1] - w[0]).collect()
}

/// Cumulative sum of `diff` on top of `start`.
pub fn integrate(diff: &[f64], start: f64) -> Vec<f64> {
    let mut level = start;
    diff.iter()
        .map(|d| {
            level += d;
            level
        })
        .collect()
}

/// Yule-Walker estimate for `x_t = sum phi_i x_{t-i} + e_t` without a
/// constant. Returns the coefficients and the in-sample residuals.
fn estimate_ar(data: &[f64], p: usize) -> Result<(Vec<f64>, Vec<f64>), AnalysisError> {
    let n = data.len();

    // Uncentred: the model has no mean term.
    let acov: Vec<f64> = (0..=p)
        .map(|k| {
            data[..n - k]
                .iter()
                .zip(&data[k..])
                .map(|(a, b)| a * b)
                .sum::<f64>()
                / n as f64
        })
        .collect();

    let phi: Vec<f64> = if acov[0] <= 0.0 {
        // Constant differences carry no autocorrelation to fit.
        vec![0.0; p]
    } else {
        let toeplitz = DMatrix::from_fn(p, p, |i, j| acov[i.abs_diff(j)]);
        let rhs = DVector::from_fn(p, |i, _| acov[i + 1]);
        let cholesky = toeplitz.cholesky().ok_or_else(|| {
            AnalysisError::ModelFitFailure(
                "autocovariance matrix is not positive definite".to_string(),
            )
        })?;
        cholesky.solve(&rhs).iter().copied().collect()
    };

    if phi.iter().any(|c| !c.is_finite()) {
        return Err(AnalysisError::ModelFitFailure(
            "estimated coefficients are not finite".to_string(),
        ));
    }
    if !is_stationary(&phi) {
        return Err(AnalysisError::ModelFitFailure(format!(
            "estimated AR polynomial is not stationary: {:?}",
            phi
        )));
    }

    let residuals = (p..n)
        .map(|t| data[t] - (1..=p).map(|i| phi[i - 1] * data[t - i]).sum::<f64>())
        .collect();
    Ok((phi, residuals))
}

/// Whether `1 - sum phi_i z^i` has all roots outside the unit circle.
///
/// Steps the coefficients down to their partial autocorrelations; the
/// polynomial is stationary iff every one lies strictly inside (-1, 1).
pub fn is_stationary(phi: &[f64]) -> bool {
    let mut a = phi.to_vec();
    while let Some(&kappa) = a.last() {
        if !kappa.is_finite() || kappa.abs() >= 1.0 {
            return false;
        }
        let k = a.len();
        let denom = 1.0 - kappa * kappa;
        a = (0..k - 1)
            .map(|j| (a[j] + kappa * a[k - 2 - j]) / denom)
            .collect();
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difference_and_integrate_round_trip_levels() {
        let data = vec![1.0, 3.0, 6.0, 10.0, 15.0];
        let diff = difference(&data);
        assert_eq!(diff, vec![2.0, 3.0, 4.0, 5.0]);
        assert_eq!(integrate(&diff, 1.0), vec![3.0, 6.0, 10.0, 15.0]);
    }

    #[test]
    fn test_recovers_ar1_coefficient() {
        let phi = 0.7;
        let mut data = vec![0.0];
        for i in 1..300 {
            let noise = ((i * 7919) % 1000) as f64 / 5000.0 - 0.1;
            data.push(phi * data[i - 1] + noise);
        }

        let model = ArimaModel::fit(&data, ArimaOrder::new(1, 0, 0)).unwrap();
        assert!((model.ar_coefficients()[0] - phi).abs() < 0.2);
    }

    #[test]
    fn test_linear_path_fits_stationary_and_keeps_rising() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let model = ArimaModel::fit(&closes, ArimaOrder::new(5, 1, 0)).unwrap();
        assert!(is_stationary(model.ar_coefficients()));

        let forecast = model.forecast(5).unwrap();
        assert!(forecast[0] > 129.0);
        assert!(forecast.windows(2).all(|w| w[1] > w[0]));
        // Increments shrink as the differenced forecast decays.
        let steps: Vec<f64> = forecast.windows(2).map(|w| w[1] - w[0]).collect();
        assert!(steps.windows(2).all(|w| w[1] < w[0]));
    }

    #[test]
    fn test_stationarity_check() {
        assert!(is_stationary(&[]));
        assert!(is_stationary(&[0.5]));
        assert!(is_stationary(&[0.5, 0.3]));
        assert!(is_stationary(&[0.0; 5]));
        assert!(!is_stationary(&[1.0]));
        assert!(!is_stationary(&[-1.2]));
        // Unit root: 1 - 0.2(z + z^2 + ... + z^5) vanishes at z = 1.
        assert!(!is_stationary(&[0.2; 5]));
        // AR(2) with a root inside the unit circle.
        assert!(!is_stationary(&[0.5, 0.6]));
    }

    #[test]
    fn test_exact_fit_on_ten_points_stays_stationary() {
        // Nine differences and five lags: least squares would interpolate.
        let closes = [100.0, 102.0, 100.0, 98.0, 100.0, 102.0, 104.0, 102.0, 104.0, 102.0];
        let model = ArimaModel::fit(&closes, ArimaOrder::new(5, 1, 0)).unwrap();
        assert!(is_stationary(model.ar_coefficients()));
        let forecast = model.forecast(365).unwrap();
        assert!(forecast.iter().all(|v| (50.0..200.0).contains(v)));
    }

    #[test]
    fn test_flat_series_forecasts_flat() {
        let closes = vec![50.0; 20];
        let model = ArimaModel::fit(&closes, ArimaOrder::new(5, 1, 0)).unwrap();
        assert!(model.ar_coefficients().iter().all(|c| c.abs() < 1e-12));
        let forecast = model.forecast(4).unwrap();
        assert!(forecast.iter().all(|v| (v - 50.0).abs() < 1e-12));
    }

    #[test]
    fn test_rejects_non_finite_series() {
        let mut closes: Vec<f64> = (0..20).map(|i| 10.0 + i as f64).collect();
        closes[7] = f64::NAN;
        let err = ArimaModel::fit(&closes, ArimaOrder::new(5, 1, 0)).unwrap_err();
        assert!(matches!(err, AnalysisError::ModelFitFailure(_)));
    }

    #[test]
    fn test_rejects_moving_average_terms() {
        let closes: Vec<f64> = (0..20).map(|i| 10.0 + i as f64).collect();
        assert!(ArimaModel::fit(&closes, ArimaOrder::new(1, 1, 1)).is_err());
    }

    #[test]
    fn test_too_short_for_order() {
        let err = ArimaModel::fit(&[1.0, 2.0, 3.0], ArimaOrder::new(5, 1, 0)).unwrap_err();
        assert!(matches!(err, AnalysisError::InsufficientData(_)));
    }

    #[test]
    fn test_random_walk_interval_widens_like_sqrt_h() {
        // AR(0) on first differences is a random walk: var(h) = h * sigma2.
        let closes: Vec<f64> = (0..40)
            .map(|i| 100.0 + if i % 2 == 0 { 1.0 } else { -1.0 })
            .collect();
        let model = ArimaModel::fit(&closes, ArimaOrder::new(0, 1, 0)).unwrap();
        let bands = model.forecast_interval(4, 0.95).unwrap();
        let width = |i: usize| bands[i].1 - bands[i].0;
        assert!((width(3) / width(0) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_interval_contains_point_forecast() {
        let closes: Vec<f64> = (0..60)
            .map(|i| 100.0 + 0.3 * i as f64 + (i as f64 * 0.9).sin() * 2.0)
            .collect();
        let model = ArimaModel::fit(&closes, ArimaOrder::new(5, 1, 0)).unwrap();
        let points = model.forecast(10).unwrap();
        let bands = model.forecast_interval(10, 0.95).unwrap();
        for (p, (lo, hi)) in points.iter().zip(bands.iter()) {
            assert!(lo <= p && p <= hi);
        }
        assert!(model.forecast_interval(10, 1.0).is_err());
    }
}
