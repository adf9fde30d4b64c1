//! Price forecaster
//!
//! Ordinary least-squares fit over (time, value) observations producing
//! a point estimate for a future time. Consumes the rolling history's
//! read surface; not part of the pipeline's correctness. Fits are done
//! in f64: the forecast is an estimate, not an accounting value.

use chrono::{DateTime, Utc};
use types::numeric::Price;

/// A fitted line `value = slope * t + intercept`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearModel {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearModel {
    /// Least-squares fit. Returns `None` for fewer than two
    /// observations or when all observations share one time value.
    pub fn fit(observations: &[(f64, f64)]) -> Option<Self> {
        if observations.len() < 2 {
            return None;
        }
        let n = observations.len() as f64;
        let mean_t = observations.iter().map(|(t, _)| t).sum::<f64>() / n;
        let mean_v = observations.iter().map(|(_, v)| v).sum::<f64>() / n;

        let mut var_t = 0.0;
        let mut cov_tv = 0.0;
        for (t, v) in observations {
            let dt = t - mean_t;
            var_t += dt * dt;
            cov_tv += dt * (v - mean_v);
        }
        if var_t == 0.0 {
            return None;
        }

        let slope = cov_tv / var_t;
        Some(Self {
            slope,
            intercept: mean_v - slope * mean_t,
        })
    }

    /// Point estimate at time `t`.
    pub fn predict(&self, t: f64) -> f64 {
        self.slope * t + self.intercept
    }
}

/// Point estimate `steps_ahead` pushes past the end of a chronological
/// price series, using the push index as the time axis.
pub fn forecast_ahead(prices: &[Price], steps_ahead: usize) -> Option<f64> {
    let observations: Vec<(f64, f64)> = prices
        .iter()
        .enumerate()
        .map(|(i, p)| (i as f64, p.to_f64()))
        .collect();
    let model = LinearModel::fit(&observations)?;
    Some(model.predict((prices.len() - 1 + steps_ahead) as f64))
}

/// Point estimate at `at` from timestamped observations, using seconds
/// since the first observation as the time axis.
pub fn forecast_at(
    observations: &[(DateTime<Utc>, f64)],
    at: DateTime<Utc>,
) -> Option<f64> {
    let origin = observations.first()?.0;
    let points: Vec<(f64, f64)> = observations
        .iter()
        .map(|(ts, v)| ((*ts - origin).num_milliseconds() as f64 / 1000.0, *v))
        .collect();
    let model = LinearModel::fit(&points)?;
    Some(model.predict((at - origin).num_milliseconds() as f64 / 1000.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_fit_recovers_exact_line() {
        let observations: Vec<(f64, f64)> =
            (0..10).map(|i| (i as f64, 100.0 + 2.5 * i as f64)).collect();
        let model = LinearModel::fit(&observations).unwrap();
        assert!((model.slope - 2.5).abs() < 1e-9);
        assert!((model.intercept - 100.0).abs() < 1e-9);
        assert!((model.predict(20.0) - 150.0).abs() < 1e-9);
    }

    #[test]
    fn test_flat_series_predicts_constant() {
        let prices = vec![Price::from_u64(100); 5];
        let estimate = forecast_ahead(&prices, 3).unwrap();
        assert!((estimate - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_too_few_observations() {
        assert!(LinearModel::fit(&[]).is_none());
        assert!(LinearModel::fit(&[(0.0, 1.0)]).is_none());
        assert!(forecast_ahead(&[Price::from_u64(1)], 1).is_none());
    }

    #[test]
    fn test_zero_time_variance() {
        assert!(LinearModel::fit(&[(1.0, 5.0), (1.0, 7.0)]).is_none());
    }

    #[test]
    fn test_rising_series_forecasts_higher() {
        let prices: Vec<Price> = (0..20).map(|i| Price::from_u64(64000 + i * 100)).collect();
        let estimate = forecast_ahead(&prices, 5).unwrap();
        assert!(estimate > prices.last().unwrap().to_f64());
    }

    #[test]
    fn test_timestamped_forecast() {
        let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        // One point per 10s, rising 1.0 per second.
        let observations: Vec<(DateTime<Utc>, f64)> = (0..6)
            .map(|i| (t0 + Duration::seconds(i * 10), 100.0 + (i * 10) as f64))
            .collect();
        let estimate = forecast_at(&observations, t0 + Duration::seconds(100)).unwrap();
        assert!((estimate - 200.0).abs() < 1e-6);
    }
}
