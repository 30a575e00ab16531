//! Summary metrics over the simulated value series.

use serde::{Deserialize, Serialize};

use indexlab_core::SimulationResult;

/// Headline numbers for one run, computed from the two value series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesMetrics {
    pub initial_value: f64,
    pub final_index_value: f64,
    pub final_baseline_value: f64,
    /// Fractional return of the rebalanced index.
    pub index_return: f64,
    /// Fractional return of the buy-and-hold baseline.
    pub baseline_return: f64,
    /// Index return minus baseline return.
    pub outperformance: f64,
    /// Largest peak-to-trough loss of the index series (fractional).
    pub max_drawdown: f64,
    /// Total fees as a fraction of the initial funds.
    pub fee_drag: f64,
}

impl SeriesMetrics {
    pub fn compute(result: &SimulationResult, initial_funds: f64) -> Self {
        let final_index_value = result.final_index_value();
        let final_baseline_value = result.final_baseline_value();

        let fractional = |value: f64| {
            if initial_funds > 0.0 {
                (value - initial_funds) / initial_funds
            } else {
                0.0
            }
        };

        let index_return = fractional(final_index_value);
        let baseline_return = fractional(final_baseline_value);

        Self {
            initial_value: initial_funds,
            final_index_value,
            final_baseline_value,
            index_return,
            baseline_return,
            outperformance: index_return - baseline_return,
            max_drawdown: max_drawdown(&result.index_values),
            fee_drag: if initial_funds > 0.0 {
                result.total_fees / initial_funds
            } else {
                0.0
            },
        }
    }
}

fn max_drawdown(series: &[f64]) -> f64 {
    let mut peak = f64::MIN;
    let mut max_dd = 0.0;

    for &value in series {
        if value > peak {
            peak = value;
        }
        if peak > 0.0 {
            let dd = (peak - value) / peak;
            if dd > max_dd {
                max_dd = dd;
            }
        }
    }

    max_dd
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use indexlab_core::domain::Portfolio;

    fn result_with(index: Vec<f64>, baseline: Vec<f64>, fees: f64) -> SimulationResult {
        let dates: Vec<NaiveDate> = (0..index.len() as i64)
            .map(|i| NaiveDate::from_ymd_opt(2020, 1, 1).unwrap() + chrono::Duration::days(i))
            .collect();
        SimulationResult {
            dates,
            baseline_values: baseline,
            index_values: index,
            total_fees: fees,
            rebalances: 1,
            final_portfolio: Portfolio::new(),
            warnings: vec![],
        }
    }

    #[test]
    fn returns_and_outperformance() {
        let result = result_with(
            vec![1000.0, 1100.0, 1200.0],
            vec![1000.0, 1050.0, 1100.0],
            20.0,
        );
        let metrics = SeriesMetrics::compute(&result, 1000.0);

        assert!((metrics.index_return - 0.2).abs() < 1e-12);
        assert!((metrics.baseline_return - 0.1).abs() < 1e-12);
        assert!((metrics.outperformance - 0.1).abs() < 1e-12);
        assert!((metrics.fee_drag - 0.02).abs() < 1e-12);
    }

    #[test]
    fn max_drawdown_finds_the_worst_trough() {
        // Peak 1200, trough 900: 25% drawdown.
        let result = result_with(
            vec![1000.0, 1200.0, 900.0, 1100.0],
            vec![1000.0; 4],
            0.0,
        );
        let metrics = SeriesMetrics::compute(&result, 1000.0);
        assert!((metrics.max_drawdown - 0.25).abs() < 1e-12);
    }

    #[test]
    fn monotonic_series_has_zero_drawdown() {
        let result = result_with(vec![1.0, 2.0, 3.0], vec![1.0; 3], 0.0);
        let metrics = SeriesMetrics::compute(&result, 1.0);
        assert_eq!(metrics.max_drawdown, 0.0);
    }
}
