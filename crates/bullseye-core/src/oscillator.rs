//! Stochastic oscillator over daily bars.
//!
//! %K = 100 * (close - lowest_low) / (highest_high - lowest_low) over a
//! rolling `period` window; %D is the 3-sample simple moving average of
//! %K. Only the latest values are surfaced. Components are `None` when
//! the input cannot support them; the math never produces NaN.

use crate::{OscillatorResult, PriceSeries};

/// Lookback window used when the caller does not override it.
pub const DEFAULT_PERIOD: usize = 14;

const SMOOTHING_WINDOW: usize = 3;

/// Compute the latest stochastic components for a series.
///
/// `latest_k` is `None` when the series is shorter than `period`, the
/// period is zero, or the latest window is flat (highest high equals
/// lowest low). `latest_d` additionally requires a defined %K for each
/// of the last three windows.
pub fn stochastic(series: &PriceSeries, period: usize) -> OscillatorResult {
    if period == 0 || series.len() < period {
        return OscillatorResult::default();
    }

    let components: Vec<Option<f64>> = (period - 1..series.len())
        .map(|end| percent_k(series, end, period))
        .collect();

    let latest_k = components.last().copied().flatten();
    let latest_d = if components.len() < SMOOTHING_WINDOW {
        None
    } else {
        let window = &components[components.len() - SMOOTHING_WINDOW..];
        let mut sum = 0.0;
        for component in window {
            match component {
                Some(value) => sum += value,
                None => return OscillatorResult { latest_k, latest_d: None },
            }
        }
        Some(sum / SMOOTHING_WINDOW as f64)
    };

    OscillatorResult { latest_k, latest_d }
}

/// %K for the window of `period` bars ending at index `end`, inclusive.
fn percent_k(series: &PriceSeries, end: usize, period: usize) -> Option<f64> {
    let window = &series.bars[end + 1 - period..=end];
    let lowest_low = window.iter().map(|bar| bar.low).fold(f64::INFINITY, f64::min);
    let highest_high = window
        .iter()
        .map(|bar| bar.high)
        .fold(f64::NEG_INFINITY, f64::max);

    let range = highest_high - lowest_low;
    if range <= 0.0 {
        return None;
    }

    let close = window[period - 1].close;
    Some(100.0 * (close - lowest_low) / range)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DailyBar, Symbol, TradeDate};

    fn series(bars: &[(f64, f64, f64)]) -> PriceSeries {
        let symbol = Symbol::parse("TEST").expect("valid symbol");
        let base = TradeDate::parse("2026-01-05").expect("valid date");
        let bars = bars
            .iter()
            .map(|&(low, high, close)| {
                DailyBar::new(base, low, high, low, close).expect("valid bar")
            })
            .collect();
        PriceSeries::new(symbol, bars)
    }

    #[test]
    fn short_series_yields_no_components() {
        let result = stochastic(&series(&[(10.0, 20.0, 15.0)]), 14);
        assert_eq!(result.latest_k, None);
        assert_eq!(result.latest_d, None);
    }

    #[test]
    fn empty_series_yields_no_components() {
        let result = stochastic(&series(&[]), 14);
        assert_eq!(result, OscillatorResult::default());
    }

    #[test]
    fn zero_period_yields_no_components() {
        let result = stochastic(&series(&[(10.0, 20.0, 15.0)]), 0);
        assert_eq!(result, OscillatorResult::default());
    }

    #[test]
    fn flat_window_is_undefined_not_nan() {
        let flat = series(&[(10.0, 10.0, 10.0), (10.0, 10.0, 10.0), (10.0, 10.0, 10.0)]);
        let result = stochastic(&flat, 2);
        assert_eq!(result.latest_k, None);
        assert_eq!(result.latest_d, None);
    }

    #[test]
    fn computes_known_values_for_period_one() {
        let input = series(&[(10.0, 20.0, 15.0), (12.0, 22.0, 20.0), (14.0, 24.0, 24.0)]);
        let result = stochastic(&input, 1);

        let k = result.latest_k.expect("k defined");
        let d = result.latest_d.expect("d defined");
        assert!((k - 100.0).abs() < 1e-9);
        assert!((d - (50.0 + 80.0 + 100.0) / 3.0).abs() < 1e-9);
    }

    #[test]
    fn d_needs_three_defined_windows() {
        let input = series(&[(10.0, 20.0, 15.0), (12.0, 22.0, 20.0), (14.0, 24.0, 24.0)]);
        let result = stochastic(&input, 2);

        assert!(result.latest_k.is_some());
        assert_eq!(result.latest_d, None);
    }

    #[test]
    fn identical_input_gives_identical_output() {
        let input = series(&[
            (10.0, 20.0, 15.0),
            (12.0, 22.0, 20.0),
            (14.0, 24.0, 18.0),
            (13.0, 23.0, 21.0),
            (15.0, 25.0, 19.0),
        ]);
        let first = stochastic(&input, 3);
        let second = stochastic(&input, 3);
        assert_eq!(first, second);
    }
}
