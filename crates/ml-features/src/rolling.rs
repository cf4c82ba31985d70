//! Trailing-window statistics.
//!
//! Every helper returns one entry per input row. `None` marks a row where the
//! statistic is undefined because the window has not filled yet. A NaN inside
//! a window propagates into the result for that row.

/// Simple moving average over the last `window` values, the current row included.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    rolling(values, window, |w| w.iter().sum::<f64>() / window as f64)
}

/// Sample standard deviation (`n - 1` denominator) over the last `window` values.
pub fn rolling_std(values: &[f64], window: usize) -> Vec<Option<f64>> {
    rolling(values, window, |w| {
        let n = w.len() as f64;
        let mean = w.iter().sum::<f64>() / n;
        let variance = w.iter().map(|&x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
        variance.sqrt()
    })
}

/// First difference: `values[i] - values[i - 1]`, undefined for the first row.
pub fn diff(values: &[f64]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(values.len());
    for i in 0..values.len() {
        if i == 0 {
            out.push(None);
        } else {
            out.push(Some(values[i] - values[i - 1]));
        }
    }
    out
}

/// Collapses undefined and non-finite entries to `0`.
pub fn fill_undefined(values: Vec<Option<f64>>) -> Vec<f64> {
    values
        .into_iter()
        .map(|v| match v {
            Some(x) if x.is_finite() => x,
            _ => 0.0,
        })
        .collect()
}

fn rolling<F>(values: &[f64], window: usize, stat: F) -> Vec<Option<f64>>
where
    F: Fn(&[f64]) -> f64,
{
    let mut out = Vec::with_capacity(values.len());

    for i in 0..values.len() {
        if window == 0 || i + 1 < window {
            // Not enough history for the window yet
            out.push(None);
            continue;
        }
        out.push(Some(stat(&values[i + 1 - window..=i])));
    }

    out
}
