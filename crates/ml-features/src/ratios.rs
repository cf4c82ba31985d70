use crate::error::FeatureError;
use crate::rolling::{diff, fill_undefined, rolling_mean, rolling_std};
use crate::table::{RatioTable, RawTable};
use polars::prelude::*;

/// Window lengths for the derived indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatioWindows {
    /// Short moving averages (`ma5`, `volume_ma5`).
    pub short: usize,
    /// Long moving averages and volatility (`ma20`, `volume_ma20`, `volatility`).
    pub long: usize,
    /// RSI averaging period.
    pub rsi: usize,
}

impl Default for RatioWindows {
    fn default() -> Self {
        Self {
            short: 5,
            long: 20,
            rsi: 14,
        }
    }
}

/// Derives indicator columns from the OHLCV columns of a `RawTable`.
///
/// Each indicator group is computed only when its source columns exist;
/// missing columns simply skip the group. Output columns, in order:
///
/// | column               | needs          |
/// |----------------------|----------------|
/// | `price_range`        | High, Low      |
/// | `price_change`       | Close, Open    |
/// | `volume_price_ratio` | Volume, Close  |
/// | `volume_ma5`, `volume_ma20`, `volume_ratio` | Volume |
/// | `ma5`, `ma20`, `RSI`, `volatility` | Close |
///
/// (names shown for the default windows)
#[derive(Debug, Clone, Default)]
pub struct RatioEngine {
    windows: RatioWindows,
}

impl RatioEngine {
    pub fn new(windows: RatioWindows) -> Self {
        Self { windows }
    }

    pub fn windows(&self) -> RatioWindows {
        self.windows
    }

    /// Computes the ratio table for `raw`.
    ///
    /// Undefined cells (rolling warm-up, zero division) are `0` in the output.
    pub fn derive(&self, raw: &RawTable) -> Result<RatioTable, FeatureError> {
        let open = raw.column("Open");
        let high = raw.column("High");
        let low = raw.column("Low");
        let close = raw.column("Close");
        let volume = raw.column("Volume");

        let mut columns: Vec<(String, Vec<Option<f64>>)> = Vec::new();

        // --- Price Ratios ---
        match (&high, &low) {
            (Some(high), Some(low)) => {
                columns.push(("price_range".to_string(), zip_with(high, low, |h, l| (h - l) / l)));
            }
            _ => tracing::debug!("High/Low not present, skipping price_range"),
        }

        match (&close, &open) {
            (Some(close), Some(open)) => {
                columns.push((
                    "price_change".to_string(),
                    zip_with(close, open, |c, o| (c - o) / o),
                ));
            }
            _ => tracing::debug!("Close/Open not present, skipping price_change"),
        }

        // --- Volume Ratios ---
        if let (Some(volume), Some(close)) = (&volume, &close) {
            columns.push((
                "volume_price_ratio".to_string(),
                zip_with(volume, close, |v, c| v * c),
            ));
        }

        if let Some(volume) = &volume {
            let volume_ma_short = rolling_mean(volume, self.windows.short);
            let volume_ma_long = rolling_mean(volume, self.windows.long);
            let volume_ratio = volume
                .iter()
                .zip(&volume_ma_short)
                .map(|(&v, ma)| ma.map(|ma| v / ma))
                .collect();

            columns.push((format!("volume_ma{}", self.windows.short), volume_ma_short));
            columns.push((format!("volume_ma{}", self.windows.long), volume_ma_long));
            columns.push(("volume_ratio".to_string(), volume_ratio));
        } else {
            tracing::debug!("Volume not present, skipping volume indicators");
        }

        // --- Technical Indicators ---
        if let Some(close) = &close {
            columns.push((format!("ma{}", self.windows.short), rolling_mean(close, self.windows.short)));
            columns.push((format!("ma{}", self.windows.long), rolling_mean(close, self.windows.long)));
            columns.push(("RSI".to_string(), rsi(close, self.windows.rsi)));
            columns.push(("volatility".to_string(), rolling_std(close, self.windows.long)));
        } else {
            tracing::debug!("Close not present, skipping moving averages, RSI and volatility");
        }

        let series = columns
            .into_iter()
            .map(|(name, values)| Series::new(&name, fill_undefined(values)))
            .collect();

        RatioTable::new(raw.height(), series)
    }
}

/// Relative Strength Index using simple moving averages of gains and losses.
///
/// The first difference counts as a zero move, so the value is defined from
/// row `period - 1` on. A window with gains and no losses gives 100; a flat
/// window (no gains, no losses) is undefined.
fn rsi(close: &[f64], period: usize) -> Vec<Option<f64>> {
    let delta = diff(close);
    let gains: Vec<f64> = delta
        .iter()
        .map(|d| match d {
            Some(d) if *d > 0.0 => *d,
            _ => 0.0,
        })
        .collect();
    let losses: Vec<f64> = delta
        .iter()
        .map(|d| match d {
            Some(d) if *d < 0.0 => -*d,
            _ => 0.0,
        })
        .collect();

    let avg_gain = rolling_mean(&gains, period);
    let avg_loss = rolling_mean(&losses, period);

    avg_gain
        .into_iter()
        .zip(avg_loss)
        .map(|(gain, loss)| match (gain, loss) {
            (Some(gain), Some(loss)) => {
                let rs = gain / loss;
                Some(100.0 - 100.0 / (1.0 + rs))
            }
            _ => None,
        })
        .collect()
}

fn zip_with<F>(a: &[f64], b: &[f64], f: F) -> Vec<Option<f64>>
where
    F: Fn(f64, f64) -> f64,
{
    a.iter().zip(b).map(|(&x, &y)| Some(f(x, y))).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ohlcv(rows: usize) -> RawTable {
        let close: Vec<f64> = (0..rows).map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0).collect();
        let open: Vec<f64> = close.iter().map(|c| c - 0.5).collect();
        let high: Vec<f64> = close.iter().map(|c| c + 1.0).collect();
        let low: Vec<f64> = close.iter().map(|c| c - 1.5).collect();
        let volume: Vec<f64> = (0..rows).map(|i| 1_000.0 + (i % 7) as f64 * 50.0).collect();
        RawTable::from_columns([
            ("Open", open),
            ("High", high),
            ("Low", low),
            ("Close", close),
            ("Volume", volume),
        ])
        .unwrap()
    }

    #[test]
    fn test_full_ohlcv_produces_every_column_in_order() {
        let ratios = RatioEngine::default().derive(&ohlcv(40)).unwrap();
        assert_eq!(
            ratios.column_names(),
            vec![
                "price_range",
                "price_change",
                "volume_price_ratio",
                "volume_ma5",
                "volume_ma20",
                "volume_ratio",
                "ma5",
                "ma20",
                "RSI",
                "volatility",
            ]
        );
        assert_eq!(ratios.height(), 40);
    }

    #[test]
    fn test_missing_high_low_skips_price_range() {
        let raw = RawTable::from_columns([
            ("Open", vec![1.0, 2.0, 3.0]),
            ("Close", vec![2.0, 3.0, 4.0]),
        ])
        .unwrap();
        let ratios = RatioEngine::default().derive(&raw).unwrap();
        assert!(!ratios.has_column("price_range"));
        assert_eq!(ratios.column("price_change"), Some(vec![1.0, 0.5, 1.0 / 3.0]));
    }

    #[test]
    fn test_unrelated_columns_derive_nothing() {
        let raw = RawTable::from_columns([("foo", vec![1.0, 2.0, 3.0])]).unwrap();
        let ratios = RatioEngine::default().derive(&raw).unwrap();
        assert_eq!(ratios.width(), 0);
        assert_eq!(ratios.height(), 3);
    }

    #[test]
    fn test_every_cell_is_finite() {
        let base = ohlcv(30);
        // Zero prices and volumes force divisions by zero.
        let zeros = vec![0.0; 30];
        let raw = RawTable::from_columns([
            ("Open", zeros.clone()),
            ("Low", zeros.clone()),
            ("High", base.column("High").unwrap()),
            ("Close", base.column("Close").unwrap()),
            ("Volume", zeros),
        ])
        .unwrap();

        let ratios = RatioEngine::default().derive(&raw).unwrap();
        for name in ratios.column_names() {
            let values = ratios.column(&name).unwrap();
            assert!(values.iter().all(|v| v.is_finite()), "{name} has a non-finite cell");
        }
        assert!(ratios.column("volume_ratio").unwrap().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_warm_up_rows_are_zero() {
        let ratios = RatioEngine::default().derive(&ohlcv(25)).unwrap();
        let ma20 = ratios.column("ma20").unwrap();
        assert!(ma20[..19].iter().all(|&v| v == 0.0));
        assert!(ma20[19] > 0.0);

        let volatility = ratios.column("volatility").unwrap();
        assert!(volatility[..19].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_rsi_rising_prices_is_100() {
        let close: Vec<f64> = (0..20).map(|i| 10.0 + i as f64).collect();
        let values = fill_undefined(rsi(&close, 14));
        assert!(values[..13].iter().all(|&v| v == 0.0));
        assert!(values[13..].iter().all(|&v| (v - 100.0).abs() < 1e-12));
    }

    #[test]
    fn test_rsi_flat_prices_is_zero_after_fill() {
        let values = fill_undefined(rsi(&[5.0; 20], 14));
        assert!(values.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_rsi_balanced_moves_is_50() {
        let close: Vec<f64> = (0..30).map(|i| if i % 2 == 0 { 10.0 } else { 11.0 }).collect();
        // The last 14 moves are seven rises and seven falls of equal size.
        let values = rsi(&close, 14);
        let last = values.last().unwrap().unwrap();
        assert!((last - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_derive_is_deterministic() {
        let raw = ohlcv(50);
        let engine = RatioEngine::default();
        let first = engine.derive(&raw).unwrap();
        let second = engine.derive(&raw).unwrap();

        assert_eq!(first.column_names(), second.column_names());
        for name in first.column_names() {
            let a: Vec<u64> = first.column(&name).unwrap().iter().map(|v| v.to_bits()).collect();
            let b: Vec<u64> = second.column(&name).unwrap().iter().map(|v| v.to_bits()).collect();
            assert_eq!(a, b, "{name} differs between runs");
        }
    }

    #[test]
    fn test_custom_windows_rename_columns() {
        let engine = RatioEngine::new(RatioWindows { short: 3, long: 10, rsi: 7 });
        let ratios = engine.derive(&ohlcv(15)).unwrap();
        assert!(ratios.has_column("ma3"));
        assert!(ratios.has_column("volume_ma10"));
        assert!(!ratios.has_column("ma5"));
    }
}
