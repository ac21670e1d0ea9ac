//! Average Directional Index on top of the `ta` streaming traits.

use ta::indicators::TrueRange;
use ta::{Close, High, Low, Next, Reset};
use trading_core::error::IndicatorError;

/// Wilder's running average: simple mean while filling, then
/// `(prev * (n - 1) + x) / n`.
#[derive(Debug, Clone)]
struct WilderAverage {
    period: usize,
    count: usize,
    value: f64,
}

impl WilderAverage {
    fn new(period: usize) -> Self {
        Self {
            period,
            count: 0,
            value: 0.0,
        }
    }

    fn next(&mut self, input: f64) -> f64 {
        if self.count < self.period {
            self.count += 1;
            self.value += (input - self.value) / self.count as f64;
        } else {
            let n = self.period as f64;
            self.value = (self.value * (n - 1.0) + input) / n;
        }
        self.value
    }

    fn reset(&mut self) {
        self.count = 0;
        self.value = 0.0;
    }
}

/// Average Directional Index (ADX).
///
/// Trend strength on a 0-100 scale regardless of direction. Needs roughly
/// two periods of bars before the value settles.
#[derive(Debug, Clone)]
pub struct AverageDirectionalIndex {
    period: usize,
    true_range: TrueRange,
    prev: Option<(f64, f64)>,
    tr: WilderAverage,
    plus_dm: WilderAverage,
    minus_dm: WilderAverage,
    dx: WilderAverage,
    plus_di: f64,
    minus_di: f64,
    adx: f64,
}

impl AverageDirectionalIndex {
    pub fn new(period: usize) -> Result<Self, IndicatorError> {
        if period == 0 {
            return Err(IndicatorError::InvalidParameter(
                "ADX period cannot be zero".to_string(),
            ));
        }
        Ok(Self {
            period,
            true_range: TrueRange::new(),
            prev: None,
            tr: WilderAverage::new(period),
            plus_dm: WilderAverage::new(period),
            minus_dm: WilderAverage::new(period),
            dx: WilderAverage::new(period),
            plus_di: 0.0,
            minus_di: 0.0,
            adx: 0.0,
        })
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// +DI from the last update.
    pub fn plus_di(&self) -> f64 {
        self.plus_di
    }

    /// -DI from the last update.
    pub fn minus_di(&self) -> f64 {
        self.minus_di
    }
}

impl<T: High + Low + Close> Next<&T> for AverageDirectionalIndex {
    type Output = f64;

    fn next(&mut self, input: &T) -> f64 {
        let tr = self.true_range.next(input);
        let (high, low) = (input.high(), input.low());

        let Some((prev_high, prev_low)) = self.prev.replace((high, low)) else {
            return self.adx;
        };

        let up = high - prev_high;
        let down = prev_low - low;
        let plus_dm = if up > down && up > 0.0 { up } else { 0.0 };
        let minus_dm = if down > up && down > 0.0 { down } else { 0.0 };

        let tr = self.tr.next(tr);
        let plus = self.plus_dm.next(plus_dm);
        let minus = self.minus_dm.next(minus_dm);

        if tr > 0.0 {
            self.plus_di = 100.0 * plus / tr;
            self.minus_di = 100.0 * minus / tr;
        } else {
            self.plus_di = 0.0;
            self.minus_di = 0.0;
        }

        let di_sum = self.plus_di + self.minus_di;
        let dx = if di_sum > 0.0 {
            100.0 * (self.plus_di - self.minus_di).abs() / di_sum
        } else {
            0.0
        };
        self.adx = self.dx.next(dx);
        self.adx
    }
}

impl Reset for AverageDirectionalIndex {
    fn reset(&mut self) {
        self.true_range.reset();
        self.prev = None;
        self.tr.reset();
        self.plus_dm.reset();
        self.minus_dm.reset();
        self.dx.reset();
        self.plus_di = 0.0;
        self.minus_di = 0.0;
        self.adx = 0.0;
    }
}
