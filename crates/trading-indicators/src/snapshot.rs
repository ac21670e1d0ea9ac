//! Streams candles through the indicator set and emits snapshots.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use ta::indicators::{
    AverageTrueRange, BollingerBands, ExponentialMovingAverage,
    MovingAverageConvergenceDivergence, RelativeStrengthIndex,
};
use ta::{DataItem, Next, Reset};
use trading_core::error::IndicatorError;
use trading_core::{names, Bar, IndicatorSnapshot};

use crate::adx::AverageDirectionalIndex;

/// Indicator periods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    pub ema_fast: usize,
    pub ema_slow: usize,
    pub rsi: usize,
    pub atr: usize,
    pub adx: usize,
    pub bollinger_period: usize,
    pub bollinger_std_dev: f64,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    /// Window of the rolling ATR mean used by breakout detection
    pub atr_mean_window: usize,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            ema_fast: 20,
            ema_slow: 50,
            rsi: 14,
            atr: 14,
            adx: 14,
            bollinger_period: 20,
            bollinger_std_dev: 2.0,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            atr_mean_window: 20,
        }
    }
}

impl SnapshotConfig {
    /// Bars needed before every indicator has seen a full period.
    pub fn warmup(&self) -> usize {
        [
            self.ema_slow,
            self.rsi + 1,
            self.atr + self.atr_mean_window,
            self.adx * 2,
            self.bollinger_period,
            self.macd_slow + self.macd_signal,
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }
}

fn ta_error(what: &str, err: impl std::fmt::Debug) -> IndicatorError {
    IndicatorError::InvalidParameter(format!("Failed to initialize {}: {:?}", what, err))
}

/// Incremental snapshot builder for one symbol.
///
/// Every pushed bar advances all indicators by one step; the returned
/// snapshot reports how many bars are behind it so callers can decide
/// whether the values are warmed up.
#[derive(Debug, Clone)]
pub struct SnapshotBuilder {
    symbol: String,
    config: SnapshotConfig,
    ema_fast: ExponentialMovingAverage,
    ema_slow: ExponentialMovingAverage,
    rsi: RelativeStrengthIndex,
    atr: AverageTrueRange,
    adx: AverageDirectionalIndex,
    bollinger: BollingerBands,
    macd: MovingAverageConvergenceDivergence,
    atr_window: VecDeque<f64>,
    atr_sum: f64,
    bars_seen: usize,
}

impl SnapshotBuilder {
    pub fn new(symbol: impl Into<String>, config: SnapshotConfig) -> Result<Self, IndicatorError> {
        if config.atr_mean_window == 0 {
            return Err(IndicatorError::InvalidParameter(
                "ATR mean window cannot be zero".to_string(),
            ));
        }

        Ok(Self {
            symbol: symbol.into(),
            ema_fast: ExponentialMovingAverage::new(config.ema_fast)
                .map_err(|e| ta_error("fast EMA", e))?,
            ema_slow: ExponentialMovingAverage::new(config.ema_slow)
                .map_err(|e| ta_error("slow EMA", e))?,
            rsi: RelativeStrengthIndex::new(config.rsi).map_err(|e| ta_error("RSI", e))?,
            atr: AverageTrueRange::new(config.atr).map_err(|e| ta_error("ATR", e))?,
            adx: AverageDirectionalIndex::new(config.adx)?,
            bollinger: BollingerBands::new(config.bollinger_period, config.bollinger_std_dev)
                .map_err(|e| ta_error("Bollinger Bands", e))?,
            macd: MovingAverageConvergenceDivergence::new(
                config.macd_fast,
                config.macd_slow,
                config.macd_signal,
            )
            .map_err(|e| ta_error("MACD", e))?,
            atr_window: VecDeque::with_capacity(config.atr_mean_window),
            atr_sum: 0.0,
            bars_seen: 0,
            config,
        })
    }

    /// Build the snapshot for the last bar of a history.
    ///
    /// Returns `None` for an empty history.
    pub fn build(
        symbol: impl Into<String>,
        config: SnapshotConfig,
        bars: &[Bar],
    ) -> Result<Option<IndicatorSnapshot>, IndicatorError> {
        let mut builder = Self::new(symbol, config)?;
        let mut latest = None;
        for bar in bars {
            latest = Some(builder.push(bar)?);
        }
        Ok(latest)
    }

    /// Advance every indicator by one bar.
    pub fn push(&mut self, bar: &Bar) -> Result<IndicatorSnapshot, IndicatorError> {
        let item = to_data_item(bar)?;
        let close = bar.close;

        let ema_fast = self.ema_fast.next(close);
        let ema_slow = self.ema_slow.next(close);
        let rsi = self.rsi.next(close);
        let atr = self.atr.next(&item);
        let adx = self.adx.next(&item);
        let bands = self.bollinger.next(close);
        let macd = self.macd.next(close);

        if self.atr_window.len() == self.config.atr_mean_window {
            if let Some(oldest) = self.atr_window.pop_front() {
                self.atr_sum -= oldest;
            }
        }
        self.atr_window.push_back(atr);
        self.atr_sum += atr;
        let atr_mean = self.atr_sum / self.atr_window.len() as f64;

        self.bars_seen += 1;

        Ok(IndicatorSnapshot::new(&self.symbol, bar.timestamp, close, self.bars_seen)
            .with(names::EMA_FAST, ema_fast)
            .with(names::EMA_SLOW, ema_slow)
            .with(names::RSI, rsi)
            .with(names::ATR, atr)
            .with(names::ATR_MEAN, atr_mean)
            .with(names::ADX, adx)
            .with(names::BOLLINGER_UPPER, bands.upper)
            .with(names::BOLLINGER_MIDDLE, bands.average)
            .with(names::BOLLINGER_LOWER, bands.lower)
            .with(names::MACD, macd.macd)
            .with(names::MACD_SIGNAL, macd.signal)
            .with(names::MACD_HISTOGRAM, macd.histogram))
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars_seen(&self) -> usize {
        self.bars_seen
    }

    /// Whether every indicator has seen a full period.
    pub fn is_warmed_up(&self) -> bool {
        self.bars_seen >= self.config.warmup()
    }

    pub fn reset(&mut self) {
        self.ema_fast.reset();
        self.ema_slow.reset();
        self.rsi.reset();
        self.atr.reset();
        self.adx.reset();
        self.bollinger.reset();
        self.macd.reset();
        self.atr_window.clear();
        self.atr_sum = 0.0;
        self.bars_seen = 0;
    }
}

fn to_data_item(bar: &Bar) -> Result<DataItem, IndicatorError> {
    if !bar.is_well_formed() {
        return Err(IndicatorError::InvalidBar {
            timestamp: bar.timestamp,
            reason: "non-finite price or high below low".to_string(),
        });
    }
    DataItem::builder()
        .open(bar.open)
        .high(bar.high)
        .low(bar.low)
        .close(bar.close)
        .volume(bar.volume)
        .build()
        .map_err(|e| IndicatorError::InvalidBar {
            timestamp: bar.timestamp,
            reason: format!("{:?}", e),
        })
}
