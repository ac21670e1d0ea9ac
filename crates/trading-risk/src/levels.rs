//! ATR-based protective levels.

use trading_core::Direction;

/// Stop-loss and take-profit at `multiplier × atr` either side of `price`.
///
/// Long positions get the stop below and the target above; short
/// positions the mirror image.
///
/// # Returns
/// `(stop_loss, take_profit)`
pub fn protective_levels(price: f64, atr: f64, multiplier: f64, direction: Direction) -> (f64, f64) {
    let distance = multiplier * atr;
    match direction {
        Direction::Long => (price - distance, price + distance),
        Direction::Short => (price + distance, price - distance),
    }
}

/// Reward over risk, or `None` when the stop sits on the price.
pub fn risk_reward(price: f64, stop_loss: f64, take_profit: f64) -> Option<f64> {
    let risk = (price - stop_loss).abs();
    let reward = (take_profit - price).abs();
    (risk > 0.0).then(|| reward / risk)
}
