//! In-process terminal for paper trading and backtesting.

use async_trait::async_trait;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};
use trading_core::error::BrokerError;
use trading_core::traits::Broker;
use trading_core::types::{
    AccountInfo, Bar, ClosedDeal, Direction, OpenPosition, OrderReceipt, OrderRequest, Quote,
    SymbolInfo, TerminalInfo,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaperTerminalConfig {
    pub initial_balance: Decimal,
    pub currency: String,
    /// Ask minus bid, in points
    pub spread_points: f64,
    pub login: u64,
}

impl Default for PaperTerminalConfig {
    fn default() -> Self {
        Self {
            initial_balance: dec!(10000),
            currency: "USD".to_string(),
            spread_points: 10.0,
            login: 0,
        }
    }
}

/// Symbol properties inferred from the name: JPY crosses quote 3 digits,
/// metals 2, everything else 5.
pub fn default_symbol_info(symbol: &str) -> SymbolInfo {
    let (point, digits) = if symbol.contains("JPY") {
        (0.001, 3)
    } else if symbol.starts_with("XAU") || symbol.starts_with("XAG") {
        (0.01, 2)
    } else {
        (0.00001, 5)
    };
    SymbolInfo {
        symbol: symbol.to_string(),
        point,
        digits,
        trade_tick_value: dec!(1),
        volume_min: dec!(0.01),
        volume_max: dec!(100),
        visible: true,
    }
}

#[derive(Debug, Clone)]
struct PaperPosition {
    ticket: u64,
    symbol: String,
    direction: Direction,
    volume: Decimal,
    open_price: f64,
    stop_loss: f64,
    take_profit: f64,
}

impl PaperPosition {
    fn to_open(&self) -> OpenPosition {
        OpenPosition {
            ticket: self.ticket,
            symbol: self.symbol.clone(),
            direction: self.direction,
            volume: self.volume.to_f64().unwrap_or(0.0),
            open_price: self.open_price,
            stop_loss: self.stop_loss,
            take_profit: self.take_profit,
        }
    }

    fn profit_at(&self, price: f64, info: &SymbolInfo) -> Decimal {
        let ticks = (price - self.open_price) * self.direction.sign() / info.point;
        let ticks = Decimal::from_f64(ticks).unwrap_or(Decimal::ZERO);
        (ticks * info.trade_tick_value * self.volume).round_dp(2)
    }

    /// Price at which this bar's range hits a protective level. The stop
    /// wins when both are inside one bar.
    fn exit_price(&self, bar: &Bar, spread: f64) -> Option<f64> {
        let hit = |level: f64, lo: f64, hi: f64| level > 0.0 && level >= lo && level <= hi;
        let (lo, hi) = match self.direction {
            Direction::Long => (bar.low, bar.high),
            Direction::Short => (bar.low + spread, bar.high + spread),
        };
        let stop_hit = match self.direction {
            Direction::Long => self.stop_loss > 0.0 && lo <= self.stop_loss,
            Direction::Short => self.stop_loss > 0.0 && hi >= self.stop_loss,
        };
        if stop_hit {
            return Some(self.stop_loss);
        }
        hit(self.take_profit, lo, hi).then_some(self.take_profit)
    }
}

#[derive(Debug, Default)]
struct TerminalState {
    connected: bool,
    balance: Decimal,
    next_ticket: u64,
    symbols: HashMap<String, SymbolInfo>,
    quotes: HashMap<String, Quote>,
    positions: Vec<PaperPosition>,
    history: Vec<ClosedDeal>,
}

impl TerminalState {
    fn info(&self, symbol: &str) -> Result<&SymbolInfo, BrokerError> {
        self.symbols
            .get(symbol)
            .ok_or_else(|| BrokerError::SymbolUnavailable(symbol.to_string()))
    }

    fn close(&mut self, index: usize, price: f64, closed_at: i64) -> ClosedDeal {
        let position = self.positions.remove(index);
        let profit = self
            .symbols
            .get(&position.symbol)
            .map(|info| position.profit_at(price, info))
            .unwrap_or(Decimal::ZERO);
        self.balance += profit;

        let deal = ClosedDeal {
            ticket: position.ticket,
            symbol: position.symbol,
            direction: position.direction,
            volume: position.volume,
            open_price: position.open_price,
            close_price: price,
            profit,
            closed_at,
        };
        self.history.push(deal.clone());
        deal
    }
}

/// Terminal simulated in memory.
///
/// Quotes come from the bars fed through [`Broker::on_bar`]: bid at the
/// close, ask a fixed spread above. Market deals fill at ask (buy) or bid
/// (sell) and are requoted when the requested price is further away than
/// the request's deviation.
pub struct PaperTerminal {
    config: PaperTerminalConfig,
    state: Mutex<TerminalState>,
}

impl PaperTerminal {
    pub fn new(config: PaperTerminalConfig) -> Self {
        let state = TerminalState {
            balance: config.initial_balance,
            next_ticket: 1,
            ..Default::default()
        };
        Self {
            config,
            state: Mutex::new(state),
        }
    }

    /// Register a symbol with explicit properties.
    pub fn with_symbol(self, info: SymbolInfo) -> Self {
        self.state().symbols.insert(info.symbol.clone(), info);
        self
    }

    fn state(&self) -> MutexGuard<'_, TerminalState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Set the quote directly.
    pub fn set_quote(&self, symbol: &str, bid: f64, timestamp: i64) {
        let mut state = self.state();
        let point = state
            .symbols
            .entry(symbol.to_string())
            .or_insert_with(|| default_symbol_info(symbol))
            .point;
        let ask = bid + self.config.spread_points * point;
        state.quotes.insert(
            symbol.to_string(),
            Quote {
                symbol: symbol.to_string(),
                bid,
                ask,
                last: bid,
                timestamp,
            },
        );
    }

    pub fn balance(&self) -> Decimal {
        self.state().balance
    }

    /// Balance plus floating profit at current quotes.
    pub fn equity(&self) -> Decimal {
        let state = self.state();
        let floating: Decimal = state
            .positions
            .iter()
            .filter_map(|p| {
                let quote = state.quotes.get(&p.symbol)?;
                let info = state.symbols.get(&p.symbol)?;
                let exit = match p.direction {
                    Direction::Long => quote.bid,
                    Direction::Short => quote.ask,
                };
                Some(p.profit_at(exit, info))
            })
            .sum();
        state.balance + floating
    }

    /// Deals closed so far, oldest first.
    pub fn history(&self) -> Vec<ClosedDeal> {
        self.state().history.clone()
    }

    /// Close every open position at the current quote.
    pub fn close_all(&self) -> Vec<ClosedDeal> {
        let mut state = self.state();
        let mut closed = Vec::new();
        while let Some(position) = state.positions.first().cloned() {
            let (price, timestamp) = match state.quotes.get(&position.symbol) {
                Some(q) => (
                    match position.direction {
                        Direction::Long => q.bid,
                        Direction::Short => q.ask,
                    },
                    q.timestamp,
                ),
                None => (position.open_price, 0),
            };
            closed.push(state.close(0, price, timestamp));
        }
        closed
    }
}

impl Default for PaperTerminal {
    fn default() -> Self {
        Self::new(PaperTerminalConfig::default())
    }
}

#[async_trait]
impl Broker for PaperTerminal {
    async fn connect(&self) -> Result<TerminalInfo, BrokerError> {
        self.state().connected = true;
        info!(balance = %self.config.initial_balance, "Paper terminal ready");
        Ok(TerminalInfo {
            company: "Paper Trading".to_string(),
            server: "paper".to_string(),
            connected: true,
        })
    }

    async fn shutdown(&self) -> Result<(), BrokerError> {
        self.state().connected = false;
        Ok(())
    }

    async fn ensure_symbol(&self, symbol: &str) -> Result<(), BrokerError> {
        let mut state = self.state();
        match state.symbols.get_mut(symbol) {
            Some(info) => {
                info.visible = true;
                Ok(())
            }
            None => Err(BrokerError::SymbolUnavailable(symbol.to_string())),
        }
    }

    async fn symbol_info(&self, symbol: &str) -> Result<SymbolInfo, BrokerError> {
        self.state().info(symbol).cloned()
    }

    async fn quote(&self, symbol: &str) -> Result<Quote, BrokerError> {
        self.state()
            .quotes
            .get(symbol)
            .cloned()
            .ok_or_else(|| BrokerError::NoQuote(symbol.to_string()))
    }

    async fn account(&self) -> Result<AccountInfo, BrokerError> {
        let balance = self.balance();
        Ok(AccountInfo {
            login: self.config.login,
            balance,
            equity: self.equity(),
            currency: self.config.currency.clone(),
        })
    }

    async fn send_order(&self, request: OrderRequest) -> Result<OrderReceipt, BrokerError> {
        let mut state = self.state();
        let point = state.info(&request.symbol)?.point;
        let quote = state
            .quotes
            .get(&request.symbol)
            .ok_or_else(|| BrokerError::NoQuote(request.symbol.clone()))?;
        let market = quote.entry_price(request.direction);

        if request.volume <= Decimal::ZERO {
            return Err(BrokerError::OrderRejected("Invalid volume".to_string()));
        }
        let slippage = ((market - request.price) / point).abs().round();
        if slippage > f64::from(request.deviation) {
            return Err(BrokerError::Requote {
                requested: request.price,
                market,
            });
        }

        let ticket = state.next_ticket;
        state.next_ticket += 1;
        state.positions.push(PaperPosition {
            ticket,
            symbol: request.symbol.clone(),
            direction: request.direction,
            volume: request.volume,
            open_price: market,
            stop_loss: request.stop_loss,
            take_profit: request.take_profit,
        });
        debug!(ticket, symbol = %request.symbol, price = market, "Paper deal filled");

        Ok(OrderReceipt {
            ticket,
            symbol: request.symbol,
            direction: request.direction,
            volume: request.volume,
            price: market,
            stop_loss: request.stop_loss,
            take_profit: request.take_profit,
        })
    }

    async fn modify_position(
        &self,
        ticket: u64,
        stop_loss: f64,
        take_profit: f64,
    ) -> Result<(), BrokerError> {
        let mut state = self.state();
        let position = state
            .positions
            .iter_mut()
            .find(|p| p.ticket == ticket)
            .ok_or(BrokerError::PositionNotFound(ticket))?;
        position.stop_loss = stop_loss;
        position.take_profit = take_profit;
        Ok(())
    }

    async fn positions(&self, symbol: Option<&str>) -> Result<Vec<OpenPosition>, BrokerError> {
        Ok(self
            .state()
            .positions
            .iter()
            .filter(|p| symbol.map_or(true, |s| p.symbol == s))
            .map(PaperPosition::to_open)
            .collect())
    }

    async fn on_bar(&self, symbol: &str, bar: &Bar) -> Result<Vec<ClosedDeal>, BrokerError> {
        self.set_quote(symbol, bar.close, bar.timestamp);

        let mut state = self.state();
        let spread = self.config.spread_points * state.info(symbol)?.point;
        let mut closed = Vec::new();
        let mut i = 0;
        while i < state.positions.len() {
            let position = &state.positions[i];
            let exit = if position.symbol == symbol {
                position.exit_price(bar, spread)
            } else {
                None
            };
            match exit {
                Some(price) => closed.push(state.close(i, price, bar.timestamp)),
                None => i += 1,
            }
        }
        Ok(closed)
    }

    fn name(&self) -> &str {
        "Paper Terminal"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terminal() -> PaperTerminal {
        let t = PaperTerminal::default();
        t.set_quote("EURUSD", 1.10500, 1);
        t
    }

    fn bar(low: f64, high: f64, close: f64) -> Bar {
        Bar::new(2, close, high, low, close, 100.0)
    }

    #[tokio::test]
    async fn test_buy_fills_at_ask() {
        let t = terminal();
        let request = OrderRequest::market("EURUSD", Direction::Long, dec!(0.5), 1.10510)
            .with_levels(1.10300, 1.10800);
        let receipt = t.send_order(request).await.unwrap();

        assert_eq!(receipt.ticket, 1);
        assert!((receipt.price - 1.10510).abs() < 1e-9);

        let positions = t.positions(Some("EURUSD")).await.unwrap();
        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].volume, 0.5);
        assert!(t.positions(Some("USDJPY")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_requote_beyond_deviation() {
        let t = terminal();
        let request = OrderRequest::market("EURUSD", Direction::Short, dec!(0.1), 1.10600);
        let err = t.send_order(request).await.unwrap_err();
        assert!(matches!(err, BrokerError::Requote { .. }));
    }

    #[tokio::test]
    async fn test_unknown_symbol() {
        let t = terminal();
        assert!(t.ensure_symbol("EURUSD").await.is_ok());
        assert!(matches!(
            t.ensure_symbol("GBPNZD").await,
            Err(BrokerError::SymbolUnavailable(_))
        ));
        assert!(matches!(t.quote("GBPNZD").await, Err(BrokerError::NoQuote(_))));
    }

    #[tokio::test]
    async fn test_take_profit_settles_on_bar() {
        let t = terminal();
        let request = OrderRequest::market("EURUSD", Direction::Long, dec!(1), 1.10510)
            .with_levels(1.10300, 1.10710);
        t.send_order(request).await.unwrap();

        let closed = t.on_bar("EURUSD", &bar(1.10450, 1.10750, 1.10700)).await.unwrap();

        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].close_price, 1.10710);
        // 200 points at 1 USD per point per lot
        assert_eq!(closed[0].profit, dec!(200));
        assert_eq!(t.balance(), dec!(10200));
        assert!(t.positions(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stop_wins_inside_one_bar() {
        let t = terminal();
        let request = OrderRequest::market("EURUSD", Direction::Long, dec!(0.1), 1.10510)
            .with_levels(1.10410, 1.10610);
        t.send_order(request).await.unwrap();

        let closed = t.on_bar("EURUSD", &bar(1.10400, 1.10700, 1.10500)).await.unwrap();
        assert_eq!(closed[0].close_price, 1.10410);
        assert_eq!(closed[0].profit, dec!(-10));
    }

    #[tokio::test]
    async fn test_modify_and_close_all() {
        let t = terminal();
        let receipt = t
            .send_order(OrderRequest::market("EURUSD", Direction::Short, dec!(0.1), 1.10500))
            .await
            .unwrap();

        t.modify_position(receipt.ticket, 1.10700, 1.10200).await.unwrap();
        let pos = t.position("EURUSD").await.unwrap().unwrap();
        assert_eq!(pos.stop_loss, 1.10700);
        assert!(matches!(
            t.modify_position(99, 1.0, 1.0).await,
            Err(BrokerError::PositionNotFound(99))
        ));

        let closed = t.close_all();
        assert_eq!(closed.len(), 1);
        // Short closes at the ask: one spread of loss
        assert_eq!(closed[0].profit, dec!(-1));
        assert_eq!(t.history().len(), 1);
    }

    #[tokio::test]
    async fn test_equity_tracks_floating_profit() {
        let t = terminal();
        t.send_order(OrderRequest::market("EURUSD", Direction::Long, dec!(1), 1.10510))
            .await
            .unwrap();
        t.set_quote("EURUSD", 1.10610, 3);

        let account = t.account().await.unwrap();
        assert_eq!(account.balance, dec!(10000));
        assert_eq!(account.equity, dec!(10100));
    }
}
