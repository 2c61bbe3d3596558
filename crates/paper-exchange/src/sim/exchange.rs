//! 클라이언트에 노출되는 시뮬레이션 거래소 파사드.

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use paper_core::{
    Amount, Balances, Kline, OpenOrder, OrderBook, Price, Quantity, Side, Ticker, Timeframe, Trade,
};

use super::runner;
use super::state::{PendingLimitOrder, PendingMarketOrder, SimState, StateCell};
use crate::error::{ExchangeError, ExchangeResult};
use crate::traits::{
    BookSource, CandleSource, MarketDataSource, SpotTrading, TickerSource, TradeHistorySource,
};

/// 시뮬레이션 거래소 설정.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperConfig {
    /// 매칭 사이클 사이의 대기 시간 (밀리초)
    pub cycle_delay_ms: u64,
    /// 초기 통화 잔고
    pub currency_balance: Amount,
    /// 초기 상품 잔고
    pub commodity_balance: Quantity,
}

impl Default for PaperConfig {
    fn default() -> Self {
        Self {
            cycle_delay_ms: 1_000,
            currency_balance: dec!(10000),
            commodity_balance: dec!(0),
        }
    }
}

impl PaperConfig {
    /// 매칭 사이클 대기 시간을 설정합니다.
    pub fn with_cycle_delay_ms(mut self, delay_ms: u64) -> Self {
        self.cycle_delay_ms = delay_ms;
        self
    }

    /// 초기 통화 잔고를 설정합니다.
    pub fn with_currency_balance(mut self, balance: Amount) -> Self {
        self.currency_balance = balance;
        self
    }

    /// 초기 상품 잔고를 설정합니다.
    pub fn with_commodity_balance(mut self, balance: Quantity) -> Self {
        self.commodity_balance = balance;
        self
    }
}

/// 실거래소를 래핑하는 시뮬레이션 거래소.
///
/// 생성 시 백그라운드 매칭 워커가 시작되고, `shutdown` 또는 drop 시
/// 중지됩니다. 시장 데이터 조회는 래핑된 거래소로 위임되며, 주문 작업은
/// 가상 잔고에 대해 시뮬레이션됩니다.
pub struct PaperExchange<E> {
    upstream: Arc<E>,
    state: StateCell,
    runner: JoinHandle<()>,
}

impl<E> PaperExchange<E>
where
    E: MarketDataSource + 'static,
{
    /// 새 시뮬레이션 거래소를 생성하고 매칭 워커를 시작합니다.
    ///
    /// tokio 런타임 안에서 호출해야 합니다.
    pub fn new(config: PaperConfig, upstream: E) -> Self {
        let state = StateCell::new(SimState::new(
            config.currency_balance,
            config.commodity_balance,
        ));
        let upstream = Arc::new(upstream);
        let runner = runner::spawn(
            Arc::clone(&upstream),
            state.clone(),
            Duration::from_millis(config.cycle_delay_ms),
        );

        info!(
            cycle_delay_ms = config.cycle_delay_ms,
            currency = %config.currency_balance,
            commodity = %config.commodity_balance,
            "Paper exchange started"
        );

        Self {
            upstream,
            state,
            runner,
        }
    }

    /// 매칭 워커를 중지합니다.
    ///
    /// 즉시 반환됩니다. 진행 중이던 거래소 요청은 백그라운드에서 끝날 수
    /// 있지만 그 결과가 상태를 바꾸는 일은 없습니다.
    pub fn shutdown(&self) {
        self.runner.abort();
    }
}

impl<E> Drop for PaperExchange<E> {
    fn drop(&mut self) {
        self.runner.abort();
    }
}

/// 주문 입력값이 양수인지 검증합니다.
fn ensure_positive(value: Decimal, what: &str) -> ExchangeResult<()> {
    if value <= Decimal::ZERO {
        return Err(ExchangeError::InvalidQuantity(format!(
            "{} must be positive, got {}",
            what, value
        )));
    }
    Ok(())
}

#[async_trait]
impl<E: Send + Sync> SpotTrading for PaperExchange<E> {
    async fn balances(&self) -> ExchangeResult<Balances> {
        Ok(self.state.snapshot().await.balances())
    }

    async fn open_orders(&self) -> ExchangeResult<Vec<OpenOrder>> {
        let snapshot = self.state.snapshot().await;
        Ok(snapshot
            .pending_limit_orders
            .iter()
            .map(PendingLimitOrder::to_open_order)
            .collect())
    }

    async fn place_limit_order(
        &self,
        side: Side,
        volume: Quantity,
        unit_price: Price,
    ) -> ExchangeResult<String> {
        ensure_positive(volume, "volume")?;
        ensure_positive(unit_price, "unit price")?;

        let timestamp_ms = Utc::now().timestamp_millis();
        let (id, accepted) = self
            .state
            .commit_with(move |mut s| {
                let id = s.next_id();
                let accepted = s.add_limit_order(PendingLimitOrder {
                    id: id.clone(),
                    side,
                    timestamp_ms,
                    volume,
                    unit_price,
                });
                ((id, accepted), s)
            })
            .await;

        if accepted {
            debug!(order_id = %id, %side, %volume, %unit_price, "limit order accepted");
            Ok(id)
        } else {
            Err(ExchangeError::InsufficientBalance(format!(
                "limit {} volume={} unit_price={}",
                side, volume, unit_price
            )))
        }
    }

    async fn place_market_order(&self, side: Side, amount: Amount) -> ExchangeResult<String> {
        ensure_positive(amount, "amount")?;

        let timestamp_ms = Utc::now().timestamp_millis();
        let (id, accepted) = self
            .state
            .commit_with(move |mut s| {
                let id = s.next_id();
                let accepted = s.add_market_order(PendingMarketOrder {
                    id: id.clone(),
                    side,
                    timestamp_ms,
                    amount,
                });
                ((id, accepted), s)
            })
            .await;

        if accepted {
            debug!(order_id = %id, %side, %amount, "market order accepted");
            Ok(id)
        } else {
            Err(ExchangeError::InsufficientBalance(format!(
                "market {} amount={}",
                side, amount
            )))
        }
    }

    async fn cancel_order(&self, order_id: &str) -> ExchangeResult<()> {
        let order_id = order_id.to_string();
        self.state
            .commit(move |mut s| {
                s.cancel_limit_order(&order_id);
                s
            })
            .await;
        Ok(())
    }
}

#[async_trait]
impl<E: TickerSource> TickerSource for PaperExchange<E> {
    async fn ticker(&self) -> ExchangeResult<Ticker> {
        self.upstream.ticker().await
    }
}

#[async_trait]
impl<E: CandleSource> CandleSource for PaperExchange<E> {
    async fn candles(&self, timeframe: Timeframe) -> ExchangeResult<Vec<Kline>> {
        self.upstream.candles(timeframe).await
    }
}

#[async_trait]
impl<E: BookSource> BookSource for PaperExchange<E> {
    async fn order_book(&self) -> ExchangeResult<OrderBook> {
        self.upstream.order_book().await
    }
}

#[async_trait]
impl<E: TradeHistorySource> TradeHistorySource for PaperExchange<E> {
    async fn trade_history(&self) -> ExchangeResult<Vec<Trade>> {
        self.upstream.trade_history().await
    }
}
