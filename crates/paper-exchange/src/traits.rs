//! 거래소 능력(capability) trait 정의.
//!
//! 하나의 거래쌍에 바인딩된 거래소 핸들이 제공할 수 있는 작업을 능력
//! 단위로 나눕니다. `PaperExchange`는 래핑된 거래소가 구현한 읽기 능력을
//! 그대로 위임하고, `SpotTrading`만 시뮬레이션으로 대체합니다.

use async_trait::async_trait;
use paper_core::{
    Amount, Balances, Kline, OpenOrder, OrderBook, Price, Quantity, Side, Ticker, Timeframe, Trade,
};

use crate::ExchangeResult;

/// 현재 시세 조회 능력.
#[async_trait]
pub trait TickerSource: Send + Sync {
    /// 현재 시세를 조회합니다.
    async fn ticker(&self) -> ExchangeResult<Ticker>;
}

/// 캔들 조회 능력.
#[async_trait]
pub trait CandleSource: Send + Sync {
    /// 주어진 타임프레임의 캔들을 조회합니다.
    async fn candles(&self, timeframe: Timeframe) -> ExchangeResult<Vec<Kline>>;
}

/// 호가창 조회 능력.
#[async_trait]
pub trait BookSource: Send + Sync {
    /// 현재 호가창 스냅샷을 조회합니다.
    async fn order_book(&self) -> ExchangeResult<OrderBook>;
}

/// 체결 이력 조회 능력.
#[async_trait]
pub trait TradeHistorySource: Send + Sync {
    /// 최근 체결 이력을 조회합니다.
    async fn trade_history(&self) -> ExchangeResult<Vec<Trade>>;
}

/// 매칭 루프가 소비하는 시장 데이터 능력 묶음.
pub trait MarketDataSource: BookSource + TradeHistorySource {}

impl<T: BookSource + TradeHistorySource> MarketDataSource for T {}

/// 현물 주문 능력.
#[async_trait]
pub trait SpotTrading: Send + Sync {
    /// 현재 잔고를 조회합니다.
    async fn balances(&self) -> ExchangeResult<Balances>;

    /// 미체결 지정가 주문을 조회합니다.
    async fn open_orders(&self) -> ExchangeResult<Vec<OpenOrder>>;

    /// 지정가 주문을 접수하고 주문 ID를 반환합니다.
    ///
    /// # Errors
    /// 예약할 잔고가 부족하면 `ExchangeError::InsufficientBalance`를
    /// 반환합니다.
    async fn place_limit_order(
        &self,
        side: Side,
        volume: Quantity,
        unit_price: Price,
    ) -> ExchangeResult<String>;

    /// 시장가 주문을 접수하고 주문 ID를 반환합니다.
    ///
    /// BID는 `amount`만큼의 통화를 지출하고, ASK는 `amount`만큼의 상품을
    /// 매도합니다.
    ///
    /// # Errors
    /// 예약할 잔고가 부족하면 `ExchangeError::InsufficientBalance`를
    /// 반환합니다.
    async fn place_market_order(&self, side: Side, amount: Amount) -> ExchangeResult<String>;

    /// 지정가 주문을 취소합니다.
    ///
    /// 알 수 없는 ID는 조용히 무시됩니다. 시장가 주문은 취소할 수 없습니다.
    async fn cancel_order(&self, order_id: &str) -> ExchangeResult<()>;
}
