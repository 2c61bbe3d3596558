//! 시장 데이터 타입 및 구조체.
//!
//! 이 모듈은 래핑된 거래소로부터 수신하는 시장 데이터 타입을 정의합니다:
//! - `OrderBook` - 호가창 스냅샷
//! - `Trade` - 체결 이력 항목
//! - `Ticker` - 실시간 시세
//! - `Kline` - OHLCV 캔들
//!
//! 거래소 핸들은 이미 하나의 거래쌍에 바인딩되어 있으므로 심볼 필드는
//! 없습니다.

use crate::domain::order::Side;
use crate::types::{Price, Quantity, Timeframe};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 호가창의 가격 레벨.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBookEntry {
    /// 가격
    pub price: Price,
    /// 물량
    pub volume: Quantity,
}

impl OrderBookEntry {
    /// 새 호가 레벨을 생성합니다.
    pub fn new(price: Price, volume: Quantity) -> Self {
        Self { price, volume }
    }

    /// 이 레벨 전체를 소진하는 데 드는 금액을 반환합니다.
    pub fn notional(&self) -> Decimal {
        self.price * self.volume
    }
}

/// 호가창 스냅샷.
///
/// 수신 시점의 레벨 순서는 보장되지 않습니다. 정렬이 필요한 알고리즘은
/// 스스로 정렬해야 합니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBook {
    /// 매수 호가
    pub bids: Vec<OrderBookEntry>,
    /// 매도 호가
    pub asks: Vec<OrderBookEntry>,
}

impl OrderBook {
    /// 새 호가창을 생성합니다.
    pub fn new(bids: Vec<OrderBookEntry>, asks: Vec<OrderBookEntry>) -> Self {
        Self { bids, asks }
    }

    /// 최우선 매수 호가를 반환합니다. 레벨 순서를 가정하지 않습니다.
    pub fn best_bid(&self) -> Option<Price> {
        self.bids.iter().map(|l| l.price).max()
    }

    /// 최우선 매도 호가를 반환합니다. 레벨 순서를 가정하지 않습니다.
    pub fn best_ask(&self) -> Option<Price> {
        self.asks.iter().map(|l| l.price).min()
    }

    /// 중간 가격을 반환합니다.
    pub fn mid_price(&self) -> Option<Price> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some((bid + ask) / Decimal::from(2)),
            _ => None,
        }
    }

    /// 매수 호가의 총 물량을 반환합니다.
    pub fn total_bid_volume(&self) -> Quantity {
        self.bids.iter().map(|l| l.volume).sum()
    }

    /// 매도 호가의 총 물량을 반환합니다.
    pub fn total_ask_volume(&self) -> Quantity {
        self.asks.iter().map(|l| l.volume).sum()
    }

    /// 양쪽 호가가 모두 비어 있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }
}

/// 체결 이력 항목.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    /// 체결 시각 (밀리초 epoch, 거래소에 따라 없을 수 있음)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp_ms: Option<i64>,
    /// 체결 방향 (BID = 매수 주도, ASK = 매도 주도)
    pub side: Side,
    /// 단위 체결 가격
    pub unit_price: Price,
    /// 체결 물량
    pub volume: Quantity,
}

/// 실시간 시세.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticker {
    /// 최근 체결가
    pub last: Price,
    /// 최우선 매수 호가
    pub bid: Price,
    /// 최우선 매도 호가
    pub ask: Price,
    /// 24시간 최고가
    pub high_24h: Price,
    /// 24시간 최저가
    pub low_24h: Price,
    /// 24시간 거래량
    pub volume_24h: Quantity,
    /// 타임스탬프
    pub timestamp: DateTime<Utc>,
}

impl Ticker {
    /// 매수/매도 스프레드를 반환합니다.
    pub fn spread(&self) -> Decimal {
        self.ask - self.bid
    }

    /// 중간 가격을 반환합니다.
    pub fn mid_price(&self) -> Decimal {
        (self.bid + self.ask) / Decimal::from(2)
    }
}

/// OHLCV 캔들.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Kline {
    /// 타임프레임
    pub timeframe: Timeframe,
    /// 캔들 시작 시간
    pub open_time: DateTime<Utc>,
    /// 캔들 종료 시간
    pub close_time: DateTime<Utc>,
    /// 시가
    pub open: Price,
    /// 고가
    pub high: Price,
    /// 저가
    pub low: Price,
    /// 종가
    pub close: Price,
    /// 거래량 (상품 단위)
    pub volume: Quantity,
}

impl Kline {
    /// 캔들 범위(고가 - 저가)를 반환합니다.
    pub fn range(&self) -> Decimal {
        self.high - self.low
    }

    /// 양봉(종가 > 시가)인지 확인합니다.
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }
}
