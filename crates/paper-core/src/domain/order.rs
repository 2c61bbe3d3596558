//! 주문 방향, 미체결 주문 뷰, 잔고 타입.

use crate::types::{Amount, Price, Quantity};
use serde::{Deserialize, Serialize};

/// 주문 방향 (상품 매수 / 상품 매도).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// 매수 (통화로 상품을 삼)
    Bid,
    /// 매도 (상품을 통화로 팖)
    Ask,
}

impl Side {
    /// 반대 방향을 반환합니다.
    pub fn opposite(&self) -> Self {
        match self {
            Side::Bid => Side::Ask,
            Side::Ask => Side::Bid,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Bid => write!(f, "BID"),
            Side::Ask => write!(f, "ASK"),
        }
    }
}

/// 대기 중인 지정가 주문의 공개 뷰.
///
/// 미체결 주문 목록 조회 시 반환됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenOrder {
    /// 주문 ID
    pub id: String,
    /// 주문 방향
    pub side: Side,
    /// 접수 시각 (밀리초 epoch)
    pub timestamp_ms: i64,
    /// 주문 수량 (상품 단위)
    pub volume: Quantity,
    /// 단위 가격 (상품 1단위당 통화)
    pub unit_price: Price,
}

/// 가상 계정의 잔고.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balances {
    /// 통화 잔고
    pub currency: Amount,
    /// 상품 잔고
    pub commodity: Quantity,
}

impl Balances {
    /// 새 잔고를 생성합니다.
    pub fn new(currency: Amount, commodity: Quantity) -> Self {
        Self {
            currency,
            commodity,
        }
    }
}

impl std::fmt::Display for Balances {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "currency={} commodity={}",
            self.currency, self.commodity
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_side_opposite() {
        assert_eq!(Side::Bid.opposite(), Side::Ask);
        assert_eq!(Side::Ask.opposite(), Side::Bid);
    }

    #[test]
    fn test_side_display() {
        assert_eq!(Side::Bid.to_string(), "BID");
        assert_eq!(Side::Ask.to_string(), "ASK");
    }

    #[test]
    fn test_balances_display() {
        let b = Balances::new(dec!(1000), dec!(0.5));
        assert_eq!(b.to_string(), "currency=1000 commodity=0.5");
    }
}
