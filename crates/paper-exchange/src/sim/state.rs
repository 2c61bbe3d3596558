//! 가상 계정 + 대기 주문 상태와 직렬화 저장소.
//!
//! `SimState`가 시뮬레이션의 유일한 진실 공급원입니다. 모든 읽기와 쓰기는
//! `StateCell`을 통해 직렬화되며, 상태 전이는 순수 변환 함수를 원자적으로
//! 적용하는 방식으로만 일어납니다.

use chrono::Utc;
use paper_core::{Amount, Balances, OpenOrder, Price, Quantity, Side};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

/// 대기 중인 지정가 주문.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingLimitOrder {
    /// 주문 ID
    pub id: String,
    /// 주문 방향
    pub side: Side,
    /// 접수 시각 (밀리초 epoch)
    pub timestamp_ms: i64,
    /// 주문 수량 (상품 단위)
    pub volume: Quantity,
    /// 단위 가격
    pub unit_price: Price,
}

impl PendingLimitOrder {
    /// 접수 시 예약되는 금액을 반환합니다.
    ///
    /// BID는 통화(`volume * unit_price`), ASK는 상품(`volume`)을 예약합니다.
    pub fn reserved(&self) -> Amount {
        match self.side {
            Side::Bid => self.volume * self.unit_price,
            Side::Ask => self.volume,
        }
    }

    /// 공개 뷰로 변환합니다.
    pub fn to_open_order(&self) -> OpenOrder {
        OpenOrder {
            id: self.id.clone(),
            side: self.side,
            timestamp_ms: self.timestamp_ms,
            volume: self.volume,
            unit_price: self.unit_price,
        }
    }
}

/// 대기 중인 시장가 주문.
///
/// BID는 지출할 통화 금액, ASK는 매도할 상품 수량을 `amount`로 가집니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingMarketOrder {
    /// 주문 ID
    pub id: String,
    /// 주문 방향
    pub side: Side,
    /// 접수 시각 (밀리초 epoch)
    pub timestamp_ms: i64,
    /// 주문 금액 (BID: 통화, ASK: 상품)
    pub amount: Amount,
}

/// 시뮬레이션 상태.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimState {
    /// 주문 ID 카운터 (벽시계 초로 시드)
    id_gen: u64,
    /// 마지막 매칭 사이클의 워터마크 (밀리초 epoch)
    pub updated_utc_ms: i64,
    /// 통화 잔고
    pub currency_balance: Amount,
    /// 상품 잔고
    pub commodity_balance: Quantity,
    /// 대기 중인 지정가 주문
    pub pending_limit_orders: Vec<PendingLimitOrder>,
    /// 대기 중인 시장가 주문
    pub pending_market_orders: Vec<PendingMarketOrder>,
}

impl SimState {
    /// 초기 잔고로 새 상태를 생성합니다.
    pub fn new(currency_balance: Amount, commodity_balance: Quantity) -> Self {
        let now = Utc::now();
        Self {
            id_gen: now.timestamp() as u64,
            updated_utc_ms: now.timestamp_millis(),
            currency_balance,
            commodity_balance,
            pending_limit_orders: Vec::new(),
            pending_market_orders: Vec::new(),
        }
    }

    /// 다음 주문 ID를 생성합니다.
    ///
    /// 카운터를 증가시킨 뒤 십진 문자열로 렌더링합니다. 한 프로세스
    /// 수명 내에서 정수로 해석했을 때 엄격히 증가합니다.
    pub fn next_id(&mut self) -> String {
        self.id_gen += 1;
        self.id_gen.to_string()
    }

    /// 현재 잔고를 반환합니다.
    pub fn balances(&self) -> Balances {
        Balances::new(self.currency_balance, self.commodity_balance)
    }

    /// 대기 중인 주문이 하나라도 있는지 확인합니다.
    pub fn has_pending_orders(&self) -> bool {
        !self.pending_limit_orders.is_empty() || !self.pending_market_orders.is_empty()
    }

    /// 지정가 주문을 추가합니다.
    ///
    /// 예약할 쪽의 잔고가 충분하면 차감 후 주문을 추가하고 `true`를
    /// 반환합니다. 부족하면 상태를 바꾸지 않고 `false`를 반환합니다.
    pub fn add_limit_order(&mut self, order: PendingLimitOrder) -> bool {
        let reserved = order.reserved();
        match order.side {
            Side::Bid => {
                if self.currency_balance < reserved {
                    return false;
                }
                self.currency_balance -= reserved;
            }
            Side::Ask => {
                if self.commodity_balance < reserved {
                    return false;
                }
                self.commodity_balance -= reserved;
            }
        }
        self.pending_limit_orders.push(order);
        true
    }

    /// 시장가 주문을 추가합니다. 예약 정책은 지정가와 동일하며 예약액은
    /// `order.amount`입니다.
    pub fn add_market_order(&mut self, order: PendingMarketOrder) -> bool {
        match order.side {
            Side::Bid => {
                if self.currency_balance < order.amount {
                    return false;
                }
                self.currency_balance -= order.amount;
            }
            Side::Ask => {
                if self.commodity_balance < order.amount {
                    return false;
                }
                self.commodity_balance -= order.amount;
            }
        }
        self.pending_market_orders.push(order);
        true
    }

    /// 지정가 주문을 취소하고 예약액을 환불합니다.
    ///
    /// 해당 ID가 없으면 아무것도 하지 않습니다. 시장가 주문은 취소
    /// 대상이 아닙니다.
    pub fn cancel_limit_order(&mut self, order_id: &str) {
        if let Some(pos) = self
            .pending_limit_orders
            .iter()
            .position(|o| o.id == order_id)
        {
            let order = self.pending_limit_orders.remove(pos);
            match order.side {
                Side::Bid => self.currency_balance += order.reserved(),
                Side::Ask => self.commodity_balance += order.reserved(),
            }
        }
    }
}

/// 상태를 직렬화하는 저장소.
///
/// 모든 전이는 순수 변환 함수를 쓰기 락 아래에서 단일 스왑으로 적용하므로
/// 부분 적용된 상태는 관찰될 수 없습니다. 변환 함수는 저장소를 다시
/// 호출해서는 안 됩니다.
#[derive(Clone)]
pub struct StateCell {
    inner: Arc<RwLock<SimState>>,
}

impl StateCell {
    /// 초기 상태로 저장소를 생성합니다.
    pub fn new(state: SimState) -> Self {
        Self {
            inner: Arc::new(RwLock::new(state)),
        }
    }

    /// 현재 상태의 스냅샷을 반환합니다.
    pub async fn snapshot(&self) -> SimState {
        self.inner.read().await.clone()
    }

    /// 변환 함수를 원자적으로 적용합니다.
    pub async fn commit<F>(&self, f: F)
    where
        F: FnOnce(SimState) -> SimState,
    {
        let mut guard = self.inner.write().await;
        *guard = f(guard.clone());
    }

    /// 변환 함수를 원자적으로 적용하고 부수 결과를 반환합니다.
    pub async fn commit_with<T, F>(&self, f: F) -> T
    where
        F: FnOnce(SimState) -> (T, SimState),
    {
        let mut guard = self.inner.write().await;
        let (result, next) = f(guard.clone());
        *guard = next;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn limit(id: &str, side: Side, volume: Quantity, unit_price: Price) -> PendingLimitOrder {
        PendingLimitOrder {
            id: id.to_string(),
            side,
            timestamp_ms: 0,
            volume,
            unit_price,
        }
    }

    #[test]
    fn test_next_id_monotonic() {
        let mut state = SimState::new(dec!(0), dec!(0));
        let a: u64 = state.next_id().parse().unwrap();
        let b: u64 = state.next_id().parse().unwrap();
        let c: u64 = state.next_id().parse().unwrap();
        assert!(a < b && b < c);
    }

    #[test]
    fn test_add_limit_bid_reserves_currency() {
        let mut state = SimState::new(dec!(1000), dec!(0));
        assert!(state.add_limit_order(limit("1", Side::Bid, dec!(5), dec!(12))));

        assert_eq!(state.currency_balance, dec!(940));
        assert_eq!(state.commodity_balance, dec!(0));
        assert_eq!(state.pending_limit_orders.len(), 1);
    }

    #[test]
    fn test_add_limit_ask_reserves_commodity() {
        let mut state = SimState::new(dec!(0), dec!(10));
        assert!(state.add_limit_order(limit("1", Side::Ask, dec!(10), dec!(9))));

        assert_eq!(state.currency_balance, dec!(0));
        assert_eq!(state.commodity_balance, dec!(0));
    }

    #[test]
    fn test_add_limit_insufficient_balance() {
        let mut state = SimState::new(dec!(10), dec!(0));
        let before = state.clone();

        // 2 * 10 = 20 필요, 잔고 10
        assert!(!state.add_limit_order(limit("1", Side::Bid, dec!(2), dec!(10))));
        assert_eq!(state, before);
    }

    #[test]
    fn test_add_market_order_reserves_amount() {
        let mut state = SimState::new(dec!(100), dec!(5));

        assert!(state.add_market_order(PendingMarketOrder {
            id: "1".into(),
            side: Side::Bid,
            timestamp_ms: 0,
            amount: dec!(100),
        }));
        assert_eq!(state.currency_balance, dec!(0));

        assert!(state.add_market_order(PendingMarketOrder {
            id: "2".into(),
            side: Side::Ask,
            timestamp_ms: 0,
            amount: dec!(5),
        }));
        assert_eq!(state.commodity_balance, dec!(0));
    }

    #[test]
    fn test_cancel_refunds_reservation() {
        let mut state = SimState::new(dec!(1000), dec!(0));
        state.add_limit_order(limit("7", Side::Bid, dec!(5), dec!(12)));
        assert_eq!(state.currency_balance, dec!(940));

        state.cancel_limit_order("7");
        assert_eq!(state.currency_balance, dec!(1000));
        assert!(state.pending_limit_orders.is_empty());
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let mut state = SimState::new(dec!(1000), dec!(0));
        state.add_limit_order(limit("7", Side::Bid, dec!(5), dec!(12)));

        state.cancel_limit_order("7");
        state.cancel_limit_order("7");
        assert_eq!(state.currency_balance, dec!(1000));

        // 존재하지 않는 ID도 조용히 무시
        state.cancel_limit_order("999");
        assert_eq!(state.currency_balance, dec!(1000));
    }

    #[tokio::test]
    async fn test_state_cell_commit_with() {
        let cell = StateCell::new(SimState::new(dec!(100), dec!(0)));

        let id = cell
            .commit_with(|mut s| {
                let id = s.next_id();
                (id, s)
            })
            .await;

        assert!(!id.is_empty());
        let snapshot = cell.snapshot().await;
        assert_eq!(snapshot.currency_balance, dec!(100));
    }
}
