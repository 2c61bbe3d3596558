//! 매칭 사이클.
//!
//! 호가창 스냅샷과 최근 체결 이력을 받아 대기 중인 주문 전부의 체결을
//! 시도하는 순수 상태 변환입니다. 체결 상대는 관찰된 실거래소 호가창
//! 뿐이며, 부분 체결은 없습니다 - 주문은 스냅샷에 대해 전량 체결되거나
//! 그대로 남습니다.

use paper_core::{OrderBook, OrderBookEntry, Side, Trade};

use super::book;
use super::state::SimState;

/// 이번 사이클의 워터마크를 계산합니다.
///
/// `max(마지막 워터마크, min(가장 오래된 지정가 접수 시각, 가장 오래된
/// 시장가 접수 시각))`. 빈 목록의 "가장 오래된" 값은 마지막 워터마크로
/// 대신합니다.
fn cycle_watermark(state: &SimState) -> i64 {
    let earliest_limit = state
        .pending_limit_orders
        .iter()
        .map(|o| o.timestamp_ms)
        .min()
        .unwrap_or(state.updated_utc_ms);
    let earliest_market = state
        .pending_market_orders
        .iter()
        .map(|o| o.timestamp_ms)
        .min()
        .unwrap_or(state.updated_utc_ms);

    state.updated_utc_ms.max(earliest_limit.min(earliest_market))
}

/// 워터마크 이후의 체결을 합성 호가로 덧붙인 유효 호가창을 만듭니다.
///
/// 워터마크 이후 가격 P에 물량 V가 체결되었다는 것은 그 레벨에 상대방의
/// 의사가 있었다는 뜻이므로, 이번 사이클에서 추가로 사용할 수 있는
/// 깊이로 취급합니다. 타임스탬프가 없는 체결은 워터마크 필터를 통과할
/// 수 없으므로 제외됩니다.
fn effective_book(book: &OrderBook, trades: &[Trade], watermark: i64) -> OrderBook {
    let mut effective = book.clone();

    for trade in trades {
        let fresh = trade.timestamp_ms.is_some_and(|ts| ts > watermark);
        if !fresh {
            continue;
        }
        let entry = OrderBookEntry::new(trade.unit_price, trade.volume);
        match trade.side {
            Side::Bid => effective.bids.push(entry),
            Side::Ask => effective.asks.push(entry),
        }
    }

    effective
}

/// 주문 ID를 숫자로 해석합니다. 매칭 순서 비교에만 쓰입니다.
fn numeric_id(id: &str) -> u64 {
    id.parse().unwrap_or(0)
}

/// 매칭 사이클을 한 번 수행합니다.
///
/// 시장가 주문을 먼저, 그다음 지정가 주문을 처리하며, 각 목록은 ID
/// 내림차순(최신 우선)으로 순회합니다. 시장가 주문은 결과와 무관하게
/// 큐에서 제거되고(체결 또는 환불), 지정가 주문은 조건을 만족할 때만
/// 제거됩니다. 마지막으로 워터마크를 갱신합니다.
pub fn run_cycle(book: &OrderBook, trades: &[Trade], state: SimState) -> SimState {
    let watermark = cycle_watermark(&state);
    let effective = effective_book(book, trades, watermark);

    let mut state = state;

    // 시장가 주문: 급한 주문이 먼저 깊이를 소비
    let mut market_orders = std::mem::take(&mut state.pending_market_orders);
    market_orders.sort_by(|a, b| numeric_id(&b.id).cmp(&numeric_id(&a.id)));

    for order in market_orders {
        match order.side {
            Side::Bid => match book::volume_buyable_for(order.amount, &effective) {
                Some(volume) => state.commodity_balance += volume,
                // 호가창이 너무 얇으면 통화 환불
                None => state.currency_balance += order.amount,
            },
            Side::Ask => match book::price_to_sell(order.amount, &effective) {
                Some(proceeds) => state.currency_balance += proceeds,
                None => state.commodity_balance += order.amount,
            },
        }
    }

    // 지정가 주문: 가격 조건을 만족하는 것만 체결
    let mut limit_orders = std::mem::take(&mut state.pending_limit_orders);
    limit_orders.sort_by(|a, b| numeric_id(&b.id).cmp(&numeric_id(&a.id)));

    let mut still_open = Vec::with_capacity(limit_orders.len());
    for order in limit_orders {
        match order.side {
            Side::Bid => {
                let max_cost = order.volume * order.unit_price;
                match book::price_to_buy(order.volume, &effective) {
                    Some(cost) if cost <= max_cost => {
                        state.commodity_balance += order.volume;
                        // 예약액 중 쓰지 않은 통화 환불
                        state.currency_balance += max_cost - cost;
                    }
                    _ => still_open.push(order),
                }
            }
            Side::Ask => {
                let min_proceeds = order.volume * order.unit_price;
                match book::price_to_sell(order.volume, &effective) {
                    Some(proceeds) if proceeds >= min_proceeds => {
                        state.currency_balance += proceeds;
                    }
                    _ => still_open.push(order),
                }
            }
        }
    }
    state.pending_limit_orders = still_open;

    state.updated_utc_ms = watermark;
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{PendingLimitOrder, PendingMarketOrder};
    use paper_core::{Price, Quantity};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn asks(levels: &[(Decimal, Decimal)]) -> OrderBook {
        OrderBook::new(
            vec![],
            levels
                .iter()
                .map(|&(p, v)| OrderBookEntry::new(p, v))
                .collect(),
        )
    }

    fn bids(levels: &[(Decimal, Decimal)]) -> OrderBook {
        OrderBook::new(
            levels
                .iter()
                .map(|&(p, v)| OrderBookEntry::new(p, v))
                .collect(),
            vec![],
        )
    }

    fn state_with(currency: Decimal, commodity: Decimal) -> SimState {
        let mut state = SimState::new(currency, commodity);
        // 테스트에서 워터마크를 통제하기 위해 고정
        state.updated_utc_ms = 1_000;
        state
    }

    fn limit(
        state: &mut SimState,
        side: Side,
        volume: Quantity,
        unit_price: Price,
        timestamp_ms: i64,
    ) -> String {
        let id = state.next_id();
        assert!(state.add_limit_order(PendingLimitOrder {
            id: id.clone(),
            side,
            timestamp_ms,
            volume,
            unit_price,
        }));
        id
    }

    fn market(state: &mut SimState, side: Side, amount: Decimal, timestamp_ms: i64) -> String {
        let id = state.next_id();
        assert!(state.add_market_order(PendingMarketOrder {
            id: id.clone(),
            side,
            timestamp_ms,
            amount,
        }));
        id
    }

    #[test]
    fn test_limit_buy_fills_with_refund() {
        let mut state = state_with(dec!(1000), dec!(0));
        limit(&mut state, Side::Bid, dec!(5), dec!(12), 2_000);
        assert_eq!(state.currency_balance, dec!(940));

        let next = run_cycle(&asks(&[(dec!(10), dec!(5))]), &[], state);

        // 60 예약, 50 지출, 10 환불
        assert_eq!(next.currency_balance, dec!(950));
        assert_eq!(next.commodity_balance, dec!(5));
        assert!(next.pending_limit_orders.is_empty());
    }

    #[test]
    fn test_limit_sell_blocked_by_price() {
        let mut state = state_with(dec!(0), dec!(10));
        limit(&mut state, Side::Ask, dec!(10), dec!(9), 2_000);

        // priceToSell(10) = 80 < 90 -> 대기 유지
        let next = run_cycle(&bids(&[(dec!(8), dec!(10))]), &[], state);

        assert_eq!(next.currency_balance, dec!(0));
        assert_eq!(next.commodity_balance, dec!(0));
        assert_eq!(next.pending_limit_orders.len(), 1);
    }

    #[test]
    fn test_limit_sell_fills_at_book_price() {
        let mut state = state_with(dec!(0), dec!(10));
        limit(&mut state, Side::Ask, dec!(10), dec!(9), 2_000);

        // priceToSell(10) = 95 >= 90 -> 체결, 수취액은 스윕 가격 그대로
        let next = run_cycle(&bids(&[(dec!(10), dec!(5)), (dec!(9), dec!(5))]), &[], state);

        assert_eq!(next.currency_balance, dec!(95));
        assert_eq!(next.commodity_balance, dec!(0));
        assert!(next.pending_limit_orders.is_empty());
    }

    #[test]
    fn test_market_buy_refund_on_thin_book() {
        let mut state = state_with(dec!(100), dec!(0));
        market(&mut state, Side::Bid, dec!(100), 2_000);
        assert_eq!(state.currency_balance, dec!(0));

        // 호가창 전체 금액 10 < 100 -> 환불
        let next = run_cycle(&asks(&[(dec!(1), dec!(10))]), &[], state);

        assert_eq!(next.currency_balance, dec!(100));
        assert_eq!(next.commodity_balance, dec!(0));
        assert!(next.pending_market_orders.is_empty());
    }

    #[test]
    fn test_market_buy_settles() {
        let mut state = state_with(dec!(100), dec!(0));
        market(&mut state, Side::Bid, dec!(100), 2_000);

        let next = run_cycle(&asks(&[(dec!(10), dec!(20))]), &[], state);

        assert_eq!(next.currency_balance, dec!(0));
        assert_eq!(next.commodity_balance, dec!(10));
        assert!(next.pending_market_orders.is_empty());
    }

    #[test]
    fn test_market_sell_settles() {
        let mut state = state_with(dec!(0), dec!(5));
        market(&mut state, Side::Ask, dec!(5), 2_000);

        let next = run_cycle(&bids(&[(dec!(20), dec!(10))]), &[], state);

        assert_eq!(next.currency_balance, dec!(100));
        assert_eq!(next.commodity_balance, dec!(0));
        assert!(next.pending_market_orders.is_empty());
    }

    #[test]
    fn test_market_sell_refund_on_thin_book() {
        let mut state = state_with(dec!(0), dec!(5));
        market(&mut state, Side::Ask, dec!(5), 2_000);

        let next = run_cycle(&bids(&[(dec!(20), dec!(1))]), &[], state);

        assert_eq!(next.currency_balance, dec!(0));
        assert_eq!(next.commodity_balance, dec!(5));
    }

    #[test]
    fn test_recent_trade_augments_depth() {
        let mut state = state_with(dec!(50), dec!(0));
        limit(&mut state, Side::Bid, dec!(5), dec!(10), 2_000);

        // 호가창은 비어 있지만 워터마크 이후의 매도 체결이 깊이를 보탬
        let trades = [Trade {
            timestamp_ms: Some(2_001),
            side: Side::Ask,
            unit_price: dec!(10),
            volume: dec!(5),
        }];
        let next = run_cycle(&OrderBook::default(), &trades, state);

        assert_eq!(next.commodity_balance, dec!(5));
        assert!(next.pending_limit_orders.is_empty());
    }

    #[test]
    fn test_stale_trade_ignored() {
        let mut state = state_with(dec!(50), dec!(0));
        limit(&mut state, Side::Bid, dec!(5), dec!(10), 2_000);

        // 워터마크(1000) 이전의 체결은 무시
        let trades = [Trade {
            timestamp_ms: Some(500),
            side: Side::Ask,
            unit_price: dec!(10),
            volume: dec!(5),
        }];
        let next = run_cycle(&OrderBook::default(), &trades, state);

        assert_eq!(next.pending_limit_orders.len(), 1);
        assert_eq!(next.commodity_balance, dec!(0));
    }

    #[test]
    fn test_trade_without_timestamp_ignored() {
        let mut state = state_with(dec!(50), dec!(0));
        limit(&mut state, Side::Bid, dec!(5), dec!(10), 2_000);

        let trades = [Trade {
            timestamp_ms: None,
            side: Side::Ask,
            unit_price: dec!(10),
            volume: dec!(5),
        }];
        let next = run_cycle(&OrderBook::default(), &trades, state);

        assert_eq!(next.pending_limit_orders.len(), 1);
    }

    #[test]
    fn test_bid_side_trade_augments_bids() {
        let mut state = state_with(dec!(0), dec!(5));
        market(&mut state, Side::Ask, dec!(5), 2_000);

        // 매수 주도 체결은 매수 호가 깊이로
        let trades = [Trade {
            timestamp_ms: Some(2_001),
            side: Side::Bid,
            unit_price: dec!(20),
            volume: dec!(5),
        }];
        let next = run_cycle(&OrderBook::default(), &trades, state);

        assert_eq!(next.currency_balance, dec!(100));
        assert_eq!(next.commodity_balance, dec!(0));
    }

    #[test]
    fn test_watermark_advances() {
        let mut state = state_with(dec!(1000), dec!(10));
        limit(&mut state, Side::Bid, dec!(1), dec!(1), 5_000);
        market(&mut state, Side::Ask, dec!(10), 6_000);

        // 두 목록 모두 비어 있지 않으면 워터마크는 max(1000, min(5000, 6000))
        let next = run_cycle(&OrderBook::default(), &[], state);
        assert_eq!(next.updated_utc_ms, 5_000);
    }

    #[test]
    fn test_watermark_empty_list_defaults_to_last() {
        let mut state = state_with(dec!(1000), dec!(0));
        limit(&mut state, Side::Bid, dec!(1), dec!(1), 5_000);

        // 시장가 목록이 비어 있으면 그쪽 "가장 오래된" 값은 1000으로 대신하므로
        // min(5000, 1000) = 1000
        let next = run_cycle(&OrderBook::default(), &[], state);
        assert_eq!(next.updated_utc_ms, 1_000);
    }

    #[test]
    fn test_watermark_without_pending_orders() {
        let state = state_with(dec!(1000), dec!(0));

        let next = run_cycle(&OrderBook::default(), &[], state);
        assert_eq!(next.updated_utc_ms, 1_000);
    }

    #[test]
    fn test_independent_orders_both_fill() {
        let mut state = state_with(dec!(120), dec!(3));
        limit(&mut state, Side::Bid, dec!(5), dec!(12), 2_000);
        market(&mut state, Side::Ask, dec!(3), 2_000);

        let book = OrderBook::new(
            vec![OrderBookEntry::new(dec!(11), dec!(10))],
            vec![OrderBookEntry::new(dec!(10), dec!(10))],
        );
        let next = run_cycle(&book, &[], state);

        // 시장가 매도: 3 * 11 = 33, 지정가 매수: 50 지출 / 10 환불
        assert_eq!(next.currency_balance, dec!(60) + dec!(33) + dec!(10));
        assert_eq!(next.commodity_balance, dec!(5));
        assert!(!next.has_pending_orders());
    }
}
