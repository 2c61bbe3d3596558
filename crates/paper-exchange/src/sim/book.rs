//! 호가창 스윕 가격 계산.
//!
//! 호가창 스냅샷에서 주어진 물량/금액을 소화할 때의 가격을 레벨 단위로
//! 계산하는 순수 함수들입니다. 호가창이 요청을 다 소화하지 못하면
//! `None`을 반환합니다.

use paper_core::{Amount, OrderBook, OrderBookEntry, Price, Quantity};
use rust_decimal::Decimal;

/// 매도 호가를 오름차순으로 정렬해 반환합니다.
fn sorted_asks(book: &OrderBook) -> Vec<&OrderBookEntry> {
    let mut asks: Vec<&OrderBookEntry> = book.asks.iter().collect();
    asks.sort_by(|a, b| a.price.cmp(&b.price));
    asks
}

/// 매수 호가를 내림차순으로 정렬해 반환합니다.
fn sorted_bids(book: &OrderBook) -> Vec<&OrderBookEntry> {
    let mut bids: Vec<&OrderBookEntry> = book.bids.iter().collect();
    bids.sort_by(|a, b| b.price.cmp(&a.price));
    bids
}

/// `volume`만큼 매수할 때의 총 금액을 반환합니다.
///
/// 매도 호가를 싼 것부터 소진합니다. 호가창이 먼저 바닥나면 `None`.
pub fn price_to_buy(volume: Quantity, book: &OrderBook) -> Option<Price> {
    let mut remaining = volume;
    let mut total = Decimal::ZERO;

    for level in sorted_asks(book) {
        if remaining <= Decimal::ZERO {
            break;
        }
        let consumed = remaining.min(level.volume);
        total += consumed * level.price;
        remaining -= consumed;
    }

    (remaining <= Decimal::ZERO).then_some(total)
}

/// `volume`만큼 매도할 때의 총 금액을 반환합니다.
///
/// 매수 호가를 비싼 것부터 소진합니다. 호가창이 먼저 바닥나면 `None`.
pub fn price_to_sell(volume: Quantity, book: &OrderBook) -> Option<Price> {
    let mut remaining = volume;
    let mut total = Decimal::ZERO;

    for level in sorted_bids(book) {
        if remaining <= Decimal::ZERO {
            break;
        }
        let consumed = remaining.min(level.volume);
        total += consumed * level.price;
        remaining -= consumed;
    }

    (remaining <= Decimal::ZERO).then_some(total)
}

/// `amount`만큼의 통화로 매수할 수 있는 상품 물량을 반환합니다.
///
/// 매도 호가를 싼 것부터, 각 레벨에서 `min(남은 금액, 레벨 전체 금액)`을
/// 지불하고 `지불액 / 가격`만큼을 받습니다. 금액이 남아 있는데 호가창이
/// 바닥나면 `None`.
pub fn volume_buyable_for(amount: Amount, book: &OrderBook) -> Option<Quantity> {
    let mut remaining = amount;
    let mut volume = Decimal::ZERO;

    for level in sorted_asks(book) {
        if remaining <= Decimal::ZERO {
            break;
        }
        // 가격 0인 레벨은 나눗셈이 정의되지 않으므로 건너뜀
        if level.price.is_zero() {
            continue;
        }
        let paid = remaining.min(level.notional());
        volume += paid / level.price;
        remaining -= paid;
    }

    (remaining <= Decimal::ZERO).then_some(volume)
}
