//! PaperExchange 사용 예제.
//!
//! 고정된 호가창을 돌려주는 가짜 업스트림을 래핑해 지정가/시장가 주문이
//! 가상 잔고로 체결되는 과정을 보여줍니다.
//!
//! 실행: `cargo run -p paper-exchange --example paper_trading_demo`

use async_trait::async_trait;
use rust_decimal_macros::dec;
use std::time::Duration;

use paper_core::{init_logging, LogConfig, OrderBook, OrderBookEntry, Side, Trade};
use paper_exchange::{
    BookSource, ExchangeResult, PaperConfig, PaperExchange, SpotTrading, TradeHistorySource,
};

/// 항상 같은 호가창을 돌려주는 데모용 업스트림.
struct DemoUpstream;

#[async_trait]
impl BookSource for DemoUpstream {
    async fn order_book(&self) -> ExchangeResult<OrderBook> {
        Ok(OrderBook::new(
            vec![
                OrderBookEntry::new(dec!(49990), dec!(0.8)),
                OrderBookEntry::new(dec!(49980), dec!(1.5)),
            ],
            vec![
                OrderBookEntry::new(dec!(50010), dec!(0.6)),
                OrderBookEntry::new(dec!(50020), dec!(2.0)),
            ],
        ))
    }
}

#[async_trait]
impl TradeHistorySource for DemoUpstream {
    async fn trade_history(&self) -> ExchangeResult<Vec<Trade>> {
        Ok(vec![])
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging(LogConfig::new("debug"))?;

    let config = PaperConfig::default()
        .with_cycle_delay_ms(100)
        .with_currency_balance(dec!(100000));
    let exchange = PaperExchange::new(config, DemoUpstream);

    println!("initial balances: {}", exchange.balances().await?);

    // 현재 매도 호가보다 높은 지정가 매수 - 다음 사이클에서 체결됨
    let order_id = exchange
        .place_limit_order(Side::Bid, dec!(0.5), dec!(50100))
        .await?;
    println!("placed limit bid {}", order_id);
    println!("after placement: {}", exchange.balances().await?);

    tokio::time::sleep(Duration::from_millis(500)).await;
    println!("after matching:  {}", exchange.balances().await?);

    // 사들인 상품 일부를 시장가로 매도
    let order_id = exchange.place_market_order(Side::Ask, dec!(0.3)).await?;
    println!("placed market ask {}", order_id);

    tokio::time::sleep(Duration::from_millis(500)).await;
    println!("after matching:  {}", exchange.balances().await?);
    println!("open orders:     {:?}", exchange.open_orders().await?);

    exchange.shutdown();
    Ok(())
}
