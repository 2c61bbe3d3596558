//! 매칭 루프를 구동하는 백그라운드 워커.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

use super::matching;
use super::state::StateCell;
use crate::traits::MarketDataSource;

/// 워커 태스크를 시작합니다.
///
/// 반환된 핸들을 abort하면 루프는 다음 중단 지점에서 취소됩니다. 진행
/// 중이던 거래소 요청은 백그라운드에서 끝날 수 있지만 그 결과가 상태를
/// 바꾸는 일은 없습니다.
pub(crate) fn spawn<E>(
    upstream: Arc<E>,
    state: StateCell,
    cycle_delay: Duration,
) -> JoinHandle<()>
where
    E: MarketDataSource + 'static,
{
    tokio::spawn(async move {
        loop {
            run_cycle_once(upstream.as_ref(), &state).await;

            // 활동 여부와 무관하게 워터마크를 현재 시각으로 올림
            state
                .commit(|mut s| {
                    s.updated_utc_ms = Utc::now().timestamp_millis();
                    s
                })
                .await;

            tokio::time::sleep(cycle_delay).await;
        }
    })
}

/// 매칭 사이클을 한 번 시도합니다.
///
/// 대기 주문이 없으면 거래소를 호출하지 않습니다. 거래소 호출이 실패하면
/// 이번 사이클은 건너뛰고 다음 사이클에서 재시도합니다.
async fn run_cycle_once<E>(upstream: &E, state: &StateCell)
where
    E: MarketDataSource,
{
    let snapshot = state.snapshot().await;
    if !snapshot.has_pending_orders() {
        return;
    }

    let book = match upstream.order_book().await {
        Ok(book) => book,
        Err(error) => {
            debug!(%error, "order book fetch failed, skipping matching cycle");
            return;
        }
    };
    let trades = match upstream.trade_history().await {
        Ok(trades) => trades,
        Err(error) => {
            debug!(%error, "trade history fetch failed, skipping matching cycle");
            return;
        }
    };

    state
        .commit(|s| matching::run_cycle(&book, &trades, s))
        .await;
}
