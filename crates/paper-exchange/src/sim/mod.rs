//! 시뮬레이션 엔진.
//!
//! - `book`: 호가창 스윕 가격 계산
//! - `state`: 가상 계정 + 대기 주문 상태와 직렬화 저장소
//! - `matching`: 매칭 사이클 (순수 상태 변환)
//! - `runner`: 주기적으로 매칭을 구동하는 백그라운드 워커
//! - `exchange`: 클라이언트에 노출되는 `PaperExchange` 파사드

pub mod book;
mod exchange;
mod matching;
mod runner;
mod state;

pub use exchange::{PaperConfig, PaperExchange};
pub use state::{PendingLimitOrder, PendingMarketOrder, SimState, StateCell};
