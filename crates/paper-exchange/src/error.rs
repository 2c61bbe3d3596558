//! 거래소 에러 타입.

use thiserror::Error;

/// 거래소 관련 에러.
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// 네트워크/연결 에러
    #[error("Network error: {0}")]
    Network(String),

    /// 타임아웃
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// 잔고 부족
    #[error("Insufficient balance: {0}")]
    InsufficientBalance(String),

    /// 유효하지 않은 수량 또는 가격
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    /// 지원되지 않는 작업
    #[error("Not supported: {0}")]
    Unsupported(String),
}

impl ExchangeError {
    /// 재시도 가능한 에러인지 확인합니다.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ExchangeError::Network(_) | ExchangeError::Timeout(_))
    }

    /// 재시도하면 안 되는 치명적 에러인지 확인합니다.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ExchangeError::InsufficientBalance(_) | ExchangeError::InvalidQuantity(_)
        )
    }
}

/// 거래소 작업을 위한 Result 타입.
pub type ExchangeResult<T> = Result<T, ExchangeError>;
