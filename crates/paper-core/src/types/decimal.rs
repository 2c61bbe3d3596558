//! 정밀한 금융 계산을 위한 Decimal 별칭.
//!
//! 가격, 수량, 금액은 모두 `rust_decimal::Decimal`로 표현합니다.
//! 이진 부동소수점 대신 십진 고정소수점을 사용하므로 잔고 정산이
//! 오차 없이 비교 가능합니다.

use rust_decimal::Decimal;

/// 단위 가격 타입 (통화 / 상품 1단위).
pub type Price = Decimal;

/// 상품 수량 타입.
pub type Quantity = Decimal;

/// 통화 금액 타입.
pub type Amount = Decimal;
