//! 请求 DTO 定义

use rust_decimal::Decimal;
use serde::Deserialize;
use validator::Validate;

/// 提现请求
///
/// `order` 是提现动作关联的单号，与订单号共用同一套 Luhn 校验，
/// 但处于独立的标识空间——它不需要对应已登记的订单。
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct WithdrawRequest {
    #[validate(length(min = 1, message = "单号不能为空"))]
    pub order: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub sum: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_withdraw_request_deserializes_json_numbers() {
        let req: WithdrawRequest =
            serde_json::from_str(r#"{"order":"2377225624","sum":751.5}"#).unwrap();
        assert_eq!(req.order, "2377225624");
        assert_eq!(req.sum, "751.5".parse().unwrap());
    }

    #[test]
    fn test_empty_order_fails_validation() {
        let req: WithdrawRequest = serde_json::from_str(r#"{"order":"","sum":1.0}"#).unwrap();
        assert!(req.validate().is_err());
    }
}
