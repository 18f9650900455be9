//! 订单模型

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 订单状态
///
/// 状态单调推进：NEW -> PROCESSING -> {INVALID | PROCESSED}，
/// INVALID 和 PROCESSED 是终态，到达后订单不再变更。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "order_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    New,
    Processing,
    Invalid,
    Processed,
}

impl OrderStatus {
    /// 是否为终态
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Invalid | Self::Processed)
    }
}

/// 订单记录
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Order {
    pub number: String,
    pub login: String,
    pub status: OrderStatus,
    pub accrual: Decimal,
    pub uploaded_at: DateTime<Utc>,
}

/// 订单列表响应项
///
/// `accrual` 只在订单到达 PROCESSED 后出现；未结算订单不返回该字段。
#[derive(Debug, Clone, Serialize)]
pub struct OrderDto {
    pub number: String,
    pub status: OrderStatus,
    #[serde(
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub accrual: Option<Decimal>,
    pub uploaded_at: DateTime<Utc>,
}

impl From<Order> for OrderDto {
    fn from(order: Order) -> Self {
        let accrual = match order.status {
            OrderStatus::Processed => Some(order.accrual),
            _ => None,
        };
        Self {
            number: order.number,
            status: order.status,
            accrual,
            uploaded_at: order.uploaded_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_statuses() {
        assert!(!OrderStatus::New.is_terminal());
        assert!(!OrderStatus::Processing.is_terminal());
        assert!(OrderStatus::Invalid.is_terminal());
        assert!(OrderStatus::Processed.is_terminal());
    }

    #[test]
    fn test_status_serializes_uppercase() {
        assert_eq!(
            serde_json::to_value(OrderStatus::Processing).unwrap(),
            serde_json::json!("PROCESSING")
        );
        assert_eq!(
            serde_json::to_value(OrderStatus::New).unwrap(),
            serde_json::json!("NEW")
        );
    }

    fn sample_order(status: OrderStatus, accrual: &str) -> Order {
        Order {
            number: "12345678903".to_string(),
            login: "alice".to_string(),
            status,
            accrual: accrual.parse().unwrap(),
            uploaded_at: Utc::now(),
        }
    }

    #[test]
    fn test_dto_exposes_accrual_only_when_processed() {
        let dto = OrderDto::from(sample_order(OrderStatus::Processed, "729.98"));
        assert_eq!(dto.accrual, Some("729.98".parse().unwrap()));

        let dto = OrderDto::from(sample_order(OrderStatus::Processing, "0"));
        assert_eq!(dto.accrual, None);

        let json = serde_json::to_value(&dto).unwrap();
        assert!(
            json.get("accrual").is_none(),
            "未结算订单不应出现 accrual 字段"
        );
    }

    #[test]
    fn test_dto_accrual_is_json_number() {
        let dto = OrderDto::from(sample_order(OrderStatus::Processed, "729.98"));
        let json = serde_json::to_value(&dto).unwrap();
        assert_eq!(json["accrual"], serde_json::json!(729.98));
    }
}
