//! Payment gateway notification payload and status mapping

use serde::{Deserialize, Serialize};

use crate::types::*;

/// Body of a payment notification. Fields are optional so a partial payload
/// can be rejected with a precise error instead of a parse failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentNotification {
    /// Composite "<order id>-<unix timestamp>" sent at checkout
    pub order_id: Option<String>,
    pub transaction_status: Option<String>,
    /// Gateway's own transaction id
    pub transaction_id: Option<String>,
    pub gross_amount: Option<String>,
    pub payment_type: Option<String>,
}

/// Gateway transaction statuses
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionStatus {
    Capture,
    Settlement,
    Pending,
    Deny,
    Expire,
    Cancel,
    /// Refunds, partial refunds and anything newer
    Other(String),
}

impl TransactionStatus {
    pub fn parse(status: &str) -> Self {
        match status.trim() {
            "capture" => TransactionStatus::Capture,
            "settlement" => TransactionStatus::Settlement,
            "pending" => TransactionStatus::Pending,
            "deny" => TransactionStatus::Deny,
            "expire" => TransactionStatus::Expire,
            "cancel" => TransactionStatus::Cancel,
            other => TransactionStatus::Other(other.to_string()),
        }
    }

    /// Money has been received
    pub fn is_paid(&self) -> bool {
        matches!(self, TransactionStatus::Capture | TransactionStatus::Settlement)
    }

    pub fn order_status(&self) -> OrderStatus {
        match self {
            TransactionStatus::Capture | TransactionStatus::Settlement => OrderStatus::Settle,
            TransactionStatus::Pending => OrderStatus::Pending,
            TransactionStatus::Deny | TransactionStatus::Expire | TransactionStatus::Cancel => {
                OrderStatus::Failed
            }
            TransactionStatus::Other(status) => OrderStatus::Other(status.clone()),
        }
    }
}

/// Identifier sent to the gateway for an order; the timestamp keeps retried
/// checkouts of the same order unique on the gateway side
pub fn composite_order_id(order_id: i64, timestamp: i64) -> String {
    format!("{}-{}", order_id, timestamp)
}

/// Storefront order id from a composite gateway id ("15-1731400000" → 15).
/// A plain numeric id is accepted as well.
pub fn parse_composite_order_id(composite: &str) -> LedgerResult<i64> {
    let leading = composite
        .split_once('-')
        .map(|(id, _)| id)
        .unwrap_or(composite)
        .trim();
    leading.parse::<i64>().map_err(|_| {
        LedgerError::Validation(format!("Order id '{}' does not start with a number", composite))
    })
}

impl PaymentNotification {
    /// Storefront order id; missing or malformed ids are validation errors
    pub fn order_id(&self) -> LedgerResult<i64> {
        let composite = self
            .order_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| LedgerError::Validation("Missing order_id in payload".to_string()))?;
        parse_composite_order_id(composite)
    }

    pub fn status(&self) -> LedgerResult<TransactionStatus> {
        self.transaction_status
            .as_deref()
            .map(TransactionStatus::parse)
            .ok_or_else(|| {
                LedgerError::Validation("Missing transaction_status in payload".to_string())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_composite_order_id() {
        assert_eq!(parse_composite_order_id("15-1731400000").unwrap(), 15);
        assert_eq!(parse_composite_order_id("15").unwrap(), 15);
        assert_eq!(composite_order_id(15, 1731400000), "15-1731400000");
        assert!(parse_composite_order_id("abc-123").is_err());
        assert!(parse_composite_order_id("-123").is_err());
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            ("capture", OrderStatus::Settle),
            ("settlement", OrderStatus::Settle),
            ("pending", OrderStatus::Pending),
            ("deny", OrderStatus::Failed),
            ("expire", OrderStatus::Failed),
            ("cancel", OrderStatus::Failed),
            ("refund", OrderStatus::Other("refund".to_string())),
        ];
        for (raw, expected) in cases {
            assert_eq!(TransactionStatus::parse(raw).order_status(), expected);
        }
        assert!(TransactionStatus::parse("settlement").is_paid());
        assert!(!TransactionStatus::parse("pending").is_paid());
    }

    #[test]
    fn test_missing_fields() {
        let notification: PaymentNotification =
            serde_json::from_str(r#"{"transaction_status":"settlement"}"#).unwrap();
        assert!(matches!(notification.order_id(), Err(LedgerError::Validation(_))));
        assert!(notification.status().is_ok());
    }
}
