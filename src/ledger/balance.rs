use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Money;

/// Running position of a student or customer against the business.
///
/// After any ledger operation settles, at most one of `due` and `advance` is non-zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    #[serde(rename = "totalDue")]
    pub due: Money,
    #[serde(rename = "advanceAmount", default)]
    pub advance: Money,
}

impl Balance {
    pub const fn zero() -> Self {
        Self { due: 0, advance: 0 }
    }

    pub const fn with_due(due: Money) -> Self {
        Self { due, advance: 0 }
    }

    pub const fn new(due: Money, advance: Money) -> Self {
        Self { due, advance }
    }

    /// Owed amount net of credit; negative when the holder is in advance.
    pub fn net(&self) -> Money {
        self.due - self.advance
    }

    pub fn is_settled(&self) -> bool {
        self.due == 0 || self.advance == 0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentKind {
    #[default]
    Payment,
    DueAdded,
}

impl PaymentKind {
    pub fn label(self) -> &'static str {
        match self {
            PaymentKind::Payment => "Payment",
            PaymentKind::DueAdded => "Due added",
        }
    }
}

/// Immutable history entry appended whenever a charge or payment is applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: Uuid,
    pub amount: Money,
    pub date: DateTime<Utc>,
    pub description: String,
    #[serde(rename = "type", default)]
    pub kind: PaymentKind,
}

impl TransactionRecord {
    pub fn new(
        kind: PaymentKind,
        amount: Money,
        description: impl Into<String>,
        date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            amount,
            date,
            description: description.into(),
            kind,
        }
    }

    pub fn is_payment(&self) -> bool {
        self.kind == PaymentKind::Payment
    }
}

/// Common surface of entities that own a [`Balance`] and its payment history.
pub trait BalanceHolder {
    fn id(&self) -> Uuid;
    fn display_name(&self) -> &str;
    fn phone_number(&self) -> &str;
    fn balance(&self) -> Balance;
    fn set_balance(&mut self, balance: Balance);
    fn history(&self) -> &[TransactionRecord];
    fn append_record(&mut self, record: TransactionRecord);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balance_serializes_with_original_field_names() {
        let json = serde_json::to_value(Balance::new(120, 0)).unwrap();
        assert_eq!(json["totalDue"], 120);
        assert_eq!(json["advanceAmount"], 0);
    }

    #[test]
    fn records_without_type_default_to_payment() {
        let raw = r#"{
            "id": "7f1d8a9c-1c1b-4c53-9a43-2b0c5e1d2f10",
            "amount": 500,
            "date": "2024-03-01T10:00:00Z",
            "description": "Cleared 1 Month"
        }"#;
        let record: TransactionRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(record.kind, PaymentKind::Payment);
    }
}
