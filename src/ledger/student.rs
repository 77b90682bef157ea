use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    balance::{Balance, BalanceHolder, TransactionRecord},
    Money,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub father_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub phone_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(flatten)]
    pub balance: Balance,
    /// Month labels (for example `March 2024`) explicitly flagged as unpaid.
    #[serde(default)]
    pub pending_months: Vec<String>,
    #[serde(default)]
    pub payment_history: Vec<TransactionRecord>,
    pub joining_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl Student {
    pub fn new(
        name: impl Into<String>,
        phone_number: impl Into<String>,
        joining_date: NaiveDate,
        initial_due: Money,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            father_name: None,
            address: None,
            phone_number: phone_number.into(),
            photo_url: None,
            balance: Balance::with_due(initial_due),
            pending_months: Vec::new(),
            payment_history: Vec::new(),
            joining_date,
            created_at: Utc::now(),
        }
    }

    pub fn total_paid(&self) -> Money {
        self.payment_history
            .iter()
            .filter(|record| record.is_payment())
            .map(|record| record.amount)
            .sum()
    }
}

impl BalanceHolder for Student {
    fn id(&self) -> Uuid {
        self.id
    }

    fn display_name(&self) -> &str {
        &self.name
    }

    fn phone_number(&self) -> &str {
        &self.phone_number
    }

    fn balance(&self) -> Balance {
        self.balance
    }

    fn set_balance(&mut self, balance: Balance) {
        self.balance = balance;
    }

    fn history(&self) -> &[TransactionRecord] {
        &self.payment_history
    }

    fn append_record(&mut self, record: TransactionRecord) {
        self.payment_history.push(record);
    }
}
