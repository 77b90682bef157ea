use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    balance::{Balance, BalanceHolder, TransactionRecord},
    business::{DEFAULT_GROUP_ID, DEFAULT_GROUP_NAME},
    Money,
};

/// Named tab a shop files its customers under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerGroup {
    pub id: String,
    pub name: String,
}

impl CustomerGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
        }
    }

    pub fn general() -> Self {
        Self {
            id: DEFAULT_GROUP_ID.into(),
            name: DEFAULT_GROUP_NAME.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: Uuid,
    #[serde(default = "Customer::default_group_id")]
    pub group_id: String,
    pub name: String,
    pub phone_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(flatten)]
    pub balance: Balance,
    #[serde(default)]
    pub payment_history: Vec<TransactionRecord>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub is_pinned: bool,
}

impl Customer {
    pub fn new(
        group_id: impl Into<String>,
        name: impl Into<String>,
        phone_number: impl Into<String>,
        initial_due: Money,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            group_id: group_id.into(),
            name: name.into(),
            phone_number: phone_number.into(),
            address: None,
            photo_url: None,
            balance: Balance::with_due(initial_due),
            payment_history: Vec::new(),
            created_at: now,
            updated_at: now,
            is_pinned: false,
        }
    }

    pub fn default_group_id() -> String {
        DEFAULT_GROUP_ID.into()
    }

    pub fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
    }
}

impl BalanceHolder for Customer {
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
        self.touch(record.date);
        self.payment_history.push(record);
    }
}
