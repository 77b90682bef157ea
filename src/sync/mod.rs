//! Best-effort notification feed mirrored to account holders, keyed by phone number.
//!
//! Every balance change may be published here; failures are logged and never propagate
//! into the balance update that triggered them.

pub mod json_feed;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::balance_ledger::BalanceChange;
use crate::errors::{DuebookError, Result};
use crate::ledger::{BalanceHolder, Business, BusinessKind, Money, PaymentKind};

pub use json_feed::JsonLedgerFeed;

pub const TIMELINE_LIMIT: usize = 50;
const MIN_PHONE_DIGITS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerEvent {
    Payment { amount: Money, description: String },
    DueAdded { amount: Money, description: String },
    DueEdited { previous_due: Money, new_due: Money },
}

impl LedgerEvent {
    /// Event describing a service-level balance change.
    pub fn from_change(change: &BalanceChange) -> Self {
        match &change.record {
            Some(record) if record.kind == PaymentKind::Payment => LedgerEvent::Payment {
                amount: record.amount,
                description: record.description.clone(),
            },
            Some(record) => LedgerEvent::DueAdded {
                amount: record.amount,
                description: record.description.clone(),
            },
            None => LedgerEvent::DueEdited {
                previous_due: change.previous.due,
                new_due: change.current.due,
            },
        }
    }

    fn timeline_item(&self, at: DateTime<Utc>) -> TimelineItem {
        let (kind, amount, title, message) = match self {
            LedgerEvent::Payment {
                amount,
                description,
            } => (
                TimelineKind::Payment,
                Some(*amount),
                "Payment received".to_string(),
                format!("{amount} received: {description}"),
            ),
            LedgerEvent::DueAdded {
                amount,
                description,
            } => (
                TimelineKind::DueAdded,
                Some(*amount),
                "Due added".to_string(),
                format!("{amount} added: {description}"),
            ),
            LedgerEvent::DueEdited {
                previous_due,
                new_due,
            } => (
                TimelineKind::DueAdded,
                None,
                "Due updated".to_string(),
                format!("Due changed from {previous_due} to {new_due}"),
            ),
        };
        TimelineItem {
            id: Uuid::new_v4().to_string(),
            kind,
            amount,
            date: at,
            title,
            message,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimelineKind {
    Payment,
    DueAdded,
    Request,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineItem {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: TimelineKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Money>,
    pub date: DateTime<Utc>,
    pub title: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryKind {
    Class,
    Shop,
}

impl From<BusinessKind> for EntryKind {
    fn from(kind: BusinessKind) -> Self {
        match kind {
            BusinessKind::TeacherStudent => EntryKind::Class,
            BusinessKind::Shop => EntryKind::Shop,
        }
    }
}

/// Snapshot of one holder's standing with one business, plus recent events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub id: String,
    pub party_id: Uuid,
    pub party_name: String,
    pub phone_number: String,
    pub business_id: Uuid,
    pub business_name: String,
    pub admin_name: String,
    pub total_due: Money,
    pub last_updated: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    #[serde(default)]
    pub unread_count: u32,
    #[serde(default)]
    pub timeline: Vec<TimelineItem>,
}

/// Digits of `raw`, or `None` when too short to address anyone.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    (digits.len() >= MIN_PHONE_DIGITS).then_some(digits)
}

pub fn entry_id(phone: &str, business_id: Uuid) -> String {
    format!("{phone}_{business_id}")
}

/// Storage for ledger entries.
pub trait LedgerFeed {
    fn load(&self, id: &str) -> Result<Option<LedgerEntry>>;
    fn store(&mut self, entry: LedgerEntry) -> Result<()>;
    fn entries_for_phone(&self, phone: &str) -> Result<Vec<LedgerEntry>>;

    /// Resets the unread counter of an entry.
    fn mark_read(&mut self, id: &str) -> Result<()> {
        let mut entry = self
            .load(id)?
            .ok_or_else(|| DuebookError::InvalidInput(format!("ledger entry {id} not found")))?;
        entry.unread_count = 0;
        self.store(entry)
    }
}

#[derive(Debug, Default)]
pub struct MemoryLedgerFeed {
    entries: BTreeMap<String, LedgerEntry>,
}

impl MemoryLedgerFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl LedgerFeed for MemoryLedgerFeed {
    fn load(&self, id: &str) -> Result<Option<LedgerEntry>> {
        Ok(self.entries.get(id).cloned())
    }

    fn store(&mut self, entry: LedgerEntry) -> Result<()> {
        self.entries.insert(entry.id.clone(), entry);
        Ok(())
    }

    fn entries_for_phone(&self, phone: &str) -> Result<Vec<LedgerEntry>> {
        let Some(phone) = normalize_phone(phone) else {
            return Ok(Vec::new());
        };
        Ok(self
            .entries
            .values()
            .filter(|entry| entry.phone_number == phone)
            .cloned()
            .collect())
    }
}

pub struct LedgerSync;

impl LedgerSync {
    /// Publishes `event` for `party`; returns the entry id when something was written.
    /// Errors are logged and swallowed.
    pub fn publish(
        feed: &mut dyn LedgerFeed,
        business: &Business,
        party: &dyn BalanceHolder,
        event: &LedgerEvent,
        at: DateTime<Utc>,
    ) -> Option<String> {
        match Self::try_publish(feed, business, party, event, at) {
            Ok(Some(id)) => {
                tracing::debug!(entry = %id, "synced ledger entry");
                Some(id)
            }
            Ok(None) => None,
            Err(err) => {
                tracing::warn!(
                    party = %party.id(),
                    business = %business.id,
                    error = %err,
                    "ledger sync failed"
                );
                None
            }
        }
    }

    pub fn try_publish(
        feed: &mut dyn LedgerFeed,
        business: &Business,
        party: &dyn BalanceHolder,
        event: &LedgerEvent,
        at: DateTime<Utc>,
    ) -> Result<Option<String>> {
        let Some(phone) = normalize_phone(party.phone_number()) else {
            return Ok(None);
        };
        let id = entry_id(&phone, business.id);
        let (mut timeline, unread) = match feed.load(&id)? {
            Some(existing) => (existing.timeline, existing.unread_count),
            None => (Vec::new(), 0),
        };
        timeline.insert(0, event.timeline_item(at));
        timeline.truncate(TIMELINE_LIMIT);

        let entry = LedgerEntry {
            id: id.clone(),
            party_id: party.id(),
            party_name: party.display_name().to_string(),
            phone_number: phone,
            business_id: business.id,
            business_name: business.name.clone(),
            admin_name: business.admin_name().to_string(),
            total_due: party.balance().due,
            last_updated: at,
            kind: business.kind.into(),
            unread_count: unread.saturating_add(1),
            timeline,
        };
        feed.store(entry)?;
        Ok(Some(id))
    }
}
