use std::path::{Path, PathBuf};

use crate::errors::Result;
use crate::utils::persistence::{read_json, write_json_atomic};

use super::{normalize_phone, LedgerEntry, LedgerFeed};

/// Ledger feed kept as one JSON array on disk, rewritten on every store.
#[derive(Debug, Clone)]
pub struct JsonLedgerFeed {
    path: PathBuf,
}

impl JsonLedgerFeed {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<Vec<LedgerEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        read_json(&self.path)
    }
}

impl LedgerFeed for JsonLedgerFeed {
    fn load(&self, id: &str) -> Result<Option<LedgerEntry>> {
        Ok(self.read_all()?.into_iter().find(|entry| entry.id == id))
    }

    fn store(&mut self, entry: LedgerEntry) -> Result<()> {
        let mut entries = self.read_all()?;
        match entries.iter_mut().find(|existing| existing.id == entry.id) {
            Some(existing) => *existing = entry,
            None => entries.push(entry),
        }
        write_json_atomic(&self.path, &entries)
    }

    fn entries_for_phone(&self, phone: &str) -> Result<Vec<LedgerEntry>> {
        let Some(phone) = normalize_phone(phone) else {
            return Ok(Vec::new());
        };
        let mut entries: Vec<LedgerEntry> = self
            .read_all()?
            .into_iter()
            .filter(|entry| entry.phone_number == phone)
            .collect();
        entries.sort_by(|a, b| b.last_updated.cmp(&a.last_updated));
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::ledger::{Business, BusinessKind, Student};
    use crate::sync::{LedgerEvent, LedgerSync};

    #[test]
    fn entries_survive_reopening_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feed.json");
        let institute = Business::new(BusinessKind::TeacherStudent, "Academy", None);
        let student = Student::new("Asha", "98765 43210", Utc::now().date_naive(), 500);

        let mut feed = JsonLedgerFeed::new(&path);
        let event = LedgerEvent::DueAdded {
            amount: 500,
            description: "April".into(),
        };
        let id = LedgerSync::try_publish(&mut feed, &institute, &student, &event, Utc::now())
            .unwrap()
            .unwrap();

        let reopened = JsonLedgerFeed::new(&path);
        let entry = reopened.load(&id).unwrap().unwrap();
        assert_eq!(entry.total_due, 500);
        assert_eq!(entry.party_name, "Asha");
        assert_eq!(reopened.entries_for_phone("9876543210").unwrap().len(), 1);

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"type\": \"CLASS\""));
        assert!(raw.contains("\"unreadCount\": 1"));
    }
}
