pub mod json_backend;
pub mod transfer;

use uuid::Uuid;

use crate::{errors::Result, ledger::Business};

/// Repository the services persist businesses through.
pub trait BusinessStore: Send + Sync {
    fn load_all(&self) -> Result<Vec<Business>>;
    fn save_all(&self, businesses: &[Business]) -> Result<()>;

    /// Inserts or replaces a business by id.
    fn upsert(&self, business: &Business) -> Result<()> {
        let mut all = self.load_all()?;
        match all.iter_mut().find(|existing| existing.id == business.id) {
            Some(existing) => *existing = business.clone(),
            None => all.push(business.clone()),
        }
        self.save_all(&all)
    }

    /// Removes a business, returning whether it existed.
    fn delete(&self, id: Uuid) -> Result<bool> {
        let mut all = self.load_all()?;
        let before = all.len();
        all.retain(|business| business.id != id);
        if all.len() == before {
            return Ok(false);
        }
        self.save_all(&all)?;
        Ok(true)
    }
}

pub use json_backend::JsonStorage;
