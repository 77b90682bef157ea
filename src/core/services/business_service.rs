//! Business-level workflows: creation, renaming, pinning and dashboard ordering.

use uuid::Uuid;

use crate::core::services::{require_name, ServiceResult};
use crate::ledger::{Business, BusinessKind};

/// Something pinned to the dashboard, resolved with its owning business.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PinnedItem {
    Business { business_id: Uuid, name: String },
    Class { business_id: Uuid, class_id: Uuid, label: String },
    Customer { business_id: Uuid, customer_id: Uuid, name: String },
}

impl PinnedItem {
    pub fn business_id(&self) -> Uuid {
        match self {
            PinnedItem::Business { business_id, .. }
            | PinnedItem::Class { business_id, .. }
            | PinnedItem::Customer { business_id, .. } => *business_id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            PinnedItem::Business { name, .. } | PinnedItem::Customer { name, .. } => name,
            PinnedItem::Class { label, .. } => label,
        }
    }
}

pub struct BusinessService;

impl BusinessService {
    pub fn create(
        kind: BusinessKind,
        name: &str,
        owner_name: Option<String>,
    ) -> ServiceResult<Business> {
        let name = require_name(name, "Business")?;
        let owner = super::non_blank(owner_name);
        let business = Business::new(kind, name, owner);
        tracing::info!(business = %business.id, kind = %business.kind, "created business");
        Ok(business)
    }

    pub fn rename(business: &mut Business, name: &str) -> ServiceResult<()> {
        business.name = require_name(name, "Business")?;
        business.touch();
        Ok(())
    }

    /// Flips the pin flag and returns the new state.
    pub fn toggle_pin(business: &mut Business) -> bool {
        business.is_pinned = !business.is_pinned;
        business.touch();
        business.is_pinned
    }

    /// Clears the "new" badge once a business has been opened.
    pub fn mark_opened(business: &mut Business) {
        if business.is_new {
            business.is_new = false;
            business.touch();
        }
    }

    /// Pinned businesses first, then newest first.
    pub fn sorted(businesses: &[Business]) -> Vec<&Business> {
        let mut ordered: Vec<&Business> = businesses.iter().collect();
        ordered.sort_by(|a, b| {
            b.is_pinned
                .cmp(&a.is_pinned)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        ordered
    }

    pub fn pinned_items(businesses: &[Business]) -> Vec<PinnedItem> {
        let mut items = Vec::new();
        for business in Self::sorted(businesses) {
            if business.is_pinned {
                items.push(PinnedItem::Business {
                    business_id: business.id,
                    name: business.name.clone(),
                });
            }
            items.extend(business.classes.iter().filter(|c| c.is_pinned).map(|class| {
                PinnedItem::Class {
                    business_id: business.id,
                    class_id: class.id,
                    label: class.label(),
                }
            }));
            items.extend(
                business
                    .customers
                    .iter()
                    .filter(|c| c.is_pinned)
                    .map(|customer| PinnedItem::Customer {
                        business_id: business.id,
                        customer_id: customer.id,
                        name: customer.name.clone(),
                    }),
            );
        }
        items
    }
}
