use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{class_group::ClassGroup, customer::Customer, customer::CustomerGroup};

pub const DEFAULT_GROUP_ID: &str = "general";
pub const DEFAULT_GROUP_NAME: &str = "General";
const DEFAULT_ADMIN_NAME: &str = "Admin";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BusinessKind {
    /// Tuition or coaching institute tracking monthly student fees.
    #[serde(rename = "TEACHER_STUDENT")]
    TeacherStudent,
    /// Retail shop tracking customer credit.
    #[serde(rename = "SHOP")]
    Shop,
}

impl BusinessKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "institute" | "class" | "tuition" | "teacher_student" => {
                Some(BusinessKind::TeacherStudent)
            }
            "shop" | "store" => Some(BusinessKind::Shop),
            _ => None,
        }
    }
}

impl fmt::Display for BusinessKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BusinessKind::TeacherStudent => "Institute",
            BusinessKind::Shop => "Shop",
        };
        f.write_str(label)
    }
}

/// Aggregate root owning classes (institutes) or customer groups and customers (shops).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Business {
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_name: Option<String>,
    #[serde(rename = "type")]
    pub kind: BusinessKind,
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub is_new: bool,
    #[serde(default)]
    pub is_pinned: bool,
    #[serde(default)]
    pub classes: Vec<ClassGroup>,
    #[serde(default)]
    pub customer_groups: Vec<CustomerGroup>,
    #[serde(default)]
    pub customers: Vec<Customer>,
}

impl Business {
    pub fn new(kind: BusinessKind, name: impl Into<String>, owner_name: Option<String>) -> Self {
        let now = Utc::now();
        let customer_groups = match kind {
            BusinessKind::Shop => vec![CustomerGroup::general()],
            BusinessKind::TeacherStudent => Vec::new(),
        };
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            owner_name,
            kind,
            created_at: now,
            updated_at: now,
            is_new: true,
            is_pinned: false,
            classes: Vec::new(),
            customer_groups,
            customers: Vec::new(),
        }
    }

    /// Name shown to account holders on the synced ledger.
    pub fn admin_name(&self) -> &str {
        self.owner_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(DEFAULT_ADMIN_NAME)
    }

    pub fn class(&self, id: Uuid) -> Option<&ClassGroup> {
        self.classes.iter().find(|class| class.id == id)
    }

    pub fn class_mut(&mut self, id: Uuid) -> Option<&mut ClassGroup> {
        self.classes.iter_mut().find(|class| class.id == id)
    }

    pub fn customer(&self, id: Uuid) -> Option<&Customer> {
        self.customers.iter().find(|customer| customer.id == id)
    }

    pub fn customer_mut(&mut self, id: Uuid) -> Option<&mut Customer> {
        self.customers.iter_mut().find(|customer| customer.id == id)
    }

    pub fn group(&self, id: &str) -> Option<&CustomerGroup> {
        self.customer_groups.iter().find(|group| group.id == id)
    }

    pub fn student_count(&self) -> usize {
        self.classes.iter().map(|class| class.students.len()).sum()
    }

    pub fn touch(&mut self) {
        self.touch_at(Utc::now());
    }

    pub fn touch_at(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
    }
}
