use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{student::Student, Money};

/// A class or batch with its monthly fee and optional course-level pricing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassGroup {
    pub id: Uuid,
    pub standard: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_name: Option<String>,
    pub fee_amount: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_course_fee: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    /// Month index to full fee for that month; absent months charge `fee_amount`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fee_overrides: BTreeMap<u32, Money>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub students: Vec<Student>,
    #[serde(default)]
    pub is_pinned: bool,
}

impl ClassGroup {
    pub fn new(standard: impl Into<String>, fee_amount: Money) -> Self {
        Self {
            id: Uuid::new_v4(),
            standard: standard.into(),
            batch_name: None,
            fee_amount,
            total_course_fee: None,
            course_duration: None,
            start_date: None,
            fee_overrides: BTreeMap::new(),
            created_at: Utc::now(),
            students: Vec::new(),
            is_pinned: false,
        }
    }

    pub fn label(&self) -> String {
        match self.batch_name.as_deref().map(str::trim) {
            Some(batch) if !batch.is_empty() => batch.to_string(),
            _ => format!("Class {}", self.standard),
        }
    }

    pub fn fee_for_month(&self, index: u32) -> Money {
        self.fee_overrides
            .get(&index)
            .copied()
            .unwrap_or(self.fee_amount)
    }

    pub fn student(&self, id: Uuid) -> Option<&Student> {
        self.students.iter().find(|student| student.id == id)
    }

    pub fn student_mut(&mut self, id: Uuid) -> Option<&mut Student> {
        self.students.iter_mut().find(|student| student.id == id)
    }
}
