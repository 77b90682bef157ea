pub mod business_service;
pub mod class_service;
pub mod customer_service;
pub mod history_service;
pub mod student_service;

pub use business_service::{BusinessService, PinnedItem};
pub use class_service::{ClassService, NewClass};
pub use customer_service::{CustomerDetails, CustomerService, NewCustomer};
pub use history_service::{
    HistoryEntry, HistoryService, MonthState, ShopStats, StudentMonth, StudentSummary,
};
pub use student_service::{NewStudent, StudentDetails, StudentService};

use uuid::Uuid;

use crate::errors::LedgerError;
use crate::ledger::{Business, BusinessKind};

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Invalid(String),
}

pub(crate) fn require_kind(business: &Business, kind: BusinessKind) -> ServiceResult<()> {
    if business.kind == kind {
        Ok(())
    } else {
        Err(ServiceError::Invalid(format!(
            "{} is not a {} business",
            business.name,
            kind.to_string().to_lowercase()
        )))
    }
}

pub(crate) fn require_name(value: &str, what: &str) -> ServiceResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ServiceError::Invalid(format!("{what} name is required")))
    } else {
        Ok(trimmed.to_string())
    }
}

pub(crate) fn not_found(what: &str, id: Uuid) -> ServiceError {
    ServiceError::NotFound(format!("{what} {id} not found"))
}

/// Maps blank optional text to `None`.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}
