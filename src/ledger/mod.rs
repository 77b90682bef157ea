//! Domain models for businesses, courses, and the balances owed by students and customers.

pub mod balance;
pub mod business;
pub mod class_group;
pub mod customer;
pub mod student;

pub use balance::{Balance, BalanceHolder, PaymentKind, TransactionRecord};
pub use business::{Business, BusinessKind, DEFAULT_GROUP_ID, DEFAULT_GROUP_NAME};
pub use class_group::ClassGroup;
pub use customer::{Customer, CustomerGroup};
pub use student::Student;

/// Whole currency units. Sub-unit fractions are never tracked.
pub type Money = i64;
