//! Calculators and services. No terminal I/O and no direct storage access.

pub mod balance_ledger;
pub mod fee_planner;
pub mod services;
pub mod time;

pub use balance_ledger::{BalanceChange, BalanceLedger};
pub use fee_planner::{CourseFeeInput, CourseFeePlanner, CourseMonth, Distribution, FeePlan, MonthStatus};
pub use time::{Clock, FixedClock, SystemClock};
