//! Student enrolment and fee collection.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::core::balance_ledger::{BalanceChange, BalanceLedger};
use crate::core::services::{non_blank, not_found, require_kind, require_name, ServiceError, ServiceResult};
use crate::core::time::Clock;
use crate::ledger::{Business, BusinessKind, Money, Student};

const MANUAL_PAYMENT: &str = "Manual Payment";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStudent {
    pub name: String,
    pub father_name: Option<String>,
    pub address: Option<String>,
    pub phone_number: String,
    pub photo_url: Option<String>,
    pub joining_date: NaiveDate,
    pub initial_due: Money,
}

impl NewStudent {
    pub fn new(name: impl Into<String>, phone_number: impl Into<String>, joining_date: NaiveDate) -> Self {
        Self {
            name: name.into(),
            father_name: None,
            address: None,
            phone_number: phone_number.into(),
            photo_url: None,
            joining_date,
            initial_due: 0,
        }
    }
}

/// Profile edits; `None` leaves a field unchanged, `Some("")` clears an optional one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentDetails {
    pub name: Option<String>,
    pub father_name: Option<String>,
    pub address: Option<String>,
    pub phone_number: Option<String>,
    pub photo_url: Option<String>,
    pub joining_date: Option<NaiveDate>,
}

pub struct StudentService;

impl StudentService {
    /// Enrols a student at the top of the class list.
    pub fn add(business: &mut Business, class_id: Uuid, input: NewStudent) -> ServiceResult<Uuid> {
        require_kind(business, BusinessKind::TeacherStudent)?;
        let name = require_name(&input.name, "Student")?;
        if input.initial_due < 0 {
            return Err(ServiceError::Invalid("Initial due cannot be negative".into()));
        }
        let class = business
            .class_mut(class_id)
            .ok_or_else(|| not_found("Class", class_id))?;

        let mut student = Student::new(
            name,
            input.phone_number.trim(),
            input.joining_date,
            input.initial_due,
        );
        student.father_name = non_blank(input.father_name);
        student.address = non_blank(input.address);
        student.photo_url = non_blank(input.photo_url);
        let id = student.id;
        class.students.insert(0, student);
        business.touch();
        tracing::info!(class = %class_id, student = %id, "enrolled student");
        Ok(id)
    }

    pub fn update_details(
        business: &mut Business,
        class_id: Uuid,
        student_id: Uuid,
        details: StudentDetails,
    ) -> ServiceResult<()> {
        let name = details
            .name
            .as_deref()
            .map(|name| require_name(name, "Student"))
            .transpose()?;
        let student = student_mut(business, class_id, student_id)?;
        if let Some(name) = name {
            student.name = name;
        }
        if let Some(phone) = details.phone_number {
            student.phone_number = phone.trim().to_string();
        }
        if details.father_name.is_some() {
            student.father_name = non_blank(details.father_name);
        }
        if details.address.is_some() {
            student.address = non_blank(details.address);
        }
        if details.photo_url.is_some() {
            student.photo_url = non_blank(details.photo_url);
        }
        if let Some(joined) = details.joining_date {
            student.joining_date = joined;
        }
        business.touch();
        Ok(())
    }

    pub fn remove(business: &mut Business, class_id: Uuid, student_id: Uuid) -> ServiceResult<Student> {
        let class = business
            .class_mut(class_id)
            .ok_or_else(|| not_found("Class", class_id))?;
        let index = class
            .students
            .iter()
            .position(|student| student.id == student_id)
            .ok_or_else(|| not_found("Student", student_id))?;
        let removed = class.students.remove(index);
        business.touch();
        Ok(removed)
    }

    /// Applies a payment; a missing description is recorded as a manual payment.
    pub fn record_payment(
        business: &mut Business,
        class_id: Uuid,
        student_id: Uuid,
        amount: Money,
        description: Option<&str>,
        clock: &dyn Clock,
    ) -> ServiceResult<BalanceChange> {
        let description = description
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .unwrap_or(MANUAL_PAYMENT);
        let student = student_mut(business, class_id, student_id)?;
        let change = BalanceLedger::pay_holder(clock, student, amount, description)?;
        business.touch_at(clock.now());
        tracing::info!(student = %student_id, amount, "recorded payment");
        Ok(change)
    }

    pub fn add_charge(
        business: &mut Business,
        class_id: Uuid,
        student_id: Uuid,
        amount: Money,
        description: &str,
        clock: &dyn Clock,
    ) -> ServiceResult<BalanceChange> {
        let student = student_mut(business, class_id, student_id)?;
        let change = BalanceLedger::charge_holder(clock, student, amount, description)?;
        business.touch_at(clock.now());
        tracing::info!(student = %student_id, amount, "added charge");
        Ok(change)
    }

    /// Overwrites the gross due without a history entry.
    pub fn edit_due(
        business: &mut Business,
        class_id: Uuid,
        student_id: Uuid,
        new_gross_due: Money,
    ) -> ServiceResult<BalanceChange> {
        let student = student_mut(business, class_id, student_id)?;
        let change = BalanceLedger::set_holder_due(student, new_gross_due)?;
        if change.current != change.previous {
            business.touch();
            tracing::info!(
                student = %student_id,
                from = change.previous.due,
                to = change.current.due,
                "edited due"
            );
        }
        Ok(change)
    }

    /// Pays `months` months at the class fee, recorded as "Cleared N Month(s)".
    pub fn pay_months(
        business: &mut Business,
        class_id: Uuid,
        student_id: Uuid,
        months: u32,
        clock: &dyn Clock,
    ) -> ServiceResult<BalanceChange> {
        let fee = class_fee(business, class_id)?;
        let amount = BalanceLedger::charge_for_months(fee, months)?;
        let description = cleared_description(months);
        Self::record_payment(business, class_id, student_id, amount, Some(&description), clock)
    }

    /// Raises the due by `months` months at the class fee, offsetting any advance.
    pub fn charge_months(
        business: &mut Business,
        class_id: Uuid,
        student_id: Uuid,
        months: u32,
    ) -> ServiceResult<BalanceChange> {
        let fee = class_fee(business, class_id)?;
        let amount = BalanceLedger::charge_for_months(fee, months)?;
        let current_due = student_mut(business, class_id, student_id)?.balance.due;
        let target = current_due
            .checked_add(amount)
            .ok_or_else(|| ServiceError::Invalid("Due is too large".into()))?;
        Self::edit_due(business, class_id, student_id, target)
    }

    /// Flags or unflags a course month (for example `March 2024`) as unpaid.
    pub fn toggle_pending_month(
        business: &mut Business,
        class_id: Uuid,
        student_id: Uuid,
        month_label: &str,
    ) -> ServiceResult<bool> {
        let label = month_label.trim();
        if label.is_empty() {
            return Err(ServiceError::Invalid("Month label is required".into()));
        }
        let student = student_mut(business, class_id, student_id)?;
        let pending = match student.pending_months.iter().position(|m| m == label) {
            Some(index) => {
                student.pending_months.remove(index);
                false
            }
            None => {
                student.pending_months.push(label.to_string());
                true
            }
        };
        business.touch();
        Ok(pending)
    }

    pub fn find<'a>(
        business: &'a Business,
        class_id: Uuid,
        student_id: Uuid,
    ) -> ServiceResult<&'a Student> {
        business
            .class(class_id)
            .ok_or_else(|| not_found("Class", class_id))?
            .student(student_id)
            .ok_or_else(|| not_found("Student", student_id))
    }
}

pub fn cleared_description(months: u32) -> String {
    if months == 1 {
        "Cleared 1 Month".to_string()
    } else {
        format!("Cleared {months} Months")
    }
}

fn class_fee(business: &Business, class_id: Uuid) -> ServiceResult<Money> {
    business
        .class(class_id)
        .map(|class| class.fee_amount)
        .ok_or_else(|| not_found("Class", class_id))
}

fn student_mut(business: &mut Business, class_id: Uuid, student_id: Uuid) -> ServiceResult<&mut Student> {
    business
        .class_mut(class_id)
        .ok_or_else(|| not_found("Class", class_id))?
        .student_mut(student_id)
        .ok_or_else(|| not_found("Student", student_id))
}
