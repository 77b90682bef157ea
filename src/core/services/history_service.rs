//! Read-only views over payment histories: the global feed, shop stats and the
//! per-student course calendar.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::core::fee_planner::{CourseFeePlanner, CourseMonth, MonthStatus};
use crate::ledger::{Business, BusinessKind, ClassGroup, Money, Student, TransactionRecord};

/// A history record with the context needed to display and navigate to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub record: TransactionRecord,
    pub party_id: Uuid,
    pub party_name: String,
    pub business_id: Uuid,
    pub business_name: String,
    pub business_kind: BusinessKind,
    pub class_id: Option<Uuid>,
    pub class_label: Option<String>,
}

impl HistoryEntry {
    fn matches(&self, needle: &str) -> bool {
        let contains = |text: &str| text.to_lowercase().contains(needle);
        contains(&self.party_name)
            || contains(&self.business_name)
            || self.class_label.as_deref().is_some_and(contains)
            || contains(&self.record.description)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShopStats {
    pub total_due: Money,
    pub collected_today: Money,
    pub customer_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonthState {
    Cleared,
    Due,
    Free,
    Future,
}

impl MonthState {
    pub fn label(self) -> &'static str {
        match self {
            MonthState::Cleared => "CLEARED",
            MonthState::Due => "DUE",
            MonthState::Free => "FREE",
            MonthState::Future => "FUTURE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentMonth {
    pub month: CourseMonth,
    pub state: MonthState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentSummary {
    pub total_paid: Money,
    pub total_course_fee: Option<Money>,
    pub fully_paid: bool,
    pub months: Vec<StudentMonth>,
}

pub struct HistoryService;

impl HistoryService {
    /// Every record across all businesses, newest first.
    pub fn all_transactions(businesses: &[Business]) -> Vec<HistoryEntry> {
        let mut entries = Vec::new();
        for business in businesses {
            for class in &business.classes {
                for student in &class.students {
                    entries.extend(student.payment_history.iter().map(|record| HistoryEntry {
                        record: record.clone(),
                        party_id: student.id,
                        party_name: student.name.clone(),
                        business_id: business.id,
                        business_name: business.name.clone(),
                        business_kind: business.kind,
                        class_id: Some(class.id),
                        class_label: Some(class.label()),
                    }));
                }
            }
            for customer in &business.customers {
                entries.extend(customer.payment_history.iter().map(|record| HistoryEntry {
                    record: record.clone(),
                    party_id: customer.id,
                    party_name: customer.name.clone(),
                    business_id: business.id,
                    business_name: business.name.clone(),
                    business_kind: business.kind,
                    class_id: None,
                    class_label: None,
                }));
            }
        }
        entries.sort_by(|a, b| b.record.date.cmp(&a.record.date));
        entries
    }

    /// Case-insensitive match on party, business, class or description.
    pub fn search<'a>(entries: &'a [HistoryEntry], query: &str) -> Vec<&'a HistoryEntry> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return entries.iter().collect();
        }
        entries.iter().filter(|entry| entry.matches(&needle)).collect()
    }

    /// Sum of received payments; charges are not revenue.
    pub fn total_revenue<'a>(entries: impl IntoIterator<Item = &'a HistoryEntry>) -> Money {
        entries
            .into_iter()
            .filter(|entry| entry.record.is_payment())
            .map(|entry| entry.record.amount)
            .sum()
    }

    /// Consecutive entries sharing a calendar day; expects newest-first input.
    pub fn group_by_day<'a>(entries: &[&'a HistoryEntry]) -> Vec<(NaiveDate, Vec<&'a HistoryEntry>)> {
        let mut groups: Vec<(NaiveDate, Vec<&'a HistoryEntry>)> = Vec::new();
        for entry in entries {
            let day = entry.record.date.date_naive();
            match groups.last_mut() {
                Some((current, bucket)) if *current == day => bucket.push(*entry),
                _ => groups.push((day, vec![*entry])),
            }
        }
        groups
    }

    pub fn shop_stats(business: &Business, today: NaiveDate) -> ShopStats {
        business
            .customers
            .iter()
            .fold(ShopStats::default(), |mut stats, customer| {
                stats.total_due += customer.balance.due;
                stats.customer_count += 1;
                stats.collected_today += customer
                    .payment_history
                    .iter()
                    .filter(|record| record.is_payment() && record.date.date_naive() == today)
                    .map(|record| record.amount)
                    .sum::<Money>();
                stats
            })
    }

    /// Course progress of a student; the calendar starts at the class start date or,
    /// failing that, the joining date.
    pub fn student_summary(class: &ClassGroup, student: &Student, today: NaiveDate) -> StudentSummary {
        let total_paid = student.total_paid();
        let cap = class.total_course_fee.filter(|total| *total > 0);
        let fully_paid = cap.is_some_and(|total| total_paid >= total);

        let months = CourseFeePlanner::course_calendar(class, student.joining_date)
            .into_iter()
            .map(|month| {
                let state = month_state(&month, student, cap, total_paid, fully_paid, today);
                StudentMonth { month, state }
            })
            .collect();

        StudentSummary {
            total_paid,
            total_course_fee: cap,
            fully_paid,
            months,
        }
    }
}

fn month_state(
    month: &CourseMonth,
    student: &Student,
    cap: Option<Money>,
    total_paid: Money,
    fully_paid: bool,
    today: NaiveDate,
) -> MonthState {
    if let MonthStatus::Free = month.status {
        return MonthState::Free;
    }
    let label = month.label();
    if student.pending_months.iter().any(|pending| *pending == label) {
        return MonthState::Due;
    }
    if fully_paid {
        return MonthState::Cleared;
    }
    let owed_through = cap.map_or(month.cumulative, |total| month.cumulative.min(total));
    if total_paid >= owed_through {
        return MonthState::Cleared;
    }
    if month.date > today {
        return MonthState::Future;
    }
    MonthState::Cleared
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;
    use crate::ledger::{Customer, PaymentKind};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(kind: PaymentKind, amount: Money, day: u32, description: &str) -> TransactionRecord {
        TransactionRecord::new(
            kind,
            amount,
            description,
            Utc.with_ymd_and_hms(2024, 6, day, 10, 0, 0).unwrap(),
        )
    }

    fn sample() -> Vec<Business> {
        let mut institute = Business::new(BusinessKind::TeacherStudent, "Bright Academy", None);
        let mut class = ClassGroup::new("10", 500);
        let mut student = Student::new("Asha", "", date(2024, 1, 1), 0);
        student.payment_history.push(record(PaymentKind::Payment, 500, 3, "Cleared 1 Month"));
        class.students.push(student);
        institute.classes.push(class);

        let mut shop = Business::new(BusinessKind::Shop, "Corner Store", None);
        let mut customer = Customer::new("general", "Ravi", "", 0);
        customer.payment_history.push(record(PaymentKind::DueAdded, 120, 5, "Rice"));
        customer.payment_history.push(record(PaymentKind::Payment, 80, 5, "Cash"));
        customer.balance.due = 40;
        shop.customers.push(customer);
        vec![institute, shop]
    }

    #[test]
    fn all_transactions_sorted_newest_first_and_searchable() {
        let businesses = sample();
        let entries = HistoryService::all_transactions(&businesses);
        assert_eq!(entries.len(), 3);
        assert_eq!(entries.last().unwrap().party_name, "Asha");
        assert_eq!(entries.last().unwrap().class_label.as_deref(), Some("Class 10"));

        assert_eq!(HistoryService::search(&entries, "corner").len(), 2);
        assert_eq!(HistoryService::search(&entries, "CLASS 10").len(), 1);
        assert_eq!(HistoryService::search(&entries, "rice").len(), 1);
        assert_eq!(HistoryService::search(&entries, "  ").len(), 3);
        assert_eq!(HistoryService::total_revenue(&entries), 580);

        let all: Vec<&HistoryEntry> = entries.iter().collect();
        let days = HistoryService::group_by_day(&all);
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].0, date(2024, 6, 5));
        assert_eq!(days[0].1.len(), 2);
    }

    #[test]
    fn shop_stats_count_only_todays_payments() {
        let businesses = sample();
        let stats = HistoryService::shop_stats(&businesses[1], date(2024, 6, 5));
        assert_eq!(
            stats,
            ShopStats {
                total_due: 40,
                collected_today: 80,
                customer_count: 1
            }
        );
        let other_day = HistoryService::shop_stats(&businesses[1], date(2024, 6, 6));
        assert_eq!(other_day.collected_today, 0);
    }

    #[test]
    fn student_summary_marks_free_due_and_future_months() {
        let mut class = ClassGroup::new("10", 500);
        class.course_duration = Some(4);
        class.total_course_fee = Some(1200);
        class.start_date = Some(date(2024, 1, 1));
        let mut student = Student::new("Asha", "", date(2024, 1, 1), 0);
        student.payment_history.push(TransactionRecord::new(
            PaymentKind::Payment,
            500,
            "Cleared 1 Month",
            Utc::now() - Duration::days(1),
        ));
        student.pending_months.push("February 2024".into());

        let summary = HistoryService::student_summary(&class, &student, date(2024, 2, 15));
        let states: Vec<MonthState> = summary.months.iter().map(|m| m.state).collect();
        assert_eq!(
            states,
            vec![
                MonthState::Cleared,
                MonthState::Due,
                MonthState::Future,
                MonthState::Free
            ]
        );
        assert_eq!(summary.total_paid, 500);
        assert!(!summary.fully_paid);
    }

    #[test]
    fn fully_paid_course_clears_every_charged_month() {
        let mut class = ClassGroup::new("10", 500);
        class.course_duration = Some(3);
        class.total_course_fee = Some(1000);
        let mut student = Student::new("Asha", "", date(2024, 1, 1), 0);
        student.payment_history.push(TransactionRecord::new(
            PaymentKind::Payment,
            1000,
            "Cleared 2 Months",
            Utc::now(),
        ));
        let summary = HistoryService::student_summary(&class, &student, date(2024, 1, 10));
        assert!(summary.fully_paid);
        let states: Vec<MonthState> = summary.months.iter().map(|m| m.state).collect();
        assert_eq!(states, vec![MonthState::Cleared, MonthState::Cleared, MonthState::Free]);
        assert_eq!(summary.months[0].month.date, date(2024, 1, 1));
    }
}
