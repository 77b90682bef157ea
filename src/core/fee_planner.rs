//! Reconciles a course's declared total fee against its flat monthly schedule.
//!
//! When the total exceeds `monthly_fee * duration`, the deficit is spread across months
//! either evenly or by hand and stored as per-month overrides. When the total is lower,
//! no overrides are produced; trailing months become free once the cumulative scheduled
//! cost reaches the total (see [`CourseFeePlanner::month_status`]).

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, Months, NaiveDate};

use crate::{
    errors::LedgerError,
    ledger::{ClassGroup, Money},
};

/// Course length assumed when a class carries no explicit duration.
pub const DEFAULT_COURSE_MONTHS: u32 = 12;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseFeeInput {
    pub monthly_fee: Money,
    pub duration_months: u32,
    pub total_course_fee: Option<Money>,
    pub start_date: NaiveDate,
}

/// How a positive deficit is assigned to months.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Distribution {
    /// Nothing distributed yet. Only valid when there is no deficit.
    #[default]
    None,
    Even,
    /// Extra amount per month index.
    Manual(BTreeMap<u32, Money>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeePlan {
    pub base_total: Money,
    /// `total_course_fee - base_total`, or zero when no total was declared.
    pub deficit: Money,
    pub months: Vec<NaiveDate>,
    pub extras: BTreeMap<u32, Money>,
    pub fee_overrides: BTreeMap<u32, Money>,
}

impl FeePlan {
    pub fn distributed(&self) -> Money {
        self.extras.values().sum()
    }

    pub fn is_surplus(&self) -> bool {
        self.deficit < 0
    }
}

/// Effective charge for a single course month once the course cap is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonthStatus {
    Free,
    Charged(Money),
}

impl MonthStatus {
    pub fn amount(self) -> Money {
        match self {
            MonthStatus::Free => 0,
            MonthStatus::Charged(amount) => amount,
        }
    }

    pub fn is_free(self) -> bool {
        matches!(self, MonthStatus::Free)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseMonth {
    pub index: u32,
    pub date: NaiveDate,
    /// `<year>-<zero based month>` calendar key.
    pub key: String,
    pub scheduled_fee: Money,
    /// Sum of scheduled fees up to and including this month.
    pub cumulative: Money,
    pub status: MonthStatus,
}

impl CourseMonth {
    pub fn label(&self) -> String {
        month_label(self.date)
    }
}

pub struct CourseFeePlanner;

impl CourseFeePlanner {
    /// Computes the deficit, the course months, and the fee overrides for a course.
    pub fn plan(input: &CourseFeeInput, distribution: &Distribution) -> Result<FeePlan, LedgerError> {
        if input.monthly_fee < 0 {
            return Err(LedgerError::invalid("monthly fee cannot be negative"));
        }
        if input.duration_months == 0 {
            return Err(LedgerError::invalid("course duration must be at least one month"));
        }
        let base_total = input
            .monthly_fee
            .checked_mul(Money::from(input.duration_months))
            .ok_or_else(|| LedgerError::invalid("course fee schedule overflows"))?;
        let deficit = match input.total_course_fee {
            Some(total) if total > 0 => total - base_total,
            _ => 0,
        };
        let months = Self::months_list(input.start_date, input.duration_months);

        if deficit <= 0 {
            return Ok(FeePlan {
                base_total,
                deficit,
                months,
                extras: BTreeMap::new(),
                fee_overrides: BTreeMap::new(),
            });
        }

        let extras = match distribution {
            Distribution::None => BTreeMap::new(),
            Distribution::Even => Self::even_distribution(deficit, input.duration_months)?,
            Distribution::Manual(manual) => {
                Self::validate_manual(manual, input.duration_months)?;
                manual.clone()
            }
        };
        let distributed = extras
            .values()
            .try_fold(0 as Money, |sum, extra| sum.checked_add(*extra))
            .ok_or_else(|| LedgerError::invalid("distributed extras overflow"))?;
        if distributed != deficit {
            return Err(LedgerError::IncompleteDistribution {
                deficit,
                distributed,
            });
        }

        let fee_overrides = extras
            .iter()
            .filter(|(_, extra)| **extra > 0)
            .map(|(index, extra)| {
                input
                    .monthly_fee
                    .checked_add(*extra)
                    .map(|fee| (*index, fee))
                    .ok_or_else(|| LedgerError::invalid("monthly fee with extra overflows"))
            })
            .collect::<Result<BTreeMap<_, _>, _>>()?;

        Ok(FeePlan {
            base_total,
            deficit,
            months,
            extras,
            fee_overrides,
        })
    }

    /// Spreads `deficit` over `months`; the first `deficit % months` months get one extra unit.
    pub fn even_distribution(deficit: Money, months: u32) -> Result<BTreeMap<u32, Money>, LedgerError> {
        if months == 0 {
            return Err(LedgerError::invalid("cannot distribute over zero months"));
        }
        if deficit < 0 {
            return Err(LedgerError::invalid("deficit cannot be negative"));
        }
        let count = Money::from(months);
        let per_month = deficit / count;
        let remainder = deficit % count;
        Ok((0..months)
            .map(|index| {
                let bump = if Money::from(index) < remainder { 1 } else { 0 };
                (index, per_month + bump)
            })
            .collect())
    }

    /// Recovers editable per-month extras from stored overrides.
    pub fn extras_from_overrides(
        monthly_fee: Money,
        overrides: &BTreeMap<u32, Money>,
    ) -> BTreeMap<u32, Money> {
        overrides
            .iter()
            .filter(|(_, fee)| **fee > monthly_fee)
            .map(|(index, fee)| (*index, fee - monthly_fee))
            .collect()
    }

    /// Course months starting at `start`; month `i` is `start` advanced by `i` calendar months.
    pub fn months_list(start: NaiveDate, duration_months: u32) -> Vec<NaiveDate> {
        (0..duration_months)
            .map(|offset| add_months(start, offset))
            .collect()
    }

    /// Status of a month given its scheduled cost and the cumulative cost through it.
    ///
    /// Without a positive cap every month is charged in full. Otherwise a month is free once
    /// the months before it already reach the cap, and a month straddling the cap is charged
    /// only the remainder.
    pub fn month_status(
        month_cost: Money,
        cumulative_inclusive: Money,
        total_course_fee: Option<Money>,
    ) -> MonthStatus {
        let cap = match total_course_fee {
            Some(total) if total > 0 => total,
            _ => return MonthStatus::Charged(month_cost),
        };
        let before = cumulative_inclusive - month_cost;
        if before >= cap {
            MonthStatus::Free
        } else if cumulative_inclusive > cap {
            MonthStatus::Charged(cap - before)
        } else {
            MonthStatus::Charged(month_cost)
        }
    }

    /// Month-by-month schedule of a class, falling back to `fallback_start` when undated.
    pub fn course_calendar(class: &ClassGroup, fallback_start: NaiveDate) -> Vec<CourseMonth> {
        let start = class.start_date.unwrap_or(fallback_start);
        let duration = class
            .course_duration
            .filter(|months| *months > 0)
            .unwrap_or(DEFAULT_COURSE_MONTHS);
        let mut cumulative: Money = 0;
        Self::months_list(start, duration)
            .into_iter()
            .zip(0u32..)
            .map(|(date, index)| {
                let scheduled_fee = class.fee_for_month(index);
                cumulative += scheduled_fee;
                CourseMonth {
                    index,
                    date,
                    key: month_key(date),
                    scheduled_fee,
                    cumulative,
                    status: Self::month_status(scheduled_fee, cumulative, class.total_course_fee),
                }
            })
            .collect()
    }

    fn validate_manual(manual: &BTreeMap<u32, Money>, duration: u32) -> Result<(), LedgerError> {
        for (index, extra) in manual {
            if *index >= duration {
                return Err(LedgerError::invalid(format!(
                    "month {} is outside a {}-month course",
                    index, duration
                )));
            }
            if *extra < 0 {
                return Err(LedgerError::invalid(format!(
                    "extra fee for month {} cannot be negative",
                    index
                )));
            }
        }
        Ok(())
    }
}

/// Adds calendar months keeping the day of month; surplus days spill into the next month.
pub fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
    let first = date
        .with_day(1)
        .and_then(|first| first.checked_add_months(Months::new(months)));
    first
        .and_then(|first| first.checked_add_signed(Duration::days(i64::from(date.day()) - 1)))
        .unwrap_or(NaiveDate::MAX)
}

pub fn month_key(date: NaiveDate) -> String {
    format!("{}-{}", date.year(), date.month0())
}

/// Long month name and year, for example `March 2024`.
pub fn month_label(date: NaiveDate) -> String {
    date.format("%B %Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn input(monthly_fee: Money, duration_months: u32, total: Option<Money>) -> CourseFeeInput {
        CourseFeeInput {
            monthly_fee,
            duration_months,
            total_course_fee: total,
            start_date: date(2024, 4, 1),
        }
    }

    #[test]
    fn even_distribution_over_ten_months() {
        let plan = CourseFeePlanner::plan(&input(500, 10, Some(5500)), &Distribution::Even).unwrap();
        assert_eq!(plan.base_total, 5000);
        assert_eq!(plan.deficit, 500);
        assert_eq!(plan.fee_overrides.len(), 10);
        assert!(plan.fee_overrides.values().all(|fee| *fee == 550));
    }

    #[test]
    fn even_distribution_gives_remainder_to_first_months() {
        let plan = CourseFeePlanner::plan(&input(500, 3, Some(1510)), &Distribution::Even).unwrap();
        assert_eq!(plan.deficit, 10);
        assert_eq!(plan.fee_overrides.get(&0), Some(&504));
        assert_eq!(plan.fee_overrides.get(&1), Some(&503));
        assert_eq!(plan.fee_overrides.get(&2), Some(&503));
    }

    #[test]
    fn even_distribution_sums_to_deficit_and_differs_by_at_most_one() {
        for months in 1..=24u32 {
            for deficit in [1, 7, 99, 1000, 12345] {
                let extras = CourseFeePlanner::even_distribution(deficit, months).unwrap();
                assert_eq!(extras.values().sum::<Money>(), deficit);
                let max = extras.values().max().unwrap();
                let min = extras.values().min().unwrap();
                assert!(*min >= 0);
                assert!(max - min <= 1);
            }
        }
    }

    #[test]
    fn small_deficit_only_overrides_months_with_extra() {
        let plan = CourseFeePlanner::plan(&input(500, 6, Some(3002)), &Distribution::Even).unwrap();
        assert_eq!(plan.fee_overrides.len(), 2);
        assert_eq!(plan.fee_overrides.get(&0), Some(&501));
        assert_eq!(plan.fee_overrides.get(&1), Some(&501));
        assert_eq!(plan.extras.len(), 6);
    }

    #[test]
    fn manual_distribution_must_cover_deficit() {
        let mut manual = BTreeMap::new();
        manual.insert(0, 200);
        manual.insert(2, 200);
        let err = CourseFeePlanner::plan(&input(500, 3, Some(2000)), &Distribution::Manual(manual))
            .unwrap_err();
        assert_eq!(
            err,
            LedgerError::IncompleteDistribution {
                deficit: 500,
                distributed: 400
            }
        );
    }

    #[test]
    fn manual_distribution_accepted_when_exact() {
        let mut manual = BTreeMap::new();
        manual.insert(1, 300);
        manual.insert(2, 200);
        let plan = CourseFeePlanner::plan(&input(500, 3, Some(2000)), &Distribution::Manual(manual))
            .unwrap();
        assert_eq!(plan.fee_overrides.get(&0), None);
        assert_eq!(plan.fee_overrides.get(&1), Some(&800));
        assert_eq!(plan.fee_overrides.get(&2), Some(&700));
    }

    #[test]
    fn manual_distribution_rejects_negative_or_out_of_range_months() {
        let negative = BTreeMap::from([(0, 600), (1, -100)]);
        assert!(matches!(
            CourseFeePlanner::plan(&input(500, 3, Some(2000)), &Distribution::Manual(negative)),
            Err(LedgerError::InvalidArgument(_))
        ));
        let outside = BTreeMap::from([(3, 500)]);
        assert!(matches!(
            CourseFeePlanner::plan(&input(500, 3, Some(2000)), &Distribution::Manual(outside)),
            Err(LedgerError::InvalidArgument(_))
        ));
    }

    #[test]
    fn undistributed_deficit_is_rejected() {
        let err = CourseFeePlanner::plan(&input(500, 3, Some(1600)), &Distribution::None).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::IncompleteDistribution {
                deficit: 100,
                distributed: 0
            }
        ));
    }

    #[test]
    fn surplus_and_missing_total_produce_no_overrides() {
        let surplus = CourseFeePlanner::plan(&input(500, 10, Some(4000)), &Distribution::Even).unwrap();
        assert_eq!(surplus.deficit, -1000);
        assert!(surplus.is_surplus());
        assert!(surplus.fee_overrides.is_empty());

        let none = CourseFeePlanner::plan(&input(500, 10, None), &Distribution::None).unwrap();
        assert_eq!(none.deficit, 0);
        assert!(none.fee_overrides.is_empty());

        let zero = CourseFeePlanner::plan(&input(500, 10, Some(0)), &Distribution::None).unwrap();
        assert_eq!(zero.deficit, 0);
    }

    #[test]
    fn invalid_inputs_are_rejected() {
        assert!(matches!(
            CourseFeePlanner::plan(&input(-1, 3, None), &Distribution::None),
            Err(LedgerError::InvalidArgument(_))
        ));
        assert!(matches!(
            CourseFeePlanner::plan(&input(500, 0, None), &Distribution::None),
            Err(LedgerError::InvalidArgument(_))
        ));
    }

    #[test]
    fn oversized_manual_extras_are_rejected() {
        let manual = Distribution::Manual(BTreeMap::from([(0, Money::MAX), (1, 1)]));
        assert!(matches!(
            CourseFeePlanner::plan(&input(1, 2, Some(100)), &manual),
            Err(LedgerError::InvalidArgument(_))
        ));
    }

    #[test]
    fn month_stepping_spills_short_months_forward() {
        assert_eq!(add_months(date(2023, 1, 31), 1), date(2023, 3, 3));
        assert_eq!(add_months(date(2024, 1, 31), 1), date(2024, 3, 2));
        assert_eq!(add_months(date(2023, 1, 31), 2), date(2023, 3, 31));
        assert_eq!(add_months(date(2023, 11, 15), 3), date(2024, 2, 15));

        let months = CourseFeePlanner::months_list(date(2024, 10, 1), 4);
        assert_eq!(
            months,
            vec![date(2024, 10, 1), date(2024, 11, 1), date(2024, 12, 1), date(2025, 1, 1)]
        );
        assert_eq!(month_key(months[3]), "2025-0");
    }

    #[test]
    fn month_status_charges_remainder_then_goes_free() {
        let cap = Some(1200);
        assert_eq!(CourseFeePlanner::month_status(500, 500, cap), MonthStatus::Charged(500));
        assert_eq!(CourseFeePlanner::month_status(500, 1000, cap), MonthStatus::Charged(500));
        assert_eq!(CourseFeePlanner::month_status(500, 1500, cap), MonthStatus::Charged(200));
        assert_eq!(CourseFeePlanner::month_status(500, 2000, cap), MonthStatus::Free);
        assert_eq!(CourseFeePlanner::month_status(500, 2000, None), MonthStatus::Charged(500));
    }

    #[test]
    fn extras_round_trip_through_overrides() {
        let plan = CourseFeePlanner::plan(&input(500, 3, Some(1510)), &Distribution::Even).unwrap();
        let extras = CourseFeePlanner::extras_from_overrides(500, &plan.fee_overrides);
        assert_eq!(extras, BTreeMap::from([(0, 4), (1, 3), (2, 3)]));
    }

    #[test]
    fn course_calendar_applies_overrides_and_cap() {
        let mut class = ClassGroup::new("10", 500);
        class.course_duration = Some(4);
        class.total_course_fee = Some(1700);
        class.start_date = Some(date(2024, 1, 10));
        class.fee_overrides.insert(0, 600);

        let calendar = CourseFeePlanner::course_calendar(&class, date(2024, 6, 1));
        assert_eq!(calendar.len(), 4);
        assert_eq!(calendar[0].scheduled_fee, 600);
        assert_eq!(calendar[2].cumulative, 1600);
        assert_eq!(calendar[3].status, MonthStatus::Charged(100));
        assert_eq!(calendar[1].label(), "February 2024");
    }

    #[test]
    fn course_calendar_defaults_to_a_year() {
        let class = ClassGroup::new("8", 300);
        let calendar = CourseFeePlanner::course_calendar(&class, date(2024, 6, 1));
        assert_eq!(calendar.len(), DEFAULT_COURSE_MONTHS as usize);
        assert_eq!(calendar[0].date, date(2024, 6, 1));
    }
}
