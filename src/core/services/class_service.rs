//! Class and course management for institutes.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::core::fee_planner::{
    CourseFeeInput, CourseFeePlanner, Distribution, FeePlan, DEFAULT_COURSE_MONTHS,
};
use crate::core::services::{non_blank, not_found, require_kind, ServiceResult};
use crate::ledger::{Business, BusinessKind, ClassGroup, Money};

/// Form input for creating a class or editing its course terms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewClass {
    pub standard: String,
    pub batch_name: Option<String>,
    pub fee_amount: Money,
    pub total_course_fee: Option<Money>,
    pub course_duration: Option<u32>,
    pub start_date: NaiveDate,
}

impl NewClass {
    pub fn new(standard: impl Into<String>, fee_amount: Money, start_date: NaiveDate) -> Self {
        Self {
            standard: standard.into(),
            batch_name: None,
            fee_amount,
            total_course_fee: None,
            course_duration: None,
            start_date,
        }
    }

    fn fee_input(&self) -> CourseFeeInput {
        CourseFeeInput {
            monthly_fee: self.fee_amount,
            duration_months: self.course_duration.unwrap_or(DEFAULT_COURSE_MONTHS),
            total_course_fee: self.total_course_fee.filter(|total| *total > 0),
            start_date: self.start_date,
        }
    }
}

pub struct ClassService;

impl ClassService {
    /// Plans the course fees and adds the class; returns its id.
    pub fn add(
        business: &mut Business,
        input: NewClass,
        distribution: &Distribution,
    ) -> ServiceResult<Uuid> {
        require_kind(business, BusinessKind::TeacherStudent)?;
        let standard = super::require_name(&input.standard, "Class")?;
        let plan = CourseFeePlanner::plan(&input.fee_input(), distribution)?;

        let mut class = ClassGroup::new(standard, input.fee_amount);
        apply_terms(&mut class, &input, plan);
        let id = class.id;
        tracing::info!(business = %business.id, class = %id, "added class");
        business.classes.push(class);
        business.touch();
        Ok(id)
    }

    /// Replaces the fee terms of an existing class; students and balances are untouched.
    pub fn update_course(
        business: &mut Business,
        class_id: Uuid,
        input: NewClass,
        distribution: &Distribution,
    ) -> ServiceResult<FeePlan> {
        require_kind(business, BusinessKind::TeacherStudent)?;
        let standard = super::require_name(&input.standard, "Class")?;
        let plan = CourseFeePlanner::plan(&input.fee_input(), distribution)?;
        let class = business
            .class_mut(class_id)
            .ok_or_else(|| not_found("Class", class_id))?;
        class.standard = standard;
        apply_terms(class, &input, plan.clone());
        business.touch();
        Ok(plan)
    }

    /// Editable per-month extras of the stored overrides.
    pub fn current_extras(
        business: &Business,
        class_id: Uuid,
    ) -> ServiceResult<BTreeMap<u32, Money>> {
        let class = business
            .class(class_id)
            .ok_or_else(|| not_found("Class", class_id))?;
        Ok(CourseFeePlanner::extras_from_overrides(
            class.fee_amount,
            &class.fee_overrides,
        ))
    }

    pub fn toggle_pin(business: &mut Business, class_id: Uuid) -> ServiceResult<bool> {
        let class = business
            .class_mut(class_id)
            .ok_or_else(|| not_found("Class", class_id))?;
        class.is_pinned = !class.is_pinned;
        let pinned = class.is_pinned;
        business.touch();
        Ok(pinned)
    }

    pub fn remove(business: &mut Business, class_id: Uuid) -> ServiceResult<ClassGroup> {
        let index = business
            .classes
            .iter()
            .position(|class| class.id == class_id)
            .ok_or_else(|| not_found("Class", class_id))?;
        let removed = business.classes.remove(index);
        if !removed.students.is_empty() {
            tracing::warn!(
                class = %class_id,
                students = removed.students.len(),
                "removed class with enrolled students"
            );
        }
        business.touch();
        Ok(removed)
    }

    pub fn find<'a>(business: &'a Business, class_id: Uuid) -> ServiceResult<&'a ClassGroup> {
        business
            .class(class_id)
            .ok_or_else(|| not_found("Class", class_id))
    }
}

fn apply_terms(class: &mut ClassGroup, input: &NewClass, plan: FeePlan) {
    class.batch_name = non_blank(input.batch_name.clone());
    class.fee_amount = input.fee_amount;
    class.total_course_fee = input.total_course_fee.filter(|total| *total > 0);
    class.course_duration = input.course_duration;
    class.start_date = Some(input.start_date);
    class.fee_overrides = plan.fee_overrides;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::services::ServiceError;
    use crate::errors::LedgerError;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, 1).unwrap()
    }

    fn course(total: Option<Money>, months: u32) -> NewClass {
        NewClass {
            total_course_fee: total,
            course_duration: Some(months),
            ..NewClass::new("10", 500, start())
        }
    }

    #[test]
    fn add_stores_even_overrides() {
        let mut business = Business::new(BusinessKind::TeacherStudent, "Academy", None);
        let id = ClassService::add(&mut business, course(Some(5500), 10), &Distribution::Even)
            .unwrap();
        let class = business.class(id).unwrap();
        assert_eq!(class.fee_overrides.len(), 10);
        assert_eq!(class.fee_for_month(9), 550);
        assert_eq!(class.start_date, Some(start()));
    }

    #[test]
    fn add_rejects_shop_and_incomplete_distribution() {
        let mut shop = Business::new(BusinessKind::Shop, "Store", None);
        let err = ClassService::add(&mut shop, course(None, 10), &Distribution::None).unwrap_err();
        assert!(matches!(err, ServiceError::Invalid(_)));

        let mut institute = Business::new(BusinessKind::TeacherStudent, "Academy", None);
        let manual = BTreeMap::from([(0, 100)]);
        let err = ClassService::add(
            &mut institute,
            course(Some(5500), 10),
            &Distribution::Manual(manual),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Ledger(LedgerError::IncompleteDistribution { deficit: 500, .. })
        ));
        assert!(institute.classes.is_empty());
    }

    #[test]
    fn update_course_replaces_overrides() {
        let mut business = Business::new(BusinessKind::TeacherStudent, "Academy", None);
        let id = ClassService::add(&mut business, course(Some(3100), 6), &Distribution::Even)
            .unwrap();
        assert_eq!(
            ClassService::current_extras(&business, id).unwrap(),
            BTreeMap::from([(0, 17), (1, 17), (2, 17), (3, 17), (4, 16), (5, 16)])
        );

        let plan = ClassService::update_course(&mut business, id, course(Some(2000), 6), &Distribution::None)
            .unwrap();
        assert!(plan.is_surplus());
        let class = business.class(id).unwrap();
        assert!(class.fee_overrides.is_empty());
        assert_eq!(class.total_course_fee, Some(2000));
    }

    #[test]
    fn remove_and_pin_unknown_class_fail() {
        let mut business = Business::new(BusinessKind::TeacherStudent, "Academy", None);
        let missing = Uuid::new_v4();
        assert!(matches!(
            ClassService::toggle_pin(&mut business, missing),
            Err(ServiceError::NotFound(_))
        ));
        assert!(ClassService::remove(&mut business, missing).is_err());
    }
}
