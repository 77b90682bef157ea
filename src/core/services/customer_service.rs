//! Shop customers, their groups and credit.

use uuid::Uuid;

use crate::core::balance_ledger::{BalanceChange, BalanceLedger};
use crate::core::services::{non_blank, not_found, require_kind, require_name, ServiceError, ServiceResult};
use crate::core::time::Clock;
use crate::ledger::{Business, BusinessKind, Customer, CustomerGroup, Money, DEFAULT_GROUP_ID};

const DUE_ADDED_DEFAULT: &str = "Added manually";
const PAYMENT_DEFAULT: &str = "Payment received";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCustomer {
    /// Target group; the default group when `None`.
    pub group_id: Option<String>,
    pub name: String,
    pub phone_number: String,
    pub address: Option<String>,
    pub photo_url: Option<String>,
    pub initial_due: Money,
}

impl NewCustomer {
    pub fn new(name: impl Into<String>, phone_number: impl Into<String>) -> Self {
        Self {
            group_id: None,
            name: name.into(),
            phone_number: phone_number.into(),
            address: None,
            photo_url: None,
            initial_due: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerDetails {
    pub name: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub photo_url: Option<String>,
    pub group_id: Option<String>,
}

pub struct CustomerService;

impl CustomerService {
    pub fn add_group(business: &mut Business, name: &str) -> ServiceResult<String> {
        require_kind(business, BusinessKind::Shop)?;
        let name = require_name(name, "Group")?;
        if business
            .customer_groups
            .iter()
            .any(|group| group.name.eq_ignore_ascii_case(&name))
        {
            return Err(ServiceError::Invalid(format!("Group '{name}' already exists")));
        }
        let group = CustomerGroup::new(name);
        let id = group.id.clone();
        business.customer_groups.push(group);
        business.touch();
        Ok(id)
    }

    /// Gives a group-less shop the default group and moves orphaned customers into it.
    /// Returns true when anything changed.
    pub fn ensure_default_group(business: &mut Business) -> bool {
        if business.kind != BusinessKind::Shop {
            return false;
        }
        let mut changed = false;
        if business.customer_groups.is_empty() {
            business.customer_groups.push(CustomerGroup::general());
            changed = true;
        }
        for customer in &mut business.customers {
            if customer.group_id.trim().is_empty() {
                customer.group_id = DEFAULT_GROUP_ID.to_string();
                changed = true;
            }
        }
        if changed {
            tracing::debug!(business = %business.id, "repaired customer groups");
            business.touch();
        }
        changed
    }

    pub fn add(business: &mut Business, input: NewCustomer, clock: &dyn Clock) -> ServiceResult<Uuid> {
        require_kind(business, BusinessKind::Shop)?;
        Self::ensure_default_group(business);
        let name = require_name(&input.name, "Customer")?;
        if input.initial_due < 0 {
            return Err(ServiceError::Invalid("Initial due cannot be negative".into()));
        }
        let group_id = match input.group_id {
            Some(id) => resolve_group(business, &id)?,
            None => business
                .customer_groups
                .first()
                .map(|group| group.id.clone())
                .unwrap_or_else(Customer::default_group_id),
        };

        let mut customer = Customer::new(group_id, name, input.phone_number.trim(), input.initial_due);
        customer.address = non_blank(input.address);
        customer.photo_url = non_blank(input.photo_url);
        let now = clock.now();
        customer.created_at = now;
        customer.touch(now);
        let id = customer.id;
        business.customers.insert(0, customer);
        business.touch_at(now);
        tracing::info!(business = %business.id, customer = %id, "added customer");
        Ok(id)
    }

    pub fn update_details(
        business: &mut Business,
        customer_id: Uuid,
        details: CustomerDetails,
        clock: &dyn Clock,
    ) -> ServiceResult<()> {
        let name = details
            .name
            .as_deref()
            .map(|name| require_name(name, "Customer"))
            .transpose()?;
        let group_id = details
            .group_id
            .as_deref()
            .map(|id| resolve_group(business, id))
            .transpose()?;
        let customer = business
            .customer_mut(customer_id)
            .ok_or_else(|| not_found("Customer", customer_id))?;
        if let Some(name) = name {
            customer.name = name;
        }
        if let Some(phone) = details.phone_number {
            customer.phone_number = phone.trim().to_string();
        }
        if details.address.is_some() {
            customer.address = non_blank(details.address);
        }
        if details.photo_url.is_some() {
            customer.photo_url = non_blank(details.photo_url);
        }
        if let Some(group_id) = group_id {
            customer.group_id = group_id;
        }
        let now = clock.now();
        customer.touch(now);
        business.touch_at(now);
        Ok(())
    }

    pub fn toggle_pin(business: &mut Business, customer_id: Uuid) -> ServiceResult<bool> {
        let customer = business
            .customer_mut(customer_id)
            .ok_or_else(|| not_found("Customer", customer_id))?;
        customer.is_pinned = !customer.is_pinned;
        let pinned = customer.is_pinned;
        business.touch();
        Ok(pinned)
    }

    pub fn remove(business: &mut Business, customer_id: Uuid) -> ServiceResult<Customer> {
        let index = business
            .customers
            .iter()
            .position(|customer| customer.id == customer_id)
            .ok_or_else(|| not_found("Customer", customer_id))?;
        let removed = business.customers.remove(index);
        business.touch();
        Ok(removed)
    }

    pub fn add_due(
        business: &mut Business,
        customer_id: Uuid,
        amount: Money,
        description: Option<&str>,
        clock: &dyn Clock,
    ) -> ServiceResult<BalanceChange> {
        let description = describe(description, DUE_ADDED_DEFAULT);
        let customer = business
            .customer_mut(customer_id)
            .ok_or_else(|| not_found("Customer", customer_id))?;
        let change = BalanceLedger::charge_holder(clock, customer, amount, description)?;
        business.touch_at(clock.now());
        tracing::info!(customer = %customer_id, amount, "added due");
        Ok(change)
    }

    pub fn clear_due(
        business: &mut Business,
        customer_id: Uuid,
        amount: Money,
        description: Option<&str>,
        clock: &dyn Clock,
    ) -> ServiceResult<BalanceChange> {
        let description = describe(description, PAYMENT_DEFAULT);
        let customer = business
            .customer_mut(customer_id)
            .ok_or_else(|| not_found("Customer", customer_id))?;
        let change = BalanceLedger::pay_holder(clock, customer, amount, description)?;
        business.touch_at(clock.now());
        tracing::info!(customer = %customer_id, amount, "received payment");
        Ok(change)
    }

    /// Customers of one group in stored order.
    pub fn in_group<'a>(business: &'a Business, group_id: &str) -> Vec<&'a Customer> {
        business
            .customers
            .iter()
            .filter(|customer| customer.group_id == group_id)
            .collect()
    }

    /// Customers as a shop lists them: pinned first, then most recently updated.
    /// `group_id` narrows the list to one group.
    pub fn ordered<'a>(business: &'a Business, group_id: Option<&str>) -> Vec<&'a Customer> {
        let mut customers: Vec<&Customer> = business
            .customers
            .iter()
            .filter(|customer| group_id.map_or(true, |id| customer.group_id == id))
            .collect();
        customers.sort_by(|a, b| {
            b.is_pinned
                .cmp(&a.is_pinned)
                .then_with(|| b.updated_at.cmp(&a.updated_at))
        });
        customers
    }

    pub fn find(business: &Business, customer_id: Uuid) -> ServiceResult<&Customer> {
        business
            .customer(customer_id)
            .ok_or_else(|| not_found("Customer", customer_id))
    }
}

fn describe<'a>(description: Option<&'a str>, fallback: &'a str) -> &'a str {
    description
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .unwrap_or(fallback)
}

fn resolve_group(business: &Business, id: &str) -> ServiceResult<String> {
    business
        .group(id)
        .map(|group| group.id.clone())
        .ok_or_else(|| ServiceError::NotFound(format!("Group {id} not found")))
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::core::time::FixedClock;
    use crate::ledger::{Balance, PaymentKind};

    fn clock() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap())
    }

    fn shop_with_customer(initial_due: Money) -> (Business, Uuid) {
        let mut shop = Business::new(BusinessKind::Shop, "Store", None);
        let id = CustomerService::add(
            &mut shop,
            NewCustomer {
                initial_due,
                ..NewCustomer::new("Ravi", "90000 11111")
            },
            &clock(),
        )
        .unwrap();
        (shop, id)
    }

    #[test]
    fn add_due_uses_default_description_and_consumes_advance() {
        let (mut shop, id) = shop_with_customer(0);
        CustomerService::clear_due(&mut shop, id, 200, None, &clock()).unwrap();
        let change = CustomerService::add_due(&mut shop, id, 300, None, &clock()).unwrap();
        assert_eq!(change.previous, Balance::new(0, 200));
        assert_eq!(change.current, Balance::new(100, 0));
        let record = change.record.unwrap();
        assert_eq!(record.description, "Added manually");
        assert_eq!(record.kind, PaymentKind::DueAdded);

        let customer = CustomerService::find(&shop, id).unwrap();
        assert_eq!(customer.payment_history[0].description, "Payment received");
        assert_eq!(customer.group_id, DEFAULT_GROUP_ID);
    }

    #[test]
    fn groups_are_unique_and_resolved() {
        let (mut shop, id) = shop_with_customer(0);
        let group = CustomerService::add_group(&mut shop, "Wholesale").unwrap();
        assert!(CustomerService::add_group(&mut shop, "wholesale").is_err());

        let details = CustomerDetails {
            group_id: Some(group.clone()),
            ..CustomerDetails::default()
        };
        CustomerService::update_details(&mut shop, id, details, &clock()).unwrap();
        assert_eq!(CustomerService::in_group(&shop, &group).len(), 1);

        let missing = CustomerDetails {
            group_id: Some("nope".into()),
            ..CustomerDetails::default()
        };
        assert!(matches!(
            CustomerService::update_details(&mut shop, id, missing, &clock()),
            Err(ServiceError::NotFound(_))
        ));
    }

    #[test]
    fn ensure_default_group_repairs_legacy_shops() {
        let mut shop = Business::new(BusinessKind::Shop, "Legacy", None);
        shop.customer_groups.clear();
        let mut orphan = Customer::new("", "Meena", "", 40);
        orphan.group_id.clear();
        shop.customers.push(orphan);

        assert!(CustomerService::ensure_default_group(&mut shop));
        assert_eq!(shop.customer_groups[0].id, DEFAULT_GROUP_ID);
        assert_eq!(shop.customers[0].group_id, DEFAULT_GROUP_ID);
        assert!(!CustomerService::ensure_default_group(&mut shop));
    }

    #[test]
    fn institutes_cannot_hold_customers() {
        let mut institute = Business::new(BusinessKind::TeacherStudent, "Academy", None);
        let err = CustomerService::add(&mut institute, NewCustomer::new("Ravi", ""), &clock()).unwrap_err();
        assert!(matches!(err, ServiceError::Invalid(_)));
    }

    #[test]
    fn listing_puts_pinned_then_recently_updated_first() {
        let mut shop = Business::new(BusinessKind::Shop, "Store", None);
        let early = FixedClock(Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap());
        let later = FixedClock(Utc.with_ymd_and_hms(2024, 6, 2, 9, 0, 0).unwrap());
        let latest = FixedClock(Utc.with_ymd_and_hms(2024, 6, 3, 9, 0, 0).unwrap());

        let asha = CustomerService::add(&mut shop, NewCustomer::new("Asha", ""), &early).unwrap();
        let chetan = CustomerService::add(&mut shop, NewCustomer::new("Chetan", ""), &later).unwrap();
        let names = |shop: &Business| -> Vec<String> {
            CustomerService::ordered(shop, None)
                .iter()
                .map(|customer| customer.name.clone())
                .collect()
        };
        assert_eq!(names(&shop), ["Chetan", "Asha"]);

        CustomerService::add_due(&mut shop, asha, 50, None, &latest).unwrap();
        assert_eq!(CustomerService::find(&shop, asha).unwrap().updated_at, latest.0);
        assert_eq!(names(&shop), ["Asha", "Chetan"]);

        CustomerService::toggle_pin(&mut shop, chetan).unwrap();
        assert_eq!(names(&shop), ["Chetan", "Asha"]);

        let wholesale = CustomerService::add_group(&mut shop, "Wholesale").unwrap();
        assert!(CustomerService::ordered(&shop, Some(&wholesale)).is_empty());
        assert_eq!(CustomerService::ordered(&shop, Some(DEFAULT_GROUP_ID)).len(), 2);
    }
}
