//! Due/advance arithmetic shared by students and customers.
//!
//! A charge consumes advance before adding to due; a payment pays down due before
//! accruing advance. Starting from a settled balance, neither operation can leave both
//! sides positive.

use crate::{
    core::time::{Clock, SystemClock},
    errors::LedgerError,
    ledger::{Balance, BalanceHolder, Money, PaymentKind, TransactionRecord},
};

/// Outcome of a balance-changing operation on a holder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceChange {
    pub previous: Balance,
    pub current: Balance,
    /// `None` for direct due edits, which leave no history entry.
    pub record: Option<TransactionRecord>,
}

impl BalanceChange {
    /// True for a direct edit that left the balance as it was.
    pub fn is_noop(&self) -> bool {
        self.record.is_none() && self.previous == self.current
    }
}

pub struct BalanceLedger;

impl BalanceLedger {
    pub fn apply_charge(
        balance: Balance,
        amount: Money,
        description: &str,
    ) -> Result<(Balance, TransactionRecord), LedgerError> {
        Self::apply_charge_with(&SystemClock, balance, amount, description)
    }

    pub fn apply_charge_with(
        clock: &dyn Clock,
        balance: Balance,
        amount: Money,
        description: &str,
    ) -> Result<(Balance, TransactionRecord), LedgerError> {
        validate_amount(amount)?;
        validate_balance(balance)?;
        let next = charge(balance, amount)?;
        let record = TransactionRecord::new(PaymentKind::DueAdded, amount, description, clock.now());
        Ok((next, record))
    }

    pub fn apply_payment(
        balance: Balance,
        amount: Money,
        description: &str,
    ) -> Result<(Balance, TransactionRecord), LedgerError> {
        Self::apply_payment_with(&SystemClock, balance, amount, description)
    }

    pub fn apply_payment_with(
        clock: &dyn Clock,
        balance: Balance,
        amount: Money,
        description: &str,
    ) -> Result<(Balance, TransactionRecord), LedgerError> {
        validate_amount(amount)?;
        validate_balance(balance)?;
        let next = if balance.due >= amount {
            Balance::new(balance.due - amount, balance.advance)
        } else {
            let surplus = amount - balance.due;
            let advance = balance
                .advance
                .checked_add(surplus)
                .ok_or_else(|| LedgerError::invalid("advance overflows"))?;
            Balance::new(0, advance)
        };
        let record = TransactionRecord::new(PaymentKind::Payment, amount, description, clock.now());
        Ok((next, record))
    }

    /// Overwrites the gross due. An increase is offset against advance first; a decrease
    /// is a plain overwrite with advance untouched.
    pub fn set_due_directly(balance: Balance, new_gross_due: Money) -> Result<Balance, LedgerError> {
        if new_gross_due < 0 {
            return Err(LedgerError::invalid("due cannot be negative"));
        }
        validate_balance(balance)?;
        let added = new_gross_due - balance.due;
        if added > 0 && balance.advance > 0 {
            charge(balance, added)
        } else {
            Ok(Balance::new(new_gross_due, balance.advance))
        }
    }

    /// Amount owed for `months` months at `monthly_fee`.
    pub fn charge_for_months(monthly_fee: Money, months: u32) -> Result<Money, LedgerError> {
        if months == 0 {
            return Err(LedgerError::invalid("month count must be at least one"));
        }
        if monthly_fee < 0 {
            return Err(LedgerError::invalid("monthly fee cannot be negative"));
        }
        monthly_fee
            .checked_mul(Money::from(months))
            .ok_or_else(|| LedgerError::invalid("charge overflows"))
    }

    /// Applies a charge to `holder` and appends the record to its history.
    pub fn charge_holder<H: BalanceHolder + ?Sized>(
        clock: &dyn Clock,
        holder: &mut H,
        amount: Money,
        description: &str,
    ) -> Result<BalanceChange, LedgerError> {
        let previous = holder.balance();
        let (current, record) = Self::apply_charge_with(clock, previous, amount, description)?;
        holder.set_balance(current);
        holder.append_record(record.clone());
        Ok(BalanceChange {
            previous,
            current,
            record: Some(record),
        })
    }

    /// Applies a payment to `holder` and appends the record to its history.
    pub fn pay_holder<H: BalanceHolder + ?Sized>(
        clock: &dyn Clock,
        holder: &mut H,
        amount: Money,
        description: &str,
    ) -> Result<BalanceChange, LedgerError> {
        let previous = holder.balance();
        let (current, record) = Self::apply_payment_with(clock, previous, amount, description)?;
        holder.set_balance(current);
        holder.append_record(record.clone());
        Ok(BalanceChange {
            previous,
            current,
            record: Some(record),
        })
    }

    pub fn set_holder_due<H: BalanceHolder + ?Sized>(
        holder: &mut H,
        new_gross_due: Money,
    ) -> Result<BalanceChange, LedgerError> {
        let previous = holder.balance();
        let current = Self::set_due_directly(previous, new_gross_due)?;
        if current != previous {
            holder.set_balance(current);
        }
        Ok(BalanceChange {
            previous,
            current,
            record: None,
        })
    }
}

fn charge(balance: Balance, amount: Money) -> Result<Balance, LedgerError> {
    if balance.advance >= amount {
        return Ok(Balance::new(balance.due, balance.advance - amount));
    }
    let uncovered = amount - balance.advance;
    let due = balance
        .due
        .checked_add(uncovered)
        .ok_or_else(|| LedgerError::invalid("due overflows"))?;
    Ok(Balance::new(due, 0))
}

fn validate_amount(amount: Money) -> Result<(), LedgerError> {
    if amount <= 0 {
        return Err(LedgerError::invalid(format!(
            "amount must be positive, got {}",
            amount
        )));
    }
    Ok(())
}

fn validate_balance(balance: Balance) -> Result<(), LedgerError> {
    if balance.due < 0 || balance.advance < 0 {
        return Err(LedgerError::invalid("balance sides cannot be negative"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::core::time::FixedClock;
    use crate::ledger::Student;

    fn clock() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2024, 3, 5, 9, 30, 0).unwrap())
    }

    #[test]
    fn charge_consumes_advance_then_spills_into_due() {
        let (next, record) =
            BalanceLedger::apply_charge_with(&clock(), Balance::new(0, 200), 300, "March").unwrap();
        assert_eq!(next, Balance::new(100, 0));
        assert_eq!(record.kind, PaymentKind::DueAdded);
        assert_eq!(record.amount, 300);
        assert_eq!(record.date, clock().0);

        let (covered, _) = BalanceLedger::apply_charge(Balance::new(0, 500), 300, "March").unwrap();
        assert_eq!(covered, Balance::new(0, 200));
    }

    #[test]
    fn payment_pays_due_then_accrues_advance() {
        let (next, record) =
            BalanceLedger::apply_payment_with(&clock(), Balance::new(150, 0), 200, "Cash").unwrap();
        assert_eq!(next, Balance::new(0, 50));
        assert_eq!(record.kind, PaymentKind::Payment);
        assert_eq!(record.description, "Cash");

        let (partial, _) = BalanceLedger::apply_payment(Balance::new(150, 0), 100, "Cash").unwrap();
        assert_eq!(partial, Balance::new(50, 0));
    }

    #[test]
    fn set_due_offsets_increase_against_advance() {
        let next = BalanceLedger::set_due_directly(Balance::new(100, 60), 250).unwrap();
        assert_eq!(next, Balance::new(190, 0));
    }

    #[test]
    fn set_due_lowering_is_a_plain_overwrite() {
        let next = BalanceLedger::set_due_directly(Balance::new(300, 0), 120).unwrap();
        assert_eq!(next, Balance::new(120, 0));
        let unchanged = BalanceLedger::set_due_directly(Balance::new(80, 0), 80).unwrap();
        assert_eq!(unchanged, Balance::new(80, 0));
    }

    #[test]
    fn charge_then_payment_round_trips() {
        for start in [Balance::zero(), Balance::with_due(70)] {
            let (charged, _) = BalanceLedger::apply_charge(start, 450, "fee").unwrap();
            let (paid, _) = BalanceLedger::apply_payment(charged, 450, "fee").unwrap();
            assert_eq!(paid, start);
        }
    }

    #[test]
    fn sides_never_both_positive_across_sequences() {
        let steps: [(bool, Money); 8] = [
            (true, 300),
            (false, 500),
            (true, 120),
            (true, 200),
            (false, 20),
            (false, 1000),
            (true, 999),
            (true, 2),
        ];
        let mut balance = Balance::zero();
        for (is_charge, amount) in steps {
            balance = if is_charge {
                BalanceLedger::apply_charge(balance, amount, "charge").unwrap().0
            } else {
                BalanceLedger::apply_payment(balance, amount, "payment").unwrap().0
            };
            assert!(balance.is_settled(), "both sides positive: {balance:?}");
            assert!(balance.due >= 0 && balance.advance >= 0);
        }
        assert_eq!(balance, Balance::new(101, 0));
    }

    #[test]
    fn non_positive_amounts_are_rejected() {
        for amount in [0, -5] {
            assert!(matches!(
                BalanceLedger::apply_charge(Balance::zero(), amount, "x"),
                Err(LedgerError::InvalidArgument(_))
            ));
            assert!(matches!(
                BalanceLedger::apply_payment(Balance::zero(), amount, "x"),
                Err(LedgerError::InvalidArgument(_))
            ));
        }
        assert!(BalanceLedger::set_due_directly(Balance::zero(), -1).is_err());
        assert!(BalanceLedger::charge_for_months(500, 0).is_err());
        assert_eq!(BalanceLedger::charge_for_months(500, 3).unwrap(), 1500);
    }

    #[test]
    fn holder_helpers_append_history() {
        let joined = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mut student = Student::new("Asha", "98765 43210", joined, 500);

        let change = BalanceLedger::pay_holder(&clock(), &mut student, 800, "Cleared 1 Month").unwrap();
        assert_eq!(change.previous, Balance::with_due(500));
        assert_eq!(change.current, Balance::new(0, 300));
        assert_eq!(student.payment_history.len(), 1);

        BalanceLedger::charge_holder(&clock(), &mut student, 500, "April").unwrap();
        assert_eq!(student.balance, Balance::with_due(200));

        let edit = BalanceLedger::set_holder_due(&mut student, 50).unwrap();
        assert!(edit.record.is_none());
        assert_eq!(student.balance, Balance::with_due(50));
        assert_eq!(student.payment_history.len(), 2);
        assert!(!edit.is_noop());

        let same = BalanceLedger::set_holder_due(&mut student, 50).unwrap();
        assert!(same.is_noop());
    }
}
