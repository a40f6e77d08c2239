//! Flat-rate amortization schedule generation

use bigdecimal::{BigDecimal, RoundingMode};
use chrono::{Months, NaiveDate};

use super::{Installment, InstallmentStatus, Loan};
use crate::types::{round_amount, CoreError, CoreResult};
use crate::utils::validation::validate_positive_amount;

/// Generate the full repayment schedule for a loan using flat-rate
/// interest.
///
/// The principal is normalized to whole currency units, then split
/// evenly across the term; the division remainder is absorbed one unit
/// at a time by the earliest installments so the scheduled principal
/// sums back to the normalized principal exactly. Interest per period
/// is the same for every installment: `principal * annual_rate / 100 /
/// 12`, rounded half-up to whole units. Due dates fall on monthly
/// anniversaries of the disbursement date.
pub fn generate_schedule(loan: &Loan, disbursed_date: NaiveDate) -> CoreResult<Vec<Installment>> {
    // Remainder distribution hands out one whole unit per row, so the
    // principal must be whole units before the split.
    let principal = round_amount(&loan.principal);
    validate_positive_amount("loan principal", &principal)?;
    if loan.annual_rate < BigDecimal::from(0) {
        return Err(CoreError::Validation(
            "annual rate must not be negative".to_string(),
        ));
    }
    if loan.term_months == 0 {
        return Err(CoreError::Validation(
            "loan term must be at least one month".to_string(),
        ));
    }

    let term = BigDecimal::from(loan.term_months);
    let base = (&principal / &term).with_scale_round(0, RoundingMode::Floor);
    let remainder = &principal - &base * &term;
    let interest_due = round_amount(&(&principal * &loan.annual_rate / BigDecimal::from(1200)));

    let mut rows = Vec::with_capacity(loan.term_months as usize);
    for seq in 0..loan.term_months {
        let due_date = disbursed_date
            .checked_add_months(Months::new(seq + 1))
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "due date overflows the calendar for installment {}",
                    seq + 1
                ))
            })?;
        let principal_due = if BigDecimal::from(seq) < remainder {
            &base + BigDecimal::from(1)
        } else {
            base.clone()
        };
        rows.push(Installment {
            loan_id: loan.id,
            sequence: seq + 1,
            due_date,
            principal_due,
            interest_due: interest_due.clone(),
            amount_paid: BigDecimal::from(0),
            status: InstallmentStatus::Pending,
        });
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loan::LoanStatus;

    fn loan(principal: i64, annual_rate: i64, term_months: u32) -> Loan {
        Loan {
            id: 1,
            member_id: 7,
            principal: BigDecimal::from(principal),
            annual_rate: BigDecimal::from(annual_rate),
            term_months,
            status: LoanStatus::Approved,
            disbursed_date: None,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn even_split_with_flat_interest() {
        let rows = generate_schedule(&loan(12_000_000, 12, 12), date(2024, 1, 15)).unwrap();
        assert_eq!(rows.len(), 12);
        for (i, row) in rows.iter().enumerate() {
            assert_eq!(row.sequence as usize, i + 1);
            assert_eq!(row.principal_due, BigDecimal::from(1_000_000));
            assert_eq!(row.interest_due, BigDecimal::from(120_000));
            assert_eq!(row.status, InstallmentStatus::Pending);
        }
        assert_eq!(rows[0].due_date, date(2024, 2, 15));
        assert_eq!(rows[11].due_date, date(2025, 1, 15));
    }

    #[test]
    fn remainder_goes_to_earliest_installments() {
        let rows = generate_schedule(&loan(10_000_000, 12, 3), date(2024, 3, 1)).unwrap();
        assert_eq!(rows[0].principal_due, BigDecimal::from(3_333_334));
        assert_eq!(rows[1].principal_due, BigDecimal::from(3_333_333));
        assert_eq!(rows[2].principal_due, BigDecimal::from(3_333_333));
        let total: BigDecimal = rows.iter().map(|r| &r.principal_due).sum();
        assert_eq!(total, BigDecimal::from(10_000_000));
    }

    #[test]
    fn fractional_principal_is_normalized_before_splitting() {
        let mut fractional = loan(0, 12, 3);
        fractional.principal = "10.5".parse().unwrap();
        let rows = generate_schedule(&fractional, date(2024, 1, 1)).unwrap();
        // 10.5 rounds half-up to 11, split 4 / 4 / 3.
        assert_eq!(rows[0].principal_due, BigDecimal::from(4));
        assert_eq!(rows[1].principal_due, BigDecimal::from(4));
        assert_eq!(rows[2].principal_due, BigDecimal::from(3));
        let total: BigDecimal = rows.iter().map(|r| &r.principal_due).sum();
        assert_eq!(total, BigDecimal::from(11));
    }

    #[test]
    fn scheduled_principal_always_sums_to_loan_principal() {
        for term in [1, 6, 12, 24, 36] {
            let rows = generate_schedule(&loan(9_999_999, 18, term), date(2024, 1, 31)).unwrap();
            let total: BigDecimal = rows.iter().map(|r| &r.principal_due).sum();
            assert_eq!(total, BigDecimal::from(9_999_999), "term {term}");
        }
    }

    #[test]
    fn month_end_due_dates_clamp() {
        let rows = generate_schedule(&loan(3_000_000, 12, 3), date(2024, 1, 31)).unwrap();
        assert_eq!(rows[0].due_date, date(2024, 2, 29));
        assert_eq!(rows[1].due_date, date(2024, 3, 31));
        assert_eq!(rows[2].due_date, date(2024, 4, 30));
    }

    #[test]
    fn zero_rate_means_zero_interest() {
        let rows = generate_schedule(&loan(1_200_000, 0, 12), date(2024, 1, 1)).unwrap();
        assert!(rows.iter().all(|r| r.interest_due == BigDecimal::from(0)));
    }

    #[test]
    fn invalid_terms_are_rejected() {
        assert!(generate_schedule(&loan(0, 12, 12), date(2024, 1, 1)).is_err());
        assert!(generate_schedule(&loan(1_000_000, -1, 12), date(2024, 1, 1)).is_err());
        assert!(generate_schedule(&loan(1_000_000, 12, 0), date(2024, 1, 1)).is_err());
    }
}
