//! Loan module containing amortization schedule generation and the
//! application/approval/repayment workflow

pub mod engine;
pub mod schedule;

pub use engine::*;
pub use schedule::*;

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a member loan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoanStatus {
    /// Application submitted, awaiting decision
    Pending,
    /// Approved but funds not yet released
    Approved,
    /// Funds released; schedule generated
    Disbursed,
    /// Repayments in progress
    Active,
    /// All installments settled
    PaidOff,
    /// Application declined
    Rejected,
}

/// A member loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    /// Storage-assigned identifier (0 until persisted)
    pub id: i64,
    /// Borrowing member
    pub member_id: i64,
    /// Principal amount in whole currency units
    pub principal: BigDecimal,
    /// Annual interest rate in percent (e.g. 12 for 12% p.a.)
    pub annual_rate: BigDecimal,
    /// Number of monthly installments
    pub term_months: u32,
    /// Lifecycle status
    pub status: LoanStatus,
    /// Date the funds were released
    pub disbursed_date: Option<NaiveDate>,
}

impl Loan {
    /// Create a new, not-yet-persisted loan application
    pub fn application(
        member_id: i64,
        principal: BigDecimal,
        annual_rate: BigDecimal,
        term_months: u32,
    ) -> Self {
        Self {
            id: 0,
            member_id,
            principal,
            annual_rate,
            term_months,
            status: LoanStatus::Pending,
            disbursed_date: None,
        }
    }
}

/// Repayment status of a single installment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstallmentStatus {
    /// Not yet fully paid
    Pending,
    /// Fully paid
    Paid,
    /// Past due date and not fully paid
    Overdue,
}

/// One row of a loan's amortization schedule.
///
/// The schedule is generated once at disbursement and is append-only
/// afterwards; only `amount_paid` and `status` mutate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Installment {
    /// Owning loan
    pub loan_id: i64,
    /// 1-based position within the schedule
    pub sequence: u32,
    /// Due date (disbursement date + sequence months)
    pub due_date: NaiveDate,
    /// Principal component due this period
    pub principal_due: BigDecimal,
    /// Interest component due this period
    pub interest_due: BigDecimal,
    /// Amount received against this installment so far
    pub amount_paid: BigDecimal,
    /// Pending, Paid, or Overdue
    pub status: InstallmentStatus,
}

impl Installment {
    /// Total amount due for this installment
    pub fn total_due(&self) -> BigDecimal {
        &self.principal_due + &self.interest_due
    }

    /// Remaining unpaid amount, never negative
    pub fn outstanding(&self) -> BigDecimal {
        let remaining = self.total_due() - &self.amount_paid;
        if remaining < BigDecimal::from(0) {
            BigDecimal::from(0)
        } else {
            remaining
        }
    }

    /// Whether the installment is fully covered
    pub fn is_settled(&self) -> bool {
        self.amount_paid >= self.total_due()
    }
}
