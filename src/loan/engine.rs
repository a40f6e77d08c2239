//! Loan lifecycle engine: application, approval, disbursement, and
//! oldest-first repayment allocation

use bigdecimal::BigDecimal;
use chrono::NaiveDate;

use super::schedule::generate_schedule;
use super::{Installment, InstallmentStatus, Loan, LoanStatus};
use crate::traits::LoanStore;
use crate::types::{round_amount, CoreError, CoreResult};
use crate::utils::validation::validate_positive_amount;

/// Engine driving the loan workflow against a [`LoanStore`]
pub struct LoanEngine<S: LoanStore> {
    storage: S,
}

impl<S: LoanStore> LoanEngine<S> {
    /// Create a new loan engine
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Submit a loan application in `Pending` status.
    ///
    /// The principal is rounded to whole currency units so the stored
    /// amount always matches what the schedule will later split.
    pub async fn create_application(
        &mut self,
        member_id: i64,
        principal: BigDecimal,
        annual_rate: BigDecimal,
        term_months: u32,
    ) -> CoreResult<Loan> {
        let principal = round_amount(&principal);
        validate_positive_amount("loan principal", &principal)?;
        if annual_rate < BigDecimal::from(0) {
            return Err(CoreError::Validation(
                "annual rate must not be negative".to_string(),
            ));
        }
        if term_months == 0 {
            return Err(CoreError::Validation(
                "loan term must be at least one month".to_string(),
            ));
        }
        let mut loan = Loan::application(member_id, principal, annual_rate, term_months);
        loan.id = self.storage.insert_loan(&loan).await?;
        tracing::debug!(loan_id = loan.id, member_id, "loan application created");
        Ok(loan)
    }

    /// Approve a pending application
    pub async fn approve(&mut self, loan_id: i64) -> CoreResult<Loan> {
        self.transition(loan_id, LoanStatus::Pending, LoanStatus::Approved)
            .await
    }

    /// Reject a pending application
    pub async fn reject(&mut self, loan_id: i64) -> CoreResult<Loan> {
        self.transition(loan_id, LoanStatus::Pending, LoanStatus::Rejected)
            .await
    }

    /// Release the funds of an approved loan: generates the amortization
    /// schedule and moves the loan to `Disbursed`
    pub async fn disburse(&mut self, loan_id: i64, disbursed_date: NaiveDate) -> CoreResult<Loan> {
        let mut loan = self.loan_required(loan_id).await?;
        if loan.status != LoanStatus::Approved {
            return Err(CoreError::InvalidState(format!(
                "loan {loan_id} cannot be disbursed from {:?}",
                loan.status
            )));
        }
        let rows = generate_schedule(&loan, disbursed_date)?;
        self.storage.insert_schedule(loan_id, &rows).await?;
        loan.status = LoanStatus::Disbursed;
        loan.disbursed_date = Some(disbursed_date);
        self.storage.update_loan(&loan).await?;
        tracing::info!(loan_id, %disbursed_date, installments = rows.len(), "loan disbursed");
        Ok(loan)
    }

    /// Record a repayment and allocate it across open installments,
    /// oldest first.
    ///
    /// Each installment absorbs up to its outstanding amount before the
    /// next one is touched. A payment exceeding the total outstanding is
    /// rejected outright rather than leaving an unexplained credit.
    /// Returns the updated loan: `Active` after the first repayment,
    /// `PaidOff` once every installment is settled.
    pub async fn record_repayment(&mut self, loan_id: i64, amount: BigDecimal) -> CoreResult<Loan> {
        validate_positive_amount("repayment amount", &amount)?;
        let mut loan = self.loan_required(loan_id).await?;
        if !matches!(loan.status, LoanStatus::Disbursed | LoanStatus::Active) {
            return Err(CoreError::InvalidState(format!(
                "loan {loan_id} does not accept repayments in {:?}",
                loan.status
            )));
        }

        let rows = self.storage.schedule(loan_id).await?;
        let outstanding: BigDecimal = rows.iter().map(|r| r.outstanding()).sum();
        if amount > outstanding {
            return Err(CoreError::Validation(format!(
                "repayment {amount} exceeds outstanding balance {outstanding} on loan {loan_id}"
            )));
        }

        let mut remaining = amount;
        for mut row in rows {
            if remaining == BigDecimal::from(0) {
                break;
            }
            let open = row.outstanding();
            if open == BigDecimal::from(0) {
                continue;
            }
            let applied = if remaining < open {
                remaining.clone()
            } else {
                open
            };
            row.amount_paid += &applied;
            remaining -= &applied;
            if row.is_settled() {
                row.status = InstallmentStatus::Paid;
            }
            self.storage.update_installment(&row).await?;
        }

        let rows = self.storage.schedule(loan_id).await?;
        loan.status = if rows.iter().all(Installment::is_settled) {
            LoanStatus::PaidOff
        } else {
            LoanStatus::Active
        };
        self.storage.update_loan(&loan).await?;
        tracing::debug!(loan_id, status = ?loan.status, "repayment recorded");
        Ok(loan)
    }

    /// Flag unsettled installments whose due date has passed as `Overdue`.
    /// Returns the number of rows flagged.
    pub async fn mark_overdue(&mut self, loan_id: i64, today: NaiveDate) -> CoreResult<usize> {
        let rows = self.storage.schedule(loan_id).await?;
        let mut flagged = 0;
        for mut row in rows {
            if row.status == InstallmentStatus::Pending && row.due_date < today && !row.is_settled()
            {
                row.status = InstallmentStatus::Overdue;
                self.storage.update_installment(&row).await?;
                flagged += 1;
            }
        }
        if flagged > 0 {
            tracing::warn!(loan_id, flagged, "installments marked overdue");
        }
        Ok(flagged)
    }

    /// Get a loan by id
    pub async fn loan(&self, loan_id: i64) -> CoreResult<Option<Loan>> {
        self.storage.loan(loan_id).await
    }

    /// List a member's loans
    pub async fn loans_by_member(&self, member_id: i64) -> CoreResult<Vec<Loan>> {
        self.storage.loans_by_member(member_id).await
    }

    /// The loan's schedule ordered by sequence
    pub async fn schedule(&self, loan_id: i64) -> CoreResult<Vec<Installment>> {
        self.storage.schedule(loan_id).await
    }

    async fn loan_required(&self, loan_id: i64) -> CoreResult<Loan> {
        self.storage
            .loan(loan_id)
            .await?
            .ok_or_else(|| CoreError::not_found("loan", loan_id))
    }

    async fn transition(
        &mut self,
        loan_id: i64,
        expected: LoanStatus,
        next: LoanStatus,
    ) -> CoreResult<Loan> {
        let mut loan = self.loan_required(loan_id).await?;
        if loan.status != expected {
            return Err(CoreError::InvalidState(format!(
                "loan {loan_id} is {:?}, expected {expected:?}",
                loan.status
            )));
        }
        loan.status = next;
        self.storage.update_loan(&loan).await?;
        Ok(loan)
    }
}
