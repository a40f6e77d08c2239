//! Auto-journal adapters: domain events from savings, point-of-sale, and
//! loans translated into posted journal entries
//!
//! The account-code mapping is injected configuration, not a compiled-in
//! lookup, so new savings or loan products only need a mapping change.
//! Recording is best-effort from the caller's point of view: the primary
//! business transaction (deposit, sale, disbursement) has already
//! committed, and a journaling failure is logged and swallowed rather
//! than propagated.

use std::collections::HashMap;

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::journal::JournalEngine;
use crate::traits::JournalStore;
use crate::types::*;

/// Account codes used when journaling a savings transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsAccounts {
    /// Cash or bank account debited on deposit
    pub cash_code: String,
    /// Liability account for this savings type
    pub liability_code: String,
}

/// Account codes used when journaling a point-of-sale transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesAccounts {
    pub cash_code: String,
    pub revenue_code: String,
}

/// Account codes used when journaling loan disbursements and repayments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanAccounts {
    pub receivable_code: String,
    pub cash_code: String,
    pub interest_code: String,
}

/// Injected mapping from domain events to ledger account codes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalMapping {
    /// Savings type code (e.g. "SW") to its account pair
    pub savings: HashMap<String, SavingsAccounts>,
    pub sales: SalesAccounts,
    pub loans: LoanAccounts,
}

impl Default for JournalMapping {
    /// Mapping for the standard cooperative chart of accounts:
    /// SP = principal savings, SW = mandatory savings, SS = voluntary savings
    fn default() -> Self {
        let savings = [("SP", "2100"), ("SW", "2200"), ("SS", "2300")]
            .into_iter()
            .map(|(type_code, liability_code)| {
                (
                    type_code.to_string(),
                    SavingsAccounts {
                        cash_code: "1000".to_string(),
                        liability_code: liability_code.to_string(),
                    },
                )
            })
            .collect();

        Self {
            savings,
            sales: SalesAccounts {
                cash_code: "1000".to_string(),
                revenue_code: "4000".to_string(),
            },
            loans: LoanAccounts {
                receivable_code: "1200".to_string(),
                cash_code: "1000".to_string(),
                interest_code: "4100".to_string(),
            },
        }
    }
}

impl JournalMapping {
    fn savings_accounts(&self, type_code: &str) -> CoreResult<&SavingsAccounts> {
        self.savings.get(type_code).ok_or_else(|| {
            CoreError::Validation(format!(
                "no journal mapping for savings type '{type_code}'"
            ))
        })
    }
}

/// A business event that produces an automatic journal entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DomainEvent {
    /// Member deposit into a savings account
    SavingsDeposit {
        savings_type: String,
        amount: BigDecimal,
    },
    /// Member withdrawal from a savings account
    SavingsWithdrawal {
        savings_type: String,
        amount: BigDecimal,
    },
    /// Point-of-sale cash sale
    PosSale { amount: BigDecimal },
    /// Loan funds released to a member
    LoanDisbursement { amount: BigDecimal },
    /// Loan installment received, split into components
    LoanRepayment {
        principal: BigDecimal,
        interest: BigDecimal,
    },
}

/// Builds and posts journal entries for domain events
pub struct AutoJournal<S: JournalStore> {
    engine: JournalEngine<S>,
    mapping: JournalMapping,
}

impl<S: JournalStore> AutoJournal<S> {
    /// Create an auto-journal over the given storage and mapping
    pub fn new(storage: S, mapping: JournalMapping) -> Self {
        Self {
            engine: JournalEngine::new(storage),
            mapping,
        }
    }

    /// Build, create, and post the journal entry for an event,
    /// returning the posted entry's id
    pub async fn record(
        &mut self,
        event: &DomainEvent,
        entry_date: NaiveDate,
        actor: i64,
    ) -> CoreResult<i64> {
        let (description, lines) = self.build_lines(event).await?;
        let id = self
            .engine
            .create_entry(entry_date, description, None, lines, actor)
            .await?;
        self.engine.post_entry(id, actor).await?;
        Ok(id)
    }

    /// Best-effort variant: a failure is logged and swallowed so the
    /// caller's primary transaction is never rolled back by a journaling
    /// glitch. Returns the entry id when recording succeeded.
    pub async fn record_best_effort(
        &mut self,
        event: &DomainEvent,
        entry_date: NaiveDate,
        actor: i64,
    ) -> Option<i64> {
        match self.record(event, entry_date, actor).await {
            Ok(id) => Some(id),
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    event = ?event,
                    "auto-journal failed; continuing without ledger entry"
                );
                None
            }
        }
    }

    async fn build_lines(
        &self,
        event: &DomainEvent,
    ) -> CoreResult<(String, Vec<JournalLine>)> {
        match event {
            DomainEvent::SavingsDeposit {
                savings_type,
                amount,
            } => {
                let accounts = self.mapping.savings_accounts(savings_type)?;
                let cash = self.engine.account_id_by_code(&accounts.cash_code).await?;
                let liability = self
                    .engine
                    .account_id_by_code(&accounts.liability_code)
                    .await?;
                Ok((
                    format!("Savings deposit ({savings_type})"),
                    vec![
                        JournalLine::debit(cash, amount.clone(), None),
                        JournalLine::credit(liability, amount.clone(), None),
                    ],
                ))
            }
            DomainEvent::SavingsWithdrawal {
                savings_type,
                amount,
            } => {
                let accounts = self.mapping.savings_accounts(savings_type)?;
                let cash = self.engine.account_id_by_code(&accounts.cash_code).await?;
                let liability = self
                    .engine
                    .account_id_by_code(&accounts.liability_code)
                    .await?;
                Ok((
                    format!("Savings withdrawal ({savings_type})"),
                    vec![
                        JournalLine::debit(liability, amount.clone(), None),
                        JournalLine::credit(cash, amount.clone(), None),
                    ],
                ))
            }
            DomainEvent::PosSale { amount } => {
                let cash = self
                    .engine
                    .account_id_by_code(&self.mapping.sales.cash_code)
                    .await?;
                let revenue = self
                    .engine
                    .account_id_by_code(&self.mapping.sales.revenue_code)
                    .await?;
                Ok((
                    "Point-of-sale revenue".to_string(),
                    vec![
                        JournalLine::debit(cash, amount.clone(), None),
                        JournalLine::credit(revenue, amount.clone(), None),
                    ],
                ))
            }
            DomainEvent::LoanDisbursement { amount } => {
                let receivable = self
                    .engine
                    .account_id_by_code(&self.mapping.loans.receivable_code)
                    .await?;
                let cash = self
                    .engine
                    .account_id_by_code(&self.mapping.loans.cash_code)
                    .await?;
                Ok((
                    "Loan disbursement".to_string(),
                    vec![
                        JournalLine::debit(receivable, amount.clone(), None),
                        JournalLine::credit(cash, amount.clone(), None),
                    ],
                ))
            }
            DomainEvent::LoanRepayment {
                principal,
                interest,
            } => {
                let receivable = self
                    .engine
                    .account_id_by_code(&self.mapping.loans.receivable_code)
                    .await?;
                let cash = self
                    .engine
                    .account_id_by_code(&self.mapping.loans.cash_code)
                    .await?;
                let total = principal + interest;
                let mut lines = vec![
                    JournalLine::debit(cash, total, None),
                    JournalLine::credit(
                        receivable,
                        principal.clone(),
                        Some("Principal component".to_string()),
                    ),
                ];
                // A repayment can be interest-free (zero-rate loans);
                // zero lines are not allowed in an entry.
                if *interest > BigDecimal::from(0) {
                    let interest_account = self
                        .engine
                        .account_id_by_code(&self.mapping.loans.interest_code)
                        .await?;
                    lines.push(JournalLine::credit(
                        interest_account,
                        interest.clone(),
                        Some("Interest component".to_string()),
                    ));
                }
                Ok(("Loan repayment".to_string(), lines))
            }
        }
    }
}
