//! Core types and data structures for the cooperative accounting system

use bigdecimal::{BigDecimal, RoundingMode};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Account types following standard accounting principles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountType {
    /// Assets - what the cooperative owns (Cash, Bank, Loan Receivables, Inventory, etc.)
    Asset,
    /// Liabilities - what the cooperative owes (Member Savings, Consignment Payable, etc.)
    Liability,
    /// Equity - members' interest in the cooperative (Share Capital, Retained Earnings, etc.)
    Equity,
    /// Revenue - money earned by the cooperative
    Revenue,
    /// Expenses - costs incurred by the cooperative
    Expense,
}

impl AccountType {
    /// Returns the side on which this account type normally increases.
    /// Assets and Expenses increase on the debit side;
    /// Liabilities, Equity, and Revenue increase on the credit side.
    pub fn normal_side(&self) -> EntrySide {
        match self {
            AccountType::Asset | AccountType::Expense => EntrySide::Debit,
            AccountType::Liability | AccountType::Equity | AccountType::Revenue => {
                EntrySide::Credit
            }
        }
    }
}

/// The two sides of double-entry bookkeeping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntrySide {
    /// Debit - increases Assets and Expenses, decreases the rest
    Debit,
    /// Credit - increases Liabilities, Equity, and Revenue, decreases the rest
    Credit,
}

impl EntrySide {
    /// The opposite side, used when reversing entries.
    pub fn opposite(&self) -> EntrySide {
        match self {
            EntrySide::Debit => EntrySide::Credit,
            EntrySide::Credit => EntrySide::Debit,
        }
    }
}

/// An account in the chart of accounts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Storage-assigned identifier (0 until persisted)
    pub id: i64,
    /// Unique, sortable account code (e.g. "1000")
    pub code: String,
    /// Human-readable account name
    pub name: String,
    /// Type of account (Asset, Liability, etc.)
    pub account_type: AccountType,
    /// Optional parent account for a hierarchical chart of accounts
    pub parent_id: Option<i64>,
    /// Inactive accounts are rejected for new journal lines
    pub is_active: bool,
}

impl Account {
    /// Create a new, not-yet-persisted account
    pub fn new(code: String, name: String, account_type: AccountType) -> Self {
        Self {
            id: 0,
            code,
            name,
            account_type,
            parent_id: None,
            is_active: true,
        }
    }

    /// Create a new account under a parent
    pub fn with_parent(
        code: String,
        name: String,
        account_type: AccountType,
        parent_id: i64,
    ) -> Self {
        Self {
            parent_id: Some(parent_id),
            ..Self::new(code, name, account_type)
        }
    }
}

/// Lifecycle status of a journal entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryStatus {
    /// Entry is being drafted; lines may still change
    Draft,
    /// Entry has been posted to the ledger and is immutable
    Posted,
}

impl EntryStatus {
    /// Returns true once the entry is part of the ledger.
    pub fn is_posted(&self) -> bool {
        matches!(self, EntryStatus::Posted)
    }
}

/// A journal entry: a dated, described set of balanced debit/credit lines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Storage-assigned identifier (0 until persisted)
    pub id: i64,
    /// Date the entry takes effect in the ledger
    pub entry_date: NaiveDate,
    /// Description of the business event
    pub description: String,
    /// Optional reference (receipt number, settlement id, etc.)
    pub reference: Option<String>,
    /// Draft or Posted
    pub status: EntryStatus,
    /// User who created the entry
    pub created_by: i64,
    /// User who posted the entry, once posted
    pub posted_by: Option<i64>,
    /// When the entry was posted
    pub posted_at: Option<NaiveDateTime>,
}

impl JournalEntry {
    /// Create a new draft entry
    pub fn draft(
        entry_date: NaiveDate,
        description: String,
        reference: Option<String>,
        created_by: i64,
    ) -> Self {
        Self {
            id: 0,
            entry_date,
            description,
            reference,
            status: EntryStatus::Draft,
            created_by,
            posted_by: None,
            posted_at: None,
        }
    }
}

/// A single line of a journal entry.
///
/// Exactly one of `debit` / `credit` is non-zero; the other stays zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalLine {
    /// Owning entry (0 until the entry is persisted)
    pub entry_id: i64,
    /// Account the line posts against
    pub account_id: i64,
    /// Debit amount, >= 0
    pub debit: BigDecimal,
    /// Credit amount, >= 0
    pub credit: BigDecimal,
    /// Optional line-level description
    pub description: Option<String>,
}

impl JournalLine {
    /// Create a debit line
    pub fn debit(account_id: i64, amount: BigDecimal, description: Option<String>) -> Self {
        Self {
            entry_id: 0,
            account_id,
            debit: amount,
            credit: BigDecimal::from(0),
            description,
        }
    }

    /// Create a credit line
    pub fn credit(account_id: i64, amount: BigDecimal, description: Option<String>) -> Self {
        Self {
            entry_id: 0,
            account_id,
            debit: BigDecimal::from(0),
            credit: amount,
            description,
        }
    }

    /// Which side this line posts on, if well-formed
    pub fn side(&self) -> Option<EntrySide> {
        let zero = BigDecimal::from(0);
        match (self.debit > zero, self.credit > zero) {
            (true, false) => Some(EntrySide::Debit),
            (false, true) => Some(EntrySide::Credit),
            _ => None,
        }
    }

    /// The non-zero amount of this line
    pub fn amount(&self) -> BigDecimal {
        if self.debit > BigDecimal::from(0) {
            self.debit.clone()
        } else {
            self.credit.clone()
        }
    }
}

/// A posted journal line flattened with its entry's date and id,
/// as the report engine consumes it from storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostedLine {
    pub entry_id: i64,
    pub entry_date: NaiveDate,
    pub account_id: i64,
    pub debit: BigDecimal,
    pub credit: BigDecimal,
    pub description: Option<String>,
}

/// Filter for journal entry listings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntryFilter {
    /// Restrict to a single status
    pub status: Option<EntryStatus>,
    /// Inclusive lower bound on entry_date
    pub from: Option<NaiveDate>,
    /// Inclusive upper bound on entry_date
    pub to: Option<NaiveDate>,
}

/// Request parameters for paginated listings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRequest {
    /// Page number (1-indexed)
    pub page: u32,
    /// Number of items per page
    pub per_page: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 20,
        }
    }
}

impl PageRequest {
    /// Offset of the first item of this page
    pub fn offset(&self) -> usize {
        (self.page.saturating_sub(1) as usize) * self.per_page as usize
    }

    /// Maximum number of items returned
    pub fn limit(&self) -> usize {
        self.per_page as usize
    }
}

/// Round a monetary amount to whole currency units (rupiah has no minor unit)
pub fn round_amount(amount: &BigDecimal) -> BigDecimal {
    amount.with_scale_round(0, RoundingMode::HalfUp)
}

/// Errors produced by the accounting core
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Backend persistence failure
    #[error("storage error: {0}")]
    Storage(String),
    /// Malformed or inconsistent input (unbalanced entry, oversold stock, ...)
    #[error("validation error: {0}")]
    Validation(String),
    /// A referenced id does not exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },
    /// Operation is illegal for the record's current lifecycle state
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// A post-hoc invariant check failed; a defect signal, not user input
    #[error("integrity violation: {0}")]
    Integrity(String),
}

impl CoreError {
    /// Shorthand for a missing-id error
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        CoreError::NotFound { entity, id }
    }
}

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_side_per_account_type() {
        assert_eq!(AccountType::Asset.normal_side(), EntrySide::Debit);
        assert_eq!(AccountType::Expense.normal_side(), EntrySide::Debit);
        assert_eq!(AccountType::Liability.normal_side(), EntrySide::Credit);
        assert_eq!(AccountType::Equity.normal_side(), EntrySide::Credit);
        assert_eq!(AccountType::Revenue.normal_side(), EntrySide::Credit);
    }

    #[test]
    fn line_side_detection() {
        let line = JournalLine::debit(1, BigDecimal::from(500), None);
        assert_eq!(line.side(), Some(EntrySide::Debit));
        assert_eq!(line.amount(), BigDecimal::from(500));

        let line = JournalLine::credit(2, BigDecimal::from(500), None);
        assert_eq!(line.side(), Some(EntrySide::Credit));

        let malformed = JournalLine {
            entry_id: 0,
            account_id: 1,
            debit: BigDecimal::from(1),
            credit: BigDecimal::from(1),
            description: None,
        };
        assert_eq!(malformed.side(), None);
    }

    #[test]
    fn rounding_to_whole_units() {
        let x: BigDecimal = "1234.5".parse().unwrap();
        assert_eq!(round_amount(&x), BigDecimal::from(1235));
        let y: BigDecimal = "1234.4".parse().unwrap();
        assert_eq!(round_amount(&y), BigDecimal::from(1234));
    }

    #[test]
    fn page_request_offsets() {
        let page = PageRequest {
            page: 3,
            per_page: 10,
        };
        assert_eq!(page.offset(), 20);
        assert_eq!(page.limit(), 10);
        assert_eq!(PageRequest::default().offset(), 0);
    }
}
