//! Report module: read-only financial views derived from posted lines

pub mod engine;

pub use engine::*;

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::Account;

/// One account's row in a trial balance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialBalanceRow {
    pub account: Account,
    /// Debits posted within the reporting window
    pub period_debit: BigDecimal,
    /// Credits posted within the reporting window
    pub period_credit: BigDecimal,
    /// Balance since inception through the window's end, signed on the
    /// account's normal side (negative means a contra balance)
    pub closing_balance: BigDecimal,
}

/// Trial balance over a date range.
///
/// Every active account is included, even with zero activity; auditors
/// prefer seeing the whole chart over guessing at omissions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialBalance {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub rows: Vec<TrialBalanceRow>,
    pub total_debits: BigDecimal,
    pub total_credits: BigDecimal,
    pub is_balanced: bool,
}

/// A single named amount in a balance sheet or income statement section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportLine {
    pub code: String,
    pub name: String,
    pub amount: BigDecimal,
}

/// Balance sheet as of a date, summed since inception
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceSheet {
    pub as_of: NaiveDate,
    pub assets: Vec<ReportLine>,
    pub liabilities: Vec<ReportLine>,
    pub equity: Vec<ReportLine>,
    pub total_assets: BigDecimal,
    pub total_liabilities: BigDecimal,
    pub total_equity: BigDecimal,
}

/// Profit and loss statement over a date range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfitLoss {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub revenue: Vec<ReportLine>,
    pub expenses: Vec<ReportLine>,
    pub total_revenue: BigDecimal,
    pub total_expenses: BigDecimal,
    /// Revenue minus expenses
    pub net: BigDecimal,
}

/// One movement in a general ledger view, with the balance after it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralLedgerLine {
    pub entry_id: i64,
    pub entry_date: NaiveDate,
    pub description: Option<String>,
    pub debit: BigDecimal,
    pub credit: BigDecimal,
    pub running_balance: BigDecimal,
}

/// General ledger for one account over a date range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralLedger {
    pub account: Account,
    pub from: NaiveDate,
    pub to: NaiveDate,
    /// Balance immediately before `from`, on the account's normal side
    pub opening_balance: BigDecimal,
    pub lines: Vec<GeneralLedgerLine>,
    pub closing_balance: BigDecimal,
}
