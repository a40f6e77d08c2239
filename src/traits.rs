//! Storage traits for persistence abstraction
//!
//! The core works against any transactional relational store (PostgreSQL,
//! MySQL, SQLite, in-memory, ...) by implementing these traits. Identifiers
//! are allocated by the store and returned from inserts.
//!
//! Multi-row mutations that must be atomic are modeled as single trait
//! methods so a backend can wrap each in one database transaction:
//! entry + lines, schedule batches, receipt + stock increments, sale +
//! stock decrement, and settlement claiming.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};

use crate::consignment::{
    ConsignmentReceipt, ConsignmentSale, ConsignmentSettlement, ConsignmentSupplier, ReceiptLine,
};
use crate::loan::{Installment, Loan};
use crate::types::*;

/// Persistence for the chart of accounts and the journal/ledger
#[async_trait]
pub trait JournalStore: Send + Sync {
    /// Insert an account and return its assigned id
    async fn insert_account(&mut self, account: &Account) -> CoreResult<i64>;

    /// Get an account by id
    async fn account(&self, id: i64) -> CoreResult<Option<Account>>;

    /// Get an account by its unique code
    async fn account_by_code(&self, code: &str) -> CoreResult<Option<Account>>;

    /// List accounts, optionally filtered by type, ordered by code
    async fn list_accounts(&self, account_type: Option<AccountType>) -> CoreResult<Vec<Account>>;

    /// Update an existing account
    async fn update_account(&mut self, account: &Account) -> CoreResult<()>;

    /// Insert an entry header and all of its lines atomically,
    /// returning the assigned entry id. Partial inserts must not occur.
    async fn insert_entry(
        &mut self,
        entry: &JournalEntry,
        lines: &[JournalLine],
    ) -> CoreResult<i64>;

    /// Get an entry header by id
    async fn entry(&self, id: i64) -> CoreResult<Option<JournalEntry>>;

    /// Get the lines of an entry in insertion order
    async fn entry_lines(&self, entry_id: i64) -> CoreResult<Vec<JournalLine>>;

    /// Transition an entry to posted, stamping actor and timestamp
    async fn mark_posted(&mut self, entry_id: i64, actor: i64, at: NaiveDateTime)
        -> CoreResult<()>;

    /// List entries matching the filter, ordered by
    /// (entry_date desc, id desc) for stable pagination
    async fn list_entries(
        &self,
        filter: &EntryFilter,
        page: &PageRequest,
    ) -> CoreResult<Vec<JournalEntry>>;

    /// Posted lines (the ledger), optionally restricted to one account
    /// and an inclusive entry_date window, ordered by (entry_date, entry_id)
    async fn posted_lines(
        &self,
        account_id: Option<i64>,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> CoreResult<Vec<PostedLine>>;
}

/// Persistence for loans and their amortization schedules
#[async_trait]
pub trait LoanStore: Send + Sync {
    /// Insert a loan and return its assigned id
    async fn insert_loan(&mut self, loan: &Loan) -> CoreResult<i64>;

    /// Get a loan by id
    async fn loan(&self, id: i64) -> CoreResult<Option<Loan>>;

    /// List a member's loans ordered by id
    async fn loans_by_member(&self, member_id: i64) -> CoreResult<Vec<Loan>>;

    /// Update an existing loan
    async fn update_loan(&mut self, loan: &Loan) -> CoreResult<()>;

    /// Insert a full schedule as one atomic batch. Fails if the loan
    /// already has a schedule.
    async fn insert_schedule(&mut self, loan_id: i64, rows: &[Installment]) -> CoreResult<()>;

    /// The loan's schedule ordered by sequence
    async fn schedule(&self, loan_id: i64) -> CoreResult<Vec<Installment>>;

    /// Update a single installment (amount_paid / status only)
    async fn update_installment(&mut self, row: &Installment) -> CoreResult<()>;
}

/// Persistence for consignment suppliers, receipts, sales, settlements,
/// and the warehouse stock they move
#[async_trait]
pub trait ConsignmentStore: Send + Sync {
    /// Insert a supplier and return its assigned id
    async fn insert_supplier(&mut self, supplier: &ConsignmentSupplier) -> CoreResult<i64>;

    /// Get a supplier by id
    async fn supplier(&self, id: i64) -> CoreResult<Option<ConsignmentSupplier>>;

    /// Update an existing supplier
    async fn update_supplier(&mut self, supplier: &ConsignmentSupplier) -> CoreResult<()>;

    /// Insert a receipt header plus all line items and increment warehouse
    /// stock per line, atomically. A bad line must leave no stock changed.
    async fn insert_receipt(
        &mut self,
        receipt: &ConsignmentReceipt,
        lines: &[ReceiptLine],
    ) -> CoreResult<i64>;

    /// Insert a sale, checking available stock and decrementing it in the
    /// same atomic step. Insufficient stock fails with `Validation` and
    /// leaves stock untouched.
    async fn insert_sale(&mut self, sale: &ConsignmentSale) -> CoreResult<i64>;

    /// Get a sale by id
    async fn sale(&self, id: i64) -> CoreResult<Option<ConsignmentSale>>;

    /// Sales for a supplier with no settlement yet, sale_date ascending
    async fn unsettled_sales(&self, supplier_id: i64) -> CoreResult<Vec<ConsignmentSale>>;

    /// Create the settlement row and stamp `settlement_id` on each listed
    /// sale, guarded by `settlement_id IS NULL`, in one atomic step. If any
    /// sale is already claimed the whole call fails and no sale is stamped.
    /// Returns the assigned settlement id.
    async fn claim_sales(
        &mut self,
        settlement: &ConsignmentSettlement,
        sale_ids: &[i64],
    ) -> CoreResult<i64>;

    /// Get a settlement by id
    async fn settlement(&self, id: i64) -> CoreResult<Option<ConsignmentSettlement>>;

    /// Current stock quantity for (warehouse, product); 0 when unknown
    async fn stock(&self, warehouse_id: i64, product_id: i64) -> CoreResult<i64>;
}
