//! In-memory storage implementation for testing and development
//!
//! All three store traits are served from one state block behind a single
//! `RwLock`, so the multi-row operations the traits require to be atomic
//! (entry + lines, receipt + stock, sale + stock, settlement claiming)
//! happen under one write lock, matching the single-transaction contract
//! a relational backend would provide.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::consignment::{
    ConsignmentReceipt, ConsignmentSale, ConsignmentSettlement, ConsignmentSupplier, ReceiptLine,
};
use crate::loan::{Installment, Loan};
use crate::traits::*;
use crate::types::*;

#[derive(Debug, Default)]
struct State {
    next_id: i64,
    accounts: HashMap<i64, Account>,
    entries: HashMap<i64, JournalEntry>,
    entry_lines: HashMap<i64, Vec<JournalLine>>,
    loans: HashMap<i64, Loan>,
    schedules: HashMap<i64, Vec<Installment>>,
    suppliers: HashMap<i64, ConsignmentSupplier>,
    receipts: HashMap<i64, (ConsignmentReceipt, Vec<ReceiptLine>)>,
    sales: HashMap<i64, ConsignmentSale>,
    settlements: HashMap<i64, ConsignmentSettlement>,
    stock: HashMap<(i64, i64), i64>,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-memory storage for tests and development
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    state: Arc<RwLock<State>>,
}

impl MemoryStorage {
    /// Create a new memory storage instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all data (useful for testing)
    pub fn clear(&self) {
        *self.state.write().unwrap() = State::default();
    }

    /// Seed a stock level directly, bypassing receipts (test helper)
    pub fn set_stock(&self, warehouse_id: i64, product_id: i64, quantity: i64) {
        self.state
            .write()
            .unwrap()
            .stock
            .insert((warehouse_id, product_id), quantity);
    }
}

#[async_trait]
impl JournalStore for MemoryStorage {
    async fn insert_account(&mut self, account: &Account) -> CoreResult<i64> {
        let mut state = self.state.write().unwrap();
        if state.accounts.values().any(|a| a.code == account.code) {
            return Err(CoreError::Validation(format!(
                "account code '{}' already exists",
                account.code
            )));
        }
        let id = state.next_id();
        let mut account = account.clone();
        account.id = id;
        state.accounts.insert(id, account);
        Ok(id)
    }

    async fn account(&self, id: i64) -> CoreResult<Option<Account>> {
        Ok(self.state.read().unwrap().accounts.get(&id).cloned())
    }

    async fn account_by_code(&self, code: &str) -> CoreResult<Option<Account>> {
        Ok(self
            .state
            .read()
            .unwrap()
            .accounts
            .values()
            .find(|a| a.code == code)
            .cloned())
    }

    async fn list_accounts(&self, account_type: Option<AccountType>) -> CoreResult<Vec<Account>> {
        let state = self.state.read().unwrap();
        let mut accounts: Vec<Account> = state
            .accounts
            .values()
            .filter(|a| account_type.is_none_or(|t| a.account_type == t))
            .cloned()
            .collect();
        accounts.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(accounts)
    }

    async fn update_account(&mut self, account: &Account) -> CoreResult<()> {
        let mut state = self.state.write().unwrap();
        if !state.accounts.contains_key(&account.id) {
            return Err(CoreError::not_found("account", account.id));
        }
        state.accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn insert_entry(
        &mut self,
        entry: &JournalEntry,
        lines: &[JournalLine],
    ) -> CoreResult<i64> {
        let mut state = self.state.write().unwrap();
        let id = state.next_id();
        let mut entry = entry.clone();
        entry.id = id;
        let lines: Vec<JournalLine> = lines
            .iter()
            .map(|line| {
                let mut line = line.clone();
                line.entry_id = id;
                line
            })
            .collect();
        state.entries.insert(id, entry);
        state.entry_lines.insert(id, lines);
        Ok(id)
    }

    async fn entry(&self, id: i64) -> CoreResult<Option<JournalEntry>> {
        Ok(self.state.read().unwrap().entries.get(&id).cloned())
    }

    async fn entry_lines(&self, entry_id: i64) -> CoreResult<Vec<JournalLine>> {
        Ok(self
            .state
            .read()
            .unwrap()
            .entry_lines
            .get(&entry_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn mark_posted(
        &mut self,
        entry_id: i64,
        actor: i64,
        at: NaiveDateTime,
    ) -> CoreResult<()> {
        let mut state = self.state.write().unwrap();
        let entry = state
            .entries
            .get_mut(&entry_id)
            .ok_or_else(|| CoreError::not_found("journal entry", entry_id))?;
        entry.status = EntryStatus::Posted;
        entry.posted_by = Some(actor);
        entry.posted_at = Some(at);
        Ok(())
    }

    async fn list_entries(
        &self,
        filter: &EntryFilter,
        page: &PageRequest,
    ) -> CoreResult<Vec<JournalEntry>> {
        let state = self.state.read().unwrap();
        let mut entries: Vec<JournalEntry> = state
            .entries
            .values()
            .filter(|e| {
                filter.status.is_none_or(|s| e.status == s)
                    && filter.from.is_none_or(|from| e.entry_date >= from)
                    && filter.to.is_none_or(|to| e.entry_date <= to)
            })
            .cloned()
            .collect();
        entries.sort_by(|a, b| {
            b.entry_date
                .cmp(&a.entry_date)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(entries
            .into_iter()
            .skip(page.offset())
            .take(page.limit())
            .collect())
    }

    async fn posted_lines(
        &self,
        account_id: Option<i64>,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> CoreResult<Vec<PostedLine>> {
        let state = self.state.read().unwrap();
        let mut lines: Vec<PostedLine> = state
            .entries
            .values()
            .filter(|e| {
                e.status.is_posted()
                    && from.is_none_or(|d| e.entry_date >= d)
                    && to.is_none_or(|d| e.entry_date <= d)
            })
            .flat_map(|e| {
                state
                    .entry_lines
                    .get(&e.id)
                    .into_iter()
                    .flatten()
                    .filter(|line| account_id.is_none_or(|a| line.account_id == a))
                    .map(|line| PostedLine {
                        entry_id: e.id,
                        entry_date: e.entry_date,
                        account_id: line.account_id,
                        debit: line.debit.clone(),
                        credit: line.credit.clone(),
                        description: line.description.clone(),
                    })
            })
            .collect();
        lines.sort_by(|a, b| {
            a.entry_date
                .cmp(&b.entry_date)
                .then_with(|| a.entry_id.cmp(&b.entry_id))
        });
        Ok(lines)
    }
}

#[async_trait]
impl LoanStore for MemoryStorage {
    async fn insert_loan(&mut self, loan: &Loan) -> CoreResult<i64> {
        let mut state = self.state.write().unwrap();
        let id = state.next_id();
        let mut loan = loan.clone();
        loan.id = id;
        state.loans.insert(id, loan);
        Ok(id)
    }

    async fn loan(&self, id: i64) -> CoreResult<Option<Loan>> {
        Ok(self.state.read().unwrap().loans.get(&id).cloned())
    }

    async fn loans_by_member(&self, member_id: i64) -> CoreResult<Vec<Loan>> {
        let state = self.state.read().unwrap();
        let mut loans: Vec<Loan> = state
            .loans
            .values()
            .filter(|l| l.member_id == member_id)
            .cloned()
            .collect();
        loans.sort_by_key(|l| l.id);
        Ok(loans)
    }

    async fn update_loan(&mut self, loan: &Loan) -> CoreResult<()> {
        let mut state = self.state.write().unwrap();
        if !state.loans.contains_key(&loan.id) {
            return Err(CoreError::not_found("loan", loan.id));
        }
        state.loans.insert(loan.id, loan.clone());
        Ok(())
    }

    async fn insert_schedule(&mut self, loan_id: i64, rows: &[Installment]) -> CoreResult<()> {
        let mut state = self.state.write().unwrap();
        if !state.loans.contains_key(&loan_id) {
            return Err(CoreError::not_found("loan", loan_id));
        }
        if state.schedules.contains_key(&loan_id) {
            return Err(CoreError::InvalidState(format!(
                "loan {loan_id} already has a schedule"
            )));
        }
        state.schedules.insert(loan_id, rows.to_vec());
        Ok(())
    }

    async fn schedule(&self, loan_id: i64) -> CoreResult<Vec<Installment>> {
        let mut rows = self
            .state
            .read()
            .unwrap()
            .schedules
            .get(&loan_id)
            .cloned()
            .unwrap_or_default();
        rows.sort_by_key(|r| r.sequence);
        Ok(rows)
    }

    async fn update_installment(&mut self, row: &Installment) -> CoreResult<()> {
        let mut state = self.state.write().unwrap();
        let schedule = state
            .schedules
            .get_mut(&row.loan_id)
            .ok_or_else(|| CoreError::not_found("loan schedule", row.loan_id))?;
        let slot = schedule
            .iter_mut()
            .find(|r| r.sequence == row.sequence)
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "loan {} has no installment #{}",
                    row.loan_id, row.sequence
                ))
            })?;
        *slot = row.clone();
        Ok(())
    }
}

#[async_trait]
impl ConsignmentStore for MemoryStorage {
    async fn insert_supplier(&mut self, supplier: &ConsignmentSupplier) -> CoreResult<i64> {
        let mut state = self.state.write().unwrap();
        let id = state.next_id();
        let mut supplier = supplier.clone();
        supplier.id = id;
        state.suppliers.insert(id, supplier);
        Ok(id)
    }

    async fn supplier(&self, id: i64) -> CoreResult<Option<ConsignmentSupplier>> {
        Ok(self.state.read().unwrap().suppliers.get(&id).cloned())
    }

    async fn update_supplier(&mut self, supplier: &ConsignmentSupplier) -> CoreResult<()> {
        let mut state = self.state.write().unwrap();
        if !state.suppliers.contains_key(&supplier.id) {
            return Err(CoreError::not_found("consignment supplier", supplier.id));
        }
        state.suppliers.insert(supplier.id, supplier.clone());
        Ok(())
    }

    async fn insert_receipt(
        &mut self,
        receipt: &ConsignmentReceipt,
        lines: &[ReceiptLine],
    ) -> CoreResult<i64> {
        let mut state = self.state.write().unwrap();
        let id = state.next_id();
        let mut receipt = receipt.clone();
        receipt.id = id;
        let lines: Vec<ReceiptLine> = lines
            .iter()
            .map(|line| {
                let mut line = line.clone();
                line.receipt_id = id;
                line
            })
            .collect();
        for line in &lines {
            *state
                .stock
                .entry((receipt.warehouse_id, line.product_id))
                .or_insert(0) += line.quantity;
        }
        state.receipts.insert(id, (receipt, lines));
        Ok(id)
    }

    async fn insert_sale(&mut self, sale: &ConsignmentSale) -> CoreResult<i64> {
        let mut state = self.state.write().unwrap();
        let key = (sale.warehouse_id, sale.product_id);
        let available = state.stock.get(&key).copied().unwrap_or(0);
        if available < sale.quantity {
            return Err(CoreError::Validation(format!(
                "insufficient consigned stock for product {} at warehouse {}: have {}, need {}",
                sale.product_id, sale.warehouse_id, available, sale.quantity
            )));
        }
        state.stock.insert(key, available - sale.quantity);
        let id = state.next_id();
        let mut sale = sale.clone();
        sale.id = id;
        state.sales.insert(id, sale);
        Ok(id)
    }

    async fn sale(&self, id: i64) -> CoreResult<Option<ConsignmentSale>> {
        Ok(self.state.read().unwrap().sales.get(&id).cloned())
    }

    async fn unsettled_sales(&self, supplier_id: i64) -> CoreResult<Vec<ConsignmentSale>> {
        let state = self.state.read().unwrap();
        let mut sales: Vec<ConsignmentSale> = state
            .sales
            .values()
            .filter(|s| s.supplier_id == supplier_id && s.settlement_id.is_none())
            .cloned()
            .collect();
        sales.sort_by(|a, b| a.sale_date.cmp(&b.sale_date).then_with(|| a.id.cmp(&b.id)));
        Ok(sales)
    }

    async fn claim_sales(
        &mut self,
        settlement: &ConsignmentSettlement,
        sale_ids: &[i64],
    ) -> CoreResult<i64> {
        let mut state = self.state.write().unwrap();
        // Re-check every sale under the write lock before stamping any of
        // them; this is the conditional-update guard against double claims.
        for sale_id in sale_ids {
            let sale = state
                .sales
                .get(sale_id)
                .ok_or_else(|| CoreError::not_found("consignment sale", *sale_id))?;
            if sale.settlement_id.is_some() {
                return Err(CoreError::Validation(format!(
                    "sale {sale_id} is already settled"
                )));
            }
            if sale.supplier_id != settlement.supplier_id {
                return Err(CoreError::Validation(format!(
                    "sale {} belongs to supplier {}, not {}",
                    sale_id, sale.supplier_id, settlement.supplier_id
                )));
            }
        }
        let id = state.next_id();
        let mut settlement = settlement.clone();
        settlement.id = id;
        state.settlements.insert(id, settlement);
        for sale_id in sale_ids {
            if let Some(sale) = state.sales.get_mut(sale_id) {
                sale.settlement_id = Some(id);
            }
        }
        Ok(id)
    }

    async fn settlement(&self, id: i64) -> CoreResult<Option<ConsignmentSettlement>> {
        Ok(self.state.read().unwrap().settlements.get(&id).cloned())
    }

    async fn stock(&self, warehouse_id: i64, product_id: i64) -> CoreResult<i64> {
        Ok(self
            .state
            .read()
            .unwrap()
            .stock
            .get(&(warehouse_id, product_id))
            .copied()
            .unwrap_or(0))
    }
}
