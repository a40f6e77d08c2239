//! Chart of accounts management

use std::collections::HashMap;

use crate::traits::JournalStore;
use crate::types::*;
use crate::utils::validation::{validate_account_code, validate_name};

/// Manager for chart-of-accounts operations
pub struct ChartManager<S: JournalStore> {
    storage: S,
}

impl<S: JournalStore> ChartManager<S> {
    /// Create a new chart manager
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Create a new account.
    ///
    /// The code must be unique across the chart; the parent, if given,
    /// must already exist.
    pub async fn create_account(
        &mut self,
        code: String,
        name: String,
        account_type: AccountType,
        parent_id: Option<i64>,
    ) -> CoreResult<Account> {
        validate_account_code(&code)?;
        validate_name("account name", &name)?;

        if self.storage.account_by_code(&code).await?.is_some() {
            return Err(CoreError::Validation(format!(
                "account code '{code}' already exists"
            )));
        }

        if let Some(parent_id) = parent_id {
            if self.storage.account(parent_id).await?.is_none() {
                return Err(CoreError::Validation(format!(
                    "parent account {parent_id} does not exist"
                )));
            }
        }

        let mut account = Account::new(code, name, account_type);
        account.parent_id = parent_id;
        account.id = self.storage.insert_account(&account).await?;
        Ok(account)
    }

    /// Get an account by id
    pub async fn account(&self, id: i64) -> CoreResult<Option<Account>> {
        self.storage.account(id).await
    }

    /// Get an account by id, returning an error if not found
    pub async fn account_required(&self, id: i64) -> CoreResult<Account> {
        self.storage
            .account(id)
            .await?
            .ok_or_else(|| CoreError::not_found("account", id))
    }

    /// Get an account by code
    pub async fn account_by_code(&self, code: &str) -> CoreResult<Option<Account>> {
        self.storage.account_by_code(code).await
    }

    /// List all accounts ordered by code
    pub async fn list_accounts(&self) -> CoreResult<Vec<Account>> {
        self.storage.list_accounts(None).await
    }

    /// List accounts of one type ordered by code
    pub async fn list_accounts_by_type(
        &self,
        account_type: AccountType,
    ) -> CoreResult<Vec<Account>> {
        self.storage.list_accounts(Some(account_type)).await
    }

    /// Deactivate an account so it no longer accepts journal lines.
    /// Posted history is untouched.
    pub async fn deactivate_account(&mut self, id: i64) -> CoreResult<Account> {
        let mut account = self.account_required(id).await?;
        account.is_active = false;
        self.storage.update_account(&account).await?;
        Ok(account)
    }
}

/// Create the standard chart of accounts for a cooperative.
///
/// Returns the created accounts keyed by a stable slug so callers and
/// tests can reference them by role rather than by code.
pub async fn create_standard_chart<S: JournalStore>(
    chart: &mut ChartManager<S>,
) -> CoreResult<HashMap<String, Account>> {
    let mut accounts = HashMap::new();

    let definitions: [(&str, &str, &str, AccountType); 14] = [
        ("cash", "1000", "Cash", AccountType::Asset),
        ("bank", "1100", "Bank", AccountType::Asset),
        ("loan_receivable", "1200", "Loan Receivable", AccountType::Asset),
        ("inventory", "1300", "Inventory", AccountType::Asset),
        (
            "consignment_payable",
            "2000",
            "Consignment Payable",
            AccountType::Liability,
        ),
        (
            "savings_principal",
            "2100",
            "Member Savings - Principal",
            AccountType::Liability,
        ),
        (
            "savings_mandatory",
            "2200",
            "Member Savings - Mandatory",
            AccountType::Liability,
        ),
        (
            "savings_voluntary",
            "2300",
            "Member Savings - Voluntary",
            AccountType::Liability,
        ),
        ("share_capital", "3000", "Share Capital", AccountType::Equity),
        (
            "retained_earnings",
            "3100",
            "Retained Earnings",
            AccountType::Equity,
        ),
        ("sales_revenue", "4000", "Sales Revenue", AccountType::Revenue),
        ("interest_income", "4100", "Interest Income", AccountType::Revenue),
        ("cogs", "5000", "Cost of Goods Sold", AccountType::Expense),
        (
            "operating_expense",
            "5100",
            "Operating Expense",
            AccountType::Expense,
        ),
    ];

    for (slug, code, name, account_type) in definitions {
        let account = chart
            .create_account(code.to_string(), name.to_string(), account_type, None)
            .await?;
        accounts.insert(slug.to_string(), account);
    }

    Ok(accounts)
}
