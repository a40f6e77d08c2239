//! Report generation by aggregating posted journal lines
//!
//! All views here are read-only and derive exclusively from the ledger
//! (posted lines); drafts never influence a report.

use std::collections::HashMap;

use bigdecimal::BigDecimal;
use chrono::NaiveDate;

use super::*;
use crate::traits::JournalStore;
use crate::types::*;

/// Per-account debit/credit accumulator
#[derive(Default)]
struct Movement {
    debit: BigDecimal,
    credit: BigDecimal,
}

impl Movement {
    /// Balance on the account's normal side; negative means contra
    fn balance_on(&self, side: EntrySide) -> BigDecimal {
        match side {
            EntrySide::Debit => &self.debit - &self.credit,
            EntrySide::Credit => &self.credit - &self.debit,
        }
    }
}

/// Engine for trial balance, balance sheet, profit and loss, and general
/// ledger views
pub struct ReportEngine<S: JournalStore> {
    storage: S,
}

impl<S: JournalStore> ReportEngine<S> {
    /// Create a new report engine
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Trial balance over `[from, to]`.
    ///
    /// Period columns cover the window; the closing balance is computed
    /// since inception through `to` on each account's normal side. All
    /// active accounts are listed regardless of activity.
    pub async fn trial_balance(&self, from: NaiveDate, to: NaiveDate) -> CoreResult<TrialBalance> {
        let accounts = self.active_accounts(None).await?;
        let lines = self.storage.posted_lines(None, None, Some(to)).await?;

        let mut period: HashMap<i64, Movement> = HashMap::new();
        let mut inception: HashMap<i64, Movement> = HashMap::new();
        for line in &lines {
            let slot = inception.entry(line.account_id).or_default();
            slot.debit += &line.debit;
            slot.credit += &line.credit;
            if line.entry_date >= from {
                let slot = period.entry(line.account_id).or_default();
                slot.debit += &line.debit;
                slot.credit += &line.credit;
            }
        }

        let mut rows = Vec::with_capacity(accounts.len());
        let mut total_debits = BigDecimal::from(0);
        let mut total_credits = BigDecimal::from(0);
        for account in accounts {
            let window = period.remove(&account.id).unwrap_or_default();
            let closing = inception
                .remove(&account.id)
                .unwrap_or_default()
                .balance_on(account.account_type.normal_side());
            total_debits += &window.debit;
            total_credits += &window.credit;
            rows.push(TrialBalanceRow {
                account,
                period_debit: window.debit,
                period_credit: window.credit,
                closing_balance: closing,
            });
        }

        let is_balanced = total_debits == total_credits;
        Ok(TrialBalance {
            from,
            to,
            rows,
            total_debits,
            total_credits,
            is_balanced,
        })
    }

    /// Balance sheet as of a date, summed since account inception.
    ///
    /// Net income since inception is appended to equity as a synthetic
    /// "Current period result" line, mirroring how retained earnings
    /// would absorb it at year close. If assets still differ from
    /// liabilities plus equity, the ledger itself is corrupt and the
    /// call fails with `Integrity` instead of displaying a broken report.
    pub async fn balance_sheet(&self, as_of: NaiveDate) -> CoreResult<BalanceSheet> {
        let accounts = self.active_accounts(None).await?;
        let lines = self.storage.posted_lines(None, None, Some(as_of)).await?;

        let mut movements: HashMap<i64, Movement> = HashMap::new();
        for line in &lines {
            let slot = movements.entry(line.account_id).or_default();
            slot.debit += &line.debit;
            slot.credit += &line.credit;
        }

        let mut assets = Vec::new();
        let mut liabilities = Vec::new();
        let mut equity = Vec::new();
        let mut net_income = BigDecimal::from(0);
        for account in accounts {
            let amount = movements
                .remove(&account.id)
                .unwrap_or_default()
                .balance_on(account.account_type.normal_side());
            match account.account_type {
                AccountType::Asset => assets.push(report_line(account, amount)),
                AccountType::Liability => liabilities.push(report_line(account, amount)),
                AccountType::Equity => equity.push(report_line(account, amount)),
                AccountType::Revenue => net_income += amount,
                AccountType::Expense => net_income -= amount,
            }
        }

        if net_income != BigDecimal::from(0) {
            equity.push(ReportLine {
                code: "NET".to_string(),
                name: "Current period result".to_string(),
                amount: net_income,
            });
        }

        let total_assets: BigDecimal = assets.iter().map(|l| &l.amount).sum();
        let total_liabilities: BigDecimal = liabilities.iter().map(|l| &l.amount).sum();
        let total_equity: BigDecimal = equity.iter().map(|l| &l.amount).sum();

        if total_assets != &total_liabilities + &total_equity {
            return Err(CoreError::Integrity(format!(
                "balance sheet does not balance as of {as_of}: assets {total_assets}, \
                 liabilities + equity {}",
                &total_liabilities + &total_equity
            )));
        }

        Ok(BalanceSheet {
            as_of,
            assets,
            liabilities,
            equity,
            total_assets,
            total_liabilities,
            total_equity,
        })
    }

    /// Profit and loss over `[from, to]`: revenue and expense accounts
    /// only, windowed to the range
    pub async fn profit_loss(&self, from: NaiveDate, to: NaiveDate) -> CoreResult<ProfitLoss> {
        let lines = self
            .storage
            .posted_lines(None, Some(from), Some(to))
            .await?;

        let mut movements: HashMap<i64, Movement> = HashMap::new();
        for line in &lines {
            let slot = movements.entry(line.account_id).or_default();
            slot.debit += &line.debit;
            slot.credit += &line.credit;
        }

        let mut revenue = Vec::new();
        let mut expenses = Vec::new();
        for account in self.active_accounts(Some(AccountType::Revenue)).await? {
            let amount = movements
                .remove(&account.id)
                .unwrap_or_default()
                .balance_on(EntrySide::Credit);
            revenue.push(report_line(account, amount));
        }
        for account in self.active_accounts(Some(AccountType::Expense)).await? {
            let amount = movements
                .remove(&account.id)
                .unwrap_or_default()
                .balance_on(EntrySide::Debit);
            expenses.push(report_line(account, amount));
        }

        let total_revenue: BigDecimal = revenue.iter().map(|l| &l.amount).sum();
        let total_expenses: BigDecimal = expenses.iter().map(|l| &l.amount).sum();
        let net = &total_revenue - &total_expenses;

        Ok(ProfitLoss {
            from,
            to,
            revenue,
            expenses,
            total_revenue,
            total_expenses,
            net,
        })
    }

    /// General ledger for one account: posted movements in
    /// `(entry_date, entry_id)` order with a running balance starting
    /// from the balance immediately before `from`
    pub async fn general_ledger(
        &self,
        account_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> CoreResult<GeneralLedger> {
        let account = self
            .storage
            .account(account_id)
            .await?
            .ok_or_else(|| CoreError::not_found("account", account_id))?;
        let side = account.account_type.normal_side();

        let opening_balance = match from.pred_opt() {
            Some(day_before) => {
                let prior = self
                    .storage
                    .posted_lines(Some(account_id), None, Some(day_before))
                    .await?;
                let mut movement = Movement::default();
                for line in &prior {
                    movement.debit += &line.debit;
                    movement.credit += &line.credit;
                }
                movement.balance_on(side)
            }
            None => BigDecimal::from(0),
        };

        let window = self
            .storage
            .posted_lines(Some(account_id), Some(from), Some(to))
            .await?;

        let mut running = opening_balance.clone();
        let mut lines = Vec::with_capacity(window.len());
        for line in window {
            running += match side {
                EntrySide::Debit => &line.debit - &line.credit,
                EntrySide::Credit => &line.credit - &line.debit,
            };
            lines.push(GeneralLedgerLine {
                entry_id: line.entry_id,
                entry_date: line.entry_date,
                description: line.description,
                debit: line.debit,
                credit: line.credit,
                running_balance: running.clone(),
            });
        }

        Ok(GeneralLedger {
            account,
            from,
            to,
            opening_balance,
            closing_balance: running,
            lines,
        })
    }

    async fn active_accounts(
        &self,
        account_type: Option<AccountType>,
    ) -> CoreResult<Vec<Account>> {
        Ok(self
            .storage
            .list_accounts(account_type)
            .await?
            .into_iter()
            .filter(|a| a.is_active)
            .collect())
    }
}

fn report_line(account: Account, amount: BigDecimal) -> ReportLine {
    ReportLine {
        code: account.code,
        name: account.name,
        amount,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::{create_standard_chart, ChartManager, JournalEngine};
    use crate::utils::memory_storage::MemoryStorage;
    use std::collections::HashMap as StdHashMap;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn seeded() -> (
        MemoryStorage,
        StdHashMap<String, Account>,
        JournalEngine<MemoryStorage>,
    ) {
        let storage = MemoryStorage::new();
        let mut chart = ChartManager::new(storage.clone());
        let accounts = create_standard_chart(&mut chart).await.unwrap();
        let engine = JournalEngine::new(storage.clone());
        (storage, accounts, engine)
    }

    async fn post(
        engine: &mut JournalEngine<MemoryStorage>,
        d: NaiveDate,
        description: &str,
        debit: (i64, i64),
        credit: (i64, i64),
    ) {
        let id = engine
            .create_entry(
                d,
                description.to_string(),
                None,
                vec![
                    JournalLine::debit(debit.0, BigDecimal::from(debit.1), None),
                    JournalLine::credit(credit.0, BigDecimal::from(credit.1), None),
                ],
                1,
            )
            .await
            .unwrap();
        engine.post_entry(id, 1).await.unwrap();
    }

    #[tokio::test]
    async fn trial_balance_reflects_posted_deposit() {
        let (storage, accounts, mut engine) = seeded().await;
        let cash = accounts["cash"].id;
        let savings = accounts["savings_voluntary"].id;
        post(
            &mut engine,
            date(2024, 1, 10),
            "Member deposit",
            (cash, 500_000),
            (savings, 500_000),
        )
        .await;

        let reports = ReportEngine::new(storage);
        let tb = reports
            .trial_balance(date(2024, 1, 1), date(2024, 1, 31))
            .await
            .unwrap();

        assert!(tb.is_balanced);
        assert_eq!(tb.total_debits, BigDecimal::from(500_000));
        assert_eq!(tb.total_credits, BigDecimal::from(500_000));

        let cash_row = tb.rows.iter().find(|r| r.account.id == cash).unwrap();
        assert_eq!(cash_row.period_debit, BigDecimal::from(500_000));
        assert_eq!(cash_row.closing_balance, BigDecimal::from(500_000));

        let savings_row = tb.rows.iter().find(|r| r.account.id == savings).unwrap();
        assert_eq!(savings_row.period_credit, BigDecimal::from(500_000));
        assert_eq!(savings_row.closing_balance, BigDecimal::from(500_000));

        // Every active account appears, even those with no activity.
        assert_eq!(tb.rows.len(), 14);
    }

    #[tokio::test]
    async fn trial_balance_ignores_drafts() {
        let (storage, accounts, mut engine) = seeded().await;
        engine
            .create_entry(
                date(2024, 1, 10),
                "Unposted draft".to_string(),
                None,
                vec![
                    JournalLine::debit(accounts["cash"].id, BigDecimal::from(999), None),
                    JournalLine::credit(
                        accounts["savings_voluntary"].id,
                        BigDecimal::from(999),
                        None,
                    ),
                ],
                1,
            )
            .await
            .unwrap();

        let reports = ReportEngine::new(storage);
        let tb = reports
            .trial_balance(date(2024, 1, 1), date(2024, 1, 31))
            .await
            .unwrap();
        assert_eq!(tb.total_debits, BigDecimal::from(0));
    }

    #[tokio::test]
    async fn balance_sheet_balances_and_carries_net_income() {
        let (storage, accounts, mut engine) = seeded().await;
        // Capital in, then a cash sale: assets 1,200,000 = equity
        // 1,000,000 + net income 200,000.
        post(
            &mut engine,
            date(2024, 1, 1),
            "Share capital",
            (accounts["cash"].id, 1_000_000),
            (accounts["share_capital"].id, 1_000_000),
        )
        .await;
        post(
            &mut engine,
            date(2024, 1, 15),
            "Cash sale",
            (accounts["cash"].id, 200_000),
            (accounts["sales_revenue"].id, 200_000),
        )
        .await;

        let reports = ReportEngine::new(storage);
        let bs = reports.balance_sheet(date(2024, 1, 31)).await.unwrap();
        assert_eq!(bs.total_assets, BigDecimal::from(1_200_000));
        assert_eq!(
            bs.total_assets,
            &bs.total_liabilities + &bs.total_equity
        );
        let net = bs.equity.iter().find(|l| l.code == "NET").unwrap();
        assert_eq!(net.amount, BigDecimal::from(200_000));
    }

    #[tokio::test]
    async fn corrupt_ledger_surfaces_as_integrity_error() {
        let (mut storage, accounts, _) = seeded().await;
        // Bypass the engine to store an unbalanced posted entry.
        let entry = JournalEntry::draft(date(2024, 1, 5), "corrupt".to_string(), None, 1);
        let lines = vec![JournalLine::debit(
            accounts["cash"].id,
            BigDecimal::from(100),
            None,
        )];
        let id = storage.insert_entry(&entry, &lines).await.unwrap();
        storage
            .mark_posted(id, 1, chrono::Utc::now().naive_utc())
            .await
            .unwrap();

        let reports = ReportEngine::new(storage);
        let result = reports.balance_sheet(date(2024, 1, 31)).await;
        assert!(matches!(result, Err(CoreError::Integrity(_))));
    }

    #[tokio::test]
    async fn profit_loss_is_windowed() {
        let (storage, accounts, mut engine) = seeded().await;
        post(
            &mut engine,
            date(2024, 1, 15),
            "January sale",
            (accounts["cash"].id, 300_000),
            (accounts["sales_revenue"].id, 300_000),
        )
        .await;
        post(
            &mut engine,
            date(2024, 2, 15),
            "February rent",
            (accounts["operating_expense"].id, 120_000),
            (accounts["cash"].id, 120_000),
        )
        .await;

        let reports = ReportEngine::new(storage);
        let january = reports
            .profit_loss(date(2024, 1, 1), date(2024, 1, 31))
            .await
            .unwrap();
        assert_eq!(january.total_revenue, BigDecimal::from(300_000));
        assert_eq!(january.total_expenses, BigDecimal::from(0));
        assert_eq!(january.net, BigDecimal::from(300_000));

        let both = reports
            .profit_loss(date(2024, 1, 1), date(2024, 2, 29))
            .await
            .unwrap();
        assert_eq!(both.net, BigDecimal::from(180_000));
    }

    #[tokio::test]
    async fn general_ledger_runs_from_opening_balance() {
        let (storage, accounts, mut engine) = seeded().await;
        let cash = accounts["cash"].id;
        post(
            &mut engine,
            date(2024, 1, 10),
            "Opening deposit",
            (cash, 400_000),
            (accounts["savings_voluntary"].id, 400_000),
        )
        .await;
        post(
            &mut engine,
            date(2024, 2, 5),
            "Sale",
            (cash, 150_000),
            (accounts["sales_revenue"].id, 150_000),
        )
        .await;
        post(
            &mut engine,
            date(2024, 2, 20),
            "Rent",
            (accounts["operating_expense"].id, 100_000),
            (cash, 100_000),
        )
        .await;

        let reports = ReportEngine::new(storage);
        let gl = reports
            .general_ledger(cash, date(2024, 2, 1), date(2024, 2, 29))
            .await
            .unwrap();

        assert_eq!(gl.opening_balance, BigDecimal::from(400_000));
        assert_eq!(gl.lines.len(), 2);
        assert_eq!(gl.lines[0].running_balance, BigDecimal::from(550_000));
        assert_eq!(gl.lines[1].running_balance, BigDecimal::from(450_000));
        assert_eq!(gl.closing_balance, BigDecimal::from(450_000));
    }

    #[tokio::test]
    async fn general_ledger_unknown_account_is_not_found() {
        let (storage, _, _) = seeded().await;
        let reports = ReportEngine::new(storage);
        let result = reports
            .general_ledger(999, date(2024, 1, 1), date(2024, 1, 31))
            .await;
        assert!(matches!(result, Err(CoreError::NotFound { .. })));
    }
}
