//! End-to-end cooperative workflow: seed the chart of accounts, run
//! savings/sales/loan activity through the auto-journal, handle a
//! consignment cycle, and print the month's reports.
//!
//! Run with: cargo run --example coop_workflow

use bigdecimal::BigDecimal;
use chrono::NaiveDate;

use koperasi_core::consignment::{ConsignmentEngine, ReceiptLine};
use koperasi_core::journal::{
    create_standard_chart, AutoJournal, ChartManager, DomainEvent, JournalEngine, JournalMapping,
};
use koperasi_core::loan::LoanEngine;
use koperasi_core::reports::ReportEngine;
use koperasi_core::types::{CoreResult, JournalLine};
use koperasi_core::utils::memory_storage::MemoryStorage;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[tokio::main]
async fn main() -> CoreResult<()> {
    let storage = MemoryStorage::new();

    // 1. Chart of accounts
    let mut chart = ChartManager::new(storage.clone());
    let accounts = create_standard_chart(&mut chart).await?;
    println!("Seeded {} accounts", accounts.len());

    // 2. Founding capital, booked by hand
    let mut journal = JournalEngine::new(storage.clone());
    let capital = journal
        .create_entry(
            date(2024, 1, 1),
            "Founding share capital".to_string(),
            None,
            vec![
                JournalLine::debit(accounts["cash"].id, BigDecimal::from(50_000_000), None),
                JournalLine::credit(
                    accounts["share_capital"].id,
                    BigDecimal::from(50_000_000),
                    None,
                ),
            ],
            1,
        )
        .await?;
    journal.post_entry(capital, 1).await?;

    // 3. Daily activity through the auto-journal
    let mut auto = AutoJournal::new(storage.clone(), JournalMapping::default());
    auto.record(
        &DomainEvent::SavingsDeposit {
            savings_type: "SW".to_string(),
            amount: BigDecimal::from(500_000),
        },
        date(2024, 1, 5),
        2,
    )
    .await?;
    auto.record(
        &DomainEvent::PosSale {
            amount: BigDecimal::from(1_250_000),
        },
        date(2024, 1, 8),
        2,
    )
    .await?;

    // 4. A member loan: apply, approve, disburse, first repayment
    let mut loans = LoanEngine::new(storage.clone());
    let loan = loans
        .create_application(42, BigDecimal::from(12_000_000), BigDecimal::from(12), 12)
        .await?;
    loans.approve(loan.id).await?;
    let loan = loans.disburse(loan.id, date(2024, 1, 10)).await?;
    auto.record(
        &DomainEvent::LoanDisbursement {
            amount: loan.principal.clone(),
        },
        date(2024, 1, 10),
        1,
    )
    .await?;

    loans
        .record_repayment(loan.id, BigDecimal::from(1_120_000))
        .await?;
    auto.record(
        &DomainEvent::LoanRepayment {
            principal: BigDecimal::from(1_000_000),
            interest: BigDecimal::from(120_000),
        },
        date(2024, 1, 25),
        1,
    )
    .await?;
    println!("Loan {} schedule:", loan.id);
    for row in loans.schedule(loan.id).await? {
        println!(
            "  #{:2} due {} principal {:>10} interest {:>8} paid {:>10} {:?}",
            row.sequence, row.due_date, row.principal_due, row.interest_due, row.amount_paid,
            row.status
        );
    }

    // 5. Consignment: receive goods, sell, settle
    let mut consignment = ConsignmentEngine::new(storage.clone());
    let supplier = consignment
        .create_supplier("Kelompok Tani Makmur".to_string(), Some("0812".to_string()))
        .await?;
    consignment
        .create_receipt(
            supplier.id,
            1,
            date(2024, 1, 12),
            vec![ReceiptLine {
                receipt_id: 0,
                product_id: 100,
                quantity: 40,
                unit_price: BigDecimal::from(10_000),
            }],
            Some("Morning delivery".to_string()),
        )
        .await?;
    let sale = consignment
        .add_manual_sale(supplier.id, 100, 1, date(2024, 1, 20), 25, BigDecimal::from(10_000))
        .await?;
    let settlement = consignment
        .create_settlement(supplier.id, date(2024, 1, 31), &[sale.id], None)
        .await?;
    println!(
        "Settled supplier {} for {} (stock left: {})",
        supplier.name,
        settlement.total_amount,
        consignment.stock(1, 100).await?
    );
    let entry = journal
        .create_entry(
            date(2024, 1, 31),
            "Consignment settlement payable".to_string(),
            Some(format!("settlement:{}", settlement.id)),
            vec![
                JournalLine::debit(
                    accounts["cogs"].id,
                    settlement.total_amount.clone(),
                    None,
                ),
                JournalLine::credit(
                    accounts["consignment_payable"].id,
                    settlement.total_amount.clone(),
                    None,
                ),
            ],
            1,
        )
        .await?;
    journal.post_entry(entry, 1).await?;

    // 6. Month-end reports
    let reports = ReportEngine::new(storage.clone());
    let tb = reports
        .trial_balance(date(2024, 1, 1), date(2024, 1, 31))
        .await?;
    println!("\nTrial balance (January 2024), balanced: {}", tb.is_balanced);
    for row in &tb.rows {
        if row.closing_balance != BigDecimal::from(0) {
            println!(
                "  {:<6} {:<28} {:>12}",
                row.account.code, row.account.name, row.closing_balance
            );
        }
    }

    let bs = reports.balance_sheet(date(2024, 1, 31)).await?;
    println!(
        "\nBalance sheet: assets {} = liabilities {} + equity {}",
        bs.total_assets, bs.total_liabilities, bs.total_equity
    );

    let pl = reports
        .profit_loss(date(2024, 1, 1), date(2024, 1, 31))
        .await?;
    println!("Profit and loss: net {}", pl.net);

    let gl = reports
        .general_ledger(accounts["cash"].id, date(2024, 1, 1), date(2024, 1, 31))
        .await?;
    println!(
        "Cash ledger: opening {} closing {} over {} movements",
        gl.opening_balance,
        gl.closing_balance,
        gl.lines.len()
    );

    Ok(())
}
