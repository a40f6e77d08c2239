//! # Koperasi Core
//!
//! An accounting and operations core for cooperative (koperasi) ERPs,
//! built around a double-entry journal.
//!
//! ## Features
//!
//! - **Double-entry journal**: Draft entries validated to balance, an
//!   append-only posted ledger, and reversing entries for corrections
//! - **Chart of accounts**: Assets, Liabilities, Equity, Revenue, and
//!   Expense accounts with a seedable standard cooperative chart
//! - **Financial reporting**: Trial balance, balance sheet, profit and
//!   loss, and per-account general ledger views
//! - **Member loans**: Flat-rate amortization schedules with
//!   oldest-first repayment allocation
//! - **Consignment**: Supplier goods receipts, stock-checked sales, and
//!   atomic settlement batches
//! - **Auto-journal**: Savings, point-of-sale, and loan events recorded
//!   as balanced journal entries through a configurable account mapping
//! - **Storage abstraction**: Database-agnostic design with trait-based
//!   storage and a bundled in-memory backend
//!
//! ## Quick Start
//!
//! ```rust
//! use koperasi_core::journal::{create_standard_chart, ChartManager, JournalEngine};
//! use koperasi_core::types::JournalLine;
//! use koperasi_core::utils::memory_storage::MemoryStorage;
//! use bigdecimal::BigDecimal;
//! use chrono::NaiveDate;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), koperasi_core::types::CoreError> {
//! let storage = MemoryStorage::new();
//! let mut chart = ChartManager::new(storage.clone());
//! let accounts = create_standard_chart(&mut chart).await?;
//!
//! let mut journal = JournalEngine::new(storage);
//! let entry_id = journal
//!     .create_entry(
//!         NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
//!         "Member savings deposit".to_string(),
//!         None,
//!         vec![
//!             JournalLine::debit(accounts["cash"].id, BigDecimal::from(500_000), None),
//!             JournalLine::credit(
//!                 accounts["savings_voluntary"].id,
//!                 BigDecimal::from(500_000),
//!                 None,
//!             ),
//!         ],
//!         1,
//!     )
//!     .await?;
//! journal.post_entry(entry_id, 1).await?;
//! # Ok(())
//! # }
//! ```

pub mod consignment;
pub mod journal;
pub mod loan;
pub mod reports;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use journal::*;
pub use traits::*;
pub use types::*;
