//! Journal entry creation, validation, posting, and listing
//!
//! The ledger is the append-only set of posted lines. Entries are created
//! as drafts and become immutable once posted; corrections are modeled as
//! new reversing entries, never as edits to posted ones.

use bigdecimal::BigDecimal;
use chrono::NaiveDate;

use crate::traits::JournalStore;
use crate::types::*;
use crate::utils::validation::validate_description;

/// Engine for journal entry operations
pub struct JournalEngine<S: JournalStore> {
    storage: S,
}

impl<S: JournalStore> JournalEngine<S> {
    /// Create a new journal engine
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Create a draft journal entry from the given lines.
    ///
    /// Validates that there are at least two lines (a single line can
    /// never balance), that each line posts exactly one positive side,
    /// that every referenced account exists and is active, and that total
    /// debits equal total credits after rounding to whole currency units.
    /// The entry header and its lines are persisted in one atomic step.
    pub async fn create_entry(
        &mut self,
        entry_date: NaiveDate,
        description: String,
        reference: Option<String>,
        lines: Vec<JournalLine>,
        actor: i64,
    ) -> CoreResult<i64> {
        validate_description(&description)?;
        let lines = self.validate_lines(lines).await?;

        let entry = JournalEntry::draft(entry_date, description, reference, actor);
        self.storage.insert_entry(&entry, &lines).await
    }

    /// Post a draft entry, making it part of the ledger.
    ///
    /// Fails with `NotFound` for an unknown id and `InvalidState` when the
    /// entry is already posted; a second post attempt always fails rather
    /// than silently succeeding. The balance is re-checked before posting;
    /// an unbalanced draft at this point means the stored data is corrupt
    /// and surfaces as `Integrity`.
    pub async fn post_entry(&mut self, id: i64, actor: i64) -> CoreResult<JournalEntry> {
        let entry = self
            .storage
            .entry(id)
            .await?
            .ok_or_else(|| CoreError::not_found("journal entry", id))?;

        if entry.status.is_posted() {
            return Err(CoreError::InvalidState(format!(
                "journal entry {id} is already posted"
            )));
        }

        let lines = self.storage.entry_lines(id).await?;
        let (debits, credits) = totals(&lines);
        if debits != credits {
            return Err(CoreError::Integrity(format!(
                "draft entry {id} is unbalanced in storage: debits {debits}, credits {credits}"
            )));
        }

        let now = chrono::Utc::now().naive_utc();
        self.storage.mark_posted(id, actor, now).await?;
        tracing::debug!(entry_id = id, actor, "journal entry posted");

        let mut entry = entry;
        entry.status = EntryStatus::Posted;
        entry.posted_by = Some(actor);
        entry.posted_at = Some(now);
        Ok(entry)
    }

    /// Create a draft entry that reverses a posted entry.
    ///
    /// Each line's debit and credit are swapped; the new entry references
    /// the original and must itself be posted to take effect. This is the
    /// only supported way to correct a posted entry.
    pub async fn reverse_entry(
        &mut self,
        id: i64,
        entry_date: NaiveDate,
        actor: i64,
    ) -> CoreResult<i64> {
        let entry = self
            .storage
            .entry(id)
            .await?
            .ok_or_else(|| CoreError::not_found("journal entry", id))?;

        if !entry.status.is_posted() {
            return Err(CoreError::InvalidState(format!(
                "journal entry {id} is not posted; only posted entries can be reversed"
            )));
        }

        let lines: Vec<JournalLine> = self
            .storage
            .entry_lines(id)
            .await?
            .into_iter()
            .map(|line| JournalLine {
                entry_id: 0,
                account_id: line.account_id,
                debit: line.credit,
                credit: line.debit,
                description: line.description,
            })
            .collect();

        self.create_entry(
            entry_date,
            format!("Reversal of entry {id}: {}", entry.description),
            Some(format!("reversal:{id}")),
            lines,
            actor,
        )
        .await
    }

    /// Get an entry and its lines, failing with `NotFound` if absent
    pub async fn entry_with_lines(&self, id: i64) -> CoreResult<(JournalEntry, Vec<JournalLine>)> {
        let entry = self
            .storage
            .entry(id)
            .await?
            .ok_or_else(|| CoreError::not_found("journal entry", id))?;
        let lines = self.storage.entry_lines(id).await?;
        Ok((entry, lines))
    }

    /// List entries by status and date range, newest first,
    /// with stable pagination
    pub async fn list_entries(
        &self,
        filter: &EntryFilter,
        page: &PageRequest,
    ) -> CoreResult<Vec<JournalEntry>> {
        self.storage.list_entries(filter, page).await
    }

    /// Resolve an account code to its id, requiring the account to exist
    pub async fn account_id_by_code(&self, code: &str) -> CoreResult<i64> {
        self.storage
            .account_by_code(code)
            .await?
            .map(|a| a.id)
            .ok_or_else(|| {
                CoreError::Validation(format!("mapped account '{code}' does not exist"))
            })
    }

    async fn validate_lines(&self, lines: Vec<JournalLine>) -> CoreResult<Vec<JournalLine>> {
        if lines.len() < 2 {
            return Err(CoreError::Validation(
                "journal entry must have at least two lines".to_string(),
            ));
        }

        let mut normalized = Vec::with_capacity(lines.len());
        for line in lines {
            // Round before the side check: a sub-unit amount rounds to
            // zero and must be rejected, not persisted as a 0/0 line.
            let line = JournalLine {
                debit: round_amount(&line.debit),
                credit: round_amount(&line.credit),
                ..line
            };
            if line.side().is_none() {
                return Err(CoreError::Validation(
                    "each line must have exactly one of debit or credit, and it must be \
                     positive after rounding to whole units"
                        .to_string(),
                ));
            }
            let account = self
                .storage
                .account(line.account_id)
                .await?
                .ok_or_else(|| CoreError::not_found("account", line.account_id))?;
            if !account.is_active {
                return Err(CoreError::Validation(format!(
                    "account '{}' is inactive",
                    account.code
                )));
            }
            normalized.push(line);
        }

        let (debits, credits) = totals(&normalized);
        if debits != credits {
            return Err(CoreError::Validation(format!(
                "unbalanced entry: debits {debits}, credits {credits}"
            )));
        }

        Ok(normalized)
    }
}

/// Sum the debit and credit columns of a set of lines
pub fn totals(lines: &[JournalLine]) -> (BigDecimal, BigDecimal) {
    let debits = lines.iter().map(|l| &l.debit).sum();
    let credits = lines.iter().map(|l| &l.credit).sum();
    (debits, credits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::memory_storage::MemoryStorage;
    use bigdecimal::BigDecimal;

    async fn engine_with_accounts() -> (JournalEngine<MemoryStorage>, i64, i64) {
        let storage = MemoryStorage::new();
        let mut chart = crate::journal::ChartManager::new(storage.clone());
        let cash = chart
            .create_account("1000".into(), "Cash".into(), AccountType::Asset, None)
            .await
            .unwrap();
        let savings = chart
            .create_account(
                "2300".into(),
                "Member Savings - Voluntary".into(),
                AccountType::Liability,
                None,
            )
            .await
            .unwrap();
        (JournalEngine::new(storage), cash.id, savings.id)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn balanced_entry_is_accepted_as_draft() {
        let (mut engine, cash, savings) = engine_with_accounts().await;
        let id = engine
            .create_entry(
                date(2024, 1, 5),
                "Member deposit".into(),
                None,
                vec![
                    JournalLine::debit(cash, BigDecimal::from(500_000), None),
                    JournalLine::credit(savings, BigDecimal::from(500_000), None),
                ],
                1,
            )
            .await
            .unwrap();

        let (entry, lines) = engine.entry_with_lines(id).await.unwrap();
        assert_eq!(entry.status, EntryStatus::Draft);
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|l| l.entry_id == id));
    }

    #[tokio::test]
    async fn unbalanced_entry_is_rejected() {
        let (mut engine, cash, savings) = engine_with_accounts().await;
        let result = engine
            .create_entry(
                date(2024, 1, 5),
                "Broken".into(),
                None,
                vec![
                    JournalLine::debit(cash, BigDecimal::from(500_000), None),
                    JournalLine::credit(savings, BigDecimal::from(400_000), None),
                ],
                1,
            )
            .await;
        assert!(matches!(result, Err(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn line_with_both_sides_is_rejected() {
        let (mut engine, cash, savings) = engine_with_accounts().await;
        let bad = JournalLine {
            entry_id: 0,
            account_id: cash,
            debit: BigDecimal::from(100),
            credit: BigDecimal::from(100),
            description: None,
        };
        let result = engine
            .create_entry(
                date(2024, 1, 5),
                "Broken".into(),
                None,
                vec![bad, JournalLine::credit(savings, BigDecimal::from(100), None)],
                1,
            )
            .await;
        assert!(matches!(result, Err(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn sub_unit_lines_that_round_to_zero_are_rejected() {
        let (mut engine, cash, savings) = engine_with_accounts().await;
        let result = engine
            .create_entry(
                date(2024, 1, 5),
                "Sub-unit amounts".into(),
                None,
                vec![
                    JournalLine::debit(cash, "0.4".parse().unwrap(), None),
                    JournalLine::credit(savings, "0.3".parse().unwrap(), None),
                ],
                1,
            )
            .await;
        assert!(matches!(result, Err(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn unknown_account_is_rejected() {
        let (mut engine, cash, _) = engine_with_accounts().await;
        let result = engine
            .create_entry(
                date(2024, 1, 5),
                "Bad account".into(),
                None,
                vec![
                    JournalLine::debit(cash, BigDecimal::from(100), None),
                    JournalLine::credit(999, BigDecimal::from(100), None),
                ],
                1,
            )
            .await;
        assert!(matches!(result, Err(CoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn posting_twice_fails_the_second_time() {
        let (mut engine, cash, savings) = engine_with_accounts().await;
        let id = engine
            .create_entry(
                date(2024, 1, 5),
                "Member deposit".into(),
                None,
                vec![
                    JournalLine::debit(cash, BigDecimal::from(500_000), None),
                    JournalLine::credit(savings, BigDecimal::from(500_000), None),
                ],
                1,
            )
            .await
            .unwrap();

        let posted = engine.post_entry(id, 2).await.unwrap();
        assert_eq!(posted.status, EntryStatus::Posted);
        assert_eq!(posted.posted_by, Some(2));
        assert!(posted.posted_at.is_some());

        let second = engine.post_entry(id, 2).await;
        assert!(matches!(second, Err(CoreError::InvalidState(_))));
    }

    #[tokio::test]
    async fn posting_unknown_entry_is_not_found() {
        let (mut engine, _, _) = engine_with_accounts().await;
        assert!(matches!(
            engine.post_entry(42, 1).await,
            Err(CoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn reversal_swaps_sides_and_stays_draft() {
        let (mut engine, cash, savings) = engine_with_accounts().await;
        let id = engine
            .create_entry(
                date(2024, 1, 5),
                "Member deposit".into(),
                None,
                vec![
                    JournalLine::debit(cash, BigDecimal::from(500_000), None),
                    JournalLine::credit(savings, BigDecimal::from(500_000), None),
                ],
                1,
            )
            .await
            .unwrap();
        engine.post_entry(id, 1).await.unwrap();

        let reversal_id = engine.reverse_entry(id, date(2024, 1, 6), 1).await.unwrap();
        let (reversal, lines) = engine.entry_with_lines(reversal_id).await.unwrap();
        assert_eq!(reversal.status, EntryStatus::Draft);
        assert_eq!(
            reversal.reference,
            Some(format!("reversal:{id}"))
        );
        assert_eq!(lines[0].credit, BigDecimal::from(500_000));
        assert_eq!(lines[1].debit, BigDecimal::from(500_000));
    }

    #[tokio::test]
    async fn draft_entries_cannot_be_reversed() {
        let (mut engine, cash, savings) = engine_with_accounts().await;
        let id = engine
            .create_entry(
                date(2024, 1, 5),
                "Member deposit".into(),
                None,
                vec![
                    JournalLine::debit(cash, BigDecimal::from(100), None),
                    JournalLine::credit(savings, BigDecimal::from(100), None),
                ],
                1,
            )
            .await
            .unwrap();
        assert!(matches!(
            engine.reverse_entry(id, date(2024, 1, 6), 1).await,
            Err(CoreError::InvalidState(_))
        ));
    }

    #[tokio::test]
    async fn listing_is_ordered_and_paginated() {
        let (mut engine, cash, savings) = engine_with_accounts().await;
        for day in 1..=5 {
            engine
                .create_entry(
                    date(2024, 1, day),
                    format!("Entry {day}"),
                    None,
                    vec![
                        JournalLine::debit(cash, BigDecimal::from(100), None),
                        JournalLine::credit(savings, BigDecimal::from(100), None),
                    ],
                    1,
                )
                .await
                .unwrap();
        }

        let page = engine
            .list_entries(
                &EntryFilter::default(),
                &PageRequest {
                    page: 1,
                    per_page: 2,
                },
            )
            .await
            .unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].entry_date, date(2024, 1, 5));
        assert_eq!(page[1].entry_date, date(2024, 1, 4));

        let filtered = engine
            .list_entries(
                &EntryFilter {
                    from: Some(date(2024, 1, 4)),
                    ..Default::default()
                },
                &PageRequest::default(),
            )
            .await
            .unwrap();
        assert_eq!(filtered.len(), 2);
    }
}
