//! Consignment workflow engine: receiving goods, selling against
//! consigned stock, and settling with suppliers

use std::collections::HashSet;

use bigdecimal::BigDecimal;
use chrono::NaiveDate;

use super::{
    ConsignmentReceipt, ConsignmentSale, ConsignmentSettlement, ConsignmentSupplier, ReceiptLine,
};
use crate::traits::ConsignmentStore;
use crate::types::{CoreError, CoreResult};
use crate::utils::validation::{validate_name, validate_positive_amount, validate_positive_quantity};

/// Engine driving the consignment workflow against a [`ConsignmentStore`]
pub struct ConsignmentEngine<S: ConsignmentStore> {
    storage: S,
}

impl<S: ConsignmentStore> ConsignmentEngine<S> {
    /// Create a new consignment engine
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Register a supplier
    pub async fn create_supplier(
        &mut self,
        name: String,
        phone: Option<String>,
    ) -> CoreResult<ConsignmentSupplier> {
        validate_name("supplier name", &name)?;
        let mut supplier = ConsignmentSupplier::new(name, phone);
        supplier.id = self.storage.insert_supplier(&supplier).await?;
        Ok(supplier)
    }

    /// Get a supplier by id
    pub async fn supplier(&self, id: i64) -> CoreResult<Option<ConsignmentSupplier>> {
        self.storage.supplier(id).await
    }

    /// Deactivate a supplier; existing unsettled sales remain settleable
    pub async fn deactivate_supplier(&mut self, id: i64) -> CoreResult<ConsignmentSupplier> {
        let mut supplier = self.supplier_required(id).await?;
        supplier.is_active = false;
        self.storage.update_supplier(&supplier).await?;
        Ok(supplier)
    }

    /// Receive consigned goods: records the receipt and increments
    /// warehouse stock per line in one atomic step
    pub async fn create_receipt(
        &mut self,
        supplier_id: i64,
        warehouse_id: i64,
        receipt_date: NaiveDate,
        lines: Vec<ReceiptLine>,
        notes: Option<String>,
    ) -> CoreResult<ConsignmentReceipt> {
        let supplier = self.supplier_required(supplier_id).await?;
        if !supplier.is_active {
            return Err(CoreError::Validation(format!(
                "supplier {supplier_id} is inactive"
            )));
        }
        if lines.is_empty() {
            return Err(CoreError::Validation(
                "a receipt needs at least one line".to_string(),
            ));
        }
        for line in &lines {
            validate_positive_quantity("received quantity", line.quantity)?;
            validate_positive_amount("unit price", &line.unit_price)?;
        }
        let mut receipt = ConsignmentReceipt {
            id: 0,
            supplier_id,
            warehouse_id,
            receipt_date,
            notes,
        };
        receipt.id = self.storage.insert_receipt(&receipt, &lines).await?;
        tracing::debug!(
            receipt_id = receipt.id,
            supplier_id,
            warehouse_id,
            lines = lines.len(),
            "consignment receipt recorded"
        );
        Ok(receipt)
    }

    /// Record a sale of consigned goods. Available stock is checked and
    /// decremented in the same atomic step; overselling fails with
    /// `Validation` and leaves stock untouched.
    pub async fn add_manual_sale(
        &mut self,
        supplier_id: i64,
        product_id: i64,
        warehouse_id: i64,
        sale_date: NaiveDate,
        quantity: i64,
        unit_price: BigDecimal,
    ) -> CoreResult<ConsignmentSale> {
        let supplier = self.supplier_required(supplier_id).await?;
        if !supplier.is_active {
            return Err(CoreError::Validation(format!(
                "supplier {supplier_id} is inactive"
            )));
        }
        validate_positive_quantity("sold quantity", quantity)?;
        validate_positive_amount("unit price", &unit_price)?;
        let mut sale = ConsignmentSale {
            id: 0,
            supplier_id,
            product_id,
            warehouse_id,
            sale_date,
            quantity,
            unit_price,
            settlement_id: None,
        };
        sale.id = self.storage.insert_sale(&sale).await?;
        Ok(sale)
    }

    /// Sales for a supplier not yet claimed by any settlement,
    /// sale_date ascending
    pub async fn list_unsettled_sales(&self, supplier_id: i64) -> CoreResult<Vec<ConsignmentSale>> {
        self.storage.unsettled_sales(supplier_id).await
    }

    /// Settle a batch of sales with a supplier.
    ///
    /// Every listed sale must exist, belong to the supplier, and still be
    /// unclaimed. The settlement total is the sum of the claimed sales'
    /// line totals. Claiming is atomic: two settlements racing over an
    /// overlapping sale set cannot both succeed.
    pub async fn create_settlement(
        &mut self,
        supplier_id: i64,
        settlement_date: NaiveDate,
        sale_ids: &[i64],
        notes: Option<String>,
    ) -> CoreResult<ConsignmentSettlement> {
        self.supplier_required(supplier_id).await?;
        if sale_ids.is_empty() {
            return Err(CoreError::Validation(
                "a settlement needs at least one sale".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        if !sale_ids.iter().all(|id| seen.insert(*id)) {
            return Err(CoreError::Validation(
                "duplicate sale ids in settlement".to_string(),
            ));
        }

        let mut total_amount = BigDecimal::from(0);
        for &sale_id in sale_ids {
            let sale = self
                .storage
                .sale(sale_id)
                .await?
                .ok_or_else(|| CoreError::not_found("consignment sale", sale_id))?;
            if sale.supplier_id != supplier_id {
                return Err(CoreError::Validation(format!(
                    "sale {sale_id} does not belong to supplier {supplier_id}"
                )));
            }
            if sale.settlement_id.is_some() {
                return Err(CoreError::Validation(format!(
                    "sale {sale_id} is already settled"
                )));
            }
            total_amount += sale.line_total();
        }

        let mut settlement = ConsignmentSettlement {
            id: 0,
            supplier_id,
            settlement_date,
            total_amount,
            notes,
        };
        settlement.id = self.storage.claim_sales(&settlement, sale_ids).await?;
        tracing::info!(
            settlement_id = settlement.id,
            supplier_id,
            sales = sale_ids.len(),
            total = %settlement.total_amount,
            "consignment settlement created"
        );
        Ok(settlement)
    }

    /// Get a settlement by id
    pub async fn settlement(&self, id: i64) -> CoreResult<Option<ConsignmentSettlement>> {
        self.storage.settlement(id).await
    }

    /// Current consigned stock for (warehouse, product)
    pub async fn stock(&self, warehouse_id: i64, product_id: i64) -> CoreResult<i64> {
        self.storage.stock(warehouse_id, product_id).await
    }

    async fn supplier_required(&self, id: i64) -> CoreResult<ConsignmentSupplier> {
        self.storage
            .supplier(id)
            .await?
            .ok_or_else(|| CoreError::not_found("supplier", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::memory_storage::MemoryStorage;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn line(product_id: i64, quantity: i64, unit_price: i64) -> ReceiptLine {
        ReceiptLine {
            receipt_id: 0,
            product_id,
            quantity,
            unit_price: BigDecimal::from(unit_price),
        }
    }

    async fn supplier_with_stock(
        engine: &mut ConsignmentEngine<MemoryStorage>,
    ) -> ConsignmentSupplier {
        let supplier = engine
            .create_supplier("Warung Bu Sari".to_string(), None)
            .await
            .unwrap();
        engine
            .create_receipt(
                supplier.id,
                1,
                date(2024, 3, 1),
                vec![line(10, 20, 25_000), line(11, 3, 50_000)],
                None,
            )
            .await
            .unwrap();
        supplier
    }

    #[tokio::test]
    async fn receipt_increments_stock() {
        let mut engine = ConsignmentEngine::new(MemoryStorage::new());
        let supplier = supplier_with_stock(&mut engine).await;
        assert_eq!(engine.stock(1, 10).await.unwrap(), 20);
        assert_eq!(engine.stock(1, 11).await.unwrap(), 3);
        // Another receipt accumulates.
        engine
            .create_receipt(
                supplier.id,
                1,
                date(2024, 3, 5),
                vec![line(10, 5, 25_000)],
                None,
            )
            .await
            .unwrap();
        assert_eq!(engine.stock(1, 10).await.unwrap(), 25);
    }

    #[tokio::test]
    async fn receipt_rejects_bad_lines() {
        let mut engine = ConsignmentEngine::new(MemoryStorage::new());
        let supplier = engine
            .create_supplier("Supplier".to_string(), None)
            .await
            .unwrap();
        let result = engine
            .create_receipt(
                supplier.id,
                1,
                date(2024, 3, 1),
                vec![line(10, 0, 25_000)],
                None,
            )
            .await;
        assert!(matches!(result, Err(CoreError::Validation(_))));
        assert_eq!(engine.stock(1, 10).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn inactive_supplier_cannot_receive_goods() {
        let mut engine = ConsignmentEngine::new(MemoryStorage::new());
        let supplier = engine
            .create_supplier("Supplier".to_string(), None)
            .await
            .unwrap();
        engine.deactivate_supplier(supplier.id).await.unwrap();
        let result = engine
            .create_receipt(
                supplier.id,
                1,
                date(2024, 3, 1),
                vec![line(10, 5, 25_000)],
                None,
            )
            .await;
        assert!(matches!(result, Err(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn sale_decrements_stock() {
        let mut engine = ConsignmentEngine::new(MemoryStorage::new());
        let supplier = supplier_with_stock(&mut engine).await;
        engine
            .add_manual_sale(supplier.id, 10, 1, date(2024, 3, 10), 4, BigDecimal::from(25_000))
            .await
            .unwrap();
        assert_eq!(engine.stock(1, 10).await.unwrap(), 16);
    }

    #[tokio::test]
    async fn oversold_stock_is_rejected_and_unchanged() {
        let mut engine = ConsignmentEngine::new(MemoryStorage::new());
        let supplier = supplier_with_stock(&mut engine).await;
        // Product 11 only has 3 units on hand.
        let result = engine
            .add_manual_sale(supplier.id, 11, 1, date(2024, 3, 10), 5, BigDecimal::from(50_000))
            .await;
        assert!(matches!(result, Err(CoreError::Validation(_))));
        assert_eq!(engine.stock(1, 11).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn settlement_totals_and_claims_sales() {
        let mut engine = ConsignmentEngine::new(MemoryStorage::new());
        let supplier = supplier_with_stock(&mut engine).await;
        let first = engine
            .add_manual_sale(supplier.id, 10, 1, date(2024, 3, 10), 4, BigDecimal::from(25_000))
            .await
            .unwrap();
        let second = engine
            .add_manual_sale(supplier.id, 10, 1, date(2024, 3, 12), 10, BigDecimal::from(25_000))
            .await
            .unwrap();

        let settlement = engine
            .create_settlement(supplier.id, date(2024, 3, 31), &[first.id, second.id], None)
            .await
            .unwrap();
        // 4 x 25,000 + 10 x 25,000
        assert_eq!(settlement.total_amount, BigDecimal::from(350_000));

        assert!(engine
            .list_unsettled_sales(supplier.id)
            .await
            .unwrap()
            .is_empty());
        let claimed = engine.storage.sale(first.id).await.unwrap().unwrap();
        assert_eq!(claimed.settlement_id, Some(settlement.id));
    }

    #[tokio::test]
    async fn settled_sale_cannot_be_settled_again() {
        let mut engine = ConsignmentEngine::new(MemoryStorage::new());
        let supplier = supplier_with_stock(&mut engine).await;
        let sale = engine
            .add_manual_sale(supplier.id, 10, 1, date(2024, 3, 10), 2, BigDecimal::from(25_000))
            .await
            .unwrap();
        engine
            .create_settlement(supplier.id, date(2024, 3, 31), &[sale.id], None)
            .await
            .unwrap();
        let result = engine
            .create_settlement(supplier.id, date(2024, 4, 30), &[sale.id], None)
            .await;
        assert!(matches!(result, Err(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn settlement_rejects_foreign_and_duplicate_sales() {
        let mut engine = ConsignmentEngine::new(MemoryStorage::new());
        let supplier = supplier_with_stock(&mut engine).await;
        let other = engine
            .create_supplier("Other".to_string(), None)
            .await
            .unwrap();
        let sale = engine
            .add_manual_sale(supplier.id, 10, 1, date(2024, 3, 10), 2, BigDecimal::from(25_000))
            .await
            .unwrap();

        let foreign = engine
            .create_settlement(other.id, date(2024, 3, 31), &[sale.id], None)
            .await;
        assert!(matches!(foreign, Err(CoreError::Validation(_))));

        let duplicated = engine
            .create_settlement(supplier.id, date(2024, 3, 31), &[sale.id, sale.id], None)
            .await;
        assert!(matches!(duplicated, Err(CoreError::Validation(_))));

        let missing = engine
            .create_settlement(supplier.id, date(2024, 3, 31), &[999], None)
            .await;
        assert!(matches!(missing, Err(CoreError::NotFound { .. })));
    }
}
