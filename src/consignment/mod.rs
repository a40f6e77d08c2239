//! Consignment module: goods held on behalf of suppliers, their receipts,
//! sales against consigned stock, and periodic settlement batches

pub mod engine;

pub use engine::*;

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A supplier whose goods the cooperative sells on consignment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsignmentSupplier {
    /// Storage-assigned identifier (0 until persisted)
    pub id: i64,
    /// Supplier name
    pub name: String,
    /// Contact phone number
    pub phone: Option<String>,
    /// Inactive suppliers cannot receive goods or record sales
    pub is_active: bool,
}

impl ConsignmentSupplier {
    /// Create a new, not-yet-persisted supplier
    pub fn new(name: String, phone: Option<String>) -> Self {
        Self {
            id: 0,
            name,
            phone,
            is_active: true,
        }
    }
}

/// Header of a consignment goods receipt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsignmentReceipt {
    /// Storage-assigned identifier (0 until persisted)
    pub id: i64,
    /// Supplier delivering the goods
    pub supplier_id: i64,
    /// Warehouse receiving the goods
    pub warehouse_id: i64,
    /// Date of receipt
    pub receipt_date: NaiveDate,
    /// Free-form notes
    pub notes: Option<String>,
}

/// One line item of a consignment receipt; increments warehouse stock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptLine {
    /// Owning receipt (0 until persisted)
    pub receipt_id: i64,
    /// Product received
    pub product_id: i64,
    /// Units received, > 0
    pub quantity: i64,
    /// Agreed unit price owed to the supplier when sold
    pub unit_price: BigDecimal,
}

/// A sale of consigned goods, unsettled until claimed by a settlement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsignmentSale {
    /// Storage-assigned identifier (0 until persisted)
    pub id: i64,
    /// Supplier who owns the goods
    pub supplier_id: i64,
    /// Product sold
    pub product_id: i64,
    /// Warehouse the stock was taken from
    pub warehouse_id: i64,
    /// Date of sale
    pub sale_date: NaiveDate,
    /// Units sold, > 0
    pub quantity: i64,
    /// Unit price owed to the supplier
    pub unit_price: BigDecimal,
    /// Set once the sale has been claimed by a settlement; a sale
    /// belongs to at most one settlement
    pub settlement_id: Option<i64>,
}

impl ConsignmentSale {
    /// Amount owed to the supplier for this sale
    pub fn line_total(&self) -> BigDecimal {
        &self.unit_price * BigDecimal::from(self.quantity)
    }
}

/// A settlement batch: a set of sales for one supplier reconciled into
/// one payable total. References its sales, does not own them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsignmentSettlement {
    /// Storage-assigned identifier (0 until persisted)
    pub id: i64,
    /// Supplier being settled
    pub supplier_id: i64,
    /// Date of the settlement
    pub settlement_date: NaiveDate,
    /// Sum of the claimed sales' line totals
    pub total_amount: BigDecimal,
    /// Free-form notes
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sale_line_total() {
        let sale = ConsignmentSale {
            id: 1,
            supplier_id: 1,
            product_id: 7,
            warehouse_id: 1,
            sale_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            quantity: 4,
            unit_price: BigDecimal::from(25_000),
            settlement_id: None,
        };
        assert_eq!(sale.line_total(), BigDecimal::from(100_000));
    }
}
