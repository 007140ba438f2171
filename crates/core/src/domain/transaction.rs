use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A transaction as read from the store.
///
/// `Id` is the store's native row identifier. Everything past the fetch stage works with
/// `Transaction<String>` (see [`Transaction::stringify_id`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction<Id = String> {
    pub id: Id,
    pub transaction_id: String,
    pub transaction_type: String,
    pub balance_after_transaction: f64,
    pub amount: f64,
    pub merchant_category: String,
    pub description: String,
    pub transaction_date: NaiveDateTime,
    pub is_processed_for_recommendation: bool,
}

impl<Id: fmt::Display> Transaction<Id> {
    pub fn stringify_id(self) -> Transaction {
        Transaction {
            id: self.id.to_string(),
            transaction_id: self.transaction_id,
            transaction_type: self.transaction_type,
            balance_after_transaction: self.balance_after_transaction,
            amount: self.amount,
            merchant_category: self.merchant_category,
            description: self.description,
            transaction_date: self.transaction_date,
            is_processed_for_recommendation: self.is_processed_for_recommendation,
        }
    }
}
