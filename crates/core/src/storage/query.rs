use crate::domain::transaction::Transaction;
use crate::time::DateWindow;

/// Repository filter: `transaction_date` within the window and, optionally, a fixed
/// `is_processed_for_recommendation` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionQuery {
    pub window: DateWindow,
    pub is_processed_for_recommendation: Option<bool>,
}

impl TransactionQuery {
    /// Everything in the window, whatever the processed flag says.
    pub fn inspection(window: DateWindow) -> Self {
        Self {
            window,
            is_processed_for_recommendation: None,
        }
    }

    /// Only transactions not yet considered for a recommendation.
    pub fn selection(window: DateWindow) -> Self {
        Self {
            window,
            is_processed_for_recommendation: Some(false),
        }
    }

    pub fn matches<Id>(&self, tx: &Transaction<Id>) -> bool {
        self.window.contains(tx.transaction_date)
            && self
                .is_processed_for_recommendation
                .map_or(true, |flag| tx.is_processed_for_recommendation == flag)
    }
}
