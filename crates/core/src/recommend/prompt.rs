use crate::domain::transaction::Transaction;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

pub fn build(transactions: &[Transaction]) -> Prompt {
    Prompt {
        system: system_instruction(),
        user: user_message(transactions),
    }
}

pub fn system_instruction() -> String {
    [
        "You are a bank product recommendation system.",
        "Given a list of transactions, pick transactions (transaction_id) for which a bank product can be recommended.",
        "Only use transaction_id values from the list.",
        "Output a list of JSON objects with the format:",
        "[ {",
        "  \"transaction_id\": \"<the chosen transaction id>\",",
        "  \"category\": \"<the chosen transaction category>\",",
        "  \"description\": \"<the chosen transaction description>\",",
        "  \"type\": \"<the chosen transaction type>\",",
        "  \"reason\": \"<short reason why this product suits the transaction>\"",
        "} ]",
    ]
    .join("\n")
}

/// One line per transaction, in input order, between a header and the closing question.
pub fn user_message(transactions: &[Transaction]) -> String {
    let lines: Vec<String> = transactions.iter().map(transaction_line).collect();
    format!(
        "Transactions:\n{}\nWhich transactions do you pick?",
        lines.join("\n")
    )
}

fn transaction_line(tx: &Transaction) -> String {
    format!(
        "TransactionID: {}, Type: {}, Balance After Transaction: {}, Amount: {}, Category: {}, Desc: {}",
        tx.transaction_id,
        tx.transaction_type,
        tx.balance_after_transaction,
        tx.amount,
        tx.merchant_category,
        tx.description,
    )
}
