//! In-memory collaborators for pipeline tests.

use crate::domain::transaction::Transaction;
use crate::llm::error::CompletionDiagnosticsError;
use crate::llm::{CompletionProvider, CompletionRequest};
use crate::storage::{TransactionQuery, TransactionRepository};
use chrono::NaiveDateTime;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub fn transaction(id: u64, transaction_id: &str, at: &str, processed: bool) -> Transaction<u64> {
    Transaction {
        id,
        transaction_id: transaction_id.to_string(),
        transaction_type: "debit".to_string(),
        balance_after_transaction: 500.0,
        amount: 20.0,
        merchant_category: "travel".to_string(),
        description: "Flight".to_string(),
        transaction_date: NaiveDateTime::parse_from_str(at, "%m/%d/%Y %H:%M:%S").unwrap(),
        is_processed_for_recommendation: processed,
    }
}

/// Filters rows with [`TransactionQuery::matches`], keeping insertion order.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    rows: Mutex<Vec<Transaction<u64>>>,
    queries: Mutex<Vec<TransactionQuery>>,
    mark_calls: AtomicUsize,
}

impl InMemoryRepository {
    pub fn new(rows: Vec<Transaction<u64>>) -> Self {
        Self {
            rows: Mutex::new(rows),
            ..Default::default()
        }
    }

    pub fn queries(&self) -> Vec<TransactionQuery> {
        self.queries.lock().unwrap().clone()
    }

    pub fn mark_calls(&self) -> usize {
        self.mark_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl TransactionRepository for InMemoryRepository {
    type Id = u64;

    async fn find(&self, query: &TransactionQuery) -> anyhow::Result<Vec<Transaction<u64>>> {
        self.queries.lock().unwrap().push(*query);
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().filter(|tx| query.matches(tx)).cloned().collect())
    }

    async fn mark_processed(&self, transaction_ids: &[String]) -> anyhow::Result<u64> {
        self.mark_calls.fetch_add(1, Ordering::SeqCst);
        let mut rows = self.rows.lock().unwrap();
        let mut updated = 0;
        for tx in rows.iter_mut() {
            if !tx.is_processed_for_recommendation && transaction_ids.contains(&tx.transaction_id) {
                tx.is_processed_for_recommendation = true;
                updated += 1;
            }
        }
        Ok(updated)
    }
}

/// Repository whose every call fails with the given message.
#[derive(Debug)]
pub struct FailingRepository(pub &'static str);

#[async_trait::async_trait]
impl TransactionRepository for FailingRepository {
    type Id = String;

    async fn find(&self, _query: &TransactionQuery) -> anyhow::Result<Vec<Transaction>> {
        Err(anyhow::anyhow!(self.0))
    }

    async fn mark_processed(&self, _transaction_ids: &[String]) -> anyhow::Result<u64> {
        Err(anyhow::anyhow!(self.0))
    }
}

#[derive(Debug)]
enum StubFailure {
    Message(String),
    Diagnostics(CompletionDiagnosticsError),
}

/// Provider returning a canned reply (or error) and recording each request.
#[derive(Debug)]
pub struct StubProvider {
    reply: Result<String, StubFailure>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl StubProvider {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            reply: Err(StubFailure::Message(message.to_string())),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_with(err: CompletionDiagnosticsError) -> Self {
        Self {
            reply: Err(StubFailure::Diagnostics(err)),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl CompletionProvider for StubProvider {
    fn provider_name(&self) -> &'static str {
        "stub"
    }

    async fn complete(&self, request: &CompletionRequest) -> anyhow::Result<String> {
        self.requests.lock().unwrap().push(request.clone());
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(StubFailure::Message(message)) => Err(anyhow::anyhow!(message.clone())),
            Err(StubFailure::Diagnostics(err)) => Err(err.clone().into()),
        }
    }
}
