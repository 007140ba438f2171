use crate::domain::transaction::Transaction;
use crate::storage::query::TransactionQuery;
use anyhow::Context;
use chrono::NaiveDateTime;
use std::fmt;
use uuid::Uuid;

#[async_trait::async_trait]
pub trait TransactionRepository: Send + Sync {
    /// Native row identifier; stringified by the fetch stage.
    type Id: fmt::Display + Send + 'static;

    /// Runs the query. Rows come back in the store's retrieval order.
    async fn find(&self, query: &TransactionQuery) -> anyhow::Result<Vec<Transaction<Self::Id>>>;

    /// Sets `is_processed_for_recommendation = true` for the given `transaction_id`s and
    /// returns how many rows changed.
    async fn mark_processed(&self, transaction_ids: &[String]) -> anyhow::Result<u64>;
}

type TransactionRow = (
    Uuid,
    String,
    String,
    f64,
    f64,
    String,
    String,
    NaiveDateTime,
    bool,
);

#[derive(Debug, Clone)]
pub struct PgTransactionRepository {
    pool: sqlx::PgPool,
}

impl PgTransactionRepository {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl TransactionRepository for PgTransactionRepository {
    type Id = Uuid;

    async fn find(&self, query: &TransactionQuery) -> anyhow::Result<Vec<Transaction<Uuid>>> {
        let t0 = std::time::Instant::now();
        let mut qb = sqlx::QueryBuilder::<sqlx::Postgres>::new(
            "SELECT id, transaction_id, transaction_type, balance_after_transaction, amount, \
             merchant_category, description, transaction_date, is_processed_for_recommendation \
             FROM transactions WHERE transaction_date >= ",
        );
        qb.push_bind(query.window.start);
        qb.push(" AND transaction_date <= ");
        qb.push_bind(query.window.end);
        if let Some(flag) = query.is_processed_for_recommendation {
            qb.push(" AND is_processed_for_recommendation = ");
            qb.push_bind(flag);
        }

        // Errors surface as-is; callers see the driver error without extra context.
        let rows: Vec<TransactionRow> = qb
            .build_query_as()
            .persistent(false)
            .fetch_all(&self.pool)
            .await?;

        tracing::debug!(
            date = %query.window.date,
            processed_filter = ?query.is_processed_for_recommendation,
            rows = rows.len(),
            elapsed_ms = t0.elapsed().as_millis(),
            "transactions query"
        );

        Ok(rows.into_iter().map(row_to_transaction).collect())
    }

    async fn mark_processed(&self, transaction_ids: &[String]) -> anyhow::Result<u64> {
        let ids: Vec<String> = transaction_ids.to_vec();
        let res = sqlx::query(
            "UPDATE transactions SET is_processed_for_recommendation = TRUE \
             WHERE transaction_id = ANY($1) AND is_processed_for_recommendation = FALSE",
        )
        .persistent(false)
        .bind(ids)
        .execute(&self.pool)
        .await
        .context("update transactions.is_processed_for_recommendation failed")?;

        Ok(res.rows_affected())
    }
}

fn row_to_transaction(row: TransactionRow) -> Transaction<Uuid> {
    let (
        id,
        transaction_id,
        transaction_type,
        balance_after_transaction,
        amount,
        merchant_category,
        description,
        transaction_date,
        is_processed_for_recommendation,
    ) = row;

    Transaction {
        id,
        transaction_id,
        transaction_type,
        balance_after_transaction,
        amount,
        merchant_category,
        description,
        transaction_date,
        is_processed_for_recommendation,
    }
}
