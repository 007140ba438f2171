pub mod query;
pub mod transactions;

use anyhow::Context;

pub use query::TransactionQuery;
pub use transactions::{PgTransactionRepository, TransactionRepository};

pub async fn migrate(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("sqlx migrations failed")?;
    Ok(())
}
