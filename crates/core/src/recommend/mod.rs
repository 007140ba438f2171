pub mod mark;
pub mod prompt;

#[cfg(test)]
pub(crate) mod testing;

use crate::domain::recommendation::RecommendationResult;
use crate::domain::transaction::Transaction;
use crate::llm::json::{clean_completion_text, parse_entries};
use crate::llm::{CompletionOptions, CompletionProvider, CompletionRequest};
use crate::storage::{TransactionQuery, TransactionRepository};
use crate::time::DateWindow;

pub use mark::{mark_processed_for_recommendation, MarkPolicy};

/// Transactions on `date` (`MM/DD/YYYY`) not yet processed for recommendation.
///
/// A malformed date fails with [`crate::time::DateFormatError`]; repository errors are
/// returned untouched.
pub async fn fetch_transactions_by_date<R: TransactionRepository>(
    repo: &R,
    date: &str,
) -> anyhow::Result<Vec<Transaction>> {
    let window = DateWindow::parse(date)?;
    fetch(repo, &TransactionQuery::selection(window)).await
}

/// Every transaction on `date`, processed or not. Read-only inspection.
pub async fn fetch_all_transactions_by_date<R: TransactionRepository>(
    repo: &R,
    date: &str,
) -> anyhow::Result<Vec<Transaction>> {
    let window = DateWindow::parse(date)?;
    fetch(repo, &TransactionQuery::inspection(window)).await
}

async fn fetch<R: TransactionRepository>(
    repo: &R,
    query: &TransactionQuery,
) -> anyhow::Result<Vec<Transaction>> {
    let rows = repo.find(query).await?;
    Ok(rows.into_iter().map(Transaction::stringify_id).collect())
}

/// Fetches the day's unprocessed transactions and asks the model which ones deserve a
/// product recommendation.
///
/// Only a bad date or a repository failure is returned as `Err`. Provider and decode
/// failures come back as the matching [`RecommendationResult`] variant.
pub async fn get_recommended_transaction_by_date<R, P>(
    repo: &R,
    provider: &P,
    options: &CompletionOptions,
    date: &str,
) -> anyhow::Result<RecommendationResult>
where
    R: TransactionRepository,
    P: CompletionProvider + ?Sized,
{
    let transactions = fetch_transactions_by_date(repo, date).await?;
    Ok(recommend_transactions(provider, options, date, &transactions).await)
}

/// Runs the prompt, invoke, clean and decode stages over already fetched transactions.
pub async fn recommend_transactions<P: CompletionProvider + ?Sized>(
    provider: &P,
    options: &CompletionOptions,
    date: &str,
    transactions: &[Transaction],
) -> RecommendationResult {
    if transactions.is_empty() {
        tracing::info!(%date, "no unprocessed transactions; skipping LLM call");
        return RecommendationResult::no_data(date);
    }

    let prompt = prompt::build(transactions);
    tracing::debug!(
        %date,
        transactions = transactions.len(),
        user_prompt_len = prompt.user.len(),
        "recommendation prompt built"
    );

    let request = CompletionRequest::system_then_user(options, prompt.system, prompt.user);
    let raw = match provider.complete(&request).await {
        Ok(text) => text,
        Err(err) => {
            tracing::error!(
                %date,
                provider = provider.provider_name(),
                model = %options.model,
                error = %err,
                "completion call failed"
            );
            return RecommendationResult::InvocationError {
                detail: format!("{err:#}"),
            };
        }
    };

    let cleaned = clean_completion_text(&raw);
    match parse_entries(&cleaned, transactions) {
        Ok(entries) => {
            tracing::info!(
                %date,
                offered = transactions.len(),
                picked = entries.len(),
                "recommendations decoded"
            );
            RecommendationResult::Success(entries)
        }
        Err(err) => {
            tracing::warn!(%date, error = %format!("{err:#}"), "failed to decode LLM reply");
            RecommendationResult::DecodeError {
                detail: format!("{err:#}"),
                raw_response: cleaned,
            }
        }
    }
}
