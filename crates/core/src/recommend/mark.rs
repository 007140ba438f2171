use crate::domain::recommendation::RecommendationResult;
use crate::domain::transaction::Transaction;
use crate::storage::TransactionRepository;
use std::fmt;
use std::str::FromStr;

/// Which transactions to flag as processed after a run. The pipeline never flags anything
/// on its own; callers opt in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MarkPolicy {
    #[default]
    None,
    /// Only transactions the model picked.
    Recommended,
    /// Every transaction offered to the model.
    All,
}

impl MarkPolicy {
    /// Ids to flag for this run. Failed runs flag nothing so the transactions stay eligible.
    pub fn ids_to_mark(self, fetched: &[Transaction], result: &RecommendationResult) -> Vec<String> {
        let RecommendationResult::Success(entries) = result else {
            return Vec::new();
        };

        match self {
            Self::None => Vec::new(),
            Self::Recommended => entries.iter().map(|e| e.transaction_id.clone()).collect(),
            Self::All => fetched.iter().map(|tx| tx.transaction_id.clone()).collect(),
        }
    }
}

impl FromStr for MarkPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "recommended" => Ok(Self::Recommended),
            "all" => Ok(Self::All),
            other => Err(format!(
                "unknown mark policy {other:?} (expected none, recommended or all)"
            )),
        }
    }
}

impl fmt::Display for MarkPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::None => "none",
            Self::Recommended => "recommended",
            Self::All => "all",
        };
        f.write_str(s)
    }
}

/// Flags the given transactions as processed for recommendation.
pub async fn mark_processed_for_recommendation<R: TransactionRepository>(
    repo: &R,
    transaction_ids: &[String],
) -> anyhow::Result<u64> {
    if transaction_ids.is_empty() {
        return Ok(0);
    }

    let updated = repo.mark_processed(transaction_ids).await?;
    tracing::info!(
        requested = transaction_ids.len(),
        updated,
        "marked transactions processed for recommendation"
    );
    Ok(updated)
}
