use crate::domain::recommendation::RecommendationEntry;
use crate::domain::transaction::Transaction;
use anyhow::{bail, ensure};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};

/// Reply shapes accepted from the model: the requested array, or a single bare entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LlmRecommendationReply {
    Many(Vec<LlmRecommendationEntry>),
    One(LlmRecommendationEntry),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmRecommendationEntry {
    #[serde(deserialize_with = "string_or_number")]
    pub transaction_id: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "type")]
    pub transaction_type: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

impl LlmRecommendationReply {
    pub fn into_entries(self) -> Vec<LlmRecommendationEntry> {
        match self {
            Self::Many(entries) => entries,
            Self::One(entry) => vec![entry],
        }
    }

    /// Checks the reply against the transactions that were sent to the model.
    ///
    /// Entries naming an id that was never sent are dropped, as are repeats of an id
    /// already accepted. Structural problems (blank id, blank reason) reject the whole reply.
    pub fn validate_against(
        self,
        request: &[Transaction],
    ) -> anyhow::Result<Vec<RecommendationEntry>> {
        let by_id: HashMap<&str, &Transaction> = request
            .iter()
            .map(|tx| (tx.transaction_id.as_str(), tx))
            .collect();

        let mut seen = BTreeSet::<String>::new();
        let mut out = Vec::new();
        for entry in self.into_entries() {
            let transaction_id = entry.transaction_id.trim().to_string();
            ensure!(!transaction_id.is_empty(), "transaction_id must be non-empty");

            let Some(source) = by_id.get(transaction_id.as_str()) else {
                tracing::warn!(
                    %transaction_id,
                    "LLM picked a transaction_id that was not offered; dropping"
                );
                continue;
            };

            if !seen.insert(transaction_id.clone()) {
                tracing::debug!(%transaction_id, "duplicate pick in LLM output; keeping first");
                continue;
            }

            out.push(entry.validate_and_into_entry(transaction_id, source)?);
        }

        Ok(out)
    }
}

impl LlmRecommendationEntry {
    fn validate_and_into_entry(
        self,
        transaction_id: String,
        source: &Transaction,
    ) -> anyhow::Result<RecommendationEntry> {
        let Some(reason) = non_blank(self.reason) else {
            bail!("reason must be non-empty (transaction_id={transaction_id})");
        };

        Ok(RecommendationEntry {
            category: non_blank(self.category)
                .unwrap_or_else(|| source.merchant_category.clone()),
            description: non_blank(self.description)
                .unwrap_or_else(|| source.description.clone()),
            transaction_type: non_blank(self.transaction_type)
                .unwrap_or_else(|| source.transaction_type.clone()),
            reason,
            transaction_id,
        })
    }
}

fn non_blank(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "transaction_id must be a string or number, got {other}"
        ))),
    }
}
