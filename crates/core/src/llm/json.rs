use crate::domain::contract::LlmRecommendationReply;
use crate::domain::recommendation::RecommendationEntry;
use crate::domain::transaction::Transaction;
use anyhow::Context;
use serde_json::Value;

const FENCE: &str = "```";

/// Strips a Markdown code fence (```json ... ``` or ``` ... ```) wrapping the reply.
///
/// Only the first line (opening fence plus optional language tag) and a closing fence on
/// the last line are removed; interior lines are returned as-is. Repeats until the text no
/// longer opens with a fence, which makes the function idempotent.
pub fn clean_completion_text(text: &str) -> String {
    let mut out = text.trim().to_string();
    while out.starts_with(FENCE) {
        out = strip_fence_lines(&out);
    }
    out
}

fn strip_fence_lines(text: &str) -> String {
    let mut lines: Vec<&str> = text.lines().skip(1).collect();
    if lines
        .last()
        .is_some_and(|line| line.trim_start().starts_with(FENCE))
    {
        lines.pop();
    }
    lines.join("\n").trim().to_string()
}

/// Decodes cleaned reply text into recommendation entries, checked against the request.
pub fn parse_entries(
    cleaned: &str,
    request: &[Transaction],
) -> anyhow::Result<Vec<RecommendationEntry>> {
    let value = serde_json::from_str::<Value>(cleaned).context("LLM output is not valid JSON")?;
    let reply = serde_json::from_value::<LlmRecommendationReply>(value)
        .context("LLM output does not match the recommendation entry schema")?;
    reply.validate_against(request)
}
