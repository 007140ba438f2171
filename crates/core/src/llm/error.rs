use std::fmt;

// Provider error bodies can be whole HTML pages; keep the rendered message readable.
const MAX_RAW_OUTPUT_CHARS: usize = 500;

#[derive(Debug, Clone)]
pub struct CompletionDiagnosticsError {
    pub provider: &'static str,
    pub stage: &'static str,
    pub detail: String,
    pub raw_output: Option<String>,
}

impl fmt::Display for CompletionDiagnosticsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "completion error (provider={}, stage={}): {}",
            self.provider, self.stage, self.detail
        )?;

        let Some(raw) = self.raw_output.as_deref().map(str::trim) else {
            return Ok(());
        };
        if raw.is_empty() {
            return Ok(());
        }

        let mut chars = raw.chars();
        let head: String = chars.by_ref().take(MAX_RAW_OUTPUT_CHARS).collect();
        if chars.next().is_some() {
            write!(f, "; body={head}...")
        } else {
            write!(f, "; body={head}")
        }
    }
}

impl std::error::Error for CompletionDiagnosticsError {}
