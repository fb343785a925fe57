use tracing::error;

/// Why a single record was dropped from a stage.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SkipReason {
    #[error("record does not match the source schema: {0}")]
    Schema(String),
    #[error("field `{field}` has unusable value {value}")]
    Invalid { field: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skipped {
    /// External id when the record got far enough to expose one.
    pub external_id: Option<String>,
    pub reason: SkipReason,
}

impl Skipped {
    pub fn new(external_id: Option<String>, reason: SkipReason) -> Self {
        Self {
            external_id,
            reason,
        }
    }
}

/// Per-stage result: the records that made it through and the ones that did not.
#[derive(Debug, Clone, PartialEq)]
pub struct StageOutcome<T> {
    pub kept: Vec<T>,
    pub skipped: Vec<Skipped>,
}

impl<T> Default for StageOutcome<T> {
    fn default() -> Self {
        Self {
            kept: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

impl<T> FromIterator<Result<T, Skipped>> for StageOutcome<T> {
    fn from_iter<I: IntoIterator<Item = Result<T, Skipped>>>(iter: I) -> Self {
        let mut out = Self::default();
        for result in iter {
            match result {
                Ok(item) => out.kept.push(item),
                Err(skip) => out.skipped.push(skip),
            }
        }
        out
    }
}

impl<T> StageOutcome<T> {
    pub fn log_skipped(&self, stage: &str) {
        for skip in &self.skipped {
            error!(
                stage,
                external_id = skip.external_id.as_deref().unwrap_or("unknown"),
                reason = %skip.reason,
                "record skipped"
            );
        }
    }
}
