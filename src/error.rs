//! Error taxonomy for the ingest pipeline.
//!
//! Most call paths propagate `anyhow::Error`; the variants here are the
//! ones the CLI and API must tell apart (distinct exit codes, distinct
//! HTTP statuses).

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    /// One or more source documents violated the schema. The run aborts
    /// before any persistence; the orchestrator prints every file's
    /// violations before surfacing this.
    #[error("validation failed for {file_count} file(s)")]
    Validation { file_count: usize },

    /// The source directory yielded zero documents. An empty corpus is
    /// fatal, not a no-op.
    #[error("no class JSON found in {dir}")]
    EmptyCorpus { dir: PathBuf },

    /// Two distinct features in one batch derived the same composite
    /// key. A data-authoring collision, not a transient condition.
    #[error("duplicate feature key ({class_srd_id}, level {level}, {slug})")]
    DuplicateKey {
        class_srd_id: String,
        level: i64,
        slug: String,
    },
}

impl IngestError {
    /// Process exit code for the ingest CLI: validation failures get a
    /// distinct code so callers can tell them from other fatal errors.
    pub fn exit_code(&self) -> i32 {
        match self {
            IngestError::Validation { .. } => 2,
            _ => 1,
        }
    }
}
