//! Ingest orchestration.
//!
//! Sequences the full pipeline: load → validate → reconcile → upsert →
//! cache → report. Strictly sequential, fail-fast: any schema violation
//! anywhere in the batch aborts the run before the store is touched,
//! and all violations are reported together.

use anyhow::{Context, Result};

use crate::cache;
use crate::config::Config;
use crate::error::IngestError;
use crate::loader::{self, SourceFile};
use crate::models::ClassDocument;
use crate::reconcile;
use crate::schema::SchemaValidator;
use crate::store;
use crate::upsert;

pub async fn run_ingest(config: &Config, dry_run: bool) -> Result<()> {
    println!("SRD 5.1 ingest started.");

    let files = loader::load_class_files(&config.paths.data_dir)?;
    println!("Found {} class files.", files.len());

    let docs = validate_all(config, &files)?;
    println!("Validated {} class files.", docs.len());

    if dry_run {
        let feature_total: i64 = docs.iter().map(|d| d.feature_count()).sum();
        println!("\ningest (dry-run)");
        println!("  class records: {}", docs.len());
        println!("  feature records: {}", feature_total);
        return Ok(());
    }

    let pool = store::connect(&config.ingest_store_url()).await?;
    store::ensure_collections(&pool).await?;

    reconcile::reconcile_indexes(&pool).await?;
    let purged = reconcile::purge_legacy_features(&pool).await?;
    if purged > 0 {
        println!("Purged {} legacy feature documents.", purged);
    }

    let (class_count, feature_count) = upsert::apply(&pool, &docs).await?;

    cache::emit(&config.paths.cache_dir, &docs, class_count, feature_count)?;

    println!("\nIngest report");
    println!("-------------");
    for (file, doc) in files.iter().zip(&docs) {
        println!("{}: {} features", file.stem(), doc.feature_count());
    }
    println!(
        "\nStore totals → classes: {}, features: {}",
        class_count, feature_count
    );
    println!(
        "Cache written → {}, {}",
        config.paths.cache_dir.join(cache::CLASSES_MIN_FILE).display(),
        config.paths.cache_dir.join(cache::META_FILE).display()
    );
    println!("\nDone.");

    pool.close().await;
    Ok(())
}

/// Validate the whole batch against the class schema. All-or-nothing:
/// every file's violations are printed together and the run aborts if
/// any document fails. Returns the typed documents in input order.
fn validate_all(config: &Config, files: &[SourceFile]) -> Result<Vec<ClassDocument>> {
    let validator = SchemaValidator::from_file(&config.paths.class_schema)?;

    let mut report: Vec<String> = Vec::new();
    let mut failed_files = 0usize;
    for file in files {
        let violations = validator.validate(&file.document);
        if !violations.is_empty() {
            failed_files += 1;
            for v in violations {
                report.push(format!("{}: {}", file.file_name(), v));
            }
        }
    }

    if !report.is_empty() {
        println!("Validation errors:");
        for line in &report {
            println!(" - {}", line);
        }
        return Err(IngestError::Validation {
            file_count: failed_files,
        }
        .into());
    }

    files
        .iter()
        .map(|file| {
            serde_json::from_value(file.document.clone())
                .with_context(|| format!("Failed to decode {}", file.file_name()))
        })
        .collect()
}
