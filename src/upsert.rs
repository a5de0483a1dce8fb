//! The upsert engine.
//!
//! Converts each validated class document into one embedded class
//! record and N normalized feature records, then converges the store to
//! exactly that set via idempotent upserts keyed by stable natural
//! keys. Running twice with the same input leaves the store in the same
//! observable state as running once.

use anyhow::Result;
use sqlx::SqlitePool;
use std::collections::HashSet;

use crate::error::IngestError;
use crate::models::{
    ClassDocument, ClassRecord, ClassRecordMeta, ImportMeta, NormalizedFeature,
};
use crate::slug::feature_slug;

/// Version tag stamped into every record's provenance block.
pub const IMPORT_VERSION: i64 = 1;

/// Current UTC time as an RFC-3339 Zulu string, no sub-seconds.
pub fn iso_now() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Project a class document into its embedded persisted shape.
/// `levels_supported` keeps source order here; only the cache summary
/// sorts it.
pub fn to_class_record(doc: &ClassDocument, imported_at: &str) -> ClassRecord {
    ClassRecord {
        doc: doc.clone(),
        meta: ClassRecordMeta {
            levels_supported: doc.levels(),
            feature_count: doc.feature_count(),
            imported_at: imported_at.to_string(),
            import_version: IMPORT_VERSION,
        },
    }
}

/// Project a class document into its normalized per-feature-per-level
/// records, each carrying the denormalized class fields and the stable
/// composite slug.
pub fn to_normalized_features(doc: &ClassDocument, imported_at: &str) -> Vec<NormalizedFeature> {
    let mut records = Vec::new();
    for block in &doc.features_by_level {
        for feature in &block.features {
            records.push(NormalizedFeature {
                class_name: doc.name.clone(),
                class_srd_id: doc.srd_id.clone(),
                edition: doc.edition.clone(),
                level: block.level,
                name: feature.name.clone(),
                slug: feature_slug(&doc.name, &feature.name, block.level),
                srd_feature_id: feature.srd_feature_id.clone(),
                description_md: feature.description_md.clone(),
                source: feature.source.clone(),
                license: doc.license.clone(),
                meta: ImportMeta {
                    imported_at: imported_at.to_string(),
                    import_version: IMPORT_VERSION,
                },
            });
        }
    }
    records
}

/// Reject a batch in which two distinct features derived the same
/// composite key. Left to the upsert alone, the second write would
/// silently overwrite the first — a data-authoring collision must
/// surface instead.
pub fn check_duplicate_keys(features: &[NormalizedFeature]) -> Result<()> {
    let mut seen = HashSet::new();
    for f in features {
        let key = (f.class_srd_id.as_str(), f.level, f.slug.as_str());
        if !seen.insert(key) {
            return Err(IngestError::DuplicateKey {
                class_srd_id: f.class_srd_id.clone(),
                level: f.level,
                slug: f.slug.clone(),
            }
            .into());
        }
    }
    Ok(())
}

/// Upsert all class and feature records derived from `docs` with the
/// current time as provenance, then re-read totals from the store.
pub async fn apply(pool: &SqlitePool, docs: &[ClassDocument]) -> Result<(i64, i64)> {
    apply_at(pool, docs, &iso_now()).await
}

/// Like [`apply`] with an explicit provenance timestamp. The returned
/// counts are the authoritative post-convergence state read back from
/// the store, not a local tally — a guard against silent partial
/// application. Each upsert is atomic on its own; the batches are not
/// transactions.
pub async fn apply_at(
    pool: &SqlitePool,
    docs: &[ClassDocument],
    imported_at: &str,
) -> Result<(i64, i64)> {
    let class_records: Vec<ClassRecord> = docs
        .iter()
        .map(|d| to_class_record(d, imported_at))
        .collect();
    let feature_records: Vec<NormalizedFeature> = docs
        .iter()
        .flat_map(|d| to_normalized_features(d, imported_at))
        .collect();

    check_duplicate_keys(&feature_records)?;

    for record in &class_records {
        sqlx::query(
            r#"
            INSERT INTO classes (srd_id, name, doc) VALUES (?, ?, ?)
            ON CONFLICT(srd_id) DO UPDATE SET
                name = excluded.name,
                doc = excluded.doc
            "#,
        )
        .bind(&record.doc.srd_id)
        .bind(&record.doc.name)
        .bind(serde_json::to_string(record)?)
        .execute(pool)
        .await?;
    }

    for record in &feature_records {
        sqlx::query(
            r#"
            INSERT INTO features (class_srd_id, class_name, level, name, slug, doc)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(class_srd_id, level, slug) DO UPDATE SET
                class_name = excluded.class_name,
                name = excluded.name,
                doc = excluded.doc
            "#,
        )
        .bind(&record.class_srd_id)
        .bind(&record.class_name)
        .bind(record.level)
        .bind(&record.name)
        .bind(&record.slug)
        .bind(serde_json::to_string(record)?)
        .execute(pool)
        .await?;
    }

    let class_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM classes")
        .fetch_one(pool)
        .await?;
    let feature_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM features")
        .fetch_one(pool)
        .await?;

    Ok((class_count, feature_count))
}
