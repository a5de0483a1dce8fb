//! Core data models for the SRD ingest pipeline.
//!
//! These types mirror the canonical per-class JSON documents and the two
//! differently-shaped persisted representations derived from them: the
//! embedded class record and the normalized per-feature-per-level record.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Canonical source document for one class, as authored in
/// `data/srd/classes/*.json`. Unknown authored fields are carried in
/// `extra` so a full-document replace never drops them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassDocument {
    pub name: String,
    pub srd_id: String,
    pub hit_die: String,
    pub primary_abilities: Vec<String>,
    pub edition: String,
    pub license: String,
    pub features_by_level: Vec<LevelBlock>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// One level entry inside a class document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelBlock {
    pub level: i64,
    pub features: Vec<FeatureSpec>,
}

/// A feature as embedded in a class document at a given level. Not
/// independently identified in the source; identity is derived at
/// upsert time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureSpec {
    pub name: String,
    pub description_md: String,
    pub source: String,
    #[serde(default)]
    pub srd_feature_id: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Import provenance attached to every persisted record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImportMeta {
    pub imported_at: String,
    pub import_version: i64,
}

/// Derived summary metadata stored alongside the embedded class record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassRecordMeta {
    pub levels_supported: Vec<i64>,
    pub feature_count: i64,
    pub imported_at: String,
    pub import_version: i64,
}

/// Embedded representation persisted in the `classes` collection: the
/// full source document plus derived meta. Replaced wholesale on every
/// ingest keyed by `srd_id` — no field-level merge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassRecord {
    #[serde(flatten)]
    pub doc: ClassDocument,
    pub meta: ClassRecordMeta,
}

/// Normalized representation persisted in the `features` collection,
/// one record per feature per level. Composite natural key:
/// `(class_srd_id, level, slug)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedFeature {
    pub class_name: String,
    pub class_srd_id: String,
    pub edition: String,
    pub level: i64,
    pub name: String,
    pub slug: String,
    pub srd_feature_id: Option<String>,
    pub description_md: String,
    pub source: String,
    pub license: String,
    pub meta: ImportMeta,
}

/// Compact public summary of a class, cache-only (`classes.min.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassSummary {
    pub name: String,
    pub srd_id: String,
    pub hit_die: String,
    pub primary_abilities: Vec<String>,
    pub levels_supported: Vec<i64>,
    pub feature_count: i64,
    pub edition: String,
    pub license: String,
}

/// Run-level ingest metadata, cache-only (`meta.json`). Fully
/// recomputed each run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestMeta {
    pub generated_at: String,
    pub edition: String,
    pub license: String,
    pub source: String,
    pub class_documents: i64,
    pub feature_documents: i64,
    pub classes: Vec<String>,
    pub levels_supported: Vec<i64>,
    pub license_notice: String,
    pub attribution: String,
}

impl ClassDocument {
    /// Total number of features across all levels.
    pub fn feature_count(&self) -> i64 {
        self.features_by_level
            .iter()
            .map(|b| b.features.len() as i64)
            .sum()
    }

    /// Levels in source order, as authored.
    pub fn levels(&self) -> Vec<i64> {
        self.features_by_level.iter().map(|b| b.level).collect()
    }
}
