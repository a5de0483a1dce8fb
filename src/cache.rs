//! Flat cache artifact emitter.
//!
//! Projects the validated document set into the two zero-dependency
//! read artifacts: `classes.min.json` (minified summary list, input
//! order) and `meta.json` (pretty-printed run metadata). Both fully
//! overwrite prior content; a failed write is fatal to the run.

use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::path::Path;

use crate::models::{ClassDocument, ClassSummary, IngestMeta};
use crate::upsert::iso_now;

pub const CLASSES_MIN_FILE: &str = "classes.min.json";
pub const META_FILE: &str = "meta.json";

const EDITION: &str = "5e-2014";
const LICENSE: &str = "CC-BY-4.0";
const SOURCE: &str = "SRD 5.1";
const LICENSE_NOTICE: &str = "D&D 5.1 SRD © Wizards of the Coast — CC-BY-4.0 (see LICENSE)";
const ATTRIBUTION: &str = "Dungeons & Dragons® 5.1 System Reference Document (SRD) — \
    Wizards of the Coast. Source: https://dnd.wizards.com/resources/systems-reference-document";

/// Compact public summary of one class document. Levels are a sorted,
/// deduplicated set here, unlike the persisted class record meta.
pub fn class_summary(doc: &ClassDocument) -> ClassSummary {
    let levels: BTreeSet<i64> = doc.levels().into_iter().collect();
    ClassSummary {
        name: doc.name.clone(),
        srd_id: doc.srd_id.clone(),
        hit_die: doc.hit_die.clone(),
        primary_abilities: doc.primary_abilities.clone(),
        levels_supported: levels.into_iter().collect(),
        feature_count: doc.feature_count(),
        edition: doc.edition.clone(),
        license: doc.license.clone(),
    }
}

/// Run-level metadata document. Counts come from the store's
/// post-convergence totals, not from the in-memory set.
pub fn ingest_meta(docs: &[ClassDocument], class_count: i64, feature_count: i64) -> IngestMeta {
    let levels: BTreeSet<i64> = docs.iter().flat_map(|d| d.levels()).collect();
    IngestMeta {
        generated_at: iso_now(),
        edition: EDITION.to_string(),
        license: LICENSE.to_string(),
        source: SOURCE.to_string(),
        class_documents: class_count,
        feature_documents: feature_count,
        classes: docs.iter().map(|d| d.name.clone()).collect(),
        levels_supported: levels.into_iter().collect(),
        license_notice: LICENSE_NOTICE.to_string(),
        attribution: ATTRIBUTION.to_string(),
    }
}

/// Write both cache artifacts, creating the cache directory if absent.
pub fn emit(
    cache_dir: &Path,
    docs: &[ClassDocument],
    class_count: i64,
    feature_count: i64,
) -> Result<()> {
    std::fs::create_dir_all(cache_dir)
        .with_context(|| format!("Failed to create cache dir: {}", cache_dir.display()))?;

    let summaries: Vec<ClassSummary> = docs.iter().map(class_summary).collect();
    let min_path = cache_dir.join(CLASSES_MIN_FILE);
    std::fs::write(&min_path, serde_json::to_string(&summaries)?)
        .with_context(|| format!("Failed to write {}", min_path.display()))?;

    let meta = ingest_meta(docs, class_count, feature_count);
    let meta_path = cache_dir.join(META_FILE);
    std::fs::write(&meta_path, serde_json::to_string_pretty(&meta)?)
        .with_context(|| format!("Failed to write {}", meta_path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FeatureSpec, LevelBlock};

    fn class(name: &str, levels: &[i64]) -> ClassDocument {
        ClassDocument {
            name: name.to_string(),
            srd_id: format!("class:{}", name.to_lowercase()),
            hit_die: "d8".to_string(),
            primary_abilities: vec!["CHA".to_string()],
            edition: "5e-2014".to_string(),
            license: "CC-BY-4.0".to_string(),
            features_by_level: levels
                .iter()
                .map(|&level| LevelBlock {
                    level,
                    features: vec![FeatureSpec {
                        name: format!("Feature {}", level),
                        description_md: "Text.".to_string(),
                        source: "SRD 5.1".to_string(),
                        srd_feature_id: None,
                        extra: serde_json::Map::new(),
                    }],
                })
                .collect(),
            extra: serde_json::Map::new(),
        }
    }

    #[test]
    fn test_summary_sorts_and_dedupes_levels() {
        let doc = class("Bard", &[3, 1, 2, 1]);
        let summary = class_summary(&doc);
        assert_eq!(summary.levels_supported, vec![1, 2, 3]);
        assert_eq!(summary.feature_count, 4);
    }

    #[test]
    fn test_meta_unions_levels_across_classes() {
        let docs = vec![class("Bard", &[1, 2]), class("Wizard", &[2, 5])];
        let meta = ingest_meta(&docs, 2, 4);
        assert_eq!(meta.levels_supported, vec![1, 2, 5]);
        assert_eq!(meta.classes, vec!["Bard", "Wizard"]);
        assert_eq!(meta.class_documents, 2);
        assert_eq!(meta.feature_documents, 4);
        assert_eq!(meta.edition, "5e-2014");
        assert_eq!(meta.license, "CC-BY-4.0");
    }

    #[test]
    fn test_emit_writes_minified_and_pretty() {
        let tmp = tempfile::TempDir::new().unwrap();
        let cache_dir = tmp.path().join("cache");
        let docs = vec![class("Fighter", &[1])];

        emit(&cache_dir, &docs, 1, 1).unwrap();

        let min = std::fs::read_to_string(cache_dir.join(CLASSES_MIN_FILE)).unwrap();
        assert!(!min.contains('\n'), "summary list must be minified");
        assert!(min.contains("\"Fighter\""));

        let meta = std::fs::read_to_string(cache_dir.join(META_FILE)).unwrap();
        assert!(meta.contains('\n'), "meta must be pretty-printed");
        let parsed: IngestMeta = serde_json::from_str(&meta).unwrap();
        assert_eq!(parsed.classes, vec!["Fighter"]);
    }

    #[test]
    fn test_emit_overwrites_prior_content() {
        let tmp = tempfile::TempDir::new().unwrap();
        let cache_dir = tmp.path().to_path_buf();

        emit(&cache_dir, &[class("Bard", &[1]), class("Wizard", &[1])], 2, 2).unwrap();
        emit(&cache_dir, &[class("Fighter", &[1])], 1, 1).unwrap();

        let min = std::fs::read_to_string(cache_dir.join(CLASSES_MIN_FILE)).unwrap();
        assert!(min.contains("Fighter"));
        assert!(!min.contains("Bard"));
    }
}
