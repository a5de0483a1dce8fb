//! Index reconciliation and legacy cleanup.
//!
//! Runs before every upsert batch. The canonical index set is declared
//! as data; reconciliation introspects what the store actually has,
//! drops anything that does not match (wrong uniqueness, stale name,
//! prior-generation definition), and recreates the canonical set
//! idempotently. Convergent from any starting state.

use anyhow::Result;
use sqlx::{Row, SqlitePool};

/// Declarative definition of one canonical index.
#[derive(Debug, Clone, Copy)]
pub struct IndexSpec {
    pub table: &'static str,
    pub name: &'static str,
    pub columns: &'static [&'static str],
    pub unique: bool,
}

/// The exact index set the store must carry: unique `srd_id` on class
/// records, unique `(class_srd_id, level, slug)` on feature records,
/// plus non-unique secondary indexes for query efficiency.
pub const CANONICAL_INDEXES: &[IndexSpec] = &[
    IndexSpec {
        table: "classes",
        name: "ux_classes_srd_id",
        columns: &["srd_id"],
        unique: true,
    },
    IndexSpec {
        table: "classes",
        name: "ix_classes_name",
        columns: &["name"],
        unique: false,
    },
    IndexSpec {
        table: "features",
        name: "ux_features_key",
        columns: &["class_srd_id", "level", "slug"],
        unique: true,
    },
    IndexSpec {
        table: "features",
        name: "ix_features_class_level",
        columns: &["class_name", "level"],
        unique: false,
    },
];

const COLLECTIONS: &[&str] = &["classes", "features"];

/// An index as the store reports it.
#[derive(Debug)]
struct ExistingIndex {
    name: String,
    unique: bool,
    columns: Vec<String>,
}

/// Bring both collections to exactly the canonical index set.
pub async fn reconcile_indexes(pool: &SqlitePool) -> Result<()> {
    for table in COLLECTIONS {
        for existing in list_indexes(pool, table).await? {
            if !matches_canonical(table, &existing) {
                sqlx::query(&format!("DROP INDEX IF EXISTS \"{}\"", existing.name))
                    .execute(pool)
                    .await?;
            }
        }
    }

    for spec in CANONICAL_INDEXES {
        let uniqueness = if spec.unique { "UNIQUE " } else { "" };
        let sql = format!(
            "CREATE {}INDEX IF NOT EXISTS {} ON {} ({})",
            uniqueness,
            spec.name,
            spec.table,
            spec.columns.join(", ")
        );
        sqlx::query(&sql).execute(pool).await?;
    }

    Ok(())
}

/// Remove feature documents that predate the normalized key (no
/// `class_srd_id` at all). Unconditional: such rows are legacy
/// artifacts, never valid data. Returns the number purged.
pub async fn purge_legacy_features(pool: &SqlitePool) -> Result<u64> {
    let result = sqlx::query("DELETE FROM features WHERE class_srd_id IS NULL")
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

fn matches_canonical(table: &str, existing: &ExistingIndex) -> bool {
    CANONICAL_INDEXES.iter().any(|spec| {
        spec.table == table
            && spec.name == existing.name
            && spec.unique == existing.unique
            && existing
                .columns
                .iter()
                .map(String::as_str)
                .eq(spec.columns.iter().copied())
    })
}

async fn list_indexes(pool: &SqlitePool, table: &str) -> Result<Vec<ExistingIndex>> {
    let rows = sqlx::query(&format!("PRAGMA index_list(\"{}\")", table))
        .fetch_all(pool)
        .await?;

    let mut indexes = Vec::new();
    for row in rows {
        let name: String = row.get("name");
        let origin: String = row.get("origin");
        // Only explicitly created indexes can be dropped; autoindexes
        // backing constraints are owned by the table definition.
        if origin != "c" {
            continue;
        }
        let unique: i64 = row.get("unique");

        let col_rows = sqlx::query(&format!("PRAGMA index_info(\"{}\")", name))
            .fetch_all(pool)
            .await?;
        let mut cols: Vec<(i64, Option<String>)> = col_rows
            .iter()
            .map(|r| (r.get::<i64, _>("seqno"), r.get::<Option<String>, _>("name")))
            .collect();
        cols.sort_by_key(|(seqno, _)| *seqno);
        let columns: Vec<String> = cols
            .into_iter()
            .filter_map(|(_, name)| name)
            .collect();

        indexes.push(ExistingIndex {
            name,
            unique: unique != 0,
            columns,
        });
    }

    Ok(indexes)
}
