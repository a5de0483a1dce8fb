//! # SRD Grounding
//!
//! A data-publishing pipeline for SRD 5.1 (5e-2014) reference data.
//! Canonical per-class JSON documents are validated against a JSON
//! Schema, upserted into a document store in two shapes (embedded class
//! records and normalized per-level feature records), projected into
//! flat cache artifacts, and served through a read-only HTTP API.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌──────────┐   ┌───────────────┐   ┌─────────┐
//! │ data/srd/  │──▶│ validate │──▶│ reconcile +   │──▶│ cache/  │
//! │ classes/   │   │ (schema) │   │ upsert (SQLite)│  │ *.json  │
//! └────────────┘   └──────────┘   └───────┬───────┘   └────┬────┘
//!                                         │                │
//!                                         ▼                ▼
//!                                   ┌──────────────────────────┐
//!                                   │   HTTP API (read-only)   │
//!                                   └──────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration + env-resolved store URL |
//! | [`models`] | Canonical documents and derived records |
//! | [`slug`] | Deterministic slug derivation (two rules) |
//! | [`schema`] | JSON Schema validation |
//! | [`loader`] | Source directory loader |
//! | [`store`] | Store connection and table bootstrap |
//! | [`reconcile`] | Canonical index reconciliation, legacy purge |
//! | [`upsert`] | Projections and idempotent batch upserts |
//! | [`cache`] | Flat cache artifact emitter |
//! | [`ingest`] | Pipeline orchestration |
//! | [`server`] | Read-only HTTP API |

pub mod cache;
pub mod config;
pub mod error;
pub mod ingest;
pub mod loader;
pub mod models;
pub mod reconcile;
pub mod schema;
pub mod server;
pub mod slug;
pub mod store;
pub mod upsert;
