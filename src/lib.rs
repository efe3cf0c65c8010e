//! flowctl — a durable DAG workflow orchestrator
//!
//! Persists workflows (DAGs of nodes and edges), accepts trigger requests,
//! and drives each execution to completion by dispatching ready tasks to a
//! pool of worker processes and recording their results.

pub mod api;
pub mod config;
pub mod db;
pub mod orchestration;
pub mod resolver;
pub mod scheduler;
pub mod version;
pub mod worker_pool;

use thiserror::Error;

/// Crate-wide error taxonomy.
///
/// Each variant maps to one of the error kinds the orchestration layer and
/// API are specified against: validation failures, business-logic/state
/// violations, resource access failures, storage failures, and scheduler
/// failures.
#[derive(Debug, Error)]
pub enum Error {
    /// Input violates a structural or uniqueness rule.
    #[error("validation error: {0}")]
    Validation(String),

    /// Referential or state-machine violation (e.g. deleting a workflow
    /// with active executions).
    #[error("business logic error: {0}")]
    BusinessLogic(String),

    /// Filesystem access failure (script read/write/delete).
    #[error("resource error: {0}")]
    Resource(String),

    /// Storage-layer failure.
    #[error("database error: {0}")]
    Database(#[from] db::DatabaseError),

    /// Worker pool or scheduler supervisor failure.
    #[error("scheduler error: {0}")]
    Scheduler(String),

    /// JSON (de)serialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type used throughout the orchestration layer.
pub type Result<T> = std::result::Result<T, Error>;
