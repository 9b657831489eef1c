//! Subcommand definitions, one module per record kind.

pub mod activity;
pub mod cca;
pub mod class;
pub mod import;
pub mod student;
pub mod subject;

use anyhow::{Context, Result};
use serde_json::Value;

/// Renders a repository read model as a JSON value.
pub(crate) fn to_json<T: serde::Serialize>(record: &T) -> Result<Value> {
    serde_json::to_value(record).context("Failed to serialize record")
}
