//! The operation catalog: every transformation the refinery service offers.
//!
//! Loaded once per session from `GET /options` and read-only afterwards.
//! A failed load yields an *empty* catalog rather than an error: step
//! configuration then degrades to "no parameters available" and `get()`
//! answers "not found" for every id.

use crate::api::ApiClient;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The input widget kind of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    Text,
    Number,
    Select,
    ColumnSelect,
}

/// Declares one configurable parameter of an operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    /// Unique within the operation
    pub name: String,

    #[serde(rename = "type")]
    pub kind: ParamKind,

    pub label: String,

    /// Choices for `select` parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,

    /// Fallback value merged in at read time when no override is set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

/// Immutable description of a transformation operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationDefinition {
    pub id: String,
    pub label: String,
    /// Grouping for presentation only; irrelevant to execution semantics.
    pub category: String,
    #[serde(default)]
    pub params: Vec<ParamSpec>,
}

impl OperationDefinition {
    /// Look up a parameter spec by name.
    pub fn param(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }
}

/// Read-only registry of operation definitions.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    operations: Vec<OperationDefinition>,
}

impl Catalog {
    pub fn new(operations: Vec<OperationDefinition>) -> Self {
        Self { operations }
    }

    /// A catalog with no operations: the degraded state after a failed load.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Fetch the catalog from the service. A load failure is logged and
    /// produces an empty catalog, never an error.
    pub async fn load(client: &ApiClient) -> Self {
        match client.options().await {
            Ok(operations) => {
                tracing::info!(count = operations.len(), "operation catalog loaded");
                Self::new(operations)
            }
            Err(e) => {
                tracing::warn!("failed to load operation catalog: {e}");
                Self::empty()
            }
        }
    }

    pub fn get(&self, operation_id: &str) -> Option<&OperationDefinition> {
        self.operations.iter().find(|op| op.id == operation_id)
    }

    pub fn operations(&self) -> &[OperationDefinition] {
        &self.operations
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Group operations by category for presentation, preserving the order
    /// in which categories first appear.
    pub fn by_category(&self) -> Vec<(&str, Vec<&OperationDefinition>)> {
        let mut groups: Vec<(&str, Vec<&OperationDefinition>)> = Vec::new();
        for op in &self.operations {
            match groups.iter_mut().find(|(cat, _)| *cat == op.category) {
                Some((_, ops)) => ops.push(op),
                None => groups.push((op.category.as_str(), vec![op])),
            }
        }
        groups
    }
}
