//! The pipeline recipe model.
//!
//! A [`Recipe`] is an ordered sequence of [`Step`]s describing a data
//! transformation pipeline. Order is semantically significant: it is the
//! execution order sent to the remote evaluator and the code generator.
//! Steps keep stable unique ids across edits, so targeted updates and
//! removals never disturb the identity of their neighbours.
//!
//! Every mutation bumps a monotonically increasing version counter. The
//! preview executor uses that counter to discard results computed from a
//! superseded recipe (see [`crate::preview`]).
//!
//! # Example
//!
//! ```
//! use prima::recipe::{Recipe, StepPatch};
//!
//! let mut recipe = Recipe::new();
//! let id = recipe.append("drop_column").id.clone();
//! recipe.update(&id, StepPatch::new().column("Cabin"));
//! assert_eq!(recipe.steps()[0].column, "Cabin");
//! ```

use crate::catalog::OperationDefinition;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Sentinel column value for a step whose target has not been chosen yet.
///
/// Matches the marker the refinery service expects; steps carrying it are
/// skipped by the remote evaluator rather than rejected.
pub const UNSELECTED_COLUMN: &str = "select_column";

/// A single pipeline node: one operation applied to one target column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// Unique, stable across edits. The identity used for updates/removal.
    pub id: String,

    /// References an operation id from the catalog.
    pub operation: String,

    /// Name of the column the step primarily acts on, or
    /// [`UNSELECTED_COLUMN`].
    pub column: String,

    /// Sparse parameter overrides, keyed by parameter name. Unset entries
    /// fall back to the catalog default at read time. Unknown or stale keys
    /// are preserved so switching an operation and back does not lose prior
    /// input.
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl Step {
    /// Create a fresh step for the given operation, with an unselected
    /// column and no parameter overrides.
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            operation: operation.into(),
            column: UNSELECTED_COLUMN.to_owned(),
            params: Map::new(),
        }
    }

    /// The column this step effectively targets.
    ///
    /// A non-empty `col` parameter shadows the step's own `column` field,
    /// mirroring how the remote evaluator resolves the target.
    pub fn effective_column(&self) -> &str {
        match self.params.get("col") {
            Some(Value::String(s)) if !s.is_empty() => s,
            _ => &self.column,
        }
    }

    /// Whether a usable target column has been selected.
    pub fn has_column(&self) -> bool {
        let col = self.effective_column();
        !col.is_empty() && col != UNSELECTED_COLUMN
    }

    /// Resolve the effective value of a parameter: the explicit override if
    /// present, otherwise the default declared by the operation definition.
    ///
    /// Returns `None` when neither exists (including when the operation is
    /// absent from the catalog; configuration degrades, it does not fail).
    pub fn effective_param(&self, definition: Option<&OperationDefinition>, name: &str) -> Option<Value> {
        if let Some(value) = self.params.get(name) {
            return Some(value.clone());
        }
        definition
            .and_then(|def| def.param(name))
            .and_then(|spec| spec.default.clone())
    }
}

/// A partial update to a step: a new target column and/or parameter
/// upserts. Parameters not mentioned are left untouched.
#[derive(Debug, Clone, Default)]
pub struct StepPatch {
    column: Option<String>,
    params: Vec<(String, Value)>,
}

impl StepPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the target column.
    #[must_use]
    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    /// Upsert one parameter.
    #[must_use]
    pub fn param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.column.is_none() && self.params.is_empty()
    }
}

/// An ordered sequence of steps plus the active-step selection.
///
/// Invariants: no two steps share an id; order is exactly append order
/// minus removed ids. Reordering is not supported.
#[derive(Debug, Clone, Default)]
pub struct Recipe {
    steps: Vec<Step>,
    active: Option<String>,
    version: u64,
}

impl Recipe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a recipe from existing steps (e.g. a recipe file), rejecting
    /// duplicate ids.
    pub fn from_steps(steps: Vec<Step>) -> crate::error::Result<Self> {
        let mut seen = std::collections::HashSet::new();
        for step in &steps {
            if !seen.insert(step.id.as_str()) {
                return Err(crate::error::PrimaError::Config(format!(
                    "Duplicate step id '{}' in recipe",
                    step.id
                )));
            }
        }
        Ok(Self {
            steps,
            active: None,
            version: 0,
        })
    }

    /// Append a new step for `operation_id` and make it the active step.
    ///
    /// The operation id is not checked against the catalog here; an unknown
    /// id renders as "unconfigurable" downstream instead of failing.
    pub fn append(&mut self, operation_id: impl Into<String>) -> &Step {
        let step = Step::new(operation_id);
        self.active = Some(step.id.clone());
        self.steps.push(step);
        self.bump();
        self.steps.last().expect("just pushed")
    }

    /// Apply a patch to the step with `step_id`. Returns `false` (a no-op,
    /// not an error) when no such step exists; the step may have just been
    /// removed under a stale reference.
    pub fn update(&mut self, step_id: &str, patch: StepPatch) -> bool {
        if patch.is_empty() {
            return self.steps.iter().any(|s| s.id == step_id);
        }
        let Some(step) = self.steps.iter_mut().find(|s| s.id == step_id) else {
            return false;
        };
        if let Some(column) = patch.column {
            step.column = column;
        }
        for (name, value) in patch.params {
            step.params.insert(name, value);
        }
        self.bump();
        true
    }

    /// Remove the step with `step_id`, preserving the relative order of the
    /// remainder. Clears the active selection if it pointed at the removed
    /// step. Returns `false` when no such step exists.
    pub fn remove(&mut self, step_id: &str) -> bool {
        let before = self.steps.len();
        self.steps.retain(|s| s.id != step_id);
        if self.steps.len() == before {
            return false;
        }
        if self.active.as_deref() == Some(step_id) {
            self.active = None;
        }
        self.bump();
        true
    }

    /// Select a step for configuration. Selection is presentation state and
    /// does not change the recipe fingerprint.
    pub fn set_active(&mut self, step_id: Option<&str>) {
        self.active = step_id
            .filter(|id| self.steps.iter().any(|s| s.id == *id))
            .map(str::to_owned);
    }

    pub fn active(&self) -> Option<&Step> {
        let id = self.active.as_deref()?;
        self.steps.iter().find(|s| s.id == id)
    }

    pub fn get(&self, step_id: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.id == step_id)
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The current recipe fingerprint. Bumped by every mutation; preview
    /// responses are applied in version order, never arrival order.
    pub fn version(&self) -> u64 {
        self.version
    }

    fn bump(&mut self) {
        self.version += 1;
    }
}
