//! Compiling a finalized recipe into a reproducible export.
//!
//! Unlike the preview, export is explicit: it runs once per user action,
//! is never auto-triggered by edits, and is safe to repeat because the remote
//! generator is a pure function of recipe + dataset session. An empty
//! recipe is short-circuited client-side to a placeholder result with no
//! remote call.

use crate::api::types::{GenerateResponse, PipelinePayload};
use crate::error::Result;
use crate::recipe::Recipe;
use async_trait::async_trait;

/// Default name the service gives generated scripts.
pub const DEFAULT_EXPORT_FILENAME: &str = "pipeline.py";

/// The remote code generator seam. [`crate::api::ApiClient`] is the
/// production implementation; tests substitute doubles.
#[async_trait]
pub trait CodegenBackend: Send + Sync + 'static {
    async fn generate_code(&self, payload: &PipelinePayload) -> Result<GenerateResponse>;
}

/// A generated export: source text, dependency manifest and derived
/// metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportResult {
    pub status: String,
    pub filename: String,
    pub code: String,
    pub requirements: Vec<String>,
    pub install_command: String,
    /// Number of recipe steps the script was compiled from.
    pub step_count: usize,
}

impl ExportResult {
    /// Placeholder shown for an empty recipe; no remote call was made.
    pub fn empty() -> Self {
        Self {
            status: "empty".to_owned(),
            filename: DEFAULT_EXPORT_FILENAME.to_owned(),
            code: String::new(),
            requirements: Vec::new(),
            install_command: String::new(),
            step_count: 0,
        }
    }

    fn from_response(response: GenerateResponse, step_count: usize) -> Self {
        Self {
            status: response.status,
            filename: response.filename,
            code: response.code,
            requirements: response.requirements,
            install_command: response.install_command,
            step_count,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    /// Line count of the generated source.
    pub fn line_count(&self) -> usize {
        if self.code.is_empty() {
            0
        } else {
            self.code.lines().count()
        }
    }

    /// Rough runtime estimate for the generated script, as shown alongside
    /// the source.
    pub fn estimated_runtime(&self) -> String {
        format!("~{:.1}s", self.step_count as f64 * 0.4 + 0.3)
    }
}

/// Submits finalized recipes to the remote code generator.
pub struct ExportCompiler {
    backend: std::sync::Arc<dyn CodegenBackend>,
    session_id: String,
}

impl ExportCompiler {
    pub fn new(backend: std::sync::Arc<dyn CodegenBackend>, session_id: impl Into<String>) -> Self {
        Self {
            backend,
            session_id: session_id.into(),
        }
    }

    /// Compile the recipe. Results are not cached: every call re-requests,
    /// relying on the generator's determinism for identical output.
    ///
    /// # Errors
    ///
    /// Remote or transport failures are returned as-is; they are non-fatal
    /// and the caller may retry with the same recipe.
    pub async fn generate(&self, recipe: &Recipe) -> Result<ExportResult> {
        if recipe.is_empty() {
            tracing::debug!("empty recipe, skipping code generation");
            return Ok(ExportResult::empty());
        }

        let payload = PipelinePayload::new(self.session_id.clone(), recipe);
        let response = self.backend.generate_code(&payload).await?;
        tracing::info!(
            filename = %response.filename,
            requirements = response.requirements.len(),
            "code generated"
        );
        Ok(ExportResult::from_response(response, recipe.len()))
    }
}
