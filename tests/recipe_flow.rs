//! Integration tests for the full recipe workflow.
//!
//! These drive the recipe model, preview executor and export compiler
//! together against stub backends, verifying the exact payloads the remote
//! service would receive.

use async_trait::async_trait;
use prima::api::types::{GenerateResponse, PipelinePayload, PreviewData};
use prima::error::Result;
use prima::export::{CodegenBackend, ExportCompiler};
use prima::preview::{PreviewBackend, PreviewExecutor};
use prima::recipe::{Recipe, StepPatch, UNSELECTED_COLUMN};
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Records every payload it receives and answers deterministically.
#[derive(Default)]
struct RecordingBackend {
    payloads: Mutex<Vec<PipelinePayload>>,
}

impl RecordingBackend {
    fn payloads(&self) -> Vec<PipelinePayload> {
        self.payloads.lock().expect("not poisoned").clone()
    }
}

#[async_trait]
impl PreviewBackend for RecordingBackend {
    async fn preview(&self, payload: &PipelinePayload) -> Result<PreviewData> {
        self.payloads.lock().expect("not poisoned").push(payload.clone());
        Ok(PreviewData {
            rows: 891,
            columns: vec!["Age".to_owned(), "Fare".to_owned()],
            data: vec![],
        })
    }
}

#[async_trait]
impl CodegenBackend for RecordingBackend {
    async fn generate_code(&self, payload: &PipelinePayload) -> Result<GenerateResponse> {
        self.payloads.lock().expect("not poisoned").push(payload.clone());
        let body: Vec<String> = payload
            .steps
            .iter()
            .map(|s| format!("df = {}(df, '{}')", s.operation, s.column))
            .collect();
        Ok(GenerateResponse {
            status: "success".to_owned(),
            filename: "pipeline.py".to_owned(),
            code: body.join("\n"),
            requirements: vec!["pandas".to_owned()],
            install_command: "pip install pandas".to_owned(),
        })
    }
}

/// Append `drop_column` on `Cabin` and `fill_na_median` on `Age`.
fn titanic_recipe() -> (Recipe, String, String) {
    let mut recipe = Recipe::new();
    let drop_id = recipe.append("drop_column").id.clone();
    recipe.update(&drop_id, StepPatch::new().column("Cabin"));
    let fill_id = recipe.append("fill_na_median").id.clone();
    recipe.update(&fill_id, StepPatch::new().column("Age"));
    (recipe, drop_id, fill_id)
}

#[tokio::test(start_paused = true)]
async fn test_end_to_end_recipe_edit_and_preview_payload() {
    let backend = Arc::new(RecordingBackend::default());
    let mut executor = PreviewExecutor::new(
        Arc::clone(&backend) as Arc<dyn PreviewBackend>,
        "sess-42",
        Duration::from_millis(800),
    );

    let (mut recipe, drop_id, fill_id) = titanic_recipe();
    assert_eq!(recipe.len(), 2);
    assert_eq!(recipe.steps()[0].operation, "drop_column");
    assert_eq!(recipe.steps()[1].operation, "fill_na_median");

    executor.recipe_changed(&recipe);
    executor.settled().await;

    // The edit burst produced exactly one request, with the exact body the
    // service expects.
    let payloads = backend.payloads();
    assert_eq!(payloads.len(), 1);
    let body = serde_json::to_value(&payloads[0]).expect("serializable");
    assert_eq!(body["session_id"], json!("sess-42"));
    assert_eq!(body["steps"][0]["operation"], json!("drop_column"));
    assert_eq!(body["steps"][0]["column"], json!("Cabin"));
    assert_eq!(body["steps"][1]["operation"], json!("fill_na_median"));
    assert_eq!(body["steps"][1]["column"], json!("Age"));

    // Remove the first step: one step left, identity untouched.
    assert!(recipe.remove(&drop_id));
    assert_eq!(recipe.len(), 1);
    assert_eq!(recipe.steps()[0].id, fill_id);
    assert_eq!(recipe.steps()[0].operation, "fill_na_median");

    executor.recipe_changed(&recipe);
    executor.settled().await;

    let payloads = backend.payloads();
    assert_eq!(payloads.len(), 2);
    assert_eq!(payloads[1].steps.len(), 1);
    assert_eq!(payloads[1].steps[0].id, fill_id);
}

#[tokio::test]
async fn test_export_round_trips_the_same_recipe() {
    let backend = Arc::new(RecordingBackend::default());
    let compiler = ExportCompiler::new(
        Arc::clone(&backend) as Arc<dyn CodegenBackend>,
        "sess-42",
    );

    let (recipe, _, _) = titanic_recipe();
    let first = compiler.generate(&recipe).await.expect("export succeeds");
    let second = compiler.generate(&recipe).await.expect("export succeeds");

    assert_eq!(first.code, second.code, "identical recipe, identical code");
    assert_eq!(first.code, "df = drop_column(df, 'Cabin')\ndf = fill_na_median(df, 'Age')");
    assert_eq!(first.step_count, 2);
    assert_eq!(first.requirements, ["pandas"]);

    // Both invocations reached the generator: no local caching.
    assert_eq!(backend.payloads().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_fresh_step_carries_unselected_sentinel() {
    let backend = Arc::new(RecordingBackend::default());
    let mut executor = PreviewExecutor::new(
        Arc::clone(&backend) as Arc<dyn PreviewBackend>,
        "sess-42",
        Duration::from_millis(800),
    );

    // A freshly appended step goes out with the unselected sentinel; the
    // remote evaluator skips it rather than rejecting the recipe.
    let mut recipe = Recipe::new();
    recipe.append("standard_scaler");
    executor.recipe_changed(&recipe);
    executor.settled().await;

    let payloads = backend.payloads();
    assert_eq!(payloads[0].steps[0].column, UNSELECTED_COLUMN);
    assert!(executor.state().result.is_some(), "preview still succeeds");
}
