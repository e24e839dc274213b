//! Typed HTTP surface of the refinery service.
//!
//! Five endpoints, all under the `/api` prefix:
//!
//! | Method | Path | Purpose |
//! |---|---|---|
//! | `POST` | `/upload/{session_id}` | upload a CSV, create a dataset session |
//! | `GET` | `/analyze/{session_id}` | column profile of the sampled dataset |
//! | `GET` | `/options` | the operation catalog |
//! | `POST` | `/preview` | evaluate the recipe against the sample |
//! | `POST` | `/generate-code` | compile the recipe to a Python script |
//!
//! The wire shapes live in [`types`]; [`client::ApiClient`] is the one
//! concrete implementation of the preview/codegen backend seams.

pub mod client;
pub mod types;

pub use client::ApiClient;
pub use types::{
    AnalysisReport, ColumnProfile, DistributionBucket, GenerateResponse, PipelinePayload,
    PreviewData, UploadResponse,
};
