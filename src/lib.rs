//! # Prima - Data Refinery Client Toolkit
//!
//! Prima is a Rust client for the Prima data-refinery service. It owns the
//! pipeline *recipe*, the ordered list of declarative transformation steps
//! a user builds against an uploaded dataset, and the protocol that keeps
//! that recipe evaluated and exportable:
//!
//! - [`recipe`]: the ordered step model with stable ids and a version
//!   counter bumped by every edit
//! - [`catalog`]: the read-only registry of operations the service offers
//! - [`preview`]: debounced, versioned speculative evaluation against the
//!   remote evaluator (last-writer-wins by recipe version, never by
//!   network arrival)
//! - [`export`]: explicit compilation of the recipe into runnable Python
//!   plus a dependency manifest
//! - [`session`]: the expiring client-side pointer to the remote dataset
//!   session
//! - [`api`]: the typed HTTP surface of the service
//!
//! ## Quick Start
//!
//! ```no_run
//! use prima::api::ApiClient;
//! use prima::config::ApiConfig;
//! use prima::preview::{PreviewBackend, PreviewExecutor};
//! use prima::recipe::{Recipe, StepPatch};
//! use std::sync::Arc;
//!
//! # async fn example() -> prima::error::Result<()> {
//! let config = ApiConfig::default();
//! let client = ApiClient::new(&config)?;
//!
//! // Build a two-step recipe
//! let mut recipe = Recipe::new();
//! let id = recipe.append("drop_column").id.clone();
//! recipe.update(&id, StepPatch::new().column("Cabin"));
//!
//! // Keep a live preview while editing
//! let backend: Arc<dyn PreviewBackend> = Arc::new(client);
//! let mut executor = PreviewExecutor::new(backend, "session-id", config.preview_debounce());
//! executor.recipe_changed(&recipe);
//! # Ok(())
//! # }
//! ```
//!
//! ## Failure Semantics
//!
//! All failures are local to the triggering operation: transport errors
//! are retryable, remote validation errors surface inline without touching
//! the recipe, and responses for superseded recipe versions are silently
//! discarded. A missing session record is a precondition failure: the
//! caller must start a new extraction first.

#![warn(clippy::all, rust_2018_idioms)]

pub mod api;
pub mod catalog;
pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod preview;
pub mod recipe;
pub mod session;
