use anyhow::{Context as _, Result, bail};
use clap::{Parser, Subcommand};
use prima::api::ApiClient;
use prima::api::types::available_columns;
use prima::catalog::Catalog;
use prima::config::{AppConfig, load_app_config};
use prima::export::{CodegenBackend, ExportCompiler};
use prima::preview::PreviewBackend as _;
use prima::recipe::{Recipe, Step};
use prima::session::SessionStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "prima", about = "Client for the Prima data refinery service")]
pub struct Cli {
    /// Base URL of the refinery service (including the /api prefix)
    #[arg(long, env = "PRIMA_API_URL")]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Upload a CSV file and start a new dataset session
    Upload {
        /// Path to the CSV file
        file: PathBuf,
    },
    /// Show the column profile of the active session's dataset
    Analyze {
        /// Target a specific session instead of the saved one
        #[arg(long)]
        session: Option<String>,
    },
    /// List the transformation operations the service offers
    Options,
    /// Evaluate a recipe file against the active session's sample
    Preview {
        /// Path to a recipe JSON file (a list of steps)
        #[arg(short, long)]
        recipe: PathBuf,

        /// Target a specific session instead of the saved one
        #[arg(long)]
        session: Option<String>,

        /// Maximum number of sample rows to print
        #[arg(long, default_value_t = 10)]
        rows: usize,
    },
    /// Compile a recipe file into a Python script
    Generate {
        /// Path to a recipe JSON file (a list of steps)
        #[arg(short, long)]
        recipe: PathBuf,

        /// Write the generated script here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Target a specific session instead of the saved one
        #[arg(long)]
        session: Option<String>,
    },
    /// Show or clear the saved session record
    Session {
        /// Remove the saved record
        #[arg(long)]
        clear: bool,
    },
}

pub async fn run_command(cli: Cli) -> Result<()> {
    let mut config: AppConfig = load_app_config();
    if let Some(api_url) = cli.api_url {
        config.api.base_url = api_url;
    }
    let client = ApiClient::new(&config.api)?;
    let store = SessionStore::default_location()?;

    match cli.command {
        Commands::Upload { file } => {
            let session_id = Uuid::new_v4().to_string();
            let response = client.upload(&session_id, &file).await?;
            store.save(&response)?;
            println!("{}", response.message);
            println!(
                "Session {} ({} rows sampled)",
                response.session_id, response.rows_processed
            );
        }

        Commands::Analyze { session } => {
            let session_id = resolve_session(&store, session)?;
            let report = client.analyze(&session_id).await?;
            println!(
                "{}: {} rows x {} columns, {} duplicates, {}",
                report.filename,
                report.total_rows,
                report.total_cols,
                report.duplicate_rows,
                report.memory_usage
            );
            for col in &report.columns {
                let missing = format!("{} missing ({:.1}%)", col.missing, col.missing_pct);
                match (col.mean, col.median) {
                    (Some(mean), Some(median)) => println!(
                        "  {:<24} {:<10} {missing}, mean {mean:.3}, median {median:.3}",
                        col.name, col.dtype
                    ),
                    _ => {
                        let top = col.top_value.as_deref().unwrap_or("-");
                        println!(
                            "  {:<24} {:<10} {missing}, top '{top}' ({} unique)",
                            col.name, col.dtype, col.unique
                        );
                    }
                }
            }
        }

        Commands::Options => {
            let catalog = Catalog::load(&client).await;
            if catalog.is_empty() {
                bail!("Could not load operations from the service");
            }
            for (category, ops) in catalog.by_category() {
                println!("{category}:");
                for op in ops {
                    let params: Vec<&str> = op.params.iter().map(|p| p.name.as_str()).collect();
                    println!("  {:<24} {} [{}]", op.id, op.label, params.join(", "));
                }
            }
        }

        Commands::Preview {
            recipe,
            session,
            rows,
        } => {
            let session_id = resolve_session(&store, session)?;
            let recipe = load_recipe(&recipe)?;
            for (idx, step) in recipe.steps().iter().enumerate() {
                println!("{}. {} on {}", idx + 1, step.operation, step.effective_column());
            }

            let payload = prima::api::types::PipelinePayload::new(session_id.clone(), &recipe);
            let data = client.preview(&payload).await?;

            println!(
                "{} rows x {} columns after {} steps",
                data.rows,
                data.columns.len(),
                recipe.len()
            );
            println!("{}", data.columns.join(" | "));
            for record in data.data.iter().take(rows) {
                println!("{}", serde_json::to_string(record)?);
            }

            // Columns selectable for further configuration: the original
            // schema merged with whatever the pipeline produced.
            if let Ok(report) = client.analyze(&session_id).await {
                let cols = available_columns(&report.column_names(), Some(&data));
                println!("# available columns: {}", cols.join(", "));
            }
        }

        Commands::Generate {
            recipe,
            output,
            session,
        } => {
            let session_id = resolve_session(&store, session)?;
            let recipe = load_recipe(&recipe)?;
            let backend: Arc<dyn CodegenBackend> = Arc::new(client);
            let compiler = ExportCompiler::new(backend, session_id);
            let result = compiler.generate(&recipe).await?;

            if result.is_empty() {
                println!("Recipe has no steps; nothing to generate.");
                return Ok(());
            }

            match output {
                Some(path) => {
                    std::fs::write(&path, &result.code)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("Wrote {} ({} lines)", path.display(), result.line_count());
                }
                None => println!("{}", result.code),
            }
            println!(
                "# {} steps, {} lines, est. runtime {}",
                result.step_count,
                result.line_count(),
                result.estimated_runtime()
            );
            if !result.install_command.is_empty() {
                println!("# {}", result.install_command);
            }
        }

        Commands::Session { clear } => {
            if clear {
                store.clear();
                println!("Session record cleared.");
            } else {
                match store.load() {
                    Some(record) => println!(
                        "Session {} ({} rows, saved {})",
                        record.session_id,
                        record.rows_processed,
                        chrono::DateTime::from_timestamp_millis(record.timestamp_ms)
                            .map(|t| t.to_rfc3339())
                            .unwrap_or_else(|| "unknown".to_owned())
                    ),
                    None => println!("No active session. Run `prima upload <file>` first."),
                }
            }
        }
    }

    Ok(())
}

/// Load a recipe file: a JSON array of steps.
fn load_recipe(path: &Path) -> Result<Recipe> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read recipe file {}", path.display()))?;
    let steps: Vec<Step> = serde_json::from_str(&content)
        .with_context(|| format!("Invalid recipe JSON in {}", path.display()))?;
    Ok(Recipe::from_steps(steps)?)
}

/// The explicit `--session` flag wins; otherwise fall back to the saved
/// record. A missing or expired record is a precondition failure.
fn resolve_session(store: &SessionStore, explicit: Option<String>) -> Result<String> {
    if let Some(session_id) = explicit {
        return Ok(session_id);
    }
    match store.load() {
        Some(record) => Ok(record.session_id),
        None => Err(prima::error::PrimaError::SessionMissing.into()),
    }
}
