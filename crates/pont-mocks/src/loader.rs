//! Mock artifact loading.
//!
//! Rhai sources are compiled and executed in a fresh engine on a dedicated
//! worker thread per load. Each load gets its own identity
//! (`mocks-<uuid>`), used as the script source name and the thread name, and
//! nothing survives the load except the resulting [`MockTable`].

use crate::scripting::{create_engine, dynamic_to_mock};
use pont_mocks_core::{MockTable, MockValue, SynthesisLimits, TableError};
use rhai::Dynamic;
use std::path::Path;
use std::thread;
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::debug;
use uuid::Uuid;

/// Stack size of loader threads. Deeply nested definitions recurse in the
/// script evaluator.
pub const LOADER_STACK_SIZE: usize = 32 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to read mock source {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to compile mock source ({load_id}): {message}")]
    Compile { load_id: String, message: String },
    #[error("Failed to execute mock source ({load_id}): {message}")]
    Execute { load_id: String, message: String },
    #[error("Invalid JSON mock data: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid mock data: {0}")]
    Table(#[from] TableError),
    #[error("Mock loader worker failed: {0}")]
    Worker(String),
}

/// On-disk format of the mock artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ArtifactFormat {
    /// Rhai source evaluating to the mock table.
    Rhai,
    /// Plain JSON mock table.
    Json,
}

impl ArtifactFormat {
    /// `.json` files are data; everything else is Rhai source.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ArtifactFormat::Json,
            _ => ArtifactFormat::Rhai,
        }
    }
}

/// Compiles and executes mock artifacts.
#[derive(Debug, Clone)]
pub struct MockRuntimeLoader {
    limits: SynthesisLimits,
}

impl MockRuntimeLoader {
    /// `limits` seeds the budgets created by `new_budget()` in scripts.
    pub fn new(limits: SynthesisLimits) -> Self {
        Self { limits }
    }

    /// Execute Rhai mock source, blocking until it finishes.
    pub fn load(&self, source: &str) -> Result<MockTable, LoadError> {
        let load_id = new_load_id();
        let limits = self.limits;
        let source = source.to_string();
        let thread_id = load_id.clone();

        let handle = thread::Builder::new()
            .name(load_id.clone())
            .stack_size(LOADER_STACK_SIZE)
            .spawn(move || eval_rhai(limits, &thread_id, &source))
            .map_err(|e| LoadError::Worker(format!("failed to spawn {load_id}: {e}")))?;

        handle
            .join()
            .map_err(|_| LoadError::Worker(format!("{load_id} panicked")))?
    }

    /// Execute Rhai mock source without blocking the async runtime.
    pub async fn load_async(&self, source: String) -> Result<MockTable, LoadError> {
        let load_id = new_load_id();
        let limits = self.limits;
        let thread_id = load_id.clone();
        let (result_tx, result_rx) = oneshot::channel();

        thread::Builder::new()
            .name(load_id.clone())
            .stack_size(LOADER_STACK_SIZE)
            .spawn(move || {
                // Receiver may be gone if the request was dropped
                let _ = result_tx.send(eval_rhai(limits, &thread_id, &source));
            })
            .map_err(|e| LoadError::Worker(format!("failed to spawn {load_id}: {e}")))?;

        result_rx
            .await
            .map_err(|_| LoadError::Worker(format!("{load_id} exited without a result")))?
    }

    /// Parse a JSON mock table.
    pub fn load_json(source: &str) -> Result<MockTable, LoadError> {
        let value: MockValue = serde_json::from_str(source)?;
        Ok(MockTable::from_value(value)?)
    }

    /// Read and load the artifact at `path`, choosing the format by extension.
    pub async fn load_file(&self, path: &Path) -> Result<MockTable, LoadError> {
        let source = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| LoadError::Io {
                path: path.display().to_string(),
                source,
            })?;

        match ArtifactFormat::from_path(path) {
            ArtifactFormat::Rhai => self.load_async(source).await,
            ArtifactFormat::Json => Self::load_json(&source),
        }
    }
}

fn new_load_id() -> String {
    format!("mocks-{}", Uuid::new_v4().simple())
}

fn eval_rhai(limits: SynthesisLimits, load_id: &str, source: &str) -> Result<MockTable, LoadError> {
    let engine = create_engine(limits);

    let mut ast = engine.compile(source).map_err(|e| LoadError::Compile {
        load_id: load_id.to_string(),
        message: e.to_string(),
    })?;
    ast.set_source(load_id);

    let result: Dynamic = engine.eval_ast(&ast).map_err(|e| LoadError::Execute {
        load_id: load_id.to_string(),
        message: e.to_string(),
    })?;

    let table = MockTable::from_value(dynamic_to_mock(result))?;
    debug!("Loaded mock source {} ({} interfaces)", load_id, table.len());
    Ok(table)
}
