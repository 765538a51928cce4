//! Shared server state.
//!
//! A [`MockContext`] is built once at startup and shared by `Arc` between
//! connection tasks. The schema snapshot and its compiled routes live behind a
//! lock holding an `Arc`, so requests clone a consistent snapshot and a schema
//! reload swaps it atomically.

use crate::config::ProjectConfig;
use crate::loader::MockRuntimeLoader;
use crate::routing::{RouteError, RouteTable};
use parking_lot::RwLock;
use pont_mocks_core::{SchemaError, SchemaSnapshot, Wrapper, WrapperError};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ContextError {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Route(#[from] RouteError),
    #[error(transparent)]
    Wrapper(#[from] WrapperError),
}

/// A schema snapshot with the routes compiled from it.
#[derive(Debug)]
pub struct SchemaState {
    pub schema: Arc<SchemaSnapshot>,
    pub routes: Arc<RouteTable>,
    /// Modification time of the schema file this state was checked against.
    modified: Option<SystemTime>,
}

impl SchemaState {
    fn compile(schema: SchemaSnapshot, modified: Option<SystemTime>) -> Result<Self, RouteError> {
        let routes = RouteTable::compile(&schema)?;
        Ok(Self {
            schema: Arc::new(schema),
            routes: Arc::new(routes),
            modified,
        })
    }
}

pub struct MockContext {
    config: ProjectConfig,
    wrapper: Wrapper,
    loader: MockRuntimeLoader,
    /// Schema file watched for changes; `None` for in-memory schemas.
    schema_file: Option<PathBuf>,
    state: RwLock<Arc<SchemaState>>,
}

impl MockContext {
    /// Load the schema named by `config.schema_path`.
    pub fn new(config: ProjectConfig) -> Result<Self, ContextError> {
        let schema_file = config.schema_path.clone();
        let modified = modified_time(&schema_file);
        let schema = SchemaSnapshot::from_file(&schema_file)?;
        Self::build(config, schema, Some(schema_file), modified)
    }

    /// Use an in-memory schema. [`MockContext::refresh_schema`] is a no-op.
    pub fn with_schema(config: ProjectConfig, schema: SchemaSnapshot) -> Result<Self, ContextError> {
        Self::build(config, schema, None, None)
    }

    fn build(
        config: ProjectConfig,
        schema: SchemaSnapshot,
        schema_file: Option<PathBuf>,
        modified: Option<SystemTime>,
    ) -> Result<Self, ContextError> {
        let wrapper = Wrapper::parse(&config.mocks.wrapper)?;
        let loader = MockRuntimeLoader::new(config.mocks.limits);
        let state = SchemaState::compile(schema, modified)?;

        Ok(Self {
            config,
            wrapper,
            loader,
            schema_file,
            state: RwLock::new(Arc::new(state)),
        })
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    pub fn wrapper(&self) -> &Wrapper {
        &self.wrapper
    }

    pub fn loader(&self) -> &MockRuntimeLoader {
        &self.loader
    }

    pub fn mocks_path(&self) -> &Path {
        &self.config.mocks_path
    }

    /// The current schema and routes.
    pub fn snapshot(&self) -> Arc<SchemaState> {
        self.state.read().clone()
    }

    /// Swap in a new schema, recompiling routes.
    pub fn replace_schema(&self, schema: SchemaSnapshot) -> Result<(), RouteError> {
        let modified = self.state.read().modified;
        let state = SchemaState::compile(schema, modified)?;
        *self.state.write() = Arc::new(state);
        Ok(())
    }

    /// Reload the schema file if its modification time changed.
    ///
    /// Returns true when a new snapshot was installed. A file that fails to
    /// load leaves the previous snapshot in place. The parse runs on the
    /// blocking pool.
    pub async fn refresh_schema(&self) -> bool {
        let Some(path) = &self.schema_file else {
            return false;
        };

        let modified = tokio::fs::metadata(path)
            .await
            .and_then(|m| m.modified())
            .ok();
        let current = self.snapshot();
        if modified.is_none() || modified == current.modified {
            return false;
        }

        let reload_path = path.clone();
        let reloaded = tokio::task::spawn_blocking(move || {
            let schema = SchemaSnapshot::from_file(&reload_path).map_err(|e| e.to_string())?;
            SchemaState::compile(schema, modified).map_err(|e| e.to_string())
        })
        .await
        .unwrap_or_else(|e| Err(format!("reload task failed: {e}")));

        match reloaded {
            Ok(state) => {
                info!(
                    "Reloaded schema {} ({} interfaces)",
                    path.display(),
                    state.routes.len()
                );
                *self.state.write() = Arc::new(state);
                true
            }
            Err(e) => {
                warn!("Failed to reload schema {}: {}", path.display(), e);
                // Remember the broken revision so it is reported once.
                *self.state.write() = Arc::new(SchemaState {
                    schema: Arc::clone(&current.schema),
                    routes: Arc::clone(&current.routes),
                    modified,
                });
                false
            }
        }
    }
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}
