//! Mock artifact bootstrap.
//!
//! Makes sure a mock artifact exists before the server starts. An existing
//! artifact is never touched: it may hold hand edits.

use crate::config::{MocksConfig, ProjectConfig};
use crate::loader::ArtifactFormat;
use pont_mocks_core::{
    MockSourceGenerator, MockSynthesizer, MockTable, SchemaSnapshot, Wrapper, WrapperError,
};
use std::fs::File;
use std::io::{ErrorKind, Write};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("Failed to write mock artifact {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Wrapper(#[from] WrapperError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// A fresh artifact was generated and written.
    Created,
    /// An artifact was already present and left as is.
    Existing,
}

/// Render a complete artifact for `schema` in `format`.
pub fn render(
    schema: &SchemaSnapshot,
    wrapper: &Wrapper,
    mocks: &MocksConfig,
    format: ArtifactFormat,
) -> String {
    match format {
        ArtifactFormat::Rhai => MockSourceGenerator::new(schema, wrapper)
            .with_array_length(mocks.array_length)
            .generate(),
        ArtifactFormat::Json => {
            let synth = MockSynthesizer::new(&schema.base_classes)
                .with_limits(mocks.limits)
                .with_array_length(mocks.array_length);
            MockTable::synthesize_with(schema, wrapper, &synth).to_json_pretty()
        }
    }
}

/// Generate the artifact at `config.mocks_path` unless it already exists.
pub fn ensure(
    schema: &SchemaSnapshot,
    config: &ProjectConfig,
) -> Result<BootstrapOutcome, BootstrapError> {
    let path = config.mocks_path.as_path();
    if path.exists() {
        debug!("Mock artifact {} already exists", path.display());
        return Ok(BootstrapOutcome::Existing);
    }

    let wrapper = Wrapper::parse(&config.mocks.wrapper)?;
    let source = render(schema, &wrapper, &config.mocks, ArtifactFormat::from_path(path));
    let outcome = write_new(path, &source)?;

    if outcome == BootstrapOutcome::Created {
        info!(
            "Generated mock artifact {} ({} interfaces)",
            path.display(),
            schema.interface_count()
        );
    }
    Ok(outcome)
}

/// Write `contents` only if `path` does not exist yet.
fn write_new(path: &Path, contents: &str) -> Result<BootstrapOutcome, BootstrapError> {
    write_new_with(path, |file| file.write_all(contents.as_bytes()))
}

/// Fill a temporary file next to `path`, then move it into place unless
/// `path` appeared meanwhile. A failed write leaves nothing at `path`.
fn write_new_with<F>(path: &Path, write: F) -> Result<BootstrapOutcome, BootstrapError>
where
    F: FnOnce(&mut File) -> std::io::Result<()>,
{
    let io_error = |source| BootstrapError::Io {
        path: path.display().to_string(),
        source,
    };

    let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => {
            std::fs::create_dir_all(parent).map_err(io_error)?;
            parent
        }
        None => Path::new("."),
    };

    let mut temp = tempfile::Builder::new()
        .prefix(".pont-mocks-")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(io_error)?;
    write(temp.as_file_mut()).map_err(io_error)?;
    temp.as_file().sync_all().map_err(io_error)?;

    match temp.persist_noclobber(path) {
        Ok(_) => Ok(BootstrapOutcome::Created),
        Err(e) if e.error.kind() == ErrorKind::AlreadyExists => Ok(BootstrapOutcome::Existing),
        Err(e) => Err(io_error(e.error)),
    }
}
