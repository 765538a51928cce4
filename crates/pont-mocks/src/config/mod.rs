//! Project configuration for pont-mocks.
//!
//! Read from `pont-mocks.yaml` at the project root (YAML, so JSON also
//! parses). Every field has a default, so a project without a config file
//! still works.

mod listen;

use anyhow::Context;
use pont_mocks_core::{SynthesisLimits, Wrapper, DEFAULT_ARRAY_LENGTH, DEFAULT_WRAPPER};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

pub use listen::{parse_host, DEFAULT_HOST};

/// Config file looked up at the project root.
pub const CONFIG_FILE: &str = "pont-mocks.yaml";

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    /// Optional, informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Schema snapshot (JSON or YAML).
    #[serde(default = "default_schema_path")]
    pub schema_path: PathBuf,

    /// Mock artifact. `.json` selects the data format, anything else Rhai.
    #[serde(default = "default_mocks_path")]
    pub mocks_path: PathBuf,

    #[serde(default)]
    pub mocks: MocksConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MocksConfig {
    #[serde(default = "default_host")]
    pub host: String,
    /// JSON text with a `{response}` placeholder.
    #[serde(default = "default_wrapper")]
    pub wrapper: String,
    /// Resolve `@placeholder` strings and `key|rule` keys in served values.
    #[serde(default = "default_true")]
    pub resolve_templates: bool,
    #[serde(default = "default_array_length")]
    pub array_length: usize,
    #[serde(default)]
    pub limits: SynthesisLimits,
}

fn default_schema_path() -> PathBuf {
    PathBuf::from("api-lock.json")
}

fn default_mocks_path() -> PathBuf {
    PathBuf::from(".mocks/mocks.rhai")
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_wrapper() -> String {
    DEFAULT_WRAPPER.to_string()
}

fn default_true() -> bool {
    true
}

fn default_array_length() -> usize {
    DEFAULT_ARRAY_LENGTH
}

impl Default for MocksConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            wrapper: default_wrapper(),
            resolve_templates: true,
            array_length: default_array_length(),
            limits: SynthesisLimits::default(),
        }
    }
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: None,
            schema_path: default_schema_path(),
            mocks_path: default_mocks_path(),
            mocks: MocksConfig::default(),
        }
    }
}

impl ProjectConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: ProjectConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load the configuration for the project at `root`.
    ///
    /// An explicit `config` path must exist. Otherwise `pont-mocks.yaml` is
    /// used when present, and defaults when not. Relative schema and mock
    /// paths are resolved against `root`.
    pub fn load(root: &Path, config: Option<&Path>) -> Result<Self, anyhow::Error> {
        let mut loaded = match config {
            Some(path) => Self::from_file(resolve(root, path))?,
            None => {
                let default_path = root.join(CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(default_path)?
                } else {
                    let config = Self::default();
                    config.validate()?;
                    config
                }
            }
        };

        loaded.schema_path = resolve(root, &loaded.schema_path);
        loaded.mocks_path = resolve(root, &loaded.mocks_path);
        Ok(loaded)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.wrapper()?;
        self.listen_addr()?;

        if self.mocks.limits.max_calls_per_definition == 0 {
            anyhow::bail!("mocks.limits.maxCallsPerDefinition must be at least 1");
        }
        if self.mocks.limits.max_depth == 0 {
            anyhow::bail!("mocks.limits.maxDepth must be at least 1");
        }
        if self.mocks.limits.max_objects == 0 {
            anyhow::bail!("mocks.limits.maxObjects must be at least 1");
        }
        if self.mocks_path.as_os_str().is_empty() {
            anyhow::bail!("mocksPath must not be empty");
        }

        Ok(())
    }

    pub fn wrapper(&self) -> Result<Wrapper, anyhow::Error> {
        Wrapper::parse(&self.mocks.wrapper)
            .with_context(|| format!("Invalid mocks.wrapper '{}'", self.mocks.wrapper))
    }

    pub fn listen_addr(&self) -> Result<SocketAddr, anyhow::Error> {
        parse_host(&self.mocks.host)
    }
}

fn resolve(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}
