//! pont-mocks: a mock HTTP server for API schemas.
//!
//! Given a schema snapshot, pont-mocks generates an editable mock artifact
//! (Rhai source or JSON data) and serves it: every request is matched against
//! the schema's interface routes, the artifact is re-read and executed, and
//! the interface's value is returned as JSON.

pub mod bootstrap;
pub mod config;
pub mod context;
pub mod loader;
pub mod routing;
pub mod scripting;
pub mod server;
pub mod template;

pub use bootstrap::{ensure, BootstrapError, BootstrapOutcome};
pub use config::ProjectConfig;
pub use context::{ContextError, MockContext};
pub use loader::{ArtifactFormat, LoadError, MockRuntimeLoader};
pub use routing::{RouteError, RouteTable};
pub use server::{MockServer, ServerError};
