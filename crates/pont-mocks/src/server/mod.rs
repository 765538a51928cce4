//! Mock HTTP server.

mod handler;
mod response;

#[cfg(test)]
mod tests;

pub use handler::{handle_request, respond};
pub use response::{
    build_response, build_response_with_headers, error_response, mock_response, not_found,
    ERROR_HEADER, INTERFACE_HEADER, MOCK_CONTENT_TYPE,
};

use crate::context::MockContext;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Mock artifact {0} does not exist")]
    MissingArtifact(String),
    #[error("Failed to bind mock server to {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("Mock server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Serves mock data for every interface in the context's schema.
pub struct MockServer {
    addr: SocketAddr,
    context: Arc<MockContext>,
}

impl MockServer {
    pub fn new(addr: SocketAddr, context: Arc<MockContext>) -> Self {
        Self { addr, context }
    }

    /// Check the artifact is present and bind the listening socket.
    pub async fn bind(&self) -> Result<TcpListener, ServerError> {
        let mocks_path = self.context.mocks_path();
        if !mocks_path.exists() {
            return Err(ServerError::MissingArtifact(mocks_path.display().to_string()));
        }

        TcpListener::bind(self.addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: self.addr,
                source,
            })
    }

    /// Bind and serve until the task is dropped.
    pub async fn run(self) -> Result<(), ServerError> {
        let listener = self.bind().await?;
        self.serve(listener).await
    }

    /// Serve connections accepted on `listener`.
    pub async fn serve(self, listener: TcpListener) -> Result<(), ServerError> {
        let local_addr = listener.local_addr()?;
        let routes = Arc::clone(&self.context.snapshot().routes);
        for route in routes.iter() {
            debug!("Route {} {} -> {}", route.method(), route.template(), route.key());
        }
        info!(
            "Mock server listening on http://{} ({} interfaces)",
            local_addr,
            routes.len()
        );

        loop {
            let (stream, remote) = match listener.accept().await {
                Ok(conn) => conn,
                Err(e) => {
                    warn!("Failed to accept connection: {}", e);
                    continue;
                }
            };
            let io = TokioIo::new(stream);
            let context = Arc::clone(&self.context);

            tokio::spawn(async move {
                let service = service_fn(move |req| {
                    let context = Arc::clone(&context);
                    async move { handle_request(req, context).await }
                });

                if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                    debug!("Mock server connection error from {}: {}", remote, e);
                }
            });
        }
    }
}
