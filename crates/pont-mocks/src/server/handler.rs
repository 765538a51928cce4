//! Per-request mock resolution.

use super::response::{error_response, mock_response, not_found};
use crate::context::MockContext;
use crate::template::resolve_templates;
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::{Request, Response};
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{debug, warn};

/// Handle one request against the shared context.
pub async fn handle_request(
    req: Request<Incoming>,
    ctx: Arc<MockContext>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let method = req.method().as_str().to_string();
    let path = req.uri().path().to_string();
    Ok(respond(&ctx, &method, &path).await)
}

/// Match `method path` to an interface and serve its mock data.
///
/// 1. no matching interface: `404` with an empty body;
/// 2. artifact unreadable, failing to load, or missing the interface: `500`;
/// 3. otherwise `200` with the interface's value as JSON.
pub async fn respond(ctx: &MockContext, method: &str, path: &str) -> Response<Full<Bytes>> {
    ctx.refresh_schema().await;
    let state = ctx.snapshot();

    let Some(route) = state.routes.find(method, path) else {
        debug!("No interface matches {} {}", method, path);
        return not_found();
    };
    let key = route.key();

    let table = match ctx.loader().load_file(ctx.mocks_path()).await {
        Ok(table) => table,
        Err(e) => {
            warn!("Failed to load mocks for {}: {}", key, e);
            return error_response(&e.to_string(), Some(&key));
        }
    };

    let Some(value) = table.get(&route.module, &route.interface) else {
        warn!(
            "Mock artifact {} has no entry for {}",
            ctx.mocks_path().display(),
            key
        );
        let message = format!("No mock data for interface {key}");
        return error_response(&message, Some(&key));
    };

    let value = if ctx.config().mocks.resolve_templates {
        resolve_templates(value)
    } else {
        value.clone()
    };

    debug!("{} {} -> {}", method, path, key);
    mock_response(&key, value.to_json_string())
}
