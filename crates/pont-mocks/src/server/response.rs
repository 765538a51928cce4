//! Response builders for the mock server.

use bytes::Bytes;
use http_body_util::Full;
use hyper::header::HeaderValue;
use hyper::{Response, StatusCode};
use serde::Serialize;

/// Content type of served mock data.
pub const MOCK_CONTENT_TYPE: &str = "text/json";

/// Names the `Module.interface` that produced a response.
pub const INTERFACE_HEADER: &str = "x-pont-mocks-interface";

/// Set on responses describing a mock loading failure.
pub const ERROR_HEADER: &str = "x-pont-mocks-error";

#[derive(Debug, Serialize)]
pub struct ErrorBody<'a> {
    pub error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interface: Option<&'a str>,
}

/// Build an HTTP response with the given status and body.
pub fn build_response(status: StatusCode, body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .body(Full::new(body.into()))
        .unwrap_or_else(|_| Response::new(Full::new(Bytes::from("Internal Server Error"))))
}

/// Build an HTTP response with headers.
pub fn build_response_with_headers(
    status: StatusCode,
    headers: impl IntoIterator<Item = (impl AsRef<str>, impl AsRef<str>)>,
    body: impl Into<Bytes>,
) -> Response<Full<Bytes>> {
    let mut builder = Response::builder().status(status);
    for (key, value) in headers {
        builder = builder.header(key.as_ref(), value.as_ref());
    }
    builder
        .body(Full::new(body.into()))
        .unwrap_or_else(|_| Response::new(Full::new(Bytes::from("Internal Server Error"))))
}

/// `200` with serialized mock data.
pub fn mock_response(interface_key: &str, body: String) -> Response<Full<Bytes>> {
    let mut resp =
        build_response_with_headers(StatusCode::OK, [("Content-Type", MOCK_CONTENT_TYPE)], body);
    // Names that are not valid header text are left out.
    if let Ok(value) = HeaderValue::from_str(interface_key) {
        resp.headers_mut().insert(INTERFACE_HEADER, value);
    }
    resp
}

/// `404` with an empty body.
pub fn not_found() -> Response<Full<Bytes>> {
    build_response(StatusCode::NOT_FOUND, Bytes::new())
}

/// `500` with a JSON error body.
pub fn error_response(message: &str, interface: Option<&str>) -> Response<Full<Bytes>> {
    let body = ErrorBody {
        error: message,
        interface,
    };
    let json = serde_json::to_string(&body).unwrap_or_else(|_| "{}".to_string());
    build_response_with_headers(
        StatusCode::INTERNAL_SERVER_ERROR,
        [("Content-Type", "application/json"), (ERROR_HEADER, "true")],
        json,
    )
}
