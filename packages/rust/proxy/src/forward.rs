//! `/api` forwarding to the CMS origin.

use std::sync::Arc;

use axum::body::{Body, to_bytes};
use axum::extract::State;
use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};
use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use tracing::debug;

use crate::ProxyState;
use crate::error::ProxyError;

/// Largest request body forwarded upstream.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

const ALLOW_ORIGIN: &str = "*";
const ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";
const ALLOW_HEADERS: &str = "Origin, X-Requested-With, Content-Type, Accept, Authorization";

/// Connection-scoped headers that must not be forwarded.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "trailers",
    "transfer-encoding",
    "upgrade",
];

/// Handler for the API prefix and everything below it.
pub(crate) async fn handle(
    State(state): State<Arc<ProxyState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Body,
) -> Response {
    if method == Method::OPTIONS {
        return with_cors(StatusCode::OK.into_response());
    }

    let response = match forward(&state, method, &uri, headers, body).await {
        Ok(response) => response,
        Err(e) => e.into_response(),
    };
    with_cors(response)
}

async fn forward(
    state: &ProxyState,
    method: Method,
    uri: &Uri,
    headers: HeaderMap,
    body: Body,
) -> Result<Response, ProxyError> {
    let url = state.upstream_url(uri);
    debug!(%method, %url, "forwarding");

    let body = to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|e| ProxyError::RequestBody(e.to_string()))?;

    let mut outgoing = filter_headers(&headers, &[header::HOST, header::CONTENT_LENGTH]);
    if let Some(token) = &state.token {
        if !outgoing.contains_key(header::AUTHORIZATION) {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| ProxyError::Upstream(format!("invalid token header: {e}")))?;
            outgoing.insert(header::AUTHORIZATION, value);
        }
    }

    let upstream = state
        .http
        .request(method, &url)
        .headers(outgoing)
        .body(body)
        .send()
        .await
        .map_err(|e| ProxyError::Upstream(e.to_string()))?;

    let status = upstream.status();
    let response_headers = filter_headers(upstream.headers(), &[header::CONTENT_LENGTH]);
    let bytes = upstream
        .bytes()
        .await
        .map_err(|e| ProxyError::Upstream(e.to_string()))?;

    debug!(%status, bytes = bytes.len(), "upstream responded");

    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = status;
    *response.headers_mut() = response_headers;
    Ok(response)
}

/// Copy `headers` without hop-by-hop headers and the `extra` names.
fn filter_headers(headers: &HeaderMap, extra: &[HeaderName]) -> HeaderMap {
    let mut out = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        if HOP_BY_HOP.contains(&name.as_str()) || extra.contains(name) {
            continue;
        }
        out.append(name.clone(), value.clone());
    }
    out
}

/// Overwrite the CORS headers on `response`.
pub(crate) fn with_cors(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static(ALLOW_ORIGIN),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOW_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOW_HEADERS),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hop_by_hop_headers_are_dropped() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
        headers.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        headers.insert(header::HOST, HeaderValue::from_static("localhost:3000"));
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        headers.append("x-custom", HeaderValue::from_static("a"));
        headers.append("x-custom", HeaderValue::from_static("b"));

        let out = filter_headers(&headers, &[header::HOST]);
        assert!(!out.contains_key(header::CONNECTION));
        assert!(!out.contains_key(header::TRANSFER_ENCODING));
        assert!(!out.contains_key(header::HOST));
        assert_eq!(out[header::ACCEPT], "application/json");
        assert_eq!(out.get_all("x-custom").iter().count(), 2);
    }

    #[test]
    fn cors_headers_replace_upstream_values() {
        let mut response = StatusCode::OK.into_response();
        response.headers_mut().insert(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("https://cms.example.com"),
        );
        let response = with_cors(response);
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_METHODS],
            "GET, POST, PUT, DELETE, OPTIONS"
        );
    }
}
