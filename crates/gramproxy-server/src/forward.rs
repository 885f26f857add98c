//! Request forwarding to the upstream with streaming in both directions.
//!
//! Method, path, query and end-to-end headers are preserved. The upstream
//! response (status, headers, body) is relayed as-is, including error
//! statuses.

use std::net::SocketAddr;

use axum::body::{Body, HttpBody};
use axum::extract::Request;
use axum::http::{HeaderMap, HeaderName, HeaderValue, header};
use axum::response::Response;
use futures_util::TryStreamExt;
use reqwest::Client;
use tracing::{debug, error};

use crate::error::ProxyError;
use crate::upstream::UpstreamTarget;

/// Headers that should NOT be forwarded (hop-by-hop headers).
const HOP_BY_HOP_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailers",
    "transfer-encoding",
    "upgrade",
];

const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Check if a header is hop-by-hop.
fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP_HEADERS
        .iter()
        .any(|hop| hop.eq_ignore_ascii_case(name))
}

/// Header names listed in `Connection`, which are hop-by-hop for this message.
fn connection_listed(headers: &HeaderMap) -> Vec<String> {
    headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(|token| token.trim().to_ascii_lowercase())
        .filter(|token| !token.is_empty())
        .collect()
}

/// Copy end-to-end headers. `host` is dropped on requests since the client
/// sets it from the upstream URL.
fn end_to_end_headers(headers: &HeaderMap, is_request: bool) -> HeaderMap {
    let listed = connection_listed(headers);
    let mut out = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let name_str = name.as_str();
        if is_hop_by_hop(name_str)
            || (is_request && *name == header::HOST)
            || listed.iter().any(|l| l == name_str)
        {
            continue;
        }
        out.append(name.clone(), value.clone());
    }
    out
}

/// Append the client address to `X-Forwarded-For`.
fn append_forwarded_for(headers: &mut HeaderMap, client_addr: SocketAddr) {
    let name = HeaderName::from_static(X_FORWARDED_FOR);
    let ip = client_addr.ip().to_string();
    let prior: Vec<&str> = headers
        .get_all(&name)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .collect();
    let combined = if prior.is_empty() {
        ip
    } else {
        format!("{}, {ip}", prior.join(", "))
    };
    if let Ok(value) = HeaderValue::from_str(&combined) {
        headers.insert(name, value);
    }
}

/// Whether the inbound request carries a body worth streaming.
///
/// Decided from the body rather than the headers: an HTTP/2 request may
/// carry data with neither `Content-Length` nor `Transfer-Encoding`.
fn has_body(body: &Body) -> bool {
    !body.is_end_stream() && body.size_hint().exact() != Some(0)
}

/// Forward a request to the upstream and relay its response.
///
/// # Arguments
///
/// * `client` - HTTP client to use for the request
/// * `target` - Upstream base URL
/// * `request` - The (possibly rewritten) inbound request
/// * `client_addr` - Peer address, appended to `X-Forwarded-For` when known
pub async fn forward(
    client: &Client,
    target: &UpstreamTarget,
    request: Request,
    client_addr: Option<SocketAddr>,
) -> Result<Response, ProxyError> {
    let (parts, body) = request.into_parts();
    let url = target.join(parts.uri.path_and_query());

    debug!(method = %parts.method, upstream = %url, "Forwarding request");

    let mut headers = end_to_end_headers(&parts.headers, true);
    if let Some(addr) = client_addr {
        append_forwarded_for(&mut headers, addr);
    }

    let mut req_builder = client.request(parts.method.clone(), url.clone());
    if has_body(&body) {
        req_builder = req_builder.body(reqwest::Body::wrap_stream(body.into_data_stream()));
    }

    let response = req_builder.headers(headers).send().await.map_err(|e| {
        error!(upstream = %url, "Failed to reach upstream: {e}");
        ProxyError::from(e)
    })?;

    let status = response.status();
    debug!(method = %parts.method, upstream = %url, %status, "Upstream responded");

    relay_response(response)
}

/// Stream an upstream response back to the caller unmodified.
fn relay_response(response: reqwest::Response) -> Result<Response, ProxyError> {
    let status = response.status();
    let headers = end_to_end_headers(response.headers(), false);

    let body = Body::from_stream(response.bytes_stream().map_err(std::io::Error::other));

    let mut relayed = Response::builder()
        .status(status)
        .body(body)
        .map_err(|e| ProxyError::Internal(e.to_string()))?;
    *relayed.headers_mut() = headers;
    Ok(relayed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(*name, HeaderValue::from_static(*value));
        }
        map
    }

    #[test]
    fn test_is_hop_by_hop() {
        assert!(is_hop_by_hop("connection"));
        assert!(is_hop_by_hop("Transfer-Encoding"));
        assert!(is_hop_by_hop("upgrade"));

        assert!(!is_hop_by_hop("accept"));
        assert!(!is_hop_by_hop("content-type"));
        assert!(!is_hop_by_hop("authorization"));
        assert!(!is_hop_by_hop("x-custom-header"));
    }

    #[test]
    fn test_request_headers_drop_host_and_connection_listed() {
        let input = headers(&[
            ("host", "proxy:8000"),
            ("connection", "keep-alive, x-trace"),
            ("x-trace", "1"),
            ("authorization", "Bearer token"),
            ("content-length", "42"),
            ("accept", "application/json"),
        ]);

        let out = end_to_end_headers(&input, true);

        assert!(!out.contains_key("host"));
        assert!(!out.contains_key("connection"));
        assert!(!out.contains_key("x-trace"));
        assert_eq!(out["authorization"], "Bearer token");
        assert_eq!(out["content-length"], "42");
        assert_eq!(out["accept"], "application/json");
    }

    #[test]
    fn test_response_headers_keep_host_like_values() {
        let input = headers(&[("transfer-encoding", "chunked"), ("x-upstream", "ollama")]);
        let out = end_to_end_headers(&input, false);

        assert!(!out.contains_key("transfer-encoding"));
        assert_eq!(out["x-upstream"], "ollama");
    }

    #[test]
    fn test_forwarded_for_is_appended() {
        let addr: SocketAddr = "10.0.0.7:5555".parse().unwrap();

        let mut fresh = HeaderMap::new();
        append_forwarded_for(&mut fresh, addr);
        assert_eq!(fresh[X_FORWARDED_FOR], "10.0.0.7");

        let mut chained = headers(&[("x-forwarded-for", "192.168.1.1")]);
        append_forwarded_for(&mut chained, addr);
        assert_eq!(chained[X_FORWARDED_FOR], "192.168.1.1, 10.0.0.7");
    }

    #[test]
    fn test_has_body() {
        assert!(!has_body(&Body::empty()));
        assert!(!has_body(&Body::from("")));
        assert!(has_body(&Body::from("abc")));

        let chunks = futures_util::stream::iter([Ok::<_, std::io::Error>("a"), Ok("bc")]);
        assert!(has_body(&Body::from_stream(chunks)));
    }
}
