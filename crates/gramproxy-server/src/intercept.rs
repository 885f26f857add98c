//! HTTP-level request interception.
//!
//! Buffers POST bodies, hands them to the [`BodyRewriter`] and puts the
//! result back on the request with a matching `Content-Length`. Everything
//! else passes through untouched and unread.

use axum::body::{Body, to_bytes};
use axum::extract::Request;
use axum::http::{HeaderMap, HeaderValue, Method, header};
use http_body_util::LengthLimitError;

use gramproxy_core::{BodyRewriter, InterceptEvent, InterceptEventSink};

use crate::error::ProxyError;

/// Intercept one inbound request before it is forwarded.
///
/// * Non-POST requests are returned as-is.
/// * POST bodies are read fully (up to `max_body_bytes`) and rewritten.
///
/// A read failure or oversized body is reported to `events` and returned as
/// an error; the request is not forwarded in that case.
pub async fn intercept(
    request: Request,
    rewriter: &BodyRewriter,
    events: &dyn InterceptEventSink,
    max_body_bytes: usize,
) -> Result<Request, ProxyError> {
    if request.method() != Method::POST {
        return Ok(request);
    }

    let (mut parts, body) = request.into_parts();

    if declared_length(&parts.headers).is_some_and(|len| len > max_body_bytes) {
        return Err(reject(
            events,
            ProxyError::BodyTooLarge {
                limit: max_body_bytes,
            },
        ));
    }

    let original = match to_bytes(body, max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            let inner = e.into_inner();
            let err = if inner.is::<LengthLimitError>() {
                ProxyError::BodyTooLarge {
                    limit: max_body_bytes,
                }
            } else {
                ProxyError::BodyRead(inner.to_string())
            };
            return Err(reject(events, err));
        }
    };

    let body = rewriter.rewrite(original).await.into_body();

    // The body is now fully buffered with a known length
    parts.headers.remove(header::TRANSFER_ENCODING);
    parts
        .headers
        .insert(header::CONTENT_LENGTH, HeaderValue::from(body.len()));

    Ok(Request::from_parts(parts, Body::from(body)))
}

fn declared_length(headers: &HeaderMap) -> Option<usize> {
    headers
        .get(header::CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

fn reject(events: &dyn InterceptEventSink, err: ProxyError) -> ProxyError {
    events.emit(InterceptEvent::BodyRejected {
        reason: err.to_string(),
    });
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use bytes::Bytes;
    use gramproxy_core::StaticGrammarProvider;
    use gramproxy_core::testing::RecordingEventSink;
    use serde_json::json;

    const CHAT_BODY: &str =
        r#"{"model":"gpt-oss:20b","messages":[{"role":"user","content":"hi"}]}"#;

    fn rewriter(sink: Arc<RecordingEventSink>) -> BodyRewriter {
        BodyRewriter::new(Arc::new(StaticGrammarProvider::new("root ::= \"X\"")), sink)
    }

    fn request(method: Method, body: &'static str) -> Request {
        Request::builder()
            .method(method)
            .uri("/chat/completions")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::CONTENT_LENGTH, body.len())
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_of(request: Request) -> Bytes {
        to_bytes(request.into_body(), usize::MAX).await.unwrap()
    }

    #[tokio::test]
    async fn test_post_gets_grammar_and_new_length() {
        let sink = Arc::new(RecordingEventSink::new());
        let out = intercept(
            request(Method::POST, CHAT_BODY),
            &rewriter(sink.clone()),
            sink.as_ref(),
            1024,
        )
        .await
        .unwrap();

        let length: usize = out.headers()[header::CONTENT_LENGTH]
            .to_str()
            .unwrap()
            .parse()
            .unwrap();
        let body = body_of(out).await;
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(length, body.len());
        assert_eq!(value["options"], json!({"grammar": "root ::= \"X\""}));
    }

    #[tokio::test]
    async fn test_non_post_is_untouched() {
        let sink = Arc::new(RecordingEventSink::new());
        for method in [Method::GET, Method::PUT, Method::PATCH, Method::DELETE] {
            let out = intercept(
                request(method, CHAT_BODY),
                &rewriter(sink.clone()),
                sink.as_ref(),
                1024,
            )
            .await
            .unwrap();

            assert_eq!(
                out.headers()[header::CONTENT_LENGTH].to_str().unwrap(),
                CHAT_BODY.len().to_string()
            );
            assert_eq!(body_of(out).await, CHAT_BODY.as_bytes());
        }
        assert!(sink.events().is_empty());
    }

    #[tokio::test]
    async fn test_declared_oversize_body_is_rejected() {
        let sink = Arc::new(RecordingEventSink::new());
        let err = intercept(
            request(Method::POST, CHAT_BODY),
            &rewriter(sink.clone()),
            sink.as_ref(),
            8,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ProxyError::BodyTooLarge { limit: 8 }));
        assert!(matches!(
            sink.events().as_slice(),
            [InterceptEvent::BodyRejected { .. }]
        ));
    }

    #[tokio::test]
    async fn test_undeclared_oversize_body_is_rejected() {
        let sink = Arc::new(RecordingEventSink::new());
        let request = Request::builder()
            .method(Method::POST)
            .uri("/chat/completions")
            .body(Body::from(CHAT_BODY))
            .unwrap();

        let err = intercept(request, &rewriter(sink.clone()), sink.as_ref(), 8)
            .await
            .unwrap_err();

        assert!(matches!(err, ProxyError::BodyTooLarge { limit: 8 }));
    }

    #[tokio::test]
    async fn test_malformed_post_keeps_original_bytes() {
        let sink = Arc::new(RecordingEventSink::new());
        let raw = "{not json";
        let out = intercept(
            request(Method::POST, raw),
            &rewriter(sink.clone()),
            sink.as_ref(),
            1024,
        )
        .await
        .unwrap();

        assert_eq!(
            out.headers()[header::CONTENT_LENGTH].to_str().unwrap(),
            raw.len().to_string()
        );
        assert_eq!(body_of(out).await, raw.as_bytes());
    }
}
